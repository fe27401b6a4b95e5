//! Dependency graph construction and ordering.
//!
//! Edges are never stored on the resources themselves: an edge from A
//! to B exists whenever A's config embeds a [`Reference`] to B. The
//! creation order is a topological sort (Kahn's algorithm) where every
//! resource appears after all resources it references; ties among
//! equally-ready resources break by declaration order, so the output
//! is deterministic across runs on unchanged input. The reverse of the
//! creation order is the teardown order.
//!
//! [`Reference`]: crate::model::Reference

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::error::{CycleError, Result};
use crate::model::Resource;

/// Builds creation orderings over declared resources.
#[derive(Debug, Default)]
pub struct DependencyGraph;

impl DependencyGraph {
    /// Creates a new graph builder.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the creation order for a set of declarations.
    ///
    /// References to undeclared ids contribute no edge; schema
    /// validation rejects those declarations before ordering runs.
    ///
    /// # Errors
    ///
    /// Returns a [`CycleError`] naming the cycle participants, in
    /// declaration order, if the graph is not acyclic.
    pub fn build(&self, resources: &[Resource]) -> Result<Vec<String>> {
        let index_of: HashMap<&str, usize> = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.as_str(), i))
            .collect();

        // dependencies[i]: declaration indices resource i references.
        // dependents[t]: indices of resources referencing t.
        let mut dependencies: Vec<HashSet<usize>> = vec![HashSet::new(); resources.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); resources.len()];

        for (i, resource) in resources.iter().enumerate() {
            for reference in resource.references() {
                if let Some(&target) = index_of.get(reference.target_id.as_str())
                    && target != i
                    && dependencies[i].insert(target)
                {
                    dependents[target].push(i);
                }
            }
        }

        let mut remaining: Vec<usize> = dependencies.iter().map(HashSet::len).collect();

        // BTreeSet keeps ready nodes sorted by declaration index.
        let mut ready: BTreeSet<usize> = remaining
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(resources.len());

        while let Some(&next) = ready.iter().next() {
            ready.remove(&next);
            order.push(resources[next].id.clone());

            for &dependent in &dependents[next] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() == resources.len() {
            debug!("Creation order: {}", order.join(" -> "));
            return Ok(order);
        }

        let ordered: HashSet<&String> = order.iter().collect();
        let leftover: Vec<usize> = (0..resources.len())
            .filter(|&i| !ordered.contains(&resources[i].id))
            .collect();

        Err(CycleError {
            participants: Self::cycle_participants(resources, &dependencies, leftover),
        }
        .into())
    }

    /// Trims the un-orderable set down to the actual cycle members.
    ///
    /// Kahn leftovers also contain resources that merely depend on a
    /// cycle; those are referenced by nothing else in the leftover set
    /// and are peeled away until a fixed point.
    fn cycle_participants(
        resources: &[Resource],
        dependencies: &[HashSet<usize>],
        mut leftover: Vec<usize>,
    ) -> Vec<String> {
        loop {
            let set: HashSet<usize> = leftover.iter().copied().collect();
            let referenced: HashSet<usize> = leftover
                .iter()
                .flat_map(|&i| dependencies[i].iter().copied())
                .filter(|t| set.contains(t))
                .collect();

            let trimmed: Vec<usize> = leftover
                .iter()
                .copied()
                .filter(|i| referenced.contains(i))
                .collect();

            if trimmed.len() == leftover.len() {
                break;
            }
            leftover = trimmed;
        }

        leftover
            .into_iter()
            .map(|i| resources[i].id.clone())
            .collect()
    }
}
