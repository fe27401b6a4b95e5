//! Output rendering for CLI commands.
//!
//! Text output is for humans and uses color; JSON output is for
//! scripting and is stable enough to pipe into other tools.

use colored::Colorize;

use crate::error::Result;
use crate::model::{Resource, ResourceState};
use crate::planner::DeploymentReport;
use crate::state::StackState;

use super::commands::OutputFormat;

/// Renders command results in the selected format.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Creates a formatter for the given format.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Renders a deploy or destroy report.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn report(&self, report: &DeploymentReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", to_json(report)?);
            }
            OutputFormat::Text => {
                let verdict = if report.success {
                    "succeeded".green().bold()
                } else {
                    "failed".red().bold()
                };
                println!("{} {verdict}", report.operation.to_string().bold());

                for resource in &report.resources {
                    let state = colorize_state(resource.state);
                    print!("  {:<10} [{}] {state}", resource.id, resource.kind);
                    if let Some(provider_id) = &resource.provider_id {
                        print!("  {}", provider_id.dimmed());
                    }
                    if let Some(error) = &resource.error {
                        print!("  {}", error.red());
                    }
                    println!();
                }
            }
        }
        Ok(())
    }

    /// Renders the planned creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn plan(&self, order: &[String], resources: &[Resource]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", to_json(order)?);
            }
            OutputFormat::Text => {
                println!("{}", "Creation order:".bold());
                for (i, id) in order.iter().enumerate() {
                    let kind = resources
                        .iter()
                        .find(|r| r.id == *id)
                        .map_or("?", |r| r.kind.name());
                    println!("  {}. {id} [{kind}]", i + 1);
                }
                println!("Teardown runs in exact reverse.");
            }
        }
        Ok(())
    }

    /// Renders recorded state.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn status(&self, state: Option<&StackState>) -> Result<()> {
        match self.format {
            OutputFormat::Json => match state {
                Some(state) => println!("{}", to_json(state)?),
                None => println!("null"),
            },
            OutputFormat::Text => match state {
                Some(state) if !state.is_empty() => {
                    println!(
                        "{} {} ({})",
                        "Stack:".bold(),
                        state.project,
                        state.environment
                    );
                    for id in &state.order {
                        if let Some(recorded) = state.get(id) {
                            println!(
                                "  {:<10} [{}] {}  {}",
                                recorded.id,
                                recorded.kind,
                                "created".green(),
                                recorded.provider_id.dimmed()
                            );
                        }
                    }
                    println!("Last updated: {}", state.last_updated);
                }
                _ => println!("No deployed resources."),
            },
        }
        Ok(())
    }

    /// Renders a validation success message.
    pub fn validation_ok(&self, resource_count: usize) {
        match self.format {
            OutputFormat::Json => {
                println!(r#"{{"valid": true, "resources": {resource_count}}}"#);
            }
            OutputFormat::Text => {
                println!(
                    "{} {resource_count} resources validated",
                    "OK".green().bold()
                );
            }
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| crate::error::StackError::internal(e.to_string()))
}

fn colorize_state(state: ResourceState) -> colored::ColoredString {
    match state {
        ResourceState::Created => state.to_string().green(),
        ResourceState::Failed => state.to_string().red(),
        ResourceState::Resolving => state.to_string().yellow(),
        ResourceState::Declared => state.to_string().normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_string_slices_to_json() {
        // The plan command renders the order slice directly.
        let order = [String::from("pool"), String::from("domain")];
        let json = to_json(&order[..]).unwrap();
        assert!(json.contains("pool"));
        assert!(json.contains("domain"));
    }
}
