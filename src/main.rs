//! Stackpilot CLI entrypoint.
//!
//! This is the main entrypoint for the stackpilot command-line tool.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use stackpilot::cli::{Cli, Commands, OutputFormatter};
use stackpilot::config::{ConfigParser, StackConfig, declare_stack, find_config_file};
use stackpilot::error::{Result, StackError};
use stackpilot::planner::DeploymentPlan;
use stackpilot::provider::SimulatedProvider;
use stackpilot::state::{LocalStateStore, RecordedResource, StackState, StateStore};

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let state_store = cli.state.as_ref().map_or_else(
        LocalStateStore::default_location,
        LocalStateStore::new,
    );

    match cli.command {
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Validate => cmd_validate(cli.config.as_ref(), &formatter),
        Commands::Plan => cmd_plan(cli.config.as_ref(), &formatter),
        Commands::Deploy { yes } => {
            cmd_deploy(cli.config.as_ref(), &state_store, yes, &formatter).await
        }
        Commands::Destroy { yes } => {
            cmd_destroy(cli.config.as_ref(), &state_store, yes, &formatter).await
        }
        Commands::Status => cmd_status(&state_store, &formatter).await,
    }
}

/// Initialize a new project.
fn cmd_init(path: &PathBuf, force: bool) -> Result<()> {
    info!("Initializing new stackpilot project in: {}", path.display());

    let config_path = path.join("stackpilot.stack.yaml");
    if !force && config_path.exists() {
        eprintln!("Stack file already exists: {}", config_path.display());
        eprintln!("Use --force to overwrite.");
        return Ok(());
    }

    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }

    let template = include_str!("../templates/stackpilot.stack.yaml");
    std::fs::write(&config_path, template)?;
    eprintln!("Created: {}", config_path.display());

    let gitignore_path = path.join(".gitignore");
    let ignore_line = ".stackpilot/";
    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        if !existing.contains(ignore_line) {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(&gitignore_path)?;
            writeln!(file, "{ignore_line}")?;
            eprintln!("Updated: {}", gitignore_path.display());
        }
    } else {
        std::fs::write(&gitignore_path, format!("{ignore_line}\n"))?;
        eprintln!("Created: {}", gitignore_path.display());
    }

    eprintln!("\nProject initialized. Next: stackpilot validate");
    Ok(())
}

/// Validate the stack declarations.
fn cmd_validate(config: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let (plan, _) = build_plan(config)?;
    plan.order()?;
    formatter.validation_ok(plan.resources().len());
    Ok(())
}

/// Show the creation order the next deploy would use.
fn cmd_plan(config: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let (plan, _) = build_plan(config)?;
    let order = plan.order()?;
    formatter.plan(&order, plan.resources())
}

/// Deploy the stack.
async fn cmd_deploy(
    config: Option<&PathBuf>,
    state_store: &LocalStateStore,
    yes: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (mut plan, stack) = build_plan(config)?;
    seed_from_state(&mut plan, state_store).await?;

    if !yes && !confirm("Deploy the stack?")? {
        eprintln!("Aborted.");
        return Ok(());
    }

    let provider = SimulatedProvider::new();
    let report = plan.deploy(&provider).await?;

    persist_state(state_store, &stack, &plan, &report.order).await?;
    formatter.report(&report)?;

    if report.success {
        Ok(())
    } else {
        Err(StackError::internal("deployment finished with failures"))
    }
}

/// Destroy all deployed resources.
async fn cmd_destroy(
    config: Option<&PathBuf>,
    state_store: &LocalStateStore,
    yes: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let (mut plan, stack) = build_plan(config)?;
    seed_from_state(&mut plan, state_store).await?;

    if !yes && !confirm("Destroy all deployed resources?")? {
        eprintln!("Aborted.");
        return Ok(());
    }

    let provider = SimulatedProvider::new();
    let report = plan.destroy(&provider).await?;

    // The destroy report walks teardown order; persist creation order.
    let creation_order: Vec<String> = report.order.iter().rev().cloned().collect();
    persist_state(state_store, &stack, &plan, &creation_order).await?;
    formatter.report(&report)?;

    if report.success {
        Ok(())
    } else {
        Err(StackError::internal("destroy finished with failures"))
    }
}

/// Show recorded deployment state.
async fn cmd_status(state_store: &LocalStateStore, formatter: &OutputFormatter) -> Result<()> {
    let state = state_store.load().await?;
    formatter.status(state.as_ref())
}

/// Loads the stack file and lowers it into a plan.
fn build_plan(config: Option<&PathBuf>) -> Result<(DeploymentPlan, StackConfig)> {
    let path = find_config_file(config)?;
    let stack = ConfigParser::new().parse_file(&path)?;
    let (resources, tags) = declare_stack(&stack);
    Ok((DeploymentPlan::new(resources, tags), stack))
}

/// Seeds a plan with resources recorded by an earlier run.
async fn seed_from_state(plan: &mut DeploymentPlan, state_store: &LocalStateStore) -> Result<()> {
    let Some(state) = state_store.load().await? else {
        return Ok(());
    };

    debug!("Seeding plan from {} recorded resources", state.resources.len());
    for recorded in state.resources.values() {
        plan.seed_created(&recorded.id, &recorded.provider_id, recorded.attributes.clone());
    }
    if !state.order.is_empty() {
        plan.seed_order(state.order);
    }
    Ok(())
}

/// Persists the plan's created resources back to the state store.
async fn persist_state(
    state_store: &LocalStateStore,
    stack: &StackConfig,
    plan: &DeploymentPlan,
    order: &[String],
) -> Result<()> {
    let mut state = StackState::new(&stack.project.name, &stack.project.environment);

    for resource in plan.resources() {
        if let Some(record) = plan.store().record(&resource.id)
            && let Some(provider_id) = &record.provider_id
            && plan.store().is_created(&resource.id)
        {
            state.set(RecordedResource::new(
                &resource.id,
                resource.kind,
                provider_id,
                record.attributes.clone(),
            ));
        }
    }

    if state.is_empty() {
        state_store.delete().await
    } else {
        state.order = order
            .iter()
            .filter(|id| state.resources.contains_key(*id))
            .cloned()
            .collect();
        state_store.save(&state).await
    }
}

/// Asks for confirmation on stderr.
fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
