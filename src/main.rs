//! stagehand CLI — load a JSON plan, validate it, and run it against the
//! built-in registration set with an in-memory context store.

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use stagehand_engine::{render_report, ContextStore, ExecutionPlan, MemoryStore, PlanRunner, PlanStatus};
use stagehand_registry::{default_standalone_set, ComponentRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "stagehand",
    version = env!("CARGO_PKG_VERSION"),
    about = "Component execution & recovery engine — plan runner"
)]
struct Cli {
    /// Path to a JSON execution plan
    #[arg(short, long)]
    plan: PathBuf,

    /// Validate and print the step table without executing
    #[arg(long)]
    dry_run: bool,

    /// Seed a context value before the run (repeatable)
    #[arg(long = "seed", value_name = "TYPE:KEY=JSON")]
    seeds: Vec<String>,
}

fn parse_seed(raw: &str) -> anyhow::Result<(String, String, Value)> {
    let (addr, json) = raw
        .split_once('=')
        .context("seed must look like type:key=json")?;
    let (type_id, key) = addr
        .split_once(':')
        .context("seed must look like type:key=json")?;
    let value: Value =
        serde_json::from_str(json).with_context(|| format!("seed '{}' is not valid JSON", raw))?;
    Ok((type_id.to_string(), key.to_string(), value))
}

fn print_steps(plan: &ExecutionPlan) {
    if !plan.preloaded().is_empty() {
        println!("preloaded: {}", plan.preloaded().join(", "));
    }
    for (index, step) in plan.steps().iter().enumerate() {
        let inputs: Vec<String> = step
            .inputs
            .iter()
            .map(|i| format!("{}:{}", i.type_id, i.context_key))
            .collect();
        println!(
            "{:>3}. {} -> {} [{}] {}",
            index + 1,
            step.component,
            step.context_key,
            inputs.join(", "),
            step.objective,
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stagehand=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.plan)
        .with_context(|| format!("reading {}", cli.plan.display()))?;
    let plan: ExecutionPlan = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", cli.plan.display()))?;

    if cli.dry_run {
        print_steps(&plan);
        return Ok(());
    }

    let mut store = MemoryStore::new();
    for raw in &cli.seeds {
        let (type_id, key, value) = parse_seed(raw)?;
        store.store(&type_id, &key, value);
    }

    let mut registry = ComponentRegistry::build_standalone(default_standalone_set());
    registry.initialize()?;

    let runner = PlanRunner::new(Arc::new(registry));
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });

    let mut history = Vec::new();
    let status = runner.run(&plan, &mut store, &mut history, cancel).await?;
    println!("{}", render_report(runner.run_id(), &status, &history));

    if !matches!(status, PlanStatus::Completed) {
        std::process::exit(1);
    }
    Ok(())
}
