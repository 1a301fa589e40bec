use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sdn_emu::scenario::{Scenario, ScenarioRunner};
use sdn_emu::{EmulatorConfig, EmulatorContext};

#[derive(Parser)]
#[command(name = "sdn-emu")]
#[command(about = "In-memory SDN control-plane emulator - replays command scenarios")]
struct Args {
    /// Scenario file (JSON) to replay
    scenario: PathBuf,

    /// Emulator config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tenant that owns created resources (overrides the config file)
    #[arg(long)]
    tenant_id: Option<String>,

    /// Seed for ids, names and MAC addresses (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the step report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sdn_emu=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EmulatorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EmulatorConfig::default(),
    };
    if let Some(tenant_id) = args.tenant_id {
        config.tenant_id = Some(tenant_id);
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let scenario = Scenario::from_file(&args.scenario)
        .with_context(|| format!("loading scenario {}", args.scenario.display()))?;

    let context = EmulatorContext::new(config);
    let network = context.network();
    info!(
        tenant_id = %network.tenant_id(),
        steps = scenario.steps.len(),
        "replaying scenario"
    );

    let mut runner = ScenarioRunner::new(&network);
    for (index, step) in scenario.steps.iter().enumerate() {
        let outcome = runner.run_step(index, step)?;
        println!("{}", outcome.to_json());
    }

    info!("scenario completed");
    Ok(())
}
