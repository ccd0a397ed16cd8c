use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use croppilot::{
    dataset::Dataset,
    engine::{EngineBuilder, EngineSettings},
    plan::{self, Plan},
    scenario::ScenarioLoader,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Satellite-data farming season simulator")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, global = true, default_value = "scenarios/punjab.yaml")]
    scenario: PathBuf,

    /// Path to the regional dataset YAML file
    #[arg(long, global = true, default_value = "data/regions.yaml")]
    data: PathBuf,

    /// Override the scenario's region
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the game API over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 5000)]
        port: u16,
        /// Write session snapshots under this directory
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
    /// Play a scripted season and print the report
    Replay {
        /// Path to the plan YAML file
        #[arg(long)]
        plan: PathBuf,
        /// Directory for snapshots
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let mut scenario = ScenarioLoader::new(".").load(&cli.scenario)?;
    if let Some(region) = cli.region {
        scenario = scenario.with_region(region);
    }
    let dataset = Dataset::load(&cli.data)
        .with_context(|| format!("Failed to load dataset {}", cli.data.display()))?;
    info!(
        scenario = %scenario.name,
        region = %scenario.region,
        regions = ?dataset.regions(),
        "loaded scenario and dataset"
    );

    match cli.command {
        Command::Serve {
            host,
            port,
            snapshot_dir,
        } => {
            web::run(WebServerConfig {
                scenario,
                source: Arc::new(dataset),
                snapshot_dir,
                host,
                port,
            })
            .await
        }
        Command::Replay {
            plan: plan_path,
            snapshot_dir,
        } => {
            let script = Plan::load(&plan_path)?;
            let mut settings = EngineSettings::from_scenario(&scenario);
            if let Some(dir) = snapshot_dir {
                settings = settings.with_snapshot_dir(dir);
            }
            let mut engine = EngineBuilder::new(settings)
                .with_default_systems()
                .build(scenario.session_config());
            let report = plan::replay(&mut engine, &script, &dataset, &scenario.prices);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}
