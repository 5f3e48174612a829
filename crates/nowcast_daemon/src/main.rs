pub mod api;
pub mod config;

use crate::api::AppState;
use crate::config::{Config, LoggingConfig};
use anyhow::Context;
use clap::{Parser, Subcommand};
use nowcast_core::{resolve_model, LOOKBACK};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nowcast")]
#[command(about = "Time-of-day aware forecasting over a rolling window of readings")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model artifact to try (repeatable; replaces the configured candidates)
    #[arg(long = "model", global = true)]
    models: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the model and serve predictions over HTTP
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Resolve and load the model, then exit
    CheckModel,
}

/// Parses `logging.level` as a single level (`trace`..`error`, `off`).
fn level_directive(level: &str) -> Result<LevelFilter, String> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| format!("invalid logging.level {level:?}, falling back to info"))
}

fn init_tracing(logging: &LoggingConfig) {
    let mut problem = None;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level_directive(&logging.level).unwrap_or_else(|e| {
            problem = Some(e);
            LevelFilter::INFO
        });
        EnvFilter::default().add_directive(level.into())
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Failed to install tracing subscriber: {e}");
    }
    if let Some(problem) = problem {
        warn!("{problem}");
    }
}

fn serve(config: Config) -> anyhow::Result<()> {
    let history = config.history.build()?;
    // Serving without a model is not a valid state: fail before binding.
    let (model_path, model) = resolve_model(&config.model.candidates)?;

    info!(
        model = %model_path.display(),
        lookback = LOOKBACK,
        retention = ?history.retention(),
        "Starting prediction service"
    );

    let state = AppState::new(history, Arc::new(model), model_path);

    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    rt.block_on(api::run_api_server(&config.server, state))
}

fn check_model(config: &Config) -> anyhow::Result<()> {
    let (model_path, _model) = resolve_model(&config.model.candidates)?;
    info!(model = %model_path.display(), "Model OK");
    println!("{}", model_path.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let loaded = Config::load(cli.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging);

    let result = loaded.and_then(|config| match cli.command {
        Commands::Serve { host, port } => serve(config.with_overrides(host, port, cli.models)),
        Commands::CheckModel => check_model(&config.with_overrides(None, None, cli.models)),
    });

    if let Err(e) = result {
        error!(error = %format!("{e:#}"), "Fatal Error");
        std::process::exit(1);
    }
}
