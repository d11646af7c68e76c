mod elements;
mod error;
mod passes;
mod predict;
mod registry;
mod reservations;
mod store;
mod web;

#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use crate::reservations::{ReservationLedger, StoreCommandCatalog};
use crate::store::Store;
use crate::web::config::{Config, PredictorConfig};
use crate::web::AppState;

#[derive(Parser)]
#[command(name = "pass-o-mat")]
#[command(about = "Ground station pass prediction and booking")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate { config: String },
    /// Start the booking API server
    Serve {
        #[arg(short, long)]
        config: String,
    },
    /// Purge cancelled reservations and passes that have ended
    Cleanup {
        #[arg(short, long)]
        config: String,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Serve { config } => with_runtime(serve(&config)),
        Commands::Cleanup { config } => with_runtime(cleanup(&config)),
    }
}

fn with_runtime(task: impl std::future::Future<Output = ExitCode>) -> ExitCode {
    match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(task),
        Err(e) => {
            eprintln!("Failed to start async runtime: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            None
        }
    }
}

fn validate(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    println!("Config is valid");
    println!("  bind:        {}", config.web.bind);
    println!("  database:    {}", config.database.path.display());
    match &config.predictor {
        PredictorConfig::Sgp4 { min_elevation_deg } => {
            println!("  predictor:   SGP4 (min elevation {} deg)", min_elevation_deg)
        }
        PredictorConfig::N2yo { base_url, .. } => {
            let key = if config.predictor.n2yo_api_key().is_some() {
                "key set"
            } else {
                "NO API KEY"
            };
            println!("  predictor:   N2YO at {} ({})", base_url, key)
        }
    }
    println!("  elements:    {:?}", config.elements.source);
    println!(
        "  staleness:   {}",
        humantime::format_duration(config.elements.staleness)
    );
    println!(
        "  claim grace: {}",
        humantime::format_duration(config.reservations.claim_grace)
    );
    println!(
        "  timeout:     {}",
        humantime::format_duration(config.upstream.timeout)
    );
    ExitCode::SUCCESS
}

async fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let store = match Store::open(&config.database.path).await {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::from_config(&config, store) {
        Ok(s) => s,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match web::run_server(state, &config.web.bind).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cleanup(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let store = match Store::open(&config.database.path).await {
        Ok(s) => s,
        Err(e) => {
            log::error!("Failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let claim_grace = chrono::Duration::from_std(config.reservations.claim_grace)
        .unwrap_or_else(|_| chrono::Duration::seconds(2));
    let ledger = ReservationLedger::new(
        store.clone(),
        Arc::new(StoreCommandCatalog::new(store)),
        claim_grace,
    );

    match ledger.purge_cancelled_expired(chrono::Utc::now()).await {
        Ok(report) => {
            println!(
                "Purged {} cancelled reservations and {} expired passes",
                report.purged_reservations, report.purged_passes
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Cleanup failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
