use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use levy::api;
use levy::core::{DatasetStore, MAX_SYNTH_RECORDS, TaxLawTable};

#[derive(Parser, Debug)]
#[command(
    name = "levy",
    about = "2024 taxpayer population synthesis, tax computation, and analytics API"
)]
enum Cli {
    /// Start the HTTP API with a synthesized initial population.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(
            long,
            default_value_t = 500,
            value_parser = clap::value_parser!(u32).range(1..=MAX_SYNTH_RECORDS as i64),
            help = "Initial synthesized population size"
        )]
        records: u32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Cli::Serve {
        port,
        records,
        seed,
    } = Cli::parse();

    let tables = match TaxLawTable::year_2024() {
        Ok(tables) => tables,
        Err(e) => {
            error!("refusing to start with a malformed tax law table: {e}");
            std::process::exit(1);
        }
    };

    let store = Arc::new(DatasetStore::new(tables));
    if let Err(e) = store.regenerate(records, seed) {
        error!("failed to synthesize the initial population: {e}");
        std::process::exit(1);
    }
    info!(records, seed, "seeded initial population");

    if let Err(e) = api::run_http_server(port, store).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
