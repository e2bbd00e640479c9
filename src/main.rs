//! Point Ledger CLI
//!
//! Replays point charge/use requests from a CSV file against the ledger
//! service and prints the final balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- requests.csv > balances.csv
//! cargo run -- --strategy sequential requests.csv > balances.csv
//! cargo run -- --strategy concurrent --batch-size 2000 --worker-threads 8 requests.csv > balances.csv
//! cargo run -- --history history.csv --store-latency-ms 5 requests.csv > balances.csv
//! ```
//!
//! Balances go to stdout; logs go to stderr (`RUST_LOG` overrides the
//! default filter).
//!
//! # Exit Codes
//!
//! - 0: Success (individual requests may have been rejected)
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use point_ledger::cli;
use point_ledger::strategy;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,point_ledger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = cli::parse_args();

    let strategy = strategy::create_strategy(
        args.strategy,
        Some(args.to_replay_config()),
        args.to_ledger_config(),
    );

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        tracing::error!(error = %e, "Replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
