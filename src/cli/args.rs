use crate::core::LedgerConfig;
use crate::strategy::ReplayConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Replay point charge/use requests against a per-account ledger
#[derive(Parser, Debug)]
#[command(name = "point-ledger")]
#[command(about = "Replay point charge/use requests against a per-account ledger", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing point requests
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Replay strategy to use for processing requests
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "concurrent",
        help = "Replay strategy: 'sequential' awaits each request, 'concurrent' submits whole batches"
    )]
    pub strategy: StrategyType,

    /// Number of requests per batch (concurrent mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of requests submitted together (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of runtime worker threads
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Number of runtime worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,

    /// Where to write the transaction history
    #[arg(long = "history", value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// Simulated latency of every store call, in milliseconds
    #[arg(long = "store-latency-ms", value_name = "MS")]
    pub store_latency_ms: Option<u64>,

    /// Give up waiting for a request after this many milliseconds
    #[arg(long = "request-timeout-ms", value_name = "MS")]
    pub request_timeout_ms: Option<u64>,

    /// Drop an account's lane after it has been idle this many milliseconds
    #[arg(long = "idle-evict-ms", value_name = "MS")]
    pub idle_evict_ms: Option<u64>,
}

/// Available replay strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sequential,
    Concurrent,
}

/// Zero disables a millisecond option
fn millis(value: Option<u64>) -> Option<Duration> {
    value.filter(|ms| *ms > 0).map(Duration::from_millis)
}

impl CliArgs {
    /// Create a ReplayConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero sizes fall back with a
    /// warning (see [`ReplayConfig::new`]).
    pub fn to_replay_config(&self) -> ReplayConfig {
        let default = ReplayConfig::default();
        let mut config = ReplayConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.worker_threads.unwrap_or(default.worker_threads),
        );

        if let Some(path) = &self.history {
            config = config.with_history_path(path);
        }
        if let Some(latency) = millis(self.store_latency_ms) {
            config = config.with_store_latency(latency);
        }
        config
    }

    /// Create the ledger service configuration from CLI arguments
    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            request_timeout: millis(self.request_timeout_ms),
            idle_eviction: millis(self.idle_evict_ms),
        }
    }
}
