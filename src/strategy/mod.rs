//! Replay strategy module for request processing
//!
//! This module defines the Strategy pattern for complete request replay
//! pipelines: reading point requests from CSV, driving them through the
//! ledger service, and writing the resulting balances (and optionally the
//! history). Different replay implementations (sequential, concurrent) can be
//! selected at runtime.

use crate::cli::StrategyType;
use crate::core::{InMemoryLedgerStore, LedgerConfig, LedgerService, LedgerStore};
use crate::io::csv_format::{write_balances_csv, write_history_csv};
use crate::types::{AccountBalance, LedgerError, PointRequest};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub mod concurrent;
pub mod sequential;

pub use concurrent::ConcurrentReplayStrategy;
pub use sequential::SequentialReplayStrategy;

/// Configuration shared by the replay strategies
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Number of requests read and submitted together (concurrent mode)
    pub batch_size: usize,
    /// Number of runtime worker threads
    pub worker_threads: usize,
    /// Where to write the transaction history, if anywhere
    pub history_path: Option<PathBuf>,
    /// Simulated latency of every store call
    pub store_latency: Option<Duration>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            worker_threads: num_cpus::get(),
            history_path: None,
            store_latency: None,
        }
    }
}

impl ReplayConfig {
    /// Create a new ReplayConfig with custom sizing
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(batch_size: usize, worker_threads: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                default = default.batch_size,
                "Invalid batch_size (0), using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let worker_threads = if worker_threads == 0 {
            tracing::warn!(
                default = default.worker_threads,
                "Invalid worker_threads (0), using default"
            );
            default.worker_threads
        } else {
            worker_threads
        };

        Self {
            batch_size,
            worker_threads,
            ..default
        }
    }

    /// Write the transaction history to `path` after replay
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    /// Delay every store call by `latency`
    pub fn with_store_latency(mut self, latency: Duration) -> Self {
        self.store_latency = Some(latency);
        self
    }
}

/// Replay strategy trait for complete request processing pipelines
pub trait ReplayStrategy: Send + Sync {
    /// Replay requests from input file and write final balances to output
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input CSV file containing point requests
    /// * `output` - Mutable reference to a writer for outputting balances
    ///
    /// # Returns
    ///
    /// * `Ok(())` if replay completed (individual requests may have been rejected)
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error, etc.)
    ///
    /// Rejected rows and rejected mutations are logged and do not stop the
    /// replay.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a replay strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - Sequential or concurrent replay
/// * `config` - Optional replay configuration (defaults if `None`)
/// * `ledger` - Configuration for the ledger service the replay drives
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<ReplayConfig>,
    ledger: LedgerConfig,
) -> Box<dyn ReplayStrategy> {
    let config = config.unwrap_or_default();
    match strategy_type {
        StrategyType::Sequential => Box::new(SequentialReplayStrategy::new(config, ledger)),
        StrategyType::Concurrent => Box::new(ConcurrentReplayStrategy::new(config, ledger)),
    }
}

/// Tally of replay outcomes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Mutations applied to the ledger
    pub applied: usize,
    /// Mutations refused by a business rule
    pub rejected: usize,
    /// Mutations that failed for infrastructure reasons
    pub failed: usize,
    /// Rows refused at the boundary before reaching the service
    pub malformed: usize,
}

impl ReplaySummary {
    /// Count the outcome of one request, logging anything but success
    pub fn record(&mut self, request: &PointRequest, result: &Result<AccountBalance, LedgerError>) {
        match result {
            Ok(_) => self.applied += 1,
            Err(e) => {
                if e.is_domain_rejection() {
                    self.rejected += 1;
                } else {
                    self.failed += 1;
                }
                tracing::warn!(
                    account = request.account,
                    kind = %request.mutation.kind,
                    amount = request.mutation.amount,
                    code = e.code(),
                    error = %e,
                    "Request not applied"
                );
            }
        }
    }

    fn log(&self) {
        tracing::info!(
            applied = self.applied,
            rejected = self.rejected,
            failed = self.failed,
            malformed = self.malformed,
            "Replay finished"
        );
    }
}

fn build_runtime(worker_threads: usize) -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create tokio runtime: {}", e))
}

fn build_service(config: &ReplayConfig, ledger: &LedgerConfig) -> LedgerService {
    let store: Arc<dyn LedgerStore> = match config.store_latency {
        Some(latency) => Arc::new(InMemoryLedgerStore::with_latency(latency)),
        None => Arc::new(InMemoryLedgerStore::new()),
    };
    LedgerService::with_config(store, ledger.clone())
}

/// Write final balances to `output` and, if configured, the history file
async fn write_results(
    service: &LedgerService,
    summary: &ReplaySummary,
    history_path: Option<&Path>,
    output: &mut dyn Write,
) -> Result<(), String> {
    // Timed-out requests are still queued; they count toward the final state.
    service.drain().await;
    summary.log();

    let balances = service
        .balances()
        .await
        .map_err(|e| format!("Failed to read balances: {}", e))?;

    write_balances_csv(&balances, output)?;

    if let Some(path) = history_path {
        let mut records = Vec::new();
        for balance in &balances {
            let history = service
                .get_history(balance.id)
                .await
                .map_err(|e| format!("Failed to read history for account {}: {}", balance.id, e))?;
            records.extend(history);
        }

        let mut file = std::fs::File::create(path)
            .map_err(|e| format!("Failed to create history file '{}': {}", path.display(), e))?;
        write_history_csv(&records, &mut file)?;
    }

    Ok(())
}
