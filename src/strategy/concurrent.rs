//! Concurrent replay strategy
//!
//! This module replays requests the way a busy service boundary sees them:
//! many calls in flight at once, for many accounts, without the callers
//! coordinating among themselves.
//!
//! # Architecture
//!
//! ```text
//! ConcurrentReplayStrategy
//!     ├── ReplayConfig (batch_size, worker_threads, store latency)
//!     ├── AsyncReader (batch CSV reading)
//!     └── LedgerService
//!         ├── AccountSerializer (one FIFO lane per account)
//!         └── InMemoryLedgerStore (DashMap-backed balances + history)
//! ```
//!
//! # Ordering
//!
//! Every request of a batch is submitted in file order without waiting for
//! the previous one, then the whole batch is awaited. Submission enqueues on
//! the account's lane immediately, so per-account file order is preserved by
//! the serializer while different accounts are applied in parallel. The
//! final balances are therefore identical to a sequential replay.

use super::{build_runtime, build_service, write_results, ReplayConfig, ReplaySummary};
use crate::core::LedgerConfig;
use crate::io::async_reader::AsyncReader;
use crate::strategy::ReplayStrategy;
use futures::future::join_all;
use std::io::Write;
use std::path::Path;

/// Concurrent replay strategy
#[derive(Debug, Clone)]
pub struct ConcurrentReplayStrategy {
    config: ReplayConfig,
    ledger: LedgerConfig,
}

impl ConcurrentReplayStrategy {
    /// Create a new ConcurrentReplayStrategy
    ///
    /// # Arguments
    ///
    /// * `config` - Batch size, worker threads and store latency
    /// * `ledger` - Configuration for the ledger service
    pub fn new(config: ReplayConfig, ledger: LedgerConfig) -> Self {
        Self { config, ledger }
    }
}

impl ReplayStrategy for ConcurrentReplayStrategy {
    /// Replay requests from input file and write balances to output
    ///
    /// 1. Creates a tokio multi-threaded runtime
    /// 2. Reads requests in batches with AsyncReader
    /// 3. Submits each batch in file order, then awaits all of it
    /// 4. Writes final balances (and the history file, if configured)
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = build_runtime(self.config.worker_threads)?;

        runtime.block_on(async {
            let service = build_service(&self.config, &self.ledger);

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut summary = ReplaySummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                let pending: Vec<_> = batch
                    .iter()
                    .map(|request| service.apply(request.account, request.mutation))
                    .collect();

                for (request, result) in batch.iter().zip(join_all(pending).await) {
                    summary.record(request, &result);
                }
            }
            summary.malformed = reader.rejected();

            write_results(
                &service,
                &summary,
                self.config.history_path.as_deref(),
                output,
            )
            .await
        })
    }
}
