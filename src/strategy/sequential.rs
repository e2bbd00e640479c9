//! Sequential replay strategy
//!
//! Replays requests one at a time: each request is awaited before the next
//! row is read. This is the reference ordering the concurrent strategy must
//! reproduce.
//!
//! # Design
//!
//! The SequentialReplayStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Mutation logic to `LedgerService`
//! - CSV output to `csv_format` (format handling)

use super::{build_runtime, build_service, write_results, ReplayConfig, ReplaySummary};
use crate::core::LedgerConfig;
use crate::io::sync_reader::SyncReader;
use crate::strategy::ReplayStrategy;
use std::io::Write;
use std::path::Path;

/// Sequential replay strategy
///
/// # Examples
///
/// ```no_run
/// use point_ledger::core::LedgerConfig;
/// use point_ledger::strategy::{ReplayConfig, ReplayStrategy, SequentialReplayStrategy};
/// use std::path::Path;
/// use std::io;
///
/// let strategy = SequentialReplayStrategy::new(ReplayConfig::default(), LedgerConfig::default());
/// let mut output = io::stdout();
///
/// strategy.process(Path::new("requests.csv"), &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone)]
pub struct SequentialReplayStrategy {
    config: ReplayConfig,
    ledger: LedgerConfig,
}

impl SequentialReplayStrategy {
    /// Create a new SequentialReplayStrategy
    pub fn new(config: ReplayConfig, ledger: LedgerConfig) -> Self {
        Self { config, ledger }
    }
}

impl ReplayStrategy for SequentialReplayStrategy {
    /// Replay requests from input file and write balances to output
    ///
    /// 1. Opens the CSV file with a SyncReader
    /// 2. Awaits every accepted request through the ledger service in order
    /// 3. Logs rejected rows and rejected mutations, and continues
    /// 4. Writes final balances (and the history file, if configured)
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let reader = SyncReader::new(input_path)?;
        let runtime = build_runtime(self.config.worker_threads)?;

        runtime.block_on(async {
            let service = build_service(&self.config, &self.ledger);
            let mut summary = ReplaySummary::default();

            for row in reader {
                match row {
                    Ok(request) => {
                        let result = service.apply(request.account, request.mutation).await;
                        summary.record(&request, &result);
                    }
                    Err(e) => {
                        summary.malformed += 1;
                        tracing::warn!(error = %e, "Rejected request row");
                    }
                }
            }

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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn strategy() -> SequentialReplayStrategy {
        SequentialReplayStrategy::new(ReplayConfig::new(1000, 2), LedgerConfig::default())
    }

    #[test]
    fn test_sequential_strategy_charge_then_use() {
        let file = create_temp_csv("type,account,amount\ncharge,123,2500\nuse,123,1000\n");
        let mut output = Vec::new();

        strategy().process(file.path(), &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "account,point\n123,1500\n");
    }

    #[test]
    fn test_sequential_strategy_handles_missing_file() {
        let mut output = Vec::new();

        let result = strategy().process(Path::new("nonexistent.csv"), &mut output);

        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sequential_strategy_continues_after_rejections() {
        let csv_content = "type,account,amount\n\
                          use,1,100\n\
                          charge,abc,100\n\
                          charge,1,300\n\
                          use,1,500\n\
                          use,1,-1\n\
                          use,1,300\n";
        let file = create_temp_csv(csv_content);
        let mut output = Vec::new();

        strategy().process(file.path(), &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "account,point\n1,0\n");
    }

    #[test]
    fn test_sequential_strategy_writes_history_file() {
        let file = create_temp_csv("type,account,amount\ncharge,2,50\nuse,2,20\ncharge,1,5\n");
        let history = NamedTempFile::new().unwrap();
        let config = ReplayConfig::new(1000, 2).with_history_path(history.path());
        let strategy = SequentialReplayStrategy::new(config, LedgerConfig::default());
        let mut output = Vec::new();

        strategy.process(file.path(), &mut output).unwrap();

        let written = std::fs::read_to_string(history.path()).unwrap();
        let rows: Vec<Vec<&str>> = written
            .lines()
            .skip(1)
            .map(|line| line.split(',').take(4).collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["3", "1", "CHARGE", "5"],
                vec!["1", "2", "CHARGE", "50"],
                vec!["2", "2", "USE", "20"],
            ]
        );
    }

    #[test]
    fn test_sequential_strategy_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SequentialReplayStrategy>();
    }

    #[test]
    fn test_sequential_strategy_applies_timed_out_requests() {
        let file = create_temp_csv("type,account,amount\ncharge,1,100\ncharge,1,200\n");
        let history = NamedTempFile::new().unwrap();
        let config = ReplayConfig::new(1000, 2)
            .with_store_latency(Duration::from_millis(30))
            .with_history_path(history.path());
        let ledger = LedgerConfig {
            request_timeout: Some(Duration::from_millis(1)),
            idle_eviction: None,
        };
        let strategy = SequentialReplayStrategy::new(config, ledger);
        let mut output = Vec::new();

        strategy.process(file.path(), &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "account,point\n1,300\n");
        let written = std::fs::read_to_string(history.path()).unwrap();
        assert_eq!(written.lines().count(), 3);
    }
}
