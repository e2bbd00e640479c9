//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over point requests from a CSV file.
//! Supports batch reading for the concurrent replay strategy.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - the csv_format module for validation and conversion
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of PointRequests
//!                  ↓
//!           csv_format module
//!           (CsvRequest, convert_csv_request)
//! ```
//!
//! Rejected rows are logged with their outward error code and skipped, so a
//! batch only ever contains requests that are safe to hand to the service.

use crate::io::csv_format::{convert_csv_request, CsvRequest};
use crate::types::PointRequest;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader
///
/// Provides batch reading interface over point requests.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    rejected: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            rejected: 0,
        }
    }

    /// Number of rows rejected so far
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Read a batch of point requests
    ///
    /// Reads up to `batch_size` accepted requests, in file order. Rejected
    /// rows are logged and skipped.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Maximum number of requests to return
    ///
    /// # Returns
    ///
    /// A vector of accepted requests. Empty once the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<PointRequest> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRequest>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_request)) => match convert_csv_request(csv_request) {
                    Ok(request) => batch.push(request),
                    Err(e) => {
                        self.rejected += 1;
                        tracing::warn!(code = e.code(), error = %e, "Rejected request row");
                    }
                },
                Some(Err(e)) => {
                    self.rejected += 1;
                    tracing::warn!(error = %e, "CSV parse error");
                }
                None => break,
            }
        }

        batch
    }
}
