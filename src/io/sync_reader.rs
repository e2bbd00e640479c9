//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over point requests from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read and deserialize rows sequentially,
//! delegating validation and conversion to the csv_format module. Rows are
//! processed one at a time without loading the whole file into memory.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<PointRequest, String>` for each CSV row:
//!
//! ```no_run
//! use point_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("requests.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(request) => println!("Accepted request: {:?}", request),
//!         Err(e) => eprintln!("Rejected row: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Rejected rows are yielded as Err variants carrying the line number and
//!   the outward error code, e.g. `Line 3: [INVALID_ACCOUNT_ID] ...`

use crate::io::csv_format::{convert_csv_request, CsvRequest};
use crate::types::PointRequest;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
///
/// Provides an iterator interface over point requests.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (for a missing amount column)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    ///
    /// # Returns
    ///
    /// * `Ok(SyncReader)` if file opened successfully
    /// * `Err(String)` if file could not be opened
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<PointRequest, String>;

    /// Get the next point request from the CSV file
    ///
    /// # Returns
    ///
    /// * `Some(Ok(PointRequest))` - Accepted row
    /// * `Some(Err(String))` - Parse or validation error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRequest>();

        let row = deserializer.next()?;
        self.line_num += 1;
        // +1 for the header row
        let line = self.line_num + 1;

        Some(match row {
            Ok(csv_request) => convert_csv_request(csv_request)
                .map_err(|e| format!("Line {}: [{}] {}", line, e.code(), e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_new_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_reader_iterates_requests_in_order() {
        let csv_content = "type,account,amount\ncharge,123,2500\nuse,123,1000\n";
        let file = create_temp_csv(csv_content);

        let reader = SyncReader::new(file.path()).unwrap();
        let requests: Vec<_> = reader.map(Result::unwrap).collect();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].account, 123);
        assert_eq!(requests[0].mutation.kind, TransactionType::Charge);
        assert_eq!(requests[0].mutation.amount, 2500);
        assert_eq!(requests[1].mutation.kind, TransactionType::Use);
        assert_eq!(requests[1].mutation.amount, 1000);
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_and_codes_in_errors() {
        let csv_content = "type,account,amount\n\
            charge,1,100\n\
            charge,abc,100\n\
            use,1,lots\n";
        let file = create_temp_csv(csv_content);

        let reader = SyncReader::new(file.path()).unwrap();
        let rows: Vec<_> = reader.collect();

        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());

        let error = rows[1].as_ref().unwrap_err();
        assert!(error.starts_with("Line 3: [INVALID_ACCOUNT_ID]"), "{}", error);

        let error = rows[2].as_ref().unwrap_err();
        assert!(error.starts_with("Line 4: [INVALID_AMOUNT]"), "{}", error);
    }

    #[test]
    fn test_sync_reader_handles_whitespace_and_missing_amount() {
        let csv_content = "type,account,amount\n  charge  ,  7  ,  70  \nuse,7\n";
        let file = create_temp_csv(csv_content);

        let reader = SyncReader::new(file.path()).unwrap();
        let rows: Vec<_> = reader.collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].as_ref().unwrap().mutation.amount, 70);
        assert!(rows[1].as_ref().unwrap_err().contains("INVALID_AMOUNT"));
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("type,account,amount\n");

        let reader = SyncReader::new(file.path()).unwrap();

        assert_eq!(reader.count(), 0);
    }

    #[test]
    fn test_sync_reader_filter_map_pattern() {
        let csv_content = "type,account,amount\n\
            charge,1,100\n\
            withdraw,2,50\n\
            use,1,40\n";
        let file = create_temp_csv(csv_content);

        let reader = SyncReader::new(file.path()).unwrap();
        let valid: Vec<_> = reader.filter_map(Result::ok).collect();

        assert_eq!(valid.len(), 2);
        assert_eq!(valid[1].mutation.kind, TransactionType::Use);
    }
}
