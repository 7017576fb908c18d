//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over ledger operations from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! Fatal errors (file not found) are returned from `new()`; individual row
//! parsing errors are yielded as `Err` variants with line numbers so callers
//! can report them and continue. Memory usage stays O(1) per row.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{LedgerError, Operation};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
///
/// Provides an iterator interface over ledger operations, reading one row at
/// a time.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to trim whitespace, allow flexible field
    /// counts (trailing empty fields may be omitted), and buffer reads.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| LedgerError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        })?;

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
    type Item = Result<Operation, LedgerError>;

    /// Get the next operation from the CSV file
    ///
    /// Yields `Some(Err(ParseError))` with a line number for malformed rows
    /// and `None` at end of file.
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();

        match deserializer.next()? {
            Ok(csv_record) => {
                self.line_num += 1;
                // Line numbers are offset by one for the header row
                let line = self.line_num + 1;
                Some(
                    convert_csv_record(csv_record).map_err(|message| LedgerError::ParseError {
                        line: Some(line),
                        message,
                    }),
                )
            }
            Err(e) => {
                self.line_num += 1;
                Some(Err(LedgerError::ParseError {
                    line: Some(self.line_num + 1),
                    message: e.to_string(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransferSource;
    use rust_decimal::Decimal;
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
    fn test_sync_reader_new_opens_file() {
        let file = create_temp_csv("op,account,to,node,amount\ncreate,alice,,PartyB,100\n");
        assert!(SyncReader::new(file.path()).is_ok());
    }

    #[test]
    fn test_sync_reader_new_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(LedgerError::IoError { .. })));
    }

    #[test]
    fn test_sync_reader_iterates_operations() {
        let file = create_temp_csv(
            "op,account,to,node,amount\n\
             create,alice,,PartyB,100\n\
             create,bob,,PartyB,50\n\
             transfer,alice,bob,,30\n",
        );

        let reader = SyncReader::new(file.path()).unwrap();
        let operations: Vec<_> = reader.filter_map(Result::ok).collect();

        assert_eq!(operations.len(), 3);
        match &operations[2] {
            Operation::Transfer(request) => {
                assert_eq!(request.source, TransferSource::Account("alice".to_string()));
                assert_eq!(request.amount, Decimal::new(30, 0));
            }
            other => panic!("expected transfer, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let file = create_temp_csv(
            "op,account,to,node,amount\n\
             create,alice,,PartyB,100\n\
             mint,alice,,,50\n\
             issue,,,,25\n",
        );

        let reader = SyncReader::new(file.path()).unwrap();
        let results: Vec<_> = reader.collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[2].is_ok());
        match &results[1] {
            Err(LedgerError::ParseError { line, message }) => {
                assert_eq!(*line, Some(3)); // header is line 1
                assert!(message.contains("Invalid operation"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_reader_continues_after_error() {
        let file = create_temp_csv(
            "op,account,to,node,amount\n\
             issue,,,,abc\n\
             issue,,,,10\n",
        );

        let reader = SyncReader::new(file.path()).unwrap();
        let results: Vec<_> = reader.collect();

        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_sync_reader_handles_whitespace() {
        let file =
            create_temp_csv("op,account,to,node,amount\n  create , alice ,, PartyB , 100 \n");

        let reader = SyncReader::new(file.path()).unwrap();
        let operations: Vec<_> = reader.filter_map(Result::ok).collect();

        assert_eq!(operations.len(), 1);
        match &operations[0] {
            Operation::CreateAccount { name, .. } => assert_eq!(name, "alice"),
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("op,account,to,node,amount\n");
        let reader = SyncReader::new(file.path()).unwrap();
        assert_eq!(reader.count(), 0);
    }
}
