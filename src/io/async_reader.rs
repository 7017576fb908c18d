//! Asynchronous CSV reader with batch interface
//!
//! Streams ledger operations from a CSV source in batches for the concurrent
//! processing strategy. Delegates row conversion to the csv_format module;
//! malformed rows are logged and skipped so a bad row never stalls a batch.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::Operation;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Provides batch reading over ledger operations while keeping memory usage
/// bounded by the batch size.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async byte source
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` operations
    ///
    /// Malformed rows are reported via tracing and skipped. An empty vector
    /// signals end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => match convert_csv_record(csv_record) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => warn!("row conversion error: {}", e),
                },
                Some(Err(e)) => warn!("csv parse error: {}", e),
                None => break,
            }
        }

        batch
    }
}
