//! Bulk copy orchestration.
//!
//! `BulkCopy` pulls rows from a `RowSource`, maps and encodes them for the
//! destination table and feeds them to a `BatchWriter`. The first value that
//! fails to encode aborts the copy; batches already acknowledged stay
//! committed.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::batch::{BatchWriter, BulkTarget};
use crate::connection::{BulkConnection, SchemaResolver};
use crate::error::{Error, Result};
use crate::mapping::{ColumnMapping, ColumnMappingEntry, ColumnRef};
use crate::options::BulkCopyOptions;
use crate::protocol::encode::RowEncoder;
use crate::protocol::types::ColumnDescriptor;
use crate::source::RowSource;

/// Outcome of a completed copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSummary {
    /// Rows committed by the server.
    pub rows_copied: u64,
    /// Batches sent.
    pub batches: usize,
}

/// Copies rows into one destination table over one connection.
///
/// The connection is borrowed exclusively for the lifetime of the `BulkCopy`.
///
/// # Example
///
/// ```no_run
/// use mssql_bulk_rs::{BulkCopy, BulkCopyOptions, MemorySource, SourceType, SqlValue, TdsConnection};
/// use tokio::net::TcpStream;
///
/// # async fn run(stream: TcpStream) -> mssql_bulk_rs::Result<()> {
/// // `stream` has already completed login
/// let mut conn = TdsConnection::new(stream);
///
/// let mut source = MemorySource::new();
/// source.add_column_metadata(1, "id", SourceType::Integer, 0, 0)?;
/// let mut source = source.with_rows((1..=10_000).map(|i| vec![SqlValue::Int(i)]));
///
/// let summary = BulkCopy::new(&mut conn, "dbo.numbers")
///     .with_options(BulkCopyOptions::new().with_batch_size(1000))
///     .write_to_server(&mut source)
///     .await?;
/// assert_eq!(summary.rows_copied, 10_000);
/// # Ok(())
/// # }
/// ```
pub struct BulkCopy<'c, C> {
    conn: &'c mut C,
    table: String,
    options: BulkCopyOptions,
    mappings: Vec<ColumnMappingEntry>,
}

impl<'c, C: BulkConnection> BulkCopy<'c, C> {
    pub fn new(conn: &'c mut C, table: impl Into<String>) -> Self {
        Self {
            conn,
            table: table.into(),
            options: BulkCopyOptions::default(),
            mappings: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: BulkCopyOptions) -> Self {
        self.options = options;
        self
    }

    /// Map a source column to a destination column.
    ///
    /// Once any mapping is added, only mapped columns are copied.
    pub fn with_column_mapping(
        mut self,
        source: impl Into<ColumnRef>,
        destination: impl Into<ColumnRef>,
    ) -> Self {
        self.mappings.push(ColumnMappingEntry::new(source, destination));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn options(&self) -> &BulkCopyOptions {
        &self.options
    }

    /// Copy all rows of `source` into a table whose columns are already known.
    pub async fn write_with_schema<R: RowSource>(
        &mut self,
        source: &mut R,
        destination: &[ColumnDescriptor],
    ) -> Result<TransferSummary> {
        self.options.validate()?;
        self.conn.set_operation_timeout(self.options.operation_timeout);

        let mut mapping = ColumnMapping::build(source.columns(), destination, &self.mappings)?;
        if !self.options.preserve_identity {
            mapping = mapping.without_identity();
        }
        if mapping.is_empty() {
            return Err(Error::schema_mismatch(format!(
                "No columns to copy into '{}'",
                self.table
            )));
        }

        let target = BulkTarget::new(self.table.clone(), mapping.destination_columns())
            .with_hints(self.options.hints());
        let mut encoder = RowEncoder::new(target.columns.clone());
        let source_width = source.columns().len();

        info!(
            table = %self.table,
            columns = mapping.len(),
            batch_size = self.options.batch_size,
            "starting bulk copy"
        );
        let started = Instant::now();

        let mut writer = BatchWriter::new(&mut *self.conn, target, self.options.batch_size)?;
        let mut row: u64 = 0;

        while source.advance().await? {
            row += 1;
            let values = source.current_row()?;
            if values.len() != source_width {
                writer.abort();
                return Err(Error::schema_mismatch(format!(
                    "Row {} has {} values, expected {}",
                    row,
                    values.len(),
                    source_width
                )));
            }

            let mapped = mapping.pairs().iter().map(|p| &values[p.source_index]);
            let encoded = match encoder.encode_row(mapped) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!(
                        row,
                        error = %e,
                        rows_committed = writer.rows_committed(),
                        "row rejected, aborting copy"
                    );
                    writer.abort();
                    return Err(Error::RowFailed {
                        row,
                        source: Box::new(e),
                    });
                }
            };
            writer.push_row(&encoded).await?;
        }

        let (rows_copied, batches) = writer.finish().await?;
        info!(
            table = %self.table,
            rows = rows_copied,
            batches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "bulk copy complete"
        );
        Ok(TransferSummary {
            rows_copied,
            batches,
        })
    }
}

impl<'c, C: BulkConnection + SchemaResolver> BulkCopy<'c, C> {
    /// Describe the destination table, then copy all rows of `source` into it.
    pub async fn write_to_server<R: RowSource>(&mut self, source: &mut R) -> Result<TransferSummary> {
        let destination = self.conn.describe_table(&self.table).await?;
        debug!(table = %self.table, columns = destination.len(), "destination described");
        self.write_with_schema(source, &destination).await
    }
}
