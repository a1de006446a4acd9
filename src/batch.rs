//! Batch accumulation and transmission.
//!
//! The `BatchWriter` buffers encoded ROW tokens until the configured batch
//! size is reached, then hands the batch to a `BulkConnection` as one
//! protocol unit. A rejected batch moves the writer into the terminal
//! `Failed` state.

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::connection::BulkConnection;
use crate::error::{Error, Result};
use crate::protocol::messages::{insert_bulk_statement, BulkInsertHints};
use crate::protocol::types::ColumnDescriptor;

/// Destination of a bulk load: the table and the columns sent on the wire.
#[derive(Debug, Clone)]
pub struct BulkTarget {
    /// Table name as passed to INSERT BULK.
    pub table: String,
    /// Destination columns in wire order.
    pub columns: Vec<ColumnDescriptor>,
    /// Table hints.
    pub hints: BulkInsertHints,
}

impl BulkTarget {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            table: table.into(),
            columns,
            hints: BulkInsertHints::default(),
        }
    }

    pub fn with_hints(mut self, hints: BulkInsertHints) -> Self {
        self.hints = hints;
        self
    }

    /// INSERT BULK statement announcing this target.
    pub fn insert_bulk_statement(&self) -> String {
        insert_bulk_statement(&self.table, &self.columns, &self.hints)
    }
}

/// One batch of encoded rows.
#[derive(Debug, Clone)]
pub struct Batch {
    /// 1-based offset of the first row in the transfer.
    pub first_row: u64,
    /// Number of rows in the batch.
    pub row_count: usize,
    /// Concatenated ROW tokens.
    pub rows: Bytes,
}

impl Batch {
    /// 1-based offset of the last row in the batch.
    pub fn last_row(&self) -> u64 {
        self.first_row + self.row_count as u64 - 1
    }
}

/// Server acknowledgement of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchAck {
    /// Rows the server reported as inserted.
    pub rows_committed: u64,
}

/// Batch writer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No rows buffered.
    Idle,
    /// Rows buffered, batch not yet full.
    Accumulating,
    /// A batch is being transmitted.
    Flushing,
    /// A batch failed; terminal.
    Failed,
}

/// Accumulates encoded rows and sends them in batches over one connection.
pub struct BatchWriter<'c, C> {
    conn: &'c mut C,
    target: BulkTarget,
    batch_size: usize,
    state: BatchState,
    buffer: BytesMut,
    buffered_rows: usize,
    /// 1-based offset of the first buffered row.
    next_row: u64,
    rows_committed: u64,
    batches_sent: usize,
}

impl<'c, C: BulkConnection> BatchWriter<'c, C> {
    /// Create a writer. `batch_size` must be positive.
    pub fn new(conn: &'c mut C, target: BulkTarget, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid_config("batchSize", "must be positive"));
        }
        Ok(Self {
            conn,
            target,
            batch_size,
            state: BatchState::Idle,
            buffer: BytesMut::new(),
            buffered_rows: 0,
            next_row: 1,
            rows_committed: 0,
            batches_sent: 0,
        })
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn target(&self) -> &BulkTarget {
        &self.target
    }

    /// Rows acknowledged by the server so far.
    pub fn rows_committed(&self) -> u64 {
        self.rows_committed
    }

    /// Batches acknowledged by the server so far.
    pub fn batches_sent(&self) -> usize {
        self.batches_sent
    }

    /// Rows buffered and not yet sent.
    pub fn buffered_rows(&self) -> usize {
        self.buffered_rows
    }

    /// Append one encoded ROW token, flushing when the batch is full.
    pub async fn push_row(&mut self, row: &[u8]) -> Result<()> {
        if self.state == BatchState::Failed {
            return Err(Error::WriterFailed);
        }
        self.buffer.extend_from_slice(row);
        self.buffered_rows += 1;
        self.state = BatchState::Accumulating;

        if self.buffered_rows >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// Send the buffered rows, if any, as one batch.
    pub async fn flush(&mut self) -> Result<()> {
        match self.state {
            BatchState::Failed => return Err(Error::WriterFailed),
            BatchState::Idle => return Ok(()),
            _ => {}
        }

        let batch = Batch {
            first_row: self.next_row,
            row_count: self.buffered_rows,
            rows: self.buffer.split().freeze(),
        };
        self.buffered_rows = 0;
        self.state = BatchState::Flushing;

        debug!(
            table = %self.target.table,
            first_row = batch.first_row,
            rows = batch.row_count,
            bytes = batch.rows.len(),
            "sending batch"
        );

        match self.conn.send_batch(&self.target, &batch).await {
            Ok(ack) => {
                if ack.rows_committed != batch.row_count as u64 {
                    warn!(
                        sent = batch.row_count,
                        acknowledged = ack.rows_committed,
                        "server row count differs from batch size"
                    );
                }
                self.rows_committed += batch.row_count as u64;
                self.batches_sent += 1;
                self.next_row += batch.row_count as u64;
                self.state = BatchState::Idle;
                Ok(())
            }
            Err(e) => {
                self.state = BatchState::Failed;
                warn!(
                    first_row = batch.first_row,
                    last_row = batch.last_row(),
                    rows_committed = self.rows_committed,
                    error = %e,
                    "batch rejected"
                );
                Err(Error::BatchFailed {
                    first_row: batch.first_row,
                    row_count: batch.row_count,
                    rows_committed: self.rows_committed,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Mark the writer failed without sending, discarding buffered rows.
    pub fn abort(&mut self) {
        self.buffer.clear();
        self.buffered_rows = 0;
        self.state = BatchState::Failed;
    }

    /// Flush the final partial batch and return (rows committed, batches sent).
    pub async fn finish(mut self) -> Result<(u64, usize)> {
        self.flush().await?;
        Ok((self.rows_committed, self.batches_sent))
    }
}
