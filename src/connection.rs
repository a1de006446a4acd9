//! Connection seams and the TDS implementation.
//!
//! The bulk copy engine talks to the server through two traits:
//! `SchemaResolver` describes the destination table and `BulkConnection`
//! delivers batches. `TdsConnection` implements both over a stream that has
//! already completed login.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::debug;

use crate::batch::{Batch, BatchAck, BulkTarget};
use crate::error::{Error, Result};
use crate::protocol::message::Message;
use crate::protocol::messages::{BulkLoadMessage, SqlBatchMessage};
use crate::protocol::packet::PacketStream;
use crate::protocol::response::{parse_response, Response};
use crate::protocol::types::ColumnDescriptor;

/// Describes destination tables.
pub trait SchemaResolver {
    /// Destination columns of `table`, in table order.
    fn describe_table(
        &mut self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<ColumnDescriptor>>> + Send;
}

/// Delivers batches of encoded rows.
///
/// A batch is one server-side unit: it is either acknowledged as a whole or
/// rejected as a whole.
pub trait BulkConnection {
    /// Send one batch and wait for the server's acknowledgement.
    fn send_batch(
        &mut self,
        target: &BulkTarget,
        batch: &Batch,
    ) -> impl Future<Output = Result<BatchAck>> + Send;

    /// Bound every round trip by `timeout`. Connections without a
    /// transport-level timeout ignore it.
    fn set_operation_timeout(&mut self, timeout: Option<Duration>) {
        let _ = timeout;
    }
}

/// A logged-in TDS connection.
pub struct TdsConnection<S> {
    stream: PacketStream<S>,
    operation_timeout: Option<Duration>,
}

impl<S> TdsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a stream that has already completed login.
    pub fn new(stream: S) -> Self {
        Self {
            stream: PacketStream::new(stream),
            operation_timeout: None,
        }
    }

    /// Wrap a stream using the packet size negotiated at login.
    pub fn with_packet_size(stream: S, packet_size: usize) -> Result<Self> {
        let mut conn = Self::new(stream);
        conn.stream.set_packet_size(packet_size)?;
        Ok(conn)
    }

    pub fn packet_size(&self) -> usize {
        self.stream.packet_size()
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    /// Execute a SQL batch and return the parsed reply.
    ///
    /// Server errors are returned as `Error::Server`.
    pub async fn execute(&mut self, sql: &str) -> Result<Response> {
        debug!(sql, "executing batch");
        self.round_trip(&SqlBatchMessage::new(sql)).await
    }

    /// Send a message and read the reply, bounded by the operation timeout.
    async fn round_trip<M: Message + Sync>(&mut self, msg: &M) -> Result<Response> {
        let limit = self.operation_timeout;
        let exchange = async {
            self.stream.send_message(msg).await?;
            self.stream.read_message().await
        };
        let reply = match limit {
            Some(limit) => timeout(limit, exchange).await.map_err(|_| {
                Error::transport(format!("operation timed out after {:?}", limit))
            })??,
            None => exchange.await?,
        };

        let response = parse_response(reply)?;
        if let Some(size) = response.packet_size {
            self.stream.set_packet_size(size)?;
        }
        response.into_result()
    }
}

impl<S> SchemaResolver for TdsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn describe_table(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let sql = format!("SET FMTONLY ON; SELECT * FROM {}; SET FMTONLY OFF;", table);
        let response = self.execute(&sql).await?;
        if response.columns.is_empty() {
            return Err(Error::schema_mismatch(format!(
                "No column metadata returned for table '{}'",
                table
            )));
        }
        response
            .columns
            .iter()
            .enumerate()
            .map(|(i, meta)| ColumnDescriptor::from_metadata(i + 1, meta))
            .collect()
    }
}

impl<S> BulkConnection for TdsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_batch(&mut self, target: &BulkTarget, batch: &Batch) -> Result<BatchAck> {
        self.execute(&target.insert_bulk_statement()).await?;

        let msg = BulkLoadMessage {
            columns: &target.columns,
            rows: &batch.rows,
            row_count: batch.row_count as u64,
        };
        let response = self.round_trip(&msg).await?;
        let rows_committed = if response.done.iter().any(|d| d.has_count()) {
            response.rows_affected()
        } else {
            batch.row_count as u64
        };
        Ok(BatchAck { rows_committed })
    }

    fn set_operation_timeout(&mut self, timeout: Option<Duration>) {
        self.operation_timeout = timeout;
    }
}
