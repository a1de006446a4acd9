//! Bulk loading for SQL Server.
//!
//! Streams rows from a tabular source into a server table with the TDS bulk
//! load protocol instead of row-at-a-time INSERT statements. Each value is
//! encoded for its destination column type, with the range, scale and
//! precision rules of that type enforced before the row enters a batch.
//!
//! # Example
//!
//! ```no_run
//! use mssql_bulk_rs::{BulkCopy, BulkCopyOptions, MemorySource, Result, SourceType, SqlValue, TdsConnection};
//! use rust_decimal::Decimal;
//! use tokio::net::TcpStream;
//!
//! async fn load(stream: TcpStream) -> Result<()> {
//!     // The stream must already be logged in.
//!     let mut conn = TdsConnection::new(stream);
//!
//!     let mut source = MemorySource::new();
//!     source.add_column_metadata(1, "id", SourceType::Integer, 0, 0)?;
//!     source.add_column_metadata(2, "price", SourceType::Money, 19, 4)?;
//!     let mut source = source.with_rows(vec![
//!         vec![SqlValue::Int(1), SqlValue::Decimal(Decimal::new(1999, 2))],
//!         vec![SqlValue::Int(2), SqlValue::Null],
//!     ]);
//!
//!     let options = BulkCopyOptions::parse("batchSize=5000;checkConstraints=true")?;
//!     let summary = BulkCopy::new(&mut conn, "dbo.prices")
//!         .with_options(options)
//!         .write_to_server(&mut source)
//!         .await?;
//!     println!("copied {} rows in {} batches", summary.rows_copied, summary.batches);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod bulk_copy;
pub mod connection;
pub mod error;
pub mod mapping;
pub mod options;
pub mod protocol;
pub mod source;

// Re-export main types
pub use batch::{Batch, BatchAck, BatchState, BatchWriter, BulkTarget};
pub use bulk_copy::{BulkCopy, TransferSummary};
pub use connection::{BulkConnection, SchemaResolver, TdsConnection};
pub use error::{Error, Result};
pub use mapping::{ColumnMapping, ColumnMappingEntry, ColumnRef};
pub use options::BulkCopyOptions;
pub use protocol::types::{ColumnDescriptor, SourceColumn, SourceType, SqlType, SqlValue};
pub use source::{DelimitedFileSource, MemorySource, ResultSetSource, RowSource};
