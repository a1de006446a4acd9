//! TDS message definitions.
//!
//! Each message implements the `Message` trait for single-allocation serialization.

pub mod bulk_load;
pub mod sql_batch;

pub use bulk_load::BulkLoadMessage;
pub use sql_batch::{insert_bulk_statement, quote_identifier, BulkInsertHints, SqlBatchMessage};
