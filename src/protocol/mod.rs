//! TDS protocol implementation for bulk loading.

pub mod buffer;
pub mod constants;
pub mod decode;
pub mod encode;
pub mod message;
pub mod messages;
pub mod packet;
pub mod response;
pub mod types;

pub use buffer::{ReadBuffer, WriteBuffer};
pub use encode::{encode_value, RowEncoder};
pub use message::{Message, WriteExt};
pub use messages::{insert_bulk_statement, BulkInsertHints, BulkLoadMessage, SqlBatchMessage};
pub use packet::{Packet, PacketStream};
pub use response::{parse_response, Done, Response, ServerMessage};
pub use types::{ColumnDescriptor, ColumnMetadata, SourceColumn, SourceType, SqlType, SqlValue};
