//! Error types for the bulk copy client.

use std::io;
use std::panic::Location;
use thiserror::Error;

/// Result type alias for bulk copy operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for bulk copy operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during network communication.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport failure reported by the connection.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Connection closed by the peer.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Protocol error.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Unexpected packet type received.
    #[error("Unexpected packet type: expected {expected}, got {actual}")]
    UnexpectedPacketType { expected: u8, actual: u8 },

    /// Buffer too small.
    #[error("Buffer too small: need {needed} bytes, have {available} at {location}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
        location: &'static Location<'static>,
    },

    /// Error token returned by the server.
    #[error("Msg {number}, Level {class}, State {state}: {message}")]
    Server {
        number: i32,
        state: u8,
        class: u8,
        message: String,
    },

    /// Row source used out of sequence.
    #[error("Row source misuse: {message}")]
    AdapterState { message: String },

    /// Source and destination columns cannot be reconciled.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A mapped column pair has incompatible types.
    #[error("Column '{column}': cannot copy {source_type} into {dest_type}")]
    TypeMismatch {
        column: String,
        source_type: String,
        dest_type: String,
    },

    /// A value is outside the destination type's range.
    #[error("Column '{column}': value {value} is out of range for the destination type")]
    ValueOutOfRange { column: String, value: String },

    /// A value is longer than the destination column allows.
    #[error("Column '{column}': value of length {length} exceeds maximum length {max_length}")]
    ValueTooLarge {
        column: String,
        length: usize,
        max_length: usize,
    },

    /// NULL supplied for a NOT NULL column.
    #[error("Column '{column}' does not allow NULL values")]
    NullNotAllowed { column: String },

    /// A value cannot be converted to the destination type.
    #[error("Column '{column}': {message}")]
    TypeConversion { column: String, message: String },

    /// Invalid bulk copy option.
    #[error("Invalid configuration for '{option}': {message}")]
    InvalidConfiguration { option: String, message: String },

    /// Type code that this client cannot load.
    #[error("Unsupported type code: {type_code}")]
    UnsupportedType { type_code: i32 },

    /// Column not found.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    /// Encoding failed for a row.
    #[error("Row {row}: {source}")]
    RowFailed {
        row: u64,
        #[source]
        source: Box<Error>,
    },

    /// A batch was rejected or could not be delivered.
    #[error(
        "Batch starting at row {first_row} ({row_count} rows) failed, {rows_committed} rows committed: {source}"
    )]
    BatchFailed {
        first_row: u64,
        row_count: usize,
        rows_committed: u64,
        #[source]
        source: Box<Error>,
    },

    /// The batch writer already failed and accepts no more rows.
    #[error("Batch writer is in the failed state")]
    WriterFailed,
}

impl Error {
    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a row source sequencing error.
    pub fn adapter_state(message: impl Into<String>) -> Self {
        Self::AdapterState {
            message: message.into(),
        }
    }

    /// Create a schema mismatch error.
    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            message: message.into(),
        }
    }

    /// Create a type conversion error for a column.
    pub fn type_conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeConversion {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an out-of-range error for a column.
    pub fn out_of_range(column: impl Into<String>, value: impl ToString) -> Self {
        Self::ValueOutOfRange {
            column: column.into(),
            value: value.to_string(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(option: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            option: option.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the transport rather than from the data.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Transport { .. }
                | Error::ConnectionClosed
                | Error::Protocol { .. }
                | Error::UnexpectedPacketType { .. }
        )
    }

    /// The underlying cause, looking through row and batch wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::RowFailed { source, .. } | Error::BatchFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
