//! SQL Server data types for bulk copy.

mod column;
mod metadata;
mod source_type;
mod sql_type;
mod value;

pub use column::{ColumnDescriptor, SourceColumn};
pub use metadata::ColumnMetadata;
pub use source_type::*;
pub use sql_type::{
    decimal_magnitude_len, time_len, SqlType, MAX_BYTE_LENGTH, MAX_DECIMAL_PRECISION,
    MAX_NCHAR_LENGTH, MAX_TIME_SCALE,
};
pub use value::SqlValue;
