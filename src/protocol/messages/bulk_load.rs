//! Bulk load message: COLMETADATA, ROW tokens, DONE.

use crate::error::Result;
use crate::protocol::constants::*;
use crate::protocol::message::{b_varchar_wire_size, Message, WriteExt};
use crate::protocol::types::{decimal_magnitude_len, ColumnDescriptor, SqlType};

/// DONE token size: token, status, current command, row count.
const DONE_TOKEN_SIZE: usize = 1 + 2 + 2 + 8;

/// One batch of encoded rows for the columns announced by INSERT BULK.
pub struct BulkLoadMessage<'a> {
    /// Columns in wire order.
    pub columns: &'a [ColumnDescriptor],
    /// Encoded ROW tokens.
    pub rows: &'a [u8],
    /// Number of ROW tokens in `rows`.
    pub row_count: u64,
}

/// Wire size of a column's TYPE_INFO.
pub fn type_info_wire_size(column: &ColumnDescriptor) -> usize {
    match column.sql_type {
        SqlType::Date | SqlType::Json => 1,
        SqlType::Time { .. } | SqlType::DateTime2 { .. } | SqlType::DateTimeOffset { .. } => 2,
        SqlType::Decimal { .. } | SqlType::Numeric { .. } => 4,
        SqlType::Char { .. }
        | SqlType::VarChar { .. }
        | SqlType::NChar { .. }
        | SqlType::NVarChar { .. } => 3 + TDS_COLLATION_LEN,
        SqlType::Binary { .. } | SqlType::VarBinary { .. } => 3,
        _ => 2,
    }
}

/// Write a column's TYPE_INFO.
pub fn write_type_info(buf: &mut Vec<u8>, column: &ColumnDescriptor) {
    let sql_type = column.sql_type;
    buf.write_u8(sql_type.tds_type());
    match sql_type {
        SqlType::Date | SqlType::Json => {}
        SqlType::Time { scale }
        | SqlType::DateTime2 { scale }
        | SqlType::DateTimeOffset { scale } => buf.write_u8(scale),
        SqlType::Decimal { precision, scale } | SqlType::Numeric { precision, scale } => {
            buf.write_u8((1 + decimal_magnitude_len(precision)) as u8);
            buf.write_u8(precision);
            buf.write_u8(scale);
        }
        SqlType::Char { .. }
        | SqlType::VarChar { .. }
        | SqlType::NChar { .. }
        | SqlType::NVarChar { .. } => {
            buf.write_u16_le(ushort_max_len(sql_type));
            buf.write_bytes(&column.collation.unwrap_or(TDS_COLLATION_DEFAULT));
        }
        SqlType::Binary { .. } | SqlType::VarBinary { .. } => {
            buf.write_u16_le(ushort_max_len(sql_type));
        }
        other => buf.write_u8(other.fixed_len().unwrap_or(0) as u8),
    }
}

fn ushort_max_len(sql_type: SqlType) -> u16 {
    match sql_type.max_byte_len() {
        Some(len) => len as u16,
        None => TDS_USHORT_MAX_LEN,
    }
}

fn column_flags(column: &ColumnDescriptor) -> u16 {
    let mut flags = TDS_COL_FLAG_UPDATEABLE;
    if column.nullable {
        flags |= TDS_COL_FLAG_NULLABLE;
    }
    if column.identity {
        flags |= TDS_COL_FLAG_IDENTITY;
    }
    flags
}

impl BulkLoadMessage<'_> {
    fn colmetadata_wire_size(&self) -> usize {
        3 + self
            .columns
            .iter()
            .map(|c| 4 + 2 + type_info_wire_size(c) + b_varchar_wire_size(&c.name))
            .sum::<usize>()
    }
}

impl Message for BulkLoadMessage<'_> {
    fn packet_type(&self) -> u8 {
        TDS_PACKET_TYPE_BULK_LOAD
    }

    fn wire_size(&self) -> usize {
        self.colmetadata_wire_size() + self.rows.len() + DONE_TOKEN_SIZE
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u8(TDS_TOKEN_COLMETADATA);
        buf.write_u16_le(self.columns.len() as u16);
        for column in self.columns {
            buf.write_u32_le(0); // UserType
            buf.write_u16_le(column_flags(column));
            write_type_info(buf, column);
            buf.write_b_varchar(&column.name);
        }

        buf.write_bytes(self.rows);

        buf.write_u8(TDS_TOKEN_DONE);
        buf.write_u16_le(TDS_DONE_FINAL | TDS_DONE_COUNT);
        buf.write_u16_le(0);
        buf.write_u64_le(self.row_count);
        Ok(())
    }
}
