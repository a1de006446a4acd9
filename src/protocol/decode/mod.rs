//! Value decoders for TDS row data.
//!
//! Each destination type family has its own module with decode functions,
//! mirroring `encode`.
//!
//! | Type | Module |
//! |------|--------|
//! | integers, decimal, numeric, money | `number` |
//! | date and time types | `date` |
//!
//! Floats, uniqueidentifier, character and binary types need no dedicated
//! decoder.

mod date;
mod number;

pub use date::{
    decode_date, decode_datetime, decode_datetime2, decode_datetimeoffset, decode_smalldatetime,
    decode_time,
};
pub use number::{decode_decimal, decode_int, decode_money};

use crate::error::{Error, Result};
use crate::protocol::buffer::ReadBuffer;
use crate::protocol::constants::{TDS_PLP_NULL, TDS_PLP_TERMINATOR, TDS_PLP_UNKNOWN_LEN, TDS_USHORT_NULL};
use crate::protocol::encode::guid::guid_from_wire;
use crate::protocol::types::{ColumnDescriptor, SqlType, SqlValue};

/// Read a PLP stream. Returns `None` for PLP NULL.
pub fn read_plp(buf: &mut ReadBuffer) -> Result<Option<Vec<u8>>> {
    let total = buf.read_u64_le()?;
    if total == TDS_PLP_NULL {
        return Ok(None);
    }
    let mut data = if total == TDS_PLP_UNKNOWN_LEN {
        Vec::new()
    } else {
        Vec::with_capacity(total as usize)
    };
    loop {
        let chunk = buf.read_u32_le()?;
        if chunk == TDS_PLP_TERMINATOR {
            break;
        }
        data.extend_from_slice(&buf.read_bytes(chunk as usize)?);
    }
    if total != TDS_PLP_UNKNOWN_LEN && data.len() as u64 != total {
        return Err(Error::protocol(format!(
            "PLP length mismatch: declared {}, read {}",
            total,
            data.len()
        )));
    }
    Ok(Some(data))
}

fn text_from_wire(data: &[u8], column: &ColumnDescriptor) -> Result<String> {
    match column.sql_type {
        SqlType::NChar { .. } | SqlType::NVarChar { .. } => {
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).map_err(|_| Error::protocol("Invalid UTF-16 string"))
        }
        SqlType::Json => String::from_utf8(data.to_vec())
            .map_err(|_| Error::protocol("Invalid UTF-8 document")),
        _ if column.is_utf8() => {
            String::from_utf8(data.to_vec()).map_err(|_| Error::protocol("Invalid UTF-8 string"))
        }
        _ => Ok(data.iter().map(|&b| b as char).collect()),
    }
}

/// Decode one column value of a ROW token.
pub fn decode_value(buf: &mut ReadBuffer, column: &ColumnDescriptor) -> Result<SqlValue> {
    let sql_type = column.sql_type;

    let data = if sql_type.is_plp() {
        match read_plp(buf)? {
            Some(data) => data,
            None => return Ok(SqlValue::Null),
        }
    } else if sql_type.fixed_len().is_some() {
        let len = buf.read_u8()? as usize;
        if len == 0 {
            return Ok(SqlValue::Null);
        }
        buf.read_bytes(len)?.to_vec()
    } else {
        let len = buf.read_u16_le()?;
        if len == TDS_USHORT_NULL {
            return Ok(SqlValue::Null);
        }
        buf.read_bytes(len as usize)?.to_vec()
    };

    let value = match sql_type {
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Int | SqlType::BigInt => {
            SqlValue::Int(decode_int(&data)?)
        }
        SqlType::Bit => SqlValue::Bool(data.first().copied().unwrap_or(0) != 0),
        SqlType::Real | SqlType::Float => match data.len() {
            4 => SqlValue::Float(f32::from_le_bytes([data[0], data[1], data[2], data[3]]) as f64),
            8 => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&data);
                SqlValue::Float(f64::from_le_bytes(bytes))
            }
            n => return Err(Error::protocol(format!("Invalid float length {}", n))),
        },
        SqlType::Decimal { scale, .. } | SqlType::Numeric { scale, .. } => {
            SqlValue::Decimal(decode_decimal(&data, scale)?)
        }
        SqlType::SmallMoney | SqlType::Money => SqlValue::Decimal(decode_money(&data)?),
        SqlType::SmallDateTime => SqlValue::DateTime(decode_smalldatetime(&data)?),
        SqlType::DateTime => SqlValue::DateTime(decode_datetime(&data)?),
        SqlType::DateTime2 { scale } => SqlValue::DateTime(decode_datetime2(&data, scale)?),
        SqlType::Date => SqlValue::Date(decode_date(&data)?),
        SqlType::Time { scale } => SqlValue::Time(decode_time(&data, scale)?),
        SqlType::DateTimeOffset { scale } => {
            SqlValue::DateTimeOffset(decode_datetimeoffset(&data, scale)?)
        }
        SqlType::UniqueIdentifier => {
            let bytes: [u8; 16] = data
                .as_slice()
                .try_into()
                .map_err(|_| Error::protocol("uniqueidentifier must be 16 bytes"))?;
            SqlValue::Uuid(guid_from_wire(bytes))
        }
        SqlType::Binary { .. } | SqlType::VarBinary { .. } => SqlValue::Bytes(data),
        SqlType::Char { .. }
        | SqlType::VarChar { .. }
        | SqlType::NChar { .. }
        | SqlType::NVarChar { .. }
        | SqlType::Json => SqlValue::String(text_from_wire(&data, column)?),
    };
    Ok(value)
}
