//! Value encoders for bulk load rows.
//!
//! `encode_value` converts one `SqlValue` to the wire form of a destination
//! column. Encoding is pure: it validates the value and appends bytes to a
//! buffer, nothing else.
//!
//! | Destination | Module |
//! |-------------|--------|
//! | tinyint, smallint, int, bigint, bit, real, float | `number` |
//! | decimal, numeric, smallmoney, money | `number` |
//! | date, time, datetime, smalldatetime, datetime2, datetimeoffset | `datetime` |
//! | uniqueidentifier | `guid` |
//! | char, varchar, nchar, nvarchar, binary, varbinary, json | `string` |

pub mod datetime;
pub mod guid;
pub mod number;
pub mod string;

use crate::error::{Error, Result};
use crate::protocol::buffer::WriteBuffer;
use crate::protocol::constants::{TDS_TOKEN_ROW, TDS_USHORT_NULL};
use crate::protocol::types::{ColumnDescriptor, SqlType, SqlValue};
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::str::FromStr;
use uuid::Uuid;

/// Write the NULL marker for a column type.
pub fn encode_null(sql_type: SqlType, buf: &mut WriteBuffer) {
    if sql_type.is_plp() {
        buf.write_plp_null();
    } else if sql_type.fixed_len().is_some() {
        buf.write_u8(0);
    } else {
        buf.write_u16_le(TDS_USHORT_NULL);
    }
}

/// Encode one value for a destination column.
pub fn encode_value(value: &SqlValue, column: &ColumnDescriptor, buf: &mut WriteBuffer) -> Result<()> {
    let name = column.name.as_str();
    if value.is_null() {
        if !column.nullable {
            return Err(Error::NullNotAllowed {
                column: column.name.clone(),
            });
        }
        encode_null(column.sql_type, buf);
        return Ok(());
    }

    match column.sql_type {
        t @ (SqlType::TinyInt | SqlType::SmallInt | SqlType::Int | SqlType::BigInt) => {
            number::encode_int(to_integer(value, name)?, t, name, buf)
        }
        SqlType::Bit => {
            number::encode_bit(to_bool(value, name)?, buf);
            Ok(())
        }
        SqlType::Real => number::encode_real(to_f64(value, name)?, name, buf),
        SqlType::Float => number::encode_float(to_f64(value, name)?, name, buf),
        SqlType::Decimal { precision, scale } | SqlType::Numeric { precision, scale } => {
            number::encode_decimal(to_decimal(value, name)?, precision, scale, name, buf)
        }
        t @ (SqlType::SmallMoney | SqlType::Money) => {
            number::encode_money(to_decimal(value, name)?, t, name, buf)
        }
        SqlType::SmallDateTime => {
            datetime::encode_smalldatetime(to_datetime(value, name)?, name, buf)
        }
        SqlType::DateTime => datetime::encode_datetime(to_datetime(value, name)?, name, buf),
        SqlType::DateTime2 { scale } => {
            datetime::encode_datetime2(to_datetime(value, name)?, scale, name, buf)
        }
        SqlType::Date => datetime::encode_date(to_date(value, name)?, name, buf),
        SqlType::Time { scale } => {
            datetime::encode_time(to_time(value, name)?, scale, buf);
            Ok(())
        }
        SqlType::DateTimeOffset { scale } => {
            datetime::encode_datetimeoffset(to_datetimeoffset(value, name)?, scale, name, buf)
        }
        SqlType::Json => match value {
            SqlValue::String(doc) => string::encode_text(doc, column, buf),
            other => Err(unconvertible(other, column)),
        },
        SqlType::Char { .. }
        | SqlType::VarChar { .. }
        | SqlType::NChar { .. }
        | SqlType::NVarChar { .. } => string::encode_text(&to_text(value, column)?, column, buf),
        SqlType::Binary { .. } | SqlType::VarBinary { .. } => match value {
            SqlValue::Bytes(bytes) => string::encode_binary(bytes, column, buf),
            other => Err(unconvertible(other, column)),
        },
        SqlType::UniqueIdentifier => {
            guid::encode_guid(&to_uuid(value, name)?, buf);
            Ok(())
        }
    }
}

fn unconvertible(value: &SqlValue, column: &ColumnDescriptor) -> Error {
    Error::type_conversion(
        column.name.as_str(),
        format!("cannot convert {} value to {}", value.kind(), column.sql_type),
    )
}

fn bad_text(column: &str, text: &str, target: &str) -> Error {
    Error::type_conversion(column, format!("'{}' is not a valid {}", text, target))
}

fn to_integer(value: &SqlValue, column: &str) -> Result<i64> {
    match value {
        SqlValue::Int(i) => Ok(*i),
        SqlValue::Bool(b) => Ok(*b as i64),
        SqlValue::Decimal(d) => {
            if !d.fract().is_zero() {
                return Err(Error::type_conversion(
                    column,
                    format!("{} has a fractional part", d),
                ));
            }
            d.to_i64().ok_or_else(|| Error::out_of_range(column, d))
        }
        SqlValue::Float(f) => {
            if f.is_finite() && f.fract() != 0.0 {
                return Err(Error::type_conversion(
                    column,
                    format!("{} has a fractional part", f),
                ));
            }
            // i64::MAX as f64 rounds up to 2^63
            if !f.is_finite() || *f < i64::MIN as f64 || *f >= i64::MAX as f64 {
                return Err(Error::out_of_range(column, f));
            }
            Ok(*f as i64)
        }
        SqlValue::String(s) => s.trim().parse().map_err(|_| bad_text(column, s, "integer")),
        other => Err(Error::type_conversion(
            column,
            format!("cannot convert {} value to an integer", other.kind()),
        )),
    }
}

fn to_bool(value: &SqlValue, column: &str) -> Result<bool> {
    match value {
        SqlValue::Bool(b) => Ok(*b),
        SqlValue::Int(i) => Ok(*i != 0),
        SqlValue::Decimal(d) => Ok(!d.is_zero()),
        SqlValue::Float(f) => Ok(*f != 0.0),
        SqlValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(bad_text(column, s, "bit")),
        },
        other => Err(Error::type_conversion(
            column,
            format!("cannot convert {} value to bit", other.kind()),
        )),
    }
}

fn to_f64(value: &SqlValue, column: &str) -> Result<f64> {
    match value {
        SqlValue::Float(f) => Ok(*f),
        SqlValue::Int(i) => Ok(*i as f64),
        SqlValue::Bool(b) => Ok(*b as i64 as f64),
        SqlValue::Decimal(d) => d.to_f64().ok_or_else(|| Error::out_of_range(column, d)),
        SqlValue::String(s) => s.trim().parse().map_err(|_| bad_text(column, s, "float")),
        other => Err(Error::type_conversion(
            column,
            format!("cannot convert {} value to float", other.kind()),
        )),
    }
}

/// Parse decimal text, accepting scientific notation.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn to_decimal(value: &SqlValue, column: &str) -> Result<Decimal> {
    match value {
        SqlValue::Decimal(d) => Ok(*d),
        SqlValue::Int(i) => Ok(Decimal::from(*i)),
        SqlValue::Bool(b) => Ok(Decimal::from(*b as i64)),
        SqlValue::Float(f) => Decimal::from_f64(*f).ok_or_else(|| Error::out_of_range(column, f)),
        SqlValue::String(s) => parse_decimal(s).ok_or_else(|| {
            // well-formed but too large for the decimal type
            if s.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false) {
                Error::out_of_range(column, s.trim())
            } else {
                bad_text(column, s, "decimal")
            }
        }),
        other => Err(Error::type_conversion(
            column,
            format!("cannot convert {} value to decimal", other.kind()),
        )),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse date-time text in ISO 8601 style, or a bare date as midnight.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| parse_date(text).map(|d| d.and_time(NaiveTime::MIN)))
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Parse date-time text with a UTC offset, e.g. `2024-01-01 10:00:00.5 +02:00`.
pub fn parse_datetimeoffset(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f %:z"))
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .ok()
}

fn to_datetime(value: &SqlValue, column: &str) -> Result<NaiveDateTime> {
    match value {
        SqlValue::DateTime(dt) => Ok(*dt),
        SqlValue::Date(d) => Ok(d.and_time(NaiveTime::MIN)),
        SqlValue::Time(t) => Ok(datetime::base_1900().and_time(*t)),
        SqlValue::DateTimeOffset(dto) => Ok(dto.naive_local()),
        SqlValue::String(s) => parse_datetime(s).ok_or_else(|| bad_text(column, s, "datetime")),
        other => Err(Error::type_conversion(
            column,
            format!("cannot convert {} value to datetime", other.kind()),
        )),
    }
}

fn to_date(value: &SqlValue, column: &str) -> Result<NaiveDate> {
    match value {
        SqlValue::Date(d) => Ok(*d),
        SqlValue::DateTime(dt) => Ok(dt.date()),
        SqlValue::DateTimeOffset(dto) => Ok(dto.naive_local().date()),
        SqlValue::String(s) => parse_datetime(s)
            .map(|dt| dt.date())
            .ok_or_else(|| bad_text(column, s, "date")),
        other => Err(Error::type_conversion(
            column,
            format!("cannot convert {} value to date", other.kind()),
        )),
    }
}

fn to_time(value: &SqlValue, column: &str) -> Result<NaiveTime> {
    match value {
        SqlValue::Time(t) => Ok(*t),
        SqlValue::DateTime(dt) => Ok(dt.time()),
        SqlValue::DateTimeOffset(dto) => Ok(dto.naive_local().time()),
        SqlValue::String(s) => parse_time(s)
            .or_else(|| parse_datetime(s).map(|dt| dt.time()))
            .ok_or_else(|| bad_text(column, s, "time")),
        other => Err(Error::type_conversion(
            column,
            format!("cannot convert {} value to time", other.kind()),
        )),
    }
}

/// Values without an offset are taken as UTC.
fn to_datetimeoffset(value: &SqlValue, column: &str) -> Result<DateTime<FixedOffset>> {
    let utc = FixedOffset::east_opt(0).ok_or_else(|| Error::out_of_range(column, "+00:00"))?;
    match value {
        SqlValue::DateTimeOffset(dto) => Ok(*dto),
        SqlValue::DateTime(dt) => Ok(utc.from_utc_datetime(dt)),
        SqlValue::Date(d) => Ok(utc.from_utc_datetime(&d.and_time(NaiveTime::MIN))),
        SqlValue::String(s) => parse_datetimeoffset(s)
            .or_else(|| parse_datetime(s).map(|dt| utc.from_utc_datetime(&dt)))
            .ok_or_else(|| bad_text(column, s, "datetimeoffset")),
        other => Err(Error::type_conversion(
            column,
            format!("cannot convert {} value to datetimeoffset", other.kind()),
        )),
    }
}

fn to_text<'a>(value: &'a SqlValue, column: &ColumnDescriptor) -> Result<Cow<'a, str>> {
    match value {
        SqlValue::String(s) => Ok(Cow::Borrowed(s.as_str())),
        SqlValue::Bytes(_) | SqlValue::Null => Err(unconvertible(value, column)),
        other => Ok(Cow::Owned(other.to_string())),
    }
}

fn to_uuid(value: &SqlValue, column: &str) -> Result<Uuid> {
    match value {
        SqlValue::Uuid(u) => Ok(*u),
        SqlValue::Bytes(bytes) => Uuid::from_slice(bytes).map_err(|_| {
            Error::type_conversion(
                column,
                format!(
                    "binary value of {} bytes is not a uniqueidentifier",
                    bytes.len()
                ),
            )
        }),
        SqlValue::String(s) => {
            Uuid::parse_str(s.trim()).map_err(|_| bad_text(column, s, "uniqueidentifier"))
        }
        other => Err(Error::type_conversion(
            column,
            format!("cannot convert {} value to uniqueidentifier", other.kind()),
        )),
    }
}

/// Encodes ROW tokens for a fixed column list.
///
/// A row is built in a scratch buffer and handed out only when every value
/// encoded, so a failing value never leaves a partial row behind.
pub struct RowEncoder {
    columns: Vec<ColumnDescriptor>,
    scratch: WriteBuffer,
}

impl RowEncoder {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            scratch: WriteBuffer::with_capacity(1024),
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Encode one row. `values` must be aligned with the encoder's columns.
    pub fn encode_row<'v, I>(&mut self, values: I) -> Result<Bytes>
    where
        I: IntoIterator<Item = &'v SqlValue>,
    {
        self.scratch.clear();
        self.scratch.write_u8(TDS_TOKEN_ROW);

        let mut count = 0;
        for (value, column) in values.into_iter().zip(self.columns.iter()) {
            if let Err(e) = encode_value(value, column, &mut self.scratch) {
                self.scratch.clear();
                return Err(e);
            }
            count += 1;
        }
        if count != self.columns.len() {
            self.scratch.clear();
            return Err(Error::schema_mismatch(format!(
                "row has {} values for {} columns",
                count,
                self.columns.len()
            )));
        }
        Ok(self.scratch.take())
    }
}
