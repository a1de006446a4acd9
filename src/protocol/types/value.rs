//! Scalar values produced by row sources.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

/// A single column value of a source row.
///
/// The encoder converts each variant to the destination column's type, so a
/// source is free to hand out the most natural representation it has.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value (BIT, BOOLEAN).
    Bool(bool),
    /// Integer value of any width.
    Int(i64),
    /// Approximate numeric value (REAL, FLOAT, DOUBLE).
    Float(f64),
    /// Exact numeric value (DECIMAL, NUMERIC, MONEY).
    Decimal(Decimal),
    /// Character data. Also carries JSON documents verbatim.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time without offset.
    DateTime(NaiveDateTime),
    /// Date and time with a UTC offset.
    DateTimeOffset(DateTime<FixedOffset>),
    /// Unique identifier.
    Uuid(Uuid),
}

impl SqlValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Bool(_) => "boolean",
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::String(_) => "string",
            SqlValue::Bytes(_) => "binary",
            SqlValue::Date(_) => "date",
            SqlValue::Time(_) => "time",
            SqlValue::DateTime(_) => "datetime",
            SqlValue::DateTimeOffset(_) => "datetimeoffset",
            SqlValue::Uuid(_) => "uniqueidentifier",
        }
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            SqlValue::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    /// Try to get the value as raw bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::String(s) => write!(f, "{}", s),
            SqlValue::Bytes(bytes) => {
                write!(f, "0x")?;
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                Ok(())
            }
            SqlValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            SqlValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            SqlValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            SqlValue::DateTimeOffset(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f %:z")),
            SqlValue::Uuid(u) => write!(f, "{}", u.hyphenated().to_string().to_uppercase()),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::String(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::String(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(v: NaiveTime) -> Self {
        SqlValue::Time(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for SqlValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        SqlValue::DateTimeOffset(v)
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sql_value_null() {
        let val = SqlValue::Null;
        assert!(val.is_null());
        assert_eq!(val.as_str(), None);
        assert_eq!(format!("{}", val), "NULL");
        assert_eq!(SqlValue::from(None::<i32>), SqlValue::Null);
    }

    #[test]
    fn test_sql_value_conversions() {
        assert_eq!(SqlValue::from(42), SqlValue::Int(42));
        assert_eq!(SqlValue::from(true).to_i64(), Some(1));
        assert_eq!(SqlValue::from("abc").as_str(), Some("abc"));
        assert_eq!(SqlValue::from(Some(7i64)), SqlValue::Int(7));
    }

    #[test]
    fn test_sql_value_display() {
        assert_eq!(SqlValue::Bytes(vec![0xDE, 0xAD]).to_string(), "0xDEAD");
        assert_eq!(
            SqlValue::Decimal(Decimal::from_str("214748.3648").unwrap()).to_string(),
            "214748.3648"
        );
        let u = Uuid::from_str("6f9619ff-8b86-d011-b42d-00c04fc964ff").unwrap();
        assert_eq!(
            SqlValue::Uuid(u).to_string(),
            "6F9619FF-8B86-D011-B42D-00C04FC964FF"
        );
    }
}
