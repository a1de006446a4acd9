//! Destination column types with type-specific attributes.
//!
//! Nullability, identity and collation are column properties and live on
//! `ColumnDescriptor`.

use crate::error::{Error, Result};
use crate::protocol::constants::*;

/// Maximum decimal/numeric precision.
pub const MAX_DECIMAL_PRECISION: u8 = 38;
/// Maximum fractional-second scale for time, datetime2 and datetimeoffset.
pub const MAX_TIME_SCALE: u8 = 7;
/// Largest non-max length for char, varchar, binary and varbinary (bytes).
pub const MAX_BYTE_LENGTH: u16 = 8000;
/// Largest non-max length for nchar and nvarchar (characters).
pub const MAX_NCHAR_LENGTH: u16 = 4000;

/// SQL Server column type.
///
/// `length: None` on the variable-length types means `(max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Bit,
    Real,
    Float,
    Decimal { precision: u8, scale: u8 },
    Numeric { precision: u8, scale: u8 },
    SmallMoney,
    Money,
    SmallDateTime,
    DateTime,
    DateTime2 { scale: u8 },
    Date,
    Time { scale: u8 },
    DateTimeOffset { scale: u8 },
    /// CHAR(length), length in bytes.
    Char { length: u16 },
    /// VARCHAR(length | max), length in bytes.
    VarChar { length: Option<u16> },
    /// NCHAR(length), length in characters.
    NChar { length: u16 },
    /// NVARCHAR(length | max), length in characters.
    NVarChar { length: Option<u16> },
    Binary { length: u16 },
    VarBinary { length: Option<u16> },
    UniqueIdentifier,
    Json,
}

impl SqlType {
    /// Create from a TDS TYPE_INFO.
    ///
    /// `max_len` is the wire length from TYPE_INFO (bytes, `0xFFFF` for max types).
    /// Returns `Err(Error::UnsupportedType)` for types that cannot be bulk loaded.
    pub fn from_raw(tds_type: u8, max_len: u32, precision: u8, scale: u8) -> Result<Self> {
        let unsupported = || Error::UnsupportedType {
            type_code: tds_type as i32,
        };
        let var_len = |len: u32| -> Option<u16> {
            if len == TDS_USHORT_MAX_LEN as u32 {
                None
            } else {
                Some(len as u16)
            }
        };

        let sql_type = match tds_type {
            TDS_TYPE_INT1 => SqlType::TinyInt,
            TDS_TYPE_INT2 => SqlType::SmallInt,
            TDS_TYPE_INT4 => SqlType::Int,
            TDS_TYPE_INT8 => SqlType::BigInt,
            TDS_TYPE_INTN => match max_len {
                1 => SqlType::TinyInt,
                2 => SqlType::SmallInt,
                4 => SqlType::Int,
                8 => SqlType::BigInt,
                _ => return Err(unsupported()),
            },
            TDS_TYPE_BIT | TDS_TYPE_BITN => SqlType::Bit,
            TDS_TYPE_FLT4 => SqlType::Real,
            TDS_TYPE_FLT8 => SqlType::Float,
            TDS_TYPE_FLTN => match max_len {
                4 => SqlType::Real,
                8 => SqlType::Float,
                _ => return Err(unsupported()),
            },
            TDS_TYPE_MONEY4 => SqlType::SmallMoney,
            TDS_TYPE_MONEY => SqlType::Money,
            TDS_TYPE_MONEYN => match max_len {
                4 => SqlType::SmallMoney,
                8 => SqlType::Money,
                _ => return Err(unsupported()),
            },
            TDS_TYPE_DATETIM4 => SqlType::SmallDateTime,
            TDS_TYPE_DATETIME => SqlType::DateTime,
            TDS_TYPE_DATETIMN => match max_len {
                4 => SqlType::SmallDateTime,
                8 => SqlType::DateTime,
                _ => return Err(unsupported()),
            },
            TDS_TYPE_DECIMALN => SqlType::Decimal { precision, scale },
            TDS_TYPE_NUMERICN => SqlType::Numeric { precision, scale },
            TDS_TYPE_DATEN => SqlType::Date,
            TDS_TYPE_TIMEN => SqlType::Time { scale },
            TDS_TYPE_DATETIME2N => SqlType::DateTime2 { scale },
            TDS_TYPE_DATETIMEOFFSETN => SqlType::DateTimeOffset { scale },
            TDS_TYPE_GUID => SqlType::UniqueIdentifier,
            TDS_TYPE_BIGCHAR => SqlType::Char {
                length: max_len as u16,
            },
            TDS_TYPE_BIGVARCHAR => SqlType::VarChar {
                length: var_len(max_len),
            },
            TDS_TYPE_NCHAR => SqlType::NChar {
                length: (max_len / 2) as u16,
            },
            TDS_TYPE_NVARCHAR => SqlType::NVarChar {
                length: var_len(max_len).map(|len| len / 2),
            },
            TDS_TYPE_BIGBINARY => SqlType::Binary {
                length: max_len as u16,
            },
            TDS_TYPE_BIGVARBINARY => SqlType::VarBinary {
                length: var_len(max_len),
            },
            TDS_TYPE_JSON => SqlType::Json,
            _ => return Err(unsupported()),
        };
        Ok(sql_type)
    }

    /// TDS type used for this column in bulk load COLMETADATA.
    ///
    /// Fixed-length types use their nullable (length-prefixed) variant so that
    /// NULL and non-NULL values share one row layout.
    pub fn tds_type(&self) -> u8 {
        match self {
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Int | SqlType::BigInt => TDS_TYPE_INTN,
            SqlType::Bit => TDS_TYPE_BITN,
            SqlType::Real | SqlType::Float => TDS_TYPE_FLTN,
            SqlType::Decimal { .. } => TDS_TYPE_DECIMALN,
            SqlType::Numeric { .. } => TDS_TYPE_NUMERICN,
            SqlType::SmallMoney | SqlType::Money => TDS_TYPE_MONEYN,
            SqlType::SmallDateTime | SqlType::DateTime => TDS_TYPE_DATETIMN,
            SqlType::DateTime2 { .. } => TDS_TYPE_DATETIME2N,
            SqlType::Date => TDS_TYPE_DATEN,
            SqlType::Time { .. } => TDS_TYPE_TIMEN,
            SqlType::DateTimeOffset { .. } => TDS_TYPE_DATETIMEOFFSETN,
            SqlType::Char { .. } => TDS_TYPE_BIGCHAR,
            SqlType::VarChar { .. } => TDS_TYPE_BIGVARCHAR,
            SqlType::NChar { .. } => TDS_TYPE_NCHAR,
            SqlType::NVarChar { .. } => TDS_TYPE_NVARCHAR,
            SqlType::Binary { .. } => TDS_TYPE_BIGBINARY,
            SqlType::VarBinary { .. } => TDS_TYPE_BIGVARBINARY,
            SqlType::UniqueIdentifier => TDS_TYPE_GUID,
            SqlType::Json => TDS_TYPE_JSON,
        }
    }

    /// Wire length of a non-NULL value for fixed-size types, `None` otherwise.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            SqlType::TinyInt | SqlType::Bit => Some(1),
            SqlType::SmallInt => Some(2),
            SqlType::Int | SqlType::Real | SqlType::SmallMoney | SqlType::SmallDateTime => Some(4),
            SqlType::BigInt | SqlType::Float | SqlType::Money | SqlType::DateTime => Some(8),
            SqlType::Decimal { precision, .. } | SqlType::Numeric { precision, .. } => {
                Some(1 + decimal_magnitude_len(*precision))
            }
            SqlType::Date => Some(3),
            SqlType::Time { scale } => Some(time_len(*scale)),
            SqlType::DateTime2 { scale } => Some(time_len(*scale) + 3),
            SqlType::DateTimeOffset { scale } => Some(time_len(*scale) + 5),
            SqlType::UniqueIdentifier => Some(16),
            _ => None,
        }
    }

    /// Maximum value length in bytes for length-bounded types, `None` for max types.
    pub fn max_byte_len(&self) -> Option<usize> {
        match self {
            SqlType::Char { length } | SqlType::Binary { length } => Some(*length as usize),
            SqlType::NChar { length } => Some(*length as usize * 2),
            SqlType::VarChar { length } | SqlType::VarBinary { length } => {
                length.map(|len| len as usize)
            }
            SqlType::NVarChar { length } => length.map(|len| len as usize * 2),
            SqlType::Json => None,
            other => other.fixed_len(),
        }
    }

    /// Whether values are sent as partially length-prefixed (PLP) streams.
    pub fn is_plp(&self) -> bool {
        matches!(
            self,
            SqlType::VarChar { length: None }
                | SqlType::NVarChar { length: None }
                | SqlType::VarBinary { length: None }
                | SqlType::Json
        )
    }

    /// Whether the type carries a collation in TYPE_INFO.
    pub fn has_collation(&self) -> bool {
        matches!(
            self,
            SqlType::Char { .. }
                | SqlType::VarChar { .. }
                | SqlType::NChar { .. }
                | SqlType::NVarChar { .. }
        )
    }

    /// Get precision (decimal and numeric, 0 otherwise).
    pub fn precision(&self) -> u8 {
        match self {
            SqlType::Decimal { precision, .. } | SqlType::Numeric { precision, .. } => *precision,
            _ => 0,
        }
    }

    /// Get scale (decimal, numeric and the scaled temporal types, 0 otherwise).
    pub fn scale(&self) -> u8 {
        match self {
            SqlType::Decimal { scale, .. } | SqlType::Numeric { scale, .. } => *scale,
            SqlType::DateTime2 { scale }
            | SqlType::Time { scale }
            | SqlType::DateTimeOffset { scale } => *scale,
            SqlType::SmallMoney | SqlType::Money => 4,
            _ => 0,
        }
    }

    /// Check precision, scale and length limits.
    ///
    /// Lengths are in characters for nchar/nvarchar and in bytes otherwise.
    pub fn validate(&self) -> Result<()> {
        match self {
            SqlType::Decimal { precision, scale } | SqlType::Numeric { precision, scale } => {
                if *precision == 0 || *precision > MAX_DECIMAL_PRECISION || scale > precision {
                    return Err(Error::schema_mismatch(format!(
                        "Invalid decimal precision/scale ({}, {})",
                        precision, scale
                    )));
                }
            }
            SqlType::DateTime2 { scale }
            | SqlType::Time { scale }
            | SqlType::DateTimeOffset { scale } => {
                if *scale > MAX_TIME_SCALE {
                    return Err(Error::schema_mismatch(format!(
                        "Invalid fractional second scale {}",
                        scale
                    )));
                }
            }
            SqlType::Char { length } | SqlType::Binary { length } => {
                check_length(self, *length, MAX_BYTE_LENGTH)?
            }
            SqlType::VarChar { length: Some(length) }
            | SqlType::VarBinary { length: Some(length) } => {
                check_length(self, *length, MAX_BYTE_LENGTH)?
            }
            SqlType::NChar { length } => check_length(self, *length, MAX_NCHAR_LENGTH)?,
            SqlType::NVarChar { length: Some(length) } => {
                check_length(self, *length, MAX_NCHAR_LENGTH)?
            }
            _ => {}
        }
        Ok(())
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Int | SqlType::BigInt | SqlType::Bit
        )
    }

    pub fn is_exact_numeric(&self) -> bool {
        matches!(self, SqlType::Decimal { .. } | SqlType::Numeric { .. })
    }

    pub fn is_money(&self) -> bool {
        matches!(self, SqlType::SmallMoney | SqlType::Money)
    }

    pub fn is_approximate(&self) -> bool {
        matches!(self, SqlType::Real | SqlType::Float)
    }

    pub fn is_character(&self) -> bool {
        self.has_collation()
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, SqlType::Binary { .. } | SqlType::VarBinary { .. })
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            SqlType::SmallDateTime
                | SqlType::DateTime
                | SqlType::DateTime2 { .. }
                | SqlType::Date
                | SqlType::Time { .. }
                | SqlType::DateTimeOffset { .. }
        )
    }
}

fn check_length(sql_type: &SqlType, length: u16, max: u16) -> Result<()> {
    if length == 0 || length > max {
        return Err(Error::schema_mismatch(format!(
            "Invalid length {} for {}; must be between 1 and {}",
            length,
            type_name(sql_type),
            max
        )));
    }
    Ok(())
}

fn type_name(sql_type: &SqlType) -> &'static str {
    match sql_type {
        SqlType::Char { .. } => "char",
        SqlType::VarChar { .. } => "varchar",
        SqlType::NChar { .. } => "nchar",
        SqlType::NVarChar { .. } => "nvarchar",
        SqlType::Binary { .. } => "binary",
        _ => "varbinary",
    }
}

/// Magnitude byte count of a decimal value for a precision.
pub fn decimal_magnitude_len(precision: u8) -> usize {
    match precision {
        0..=9 => 4,
        10..=19 => 8,
        20..=28 => 12,
        _ => 16,
    }
}

/// Byte length of a time value for a fractional-second scale.
pub fn time_len(scale: u8) -> usize {
    match scale {
        0..=2 => 3,
        3..=4 => 4,
        _ => 5,
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn len(f: &mut std::fmt::Formatter<'_>, name: &str, length: Option<u16>) -> std::fmt::Result {
            match length {
                Some(n) => write!(f, "{}({})", name, n),
                None => write!(f, "{}(max)", name),
            }
        }

        match self {
            SqlType::TinyInt => write!(f, "tinyint"),
            SqlType::SmallInt => write!(f, "smallint"),
            SqlType::Int => write!(f, "int"),
            SqlType::BigInt => write!(f, "bigint"),
            SqlType::Bit => write!(f, "bit"),
            SqlType::Real => write!(f, "real"),
            SqlType::Float => write!(f, "float"),
            SqlType::Decimal { precision, scale } => write!(f, "decimal({},{})", precision, scale),
            SqlType::Numeric { precision, scale } => write!(f, "numeric({},{})", precision, scale),
            SqlType::SmallMoney => write!(f, "smallmoney"),
            SqlType::Money => write!(f, "money"),
            SqlType::SmallDateTime => write!(f, "smalldatetime"),
            SqlType::DateTime => write!(f, "datetime"),
            SqlType::DateTime2 { scale } => write!(f, "datetime2({})", scale),
            SqlType::Date => write!(f, "date"),
            SqlType::Time { scale } => write!(f, "time({})", scale),
            SqlType::DateTimeOffset { scale } => write!(f, "datetimeoffset({})", scale),
            SqlType::Char { length } => write!(f, "char({})", length),
            SqlType::VarChar { length } => len(f, "varchar", *length),
            SqlType::NChar { length } => write!(f, "nchar({})", length),
            SqlType::NVarChar { length } => len(f, "nvarchar", *length),
            SqlType::Binary { length } => write!(f, "binary({})", length),
            SqlType::VarBinary { length } => len(f, "varbinary", *length),
            SqlType::UniqueIdentifier => write!(f, "uniqueidentifier"),
            SqlType::Json => write!(f, "json"),
        }
    }
}
