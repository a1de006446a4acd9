//! Source-side column type codes.
//!
//! Codes are the JDBC `java.sql.Types` values plus the SQL Server vendor
//! extensions, so metadata coming from other drivers or from CSV column
//! declarations can be passed through unchanged.

use crate::error::{Error, Result};

use super::sql_type::SqlType;

pub const SOURCE_TYPE_BIT: i32 = -7;
pub const SOURCE_TYPE_TINYINT: i32 = -6;
pub const SOURCE_TYPE_BIGINT: i32 = -5;
pub const SOURCE_TYPE_LONGVARBINARY: i32 = -4;
pub const SOURCE_TYPE_VARBINARY: i32 = -3;
pub const SOURCE_TYPE_BINARY: i32 = -2;
pub const SOURCE_TYPE_LONGVARCHAR: i32 = -1;
pub const SOURCE_TYPE_CHAR: i32 = 1;
pub const SOURCE_TYPE_NUMERIC: i32 = 2;
pub const SOURCE_TYPE_DECIMAL: i32 = 3;
pub const SOURCE_TYPE_INTEGER: i32 = 4;
pub const SOURCE_TYPE_SMALLINT: i32 = 5;
pub const SOURCE_TYPE_FLOAT: i32 = 6;
pub const SOURCE_TYPE_REAL: i32 = 7;
pub const SOURCE_TYPE_DOUBLE: i32 = 8;
pub const SOURCE_TYPE_VARCHAR: i32 = 12;
pub const SOURCE_TYPE_BOOLEAN: i32 = 16;
pub const SOURCE_TYPE_DATE: i32 = 91;
pub const SOURCE_TYPE_TIME: i32 = 92;
pub const SOURCE_TYPE_TIMESTAMP: i32 = 93;
pub const SOURCE_TYPE_NCHAR: i32 = -15;
pub const SOURCE_TYPE_NVARCHAR: i32 = -9;
pub const SOURCE_TYPE_LONGNVARCHAR: i32 = -16;
pub const SOURCE_TYPE_TIMESTAMP_WITH_TIMEZONE: i32 = 2014;

// SQL Server vendor codes
pub const SOURCE_TYPE_DATETIMEOFFSET: i32 = -155;
pub const SOURCE_TYPE_STRUCTURED: i32 = -153;
pub const SOURCE_TYPE_DATETIME: i32 = -151;
pub const SOURCE_TYPE_SMALLDATETIME: i32 = -150;
pub const SOURCE_TYPE_MONEY: i32 = -148;
pub const SOURCE_TYPE_SMALLMONEY: i32 = -146;
pub const SOURCE_TYPE_GUID: i32 = -145;
pub const SOURCE_TYPE_SQL_VARIANT: i32 = -156;
pub const SOURCE_TYPE_GEOMETRY: i32 = -157;
pub const SOURCE_TYPE_GEOGRAPHY: i32 = -158;
pub const SOURCE_TYPE_JSON: i32 = -159;
pub const SOURCE_TYPE_VECTOR: i32 = -160;

/// Declared type of a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    Bit,
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Decimal,
    Numeric,
    SmallMoney,
    Money,
    Char,
    VarChar,
    LongVarChar,
    NChar,
    NVarChar,
    LongNVarChar,
    Binary,
    VarBinary,
    LongVarBinary,
    Guid,
    Date,
    Time,
    Timestamp,
    DateTime,
    SmallDateTime,
    TimestampWithTimezone,
    DateTimeOffset,
    Json,
}

impl SourceType {
    /// Resolve a type code.
    ///
    /// Returns `Err(Error::UnsupportedType)` for codes that cannot be bulk loaded.
    pub fn from_code(code: i32) -> Result<Self> {
        let source_type = match code {
            SOURCE_TYPE_BIT => SourceType::Bit,
            SOURCE_TYPE_BOOLEAN => SourceType::Boolean,
            SOURCE_TYPE_TINYINT => SourceType::TinyInt,
            SOURCE_TYPE_SMALLINT => SourceType::SmallInt,
            SOURCE_TYPE_INTEGER => SourceType::Integer,
            SOURCE_TYPE_BIGINT => SourceType::BigInt,
            SOURCE_TYPE_REAL => SourceType::Real,
            SOURCE_TYPE_FLOAT => SourceType::Float,
            SOURCE_TYPE_DOUBLE => SourceType::Double,
            SOURCE_TYPE_DECIMAL => SourceType::Decimal,
            SOURCE_TYPE_NUMERIC => SourceType::Numeric,
            SOURCE_TYPE_SMALLMONEY => SourceType::SmallMoney,
            SOURCE_TYPE_MONEY => SourceType::Money,
            SOURCE_TYPE_CHAR => SourceType::Char,
            SOURCE_TYPE_VARCHAR => SourceType::VarChar,
            SOURCE_TYPE_LONGVARCHAR => SourceType::LongVarChar,
            SOURCE_TYPE_NCHAR => SourceType::NChar,
            SOURCE_TYPE_NVARCHAR => SourceType::NVarChar,
            SOURCE_TYPE_LONGNVARCHAR => SourceType::LongNVarChar,
            SOURCE_TYPE_BINARY => SourceType::Binary,
            SOURCE_TYPE_VARBINARY => SourceType::VarBinary,
            SOURCE_TYPE_LONGVARBINARY => SourceType::LongVarBinary,
            SOURCE_TYPE_GUID => SourceType::Guid,
            SOURCE_TYPE_DATE => SourceType::Date,
            SOURCE_TYPE_TIME => SourceType::Time,
            SOURCE_TYPE_TIMESTAMP => SourceType::Timestamp,
            SOURCE_TYPE_DATETIME => SourceType::DateTime,
            SOURCE_TYPE_SMALLDATETIME => SourceType::SmallDateTime,
            SOURCE_TYPE_TIMESTAMP_WITH_TIMEZONE => SourceType::TimestampWithTimezone,
            SOURCE_TYPE_DATETIMEOFFSET => SourceType::DateTimeOffset,
            SOURCE_TYPE_JSON => SourceType::Json,
            _ => return Err(Error::UnsupportedType { type_code: code }),
        };
        Ok(source_type)
    }

    /// Get the type code.
    pub fn code(&self) -> i32 {
        match self {
            SourceType::Bit => SOURCE_TYPE_BIT,
            SourceType::Boolean => SOURCE_TYPE_BOOLEAN,
            SourceType::TinyInt => SOURCE_TYPE_TINYINT,
            SourceType::SmallInt => SOURCE_TYPE_SMALLINT,
            SourceType::Integer => SOURCE_TYPE_INTEGER,
            SourceType::BigInt => SOURCE_TYPE_BIGINT,
            SourceType::Real => SOURCE_TYPE_REAL,
            SourceType::Float => SOURCE_TYPE_FLOAT,
            SourceType::Double => SOURCE_TYPE_DOUBLE,
            SourceType::Decimal => SOURCE_TYPE_DECIMAL,
            SourceType::Numeric => SOURCE_TYPE_NUMERIC,
            SourceType::SmallMoney => SOURCE_TYPE_SMALLMONEY,
            SourceType::Money => SOURCE_TYPE_MONEY,
            SourceType::Char => SOURCE_TYPE_CHAR,
            SourceType::VarChar => SOURCE_TYPE_VARCHAR,
            SourceType::LongVarChar => SOURCE_TYPE_LONGVARCHAR,
            SourceType::NChar => SOURCE_TYPE_NCHAR,
            SourceType::NVarChar => SOURCE_TYPE_NVARCHAR,
            SourceType::LongNVarChar => SOURCE_TYPE_LONGNVARCHAR,
            SourceType::Binary => SOURCE_TYPE_BINARY,
            SourceType::VarBinary => SOURCE_TYPE_VARBINARY,
            SourceType::LongVarBinary => SOURCE_TYPE_LONGVARBINARY,
            SourceType::Guid => SOURCE_TYPE_GUID,
            SourceType::Date => SOURCE_TYPE_DATE,
            SourceType::Time => SOURCE_TYPE_TIME,
            SourceType::Timestamp => SOURCE_TYPE_TIMESTAMP,
            SourceType::DateTime => SOURCE_TYPE_DATETIME,
            SourceType::SmallDateTime => SOURCE_TYPE_SMALLDATETIME,
            SourceType::TimestampWithTimezone => SOURCE_TYPE_TIMESTAMP_WITH_TIMEZONE,
            SourceType::DateTimeOffset => SOURCE_TYPE_DATETIMEOFFSET,
            SourceType::Json => SOURCE_TYPE_JSON,
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            SourceType::Bit
                | SourceType::Boolean
                | SourceType::TinyInt
                | SourceType::SmallInt
                | SourceType::Integer
                | SourceType::BigInt
        )
    }

    /// Exact and approximate numerics, excluding integers.
    pub fn is_fractional(&self) -> bool {
        matches!(
            self,
            SourceType::Real
                | SourceType::Float
                | SourceType::Double
                | SourceType::Decimal
                | SourceType::Numeric
                | SourceType::SmallMoney
                | SourceType::Money
        )
    }

    pub fn is_character(&self) -> bool {
        matches!(
            self,
            SourceType::Char
                | SourceType::VarChar
                | SourceType::LongVarChar
                | SourceType::NChar
                | SourceType::NVarChar
                | SourceType::LongNVarChar
        )
    }

    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            SourceType::Binary | SourceType::VarBinary | SourceType::LongVarBinary
        )
    }

    /// Types carrying both a date and a time of day.
    pub fn is_date_time(&self) -> bool {
        matches!(
            self,
            SourceType::Timestamp
                | SourceType::DateTime
                | SourceType::SmallDateTime
                | SourceType::TimestampWithTimezone
                | SourceType::DateTimeOffset
        )
    }

    /// Source type reported for a server column of type `sql_type`.
    pub fn for_sql_type(sql_type: SqlType) -> Self {
        match sql_type {
            SqlType::TinyInt => SourceType::TinyInt,
            SqlType::SmallInt => SourceType::SmallInt,
            SqlType::Int => SourceType::Integer,
            SqlType::BigInt => SourceType::BigInt,
            SqlType::Bit => SourceType::Bit,
            SqlType::Real => SourceType::Real,
            SqlType::Float => SourceType::Double,
            SqlType::Decimal { .. } => SourceType::Decimal,
            SqlType::Numeric { .. } => SourceType::Numeric,
            SqlType::SmallMoney => SourceType::SmallMoney,
            SqlType::Money => SourceType::Money,
            SqlType::SmallDateTime => SourceType::SmallDateTime,
            SqlType::DateTime => SourceType::DateTime,
            SqlType::DateTime2 { .. } => SourceType::Timestamp,
            SqlType::Date => SourceType::Date,
            SqlType::Time { .. } => SourceType::Time,
            SqlType::DateTimeOffset { .. } => SourceType::DateTimeOffset,
            SqlType::Char { .. } => SourceType::Char,
            SqlType::VarChar { length: Some(_) } => SourceType::VarChar,
            SqlType::VarChar { length: None } => SourceType::LongVarChar,
            SqlType::NChar { .. } => SourceType::NChar,
            SqlType::NVarChar { length: Some(_) } => SourceType::NVarChar,
            SqlType::NVarChar { length: None } => SourceType::LongNVarChar,
            SqlType::Binary { .. } => SourceType::Binary,
            SqlType::VarBinary { length: Some(_) } => SourceType::VarBinary,
            SqlType::VarBinary { length: None } => SourceType::LongVarBinary,
            SqlType::UniqueIdentifier => SourceType::Guid,
            SqlType::Json => SourceType::Json,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SourceType::Bit => "BIT",
            SourceType::Boolean => "BOOLEAN",
            SourceType::TinyInt => "TINYINT",
            SourceType::SmallInt => "SMALLINT",
            SourceType::Integer => "INTEGER",
            SourceType::BigInt => "BIGINT",
            SourceType::Real => "REAL",
            SourceType::Float => "FLOAT",
            SourceType::Double => "DOUBLE",
            SourceType::Decimal => "DECIMAL",
            SourceType::Numeric => "NUMERIC",
            SourceType::SmallMoney => "SMALLMONEY",
            SourceType::Money => "MONEY",
            SourceType::Char => "CHAR",
            SourceType::VarChar => "VARCHAR",
            SourceType::LongVarChar => "LONGVARCHAR",
            SourceType::NChar => "NCHAR",
            SourceType::NVarChar => "NVARCHAR",
            SourceType::LongNVarChar => "LONGNVARCHAR",
            SourceType::Binary => "BINARY",
            SourceType::VarBinary => "VARBINARY",
            SourceType::LongVarBinary => "LONGVARBINARY",
            SourceType::Guid => "GUID",
            SourceType::Date => "DATE",
            SourceType::Time => "TIME",
            SourceType::Timestamp => "TIMESTAMP",
            SourceType::DateTime => "DATETIME",
            SourceType::SmallDateTime => "SMALLDATETIME",
            SourceType::TimestampWithTimezone => "TIMESTAMP_WITH_TIMEZONE",
            SourceType::DateTimeOffset => "DATETIMEOFFSET",
            SourceType::Json => "JSON",
        };
        write!(f, "{}", name)
    }
}
