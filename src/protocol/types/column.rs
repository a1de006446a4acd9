//! Column descriptors for both sides of a transfer.
//!
//! `ColumnDescriptor` describes a destination column and is derived from the
//! internal `ColumnMetadata`. `SourceColumn` describes a column reported by a
//! row source.

use crate::error::{Error, Result};
use crate::protocol::constants::{TDS_COLLATION_DEFAULT, TDS_COLLATION_FLAG_UTF8, TDS_COLLATION_LEN};

use super::metadata::ColumnMetadata;
use super::source_type::SourceType;
use super::sql_type::SqlType;

/// A destination table column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// 1-based position in the table.
    pub ordinal: usize,
    /// Column name.
    pub name: String,
    /// Column data type.
    pub sql_type: SqlType,
    /// Whether NULL values are allowed.
    pub nullable: bool,
    /// Whether the column is an identity column.
    pub identity: bool,
    /// Whether the column has a default constraint.
    pub has_default: bool,
    /// Whether the column is computed (never written).
    pub computed: bool,
    /// Collation for character types.
    pub collation: Option<[u8; TDS_COLLATION_LEN]>,
}

impl ColumnDescriptor {
    /// Create a nullable column with no identity, default or collation.
    ///
    /// Character columns get the server default collation.
    pub fn new(ordinal: usize, name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            ordinal,
            name: name.into(),
            sql_type,
            nullable: true,
            identity: false,
            has_default: false,
            computed: false,
            collation: sql_type.has_collation().then_some(TDS_COLLATION_DEFAULT),
        }
    }

    /// Create a column from COLMETADATA.
    ///
    /// Returns error if the TDS type is not supported.
    pub fn from_metadata(ordinal: usize, meta: &ColumnMetadata) -> Result<Self> {
        let sql_type = SqlType::from_raw(meta.tds_type, meta.max_len, meta.precision, meta.scale)?;
        let column = Self {
            ordinal,
            name: meta.name.clone(),
            sql_type,
            nullable: meta.nullable(),
            identity: meta.identity(),
            has_default: false,
            computed: meta.computed(),
            collation: meta.collation,
        };
        column.validate()?;
        Ok(column)
    }

    /// Check the declared type against the server's precision, scale and length limits.
    pub fn validate(&self) -> Result<()> {
        self.sql_type.validate().map_err(|e| match e {
            Error::SchemaMismatch { message } => {
                Error::schema_mismatch(format!("Column '{}': {}", self.name, message))
            }
            other => other,
        })
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_identity(mut self, identity: bool) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_default(mut self, has_default: bool) -> Self {
        self.has_default = has_default;
        self
    }

    pub fn with_collation(mut self, collation: [u8; TDS_COLLATION_LEN]) -> Self {
        self.collation = Some(collation);
        self
    }

    pub fn precision(&self) -> u8 {
        self.sql_type.precision()
    }

    pub fn scale(&self) -> u8 {
        self.sql_type.scale()
    }

    /// Whether single-byte character data is stored as UTF-8.
    pub fn is_utf8(&self) -> bool {
        match self.collation {
            Some(c) => u32::from_le_bytes([c[0], c[1], c[2], c[3]]) & TDS_COLLATION_FLAG_UTF8 != 0,
            None => false,
        }
    }

    /// Whether the server can fill this column when no value is sent.
    pub fn can_be_omitted(&self) -> bool {
        self.nullable || self.has_default || self.identity || self.computed
    }
}

/// A column reported by a row source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceColumn {
    /// 1-based ordinal within the source.
    pub ordinal: usize,
    /// Column name.
    pub name: String,
    /// Declared source type.
    pub source_type: SourceType,
    /// Declared precision (or length for character and binary types).
    pub precision: u32,
    /// Declared scale.
    pub scale: u32,
}

impl SourceColumn {
    pub fn new(ordinal: usize, name: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            ordinal,
            name: name.into(),
            source_type,
            precision: 0,
            scale: 0,
        }
    }

    pub fn with_precision_scale(mut self, precision: u32, scale: u32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Describe a server column, e.g. one of a result set being copied.
    pub fn from_descriptor(column: &ColumnDescriptor) -> Self {
        let precision = match column.sql_type {
            SqlType::Char { length } | SqlType::NChar { length } | SqlType::Binary { length } => {
                length as u32
            }
            SqlType::VarChar { length }
            | SqlType::NVarChar { length }
            | SqlType::VarBinary { length } => length.map_or(0, u32::from),
            other => other.precision() as u32,
        };
        Self::new(
            column.ordinal,
            column.name.clone(),
            SourceType::for_sql_type(column.sql_type),
        )
        .with_precision_scale(precision, column.scale() as u32)
    }
}
