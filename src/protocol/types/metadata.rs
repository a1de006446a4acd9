//! Internal column metadata from the COLMETADATA token.
//!
//! This struct preserves the raw TDS wire format data.
//! For the mapper and encoder, use `ColumnDescriptor`.

use crate::protocol::constants::{
    TDS_COLLATION_LEN, TDS_COL_FLAG_COMPUTED, TDS_COL_FLAG_IDENTITY, TDS_COL_FLAG_NULLABLE,
};

/// Internal column metadata from wire format.
#[derive(Debug, Clone)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// TDS data type (raw wire format).
    pub tds_type: u8,
    /// Maximum length from TYPE_INFO.
    pub max_len: u32,
    /// Numeric precision.
    pub precision: u8,
    /// Numeric or fractional-second scale.
    pub scale: u8,
    /// Collation for character types.
    pub collation: Option<[u8; TDS_COLLATION_LEN]>,
    /// Column flags.
    pub flags: u16,
}

impl ColumnMetadata {
    /// Create new column metadata with minimal info.
    pub fn new(name: String, tds_type: u8) -> Self {
        Self {
            name,
            tds_type,
            max_len: 0,
            precision: 0,
            scale: 0,
            collation: None,
            flags: TDS_COL_FLAG_NULLABLE,
        }
    }

    pub fn nullable(&self) -> bool {
        self.flags & TDS_COL_FLAG_NULLABLE != 0
    }

    pub fn identity(&self) -> bool {
        self.flags & TDS_COL_FLAG_IDENTITY != 0
    }

    pub fn computed(&self) -> bool {
        self.flags & TDS_COL_FLAG_COMPUTED != 0
    }
}
