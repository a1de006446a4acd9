//! Row sources feeding a bulk copy.
//!
//! A `RowSource` is a single-pass, non-restartable sequence of rows with a
//! fixed set of columns. Three implementations are provided:
//!
//! - `MemorySource`: rows supplied by the caller
//! - `DelimitedFileSource`: rows parsed from delimited text
//! - `ResultSetSource`: rows streamed from a query result

mod delimited;
mod memory;
mod result_set;

pub use delimited::DelimitedFileSource;
pub use memory::MemorySource;
pub use result_set::ResultSetSource;

use std::future::Future;

use crate::error::{Error, Result};
use crate::protocol::types::{SourceColumn, SourceType, SqlValue};

/// A tabular source of rows.
///
/// Row values are positionally aligned with `columns()`.
pub trait RowSource {
    /// Source columns ordered by ordinal. Stable for the lifetime of the source.
    fn columns(&self) -> &[SourceColumn];

    /// Move to the next row. Returns `false` once the source is exhausted;
    /// calling `advance` again after that is an error.
    fn advance(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// Values of the current row.
    fn current_row(&self) -> Result<&[SqlValue]>;

    fn column_ordinals(&self) -> Vec<usize> {
        self.columns().iter().map(|c| c.ordinal).collect()
    }

    /// Look up a column by ordinal.
    fn column(&self, ordinal: usize) -> Result<&SourceColumn> {
        self.columns()
            .iter()
            .find(|c| c.ordinal == ordinal)
            .ok_or_else(|| Error::ColumnNotFound {
                name: format!("ordinal {}", ordinal),
            })
    }

    fn column_name(&self, ordinal: usize) -> Result<&str> {
        self.column(ordinal).map(|c| c.name.as_str())
    }

    fn column_type(&self, ordinal: usize) -> Result<SourceType> {
        self.column(ordinal).map(|c| c.source_type)
    }

    fn column_precision(&self, ordinal: usize) -> Result<u32> {
        self.column(ordinal).map(|c| c.precision)
    }

    fn column_scale(&self, ordinal: usize) -> Result<u32> {
        self.column(ordinal).map(|c| c.scale)
    }
}

/// Position of a source relative to its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    BeforeFirst,
    /// On the n-th row (1-based).
    OnRow(u64),
    Exhausted,
}

/// Cursor bookkeeping shared by the row sources.
#[derive(Debug)]
pub(crate) struct SourceCursor {
    position: Position,
    current: Vec<SqlValue>,
}

impl SourceCursor {
    pub(crate) fn new() -> Self {
        Self {
            position: Position::BeforeFirst,
            current: Vec::new(),
        }
    }

    pub(crate) fn position(&self) -> Position {
        self.position
    }

    pub(crate) fn started(&self) -> bool {
        self.position != Position::BeforeFirst
    }

    /// Fail if the source already reported exhaustion.
    pub(crate) fn check_advance(&self) -> Result<()> {
        if self.position == Position::Exhausted {
            return Err(Error::adapter_state("advance called after the source was exhausted"));
        }
        Ok(())
    }

    /// Install the next row, checking its width.
    pub(crate) fn set_row(&mut self, row: Vec<SqlValue>, width: usize) -> Result<bool> {
        let number = match self.position {
            Position::OnRow(n) => n + 1,
            _ => 1,
        };
        if row.len() != width {
            return Err(Error::schema_mismatch(format!(
                "Row {} has {} values but the source declares {} columns",
                number,
                row.len(),
                width
            )));
        }
        self.current = row;
        self.position = Position::OnRow(number);
        Ok(true)
    }

    pub(crate) fn set_exhausted(&mut self) -> Result<bool> {
        self.current.clear();
        self.position = Position::Exhausted;
        Ok(false)
    }

    pub(crate) fn current(&self) -> Result<&[SqlValue]> {
        match self.position {
            Position::OnRow(_) => Ok(&self.current),
            Position::BeforeFirst => Err(Error::adapter_state(
                "current_row called before the first advance",
            )),
            Position::Exhausted => Err(Error::adapter_state(
                "current_row called after the source was exhausted",
            )),
        }
    }
}

/// Insert a column keeping ordinal order; rejects zero and duplicate ordinals.
pub(crate) fn insert_column(columns: &mut Vec<SourceColumn>, column: SourceColumn) -> Result<()> {
    if column.ordinal == 0 {
        return Err(Error::schema_mismatch("Column ordinals start at 1"));
    }
    match columns.binary_search_by_key(&column.ordinal, |c| c.ordinal) {
        Ok(_) => Err(Error::schema_mismatch(format!(
            "Duplicate source column ordinal {}",
            column.ordinal
        ))),
        Err(pos) => {
            columns.insert(pos, column);
            Ok(())
        }
    }
}
