//! Caller-supplied rows.

use crate::error::{Error, Result};
use crate::protocol::types::{SourceColumn, SourceType, SqlValue};

use super::{insert_column, RowSource, SourceCursor};

type RowIter = Box<dyn Iterator<Item = Vec<SqlValue>> + Send>;

/// A row source over rows produced by the caller.
///
/// Rows are pulled lazily from the supplied iterator, so large generated
/// inputs are never materialized.
///
/// # Example
///
/// ```
/// use mssql_bulk_rs::{MemorySource, SourceType, SqlValue};
///
/// let mut source = MemorySource::new();
/// source.add_column_metadata(1, "id", SourceType::Integer, 0, 0).unwrap();
/// source.add_column_metadata(2, "doc", SourceType::Json, 0, 0).unwrap();
/// let source = source.with_rows(vec![
///     vec![SqlValue::Int(1), SqlValue::from(r#"{"a":1}"#)],
/// ]);
/// ```
pub struct MemorySource {
    columns: Vec<SourceColumn>,
    rows: RowIter,
    cursor: SourceCursor,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    /// Create a source with no columns and no rows.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            rows: Box::new(std::iter::empty()),
            cursor: SourceCursor::new(),
        }
    }

    /// Create a source from column descriptions and rows.
    pub fn from_rows<I>(columns: Vec<SourceColumn>, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<SqlValue>>,
        I::IntoIter: Send + 'static,
    {
        let mut source = Self::new();
        for column in columns {
            insert_column(&mut source.columns, column)?;
        }
        Ok(source.with_rows(rows))
    }

    /// Declare a column.
    pub fn add_column_metadata(
        &mut self,
        ordinal: usize,
        name: impl Into<String>,
        source_type: SourceType,
        precision: u32,
        scale: u32,
    ) -> Result<()> {
        if self.cursor.started() {
            return Err(Error::adapter_state(
                "columns cannot be added after reading has started",
            ));
        }
        insert_column(
            &mut self.columns,
            SourceColumn::new(ordinal, name, source_type).with_precision_scale(precision, scale),
        )
    }

    /// Replace the rows to produce.
    pub fn with_rows<I>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<SqlValue>>,
        I::IntoIter: Send + 'static,
    {
        self.rows = Box::new(rows.into_iter());
        self
    }
}

impl RowSource for MemorySource {
    fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    async fn advance(&mut self) -> Result<bool> {
        self.cursor.check_advance()?;
        match self.rows.next() {
            Some(row) => self.cursor.set_row(row, self.columns.len()),
            None => self.cursor.set_exhausted(),
        }
    }

    fn current_row(&self) -> Result<&[SqlValue]> {
        self.cursor.current()
    }
}
