//! Rows streamed from a query result.

use futures::stream::{self, BoxStream, Stream, StreamExt};

use crate::error::Result;
use crate::protocol::types::{ColumnDescriptor, SourceColumn, SqlValue};

use super::{insert_column, RowSource, SourceCursor};

/// A row source over a stream of result rows.
///
/// The stream is polled once per `advance`; an error from the stream ends the
/// copy with that error.
pub struct ResultSetSource {
    columns: Vec<SourceColumn>,
    rows: BoxStream<'static, Result<Vec<SqlValue>>>,
    cursor: SourceCursor,
}

impl ResultSetSource {
    /// Create a source from column descriptions and a row stream.
    pub fn new<S>(columns: Vec<SourceColumn>, rows: S) -> Result<Self>
    where
        S: Stream<Item = Result<Vec<SqlValue>>> + Send + 'static,
    {
        let mut ordered = Vec::with_capacity(columns.len());
        for column in columns {
            insert_column(&mut ordered, column)?;
        }
        Ok(Self {
            columns: ordered,
            rows: rows.boxed(),
            cursor: SourceCursor::new(),
        })
    }

    /// Create a source from server column metadata, e.g. from a query on another table.
    pub fn from_descriptors<S>(columns: &[ColumnDescriptor], rows: S) -> Result<Self>
    where
        S: Stream<Item = Result<Vec<SqlValue>>> + Send + 'static,
    {
        Self::new(columns.iter().map(SourceColumn::from_descriptor).collect(), rows)
    }

    /// Create a source from rows already fetched.
    pub fn from_rows(columns: Vec<SourceColumn>, rows: Vec<Vec<SqlValue>>) -> Result<Self> {
        Self::new(columns, stream::iter(rows.into_iter().map(Ok)))
    }
}

impl RowSource for ResultSetSource {
    fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    async fn advance(&mut self) -> Result<bool> {
        self.cursor.check_advance()?;
        match self.rows.next().await {
            Some(row) => self.cursor.set_row(row?, self.columns.len()),
            None => self.cursor.set_exhausted(),
        }
    }

    fn current_row(&self) -> Result<&[SqlValue]> {
        self.cursor.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::types::{SourceType, SqlType};

    #[tokio::test]
    async fn test_stream_rows() {
        let columns = vec![
            ColumnDescriptor::new(1, "id", SqlType::BigInt),
            ColumnDescriptor::new(2, "name", SqlType::NVarChar { length: Some(40) }),
        ];
        let rows = stream::iter(vec![
            Ok(vec![SqlValue::Int(1), SqlValue::from("a")]),
            Ok(vec![SqlValue::Int(2), SqlValue::Null]),
        ]);
        let mut source = ResultSetSource::from_descriptors(&columns, rows).unwrap();
        assert_eq!(source.column_type(1).unwrap(), SourceType::BigInt);
        assert_eq!(source.column_type(2).unwrap(), SourceType::NVarChar);
        assert_eq!(source.column_precision(2).unwrap(), 40);

        assert!(source.advance().await.unwrap());
        assert!(source.advance().await.unwrap());
        assert_eq!(source.current_row().unwrap()[1], SqlValue::Null);
        assert!(!source.advance().await.unwrap());
    }

    #[tokio::test]
    async fn test_stream_error_is_returned() {
        let columns = vec![SourceColumn::new(1, "id", SourceType::Integer)];
        let rows = stream::iter(vec![Err(Error::ConnectionClosed)]);
        let mut source = ResultSetSource::new(columns, rows).unwrap();
        assert!(matches!(source.advance().await, Err(Error::ConnectionClosed)));
    }
}
