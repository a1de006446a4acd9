//! Delimited text files (CSV, TSV, ...).
//!
//! Each line is one row. Fields may be quoted with `"`; inside quotes the
//! delimiter is literal and `""` stands for one quote. Quoted fields do not
//! span lines. An empty unquoted field is NULL.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::protocol::encode::{
    parse_date, parse_datetime, parse_datetimeoffset, parse_decimal, parse_time,
};
use crate::protocol::types::{SourceColumn, SourceType, SqlValue};

use super::{insert_column, RowSource, SourceCursor};

/// A field split from a line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    text: String,
    quoted: bool,
}

/// A row source reading delimited text.
///
/// Columns are declared with `add_column_metadata`; a column declared with an
/// empty name takes its name from the header line.
pub struct DelimitedFileSource<R> {
    lines: Lines<R>,
    delimiter: char,
    header: Option<Vec<String>>,
    columns: Vec<SourceColumn>,
    cursor: SourceCursor,
    line_number: u64,
}

impl DelimitedFileSource<BufReader<File>> {
    /// Open a file.
    pub async fn open(
        path: impl AsRef<Path>,
        delimiter: char,
        first_line_is_header: bool,
    ) -> Result<Self> {
        let file = File::open(path.as_ref()).await?;
        debug!(path = %path.as_ref().display(), "opened delimited file");
        Self::from_reader(BufReader::new(file), delimiter, first_line_is_header).await
    }
}

impl<R> DelimitedFileSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    /// Read from any buffered reader, consuming the header line if present.
    pub async fn from_reader(reader: R, delimiter: char, first_line_is_header: bool) -> Result<Self> {
        if delimiter == '"' || delimiter == '\n' || delimiter == '\r' {
            return Err(Error::invalid_config(
                "delimiter",
                format!("{:?} cannot be used as a delimiter", delimiter),
            ));
        }

        let mut source = Self {
            lines: reader.lines(),
            delimiter,
            header: None,
            columns: Vec::new(),
            cursor: SourceCursor::new(),
            line_number: 0,
        };

        if first_line_is_header {
            if let Some(line) = source.next_line(false).await? {
                let fields = split_fields(&line, delimiter)
                    .map_err(|e| Error::adapter_state(format!("header line: {}", e)))?;
                source.header = Some(fields.into_iter().map(|f| f.text).collect());
            }
        }
        Ok(source)
    }

    /// Column names from the header line, if any.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Declare the column at `ordinal` (1-based field position).
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
        let mut name = name.into();
        if name.is_empty() {
            name = self
                .header
                .as_ref()
                .and_then(|h| h.get(ordinal.wrapping_sub(1)))
                .cloned()
                .unwrap_or_default();
        }
        insert_column(
            &mut self.columns,
            SourceColumn::new(ordinal, name, source_type).with_precision_scale(precision, scale),
        )
    }

    /// Next line of input. Blank lines are skipped unless `keep_blank`.
    async fn next_line(&mut self, keep_blank: bool) -> Result<Option<String>> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            self.line_number += 1;
            let line = line.strip_suffix('\r').map(str::to_owned).unwrap_or(line);
            if keep_blank || !line.is_empty() {
                return Ok(Some(line));
            }
        }
    }

    fn parse_row(&self, line: &str) -> Result<Vec<SqlValue>> {
        let fields = split_fields(line, self.delimiter)
            .map_err(|e| Error::schema_mismatch(format!("line {}: {}", self.line_number, e)))?;

        self.columns
            .iter()
            .map(|column| {
                let field = fields.get(column.ordinal - 1).ok_or_else(|| {
                    Error::schema_mismatch(format!(
                        "line {} has {} fields, column '{}' is field {}",
                        self.line_number,
                        fields.len(),
                        column.name,
                        column.ordinal
                    ))
                })?;
                convert_field(field, column)
            })
            .collect()
    }
}

impl<R> RowSource for DelimitedFileSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn columns(&self) -> &[SourceColumn] {
        &self.columns
    }

    async fn advance(&mut self) -> Result<bool> {
        self.cursor.check_advance()?;
        if self.columns.is_empty() {
            return Err(Error::adapter_state("no column metadata has been added"));
        }
        // a blank line is a NULL row when every column reads the first field
        let keep_blank = self.columns.iter().all(|c| c.ordinal == 1);
        match self.next_line(keep_blank).await? {
            Some(line) => {
                let row = self.parse_row(&line)?;
                self.cursor.set_row(row, self.columns.len())
            }
            None => self.cursor.set_exhausted(),
        }
    }

    fn current_row(&self) -> Result<&[SqlValue]> {
        self.cursor.current()
    }
}

/// Split one line into fields.
fn split_fields(line: &str, delimiter: char) -> std::result::Result<Vec<Field>, String> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        let mut text = String::new();
        let quoted = chars.peek() == Some(&'"');

        if quoted {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        text.push('"');
                    }
                    Some('"') => break,
                    Some(c) => text.push(c),
                    None => return Err("unterminated quoted field".to_string()),
                }
            }
            match chars.next() {
                None => {
                    fields.push(Field { text, quoted });
                    return Ok(fields);
                }
                Some(c) if c == delimiter => fields.push(Field { text, quoted }),
                Some(c) => return Err(format!("unexpected {:?} after closing quote", c)),
            }
        } else {
            loop {
                match chars.next() {
                    None => {
                        fields.push(Field { text, quoted });
                        return Ok(fields);
                    }
                    Some(c) if c == delimiter => break,
                    Some(c) => text.push(c),
                }
            }
            fields.push(Field { text, quoted });
        }
    }
}

/// Convert a field to a value of the column's declared type.
fn convert_field(field: &Field, column: &SourceColumn) -> Result<SqlValue> {
    if field.text.is_empty() && !field.quoted {
        return Ok(SqlValue::Null);
    }
    let text = field.text.as_str();
    let invalid = || {
        Error::type_conversion(
            &column.name,
            format!("cannot parse '{}' as {}", text, column.source_type),
        )
    };

    let value = match column.source_type {
        SourceType::Bit | SourceType::Boolean => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => SqlValue::Bool(true),
            "0" | "false" => SqlValue::Bool(false),
            _ => return Err(invalid()),
        },
        SourceType::TinyInt | SourceType::SmallInt | SourceType::Integer | SourceType::BigInt => {
            SqlValue::Int(text.trim().parse().map_err(|_| invalid())?)
        }
        SourceType::Real | SourceType::Float | SourceType::Double => {
            SqlValue::Float(text.trim().parse().map_err(|_| invalid())?)
        }
        SourceType::Decimal | SourceType::Numeric | SourceType::SmallMoney | SourceType::Money => {
            match parse_decimal(text) {
                Some(d) => SqlValue::Decimal(d),
                // too large for an exact decimal; let the encoder report the range
                None if text.trim().parse::<f64>().is_ok() => SqlValue::String(text.to_string()),
                None => return Err(invalid()),
            }
        }
        SourceType::Binary | SourceType::VarBinary | SourceType::LongVarBinary => {
            SqlValue::Bytes(decode_hex(text).ok_or_else(invalid)?)
        }
        SourceType::Guid => SqlValue::Uuid(Uuid::parse_str(text.trim()).map_err(|_| invalid())?),
        SourceType::Date => SqlValue::Date(parse_date(text).ok_or_else(invalid)?),
        SourceType::Time => SqlValue::Time(parse_time(text).ok_or_else(invalid)?),
        SourceType::Timestamp | SourceType::DateTime | SourceType::SmallDateTime => {
            SqlValue::DateTime(parse_datetime(text).ok_or_else(invalid)?)
        }
        SourceType::TimestampWithTimezone | SourceType::DateTimeOffset => {
            SqlValue::DateTimeOffset(parse_datetimeoffset(text).ok_or_else(invalid)?)
        }
        SourceType::Char
        | SourceType::VarChar
        | SourceType::LongVarChar
        | SourceType::NChar
        | SourceType::NVarChar
        | SourceType::LongNVarChar
        | SourceType::Json => SqlValue::String(text.to_string()),
    };
    Ok(value)
}

/// Decode hex digits, with or without a `0x` prefix.
fn decode_hex(text: &str) -> Option<Vec<u8>> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.len() % 2 != 0 {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok())
        .collect()
}
