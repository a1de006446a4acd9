//! Character, binary and JSON encoders.
//!
//! Bounded types are written with a 2-byte length prefix. `(max)` types and
//! json are written as PLP streams.

use crate::error::{Error, Result};
use crate::protocol::buffer::WriteBuffer;
use crate::protocol::types::{ColumnDescriptor, SqlType};

/// Convert text to the byte form a column stores.
///
/// nchar/nvarchar use UTF-16LE. char/varchar use UTF-8 under a UTF-8
/// collation and Latin-1 otherwise. json is always UTF-8.
pub fn text_to_wire(value: &str, column: &ColumnDescriptor) -> Result<Vec<u8>> {
    match column.sql_type {
        SqlType::NChar { .. } | SqlType::NVarChar { .. } => {
            Ok(value.encode_utf16().flat_map(u16::to_le_bytes).collect())
        }
        SqlType::Json => Ok(value.as_bytes().to_vec()),
        _ if column.is_utf8() => Ok(value.as_bytes().to_vec()),
        _ => latin1(value, &column.name),
    }
}

fn latin1(value: &str, column: &str) -> Result<Vec<u8>> {
    value
        .chars()
        .map(|c| {
            u8::try_from(c as u32).map_err(|_| {
                Error::type_conversion(
                    column,
                    format!("character {:?} cannot be represented in the column collation", c),
                )
            })
        })
        .collect()
}

/// Length of `value` in the units the column length is declared in.
fn declared_len(bytes: &[u8], sql_type: SqlType) -> usize {
    match sql_type {
        SqlType::NChar { .. } | SqlType::NVarChar { .. } => bytes.len() / 2,
        _ => bytes.len(),
    }
}

fn declared_max(sql_type: SqlType) -> Option<usize> {
    match sql_type {
        SqlType::Char { length } | SqlType::NChar { length } | SqlType::Binary { length } => {
            Some(length as usize)
        }
        SqlType::VarChar { length }
        | SqlType::NVarChar { length }
        | SqlType::VarBinary { length } => length.map(|len| len as usize),
        _ => None,
    }
}

fn write_bounded(bytes: &[u8], column: &ColumnDescriptor, buf: &mut WriteBuffer) -> Result<()> {
    if let Some(max_length) = declared_max(column.sql_type) {
        let length = declared_len(bytes, column.sql_type);
        if length > max_length {
            return Err(Error::ValueTooLarge {
                column: column.name.clone(),
                length,
                max_length,
            });
        }
    }
    if column.sql_type.is_plp() {
        buf.write_plp(bytes);
    } else {
        buf.write_ushort_len_bytes(bytes);
    }
    Ok(())
}

/// Encode text into a character or json column.
///
/// json documents are passed through unchanged.
pub fn encode_text(value: &str, column: &ColumnDescriptor, buf: &mut WriteBuffer) -> Result<()> {
    let bytes = text_to_wire(value, column)?;
    write_bounded(&bytes, column, buf)
}

/// Encode binary data.
pub fn encode_binary(value: &[u8], column: &ColumnDescriptor, buf: &mut WriteBuffer) -> Result<()> {
    write_bounded(value, column, buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::buffer::ReadBuffer;

    #[test]
    fn test_nvarchar_utf16() {
        let col = ColumnDescriptor::new(1, "n", SqlType::NVarChar { length: Some(10) });
        let mut buf = WriteBuffer::new();
        encode_text("hé", &col, &mut buf).unwrap();
        assert_eq!(buf.as_bytes(), &[4, 0, b'h', 0, 0xE9, 0]);
    }

    #[test]
    fn test_nvarchar_length_in_characters() {
        let col = ColumnDescriptor::new(1, "n", SqlType::NVarChar { length: Some(3) });
        let mut buf = WriteBuffer::new();
        assert!(encode_text("abc", &col, &mut buf).is_ok());
        match encode_text("abcd", &col, &mut buf) {
            Err(Error::ValueTooLarge {
                column,
                length,
                max_length,
            }) => {
                assert_eq!(column, "n");
                assert_eq!(length, 4);
                assert_eq!(max_length, 3);
            }
            other => panic!("Expected ValueTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_varchar_latin1() {
        let col = ColumnDescriptor::new(1, "v", SqlType::VarChar { length: Some(10) });
        let mut buf = WriteBuffer::new();
        encode_text("é", &col, &mut buf).unwrap();
        assert_eq!(buf.as_bytes(), &[1, 0, 0xE9]);
        assert!(matches!(
            encode_text("€", &col, &mut buf),
            Err(Error::TypeConversion { .. })
        ));
    }

    #[test]
    fn test_varchar_utf8_collation() {
        let col = ColumnDescriptor::new(1, "v", SqlType::VarChar { length: Some(10) })
            .with_collation([0x09, 0x04, 0xD0, 0x04, 0x34]);
        let mut buf = WriteBuffer::new();
        encode_text("€", &col, &mut buf).unwrap();
        assert_eq!(buf.as_bytes(), &[3, 0, 0xE2, 0x82, 0xAC]);
    }

    #[test]
    fn test_json_passthrough() {
        let col = ColumnDescriptor::new(1, "doc", SqlType::Json);
        let doc = r#"{"a": [1, 2,   3], "b": "ü"}"#;
        let mut buf = WriteBuffer::new();
        encode_text(doc, &col, &mut buf).unwrap();

        let mut read = ReadBuffer::new(buf.freeze());
        assert_eq!(read.read_u64_le().unwrap(), doc.len() as u64);
        let chunk = read.read_u32_le().unwrap() as usize;
        assert_eq!(&read.read_bytes(chunk).unwrap()[..], doc.as_bytes());
        assert_eq!(read.read_u32_le().unwrap(), 0);
    }

    #[test]
    fn test_invalid_json_is_not_validated() {
        let col = ColumnDescriptor::new(1, "doc", SqlType::Json);
        let mut buf = WriteBuffer::new();
        assert!(encode_text("{not json", &col, &mut buf).is_ok());
    }

    #[test]
    fn test_binary_bounds() {
        let col = ColumnDescriptor::new(1, "b", SqlType::Binary { length: 2 });
        let mut buf = WriteBuffer::new();
        encode_binary(&[1, 2], &col, &mut buf).unwrap();
        assert_eq!(buf.as_bytes(), &[2, 0, 1, 2]);
        assert!(matches!(
            encode_binary(&[1, 2, 3], &col, &mut buf),
            Err(Error::ValueTooLarge { .. })
        ));

        let col = ColumnDescriptor::new(1, "b", SqlType::VarBinary { length: None });
        let mut buf = WriteBuffer::new();
        encode_binary(&[0xAB; 9000], &col, &mut buf).unwrap();
        assert_eq!(buf.len(), 8 + 4 + 8000 + 4 + 1000 + 4);
    }
}
