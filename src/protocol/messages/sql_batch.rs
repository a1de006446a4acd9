//! SQL batch message and the INSERT BULK statement.

use crate::error::Result;
use crate::protocol::constants::*;
use crate::protocol::message::{ucs2_wire_size, write_all_headers, Message, WriteExt};
use crate::protocol::types::ColumnDescriptor;

/// SQL batch: ALL_HEADERS followed by the statement text in UTF-16LE.
pub struct SqlBatchMessage<'a> {
    /// Statement text.
    pub sql: &'a str,
    /// Transaction descriptor (0 outside an explicit transaction).
    pub transaction_descriptor: u64,
}

impl<'a> SqlBatchMessage<'a> {
    /// Create a SQL batch in auto-commit mode.
    pub fn new(sql: &'a str) -> Self {
        Self {
            sql,
            transaction_descriptor: 0,
        }
    }
}

impl Message for SqlBatchMessage<'_> {
    fn packet_type(&self) -> u8 {
        TDS_PACKET_TYPE_SQL_BATCH
    }

    fn wire_size(&self) -> usize {
        TDS_ALL_HEADERS_LEN as usize + ucs2_wire_size(self.sql)
    }

    fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        write_all_headers(buf, self.transaction_descriptor);
        buf.write_ucs2(self.sql);
        Ok(())
    }
}

/// Table hints appended to INSERT BULK.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkInsertHints {
    pub check_constraints: bool,
    pub fire_triggers: bool,
    pub keep_nulls: bool,
    pub table_lock: bool,
    pub keep_identity: bool,
}

impl BulkInsertHints {
    fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.check_constraints {
            names.push("CHECK_CONSTRAINTS");
        }
        if self.fire_triggers {
            names.push("FIRE_TRIGGERS");
        }
        if self.keep_nulls {
            names.push("KEEP_NULLS");
        }
        if self.table_lock {
            names.push("TABLOCK");
        }
        if self.keep_identity {
            names.push("KEEP_IDENTITY");
        }
        names
    }
}

/// Quote an identifier with brackets.
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Build the INSERT BULK statement announcing the columns of a bulk load.
///
/// `table` is used as given so callers can pass schema-qualified or quoted names.
pub fn insert_bulk_statement(
    table: &str,
    columns: &[ColumnDescriptor],
    hints: &BulkInsertHints,
) -> String {
    let column_list = columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.sql_type))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!("INSERT BULK {} ({})", table, column_list);
    let names = hints.names();
    if !names.is_empty() {
        sql.push_str(" WITH (");
        sql.push_str(&names.join(", "));
        sql.push(')');
    }
    sql
}
