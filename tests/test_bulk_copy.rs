//! Integration tests for the bulk copy pipeline against an in-memory server.

use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use futures::stream;
use mssql_bulk_rs::protocol::constants::TDS_TOKEN_ROW;
use mssql_bulk_rs::protocol::decode::decode_value;
use mssql_bulk_rs::protocol::ReadBuffer;
use mssql_bulk_rs::{
    Batch, BatchAck, BulkConnection, BulkCopy, BulkCopyOptions, BulkTarget, ColumnDescriptor,
    DelimitedFileSource, Error, MemorySource, Result, ResultSetSource, RowSource, SchemaResolver, SourceColumn, SourceType, SqlType, SqlValue,
};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A batch as the server received it.
struct ReceivedBatch {
    first_row: u64,
    statement: String,
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

/// Decodes every batch it receives and keeps the committed ones.
#[derive(Default)]
struct FakeServer {
    destination: Vec<ColumnDescriptor>,
    batches: Vec<ReceivedBatch>,
    attempts: usize,
    reject_attempt: Option<usize>,
    timeout: Option<Duration>,
}

impl FakeServer {
    fn with_table(destination: Vec<ColumnDescriptor>) -> Self {
        Self {
            destination,
            ..Default::default()
        }
    }

    fn committed_rows(&self) -> usize {
        self.batches.iter().map(|b| b.rows.len()).sum()
    }

    fn all_rows(&self) -> Vec<Vec<SqlValue>> {
        self.batches.iter().flat_map(|b| b.rows.clone()).collect()
    }
}

impl BulkConnection for FakeServer {
    async fn send_batch(&mut self, target: &BulkTarget, batch: &Batch) -> Result<BatchAck> {
        self.attempts += 1;
        if self.reject_attempt == Some(self.attempts) {
            return Err(Error::Server {
                number: 547,
                state: 0,
                class: 16,
                message: "The INSERT statement conflicted with the CHECK constraint".to_string(),
            });
        }

        let mut buf = ReadBuffer::new(batch.rows.clone());
        let mut rows = Vec::new();
        while buf.remaining() > 0 {
            assert_eq!(buf.read_u8()?, TDS_TOKEN_ROW);
            let row = target
                .columns
                .iter()
                .map(|c| decode_value(&mut buf, c))
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }
        assert_eq!(rows.len(), batch.row_count);

        self.batches.push(ReceivedBatch {
            first_row: batch.first_row,
            statement: target.insert_bulk_statement(),
            columns: target.columns.iter().map(|c| c.name.clone()).collect(),
            rows,
        });
        Ok(BatchAck {
            rows_committed: batch.row_count as u64,
        })
    }

    fn set_operation_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }
}

impl SchemaResolver for FakeServer {
    async fn describe_table(&mut self, _table: &str) -> Result<Vec<ColumnDescriptor>> {
        Ok(self.destination.clone())
    }
}

fn people_table() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new(1, "id", SqlType::Int).with_nullable(false),
        ColumnDescriptor::new(2, "name", SqlType::NVarChar { length: Some(50) }),
    ]
}

fn people(count: i64) -> MemorySource {
    let mut source = MemorySource::new();
    source.add_column_metadata(1, "id", SourceType::Integer, 0, 0).unwrap();
    source.add_column_metadata(2, "name", SourceType::NVarChar, 50, 0).unwrap();
    source.with_rows((1..=count).map(|i| vec![SqlValue::Int(i), SqlValue::from(format!("person {}", i))]))
}

fn money_source(values: &[&str]) -> MemorySource {
    let rows: Vec<Vec<SqlValue>> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            vec![
                SqlValue::Int(i as i64 + 1),
                SqlValue::Decimal(Decimal::from_str(v).unwrap()),
            ]
        })
        .collect();
    MemorySource::from_rows(
        vec![
            SourceColumn::new(1, "id", SourceType::Integer),
            SourceColumn::new(2, "amount", SourceType::Decimal).with_precision_scale(19, 4),
        ],
        rows,
    )
    .unwrap()
}

#[tokio::test]
async fn test_batches_follow_batch_size() {
    let mut server = FakeServer::with_table(people_table());
    let mut source = people(12_000);

    let summary = BulkCopy::new(&mut server, "dbo.people")
        .with_options(BulkCopyOptions::new().with_batch_size(5000))
        .write_to_server(&mut source)
        .await
        .unwrap();

    assert_eq!(summary.rows_copied, 12_000);
    assert_eq!(summary.batches, 3);
    let sizes: Vec<_> = server.batches.iter().map(|b| b.rows.len()).collect();
    assert_eq!(sizes, vec![5000, 5000, 2000]);
    let starts: Vec<_> = server.batches.iter().map(|b| b.first_row).collect();
    assert_eq!(starts, vec![1, 5001, 10_001]);

    let last = &server.batches[2].rows[1999];
    assert_eq!(last[0], SqlValue::Int(12_000));
    assert_eq!(last[1], SqlValue::from("person 12000"));
}

#[tokio::test]
async fn test_rejected_batch_reports_committed_rows() {
    let mut server = FakeServer {
        reject_attempt: Some(2),
        ..FakeServer::with_table(people_table())
    };
    let mut source = people(12_000);

    let err = BulkCopy::new(&mut server, "dbo.people")
        .with_options(BulkCopyOptions::new().with_batch_size(5000))
        .write_to_server(&mut source)
        .await
        .unwrap_err();

    match &err {
        Error::BatchFailed {
            first_row,
            row_count,
            rows_committed,
            ..
        } => {
            assert_eq!(*first_row, 5001);
            assert_eq!(*row_count, 5000);
            assert_eq!(*rows_committed, 5000);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(err.root(), Error::Server { number: 547, .. }));
    assert_eq!(server.committed_rows(), 5000);
    assert_eq!(server.attempts, 2);
}

#[tokio::test]
async fn test_money_out_of_range_fails_fast() {
    let table = vec![
        ColumnDescriptor::new(1, "id", SqlType::Int),
        ColumnDescriptor::new(2, "amount", SqlType::Money),
    ];
    let mut server = FakeServer::with_table(table);
    let mut source = money_source(&[
        "1.00",
        "922337203685477.5807",
        "-922337203685477.5808",
        "922337203685477.5808",
        "5.00",
    ]);

    let err = BulkCopy::new(&mut server, "dbo.ledger")
        .with_options(BulkCopyOptions::new().with_batch_size(2))
        .write_to_server(&mut source)
        .await
        .unwrap_err();

    match &err {
        Error::RowFailed { row, .. } => assert_eq!(*row, 4),
        other => panic!("unexpected {:?}", other),
    }
    match err.root() {
        Error::ValueOutOfRange { column, value } => {
            assert_eq!(column, "amount");
            assert_eq!(value, "922337203685477.5808");
        }
        other => panic!("unexpected {:?}", other),
    }
    // only the first full batch reached the server
    assert_eq!(server.committed_rows(), 2);
    assert_eq!(server.attempts, 1);
}

#[tokio::test]
async fn test_smallmoney_bounds() {
    let table = vec![
        ColumnDescriptor::new(1, "id", SqlType::Int),
        ColumnDescriptor::new(2, "amount", SqlType::SmallMoney),
    ];

    let mut server = FakeServer::with_table(table.clone());
    let mut source = money_source(&["214748.3647", "-214748.3648"]);
    let summary = BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap();
    assert_eq!(summary.rows_copied, 2);
    assert_eq!(
        server.all_rows()[1][1],
        SqlValue::Decimal(Decimal::from_str("-214748.3648").unwrap())
    );

    let mut server = FakeServer::with_table(table);
    let mut source = money_source(&["-214748.3649"]);
    let err = BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap_err();
    assert!(matches!(err.root(), Error::ValueOutOfRange { .. }));
    assert_eq!(server.attempts, 0);
}

#[tokio::test]
async fn test_json_documents_pass_through() {
    let table = vec![
        ColumnDescriptor::new(1, "id", SqlType::Int),
        ColumnDescriptor::new(2, "doc", SqlType::Json),
        ColumnDescriptor::new(3, "meta", SqlType::Json),
    ];
    let docs = [
        r#"{"key":"value"}"#,
        r#"{"nested":{"list":[1,2,{"deep":true}]},"text":"café ☕"}"#,
        "[ 1 , 2 ,3 ]",
    ];

    let mut source = MemorySource::new();
    source.add_column_metadata(1, "id", SourceType::Integer, 0, 0).unwrap();
    source.add_column_metadata(2, "doc", SourceType::Json, 0, 0).unwrap();
    source.add_column_metadata(3, "meta", SourceType::Json, 0, 0).unwrap();
    let rows: Vec<Vec<SqlValue>> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            vec![
                SqlValue::Int(i as i64),
                SqlValue::from(*doc),
                if i == 1 { SqlValue::Null } else { SqlValue::from(r#"{"v":1}"#) },
            ]
        })
        .collect();
    let mut source = source.with_rows(rows);

    let mut server = FakeServer::with_table(table);
    BulkCopy::new(&mut server, "dbo.docs")
        .write_to_server(&mut source)
        .await
        .unwrap();

    let rows = server.all_rows();
    assert_eq!(rows.len(), 3);
    for (row, doc) in rows.iter().zip(docs) {
        assert_eq!(row[1], SqlValue::from(doc));
    }
    assert_eq!(rows[1][2], SqlValue::Null);
    assert_eq!(rows[2][2], SqlValue::from(r#"{"v":1}"#));
    assert!(server.batches[0].statement.contains("[doc] json, [meta] json"));
}

#[tokio::test]
async fn test_uniqueidentifier_values() {
    let id = Uuid::from_str("6F9619FF-8B86-D011-B42D-00C04FC964FF").unwrap();
    let table = vec![ColumnDescriptor::new(1, "guid", SqlType::UniqueIdentifier)];

    let mut source = MemorySource::from_rows(
        vec![SourceColumn::new(1, "guid", SourceType::Guid)],
        vec![
            vec![SqlValue::Uuid(id)],
            vec![SqlValue::from("6f9619ff-8b86-d011-b42d-00c04fc964ff")],
            vec![SqlValue::Null],
        ],
    )
    .unwrap();
    let mut server = FakeServer::with_table(table.clone());
    BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap();
    let rows = server.all_rows();
    assert_eq!(rows[0][0], SqlValue::Uuid(id));
    assert_eq!(rows[1][0], SqlValue::Uuid(id));
    assert_eq!(rows[2][0], SqlValue::Null);

    // 16-byte binary source
    let mut source = MemorySource::from_rows(
        vec![SourceColumn::new(1, "raw", SourceType::Binary).with_precision_scale(16, 0)],
        vec![vec![SqlValue::Bytes(id.as_bytes().to_vec())]],
    )
    .unwrap();
    let mut server = FakeServer::with_table(table);
    BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap();
    assert_eq!(server.all_rows()[0][0], SqlValue::Uuid(id));
}

#[tokio::test]
async fn test_temporal_precision() {
    let table = vec![
        ColumnDescriptor::new(1, "legacy", SqlType::DateTime),
        ColumnDescriptor::new(2, "precise", SqlType::DateTime2 { scale: 3 }),
    ];
    let ts = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap();

    let mut source = MemorySource::from_rows(
        vec![
            SourceColumn::new(1, "legacy", SourceType::Timestamp),
            SourceColumn::new(2, "precise", SourceType::Timestamp),
        ],
        vec![
            vec![
                SqlValue::DateTime(ts("2024-03-01 10:00:00.005")),
                SqlValue::DateTime(ts("2024-03-01 10:00:00.1235")),
            ],
            vec![
                SqlValue::DateTime(ts("2024-03-01 23:59:59.999")),
                SqlValue::DateTime(ts("2024-03-01 10:00:00.1234567")),
            ],
        ],
    )
    .unwrap();
    let mut server = FakeServer::with_table(table);
    BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap();

    let rows = server.all_rows();
    assert_eq!(rows[0][0], SqlValue::DateTime(ts("2024-03-01 10:00:00.007")));
    assert_eq!(rows[0][1], SqlValue::DateTime(ts("2024-03-01 10:00:00.124")));
    let next_day = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
    assert_eq!(rows[1][0], SqlValue::DateTime(next_day));
    assert_eq!(rows[1][1], SqlValue::DateTime(ts("2024-03-01 10:00:00.123")));
}

#[tokio::test]
async fn test_identity_columns() {
    let table = vec![
        ColumnDescriptor::new(1, "id", SqlType::Int)
            .with_nullable(false)
            .with_identity(true),
        ColumnDescriptor::new(2, "name", SqlType::NVarChar { length: Some(50) }),
    ];

    let mut server = FakeServer::with_table(table.clone());
    let mut source = people(3);
    BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap();
    assert_eq!(server.batches[0].columns, vec!["name"]);
    assert!(!server.batches[0].statement.contains("KEEP_IDENTITY"));
    assert_eq!(server.all_rows()[0], vec![SqlValue::from("person 1")]);

    let mut server = FakeServer::with_table(table);
    let mut source = people(3);
    BulkCopy::new(&mut server, "t")
        .with_options(BulkCopyOptions::new().with_preserve_identity(true))
        .write_to_server(&mut source)
        .await
        .unwrap();
    assert_eq!(server.batches[0].columns, vec!["id", "name"]);
    assert!(server.batches[0].statement.ends_with("WITH (KEEP_IDENTITY)"));
    assert_eq!(server.all_rows()[2][0], SqlValue::Int(3));
}

#[tokio::test]
async fn test_explicit_mapping_by_name() {
    let table = vec![
        ColumnDescriptor::new(1, "Name", SqlType::NVarChar { length: Some(50) }),
        ColumnDescriptor::new(2, "Id", SqlType::BigInt).with_nullable(false),
        ColumnDescriptor::new(3, "Notes", SqlType::VarChar { length: None }),
    ];
    let mut server = FakeServer::with_table(table);
    let mut source = people(2);
    BulkCopy::new(&mut server, "t")
        .with_column_mapping("id", "Id")
        .with_column_mapping("name", "Name")
        .write_to_server(&mut source)
        .await
        .unwrap();

    assert_eq!(server.batches[0].columns, vec!["Name", "Id"]);
    assert_eq!(
        server.all_rows()[1],
        vec![SqlValue::from("person 2"), SqlValue::Int(2)]
    );
}

#[tokio::test]
async fn test_type_mismatch_detected_before_reading() {
    let table = vec![ColumnDescriptor::new(1, "n", SqlType::Int)];
    let mut source = MemorySource::from_rows(
        vec![SourceColumn::new(1, "doc", SourceType::Json)],
        vec![vec![SqlValue::from("{}")]],
    )
    .unwrap();
    let mut server = FakeServer::with_table(table);

    let err = BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { .. }));
    assert!(matches!(source.current_row(), Err(Error::AdapterState { .. })));
    assert_eq!(server.attempts, 0);
}

#[tokio::test]
async fn test_null_into_not_null_column() {
    let mut server = FakeServer::with_table(people_table());
    let mut source = MemorySource::from_rows(
        vec![
            SourceColumn::new(1, "id", SourceType::Integer),
            SourceColumn::new(2, "name", SourceType::NVarChar),
        ],
        vec![
            vec![SqlValue::Int(1), SqlValue::Null],
            vec![SqlValue::Null, SqlValue::from("nobody")],
        ],
    )
    .unwrap();

    let err = BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RowFailed { row: 2, .. }));
    assert!(matches!(err.root(), Error::NullNotAllowed { column } if column == "id"));
    assert_eq!(server.attempts, 0);
}

#[tokio::test]
async fn test_value_too_large() {
    let table = vec![ColumnDescriptor::new(1, "code", SqlType::VarChar { length: Some(3) })];
    let mut source = MemorySource::from_rows(
        vec![SourceColumn::new(1, "code", SourceType::VarChar)],
        vec![vec![SqlValue::from("abcd")]],
    )
    .unwrap();
    let mut server = FakeServer::with_table(table);
    let err = BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap_err();
    assert!(matches!(
        err.root(),
        Error::ValueTooLarge {
            length: 4,
            max_length: 3,
            ..
        }
    ));
}

#[tokio::test]
async fn test_options_reach_connection_and_statement() {
    let mut server = FakeServer::with_table(people_table());
    let mut source = people(1);
    let options = BulkCopyOptions::parse(
        "batchSize=10;checkConstraints=true;fireTriggers=true;tableLock=true;operationTimeout=15",
    )
    .unwrap();
    BulkCopy::new(&mut server, "dbo.people")
        .with_options(options)
        .write_to_server(&mut source)
        .await
        .unwrap();

    assert_eq!(server.timeout, Some(Duration::from_secs(15)));
    assert_eq!(
        server.batches[0].statement,
        "INSERT BULK dbo.people ([id] int, [name] nvarchar(50)) \
         WITH (CHECK_CONSTRAINTS, FIRE_TRIGGERS, TABLOCK)"
    );
}

#[tokio::test]
async fn test_invalid_batch_size_rejected() {
    let mut server = FakeServer::with_table(people_table());
    let mut source = people(1);
    let err = BulkCopy::new(&mut server, "t")
        .with_options(BulkCopyOptions::new().with_batch_size(0))
        .write_to_server(&mut source)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration { .. }));
}

#[tokio::test]
async fn test_empty_source_sends_nothing() {
    let mut server = FakeServer::with_table(people_table());
    let mut source = people(0);
    let summary = BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap();
    assert_eq!(summary.rows_copied, 0);
    assert_eq!(summary.batches, 0);
    assert_eq!(server.attempts, 0);
}

#[tokio::test]
async fn test_delimited_text_into_table() {
    let text = "\
id|price|created|note
1|19.99|2024-01-15 08:30:00|\"first | entry\"
2||2024-01-16 09:00:00.5|

3|0.0001|2024-01-17|plain
";
    let table = vec![
        ColumnDescriptor::new(1, "id", SqlType::Int).with_nullable(false),
        ColumnDescriptor::new(2, "price", SqlType::Money),
        ColumnDescriptor::new(3, "created", SqlType::DateTime2 { scale: 7 }),
        ColumnDescriptor::new(4, "note", SqlType::NVarChar { length: Some(40) }),
    ];

    let mut source = DelimitedFileSource::from_reader(text.as_bytes(), '|', true)
        .await
        .unwrap();
    source.add_column_metadata(1, "", SourceType::Integer, 0, 0).unwrap();
    source.add_column_metadata(2, "", SourceType::Decimal, 19, 4).unwrap();
    source.add_column_metadata(3, "", SourceType::Timestamp, 0, 7).unwrap();
    source.add_column_metadata(4, "", SourceType::NVarChar, 40, 0).unwrap();
    assert_eq!(source.column_name(2).unwrap(), "price");

    let mut server = FakeServer::with_table(table);
    let summary = BulkCopy::new(&mut server, "dbo.orders")
        .write_to_server(&mut source)
        .await
        .unwrap();
    assert_eq!(summary.rows_copied, 3);

    let ts = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap();
    let rows = server.all_rows();
    assert_eq!(
        rows[0],
        vec![
            SqlValue::Int(1),
            SqlValue::Decimal(Decimal::from_str("19.99").unwrap()),
            SqlValue::DateTime(ts("2024-01-15 08:30:00")),
            SqlValue::from("first | entry"),
        ]
    );
    assert_eq!(rows[1][1], SqlValue::Null);
    assert_eq!(rows[1][2], SqlValue::DateTime(ts("2024-01-16 09:00:00.5")));
    assert_eq!(rows[1][3], SqlValue::Null);
    assert_eq!(rows[2][2], SqlValue::DateTime(ts("2024-01-17 00:00:00")));
}

#[tokio::test]
async fn test_result_set_between_tables() {
    let origin = vec![
        ColumnDescriptor::new(1, "code", SqlType::Char { length: 4 }),
        ColumnDescriptor::new(2, "total", SqlType::Decimal { precision: 10, scale: 2 }),
    ];
    let rows = vec![
        Ok(vec![SqlValue::from("AB12"), SqlValue::Decimal(Decimal::new(12345, 2))]),
        Ok(vec![SqlValue::from("CD34"), SqlValue::Null]),
    ];
    let mut source = ResultSetSource::from_descriptors(&origin, stream::iter(rows)).unwrap();

    let destination = vec![
        ColumnDescriptor::new(1, "code", SqlType::NVarChar { length: Some(10) }),
        ColumnDescriptor::new(2, "total", SqlType::Decimal { precision: 18, scale: 4 }),
    ];
    let mut server = FakeServer::with_table(destination);
    BulkCopy::new(&mut server, "archive")
        .write_to_server(&mut source)
        .await
        .unwrap();

    let rows = server.all_rows();
    assert_eq!(rows[0][0], SqlValue::from("AB12"));
    assert_eq!(rows[0][1], SqlValue::Decimal(Decimal::from_str("123.45").unwrap()));
    assert_eq!(rows[1][1], SqlValue::Null);
}

#[tokio::test]
async fn test_source_error_stops_copy() {
    let columns = vec![SourceColumn::new(1, "n", SourceType::Integer)];
    let rows = vec![
        Ok(vec![SqlValue::Int(1)]),
        Ok(vec![SqlValue::Int(2)]),
        Err(Error::protocol("connection reset while reading rows")),
    ];
    let mut source = ResultSetSource::new(columns, stream::iter(rows)).unwrap();

    let mut server = FakeServer::with_table(vec![ColumnDescriptor::new(1, "n", SqlType::Int)]);
    let err = BulkCopy::new(&mut server, "t")
        .with_options(BulkCopyOptions::new().with_batch_size(1))
        .write_to_server(&mut source)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Protocol { .. }));
    assert_eq!(server.committed_rows(), 2);
}

#[tokio::test]
async fn test_destination_beyond_server_limits_rejected() {
    let table = vec![ColumnDescriptor::new(1, "body", SqlType::NVarChar { length: Some(40_000) })];
    let mut source = MemorySource::from_rows(
        vec![SourceColumn::new(1, "body", SourceType::NVarChar)],
        vec![vec![SqlValue::from("x".repeat(40_000))]],
    )
    .unwrap();
    let mut server = FakeServer::with_table(table);

    let err = BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SchemaMismatch { .. }));
    assert!(matches!(source.current_row(), Err(Error::AdapterState { .. })));
    assert_eq!(server.attempts, 0);
}

#[tokio::test]
async fn test_uniqueidentifier_byte_patterns() {
    let mut patterns: Vec<[u8; 16]> = (0..16u8)
        .map(|pos| std::array::from_fn(|i| if i as u8 == pos { 0x80 | pos } else { pos }))
        .collect();
    patterns.push(std::array::from_fn(|i| 0xF0 - i as u8 * 13));

    let rows: Vec<Vec<SqlValue>> = patterns
        .iter()
        .map(|b| vec![SqlValue::Uuid(Uuid::from_bytes(*b)), SqlValue::Bytes(b.to_vec())])
        .collect();
    let mut source = MemorySource::from_rows(
        vec![
            SourceColumn::new(1, "id", SourceType::Guid),
            SourceColumn::new(2, "raw", SourceType::Binary).with_precision_scale(16, 0),
        ],
        rows,
    )
    .unwrap();
    let table = vec![
        ColumnDescriptor::new(1, "id", SqlType::UniqueIdentifier),
        ColumnDescriptor::new(2, "raw", SqlType::UniqueIdentifier),
    ];
    let mut server = FakeServer::with_table(table);
    BulkCopy::new(&mut server, "t")
        .write_to_server(&mut source)
        .await
        .unwrap();

    let rows = server.all_rows();
    assert_eq!(rows.len(), patterns.len());
    for (row, bytes) in rows.iter().zip(&patterns) {
        let expected = SqlValue::Uuid(Uuid::from_bytes(*bytes));
        assert_eq!(row[0], expected);
        assert_eq!(row[1], expected);
    }
}
