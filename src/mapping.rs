//! Source-to-destination column mapping.
//!
//! A `ColumnMapping` is built once per copy, before any row is read, and
//! fixes which source value feeds which destination column. Every pair is
//! checked against the type compatibility table up front.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::types::{ColumnDescriptor, SourceColumn, SourceType, SqlType};

/// Reference to a column by 1-based ordinal or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Ordinal(usize),
    Name(String),
}

impl From<usize> for ColumnRef {
    fn from(ordinal: usize) -> Self {
        ColumnRef::Ordinal(ordinal)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::Name(name)
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnRef::Ordinal(ordinal) => write!(f, "ordinal {}", ordinal),
            ColumnRef::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// One explicit source-to-destination pairing supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMappingEntry {
    pub source: ColumnRef,
    pub destination: ColumnRef,
}

impl ColumnMappingEntry {
    /// Pair a source column with a destination column.
    ///
    /// ```
    /// use mssql_bulk_rs::ColumnMappingEntry;
    ///
    /// let by_name = ColumnMappingEntry::new("customer_id", "CustomerId");
    /// let by_ordinal = ColumnMappingEntry::new(2usize, 1usize);
    /// ```
    pub fn new(source: impl Into<ColumnRef>, destination: impl Into<ColumnRef>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// A mapped column pair.
#[derive(Debug, Clone)]
pub struct MappedColumn {
    /// Position of the source value within a source row.
    pub source_index: usize,
    pub source: SourceColumn,
    pub destination: ColumnDescriptor,
}

/// The column pairs of one copy, in destination order.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pairs: Vec<MappedColumn>,
}

impl ColumnMapping {
    /// Reconcile source and destination columns.
    ///
    /// Without explicit entries columns are paired by position. Destination
    /// columns left unmapped must be nullable, defaulted, identity or computed.
    pub fn build(
        source: &[SourceColumn],
        destination: &[ColumnDescriptor],
        explicit: &[ColumnMappingEntry],
    ) -> Result<Self> {
        for column in destination {
            column.validate()?;
        }
        let index_pairs = if explicit.is_empty() {
            positional_pairs(source, destination)
        } else {
            explicit_pairs(source, destination, explicit)?
        };

        let mut mapped = vec![false; destination.len()];
        for &(_, dest_index) in &index_pairs {
            mapped[dest_index] = true;
        }
        if let Some(missing) = destination
            .iter()
            .zip(&mapped)
            .find(|(column, mapped)| !**mapped && !column.can_be_omitted())
            .map(|(column, _)| column)
        {
            return Err(Error::schema_mismatch(format!(
                "Destination column '{}' is not nullable, has no default and is not mapped",
                missing.name
            )));
        }

        let mut pairs = Vec::with_capacity(index_pairs.len());
        for (source_index, dest_index) in index_pairs {
            let src = &source[source_index];
            let dest = &destination[dest_index];
            if !is_compatible(src, dest.sql_type) {
                return Err(Error::TypeMismatch {
                    column: dest.name.clone(),
                    source_type: src.source_type.to_string(),
                    dest_type: dest.sql_type.to_string(),
                });
            }
            pairs.push(MappedColumn {
                source_index,
                source: src.clone(),
                destination: dest.clone(),
            });
        }
        pairs.sort_by_key(|p| p.destination.ordinal);

        debug!(columns = pairs.len(), "column mapping built");
        Ok(Self { pairs })
    }

    pub fn pairs(&self) -> &[MappedColumn] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Drop pairs whose destination is an identity column.
    pub fn without_identity(mut self) -> Self {
        self.pairs.retain(|p| {
            if p.destination.identity {
                debug!(column = %p.destination.name, "identity column left to the server");
            }
            !p.destination.identity
        });
        self
    }

    /// Destination columns in wire order.
    pub fn destination_columns(&self) -> Vec<ColumnDescriptor> {
        self.pairs.iter().map(|p| p.destination.clone()).collect()
    }
}

fn positional_pairs(source: &[SourceColumn], destination: &[ColumnDescriptor]) -> Vec<(usize, usize)> {
    if source.len() > destination.len() {
        let ignored: Vec<&str> = source[destination.len()..]
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        warn!(?ignored, "source has more columns than the destination; extra columns are ignored");
    }
    (0..source.len().min(destination.len()))
        .map(|i| (i, i))
        .collect()
}

fn explicit_pairs(
    source: &[SourceColumn],
    destination: &[ColumnDescriptor],
    explicit: &[ColumnMappingEntry],
) -> Result<Vec<(usize, usize)>> {
    let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(explicit.len());
    for entry in explicit {
        let source_index = match &entry.source {
            ColumnRef::Ordinal(ordinal) => source.iter().position(|c| c.ordinal == *ordinal),
            ColumnRef::Name(name) => source.iter().position(|c| c.name.eq_ignore_ascii_case(name)),
        }
        .ok_or_else(|| Error::schema_mismatch(format!("Source column {} does not exist", entry.source)))?;

        let dest_index = match &entry.destination {
            ColumnRef::Ordinal(ordinal) => destination.iter().position(|c| c.ordinal == *ordinal),
            ColumnRef::Name(name) => destination
                .iter()
                .position(|c| c.name.eq_ignore_ascii_case(name)),
        }
        .ok_or_else(|| {
            Error::schema_mismatch(format!(
                "Destination column {} does not exist",
                entry.destination
            ))
        })?;

        if pairs.iter().any(|&(_, d)| d == dest_index) {
            return Err(Error::schema_mismatch(format!(
                "Destination column '{}' is mapped more than once",
                destination[dest_index].name
            )));
        }
        pairs.push((source_index, dest_index));
    }
    Ok(pairs)
}

/// Whether values of `source` can be loaded into a `dest` column.
///
/// | Source | Destination |
/// |--------|-------------|
/// | integral, fractional | integer, bit, decimal, money, float, character |
/// | character | anything except binary |
/// | binary | binary; uniqueidentifier when declared as 16 bytes (or undeclared) |
/// | guid | uniqueidentifier, character |
/// | json | json, character |
/// | date | date, and the date-time types |
/// | time | time, and the date-time types except datetimeoffset |
/// | date-time | any temporal type |
pub fn is_compatible(source: &SourceColumn, dest: SqlType) -> bool {
    let st = source.source_type;
    let numeric =
        dest.is_integer() || dest.is_exact_numeric() || dest.is_money() || dest.is_approximate();

    if dest.is_character() {
        return !st.is_binary();
    }
    if st.is_integral() || st.is_fractional() {
        return numeric;
    }
    if st.is_character() {
        return !dest.is_binary();
    }
    if st.is_binary() {
        return dest.is_binary()
            || (dest == SqlType::UniqueIdentifier && matches!(source.precision, 0 | 16));
    }
    match st {
        SourceType::Guid => dest == SqlType::UniqueIdentifier,
        SourceType::Json => dest == SqlType::Json,
        SourceType::Date => dest.is_temporal() && !matches!(dest, SqlType::Time { .. }),
        SourceType::Time => matches!(
            dest,
            SqlType::Time { .. } | SqlType::DateTime | SqlType::SmallDateTime | SqlType::DateTime2 { .. }
        ),
        _ if st.is_date_time() => dest.is_temporal(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Vec<SourceColumn> {
        vec![
            SourceColumn::new(1, "id", SourceType::Integer),
            SourceColumn::new(2, "name", SourceType::VarChar),
            SourceColumn::new(3, "price", SourceType::Decimal).with_precision_scale(10, 2),
        ]
    }

    fn destination() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new(1, "Id", SqlType::Int).with_nullable(false),
            ColumnDescriptor::new(2, "Name", SqlType::NVarChar { length: Some(50) }),
            ColumnDescriptor::new(3, "Price", SqlType::Money),
        ]
    }

    #[test]
    fn test_positional_mapping() {
        let mapping = ColumnMapping::build(&source(), &destination(), &[]).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.pairs()[2].source_index, 2);
        assert_eq!(mapping.pairs()[2].destination.name, "Price");
    }

    #[test]
    fn test_positional_extra_destination_columns() {
        let mut dest = destination();
        dest.push(ColumnDescriptor::new(4, "Notes", SqlType::VarChar { length: None }));
        assert_eq!(ColumnMapping::build(&source(), &dest, &[]).unwrap().len(), 3);

        dest.push(ColumnDescriptor::new(5, "Required", SqlType::Int).with_nullable(false));
        assert!(matches!(
            ColumnMapping::build(&source(), &dest, &[]),
            Err(Error::SchemaMismatch { .. })
        ));

        let last = dest.len() - 1;
        dest[last] = dest[last].clone().with_default(true);
        assert!(ColumnMapping::build(&source(), &dest, &[]).is_ok());
    }

    #[test]
    fn test_positional_extra_source_columns_ignored() {
        let dest = &destination()[..2];
        let mapping = ColumnMapping::build(&source(), dest, &[]).unwrap();
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_explicit_mapping() {
        let explicit = vec![
            ColumnMappingEntry::new("PRICE", "price"),
            ColumnMappingEntry::new(1usize, 1usize),
        ];
        let mapping = ColumnMapping::build(&source(), &destination(), &explicit).unwrap();
        let names: Vec<_> = mapping.pairs().iter().map(|p| p.destination.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Price"]);
        assert_eq!(mapping.pairs()[1].source_index, 2);
    }

    #[test]
    fn test_explicit_mapping_errors() {
        let duplicate = vec![
            ColumnMappingEntry::new("id", "Id"),
            ColumnMappingEntry::new("price", 1usize),
        ];
        assert!(matches!(
            ColumnMapping::build(&source(), &destination(), &duplicate),
            Err(Error::SchemaMismatch { .. })
        ));

        let unknown = vec![ColumnMappingEntry::new("nope", "Id")];
        assert!(matches!(
            ColumnMapping::build(&source(), &destination(), &unknown),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_destination_limits_checked() {
        let src = vec![SourceColumn::new(1, "v", SourceType::Decimal)];
        let bad = [
            SqlType::Decimal { precision: 39, scale: 0 },
            SqlType::Time { scale: 8 },
            SqlType::NVarChar { length: Some(40_000) },
            SqlType::VarBinary { length: Some(0xFFFF) },
        ];
        for sql_type in bad {
            let dest = vec![ColumnDescriptor::new(1, "v", sql_type)];
            match ColumnMapping::build(&src, &dest, &[]) {
                Err(Error::SchemaMismatch { message }) => assert!(message.contains("'v'"), "{}", message),
                other => panic!("{} accepted: {:?}", sql_type, other),
            }
        }
    }

    #[test]
    fn test_type_mismatch_fails_eagerly() {
        let src = vec![SourceColumn::new(1, "doc", SourceType::Json)];
        let dest = vec![ColumnDescriptor::new(1, "n", SqlType::Int)];
        match ColumnMapping::build(&src, &dest, &[]) {
            Err(Error::TypeMismatch {
                column,
                source_type,
                dest_type,
            }) => {
                assert_eq!(column, "n");
                assert_eq!(source_type, "JSON");
                assert_eq!(dest_type, "int");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_compatibility_table() {
        let col = |t| SourceColumn::new(1, "c", t);
        assert!(is_compatible(&col(SourceType::SmallInt), SqlType::BigInt));
        assert!(is_compatible(&col(SourceType::Double), SqlType::Money));
        assert!(is_compatible(&col(SourceType::Json), SqlType::Json));
        assert!(is_compatible(&col(SourceType::Json), SqlType::NVarChar { length: None }));
        assert!(!is_compatible(&col(SourceType::Json), SqlType::VarBinary { length: None }));
        assert!(is_compatible(&col(SourceType::Timestamp), SqlType::DateTime2 { scale: 3 }));
        assert!(!is_compatible(&col(SourceType::Date), SqlType::Time { scale: 7 }));
        assert!(!is_compatible(&col(SourceType::Integer), SqlType::Date));
        assert!(is_compatible(
            &col(SourceType::Binary).with_precision_scale(16, 0),
            SqlType::UniqueIdentifier
        ));
        assert!(!is_compatible(
            &col(SourceType::Binary).with_precision_scale(8, 0),
            SqlType::UniqueIdentifier
        ));
        assert!(!is_compatible(&col(SourceType::VarBinary), SqlType::NVarChar { length: None }));
    }

    #[test]
    fn test_without_identity() {
        let dest = vec![
            ColumnDescriptor::new(1, "id", SqlType::Int).with_identity(true).with_nullable(false),
            ColumnDescriptor::new(2, "name", SqlType::VarChar { length: Some(10) }),
        ];
        let src = vec![
            SourceColumn::new(1, "id", SourceType::Integer),
            SourceColumn::new(2, "name", SourceType::VarChar),
        ];
        let mapping = ColumnMapping::build(&src, &dest, &[]).unwrap().without_identity();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.pairs()[0].source_index, 1);
    }
}
