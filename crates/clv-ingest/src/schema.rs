//! Conform raw text DataFrames to the fixed source schemas.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, Series, StringChunked};

use clv_model::{ColumnKind, ColumnSpec, SourceKind};

use crate::error::{IngestError, Result};
use crate::polars_utils::{parse_f64, parse_i64};

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').trim().to_ascii_lowercase()
}

/// Map normalized header names to the names actually present in the frame.
///
/// The first occurrence wins when two headers normalize to the same name.
fn header_lookup(df: &DataFrame) -> BTreeMap<String, String> {
    let mut lookup = BTreeMap::new();
    for name in df.get_column_names() {
        lookup
            .entry(normalize_header(name))
            .or_insert_with(|| name.to_string());
    }
    lookup
}

fn invalid_value(spec: &ColumnSpec, idx: usize, value: Option<&str>, path: &Path) -> IngestError {
    IngestError::InvalidValue {
        column: spec.name.to_string(),
        value: value.unwrap_or_default().to_string(),
        row: idx + 1,
        path: path.to_path_buf(),
    }
}

fn integer_column(values: &StringChunked, spec: &ColumnSpec, path: &Path) -> Result<Column> {
    let mut parsed = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        let number = value
            .and_then(parse_i64)
            .ok_or_else(|| invalid_value(spec, idx, value, path))?;
        parsed.push(number);
    }
    Ok(Series::new(spec.name.into(), parsed).into_column())
}

fn decimal_column(values: &StringChunked, spec: &ColumnSpec, path: &Path) -> Result<Column> {
    let mut parsed = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        let number = value
            .and_then(parse_f64)
            .ok_or_else(|| invalid_value(spec, idx, value, path))?;
        parsed.push(number);
    }
    Ok(Series::new(spec.name.into(), parsed).into_column())
}

fn text_column(values: &StringChunked, spec: &ColumnSpec) -> Column {
    let cleaned: Vec<String> = values
        .into_iter()
        .map(|value| value.map(str::trim).unwrap_or_default().to_string())
        .collect();
    Series::new(spec.name.into(), cleaned).into_column()
}

fn ensure_unique(df: &DataFrame, column: &str, path: &Path) -> Result<()> {
    let values = df.column(column)?.i64()?;
    let mut seen = HashSet::with_capacity(values.len());
    for value in values.into_iter().flatten() {
        if !seen.insert(value) {
            return Err(IngestError::DuplicateKey {
                column: column.to_string(),
                value,
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Conform a raw (all-text) DataFrame to the schema of `kind`.
///
/// - Required headers are matched case-insensitively, ignoring whitespace
///   and a leading byte-order mark. Extra columns are dropped.
/// - Integer and decimal columns must have a parseable value on every row.
/// - Text cells are trimmed; missing text becomes an empty string.
/// - The source's unique key (if any) must not repeat.
///
/// The result has exactly the schema columns, in schema order.
pub fn conform_source(raw: &DataFrame, kind: SourceKind, path: &Path) -> Result<DataFrame> {
    let lookup = header_lookup(raw);
    let mut columns = Vec::with_capacity(kind.schema().len());

    for spec in kind.schema() {
        let actual = lookup
            .get(spec.name)
            .ok_or_else(|| IngestError::MissingColumn {
                column: spec.name.to_string(),
                path: path.to_path_buf(),
            })?;
        let values = raw.column(actual)?.cast(&DataType::String)?;
        let values = values.str()?;
        let column = match spec.kind {
            ColumnKind::Integer => integer_column(values, spec, path)?,
            ColumnKind::Decimal => decimal_column(values, spec, path)?,
            ColumnKind::Text => text_column(values, spec),
        };
        columns.push(column);
    }

    let df = DataFrame::new(columns)?;
    if let Some(key) = kind.unique_key() {
        ensure_unique(&df, key, path)?;
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(columns: Vec<(&str, Vec<Option<&str>>)>) -> DataFrame {
        let cols: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Series::new(name.into(), values).into_column())
            .collect();
        DataFrame::new(cols).unwrap()
    }

    #[test]
    fn matches_headers_case_insensitively() {
        let df = raw(vec![
            ("\u{feff}Order_ID", vec![Some("10")]),
            (" Customer_Id ", vec![Some("1")]),
            ("PRICE", vec![Some("99.5")]),
            ("note", vec![Some("ignored")]),
        ]);

        let conformed = conform_source(&df, SourceKind::Orders, Path::new("orders.csv")).unwrap();

        let names: Vec<String> = conformed
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, vec!["order_id", "customer_id", "price"]);
        assert_eq!(conformed.column("price").unwrap().f64().unwrap().get(0), Some(99.5));
        assert_eq!(conformed.column("order_id").unwrap().i64().unwrap().get(0), Some(10));
    }

    #[test]
    fn reports_missing_column() {
        let df = raw(vec![
            ("order_id", vec![Some("10")]),
            ("customer_id", vec![Some("1")]),
        ]);

        let err = conform_source(&df, SourceKind::Payments, Path::new("payments.csv")).unwrap_err();

        assert!(matches!(err, IngestError::MissingColumn { ref column, .. } if column == "amount"));
    }

    #[test]
    fn reports_row_of_bad_number() {
        let df = raw(vec![
            ("order_id", vec![Some("10"), Some("11")]),
            ("customer_id", vec![Some("1"), None]),
            ("amount", vec![Some("5"), Some("6")]),
        ]);

        let err = conform_source(&df, SourceKind::Payments, Path::new("payments.csv")).unwrap_err();

        match err {
            IngestError::InvalidValue { column, row, value, .. } => {
                assert_eq!(column, "customer_id");
                assert_eq!(row, 2);
                assert_eq!(value, "");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn trims_text_and_fills_missing() {
        let df = raw(vec![
            ("customer_id", vec![Some("1")]),
            ("first_name", vec![Some("  Ada ")]),
            ("last_name", vec![None]),
            ("email", vec![Some("ada@example.com")]),
            ("country", vec![Some("RW")]),
            ("gender", vec![Some("F")]),
            ("date_of_birth", vec![Some(" 2000-01-01 ")]),
        ]);

        let conformed =
            conform_source(&df, SourceKind::Customers, Path::new("customers.csv")).unwrap();

        let first = conformed.column("first_name").unwrap().str().unwrap();
        let last = conformed.column("last_name").unwrap().str().unwrap();
        let dob = conformed.column("date_of_birth").unwrap().str().unwrap();
        assert_eq!(first.get(0), Some("Ada"));
        assert_eq!(last.get(0), Some(""));
        assert_eq!(dob.get(0), Some("2000-01-01"));
    }

    #[test]
    fn rejects_duplicate_customer_ids() {
        let df = raw(vec![
            ("customer_id", vec![Some("1"), Some("1")]),
            ("first_name", vec![Some("Ada"), Some("Bob")]),
            ("last_name", vec![Some("L"), Some("M")]),
            ("email", vec![Some("a@x"), Some("b@x")]),
            ("country", vec![Some("RW"), Some("RW")]),
            ("gender", vec![Some("F"), Some("M")]),
            ("date_of_birth", vec![Some("2000-01-01"), Some("1990-05-05")]),
        ]);

        let err =
            conform_source(&df, SourceKind::Customers, Path::new("customers.csv")).unwrap_err();

        assert!(matches!(err, IngestError::DuplicateKey { value: 1, .. }));
    }
}
