use clv_load::{Destination, LoadError, PostgresDestination, SqliteDestination, load};
use clv_model::{LoadMode, LtvRow, TableName};
use tempfile::TempDir;

fn row(customer_id: i64, ltv: f64) -> LtvRow {
    LtvRow {
        customer_id,
        total_orders: 2,
        total_amount: 80.5,
        avg_order_value: 1.25,
        ltv,
    }
}

#[test]
fn appends_across_runs_in_a_file_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("clv.db");

    {
        let mut dest = SqliteDestination::open(&path, TableName::default()).unwrap();
        let report = load(&mut dest, &[row(1, 100.0), row(2, 50.0)], LoadMode::Append).unwrap();
        assert_eq!(report.rows_written, 2);
        assert_eq!(report.table, "customer_ltv");
    }

    let mut dest = SqliteDestination::open(&path, TableName::default()).unwrap();
    load(&mut dest, &[row(3, 10.0)], LoadMode::Append).unwrap();

    assert_eq!(dest.row_count().unwrap(), 3);
    assert_eq!(
        dest.rows().unwrap(),
        vec![row(1, 100.0), row(2, 50.0), row(3, 10.0)]
    );
}

#[test]
fn primary_key_violation_leaves_table_unchanged() {
    let mut dest = SqliteDestination::in_memory(TableName::default()).unwrap();
    load(&mut dest, &[row(1, 100.0)], LoadMode::Append).unwrap();
    let before = dest.rows().unwrap();

    // Row 7 is valid and comes first; it must not survive the failed batch.
    let err = load(&mut dest, &[row(7, 1.0), row(1, 5.0)], LoadMode::Append).unwrap_err();

    assert!(matches!(err, LoadError::Backend { .. }), "got: {err}");
    assert!(err.to_string().contains("customer_id 1"), "got: {err}");
    assert_eq!(dest.rows().unwrap(), before);
}

#[test]
fn failed_replace_keeps_previous_rows() {
    let mut dest = SqliteDestination::in_memory(TableName::default()).unwrap();
    load(&mut dest, &[row(1, 100.0), row(2, 20.0)], LoadMode::Append).unwrap();

    let err = load(&mut dest, &[row(5, 1.0), row(5, 2.0)], LoadMode::Replace);

    assert!(err.is_err());
    assert_eq!(dest.row_count().unwrap(), 2);
}

#[test]
fn replace_swaps_table_contents() {
    let mut dest = SqliteDestination::in_memory(TableName::new("ltv_snapshot").unwrap()).unwrap();
    load(&mut dest, &[row(1, 100.0), row(2, 20.0)], LoadMode::Append).unwrap();

    let report = load(&mut dest, &[row(1, 120.0)], LoadMode::Replace).unwrap();

    assert_eq!(report.rows_deleted, 2);
    assert_eq!(report.table, "ltv_snapshot");
    assert_eq!(dest.rows().unwrap(), vec![row(1, 120.0)]);
}

#[test]
fn unreachable_postgres_is_a_connect_error() {
    let result = PostgresDestination::connect(
        "host=127.0.0.1 port=1 user=etl dbname=warehouse connect_timeout=2",
        TableName::default(),
    );

    match result {
        Err(LoadError::Connect { target, .. }) => {
            assert_eq!(target, "postgres database 'warehouse' as 'etl'");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("connected to a closed port"),
    }
}

#[test]
fn malformed_connection_string_is_a_connect_error() {
    let result = PostgresDestination::connect("host=localhost port=notanumber", TableName::default());
    assert!(matches!(result, Err(LoadError::Connect { .. })));
}
