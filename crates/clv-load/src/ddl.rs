//! SQL text for the destination table.
//!
//! Table names are [`TableName`]s, validated identifiers, so they are
//! interpolated unquoted.

use std::fmt::Write;

use clv_model::TableName;

/// Destination columns in insert order.
pub const COLUMNS: [&str; 5] = [
    "customer_id",
    "total_orders",
    "total_amount",
    "avg_order_value",
    "ltv",
];

/// Rows per multi-row `INSERT` statement.
pub const INSERT_CHUNK_SIZE: usize = 500;

/// Idempotent DDL for the destination table. Identical for both backends.
pub fn create_table_sql(table: &TableName) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (customer_id INTEGER PRIMARY KEY, total_orders INTEGER, total_amount NUMERIC(10,2), avg_order_value NUMERIC(10,2), ltv NUMERIC(10,2))"
    )
}

pub fn delete_all_sql(table: &TableName) -> String {
    format!("DELETE FROM {table}")
}

pub fn count_sql(table: &TableName) -> String {
    format!("SELECT COUNT(*) FROM {table}")
}

/// Single-row insert with `?N` placeholders (SQLite).
pub fn sqlite_insert_sql(table: &TableName) -> String {
    format!(
        "INSERT INTO {table} ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
        COLUMNS.join(", ")
    )
}

/// Multi-row insert with `$N` placeholders (PostgreSQL).
///
/// Decimal parameters are sent as `float8` and converted to `NUMERIC` by
/// the server.
pub fn postgres_insert_sql(table: &TableName, rows: usize) -> String {
    let header = format!("INSERT INTO {table} ({}) VALUES ", COLUMNS.join(", "));
    let mut sql = String::with_capacity(header.len() + rows * 64);
    sql.push_str(&header);
    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        let base = row * COLUMNS.len();
        let _ = write!(
            sql,
            "(${}, ${}, ${}::float8, ${}::float8, ${}::float8)",
            base + 1,
            base + 2,
            base + 3,
            base + 4,
            base + 5
        );
    }
    sql
}
