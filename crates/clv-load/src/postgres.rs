//! `PostgreSQL`-backed implementation of [`Destination`].
//!
//! Uses the sync `postgres` crate, which drives its own runtime internally.

use postgres::types::ToSql;
use postgres::{Client, Config, NoTls};
use tracing::debug;

use clv_model::{LoadMode, LtvRow, TableName};

use crate::ddl::{self, INSERT_CHUNK_SIZE};
use crate::destination::{Destination, LoadReport};
use crate::error::{self, LoadError};

/// A row converted to the destination's column types.
struct PgRow {
    customer_id: i32,
    total_orders: i32,
    total_amount: f64,
    avg_order_value: f64,
    ltv: f64,
}

fn to_int4(customer_id: i64, field: &'static str, value: i64) -> error::Result<i32> {
    i32::try_from(value).map_err(|_| LoadError::OutOfRange {
        customer_id,
        field,
        value,
    })
}

fn convert(row: &LtvRow) -> error::Result<PgRow> {
    Ok(PgRow {
        customer_id: to_int4(row.customer_id, "customer_id", row.customer_id)?,
        total_orders: to_int4(row.customer_id, "total_orders", row.total_orders)?,
        total_amount: row.total_amount,
        avg_order_value: row.avg_order_value,
        ltv: row.ltv,
    })
}

/// Credential-free label: database and user names only.
fn describe_config(config: &Config) -> String {
    format!(
        "postgres database '{}' as '{}'",
        config.get_dbname().unwrap_or("postgres"),
        config.get_user().unwrap_or("postgres")
    )
}

/// `PostgreSQL` destination.
pub struct PostgresDestination {
    client: Client,
    table: TableName,
    label: String,
}

impl PostgresDestination {
    /// Connect using a libpq-style connection string or URI:
    /// - `"host=localhost port=5432 dbname=etl user=etl"`
    /// - `"postgresql://etl@localhost/etl"`
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Connect`] if the string is invalid or the
    /// server can't be reached.
    pub fn connect(connstr: &str, table: TableName) -> error::Result<Self> {
        let config: Config = connstr
            .parse()
            .map_err(|e| LoadError::connect("postgres (invalid connection string)", e))?;
        let label = describe_config(&config);
        let client = config
            .connect(NoTls)
            .map_err(|e| LoadError::connect(label.clone(), e))?;
        Ok(Self {
            client,
            table,
            label,
        })
    }
}

impl Destination for PostgresDestination {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn write_batch(&mut self, rows: &[LtvRow], mode: LoadMode) -> error::Result<LoadReport> {
        // Convert before opening the transaction so range errors touch nothing.
        let converted = rows.iter().map(convert).collect::<error::Result<Vec<_>>>()?;
        let table = self.table.clone();

        let mut tx = self
            .client
            .transaction()
            .map_err(|e| LoadError::backend("failed to begin transaction", e))?;

        tx.batch_execute(&ddl::create_table_sql(&table))
            .map_err(|e| LoadError::backend(format!("failed to create table {table}"), e))?;

        let rows_deleted = match mode {
            LoadMode::Append => 0,
            LoadMode::Replace => tx
                .execute(&ddl::delete_all_sql(&table), &[])
                .map_err(|e| LoadError::backend(format!("failed to clear table {table}"), e))?,
        };

        for (chunk_idx, chunk) in converted.chunks(INSERT_CHUNK_SIZE).enumerate() {
            let sql = ddl::postgres_insert_sql(&table, chunk.len());
            let mut params: Vec<&(dyn ToSql + Sync)> =
                Vec::with_capacity(chunk.len() * ddl::COLUMNS.len());
            for row in chunk {
                params.push(&row.customer_id);
                params.push(&row.total_orders);
                params.push(&row.total_amount);
                params.push(&row.avg_order_value);
                params.push(&row.ltv);
            }
            let start = chunk_idx * INSERT_CHUNK_SIZE;
            tx.execute(&sql, &params).map_err(|e| {
                LoadError::backend(
                    format!(
                        "multi-row insert into {table} failed for rows {}-{}",
                        start,
                        start + chunk.len()
                    ),
                    e,
                )
            })?;
        }

        tx.commit()
            .map_err(|e| LoadError::backend("failed to commit transaction", e))?;
        debug!(table = %table, rows = rows.len(), rows_deleted, "postgres batch committed");

        Ok(LoadReport {
            destination: self.describe(),
            table: table.to_string(),
            mode,
            rows_deleted,
            rows_written: rows.len() as u64,
        })
    }

    fn row_count(&mut self) -> error::Result<u64> {
        let exists: bool = self
            .client
            .query_one("SELECT to_regclass($1) IS NOT NULL", &[&self.table.as_str()])
            .and_then(|row| row.try_get(0))
            .map_err(|e| LoadError::backend("failed to inspect postgres schema", e))?;
        if !exists {
            return Ok(0);
        }
        let count: i64 = self
            .client
            .query_one(&ddl::count_sql(&self.table), &[])
            .and_then(|row| row.try_get(0))
            .map_err(|e| LoadError::backend(format!("failed to count rows in {}", self.table), e))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
