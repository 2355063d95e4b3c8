//! `SQLite`-backed implementation of [`Destination`].

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use clv_model::{LoadMode, LtvRow, TableName};

use crate::ddl;
use crate::destination::{Destination, LoadReport};
use crate::error::{self, LoadError};

/// `SQLite` destination.
///
/// Create with [`SqliteDestination::open`] for a database file or
/// [`SqliteDestination::in_memory`] for tests.
pub struct SqliteDestination {
    conn: Connection,
    table: TableName,
    location: Option<PathBuf>,
}

impl SqliteDestination {
    /// Open or create the database at `path`, creating parent directories.
    ///
    /// The table itself is created by the first [`Destination::write_batch`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the directory can't be created, or
    /// [`LoadError::Connect`] if the database can't be opened.
    pub fn open(path: &Path, table: TableName) -> error::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| LoadError::connect(format!("sqlite database {}", path.display()), e))?;
        Ok(Self {
            conn,
            table,
            location: Some(path.to_path_buf()),
        })
    }

    /// Create an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Connect`] if the database can't be initialized.
    pub fn in_memory(table: TableName) -> error::Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LoadError::connect("in-memory sqlite database", e))?;
        Ok(Self {
            conn,
            table,
            location: None,
        })
    }

    fn table_exists(&self) -> error::Result<bool> {
        self.conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [self.table.as_str()],
                |_| Ok(()),
            )
            .optional()
            .map(|found| found.is_some())
            .map_err(|e| LoadError::backend("failed to inspect sqlite schema", e))
    }

    /// All rows of the table ordered by `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Backend`] if the query fails.
    pub fn rows(&self) -> error::Result<Vec<LtvRow>> {
        if !self.table_exists()? {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM {} ORDER BY customer_id",
            ddl::COLUMNS.join(", "),
            self.table
        );
        let read_err = |e| LoadError::backend(format!("failed to read {}", self.table), e);
        let mut stmt = self.conn.prepare(&sql).map_err(read_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LtvRow {
                    customer_id: row.get(0)?,
                    total_orders: row.get(1)?,
                    total_amount: row.get(2)?,
                    avg_order_value: row.get(3)?,
                    ltv: row.get(4)?,
                })
            })
            .map_err(read_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(read_err)
    }
}

impl Destination for SqliteDestination {
    fn describe(&self) -> String {
        match &self.location {
            Some(path) => format!("sqlite:{}", path.display()),
            None => "sqlite::memory:".to_string(),
        }
    }

    fn write_batch(&mut self, rows: &[LtvRow], mode: LoadMode) -> error::Result<LoadReport> {
        let table = self.table.clone();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| LoadError::backend("failed to begin transaction", e))?;

        tx.execute_batch(&ddl::create_table_sql(&table))
            .map_err(|e| LoadError::backend(format!("failed to create table {table}"), e))?;

        let rows_deleted = match mode {
            LoadMode::Append => 0,
            LoadMode::Replace => tx
                .execute(&ddl::delete_all_sql(&table), [])
                .map_err(|e| LoadError::backend(format!("failed to clear table {table}"), e))?
                as u64,
        };

        {
            let mut stmt = tx
                .prepare(&ddl::sqlite_insert_sql(&table))
                .map_err(|e| LoadError::backend("failed to prepare insert", e))?;
            for row in rows {
                stmt.execute(params![
                    row.customer_id,
                    row.total_orders,
                    row.total_amount,
                    row.avg_order_value,
                    row.ltv
                ])
                .map_err(|e| {
                    LoadError::backend(
                        format!("failed to insert customer_id {} into {table}", row.customer_id),
                        e,
                    )
                })?;
            }
        }

        tx.commit()
            .map_err(|e| LoadError::backend("failed to commit transaction", e))?;
        debug!(table = %table, rows = rows.len(), rows_deleted, "sqlite batch committed");

        Ok(LoadReport {
            destination: self.describe(),
            table: table.to_string(),
            mode,
            rows_deleted,
            rows_written: rows.len() as u64,
        })
    }

    fn row_count(&mut self) -> error::Result<u64> {
        if !self.table_exists()? {
            return Ok(0);
        }
        let count: i64 = self
            .conn
            .query_row(&ddl::count_sql(&self.table), [], |row| row.get(0))
            .map_err(|e| LoadError::backend(format!("failed to count rows in {}", self.table), e))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(customer_id: i64) -> LtvRow {
        LtvRow {
            customer_id,
            total_orders: 1,
            total_amount: 80.0,
            avg_order_value: 1.25,
            ltv: 100.0,
        }
    }

    #[test]
    fn missing_table_counts_as_empty() {
        let mut dest = SqliteDestination::in_memory(TableName::default()).unwrap();
        assert_eq!(dest.row_count().unwrap(), 0);
        assert!(dest.rows().unwrap().is_empty());
    }

    #[test]
    fn empty_batch_still_creates_table() {
        let mut dest = SqliteDestination::in_memory(TableName::default()).unwrap();
        let report = dest.write_batch(&[], LoadMode::Append).unwrap();
        assert_eq!(report.rows_written, 0);
        assert!(dest.table_exists().unwrap());
    }

    #[test]
    fn replace_reports_deleted_rows() {
        let mut dest = SqliteDestination::in_memory(TableName::default()).unwrap();
        dest.write_batch(&[row(1), row(2)], LoadMode::Append).unwrap();

        let report = dest.write_batch(&[row(3)], LoadMode::Replace).unwrap();

        assert_eq!(report.rows_deleted, 2);
        assert_eq!(report.rows_written, 1);
        assert_eq!(dest.rows().unwrap(), vec![row(3)]);
    }

    #[test]
    fn describe_names_the_file() {
        let dest = SqliteDestination::in_memory(TableName::default()).unwrap();
        assert_eq!(dest.describe(), "sqlite::memory:");
    }
}
