//! Destination trait definition.

use serde::Serialize;

use clv_model::{LoadMode, LtvRow};

use crate::error;

/// Outcome of one committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub destination: String,
    pub table: String,
    pub mode: LoadMode,
    /// Rows removed before inserting (`Replace` mode only).
    pub rows_deleted: u64,
    pub rows_written: u64,
}

/// Storage contract for the destination table.
///
/// Implementations must be `Send` so a destination can move to a worker
/// thread.
pub trait Destination: Send {
    /// Short, credential-free description for logs.
    fn describe(&self) -> String;

    /// Write `rows` in a single transaction.
    ///
    /// Creates the table if absent, clears it first in [`LoadMode::Replace`],
    /// then inserts every row. Either all of it commits or none of it does.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`](crate::error::LoadError) on any failure; the
    /// transaction is rolled back.
    fn write_batch(&mut self, rows: &[LtvRow], mode: LoadMode) -> error::Result<LoadReport>;

    /// Number of rows currently in the table, `0` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`](crate::error::LoadError) on storage failure.
    fn row_count(&mut self) -> error::Result<u64>;
}
