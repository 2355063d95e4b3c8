use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::Serialize;

use clv_load::LoadReport;
use clv_model::{CustomerAggregate, GroupingKey, LtvRow, SourceKind};

/// Rows read from one source file.
#[derive(Debug, Clone, Serialize)]
pub struct SourceCount {
    pub source: SourceKind,
    pub path: PathBuf,
    pub rows: usize,
}

/// Everything a run produced; also the `--report-json` document.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub as_of: NaiveDateTime,
    pub grouping: GroupingKey,
    pub sources: Vec<SourceCount>,
    pub aggregates: Vec<CustomerAggregate>,
    pub rows: Vec<LtvRow>,
    /// `None` for dry runs.
    pub load: Option<LoadReport>,
    pub duration_ms: u128,
}

impl RunResult {
    pub fn dry_run(&self) -> bool {
        self.load.is_none()
    }
}
