//! Extraction of the three source relations.

use std::path::{Path, PathBuf};
use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::{debug, info, info_span};

use clv_model::SourceKind;

use crate::csv::read_raw_csv;
use crate::error::Result;
use crate::schema::conform_source;

/// Locations of the three source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub customers: PathBuf,
    pub orders: PathBuf,
    pub payments: PathBuf,
}

impl SourcePaths {
    /// Default file names (`customer_data.csv`, ...) inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            customers: dir.join(SourceKind::Customers.default_file_name()),
            orders: dir.join(SourceKind::Orders.default_file_name()),
            payments: dir.join(SourceKind::Payments.default_file_name()),
        }
    }

    pub fn path(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Customers => &self.customers,
            SourceKind::Orders => &self.orders,
            SourceKind::Payments => &self.payments,
        }
    }
}

/// The three extracted relations, conformed to their schemas.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub customers: DataFrame,
    pub orders: DataFrame,
    pub payments: DataFrame,
}

impl SourceTables {
    pub fn get(&self, kind: SourceKind) -> &DataFrame {
        match kind {
            SourceKind::Customers => &self.customers,
            SourceKind::Orders => &self.orders,
            SourceKind::Payments => &self.payments,
        }
    }

    /// Row counts in [`SourceKind::ALL`] order.
    pub fn row_counts(&self) -> [(SourceKind, usize); 3] {
        SourceKind::ALL.map(|kind| (kind, self.get(kind).height()))
    }
}

/// Read and conform a single source file.
pub fn read_source(path: &Path, kind: SourceKind) -> Result<DataFrame> {
    let raw = read_raw_csv(path)?;
    debug!(
        source = %kind,
        path = %path.display(),
        raw_columns = raw.width(),
        raw_rows = raw.height(),
        "read raw csv"
    );
    conform_source(&raw, kind, path)
}

fn extract_one(paths: &SourcePaths, kind: SourceKind) -> Result<DataFrame> {
    let path = paths.path(kind);
    let span = info_span!("extract_source", source = %kind, path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();
    let df = read_source(path, kind)?;
    info!(
        source = %kind,
        rows = df.height(),
        duration_ms = start.elapsed().as_millis(),
        "source extracted"
    );
    Ok(df)
}

/// Extract all three sources.
///
/// Fails on the first source that is missing or malformed; no partial
/// result is returned.
pub fn extract(paths: &SourcePaths) -> Result<SourceTables> {
    Ok(SourceTables {
        customers: extract_one(paths, SourceKind::Customers)?,
        orders: extract_one(paths, SourceKind::Orders)?,
        payments: extract_one(paths, SourceKind::Payments)?,
    })
}
