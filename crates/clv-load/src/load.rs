use std::time::Instant;

use tracing::{error, info, info_span};

use clv_model::{LoadMode, LtvRow};

use crate::destination::{Destination, LoadReport};
use crate::error::Result;

/// Innermost cause of an error chain, for log lines.
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

/// Persist `rows` to `destination` as one all-or-nothing batch.
///
/// Failures are logged with their underlying cause and returned unchanged
/// so the caller can decide whether to retry.
pub fn load(
    destination: &mut dyn Destination,
    rows: &[LtvRow],
    mode: LoadMode,
) -> Result<LoadReport> {
    let target = destination.describe();
    let span = info_span!("load", destination = %target, mode = %mode);
    let _guard = span.enter();
    let start = Instant::now();

    match destination.write_batch(rows, mode) {
        Ok(report) => {
            info!(
                table = %report.table,
                rows_written = report.rows_written,
                rows_deleted = report.rows_deleted,
                duration_ms = start.elapsed().as_millis(),
                "load committed"
            );
            Ok(report)
        }
        Err(err) => {
            error!(
                error = %err,
                cause = %root_cause(&err),
                rows = rows.len(),
                "load failed; transaction rolled back"
            );
            Err(err)
        }
    }
}
