//! Pipeline stages wired together: extract, transform, adapt, load.
//!
//! Each stage runs inside its own span and is wrapped with `anyhow`
//! context naming the stage, so a failure reads as
//! `load stage failed: failed to insert customer_id 3 ...`.

use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use tracing::{info, info_span, trace, warn};

use clv_ingest::{SourceTables, extract};
use clv_load::{Destination, LoadReport, PostgresDestination, SqliteDestination, load};
use clv_model::{CustomerAggregate, LtvRow, SourceKind, TableName, redact_value};
use clv_transform::{aggregate_records, duplicate_customer_ids, to_ltv_rows, transform};

use crate::config::{DestinationTarget, Settings};
use crate::types::{RunResult, SourceCount};

/// Open the configured destination.
pub fn open_destination(
    target: &DestinationTarget,
    table: &TableName,
) -> Result<Box<dyn Destination>> {
    Ok(match target {
        DestinationTarget::Sqlite(path) => Box::new(
            SqliteDestination::open(path, table.clone())
                .with_context(|| format!("open sqlite database {}", path.display()))?,
        ),
        DestinationTarget::Postgres(url) => Box::new(
            PostgresDestination::connect(url, table.clone()).context("connect to postgres")?,
        ),
    })
}

fn extract_stage(settings: &Settings) -> Result<SourceTables> {
    let span = info_span!("extract");
    let _guard = span.enter();
    extract(&settings.sources).context("extract stage failed")
}

fn transform_stage(
    tables: &SourceTables,
    now: NaiveDateTime,
    settings: &Settings,
) -> Result<Vec<CustomerAggregate>> {
    let frame = transform(
        &tables.customers,
        &tables.orders,
        &tables.payments,
        now,
        &settings.transform,
    )
    .context("transform stage failed")?;
    let aggregates = aggregate_records(&frame).context("transform stage failed")?;
    for aggregate in &aggregates {
        trace!(
            email = redact_value(&aggregate.demographics.email),
            orders = aggregate.order_count,
            total_amount_paid = aggregate.total_amount_paid,
            clv = aggregate.clv,
            "customer aggregate"
        );
    }
    Ok(aggregates)
}

fn adapt_stage(aggregates: &[CustomerAggregate]) -> Result<Vec<LtvRow>> {
    let rows = to_ltv_rows(aggregates);
    let duplicates = duplicate_customer_ids(&rows);
    if !duplicates.is_empty() {
        bail!(
            "{} destination customer_id value(s) occur more than once: {:?}",
            duplicates.len(),
            duplicates
        );
    }
    Ok(rows)
}

fn load_stage(settings: &Settings, rows: &[LtvRow]) -> Result<LoadReport> {
    let mut destination = open_destination(&settings.destination, &settings.table)
        .context("load stage failed")?;
    load(destination.as_mut(), rows, settings.mode).context("load stage failed")
}

/// Run the whole pipeline once with the processing instant `now`.
///
/// With `dry_run` the destination is never opened.
pub fn run(settings: &Settings, now: NaiveDateTime, dry_run: bool) -> Result<RunResult> {
    let span = info_span!("run", as_of = %now, grouping = %settings.transform.grouping);
    let _guard = span.enter();
    let start = Instant::now();

    let tables = extract_stage(settings)?;
    let sources = SourceKind::ALL
        .iter()
        .map(|&kind| SourceCount {
            source: kind,
            path: settings.sources.path(kind).to_path_buf(),
            rows: tables.get(kind).height(),
        })
        .collect();

    let aggregates = transform_stage(&tables, now, settings)?;
    if aggregates.is_empty() {
        warn!("no customer has a paid order; nothing to load");
    }
    let rows = adapt_stage(&aggregates)?;

    let load = if dry_run {
        info!(rows = rows.len(), "dry run; destination not opened");
        None
    } else {
        Some(load_stage(settings, &rows)?)
    };

    let duration_ms = start.elapsed().as_millis();
    info!(
        customers = aggregates.len(),
        rows = rows.len(),
        duration_ms,
        "pipeline complete"
    );

    Ok(RunResult {
        as_of: now,
        grouping: settings.transform.grouping,
        sources,
        aggregates,
        rows,
        load,
        duration_ms,
    })
}
