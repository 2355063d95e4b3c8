use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::Table;
use tracing::info;

use clv_cli::config::{ConfigFile, Settings, parse_as_of};
use clv_cli::pipeline;
use clv_cli::types::RunResult;
use clv_load::ddl;
use clv_model::TableName;

use crate::cli::{RunArgs, SchemaArgs};
use crate::summary::apply_table_style;

pub fn run_pipeline(args: &RunArgs) -> Result<RunResult> {
    let file = match &args.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let settings = Settings::resolve(file, &args.overrides())?;
    // The clock is read once per run.
    let now = match &args.as_of {
        Some(value) => parse_as_of(value)?,
        None => Utc::now().naive_utc(),
    };

    let result = pipeline::run(&settings, now, args.dry_run)?;

    if let Some(path) = &args.report_json {
        let json = serde_json::to_string_pretty(&result).context("serialize run report")?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        info!(path = %path.display(), "run report written");
    }
    Ok(result)
}

pub fn run_schema(args: &SchemaArgs) -> Result<()> {
    let table_name = TableName::new(args.table.as_str())?;
    let mut table = Table::new();
    table.set_header(vec!["Column", "Type"]);
    apply_table_style(&mut table);
    for (column, sql_type) in ddl::COLUMNS.iter().zip([
        "INTEGER PRIMARY KEY",
        "INTEGER",
        "NUMERIC(10,2)",
        "NUMERIC(10,2)",
        "NUMERIC(10,2)",
    ]) {
        table.add_row(vec![*column, sql_type]);
    }
    println!("{table}");
    println!("{};", ddl::create_table_sql(&table_name));
    Ok(())
}
