//! CLI argument definitions for the CLV pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

use clv_cli::config::{DATABASE_URL_ENV, Overrides};
use clv_model::{GroupingKey, LoadMode};

#[derive(Parser)]
#[command(
    name = "clv",
    version,
    about = "Customer lifetime value pipeline - extract, transform, load",
    long_about = "Compute per-customer lifetime value from customer, order and payment CSV files\n\
                  and write the result to SQLite or PostgreSQL in a single transaction."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow customer names and emails in trace logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run extract, transform and load once.
    Run(RunArgs),

    /// Print the destination table DDL.
    Schema(SchemaArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// TOML configuration file.
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding customer_data.csv, order_data.csv and payment_data.csv.
    #[arg(long = "data-dir", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(long = "customers", value_name = "CSV")]
    pub customers: Option<PathBuf>,

    #[arg(long = "orders", value_name = "CSV")]
    pub orders: Option<PathBuf>,

    #[arg(long = "payments", value_name = "CSV")]
    pub payments: Option<PathBuf>,

    /// SQLite database file (takes precedence over --postgres).
    #[arg(long = "database", value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// PostgreSQL connection string.
    #[arg(long = "postgres", value_name = "URL", env = DATABASE_URL_ENV, hide_env_values = true)]
    pub postgres: Option<String>,

    /// Destination table name.
    #[arg(long = "table", value_name = "NAME")]
    pub table: Option<String>,

    /// Append to the table or replace its contents.
    #[arg(long = "mode", value_enum)]
    pub mode: Option<ModeArg>,

    /// Aggregate per demographic tuple or per customer_id.
    #[arg(long = "group-by", value_enum)]
    pub group_by: Option<GroupByArg>,

    /// Count an order's price once even when it was paid in instalments.
    #[arg(long = "collapse-instalments")]
    pub collapse_instalments: bool,

    /// Processing date used for customer age (default: now, UTC).
    #[arg(long = "as-of", value_name = "DATE")]
    pub as_of: Option<String>,

    /// Extract and transform without writing to the destination.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Write a JSON run report to this path.
    #[arg(long = "report-json", value_name = "PATH")]
    pub report_json: Option<PathBuf>,
}

impl RunArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            data_dir: self.data_dir.clone(),
            customers: self.customers.clone(),
            orders: self.orders.clone(),
            payments: self.payments.clone(),
            database: self.database.clone(),
            postgres_url: self.postgres.clone(),
            table: self.table.clone(),
            mode: self.mode.map(LoadMode::from),
            group_by: self.group_by.map(GroupingKey::from),
            collapse_instalments: self.collapse_instalments.then_some(true),
        }
    }
}

#[derive(Args)]
pub struct SchemaArgs {
    /// Destination table name.
    #[arg(long = "table", value_name = "NAME", default_value = "customer_ltv")]
    pub table: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Append,
    Replace,
}

impl From<ModeArg> for LoadMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Append => LoadMode::Append,
            ModeArg::Replace => LoadMode::Replace,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum GroupByArg {
    Demographic,
    CustomerId,
}

impl From<GroupByArg> for GroupingKey {
    fn from(value: GroupByArg) -> Self {
        match value {
            GroupByArg::Demographic => GroupingKey::Demographic,
            GroupByArg::CustomerId => GroupingKey::CustomerId,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
