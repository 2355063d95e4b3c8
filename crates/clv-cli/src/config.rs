//! Run configuration: TOML file, environment and command-line overrides.
//!
//! Precedence, highest first: command-line flags, `CLV_DATABASE_URL`
//! (through the `--postgres` flag's env fallback), the config file, defaults.
//!
//! ```toml
//! [sources]
//! dir = "data"
//!
//! [transform]
//! group_by = "customer-id"
//! collapse_instalments = false
//!
//! [destination]
//! kind = "sqlite"
//! path = "warehouse/clv.db"
//! table = "customer_ltv"
//! mode = "replace"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use clv_ingest::SourcePaths;
use clv_model::{GroupingKey, LoadMode, SourceKind, TableName, TransformOptions};

/// Environment variable holding the PostgreSQL connection string.
pub const DATABASE_URL_ENV: &str = "CLV_DATABASE_URL";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_SQLITE_PATH: &str = "clv.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Sqlite,
    Postgres,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesSection {
    pub dir: Option<PathBuf>,
    pub customers: Option<PathBuf>,
    pub orders: Option<PathBuf>,
    pub payments: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSection {
    pub group_by: Option<GroupingKey>,
    pub collapse_instalments: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DestinationSection {
    pub kind: Option<DestinationKind>,
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    pub table: Option<TableName>,
    pub mode: Option<LoadMode>,
}

/// Contents of a `clv.toml` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub sources: SourcesSection,
    pub transform: TransformSection,
    pub destination: DestinationSection,
}

fn anchor(base: &Path, path: Option<PathBuf>) -> Option<PathBuf> {
    path.map(|p| if p.is_relative() { base.join(p) } else { p })
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Read a config file. Relative `sources.dir` and `destination.path`
    /// values are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let mut config =
            Self::parse(&text).with_context(|| format!("parse config file {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.sources.dir = anchor(base, config.sources.dir.take());
        config.destination.path = anchor(base, config.destination.path.take());
        Ok(config)
    }
}

/// Values given on the command line (or, for `postgres_url`, the environment).
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub customers: Option<PathBuf>,
    pub orders: Option<PathBuf>,
    pub payments: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub postgres_url: Option<String>,
    pub table: Option<String>,
    pub mode: Option<LoadMode>,
    pub group_by: Option<GroupingKey>,
    pub collapse_instalments: Option<bool>,
}

/// Where rows are written.
#[derive(Clone, PartialEq, Eq)]
pub enum DestinationTarget {
    Sqlite(PathBuf),
    Postgres(String),
}

impl fmt::Debug for DestinationTarget {
    // Connection strings may carry passwords.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(path) => f.debug_tuple("Sqlite").field(path).finish(),
            Self::Postgres(_) => f.debug_tuple("Postgres").field(&"..").finish(),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub sources: SourcePaths,
    pub transform: TransformOptions,
    pub destination: DestinationTarget,
    pub table: TableName,
    pub mode: LoadMode,
}

fn source_path(
    kind: SourceKind,
    cli: Option<&PathBuf>,
    file: Option<&PathBuf>,
    dir: &Path,
) -> PathBuf {
    match (cli, file) {
        (Some(path), _) => path.clone(),
        (None, Some(name)) => dir.join(name),
        (None, None) => dir.join(kind.default_file_name()),
    }
}

fn resolve_destination(
    file: &DestinationSection,
    overrides: &Overrides,
) -> Result<DestinationTarget> {
    if let Some(path) = &overrides.database {
        return Ok(DestinationTarget::Sqlite(path.clone()));
    }
    if let Some(url) = &overrides.postgres_url {
        return Ok(DestinationTarget::Postgres(url.clone()));
    }
    match file.kind.unwrap_or(DestinationKind::Sqlite) {
        DestinationKind::Sqlite => Ok(DestinationTarget::Sqlite(
            file.path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
        )),
        DestinationKind::Postgres => file
            .url
            .clone()
            .map(DestinationTarget::Postgres)
            .ok_or_else(|| {
                anyhow!(
                    "destination kind is postgres but no connection string was given \
                     (use --postgres, {DATABASE_URL_ENV} or destination.url)"
                )
            }),
    }
}

impl Settings {
    pub fn resolve(file: ConfigFile, overrides: &Overrides) -> Result<Self> {
        let dir = overrides
            .data_dir
            .clone()
            .or(file.sources.dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let sources = SourcePaths {
            customers: source_path(
                SourceKind::Customers,
                overrides.customers.as_ref(),
                file.sources.customers.as_ref(),
                &dir,
            ),
            orders: source_path(
                SourceKind::Orders,
                overrides.orders.as_ref(),
                file.sources.orders.as_ref(),
                &dir,
            ),
            payments: source_path(
                SourceKind::Payments,
                overrides.payments.as_ref(),
                file.sources.payments.as_ref(),
                &dir,
            ),
        };

        let grouping = overrides
            .group_by
            .or(file.transform.group_by)
            .unwrap_or_default();
        let collapse_instalments = overrides
            .collapse_instalments
            .or(file.transform.collapse_instalments)
            .unwrap_or_default();

        let table = match &overrides.table {
            Some(name) => TableName::new(name.as_str())?,
            None => file.destination.table.clone().unwrap_or_default(),
        };

        Ok(Self {
            sources,
            transform: TransformOptions::new()
                .with_grouping(grouping)
                .with_collapsed_instalments(collapse_instalments),
            destination: resolve_destination(&file.destination, overrides)?,
            table,
            mode: overrides
                .mode
                .or(file.destination.mode)
                .unwrap_or_default(),
        })
    }
}

/// Parse `--as-of`: a date (midnight) or a date and time.
pub fn parse_as_of(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(datetime);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    bail!("invalid --as-of value '{value}' (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file_or_flags() {
        let settings = Settings::resolve(ConfigFile::default(), &Overrides::default()).unwrap();
        assert_eq!(settings.sources, SourcePaths::in_dir(Path::new("data")));
        assert_eq!(
            settings.destination,
            DestinationTarget::Sqlite(PathBuf::from("clv.db"))
        );
        assert_eq!(settings.table.as_str(), "customer_ltv");
        assert_eq!(settings.mode, LoadMode::Append);
        assert_eq!(settings.transform.grouping, GroupingKey::Demographic);
        assert!(!settings.transform.collapse_instalments);
    }

    #[test]
    fn debug_output_hides_connection_string() {
        let target = DestinationTarget::Postgres("postgres://etl:secret@db/etl".to_string());
        assert!(!format!("{target:?}").contains("secret"));
    }

    #[test]
    fn as_of_accepts_dates_and_datetimes() {
        let midnight = parse_as_of("2024-01-01").unwrap();
        assert_eq!(midnight.to_string(), "2024-01-01 00:00:00");
        let noon = parse_as_of("2024-01-01T12:30:00").unwrap();
        assert_eq!(noon.to_string(), "2024-01-01 12:30:00");
        assert!(parse_as_of("yesterday").is_err());
    }
}
