//! Birth date parsing and normalization.
//!
//! Source files carry `date_of_birth` as free text. The transform needs a
//! calendar date, so every value is parsed up front; a single unparseable
//! value fails the run.
//!
//! Accepted forms, tried in order:
//!
//! - `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`
//! - `MM/DD/YYYY` (month first)
//! - `DD-Mon-YYYY`, `Mon DD, YYYY`, `DD Month YYYY`
//! - ISO 8601 datetimes with `T` or space separator, and RFC 3339 with an
//!   offset; only the date part is kept

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::{DataFrame, DataType, IntoColumn, NamedFrom, Series};

use clv_model::columns::DATE_OF_BIRTH;

use crate::error::{Result, TransformError};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Polars stores `Date` as days since the Unix epoch.
pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub(crate) fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

fn parse_compact(value: &str) -> Option<NaiveDate> {
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = value[0..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a birth date in any of the accepted forms.
///
/// Returns `None` for empty or unparseable values.
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
    {
        return Some(date);
    }

    if let Some(date) = parse_compact(trimmed) {
        return Some(date);
    }

    if let Some(datetime) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
    {
        return Some(datetime.date());
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|datetime| datetime.date_naive())
}

/// Return a copy of `customers` whose `date_of_birth` column has type `Date`.
///
/// Text columns are parsed with [`parse_birth_date`]; `Date` columns pass
/// through and `Datetime` columns are truncated to their date.
pub fn normalize_birth_dates(customers: &DataFrame) -> Result<DataFrame> {
    let column = customers
        .column(DATE_OF_BIRTH)
        .map_err(|_| TransformError::MissingColumn {
            source_name: "customers".to_string(),
            column: DATE_OF_BIRTH.to_string(),
        })?;

    let normalized = match column.dtype() {
        DataType::Date => return Ok(customers.clone()),
        DataType::Datetime(_, _) => column.cast(&DataType::Date)?,
        DataType::String => {
            let values = column.str()?;
            let mut days = Vec::with_capacity(values.len());
            for (idx, value) in values.into_iter().enumerate() {
                let date = value.and_then(parse_birth_date).ok_or_else(|| {
                    TransformError::InvalidDate {
                        row: idx + 1,
                        value: value.unwrap_or_default().to_string(),
                    }
                })?;
                days.push(days_since_epoch(date));
            }
            Series::new(DATE_OF_BIRTH.into(), days)
                .cast(&DataType::Date)?
                .into_column()
        }
        other => {
            return Err(TransformError::UnsupportedType {
                column: DATE_OF_BIRTH.to_string(),
                dtype: other.to_string(),
            });
        }
    };

    let mut out = customers.clone();
    out.with_column(normalized)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn epoch_day_conversion_round_trips_known_dates() {
        assert_eq!(days_since_epoch(ymd(1970, 1, 1)), 0);
        assert_eq!(days_since_epoch(ymd(2000, 1, 1)), 10_957);
        assert_eq!(date_from_epoch_days(10_957), Some(ymd(2000, 1, 1)));
        assert_eq!(date_from_epoch_days(-1), Some(ymd(1969, 12, 31)));
    }

    #[test]
    fn compact_dates_need_eight_digits() {
        assert_eq!(parse_compact("20000101"), Some(ymd(2000, 1, 1)));
        assert_eq!(parse_compact("2000011"), None);
        assert_eq!(parse_compact("20001301"), None);
    }
}
