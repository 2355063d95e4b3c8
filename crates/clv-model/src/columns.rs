//! Column names and source schemas.
//!
//! The three raw sources (customers, orders, payments) share key column names
//! so they can be joined without renaming. Derived columns produced by the
//! transformer are listed here as well so every crate agrees on spelling.

use serde::{Deserialize, Serialize};

pub const CUSTOMER_ID: &str = "customer_id";
pub const ORDER_ID: &str = "order_id";
pub const FIRST_NAME: &str = "first_name";
pub const LAST_NAME: &str = "last_name";
pub const EMAIL: &str = "email";
pub const COUNTRY: &str = "country";
pub const GENDER: &str = "gender";
pub const DATE_OF_BIRTH: &str = "date_of_birth";
pub const PRICE: &str = "price";
pub const AMOUNT: &str = "amount";

pub const ORDER_COUNT: &str = "order_count";
pub const PAYMENT_COUNT: &str = "payment_count";
pub const TOTAL_AMOUNT_PAID: &str = "total_amount_paid";
pub const TOTAL_ORDER_VALUE: &str = "total_order_value";
pub const AVERAGE_ORDER_VALUE: &str = "average_order_value";
pub const ORDERS_PER_YEAR: &str = "orders_per_year";
pub const CUSTOMER_AGE_YEARS: &str = "customer_age_years";
pub const CLV: &str = "clv";

/// Demographic tuple, in grouping order.
pub const DEMOGRAPHIC_COLUMNS: [&str; 6] = [
    FIRST_NAME,
    LAST_NAME,
    EMAIL,
    COUNTRY,
    GENDER,
    DATE_OF_BIRTH,
];

/// Aggregate columns following the grouping key, in output order.
pub const METRIC_COLUMNS: [&str; 8] = [
    ORDER_COUNT,
    PAYMENT_COUNT,
    TOTAL_AMOUNT_PAID,
    TOTAL_ORDER_VALUE,
    AVERAGE_ORDER_VALUE,
    ORDERS_PER_YEAR,
    CUSTOMER_AGE_YEARS,
    CLV,
];

/// Storage type of a source column after extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Whole number (ids).
    Integer,
    /// Monetary value.
    Decimal,
    /// Free text, trimmed. Dates stay text until the transformer parses them.
    Text,
}

/// A required column in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn spec(name: &'static str, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec { name, kind }
}

const CUSTOMER_SCHEMA: [ColumnSpec; 7] = [
    spec(CUSTOMER_ID, ColumnKind::Integer),
    spec(FIRST_NAME, ColumnKind::Text),
    spec(LAST_NAME, ColumnKind::Text),
    spec(EMAIL, ColumnKind::Text),
    spec(COUNTRY, ColumnKind::Text),
    spec(GENDER, ColumnKind::Text),
    spec(DATE_OF_BIRTH, ColumnKind::Text),
];

const ORDER_SCHEMA: [ColumnSpec; 3] = [
    spec(ORDER_ID, ColumnKind::Integer),
    spec(CUSTOMER_ID, ColumnKind::Integer),
    spec(PRICE, ColumnKind::Decimal),
];

const PAYMENT_SCHEMA: [ColumnSpec; 3] = [
    spec(ORDER_ID, ColumnKind::Integer),
    spec(CUSTOMER_ID, ColumnKind::Integer),
    spec(AMOUNT, ColumnKind::Decimal),
];

/// One of the three raw inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Customers,
    Orders,
    Payments,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [Self::Customers, Self::Orders, Self::Payments];

    /// Human-readable name used in logs and errors.
    pub fn label(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Orders => "orders",
            Self::Payments => "payments",
        }
    }

    /// Default file name inside a data directory.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Customers => "customer_data.csv",
            Self::Orders => "order_data.csv",
            Self::Payments => "payment_data.csv",
        }
    }

    /// Required columns, in output order.
    pub fn schema(self) -> &'static [ColumnSpec] {
        match self {
            Self::Customers => &CUSTOMER_SCHEMA,
            Self::Orders => &ORDER_SCHEMA,
            Self::Payments => &PAYMENT_SCHEMA,
        }
    }

    /// Column whose values must be unique within the source, if any.
    pub fn unique_key(self) -> Option<&'static str> {
        match self {
            Self::Customers => Some(CUSTOMER_ID),
            Self::Orders => Some(ORDER_ID),
            Self::Payments => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
