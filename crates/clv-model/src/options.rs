//! Configuration options for the transform and load stages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;
use crate::columns::{CUSTOMER_ID, DEMOGRAPHIC_COLUMNS};

/// Key used to group joined rows into one aggregate per customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupingKey {
    /// Group by (first_name, last_name, email, country, gender, date_of_birth).
    ///
    /// Distinct customers sharing the whole tuple collapse into one row and
    /// the aggregate carries no identifier.
    #[default]
    Demographic,
    /// Group by customer_id; demographics ride along as passenger fields.
    CustomerId,
}

impl GroupingKey {
    /// Columns forming the group key.
    pub fn key_columns(self) -> &'static [&'static str] {
        match self {
            Self::Demographic => &DEMOGRAPHIC_COLUMNS,
            Self::CustomerId => &[CUSTOMER_ID],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Demographic => "demographic",
            Self::CustomerId => "customer-id",
        }
    }
}

impl fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingKey {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "demographic" | "demographics" => Ok(Self::Demographic),
            "customer-id" | "customer" | "identity" => Ok(Self::CustomerId),
            _ => Err(ModelError::UnknownGroupingKey(value.to_string())),
        }
    }
}

/// How a run's rows are written to the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadMode {
    /// Insert rows next to whatever earlier runs left behind.
    #[default]
    Append,
    /// Delete existing rows first, in the same transaction as the insert.
    Replace,
}

impl LoadMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadMode {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "replace" => Ok(Self::Replace),
            _ => Err(ModelError::UnknownLoadMode(value.to_string())),
        }
    }
}

/// Options controlling the transform stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    pub grouping: GroupingKey,
    /// Sum payments per order before joining, so an order paid in
    /// instalments adds its `price` once instead of once per payment.
    pub collapse_instalments: bool,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grouping(mut self, grouping: GroupingKey) -> Self {
        self.grouping = grouping;
        self
    }

    pub fn with_collapsed_instalments(mut self, collapse: bool) -> Self {
        self.collapse_instalments = collapse;
        self
    }
}
