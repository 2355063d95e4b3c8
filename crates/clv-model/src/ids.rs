use std::fmt;

use crate::ModelError;

/// Longest identifier PostgreSQL accepts without truncation.
const MAX_IDENTIFIER_LEN: usize = 63;

/// A validated SQL table name.
///
/// Only unquoted identifiers are accepted (ASCII letter or underscore first,
/// then ASCII alphanumerics or underscores), so the name can be interpolated
/// into DDL for both SQLite and PostgreSQL.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub const DEFAULT: &'static str = "customer_ltv";

    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        validate_identifier(trimmed).map_err(|reason| ModelError::InvalidTableName {
            name: value.clone(),
            reason,
        })?;
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TableName {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TableName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}

fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err("identifier must not be empty".to_string());
    };
    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(format!(
            "exceeds maximum length of {MAX_IDENTIFIER_LEN} bytes (got {})",
            name.len()
        ));
    }
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(format!(
            "must start with a letter or underscore, got '{first}'"
        ));
    }
    if let Some(ch) = chars.find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_') {
        return Err(format!("contains invalid character '{ch}'"));
    }
    Ok(())
}
