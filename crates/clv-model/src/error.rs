use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid table name '{name}': {reason}")]
    InvalidTableName { name: String, reason: String },
    #[error("unknown grouping key '{0}' (expected demographic or customer-id)")]
    UnknownGroupingKey(String),
    #[error("unknown load mode '{0}' (expected append or replace)")]
    UnknownLoadMode(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
