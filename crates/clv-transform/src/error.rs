//! Error types for the transform stage.

use thiserror::Error;

/// Errors that abort a transform before anything is written.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A date_of_birth value could not be parsed as a calendar date.
    #[error("invalid date_of_birth '{value}' on customer row {row}")]
    InvalidDate { row: usize, value: String },

    /// A group's payments sum to zero, so average_order_value is undefined.
    #[error("total amount paid is zero for {customer}; average order value is undefined")]
    ZeroAmountPaid { customer: String },

    /// A customer was born on the processing date, so orders_per_year is undefined.
    #[error("customer age is zero days for {customer}; orders per year is undefined")]
    ZeroCustomerAge { customer: String },

    /// An input relation lacks a required column.
    #[error("{source_name} relation is missing required column '{column}'")]
    MissingColumn { source_name: String, column: String },

    /// A column has a type the transform cannot work with.
    #[error("column '{column}' has unsupported type {dtype}")]
    UnsupportedType { column: String, dtype: String },

    /// Underlying Polars failure.
    #[error("DataFrame operation failed: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
