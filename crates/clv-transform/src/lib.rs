//! Customer lifetime value transformation.
//!
//! This crate holds the core of the pipeline:
//!
//! - **transform**: join customers, orders and payments, aggregate per
//!   customer and derive CLV metrics
//! - **datetime**: birth date parsing and normalization
//! - **records**: typed view of the aggregate relation
//! - **adapter**: mapping from aggregates to destination rows

pub mod adapter;
pub mod datetime;
pub mod error;
pub mod records;
pub mod transform;

pub use adapter::{duplicate_customer_ids, round_currency, surrogate_customer_id, to_ltv_rows};
pub use datetime::{normalize_birth_dates, parse_birth_date};
pub use error::{Result, TransformError};
pub use records::aggregate_records;
pub use transform::{DAYS_PER_YEAR, transform};
