//! Source extraction for the customer lifetime value pipeline.
//!
//! This crate loads the three raw inputs (customers, orders, payments) from
//! CSV files into Polars DataFrames and conforms them to the fixed source
//! schemas: required columns are located case-insensitively, ids and
//! monetary values are parsed, and text is trimmed.
//!
//! Extraction is all-or-nothing. [`extract`] either returns all three
//! relations or the first error it hit.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use clv_ingest::{SourcePaths, extract};
//!
//! let paths = SourcePaths::in_dir(Path::new("data"));
//! let tables = extract(&paths)?;
//! println!("{} customers", tables.customers.height());
//! ```

mod csv;
mod error;
mod extract;
mod polars_utils;
mod schema;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{MAX_CSV_FILE_SIZE, check_file_size, read_raw_csv, validate_encoding};

// === Schema Conformance ===
pub use schema::conform_source;

// === Extraction ===
pub use extract::{SourcePaths, SourceTables, extract, read_source};

// === Value Helpers ===
pub use polars_utils::{parse_f64, parse_i64};
