pub mod columns;
pub mod error;
pub mod ids;
pub mod options;
pub mod records;
pub mod redact;

pub use columns::{ColumnKind, ColumnSpec, SourceKind};
pub use error::{ModelError, Result};
pub use ids::TableName;
pub use options::{GroupingKey, LoadMode, TransformOptions};
pub use records::{CustomerAggregate, Demographics, LtvRow};
pub use redact::redact_value;
