//! Loader error types.

use clv_model::ModelError;

/// Boxed driver error, so both backends share one variant.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while writing to a destination.
///
/// Every variant except [`LoadError::Io`] and [`LoadError::Model`] is raised
/// after the transaction has been dropped, so the table is unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The destination could not be opened or reached.
    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: BoxError,
    },

    /// A statement failed inside the load transaction.
    #[error("{context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: BoxError,
    },

    /// A value does not fit the destination's `INTEGER` column.
    #[error("{field} = {value} for customer_id {customer_id} does not fit a 32-bit INTEGER column")]
    OutOfRange {
        customer_id: i64,
        field: &'static str,
        value: i64,
    },

    /// Invalid destination settings such as a bad table name.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// File-system failure (e.g. creating the database directory).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub(crate) fn backend(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn connect(
        target: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connect {
            target: target.into(),
            source: Box::new(source),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, LoadError>;
