//! Persistence of customer lifetime value rows.
//!
//! Provides the [`Destination`] trait with [`SqliteDestination`] and
//! [`PostgresDestination`] implementations. Every write is a single
//! transaction: create the table if needed, optionally clear it, insert all
//! rows, commit.

pub mod ddl;
pub mod destination;
pub mod error;
mod load;
pub mod postgres;
pub mod sqlite;

pub use destination::{Destination, LoadReport};
pub use error::{LoadError, Result};
pub use load::load;
pub use postgres::PostgresDestination;
pub use sqlite::SqliteDestination;
