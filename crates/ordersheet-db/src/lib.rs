//! # ordersheet-db
//!
//! Thin access layer over one relational database endpoint.
//!
//! Every operation on [`DataAccess`] opens its own session, runs a single
//! statement (or one batch for upserts), commits or rolls back, and closes the
//! session before returning. The instance itself only carries configuration,
//! so it can be shared freely between callers.
//!
//! Table names, column lists, filter fragments and raw statements are spliced
//! into SQL text as given. Nothing here escapes them: callers are trusted.

pub mod access;
pub mod config;
pub mod connection;
pub mod payload;
pub mod sql;

pub use access::{DataAccess, FetchOptions, RawOutcome, WriteOutcome, WriteResult};
pub use config::{ConnectionConfig, Driver};
pub use payload::{DbValue, Row, TabularPayload};
pub use sql::Dialect;

use thiserror::Error;

/// Boxed driver error carried as the source of connection and statement failures.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when working with the database.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {details}")]
    Config { details: String },

    #[error("Connection error for {endpoint}: {source}")]
    Connection {
        endpoint: String,
        #[source]
        source: DriverError,
    },

    #[error("SQL error executing `{statement}`: {source}")]
    Statement {
        statement: String,
        #[source]
        source: DriverError,
    },

    #[error("Validation error: {details}")]
    Validation { details: String },
}

impl Error {
    pub(crate) fn statement(statement: &str, source: impl Into<DriverError>) -> Self {
        Self::Statement {
            statement: statement.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn validation(details: impl Into<String>) -> Self {
        Self::Validation {
            details: details.into(),
        }
    }

    /// True for failures reported by the database while running a statement.
    pub fn is_statement(&self) -> bool {
        matches!(self, Self::Statement { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
