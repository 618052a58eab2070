//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{DomainError, SchemaError};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("cannot read records from {origin}: {message}")]
    Source { origin: String, message: String },
}

impl From<SchemaError> for ApplicationError {
    fn from(e: SchemaError) -> Self {
        ApplicationError::Domain(DomainError::Schema(e))
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
