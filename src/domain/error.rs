//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Configuration errors that stop a run before any row is processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("no level columns configured")]
    NoLevelColumns,

    #[error("weight column is not set")]
    MissingWeightColumn,

    #[error("level column is blank at position {0}")]
    BlankLevelColumn(usize),

    #[error("duplicate level column: {0}")]
    DuplicateLevelColumn(String),

    #[error("weight column {0} is also configured as a level column")]
    WeightIsLevel(String),

    #[error("path delimiter must not be empty")]
    EmptyDelimiter,
}

/// Domain errors represent engine invariant violations.
/// Per-row problems are not errors, see [`crate::domain::Rejection`].
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("record has {actual} levels, tree expects {expected}")]
    LevelCountMismatch { expected: usize, actual: usize },

    #[error("internal tree operation failed: {0}")]
    Internal(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
