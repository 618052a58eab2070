//! Error conversion helpers for reading and parsing record sources
//!
//! Attaches the source origin to I/O and parser errors.

use std::fmt::Display;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for turning reader errors into `ApplicationError::Source`.
pub trait SourceResultExt<T> {
    /// Tag the error with the file it came from.
    ///
    /// # Example
    /// ```ignore
    /// let file = File::open(&path).with_source_context(&path)?;
    /// ```
    fn with_source_context(self, path: &Path) -> ApplicationResult<T>;
}

impl<T, E: Display> SourceResultExt<T> for Result<T, E> {
    fn with_source_context(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Source {
            origin: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
