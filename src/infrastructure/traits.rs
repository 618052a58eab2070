//! I/O boundary traits for testability
//!
//! Services read rows through [`RecordSource`], so tests can feed rows from
//! memory instead of files.

use crate::application::ApplicationResult;
use crate::domain::RawRecord;

/// Where raw rows come from.
pub trait RecordSource: Send + Sync {
    /// Human readable origin, used in logs and error messages.
    fn describe(&self) -> String;

    /// Read all rows in input order.
    fn fetch(&self) -> ApplicationResult<Vec<RawRecord>>;
}

// ============================================================
// IN-MEMORY IMPLEMENTATION
// ============================================================

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    rows: Vec<RawRecord>,
}

impl InMemorySource {
    pub fn new(rows: Vec<RawRecord>) -> Self {
        Self { rows }
    }
}

impl RecordSource for InMemorySource {
    fn describe(&self) -> String {
        format!("memory ({} rows)", self.rows.len())
    }

    fn fetch(&self) -> ApplicationResult<Vec<RawRecord>> {
        Ok(self.rows.clone())
    }
}
