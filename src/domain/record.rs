//! Row data as it enters and leaves the normalizer.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single raw spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// True for `Empty` and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

/// Integral values print without a fractional part (`2330`, not `2330.0`).
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One input row: column name to raw cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    cells: HashMap<String, CellValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for in-memory sources.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<CellValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// A validated row: one non-empty label per configured level plus a weight >= 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    pub levels: Vec<String>,
    pub weight: f64,
}

impl CleanRecord {
    pub fn new<S: Into<String>>(levels: impl IntoIterator<Item = S>, weight: f64) -> Self {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
            weight,
        }
    }
}

/// Why the normalizer refused a row. Rejections are tallied, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("empty label in column {column}")]
    EmptyLabel { column: String },

    #[error("invalid weight {raw:?} in column {column}")]
    InvalidWeight { column: String, raw: String },

    #[error("missing weight in column {column}")]
    MissingWeight { column: String },

    #[error("column {column} not present in row")]
    SchemaMismatch { column: String },
}

/// Rejection category, used as tally key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RejectionKind {
    EmptyLabel,
    InvalidWeight,
    MissingWeight,
    SchemaMismatch,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RejectionKind::EmptyLabel => "EmptyLabel",
            RejectionKind::InvalidWeight => "InvalidWeight",
            RejectionKind::MissingWeight => "MissingWeight",
            RejectionKind::SchemaMismatch => "SchemaMismatch",
        };
        write!(f, "{}", name)
    }
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::EmptyLabel { .. } => RejectionKind::EmptyLabel,
            Rejection::InvalidWeight { .. } => RejectionKind::InvalidWeight,
            Rejection::MissingWeight { .. } => RejectionKind::MissingWeight,
            Rejection::SchemaMismatch { .. } => RejectionKind::SchemaMismatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_integral_number_when_displayed_then_has_no_fraction() {
        assert_eq!(CellValue::Number(2330.0).to_string(), "2330");
        assert_eq!(CellValue::Number(12.5).to_string(), "12.5");
    }

    #[test]
    fn given_whitespace_text_when_checking_blank_then_true() {
        assert!(CellValue::from("  \t").is_blank());
        assert!(CellValue::Empty.is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn given_pairs_when_collecting_then_builds_record() {
        let record: RawRecord = vec![("region", CellValue::from("US")), ("value", 10.0.into())]
            .into_iter()
            .collect();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("region"), Some(&CellValue::from("US")));
    }
}
