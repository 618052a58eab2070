//! File-backed record sources: CSV and JSON exports of the holdings sheet.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, SourceResultExt};
use crate::domain::{CellValue, RawRecord};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::RecordSource;

/// CSV file with a header row. Empty cells become [`CellValue::Empty`];
/// short rows simply lack the trailing columns.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvFileSource {
    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn fetch(&self) -> ApplicationResult<Vec<RawRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_path(&self.path)
            .with_source_context(&self.path)?;

        let headers: Vec<String> = reader
            .headers()
            .with_source_context(&self.path)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(|e| ApplicationError::Source {
                origin: self.path.display().to_string(),
                message: format!("row {}: {}", idx + 1, e),
            })?;
            let row: RawRecord = headers
                .iter()
                .zip(record.iter())
                .map(|(column, cell)| (column.clone(), csv_cell(cell)))
                .collect();
            rows.push(row);
        }
        debug!("fetch: {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

fn csv_cell(raw: &str) -> CellValue {
    if raw.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(raw.to_string())
    }
}

/// JSON file holding an array of flat objects.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonFileSource {
    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }

    fn fetch(&self) -> ApplicationResult<Vec<RawRecord>> {
        let file = File::open(&self.path).with_source_context(&self.path)?;
        let value: Value =
            serde_json::from_reader(BufReader::new(file)).with_source_context(&self.path)?;

        let Value::Array(items) = value else {
            return Err(ApplicationError::Source {
                origin: self.path.display().to_string(),
                message: "expected a JSON array of objects".to_string(),
            });
        };

        let mut rows = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            let Value::Object(fields) = item else {
                return Err(ApplicationError::Source {
                    origin: self.path.display().to_string(),
                    message: format!("row {} is not an object", idx + 1),
                });
            };
            let row: RawRecord = fields
                .into_iter()
                .map(|(column, cell)| (column, json_cell(cell)))
                .collect();
            rows.push(row);
        }
        debug!("fetch: {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

fn json_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::String(s) => CellValue::Text(s),
        Value::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::Text(n.to_string())),
        other => CellValue::Text(other.to_string()),
    }
}

/// Pick a reader by file extension.
pub fn source_for_path(path: &Path) -> InfraResult<Box<dyn RecordSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => Ok(Box::new(CsvFileSource::new(path))),
        Some("json") => Ok(Box::new(JsonFileSource::new(path))),
        _ => Err(InfraError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_json_scalars_when_converting_then_maps_to_cells() {
        assert_eq!(json_cell(Value::Null), CellValue::Empty);
        assert_eq!(json_cell(Value::from(12.5)), CellValue::Number(12.5));
        assert_eq!(json_cell(Value::from("x")), CellValue::Text("x".into()));
        assert_eq!(json_cell(Value::Bool(true)), CellValue::Text("true".into()));
    }

    #[test]
    fn given_blank_csv_cell_when_converting_then_empty() {
        assert_eq!(csv_cell("  "), CellValue::Empty);
        assert_eq!(csv_cell("1,000"), CellValue::Text("1,000".into()));
    }

    #[test]
    fn given_unknown_extension_when_selecting_source_then_unsupported() {
        assert!(matches!(
            source_for_path(Path::new("holdings.xlsx")),
            Err(InfraError::UnsupportedFormat { .. })
        ));
        assert!(source_for_path(Path::new("holdings.CSV")).is_ok());
    }
}
