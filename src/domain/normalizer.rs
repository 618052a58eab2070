//! Row normalizer: raw spreadsheet rows to clean, typed records.

use tracing::instrument;

use crate::domain::error::SchemaError;
use crate::domain::record::{CellValue, CleanRecord, RawRecord, Rejection};
use crate::domain::schema::{FieldMap, MissingWeightPolicy, Schema};

/// Pure row validator. Construction fails only on a broken schema.
#[derive(Debug, Clone)]
pub struct Normalizer {
    fields: FieldMap,
}

impl Normalizer {
    pub fn new(schema: &Schema) -> Result<Self, SchemaError> {
        Ok(Self {
            fields: schema.resolve()?,
        })
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn level_count(&self) -> usize {
        self.fields.level_count()
    }

    /// Normalize one row.
    ///
    /// Level columns are checked for presence first (`SchemaMismatch`), then
    /// each label is trimmed (`EmptyLabel`), then the weight is parsed
    /// (`MissingWeight` / `InvalidWeight`).
    #[instrument(level = "trace", skip(self))]
    pub fn normalize(&self, record: &RawRecord) -> Result<CleanRecord, Rejection> {
        let mut cells = Vec::with_capacity(self.fields.levels.len());
        for level in &self.fields.levels {
            let cell = record
                .get(&level.column)
                .ok_or_else(|| Rejection::SchemaMismatch {
                    column: level.column.clone(),
                })?;
            cells.push(cell);
        }

        let mut levels = Vec::with_capacity(cells.len());
        for (level, cell) in self.fields.levels.iter().zip(cells) {
            let label = cell_label(cell).ok_or_else(|| Rejection::EmptyLabel {
                column: level.column.clone(),
            })?;
            let label = match level.suffix.as_deref().and_then(|c| record.get(c)).and_then(companion_label) {
                Some(suffix) => format!("{} {}", label, suffix),
                None => label,
            };
            levels.push(label);
        }

        let weight = self.weight(record)?;
        Ok(CleanRecord { levels, weight })
    }

    fn weight(&self, record: &RawRecord) -> Result<f64, Rejection> {
        let column = &self.fields.weight;
        let missing = || match self.fields.missing_weight {
            MissingWeightPolicy::Zero => Ok(0.0),
            MissingWeightPolicy::Reject => Err(Rejection::MissingWeight {
                column: column.clone(),
            }),
        };

        let cell = match record.get(column) {
            Some(cell) if !cell.is_blank() => cell,
            _ => return missing(),
        };

        let invalid = || Rejection::InvalidWeight {
            column: column.clone(),
            raw: cell.to_string(),
        };
        let value = match cell {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => parse_weight(s).ok_or_else(invalid)?,
            CellValue::Empty => return missing(),
        };

        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        // -0.0 would print oddly downstream
        Ok(value + 0.0)
    }
}

/// Trimmed label text, `None` when blank.
fn cell_label(cell: &CellValue) -> Option<String> {
    let text = match cell {
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Number(_) => cell.to_string(),
        CellValue::Empty => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Companion text for a display label. Spreadsheet exports write missing
/// names as `nan`, which counts as absent.
fn companion_label(cell: &CellValue) -> Option<String> {
    cell_label(cell).filter(|text| !text.eq_ignore_ascii_case("nan"))
}

/// Parse spreadsheet-formatted numbers such as `"1,234,567"` or `" 12.5 "`.
pub fn parse_weight(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}
