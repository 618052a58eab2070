//! Column schema: which columns form the hierarchy and which carries the weight.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::SchemaError;

/// What to do with a row whose weight cell is absent or blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingWeightPolicy {
    #[default]
    Reject,
    Zero,
}

impl FromStr for MissingWeightPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(MissingWeightPolicy::Reject),
            "zero" => Ok(MissingWeightPolicy::Zero),
            other => Err(format!("unknown missing weight policy: {other} (expected reject|zero)")),
        }
    }
}

impl fmt::Display for MissingWeightPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingWeightPolicy::Reject => write!(f, "reject"),
            MissingWeightPolicy::Zero => write!(f, "zero"),
        }
    }
}

/// Column schema as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    /// Hierarchy levels, outermost ring first
    pub level_columns: Vec<String>,
    /// Numeric column summed into node values
    pub weight_column: String,
    pub missing_weight: MissingWeightPolicy,
    /// Level column -> companion column appended to its label (e.g. ticker -> name)
    pub label_suffixes: BTreeMap<String, String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            level_columns: vec!["投資地區".into(), "資產類別".into(), "代號".into()],
            weight_column: "總市值(TWD)".into(),
            missing_weight: MissingWeightPolicy::Reject,
            label_suffixes: BTreeMap::from([("代號".to_string(), "名稱".to_string())]),
        }
    }
}

impl Schema {
    pub fn new<S: Into<String>>(
        level_columns: impl IntoIterator<Item = S>,
        weight_column: impl Into<String>,
    ) -> Self {
        Self {
            level_columns: level_columns.into_iter().map(Into::into).collect(),
            weight_column: weight_column.into(),
            missing_weight: MissingWeightPolicy::Reject,
            label_suffixes: BTreeMap::new(),
        }
    }

    pub fn with_missing_weight(mut self, policy: MissingWeightPolicy) -> Self {
        self.missing_weight = policy;
        self
    }

    pub fn with_label_suffix(mut self, level: impl Into<String>, companion: impl Into<String>) -> Self {
        self.label_suffixes.insert(level.into(), companion.into());
        self
    }

    /// Validate once and produce the field mapping used for every row.
    pub fn resolve(&self) -> Result<FieldMap, SchemaError> {
        if self.level_columns.is_empty() {
            return Err(SchemaError::NoLevelColumns);
        }
        let weight = self.weight_column.trim();
        if weight.is_empty() {
            return Err(SchemaError::MissingWeightColumn);
        }

        let mut seen = HashSet::new();
        let mut levels = Vec::with_capacity(self.level_columns.len());
        for (pos, column) in self.level_columns.iter().enumerate() {
            let column = column.trim();
            if column.is_empty() {
                return Err(SchemaError::BlankLevelColumn(pos));
            }
            if !seen.insert(column) {
                return Err(SchemaError::DuplicateLevelColumn(column.to_string()));
            }
            if column == weight {
                return Err(SchemaError::WeightIsLevel(weight.to_string()));
            }
            let suffix = self
                .label_suffixes
                .get(column)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            levels.push(LevelField {
                column: column.to_string(),
                suffix,
            });
        }

        Ok(FieldMap {
            levels,
            weight: weight.to_string(),
            missing_weight: self.missing_weight,
        })
    }
}

/// One hierarchy level resolved from the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelField {
    pub column: String,
    pub suffix: Option<String>,
}

/// Validated schema: the only way the normalizer looks at raw rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub levels: Vec<LevelField>,
    pub weight: String,
    pub missing_weight: MissingWeightPolicy,
}

impl FieldMap {
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_schema_when_resolving_then_uses_holdings_layout() {
        let map = Schema::default().resolve().unwrap();
        assert_eq!(map.level_count(), 3);
        assert_eq!(map.weight, "總市值(TWD)");
        assert_eq!(map.levels[2].suffix.as_deref(), Some("名稱"));
    }

    #[test]
    fn given_blank_weight_column_when_resolving_then_fails() {
        let schema = Schema::new(["region"], "  ");
        assert_eq!(schema.resolve(), Err(SchemaError::MissingWeightColumn));
    }

    #[test]
    fn given_no_levels_when_resolving_then_fails() {
        let schema = Schema::new(Vec::<String>::new(), "value");
        assert_eq!(schema.resolve(), Err(SchemaError::NoLevelColumns));
    }

    #[test]
    fn given_duplicate_level_when_resolving_then_fails() {
        let schema = Schema::new(["region", " region "], "value");
        assert_eq!(
            schema.resolve(),
            Err(SchemaError::DuplicateLevelColumn("region".into()))
        );
    }

    #[test]
    fn given_weight_as_level_when_resolving_then_fails() {
        let schema = Schema::new(["region", "value"], "value");
        assert_eq!(schema.resolve(), Err(SchemaError::WeightIsLevel("value".into())));
    }

    #[test]
    fn given_policy_string_when_parsing_then_case_insensitive() {
        assert_eq!("Zero".parse::<MissingWeightPolicy>(), Ok(MissingWeightPolicy::Zero));
        assert!("maybe".parse::<MissingWeightPolicy>().is_err());
    }
}
