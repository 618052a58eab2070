//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/sunburst/sunburst.toml`
//! 3. Local config: `--config <file>`, or `./sunburst.toml` when present
//! 4. Environment variables: `SUNBURST_*` prefix, `__` between sections

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{MissingWeightPolicy, Schema, DEFAULT_DELIMITER, DEFAULT_PALETTE, DEFAULT_ROOT_LABEL};

/// Name of the local config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "sunburst.toml";

/// Export and display settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportSettings {
    /// Separator between labels in exported paths
    pub delimiter: String,
    /// Label of the synthetic root node
    pub root_label: String,
    /// Colours assigned to depth-1 branches, cycled
    pub palette: Vec<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            root_label: DEFAULT_ROOT_LABEL.to_string(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Where rows come from when no input is given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceSettings {
    /// Default CSV/JSON export of the holdings sheet
    pub path: Option<PathBuf>,
}

/// Raw schema section: `None` means "not specified, inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSchema {
    pub level_columns: Option<Vec<String>>,
    pub weight_column: Option<String>,
    pub missing_weight: Option<MissingWeightPolicy>,
    pub label_suffixes: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawExport {
    pub delimiter: Option<String>,
    pub root_label: Option<String>,
    pub palette: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSource {
    pub path: Option<PathBuf>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub schema: RawSchema,
    pub export: RawExport,
    pub source: RawSource,
}

/// Unified configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub schema: Schema,
    pub export: ExportSettings,
    pub source: SourceSettings,
}

/// Get the XDG config directory.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "sunburst").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("sunburst.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the input untouched.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

impl Settings {
    /// Overlay a config layer onto self.
    ///
    /// - Scalars and lists: overlay wins if specified
    /// - `label_suffixes`: merged per key, overlay wins on conflicts
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        let mut label_suffixes = self.schema.label_suffixes.clone();
        if let Some(extra) = &overlay.schema.label_suffixes {
            label_suffixes.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        Self {
            schema: Schema {
                level_columns: overlay
                    .schema
                    .level_columns
                    .clone()
                    .unwrap_or_else(|| self.schema.level_columns.clone()),
                weight_column: overlay
                    .schema
                    .weight_column
                    .clone()
                    .unwrap_or_else(|| self.schema.weight_column.clone()),
                missing_weight: overlay
                    .schema
                    .missing_weight
                    .unwrap_or(self.schema.missing_weight),
                label_suffixes,
            },
            export: ExportSettings {
                delimiter: overlay
                    .export
                    .delimiter
                    .clone()
                    .unwrap_or_else(|| self.export.delimiter.clone()),
                root_label: overlay
                    .export
                    .root_label
                    .clone()
                    .unwrap_or_else(|| self.export.root_label.clone()),
                palette: overlay
                    .export
                    .palette
                    .clone()
                    .unwrap_or_else(|| self.export.palette.clone()),
            },
            source: SourceSettings {
                path: overlay.source.path.clone().or_else(|| self.source.path.clone()),
            },
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.source.path {
            let expanded = expand_env_vars(path.to_string_lossy().as_ref());
            self.source.path = Some(PathBuf::from(expanded));
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Explicit config file; it must exist when given. Without it
    ///   `./sunburst.toml` is used if present.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        match local {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
            None => {
                let path = Path::new(LOCAL_CONFIG_FILE);
                if path.exists() {
                    let raw = load_raw_settings(path)?;
                    current = current.merge_with(&raw);
                }
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply SUNBURST_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("SUNBURST")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("schema.level_columns")
                .with_list_parse_key("export.palette")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get::<Vec<String>>("schema.level_columns") {
            settings.schema.level_columns = val;
        }
        if let Ok(val) = config.get_string("schema.weight_column") {
            settings.schema.weight_column = val;
        }
        if let Ok(val) = config.get_string("schema.missing_weight") {
            settings.schema.missing_weight = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_string("export.delimiter") {
            settings.export.delimiter = val;
        }
        if let Ok(val) = config.get_string("export.root_label") {
            settings.export.root_label = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("export.palette") {
            settings.export.palette = val;
        }
        if let Ok(val) = config.get_string("source.path") {
            settings.source.path = Some(PathBuf::from(val));
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r##"# sunburst configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/sunburst/sunburst.toml
#   Local:  ./sunburst.toml or --config <file>
#   Env:    SUNBURST_* environment variables, e.g. SUNBURST_SCHEMA__WEIGHT_COLUMN
#
# Later layers replace values; label_suffixes are merged per key.

[schema]
# Hierarchy levels, outermost ring first
# level_columns = ["投資地區", "資產類別", "代號"]

# Numeric column summed into the chart
# weight_column = "總市值(TWD)"

# Rows without a weight: "reject" or "zero"
# missing_weight = "reject"

[schema.label_suffixes]
# Append a companion column to a level label ("2330" -> "2330 台積電")
# "代號" = "名稱"

[export]
# delimiter = "/"
# root_label = "Total"
# palette = ["#636efa", "#EF553B", "#00cc96"]

[source]
# Default input when none is given on the command line (.csv or .json)
# path = "~/data/holdings.csv"
"##
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
