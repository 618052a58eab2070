//! Service container for dependency injection
//!
//! Wires the aggregation service to the loaded settings.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::services::AggregationService;
use crate::application::ApplicationError;
use crate::config::Settings;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::source::source_for_path;
use crate::infrastructure::traits::RecordSource;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Pipeline configured from `settings.schema` and `settings.export`
    pub aggregation: AggregationService,
}

impl ServiceContainer {
    /// Build services from settings; fails on an invalid schema.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let aggregation = AggregationService::new(&settings.schema, &settings.export)?;
        Ok(Self {
            settings: Arc::new(settings),
            aggregation,
        })
    }

    /// Resolve the input file: explicit argument, else `source.path` from config.
    pub fn input_path(&self, explicit: Option<&Path>) -> InfraResult<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.settings.source.path.clone())
            .ok_or_else(|| {
                InfraError::Application(ApplicationError::Config {
                    message: "no input given and source.path is not configured".to_string(),
                })
            })
    }

    /// Reader for the resolved input.
    pub fn source(&self, explicit: Option<&Path>) -> InfraResult<Box<dyn RecordSource>> {
        let path = self.input_path(explicit)?;
        source_for_path(&path)
    }
}
