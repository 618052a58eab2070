//! Aggregation service
//!
//! Runs the full pipeline: normalize rows, build the tree, finalize it and
//! flatten it into edge records. Row rejections are collected, not fatal.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::application::ApplicationResult;
use crate::config::ExportSettings;
use crate::domain::{
    export, Anomaly, CleanRecord, EdgeRecord, FinalizedTree, Finalizer, HierarchyBuilder,
    Normalizer, RawRecord, Rejection, RejectionKind, Schema, SchemaError,
};
use crate::infrastructure::traits::RecordSource;

/// A rejected input row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRejection {
    /// 1-based position in the input
    pub row: usize,
    pub reason: Rejection,
}

/// Tally of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub accepted: usize,
    pub accepted_weight: f64,
    #[serde(skip)]
    pub rejected: Vec<RowRejection>,
    pub by_kind: BTreeMap<RejectionKind, usize>,
}

impl RunSummary {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }

    /// No row survived normalization.
    pub fn is_empty_result(&self) -> bool {
        self.accepted == 0
    }

    fn reject(&mut self, row: usize, reason: Rejection) {
        *self.by_kind.entry(reason.kind()).or_insert(0) += 1;
        self.rejected.push(RowRejection { row, reason });
    }
}

/// Everything a run produces.
#[derive(Debug)]
pub struct AggregationOutput {
    pub tree: FinalizedTree,
    pub edges: Vec<EdgeRecord>,
    pub summary: RunSummary,
    pub anomalies: Vec<Anomaly>,
}

/// Service wiring the engine stages together.
#[derive(Debug)]
pub struct AggregationService {
    normalizer: Normalizer,
    finalizer: Finalizer,
    delimiter: String,
    root_label: String,
}

impl AggregationService {
    /// Validate schema and export settings up front; nothing runs on a bad schema.
    pub fn new(schema: &Schema, export: &ExportSettings) -> ApplicationResult<Self> {
        if export.delimiter.is_empty() {
            return Err(SchemaError::EmptyDelimiter.into());
        }
        let normalizer = Normalizer::new(schema)?;
        Ok(Self {
            normalizer,
            finalizer: Finalizer::new(export.palette.clone()),
            delimiter: export.delimiter.clone(),
            root_label: export.root_label.clone(),
        })
    }

    pub fn level_count(&self) -> usize {
        self.normalizer.level_count()
    }

    /// Normalize rows, keeping accepted records in input order.
    pub fn normalize_all<'a>(
        &self,
        rows: impl IntoIterator<Item = &'a RawRecord>,
    ) -> (Vec<CleanRecord>, RunSummary) {
        let mut summary = RunSummary::default();
        let mut accepted = Vec::new();

        for (i, row) in rows.into_iter().enumerate() {
            summary.total_rows += 1;
            match self.normalizer.normalize(row) {
                Ok(record) => {
                    summary.accepted += 1;
                    summary.accepted_weight += record.weight;
                    accepted.push(record);
                }
                Err(reason) => {
                    debug!("normalize: row {} rejected: {}", i + 1, reason);
                    summary.reject(i + 1, reason);
                }
            }
        }
        (accepted, summary)
    }

    /// Run the pipeline over in-memory rows.
    #[instrument(level = "debug", skip(self, rows))]
    pub fn aggregate(&self, rows: &[RawRecord]) -> ApplicationResult<AggregationOutput> {
        let (records, summary) = self.normalize_all(rows);

        let mut builder = HierarchyBuilder::with_root_label(self.root_label.clone(), self.level_count());
        for record in &records {
            builder.insert(record)?;
        }
        let (tree, anomalies) = self.finalizer.finalize(builder.finish())?;
        let edges = export(&tree, &self.delimiter);

        if summary.is_empty_result() {
            warn!(
                "aggregate: no rows accepted ({} total, {} rejected)",
                summary.total_rows,
                summary.rejected_count()
            );
        }
        info!(
            total = summary.total_rows,
            accepted = summary.accepted,
            rejected = summary.rejected_count(),
            anomalies = anomalies.len(),
            "aggregate: done, root value {}",
            tree.root_value()
        );

        Ok(AggregationOutput {
            tree,
            edges,
            summary,
            anomalies,
        })
    }

    /// Fetch rows from a source and aggregate them.
    pub fn run(&self, source: &dyn RecordSource) -> ApplicationResult<AggregationOutput> {
        debug!("run: source={}", source.describe());
        let rows = source.fetch()?;
        self.aggregate(&rows)
    }
}
