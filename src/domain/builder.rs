//! Hierarchy builder: folds clean records into a weighted tree.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::TreeArena;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::record::CleanRecord;

/// Label of the synthetic root when none is configured.
pub const DEFAULT_ROOT_LABEL: &str = "Total";

/// Constructs the aggregation tree from clean records.
///
/// Children keep first-seen order; the finalizer decides the final order.
#[derive(Debug)]
pub struct HierarchyBuilder {
    tree: TreeArena,
    records: usize,
}

impl HierarchyBuilder {
    pub fn new(level_count: usize) -> Self {
        Self::with_root_label(DEFAULT_ROOT_LABEL, level_count)
    }

    pub fn with_root_label(root_label: impl Into<String>, level_count: usize) -> Self {
        Self {
            tree: TreeArena::new(root_label, level_count),
            records: 0,
        }
    }

    /// Walk the record's label path from the root, creating missing nodes and
    /// adding the weight to every node visited (root included).
    #[instrument(level = "trace", skip(self))]
    pub fn insert(&mut self, record: &CleanRecord) -> DomainResult<()> {
        let expected = self.tree.level_count();
        if record.levels.len() != expected {
            return Err(DomainError::LevelCountMismatch {
                expected,
                actual: record.levels.len(),
            });
        }

        let mut current = self.tree.root();
        self.accumulate(current, record.weight)?;
        for label in &record.levels {
            current = self
                .tree
                .child_or_insert(current, label)
                .ok_or_else(|| DomainError::Internal(format!("lost node while inserting {label}")))?;
            self.accumulate(current, record.weight)?;
        }
        self.tree
            .get_node_mut(current)
            .ok_or_else(|| DomainError::Internal("dangling leaf index".to_string()))?
            .weights
            .push(record.weight);
        self.records += 1;
        Ok(())
    }

    fn accumulate(&mut self, idx: Index, weight: f64) -> DomainResult<()> {
        let node = self
            .tree
            .get_node_mut(idx)
            .ok_or_else(|| DomainError::Internal("dangling node index".to_string()))?;
        node.data.value += weight;
        Ok(())
    }

    /// Records folded in so far.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Hand the tree over to the next stage.
    pub fn finish(self) -> TreeArena {
        debug!(
            records = self.records,
            nodes = self.tree.len(),
            "hierarchy built"
        );
        self.tree
    }

    /// Build a tree from a whole record sequence.
    #[instrument(level = "debug", skip(records))]
    pub fn build<'a>(
        level_count: usize,
        records: impl IntoIterator<Item = &'a CleanRecord>,
    ) -> DomainResult<TreeArena> {
        let mut builder = Self::new(level_count);
        for record in records {
            builder.insert(record)?;
        }
        Ok(builder.finish())
    }
}
