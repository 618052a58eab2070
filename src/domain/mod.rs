//! Domain layer: the aggregation engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).
//! Data flows normalizer -> builder -> finalizer -> export; the tree is moved
//! from stage to stage, never shared.

pub mod arena;
pub mod builder;
pub mod error;
pub mod export;
pub mod finalizer;
pub mod normalizer;
pub mod record;
pub mod schema;
pub mod tree_view;

pub use arena::{NodeData, TreeArena, TreeNode};
pub use builder::{HierarchyBuilder, DEFAULT_ROOT_LABEL};
pub use error::{DomainError, DomainResult, SchemaError};
pub use export::{export, EdgeRecord, DEFAULT_DELIMITER};
pub use finalizer::{Anomaly, FinalizedTree, Finalizer, DEFAULT_PALETTE};
pub use normalizer::Normalizer;
pub use record::{CellValue, CleanRecord, RawRecord, Rejection, RejectionKind};
pub use schema::{FieldMap, MissingWeightPolicy, Schema};
pub use tree_view::TreeNodeConvert;
