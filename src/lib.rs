//! sunburst: hierarchical aggregation of tabular rows into weighted trees
//!
//! Rows are normalized against a column schema, folded into a tree, finalized
//! (values recomputed, children sorted, shares and colours assigned) and
//! flattened into parent/child edge records for sunburst charts.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
