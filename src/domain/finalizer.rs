//! Tree finalizer: consistency check, ordering, percentages and colours.

use std::cmp::Ordering;
use std::fmt;

use generational_arena::Index;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{TreeArena, TreeNode};
use crate::domain::error::{DomainError, DomainResult};

/// Plotly's default qualitative colourway.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Structural problems found while finalizing. None of them abort the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Anomaly {
    /// Incremental accumulation disagrees with the bottom-up sum; the sum wins.
    InternalConsistency {
        path: Vec<String>,
        accumulated: f64,
        recomputed: f64,
    },
    NegativeValue { path: Vec<String>, value: f64 },
    /// Childless zero-value node above leaf depth, removed from the tree.
    DanglingBranch { path: Vec<String>, depth: usize },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::InternalConsistency {
                path,
                accumulated,
                recomputed,
            } => write!(
                f,
                "inconsistent value at {}: accumulated {}, recomputed {}",
                display_path(path),
                accumulated,
                recomputed
            ),
            Anomaly::NegativeValue { path, value } => {
                write!(f, "negative value at {}: {}", display_path(path), value)
            }
            Anomaly::DanglingBranch { path, depth } => write!(
                f,
                "dangling branch removed at {} (depth {})",
                display_path(path),
                depth
            ),
        }
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(" > ")
    }
}

/// A tree that went through [`Finalizer::finalize`]: sorted, with percentages.
#[derive(Debug)]
pub struct FinalizedTree {
    tree: TreeArena,
}

impl FinalizedTree {
    pub fn tree(&self) -> &TreeArena {
        &self.tree
    }

    pub fn root_value(&self) -> f64 {
        self.tree.root_node().data.value
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

/// Derives display attributes once the tree is complete.
#[derive(Debug, Clone)]
pub struct Finalizer {
    palette: Vec<String>,
}

impl Default for Finalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl Finalizer {
    pub fn new(palette: Vec<String>) -> Self {
        Self { palette }
    }

    /// Finalize the tree in place.
    ///
    /// Order of work: bottom-up recompute (dropping dangling branches on the
    /// way), negative check, child sort (value desc, label asc), then
    /// percentages and colours top-down.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn finalize(&self, mut tree: TreeArena) -> DomainResult<(FinalizedTree, Vec<Anomaly>)> {
        let mut anomalies = Vec::new();

        self.recompute(&mut tree, &mut anomalies)?;
        sort_children(&mut tree)?;
        self.assign_shares(&mut tree)?;

        for anomaly in &anomalies {
            warn!("{}", anomaly);
        }
        debug!(
            nodes = tree.len(),
            total = tree.root_node().data.value,
            anomalies = anomalies.len(),
            "tree finalized"
        );
        Ok((FinalizedTree { tree }, anomalies))
    }

    fn recompute(&self, tree: &mut TreeArena, anomalies: &mut Vec<Anomaly>) -> DomainResult<()> {
        let order: Vec<Index> = tree.iter_postorder().map(|(idx, _)| idx).collect();
        let leaf_depth = tree.level_count();

        for idx in order {
            let node = fetch(tree, idx)?;
            let depth = node.depth;
            let recomputed = if !node.children.is_empty() {
                Some(children_sum(tree, &node.children))
            } else if !node.weights.is_empty() {
                Some(weights_sum(&node.weights))
            } else {
                None
            };

            if let Some(recomputed) = recomputed {
                let accumulated = node.data.value;
                if !approx_eq(accumulated, recomputed) {
                    anomalies.push(Anomaly::InternalConsistency {
                        path: owned_path(tree, idx),
                        accumulated,
                        recomputed,
                    });
                }
                fetch_mut(tree, idx)?.data.value = recomputed;
            }

            let node = fetch(tree, idx)?;
            let value = node.data.value;
            if value < 0.0 {
                anomalies.push(Anomaly::NegativeValue {
                    path: owned_path(tree, idx),
                    value,
                });
            }

            if depth > 0 && depth < leaf_depth && node.is_leaf() && value == 0.0 {
                anomalies.push(Anomaly::DanglingBranch {
                    path: owned_path(tree, idx),
                    depth,
                });
                tree.remove_leaf(idx);
            }
        }
        Ok(())
    }

    fn assign_shares(&self, tree: &mut TreeArena) -> DomainResult<()> {
        let total = tree.root_node().data.value;
        let root = tree.root();
        {
            let root_data = &mut fetch_mut(tree, root)?.data;
            let share = if total > 0.0 { 1.0 } else { 0.0 };
            root_data.percent_of_parent = share;
            root_data.percent_of_total = share;
            root_data.color = None;
        }

        let order: Vec<(Index, Option<Index>)> =
            tree.iter().map(|(idx, n)| (idx, n.parent)).collect();
        let mut branch = 0usize;

        for (idx, parent) in order {
            let Some(parent) = parent else { continue };
            let (parent_value, parent_color, parent_is_root) = {
                let p = fetch(tree, parent)?;
                (p.data.value, p.data.color.clone(), p.parent.is_none())
            };

            let color = if parent_is_root {
                let color = self.color_for(branch);
                branch += 1;
                color
            } else {
                parent_color
            };

            let data = &mut fetch_mut(tree, idx)?.data;
            data.percent_of_parent = ratio(data.value, parent_value);
            data.percent_of_total = ratio(data.value, total);
            data.color = color;
        }
        Ok(())
    }

    fn color_for(&self, position: usize) -> Option<String> {
        if self.palette.is_empty() {
            None
        } else {
            Some(self.palette[position % self.palette.len()].clone())
        }
    }
}

/// Reorder every child list: value descending, ties by label.
fn sort_children(tree: &mut TreeArena) -> DomainResult<()> {
    let parents: Vec<Index> = tree
        .iter()
        .filter(|(_, n)| n.children.len() > 1)
        .map(|(idx, _)| idx)
        .collect();

    for parent in parents {
        let mut keyed: Vec<(Index, f64, String)> = fetch(tree, parent)?
            .children
            .iter()
            .filter_map(|&c| tree.get_node(c).map(|n| (c, n.data.value, n.data.label.clone())))
            .collect();
        keyed.sort_by(|a, b| compare_siblings((a.1, &a.2), (b.1, &b.2)));
        fetch_mut(tree, parent)?.children = keyed.into_iter().map(|(idx, _, _)| idx).collect();
    }
    Ok(())
}

/// Leaf value: record weights added in ascending order, so row order cannot
/// change the last bits.
fn weights_sum(weights: &[f64]) -> f64 {
    let mut sorted = weights.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.iter().sum()
}

/// Inner value: child values added in label order.
fn children_sum(tree: &TreeArena, children: &[Index]) -> f64 {
    let mut values: Vec<(&str, f64)> = children
        .iter()
        .filter_map(|&c| tree.get_node(c))
        .map(|c| (c.data.label.as_str(), c.data.value))
        .collect();
    values.sort_by(|a, b| a.0.cmp(b.0));
    values.iter().map(|(_, v)| v).sum()
}

fn compare_siblings(a: (f64, &String), b: (f64, &String)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

fn ratio(value: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        value / whole
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= RELATIVE_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

fn owned_path(tree: &TreeArena, idx: Index) -> Vec<String> {
    tree.path(idx).into_iter().map(String::from).collect()
}

fn fetch(tree: &TreeArena, idx: Index) -> DomainResult<&TreeNode> {
    tree.get_node(idx)
        .ok_or_else(|| DomainError::Internal("dangling node index".to_string()))
}

fn fetch_mut(tree: &mut TreeArena, idx: Index) -> DomainResult<&mut TreeNode> {
    tree.get_node_mut(idx)
        .ok_or_else(|| DomainError::Internal("dangling node index".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::HierarchyBuilder;
    use crate::domain::record::CleanRecord;

    fn scenario_one() -> Vec<CleanRecord> {
        vec![
            CleanRecord::new(["US", "Equity"], 100.0),
            CleanRecord::new(["US", "Bond"], 50.0),
            CleanRecord::new(["EU", "Equity"], 30.0),
        ]
    }

    fn finalize(records: &[CleanRecord]) -> (FinalizedTree, Vec<Anomaly>) {
        let tree = HierarchyBuilder::build(2, records).unwrap();
        Finalizer::default().finalize(tree).unwrap()
    }

    fn labels(tree: &TreeArena, parent: Index) -> Vec<String> {
        tree.get_node(parent)
            .unwrap()
            .children
            .iter()
            .map(|&c| tree.get_node(c).unwrap().data.label.clone())
            .collect()
    }

    #[test]
    fn given_scenario_when_finalizing_then_sorts_by_value_descending() {
        let mut records = scenario_one();
        records.reverse();
        let (finalized, anomalies) = finalize(&records);
        let tree = finalized.tree();

        assert!(anomalies.is_empty());
        assert_eq!(finalized.root_value(), 180.0);
        assert_eq!(labels(tree, tree.root()), vec!["US", "EU"]);
        let us = tree.find(&["US"]).unwrap();
        assert_eq!(labels(tree, us), vec!["Equity", "Bond"]);
    }

    #[test]
    fn given_equal_values_when_finalizing_then_ties_break_by_label() {
        let records = vec![
            CleanRecord::new(["b", "x"], 10.0),
            CleanRecord::new(["c", "x"], 10.0),
            CleanRecord::new(["a", "x"], 10.0),
        ];
        let (finalized, _) = finalize(&records);
        let tree = finalized.tree();
        assert_eq!(labels(tree, tree.root()), vec!["a", "b", "c"]);
    }

    #[test]
    fn given_finalized_tree_when_reading_percentages_then_relative_to_parent_and_total() {
        let (finalized, _) = finalize(&scenario_one());
        let tree = finalized.tree();

        let us = tree.get_node(tree.find(&["US"]).unwrap()).unwrap();
        assert!((us.data.percent_of_total - 150.0 / 180.0).abs() < 1e-12);
        assert!((us.data.percent_of_parent - 150.0 / 180.0).abs() < 1e-12);

        let bond = tree.get_node(tree.find(&["US", "Bond"]).unwrap()).unwrap();
        assert!((bond.data.percent_of_parent - 50.0 / 150.0).abs() < 1e-12);
        assert!((bond.data.percent_of_total - 50.0 / 180.0).abs() < 1e-12);
        assert_eq!(tree.root_node().data.percent_of_total, 1.0);
    }

    #[test]
    fn given_zero_total_when_finalizing_then_percentages_are_zero() {
        let records = vec![CleanRecord::new(["US", "Equity"], 0.0)];
        let (finalized, anomalies) = finalize(&records);
        let tree = finalized.tree();

        assert!(anomalies.is_empty());
        let leaf = tree.get_node(tree.find(&["US", "Equity"]).unwrap()).unwrap();
        assert_eq!(leaf.data.percent_of_parent, 0.0);
        assert_eq!(leaf.data.percent_of_total, 0.0);
        assert_eq!(tree.root_node().data.percent_of_total, 0.0);
    }

    #[test]
    fn given_branches_when_finalizing_then_colours_follow_depth_one_ancestor() {
        let (finalized, _) = finalize(&scenario_one());
        let tree = finalized.tree();

        fn color(tree: &TreeArena, path: &[&str]) -> Option<String> {
            tree.get_node(tree.find(path).unwrap()).unwrap().data.color.clone()
        }
        assert_eq!(color(tree, &["US"]), Some(DEFAULT_PALETTE[0].to_string()));
        assert_eq!(color(tree, &["EU"]), Some(DEFAULT_PALETTE[1].to_string()));
        assert_eq!(color(tree, &["US", "Bond"]), color(tree, &["US"]));
        assert_eq!(tree.root_node().data.color, None);
    }

    #[test]
    fn given_tampered_accumulator_when_finalizing_then_reports_and_recomputes() {
        let mut tree = HierarchyBuilder::build(2, &scenario_one()).unwrap();
        let us = tree.find(&["US"]).unwrap();
        tree.get_node_mut(us).unwrap().data.value = 999.0;

        let (finalized, anomalies) = Finalizer::default().finalize(tree).unwrap();

        assert_eq!(
            anomalies,
            vec![Anomaly::InternalConsistency {
                path: vec!["US".to_string()],
                accumulated: 999.0,
                recomputed: 150.0,
            }]
        );
        let tree = finalized.tree();
        assert_eq!(tree.get_node(tree.find(&["US"]).unwrap()).unwrap().data.value, 150.0);
        assert_eq!(finalized.root_value(), 180.0);
    }

    #[test]
    fn given_dangling_branch_when_finalizing_then_removes_it() {
        let mut tree = HierarchyBuilder::build(2, &scenario_one()).unwrap();
        let root = tree.root();
        tree.child_or_insert(root, "APAC").unwrap();

        let (finalized, anomalies) = Finalizer::default().finalize(tree).unwrap();

        assert_eq!(
            anomalies,
            vec![Anomaly::DanglingBranch {
                path: vec!["APAC".to_string()],
                depth: 1,
            }]
        );
        assert!(finalized.tree().find(&["APAC"]).is_none());
    }

    #[test]
    fn given_negative_leaf_when_finalizing_then_flags_negative_value() {
        let records = vec![
            CleanRecord::new(["US", "Equity"], 10.0),
            CleanRecord::new(["US", "Short"], -4.0),
        ];
        let (finalized, anomalies) = finalize(&records);

        assert!(anomalies.contains(&Anomaly::NegativeValue {
            path: vec!["US".to_string(), "Short".to_string()],
            value: -4.0,
        }));
        assert_eq!(finalized.root_value(), 6.0);
    }

    #[test]
    fn given_zero_weight_leaf_when_finalizing_then_kept() {
        let records = vec![
            CleanRecord::new(["US", "Equity"], 10.0),
            CleanRecord::new(["US", "Cash"], 0.0),
        ];
        let (finalized, anomalies) = finalize(&records);
        assert!(anomalies.is_empty());
        assert!(finalized.tree().find(&["US", "Cash"]).is_some());
    }

    #[test]
    fn given_empty_tree_when_finalizing_then_root_only() {
        let (finalized, anomalies) = finalize(&[]);
        assert!(anomalies.is_empty());
        assert!(finalized.is_empty());
        assert_eq!(finalized.root_value(), 0.0);
    }

    #[test]
    fn given_empty_palette_when_finalizing_then_no_colours() {
        let tree = HierarchyBuilder::build(2, &scenario_one()).unwrap();
        let (finalized, _) = Finalizer::new(vec![]).finalize(tree).unwrap();
        assert!(finalized.tree().iter().all(|(_, n)| n.data.color.is_none()));
    }

    #[test]
    fn given_decimal_weights_in_any_row_order_when_finalizing_then_same_values_and_order() {
        let forward = vec![
            CleanRecord::new(["a", "x"], 0.6),
            CleanRecord::new(["b", "x"], 0.1),
            CleanRecord::new(["b", "x"], 0.2),
            CleanRecord::new(["b", "x"], 0.3),
        ];
        let reversed: Vec<CleanRecord> = forward.iter().rev().cloned().collect();

        let snapshot = |records: &[CleanRecord]| -> Vec<(String, u64, Option<String>)> {
            let (finalized, _) = finalize(records);
            finalized
                .tree()
                .iter()
                .map(|(_, n)| (n.data.label.clone(), n.data.value.to_bits(), n.data.color.clone()))
                .collect()
        };

        assert_eq!(snapshot(&forward), snapshot(&reversed));
    }
}
