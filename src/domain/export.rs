//! Export adapter: finalized tree to flat parent/child edge records.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::finalizer::FinalizedTree;

pub const DEFAULT_DELIMITER: &str = "/";

/// One node of the chart, flattened. The root itself is never emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Escaped path of the parent, empty for depth-1 nodes
    pub parent_path: String,
    /// Escaped path of this node, unique within one export
    pub node_path: String,
    pub label: String,
    pub value: f64,
    pub percent_of_total: f64,
    pub percent_of_parent: f64,
    pub depth: usize,
    pub color: Option<String>,
}

/// Escape a label so it can be joined with `delimiter` without ambiguity.
pub fn escape_label(label: &str, delimiter: &str) -> String {
    let escaped = label.replace('\\', "\\\\");
    if delimiter.is_empty() {
        escaped
    } else {
        escaped.replace(delimiter, &format!("\\{}", delimiter))
    }
}

/// Escape each label and join with `delimiter`.
pub fn join_path<S: AsRef<str>>(labels: &[S], delimiter: &str) -> String {
    labels
        .iter()
        .map(|l| escape_label(l.as_ref(), delimiter))
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Flatten the tree in pre-order, children in finalized order.
#[instrument(level = "debug", skip(tree))]
pub fn export(tree: &FinalizedTree, delimiter: &str) -> Vec<EdgeRecord> {
    let arena = tree.tree();
    arena
        .iter()
        .filter(|(_, node)| node.parent.is_some())
        .map(|(idx, node)| {
            let path = arena.path(idx);
            let parent = &path[..path.len().saturating_sub(1)];
            EdgeRecord {
                parent_path: join_path(parent, delimiter),
                node_path: join_path(&path[..], delimiter),
                label: node.data.label.clone(),
                value: node.data.value,
                percent_of_total: node.data.percent_of_total,
                percent_of_parent: node.data.percent_of_parent,
                depth: node.depth,
                color: node.data.color.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::HierarchyBuilder;
    use crate::domain::finalizer::Finalizer;
    use crate::domain::record::CleanRecord;

    fn finalized(records: &[CleanRecord]) -> FinalizedTree {
        let tree = HierarchyBuilder::build(2, records).unwrap();
        Finalizer::default().finalize(tree).unwrap().0
    }

    #[test]
    fn given_finalized_tree_when_exporting_then_preorder_without_root() {
        let edges = export(
            &finalized(&[
                CleanRecord::new(["EU", "Equity"], 30.0),
                CleanRecord::new(["US", "Equity"], 100.0),
                CleanRecord::new(["US", "Bond"], 50.0),
            ]),
            "/",
        );

        let paths: Vec<(&str, &str)> = edges
            .iter()
            .map(|e| (e.parent_path.as_str(), e.node_path.as_str()))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("", "US"),
                ("US", "US/Equity"),
                ("US", "US/Bond"),
                ("", "EU"),
                ("EU", "EU/Equity"),
            ]
        );
        assert_eq!(edges[0].value, 150.0);
        assert_eq!(edges[0].depth, 1);
        assert_eq!(edges[2].label, "Bond");
    }

    #[test]
    fn given_export_when_summing_depth_one_then_equals_root() {
        let tree = finalized(&[
            CleanRecord::new(["A", "x"], 1.5),
            CleanRecord::new(["B", "y"], 2.5),
            CleanRecord::new(["B", "z"], 4.0),
        ]);
        let edges = export(&tree, "/");
        let sum: f64 = edges.iter().filter(|e| e.depth == 1).map(|e| e.value).sum();
        assert_eq!(sum, tree.root_value());
    }

    #[test]
    fn given_empty_tree_when_exporting_then_no_records() {
        assert!(export(&finalized(&[]), "/").is_empty());
    }

    #[test]
    fn given_label_with_delimiter_when_exporting_then_escapes() {
        let edges = export(&finalized(&[CleanRecord::new(["US/CA", "a\\b"], 1.0)]), "/");
        assert_eq!(edges[0].node_path, "US\\/CA");
        assert_eq!(edges[1].parent_path, "US\\/CA");
        assert_eq!(edges[1].node_path, "US\\/CA/a\\\\b");
        assert_eq!(edges[1].label, "a\\b");
    }

    #[test]
    fn given_custom_delimiter_when_joining_then_uses_it() {
        assert_eq!(join_path(&["US", "Equity"][..], " > "), "US > Equity");
        assert_eq!(escape_label("a|b", "|"), "a\\|b");
    }
}
