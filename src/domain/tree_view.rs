/*
Terminal rendering of the aggregation tree via termtree.
A trait keeps the display concern out of the arena itself.
 */
use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::{TreeArena, TreeNode};
use crate::domain::finalizer::FinalizedTree;
use crate::domain::record::format_number;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

fn node_line(node: &TreeNode) -> String {
    if node.parent.is_none() {
        return format!("{} {}", node.data.label, format_value(node.data.value));
    }
    format!(
        "{} {} ({} of total, {} of parent)",
        node.data.label,
        format_value(node.data.value),
        format_percent(node.data.percent_of_total),
        format_percent(node.data.percent_of_parent)
    )
}

/// Rounded to two decimals, integral values without fraction.
pub fn format_value(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format_number(rounded)
}

pub fn format_percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

impl TreeNodeConvert for TreeArena {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(arena: &TreeArena, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = arena.get_node(node_idx) {
                for &child_idx in &node.children {
                    if let Some(child) = arena.get_node(child_idx) {
                        let mut child_tree = Tree::new(node_line(child));
                        build_tree(arena, child_idx, &mut child_tree);
                        parent_tree.push(child_tree);
                    }
                }
            }
        }

        let mut tree = Tree::new(node_line(self.root_node()));
        build_tree(self, self.root(), &mut tree);
        tree
    }
}

impl TreeNodeConvert for FinalizedTree {
    fn to_tree_string(&self) -> Tree<String> {
        self.tree().to_tree_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::HierarchyBuilder;
    use crate::domain::finalizer::Finalizer;
    use crate::domain::record::CleanRecord;

    #[test]
    fn given_finalized_tree_when_rendering_then_shows_values_and_shares() {
        let tree = HierarchyBuilder::build(
            2,
            &[
                CleanRecord::new(["EU", "Equity"], 30.0),
                CleanRecord::new(["US", "Equity"], 90.0),
            ],
        )
        .unwrap();
        let (finalized, _) = Finalizer::default().finalize(tree).unwrap();

        let rendered = finalized.to_tree_string().to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "Total 120");
        assert!(lines[1].contains("US 90 (75.0% of total, 75.0% of parent)"));
        assert!(lines[2].contains("Equity 90 (75.0% of total, 100.0% of parent)"));
        assert!(lines[3].contains("EU 30 (25.0% of total"));
    }

    #[test]
    fn given_fractional_value_when_formatting_then_rounds_to_cents() {
        assert_eq!(format_value(1234.5678), "1234.57");
        assert_eq!(format_value(10.0), "10");
        assert_eq!(format_percent(0.8333), "83.3%");
    }
}
