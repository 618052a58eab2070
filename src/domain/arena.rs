use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

/// Data payload for tree nodes: one category at one hierarchy depth.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    /// Level label, empty for the synthetic root
    pub label: String,
    /// Aggregated weight of all leaf records below this node
    pub value: f64,
    /// Share of the parent's value, set by the finalizer
    pub percent_of_parent: f64,
    /// Share of the root's value, set by the finalizer
    pub percent_of_total: f64,
    /// Display colour, inherited from the depth-1 ancestor
    pub color: Option<String>,
}

impl NodeData {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: 0.0,
            percent_of_parent: 0.0,
            percent_of_total: 0.0,
            color: None,
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Distance from the root (root = 0)
    pub depth: usize,
    /// Index of parent node in the arena, None for the root.
    /// Lookup only, the arena owns every node.
    pub parent: Option<Index>,
    /// Child indices in insertion (later: sorted) order
    pub children: Vec<Index>,
    /// Record weights folded into this node, kept on leaves only
    pub weights: Vec<f64>,
    /// Exact, case-sensitive label lookup for children
    child_lookup: HashMap<String, Index>,
}

impl TreeNode {
    pub fn child(&self, label: &str) -> Option<Index> {
        self.child_lookup.get(label).copied()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-based tree for one aggregation run.
///
/// Always has a root. `level_count` is the depth at which leaves live;
/// every record path has exactly that many labels.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Index,
    level_count: usize,
}

impl TreeArena {
    pub fn new(root_label: impl Into<String>, level_count: usize) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            data: NodeData::new(root_label),
            depth: 0,
            parent: None,
            children: Vec::new(),
            weights: Vec::new(),
            child_lookup: HashMap::new(),
        });
        Self {
            arena,
            root,
            level_count,
        }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn root_node(&self) -> &TreeNode {
        &self.arena[self.root]
    }

    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Number of nodes including the root.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.root_node().children.is_empty()
    }

    /// Return the child of `parent` labelled `label`, creating it on first sight.
    #[instrument(level = "trace", skip(self))]
    pub fn child_or_insert(&mut self, parent: Index, label: &str) -> Option<Index> {
        let parent_node = self.arena.get(parent)?;
        if let Some(existing) = parent_node.child(label) {
            return Some(existing);
        }
        let depth = parent_node.depth + 1;

        let idx = self.arena.insert(TreeNode {
            data: NodeData::new(label),
            depth,
            parent: Some(parent),
            children: Vec::new(),
            weights: Vec::new(),
            child_lookup: HashMap::new(),
        });
        let parent_node = self.arena.get_mut(parent)?;
        parent_node.children.push(idx);
        parent_node.child_lookup.insert(label.to_string(), idx);
        Some(idx)
    }

    /// Detach and drop a childless, non-root node.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_leaf(&mut self, idx: Index) -> Option<NodeData> {
        if idx == self.root || !self.arena.get(idx)?.children.is_empty() {
            return None;
        }
        let node = self.arena.remove(idx)?;
        if let Some(parent) = node.parent.and_then(|p| self.arena.get_mut(p)) {
            parent.children.retain(|&c| c != idx);
            parent.child_lookup.remove(&node.data.label);
        }
        Some(node.data)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    /// Labels from the first level down to `idx` (root excluded).
    pub fn path(&self, idx: Index) -> Vec<&str> {
        let mut labels = Vec::new();
        let mut current = Some(idx);
        while let Some(node_idx) = current {
            match self.get_node(node_idx) {
                Some(node) if node.parent.is_some() => {
                    labels.push(node.data.label.as_str());
                    current = node.parent;
                }
                _ => break,
            }
        }
        labels.reverse();
        labels
    }

    /// Follow labels from the root, exact match at every level.
    pub fn find(&self, labels: &[&str]) -> Option<Index> {
        labels.iter().try_fold(self.root, |idx, label| self.get_node(idx)?.child(label))
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Collects all leaf nodes (nodes with no children) below the root,
    /// as their label paths. An empty tree returns an empty vector.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<Vec<String>> {
        self.iter()
            .filter(|(idx, node)| *idx != self.root && node.is_leaf())
            .map(|(idx, _)| self.path(idx).into_iter().map(String::from).collect())
            .collect()
    }
}

/// Pre-order traversal, children left to right.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        Self {
            arena,
            stack: vec![arena.root()],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

/// Post-order traversal: every child is yielded before its parent.
pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        Self {
            arena,
            stack: vec![(arena.root(), false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Total
    // ├── US
    // │   ├── Equity
    // │   └── Bond
    // └── EU
    fn sample() -> TreeArena {
        let mut tree = TreeArena::new("Total", 2);
        let root = tree.root();
        let us = tree.child_or_insert(root, "US").unwrap();
        tree.child_or_insert(us, "Equity").unwrap();
        tree.child_or_insert(us, "Bond").unwrap();
        tree.child_or_insert(root, "EU").unwrap();
        tree
    }

    #[test]
    fn given_existing_label_when_inserting_then_reuses_node() {
        let mut tree = sample();
        let root = tree.root();
        let first = tree.find(&["US"]).unwrap();
        let again = tree.child_or_insert(root, "US").unwrap();
        assert_eq!(first, again);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn given_case_variant_label_when_inserting_then_creates_new_node() {
        let mut tree = sample();
        let root = tree.root();
        let lower = tree.child_or_insert(root, "us").unwrap();
        assert_ne!(Some(lower), tree.find(&["US"]));
    }

    #[test]
    fn given_tree_when_iterating_preorder_then_parents_first_in_insertion_order() {
        let tree = sample();
        let labels: Vec<&str> = tree.iter().map(|(_, n)| n.data.label.as_str()).collect();
        assert_eq!(labels, vec!["Total", "US", "Equity", "Bond", "EU"]);
    }

    #[test]
    fn given_tree_when_iterating_postorder_then_children_first() {
        let tree = sample();
        let labels: Vec<&str> = tree
            .iter_postorder()
            .map(|(_, n)| n.data.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Equity", "Bond", "US", "EU", "Total"]);
    }

    #[test]
    fn given_node_when_building_path_then_excludes_root() {
        let tree = sample();
        let bond = tree.find(&["US", "Bond"]).unwrap();
        assert_eq!(tree.path(bond), vec!["US", "Bond"]);
        assert_eq!(tree.get_node(bond).unwrap().depth, 2);
        assert!(tree.path(tree.root()).is_empty());
    }

    #[test]
    fn given_tree_when_computing_depth_and_leaves_then_counts_root_level() {
        let tree = sample();
        assert_eq!(tree.depth(), 3);
        let leaves = tree.leaf_nodes();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[2], vec!["EU".to_string()]);
    }

    #[test]
    fn given_leaf_when_removing_then_detaches_from_parent() {
        let mut tree = sample();
        let eu = tree.find(&["EU"]).unwrap();
        let removed = tree.remove_leaf(eu).unwrap();
        assert_eq!(removed.label, "EU");
        assert!(tree.find(&["EU"]).is_none());
        assert_eq!(tree.root_node().children.len(), 1);
    }

    #[test]
    fn given_inner_node_or_root_when_removing_then_refuses() {
        let mut tree = sample();
        let us = tree.find(&["US"]).unwrap();
        assert!(tree.remove_leaf(us).is_none());
        let root = tree.root();
        assert!(tree.remove_leaf(root).is_none());
    }

    #[test]
    fn given_new_tree_when_inspecting_then_root_only() {
        let tree = TreeArena::new("Total", 3);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_node().data.value, 0.0);
        assert!(tree.leaf_nodes().is_empty());
    }
}
