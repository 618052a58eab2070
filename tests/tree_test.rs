//! Tests for HierarchyBuilder + Finalizer on the arena tree

use sunburst::domain::{
    Anomaly, CleanRecord, Finalizer, HierarchyBuilder, TreeArena, TreeNodeConvert,
};

fn holdings() -> Vec<CleanRecord> {
    vec![
        CleanRecord::new(["台灣", "股票", "2330 台積電"], 1_250_000.0),
        CleanRecord::new(["台灣", "股票", "0050 元大台灣50"], 300_000.0),
        CleanRecord::new(["美國", "ETF", "VTI"], 980_000.0),
        CleanRecord::new(["美國", "債券", "BND"], 120_000.0),
    ]
}

// ============================================================
// Structure
// ============================================================

#[test]
fn given_three_levels_when_building_then_depth_counts_root() {
    let tree = HierarchyBuilder::build(3, &holdings()).unwrap();
    assert_eq!(tree.depth(), 4);
    assert_eq!(tree.leaf_nodes().len(), 4);
    assert!(tree
        .leaf_nodes()
        .contains(&vec!["美國".to_string(), "ETF".to_string(), "VTI".to_string()]));
}

#[test]
fn given_built_tree_when_finalizing_then_no_anomalies() {
    let tree = HierarchyBuilder::build(3, &holdings()).unwrap();
    let (finalized, anomalies) = Finalizer::default().finalize(tree).unwrap();

    assert!(anomalies.is_empty());
    assert_eq!(finalized.root_value(), 2_650_000.0);
}

#[test]
fn given_finalized_tree_when_rendering_then_largest_branch_first() {
    let tree = HierarchyBuilder::build(3, &holdings()).unwrap();
    let (finalized, _) = Finalizer::default().finalize(tree).unwrap();

    let rendered = finalized.to_tree_string().to_string();
    let lines: Vec<&str> = rendered.lines().collect();

    assert_eq!(lines[0], "Total 2650000");
    assert!(lines[1].contains("台灣 1550000"));
    assert!(lines[2].contains("股票 1550000"));
    assert!(lines[3].contains("2330 台積電 1250000"));
    assert!(rendered.contains("美國 1100000"));
}

// ============================================================
// Anomalies
// ============================================================

fn tampered() -> TreeArena {
    let mut tree = HierarchyBuilder::build(2, &[CleanRecord::new(["US", "Equity"], 10.0)]).unwrap();
    let us = tree.find(&["US"]).unwrap();
    tree.get_node_mut(us).unwrap().data.value = 99.0;
    tree
}

#[test]
fn given_tampered_branch_when_finalizing_then_recomputed_value_wins() {
    let (finalized, anomalies) = Finalizer::default().finalize(tampered()).unwrap();

    assert_eq!(finalized.root_value(), 10.0);
    assert!(anomalies
        .iter()
        .any(|a| matches!(a, Anomaly::InternalConsistency { path, .. } if path == &vec!["US".to_string()])));
}

#[test]
fn given_zero_branch_without_leaves_when_finalizing_then_dangling_removed() {
    let mut tree = HierarchyBuilder::build(2, &[CleanRecord::new(["US", "Equity"], 10.0)]).unwrap();
    let root = tree.root();
    tree.child_or_insert(root, "EU").unwrap();

    let (finalized, anomalies) = Finalizer::default().finalize(tree).unwrap();

    assert!(finalized.tree().find(&["EU"]).is_none());
    assert!(anomalies
        .iter()
        .any(|a| matches!(a, Anomaly::DanglingBranch { depth: 1, .. })));
}
