//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use itertools::Itertools;

use crate::application::services::RunSummary;
use crate::domain::tree_view::format_value;
use crate::domain::{Anomaly, TreeArena};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print failure status (red X, indented)
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// "EmptyLabel=2, InvalidWeight=1"
pub fn rejection_tally(summary: &RunSummary) -> String {
    summary
        .by_kind
        .iter()
        .map(|(kind, count)| format!("{kind}={count}"))
        .join(", ")
}

/// One-line run summary to stderr, so stdout stays clean for data.
pub fn summary_line(summary: &RunSummary) {
    if summary.rejected_count() == 0 {
        eprintln!(
            "{} {} rows accepted, weight {}",
            "✓".green(),
            summary.accepted,
            format_value(summary.accepted_weight)
        );
    } else {
        warning(&format!(
            "{} of {} rows rejected ({})",
            summary.rejected_count(),
            summary.total_rows,
            rejection_tally(summary)
        ));
    }
}

/// "rings: 3, leaves: 4"; the root does not count as a ring.
pub fn tree_shape(tree: &TreeArena) -> String {
    format!(
        "rings: {}, leaves: {}",
        tree.depth().saturating_sub(1),
        tree.leaf_nodes().len()
    )
}

/// Full report for `check`.
pub fn report(summary: &RunSummary, tree: &TreeArena, anomalies: &[Anomaly]) {
    header("Rows");
    detail(&format!("total:    {}", summary.total_rows));
    detail(&format!("accepted: {}", summary.accepted));
    detail(&format!("weight:   {}", format_value(summary.accepted_weight)));
    detail(&format!("rejected: {}", summary.rejected_count()));

    header("Tree");
    detail(&tree_shape(tree));

    if !summary.rejected.is_empty() {
        header("Rejections");
        for rejection in &summary.rejected {
            failure(&format!("row {}: {}", rejection.row, rejection.reason));
        }
        detail(&rejection_tally(summary));
    }

    if !anomalies.is_empty() {
        header("Anomalies");
        for anomaly in anomalies {
            failure(anomaly);
        }
    }

    if summary.accepted > 0 && anomalies.is_empty() {
        success("ok");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CleanRecord, HierarchyBuilder, RejectionKind};

    #[test]
    fn given_rejections_when_tallying_then_sorted_by_kind() {
        let mut summary = RunSummary::default();
        summary.by_kind.insert(RejectionKind::InvalidWeight, 1);
        summary.by_kind.insert(RejectionKind::EmptyLabel, 2);

        assert_eq!(rejection_tally(&summary), "EmptyLabel=2, InvalidWeight=1");
    }

    #[test]
    fn given_built_tree_when_describing_shape_then_counts_rings_and_leaves() {
        let records = vec![
            CleanRecord::new(["US", "Equity"], 100.0),
            CleanRecord::new(["US", "Bond"], 50.0),
            CleanRecord::new(["EU", "Equity"], 30.0),
        ];
        let tree = HierarchyBuilder::build(2, &records).unwrap();

        assert_eq!(tree_shape(&tree), "rings: 2, leaves: 3");
    }

    #[test]
    fn given_empty_tree_when_describing_shape_then_zero_rings() {
        let tree = HierarchyBuilder::build(2, &Vec::<CleanRecord>::new()).unwrap();
        assert_eq!(tree_shape(&tree), "rings: 0, leaves: 0");
    }
}
