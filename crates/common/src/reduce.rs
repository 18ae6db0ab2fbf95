//! Detailed report -> flattened report reduction

use crate::types::{DetailedReport, FlattenedReport, FlattenedRow, GroupResults, Verdict};

/// Reduce every group to a single verdict, in label order.
pub fn flatten(report: &DetailedReport) -> FlattenedReport {
    // BTreeMap iteration is already label-sorted
    let rows = report
        .groups
        .iter()
        .map(|(label, tests)| FlattenedRow::new(label.clone(), group_verdict(tests)))
        .collect();
    FlattenedReport::from_rows(rows)
}

/// Common outcome if every sub-test agrees, `DIFF` when they do not,
/// `EMPTY` for a group without sub-tests.
pub fn group_verdict(tests: &GroupResults) -> Verdict {
    let mut outcomes = tests.values().map(|t| t.result);
    match outcomes.next() {
        None => Verdict::Empty,
        Some(first) => {
            if outcomes.all(|o| o == first) {
                Verdict::from(first)
            } else {
                Verdict::Diff
            }
        }
    }
}
