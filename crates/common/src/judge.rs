//! Judge a flattened report against an application compatibility profile

use tracing::debug;

use crate::config::Profile;
use crate::types::{FlattenedReport, FlattenedRow, Judgement, JudgementVerdict};

/// Judge `report` against `profile`.
///
/// Rows are scanned in table order. Every required label lands in exactly
/// one of: matched OK, `failures`, or `not_found`.
pub fn judge(report: &FlattenedReport, profile: &Profile) -> Judgement {
    let mut remaining = profile.compatibility.clone();
    let mut failures = Vec::new();

    for row in report.iter() {
        if let Some(pos) = remaining.iter().position(|label| *label == row.label) {
            remaining.remove(pos);
            if !row.verdict.is_ok() {
                debug!("Required group {} is {}", row.label, row.verdict);
                failures.push(FlattenedRow::new(row.label.clone(), row.verdict));
            }
        }
    }

    let verdict = if failures.is_empty() && remaining.is_empty() {
        JudgementVerdict::Pass
    } else {
        JudgementVerdict::Fail
    };

    Judgement {
        profile: profile.name.clone(),
        verdict,
        failures,
        not_found: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Verdict;

    fn table(rows: &[(&str, Verdict)]) -> FlattenedReport {
        FlattenedReport::from_rows(rows.iter().map(|(l, v)| FlattenedRow::new(*l, *v)).collect())
    }

    fn profile(labels: &[&str]) -> Profile {
        Profile::new("app", labels.iter().map(|l| l.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_missing_label_fails() {
        let judgement = judge(
            &table(&[("mat ip_src", Verdict::Ok)]),
            &profile(&["mat ip_src", "grp foo"]),
        );
        assert_eq!(judgement.verdict, JudgementVerdict::Fail);
        assert!(judgement.failures.is_empty());
        assert_eq!(judgement.not_found, vec!["grp foo".to_string()]);
    }

    #[test]
    fn test_all_ok_passes() {
        let judgement = judge(&table(&[("mat ip_src", Verdict::Ok)]), &profile(&["mat ip_src"]));
        assert!(judgement.passed());
        assert_eq!(judgement.profile, "app");
    }

    #[test]
    fn test_non_ok_rows_are_failures() {
        let judgement = judge(
            &table(&[
                ("act output", Verdict::Diff),
                ("grp all", Verdict::Empty),
                ("mat ip_src", Verdict::Error),
                ("mtr drop", Verdict::Ok),
            ]),
            &profile(&["mat ip_src", "act output", "grp all"]),
        );
        assert!(!judgement.passed());
        assert_eq!(
            judgement.failures,
            vec![
                FlattenedRow::new("act output", Verdict::Diff),
                FlattenedRow::new("grp all", Verdict::Empty),
                FlattenedRow::new("mat ip_src", Verdict::Error),
            ]
        );
        assert!(judgement.not_found.is_empty());
    }

    #[test]
    fn test_unrequired_failures_are_ignored() {
        let judgement = judge(
            &table(&[("act output", Verdict::Error), ("mat ip_src", Verdict::Ok)]),
            &profile(&["mat ip_src"]),
        );
        assert!(judgement.passed());
    }

    #[test]
    fn test_duplicate_rows_count_once() {
        let judgement = judge(
            &table(&[("mat ip_src", Verdict::Ok), ("mat ip_src", Verdict::Error)]),
            &profile(&["mat ip_src"]),
        );
        assert!(judgement.passed());
    }

    #[test]
    fn test_every_required_label_accounted_once() {
        let report = table(&[
            ("a", Verdict::Ok),
            ("b", Verdict::Error),
            ("c", Verdict::Diff),
            ("x", Verdict::Ok),
        ]);
        let required = ["a", "b", "c", "d", "e"];
        let judgement = judge(&report, &profile(&required));

        for label in required {
            let passed = report.iter().any(|r| r.label == label && r.verdict.is_ok());
            let failed = judgement.failures.iter().filter(|r| r.label == label).count();
            let missing = judgement.not_found.iter().filter(|l| *l == label).count();
            assert_eq!(passed as usize + failed + missing, 1, "label {}", label);
        }
    }

    #[test]
    fn test_empty_profile_passes() {
        assert!(judge(&FlattenedReport::default(), &profile(&[])).passed());
    }
}
