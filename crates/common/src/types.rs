//! Core types for SwitchTester reports

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome of a single sub-test as reported by a tester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Ok,
    Error,
    /// Assertion failure. Only OFTest distinguishes this from `Error`.
    Fail,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "OK",
            Outcome::Error => "ERROR",
            Outcome::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one sub-test: its outcome plus the tester's explanation
///
/// Fields are declared in key order so the detailed report stays sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTestResult {
    pub detail: String,
    pub result: Outcome,
}

impl SubTestResult {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            result: Outcome::Ok,
            detail: detail.into(),
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            result: Outcome::Error,
            detail: detail.into(),
        }
    }
}

/// Sub-tests of one group, keyed by the tester's test address
pub type GroupResults = BTreeMap<String, SubTestResult>;

/// Detailed report: group label -> test address -> result
///
/// Both levels are ordered maps so serialization always emits sorted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailedReport {
    pub groups: BTreeMap<String, GroupResults>,
}

impl DetailedReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a group, returning the results it replaced if the label was
    /// already present.
    pub fn insert_group(&mut self, label: String, tests: GroupResults) -> Option<GroupResults> {
        self.groups.insert(label, tests)
    }

    pub fn group(&self, label: &str) -> Option<&GroupResults> {
        self.groups.get(label)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of sub-tests across every group
    pub fn sub_test_count(&self) -> usize {
        self.groups.values().map(|g| g.len()).sum()
    }
}

/// One verdict per group, after reduction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Ok,
    Error,
    Fail,
    /// Sub-tests disagree
    Diff,
    /// Group header seen but no sub-test results followed
    Empty,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Error => "ERROR",
            Verdict::Fail => "FAIL",
            Verdict::Diff => "DIFF",
            Verdict::Empty => "EMPTY",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Ok)
    }
}

impl From<Outcome> for Verdict {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Ok => Verdict::Ok,
            Outcome::Error => Verdict::Error,
            Outcome::Fail => Verdict::Fail,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "OK" => Ok(Verdict::Ok),
            "ERROR" => Ok(Verdict::Error),
            "FAIL" => Ok(Verdict::Fail),
            "DIFF" => Ok(Verdict::Diff),
            "EMPTY" => Ok(Verdict::Empty),
            other => Err(format!("unknown verdict {:?}", other)),
        }
    }
}

/// A single row of the flattened report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedRow {
    pub label: String,
    pub verdict: Verdict,
}

impl FlattenedRow {
    pub fn new(label: impl Into<String>, verdict: Verdict) -> Self {
        Self {
            label: label.into(),
            verdict,
        }
    }
}

/// Flattened report: one row per group, in table order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlattenedReport {
    pub rows: Vec<FlattenedRow>,
}

impl FlattenedReport {
    pub fn from_rows(rows: Vec<FlattenedRow>) -> Self {
        Self { rows }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlattenedRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// PASS/FAIL for a switch against a compatibility profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JudgementVerdict {
    Pass,
    Fail,
}

impl fmt::Display for JudgementVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JudgementVerdict::Pass => f.write_str("PASSED"),
            JudgementVerdict::Fail => f.write_str("FAILED"),
        }
    }
}

/// Outcome of judging a flattened report against a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgement {
    pub profile: String,
    pub verdict: JudgementVerdict,
    /// Required groups that were tested but did not come out OK
    pub failures: Vec<FlattenedRow>,
    /// Required groups absent from the flattened report
    pub not_found: Vec<String>,
}

impl Judgement {
    pub fn passed(&self) -> bool {
        self.verdict == JudgementVerdict::Pass
    }
}
