//! Ryu switch test tool output parser
//!
//! Rebuilds the group -> sub-test hierarchy from the tester's raw log in a
//! single forward scan. Layout of the log:
//!
//! ```text
//! match: 00_ip_src                                 <- group header
//! /flow/match(ip_src=1)/add-->'ok' OK              <- sub-test result
//! Reconnecting...                                  <- noise
//! /flow/match(ip_src=2)/add-->'bad' ERROR          <- failing sub-test
//! switch rejected                                  <- explanation of the ERROR above
//! Test end                                         <- terminator
//! ```

use tracing::{debug, warn};

use crate::classify::{self, classify, Line};
use crate::error::{Error, Result};
use crate::types::{DetailedReport, GroupResults, Outcome, SubTestResult};

/// Scanner state between lines
#[derive(Debug)]
enum ParseState {
    /// No group header seen yet
    Scanning,
    /// Accumulating results for the most recently opened group
    InGroup { label: String, tests: GroupResults },
}

/// Streaming parser over numbered raw lines
pub struct RyuParser {
    state: ParseState,
    report: DetailedReport,
}

impl Default for RyuParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RyuParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::Scanning,
            report: DetailedReport::new(),
        }
    }

    /// Parse a whole raw log
    pub fn parse(self, raw: &str) -> Result<DetailedReport> {
        self.parse_lines(raw.lines())
    }

    /// Parse an ordered sequence of raw lines
    pub fn parse_lines<'a, I>(mut self, lines: I) -> Result<DetailedReport>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = lines
            .into_iter()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line));

        while let Some((number, line)) = lines.next() {
            match classify(line) {
                Line::Terminator => {
                    debug!("Terminator at line {}", number);
                    break;
                }
                Line::Header { category, name } => {
                    self.open_group(Line::group_label(category, name));
                }
                Line::Result {
                    address,
                    payload,
                    outcome,
                } => {
                    let result = match outcome {
                        Outcome::Ok => SubTestResult::ok(classify::strip_padding(payload)),
                        _ => {
                            let explanation = take_explanation(&mut lines, number, line)?;
                            SubTestResult {
                                result: outcome,
                                detail: format!(
                                    "{}. {}",
                                    explanation,
                                    classify::strip_padding(payload)
                                ),
                            }
                        }
                    };
                    self.record(number, line, address, result)?;
                }
                Line::Noise => {
                    if classify::is_unrecognized_result(line) {
                        warn!("Line {}: no outcome marker, skipping: {}", number, line.trim());
                    }
                }
            }
        }

        self.commit();
        Ok(self.report)
    }

    fn open_group(&mut self, label: String) {
        self.commit();
        debug!("Opening test group {}", label);
        self.state = ParseState::InGroup {
            label,
            tests: GroupResults::new(),
        };
    }

    fn record(&mut self, number: usize, line: &str, address: &str, result: SubTestResult) -> Result<()> {
        match &mut self.state {
            ParseState::Scanning => Err(Error::malformed(
                number,
                line,
                "result line before any test group header",
            )),
            ParseState::InGroup { tests, .. } => {
                tests.insert(address.to_string(), result);
                Ok(())
            }
        }
    }

    fn commit(&mut self) {
        if let ParseState::InGroup { label, tests } =
            std::mem::replace(&mut self.state, ParseState::Scanning)
        {
            if self.report.insert_group(label.clone(), tests).is_some() {
                warn!("Test group {} appears more than once; keeping the later one", label);
            }
        }
    }
}

/// Consume the explanation line that follows an ERROR result
fn take_explanation<'a, I>(lines: &mut I, number: usize, line: &str) -> Result<String>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    match lines.next() {
        Some((_, next)) => Ok(classify::strip_padding(next.trim()).to_string()),
        None => Err(Error::malformed(
            number,
            line,
            "log ends before the explanation of an ERROR result",
        )),
    }
}

/// Convenience wrapper around [`RyuParser`]
pub fn parse_ryu_log(raw: &str) -> Result<DetailedReport> {
    RyuParser::new().parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_ok_result() {
        let raw = "match: 00_ip_src\n/flow/match(ip_src=1)/add-->'ok' OK\nTest end\n";
        let report = parse_ryu_log(raw).unwrap();

        assert_eq!(report.len(), 1);
        let group = report.group("mat ip_src").unwrap();
        assert_eq!(
            group.get("/flow/match(ip_src=1)/add"),
            Some(&SubTestResult::ok("ok"))
        );
    }

    #[test]
    fn test_error_result_takes_next_line() {
        let raw = "action: 01_output\n/flow/act/output-->'bad' ERROR\nswitch rejected\nTest end\n";
        let report = parse_ryu_log(raw).unwrap();

        let result = &report.group("act output").unwrap()["/flow/act/output"];
        assert_eq!(result.result, Outcome::Error);
        assert_eq!(result.detail, "switch rejected. bad");
    }

    #[test]
    fn test_explanation_line_is_not_classified() {
        // The explanation looks like a header but belongs to the ERROR above it
        let raw = "match: 00_a\n/x-->'bad' ERROR\nmatch: quoted\n/y-->'ok' OK\n";
        let report = parse_ryu_log(raw).unwrap();

        assert_eq!(report.len(), 1);
        let group = report.group("mat a").unwrap();
        assert_eq!(group["/x"].detail, "match: quoted. bad");
        assert_eq!(group["/y"].result, Outcome::Ok);
    }

    #[test]
    fn test_noise_is_skipped() {
        let raw = "\
--- Test start ---
match: 00_in_port

Reconnecting to switch...
/flow/match(in_port=1)-->'ok' OK
  dpid=0000000000000001 : Join target SW.
/flow/match(in_port=2)-->'still waiting'
Test end";
        let report = parse_ryu_log(raw).unwrap();
        let group = report.group("mat in_port").unwrap();
        assert_eq!(group.len(), 1);
        assert!(group.contains_key("/flow/match(in_port=1)"));
    }

    #[test]
    fn test_lines_after_terminator_ignored() {
        let raw = "match: 00_a\n/x-->'ok' OK\nTest end\nmatch: 01_b\n/y-->'ok' OK\n";
        let report = parse_ryu_log(raw).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.group("mat b").is_none());
    }

    #[test]
    fn test_missing_terminator_still_commits() {
        let raw = "meter: 00_drop\n/m/1-->'ok' OK\n/m/2-->'ok' OK";
        let report = parse_ryu_log(raw).unwrap();
        assert_eq!(report.group("mtr drop").unwrap().len(), 2);
    }

    #[test]
    fn test_result_before_header_is_fatal() {
        let raw = "banner\n/flow/x-->'ok' OK\nmatch: 00_a\nTest end\n";
        match parse_ryu_log(raw) {
            Err(Error::MalformedReport { line, content, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "/flow/x-->'ok' OK");
            }
            other => panic!("expected malformed report, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_error_is_fatal() {
        let raw = "match: 00_a\n/x-->'bad' ERROR";
        assert!(matches!(
            parse_ryu_log(raw),
            Err(Error::MalformedReport { line: 2, .. })
        ));
    }

    #[test]
    fn test_repeated_address_overwrites_within_group() {
        let raw = "match: 00_a\n/x-->'first' OK\n/x-->'second' ERROR\nretry failed\n";
        let report = parse_ryu_log(raw).unwrap();
        let group = report.group("mat a").unwrap();
        assert_eq!(group.len(), 1);
        assert_eq!(group["/x"], SubTestResult::error("retry failed. second"));
    }

    #[test]
    fn test_repeated_group_label_replaces_earlier_group() {
        let raw = "\
match: 00_ip_src
/first-->'ok' OK
action: 01_output
/out-->'ok' OK
match: 07_ip_src
/second-->'ok' OK
Test end";
        let report = parse_ryu_log(raw).unwrap();
        let group = report.group("mat ip_src").unwrap();
        assert_eq!(group.len(), 1);
        assert!(group.contains_key("/second"));
        assert!(!group.contains_key("/first"));
    }

    #[test]
    fn test_header_without_results_is_kept_empty() {
        let raw = "group: 00_ALL\ngroup: 01_SELECT\n/g-->'ok' OK\nTest end";
        let report = parse_ryu_log(raw).unwrap();
        assert!(report.group("grp ALL").unwrap().is_empty());
        assert_eq!(report.group("grp SELECT").unwrap().len(), 1);
    }

    #[test]
    fn test_parse_lines_accepts_line_sequence() {
        let lines = vec!["action: set_field: 00_eth_dst", "/sf-->'ok' OK", "Test end"];
        let report = RyuParser::new().parse_lines(lines).unwrap();
        assert!(report.group("asf eth_dst").is_some());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_ryu_log("").unwrap().is_empty());
    }
}
