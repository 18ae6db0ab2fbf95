//! Line classification for Ryu switch test tool output
//!
//! The tester interleaves group headers, per-test result lines and
//! free-form chatter (reconnects, banners). Each trimmed line maps to
//! exactly one [`Line`] variant.

use crate::types::Outcome;

/// Separates the test address from the response payload
pub const ARROW: &str = "-->";

/// Emitted once all tests have run
pub const TERMINATOR: &str = "Test end";

const OK_MARKER: &str = "OK";
const ERROR_MARKER: &str = "ERROR";

/// Header prefixes and their abbreviations.
///
/// Order matters: `action: set_field:` is itself prefixed by `action:`.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("action: set_field:", "asf"),
    ("action:", "act"),
    ("group", "grp"),
    ("match:", "mat"),
    ("meter:", "mtr"),
];

/// A classified line of tester output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Start of a new test group
    Header { category: &'static str, name: &'a str },
    /// A single sub-test result
    Result {
        address: &'a str,
        payload: &'a str,
        outcome: Outcome,
    },
    /// End of the test run
    Terminator,
    /// Anything else
    Noise,
}

impl<'a> Line<'a> {
    /// Group label used as the detailed report key
    pub fn group_label(category: &str, name: &str) -> String {
        format!("{} {}", category, name)
    }
}

/// Classify one line. Leading and trailing whitespace is ignored.
pub fn classify(line: &str) -> Line<'_> {
    let line = line.trim();

    if let Some((category, name)) = header(line) {
        return Line::Header { category, name };
    }

    if line.contains(TERMINATOR) {
        return Line::Terminator;
    }

    if let Some(idx) = line.find(ARROW) {
        let address = line[..idx].trim();
        let rest = &line[idx + ARROW.len()..];
        for (marker, outcome) in [(ERROR_MARKER, Outcome::Error), (OK_MARKER, Outcome::Ok)] {
            if let Some(payload) = rest.strip_suffix(marker) {
                return Line::Result {
                    address,
                    payload,
                    outcome,
                };
            }
        }
    }

    Line::Noise
}

/// True when the line carries an arrow but no recognizable outcome marker
pub fn is_unrecognized_result(line: &str) -> bool {
    let line = line.trim();
    line.contains(ARROW) && matches!(classify(line), Line::Noise)
}

fn header(line: &str) -> Option<(&'static str, &str)> {
    CATEGORIES.iter().find_map(|(prefix, abbrev)| {
        line.strip_prefix(prefix)
            .map(|suffix| (*abbrev, display_name(suffix.trim())))
    })
}

/// Drop the `NN_` ordinal from a header suffix like `00_ip_src`.
fn display_name(suffix: &str) -> &str {
    match suffix.find('_') {
        Some(idx) => suffix[idx + 1..].trim(),
        None => suffix,
    }
}

/// Strip the quote and space padding around a payload or detail line
pub fn strip_padding(s: &str) -> &str {
    s.trim_matches(|c| c == '\'' || c == ' ')
}
