//! OFTest xunit report parser
//!
//! `oft --xunit --xunit-dir=DIR` writes one JUnit-style XML file per test
//! module. Each `<testcase classname=".." name="..">` becomes a sub-test
//! named `name` inside the group `classname`, so OFTest results flow
//! through the same reducer and judge as Ryu results.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{DetailedReport, GroupResults, Outcome, SubTestResult};

/// Detail recorded for a passing test case
pub const NO_DETAIL: &str = "none";

static TESTCASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<testcase\b([^>]*?)\s*(?:/>|>(.*?)</testcase\s*>)").expect("valid regex")
});

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

static PROBLEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(error|failure)\b([^>]*)").expect("valid regex"));

/// Parse one xunit document into an existing report
pub fn parse_xunit_into(xml: &str, report: &mut DetailedReport) -> Result<()> {
    for caps in TESTCASE.captures_iter(xml) {
        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        let classname = attribute(attrs, "classname").ok_or_else(|| {
            Error::malformed(line_of(xml, whole), whole, "testcase without classname")
        })?;
        let name = attribute(attrs, "name").unwrap_or_else(|| classname.clone());

        let result = match PROBLEM.captures(body) {
            Some(problem) => {
                let outcome = match &problem[1] {
                    "failure" => Outcome::Fail,
                    _ => Outcome::Error,
                };
                let detail = attribute(&problem[2], "message").unwrap_or_else(|| NO_DETAIL.to_string());
                SubTestResult {
                    result: outcome,
                    detail,
                }
            }
            None => SubTestResult::ok(NO_DETAIL),
        };

        report
            .groups
            .entry(classname)
            .or_insert_with(GroupResults::new)
            .insert(name, result);
    }
    Ok(())
}

/// Parse a single xunit document
pub fn parse_xunit(xml: &str) -> Result<DetailedReport> {
    let mut report = DetailedReport::new();
    parse_xunit_into(xml, &mut report)?;
    Ok(report)
}

/// Parse every `*.xml` file below `dir`, in path order
pub fn parse_xunit_dir(dir: &Path) -> Result<DetailedReport> {
    if !dir.is_dir() {
        return Err(Error::not_found("OFTest xunit directory", dir));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map(|ext| ext == "xml").unwrap_or(false))
        .collect();
    files.sort();

    let mut report = DetailedReport::new();
    for path in &files {
        debug!("Parsing xunit file {}", path.display());
        let xml = std::fs::read_to_string(path)?;
        parse_xunit_into(&xml, &mut report)?;
    }
    Ok(report)
}

fn attribute(attrs: &str, key: &str) -> Option<String> {
    ATTRIBUTE
        .captures_iter(attrs)
        .find(|c| &c[1] == key)
        .and_then(|c| c.get(2).or_else(|| c.get(3)))
        .map(|m| unescape(m.as_str()))
}

fn line_of(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .map(|idx| haystack[..idx].matches('\n').count() + 1)
        .unwrap_or(0)
}

/// Decode the predefined XML entities and numeric character references
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse().ok()))
                    .flatten()
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
