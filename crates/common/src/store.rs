//! Per-switch report artifacts on disk
//!
//! ```text
//! <directory>/<model>/
//!   <model>.<ext>     raw tester output (ryu / oft)
//!   <model>.json      detailed report
//!   <model>.csv       flattened report
//!   oftest-xml/       OFTest xunit files
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{DetailedReport, FlattenedReport, FlattenedRow};

/// Root of the working directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Artifacts for one switch model, without touching the filesystem
    pub fn switch(&self, model: &str, raw_extension: &str) -> SwitchArtifacts {
        SwitchArtifacts {
            dir: self.root.join(model),
            model: model.to_string(),
            raw_extension: raw_extension.to_string(),
        }
    }
}

/// Which report stages have to be (re)built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePlan {
    pub run_tester: bool,
    pub build_detailed: bool,
    pub build_flattened: bool,
}

/// Paths of one switch model's artifacts
#[derive(Debug, Clone)]
pub struct SwitchArtifacts {
    dir: PathBuf,
    model: String,
    raw_extension: String,
}

impl SwitchArtifacts {
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn raw_path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.model, self.raw_extension))
    }

    pub fn detailed_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.model))
    }

    pub fn flattened_path(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", self.model))
    }

    pub fn xunit_dir(&self) -> PathBuf {
        self.dir.join("oftest-xml")
    }

    /// Create the model directory if needed
    pub fn ensure_dir(&self) -> Result<()> {
        create_dir(&self.dir)
    }

    /// Rename every existing report file to `<file>.bak`
    pub fn backup(&self) -> Result<Vec<PathBuf>> {
        let mut moved = Vec::new();
        for path in [self.raw_path(), self.detailed_path(), self.flattened_path()] {
            if path.exists() {
                let mut backup = path.clone().into_os_string();
                backup.push(".bak");
                let backup = PathBuf::from(backup);
                fs::rename(&path, &backup)?;
                debug!("Misc: Backed up {} as {}.", path.display(), backup.display());
                moved.push(backup);
            }
        }
        Ok(moved)
    }

    /// Decide which stages to run. A stage is rebuilt when its input was
    /// rebuilt or its own artifact is missing.
    pub fn plan(&self, force_test: bool) -> StagePlan {
        let run_tester = force_test || !self.raw_path().exists();
        let build_detailed = run_tester || !self.detailed_path().exists();
        let build_flattened = build_detailed || !self.flattened_path().exists();
        StagePlan {
            run_tester,
            build_detailed,
            build_flattened,
        }
    }

    /// Remove the reports a plan is about to rebuild, so a failed rebuild
    /// cannot leave the previous ones paired with a newer raw log.
    pub fn discard_scheduled(&self, plan: &StagePlan) -> Result<()> {
        let scheduled = [
            (plan.build_detailed, self.detailed_path()),
            (plan.build_flattened, self.flattened_path()),
        ];
        for (rebuild, path) in scheduled {
            if rebuild && path.exists() {
                fs::remove_file(&path)?;
                debug!("Main: Discarded stale {}.", path.display());
            }
        }
        Ok(())
    }

    pub fn write_raw(&self, raw: &str) -> Result<()> {
        fs::write(self.raw_path(), raw)?;
        debug!("Main: Raw log written to {}.", self.raw_path().display());
        Ok(())
    }

    pub fn read_raw(&self) -> Result<String> {
        read_required(&self.raw_path(), "Raw tester log")
    }

    pub fn write_detailed(&self, report: &DetailedReport) -> Result<()> {
        let path = self.detailed_path();
        debug!("Main: Saving detailed results to {}.", path.display());
        fs::write(&path, to_ascii_json(report)?)?;
        debug!("Main: {} written successfully.", path.display());
        Ok(())
    }

    pub fn read_detailed(&self) -> Result<DetailedReport> {
        let json = read_required(&self.detailed_path(), "Detailed report")?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn write_flattened(&self, report: &FlattenedReport) -> Result<()> {
        let path = self.flattened_path();
        debug!("Main: Saving simplified results to {}.", path.display());
        fs::write(&path, to_csv(report))?;
        debug!("Main: {} written successfully", path.display());
        Ok(())
    }

    pub fn read_flattened(&self) -> Result<FlattenedReport> {
        let csv = read_required(&self.flattened_path(), "CSV result file")?;
        from_csv(&csv)
    }
}

fn read_required(path: &Path, kind: &str) -> Result<String> {
    if !path.exists() {
        return Err(Error::not_found(kind, path));
    }
    Ok(fs::read_to_string(path)?)
}

/// Create a directory tree, refusing to reuse a non-directory path
pub fn create_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        debug!("Misc: Creating directory {}", dir.display());
        fs::create_dir_all(dir)?;
        Ok(())
    } else if !dir.is_dir() {
        Err(Error::InvalidConfig(format!(
            "{} already exists, but is not a directory.",
            dir.display()
        )))
    } else {
        Ok(())
    }
}

/// Pretty JSON with 4-space indent and every non-ASCII character escaped
pub fn to_ascii_json<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    let pretty = String::from_utf8_lossy(&buf);

    // Non-ASCII can only occur inside string literals, where \u escapes are valid
    let mut out = String::with_capacity(pretty.len());
    for c in pretty.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    Ok(out)
}

/// Two-column CSV, quoting only fields that need it
pub fn to_csv(report: &FlattenedReport) -> String {
    let mut out = String::new();
    for row in report.iter() {
        out.push_str(&csv_field(&row.label));
        out.push(',');
        out.push_str(row.verdict.as_str());
        out.push_str("\r\n");
    }
    out
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Parse a flattened report written by [`to_csv`], keeping file order
pub fn from_csv(csv: &str) -> Result<FlattenedReport> {
    let mut rows = Vec::new();
    for (idx, record) in csv_records(csv).into_iter().enumerate() {
        let (line, fields) = record;
        if fields.len() == 1 && fields[0].is_empty() {
            continue;
        }
        if fields.len() != 2 {
            return Err(Error::malformed(
                line,
                fields.join(","),
                format!("expected 2 fields in row {}, found {}", idx + 1, fields.len()),
            ));
        }
        let verdict = fields[1]
            .parse()
            .map_err(|reason: String| Error::malformed(line, fields.join(","), reason))?;
        rows.push(FlattenedRow::new(fields[0].clone(), verdict));
    }
    Ok(FlattenedReport::from_rows(rows))
}

/// Split CSV text into records, tracking the line each record starts on.
/// Quoted fields may contain separators, doubled quotes and newlines.
fn csv_records(csv: &str) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut start_line = 1;
    let mut chars = csv.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => {
                    if c == '\n' {
                        line += 1;
                    }
                    field.push(c);
                }
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push((start_line, std::mem::take(&mut fields)));
                line += 1;
                start_line = line;
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push((start_line, fields));
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupResults, SubTestResult, Verdict};
    use tempfile::TempDir;

    fn artifacts(tmp: &TempDir) -> SwitchArtifacts {
        let artifacts = ArtifactStore::new(tmp.path()).switch("pica8", "ryu");
        artifacts.ensure_dir().unwrap();
        artifacts
    }

    #[test]
    fn test_paths() {
        let store = ArtifactStore::new("/work");
        let a = store.switch("pica8", "ryu");
        assert_eq!(a.raw_path(), PathBuf::from("/work/pica8/pica8.ryu"));
        assert_eq!(a.detailed_path(), PathBuf::from("/work/pica8/pica8.json"));
        assert_eq!(a.flattened_path(), PathBuf::from("/work/pica8/pica8.csv"));
        assert_eq!(a.xunit_dir(), PathBuf::from("/work/pica8/oftest-xml"));
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("pica8"), "not a dir").unwrap();
        let a = ArtifactStore::new(tmp.path()).switch("pica8", "ryu");
        assert!(matches!(a.ensure_dir(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_plan_follows_missing_artifacts() {
        let tmp = TempDir::new().unwrap();
        let a = artifacts(&tmp);

        assert_eq!(
            a.plan(false),
            StagePlan { run_tester: true, build_detailed: true, build_flattened: true }
        );

        a.write_raw("Test end").unwrap();
        fs::write(a.detailed_path(), "{}").unwrap();
        assert_eq!(
            a.plan(false),
            StagePlan { run_tester: false, build_detailed: false, build_flattened: true }
        );

        fs::write(a.flattened_path(), "").unwrap();
        assert_eq!(
            a.plan(false),
            StagePlan { run_tester: false, build_detailed: false, build_flattened: false }
        );
        assert_eq!(
            a.plan(true),
            StagePlan { run_tester: true, build_detailed: true, build_flattened: true }
        );

        fs::remove_file(a.detailed_path()).unwrap();
        assert_eq!(
            a.plan(false),
            StagePlan { run_tester: false, build_detailed: true, build_flattened: true }
        );
    }

    #[test]
    fn test_discard_scheduled_removes_only_rebuilt_reports() {
        let tmp = TempDir::new().unwrap();
        let a = ArtifactStore::new(tmp.path()).switch("ovs", "ryu");
        a.ensure_dir().unwrap();
        a.write_raw("Test end").unwrap();
        fs::write(a.detailed_path(), "{}").unwrap();
        fs::write(a.flattened_path(), "x,OK\r\n").unwrap();

        a.discard_scheduled(&a.plan(false)).unwrap();
        assert!(a.detailed_path().exists());
        assert!(a.flattened_path().exists());

        a.discard_scheduled(&a.plan(true)).unwrap();
        assert!(a.raw_path().exists());
        assert!(!a.detailed_path().exists());
        assert!(!a.flattened_path().exists());
    }

    #[test]
    fn test_backup_renames_existing() {
        let tmp = TempDir::new().unwrap();
        let a = artifacts(&tmp);
        a.write_raw("raw").unwrap();
        fs::write(a.flattened_path(), "x,OK\r\n").unwrap();

        let moved = a.backup().unwrap();
        assert_eq!(moved.len(), 2);
        assert!(!a.raw_path().exists());
        assert!(a.dir().join("pica8.ryu.bak").exists());
        assert!(a.dir().join("pica8.csv.bak").exists());
        assert!(a.plan(false).run_tester);
    }

    #[test]
    fn test_detailed_json_is_ascii_and_sorted() {
        let tmp = TempDir::new().unwrap();
        let a = artifacts(&tmp);

        let mut report = DetailedReport::new();
        let mut tests = GroupResults::new();
        tests.insert("/z".into(), SubTestResult::ok("caf\u{e9} \u{1F600}"));
        tests.insert("/a".into(), SubTestResult::ok("ok"));
        report.insert_group("mat ip_src".into(), tests);
        a.write_detailed(&report).unwrap();

        let text = fs::read_to_string(a.detailed_path()).unwrap();
        assert!(text.is_ascii());
        assert!(text.contains("caf\\u00e9 \\ud83d\\ude00"));
        assert!(text.find("\"/a\"").unwrap() < text.find("\"/z\"").unwrap());
        assert!(text.contains("\n        \"/a\""));

        assert_eq!(a.read_detailed().unwrap(), report);
    }

    #[test]
    fn test_csv_quoting() {
        let report = FlattenedReport::from_rows(vec![
            FlattenedRow::new("mat ip_src", Verdict::Ok),
            FlattenedRow::new("basic, \"quoted\"", Verdict::Diff),
        ]);
        let csv = to_csv(&report);
        assert_eq!(csv, "mat ip_src,OK\r\n\"basic, \"\"quoted\"\"\",DIFF\r\n");
        assert_eq!(from_csv(&csv).unwrap(), report);
    }

    #[test]
    fn test_csv_keeps_file_order() {
        let report = from_csv("mtr drop,OK\nact output,ERROR\n").unwrap();
        let labels: Vec<&str> = report.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["mtr drop", "act output"]);
    }

    #[test]
    fn test_csv_rejects_bad_rows() {
        assert!(matches!(
            from_csv("a,OK\nb\n"),
            Err(Error::MalformedReport { line: 2, .. })
        ));
        assert!(matches!(
            from_csv("a,PASSED\n"),
            Err(Error::MalformedReport { line: 1, .. })
        ));
    }

    #[test]
    fn test_read_flattened_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let a = artifacts(&tmp);
        assert!(matches!(a.read_flattened(), Err(Error::NotFound { .. })));
    }
}
