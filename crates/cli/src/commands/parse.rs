//! Parse Command
//!
//! Replays stored tester output through the parser and reducer. Nothing is
//! written to the artifact store.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde_json::json;

use switchtest_common::{flatten, parse_ryu_log, parse_xunit_dir, DetailedReport, Error};

use crate::output::{detail_rows, print_flattened, print_list, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum TesterKind {
    /// Raw Ryu switch test tool log
    #[default]
    Ryu,
    /// Directory of OFTest xunit files
    Oftest,
}

#[derive(Args)]
pub struct ParseArgs {
    /// Raw Ryu log, or OFTest xunit directory
    pub input: PathBuf,

    /// Tester that produced the input
    #[arg(long, value_enum, default_value_t = TesterKind::Ryu)]
    pub tester: TesterKind,
}

pub fn parse_input(args: &ParseArgs) -> Result<DetailedReport> {
    let report = match args.tester {
        TesterKind::Ryu => {
            if !args.input.is_file() {
                return Err(Error::not_found("Raw log", &args.input).into());
            }
            parse_ryu_log(&std::fs::read_to_string(&args.input)?)?
        }
        TesterKind::Oftest => parse_xunit_dir(&args.input)?,
    };
    Ok(report)
}

pub fn execute(args: ParseArgs, format: OutputFormat) -> Result<()> {
    let detailed = parse_input(&args)?;
    let flattened = flatten(&detailed);

    if format == OutputFormat::Json {
        let output = json!({ "detailed": detailed, "flattened": flattened });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_list(&detail_rows(&detailed), format);
    println!();
    print_flattened(&flattened, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_ryu_input() {
        let tmp = TempDir::new().unwrap();
        let log = tmp.path().join("ovs.ryu");
        std::fs::write(&log, "match: 00_ip_src\n/m-->'ok' OK\nTest end\n").unwrap();

        let report = parse_input(&ParseArgs {
            input: log,
            tester: TesterKind::Ryu,
        })
        .unwrap();
        assert!(report.group("mat ip_src").is_some());
    }

    #[test]
    fn test_missing_raw_log_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = parse_input(&ParseArgs {
            input: tmp.path().join("absent.ryu"),
            tester: TesterKind::Ryu,
        })
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::NotFound { .. })
        ));
    }
}
