//! Ryu switch test tool runner (OpenFlow 1.3)
//!
//! Drives `ryu-manager` with the switch test tool application. Results are
//! written to stderr; the run is over once the terminator line appears.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use switchtest_common::classify::TERMINATOR;
use switchtest_common::config::{RyuSettings, RyuTarget};
use switchtest_common::{parse_ryu_log, DetailedReport, Error, Result, SwitchArtifacts};

use super::process::{terminate, CommandLine};
use super::Tester;

pub struct RyuTester {
    settings: RyuSettings,
    target: RyuTarget,
}

impl RyuTester {
    pub fn new(settings: RyuSettings, target: RyuTarget) -> Self {
        Self { settings, target }
    }

    pub fn command_line(&self) -> CommandLine {
        let test_dir = self.settings.switch_test_dir();
        CommandLine::new(&self.settings.manager)
            .arg("--test-switch-dir")
            .arg(test_dir.join("of13").display().to_string())
            .arg("--test-switch-tester")
            .arg(&self.target.tester_dpid)
            .arg("--test-switch-target")
            .arg(&self.target.target_dpid)
            .arg(test_dir.join("tester.py").display().to_string())
    }
}

#[async_trait]
impl Tester for RyuTester {
    fn name(&self) -> &'static str {
        "Ryu"
    }

    fn raw_extension(&self) -> &'static str {
        "ryu"
    }

    async fn run(&self, _artifacts: &SwitchArtifacts) -> Result<String> {
        let command = self.command_line();
        let mut child = command.spawn_capturing_stderr()?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ExternalProcess("ryu-manager stderr not captured".into()))?;

        let mut lines = BufReader::new(stderr).lines();
        let mut captured = Vec::new();
        let mut finished = false;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim_end().to_string();
            debug!("{}", line);
            finished = line.contains(TERMINATOR);
            captured.push(line);
            if finished {
                break;
            }
        }

        if finished {
            // ryu-manager keeps serving after the test application is done
            terminate(&mut child).await;
        } else {
            let status = child.wait().await?;
            if !status.success() {
                return Err(Error::ExternalProcess(format!(
                    "{} exited with {} before the test run ended",
                    command.program, status
                )));
            }
            warn!("ryu-manager exited without a \"{}\" line", TERMINATOR);
        }

        Ok(captured.join("\n"))
    }

    fn detail(&self, artifacts: &SwitchArtifacts) -> Result<DetailedReport> {
        parse_ryu_log(&artifacts.read_raw()?)
    }
}
