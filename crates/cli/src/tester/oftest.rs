//! OFTest runner (OpenFlow 1.0)
//!
//! Runs `oft basic --xunit` and, when the target asks for it, OFTest's
//! `run_switch.py` alongside. The two processes only meet at a join: if the
//! switch script fails, OFTest is terminated and the run is aborted.

use async_trait::async_trait;
use tracing::{debug, warn};

use switchtest_common::config::{OftestSettings, OftestTarget};
use switchtest_common::{parse_xunit_dir, DetailedReport, Error, Result, SwitchArtifacts};

use super::process::{collect_lines, terminate, CommandLine};
use super::Tester;

pub struct OftestTester {
    settings: OftestSettings,
    target: OftestTarget,
}

impl OftestTester {
    pub fn new(settings: OftestSettings, target: OftestTarget) -> Self {
        Self { settings, target }
    }

    pub fn oft_command(&self, artifacts: &SwitchArtifacts) -> CommandLine {
        let oft = self.settings.directory().join("oft");
        CommandLine::elevated(&self.settings.python, self.settings.sudo)
            .arg(oft.display().to_string())
            .arg("basic")
            .args(self.target.interface_args())
            .arg("--xunit")
            .arg(format!("--xunit-dir={}", artifacts.xunit_dir().display()))
    }

    pub fn switch_command(&self) -> CommandLine {
        let script = self.settings.directory().join("run_switch.py");
        CommandLine::elevated(&self.settings.python, self.settings.sudo)
            .arg(script.display().to_string())
    }
}

#[async_trait]
impl Tester for OftestTester {
    fn name(&self) -> &'static str {
        "OFTest"
    }

    fn raw_extension(&self) -> &'static str {
        "oft"
    }

    async fn run(&self, artifacts: &SwitchArtifacts) -> Result<String> {
        // Results of an earlier run would otherwise be merged into this one
        let xunit_dir = artifacts.xunit_dir();
        if xunit_dir.exists() {
            std::fs::remove_dir_all(&xunit_dir)?;
        }
        switchtest_common::store::create_dir(&xunit_dir)?;

        let mut switch = if self.target.run_switch_script {
            let command = self.switch_command();
            debug!("Main: Starting switch script: {}", command);
            Some(command.spawn_quiet()?)
        } else {
            None
        };

        let command = self.oft_command(artifacts);
        let mut oft = command.spawn_capturing_stderr()?;
        let stderr = oft
            .stderr
            .take()
            .ok_or_else(|| Error::ExternalProcess("OFTest stderr not captured".into()))?;
        let drain = tokio::spawn(collect_lines(stderr));

        if let Some(switch) = switch.as_mut() {
            let status = switch.wait().await?;
            if !status.success() {
                terminate(&mut oft).await;
                drain.abort();
                return Err(Error::ExternalProcess(
                    "Switch stopped abruptly. Terminating.".into(),
                ));
            }
            debug!("Switch script exited with {}", status);
        }

        let status = oft.wait().await?;
        let lines = drain
            .await
            .map_err(|e| Error::ExternalProcess(format!("OFTest output reader failed: {}", e)))??;

        // OFTest exits non-zero whenever a test fails; the xunit files say which
        if !status.success() {
            warn!("OFTest exited with {}", status);
        }

        Ok(lines.join("\n"))
    }

    fn detail(&self, artifacts: &SwitchArtifacts) -> Result<DetailedReport> {
        parse_xunit_dir(&artifacts.xunit_dir())
    }
}
