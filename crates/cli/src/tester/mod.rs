//! Tester orchestration
//!
//! Picks the tester for a target switch, runs it when its raw log is
//! missing (or a re-test is forced), and rebuilds the detailed and
//! flattened reports that depend on it.

pub mod oftest;
pub mod process;
pub mod ryu;

use async_trait::async_trait;
use tracing::debug;

use switchtest_common::{
    flatten, ArtifactStore, Config, DetailedReport, Error, OpenFlowVersion, Result, SwitchArtifacts,
    Target,
};

pub use oftest::OftestTester;
pub use ryu::RyuTester;

/// An external compliance tester
#[async_trait]
pub trait Tester: Send + Sync {
    /// Human readable tester name
    fn name(&self) -> &'static str;

    /// Extension of the raw log artifact
    fn raw_extension(&self) -> &'static str;

    /// Run the tester against the target switch and return its raw log
    async fn run(&self, artifacts: &SwitchArtifacts) -> Result<String>;

    /// Build the detailed report from what `run` left in the store
    fn detail(&self, artifacts: &SwitchArtifacts) -> Result<DetailedReport>;
}

/// Select the tester matching the target's OpenFlow version
pub fn for_target(config: &Config, target: &Target) -> Result<Box<dyn Tester>> {
    match target.version()? {
        OpenFlowVersion::V1_3 => {
            let settings = target
                .ryu
                .clone()
                .ok_or_else(|| Error::configuration("Switch", vec!["ryu".to_string()]))?;
            Ok(Box::new(RyuTester::new(config.ryu.clone(), settings)))
        }
        OpenFlowVersion::V1_0 => {
            let settings = target
                .oftest
                .clone()
                .ok_or_else(|| Error::configuration("Switch", vec!["oftest".to_string()]))?;
            Ok(Box::new(OftestTester::new(config.oftest.clone(), settings)))
        }
    }
}

/// Artifacts location for a target, as used by `tester`
pub fn artifacts_for(config: &Config, target: &Target, tester: &dyn Tester) -> SwitchArtifacts {
    ArtifactStore::new(&config.directory).switch(&target.model, tester.raw_extension())
}

/// Produce the raw, detailed and flattened reports for `target`, reusing
/// whatever is already on disk unless a re-test is forced.
pub async fn produce_reports(
    config: &Config,
    target: &Target,
    tester: &dyn Tester,
) -> Result<SwitchArtifacts> {
    let artifacts = artifacts_for(config, target, tester);
    artifacts.ensure_dir()?;

    if config.backup {
        artifacts.backup()?;
    }

    let plan = artifacts.plan(config.force_test);
    artifacts.discard_scheduled(&plan)?;

    if plan.run_tester {
        debug!(
            "Main: Testing {} with {} for {}.",
            target.model,
            tester.name(),
            target.of_version
        );
        let raw = tester.run(&artifacts).await?;
        artifacts.write_raw(&raw)?;
        debug!("Main: Testing complete.");
    }

    let detailed = if plan.build_detailed {
        let detailed = tester.detail(&artifacts)?;
        artifacts.write_detailed(&detailed)?;
        Some(detailed)
    } else {
        None
    };

    if plan.build_flattened {
        let detailed = match detailed {
            Some(detailed) => detailed,
            None => artifacts.read_detailed()?,
        };
        debug!(
            "Main: Converting detailed {} to simplified CSV file {}.",
            artifacts.detailed_path().display(),
            artifacts.flattened_path().display()
        );
        artifacts.write_flattened(&flatten(&detailed))?;
    }

    Ok(artifacts)
}
