//! CLI Commands

pub mod judge;
pub mod parse;
pub mod run;

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use switchtest_common::{Config, Profile, SwitchArtifacts, Target};

use crate::tester::{self, Tester};

/// Target switch, its tester and where its artifacts live
pub struct Resolved {
    pub target: Target,
    pub tester: Box<dyn Tester>,
    pub artifacts: SwitchArtifacts,
}

/// Load a target switch file and pick the tester that matches it
pub fn resolve(config: &Config, target: &Path) -> Result<Resolved> {
    let target = Target::load(target)?;
    let tester = tester::for_target(config, &target)?;
    let artifacts = tester::artifacts_for(config, &target, tester.as_ref());
    debug!(
        "Target {} ({}) uses {}",
        target.model,
        target.description,
        tester.name()
    );
    Ok(Resolved {
        target,
        tester,
        artifacts,
    })
}

pub fn load_profile(path: &Path) -> Result<Profile> {
    Ok(Profile::load(path)?)
}
