//! Judge Command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::debug;

use switchtest_common::{judge, Config};

use crate::output::{print_judgement, OutputFormat};

#[derive(Args)]
pub struct JudgeArgs {
    /// Target switch file
    #[arg(short, long)]
    pub target: PathBuf,

    /// Compatibility profile file
    #[arg(short, long)]
    pub profile: PathBuf,
}

/// Judge the stored flattened report of a switch, without testing it
pub fn execute(args: JudgeArgs, config: Config, format: OutputFormat) -> Result<()> {
    let resolved = super::resolve(&config, &args.target)?;
    let profile = super::load_profile(&args.profile)?;

    debug!(
        "Main: Judging {} against {}.",
        resolved.artifacts.flattened_path().display(),
        profile.name
    );
    let flattened = resolved.artifacts.read_flattened()?;
    let judgement = judge(&flattened, &profile);
    print_judgement(&judgement, &resolved.target.model, format, config.verbose);

    Ok(())
}
