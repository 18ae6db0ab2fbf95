//! Run Command
//!
//! Tests a switch (or reuses its stored reports) and judges it when a
//! profile is given.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use switchtest_common::{judge, Config};

use crate::output::{print_flattened, print_judgement, print_success, OutputFormat};
use crate::tester::produce_reports;

#[derive(Args)]
pub struct RunArgs {
    /// Target switch file
    #[arg(short, long)]
    pub target: PathBuf,

    /// Compatibility profile file to judge against
    #[arg(short, long)]
    pub profile: Option<PathBuf>,

    /// Back up existing reports before testing
    #[arg(short, long)]
    pub backup: bool,

    /// Re-run the tester even when a raw log exists
    #[arg(short, long)]
    pub force: bool,
}

pub async fn execute(args: RunArgs, mut config: Config, format: OutputFormat) -> Result<()> {
    config.apply_flags(args.backup, args.force, false);

    let resolved = super::resolve(&config, &args.target)?;
    let profile = args
        .profile
        .as_deref()
        .map(super::load_profile)
        .transpose()?;

    let artifacts = produce_reports(&config, &resolved.target, resolved.tester.as_ref()).await?;
    let flattened = artifacts.read_flattened()?;

    match profile {
        Some(profile) => {
            let judgement = judge(&flattened, &profile);
            print_judgement(&judgement, &resolved.target.model, format, config.verbose);
        }
        None => {
            if format != OutputFormat::Json {
                print_success(&format!(
                    "Reports for {} written to {}",
                    resolved.target.model,
                    artifacts.dir().display()
                ));
            }
            print_flattened(&flattened, format);
        }
    }

    Ok(())
}
