//! SwitchTester CLI - Main Entry Point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

use switchtest_cli::commands::{judge, parse, run};
use switchtest_cli::output::OutputFormat;
use switchtest_common::{default_config_path, Config, VERSION};

/// SwitchTester - OpenFlow switch compliance testing
#[derive(Parser)]
#[command(name = "switch-tester")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Program configuration file
    #[arg(short, long, global = true, env = "SWITCH_TESTER_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test a switch and judge it against a profile
    Run(run::RunArgs),

    /// Judge the stored reports of a switch
    Judge(judge::JudgeArgs),

    /// Parse tester output without touching the store
    Parse(parse::ParseArgs),

    /// Show version information
    Version,
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; the config file may still turn on verbose output
    let (filter_layer, filter_handle) = reload::Layer::new(filter(cli.verbose));
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let load_config = || -> Result<Config> {
        let path = cli.config.clone().unwrap_or_else(default_config_path);
        let mut config = Config::load(&path)?;
        config.apply_flags(false, false, cli.verbose);
        if config.verbose && !cli.verbose {
            filter_handle.modify(|f| *f = filter(true))?;
        }
        Ok(config)
    };

    match cli.command {
        Commands::Run(args) => run::execute(args, load_config()?, cli.format).await?,
        Commands::Judge(args) => judge::execute(args, load_config()?, cli.format)?,
        Commands::Parse(args) => parse::execute(args, cli.format)?,
        Commands::Version => {
            println!("SwitchTester v{}", VERSION);
            println!("OpenFlow 1.0 (OFTest) and 1.3 (Ryu) compliance testing");
        }
    }

    Ok(())
}
