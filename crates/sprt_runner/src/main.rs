//! SPRT CLI
//!
//! Build the working tree and a reference branch of beatrijs, then let
//! cutechess-cli decide whether the new build is stronger.

use anyhow::{Context, Result};
use clap::Parser;
use sprt_runner::{resolve, run_sprt, ConfigOverrides, HostOs, Plan, Preset, SystemRunner};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sprt", version)]
#[command(about = "Run an SPRT match between the local build and a reference branch")]
struct Cli {
    /// Hash table size in MB for both engines (engine default if omitted)
    #[arg(long)]
    hash: Option<u32>,

    /// Number of games cutechess-cli plays concurrently [default: 6]
    #[arg(long)]
    threads: Option<u32>,

    /// Git branch to test against [default: master]
    #[arg(long)]
    branch: Option<String>,

    /// Named set of match defaults
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// TOML file with configuration overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Opening book path [default: from preset]
    #[arg(long)]
    book: Option<PathBuf>,

    /// Local source tree to build as the new engine [default: .]
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Scratch directory, wiped on every run [default: tmp]
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Print the plan without running anything
    #[arg(long)]
    dry_run: bool,

    /// Abort at the first failing step
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            preset: self.preset,
            hash_mb: self.hash,
            threads: self.threads,
            branch: self.branch.clone(),
            book: self.book.clone(),
            source_dir: self.source_dir.clone(),
            workspace: self.workspace.clone(),
            ..Default::default()
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "sprt_runner=debug,sprt=debug"
    } else {
        "sprt_runner=info,sprt=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file = cli
        .config
        .as_deref()
        .map(ConfigOverrides::load)
        .transpose()
        .context("Failed to load configuration file")?;
    let (preset, config) = resolve(file.as_ref(), &cli.overrides());
    let host = HostOs::current();

    if cli.dry_run {
        let plan = Plan::build(&config, host).context("Failed to plan run")?;
        println!("=== Plan ({} preset, {}) ===", preset, host);
        print!("{}", plan.describe());
        return Ok(());
    }

    let record = run_sprt(&config, preset, host, SystemRunner, cli.strict)?;

    println!();
    record.print_report();
    if record.completed() {
        info!("games written to {}", config.pgn_path().display());
    } else {
        warn!("failed steps: {}", record.failed_steps().join(", "));
    }
    Ok(())
}
