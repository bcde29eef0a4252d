use crate::cleanup::{RemoveDirectories, Step};
use crate::config::loader::TeardownConfig;
use crate::config::validator::validate_target;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Unmount runtime-owned mounts and erase the runtime's data and run directories",
    long_about = None
)]
struct Cli {
    /// JSON configuration file (data_dir, run_dir, kubelet_dir)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Runtime data directory
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Runtime run directory
    #[arg(long, value_name = "DIR")]
    run_dir: Option<PathBuf>,
    /// Kubelet root directory (defaults to <data-dir>/kubelet)
    #[arg(long, value_name = "DIR")]
    kubelet_dir: Option<PathBuf>,
    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
    /// Print a JSON report on success
    #[arg(long)]
    json: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_config(cli: &Cli) -> Result<TeardownConfig> {
    let config = match &cli.config {
        Some(path) => TeardownConfig::load_from_file(path)?,
        None => TeardownConfig::default(),
    };
    Ok(config.with_overrides(
        cli.data_dir.clone(),
        cli.run_dir.clone(),
        cli.kubelet_dir.clone(),
    ))
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let target = config.target();
    let validation = validate_target(&target)?;
    for warning in &validation.warnings {
        log::warn!("{}", warning);
    }

    // Privilege check - unmounting requires CAP_SYS_ADMIN
    if !nix::unistd::Uid::effective().is_root() {
        eprintln!("Warning: node-teardown may require root privileges to unmount");
    }

    let step = RemoveDirectories::new(target);
    log::info!("running {}", step.name());

    match step.execute() {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            log::info!("{} completed", step.name());
            Ok(())
        }
        Err(e) => {
            log::error!("{} failed: {}", step.name(), e);
            eprintln!("Error: {}: {}", step.name(), e);
            std::process::exit(1);
        }
    }
}
