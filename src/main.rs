//! ifrates - interface bitrate and utilization cycles
//!
//! Usage:
//!   ifrates cycle --table standard        one full cycle
//!   ifrates timeout --table high-capacity one timeout cycle
//!   ifrates run                           full cycles every poll_interval

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{debug, info};

use if_rates::config::{self, ConfigSource};
use if_rates::scheduler::{self, CycleKind, Scheduler};
use if_rates::table::TableKind;

#[derive(Parser)]
#[command(
    name = "ifrates",
    version,
    about = "Interface bitrate and utilization from SNMP counters"
)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, default_value = "/etc/ifrates/config.toml")]
    config: PathBuf,

    /// Override the store path from the config
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one full cycle over a table
    Cycle {
        #[arg(short, long, value_enum)]
        table: TableKind,
    },
    /// Run one timeout cycle over a table
    Timeout {
        #[arg(short, long, value_enum)]
        table: TableKind,
    },
    /// Run full cycles on every poll interval until interrupted
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, source) = config::load(&cli.config)?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    let level = if cli.verbose { "debug" } else { config.log_level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match source {
        ConfigSource::File => debug!("Loaded config from {}", cli.config.display()),
        ConfigSource::Defaults => info!("No config at {}, using defaults", cli.config.display()),
    }

    match cli.command {
        Command::Cycle { table } => {
            let report = scheduler::run_once(&config, table, CycleKind::Full)?;
            info!("{}: {} rows, {} issues", table.name(), report.rows, report.issues.len());
        }
        Command::Timeout { table } => {
            let report = scheduler::run_once(&config, table, CycleKind::Timeout)?;
            info!("{}: {} rows buffered", table.name(), report.rows);
        }
        Command::Run => {
            Scheduler::new(config).run().await?;
        }
    }

    Ok(())
}
