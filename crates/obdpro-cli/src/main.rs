//! obdpro - Command-line front-end for the OBD-II/UDS diagnostic dashboard
//!
//! Every command talks to the hardware bridge through the same diagnostic
//! controller the dashboard uses, so session tracking, the message log and
//! the DTC store behave identically.

mod commands;
mod config;
mod output;
mod workbench;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use obdpro_core::{DtcSeverity, DtcStatus, Filter};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::output::{OutputContext, OutputFormat};
use crate::workbench::Workbench;

#[derive(Parser)]
#[command(name = "obdpro")]
#[command(author, version, about = "OBD-II / UDS Diagnostic Tool")]
#[command(propagate_version = true)]
struct Cli {
    /// Bridge base URL (overrides the config file)
    #[arg(short, long, env = "OBDPRO_BRIDGE")]
    bridge: Option<String>,

    /// Assistant completion endpoint (overrides the config file)
    #[arg(long, env = "OBDPRO_ASSISTANT")]
    assistant: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "OBDPRO_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Use the built-in simulated bridge instead of hardware
    #[arg(long)]
    simulate: bool,

    /// Write the message log as JSON to this file when the command ends
    #[arg(long, value_name = "FILE")]
    save_log: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a raw UDS service request
    Send {
        /// Service id in hex (e.g. 10, 0x22)
        sid: String,

        /// Sub-function / data bytes, passed through verbatim
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        sub: Vec<String>,
    },

    /// Send a catalogued request by name (see `catalog`)
    Intent {
        /// Intent key or display name (e.g. read_vin, "Extended Session")
        name: String,
    },

    /// Security access (seed/key unlock)
    Unlock,

    /// Run a forced DPF regeneration
    Dpf,

    /// Run the firmware flash sequence
    Flash {
        /// Enter the programming session first if needed
        #[arg(long)]
        enter_session: bool,
    },

    /// Poll live telemetry
    Monitor {
        /// Stop after this many samples
        #[arg(long)]
        samples: Option<usize>,
    },

    /// Read, filter and clear DTCs
    Dtc {
        /// Status filter: all, active, pending, stored
        #[arg(long, default_value = "all")]
        status: Filter<DtcStatus>,

        /// Severity filter: all, low, medium, high
        #[arg(long, default_value = "all")]
        severity: Filter<DtcSeverity>,

        /// Clear all DTCs
        #[arg(long)]
        clear: bool,
    },

    /// AI analysis of the message log
    Analyze {
        /// Analyse a log saved with --save-log instead of a fresh scan
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,
    },

    /// Ask the support assistant
    Chat {
        /// Question text
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,
    },

    /// List the named diagnostic intents
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let ctx = OutputContext::new(cli.output, cli.no_color, cli.quiet);

    if let Commands::Catalog = cli.command {
        return commands::catalog(&ctx);
    }

    let config = config::load(cli.config.as_deref())?;
    let config = config::merge_with_args(config, cli.bridge.as_deref(), cli.assistant.as_deref())?;
    let bench = Workbench::connect(config, cli.simulate)?;

    let result = match &cli.command {
        Commands::Send { sid, sub } => commands::send(&bench, sid, sub, &ctx).await,
        Commands::Intent { name } => commands::intent(&bench, name, &ctx).await,
        Commands::Unlock => commands::unlock(&bench, &ctx).await,
        Commands::Dpf => commands::dpf(&bench, &ctx).await,
        Commands::Flash { enter_session } => commands::flash(&bench, *enter_session, &ctx).await,
        Commands::Monitor { samples } => commands::monitor(&bench, *samples, &ctx).await,
        Commands::Dtc {
            status,
            severity,
            clear,
        } => commands::dtc(&bench, *status, *severity, *clear, &ctx).await,
        Commands::Analyze { log } => commands::analyze(&bench, log.as_deref(), &ctx).await,
        Commands::Chat { query } => commands::chat(&bench, query, &ctx).await,
        Commands::Catalog => commands::catalog(&ctx),
    };

    if let Some(path) = &cli.save_log {
        save_log(&bench, path)?;
    }
    result
}

/// Dump the message log so a later `analyze --log` can pick it up
fn save_log(bench: &Workbench, path: &Path) -> Result<()> {
    let records = bench.controller.log_snapshot();
    let json = serde_json::to_string_pretty(&records).context("Failed to encode message log")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write log file: {}", path.display()))
}
