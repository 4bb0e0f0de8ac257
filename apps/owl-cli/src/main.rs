//! # owl-cli
//!
//! Command-line interface for the Owlume governance core.
//!
//! - `owl policy check/decide/fingerprint` — validate and query the policy in force
//! - `owl audit verify/tail/drift` — inspect the tamper-evident BLOCK log
//! - `owl finalize` — run one attempted output through the output gate
//! - `owl land` — land a closing judgment and persist the interaction

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use owl_gate::GateConfig;
use tracing_subscriber::EnvFilter;

/// Owlume governance CLI.
#[derive(Parser)]
#[command(name = "owl", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and query the decision table and negative rules.
    Policy {
        #[command(subcommand)]
        command: commands::policy::PolicyCommands,
    },
    /// Inspect the BLOCK audit log.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
    /// Gate one attempted output (JSON request from a file or stdin).
    Finalize {
        /// Request file; reads stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Land a closing judgment and persist the interaction record.
    Land(commands::land::LandArgs),
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with command output on stdout.
    let filter = EnvFilter::from_default_env()
        .add_directive("owl_gate=info".parse()?)
        .add_directive("owl_policy=info".parse()?)
        .add_directive("owl_audit=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json)?;

    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = GateConfig::load(&project_root)?;
    tracing::debug!(project_root = %project_root.display(), "config resolved");

    match &cli.command {
        Commands::Policy { command } => commands::policy::execute(command, &config),
        Commands::Audit { command } => commands::audit::execute(command, &config),
        Commands::Finalize { input } => commands::finalize::execute(input.as_deref(), &config),
        Commands::Land(args) => commands::land::execute(args, &config),
    }
}
