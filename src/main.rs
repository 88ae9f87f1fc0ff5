// ============================================================================
// src/main.rs – rentguard CLI entrypoint
// ============================================================================

use anyhow::Result;
use clap::{Parser, Subcommand};
use rentguard::cmd;
use rentguard::config::Config;
use rentguard::ui::UX;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "rentguard",
    version,
    about = "Admin console sign-in with persistent login throttling."
)]
struct Cli {
    /// Path to the config file (TOML or YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Suppress the banner and informational output.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the local admin credential.
    Init {
        /// Replace an existing credential file.
        #[arg(long)]
        force: bool,
    },
    /// Interactive admin sign-in.
    Login,
    /// Show the persisted throttle state.
    Status,
    /// Clear recorded failures and any active lock.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::load_or_default(cli.config.as_deref())?;
    let ui = UX::new(cli.quiet);

    match cli.command {
        Command::Init { force } => cmd::init::run_init(&ui, &cfg, force),
        Command::Login => cmd::login::run_login(&ui, &cfg),
        Command::Status => cmd::status::run_status(&ui, &cfg),
        Command::Reset { yes } => cmd::reset::run_reset(&ui, &cfg, yes),
    }
}
