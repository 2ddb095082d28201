mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cmd::{honor::HonorSubcommand, report::ReportSubcommand, workspace::WorkspaceSubcommand};
use kudos_core::config::Config;

#[derive(Parser)]
#[command(
    name = "kudos",
    about = "Peer-recognition ledger and tracker reports for your workspace",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true, env = "KUDOS_CONFIG", default_value = "kudos.yaml")]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an API token and store the signed-in identity
    Login {
        /// Tracker API token
        api_token: String,
    },

    /// Run the honor ledger HTTP API
    Serve {
        #[arg(long, default_value = "3141")]
        port: u16,

        /// Use a volatile in-memory store instead of the redb file
        #[arg(long)]
        memory: bool,
    },

    /// Workspace roster and admin operations
    Workspace {
        #[command(subcommand)]
        subcommand: WorkspaceSubcommand,
    },

    /// Grant and inspect honors
    Honor {
        #[command(subcommand)]
        subcommand: HonorSubcommand,
    },

    /// Tracker-backed reports (progress, battle log, sprint, warriors)
    Report {
        #[command(subcommand)]
        subcommand: ReportSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = Config::load(&cli.config)
        .map_err(anyhow::Error::from)
        .and_then(|config| match cli.command {
            Commands::Login { api_token } => {
                cmd::login::run(&cli.config, config, &api_token, cli.json)
            }
            Commands::Serve { port, memory } => cmd::serve::run(&config, port, memory),
            Commands::Workspace { subcommand } => cmd::workspace::run(&config, subcommand, cli.json),
            Commands::Honor { subcommand } => cmd::honor::run(&config, subcommand, cli.json),
            Commands::Report { subcommand } => cmd::report::run(&config, subcommand, cli.json),
        });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
