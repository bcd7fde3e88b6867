use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use coinlens::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for coinlens::AppCommand {
    fn from(cmd: Commands) -> coinlens::AppCommand {
        match cmd {
            Commands::Summary => coinlens::AppCommand::Summary,
            Commands::Matches => coinlens::AppCommand::Matches,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the reconciled portfolio valuation
    Summary,
    /// Show how each held symbol resolved against the price catalog
    Matches,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => coinlens::cli::setup::setup(),
        Some(cmd) => coinlens::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
