use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use dabloan::core::log::init_logging;

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

impl From<Commands> for dabloan::AppCommand {
    fn from(cmd: Commands) -> dabloan::AppCommand {
        match cmd {
            Commands::Serve => dabloan::AppCommand::Serve,
            Commands::Summary { user } => dabloan::AppCommand::Summary { user_id: user },
            Commands::Markets => dabloan::AppCommand::Markets,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the dashboard HTTP server
    Serve,
    /// Display a user's positions and metrics
    Summary {
        /// Id of the user to show
        #[arg(short, long)]
        user: String,
    },
    /// Display the market table
    Markets,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => dabloan::cli::setup::setup(),
        Some(cmd) => dabloan::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
