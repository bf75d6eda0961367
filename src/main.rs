use anyhow::Result;
use candle_market::cli::setup::setup;
use candle_market::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};

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

impl From<Commands> for candle_market::AppCommand {
    fn from(cmd: Commands) -> candle_market::AppCommand {
        match cmd {
            Commands::Serve => candle_market::AppCommand::Serve,
            Commands::Overview { symbol, range } => {
                candle_market::AppCommand::Overview { symbol, range }
            }
            Commands::Company { symbol, range } => {
                candle_market::AppCommand::Company { symbol, range }
            }
            Commands::Search { query } => candle_market::AppCommand::Search { query },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the HTTP API
    Serve,
    /// Display an index overview
    Overview {
        /// Index symbol
        #[arg(short, long, default_value = "^NSEI")]
        symbol: String,
        /// Time range: 1D, 5D, 1M, 3M, YTD or 1Y
        #[arg(short, long, default_value = "1D")]
        range: String,
    },
    /// Display company detail
    Company {
        /// Ticker symbol, e.g. TCS.NS
        symbol: String,
        /// Time range: 1D, 5D, 1M, 3M, YTD or 1Y
        #[arg(short, long, default_value = "1D")]
        range: String,
    },
    /// Search companies by name or symbol
    Search {
        /// Free-text query
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => candle_market::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
