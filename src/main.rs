use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use xrate::core::Currency;
use xrate::core::config::AppConfig;
use xrate::core::log::{LogOutput, init_logging};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Use built-in rates instead of the remote endpoint
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Source currency (USDT, RUB, EUR-CASH, EUR-CARD)
        from: Currency,
        /// Target currency (USDT, RUB, EUR-CASH, EUR-CARD)
        to: Currency,
    },
    /// Display current exchange rates
    Rates,
    /// Interactive calculator with periodically refreshed rates
    Watch,
}

impl From<Commands> for xrate::AppCommand {
    fn from(cmd: Commands) -> xrate::AppCommand {
        match cmd {
            Commands::Convert { amount, from, to } => {
                xrate::AppCommand::Convert { amount, from, to }
            }
            Commands::Rates => xrate::AppCommand::Rates,
            Commands::Watch => xrate::AppCommand::Watch,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_output = match (&cli.command, AppConfig::default_log_path()) {
        (Some(Commands::Watch), Ok(path)) => LogOutput::File(path),
        _ => LogOutput::Stderr,
    };
    init_logging(cli.verbose, log_output);

    let result = match cli.command {
        Some(Commands::Setup) => xrate::cli::setup::setup(),
        Some(cmd) => xrate::run_command(cmd.into(), cli.config_path.as_deref(), cli.offline).await,
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
