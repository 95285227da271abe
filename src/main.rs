use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use cambio::core::log::init_logging;

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

impl From<Commands> for cambio::AppCommand {
    fn from(cmd: Commands) -> cambio::AppCommand {
        match cmd {
            Commands::Convert {
                amount,
                from,
                to,
                swap,
            } => cambio::AppCommand::Convert {
                amount,
                from,
                to,
                swap,
            },
            Commands::Rates => cambio::AppCommand::Rates,
            Commands::Refresh => cambio::AppCommand::Refresh,
            Commands::History => cambio::AppCommand::History,
            Commands::ClearHistory => cambio::AppCommand::ClearHistory,
            Commands::Currencies => cambio::AppCommand::Currencies,
            Commands::Shell => cambio::AppCommand::Shell,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert; `,` is accepted as the decimal separator
        #[arg(value_parser = parse_amount, allow_hyphen_values = true)]
        amount: f64,
        /// Source currency code (defaults to the configured pair)
        #[arg(short, long)]
        from: Option<String>,
        /// Target currency code (defaults to the configured pair)
        #[arg(short, long)]
        to: Option<String>,
        /// Swap source and target before converting
        #[arg(short, long)]
        swap: bool,
    },
    /// Show the current exchange rates
    Rates,
    /// Fetch the latest rates from the feed
    Refresh,
    /// Show recent conversions
    History,
    /// Delete all recorded conversions
    ClearHistory,
    /// List supported currencies
    Currencies,
    /// Start an interactive session
    Shell,
}

fn parse_amount(input: &str) -> Result<f64, String> {
    cambio::cli::shell::parse_amount(input)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => cambio::cli::setup::setup().map(|path| {
            println!("Created configuration at {}", path.display());
        }),
        Some(cmd) => cambio::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
