use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use synthfund::core::log::init_logging;
use synthfund::core::{EditField, EditRequest, SeriesRange};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Window of the ETF price series to display (all, 1w, 1m, 3m)
    #[arg(short, long, global = true)]
    range: Option<SeriesRange>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for synthfund::AppCommand {
    fn from(cmd: Commands) -> synthfund::AppCommand {
        match cmd {
            Commands::Process { file } => synthfund::AppCommand::Process { file },
            Commands::Update { key, field, value } => {
                synthfund::AppCommand::Update(EditRequest { key, field, value })
            }
            Commands::Show => synthfund::AppCommand::Show,
            Commands::Reset => synthfund::AppCommand::Reset,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Upload a portfolio CSV with `name` and `weight` columns
    Process {
        /// Portfolio CSV file
        file: PathBuf,
    },
    /// Correct a holding's weight or an instrument's most recent price
    Update {
        /// Instrument name
        key: String,
        /// Field to edit: weight or recent_price
        field: EditField,
        /// New value
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Display the active portfolio's valuation
    Show,
    /// Forget the active portfolio
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let options = synthfund::OutputOptions {
        json: cli.json,
        range: cli.range,
    };
    let result = match cli.command {
        Some(Commands::Setup) => synthfund::cli::setup::setup(),
        Some(cmd) => synthfund::run_command(cmd.into(), cli.config_path.as_deref(), options).await,
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
