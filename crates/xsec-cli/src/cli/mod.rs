mod commands;
mod helpers;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use xsec_core::domain::XsecError;

const LOG_ENV: &str = "XSEC_LOG";

pub fn run_from_env() -> i32 {
    init_logging();
    match run(std::env::args().skip(1)) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_xsec_error();
            eprintln!("{}", error.diagnostic_line());
            eprintln!("{}", error.fatal_exit_line());
            error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("xsec".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn init_logging() {
    let filter = std::env::var(LOG_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    // Fails only when a global subscriber is already set.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "xsec",
    version,
    about = "Absorption and emission cross sections of doped laser crystals"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Derive the absorption cross section from absorption and reference scans
    Absorption(commands::AbsorptionArgs),
    /// Normalize fluorescence scans into a unit-sum lineshape
    Fluorescence(commands::FluorescenceArgs),
    /// Run the full derivation and export every curve
    CrossSections(commands::CrossSectionsArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Absorption(args) => commands::run_absorption_command(args),
        CliCommand::Fluorescence(args) => commands::run_fluorescence_command(args),
        CliCommand::CrossSections(args) => commands::run_cross_sections_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(XsecError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_xsec_error(&self) -> XsecError {
        match self {
            Self::Usage(message) => {
                XsecError::configuration("CONFIG.CLI_USAGE", message.trim_end().to_string())
            }
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => XsecError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
