// expensor CLI - recognize expense documents and reconcile them

mod exit_codes;
mod key;
mod reconcile;
mod report;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};
use expensor_config::{ConfigError, Settings};

#[derive(Parser)]
#[command(name = "expensor")]
#[command(about = "Recognize invoices and trip sheets, pair them, order them for reimbursement")]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/expensor/settings.json)
    #[arg(long, global = true, env = "EXPENSOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log verbosity: -v info, -vv debug (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize a batch of document images and reconcile the results
    #[command(after_help = "\
Examples:
  expensor run receipts/*.jpg
  expensor run hotel.png taxi.png trip.png --json > batch.json
  expensor run scans/waybill/ --concurrency 4 --output batch.json

A directory is one multi-page document; its images are pages in name order.")]
    Run(run::RunArgs),

    /// Re-run pairing, ordering and anomaly checks over an edited records file
    #[command(after_help = "\
Examples:
  expensor reconcile batch.json
  expensor reconcile records.json --json --output result.json")]
    Reconcile {
        /// JSON array of records, or a `run --json` output
        records: PathBuf,

        /// Output JSON to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Manage the recognition API key
    #[command(subcommand)]
    Key(key::KeyCommands),
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(EXIT_PARSE, msg)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let code = match err {
            ConfigError::Io(_) => EXIT_IO,
            ConfigError::Parse(_) => EXIT_PARSE,
            ConfigError::Keychain(_) | ConfigError::KeychainUnavailable => {
                exit_codes::EXIT_KEYCHAIN
            }
        };
        CliError::new(code, err.to_string())
    }
}

/// Settings from `--config` (errors are fatal) or the default location
/// (errors fall back to defaults).
fn load_settings(path: Option<&PathBuf>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Settings::load_from(path)
            .map_err(|e| CliError::from(e).with_hint(format!("settings file: {}", path.display()))),
        None => Ok(Settings::load()),
    }
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Also bridges `log` records from the library crates.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => {
            load_settings(cli.config.as_ref()).and_then(|settings| run::cmd_run(args, &settings))
        }
        Commands::Reconcile { records, json, output } => {
            reconcile::cmd_reconcile(records, json, output)
        }
        Commands::Key(cmd) => key::cmd_key(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(if code == EXIT_SUCCESS { EXIT_ERROR } else { code })
        }
    }
}
