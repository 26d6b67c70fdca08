//! `expensor key`: store, remove and inspect the recognition API key.

use std::io::{self, BufRead, IsTerminal};

use clap::Subcommand;
use serde::Serialize;

use expensor_config::{delete_api_key, get_api_key, keychain_available, set_api_key};

use crate::exit_codes::EXIT_MISSING_KEY;
use crate::CliError;

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Store the API key in the system keychain
    #[command(after_help = "\
Examples:
  expensor key set --key sk-...
  echo \"$KEY\" | expensor key set")]
    Set {
        /// Key value (omit to read one line from stdin)
        #[arg(long)]
        key: Option<String>,
    },

    /// Remove the API key from the system keychain
    Delete,

    /// Show where the API key would be read from
    Status {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct KeyStatus {
    present: bool,
    source: &'static str,
    keychain_available: bool,
}

pub fn cmd_key(cmd: KeyCommands) -> Result<(), CliError> {
    match cmd {
        KeyCommands::Set { key } => {
            let key = match key {
                Some(k) => k,
                None => read_key_from_stdin()?,
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(CliError::usage("empty API key"));
            }
            set_api_key(key)?;
            eprintln!("API key stored in keychain");
            Ok(())
        }
        KeyCommands::Delete => {
            delete_api_key()?;
            eprintln!("API key removed from keychain");
            Ok(())
        }
        KeyCommands::Status { json } => {
            let lookup = get_api_key();
            let status = KeyStatus {
                present: lookup.key.is_some(),
                source: lookup.source.as_str(),
                keychain_available: keychain_available(),
            };
            if json {
                let out = serde_json::to_string_pretty(&status)
                    .map_err(|e| CliError::parse(e.to_string()))?;
                println!("{out}");
            } else {
                eprintln!("key:      {}", if status.present { "present" } else { "missing" });
                eprintln!("source:   {}", status.source);
                eprintln!("keychain: {}", if status.keychain_available { "available" } else { "unavailable" });
            }
            if status.present {
                Ok(())
            } else {
                Err(CliError::new(EXIT_MISSING_KEY, "")
                    .with_hint("run `expensor key set` or set EXPENSOR_API_KEY"))
            }
        }
    }
}

fn read_key_from_stdin() -> Result<String, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("API key: ");
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .map_err(|e| CliError::io(format!("cannot read stdin: {e}")))?;
    Ok(line)
}
