// grantsync - reconcile repository funding metadata against the Elements feed

mod exit_codes;
mod fetch;
mod logging;
mod sync;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "grantsync")]
#[command(about = "Sync grant metadata from the Elements feed into eScholarship")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan units and report (or apply) funding differences
    #[command(after_help = "\
Examples:
  grantsync run sync.toml --dry-run
  grantsync run sync.toml --dry-run --unit lbnl_rw --out results.tsv
  grantsync run sync.toml --apply --drift-guard --json
  ELEMENTS_API_USER=... ELEMENTS_API_PASSWORD=... ESCHOL_PRIV_API_KEY=... grantsync run sync.toml --apply")]
    Run(sync::RunArgs),

    /// Validate a config file without contacting any service
    #[command(after_help = "\
Examples:
  grantsync validate sync.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => sync::cmd_run(args),
        Commands::Validate { config } => sync::cmd_validate(&config),
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
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}
