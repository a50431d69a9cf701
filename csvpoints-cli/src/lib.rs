//! Command-line interface for geocoding delimited text files.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use csvpoints_core::ProviderId;

mod error;
mod logging;
mod run;

pub use error::CliError;

use run::RunArgs;

const ARG_INPUT: &str = "input";
const ARG_PROVIDER: &str = "provider";
const ARG_CREDENTIAL: &str = "credential";
const ARG_SYNC_THRESHOLD: &str = "sync-threshold";
const ARG_ALWAYS_SYNCHRONOUS: &str = "always-synchronous";
const ARG_LAT_NAMES: &str = "lat-names";
const ARG_LON_NAMES: &str = "lon-names";
const ARG_ADDRESS_NAMES: &str = "address-names";
const ARG_DELIMITER: &str = "delimiter";
const ARG_OUTPUT: &str = "output";
const ENV_INPUT: &str = "CSVPOINTS_CMDS_RUN_INPUT";

/// Run the csvpoints CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    logging::init();
    match cli.command {
        Command::Run(args) => run::run_geocode(args),
        Command::Providers => {
            let mut stdout = std::io::stdout().lock();
            list_providers(&mut stdout)
        }
    }
}

fn list_providers(writer: &mut dyn Write) -> Result<(), CliError> {
    for id in ProviderId::ALL {
        writeln!(writer, "{id}\t{}", id.display_name()).map_err(CliError::WriteOutput)?;
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "csvpoints",
    about = "Turn rows of delimited text into point features",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Place or geocode every row of a delimited text file.
    Run(RunArgs),
    /// List the geocoding services that can be selected.
    Providers,
}

#[cfg(test)]
mod tests;
