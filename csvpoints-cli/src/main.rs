//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use csvpoints_cli::CliError;

fn main() {
    match csvpoints_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("csvpoints: {err}");
            std::process::exit(1);
        }
    }
}
