//! Error types emitted by the csvpoints CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use csvpoints_core::{MappingError, ProviderId, RunError};
use csvpoints_providers::ProviderBuildError;
use thiserror::Error;

/// Errors emitted by the csvpoints CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (pass it on the command line or set {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The delimiter is not a single-byte ASCII character.
    #[error("delimiter {value:?} must be a single ASCII character")]
    InvalidDelimiter { value: char },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the input table failed.
    #[error("failed to open input at {path:?}: {source}")]
    OpenInput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The input table could not be parsed as delimited text.
    #[error("failed to read delimited text from {path:?}: {source}")]
    ReadTable {
        path: Utf8PathBuf,
        #[source]
        source: csv::Error,
    },
    /// The headers do not support any run path.
    #[error("cannot geocode {path:?}: {source}")]
    CannotRun {
        path: Utf8PathBuf,
        #[source]
        source: MappingError,
    },
    /// Constructing the HTTP geocoder failed.
    #[error("failed to build {provider} geocoder: {source}")]
    BuildGeocoder {
        provider: ProviderId,
        #[source]
        source: ProviderBuildError,
    },
    /// The background run ended without delivering a result.
    #[error(transparent)]
    Run(#[from] RunError),
    /// Serialising the run output failed.
    #[error("failed to serialise run output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Creating the output file failed.
    #[error("failed to create output at {path:?}: {source}")]
    CreateOutput {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing the run output failed.
    #[error("failed to write run output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
