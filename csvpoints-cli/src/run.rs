//! Run command implementation for the csvpoints CLI.

use std::io::{BufReader, Write};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use csvpoints_core::{
    DEFAULT_SYNC_THRESHOLD, FieldRole, FieldRoleCandidates, GeocodeOrchestrator, GeocodeProvider,
    PointFeature, ProgressStatus, ProviderConfig, ProviderId, ProviderRegistry, Row, RunInput,
    RunIssue, RunReport, RunResult, RunStatus,
};
use csvpoints_fs::{create_output, open_input};
use log::{debug, info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    ARG_ADDRESS_NAMES, ARG_ALWAYS_SYNCHRONOUS, ARG_CREDENTIAL, ARG_DELIMITER, ARG_INPUT,
    ARG_LAT_NAMES, ARG_LON_NAMES, ARG_OUTPUT, ARG_PROVIDER, ARG_SYNC_THRESHOLD, CliError,
    ENV_INPUT,
};

/// CLI arguments for the `run` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "run",
    long_about = "Turn each row of a delimited text file into a point. Rows \
                 with latitude and longitude columns are placed directly; \
                 rows with only an address column are geocoded through the \
                 selected provider. Values can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Geocode a delimited text file into point features"
)]
#[ortho_config(prefix = "CSVPOINTS")]
pub(crate) struct RunArgs {
    /// Path to the delimited text file. The first row must hold headers.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) input: Option<Utf8PathBuf>,
    /// Geocoding service used for address columns.
    #[arg(long = ARG_PROVIDER, value_name = "id")]
    #[serde(default)]
    pub(crate) provider: Option<ProviderId>,
    /// API key, token or contact address for the provider.
    #[arg(long = ARG_CREDENTIAL, value_name = "secret")]
    #[serde(default)]
    pub(crate) credential: Option<String>,
    /// Largest row count geocoded on the calling thread.
    #[arg(long = ARG_SYNC_THRESHOLD, value_name = "rows")]
    #[serde(default)]
    pub(crate) sync_threshold: Option<usize>,
    /// Geocode on the calling thread regardless of row count.
    ///
    /// An absent flag is left out of the command-line layer so that
    /// configuration files and environment variables can still enable it.
    #[arg(long = ARG_ALWAYS_SYNCHRONOUS)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) always_synchronous: bool,
    /// Extra comma-separated header names for the latitude column.
    #[arg(long = ARG_LAT_NAMES, value_name = "names")]
    #[serde(default)]
    pub(crate) lat_names: Option<String>,
    /// Extra comma-separated header names for the longitude column.
    #[arg(long = ARG_LON_NAMES, value_name = "names")]
    #[serde(default)]
    pub(crate) lon_names: Option<String>,
    /// Extra comma-separated header names for the address column.
    #[arg(long = ARG_ADDRESS_NAMES, value_name = "names")]
    #[serde(default)]
    pub(crate) address_names: Option<String>,
    /// Field delimiter of the input file.
    #[arg(long = ARG_DELIMITER, value_name = "char")]
    #[serde(default)]
    pub(crate) delimiter: Option<char>,
    /// Write the run document here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl RunArgs {
    pub(crate) fn into_config(self) -> Result<RunConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RunConfig::try_from(merged)
    }
}

/// Header names offered for each role when the user configures none.
///
/// Supplying names for a role replaces its defaults; the built-in
/// candidates stay active either way.
const DEFAULT_EXTRA_NAMES: [(FieldRole, &str); 3] = [
    (FieldRole::Latitude, "緯度"),
    (FieldRole::Longitude, "経度"),
    (FieldRole::Address, "住所,所在地"),
];

/// Resolved `run` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunConfig {
    pub(crate) input: Utf8PathBuf,
    pub(crate) output: Option<Utf8PathBuf>,
    pub(crate) provider: ProviderConfig,
    pub(crate) candidates: FieldRoleCandidates,
    pub(crate) delimiter: u8,
}

impl RunConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match csvpoints_fs::is_regular_file(&self.input) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field: ARG_INPUT,
                path: self.input.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field: ARG_INPUT,
                    path: self.input.clone(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_INPUT,
                path: self.input.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<RunArgs> for RunConfig {
    type Error = CliError;

    fn try_from(args: RunArgs) -> Result<Self, Self::Error> {
        let input = args.input.ok_or(CliError::MissingArgument {
            field: ARG_INPUT,
            env: ENV_INPUT,
        })?;

        let delimiter = match args.delimiter {
            None => b',',
            Some(value) => u8::try_from(value)
                .ok()
                .filter(u8::is_ascii)
                .ok_or(CliError::InvalidDelimiter { value })?,
        };

        let mut provider = ProviderConfig::new(args.provider.unwrap_or(ProviderId::Nominatim))
            .with_sync_threshold(args.sync_threshold.unwrap_or(DEFAULT_SYNC_THRESHOLD))
            .with_always_synchronous(args.always_synchronous);
        if let Some(credential) = args.credential {
            provider = provider.with_credential(credential);
        }

        let mut candidates = FieldRoleCandidates::default();
        for ((role, defaults), names) in DEFAULT_EXTRA_NAMES.into_iter().zip([
            args.lat_names,
            args.lon_names,
            args.address_names,
        ]) {
            let raw = names.as_deref().unwrap_or(defaults);
            candidates = candidates.with_extra(role, raw);
        }

        Ok(Self {
            input,
            output: args.output,
            provider,
            candidates,
            delimiter,
        })
    }
}

/// Headers and rows read from the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Table {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Row>,
}

/// Read a delimited file with a header row.
///
/// Short records are padded with empty values; fields beyond the header
/// row are dropped.
pub(crate) fn read_table(path: &Utf8Path, delimiter: u8) -> Result<Table, CliError> {
    let file = open_input(path).map_err(|source| CliError::OpenInput {
        path: path.to_path_buf(),
        source,
    })?;
    let read_error = |source: csv::Error| CliError::ReadTable {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(BufReader::new(file));
    let headers: Vec<String> = reader
        .headers()
        .map_err(read_error)?
        .iter()
        .map(str::to_owned)
        .collect();

    let mut rows = Vec::new();
    for entry in reader.records() {
        let record = entry.map_err(read_error)?;
        rows.push(Row::from_pairs(headers.iter().enumerate().map(
            |(index, header)| (header.clone(), record.get(index).unwrap_or_default().to_owned()),
        )));
    }
    debug!("read {} rows with headers {headers:?} from {path}", rows.len());
    Ok(Table { headers, rows })
}

/// Builds the geocoder for the selected provider.
pub(super) trait GeocoderBuilder {
    fn build(&self, provider: ProviderId) -> Result<Arc<dyn GeocodeProvider>, CliError>;
}

pub(super) struct DefaultGeocoderBuilder;

impl GeocoderBuilder for DefaultGeocoderBuilder {
    fn build(&self, provider: ProviderId) -> Result<Arc<dyn GeocodeProvider>, CliError> {
        csvpoints_providers::build_geocoder(provider)
            .map_err(|source| CliError::BuildGeocoder { provider, source })
    }
}

pub(super) fn run_geocode(args: RunArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_geocode_with(args, &DefaultGeocoderBuilder, &mut stdout)
}

pub(super) fn run_geocode_with(
    args: RunArgs,
    builder: &dyn GeocoderBuilder,
    stdout: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let result = execute_run(&config, builder)?;
    match &config.output {
        Some(path) => {
            let mut file = create_output(path).map_err(|source| CliError::CreateOutput {
                path: path.clone(),
                source,
            })?;
            write_document(&mut file, &result)?;
            info!("wrote {} features to {path}", result.features.len());
            Ok(())
        }
        None => write_document(stdout, &result),
    }
}

pub(super) fn execute_run(
    config: &RunConfig,
    builder: &dyn GeocoderBuilder,
) -> Result<RunResult, CliError> {
    let table = read_table(&config.input, config.delimiter)?;
    let id = config.provider.provider;
    let geocoder = builder.build(id)?;
    let registry = ProviderRegistry::new().with_provider(config.provider.clone(), geocoder);

    let input = RunInput::new(table.headers, table.rows);
    let handle = GeocodeOrchestrator::new(&registry).start(input, &config.candidates, id);
    for event in handle.progress() {
        match event.status {
            ProgressStatus::Running => {
                debug!("{} rows processed, {} remaining", event.processed, event.remaining);
            }
            ProgressStatus::Aborting => {
                warn!("run aborting after {} rows", event.processed);
            }
        }
    }
    let result = handle.wait()?;
    refuse_unrunnable(&config.input, &result.report)?;
    Ok(result)
}

fn refuse_unrunnable(path: &Utf8Path, report: &RunReport) -> Result<(), CliError> {
    if report.status != RunStatus::ConfigError {
        return Ok(());
    }
    match &report.issue {
        Some(RunIssue::MissingRoles { error }) => Err(CliError::CannotRun {
            path: path.to_path_buf(),
            source: error.clone(),
        }),
        _ => Ok(()),
    }
}

/// JSON document written for a finished run.
#[derive(Debug, Serialize)]
pub(crate) struct RunDocument<'a> {
    pub(crate) report: &'a RunReport,
    pub(crate) features: Vec<FeatureDocument<'a>>,
}

/// GeoJSON-style rendering of one [`PointFeature`].
///
/// Properties hold the row's columns followed by the provider's precision
/// and extra attributes. A column keeps its value when a provider field
/// shares its name.
#[derive(Debug, Serialize)]
pub(crate) struct FeatureDocument<'a> {
    #[serde(rename = "type")]
    pub(crate) kind: &'static str,
    pub(crate) geometry: Option<PointGeometry>,
    pub(crate) properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) note: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PointGeometry {
    #[serde(rename = "type")]
    pub(crate) kind: &'static str,
    /// `[longitude, latitude]`.
    pub(crate) coordinates: [f64; 2],
}

impl<'a> From<&'a PointFeature> for FeatureDocument<'a> {
    fn from(feature: &'a PointFeature) -> Self {
        Self {
            kind: "Feature",
            geometry: feature.geometry.map(|point| PointGeometry {
                kind: "Point",
                coordinates: [point.x(), point.y()],
            }),
            properties: feature_properties(feature),
            note: feature.note.as_deref(),
        }
    }
}

fn feature_properties(feature: &PointFeature) -> Map<String, Value> {
    let mut properties: Map<String, Value> = feature
        .attributes
        .iter()
        .map(|(column, value)| (column.to_owned(), Value::String(value.to_owned())))
        .collect();
    let details = &feature.details;
    let provided = details
        .precision
        .iter()
        .map(|precision| ("precision", precision))
        .chain(
            details
                .attributes
                .iter()
                .map(|(name, value)| (name.as_str(), value)),
        );
    for (name, value) in provided {
        properties
            .entry(name)
            .or_insert_with(|| Value::String(value.clone()));
    }
    properties
}

pub(crate) fn write_document(writer: &mut dyn Write, result: &RunResult) -> Result<(), CliError> {
    let document = RunDocument {
        report: &result.report,
        features: result.features.iter().map(FeatureDocument::from).collect(),
    };
    let payload = serde_json::to_string_pretty(&document).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    info!("{}", result.report.summary());
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RunConfig, CliError> {
    let merged = RunArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RunConfig::try_from(merged)
}
