//! Facade crate for csvpoints.
//!
//! This crate re-exports the core orchestration types and exposes the HTTP
//! geocoders behind the `providers` feature.

#![forbid(unsafe_code)]

pub use csvpoints_core::{
    CancelToken, CoordinateError, Coordinates, ExecutionMode, FieldMapping, FieldRole,
    FieldRoleCandidates, GeocodeError, GeocodeMatch, GeocodeOrchestrator, GeocodeOutcome,
    GeocodeProvider, MappingError, MatchDetails, PointFeature, ProgressEvent, ProgressStatus, ProviderConfig, ProviderId,
    ProviderRegistry, ResultAggregator, Row, RunError, RunHandle, RunInput, RunIssue, RunReport,
    RunResult, RunStatus, Spawner, ThreadSpawner, decide_mode, detect_fields,
};

#[cfg(feature = "providers")]
pub use csvpoints_providers::{
    GoogleGeocoder, HttpGeocoderConfig, MapboxGeocoder, NominatimGeocoder, OpenCageGeocoder,
    ProviderBuildError, YahooJapanGeocoder, build_geocoder, build_geocoder_with_config,
};
