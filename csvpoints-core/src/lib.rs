//! Geocoding orchestration for tabular records.
//!
//! Rows read from a delimited file are turned into point features either
//! straight from latitude/longitude columns or by resolving an address column
//! through a [`GeocodeProvider`]. The crate performs no I/O of its own: it
//! consumes parsed rows and returns features plus a [`RunReport`].

pub mod aggregate;
pub mod coordinate;
pub mod detect;
pub mod feature;
pub mod geocode;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod row;

#[doc(hidden)]
pub mod test_support;

pub use aggregate::ResultAggregator;
pub use coordinate::{CoordinateError, Coordinates};
pub use detect::{
    DEFAULT_ADDRESS_NAMES, DEFAULT_LATITUDE_NAMES, DEFAULT_LONGITUDE_NAMES, FieldMapping,
    FieldRole, FieldRoleCandidates, MappingError, detect_fields,
};
pub use feature::{GeocodeOutcome, PointFeature};
pub use geocode::{GeocodeError, GeocodeMatch, GeocodeProvider, MatchDetails};
pub use orchestrator::{
    CancelToken, GeocodeOrchestrator, ProgressEvent, ProgressStatus, RunError, RunHandle, RunInput,
    Spawner, Task, ThreadSpawner, decide_mode,
};
pub use registry::{
    DEFAULT_SYNC_THRESHOLD, ProviderConfig, ProviderId, ProviderIdError, ProviderRegistry,
};
pub use report::{ExecutionMode, RunIssue, RunReport, RunResult, RunStatus};
pub use row::Row;
