//! Drive a run from rows to features.
//!
//! The orchestrator detects the column mapping once, decides the execution
//! mode, checks the provider before any lookup, and then either builds
//! features directly from coordinate columns or geocodes the address column
//! row by row. Large geocoding runs move to a background worker that reports
//! progress and honours cancellation between rows.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use csvpoints_core::{
//!     FieldRoleCandidates, GeocodeOrchestrator, ProviderConfig, ProviderId, ProviderRegistry,
//!     Row, RunInput, RunStatus, test_support::StubGeocoder,
//! };
//!
//! let registry = ProviderRegistry::new().with_provider(
//!     ProviderConfig::new(ProviderId::Nominatim).with_credential("me@example.com"),
//!     Arc::new(StubGeocoder::resolving(35.68, 139.76)),
//! );
//! let rows = vec![Row::from_pairs([("address", "Tokyo Station")])];
//! let input = RunInput::new(["address"], rows);
//!
//! let result = GeocodeOrchestrator::new(&registry)
//!     .run(input, &FieldRoleCandidates::default(), ProviderId::Nominatim)?;
//! assert_eq!(result.report.status, RunStatus::Completed);
//! assert_eq!(result.report.resolved, 1);
//! # Ok::<(), csvpoints_core::RunError>(())
//! ```

mod cancel;
mod handle;
mod plan;
mod spawn;

use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::aggregate::ResultAggregator;
use crate::coordinate::{CoordinateError, Coordinates};
use crate::detect::{FieldMapping, FieldRoleCandidates, MappingError, detect_fields};
use crate::feature::GeocodeOutcome;
use crate::geocode::{GeocodeError, GeocodeProvider};
use crate::registry::{ProviderConfig, ProviderId, ProviderRegistry};
use crate::report::{ExecutionMode, RunIssue, RunReport, RunResult, RunStatus};
use crate::row::Row;

pub use cancel::{CancelToken, ProgressEvent, ProgressStatus};
pub use handle::{RunError, RunHandle};
pub use plan::decide_mode;
pub use spawn::{Spawner, Task, ThreadSpawner};

/// Rows and headers for one run.
#[derive(Debug, Clone)]
pub struct RunInput {
    headers: Vec<String>,
    rows: Arc<[Row]>,
    cancel: CancelToken,
}

impl RunInput {
    /// Input with `headers` in file order and `rows` in file order.
    #[must_use]
    pub fn new<H, S>(headers: H, rows: impl Into<Arc<[Row]>>) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: rows.into(),
            cancel: CancelToken::new(),
        }
    }

    /// Use `token` to cancel the run instead of a fresh one.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Column headers.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Input rows.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// Runs rows through column detection, mode selection and geocoding.
pub struct GeocodeOrchestrator<'a> {
    registry: &'a ProviderRegistry,
    spawner: Arc<dyn Spawner>,
}

impl std::fmt::Debug for GeocodeOrchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeOrchestrator")
            .field("registry", self.registry)
            .field("spawner", &"<dyn Spawner>")
            .finish()
    }
}

impl<'a> GeocodeOrchestrator<'a> {
    /// Orchestrator using `registry` and OS threads for background runs.
    #[must_use]
    pub fn new(registry: &'a ProviderRegistry) -> Self {
        Self {
            registry,
            spawner: Arc::new(ThreadSpawner::default()),
        }
    }

    /// Replace the spawner used for asynchronous runs.
    #[must_use]
    pub fn with_spawner(mut self, spawner: impl Spawner + 'static) -> Self {
        self.spawner = Arc::new(spawner);
        self
    }

    /// Detect the mapping from `input`'s headers and start the run.
    pub fn start(
        &self,
        input: RunInput,
        candidates: &FieldRoleCandidates,
        provider: ProviderId,
    ) -> RunHandle {
        let mapping = detect_fields(&input.headers, candidates);
        debug!("detected column mapping {mapping:?}");
        self.start_with_mapping(input, &mapping, provider)
    }

    /// Start a run with an already resolved mapping.
    pub fn start_with_mapping(
        &self,
        input: RunInput,
        mapping: &FieldMapping,
        provider: ProviderId,
    ) -> RunHandle {
        let RunInput { rows, cancel, .. } = input;
        let config = self
            .registry
            .config(provider)
            .cloned()
            .unwrap_or_else(|| ProviderConfig::new(provider));

        let mode = match decide_mode(mapping, rows.len(), &config) {
            Ok(mode) => mode,
            Err(error) => return refuse(cancel, error),
        };
        info!("starting {mode} run over {} rows", rows.len());
        if rows.is_empty() {
            return finished(
                cancel,
                ResultAggregator::new().finalize(mode, RunStatus::Completed),
            );
        }

        if mode == ExecutionMode::Direct {
            return finished(cancel, run_direct(&rows, mapping));
        }

        let Some(address_column) = mapping.address.clone() else {
            return refuse(cancel, MappingError::NoUsableColumns);
        };
        let usable = self
            .registry
            .provider(provider)
            .filter(|_| self.registry.is_usable(provider));
        let Some(geocoder) = usable else {
            warn!(
                "{} has no usable credential; adding rows without geometry",
                provider.display_name()
            );
            return finished(
                cancel,
                passthrough(&rows, RunIssue::ProviderUnusable { provider }),
            );
        };
        let job = GeocodeJob {
            rows,
            address_column,
            geocoder,
            credential: self
                .registry
                .credential(provider)
                .unwrap_or_default()
                .trim()
                .to_owned(),
        };

        match mode {
            ExecutionMode::Asynchronous => self.start_background(job, cancel),
            ExecutionMode::Direct | ExecutionMode::Synchronous => {
                finished(cancel, job.run_synchronous())
            }
        }
    }

    /// Start the run and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] when a background worker is lost.
    pub fn run(
        &self,
        input: RunInput,
        candidates: &FieldRoleCandidates,
        provider: ProviderId,
    ) -> Result<RunResult, RunError> {
        self.start(input, candidates, provider).wait()
    }

    fn start_background(&self, job: GeocodeJob, cancel: CancelToken) -> RunHandle {
        let (progress_tx, progress_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let fallback_rows = Arc::clone(&job.rows);
        let worker_cancel = cancel.clone();
        let task: Task = Box::new(move || {
            let result = job.run_background(&worker_cancel, &progress_tx);
            log_finished(&result);
            if done_tx.send(result).is_err() {
                debug!("run handle dropped before the result was delivered");
            }
        });
        match self.spawner.spawn(task) {
            Ok(()) => RunHandle::pending(cancel, progress_rx, done_rx),
            Err(err) => {
                warn!("failed to start background geocoding: {err}");
                finished(
                    cancel,
                    passthrough(
                        &fallback_rows,
                        RunIssue::SchedulingFailure {
                            message: err.to_string(),
                        },
                    ),
                )
            }
        }
    }
}

fn refuse(cancel: CancelToken, error: MappingError) -> RunHandle {
    warn!("cannot run: {error}");
    RunHandle::ready(cancel, RunResult::empty(RunReport::config_error(error)))
}

fn finished(cancel: CancelToken, result: RunResult) -> RunHandle {
    log_finished(&result);
    RunHandle::ready(cancel, result)
}

fn log_finished(result: &RunResult) {
    info!("run finished: {}", result.report.summary());
}

fn run_direct(rows: &[Row], mapping: &FieldMapping) -> RunResult {
    let mut aggregator = ResultAggregator::with_capacity(rows.len());
    for row in rows {
        let outcome = match row_coordinates(row, mapping) {
            Ok(coordinates) => GeocodeOutcome::resolved(coordinates),
            Err(err) => {
                debug!("row has unusable coordinates: {err}");
                GeocodeOutcome::failed(err)
            }
        };
        aggregator.record(outcome, row);
    }
    aggregator.finalize(ExecutionMode::Direct, RunStatus::Completed)
}

fn row_coordinates(row: &Row, mapping: &FieldMapping) -> Result<Coordinates, CoordinateError> {
    let value = |column: Option<&str>| column.and_then(|name| row.get(name)).unwrap_or_default();
    Coordinates::parse(
        value(mapping.latitude.as_deref()),
        value(mapping.longitude.as_deref()),
    )
}

fn passthrough(rows: &[Row], issue: RunIssue) -> RunResult {
    let reason = issue.to_string();
    let mut aggregator = ResultAggregator::with_capacity(rows.len());
    for row in rows {
        aggregator.record(GeocodeOutcome::skipped(&reason), row);
    }
    aggregator.set_issue(issue);
    aggregator.finalize(ExecutionMode::Direct, RunStatus::Degraded)
}

struct GeocodeJob {
    rows: Arc<[Row]>,
    address_column: String,
    geocoder: Arc<dyn GeocodeProvider>,
    credential: String,
}

impl GeocodeJob {
    fn outcome(&self, row: &Row) -> GeocodeOutcome {
        let address = row.get(&self.address_column).map_or("", str::trim);
        if address.is_empty() {
            return GeocodeOutcome::failed(GeocodeError::EmptyAddress);
        }
        match self.geocoder.geocode(address, &self.credential) {
            Ok(found) => GeocodeOutcome::matched(found),
            Err(err) => {
                warn!("geocoding failed: {err}");
                GeocodeOutcome::failed(err)
            }
        }
    }

    fn run_synchronous(&self) -> RunResult {
        let mut aggregator = ResultAggregator::with_capacity(self.rows.len());
        for row in self.rows.iter() {
            aggregator.record(self.outcome(row), row);
        }
        aggregator.finalize(ExecutionMode::Synchronous, RunStatus::Completed)
    }

    fn run_background(&self, cancel: &CancelToken, progress: &Sender<ProgressEvent>) -> RunResult {
        let total = self.rows.len();
        let mut aggregator = ResultAggregator::with_capacity(total);
        for row in self.rows.iter() {
            if cancel.is_cancelled() {
                return abort(aggregator, total, progress);
            }
            aggregator.record(self.outcome(row), row);
            let done = aggregator.processed();
            emit(
                progress,
                ProgressEvent {
                    processed: done,
                    remaining: total.saturating_sub(done),
                    status: ProgressStatus::Running,
                },
            );
        }
        // A request made during the final call still ends the run as aborted.
        if cancel.is_cancelled() {
            return abort(aggregator, total, progress);
        }
        aggregator.finalize(ExecutionMode::Asynchronous, RunStatus::Completed)
    }
}

fn abort(aggregator: ResultAggregator, total: usize, progress: &Sender<ProgressEvent>) -> RunResult {
    let processed = aggregator.processed();
    info!("cancellation requested after {processed} of {total} rows");
    emit(
        progress,
        ProgressEvent {
            processed,
            remaining: total.saturating_sub(processed),
            status: ProgressStatus::Aborting,
        },
    );
    aggregator.finalize(ExecutionMode::Asynchronous, RunStatus::Aborted)
}

fn emit(progress: &Sender<ProgressEvent>, event: ProgressEvent) {
    if progress.send(event).is_err() {
        debug!("progress receiver dropped; continuing without updates");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    use crate::test_support::{RefusingSpawner, StubGeocoder};

    fn address_rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|index| Row::from_pairs([("id", index.to_string()), ("address", format!("{index} Main St"))]))
            .collect()
    }

    fn registry_with(stub: &Arc<StubGeocoder>, config: ProviderConfig) -> ProviderRegistry {
        let provider: Arc<dyn GeocodeProvider> = Arc::clone(stub) as Arc<dyn GeocodeProvider>;
        ProviderRegistry::new().with_provider(config, provider)
    }

    #[fixture]
    fn stub() -> Arc<StubGeocoder> {
        Arc::new(StubGeocoder::resolving(10.0, 20.0))
    }

    #[rstest]
    fn refused_run_reports_missing_roles(stub: Arc<StubGeocoder>) {
        let registry = registry_with(
            &stub,
            ProviderConfig::new(ProviderId::Google).with_credential("key"),
        );
        let input = RunInput::new(["id", "name"], vec![Row::from_pairs([("id", "1")])]);
        let result = GeocodeOrchestrator::new(&registry)
            .run(input, &FieldRoleCandidates::default(), ProviderId::Google)
            .expect("refusals are immediate");
        assert_eq!(result.report.status, RunStatus::ConfigError);
        assert_eq!(result.report.mode, None);
        assert!(result.features.is_empty());
        assert_eq!(stub.calls(), 0);
    }

    #[rstest]
    fn zero_rows_complete_immediately(stub: Arc<StubGeocoder>) {
        let registry = registry_with(&stub, ProviderConfig::new(ProviderId::Google));
        let input = RunInput::new(["address"], Vec::<Row>::new());
        let result = GeocodeOrchestrator::new(&registry)
            .run(input, &FieldRoleCandidates::default(), ProviderId::Google)
            .expect("empty run");
        assert_eq!(result.report.status, RunStatus::Completed);
        assert_eq!(result.report.attempted(), 0);
    }

    #[rstest]
    fn blank_addresses_fail_without_calls(stub: Arc<StubGeocoder>) {
        let registry = registry_with(
            &stub,
            ProviderConfig::new(ProviderId::Mapbox).with_credential("token"),
        );
        let rows = vec![
            Row::from_pairs([("address", "   ")]),
            Row::from_pairs([("address", "Sapporo")]),
        ];
        let result = GeocodeOrchestrator::new(&registry)
            .run(
                RunInput::new(["address"], rows),
                &FieldRoleCandidates::default(),
                ProviderId::Mapbox,
            )
            .expect("synchronous run");
        assert_eq!(result.report.failed, 1);
        assert_eq!(result.report.resolved, 1);
        assert_eq!(stub.calls(), 1);
        assert_eq!(stub.addresses(), vec!["Sapporo".to_owned()]);
        assert_eq!(
            result.features.first().and_then(|feature| feature.note.as_deref()),
            Some("address is empty")
        );
    }

    #[rstest]
    fn credential_is_passed_trimmed(stub: Arc<StubGeocoder>) {
        let registry = registry_with(
            &stub,
            ProviderConfig::new(ProviderId::OpenCage).with_credential(" key "),
        );
        GeocodeOrchestrator::new(&registry)
            .run(
                RunInput::new(["address"], address_rows(1)),
                &FieldRoleCandidates::default(),
                ProviderId::OpenCage,
            )
            .expect("synchronous run");
        assert_eq!(stub.credentials(), vec!["key".to_owned()]);
    }

    #[rstest]
    fn scheduling_failure_degrades(stub: Arc<StubGeocoder>) {
        let registry = registry_with(
            &stub,
            ProviderConfig::new(ProviderId::Google)
                .with_credential("key")
                .with_sync_threshold(1),
        );
        let handle = GeocodeOrchestrator::new(&registry)
            .with_spawner(RefusingSpawner)
            .start(
                RunInput::new(["id", "address"], address_rows(3)),
                &FieldRoleCandidates::default(),
                ProviderId::Google,
            );
        assert!(handle.is_ready());
        let result = handle.wait().expect("fallback is immediate");
        assert_eq!(result.report.status, RunStatus::Degraded);
        assert_eq!(result.report.added, 3);
        assert_eq!(result.report.skipped, 3);
        assert!(matches!(
            result.report.issue,
            Some(RunIssue::SchedulingFailure { .. })
        ));
        assert_eq!(stub.calls(), 0);
    }

    #[rstest]
    fn background_run_reports_each_row(stub: Arc<StubGeocoder>) {
        let registry = registry_with(
            &stub,
            ProviderConfig::new(ProviderId::Google)
                .with_credential("key")
                .with_sync_threshold(2),
        );
        let handle = GeocodeOrchestrator::new(&registry).start(
            RunInput::new(["id", "address"], address_rows(4)),
            &FieldRoleCandidates::default(),
            ProviderId::Google,
        );
        assert_eq!(handle.mode(), Some(ExecutionMode::Asynchronous));
        let events: Vec<_> = handle.progress().collect();
        let processed: Vec<_> = events.iter().map(|event| event.processed).collect();
        assert_eq!(processed, vec![1, 2, 3, 4]);
        assert_eq!(events.last().map(|event| event.remaining), Some(0));
        let result = handle.wait().expect("worker delivers");
        assert_eq!(result.report.status, RunStatus::Completed);
        assert_eq!(result.report.resolved, 4);
    }
}
