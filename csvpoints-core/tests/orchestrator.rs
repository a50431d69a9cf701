//! Run-level guarantees of [`GeocodeOrchestrator`].

use std::sync::Arc;

use csvpoints_core::test_support::{CancellingGeocoder, RefusingSpawner, StubGeocoder};
use csvpoints_core::{
    CancelToken, ExecutionMode, FieldRoleCandidates, GeocodeError, GeocodeOrchestrator,
    GeocodeProvider, ProgressStatus, ProviderConfig, ProviderId, ProviderRegistry, Row, RunInput,
    RunIssue, RunStatus,
};
use rstest::{fixture, rstest};

fn address_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|index| {
            Row::from_pairs([
                ("name", format!("site {index}")),
                ("Address", format!("{index}-1 Marunouchi")),
            ])
        })
        .collect()
}

fn input(count: usize) -> RunInput {
    RunInput::new(["name", "Address"], address_rows(count))
}

fn registry(config: ProviderConfig, provider: Arc<dyn GeocodeProvider>) -> ProviderRegistry {
    ProviderRegistry::new().with_provider(config, provider)
}

#[fixture]
fn candidates() -> FieldRoleCandidates {
    FieldRoleCandidates::default()
}

#[rstest]
#[case(50, false, ExecutionMode::Synchronous)]
#[case(51, false, ExecutionMode::Asynchronous)]
#[case(51, true, ExecutionMode::Synchronous)]
fn threshold_selects_mode(
    candidates: FieldRoleCandidates,
    #[case] rows: usize,
    #[case] always: bool,
    #[case] expected: ExecutionMode,
) {
    let config = ProviderConfig::new(ProviderId::Mapbox)
        .with_credential("token")
        .with_sync_threshold(50)
        .with_always_synchronous(always);
    let registry = registry(config, Arc::new(StubGeocoder::resolving(1.0, 1.0)));
    let handle = GeocodeOrchestrator::new(&registry).start(input(rows), &candidates, ProviderId::Mapbox);
    assert_eq!(handle.mode(), Some(expected));
    let result = handle.wait().expect("run completes");
    assert_eq!(result.report.mode, Some(expected));
    assert_eq!(result.report.added, rows);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(7)]
#[case(29)]
#[case(30)]
fn cancelling_after_k_rows_keeps_k(candidates: FieldRoleCandidates, #[case] k: usize) {
    let token = CancelToken::new();
    if k == 0 {
        token.cancel();
    }
    let geocoder = Arc::new(CancellingGeocoder::new(
        StubGeocoder::resolving(35.0, 139.0),
        token.clone(),
        k,
    ));
    let registry = registry(
        ProviderConfig::new(ProviderId::Google).with_credential("key"),
        Arc::clone(&geocoder) as Arc<dyn GeocodeProvider>,
    );
    let handle = GeocodeOrchestrator::new(&registry).start(
        input(30).with_cancel_token(token),
        &candidates,
        ProviderId::Google,
    );
    let events: Vec<_> = handle.progress().collect();
    let result = handle.wait().expect("worker delivers");

    assert_eq!(result.report.status, RunStatus::Aborted);
    assert_eq!(result.report.added + result.report.failed, k);
    assert_eq!(result.features.len(), k);
    assert_eq!(geocoder.calls(), k);
    let last = events.last().expect("an aborting event is emitted");
    assert_eq!(last.status, ProgressStatus::Aborting);
    assert_eq!(last.processed, k);
    assert_eq!(last.remaining, 30 - k);
}

#[rstest]
fn unusable_provider_passes_rows_through(candidates: FieldRoleCandidates) {
    let stub = Arc::new(StubGeocoder::resolving(1.0, 1.0));
    let registry = registry(
        ProviderConfig::new(ProviderId::YahooJapan),
        Arc::clone(&stub) as Arc<dyn GeocodeProvider>,
    );
    let result = GeocodeOrchestrator::new(&registry)
        .run(input(25), &candidates, ProviderId::YahooJapan)
        .expect("degraded runs finish inline");

    assert_eq!(result.report.status, RunStatus::Degraded);
    assert_eq!(result.report.added, 25);
    assert_eq!(result.report.failed, 0);
    assert_eq!(result.report.skipped, 25);
    assert_eq!(
        result.report.issue,
        Some(RunIssue::ProviderUnusable {
            provider: ProviderId::YahooJapan
        })
    );
    assert!(result.features.iter().all(|feature| feature.geometry.is_none()));
    assert_eq!(stub.calls(), 0);
}

#[rstest]
fn unregistered_provider_is_unusable(candidates: FieldRoleCandidates) {
    let registry = ProviderRegistry::new();
    let result = GeocodeOrchestrator::new(&registry)
        .run(input(2), &candidates, ProviderId::Nominatim)
        .expect("degraded runs finish inline");
    assert_eq!(result.report.status, RunStatus::Degraded);
    assert_eq!(result.report.added, 2);
}

#[rstest]
fn refused_spawn_falls_back(candidates: FieldRoleCandidates) {
    let stub = Arc::new(StubGeocoder::resolving(1.0, 1.0));
    let registry = registry(
        ProviderConfig::new(ProviderId::Google)
            .with_credential("key")
            .with_sync_threshold(0),
        Arc::clone(&stub) as Arc<dyn GeocodeProvider>,
    );
    let result = GeocodeOrchestrator::new(&registry)
        .with_spawner(RefusingSpawner)
        .run(input(4), &candidates, ProviderId::Google)
        .expect("fallback finishes inline");
    assert_eq!(result.report.status, RunStatus::Degraded);
    assert_eq!(result.report.added, 4);
    assert_eq!(stub.calls(), 0);
}

#[rstest]
fn provider_errors_are_recorded_per_row(candidates: FieldRoleCandidates) {
    let stub = StubGeocoder::resolving(43.06, 141.35)
        .with_failure(
            "1-1 Marunouchi",
            GeocodeError::Timeout {
                url: "https://maps.example/geocode".to_owned(),
                timeout_secs: 20,
            },
        )
        .with_failure(
            "2-1 Marunouchi",
            GeocodeError::Service {
                code: "OVER_QUERY_LIMIT".to_owned(),
                message: "quota exhausted".to_owned(),
            },
        );
    let registry = registry(
        ProviderConfig::new(ProviderId::Google).with_credential("key"),
        Arc::new(stub),
    );
    let result = GeocodeOrchestrator::new(&registry)
        .run(input(4), &candidates, ProviderId::Google)
        .expect("synchronous run");
    assert_eq!(result.report.status, RunStatus::Completed);
    assert_eq!(result.report.failed, 2);
    assert_eq!(result.report.added, 2);
    let notes: Vec<_> = result
        .features
        .iter()
        .map(|feature| feature.note.is_some())
        .collect();
    assert_eq!(notes, vec![false, true, true, false]);
}

#[rstest]
fn repeated_runs_are_identical(candidates: FieldRoleCandidates) {
    let run = || {
        let stub = StubGeocoder::resolving(34.69, 135.50)
            .with_failure("3-1 Marunouchi", GeocodeError::NoResult);
        let registry = registry(
            ProviderConfig::new(ProviderId::OpenCage)
                .with_credential("key")
                .with_sync_threshold(5),
            Arc::new(stub),
        );
        GeocodeOrchestrator::new(&registry)
            .run(input(12), &candidates, ProviderId::OpenCage)
            .expect("run completes")
    };
    let first = run();
    let second = run();
    assert_eq!(first.report, second.report);
    assert_eq!(first.features, second.features);
}

#[rstest]
fn direct_rows_with_bad_coordinates_fail(candidates: FieldRoleCandidates) {
    let rows = vec![
        Row::from_pairs([("lat", "35°39'29.1\"N"), ("lon", "139°42'30\"E")]),
        Row::from_pairs([("lat", "north"), ("lon", "139.7")]),
        Row::from_pairs([("lat", "95"), ("lon", "139.7")]),
    ];
    let registry = ProviderRegistry::new();
    let result = GeocodeOrchestrator::new(&registry)
        .run(RunInput::new(["lat", "lon"], rows), &candidates, ProviderId::Google)
        .expect("direct runs finish inline");
    assert_eq!(result.report.mode, Some(ExecutionMode::Direct));
    assert_eq!(result.report.status, RunStatus::Completed);
    assert_eq!(result.report.resolved, 1);
    assert_eq!(result.report.failed, 2);
    assert_eq!(result.features.len(), 3);
}
