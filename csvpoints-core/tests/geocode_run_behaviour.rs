//! Behavioural tests for [`GeocodeOrchestrator`] runs.

use std::cell::RefCell;
use std::sync::Arc;

use csvpoints_core::test_support::{CancellingGeocoder, StubGeocoder};
use csvpoints_core::{
    CancelToken, ExecutionMode, FieldRoleCandidates, GeocodeError, GeocodeOrchestrator,
    GeocodeProvider, ProgressEvent, ProviderConfig, ProviderId, ProviderRegistry, Row, RunInput,
    RunResult, RunStatus,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Default)]
struct RunWorld {
    headers: Vec<String>,
    rows: Vec<Row>,
    registry: ProviderRegistry,
    stub: Option<Arc<StubGeocoder>>,
    token: CancelToken,
    events: Vec<ProgressEvent>,
    result: Option<RunResult>,
}

type WorldCell = RefCell<RunWorld>;

#[fixture]
fn world() -> WorldCell {
    RefCell::new(RunWorld::default())
}

fn address(index: usize) -> String {
    format!("{index} Chome, Chiyoda")
}

fn register(world: &WorldCell, config: ProviderConfig, provider: Arc<dyn GeocodeProvider>) {
    world.borrow_mut().registry.register(config, provider);
}

fn register_stub(world: &WorldCell, config: ProviderConfig, stub: StubGeocoder) {
    let stub = Arc::new(stub);
    world.borrow_mut().stub = Some(Arc::clone(&stub));
    register(world, config, stub);
}

fn google() -> ProviderConfig {
    ProviderConfig::new(ProviderId::Google).with_credential("api-key")
}

fn with_result<T>(world: &WorldCell, check: impl FnOnce(&RunResult) -> T) -> T {
    let borrowed = world.borrow();
    let result = borrowed
        .result
        .as_ref()
        .expect("the orchestrator must run before assertions");
    check(result)
}

// --- Given steps ---

#[given("{count} rows with coordinate columns")]
fn given_coordinate_rows(count: usize, #[from(world)] world: &WorldCell) {
    let mut borrowed = world.borrow_mut();
    borrowed.headers = vec!["id".to_owned(), "lat".to_owned(), "lon".to_owned()];
    borrowed.rows = (0..count)
        .map(|index| {
            Row::from_pairs([
                ("id", index.to_string()),
                ("lat", format!("35.{index}")),
                ("lon", format!("139.{index}")),
            ])
        })
        .collect();
}

#[given("{count} rows with an address column")]
fn given_address_rows(count: usize, #[from(world)] world: &WorldCell) {
    let mut borrowed = world.borrow_mut();
    borrowed.headers = vec!["id".to_owned(), "address".to_owned()];
    borrowed.rows = (0..count)
        .map(|index| Row::from_pairs([("id", index.to_string()), ("address", address(index))]))
        .collect();
}

#[given("a configured provider")]
fn given_provider(#[from(world)] world: &WorldCell) {
    register_stub(world, google(), StubGeocoder::resolving(35.68, 139.76));
}

#[given("a configured provider with a threshold of {threshold}")]
fn given_provider_threshold(threshold: usize, #[from(world)] world: &WorldCell) {
    register_stub(
        world,
        google().with_sync_threshold(threshold),
        StubGeocoder::resolving(35.68, 139.76),
    );
}

#[given("a provider without a credential")]
fn given_provider_without_credential(#[from(world)] world: &WorldCell) {
    register_stub(
        world,
        ProviderConfig::new(ProviderId::Google).with_credential("  "),
        StubGeocoder::resolving(35.68, 139.76),
    );
}

#[given("a configured provider that cancels after {count} lookups")]
fn given_cancelling_provider(count: usize, #[from(world)] world: &WorldCell) {
    let token = world.borrow().token.clone();
    let geocoder = CancellingGeocoder::new(StubGeocoder::resolving(35.68, 139.76), token, count);
    register(world, google(), Arc::new(geocoder));
}

#[given("a configured provider that cannot find row {index}")]
fn given_partial_provider(index: usize, #[from(world)] world: &WorldCell) {
    register_stub(
        world,
        google(),
        StubGeocoder::resolving(35.68, 139.76).with_failure(&address(index), GeocodeError::NoResult),
    );
}

// --- When steps ---

#[when("I run the orchestrator")]
fn when_run(#[from(world)] world: &WorldCell) {
    let mut borrowed = world.borrow_mut();
    let input = RunInput::new(borrowed.headers.clone(), borrowed.rows.clone())
        .with_cancel_token(borrowed.token.clone());
    let handle = GeocodeOrchestrator::new(&borrowed.registry).start(
        input,
        &FieldRoleCandidates::default(),
        ProviderId::Google,
    );
    let events: Vec<_> = handle.progress().collect();
    let result = handle.wait().expect("run should deliver a result");
    borrowed.events = events;
    borrowed.result = Some(result);
}

// --- Then steps ---

#[then("the run status is completed")]
fn then_completed(#[from(world)] world: &WorldCell) {
    with_result(world, |result| assert_eq!(result.report.status, RunStatus::Completed));
}

#[then("the run status is degraded")]
fn then_degraded(#[from(world)] world: &WorldCell) {
    with_result(world, |result| assert_eq!(result.report.status, RunStatus::Degraded));
}

#[then("the run status is aborted")]
fn then_aborted(#[from(world)] world: &WorldCell) {
    with_result(world, |result| assert_eq!(result.report.status, RunStatus::Aborted));
}

#[then("the execution mode is direct")]
fn then_direct(#[from(world)] world: &WorldCell) {
    with_result(world, |result| assert_eq!(result.report.mode, Some(ExecutionMode::Direct)));
}

#[then("the execution mode is synchronous")]
fn then_synchronous(#[from(world)] world: &WorldCell) {
    with_result(world, |result| {
        assert_eq!(result.report.mode, Some(ExecutionMode::Synchronous));
    });
}

#[then("the execution mode is asynchronous")]
fn then_asynchronous(#[from(world)] world: &WorldCell) {
    with_result(world, |result| {
        assert_eq!(result.report.mode, Some(ExecutionMode::Asynchronous));
    });
}

#[then("{count} features have geometry")]
fn then_geometry(count: usize, #[from(world)] world: &WorldCell) {
    with_result(world, |result| {
        let located = result
            .features
            .iter()
            .filter(|feature| feature.has_geometry())
            .count();
        assert_eq!(located, count);
        assert_eq!(result.report.resolved, count);
    });
}

#[then("{count} rows were added")]
fn then_added(count: usize, #[from(world)] world: &WorldCell) {
    with_result(world, |result| {
        assert_eq!(result.report.added, count);
        assert_eq!(result.features.len(), count);
    });
}

#[then("{count} rows failed")]
fn then_failed(count: usize, #[from(world)] world: &WorldCell) {
    with_result(world, |result| assert_eq!(result.report.failed, count));
}

#[then("{count} rows were attempted")]
fn then_attempted(count: usize, #[from(world)] world: &WorldCell) {
    with_result(world, |result| {
        assert_eq!(result.report.attempted(), count);
        assert_eq!(result.features.len(), count);
    });
}

#[then("the provider was called {count} times")]
fn then_calls(count: usize, #[from(world)] world: &WorldCell) {
    let borrowed = world.borrow();
    let stub = borrowed.stub.as_ref().expect("a stub provider must be registered");
    assert_eq!(stub.calls(), count);
}

#[then("{count} progress events were received")]
fn then_events(count: usize, #[from(world)] world: &WorldCell) {
    let borrowed = world.borrow();
    assert_eq!(borrowed.events.len(), count);
    assert_eq!(borrowed.events.last().map(|event| event.remaining), Some(0));
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/geocode_run.feature", name = $title)]
        fn $fn_name(world: WorldCell) {
            let _ = world;
        }
    };
}

register_scenario!(direct_run, "coordinate columns bypass the provider");
register_scenario!(synchronous_run, "small address files geocode synchronously");
register_scenario!(asynchronous_run, "large address files geocode in the background");
register_scenario!(degraded_run, "a provider without a credential degrades the run");
register_scenario!(cancelled_run, "cancelling a background run keeps partial results");
register_scenario!(failures_continue, "per-row failures do not stop the run");
