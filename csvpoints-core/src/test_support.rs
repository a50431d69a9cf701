//! Deterministic test doubles for orchestrator tests.
//!
//! [`StubGeocoder`] answers from a fixed table without touching the network
//! and records every call it receives. [`CancellingGeocoder`] trips a
//! [`CancelToken`] after a set number of lookups, and [`RefusingSpawner`]
//! simulates a scheduler that cannot start background work.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::coordinate::Coordinates;
use crate::geocode::{GeocodeError, GeocodeMatch, GeocodeProvider};
use crate::orchestrator::{CancelToken, Spawner, Task};

/// Stub [`GeocodeProvider`] with canned answers.
///
/// # Example
///
/// ```
/// use csvpoints_core::{GeocodeError, GeocodeProvider, test_support::StubGeocoder};
///
/// let stub = StubGeocoder::failing(GeocodeError::NoResult)
///     .with_answer("Kyoto", 35.01, 135.77);
/// assert!(stub.geocode("Kyoto", "key").is_ok());
/// assert_eq!(stub.geocode("Atlantis", "key"), Err(GeocodeError::NoResult));
/// assert_eq!(stub.calls(), 2);
/// ```
#[derive(Debug)]
pub struct StubGeocoder {
    fallback: Result<GeocodeMatch, GeocodeError>,
    answers: HashMap<String, Result<GeocodeMatch, GeocodeError>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, String)>>,
}

impl StubGeocoder {
    fn with_fallback(fallback: Result<GeocodeMatch, GeocodeError>) -> Self {
        Self {
            fallback,
            answers: HashMap::new(),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Stub resolving every address to the same position.
    ///
    /// Out-of-range values make every lookup fail with
    /// [`GeocodeError::InvalidCoordinates`].
    #[must_use]
    pub fn resolving(latitude: f64, longitude: f64) -> Self {
        Self::with_fallback(position(latitude, longitude))
    }

    /// Stub failing every lookup with `error`.
    #[must_use]
    pub fn failing(error: GeocodeError) -> Self {
        Self::with_fallback(Err(error))
    }

    /// Answer `address` with the given position.
    #[must_use]
    pub fn with_answer(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        self.answers
            .insert(address.to_owned(), position(latitude, longitude));
        self
    }

    /// Answer `address` with a full match, details included.
    #[must_use]
    pub fn with_match(mut self, address: &str, found: GeocodeMatch) -> Self {
        self.answers.insert(address.to_owned(), Ok(found));
        self
    }

    /// Fail lookups of `address` with `error`.
    #[must_use]
    pub fn with_failure(mut self, address: &str, error: GeocodeError) -> Self {
        self.answers.insert(address.to_owned(), Err(error));
        self
    }

    /// Number of lookups performed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Addresses looked up, in call order.
    #[must_use]
    pub fn addresses(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .map(|(address, _)| address)
            .collect()
    }

    /// Credentials received, in call order.
    #[must_use]
    pub fn credentials(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .map(|(_, credential)| credential)
            .collect()
    }

    fn recorded(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn position(latitude: f64, longitude: f64) -> Result<GeocodeMatch, GeocodeError> {
    let coordinates = Coordinates::new(latitude, longitude)?;
    Ok(GeocodeMatch::new(coordinates))
}

impl GeocodeProvider for StubGeocoder {
    fn geocode(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((address.to_owned(), credential.to_owned()));
        self.answers
            .get(address)
            .unwrap_or(&self.fallback)
            .clone()
    }
}

/// Geocoder that cancels a run once it has answered `after` lookups.
///
/// Cancellation is observed at the next row boundary, so exactly `after`
/// rows are processed.
#[derive(Debug)]
pub struct CancellingGeocoder {
    inner: StubGeocoder,
    token: CancelToken,
    after: usize,
}

impl CancellingGeocoder {
    /// Wrap `inner`, cancelling `token` after `after` lookups.
    #[must_use]
    pub const fn new(inner: StubGeocoder, token: CancelToken, after: usize) -> Self {
        Self {
            inner,
            token,
            after,
        }
    }

    /// Number of lookups performed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.inner.calls()
    }
}

impl GeocodeProvider for CancellingGeocoder {
    fn geocode(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError> {
        let result = self.inner.geocode(address, credential);
        if self.inner.calls() >= self.after {
            self.token.cancel();
        }
        result
    }
}

/// Spawner whose every attempt fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct RefusingSpawner;

impl Spawner for RefusingSpawner {
    fn spawn(&self, task: Task) -> io::Result<()> {
        drop(task);
        Err(io::Error::other("no worker threads available"))
    }
}
