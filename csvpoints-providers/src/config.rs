//! Construction-time settings shared by every HTTP geocoder.

use std::time::Duration;

use csvpoints_core::ProviderId;
use thiserror::Error;

/// Default user agent for services that do not take one as a credential.
pub const DEFAULT_USER_AGENT: &str = "csvpoints/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Nominatim request timeout in seconds.
const NOMINATIM_TIMEOUT_SECS: u64 = 15;

/// Error type for geocoder construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The configured base URL cannot be parsed or cannot carry a path.
    #[error("invalid base URL {url:?}: {message}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        message: String,
    },
}

/// Configuration for an HTTP geocoder.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use csvpoints_core::ProviderId;
/// use csvpoints_providers::HttpGeocoderConfig;
///
/// let config = HttpGeocoderConfig::for_provider(ProviderId::OpenCage)
///     .with_base_url("http://127.0.0.1:8080/geocode/v1/json")
///     .with_timeout(Duration::from_secs(5));
/// assert_eq!(config.min_interval, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpGeocoderConfig {
    /// Service endpoint, without query parameters.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Minimum spacing between consecutive requests.
    pub min_interval: Duration,
}

impl HttpGeocoderConfig {
    /// Published endpoint and courtesy limits for `provider`.
    #[must_use]
    pub fn for_provider(provider: ProviderId) -> Self {
        let (base_url, timeout_secs, interval_ms) = match provider {
            ProviderId::Nominatim => (
                "https://nominatim.openstreetmap.org/search",
                NOMINATIM_TIMEOUT_SECS,
                1_000,
            ),
            ProviderId::Google => (
                "https://maps.googleapis.com/maps/api/geocode/json",
                DEFAULT_TIMEOUT_SECS,
                50,
            ),
            ProviderId::Mapbox => (
                "https://api.mapbox.com/geocoding/v5/mapbox.places",
                DEFAULT_TIMEOUT_SECS,
                50,
            ),
            ProviderId::OpenCage => (
                "https://api.opencagedata.com/geocode/v1/json",
                DEFAULT_TIMEOUT_SECS,
                100,
            ),
            ProviderId::YahooJapan => (
                "https://map.yahooapis.jp/geocode/V1/geoCoder",
                DEFAULT_TIMEOUT_SECS,
                100,
            ),
        };
        Self {
            base_url: base_url.to_owned(),
            timeout: Duration::from_secs(timeout_secs),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            min_interval: Duration::from_millis(interval_ms),
        }
    }

    /// Point the geocoder at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the minimum spacing between requests. Zero disables throttling.
    #[must_use]
    pub const fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }
}
