use thiserror::Error;

use crate::coordinate::CoordinateError;

/// Errors from [`crate::geocode::GeocodeProvider::geocode`].
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeocodeError {
    /// The address was blank after trimming.
    ///
    /// The orchestrator never sends blank addresses to a provider; this
    /// variant records the row as failed without a lookup.
    #[error("address is empty")]
    EmptyAddress,
    /// The service answered but found no match.
    #[error("no result for address")]
    NoResult,
    /// The request did not complete in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL with the query string removed.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service returned a non-success HTTP status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Request URL with the query string removed.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The request failed before a response arrived.
    #[error("network error for {url}: {message}")]
    Network {
        /// Request URL with the query string removed.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The service rejected the request, for example an invalid key or an
    /// exhausted quota.
    #[error("service error {code}: {message}")]
    Service {
        /// Service-specific status code.
        code: String,
        /// Service-supplied message.
        message: String,
    },
    /// The response body could not be interpreted.
    #[error("failed to parse response: {message}")]
    Parse {
        /// Error detail.
        message: String,
    },
    /// The service returned coordinates outside the valid range.
    #[error(transparent)]
    InvalidCoordinates(#[from] CoordinateError),
}
