//! Blocking JSON-over-HTTP transport shared by the geocoders.
//!
//! [`GeocodeProvider`](csvpoints_core::GeocodeProvider) is synchronous so the
//! core stays embeddable in synchronous contexts. The transport bridges to
//! `reqwest`'s async client by blocking on a Tokio runtime it owns, or on the
//! caller's runtime when one is already running with the multi-threaded
//! flavour.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use csvpoints_core::GeocodeError;
use log::debug;
use reqwest::Client;
use reqwest::header::{ACCEPT_LANGUAGE, USER_AGENT};
use serde::de::DeserializeOwned;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use crate::config::{HttpGeocoderConfig, ProviderBuildError};

/// Per-request header overrides.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct RequestHeaders<'a> {
    pub(crate) user_agent: Option<&'a str>,
    pub(crate) accept_language: Option<&'a str>,
}

/// Enforces a minimum interval between requests from one geocoder.
#[derive(Debug)]
struct Throttle {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// Sleep until the interval since the previous request has elapsed.
    fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = *last {
            let pause = self.min_interval.saturating_sub(previous.elapsed());
            if !pause.is_zero() {
                thread::sleep(pause);
            }
        }
        *last = Some(Instant::now());
    }
}

/// Strip the query string, which carries credentials for most services.
pub(crate) fn redact(url: &Url) -> String {
    let mut redacted = url.clone();
    redacted.set_query(None);
    redacted.to_string()
}

/// HTTP client, runtime and endpoint for one geocoder.
pub(crate) struct HttpTransport {
    client: Client,
    runtime: Runtime,
    base_url: Url,
    timeout: Duration,
    throttle: Throttle,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("client", &self.client)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("throttle", &self.throttle)
            .finish()
    }
}

impl HttpTransport {
    pub(crate) fn new(config: &HttpGeocoderConfig) -> Result<Self, ProviderBuildError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|err| ProviderBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: err.to_string(),
            })?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: "URL cannot carry a path".to_owned(),
            });
        }
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self {
            client,
            runtime,
            base_url,
            timeout: config.timeout,
            throttle: Throttle::new(config.min_interval),
        })
    }

    /// Copy of the configured endpoint, ready for query parameters.
    pub(crate) fn endpoint(&self) -> Url {
        self.base_url.clone()
    }

    /// Fetch `url` and decode its JSON body.
    ///
    /// # Runtime requirements
    ///
    /// When called from within an existing Tokio runtime, the runtime must be
    /// multi-threaded. Calls from a `current_thread` runtime fall back to the
    /// transport's own runtime, which blocks the caller's runtime while the
    /// request is in flight.
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        headers: RequestHeaders<'_>,
    ) -> Result<T, GeocodeError> {
        self.throttle.wait();
        let future = self.fetch_json(url, headers);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: Url,
        headers: RequestHeaders<'_>,
    ) -> Result<T, GeocodeError> {
        let display = redact(&url);
        debug!("GET {display}");

        let mut request = self.client.get(url);
        if let Some(agent) = headers.user_agent {
            request = request.header(USER_AGENT, agent);
        }
        if let Some(language) = headers.accept_language {
            request = request.header(ACCEPT_LANGUAGE, language);
        }
        let response = request
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err, &display))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(err, &display))?;

        response
            .json::<T>()
            .await
            .map_err(|err| GeocodeError::Parse {
                message: err.without_url().to_string(),
            })
    }

    /// Convert a reqwest error to a `GeocodeError`, dropping the URL that
    /// `reqwest` embeds because it may contain credentials.
    fn convert_reqwest_error(&self, error: reqwest::Error, url: &str) -> GeocodeError {
        if error.is_timeout() {
            return GeocodeError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return GeocodeError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.without_url().to_string(),
            };
        }

        GeocodeError::Network {
            url: url.to_owned(),
            message: error.without_url().to_string(),
        }
    }
}
