//! OpenStreetMap Nominatim search.
//!
//! Nominatim has no API keys. Its usage policy asks every client to identify
//! itself, so the credential is sent as the `User-Agent` header and usually
//! holds a contact address. Results are cached per address for the lifetime
//! of the geocoder, and requests are spaced at least one second apart.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use csvpoints_core::{Coordinates, GeocodeError, GeocodeMatch, GeocodeProvider, ProviderId};
use serde::Deserialize;

use crate::config::{HttpGeocoderConfig, ProviderBuildError};
use crate::transport::{HttpTransport, RequestHeaders};

const ACCEPT_LANGUAGE: &str = "ja,en;q=0.8";

/// One item of a `format=jsonv2` search response.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchPlace {
    pub(crate) lat: String,
    pub(crate) lon: String,
    #[serde(default)]
    pub(crate) place_id: Option<u64>,
    #[serde(default)]
    pub(crate) display_name: Option<String>,
    #[serde(default)]
    pub(crate) place_rank: Option<u32>,
    #[serde(rename = "type", default)]
    pub(crate) kind: Option<String>,
}

/// Geocoder backed by the Nominatim search endpoint.
#[derive(Debug)]
pub struct NominatimGeocoder {
    transport: HttpTransport,
    cache: Mutex<HashMap<String, Result<GeocodeMatch, GeocodeError>>>,
}

impl NominatimGeocoder {
    /// Geocoder using the public Nominatim instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpGeocoderConfig::for_provider(ProviderId::Nominatim))
    }

    /// Geocoder with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn with_config(config: &HttpGeocoderConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
            cache: Mutex::new(HashMap::new()),
        })
    }

    fn lookup(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError> {
        let mut url = self.transport.endpoint();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "jsonv2")
            .append_pair("limit", "1")
            .append_pair("addressdetails", "0");
        let headers = RequestHeaders {
            user_agent: Some(credential),
            accept_language: Some(ACCEPT_LANGUAGE),
        };
        let places: Vec<SearchPlace> = self.transport.get_json(url, headers)?;
        convert_places(places)
    }
}

pub(crate) fn convert_places(places: Vec<SearchPlace>) -> Result<GeocodeMatch, GeocodeError> {
    let place = places.into_iter().next().ok_or(GeocodeError::NoResult)?;
    let parse = |value: &str| {
        value.trim().parse::<f64>().map_err(|err| GeocodeError::Parse {
            message: format!("invalid coordinate {value:?}: {err}"),
        })
    };
    let coordinates = Coordinates::new(parse(&place.lat)?, parse(&place.lon)?)?;
    let text = |value: Option<String>| value.unwrap_or_default();
    Ok(GeocodeMatch::new(coordinates)
        .with_precision(place.kind)
        .with_attribute("place_id", text(place.place_id.map(|id| id.to_string())))
        .with_attribute("display_name", text(place.display_name))
        .with_attribute("place_rank", text(place.place_rank.map(|rank| rank.to_string()))))
}

impl GeocodeProvider for NominatimGeocoder {
    fn geocode(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError> {
        let key = address.trim();
        if key.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        if let Some(cached) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return cached.clone();
        }
        let result = self.lookup(key, credential);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), result.clone());
        result
    }
}
