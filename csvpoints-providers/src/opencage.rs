//! OpenCage geocoding.

use csvpoints_core::{Coordinates, GeocodeError, GeocodeMatch, GeocodeProvider, ProviderId};
use serde::Deserialize;

use crate::config::{HttpGeocoderConfig, ProviderBuildError};
use crate::transport::{HttpTransport, RequestHeaders};

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    #[serde(default)]
    pub(crate) results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub(crate) geometry: Geometry,
    /// Bounding-box size score from 0 (unknown) to 10 (under 250 m).
    #[serde(default)]
    pub(crate) confidence: Option<u8>,
    #[serde(default)]
    pub(crate) formatted: Option<String>,
    #[serde(default)]
    pub(crate) components: Components,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Components {
    #[serde(default)]
    pub(crate) postcode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    pub(crate) lat: f64,
    pub(crate) lng: f64,
}

/// Geocoder backed by the OpenCage API. The credential is the API key.
#[derive(Debug)]
pub struct OpenCageGeocoder {
    transport: HttpTransport,
}

impl OpenCageGeocoder {
    /// Geocoder using the public OpenCage endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpGeocoderConfig::for_provider(ProviderId::OpenCage))
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
        })
    }
}

pub(crate) fn convert_response(response: GeocodeResponse) -> Result<GeocodeMatch, GeocodeError> {
    let first = response
        .results
        .into_iter()
        .next()
        .ok_or(GeocodeError::NoResult)?;
    let coordinates = Coordinates::new(first.geometry.lat, first.geometry.lng)?;
    let confidence = first.confidence.map(|score| score.to_string());
    Ok(GeocodeMatch::new(coordinates)
        .with_precision(confidence.as_ref().map(|score| format!("confidence_{score}")))
        .with_attribute("formatted", first.formatted.unwrap_or_default())
        .with_attribute("postcode", first.components.postcode.unwrap_or_default())
        .with_attribute("confidence", confidence.unwrap_or_default()))
}

impl GeocodeProvider for OpenCageGeocoder {
    fn geocode(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        let mut url = self.transport.endpoint();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("key", credential)
            .append_pair("limit", "1")
            .append_pair("no_annotations", "1");
        let response: GeocodeResponse = self.transport.get_json(url, RequestHeaders::default())?;
        convert_response(response)
    }
}
