//! Google Geocoding API.

use csvpoints_core::{Coordinates, GeocodeError, GeocodeMatch, GeocodeProvider, ProviderId};
use serde::Deserialize;

use crate::config::{HttpGeocoderConfig, ProviderBuildError};
use crate::transport::{HttpTransport, RequestHeaders};

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResponse {
    pub(crate) status: String,
    #[serde(default)]
    pub(crate) results: Vec<GeocodeResult>,
    #[serde(default)]
    pub(crate) error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub(crate) geometry: Geometry,
    #[serde(default)]
    pub(crate) types: Vec<String>,
    #[serde(default)]
    pub(crate) formatted_address: Option<String>,
    #[serde(default)]
    pub(crate) place_id: Option<String>,
    #[serde(default)]
    pub(crate) address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub(crate) partial_match: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    pub(crate) location: Location,
    #[serde(default)]
    pub(crate) location_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddressComponent {
    pub(crate) long_name: String,
    #[serde(default)]
    pub(crate) types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Location {
    pub(crate) lat: f64,
    pub(crate) lng: f64,
}

/// Geocoder backed by the Google Geocoding API. The credential is the API
/// key.
#[derive(Debug)]
pub struct GoogleGeocoder {
    transport: HttpTransport,
}

impl GoogleGeocoder {
    /// Geocoder using the public Google endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpGeocoderConfig::for_provider(ProviderId::Google))
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

/// Result types from most to least precise.
const PRECISION_ORDER: [&str; 14] = [
    "street_address",
    "premise",
    "subpremise",
    "route",
    "intersection",
    "plus_code",
    "neighborhood",
    "sublocality",
    "sublocality_level_1",
    "locality",
    "administrative_area_level_3",
    "administrative_area_level_2",
    "administrative_area_level_1",
    "country",
];

fn precision(types: &[String]) -> Option<String> {
    PRECISION_ORDER
        .iter()
        .find(|wanted| types.iter().any(|kind| kind == *wanted))
        .map(|wanted| (*wanted).to_owned())
        .or_else(|| types.first().cloned())
}

fn postal_code(components: &[AddressComponent]) -> Option<&str> {
    components
        .iter()
        .find(|component| component.types.iter().any(|kind| kind == "postal_code"))
        .map(|component| component.long_name.as_str())
}

fn describe_status(status: &str) -> &'static str {
    match status {
        "OVER_QUERY_LIMIT" => "over query limit",
        "OVER_DAILY_LIMIT" => "over daily limit",
        "REQUEST_DENIED" => "request denied",
        "INVALID_REQUEST" => "invalid request",
        _ => "unexpected status",
    }
}

pub(crate) fn convert_response(response: GeocodeResponse) -> Result<GeocodeMatch, GeocodeError> {
    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(GeocodeError::NoResult),
        other => {
            let message = response
                .error_message
                .unwrap_or_else(|| describe_status(other).to_owned());
            return Err(GeocodeError::Service {
                code: other.to_owned(),
                message,
            });
        }
    }
    let first = response
        .results
        .into_iter()
        .next()
        .ok_or(GeocodeError::NoResult)?;
    let location = &first.geometry.location;
    let coordinates = Coordinates::new(location.lat, location.lng)?;
    let found = GeocodeMatch::new(coordinates)
        .with_precision(precision(&first.types))
        .with_attribute("formatted_address", first.formatted_address.unwrap_or_default())
        .with_attribute("place_id", first.place_id.unwrap_or_default())
        .with_attribute(
            "location_type",
            first.geometry.location_type.unwrap_or_default(),
        )
        .with_attribute("types", first.types.join("|"))
        .with_attribute(
            "postal_code",
            postal_code(&first.address_components).unwrap_or_default(),
        )
        .with_attribute(
            "partial_match",
            first
                .partial_match
                .map_or_else(String::new, |partial| partial.to_string()),
        );
    Ok(found)
}

impl GeocodeProvider for GoogleGeocoder {
    fn geocode(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        let mut url = self.transport.endpoint();
        url.query_pairs_mut()
            .append_pair("address", query)
            .append_pair("key", credential);
        let response: GeocodeResponse = self.transport.get_json(url, RequestHeaders::default())?;
        convert_response(response)
    }
}
