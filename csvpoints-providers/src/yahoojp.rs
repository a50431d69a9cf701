//! Yahoo! JAPAN geocoder.
//!
//! Coordinates arrive as a single `"longitude,latitude"` string.

use csvpoints_core::{Coordinates, GeocodeError, GeocodeMatch, GeocodeProvider, ProviderId};
use serde::Deserialize;

use crate::config::{HttpGeocoderConfig, ProviderBuildError};
use crate::transport::{HttpTransport, RequestHeaders};

#[derive(Debug, Deserialize)]
pub(crate) struct GeocoderResponse {
    #[serde(rename = "Feature", default)]
    pub(crate) features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Feature {
    #[serde(rename = "Geometry")]
    pub(crate) geometry: Geometry,
    #[serde(rename = "Id", default)]
    pub(crate) id: Option<String>,
    #[serde(rename = "Name", default)]
    pub(crate) name: Option<String>,
    #[serde(rename = "Property", default)]
    pub(crate) property: Property,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Property {
    #[serde(rename = "MatchLevel", default)]
    pub(crate) match_level: Option<String>,
    #[serde(rename = "AddressMatchingLevel", default)]
    pub(crate) address_matching_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    #[serde(rename = "Coordinates")]
    pub(crate) coordinates: String,
}

/// Geocoder backed by the Yahoo! JAPAN map API. The credential is the
/// application id.
#[derive(Debug)]
pub struct YahooJapanGeocoder {
    transport: HttpTransport,
}

impl YahooJapanGeocoder {
    /// Geocoder using the public Yahoo! JAPAN endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpGeocoderConfig::for_provider(ProviderId::YahooJapan))
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

fn parse_pair(text: &str) -> Result<Coordinates, GeocodeError> {
    let parse_error = || GeocodeError::Parse {
        message: format!("invalid coordinate pair {text:?}"),
    };
    let mut parts = text.split(',').map(str::trim);
    let (Some(lon), Some(lat)) = (parts.next(), parts.next()) else {
        return Err(parse_error());
    };
    let longitude = lon.parse::<f64>().map_err(|_| parse_error())?;
    let latitude = lat.parse::<f64>().map_err(|_| parse_error())?;
    Ok(Coordinates::new(latitude, longitude)?)
}

pub(crate) fn convert_response(response: GeocoderResponse) -> Result<GeocodeMatch, GeocodeError> {
    let feature = response
        .features
        .into_iter()
        .next()
        .ok_or(GeocodeError::NoResult)?;
    let coordinates = parse_pair(&feature.geometry.coordinates)?;
    let property = feature.property;
    Ok(GeocodeMatch::new(coordinates)
        .with_precision(property.match_level)
        .with_attribute("Uid", feature.id.unwrap_or_default())
        .with_attribute("Name", feature.name.unwrap_or_default())
        .with_attribute(
            "AddressMatchingLevel",
            property.address_matching_level.unwrap_or_default(),
        ))
}

impl GeocodeProvider for YahooJapanGeocoder {
    fn geocode(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        let mut url = self.transport.endpoint();
        url.query_pairs_mut()
            .append_pair("appid", credential)
            .append_pair("query", query)
            .append_pair("output", "json");
        let response: GeocoderResponse = self.transport.get_json(url, RequestHeaders::default())?;
        convert_response(response)
    }
}
