//! Mapbox forward geocoding.
//!
//! The address travels in the path as `{address}.json`; the credential is the
//! access token.

use csvpoints_core::{Coordinates, GeocodeError, GeocodeMatch, GeocodeProvider, ProviderId};
use serde::Deserialize;

use crate::config::{HttpGeocoderConfig, ProviderBuildError};
use crate::transport::{HttpTransport, RequestHeaders};

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection {
    #[serde(default)]
    pub(crate) features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Feature {
    pub(crate) geometry: PointGeometry,
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) place_name: Option<String>,
    #[serde(default)]
    pub(crate) place_type: Vec<String>,
    #[serde(default)]
    pub(crate) context: Vec<ContextEntry>,
    #[serde(default)]
    pub(crate) properties: FeatureProperties,
}

/// Enclosing region of a feature, such as its postcode or city.
#[derive(Debug, Deserialize)]
pub(crate) struct ContextEntry {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) text: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FeatureProperties {
    #[serde(default)]
    pub(crate) accuracy: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PointGeometry {
    /// `[longitude, latitude]`.
    pub(crate) coordinates: Vec<f64>,
}

/// Geocoder backed by the Mapbox Geocoding API.
#[derive(Debug)]
pub struct MapboxGeocoder {
    transport: HttpTransport,
}

impl MapboxGeocoder {
    /// Geocoder using the public Mapbox endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new() -> Result<Self, ProviderBuildError> {
        Self::with_config(&HttpGeocoderConfig::for_provider(ProviderId::Mapbox))
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

pub(crate) fn convert_features(
    collection: FeatureCollection,
) -> Result<GeocodeMatch, GeocodeError> {
    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or(GeocodeError::NoResult)?;
    let coordinates = match feature.geometry.coordinates.as_slice() {
        [longitude, latitude, ..] => Coordinates::new(*latitude, *longitude)?,
        _ => {
            return Err(GeocodeError::Parse {
                message: "feature geometry has fewer than two coordinates".to_owned(),
            });
        }
    };
    let postcode = feature
        .context
        .iter()
        .find(|entry| entry.id.starts_with("postcode."))
        .map(|entry| entry.text.clone());
    Ok(GeocodeMatch::new(coordinates)
        .with_precision(feature.place_type.into_iter().next())
        .with_attribute("id", feature.id.unwrap_or_default())
        .with_attribute("place_name", feature.place_name.unwrap_or_default())
        .with_attribute("postcode", postcode.unwrap_or_default())
        .with_attribute("accuracy", feature.properties.accuracy.unwrap_or_default()))
}

impl GeocodeProvider for MapboxGeocoder {
    fn geocode(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(GeocodeError::EmptyAddress);
        }
        let mut url = self.transport.endpoint();
        url.path_segments_mut()
            .map_err(|()| GeocodeError::Parse {
                message: "endpoint cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .push(&format!("{query}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", credential)
            .append_pair("limit", "1");
        let collection: FeatureCollection =
            self.transport.get_json(url, RequestHeaders::default())?;
        convert_features(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(json: &str) -> FeatureCollection {
        serde_json::from_str(json).expect("should deserialise")
    }

    #[rstest]
    fn coordinates_are_longitude_first() {
        let collection = parse(
            r#"{"type":"FeatureCollection","features":[
                {"place_type":["address"],"geometry":{"type":"Point","coordinates":[-73.9857,40.7484]}}
            ]}"#,
        );
        let found = convert_features(collection).expect("should convert");
        assert_eq!(found.latitude(), 40.7484);
        assert_eq!(found.longitude(), -73.9857);
        assert_eq!(found.details.precision.as_deref(), Some("address"));
    }

    #[rstest]
    fn feature_fields_become_details() {
        let collection = parse(
            r#"{"features":[{
                "id":"address.4356035406756260",
                "place_type":["address"],
                "place_name":"350 5th Avenue, New York, New York 10118, United States",
                "properties":{"accuracy":"rooftop"},
                "context":[
                    {"id":"neighborhood.2103290","text":"Midtown"},
                    {"id":"postcode.13482670360296810","text":"10118"}
                ],
                "geometry":{"type":"Point","coordinates":[-73.9857,40.7484]}
            }]}"#,
        );
        let found = convert_features(collection).expect("should convert");
        let attributes: Vec<_> = found
            .details
            .attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        assert_eq!(
            attributes,
            [
                ("id", "address.4356035406756260"),
                (
                    "place_name",
                    "350 5th Avenue, New York, New York 10118, United States"
                ),
                ("postcode", "10118"),
                ("accuracy", "rooftop"),
            ]
        );
    }

    #[rstest]
    fn empty_collection_is_no_result() {
        let collection = parse(r#"{"type":"FeatureCollection","features":[]}"#);
        assert_eq!(convert_features(collection), Err(GeocodeError::NoResult));
    }

    #[rstest]
    fn short_coordinates_are_parse_errors() {
        let collection = parse(r#"{"features":[{"geometry":{"coordinates":[1.0]}}]}"#);
        assert!(matches!(
            convert_features(collection),
            Err(GeocodeError::Parse { .. })
        ));
    }
}
