//! What a provider reports for a matched address.

use indexmap::IndexMap;

use crate::coordinate::Coordinates;

/// Service-specific description of a match.
///
/// `precision` uses the service's own vocabulary (a Google result type, a
/// Mapbox place type, an OpenCage confidence, and so on). `attributes` hold
/// the extra fields a service reports, in the order the provider adds them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchDetails {
    /// How closely the match fits the address.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub precision: Option<String>,
    /// Extra attributes reported by the service.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "IndexMap::is_empty")
    )]
    pub attributes: IndexMap<String, String>,
}

impl MatchDetails {
    /// Whether neither a precision nor any attribute was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.precision.is_none() && self.attributes.is_empty()
    }
}

/// A provider's answer for one address.
///
/// # Examples
///
/// ```
/// use csvpoints_core::{Coordinates, GeocodeMatch};
///
/// let found = GeocodeMatch::new(Coordinates::new(35.68, 139.76)?)
///     .with_precision(Some("street_address".to_owned()))
///     .with_attribute("place_id", "ChIJ")
///     .with_attribute("postal_code", "");
/// assert_eq!(found.details.precision.as_deref(), Some("street_address"));
/// assert_eq!(found.details.attributes.len(), 1);
/// # Ok::<(), csvpoints_core::CoordinateError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeMatch {
    /// Resolved position.
    pub coordinates: Coordinates,
    /// Precision and extra attributes.
    pub details: MatchDetails,
}

impl GeocodeMatch {
    /// Match carrying only a position.
    #[must_use]
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            details: MatchDetails::default(),
        }
    }

    /// Record the precision; blank values are dropped.
    #[must_use]
    pub fn with_precision(mut self, precision: Option<String>) -> Self {
        self.details.precision = precision.filter(|value| !value.trim().is_empty());
        self
    }

    /// Record `value` under `name`; blank values are dropped.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.details.attributes.insert(name.to_owned(), value);
        }
        self
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.coordinates.latitude()
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.coordinates.longitude()
    }
}

impl From<Coordinates> for GeocodeMatch {
    fn from(coordinates: Coordinates) -> Self {
        Self::new(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn origin() -> Coordinates {
        Coordinates::new(0.0, 0.0).expect("valid")
    }

    #[rstest]
    fn attributes_keep_insertion_order() {
        let found = GeocodeMatch::new(origin())
            .with_attribute("formatted", "Tokyo")
            .with_attribute("confidence", "9")
            .with_attribute("postcode", "100-0005");
        let names: Vec<_> = found.details.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, ["formatted", "confidence", "postcode"]);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    #[case(Some("  ".to_owned()))]
    fn blank_precision_is_dropped(#[case] precision: Option<String>) {
        let found = GeocodeMatch::new(origin()).with_precision(precision);
        assert!(found.details.is_empty());
    }

    #[rstest]
    fn coordinates_convert_into_bare_matches() {
        let found = GeocodeMatch::from(origin());
        assert_eq!(found.coordinates, origin());
        assert!(found.details.is_empty());
    }
}
