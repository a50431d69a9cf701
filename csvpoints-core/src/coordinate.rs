//! Coordinate values and parsing of textual degrees.
//!
//! Text may be plain decimal degrees (`35.658083`) or sexagesimal with
//! optional unit marks and a trailing hemisphere letter (`35°39'29.1"N`,
//! `35度39分29.1秒N`). A hemisphere letter overrides the sign of the degrees.

use std::sync::LazyLock;

use geo::Point;
use regex::Regex;
use thiserror::Error;

static DMS: LazyLock<Regex> = LazyLock::new(sexagesimal_pattern);

#[expect(
    clippy::expect_used,
    reason = "the pattern is a constant and is covered by unit tests"
)]
fn sexagesimal_pattern() -> Regex {
    Regex::new(
        r#"^\s*(?P<deg>[-+]?\d+(?:\.\d+)?)(?:[°º度\s]\s*(?P<min>\d+(?:\.\d+)?))?(?:['’′分]\s*(?P<sec>\d+(?:\.\d+)?))?(?:["”″秒])?\s*(?P<hem>[NnSsEeWw])?\s*$"#,
    )
    .expect("sexagesimal pattern is a valid regular expression")
}

/// Errors raised while parsing or validating coordinates.
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoordinateError {
    /// The text is neither decimal nor sexagesimal degrees.
    #[error("cannot parse coordinate: {text:?}")]
    Unparseable {
        /// The rejected input.
        text: String,
    },
    /// A value was NaN or infinite.
    #[error("coordinate is not a finite number")]
    NonFinite,
    /// Latitude outside `[-90, 90]`.
    #[error("latitude {value} is out of range")]
    LatitudeOutOfRange {
        /// The rejected latitude.
        value: f64,
    },
    /// Longitude outside `[-180, 180]`.
    #[error("longitude {value} is out of range")]
    LongitudeOutOfRange {
        /// The rejected longitude.
        value: f64,
    },
}

/// A validated WGS84 position.
///
/// # Examples
///
/// ```
/// use csvpoints_core::Coordinates;
///
/// let here = Coordinates::new(35.681236, 139.767125)?;
/// assert_eq!(here.to_point().x(), 139.767125);
/// # Ok::<(), csvpoints_core::CoordinateError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate and construct a position.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] when either value is non-finite or out of
    /// range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange { value: latitude });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse latitude and longitude text.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] when either value fails to parse or lies
    /// out of range.
    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, CoordinateError> {
        Self::new(parse_latitude(latitude)?, parse_longitude(longitude)?)
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Point geometry with `x = longitude` and `y = latitude`.
    #[must_use]
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Parse decimal or sexagesimal degrees into a signed decimal value.
///
/// # Errors
///
/// Returns [`CoordinateError::Unparseable`] when `text` matches neither form.
///
/// # Examples
///
/// ```
/// use csvpoints_core::coordinate::parse_degrees;
///
/// assert_eq!(parse_degrees("-33.5")?, -33.5);
/// assert_eq!(parse_degrees("10°30'W")?, -10.5);
/// # Ok::<(), csvpoints_core::CoordinateError>(())
/// ```
#[expect(
    clippy::float_arithmetic,
    reason = "sexagesimal conversion requires float maths"
)]
pub fn parse_degrees(text: &str) -> Result<f64, CoordinateError> {
    let unparseable = || CoordinateError::Unparseable {
        text: text.to_owned(),
    };
    let Some(captures) = DMS.captures(text) else {
        return text.trim().parse::<f64>().map_err(|_| unparseable());
    };
    let component = |name: &str| -> Result<Option<f64>, CoordinateError> {
        captures
            .name(name)
            .map(|value| value.as_str().parse::<f64>().map_err(|_| unparseable()))
            .transpose()
    };
    let degrees = component("deg")?.ok_or_else(unparseable)?;
    let mut magnitude = degrees.abs();
    if let Some(minutes) = component("min")? {
        magnitude += minutes / 60.0;
    }
    if let Some(seconds) = component("sec")? {
        magnitude += seconds / 3600.0;
    }
    let negative = match captures.name("hem").map(|hem| hem.as_str()) {
        Some("S" | "s" | "W" | "w") => true,
        Some(_) => false,
        None => degrees.is_sign_negative(),
    };
    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse a latitude and check it lies in `[-90, 90]`.
///
/// # Errors
///
/// Returns [`CoordinateError`] when parsing fails or the value is out of
/// range.
pub fn parse_latitude(text: &str) -> Result<f64, CoordinateError> {
    let value = parse_degrees(text)?;
    if !value.is_finite() {
        return Err(CoordinateError::NonFinite);
    }
    if (-90.0..=90.0).contains(&value) {
        Ok(value)
    } else {
        Err(CoordinateError::LatitudeOutOfRange { value })
    }
}

/// Parse a longitude and check it lies in `[-180, 180]`.
///
/// # Errors
///
/// Returns [`CoordinateError`] when parsing fails or the value is out of
/// range.
pub fn parse_longitude(text: &str) -> Result<f64, CoordinateError> {
    let value = parse_degrees(text)?;
    if !value.is_finite() {
        return Err(CoordinateError::NonFinite);
    }
    if (-180.0..=180.0).contains(&value) {
        Ok(value)
    } else {
        Err(CoordinateError::LongitudeOutOfRange { value })
    }
}
