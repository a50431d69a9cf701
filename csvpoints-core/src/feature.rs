//! Per-row outcomes and the point features handed to the caller.

use geo::Point;

use crate::coordinate::Coordinates;
use crate::geocode::{GeocodeMatch, MatchDetails};
use crate::row::Row;

/// What happened to one input row.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "outcome", rename_all = "lowercase"))]
pub enum GeocodeOutcome {
    /// Coordinates were obtained from columns or a provider.
    Resolved {
        /// Latitude in decimal degrees.
        latitude: f64,
        /// Longitude in decimal degrees.
        longitude: f64,
        /// What the provider reported beyond the position. Empty for rows
        /// placed from their own columns.
        #[cfg_attr(
            feature = "serde",
            serde(default, skip_serializing_if = "MatchDetails::is_empty")
        )]
        details: MatchDetails,
    },
    /// The row was attempted but produced no coordinates.
    Failed {
        /// Why the attempt failed.
        reason: String,
    },
    /// The row was kept without geometry and without an attempt.
    Skipped {
        /// Why no attempt was made.
        reason: String,
    },
}

impl GeocodeOutcome {
    /// Outcome for a position without provider details.
    #[must_use]
    pub fn resolved(coordinates: Coordinates) -> Self {
        Self::matched(GeocodeMatch::new(coordinates))
    }

    /// Outcome for a provider match, keeping its details.
    #[must_use]
    pub fn matched(found: GeocodeMatch) -> Self {
        Self::Resolved {
            latitude: found.coordinates.latitude(),
            longitude: found.coordinates.longitude(),
            details: found.details,
        }
    }

    /// Outcome for a failed attempt described by `reason`.
    #[must_use]
    pub fn failed(reason: impl ToString) -> Self {
        Self::Failed {
            reason: reason.to_string(),
        }
    }

    /// Outcome for a row kept without an attempt.
    #[must_use]
    pub fn skipped(reason: impl ToString) -> Self {
        Self::Skipped {
            reason: reason.to_string(),
        }
    }

    /// Point geometry for resolved outcomes.
    #[must_use]
    pub fn geometry(&self) -> Option<Point<f64>> {
        match self {
            Self::Resolved {
                latitude,
                longitude,
                ..
            } => Some(Point::new(*longitude, *latitude)),
            Self::Failed { .. } | Self::Skipped { .. } => None,
        }
    }

    /// Failure or skip reason, if any.
    #[must_use]
    pub fn note(&self) -> Option<&str> {
        match self {
            Self::Resolved { .. } => None,
            Self::Failed { reason } | Self::Skipped { reason } => Some(reason),
        }
    }

    /// Provider details of a resolved outcome.
    #[must_use]
    pub const fn details(&self) -> Option<&MatchDetails> {
        match self {
            Self::Resolved { details, .. } => Some(details),
            Self::Failed { .. } | Self::Skipped { .. } => None,
        }
    }
}

/// An input row with its optional point geometry.
///
/// Geometry is present only when coordinates were obtained. `note` carries
/// the failure or skip reason for rows without geometry, and `details` the
/// provider's precision and extra fields for geocoded rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PointFeature {
    /// Original row attributes in column order.
    pub attributes: Row,
    /// Point with `x = longitude` and `y = latitude`.
    pub geometry: Option<Point<f64>>,
    /// Failure or skip reason.
    pub note: Option<String>,
    /// Precision and attributes reported by the provider.
    pub details: MatchDetails,
}

impl PointFeature {
    /// Build the feature recording `outcome` for `row`.
    #[must_use]
    pub fn from_outcome(row: Row, outcome: &GeocodeOutcome) -> Self {
        Self {
            attributes: row,
            geometry: outcome.geometry(),
            note: outcome.note().map(str::to_owned),
            details: outcome.details().cloned().unwrap_or_default(),
        }
    }

    /// Whether the feature carries a point.
    #[must_use]
    pub const fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }
}
