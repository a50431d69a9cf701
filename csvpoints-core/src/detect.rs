//! Column-role detection.
//!
//! Headers are matched against per-role candidate name sets. Each role picks
//! the first header, in file order, whose trimmed lowercase form belongs to
//! its set. Roles are resolved independently, so one header may satisfy more
//! than one role.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Built-in latitude column names.
pub const DEFAULT_LATITUDE_NAMES: [&str; 4] = ["lat", "latitude", "y", "fy"];
/// Built-in longitude column names.
pub const DEFAULT_LONGITUDE_NAMES: [&str; 6] = ["lon", "lng", "long", "longitude", "x", "fx"];
/// Built-in address column names.
pub const DEFAULT_ADDRESS_NAMES: [&str; 2] = ["address", "addr"];

/// Semantic purpose a column may serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldRole {
    /// Latitude in decimal or sexagesimal degrees.
    Latitude,
    /// Longitude in decimal or sexagesimal degrees.
    Longitude,
    /// Free-form postal address to geocode.
    Address,
}

impl FieldRole {
    /// Every role, in detection order.
    pub const ALL: [Self; 3] = [Self::Latitude, Self::Longitude, Self::Address];

    /// Lowercase role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::Address => "address",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate header names for each role.
///
/// The built-in names are always present; user-supplied names are merged on
/// top. Names are stored trimmed and lowercased.
///
/// # Examples
///
/// ```
/// use csvpoints_core::{FieldRole, FieldRoleCandidates};
///
/// let candidates = FieldRoleCandidates::default()
///     .with_extra(FieldRole::Latitude, " Breite , ,north");
/// assert!(candidates.contains(FieldRole::Latitude, "BREITE"));
/// assert!(candidates.contains(FieldRole::Latitude, "lat"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRoleCandidates {
    latitude: BTreeSet<String>,
    longitude: BTreeSet<String>,
    address: BTreeSet<String>,
}

impl Default for FieldRoleCandidates {
    fn default() -> Self {
        Self {
            latitude: builtin(&DEFAULT_LATITUDE_NAMES),
            longitude: builtin(&DEFAULT_LONGITUDE_NAMES),
            address: builtin(&DEFAULT_ADDRESS_NAMES),
        }
    }
}

fn builtin(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

fn normalise(name: &str) -> String {
    name.trim().to_lowercase()
}

impl FieldRoleCandidates {
    /// Merge a comma-separated list of extra names for `role`.
    ///
    /// Fragments are trimmed; empty fragments are ignored and duplicates
    /// collapse.
    #[must_use]
    pub fn with_extra(mut self, role: FieldRole, raw: &str) -> Self {
        for name in raw.split(',') {
            self.add(role, name);
        }
        self
    }

    /// Add a single extra name for `role`. Blank names are ignored.
    pub fn add(&mut self, role: FieldRole, name: &str) {
        let key = normalise(name);
        if key.is_empty() {
            return;
        }
        self.names_mut(role).insert(key);
    }

    /// Whether `header` names a column for `role`, ignoring case.
    #[must_use]
    pub fn contains(&self, role: FieldRole, header: &str) -> bool {
        self.names(role).contains(&normalise(header))
    }

    /// Candidate names for `role`, sorted.
    #[must_use]
    pub const fn names(&self, role: FieldRole) -> &BTreeSet<String> {
        match role {
            FieldRole::Latitude => &self.latitude,
            FieldRole::Longitude => &self.longitude,
            FieldRole::Address => &self.address,
        }
    }

    const fn names_mut(&mut self, role: FieldRole) -> &mut BTreeSet<String> {
        match role {
            FieldRole::Latitude => &mut self.latitude,
            FieldRole::Longitude => &mut self.longitude,
            FieldRole::Address => &mut self.address,
        }
    }
}

/// Errors returned by [`FieldMapping::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MappingError {
    /// Neither a coordinate pair nor an address column was found.
    #[error("no latitude/longitude pair or address column was found")]
    NoUsableColumns,
    /// Only one half of the coordinate pair is mapped and no address exists.
    #[error("{missing} column is missing and no address column is mapped")]
    IncompleteCoordinates {
        /// The coordinate role that has no column.
        missing: FieldRole,
    },
}

/// Resolved column for each role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldMapping {
    /// Column holding latitude values.
    pub latitude: Option<String>,
    /// Column holding longitude values.
    pub longitude: Option<String>,
    /// Column holding addresses.
    pub address: Option<String>,
}

impl FieldMapping {
    /// Column mapped for `role`, if any.
    #[must_use]
    pub fn column(&self, role: FieldRole) -> Option<&str> {
        match role {
            FieldRole::Latitude => self.latitude.as_deref(),
            FieldRole::Longitude => self.longitude.as_deref(),
            FieldRole::Address => self.address.as_deref(),
        }
    }

    /// Whether both coordinate columns are mapped.
    #[must_use]
    pub const fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Whether an address column is mapped.
    #[must_use]
    pub const fn has_address(&self) -> bool {
        self.address.is_some()
    }

    /// Check that the mapping supports at least one run path.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError`] when neither a full coordinate pair nor an
    /// address column is mapped.
    pub const fn validate(&self) -> Result<(), MappingError> {
        if self.has_coordinates() || self.has_address() {
            return Ok(());
        }
        match (&self.latitude, &self.longitude) {
            (Some(_), None) => Err(MappingError::IncompleteCoordinates {
                missing: FieldRole::Longitude,
            }),
            (None, Some(_)) => Err(MappingError::IncompleteCoordinates {
                missing: FieldRole::Latitude,
            }),
            _ => Err(MappingError::NoUsableColumns),
        }
    }
}

/// Map headers to roles using `candidates`.
///
/// # Examples
///
/// ```
/// use csvpoints_core::{FieldRoleCandidates, detect_fields};
///
/// let headers = ["id", "Address", "LAT", "Lng"];
/// let mapping = detect_fields(&headers, &FieldRoleCandidates::default());
/// assert_eq!(mapping.latitude.as_deref(), Some("LAT"));
/// assert_eq!(mapping.longitude.as_deref(), Some("Lng"));
/// assert_eq!(mapping.address.as_deref(), Some("Address"));
/// ```
pub fn detect_fields<S: AsRef<str>>(
    headers: &[S],
    candidates: &FieldRoleCandidates,
) -> FieldMapping {
    let first_match = |role: FieldRole| {
        headers
            .iter()
            .map(AsRef::as_ref)
            .find(|header| candidates.contains(role, header))
            .map(str::to_owned)
    };
    FieldMapping {
        latitude: first_match(FieldRole::Latitude),
        longitude: first_match(FieldRole::Longitude),
        address: first_match(FieldRole::Address),
    }
}
