//! Provider identities, per-provider configuration and the registry that
//! pairs them with implementations.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::geocode::GeocodeProvider;

/// Default number of rows processed synchronously before switching to a
/// background worker.
pub const DEFAULT_SYNC_THRESHOLD: usize = 10;

/// Identifier of an external geocoding service.
///
/// Identifiers parse case-insensitively from every source: command-line
/// flags go through [`FromStr`] and serialised configuration goes through
/// the same parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum ProviderId {
    /// OpenStreetMap Nominatim.
    Nominatim,
    /// Google Geocoding API.
    Google,
    /// Mapbox Geocoding API.
    Mapbox,
    /// OpenCage Geocoding API.
    OpenCage,
    /// Yahoo! JAPAN geocoder.
    YahooJapan,
}

impl ProviderId {
    /// Every provider, in presentation order.
    pub const ALL: [Self; 5] = [
        Self::Nominatim,
        Self::Google,
        Self::Mapbox,
        Self::OpenCage,
        Self::YahooJapan,
    ];

    /// Stable lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nominatim => "nominatim",
            Self::Google => "google",
            Self::Mapbox => "mapbox",
            Self::OpenCage => "opencage",
            Self::YahooJapan => "yahoojp",
        }
    }

    /// Human-readable service name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Nominatim => "Nominatim",
            Self::Google => "Google",
            Self::Mapbox => "Mapbox",
            Self::OpenCage => "OpenCage",
            Self::YahooJapan => "Yahoo! JAPAN",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider {name:?}; expected one of nominatim, google, mapbox, opencage, yahoojp")]
pub struct ProviderIdError {
    /// The rejected identifier.
    pub name: String,
}

impl FromStr for ProviderId {
    type Err = ProviderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ProviderIdError {
                name: s.to_owned(),
            })
    }
}

impl TryFrom<String> for ProviderId {
    type Error = ProviderIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProviderId> for String {
    fn from(id: ProviderId) -> Self {
        id.as_str().to_owned()
    }
}

/// Credential and execution policy for one provider.
///
/// # Examples
///
/// ```
/// use csvpoints_core::{ProviderConfig, ProviderId};
///
/// let config = ProviderConfig::new(ProviderId::Google)
///     .with_credential("api-key")
///     .with_sync_threshold(50);
/// assert!(config.has_credential());
/// assert!(!config.always_synchronous);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProviderConfig {
    /// Which service this configuration applies to.
    pub provider: ProviderId,
    /// API key, token or contact string. `None` when unset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub credential: Option<String>,
    /// Largest row count processed on the caller's thread.
    #[cfg_attr(feature = "serde", serde(default = "default_sync_threshold"))]
    pub sync_threshold: usize,
    /// Run every geocode synchronously regardless of row count.
    #[cfg_attr(feature = "serde", serde(default))]
    pub always_synchronous: bool,
}

#[cfg(feature = "serde")]
const fn default_sync_threshold() -> usize {
    DEFAULT_SYNC_THRESHOLD
}

impl ProviderConfig {
    /// Configuration with no credential and default policy.
    #[must_use]
    pub const fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            credential: None,
            sync_threshold: DEFAULT_SYNC_THRESHOLD,
            always_synchronous: false,
        }
    }

    /// Set the credential.
    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Set the synchronous row-count threshold.
    #[must_use]
    pub const fn with_sync_threshold(mut self, threshold: usize) -> Self {
        self.sync_threshold = threshold;
        self
    }

    /// Force synchronous execution.
    #[must_use]
    pub const fn with_always_synchronous(mut self, always: bool) -> Self {
        self.always_synchronous = always;
        self
    }

    /// Whether a non-blank credential is configured.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credential
            .as_deref()
            .is_some_and(|credential| !credential.trim().is_empty())
    }
}

struct Entry {
    config: ProviderConfig,
    provider: Arc<dyn GeocodeProvider>,
}

/// Configured providers keyed by [`ProviderId`].
///
/// The registry is read-only while a run is in progress; the orchestrator
/// clones the provider handle it needs.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: BTreeMap<ProviderId, Entry>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(id, entry)| (id, entry.config.has_credential())),
            )
            .finish()
    }
}

impl ProviderRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `config.provider`, replacing any earlier
    /// entry for the same id.
    pub fn register(&mut self, config: ProviderConfig, provider: Arc<dyn GeocodeProvider>) {
        self.entries
            .insert(config.provider, Entry { config, provider });
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with_provider(
        mut self,
        config: ProviderConfig,
        provider: Arc<dyn GeocodeProvider>,
    ) -> Self {
        self.register(config, provider);
        self
    }

    /// Whether `id` is registered with a non-blank credential.
    #[must_use]
    pub fn is_usable(&self, id: ProviderId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| entry.config.has_credential())
    }

    /// Configuration registered for `id`.
    #[must_use]
    pub fn config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.entries.get(&id).map(|entry| &entry.config)
    }

    /// Credential registered for `id`, if any.
    #[must_use]
    pub fn credential(&self, id: ProviderId) -> Option<&str> {
        self.config(id)?.credential.as_deref()
    }

    /// Shared handle to the implementation registered for `id`.
    #[must_use]
    pub fn provider(&self, id: ProviderId) -> Option<Arc<dyn GeocodeProvider>> {
        self.entries
            .get(&id)
            .map(|entry| Arc::clone(&entry.provider))
    }

    /// Registered ids, in [`ProviderId`] order.
    pub fn ids(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::test_support::StubGeocoder;

    fn stub() -> Arc<dyn GeocodeProvider> {
        Arc::new(StubGeocoder::resolving(0.0, 0.0))
    }

    #[rstest]
    #[case("nominatim", ProviderId::Nominatim)]
    #[case("Google", ProviderId::Google)]
    #[case(" MAPBOX ", ProviderId::Mapbox)]
    #[case("opencage", ProviderId::OpenCage)]
    #[case("yahoojp", ProviderId::YahooJapan)]
    fn parses_provider_ids(#[case] text: &str, #[case] expected: ProviderId) {
        assert_eq!(text.parse::<ProviderId>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_provider() {
        let err = "here".parse::<ProviderId>().expect_err("unknown id");
        assert_eq!(err.name, "here");
    }

    #[rstest]
    fn ids_round_trip_through_display() {
        for id in ProviderId::ALL {
            assert_eq!(id.to_string().parse::<ProviderId>(), Ok(id));
        }
    }

    #[cfg(feature = "serde")]
    #[rstest]
    #[case("\"OpenCage\"", ProviderId::OpenCage)]
    #[case("\"YAHOOJP\"", ProviderId::YahooJapan)]
    #[case("\"nominatim\"", ProviderId::Nominatim)]
    fn deserialising_ignores_case(#[case] json: &str, #[case] expected: ProviderId) {
        let id: ProviderId = serde_json::from_str(json).expect("known provider");
        assert_eq!(id, expected);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn serialised_ids_are_lowercase() {
        let json = serde_json::to_string(&ProviderId::YahooJapan).expect("serialises");
        assert_eq!(json, "\"yahoojp\"");
        assert!(serde_json::from_str::<ProviderId>("\"here\"").is_err());
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(""), false)]
    #[case(Some("   "), false)]
    #[case(Some("key"), true)]
    fn usability_follows_credential(#[case] credential: Option<&str>, #[case] usable: bool) {
        let mut config = ProviderConfig::new(ProviderId::OpenCage);
        config.credential = credential.map(str::to_owned);
        let registry = ProviderRegistry::new().with_provider(config, stub());
        assert_eq!(registry.is_usable(ProviderId::OpenCage), usable);
    }

    #[rstest]
    fn unregistered_provider_is_unusable() {
        let registry = ProviderRegistry::new();
        assert!(!registry.is_usable(ProviderId::Google));
        assert!(registry.provider(ProviderId::Google).is_none());
    }

    #[rstest]
    fn re_registering_replaces_entry() {
        let registry = ProviderRegistry::new()
            .with_provider(ProviderConfig::new(ProviderId::Mapbox), stub())
            .with_provider(
                ProviderConfig::new(ProviderId::Mapbox).with_credential("token"),
                stub(),
            );
        assert_eq!(registry.credential(ProviderId::Mapbox), Some("token"));
        assert_eq!(registry.ids().count(), 1);
    }

    #[rstest]
    fn defaults_match_documented_policy() {
        let config = ProviderConfig::new(ProviderId::Nominatim);
        assert_eq!(config.sync_threshold, DEFAULT_SYNC_THRESHOLD);
        assert!(!config.always_synchronous);
        assert!(!config.has_credential());
    }
}
