//! HTTP geocoders for the csvpoints orchestrator.
//!
//! Each geocoder implements [`csvpoints_core::GeocodeProvider`] over one
//! public web service: OpenStreetMap Nominatim, Google, Mapbox, OpenCage and
//! Yahoo! JAPAN. Requests are issued with `reqwest` and bridged to the
//! synchronous provider interface on a Tokio runtime owned by the geocoder.
//! Credentials travel in query strings or headers and are never echoed in
//! error messages.
//!
//! Use [`build_geocoder`] to obtain a geocoder for a
//! [`ProviderId`](csvpoints_core::ProviderId) and register it with a
//! [`ProviderRegistry`](csvpoints_core::ProviderRegistry).

mod config;
mod factory;
mod google;
mod mapbox;
mod nominatim;
mod opencage;
mod transport;
mod yahoojp;

#[doc(hidden)]
pub mod test_support;

pub use config::{DEFAULT_USER_AGENT, HttpGeocoderConfig, ProviderBuildError};
pub use factory::{build_geocoder, build_geocoder_with_config};
pub use google::GoogleGeocoder;
pub use mapbox::MapboxGeocoder;
pub use nominatim::NominatimGeocoder;
pub use opencage::OpenCageGeocoder;
pub use yahoojp::YahooJapanGeocoder;
