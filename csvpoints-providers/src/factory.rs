//! Build a geocoder from its [`ProviderId`].

use std::sync::Arc;

use csvpoints_core::{GeocodeProvider, ProviderId};

use crate::config::{HttpGeocoderConfig, ProviderBuildError};
use crate::google::GoogleGeocoder;
use crate::mapbox::MapboxGeocoder;
use crate::nominatim::NominatimGeocoder;
use crate::opencage::OpenCageGeocoder;
use crate::yahoojp::YahooJapanGeocoder;

/// Geocoder for `provider` using its published endpoint.
///
/// # Errors
///
/// Returns an error if the HTTP client or Tokio runtime fails to build.
pub fn build_geocoder(provider: ProviderId) -> Result<Arc<dyn GeocodeProvider>, ProviderBuildError> {
    build_geocoder_with_config(provider, &HttpGeocoderConfig::for_provider(provider))
}

/// Geocoder for `provider` using `config`.
///
/// # Errors
///
/// Returns an error if the base URL is invalid or the HTTP client or Tokio
/// runtime fails to build.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use csvpoints_core::ProviderId;
/// use csvpoints_providers::{HttpGeocoderConfig, build_geocoder_with_config};
///
/// let config = HttpGeocoderConfig::for_provider(ProviderId::Mapbox)
///     .with_base_url("http://127.0.0.1:9/places")
///     .with_timeout(Duration::from_secs(1));
/// let geocoder = build_geocoder_with_config(ProviderId::Mapbox, &config)?;
/// # let _ = geocoder;
/// # Ok::<(), csvpoints_providers::ProviderBuildError>(())
/// ```
pub fn build_geocoder_with_config(
    provider: ProviderId,
    config: &HttpGeocoderConfig,
) -> Result<Arc<dyn GeocodeProvider>, ProviderBuildError> {
    let geocoder: Arc<dyn GeocodeProvider> = match provider {
        ProviderId::Nominatim => Arc::new(NominatimGeocoder::with_config(config)?),
        ProviderId::Google => Arc::new(GoogleGeocoder::with_config(config)?),
        ProviderId::Mapbox => Arc::new(MapboxGeocoder::with_config(config)?),
        ProviderId::OpenCage => Arc::new(OpenCageGeocoder::with_config(config)?),
        ProviderId::YahooJapan => Arc::new(YahooJapanGeocoder::with_config(config)?),
    };
    Ok(geocoder)
}
