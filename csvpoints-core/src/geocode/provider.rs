//! Geocoding provider trait.

use super::error::GeocodeError;
use super::matched::GeocodeMatch;

/// Resolve a single address to a position.
///
/// Implementations must be shareable across threads: asynchronous runs call
/// the provider from a worker thread. Calls are sequential within one run.
///
/// # Examples
///
/// ```rust
/// use csvpoints_core::{Coordinates, GeocodeError, GeocodeMatch, GeocodeProvider};
///
/// struct Fixed;
///
/// impl GeocodeProvider for Fixed {
///     fn geocode(&self, address: &str, _credential: &str) -> Result<GeocodeMatch, GeocodeError> {
///         if address.trim().is_empty() {
///             return Err(GeocodeError::EmptyAddress);
///         }
///         let found = GeocodeMatch::new(Coordinates::new(35.0, 139.0)?)
///             .with_precision(Some("station".to_owned()));
///         Ok(found)
///     }
/// }
///
/// let found = Fixed.geocode("Tokyo Station", "key")?;
/// assert_eq!(found.latitude(), 35.0);
/// # Ok::<(), GeocodeError>(())
/// ```
pub trait GeocodeProvider: Send + Sync {
    /// Look up `address` using `credential` for authentication.
    ///
    /// Services without keys interpret the credential in their own way;
    /// Nominatim, for instance, sends it as the user agent.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] when the lookup fails or yields no match.
    fn geocode(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError>;
}

impl<T: GeocodeProvider + ?Sized> GeocodeProvider for std::sync::Arc<T> {
    fn geocode(&self, address: &str, credential: &str) -> Result<GeocodeMatch, GeocodeError> {
        (**self).geocode(address, credential)
    }
}
