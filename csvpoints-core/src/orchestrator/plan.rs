//! Execution-mode decision.

use crate::detect::{FieldMapping, MappingError};
use crate::registry::ProviderConfig;
use crate::report::ExecutionMode;

/// Choose how a run with `row_count` rows will execute.
///
/// A mapped latitude/longitude pair always wins. Otherwise an address column
/// selects geocoding: synchronous when forced or when `row_count` does not
/// exceed the threshold, asynchronous beyond it. Provider usability is
/// checked separately.
///
/// # Errors
///
/// Returns [`MappingError`] when neither path is possible.
///
/// # Examples
///
/// ```
/// use csvpoints_core::{ExecutionMode, FieldMapping, ProviderConfig, ProviderId, decide_mode};
///
/// let mapping = FieldMapping { address: Some("address".into()), ..FieldMapping::default() };
/// let config = ProviderConfig::new(ProviderId::Google).with_sync_threshold(50);
/// assert_eq!(decide_mode(&mapping, 50, &config), Ok(ExecutionMode::Synchronous));
/// assert_eq!(decide_mode(&mapping, 51, &config), Ok(ExecutionMode::Asynchronous));
/// ```
pub fn decide_mode(
    mapping: &FieldMapping,
    row_count: usize,
    config: &ProviderConfig,
) -> Result<ExecutionMode, MappingError> {
    mapping.validate()?;
    if mapping.has_coordinates() {
        return Ok(ExecutionMode::Direct);
    }
    if config.always_synchronous || row_count <= config.sync_threshold {
        Ok(ExecutionMode::Synchronous)
    } else {
        Ok(ExecutionMode::Asynchronous)
    }
}
