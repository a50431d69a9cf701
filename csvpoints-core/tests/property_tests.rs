//! Property-based tests for detection, mode selection and direct runs.
//!
//! # Invariants tested
//!
//! - **Case-insensitivity:** any casing of a candidate header maps to its role.
//! - **Built-ins survive:** arbitrary extra-name input never disables a default.
//! - **Inclusive threshold:** row counts at or below the threshold run inline.
//! - **Direct round trip:** numeric coordinate text becomes identical geometry.

use std::sync::Arc;

use csvpoints_core::test_support::StubGeocoder;
use csvpoints_core::{
    DEFAULT_ADDRESS_NAMES, DEFAULT_LATITUDE_NAMES, ExecutionMode, FieldMapping, FieldRole,
    FieldRoleCandidates, GeocodeOrchestrator, ProviderConfig, ProviderId, ProviderRegistry, Row,
    RunInput, decide_mode, detect_fields,
};
use proptest::prelude::*;

fn recase(name: &str, mask: &[bool]) -> String {
    name.chars()
        .zip(mask.iter().cycle())
        .map(|(ch, upper)| {
            if *upper {
                ch.to_ascii_uppercase()
            } else {
                ch.to_ascii_lowercase()
            }
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: casing and surrounding spaces never affect detection.
    #[test]
    fn detection_ignores_case(
        index in 0..DEFAULT_LATITUDE_NAMES.len(),
        mask in proptest::collection::vec(any::<bool>(), 1..8),
        pad in "[ ]{0,2}",
    ) {
        let name = DEFAULT_LATITUDE_NAMES.get(index).copied().unwrap_or("lat");
        let header = format!("{pad}{}{pad}", recase(name, &mask));
        let mapping = detect_fields(&[header.as_str()], &FieldRoleCandidates::default());
        prop_assert_eq!(mapping.latitude.as_deref(), Some(header.as_str()));
    }

    /// Property: user-supplied names only ever add candidates.
    #[test]
    fn extra_names_never_remove_builtins(raw in "[ ,a-z]{0,24}") {
        let candidates = FieldRoleCandidates::default().with_extra(FieldRole::Address, &raw);
        for name in DEFAULT_ADDRESS_NAMES {
            prop_assert!(candidates.contains(FieldRole::Address, name));
        }
        for fragment in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            prop_assert!(candidates.contains(FieldRole::Address, fragment));
        }
    }

    /// Property: the threshold comparison is inclusive.
    #[test]
    fn threshold_is_inclusive(threshold in 0_usize..200, rows in 0_usize..400, always in any::<bool>()) {
        let mapping = FieldMapping { address: Some("address".to_owned()), ..FieldMapping::default() };
        let config = ProviderConfig::new(ProviderId::OpenCage)
            .with_sync_threshold(threshold)
            .with_always_synchronous(always);
        let expected = if always || rows <= threshold {
            ExecutionMode::Synchronous
        } else {
            ExecutionMode::Asynchronous
        };
        prop_assert_eq!(decide_mode(&mapping, rows, &config), Ok(expected));
    }

    /// Property: direct runs reproduce the parsed values and never geocode.
    #[test]
    fn direct_run_round_trips(
        pairs in proptest::collection::vec((-90.0_f64..=90.0, -180.0_f64..=180.0), 0..16),
    ) {
        let stub = Arc::new(StubGeocoder::resolving(0.0, 0.0));
        let registry = ProviderRegistry::new().with_provider(
            ProviderConfig::new(ProviderId::Google).with_credential("key"),
            Arc::clone(&stub) as Arc<dyn csvpoints_core::GeocodeProvider>,
        );
        let rows: Vec<Row> = pairs
            .iter()
            .map(|(lat, lon)| Row::from_pairs([("Y", lat.to_string()), ("X", lon.to_string())]))
            .collect();
        let result = GeocodeOrchestrator::new(&registry)
            .run(RunInput::new(["Y", "X"], rows), &FieldRoleCandidates::default(), ProviderId::Google)
            .expect("direct runs finish inline");

        prop_assert_eq!(result.features.len(), pairs.len());
        for (feature, (lat, lon)) in result.features.iter().zip(&pairs) {
            let point = feature.geometry.expect("valid pairs resolve");
            prop_assert_eq!(point.x(), *lon);
            prop_assert_eq!(point.y(), *lat);
        }
        prop_assert_eq!(stub.calls(), 0);
    }
}
