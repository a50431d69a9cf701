//! Turn addresses into coordinates.
//!
//! The [`GeocodeProvider`] trait abstracts a single address lookup against a
//! remote service. Implementations live outside this crate; the orchestrator
//! only relies on the trait, the [`GeocodeMatch`] it returns and the
//! [`GeocodeError`] taxonomy.

mod error;
mod matched;
mod provider;

pub use error::GeocodeError;
pub use matched::{GeocodeMatch, MatchDetails};
pub use provider::GeocodeProvider;
