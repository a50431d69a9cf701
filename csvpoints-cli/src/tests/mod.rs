//! Shared test harness modules for the csvpoints CLI.

use super::*;

mod helpers;
