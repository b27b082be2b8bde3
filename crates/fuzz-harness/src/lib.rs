//! SGP4 Fuzz Harness
//!
//! Property-based testing for the propagator. Element set strategies cover
//! the near-earth and deep-space regimes, and a seeded runner checks each
//! property and shrinks its counterexamples for CI reports.
//!
//! # Usage
//!
//! ```rust
//! use fuzz_harness::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn card_lines_are_valid(set in any_element_set()) {
//!         let (line1, line2) = Tle::format_lines(&set);
//!         prop_assert!(Tle::parse(None, &line1, &line2).is_ok());
//!     }
//! }
//! ```

pub mod properties;
pub mod reports;
pub mod runner;
pub mod strategies;

pub mod prelude {
    pub use crate::runner::{
        CaseError, CaseResult, Counterexample, PropertyRunner, RunConfig, TargetResult, Verdict,
    };
    pub use crate::strategies::*;
    pub use orbital_mechanics::{ElementSet, Tle};
    pub use proptest::prelude::*;
}

// Re-export proptest for convenience
pub use proptest;
