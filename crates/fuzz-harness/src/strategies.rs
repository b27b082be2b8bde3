//! Orbital domain strategies for property-based testing
//!
//! Element sets are generated at the precision of their card columns, so
//! formatting one with [`Tle::format_lines`] and reading it back loses
//! nothing but the B* rounding.

use orbital_mechanics::{ElementSet, GroundStation, Tle};
use proptest::prelude::*;
use std::ops::Range;

// ============================================================================
// Orbit Regimes
// ============================================================================

/// Orbit families with distinct propagator paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitRegime {
    /// Near-circular, period under 225 minutes (SGP4)
    LowEarth,
    /// Deep space without resonance
    MediumEarth,
    /// One-day resonance
    Geosynchronous,
    /// Half-day resonance, high eccentricity
    Molniya,
}

impl OrbitRegime {
    pub const ALL: [OrbitRegime; 4] = [
        OrbitRegime::LowEarth,
        OrbitRegime::MediumEarth,
        OrbitRegime::Geosynchronous,
        OrbitRegime::Molniya,
    ];

    /// Mean motion (rev/day), eccentricity and inclination (deg) ranges.
    fn ranges(self) -> (Range<f64>, Range<f64>, Range<f64>) {
        match self {
            OrbitRegime::LowEarth => (11.25..16.0, 0.0..0.01, 0.0..180.0),
            OrbitRegime::MediumEarth => (1.8..6.0, 0.0..0.2, 0.0..90.0),
            OrbitRegime::Geosynchronous => (0.98..1.02, 0.0..0.001, 0.0..15.0),
            OrbitRegime::Molniya => (2.0..2.02, 0.6..0.72, 62.0..65.0),
        }
    }

    pub fn is_deep_space(self) -> bool {
        !matches!(self, OrbitRegime::LowEarth)
    }
}

// ============================================================================
// Card Fields
// ============================================================================

/// Round to the number of decimals a fixed-width field can print.
fn card(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// NORAD catalog number (five digits)
pub fn norad_id() -> impl Strategy<Value = u32> {
    1u32..100_000
}

/// Launch year, launch number and piece, e.g. `98067A`
pub fn international_designator() -> impl Strategy<Value = String> {
    (0u32..100, 1u32..1000, "[A-Z]{1,3}")
        .prop_map(|(year, launch, piece)| format!("{:02}{:03}{}", year, launch, piece))
}

/// Epoch year and day of year at eight decimals
pub fn epoch() -> impl Strategy<Value = (i32, f64)> {
    (2000i32..2030, 1.0f64..365.0).prop_map(|(year, day)| (year, card(day, 8)))
}

/// Angle in [0, 360) at four decimals
pub fn angle_deg() -> impl Strategy<Value = f64> {
    (0.0f64..360.0).prop_map(|a| card(a, 4) % 360.0)
}

/// First derivative of mean motion over two, rev/day²
pub fn mean_motion_dot() -> impl Strategy<Value = f64> {
    (-1.0e-4f64..1.0e-4).prop_map(|v| card(v, 8))
}

/// B* drag term with a normalised five-digit mantissa, or zero
pub fn bstar() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        (10_000u32..100_000, 3i32..6, any::<bool>()).prop_map(|(mantissa, exp, negative)| {
            let value = f64::from(mantissa) * 1e-5 * 10f64.powi(-exp);
            if negative {
                -value
            } else {
                value
            }
        }),
    ]
}

// ============================================================================
// Element Sets
// ============================================================================

/// Element set in `regime`
pub fn element_set(regime: OrbitRegime) -> BoxedStrategy<ElementSet> {
    let (mean_motion, eccentricity, inclination) = regime.ranges();
    (
        (
            norad_id(),
            international_designator(),
            epoch(),
            mean_motion_dot(),
            bstar(),
            0u32..10_000,
            0u32..100_000,
        ),
        (
            inclination,
            angle_deg(),
            eccentricity,
            angle_deg(),
            angle_deg(),
            mean_motion,
        ),
    )
        .prop_map(
            |(
                (number, designator, (year, day), ndot, bstar, set_number, revolutions),
                (incl, raan, ecc, argp, mean_anomaly, mean_motion),
            )| ElementSet {
                satellite_number: number,
                classification: 'U',
                international_designator: designator,
                epoch_year: year,
                epoch_day: day,
                mean_motion_dot: ndot,
                mean_motion_ddot: 0.0,
                bstar,
                ephemeris_type: 0,
                element_set_number: set_number,
                inclination_deg: card(incl, 4),
                raan_deg: raan,
                eccentricity: card(ecc, 7),
                arg_perigee_deg: argp,
                mean_anomaly_deg: mean_anomaly,
                mean_motion: card(mean_motion, 8),
                revolution_number: revolutions,
            },
        )
        .boxed()
}

/// Element set from any regime
pub fn any_element_set() -> impl Strategy<Value = ElementSet> {
    prop_oneof![
        element_set(OrbitRegime::LowEarth),
        element_set(OrbitRegime::MediumEarth),
        element_set(OrbitRegime::Geosynchronous),
        element_set(OrbitRegime::Molniya),
    ]
}

/// Element set that takes the deep-space path
pub fn deep_space_element_set() -> impl Strategy<Value = ElementSet> {
    prop_oneof![
        element_set(OrbitRegime::MediumEarth),
        element_set(OrbitRegime::Geosynchronous),
        element_set(OrbitRegime::Molniya),
    ]
}

/// Checksummed card lines for any regime
pub fn tle_lines() -> impl Strategy<Value = (String, String)> {
    any_element_set().prop_map(|set| Tle::format_lines(&set))
}

// ============================================================================
// Time and Place
// ============================================================================

/// Minutes from epoch, a day before to a week after
pub fn minutes_since_epoch() -> impl Strategy<Value = f64> {
    -1440.0f64..10_080.0
}

/// Observer anywhere on the ellipsoid up to 5 km high
pub fn ground_station() -> impl Strategy<Value = GroundStation> {
    (-90.0f64..=90.0, -180.0f64..180.0, 0.0f64..5.0).prop_filter_map(
        "station outside valid coordinates",
        |(lat, lon, alt)| GroundStation::new(lat, lon, alt).ok(),
    )
}
