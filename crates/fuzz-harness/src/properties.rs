//! Propagator properties and the fuzz targets that check them
//!
//! Each property takes a generated input and returns a [`CaseError`] when it
//! is falsified, or when it does not apply because the orbit decayed first.

use crate::runner::{CaseError, CaseResult, PropertyRunner};
use crate::strategies::*;
use chrono::{DateTime, Utc};
use orbital_mechanics::time::add_minutes;
use orbital_mechanics::tle::LINE_LENGTH;
use orbital_mechanics::{
    ElementSet, GroundStation, OrbitalElements, OrbitalError, PositionVelocity, PropagationError,
    Propagator, Satellite, Tle, TleError,
};
use proptest::prelude::*;

/// Samples per orbit in the sweep property
const SWEEP_STEPS: u32 = 360;

// ============================================================================
// Element Set Properties
// ============================================================================

/// Formatting then parsing keeps every field, and formatting the parsed set
/// reproduces the same lines.
pub fn card_round_trip(set: &ElementSet) -> CaseResult {
    let (line1, line2) = Tle::format_lines(set);
    let tle = Tle::parse(None, &line1, &line2)
        .map_err(|e| format!("generated lines rejected: {}", e))?;
    let parsed = &tle.elements;

    let bstar_error = (parsed.bstar - set.bstar).abs();
    if bstar_error > 1e-12 * set.bstar.abs() {
        return Err(format!("B* {} read back as {}", set.bstar, parsed.bstar).into());
    }
    let expected = ElementSet {
        bstar: parsed.bstar,
        ..set.clone()
    };
    if *parsed != expected {
        return Err(format!("read back {:?}", parsed).into());
    }
    if Tle::format_lines(parsed) != (line1, line2) {
        return Err("re-formatting the parsed set changed the lines"
            .to_string()
            .into());
    }
    Ok(())
}

/// Changing any digit in columns 2-68 is caught by the checksum.
pub fn checksum_detects_corruption(
    set: &ElementSet,
    on_line2: bool,
    pick: usize,
    shift: u32,
) -> CaseResult {
    let (mut line1, mut line2) = Tle::format_lines(set);
    let line = if on_line2 { &mut line2 } else { &mut line1 };
    let digits: Vec<usize> = line
        .char_indices()
        .skip(1)
        .take(LINE_LENGTH - 2)
        .filter(|(_, c)| c.is_ascii_digit())
        .map(|(i, _)| i)
        .collect();
    let Some(&index) = digits.get(pick % digits.len().max(1)) else {
        return Err("no digit to corrupt".to_string().into());
    };

    let old = u32::from(line.as_bytes()[index] - b'0');
    let new = (old + 1 + (shift - 1) % 9) % 10;
    line.replace_range(index..=index, &new.to_string());

    match Tle::parse(None, &line1, &line2) {
        Err(TleError::Checksum { .. }) => Ok(()),
        other => Err(format!(
            "column {} changed {} -> {}: {:?}",
            index + 1,
            old,
            new,
            other.map(|tle| tle.elements)
        )
        .into()),
    }
}

// ============================================================================
// Propagation Properties
// ============================================================================

/// Two calls at the same time give bit-identical results.
pub fn repeat_propagation_identical(set: &ElementSet, t: f64) -> CaseResult {
    let propagator = propagator_for(set)?;
    same_outcome(&propagator.propagate(t), &propagator.propagate(t)).map_err(CaseError::from)
}

/// A call at `t2` does not depend on an earlier call at `t1`.
pub fn propagation_order_independent(set: &ElementSet, t1: f64, t2: f64) -> CaseResult {
    let used = propagator_for(set)?;
    let _ = used.propagate(t1);
    let fresh = propagator_for(set)?;
    same_outcome(&used.propagate(t2), &fresh.propagate(t2)).map_err(CaseError::from)
}

/// A dense sweep over the first orbit converges everywhere and stays finite.
/// No generated orbit decays within one period, so any error falsifies.
pub fn one_period_sweep(set: &ElementSet) -> CaseResult {
    let elements = elements_for(set)?;
    let propagator = Propagator::with_defaults(&elements).map_err(|e| e.to_string())?;
    let period = elements.period_minutes();

    for step in 0..=SWEEP_STEPS {
        let t = period * f64::from(step) / f64::from(SWEEP_STEPS);
        match propagator.propagate(t) {
            Ok(pv) if pv.radius().is_finite() && pv.speed().is_finite() => {}
            Ok(pv) => return Err(format!("non-finite state at {} min: {:?}", t, pv).into()),
            Err(e) => return Err(format!("at {} min: {}", t, e).into()),
        }
    }
    Ok(())
}

// ============================================================================
// Frame Properties
// ============================================================================

/// Sub-satellite point stays within latitude and longitude bounds.
pub fn geodetic_bounds(set: &ElementSet, t: f64) -> CaseResult {
    let satellite = satellite_for(set)?;
    let time = time_after_epoch(&satellite, t);
    let data = applicable(satellite.satellite_data(time))?;

    if !(-90.0..=90.0).contains(&data.latitude) {
        return Err(format!("latitude {}", data.latitude).into());
    }
    if !(-180.0..=180.0).contains(&data.longitude) {
        return Err(format!("longitude {}", data.longitude).into());
    }
    if !data.altitude_km.is_finite() || !(data.speed_km_s > 0.0) {
        return Err(format!("{:?}", data).into());
    }
    Ok(())
}

/// Azimuth in [0, 360), elevation in [-90, 90], positive range.
pub fn look_angle_bounds(set: &ElementSet, station: &GroundStation, t: f64) -> CaseResult {
    let satellite = satellite_for(set)?;
    let time = time_after_epoch(&satellite, t);
    let look = applicable(satellite.look_angles(station, time))?;

    if !(0.0..360.0).contains(&look.azimuth) {
        return Err(format!("azimuth {}", look.azimuth).into());
    }
    if !(-90.0..=90.0).contains(&look.elevation) {
        return Err(format!("elevation {}", look.elevation).into());
    }
    if !(look.range_km > 0.0) || !look.range_rate_km_s.is_finite() {
        return Err(format!("{:?}", look).into());
    }
    Ok(())
}

/// An observer at the sub-satellite point sees the satellite overhead at a
/// range equal to its altitude.
pub fn zenith_over_subpoint(set: &ElementSet, t: f64) -> CaseResult {
    let satellite = satellite_for(set)?;
    let time = time_after_epoch(&satellite, t);
    let data = applicable(satellite.satellite_data(time))?;
    let station =
        GroundStation::new(data.latitude, data.longitude, 0.0).map_err(|e| e.to_string())?;
    let look = satellite
        .look_angles(&station, time)
        .map_err(|e| e.to_string())?;

    if look.elevation < 89.99 {
        return Err(format!("elevation {} under {:?}", look.elevation, data).into());
    }
    if (look.range_km - data.altitude_km).abs() > 1e-3 {
        return Err(format!(
            "range {} km but altitude {} km",
            look.range_km, data.altitude_km
        )
        .into());
    }
    Ok(())
}

// ============================================================================
// Targets
// ============================================================================

/// A named property with the strategy that drives it.
pub struct Target {
    pub name: &'static str,
    pub group: &'static str,
    pub description: &'static str,
    pub run: fn(&mut PropertyRunner),
}

pub const TARGETS: &[Target] = &[
    Target {
        name: "card_round_trip",
        group: "tle",
        description: "Formatted element sets parse back unchanged",
        run: |runner| {
            runner.check_strategy("card_round_trip", any_element_set(), card_round_trip);
        },
    },
    Target {
        name: "checksum_corruption",
        group: "tle",
        description: "Any changed digit fails the column-69 checksum",
        run: |runner| {
            let strategy = (any_element_set(), any::<bool>(), any::<usize>(), 1u32..10);
            runner.check_strategy("checksum_corruption", strategy, |(set, line2, pick, shift)| {
                checksum_detects_corruption(set, *line2, *pick, *shift)
            });
        },
    },
    Target {
        name: "repeat_propagation",
        group: "propagation",
        description: "Repeated calls are bit-identical",
        run: |runner| {
            let strategy = (any_element_set(), minutes_since_epoch());
            runner.check_strategy("repeat_propagation", strategy, |(set, t)| {
                repeat_propagation_identical(set, *t)
            });
        },
    },
    Target {
        name: "deep_space_call_order",
        group: "propagation",
        description: "Deep-space results do not depend on earlier calls",
        run: |runner| {
            let strategy = (
                deep_space_element_set(),
                minutes_since_epoch(),
                minutes_since_epoch(),
            );
            runner.check_strategy("deep_space_call_order", strategy, |(set, t1, t2)| {
                propagation_order_independent(set, *t1, *t2)
            });
        },
    },
    Target {
        name: "one_period_sweep",
        group: "propagation",
        description: "Kepler's equation converges over a full orbit",
        run: |runner| {
            runner.check_strategy("one_period_sweep", any_element_set(), one_period_sweep);
        },
    },
    Target {
        name: "geodetic_bounds",
        group: "frames",
        description: "Sub-satellite latitude and longitude stay in range",
        run: |runner| {
            let strategy = (any_element_set(), minutes_since_epoch());
            runner.check_strategy("geodetic_bounds", strategy, |(set, t)| {
                geodetic_bounds(set, *t)
            });
        },
    },
    Target {
        name: "look_angle_bounds",
        group: "frames",
        description: "Azimuth, elevation and range stay in range",
        run: |runner| {
            let strategy = (any_element_set(), ground_station(), minutes_since_epoch());
            runner.check_strategy("look_angle_bounds", strategy, |(set, station, t)| {
                look_angle_bounds(set, station, *t)
            });
        },
    },
    Target {
        name: "zenith_over_subpoint",
        group: "frames",
        description: "Observer under the satellite sees it at 90° elevation",
        run: |runner| {
            let strategy = (any_element_set(), minutes_since_epoch());
            runner.check_strategy("zenith_over_subpoint", strategy, |(set, t)| {
                zenith_over_subpoint(set, *t)
            });
        },
    },
];

/// Run every target whose name contains `filter`. Returns how many ran.
pub fn run_targets(runner: &mut PropertyRunner, filter: Option<&str>) -> usize {
    let mut count = 0;
    for target in TARGETS {
        if filter.map_or(true, |f| target.name.contains(f)) {
            (target.run)(runner);
            count += 1;
        }
    }
    count
}

// ============================================================================
// Helpers
// ============================================================================

/// Propagation failures that end the orbit become discards. Kepler
/// non-convergence and every other error falsify.
fn applicable<T>(result: orbital_mechanics::Result<T>) -> Result<T, CaseError> {
    result.map_err(|e| match e {
        e @ OrbitalError::Propagation(PropagationError::KeplerNonConvergence { .. }) => {
            CaseError::Falsified(e.to_string())
        }
        OrbitalError::Propagation(PropagationError::SatelliteDecayed { .. }) => {
            CaseError::discard("satellite decayed")
        }
        OrbitalError::Propagation(_) => CaseError::discard("elements out of range"),
        other => CaseError::Falsified(other.to_string()),
    })
}

fn elements_for(set: &ElementSet) -> Result<OrbitalElements, String> {
    let tle = Tle::from_element_set(None, set).map_err(|e| e.to_string())?;
    OrbitalElements::from_tle(&tle).map_err(|e| e.to_string())
}

fn propagator_for(set: &ElementSet) -> Result<Propagator, String> {
    Propagator::with_defaults(&elements_for(set)?).map_err(|e| e.to_string())
}

fn satellite_for(set: &ElementSet) -> Result<Satellite, String> {
    let tle = Tle::from_element_set(None, set).map_err(|e| e.to_string())?;
    Satellite::from_tle(&tle).map_err(|e| e.to_string())
}

fn time_after_epoch(satellite: &Satellite, minutes: f64) -> DateTime<Utc> {
    add_minutes(satellite.propagator().epoch(), minutes)
}

fn same_outcome(
    a: &Result<PositionVelocity, PropagationError>,
    b: &Result<PositionVelocity, PropagationError>,
) -> Result<(), String> {
    let bits = |pv: &PositionVelocity| -> Vec<u64> {
        pv.position
            .iter()
            .chain(pv.velocity.iter())
            .map(|v| v.to_bits())
            .collect()
    };
    match (a, b) {
        (Ok(x), Ok(y)) if bits(x) == bits(y) => Ok(()),
        (Err(x), Err(y)) if format!("{:?}", x) == format!("{:?}", y) => Ok(()),
        _ => Err(format!("{:?} differs from {:?}", a, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RunConfig;
    use proptest::test_runner::TestCaseError;

    fn check(outcome: CaseResult) -> Result<(), TestCaseError> {
        match outcome {
            Ok(()) => Ok(()),
            Err(CaseError::Discarded(reason)) => Err(TestCaseError::reject(reason)),
            Err(CaseError::Falsified(message)) => Err(TestCaseError::fail(message)),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_card_round_trip(set in any_element_set()) {
            check(card_round_trip(&set))?;
        }

        #[test]
        fn test_checksum_corruption(
            set in any_element_set(),
            line2 in any::<bool>(),
            pick in any::<usize>(),
            shift in 1u32..10,
        ) {
            check(checksum_detects_corruption(&set, line2, pick, shift))?;
        }

        #[test]
        fn test_deep_space_call_order(
            set in deep_space_element_set(),
            t1 in minutes_since_epoch(),
            t2 in minutes_since_epoch(),
        ) {
            check(propagation_order_independent(&set, t1, t2))?;
        }

        #[test]
        fn test_one_period_sweep(set in any_element_set()) {
            check(one_period_sweep(&set))?;
        }

        #[test]
        fn test_zenith_over_subpoint(set in any_element_set(), t in minutes_since_epoch()) {
            check(zenith_over_subpoint(&set, t))?;
        }
    }

    #[test]
    fn test_all_targets_pass_seeded() {
        let mut runner = PropertyRunner::new(RunConfig::new().cases(16).seed(2024));
        let count = run_targets(&mut runner, None);

        assert_eq!(count, TARGETS.len());
        for result in runner.results() {
            assert_eq!(result.falsified, 0, "{}: {:?}", result.name, result.counterexamples);
            assert_eq!(result.cases_run, 16);
        }
    }

    #[test]
    fn test_filter_selects_targets() {
        let mut runner = PropertyRunner::new(RunConfig::new().cases(2).seed(1));
        assert_eq!(run_targets(&mut runner, Some("card")), 1);
        assert_eq!(run_targets(&mut runner, Some("no_such_target")), 0);
        assert_eq!(runner.results().len(), 1);
    }

    #[test]
    fn test_targets_have_unique_names() {
        let mut names: Vec<_> = TARGETS.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TARGETS.len());
    }
}
