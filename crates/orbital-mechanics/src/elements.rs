//! Normalized orbital elements derived once per element set

use crate::error::TleError;
use crate::gravity::{EarthModel, Geopotential};
use crate::time;
use crate::tle::Tle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Minutes per revolution-per-day: converts rev/day to rad/min.
const XPDOTP: f64 = 1440.0 / TAU;

/// Objects with an un-Kozai'd period at or above this use the deep-space theory.
pub const DEEP_SPACE_PERIOD_MINUTES: f64 = 225.0;

/// Mean elements at epoch in radians, minutes and earth radii.
///
/// Built once per element set and never mutated; every propagation call reads
/// from here and keeps its own intermediate state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub satellite_number: u32,
    pub classification: char,
    pub international_designator: String,
    pub epoch: DateTime<Utc>,
    /// Epoch as days since 1949-12-31 00:00 UTC
    pub epoch_days_since_1950: f64,
    /// Kozai mean motion, rad/min
    pub mean_motion: f64,
    /// rad/min²
    pub mean_motion_dot: f64,
    /// rad/min³
    pub mean_motion_ddot: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub argument_of_perigee: f64,
    pub right_ascension: f64,
    pub mean_anomaly: f64,
    /// 1/earth radii
    pub bstar: f64,
    pub element_set_number: u32,
    pub revolution_number: u32,
    pub deep_space: bool,
}

impl OrbitalElements {
    /// Normalize `tle` using the default earth model for the deep-space test.
    pub fn from_tle(tle: &Tle) -> Result<Self, TleError> {
        Self::from_tle_with_model(tle, EarthModel::default())
    }

    pub fn from_tle_with_model(tle: &Tle, model: EarthModel) -> Result<Self, TleError> {
        let set = &tle.elements;

        if !(0.0..1.0).contains(&set.eccentricity) {
            return Err(TleError::OutOfRange {
                field: "eccentricity",
                value: set.eccentricity,
            });
        }
        if !(0.0..=180.0).contains(&set.inclination_deg) {
            return Err(TleError::OutOfRange {
                field: "inclination",
                value: set.inclination_deg,
            });
        }
        for (field, value) in [
            ("right ascension of ascending node", set.raan_deg),
            ("argument of perigee", set.arg_perigee_deg),
            ("mean anomaly", set.mean_anomaly_deg),
        ] {
            if !(0.0..360.0).contains(&value) {
                return Err(TleError::OutOfRange { field, value });
            }
        }
        if set.mean_motion <= 0.0 || !set.mean_motion.is_finite() {
            return Err(TleError::OutOfRange {
                field: "mean motion",
                value: set.mean_motion,
            });
        }

        let epoch = time::from_day_of_year(set.epoch_year, set.epoch_day).ok_or(
            TleError::OutOfRange {
                field: "epoch",
                value: set.epoch_day,
            },
        )?;
        let jan1 = time::julian_date_jan1(set.epoch_year).ok_or(TleError::OutOfRange {
            field: "epoch year",
            value: f64::from(set.epoch_year),
        })?;
        let epoch_days_since_1950 = (jan1 - time::JD_1950) + (set.epoch_day - 1.0);

        let mean_motion = set.mean_motion / XPDOTP;
        let eccentricity = set.eccentricity;
        let inclination = set.inclination_deg.to_radians();
        let deep_space =
            TAU / unkozai_mean_motion(mean_motion, eccentricity, inclination, &model.geopotential())
                >= DEEP_SPACE_PERIOD_MINUTES;

        Ok(OrbitalElements {
            satellite_number: set.satellite_number,
            classification: set.classification,
            international_designator: set.international_designator.clone(),
            epoch,
            epoch_days_since_1950,
            mean_motion,
            mean_motion_dot: set.mean_motion_dot / (XPDOTP * 1440.0),
            mean_motion_ddot: set.mean_motion_ddot / (XPDOTP * 1440.0 * 1440.0),
            eccentricity,
            inclination,
            argument_of_perigee: set.arg_perigee_deg.to_radians(),
            right_ascension: set.raan_deg.to_radians(),
            mean_anomaly: set.mean_anomaly_deg.to_radians(),
            bstar: set.bstar,
            element_set_number: set.element_set_number,
            revolution_number: set.revolution_number,
            deep_space,
        })
    }

    /// Kozai mean motion period in minutes.
    pub fn period_minutes(&self) -> f64 {
        TAU / self.mean_motion
    }

    /// Whether the orbit is retrograde (inclination above 90°).
    pub fn is_retrograde(&self) -> bool {
        self.inclination > PI / 2.0
    }

    /// Epoch as a Julian date.
    pub fn epoch_julian_date(&self) -> f64 {
        self.epoch_days_since_1950 + time::JD_1950
    }
}

/// Brouwer mean motion recovered from the Kozai value on the card.
pub(crate) fn unkozai_mean_motion(
    kozai: f64,
    eccentricity: f64,
    inclination: f64,
    geo: &Geopotential,
) -> f64 {
    let cosio2 = inclination.cos().powi(2);
    let omeosq = 1.0 - eccentricity * eccentricity;
    let ak = (geo.xke / kozai).powf(2.0 / 3.0);
    let d1 = 0.75 * geo.j2 * (3.0 * cosio2 - 1.0) / (omeosq.sqrt() * omeosq);
    let del = d1 / (ak * ak);
    let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
    let del = d1 / (adel * adel);
    kozai / (1.0 + del)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn vanguard() -> Tle {
        Tle::parse(
            None,
            "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753",
            "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667",
        )
        .unwrap()
    }

    #[test]
    fn test_unit_normalization() {
        let el = OrbitalElements::from_tle(&vanguard()).unwrap();
        assert_abs_diff_eq!(el.mean_motion, 10.824_191_57 * TAU / 1440.0, epsilon = 1e-15);
        assert_abs_diff_eq!(el.inclination, 34.2682_f64.to_radians());
        assert_abs_diff_eq!(el.epoch_julian_date(), 2_451_723.284_950_62, epsilon = 1e-8);
        assert!(!el.deep_space);
        assert!(!el.is_retrograde());
    }

    #[test]
    fn test_deep_space_classification() {
        let tle = Tle::parse(
            None,
            "1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0   813",
            "2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225656",
        )
        .unwrap();
        let el = OrbitalElements::from_tle(&tle).unwrap();
        assert!(el.deep_space);
        assert!(el.period_minutes() > 700.0);
    }

    #[test]
    fn test_inclination_out_of_range() {
        let mut tle = vanguard();
        tle.elements.inclination_deg = 181.0;
        assert!(matches!(
            OrbitalElements::from_tle(&tle),
            Err(TleError::OutOfRange { field: "inclination", .. })
        ));
    }

    #[test]
    fn test_non_finite_angles_rejected() {
        for value in [f64::NAN, f64::INFINITY, 360.0, -1.0e-9] {
            let mut tle = vanguard();
            tle.elements.raan_deg = value;
            assert!(matches!(
                OrbitalElements::from_tle(&tle),
                Err(TleError::OutOfRange {
                    field: "right ascension of ascending node",
                    ..
                })
            ));
        }
        let mut tle = vanguard();
        tle.elements.mean_anomaly_deg = f64::NEG_INFINITY;
        assert!(OrbitalElements::from_tle(&tle).is_err());
    }

    #[test]
    fn test_zero_mean_motion_rejected() {
        let mut tle = vanguard();
        tle.elements.mean_motion = 0.0;
        assert!(OrbitalElements::from_tle(&tle).is_err());
    }
}
