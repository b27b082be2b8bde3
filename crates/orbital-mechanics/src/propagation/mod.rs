//! SGP4/SDP4 propagation
//!
//! [`Propagator::new`] derives every epoch-dependent coefficient once. The
//! propagator holds no mutable state, so one instance can be shared across
//! threads and queried at any times in any order.

mod deep_space;
pub mod kepler;
mod near_earth;

use crate::elements::{unkozai_mean_motion, OrbitalElements, DEEP_SPACE_PERIOD_MINUTES};
use crate::error::PropagationError;
use crate::gravity::{EarthModel, Geopotential};
use crate::time;
use chrono::{DateTime, Utc};
use deep_space::{DeepSpace, PeriodicElements};
use nalgebra::Vector3;
use near_earth::{EpochTerms, NearEarth, ShortPeriodTerms};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Largest |t| accepted by [`Propagator::propagate`], roughly 1.9 million years.
pub const MAX_MINUTES_SINCE_EPOCH: f64 = 1.0e12;

/// Operation mode of the reference theory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpsMode {
    /// Sidereal time from IAU-82 and a consistent node handling
    #[default]
    Improved,
    /// Legacy AFSPC sidereal time and node quadrant handling
    Afspc,
}

impl fmt::Display for OpsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpsMode::Improved => "improved",
            OpsMode::Afspc => "afspc",
        })
    }
}

impl FromStr for OpsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "i" | "improved" => Ok(OpsMode::Improved),
            "a" | "afspc" => Ok(OpsMode::Afspc),
            other => Err(format!("unknown operation mode '{}'", other)),
        }
    }
}

/// TEME position (km) and velocity (km/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionVelocity {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

impl PositionVelocity {
    pub fn position_vector(&self) -> Vector3<f64> {
        Vector3::from(self.position)
    }

    pub fn velocity_vector(&self) -> Vector3<f64> {
        Vector3::from(self.velocity)
    }

    /// Distance from the earth's centre, km
    pub fn radius(&self) -> f64 {
        self.position_vector().norm()
    }

    /// Inertial speed, km/s
    pub fn speed(&self) -> f64 {
        self.velocity_vector().norm()
    }
}

/// Mean elements advanced to one instant. Created and consumed inside a
/// single propagation call; exposed for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagationState {
    pub minutes_since_epoch: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub right_ascension: f64,
    pub argument_of_perigee: f64,
    pub mean_anomaly: f64,
    /// rad/min
    pub mean_motion: f64,
    /// Earth radii
    pub semi_major_axis: f64,
}

/// Brouwer mean elements at epoch.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EpochElements {
    pub ecco: f64,
    pub inclo: f64,
    pub nodeo: f64,
    pub argpo: f64,
    pub mo: f64,
    pub no_unkozai: f64,
    pub bstar: f64,
    pub days_since_1950: f64,
}

/// SGP4/SDP4 propagator for one element set.
#[derive(Debug, Clone)]
pub struct Propagator {
    model: EarthModel,
    ops_mode: OpsMode,
    geo: Geopotential,
    epoch: DateTime<Utc>,
    mean: EpochElements,
    gsto: f64,
    near: NearEarth,
    deep: Option<DeepSpace>,
}

impl Propagator {
    /// Initialise from `elements`. Elements that cannot be propagated even at
    /// epoch are rejected here.
    pub fn new(
        elements: &OrbitalElements,
        model: EarthModel,
        ops_mode: OpsMode,
    ) -> Result<Self, PropagationError> {
        let geo = model.geopotential();
        let no_unkozai = unkozai_mean_motion(
            elements.mean_motion,
            elements.eccentricity,
            elements.inclination,
            &geo,
        );
        if no_unkozai <= 0.0 || !no_unkozai.is_finite() {
            return Err(PropagationError::NonPositiveMeanMotion {
                mean_motion: no_unkozai,
            });
        }

        let mean = EpochElements {
            ecco: elements.eccentricity,
            inclo: elements.inclination,
            nodeo: elements.right_ascension,
            argpo: elements.argument_of_perigee,
            mo: elements.mean_anomaly,
            no_unkozai,
            bstar: elements.bstar,
            days_since_1950: elements.epoch_days_since_1950,
        };
        let gsto = match ops_mode {
            OpsMode::Afspc => time::gmst_afspc(mean.days_since_1950),
            OpsMode::Improved => time::gmst(mean.days_since_1950 + time::JD_1950),
        };

        let terms = EpochTerms::new(&mean, &geo);
        let deep_space = TAU / no_unkozai >= DEEP_SPACE_PERIOD_MINUTES;
        let near = NearEarth::new(&mean, &terms, &geo, deep_space);
        let deep = deep_space.then(|| DeepSpace::new(&mean, &terms, &near.rates, gsto, geo.xke));

        debug!(
            satellite = elements.satellite_number,
            %model,
            %ops_mode,
            deep_space,
            resonant = deep.as_ref().is_some_and(DeepSpace::is_resonant),
            simplified_drag = near.simplified,
            "Initialised propagator"
        );

        let propagator = Propagator {
            model,
            ops_mode,
            geo,
            epoch: elements.epoch,
            mean,
            gsto,
            near,
            deep,
        };
        propagator.propagate(0.0)?;
        Ok(propagator)
    }

    /// WGS-72, improved mode.
    pub fn with_defaults(elements: &OrbitalElements) -> Result<Self, PropagationError> {
        Self::new(elements, EarthModel::default(), OpsMode::default())
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn model(&self) -> EarthModel {
        self.model
    }

    pub fn ops_mode(&self) -> OpsMode {
        self.ops_mode
    }

    pub fn is_deep_space(&self) -> bool {
        self.deep.is_some()
    }

    /// Sidereal time at epoch, rad
    pub fn gsto(&self) -> f64 {
        self.gsto
    }

    /// Propagate to an absolute time.
    pub fn propagate_at(&self, time: DateTime<Utc>) -> Result<PositionVelocity, PropagationError> {
        self.propagate(time::minutes_since(self.epoch, time))
    }

    /// Mean elements after secular, drag and resonance effects at `t`
    /// minutes since epoch.
    pub fn mean_state(&self, t: f64) -> Result<PropagationState, PropagationError> {
        // The resonance integrator walks to t in fixed steps
        if t.is_nan() || t.abs() > MAX_MINUTES_SINCE_EPOCH {
            return Err(PropagationError::TimeOutOfRange {
                minutes_since_epoch: t,
            });
        }
        let secular = self.near.secular(&self.mean, t);
        let mut state = PropagationState {
            minutes_since_epoch: t,
            eccentricity: self.mean.ecco,
            inclination: self.mean.inclo,
            right_ascension: secular.nodem,
            argument_of_perigee: secular.argpm,
            mean_anomaly: secular.mm,
            mean_motion: self.mean.no_unkozai,
            semi_major_axis: 0.0,
        };
        if let Some(deep) = &self.deep {
            deep.advance(&mut state, &self.mean, self.near.rates.argpdot);
        }

        if state.mean_motion <= 0.0 {
            return Err(PropagationError::NonPositiveMeanMotion {
                mean_motion: state.mean_motion,
            });
        }

        let am = (self.geo.xke / state.mean_motion).powf(2.0 / 3.0) * secular.tempa * secular.tempa;
        if secular.tempa <= 0.0 || am < 1.0 {
            return Err(PropagationError::SatelliteDecayed {
                minutes_since_epoch: t,
                radius_earth_radii: am,
            });
        }

        let em = state.eccentricity - secular.tempe;
        if !(-0.001..1.0).contains(&em) {
            return Err(PropagationError::MeanEccentricityOutOfRange { eccentricity: em });
        }

        let mm = state.mean_anomaly + self.mean.no_unkozai * secular.templ;
        let nodem = state.right_ascension % TAU;
        let argpm = state.argument_of_perigee % TAU;
        let xlm = (mm + state.argument_of_perigee + state.right_ascension) % TAU;

        state.semi_major_axis = am;
        state.mean_motion = self.geo.xke / am.powf(1.5);
        state.eccentricity = em.max(1.0e-6);
        state.right_ascension = nodem;
        state.argument_of_perigee = argpm;
        state.mean_anomaly = (xlm - argpm - nodem) % TAU;
        Ok(state)
    }

    /// Position and velocity at `t` minutes since epoch.
    pub fn propagate(&self, t: f64) -> Result<PositionVelocity, PropagationError> {
        let mean = self.mean_state(t)?;
        let am = mean.semi_major_axis;
        let nm = mean.mean_motion;

        let mut osc = PeriodicElements {
            eccentricity: mean.eccentricity,
            inclination: mean.inclination,
            node: mean.right_ascension,
            argument_of_perigee: mean.argument_of_perigee,
            mean_anomaly: mean.mean_anomaly,
        };

        let short = match &self.deep {
            Some(deep) => {
                deep.apply_periodics(t, &mut osc, self.ops_mode);
                if osc.inclination < 0.0 {
                    osc.inclination = -osc.inclination;
                    osc.node += PI;
                    osc.argument_of_perigee -= PI;
                }
                if !(0.0..=1.0).contains(&osc.eccentricity) {
                    return Err(PropagationError::PerturbedEccentricityOutOfRange {
                        eccentricity: osc.eccentricity,
                    });
                }
                ShortPeriodTerms::new(osc.inclination, &self.geo)
            }
            None => self.near.short_period,
        };

        // long-period periodics
        let ep = osc.eccentricity;
        let argpp = osc.argument_of_perigee;
        let axnl = ep * argpp.cos();
        let temp = 1.0 / (am * (1.0 - ep * ep));
        let aynl = ep * argpp.sin() + temp * short.aycof;
        let xl = osc.mean_anomaly + argpp + osc.node + temp * short.xlcof * axnl;

        let u = (xl - osc.node) % TAU;
        let (sineo1, coseo1) = kepler::solve(u, axnl, aynl)?;

        // short-period preliminary quantities
        let ecose = axnl * coseo1 + aynl * sineo1;
        let esine = axnl * sineo1 - aynl * coseo1;
        let el2 = axnl * axnl + aynl * aynl;
        let pl = am * (1.0 - el2);
        if pl < 0.0 {
            return Err(PropagationError::NegativeSemiLatusRectum {
                semi_latus_rectum: pl,
            });
        }

        let rl = am * (1.0 - ecose);
        let rdotl = am.sqrt() * esine / rl;
        let rvdotl = pl.sqrt() / rl;
        let betal = (1.0 - el2).sqrt();
        let temp = esine / (1.0 + betal);
        let sinu = am / rl * (sineo1 - aynl - axnl * temp);
        let cosu = am / rl * (coseo1 - axnl + aynl * temp);
        let mut su = sinu.atan2(cosu);
        let sin2u = (cosu + cosu) * sinu;
        let cos2u = 1.0 - 2.0 * sinu * sinu;
        let temp = 1.0 / pl;
        let temp1 = 0.5 * self.geo.j2 * temp;
        let temp2 = temp1 * temp;

        let mrt = rl * (1.0 - 1.5 * temp2 * betal * short.con41)
            + 0.5 * temp1 * short.x1mth2 * cos2u;
        if mrt < 1.0 {
            return Err(PropagationError::SatelliteDecayed {
                minutes_since_epoch: t,
                radius_earth_radii: mrt,
            });
        }
        su -= 0.25 * temp2 * short.x7thm1 * sin2u;
        let xnode = osc.node + 1.5 * temp2 * short.cosip * sin2u;
        let xinc = osc.inclination + 1.5 * temp2 * short.cosip * short.sinip * cos2u;
        let mvt = rdotl - nm * temp1 * short.x1mth2 * sin2u / self.geo.xke;
        let rvdot = rvdotl + nm * temp1 * (short.x1mth2 * cos2u + 1.5 * short.con41) / self.geo.xke;

        // orientation vectors
        let (sinsu, cossu) = (su.sin(), su.cos());
        let (snod, cnod) = (xnode.sin(), xnode.cos());
        let (sini, cosi) = (xinc.sin(), xinc.cos());
        let xmx = -snod * cosi;
        let xmy = cnod * cosi;
        let u = Vector3::new(xmx * sinsu + cnod * cossu, xmy * sinsu + snod * cossu, sini * sinsu);
        let v = Vector3::new(xmx * cossu - cnod * sinsu, xmy * cossu - snod * sinsu, sini * cossu);

        let vkmpersec = self.geo.radius_km * self.geo.xke / 60.0;
        let r = u * (mrt * self.geo.radius_km);
        let rdot = (u * mvt + v * rvdot) * vkmpersec;

        Ok(PositionVelocity {
            position: r.into(),
            velocity: rdot.into(),
        })
    }
}

/// Propagate `elements` with the default earth model and operation mode.
pub fn propagate(
    elements: &OrbitalElements,
    minutes_since_epoch: f64,
) -> Result<PositionVelocity, PropagationError> {
    Propagator::with_defaults(elements)?.propagate(minutes_since_epoch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tle::Tle;
    use approx::assert_abs_diff_eq;

    fn elements(line1: &str, line2: &str) -> OrbitalElements {
        OrbitalElements::from_tle(&Tle::parse(None, line1, line2).unwrap()).unwrap()
    }

    fn vanguard() -> OrbitalElements {
        elements(
            "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753",
            "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667",
        )
    }

    fn molniya() -> OrbitalElements {
        elements(
            "1 08195U 75081A   06176.33215444  .00000099  00000-0  11873-3 0   813",
            "2 08195  64.1586 279.0717 6877146 264.7651  20.2257  2.00491383225656",
        )
    }

    fn assert_state(pv: &PositionVelocity, r: [f64; 3], v: [f64; 3]) {
        for i in 0..3 {
            assert_abs_diff_eq!(pv.position[i], r[i], epsilon = 1e-3);
            assert_abs_diff_eq!(pv.velocity[i], v[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_vanguard_reference_vectors() {
        let prop = Propagator::with_defaults(&vanguard()).unwrap();
        assert!(!prop.is_deep_space());

        assert_state(
            &prop.propagate(0.0).unwrap(),
            [7022.465_292_66, -1400.082_967_55, 0.039_951_55],
            [1.893_841_015, 6.405_893_759, 4.534_807_250],
        );
        assert_state(
            &prop.propagate(360.0).unwrap(),
            [-7154.031_202_02, -3783.176_825_04, -3536.194_122_94],
            [4.741_887_409, -4.151_817_765, -2.093_935_425],
        );
    }

    #[test]
    fn test_molniya_reference_vector() {
        let prop = Propagator::with_defaults(&molniya()).unwrap();
        assert!(prop.is_deep_space());
        assert_state(
            &prop.propagate(0.0).unwrap(),
            [2349.894_833_50, -14_785.938_115_62, 0.021_193_78],
            [2.721_488_096, -3.256_811_655, 4.498_416_672],
        );
    }

    #[test]
    fn test_repeat_calls_bit_identical() {
        let prop = Propagator::with_defaults(&vanguard()).unwrap();
        let a = prop.propagate(1234.5).unwrap();
        let b = prop.propagate(1234.5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_deep_space_reseeded_every_call() {
        let el = molniya();
        let shared = Propagator::with_defaults(&el).unwrap();
        // jump far ahead, then back, then forward again
        let order = [4320.0, -1440.0, 10_000.0, 720.5, 4320.0, 0.0];
        for t in order {
            let fresh = Propagator::with_defaults(&el).unwrap().propagate(t).unwrap();
            assert_eq!(shared.propagate(t).unwrap(), fresh, "t = {t}");
        }
    }

    #[test]
    fn test_mean_state_at_epoch_matches_elements() {
        let el = vanguard();
        let prop = Propagator::with_defaults(&el).unwrap();
        let state = prop.mean_state(0.0).unwrap();
        assert_abs_diff_eq!(state.eccentricity, el.eccentricity, epsilon = 1e-12);
        assert_abs_diff_eq!(state.inclination, el.inclination, epsilon = 1e-12);
        assert_abs_diff_eq!(
            state.mean_anomaly.rem_euclid(TAU),
            el.mean_anomaly,
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            state.argument_of_perigee.rem_euclid(TAU),
            el.argument_of_perigee,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_one_period_sweep_converges() {
        let prop = Propagator::with_defaults(&vanguard()).unwrap();
        let period = vanguard().period_minutes().ceil() as i32;
        for minute in 0..=period {
            prop.propagate(f64::from(minute)).unwrap();
        }
    }

    #[test]
    fn test_molniya_resonance_after_one_day() {
        let prop = Propagator::with_defaults(&molniya()).unwrap();
        assert_state(
            &prop.propagate(1440.0).unwrap(),
            [2890.806_382_68, -15_446.439_523_00, 948.770_101_76],
            [2.654_407_490, -2.909_344_895, 4.486_437_362],
        );
    }

    #[test]
    fn test_heavy_drag_decays() {
        let el = elements(
            "1 99999U 24001A   24001.50000000  .01000000  00000-0  50000-0 0  9990",
            "2 99999  98.0000  45.0000 0001000  90.0000 270.0000 15.50000000    14",
        );
        let prop = Propagator::with_defaults(&el).unwrap();

        let mut t = 0.0;
        let err = loop {
            match prop.propagate(t) {
                Ok(_) => t += 10.0,
                Err(err) => break err,
            }
            assert!(t < 2880.0, "still in orbit after two days");
        };
        match err {
            PropagationError::SatelliteDecayed {
                minutes_since_epoch,
                radius_earth_radii,
            } => {
                assert_eq!(minutes_since_epoch, t);
                assert!(radius_earth_radii < 1.0);
            }
            other => panic!("expected decay, got {other:?}"),
        }
    }

    #[test]
    fn test_free_function_matches_propagator() {
        let el = vanguard();
        let a = propagate(&el, 360.0).unwrap();
        let b = Propagator::new(&el, EarthModel::Wgs72, OpsMode::Improved)
            .unwrap()
            .propagate(360.0)
            .unwrap();
        assert_eq!(a, b);
    }

    fn afspc(el: &OrbitalElements) -> Propagator {
        Propagator::new(el, EarthModel::Wgs72, OpsMode::Afspc).unwrap()
    }

    #[test]
    fn test_afspc_mode_close_to_improved() {
        // sidereal time only feeds the resonance terms
        let near = vanguard();
        assert_eq!(
            afspc(&near).propagate(720.0).unwrap(),
            Propagator::with_defaults(&near).unwrap().propagate(720.0).unwrap()
        );

        let el = molniya();
        let a = afspc(&el).propagate(720.0).unwrap();
        let b = Propagator::with_defaults(&el).unwrap().propagate(720.0).unwrap();
        assert!((a.position_vector() - b.position_vector()).norm() < 1e-5);
    }

    #[test]
    fn test_afspc_lyddane_node_wrap_reference_vectors() {
        // e = 0.58 at 6.9 deg with the node regressing through zero
        let el = elements(
            "1 23599U 95029B   06171.76535463  .00085586  12891-6  12956-2 0  2905",
            "2 23599   6.9327   0.2849 5782022 274.4436  25.2425  4.47796565123555",
        );
        let prop = afspc(&el);
        assert!(prop.is_deep_space());
        assert_state(
            &prop.propagate(300.0).unwrap(),
            [1153.314_980_60, -6411.986_920_60, -779.872_889_41],
            [9.689_818_102, 1.388_598_425, 0.167_868_798],
        );
        assert_state(
            &prop.propagate(420.0).unwrap(),
            [4083.185_511_80, 22_910.883_068_02, 2786.356_426_60],
            [-2.536_610_941, 1.383_768_875, 0.168_165_414],
        );
        assert_state(
            &prop.propagate(720.0).unwrap(),
            [7141.247_425_26, 20_538.971_151_58, 2501.180_599_66],
            [-2.293_079_623, 2.333_598_993, 0.282_727_441],
        );

        // improved mode keeps the negative node, which moves the perigee
        let improved = Propagator::with_defaults(&el).unwrap().propagate(460.0).unwrap();
        let legacy = prop.propagate(460.0).unwrap();
        let gap = (improved.position_vector() - legacy.position_vector()).norm();
        assert!((0.5..2.0).contains(&gap), "gap {gap} km");
    }

    #[test]
    fn test_geostationary_resonance_reference_vectors() {
        // 0.0019 deg: the perturbed inclination goes negative about 1130 min in
        let el = elements(
            "1 28626U 05008A   06176.46683397 -.00000205  00000-0  10000-3 0  2190",
            "2 28626   0.0019 286.9433 0000335  13.7918  55.6504  1.00270176  4891",
        );
        let prop = Propagator::with_defaults(&el).unwrap();
        assert!(prop.is_deep_space());
        assert_state(
            &prop.propagate(0.0).unwrap(),
            [42_080.718_522_13, -2646.863_874_36, 0.818_512_94],
            [0.193_105_177, 3.068_688_251, 0.000_438_449],
        );
        assert_state(
            &prop.propagate(1200.0).unwrap(),
            [19_282.777_747_28, -37_495.592_505_98, -2.718_614_62],
            [2.734_400_524, 1.406_220_933, 0.000_103_486],
        );
        assert_state(
            &prop.propagate(1440.0).unwrap(),
            [42_119.962_634_99, -1925.775_672_63, -0.198_274_33],
            [0.140_521_206, 3.071_541_613, 0.000_179_561],
        );
    }

    #[test]
    fn test_lyddane_boundary_reference_vectors() {
        // 11.4384 deg sits just under 0.2 rad, so the perturbed inclination
        // crosses between the two periodic branches
        let el = elements(
            "1 14128U 83058A   06176.02844893 -.00000158  00000-0  10000-3 0  9627",
            "2 14128  11.4384  35.2134 0011562  26.4582 333.5652  0.98870114 46093",
        );
        let prop = Propagator::with_defaults(&el).unwrap();
        assert_state(
            &prop.propagate(2040.0).unwrap(),
            [-42_298.303_275_43, -119.033_511_18, 4922.963_888_41],
            [-0.052_232_768, -3.018_152_669, -0.493_827_331],
        );
        assert_state(
            &prop.propagate(2160.0).unwrap(),
            [-37_125.623_835_11, -20_879.630_583_68, 879.869_713_48],
            [1.456_499_841, -2.619_358_421, -0.604_081_694],
        );
        assert_state(
            &prop.propagate(2880.0).unwrap(),
            [37_802.253_930_45, 19_433.573_300_19, -1198.666_342_26],
            [-1.359_930_580, 2.677_830_903, 0.602_507_466],
        );
    }

    #[test]
    fn test_resonance_integrates_backwards() {
        let el = elements(
            "1 09998U 74033F   05148.79417928 -.00000112  00000-0  00000+0 0  4480",
            "2 09998   9.4958 313.1750 0270971 327.5225  30.8097  1.16186785 45878",
        );
        let prop = Propagator::with_defaults(&el).unwrap();
        assert_state(
            &prop.propagate(-1440.0).unwrap(),
            [-11_362.182_651_18, -35_117.558_678_13, -5413.625_379_94],
            [3.137_861_261, -1.011_678_260, 0.267_510_059],
        );
        assert_state(
            &prop.propagate(-720.0).unwrap(),
            [-8535.815_981_58, 38_171.790_738_51, 3331.003_112_85],
            [-3.043_839_958, -0.644_462_527, -0.445_808_894],
        );
    }

    #[test]
    fn test_unreachable_time_rejected() {
        for el in [molniya(), vanguard()] {
            let prop = Propagator::with_defaults(&el).unwrap();
            for t in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN, 1.0e300, -2.0e12] {
                assert!(matches!(
                    prop.propagate(t),
                    Err(PropagationError::TimeOutOfRange { .. })
                ));
                assert!(prop.mean_state(t).is_err());
            }
        }
    }

    #[test]
    fn test_propagator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Propagator>();
        assert_send_sync::<OrbitalElements>();
    }

    #[test]
    fn test_ops_mode_parse() {
        assert_eq!("afspc".parse::<OpsMode>().unwrap(), OpsMode::Afspc);
        assert_eq!("i".parse::<OpsMode>().unwrap(), OpsMode::Improved);
        assert!("x".parse::<OpsMode>().is_err());
    }
}
