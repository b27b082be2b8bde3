//! Pass prediction over a ground station
//!
//! A coarse scan at `step_seconds` finds horizon crossings, which are then
//! refined by bisection. Passes shorter than one scan step can be missed.

use crate::error::{OrbitalError, Result};
use crate::look_angles::{GroundStation, LookAngles};
use crate::Satellite;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassOptions {
    /// Elevation mask, degrees
    pub min_elevation_deg: f64,
    pub step_seconds: f64,
    /// Bisection stops once the bracket is this narrow
    pub refine_seconds: f64,
}

impl Default for PassOptions {
    fn default() -> Self {
        PassOptions {
            min_elevation_deg: 0.0,
            step_seconds: 60.0,
            refine_seconds: 1.0,
        }
    }
}

/// One visibility window. A pass already in progress at the search start, or
/// still in progress at its end, is clipped to the search interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassWindow {
    /// Acquisition of signal
    pub aos: DateTime<Utc>,
    /// Loss of signal
    pub los: DateTime<Utc>,
    /// Time of closest approach (maximum elevation)
    pub tca: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub aos_azimuth_deg: f64,
    pub los_azimuth_deg: f64,
    pub duration_seconds: f64,
}

/// All passes of `satellite` over `station` between `start` and `end`.
pub fn find_passes(
    satellite: &Satellite,
    station: &GroundStation,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    options: PassOptions,
) -> Result<Vec<PassWindow>> {
    if end <= start {
        return Err(OrbitalError::InvalidPassSearch(format!(
            "end {} is not after start {}",
            end, start
        )));
    }
    if !(options.step_seconds > 0.0 && options.refine_seconds > 0.0) {
        return Err(OrbitalError::InvalidPassSearch(format!(
            "step {}s and refinement {}s must be positive",
            options.step_seconds, options.refine_seconds
        )));
    }

    let step = seconds(options.step_seconds);
    let refine = seconds(options.refine_seconds);
    let mask = options.min_elevation_deg;
    let look = |t: DateTime<Utc>| satellite.look_angles(station, t);

    let mut passes = Vec::new();
    let mut prev_time = start;
    let mut prev = look(start)?;
    let mut open = prev.is_visible(mask).then_some(OpenPass {
        aos: start,
        aos_look: prev,
        peak_time: start,
        peak_elevation: prev.elevation,
    });

    while prev_time < end {
        let time = (prev_time + step).min(end);
        let current = look(time)?;

        open = match (open.take(), current.is_visible(mask)) {
            (None, true) => {
                let aos = bisect(&look, prev_time, time, mask, refine, true)?;
                Some(OpenPass {
                    aos,
                    aos_look: look(aos)?,
                    peak_time: time,
                    peak_elevation: current.elevation,
                })
            }
            (Some(pass), true) if current.elevation > pass.peak_elevation => Some(OpenPass {
                peak_time: time,
                peak_elevation: current.elevation,
                ..pass
            }),
            (Some(pass), true) => Some(pass),
            (Some(pass), false) => {
                let los = bisect(&look, prev_time, time, mask, refine, false)?;
                passes.push(close_pass(&look, &pass, los, step, refine)?);
                None
            }
            (None, false) => None,
        };

        prev_time = time;
        prev = current;
    }

    if let Some(pass) = open {
        passes.push(close_pass(&look, &pass, end, step, refine)?);
    }

    debug!(
        satellite = satellite.norad_id(),
        passes = passes.len(),
        last_elevation = prev.elevation,
        "Pass search complete"
    );
    Ok(passes)
}

/// Pass whose loss of signal has not been seen yet.
#[derive(Debug, Clone, Copy)]
struct OpenPass {
    aos: DateTime<Utc>,
    aos_look: LookAngles,
    /// Highest coarse sample so far
    peak_time: DateTime<Utc>,
    peak_elevation: f64,
}

fn seconds(value: f64) -> Duration {
    Duration::milliseconds((value * 1000.0).round().max(1.0) as i64)
}

/// Narrow a horizon crossing in `[lo, hi]` to within `refine`. `rising`
/// selects which side of the bracket starts below the mask.
fn bisect<F>(
    look: &F,
    mut lo: DateTime<Utc>,
    mut hi: DateTime<Utc>,
    mask: f64,
    refine: Duration,
    rising: bool,
) -> Result<DateTime<Utc>>
where
    F: Fn(DateTime<Utc>) -> Result<LookAngles>,
{
    while hi - lo > refine {
        let mid = lo + (hi - lo) / 2;
        let visible = look(mid)?.is_visible(mask);
        if visible == rising {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Ok(if rising { hi } else { lo })
}

/// Peak elevation by ternary search around the highest coarse sample.
fn close_pass<F>(
    look: &F,
    pass: &OpenPass,
    los: DateTime<Utc>,
    step: Duration,
    refine: Duration,
) -> Result<PassWindow>
where
    F: Fn(DateTime<Utc>) -> Result<LookAngles>,
{
    let mut lo = (pass.peak_time - step).max(pass.aos);
    let mut hi = (pass.peak_time + step).min(los);
    while hi - lo > refine {
        let third = (hi - lo) / 3;
        let a = lo + third;
        let b = hi - third;
        if look(a)?.elevation < look(b)?.elevation {
            lo = a;
        } else {
            hi = b;
        }
    }
    let tca = lo + (hi - lo) / 2;
    let peak = look(tca)?;
    let los_look = look(los)?;

    Ok(PassWindow {
        aos: pass.aos,
        los,
        tca,
        max_elevation_deg: peak.elevation,
        aos_azimuth_deg: pass.aos_look.azimuth,
        los_azimuth_deg: los_look.azimuth,
        duration_seconds: (los - pass.aos).num_milliseconds() as f64 / 1000.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tle::Tle;
    use chrono::TimeZone;

    fn iss() -> Satellite {
        let tle = Tle::parse(
            Some("ISS (ZARYA)"),
            "1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992",
            "2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008",
        )
        .unwrap();
        Satellite::from_tle(&tle).unwrap()
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 7, 13, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_passes_are_ordered_and_above_mask() {
        let sat = iss();
        // Boulder, CO
        let station = GroundStation::new(40.015, -105.27, 1.6).unwrap();
        let options = PassOptions {
            min_elevation_deg: 10.0,
            ..PassOptions::default()
        };
        let passes =
            find_passes(&sat, &station, start(), start() + Duration::days(2), options).unwrap();

        assert!(!passes.is_empty());
        for pair in passes.windows(2) {
            assert!(pair[0].los < pair[1].aos);
        }
        for pass in &passes {
            assert!(pass.aos <= pass.tca && pass.tca <= pass.los);
            assert!(pass.max_elevation_deg >= 10.0);
            // an ISS pass never lasts longer than a quarter orbit
            assert!(pass.duration_seconds > 0.0 && pass.duration_seconds < 25.0 * 60.0);

            let at_aos = sat.look_angles(&station, pass.aos).unwrap();
            if pass.aos == start() {
                continue;
            }
            assert!((at_aos.elevation - 10.0).abs() < 0.5, "{}", at_aos.elevation);
            let before = sat
                .look_angles(&station, pass.tca - Duration::seconds(30))
                .unwrap();
            assert!(before.elevation <= pass.max_elevation_deg + 1e-6);
        }
    }

    #[test]
    fn test_rejects_reversed_interval() {
        let station = GroundStation::new(0.0, 0.0, 0.0).unwrap();
        let err = find_passes(&iss(), &station, start(), start(), PassOptions::default());
        assert!(matches!(err, Err(OrbitalError::InvalidPassSearch(_))));
    }

    #[test]
    fn test_rejects_zero_step() {
        let station = GroundStation::new(0.0, 0.0, 0.0).unwrap();
        let options = PassOptions {
            step_seconds: 0.0,
            ..PassOptions::default()
        };
        let err = find_passes(&iss(), &station, start(), start() + Duration::hours(1), options);
        assert!(err.is_err());
    }
}
