//! Time scales used by the propagator
//!
//! UTC is taken as UT1 throughout. The sub-second difference matters for
//! sidereal time only at the tens-of-metres level, below SGP4's own error.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::f64::consts::TAU;

/// Julian date of 1970-01-01T00:00:00Z
pub const JD_UNIX_EPOCH: f64 = 2_440_587.5;
/// Julian date of 1949-12-31T00:00:00Z, the zero point of the deep-space theory
pub const JD_1950: f64 = 2_433_281.5;
/// Julian date of J2000.0
pub const JD_J2000: f64 = 2_451_545.0;

pub const MINUTES_PER_DAY: f64 = 1440.0;
const NANOS_PER_DAY: f64 = 86_400.0e9;

/// Julian date of an instant.
pub fn julian_date(time: DateTime<Utc>) -> f64 {
    let seconds = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) * 1e-9;
    JD_UNIX_EPOCH + seconds / 86_400.0
}

/// Julian date of midnight UTC starting January 1st of `year`.
pub fn julian_date_jan1(year: i32) -> Option<f64> {
    let jan1 = NaiveDate::from_yo_opt(year, 1)?;
    let unix = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    Some(JD_UNIX_EPOCH + (jan1 - unix).num_days() as f64)
}

/// Greenwich mean sidereal time (IAU-82) in radians, `[0, 2π)`.
pub fn gmst(jd_ut1: f64) -> f64 {
    let tut1 = (jd_ut1 - JD_J2000) / 36_525.0;
    let seconds = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093_104 * tut1 * tut1
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * tut1
        + 67_310.548_41;
    // 240 seconds of sidereal time per degree
    wrap_two_pi(seconds.to_radians() / 240.0)
}

/// Sidereal time at epoch from the AFSPC formulation, keyed on days since 1950.
pub fn gmst_afspc(days_since_1950: f64) -> f64 {
    const C1: f64 = 1.720_279_169_407_036_39e-2;
    const THGR70: f64 = 1.732_134_385_650_937_4;
    const FK5R: f64 = 5.075_514_194_322_694_42e-15;

    let ts70 = days_since_1950 - 7305.0;
    let ds70 = (ts70 + 1.0e-8).floor();
    let tfrac = ts70 - ds70;
    let c1p2p = C1 + TAU;
    wrap_two_pi(THGR70 + C1 * ds70 + c1p2p * tfrac + ts70 * ts70 * FK5R)
}

/// Instant `days` after midnight starting January 1st of `year`, where day 1.0
/// is that midnight (TLE day-of-year convention).
pub fn from_day_of_year(year: i32, day: f64) -> Option<DateTime<Utc>> {
    let jan1 = NaiveDate::from_yo_opt(year, 1)?.and_hms_opt(0, 0, 0)?;
    let offset = Duration::nanoseconds(((day - 1.0) * NANOS_PER_DAY).round() as i64);
    jan1.checked_add_signed(offset).map(|t| t.and_utc())
}

/// Signed minutes from `epoch` to `time`.
pub fn minutes_since(epoch: DateTime<Utc>, time: DateTime<Utc>) -> f64 {
    let delta = time.signed_duration_since(epoch);
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 60.0e9,
        // beyond ±292 years; millisecond resolution is plenty there
        None => delta.num_milliseconds() as f64 / 60_000.0,
    }
}

/// Instant `minutes` after `epoch`.
pub fn add_minutes(epoch: DateTime<Utc>, minutes: f64) -> DateTime<Utc> {
    epoch + Duration::nanoseconds((minutes * 60.0e9).round() as i64)
}

pub(crate) fn wrap_two_pi(angle: f64) -> f64 {
    let wrapped = angle % TAU;
    if wrapped < 0.0 {
        wrapped + TAU
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn test_julian_date_of_j2000() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_abs_diff_eq!(julian_date(t), JD_J2000, epsilon = 1e-9);
        assert_abs_diff_eq!(julian_date_jan1(2000).unwrap(), 2_451_544.5);
    }

    #[test]
    fn test_gmst_vallado_example() {
        // Vallado example 3-5: 1992-08-20 12:14 UT1 -> 152.578787886 deg
        let jd = 2_448_855.009_722;
        assert_abs_diff_eq!(gmst(jd).to_degrees(), 152.578_787_886, epsilon = 1e-3);
    }

    #[test]
    fn test_gmst_in_range() {
        for k in 0..100 {
            let g = gmst(2_450_000.0 + k as f64 * 37.3);
            assert!((0.0..TAU).contains(&g));
        }
    }

    #[test]
    fn test_afspc_matches_iau82_closely() {
        let days = 18_441.784_950_62;
        let a = gmst_afspc(days);
        let b = gmst(days + JD_1950);
        assert_abs_diff_eq!(a, b, epsilon = 1e-6);
    }

    #[test]
    fn test_day_of_year() {
        let t = from_day_of_year(2020, 1.5).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap());
        let t = from_day_of_year(2000, 179.784_950_62).unwrap();
        assert_abs_diff_eq!(julian_date(t), 2_451_723.284_950_62, epsilon = 1e-8);
    }

    #[test]
    fn test_minutes_round_trip() {
        let epoch = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let later = add_minutes(epoch, 90.5);
        assert_abs_diff_eq!(minutes_since(epoch, later), 90.5, epsilon = 1e-9);
        assert_abs_diff_eq!(minutes_since(later, epoch), -90.5, epsilon = 1e-9);
    }
}
