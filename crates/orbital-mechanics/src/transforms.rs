//! TEME to earth-fixed and geodetic transforms
//!
//! Polar motion and the equation of the equinoxes are ignored: the earth
//! frame is TEME rotated about z by Greenwich mean sidereal time.

use crate::gravity::{EarthModel, Ellipsoid};
use crate::propagation::PositionVelocity;
use crate::time;
use chrono::{DateTime, Utc};
use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Earth rotation rate, rad/s
pub const EARTH_ROTATION_RAD_PER_SEC: f64 = 7.292_115e-5;

const MAX_LATITUDE_ITERATIONS: usize = 10;
const LATITUDE_TOLERANCE: f64 = 1.0e-10;

/// Sub-satellite point and speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteData {
    /// Geodetic latitude, degrees
    pub latitude: f64,
    /// Longitude, degrees in [-180, 180]
    pub longitude: f64,
    /// Height above the ellipsoid, km
    pub altitude_km: f64,
    /// Inertial speed, km/s
    pub speed_km_s: f64,
}

/// Geodetic latitude, longitude and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    /// radians
    pub latitude: f64,
    /// radians
    pub longitude: f64,
    pub altitude_km: f64,
}

/// Sidereal time used to rotate TEME into the earth frame at `time`.
pub fn sidereal_time(time: DateTime<Utc>) -> f64 {
    time::gmst(time::julian_date(time))
}

/// Rotate a TEME vector into the pseudo earth-fixed frame.
pub fn teme_to_ecef(position: &Vector3<f64>, gmst: f64) -> Vector3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), -gmst) * position
}

/// Iterative geodetic latitude and height of an earth-fixed position.
pub fn ecef_to_geodetic(ecef: &Vector3<f64>, ellipsoid: &Ellipsoid) -> Geodetic {
    let a = ellipsoid.equatorial_radius_km;
    let e2 = ellipsoid.e2();
    let r = ecef.x.hypot(ecef.y);
    let longitude = ecef.y.atan2(ecef.x);

    let mut latitude = ecef.z.atan2(r);
    let mut c = 1.0;
    for _ in 0..MAX_LATITUDE_ITERATIONS {
        let sin_lat = latitude.sin();
        c = 1.0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (ecef.z + a * c * e2 * sin_lat).atan2(r);
        let delta = (next - latitude).abs();
        latitude = next;
        if delta < LATITUDE_TOLERANCE {
            break;
        }
    }

    let cos_lat = latitude.cos();
    let altitude_km = if cos_lat.abs() > 1.0e-8 {
        r / cos_lat - a * c
    } else {
        // at the poles the horizontal distance carries no height information
        ecef.z.abs() - a * c * (1.0 - e2)
    };

    Geodetic {
        latitude,
        longitude,
        altitude_km,
    }
}

/// Sub-satellite point of `pv` at `time` on the WGS-72 ellipsoid.
pub fn to_geodetic(pv: &PositionVelocity, time: DateTime<Utc>) -> SatelliteData {
    to_geodetic_on(pv, time, &EarthModel::default().ellipsoid())
}

pub fn to_geodetic_on(
    pv: &PositionVelocity,
    time: DateTime<Utc>,
    ellipsoid: &Ellipsoid,
) -> SatelliteData {
    let ecef = teme_to_ecef(&pv.position_vector(), sidereal_time(time));
    let geodetic = ecef_to_geodetic(&ecef, ellipsoid);

    SatelliteData {
        latitude: geodetic.latitude.to_degrees(),
        longitude: geodetic.longitude.to_degrees(),
        altitude_km: geodetic.altitude_km,
        speed_km_s: pv.speed(),
    }
}

/// TEME position (km) and velocity (km/s) of a point fixed to the earth.
///
/// `local_sidereal_time` is GMST plus the site longitude.
pub fn site_position_velocity(
    latitude: f64,
    local_sidereal_time: f64,
    altitude_km: f64,
    ellipsoid: &Ellipsoid,
) -> (Vector3<f64>, Vector3<f64>) {
    let a = ellipsoid.equatorial_radius_km;
    let f = ellipsoid.flattening;
    let sin_lat = latitude.sin();
    let c = 1.0 / (1.0 + f * (f - 2.0) * sin_lat * sin_lat).sqrt();
    let s = (1.0 - f) * (1.0 - f) * c;
    let achcp = (a * c + altitude_km) * latitude.cos();

    let position = Vector3::new(
        achcp * local_sidereal_time.cos(),
        achcp * local_sidereal_time.sin(),
        (a * s + altitude_km) * sin_lat,
    );
    let velocity = Vector3::z() * EARTH_ROTATION_RAD_PER_SEC;
    let velocity = velocity.cross(&position);
    (position, velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn wgs72() -> Ellipsoid {
        EarthModel::Wgs72.ellipsoid()
    }

    #[test]
    fn test_equatorial_point() {
        let g = ecef_to_geodetic(&Vector3::new(6378.135 + 500.0, 0.0, 0.0), &wgs72());
        assert_abs_diff_eq!(g.latitude, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g.longitude, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g.altitude_km, 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pole_altitude() {
        let ellipsoid = wgs72();
        let polar_radius = ellipsoid.equatorial_radius_km * (1.0 - ellipsoid.flattening);
        let g = ecef_to_geodetic(&Vector3::new(0.0, 0.0, polar_radius + 300.0), &ellipsoid);
        assert_abs_diff_eq!(g.latitude.to_degrees(), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(g.altitude_km, 300.0, epsilon = 1e-6);
    }

    #[test]
    fn test_site_round_trips_through_geodetic() {
        let ellipsoid = wgs72();
        let lat = 51.4779_f64.to_radians();
        let lon = -0.0015_f64.to_radians();
        let (position, velocity) = site_position_velocity(lat, lon, 0.046, &ellipsoid);
        let g = ecef_to_geodetic(&position, &ellipsoid);
        assert_abs_diff_eq!(g.latitude, lat, epsilon = 1e-10);
        assert_abs_diff_eq!(g.longitude, lon, epsilon = 1e-12);
        assert_abs_diff_eq!(g.altitude_km, 0.046, epsilon = 1e-6);
        // rotation speed at Greenwich, about 0.29 km/s
        assert_abs_diff_eq!(velocity.norm(), 0.2903, epsilon = 1e-4);
        assert_abs_diff_eq!(velocity.dot(&position), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_teme_rotation_preserves_length() {
        let v = Vector3::new(7000.0, -1200.0, 300.0);
        let rotated = teme_to_ecef(&v, 1.234);
        assert_abs_diff_eq!(rotated.norm(), v.norm(), epsilon = 1e-9);
        assert_abs_diff_eq!(rotated.z, v.z, epsilon = 1e-12);
    }

    #[test]
    fn test_longitude_in_range() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
        let pv = PositionVelocity {
            position: [-4000.0, -5000.0, 1000.0],
            velocity: [1.0, -2.0, 7.0],
        };
        let data = to_geodetic(&pv, time);
        assert!((-180.0..=180.0).contains(&data.longitude));
        assert_abs_diff_eq!(data.speed_km_s, 54.0_f64.sqrt(), epsilon = 1e-12);
    }
}
