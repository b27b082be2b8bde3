//! Topocentric look angles from a ground station

use crate::error::{OrbitalError, Result};
use crate::gravity::{EarthModel, Ellipsoid};
use crate::propagation::PositionVelocity;
use crate::transforms::{sidereal_time, site_position_velocity};
use chrono::{DateTime, Utc};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Observer on the earth's surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundStation {
    /// Geodetic latitude, degrees
    pub latitude: f64,
    /// Longitude, degrees east
    pub longitude: f64,
    /// Height above the ellipsoid, km
    pub altitude_km: f64,
}

impl GroundStation {
    /// Build a station, rejecting latitudes outside [-90, 90] and longitudes
    /// outside [-180, 180].
    pub fn new(latitude: f64, longitude: f64, altitude_km: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }
        if !altitude_km.is_finite() {
            return Err(OrbitalError::InvalidCoordinates(format!(
                "altitude {} is not finite",
                altitude_km
            )));
        }
        Ok(GroundStation {
            latitude,
            longitude,
            altitude_km,
        })
    }
}

/// Direction, distance and closing speed of a satellite seen from a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookAngles {
    /// Degrees clockwise from north, [0, 360)
    pub azimuth: f64,
    /// Degrees above the horizon; negative below it
    pub elevation: f64,
    pub range_km: f64,
    /// Positive when receding, km/s
    pub range_rate_km_s: f64,
}

impl LookAngles {
    pub fn is_visible(&self, min_elevation_deg: f64) -> bool {
        self.elevation >= min_elevation_deg
    }
}

/// Look angles on the WGS-72 ellipsoid.
pub fn to_look_angles(
    pv: &PositionVelocity,
    station: &GroundStation,
    time: DateTime<Utc>,
) -> LookAngles {
    to_look_angles_on(pv, station, time, &EarthModel::default().ellipsoid())
}

pub fn to_look_angles_on(
    pv: &PositionVelocity,
    station: &GroundStation,
    time: DateTime<Utc>,
    ellipsoid: &Ellipsoid,
) -> LookAngles {
    let latitude = station.latitude.to_radians();
    let theta = sidereal_time(time) + station.longitude.to_radians();
    let (site_r, site_v) =
        site_position_velocity(latitude, theta, station.altitude_km, ellipsoid);

    let rho = pv.position_vector() - site_r;
    let rho_dot = pv.velocity_vector() - site_v;
    let range_km = rho.norm();

    // south, east, zenith
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let (sin_theta, cos_theta) = theta.sin_cos();
    let sez = Matrix3::new(
        sin_lat * cos_theta,
        sin_lat * sin_theta,
        -cos_lat,
        -sin_theta,
        cos_theta,
        0.0,
        cos_lat * cos_theta,
        cos_lat * sin_theta,
        sin_lat,
    );
    let top = sez * rho;

    let azimuth = top.y.atan2(-top.x).to_degrees().rem_euclid(360.0);
    let elevation = top.z.atan2(top.x.hypot(top.y)).to_degrees();

    LookAngles {
        // rem_euclid can round up to exactly 360
        azimuth: if azimuth >= 360.0 { 0.0 } else { azimuth },
        elevation,
        range_km,
        range_rate_km_s: rho.dot(&rho_dot) / range_km,
    }
}
