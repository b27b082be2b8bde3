//! Earth gravity and ellipsoid models
//!
//! SGP4 element sets are fitted against WGS-72 constants, so that is the
//! default. WGS-84 is available for callers that need to match tooling built
//! on it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Earth model selecting both the zonal harmonics used by the propagator and
/// the ellipsoid used by the geodetic transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarthModel {
    /// WGS-72 with the truncated `xke` of the original Spacetrack report
    Wgs72Old,
    #[default]
    Wgs72,
    Wgs84,
}

/// Zonal harmonic constants in canonical SGP4 units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geopotential {
    /// Gravitational parameter, km³/s²
    pub mu: f64,
    /// Equatorial radius, km
    pub radius_km: f64,
    /// sqrt(mu) in earth radii^1.5 per minute
    pub xke: f64,
    /// Minutes per canonical time unit (1 / xke)
    pub tumin: f64,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    pub j3oj2: f64,
}

/// Reference ellipsoid for geodetic conversions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    pub equatorial_radius_km: f64,
    pub flattening: f64,
}

impl Ellipsoid {
    /// First eccentricity squared
    pub fn e2(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }
}

impl EarthModel {
    pub fn geopotential(self) -> Geopotential {
        let (mu, radius_km, xke, j2, j3, j4) = match self {
            EarthModel::Wgs72Old => (
                398_600.799_64,
                6378.135,
                0.074_366_916_1,
                0.001_082_616,
                -0.000_002_538_81,
                -0.000_001_655_97,
            ),
            EarthModel::Wgs72 => {
                let mu: f64 = 398_600.8;
                let radius_km = 6378.135;
                let xke = 60.0 / (radius_km * radius_km * radius_km / mu).sqrt();
                (
                    mu,
                    radius_km,
                    xke,
                    0.001_082_616,
                    -0.000_002_538_81,
                    -0.000_001_655_97,
                )
            }
            EarthModel::Wgs84 => {
                let mu: f64 = 398_600.5;
                let radius_km = 6378.137;
                let xke = 60.0 / (radius_km * radius_km * radius_km / mu).sqrt();
                (
                    mu,
                    radius_km,
                    xke,
                    0.001_082_629_989_05,
                    -0.000_002_532_153_06,
                    -0.000_001_610_987_61,
                )
            }
        };

        Geopotential {
            mu,
            radius_km,
            xke,
            tumin: 1.0 / xke,
            j2,
            j3,
            j4,
            j3oj2: j3 / j2,
        }
    }

    pub fn ellipsoid(self) -> Ellipsoid {
        match self {
            EarthModel::Wgs72Old | EarthModel::Wgs72 => Ellipsoid {
                equatorial_radius_km: 6378.135,
                flattening: 1.0 / 298.26,
            },
            EarthModel::Wgs84 => Ellipsoid {
                equatorial_radius_km: 6378.137,
                flattening: 1.0 / 298.257_223_563,
            },
        }
    }
}

impl fmt::Display for EarthModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EarthModel::Wgs72Old => "wgs72old",
            EarthModel::Wgs72 => "wgs72",
            EarthModel::Wgs84 => "wgs84",
        };
        f.write_str(name)
    }
}

impl FromStr for EarthModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgs72old" | "wgs-72-old" => Ok(EarthModel::Wgs72Old),
            "wgs72" | "wgs-72" => Ok(EarthModel::Wgs72),
            "wgs84" | "wgs-84" => Ok(EarthModel::Wgs84),
            other => Err(format!(
                "unknown earth model '{}' (expected wgs72, wgs72old or wgs84)",
                other
            )),
        }
    }
}
