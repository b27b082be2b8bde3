//! Orbital Mechanics Library
//!
//! SGP4/SDP4 propagation of NORAD two-line element sets, TEME to geodetic
//! transforms, ground-station look angles and pass prediction.
//!
//! ```no_run
//! use orbital_mechanics::{Coordinate, Tle, TleInterpreter};
//!
//! let tle: Tle = "ISS (ZARYA)
//! 1 25544U 98067A   20194.88612269 -.00002218  00000-0 -31515-4 0  9992
//! 2 25544  51.6461 221.2784 0001413  89.1723 280.4612 15.49507896236008"
//!     .parse()?;
//! let now = chrono::Utc::now();
//! let interpreter = TleInterpreter::default();
//! let data = interpreter.satellite_data(&tle, now)?;
//! let look = interpreter.look_angles(&tle, now, Coordinate::new(51.48, 0.0), 0.05)?;
//! println!("{:.2} {:.2} {:.1}", data.latitude, data.longitude, look.elevation);
//! # Ok::<(), orbital_mechanics::OrbitalError>(())
//! ```

pub mod elements;
pub mod error;
pub mod gravity;
pub mod look_angles;
pub mod passes;
pub mod propagation;
pub mod time;
pub mod tle;
pub mod transforms;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use elements::OrbitalElements;
pub use error::{OrbitalError, PropagationError, Result, TleError};
pub use gravity::EarthModel;
pub use look_angles::{GroundStation, LookAngles};
pub use passes::{find_passes, PassOptions, PassWindow};
pub use propagation::{propagate, OpsMode, PositionVelocity, Propagator};
pub use tle::{parse_catalog, ElementSet, Tle};
pub use transforms::SatelliteData;

/// Latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }
}

/// A named element set with its propagator, for repeated queries.
#[derive(Debug, Clone)]
pub struct Satellite {
    name: String,
    elements: OrbitalElements,
    propagator: Propagator,
}

impl Satellite {
    pub fn from_tle(tle: &Tle) -> Result<Self> {
        Self::with_model(tle, EarthModel::default(), OpsMode::default())
    }

    pub fn with_model(tle: &Tle, model: EarthModel, ops_mode: OpsMode) -> Result<Self> {
        let elements = OrbitalElements::from_tle_with_model(tle, model)?;
        let propagator = Propagator::new(&elements, model, ops_mode)?;
        Ok(Satellite {
            name: tle.display_name(),
            elements,
            propagator,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn norad_id(&self) -> u32 {
        self.elements.satellite_number
    }

    pub fn elements(&self) -> &OrbitalElements {
        &self.elements
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// TEME state at `time`.
    pub fn position_velocity(&self, time: DateTime<Utc>) -> Result<PositionVelocity> {
        Ok(self.propagator.propagate_at(time)?)
    }

    pub fn satellite_data(&self, time: DateTime<Utc>) -> Result<SatelliteData> {
        let pv = self.position_velocity(time)?;
        let ellipsoid = self.propagator.model().ellipsoid();
        Ok(transforms::to_geodetic_on(&pv, time, &ellipsoid))
    }

    pub fn look_angles(&self, station: &GroundStation, time: DateTime<Utc>) -> Result<LookAngles> {
        let pv = self.position_velocity(time)?;
        let ellipsoid = self.propagator.model().ellipsoid();
        Ok(look_angles::to_look_angles_on(&pv, station, time, &ellipsoid))
    }
}

/// One-shot queries that parse, initialise and propagate per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TleInterpreter {
    pub model: EarthModel,
    pub ops_mode: OpsMode,
}

impl TleInterpreter {
    pub fn new(model: EarthModel, ops_mode: OpsMode) -> Self {
        TleInterpreter { model, ops_mode }
    }

    /// Sub-satellite point and speed at `date`.
    pub fn satellite_data(&self, tle: &Tle, date: DateTime<Utc>) -> Result<SatelliteData> {
        Satellite::with_model(tle, self.model, self.ops_mode)?.satellite_data(date)
    }

    /// Look angles from an observer at `coordinate`, `altitude_km` above the
    /// ellipsoid.
    pub fn look_angles(
        &self,
        tle: &Tle,
        date: DateTime<Utc>,
        coordinate: Coordinate,
        altitude_km: f64,
    ) -> Result<LookAngles> {
        let station =
            GroundStation::new(coordinate.latitude, coordinate.longitude, altitude_km)?;
        Satellite::with_model(tle, self.model, self.ops_mode)?.look_angles(&station, date)
    }
}
