//! Ground Stations Library
//!
//! Catalog of ground stations loaded from JSON, with visibility and pass
//! queries against propagated satellites.

use chrono::{DateTime, Utc};
use orbital_mechanics::look_angles::to_look_angles_on;
use orbital_mechanics::{
    find_passes, GroundStation, LookAngles, OrbitalError, PassOptions, PassWindow, Satellite,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StationError {
    #[error("Station not found: {0}")]
    NotFound(String),
    #[error("Duplicate station id: {0}")]
    DuplicateId(String),
    #[error("Invalid coordinates for {id}: {reason}")]
    InvalidCoordinates { id: String, reason: String },
    #[error("Failed to read station catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed station catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Orbital(#[from] OrbitalError),
}

pub type Result<T> = std::result::Result<T, StationError>;

/// Default elevation mask when a catalog entry leaves it out, degrees
pub const DEFAULT_MIN_ELEVATION_DEG: f64 = 5.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StationStatus {
    #[default]
    Operational,
    Degraded,
    Maintenance,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub location: GeoLocation,
    #[serde(default = "default_min_elevation")]
    pub min_elevation_deg: f64,
    #[serde(default)]
    pub status: StationStatus,
}

fn default_min_elevation() -> f64 {
    DEFAULT_MIN_ELEVATION_DEG
}

impl Station {
    pub fn new(id: &str, name: &str, latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Station {
            id: id.to_string(),
            name: name.to_string(),
            location: GeoLocation {
                latitude,
                longitude,
                altitude_m,
            },
            min_elevation_deg: DEFAULT_MIN_ELEVATION_DEG,
            status: StationStatus::Operational,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| StationError::InvalidCoordinates {
            id: self.id.clone(),
            reason,
        };
        // Same coordinate bounds as the observers the look angles are computed for
        if let Err(e) = self.ground_station() {
            return Err(invalid(e.to_string()));
        }
        if !(-90.0..=90.0).contains(&self.min_elevation_deg) {
            return Err(invalid(format!(
                "elevation mask {}",
                self.min_elevation_deg
            )));
        }
        Ok(())
    }

    pub fn is_operational(&self) -> bool {
        self.status == StationStatus::Operational
    }

    /// Observer position in the form the propagator's transforms take.
    pub fn ground_station(&self) -> Result<GroundStation> {
        Ok(GroundStation::new(
            self.location.latitude,
            self.location.longitude,
            self.location.altitude_m / 1000.0,
        )?)
    }

    pub fn look_angles(&self, satellite: &Satellite, time: DateTime<Utc>) -> Result<LookAngles> {
        Ok(satellite.look_angles(&self.ground_station()?, time)?)
    }

    /// Passes above this station's elevation mask.
    pub fn passes(
        &self,
        satellite: &Satellite,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PassWindow>> {
        let options = PassOptions {
            min_elevation_deg: self.min_elevation_deg,
            ..PassOptions::default()
        };
        Ok(find_passes(
            satellite,
            &self.ground_station()?,
            start,
            end,
            options,
        )?)
    }
}

/// A station that can see the satellite, with the angles it sees it at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visibility {
    pub station_id: String,
    pub station_name: String,
    pub look: LookAngles,
}

/// Catalog files hold either a bare array or `{"stations": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<Station>),
    Wrapped { stations: Vec<Station> },
}

#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_stations(stations: Vec<Station>) -> Result<Self> {
        let mut registry = Self::new();
        for station in stations {
            registry.insert(station)?;
        }
        Ok(registry)
    }

    /// Load and validate a JSON station catalog.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading ground stations from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let stations = match serde_json::from_reader(reader)? {
            CatalogFile::List(stations) | CatalogFile::Wrapped { stations } => stations,
        };

        let registry = Self::from_stations(stations)?;
        info!(
            "Loaded {} stations ({} operational)",
            registry.len(),
            registry.operational().count()
        );
        Ok(registry)
    }

    pub fn insert(&mut self, station: Station) -> Result<()> {
        station.validate()?;
        if self.stations.iter().any(|s| s.id == station.id) {
            return Err(StationError::DuplicateId(station.id));
        }
        self.stations.push(station);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&Station> {
        self.stations
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| StationError::NotFound(id.to_string()))
    }

    pub fn set_status(&mut self, id: &str, status: StationStatus) -> Result<()> {
        let station = self
            .stations
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StationError::NotFound(id.to_string()))?;
        station.status = status;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    pub fn operational(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter().filter(|s| s.is_operational())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Operational stations that see `satellite` above their elevation mask at
    /// `time`, highest first. The satellite is propagated once.
    pub fn in_view(&self, satellite: &Satellite, time: DateTime<Utc>) -> Result<Vec<Visibility>> {
        let pv = satellite.position_velocity(time)?;
        let ellipsoid = satellite.propagator().model().ellipsoid();

        let mut visible = Vec::new();
        for station in self.operational() {
            let look = to_look_angles_on(&pv, &station.ground_station()?, time, &ellipsoid);
            if look.is_visible(station.min_elevation_deg) {
                visible.push(Visibility {
                    station_id: station.id.clone(),
                    station_name: station.name.clone(),
                    look,
                });
            }
        }
        visible.sort_by(|a, b| b.look.elevation.total_cmp(&a.look.elevation));

        debug!(
            satellite = satellite.norad_id(),
            visible = visible.len(),
            "Visibility check"
        );
        Ok(visible)
    }
}
