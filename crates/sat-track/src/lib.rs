//! Satellite Tracker
//!
//! Loads a NORAD element set catalog, picks one satellite from it and builds
//! position, look-angle, pass and ground-track reports that serialise to
//! JSON.

use ground_stations::StationError;
use orbital_mechanics::{OrbitalError, TleError};
use std::path::PathBuf;
use thiserror::Error;

pub mod catalog;
pub mod report;

pub use catalog::{load_catalog, select, Selector};

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed element set catalog: {0}")]
    Catalog(#[from] TleError),
    #[error("Catalog {0:?} holds no element sets")]
    EmptyCatalog(PathBuf),
    #[error("No satellite matches {0}")]
    NoMatch(String),
    #[error("'{query}' matches {} satellites: {}", .matches.len(), .matches.join(", "))]
    Ambiguous { query: String, matches: Vec<String> },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Orbital(#[from] OrbitalError),
    #[error(transparent)]
    Station(#[from] StationError),
}

pub type Result<T> = std::result::Result<T, TrackError>;
