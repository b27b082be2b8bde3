//! Error types for element loading and propagation

use thiserror::Error;

/// Reasons a two-line element set is rejected at load time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TleError {
    #[error("line {line}: expected 69 columns, found {found}")]
    LineLength { line: u8, found: usize },
    #[error("line {line}: expected line number '{line}', found '{found}'")]
    LineNumber { line: u8, found: char },
    #[error("line {line}: checksum digit is {expected} but column 69 holds '{found}'")]
    Checksum { line: u8, expected: u32, found: char },
    #[error("line {line}, columns {start}-{end}: cannot parse {field} from '{raw}'")]
    Field {
        line: u8,
        start: usize,
        end: usize,
        field: &'static str,
        raw: String,
    },
    #[error("satellite number mismatch: line 1 has {line1}, line 2 has {line2}")]
    SatelliteNumberMismatch { line1: u32, line2: u32 },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("record starting at line {line_no}: {source}")]
    Catalog {
        line_no: usize,
        #[source]
        source: Box<TleError>,
    },
    #[error("incomplete record at line {line_no}")]
    Incomplete { line_no: usize },
}

/// Deterministic propagation failures. None of these are worth retrying:
/// the same elements and time reproduce the same error.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PropagationError {
    #[error("Kepler's equation did not converge after {iterations} iterations (residual {residual:e} rad)")]
    KeplerNonConvergence { iterations: u32, residual: f64 },
    #[error("satellite decayed at {minutes_since_epoch} min: radius {radius_earth_radii} earth radii")]
    SatelliteDecayed {
        minutes_since_epoch: f64,
        radius_earth_radii: f64,
    },
    #[error("mean motion {mean_motion} rad/min is not positive")]
    NonPositiveMeanMotion { mean_motion: f64 },
    #[error("mean eccentricity {eccentricity} outside [0, 1)")]
    MeanEccentricityOutOfRange { eccentricity: f64 },
    #[error("perturbed eccentricity {eccentricity} outside [0, 1]")]
    PerturbedEccentricityOutOfRange { eccentricity: f64 },
    #[error("semi-latus rectum {semi_latus_rectum} is negative")]
    NegativeSemiLatusRectum { semi_latus_rectum: f64 },
    #[error("time {minutes_since_epoch} min since epoch is not finite or exceeds ±1e12 min")]
    TimeOutOfRange { minutes_since_epoch: f64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitalError {
    #[error("Malformed element set: {0}")]
    MalformedElementSet(#[from] TleError),
    #[error("Propagation failed: {0}")]
    Propagation(#[from] PropagationError),
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),
    #[error("Invalid pass search: {0}")]
    InvalidPassSearch(String),
}

pub type Result<T> = std::result::Result<T, OrbitalError>;
