//! SGP4 Satellite Tracker CLI
//!
//! Usage:
//!   sat-track --tle stations.tle --name "ISS (ZARYA)" position
//!   sat-track --tle stations.tle --norad 25544 look --lat 51.48 --lon -0.0015 --alt 0.046
//!   sat-track --tle stations.tle --norad 25544 passes --stations data/ground_stations.json --hours 48
//!   sat-track --tle stations.tle --norad 25544 track --minutes 95 --step 1

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ground_stations::StationRegistry;
use orbital_mechanics::{EarthModel, GroundStation, OpsMode, Satellite};
use sat_track::{load_catalog, report, select, Selector};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sat-track",
    about = "Propagate NORAD two-line element sets with SGP4/SDP4"
)]
struct Args {
    /// Element set catalog (two- or three-line records)
    #[arg(short, long, env = "SAT_TRACK_TLE")]
    tle: PathBuf,

    /// Select the satellite by title
    #[arg(long)]
    name: Option<String>,

    /// Select the satellite by NORAD catalog number
    #[arg(long, conflicts_with = "name")]
    norad: Option<u32>,

    /// Earth model: wgs72, wgs72old or wgs84
    #[arg(long, env = "SAT_TRACK_MODEL", default_value = "wgs72")]
    model: EarthModel,

    /// AFSPC-compatible sidereal time instead of the improved mode
    #[arg(long)]
    afspc: bool,

    /// Skip malformed catalog records instead of failing
    #[arg(long)]
    lossy: bool,

    /// Compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// TEME state and sub-satellite point
    Position {
        /// UTC time, RFC 3339 (default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Azimuth, elevation and range from an observer
    #[command(allow_negative_numbers = true)]
    Look {
        /// Geodetic latitude, degrees
        #[arg(long)]
        lat: f64,
        /// Longitude, degrees east
        #[arg(long)]
        lon: f64,
        /// Height above the ellipsoid, km
        #[arg(long, default_value_t = 0.0)]
        alt: f64,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Passes over the operational stations of a catalog
    Passes {
        /// Station catalog JSON
        #[arg(long, default_value = "data/ground_stations.json")]
        stations: PathBuf,
        #[arg(long, default_value_t = 24.0)]
        hours: f64,
        /// Window start (default: now)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
    },
    /// Stations that see the satellite at one instant
    Visible {
        #[arg(long, default_value = "data/ground_stations.json")]
        stations: PathBuf,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Ground track samples
    Track {
        #[arg(long, default_value_t = 90.0)]
        minutes: f64,
        /// Sample spacing, minutes
        #[arg(long, default_value_t = 1.0)]
        step: f64,
        #[arg(long)]
        from: Option<DateTime<Utc>>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays valid JSON
    let default_filter = if args.verbose {
        "sat_track=debug,orbital_mechanics=debug,ground_stations=debug"
    } else {
        "sat_track=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let catalog = load_catalog(&args.tle, args.lossy)?;
    let tle = select(&catalog, &Selector::from_args(args.name.clone(), args.norad))?;
    let ops_mode = if args.afspc {
        OpsMode::Afspc
    } else {
        OpsMode::Improved
    };
    let satellite = Satellite::with_model(tle, args.model, ops_mode)
        .with_context(|| format!("initialising {}", tle.display_name()))?;
    info!(
        "Tracking {} ({:05}), {} {}, epoch {}",
        satellite.name(),
        satellite.norad_id(),
        args.model,
        ops_mode,
        satellite.propagator().epoch()
    );

    let now = Utc::now();
    match args.command {
        Command::Position { at } => {
            emit(&report::position(&satellite, at.unwrap_or(now))?, args.compact)
        }
        Command::Look { lat, lon, alt, at } => {
            let observer = GroundStation::new(lat, lon, alt)?;
            emit(
                &report::look(&satellite, observer, at.unwrap_or(now))?,
                args.compact,
            )
        }
        Command::Passes {
            stations,
            hours,
            from,
        } => {
            let registry = StationRegistry::load_json(&stations)?;
            let pass_report = report::passes(&satellite, &registry, from.unwrap_or(now), hours)?;
            let total: usize = pass_report.stations.iter().map(|s| s.passes.len()).sum();
            info!(
                "{} passes over {} stations",
                total,
                pass_report.stations.len()
            );
            emit(&pass_report, args.compact)
        }
        Command::Visible { stations, at } => {
            let registry = StationRegistry::load_json(&stations)?;
            emit(
                &report::visibility(&satellite, &registry, at.unwrap_or(now))?,
                args.compact,
            )
        }
        Command::Track {
            minutes,
            step,
            from,
        } => emit(
            &report::ground_track(&satellite, from.unwrap_or(now), minutes, step)?,
            args.compact,
        ),
    }
}

fn emit<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}
