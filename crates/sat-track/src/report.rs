//! JSON reports for the tracker subcommands

use crate::{Result, TrackError};
use chrono::{DateTime, Duration, Utc};
use ground_stations::{StationRegistry, Visibility};
use orbital_mechanics::{
    GroundStation, LookAngles, PassWindow, PositionVelocity, Satellite, SatelliteData,
};
use serde::Serialize;
use tracing::debug;

/// Ground-track samples allowed in one report
pub const MAX_TRACK_POINTS: usize = 100_000;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SatelliteRef {
    pub name: String,
    pub norad_id: u32,
}

impl From<&Satellite> for SatelliteRef {
    fn from(satellite: &Satellite) -> Self {
        SatelliteRef {
            name: satellite.name().to_string(),
            norad_id: satellite.norad_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionReport {
    pub satellite: SatelliteRef,
    pub time: DateTime<Utc>,
    pub minutes_since_epoch: f64,
    /// Position (km) and velocity (km/s) in TEME
    pub teme: PositionVelocity,
    pub geodetic: SatelliteData,
}

#[derive(Debug, Clone, Serialize)]
pub struct LookReport {
    pub satellite: SatelliteRef,
    pub time: DateTime<Utc>,
    pub observer: GroundStation,
    pub look: LookAngles,
    /// Above the horizon
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationPasses {
    pub station_id: String,
    pub station_name: String,
    pub min_elevation_deg: f64,
    pub passes: Vec<PassWindow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub satellite: SatelliteRef,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub stations: Vec<StationPasses>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisibilityReport {
    pub satellite: SatelliteRef,
    pub time: DateTime<Utc>,
    pub in_view: Vec<Visibility>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TrackPoint {
    pub time: DateTime<Utc>,
    pub minutes_since_epoch: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_km: f64,
    pub speed_km_s: f64,
}

fn minutes_since_epoch(satellite: &Satellite, time: DateTime<Utc>) -> f64 {
    (time - satellite.propagator().epoch()).num_milliseconds() as f64 / 60_000.0
}

/// `start` shifted by `minutes`, or `InvalidArgument` when the result is
/// outside the representable calendar.
fn after(start: DateTime<Utc>, minutes: f64) -> Result<DateTime<Utc>> {
    let millis = (minutes * 60_000.0).round();
    Some(millis)
        .filter(|ms| ms.abs() < i64::MAX as f64)
        .and_then(|ms| Duration::try_milliseconds(ms as i64))
        .and_then(|offset| start.checked_add_signed(offset))
        .ok_or_else(|| {
            TrackError::InvalidArgument(format!(
                "{} minutes from {} is outside the supported time range",
                minutes, start
            ))
        })
}

pub fn position(satellite: &Satellite, time: DateTime<Utc>) -> Result<PositionReport> {
    Ok(PositionReport {
        satellite: satellite.into(),
        time,
        minutes_since_epoch: minutes_since_epoch(satellite, time),
        teme: satellite.position_velocity(time)?,
        geodetic: satellite.satellite_data(time)?,
    })
}

pub fn look(
    satellite: &Satellite,
    observer: GroundStation,
    time: DateTime<Utc>,
) -> Result<LookReport> {
    let look = satellite.look_angles(&observer, time)?;
    Ok(LookReport {
        satellite: satellite.into(),
        time,
        observer,
        look,
        visible: look.is_visible(0.0),
    })
}

/// Passes over every operational station in the next `hours` from `start`.
pub fn passes(
    satellite: &Satellite,
    registry: &StationRegistry,
    start: DateTime<Utc>,
    hours: f64,
) -> Result<PassReport> {
    if !(hours > 0.0 && hours.is_finite()) {
        return Err(TrackError::InvalidArgument(format!(
            "pass window of {} hours",
            hours
        )));
    }
    let end = after(start, hours * 60.0)?;

    let mut stations = Vec::new();
    for station in registry.operational() {
        let windows = station.passes(satellite, start, end)?;
        debug!(station = %station.id, passes = windows.len(), "Station passes");
        stations.push(StationPasses {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            min_elevation_deg: station.min_elevation_deg,
            passes: windows,
        });
    }

    Ok(PassReport {
        satellite: satellite.into(),
        start,
        end,
        stations,
    })
}

pub fn visibility(
    satellite: &Satellite,
    registry: &StationRegistry,
    time: DateTime<Utc>,
) -> Result<VisibilityReport> {
    Ok(VisibilityReport {
        satellite: satellite.into(),
        time,
        in_view: registry.in_view(satellite, time)?,
    })
}

/// Sub-satellite points every `step` minutes for `duration` minutes.
pub fn ground_track(
    satellite: &Satellite,
    start: DateTime<Utc>,
    duration: f64,
    step: f64,
) -> Result<Vec<TrackPoint>> {
    if !(step > 0.0 && step.is_finite()) || !(duration >= 0.0 && duration.is_finite()) {
        return Err(TrackError::InvalidArgument(format!(
            "track of {} minutes in {} minute steps",
            duration, step
        )));
    }
    let count = (duration / step).floor() as usize + 1;
    if count > MAX_TRACK_POINTS {
        return Err(TrackError::InvalidArgument(format!(
            "{} track points exceeds the limit of {}",
            count, MAX_TRACK_POINTS
        )));
    }
    after(start, duration)?;

    (0..count)
        .map(|i| {
            let time = after(start, step * i as f64)?;
            let data = satellite.satellite_data(time)?;
            Ok(TrackPoint {
                time,
                minutes_since_epoch: minutes_since_epoch(satellite, time),
                latitude: data.latitude,
                longitude: data.longitude,
                altitude_km: data.altitude_km,
                speed_km_s: data.speed_km_s,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ground_stations::Station;
    use orbital_mechanics::{OrbitalError, PropagationError, Tle};

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
    fn test_position_report_serialises() {
        let report = position(&iss(), start()).unwrap();
        assert_eq!(report.satellite.norad_id, 25544);
        assert!(report.minutes_since_epoch > 0.0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["satellite"]["name"], "ISS (ZARYA)");
        assert_eq!(json["teme"]["position"].as_array().unwrap().len(), 3);
        assert!(json["geodetic"]["altitude_km"].as_f64().unwrap() > 300.0);
    }

    #[test]
    fn test_look_report_visibility_flag() {
        let sat = iss();
        let data = sat.satellite_data(start()).unwrap();
        let under = GroundStation::new(data.latitude, data.longitude, 0.0).unwrap();
        assert!(look(&sat, under, start()).unwrap().visible);

        let antipode_lon = if data.longitude > 0.0 {
            data.longitude - 180.0
        } else {
            data.longitude + 180.0
        };
        let far = GroundStation::new(-data.latitude, antipode_lon, 0.0).unwrap();
        assert!(!look(&sat, far, start()).unwrap().visible);
    }

    #[test]
    fn test_ground_track_spacing() {
        let track = ground_track(&iss(), start(), 90.0, 10.0).unwrap();
        assert_eq!(track.len(), 10);
        for pair in track.windows(2) {
            let gap = pair[1].minutes_since_epoch - pair[0].minutes_since_epoch;
            assert!((gap - 10.0).abs() < 1e-6);
        }
        assert!(track.iter().all(|p| p.latitude.abs() <= 51.7));
    }

    #[test]
    fn test_ground_track_rejects_bad_step() {
        assert!(matches!(
            ground_track(&iss(), start(), 90.0, 0.0),
            Err(TrackError::InvalidArgument(_))
        ));
        assert!(matches!(
            ground_track(&iss(), start(), 1.0e9, 1.0),
            Err(TrackError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_far_future_windows_are_rejected() {
        let err = ground_track(&iss(), start(), 1.0e15, 1.0e13).unwrap_err();
        assert!(matches!(err, TrackError::InvalidArgument(_)));

        let registry =
            StationRegistry::from_stations(vec![Station::new("gs-1", "Boulder", 40.015, -105.27, 1600.0)])
                .unwrap();
        let err = passes(&iss(), &registry, start(), 1.0e13).unwrap_err();
        assert!(matches!(err, TrackError::InvalidArgument(_)));
    }

    #[test]
    fn test_ground_track_stops_on_decay() {
        let tle = Tle::parse(
            None,
            "1 99999U 24001A   24001.50000000  .01000000  00000-0  50000-0 0  9990",
            "2 99999  98.0000  45.0000 0001000  90.0000 270.0000 15.50000000    14",
        )
        .unwrap();
        let sat = Satellite::from_tle(&tle).unwrap();
        let epoch = sat.propagator().epoch();

        let err = ground_track(&sat, epoch, 2880.0, 10.0).unwrap_err();
        assert!(matches!(
            err,
            TrackError::Orbital(OrbitalError::Propagation(
                PropagationError::SatelliteDecayed { .. }
            ))
        ));
    }

    #[test]
    fn test_pass_report_skips_offline_stations() {
        let mut offline = Station::new("gs-2", "Offline", 0.0, 0.0, 0.0);
        offline.status = ground_stations::StationStatus::Offline;
        let registry = StationRegistry::from_stations(vec![
            Station::new("gs-1", "Boulder", 40.015, -105.27, 1600.0),
            offline,
        ])
        .unwrap();

        let report = passes(&iss(), &registry, start(), 24.0).unwrap();
        assert_eq!(report.stations.len(), 1);
        assert_eq!(report.stations[0].station_id, "gs-1");
        assert!(report.end - report.start == Duration::hours(24));
        assert!(passes(&iss(), &registry, start(), -1.0).is_err());
    }
}
