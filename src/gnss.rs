use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic coordinate in degrees (WGS84).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// `true` when both fields lie inside the geographic range.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A single fix delivered by the position source.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PositionSample {
    pub coordinate: Coordinate,
    /// in meters
    pub altitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(coordinate: Coordinate, altitude: f64, timestamp: DateTime<Utc>) -> Self {
        PositionSample {
            coordinate,
            altitude,
            timestamp,
        }
    }

    /// Builds a sample from a gpsd TPV report.
    ///
    /// Returns `None` without a 2D/3D fix or when latitude or longitude is
    /// missing or out of range. A missing or unparsable `time` falls back to
    /// now.
    pub fn from_tpv(tpv: &gpsd_proto::Tpv) -> Option<Self> {
        if matches!(tpv.mode, gpsd_proto::Mode::NoFix) {
            return None;
        }
        let coordinate = Coordinate::new(tpv.lat?, tpv.lon?);
        if !coordinate.is_valid() {
            return None;
        }
        let timestamp = tpv
            .time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        Some(PositionSample {
            coordinate,
            altitude: tpv.alt.unwrap_or_default() as f64,
            timestamp,
        })
    }
}

/// Raw compass azimuth, not yet corrected for magnetic declination.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct OrientationSample {
    /// in degrees
    pub raw_azimuth_degrees: f32,
}

impl OrientationSample {
    pub const fn new(raw_azimuth_degrees: f32) -> Self {
        OrientationSample {
            raw_azimuth_degrees,
        }
    }
}
