use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Datelike, Utc};
use tracing::warn;
use world_magnetic_model::{
    time::Date,
    uom::si::{
        angle::degree,
        f32::{Angle, Length},
        length::meter,
    },
    GeomagneticField,
};

use crate::gnss::Coordinate;

/// Source of the magnetic declination used to turn a compass reading into a
/// true azimuth.
pub trait DeclinationModel {
    /// Declination in degrees, east positive.
    fn declination_degrees(&self, coordinate: Coordinate, altitude: f64, at: DateTime<Utc>) -> f64;
}

impl<T: DeclinationModel + ?Sized> DeclinationModel for Box<T> {
    fn declination_degrees(&self, coordinate: Coordinate, altitude: f64, at: DateTime<Utc>) -> f64 {
        (**self).declination_degrees(coordinate, altitude, at)
    }
}

/// Constant declination, for tests and for a configured override.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedDeclination(pub f64);

impl DeclinationModel for FixedDeclination {
    fn declination_degrees(&self, _: Coordinate, _: f64, _: DateTime<Utc>) -> f64 {
        self.0
    }
}

/// Declination from the World Magnetic Model.
///
/// Outside the model's validity window the lookup fails; the declination then
/// falls back to zero and a warning is logged once.
#[derive(Debug, Default)]
pub struct WorldMagneticModel {
    warned: AtomicBool,
}

impl WorldMagneticModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declination in degrees, `None` outside the model's validity window.
    fn lookup(&self, coordinate: Coordinate, altitude: f64, at: DateTime<Utc>) -> Option<f64> {
        let date = Date::from_ordinal_date(at.year(), at.ordinal() as u16).ok()?;
        let field = GeomagneticField::new(
            Length::new::<meter>(altitude as f32),
            Angle::new::<degree>(coordinate.latitude as f32),
            Angle::new::<degree>(coordinate.longitude as f32),
            date,
        )
        .ok()?;
        Some(field.declination().get::<degree>() as f64)
    }
}

impl DeclinationModel for WorldMagneticModel {
    fn declination_degrees(&self, coordinate: Coordinate, altitude: f64, at: DateTime<Utc>) -> f64 {
        match self.lookup(coordinate, altitude, at) {
            Some(declination) => declination,
            None => {
                if !self.warned.swap(true, Ordering::Relaxed) {
                    warn!(
                        "World Magnetic Model has no data for {:?} at {}, using zero declination",
                        coordinate, at
                    );
                }
                0.0
            }
        }
    }
}
