//! Great-circle distance, bearing and heading math.
//!
//! All angles are degrees; coordinates are WGS84 on a spherical earth.

use crate::gnss::Coordinate;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Folds any angle into `[0, 360)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Haversine distance between two coordinates in meters.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Forward azimuth from `from` toward `to`, in `[0, 360)`.
pub fn initial_bearing_degrees(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    let mut bearing = y.atan2(x).to_degrees();
    if bearing < 0.0 {
        bearing += 360.0;
    }
    normalize_degrees(bearing)
}

/// Corrects a raw compass azimuth into a true azimuth.
pub fn true_azimuth(raw_azimuth: f64, declination: f64) -> f64 {
    raw_azimuth - declination
}

/// Angle the indicator must rotate to point at the target, in `[0, 360)`.
pub fn heading_delta(bearing_to_target: f64, true_azimuth: f64) -> f32 {
    let delta = normalize_degrees(bearing_to_target - true_azimuth) as f32;
    // the f32 cast may round 359.99999999 up to 360
    if delta >= 360.0 {
        0.0
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn sample_points() -> Vec<Coordinate> {
        vec![
            Coordinate::new(40.0, -74.0),
            Coordinate::new(40.00001, -74.0),
            Coordinate::new(-33.8688, 151.2093),
            Coordinate::new(51.4779, -0.0015),
            Coordinate::new(89.9, 179.9),
            Coordinate::new(-89.9, -179.9),
            Coordinate::new(0.0, 0.0),
        ]
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        for p in sample_points() {
            assert_eq!(distance_meters(p, p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let points = sample_points();
        for a in &points {
            for b in &points {
                let ab = distance_meters(*a, *b);
                let ba = distance_meters(*b, *a);
                assert!((ab - ba).abs() <= EPS * ab.max(1.0), "{a:?} {b:?}");
            }
        }
    }

    #[test]
    fn test_distance_small_offset() {
        let d = distance_meters(Coordinate::new(40.0, -74.0), Coordinate::new(40.00001, -74.0));
        assert!((d - 1.112).abs() < 0.001, "got {d}");
    }

    #[test]
    fn test_distance_one_degree_on_equator() {
        let d = distance_meters(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert!((d - 111_194.93).abs() < 0.1, "got {d}");
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((initial_bearing_degrees(origin, Coordinate::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((initial_bearing_degrees(origin, Coordinate::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((initial_bearing_degrees(origin, Coordinate::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((initial_bearing_degrees(origin, Coordinate::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_always_in_range() {
        let points = sample_points();
        for a in &points {
            for b in &points {
                let bearing = initial_bearing_degrees(*a, *b);
                assert!((0.0..360.0).contains(&bearing), "{a:?} -> {b:?}: {bearing}");
            }
        }
    }

    #[test]
    fn test_heading_delta_range() {
        let mut bearing = 0.0;
        while bearing < 360.0 {
            let mut azimuth = 0.0;
            while azimuth < 360.0 {
                let delta = heading_delta(bearing, azimuth);
                assert!((0.0..360.0).contains(&delta), "{bearing} {azimuth}: {delta}");
                azimuth += 7.5;
            }
            bearing += 11.25;
        }
        assert_eq!(heading_delta(0.0, 1e-12), 0.0);
    }

    #[test]
    fn test_declination_corrected_heading() {
        let azimuth = true_azimuth(90.0, 5.0);
        assert_eq!(heading_delta(100.0, azimuth), 15.0);
        assert_eq!(heading_delta(10.0, 20.0), 350.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert_eq!(normalize_degrees(-1e-15), 0.0);
    }
}
