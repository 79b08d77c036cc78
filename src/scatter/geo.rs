// src/scatter/geo.rs
//! Geographic primitives for the scatter plot

/// Mean earth radius in meters.
const EARTH_RADIUS: f64 = 6_371_000.0;

/// An immutable latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Rectangular bounding box: south and west edges first, north and east
/// edges second.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Area {
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
}

impl Area {
    pub fn new(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
        Self {
            lat1,
            lon1,
            lat2,
            lon2,
        }
    }

    pub fn width(&self) -> f64 {
        self.lon2 - self.lon1
    }

    pub fn height(&self) -> f64 {
        self.lat2 - self.lat1
    }
}

/// Whether a point lies inside the bounding box (edges inclusive).
pub fn in_bounds(area: &Area, point: Point) -> bool {
    (area.lat1..=area.lat2).contains(&point.lat) && (area.lon1..=area.lon2).contains(&point.lon)
}

/// The point a given distance and bearing away from an origin, on a
/// spherical earth.
pub fn point_at_vector(origin: Point, distance_m: f64, bearing_deg: f64) -> Point {
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let bearing = bearing_deg.to_radians();
    let angular = distance_m / EARTH_RADIUS;

    let lat2 =
        (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    Point::new(lat2.to_degrees(), lon2.to_degrees())
}

/// Population standard deviation; None for an empty sample.
pub fn pstdev(values: impl Iterator<Item = f64> + Clone) -> Option<f64> {
    let n = values.clone().count();
    if n == 0 {
        return None;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    Some(variance.sqrt())
}
