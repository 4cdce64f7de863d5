use ecoscan_utils::{error::CoordinateError, geo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validated constructor, rejecting non-finite or out-of-range values.
    pub fn try_new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        geo::validate(lat, lng)?;
        Ok(Self { lat, lng })
    }

    /// Planar Euclidean distance to `other` in raw degrees.
    pub fn degree_distance(&self, other: &Coordinate) -> f64 {
        geo::planar_distance(self.lat, self.lng, other.lat, other.lng)
    }

    /// Great-circle distance to `other` in meters.
    pub fn meters_to(&self, other: &Coordinate) -> f64 {
        geo::haversine_meters(self.lat, self.lng, other.lat, other.lng)
    }

    /// A new coordinate shifted by the given degree offsets.
    pub fn offset(&self, d_lat: f64, d_lng: f64) -> Coordinate {
        Coordinate {
            lat: self.lat + d_lat,
            lng: self.lng + d_lng,
        }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(pair: [f64; 2]) -> Self {
        Coordinate::new(pair[0], pair[1])
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from(pair: (f64, f64)) -> Self {
        Coordinate::new(pair.0, pair.1)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        geo::parse_lat_lng(s).map(Coordinate::from)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lng)
    }
}

/// A search request: where to look and how far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoQuery {
    pub center: Coordinate,
    pub radius_meters: f64,
}

impl GeoQuery {
    pub fn new(center: impl Into<Coordinate>, radius_meters: f64) -> Self {
        Self {
            center: center.into(),
            radius_meters,
        }
    }

    /// Search radius expressed in degrees of latitude.
    pub fn radius_degrees(&self) -> f64 {
        geo::meters_to_degrees(self.radius_meters)
    }

    /// Bounding box around the center as (south, west, north, east).
    ///
    /// The longitude span widens with latitude so the box covers the radius
    /// on the ground.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let d_lat = self.radius_degrees();
        let cos_lat = self.center.lat.to_radians().cos().abs().max(0.01);
        let d_lng = d_lat / cos_lat;
        (
            (self.center.lat - d_lat).max(-90.0),
            (self.center.lng - d_lng).max(-180.0),
            (self.center.lat + d_lat).min(90.0),
            (self.center.lng + d_lng).min(180.0),
        )
    }

    /// True when `point` lies within the search radius on the ground.
    pub fn contains(&self, point: &Coordinate) -> bool {
        self.center.meters_to(point) <= self.radius_meters
    }
}
