//! Shared utility functions for ecoscan crates.

/// Coordinate geometry helpers
pub mod geo {
    use crate::error::CoordinateError;

    /// Approximate length of one degree of latitude in meters.
    pub const METERS_PER_DEGREE: f64 = 111_320.0;

    /// Mean Earth radius in meters
    pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    /// Euclidean distance between two points measured directly on raw
    /// latitude/longitude degrees.
    ///
    /// This is only meaningful at city scale; longitude degrees shrink with
    /// latitude and nothing here corrects for that.
    pub fn planar_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
        let d_lat = lat2 - lat1;
        let d_lng = lng2 - lng1;
        (d_lat * d_lat + d_lng * d_lng).sqrt()
    }

    /// Great-circle distance in meters.
    pub fn haversine_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
        let phi1 = lat1.to_radians();
        let phi2 = lat2.to_radians();
        let d_phi = (lat2 - lat1).to_radians();
        let d_lambda = (lng2 - lng1).to_radians();
        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
    }

    /// Convert a distance in meters into degrees of latitude.
    pub fn meters_to_degrees(meters: f64) -> f64 {
        meters / METERS_PER_DEGREE
    }

    /// Convert a distance in degrees of latitude into meters.
    pub fn degrees_to_meters(degrees: f64) -> f64 {
        degrees * METERS_PER_DEGREE
    }

    /// Check that a latitude/longitude pair lies within WGS84 bounds.
    pub fn validate(lat: f64, lng: f64) -> Result<(), CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError(format!("non-finite coordinate {lat},{lng}")));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError(format!("latitude {lat} out of range")));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError(format!("longitude {lng} out of range")));
        }
        Ok(())
    }

    /// Parse a "lat,lng" string such as "37.5407,-77.4360"
    pub fn parse_lat_lng(s: &str) -> Result<(f64, f64), CoordinateError> {
        let mut parts = s.split(',');
        let (lat_str, lng_str) = match (parts.next(), parts.next(), parts.next()) {
            (Some(lat), Some(lng), None) => (lat.trim(), lng.trim()),
            _ => return Err(CoordinateError(format!("expected \"lat,lng\", got \"{s}\""))),
        };
        let lat = lat_str
            .parse::<f64>()
            .map_err(|e| CoordinateError(format!("bad latitude \"{lat_str}\": {e}")))?;
        let lng = lng_str
            .parse::<f64>()
            .map_err(|e| CoordinateError(format!("bad longitude \"{lng_str}\": {e}")))?;
        validate(lat, lng)?;
        Ok((lat, lng))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_planar_distance() {
            assert_eq!(planar_distance(0.0, 0.0, 3.0, 4.0), 5.0);
            assert_eq!(planar_distance(37.5, -77.4, 37.5, -77.4), 0.0);
        }

        #[test]
        fn test_haversine_one_degree_latitude() {
            let d = haversine_meters(37.0, -77.0, 38.0, -77.0);
            assert!((d - 111_195.0).abs() < 100.0, "got {d}");
        }

        #[test]
        fn test_meters_degrees_round_trip() {
            assert!((meters_to_degrees(1113.2) - 0.01).abs() < 1e-12);
            assert!((degrees_to_meters(0.015) - 1669.8).abs() < 1e-9);
        }

        #[test]
        fn test_parse_lat_lng() {
            let (lat, lng) = parse_lat_lng("37.5407, -77.4360").unwrap();
            assert_eq!(lat, 37.5407);
            assert_eq!(lng, -77.4360);
            assert!(parse_lat_lng("37.5").is_err());
            assert!(parse_lat_lng("91.0,0.0").is_err());
            assert!(parse_lat_lng("abc,1.0").is_err());
            assert!(parse_lat_lng("1,2,3").is_err());
        }
    }
}

/// Recursive position smoothing for noisy GPS fixes
pub mod smoothing {
    use chrono::{DateTime, Utc};
    use log::debug;

    /// Smallest accuracy a fix is trusted with, in meters.
    pub const MIN_ACCURACY_METERS: f64 = 1.0;

    /// A single raw position fix from a GPS receiver.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct GpsFix {
        pub lat: f64,
        pub lng: f64,
        /// Reported horizontal accuracy (1 sigma) in meters
        pub accuracy_m: f64,
        pub timestamp: DateTime<Utc>,
    }

    /// Scalar Kalman filter over latitude and longitude.
    ///
    /// Variance is kept in square meters. Between fixes it grows by
    /// `q² · dt` (q in meters per second), and each fix pulls the estimate
    /// towards itself by the gain `P / (P + R)`.
    #[derive(Debug, Clone)]
    pub struct GpsSmoother {
        q_meters_per_second: f64,
        lat: f64,
        lng: f64,
        variance: Option<f64>,
        last_timestamp: Option<DateTime<Utc>>,
    }

    impl GpsSmoother {
        pub fn new(q_meters_per_second: f64) -> Self {
            Self {
                q_meters_per_second,
                lat: 0.0,
                lng: 0.0,
                variance: None,
                last_timestamp: None,
            }
        }

        /// Fold a new fix into the estimate and return the smoothed position.
        pub fn update(&mut self, fix: &GpsFix) -> (f64, f64) {
            let accuracy = fix.accuracy_m.max(MIN_ACCURACY_METERS);
            let measurement_variance = accuracy * accuracy;

            let Some(mut variance) = self.variance else {
                self.lat = fix.lat;
                self.lng = fix.lng;
                self.variance = Some(measurement_variance);
                self.last_timestamp = Some(fix.timestamp);
                return (self.lat, self.lng);
            };

            if let Some(last) = self.last_timestamp {
                let dt_ms = (fix.timestamp - last).num_milliseconds();
                if dt_ms > 0 {
                    variance += dt_ms as f64 * self.q_meters_per_second * self.q_meters_per_second
                        / 1000.0;
                }
            }
            self.last_timestamp = Some(fix.timestamp);

            let gain = variance / (variance + measurement_variance);
            self.lat += gain * (fix.lat - self.lat);
            self.lng += gain * (fix.lng - self.lng);
            self.variance = Some((1.0 - gain) * variance);
            debug!(
                "gps fix ({:.6},{:.6}) acc={:.1}m gain={:.3} -> ({:.6},{:.6})",
                fix.lat, fix.lng, accuracy, gain, self.lat, self.lng
            );
            (self.lat, self.lng)
        }

        /// Current smoothed position, if any fix has been seen.
        pub fn estimate(&self) -> Option<(f64, f64)> {
            self.variance.map(|_| (self.lat, self.lng))
        }

        /// Current estimate variance in square meters.
        pub fn variance(&self) -> Option<f64> {
            self.variance
        }

        pub fn reset(&mut self) {
            self.variance = None;
            self.last_timestamp = None;
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::{Duration, TimeZone};

        fn fix(lat: f64, lng: f64, accuracy_m: f64, seconds: i64) -> GpsFix {
            GpsFix {
                lat,
                lng,
                accuracy_m,
                timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
                    + Duration::seconds(seconds),
            }
        }

        #[test]
        fn test_first_fix_passes_through() {
            let mut smoother = GpsSmoother::new(3.0);
            assert_eq!(smoother.estimate(), None);
            let pos = smoother.update(&fix(37.5, -77.4, 10.0, 0));
            assert_eq!(pos, (37.5, -77.4));
            assert_eq!(smoother.variance(), Some(100.0));
        }

        #[test]
        fn test_subsequent_fix_moves_partway() {
            let mut smoother = GpsSmoother::new(3.0);
            smoother.update(&fix(37.5, -77.4, 10.0, 0));
            let (lat, lng) = smoother.update(&fix(37.6, -77.5, 10.0, 1));
            assert!(lat > 37.5 && lat < 37.6);
            assert!(lng < -77.4 && lng > -77.5);
        }

        #[test]
        fn test_precise_fix_dominates_imprecise_estimate() {
            let mut smoother = GpsSmoother::new(1.0);
            smoother.update(&fix(37.5, -77.4, 500.0, 0));
            let (lat, _) = smoother.update(&fix(37.6, -77.4, 1.0, 1));
            assert!((lat - 37.6).abs() < 1e-4, "got {lat}");
        }

        #[test]
        fn test_non_positive_accuracy_is_clamped() {
            let mut smoother = GpsSmoother::new(1.0);
            smoother.update(&fix(37.5, -77.4, 0.0, 0));
            assert_eq!(smoother.variance(), Some(1.0));
            smoother.reset();
            assert_eq!(smoother.estimate(), None);
        }
    }
}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug, Clone, PartialEq)]
    pub struct CoordinateError(pub String);

    impl fmt::Display for CoordinateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Coordinate error: {}", self.0)
        }
    }

    impl std::error::Error for CoordinateError {}
}
