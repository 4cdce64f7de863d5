//! Synthetic data used when every upstream source for a modality fails.
//!
//! Placement is deterministic: point `i` of `n` sits at angle `2π·i/n`
//! around the center. Only the distance from the center and the values are
//! drawn from the supplied random number generator, so a seeded generator
//! reproduces the exact output.

use crate::{
    coordinate::{Coordinate, GeoQuery},
    observation::Observation,
    records::{
        GreenSpace, GreenSpaceKind, InfrastructureKind, InfrastructureSite, PollutantReading,
        TemperatureReading,
    },
};
use chrono::Utc;
use rand::Rng;
use std::f64::consts::PI;

/// Number of synthetic air quality stations.
pub const AIR_QUALITY_POINTS: usize = 15;
/// Number of synthetic green spaces.
pub const GREEN_SPACE_POINTS: usize = 8;
/// Number of synthetic infrastructure sites.
pub const INFRASTRUCTURE_POINTS: usize = 12;

/// Plausible PM2.5 range in μg/m³ for synthetic stations.
pub const PM25_BOUNDS: (f64, f64) = (5.0, 150.0);
const PM25_BASELINE: f64 = 40.0;
const PM25_JITTER: (f64, f64) = (-35.0, 45.0);

/// Plausible air temperature range in °F for a synthetic base reading.
pub const TEMPERATURE_BOUNDS: (f64, f64) = (45.0, 85.0);

/// Plausible pollutant ranges in μg/m³ for a synthetic base reading.
pub const NO2_BOUNDS: (f64, f64) = (10.0, 80.0);
pub const CO_BOUNDS: (f64, f64) = (200.0, 800.0);
pub const TRAFFIC_PM25_BOUNDS: (f64, f64) = (5.0, 40.0);

/// Ring radius bounds in degrees, as (min, max).
const AIR_QUALITY_RING: (f64, f64) = (0.005, 0.05);
const GREEN_SPACE_RING: (f64, f64) = (0.004, 0.03);
const INFRASTRUCTURE_RING: (f64, f64) = (0.002, 0.025);

const PARK_NAMES: [&str; 8] = [
    "Riverside Park",
    "Community Garden",
    "Oak Hollow Preserve",
    "Maple Street Playground",
    "Cedar Woods",
    "Memorial Park",
    "Sunrise Garden",
    "Heron Marsh Preserve",
];

/// Place `count` points on a ring around `center`.
///
/// The angle of point `i` is `2π·i/count`. Its distance from the center is
/// drawn uniformly from `[min_radius, max_radius]` degrees; when the bounds
/// are inverted the minimum wins.
pub fn ring_positions<R: Rng + ?Sized>(
    center: Coordinate,
    count: usize,
    min_radius: f64,
    max_radius: f64,
    rng: &mut R,
) -> Vec<Coordinate> {
    let max_radius = max_radius.max(min_radius);
    (0..count)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / count as f64;
            let r = rng.gen_range(min_radius..=max_radius);
            center.offset(r * angle.cos(), r * angle.sin())
        })
        .collect()
}

/// Upper ring bound for a query: the modality's bound, shrunk to the search
/// radius when that is smaller.
fn ring_max(query: &GeoQuery, bound: f64) -> f64 {
    bound.min(query.radius_degrees())
}

/// 15 PM2.5 stations around the query center.
pub fn air_quality<R: Rng + ?Sized>(query: &GeoQuery, rng: &mut R) -> Vec<Observation> {
    let now = Utc::now();
    let positions = ring_positions(
        query.center,
        AIR_QUALITY_POINTS,
        AIR_QUALITY_RING.0,
        ring_max(query, AIR_QUALITY_RING.1),
        rng,
    );
    positions
        .into_iter()
        .enumerate()
        .map(|(i, position)| {
            let value = (PM25_BASELINE + rng.gen_range(PM25_JITTER.0..=PM25_JITTER.1))
                .clamp(PM25_BOUNDS.0, PM25_BOUNDS.1);
            Observation::pm25(
                position.lat,
                position.lng,
                value,
                format!("Synthetic Station {}", i + 1),
            )
            .with_timestamp(now)
        })
        .collect()
}

/// One base temperature reading for the query center.
pub fn temperature<R: Rng + ?Sized>(_query: &GeoQuery, rng: &mut R) -> TemperatureReading {
    TemperatureReading {
        temperature_f: rng.gen_range(TEMPERATURE_BOUNDS.0..=TEMPERATURE_BOUNDS.1),
        observed_at: Some(Utc::now()),
    }
}

/// One base pollutant reading for the query center.
pub fn pollutants<R: Rng + ?Sized>(_query: &GeoQuery, rng: &mut R) -> PollutantReading {
    PollutantReading {
        no2: rng.gen_range(NO2_BOUNDS.0..=NO2_BOUNDS.1),
        co: rng.gen_range(CO_BOUNDS.0..=CO_BOUNDS.1),
        pm25: rng.gen_range(TRAFFIC_PM25_BOUNDS.0..=TRAFFIC_PM25_BOUNDS.1),
        observed_at: Some(Utc::now()),
    }
}

/// Eight green spaces, cycling through every kind.
pub fn green_spaces<R: Rng + ?Sized>(query: &GeoQuery, rng: &mut R) -> Vec<GreenSpace> {
    ring_positions(
        query.center,
        GREEN_SPACE_POINTS,
        GREEN_SPACE_RING.0,
        ring_max(query, GREEN_SPACE_RING.1),
        rng,
    )
    .into_iter()
    .enumerate()
    .map(|(i, position)| GreenSpace {
        id: format!("synthetic/green/{}", i + 1),
        name: PARK_NAMES[i % PARK_NAMES.len()].to_string(),
        kind: GreenSpaceKind::ALL[i % GreenSpaceKind::ALL.len()],
        lat: position.lat,
        lng: position.lng,
    })
    .collect()
}

/// Twelve infrastructure sites, cycling through every kind.
pub fn infrastructure<R: Rng + ?Sized>(query: &GeoQuery, rng: &mut R) -> Vec<InfrastructureSite> {
    ring_positions(
        query.center,
        INFRASTRUCTURE_POINTS,
        INFRASTRUCTURE_RING.0,
        ring_max(query, INFRASTRUCTURE_RING.1),
        rng,
    )
    .into_iter()
    .enumerate()
    .map(|(i, position)| {
        let kind = InfrastructureKind::ALL[i % InfrastructureKind::ALL.len()];
        InfrastructureSite {
            id: format!("synthetic/infrastructure/{}", i + 1),
            name: format!("{} {}", kind.label(), i / InfrastructureKind::ALL.len() + 1),
            kind,
            lat: position.lat,
            lng: position.lng,
        }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn query() -> GeoQuery {
        GeoQuery::new((37.5407, -77.4360), 25_000.0)
    }

    #[test]
    fn test_ring_angles_are_fixed() {
        let mut rng = StdRng::seed_from_u64(42);
        let center = Coordinate::new(0.0, 0.0);
        let positions = ring_positions(center, 4, 0.01, 0.01, &mut rng);
        assert_eq!(positions.len(), 4);
        // i = 0 lies due north, i = 1 due east
        assert!((positions[0].lat - 0.01).abs() < 1e-12);
        assert!(positions[0].lng.abs() < 1e-12);
        assert!(positions[1].lat.abs() < 1e-12);
        assert!((positions[1].lng - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_air_quality_count_and_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let observations = air_quality(&query(), &mut rng);
        assert_eq!(observations.len(), AIR_QUALITY_POINTS);
        for obs in &observations {
            assert!(obs.value >= PM25_BOUNDS.0 && obs.value <= PM25_BOUNDS.1);
            let d = obs.coordinate().degree_distance(&query().center);
            assert!(d >= AIR_QUALITY_RING.0 - 1e-9 && d <= AIR_QUALITY_RING.1 + 1e-9);
        }
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let a = air_quality(&query(), &mut StdRng::seed_from_u64(1));
        let b = air_quality(&query(), &mut StdRng::seed_from_u64(1));
        let values_a: Vec<f64> = a.iter().map(|o| o.value).collect();
        let values_b: Vec<f64> = b.iter().map(|o| o.value).collect();
        assert_eq!(values_a, values_b);
    }

    #[test]
    fn test_small_radius_shrinks_ring_to_minimum() {
        let mut rng = StdRng::seed_from_u64(3);
        let tiny = GeoQuery::new((37.5, -77.4), 100.0);
        let observations = air_quality(&tiny, &mut rng);
        for obs in &observations {
            let d = obs.coordinate().degree_distance(&tiny.center);
            assert!((d - AIR_QUALITY_RING.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_base_readings_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let t = temperature(&query(), &mut rng);
            assert!(t.temperature_f >= TEMPERATURE_BOUNDS.0 && t.temperature_f <= TEMPERATURE_BOUNDS.1);
            let p = pollutants(&query(), &mut rng);
            assert!(p.no2 >= NO2_BOUNDS.0 && p.no2 <= NO2_BOUNDS.1);
            assert!(p.co >= CO_BOUNDS.0 && p.co <= CO_BOUNDS.1);
            assert!(p.pm25 >= TRAFFIC_PM25_BOUNDS.0 && p.pm25 <= TRAFFIC_PM25_BOUNDS.1);
        }
    }

    #[test]
    fn test_green_spaces_and_infrastructure_cycle_kinds() {
        let mut rng = StdRng::seed_from_u64(5);
        let parks = green_spaces(&query(), &mut rng);
        assert_eq!(parks.len(), GREEN_SPACE_POINTS);
        assert_eq!(parks[0].kind, GreenSpaceKind::Park);
        assert_eq!(parks[5].kind, GreenSpaceKind::Park);

        let sites = infrastructure(&query(), &mut rng);
        assert_eq!(sites.len(), INFRASTRUCTURE_POINTS);
        assert_eq!(sites[1].kind, InfrastructureKind::BikeShare);
        assert_eq!(sites[6].name, "Bike Share 2");
    }
}
