//! Single-modality queries and the combined scan.

use crate::{
    config::Config,
    output,
    LocationArgs, OutputArgs,
};
use anyhow::Context;
use ecoscan_sources::{
    coordinate::{Coordinate, GeoQuery},
    modality::Modality,
    source::FetchOutcome,
};
use log::{info, warn};
use std::path::Path;

fn location_query(modality: Modality, location: &LocationArgs) -> anyhow::Result<GeoQuery> {
    let center = Coordinate::try_new(location.lat, location.lng)
        .with_context(|| format!("Invalid location {},{}", location.lat, location.lng))?;
    let radius = location
        .radius
        .unwrap_or_else(|| modality.default_radius_meters());
    if !radius.is_finite() || radius <= 0.0 {
        anyhow::bail!("Radius must be a positive number of meters, got {}", radius);
    }
    Ok(GeoQuery::new(center, radius))
}

fn log_outcome<T>(modality: Modality, outcome: &FetchOutcome<T>) {
    if outcome.is_live() {
        info!("{}: data from {}", modality, outcome.source);
    } else {
        warn!("{}: every source failed, showing synthetic data", modality);
    }
}

/// Fetch one modality and write it in the requested format.
pub async fn run_modality(
    modality: Modality,
    location: &LocationArgs,
    output: &OutputArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let query = location_query(modality, location)?;
    let scanner = config.scanner()?;
    info!(
        "Querying {} within {:.0} m of {}",
        modality, query.radius_meters, query.center
    );

    let text = match modality {
        Modality::AirQuality => {
            let outcome = scanner.air_quality(&query).await;
            log_outcome(modality, &outcome);
            output::render(&outcome, output.format)?
        }
        Modality::Temperature => {
            let outcome = scanner.temperature(&query).await;
            log_outcome(modality, &outcome);
            output::render(&outcome, output.format)?
        }
        Modality::TrafficPollution => {
            let outcome = scanner.traffic(&query).await;
            log_outcome(modality, &outcome);
            output::render(&outcome, output.format)?
        }
        Modality::GreenSpaces => {
            let outcome = scanner.green_spaces(&query).await;
            log_outcome(modality, &outcome);
            output::render(&outcome, output.format)?
        }
        Modality::Infrastructure => {
            let outcome = scanner.infrastructure(&query).await;
            log_outcome(modality, &outcome);
            output::render(&outcome, output.format)?
        }
    };
    output::emit(&text, output.output.as_deref())
}

/// Fetch every modality concurrently and write one JSON report.
pub async fn run_scan(
    lat: f64,
    lng: f64,
    output_path: Option<&Path>,
    config: &Config,
) -> anyhow::Result<()> {
    let center = Coordinate::try_new(lat, lng)
        .with_context(|| format!("Invalid location {},{}", lat, lng))?;
    let scanner = config.scanner()?;
    info!("Scanning all modalities around {}", center);

    let report = scanner.scan(center).await;
    let degraded = report.degraded();
    if degraded.is_empty() {
        info!("Scan complete, all modalities live");
    } else {
        warn!("Scan complete, synthetic data for: {}", degraded.join(", "));
    }
    let text = output::to_json(&report)?;
    output::emit(&text, output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(lat: f64, lng: f64, radius: Option<f64>) -> LocationArgs {
        LocationArgs { lat, lng, radius }
    }

    #[test]
    fn test_default_radius_per_modality() {
        let query = location_query(Modality::AirQuality, &location(37.5, -77.4, None)).unwrap();
        assert_eq!(query.radius_meters, 25_000.0);
        let query =
            location_query(Modality::GreenSpaces, &location(37.5, -77.4, Some(800.0))).unwrap();
        assert_eq!(query.radius_meters, 800.0);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(location_query(Modality::Temperature, &location(91.0, 0.0, None)).is_err());
        assert!(location_query(Modality::Temperature, &location(37.5, -77.4, Some(0.0))).is_err());
    }
}
