//! Replay of a recorded GPS track.
//!
//! Each fix is smoothed, and the smoothed center drives the air quality
//! change gate. One line is printed per fix.

use crate::config::Config;
use anyhow::Context;
use chrono::{DateTime, Utc};
use ecoscan_pipeline::{
    report::AirQualityReport,
    session::{Refresh, Session},
};
use ecoscan_sources::coordinate::Coordinate;
use ecoscan_utils::smoothing::{GpsFix, GpsSmoother};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Walking pace, in meters per second.
pub const DEFAULT_PROCESS_NOISE: f64 = 3.0;

#[derive(Debug, Clone, Deserialize)]
struct FixRow {
    lat: f64,
    lng: f64,
    accuracy_m: f64,
    timestamp: DateTime<Utc>,
}

/// Parse a CSV with header `lat,lng,accuracy_m,timestamp` (RFC 3339).
pub fn parse_fixes(content: &str) -> anyhow::Result<Vec<GpsFix>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    reader
        .deserialize::<FixRow>()
        .enumerate()
        .map(|(i, row)| {
            let row = row.with_context(|| format!("Bad GPS fix on line {}", i + 2))?;
            Ok::<_, anyhow::Error>(GpsFix {
                lat: row.lat,
                lng: row.lng,
                accuracy_m: row.accuracy_m,
                timestamp: row.timestamp,
            })
        })
        .collect()
}

/// Human-readable summary of one gated refresh.
pub fn describe(refresh: &Refresh<AirQualityReport>, retained: Option<&AirQualityReport>) -> String {
    let summarize = |report: &AirQualityReport| {
        let worst = report.stations.iter().max_by_key(|s| s.aqi);
        match worst {
            Some(s) => format!(
                "{} stations, worst AQI {} ({})",
                report.stations.len(),
                s.aqi,
                s.category.label
            ),
            None => "no stations".to_string(),
        }
    };
    match refresh {
        Refresh::NoCenter => "no center".to_string(),
        Refresh::Skipped => match retained {
            Some(report) => format!("kept: {}", summarize(report)),
            None => "kept: nothing yet".to_string(),
        },
        Refresh::Applied(outcome) => {
            format!("fetched from {}: {}", outcome.source, summarize(&outcome.data))
        }
        Refresh::Discarded(_) => "stale result discarded".to_string(),
    }
}

pub async fn run_track(fixes_path: &Path, process_noise: f64, config: &Config) -> anyhow::Result<()> {
    let content = fs::read_to_string(fixes_path)
        .with_context(|| format!("Failed to read {}", fixes_path.display()))?;
    let fixes = parse_fixes(&content)?;
    info!("Replaying {} GPS fixes from {}", fixes.len(), fixes_path.display());

    let session = Session::new(config.scanner()?, config.gate());
    let mut smoother = GpsSmoother::new(process_noise);
    let mut fetches = 0;

    for fix in &fixes {
        let (lat, lng) = smoother.update(fix);
        let refresh = session.refresh_air_quality(Some(Coordinate::new(lat, lng))).await;
        if refresh.fetched() {
            fetches += 1;
        }
        let retained = session.air_quality.latest();
        println!(
            "{} raw={:.5},{:.5} smoothed={:.5},{:.5} {}",
            fix.timestamp.to_rfc3339(),
            fix.lat,
            fix.lng,
            lat,
            lng,
            describe(&refresh, retained.as_ref().map(|o| &o.data))
        );
    }

    info!("{} fixes, {} air quality fetches", fixes.len(), fetches);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoscan_pipeline::{gate::ChangeGate, scanner::Scanner};

    const TRACK: &str = "\
lat,lng,accuracy_m,timestamp
37.5000,-77.4000,10,2024-05-01T12:00:00Z
37.5001,-77.4001,12,2024-05-01T12:00:05Z
37.6000,-77.5000,8,2024-05-01T12:30:00Z
";

    #[test]
    fn test_parse_fixes() {
        let fixes = parse_fixes(TRACK).unwrap();
        assert_eq!(fixes.len(), 3);
        assert_eq!(fixes[1].accuracy_m, 12.0);
        assert_eq!(fixes[2].timestamp.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn test_parse_fixes_reports_line() {
        let err = parse_fixes("lat,lng,accuracy_m,timestamp\n37.5,-77.4,ten,2024-05-01T12:00:00Z\n")
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_replay_fetches_only_when_moving() {
        let session = Session::new(Scanner::offline().with_seed(4), ChangeGate::default());
        let mut smoother = GpsSmoother::new(DEFAULT_PROCESS_NOISE);
        let mut fetched = Vec::new();
        for fix in parse_fixes(TRACK).unwrap() {
            let (lat, lng) = smoother.update(&fix);
            let refresh = session.refresh_air_quality(Some(Coordinate::new(lat, lng))).await;
            fetched.push(refresh.fetched());
        }
        assert_eq!(fetched, vec![true, false, true]);
    }
}
