use async_trait::async_trait;
use ecoscan_data::classification::AQI_TABLE;
use ecoscan_pipeline::{
    gate::ChangeGate,
    scanner::Scanner,
    session::{Refresh, Session},
};
use ecoscan_sources::{
    coordinate::{Coordinate, GeoQuery},
    error::{Result, SourceError},
    observation::Observation,
    source::{Provenance, Source, SourceChain, SYNTHETIC_SOURCE},
    synthetic::AIR_QUALITY_POINTS,
};

struct Unreachable(&'static str);

#[async_trait]
impl Source<Vec<Observation>> for Unreachable {
    fn name(&self) -> &'static str {
        self.0
    }

    async fn fetch(&self, _query: &GeoQuery) -> Result<Vec<Observation>> {
        Err(SourceError::BadStatus {
            status: 503,
            url: format!("https://{}.invalid/", self.0),
        })
    }
}

fn failing_scanner(seed: u64) -> Scanner {
    let mut scanner = Scanner::offline().with_seed(seed);
    scanner.air_quality = SourceChain::new()
        .with(Unreachable("primary"))
        .with(Unreachable("secondary"));
    scanner
}

#[tokio::test]
async fn air_quality_falls_back_to_synthetic_stations() {
    for seed in 0..10 {
        let scanner = failing_scanner(seed);
        let query = GeoQuery::new((37.5407, -77.4360), 25_000.0);
        let outcome = scanner.air_quality(&query).await;

        assert_eq!(outcome.provenance, Provenance::Fallback);
        assert_eq!(outcome.source, SYNTHETIC_SOURCE);

        let report = outcome.data;
        assert_eq!(report.observations.len(), AIR_QUALITY_POINTS);
        for obs in &report.observations {
            assert!((5.0..=150.0).contains(&obs.value));
        }

        assert!(!report.stations.is_empty());
        assert!(report.stations.len() <= AIR_QUALITY_POINTS);
        let clustered: usize = report.stations.iter().map(|s| s.cluster_size).sum();
        assert_eq!(clustered, AIR_QUALITY_POINTS);
        for station in &report.stations {
            assert!((5.0..=150.0).contains(&station.pm25));
            assert!(AQI_TABLE.get(station.category.key).is_some());
            assert!(station.category.contains(station.aqi as f64));
        }
    }
}

#[tokio::test]
async fn moving_center_refetches_only_outside_cell() {
    let session = Session::new(failing_scanner(42), ChangeGate::default());

    let first = session
        .refresh_air_quality(Some(Coordinate::new(37.5, -77.4)))
        .await;
    assert!(matches!(first, Refresh::Applied(ref o) if !o.is_live()));

    let second = session
        .refresh_air_quality(Some(Coordinate::new(37.5001, -77.4001)))
        .await;
    assert_eq!(second, Refresh::Skipped);

    let third = session
        .refresh_air_quality(Some(Coordinate::new(37.6, -77.5)))
        .await;
    assert!(third.fetched());
    assert_eq!(
        session.air_quality.context().last_center,
        Some(Coordinate::new(37.6, -77.5))
    );
}
