use crate::report::{
    AirQualityReport, AirQualityStation, GreenSpaceReport, InfrastructureReport, ScanReport,
    TemperatureReport, TrafficReport,
};
use ecoscan_data::{
    classification::{classify_pm25, traffic_score, Scale},
    cluster::AIR_QUALITY_CLUSTER_THRESHOLD,
    topology::{TEMPERATURE_TOPOLOGY, TRAFFIC_TOPOLOGY},
    zone::ZoningStrategy,
};
use ecoscan_sources::{
    air_quality::{OpenAqSource, WaqiBoundsSource, OPENAQ_BASE_URL, WAQI_BASE_URL},
    coordinate::{Coordinate, GeoQuery},
    error::Result,
    http::{HttpClient, HttpSettings},
    modality::Modality,
    observation::{Observation, Parameter},
    overpass::{
        OverpassGreenSpaceSource, OverpassInfrastructureSource, OVERPASS_MIRROR_URL,
        OVERPASS_PRIMARY_URL,
    },
    records::{GreenSpace, InfrastructureSite, PollutantReading, TemperatureReading},
    source::{FetchOutcome, SourceChain},
    synthetic,
    traffic::{OpenMeteoAirQualitySource, WaqiFeedSource, OPEN_METEO_AIR_QUALITY_BASE_URL},
    weather::{
        OpenMeteoTemperatureSource, WttrTemperatureSource, OPEN_METEO_BASE_URL, WTTR_BASE_URL,
    },
};
use log::{info, warn};
use parking_lot::Mutex;
use rand::{rngs::StdRng, SeedableRng};

/// Base URLs of every upstream API.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub openaq: String,
    pub waqi: String,
    pub open_meteo: String,
    pub open_meteo_air_quality: String,
    pub wttr: String,
    pub overpass_primary: String,
    pub overpass_mirror: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            openaq: OPENAQ_BASE_URL.to_string(),
            waqi: WAQI_BASE_URL.to_string(),
            open_meteo: OPEN_METEO_BASE_URL.to_string(),
            open_meteo_air_quality: OPEN_METEO_AIR_QUALITY_BASE_URL.to_string(),
            wttr: WTTR_BASE_URL.to_string(),
            overpass_primary: OVERPASS_PRIMARY_URL.to_string(),
            overpass_mirror: OVERPASS_MIRROR_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiKeys {
    pub openaq: Option<String>,
    pub waqi: Option<String>,
}

/// One source chain per modality plus the random source for fallbacks.
pub struct Scanner {
    pub air_quality: SourceChain<Vec<Observation>>,
    pub temperature: SourceChain<TemperatureReading>,
    pub traffic: SourceChain<PollutantReading>,
    pub green_spaces: SourceChain<Vec<GreenSpace>>,
    pub infrastructure: SourceChain<Vec<InfrastructureSite>>,
    rng: Mutex<StdRng>,
    cluster_threshold: f64,
}

impl Default for Scanner {
    fn default() -> Self {
        Scanner::offline()
    }
}

impl Scanner {
    /// A scanner with no upstream sources; every fetch is synthetic.
    pub fn offline() -> Self {
        Scanner {
            air_quality: SourceChain::new(),
            temperature: SourceChain::new(),
            traffic: SourceChain::new(),
            green_spaces: SourceChain::new(),
            infrastructure: SourceChain::new(),
            rng: Mutex::new(StdRng::from_entropy()),
            cluster_threshold: AIR_QUALITY_CLUSTER_THRESHOLD,
        }
    }

    /// A scanner backed by every HTTP source, in priority order.
    pub fn from_http(settings: HttpSettings, endpoints: &Endpoints, keys: &ApiKeys) -> Result<Self> {
        let client = HttpClient::new(settings)?;
        let scanner = Scanner {
            air_quality: SourceChain::new()
                .with(OpenAqSource::new(
                    client.clone(),
                    &endpoints.openaq,
                    keys.openaq.clone(),
                ))
                .with(WaqiBoundsSource::new(
                    client.clone(),
                    &endpoints.waqi,
                    keys.waqi.clone(),
                )),
            temperature: SourceChain::new()
                .with(OpenMeteoTemperatureSource::new(
                    client.clone(),
                    &endpoints.open_meteo,
                ))
                .with(WttrTemperatureSource::new(client.clone(), &endpoints.wttr)),
            traffic: SourceChain::new()
                .with(OpenMeteoAirQualitySource::new(
                    client.clone(),
                    &endpoints.open_meteo_air_quality,
                ))
                .with(WaqiFeedSource::new(
                    client.clone(),
                    &endpoints.waqi,
                    keys.waqi.clone(),
                )),
            green_spaces: SourceChain::new()
                .with(OverpassGreenSpaceSource::new(
                    client.clone(),
                    &endpoints.overpass_primary,
                    "overpass",
                ))
                .with(OverpassGreenSpaceSource::new(
                    client.clone(),
                    &endpoints.overpass_mirror,
                    "overpass-mirror",
                )),
            infrastructure: SourceChain::new()
                .with(OverpassInfrastructureSource::new(
                    client.clone(),
                    &endpoints.overpass_primary,
                    "overpass",
                ))
                .with(OverpassInfrastructureSource::new(
                    client,
                    &endpoints.overpass_mirror,
                    "overpass-mirror",
                )),
            ..Scanner::offline()
        };
        info!(
            "Scanner ready: air quality {:?}, temperature {:?}, traffic {:?}",
            scanner.air_quality.names(),
            scanner.temperature.names(),
            scanner.traffic.names()
        );
        Ok(scanner)
    }

    /// Seed the fallback generators, making synthetic output reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Station merge distance in degrees. A negative or non-finite value is
    /// ignored and the current threshold kept.
    pub fn with_cluster_threshold(mut self, threshold_degrees: f64) -> Self {
        if threshold_degrees.is_finite() && threshold_degrees >= 0.0 {
            self.cluster_threshold = threshold_degrees;
        } else {
            warn!(
                "Ignoring cluster threshold {}, keeping {}",
                threshold_degrees, self.cluster_threshold
            );
        }
        self
    }

    pub fn cluster_threshold(&self) -> f64 {
        self.cluster_threshold
    }

    pub async fn air_quality(&self, query: &GeoQuery) -> FetchOutcome<AirQualityReport> {
        let outcome = self
            .air_quality
            .fetch_or_else(query, || synthetic::air_quality(query, &mut *self.rng.lock()))
            .await;
        let strategy = ZoningStrategy::Proximity {
            threshold_degrees: self.cluster_threshold,
        };
        outcome.map(|observations| {
            let observations: Vec<Observation> = observations
                .into_iter()
                .map(|o| {
                    let label = classify_pm25(o.value).label;
                    o.with_aqi_label(label)
                })
                .collect();
            let stations = strategy
                .zone(query.center, &observations, Parameter::Pm25, Scale::AirQuality)
                .into_iter()
                .map(AirQualityStation::from)
                .collect();
            AirQualityReport {
                observations,
                stations,
            }
        })
    }

    pub async fn temperature(&self, query: &GeoQuery) -> FetchOutcome<TemperatureReport> {
        let outcome = self
            .temperature
            .fetch_or_else(query, || synthetic::temperature(query, &mut *self.rng.lock()))
            .await;
        outcome.map(|base| {
            let reading = center_reading(query.center, base.temperature_f, Parameter::TemperatureF);
            let zones = ZoningStrategy::FixedTopology(&TEMPERATURE_TOPOLOGY).zone(
                query.center,
                &[reading],
                Parameter::TemperatureF,
                Scale::Temperature,
            );
            TemperatureReport { base, zones }
        })
    }

    pub async fn traffic(&self, query: &GeoQuery) -> FetchOutcome<TrafficReport> {
        let outcome = self
            .traffic
            .fetch_or_else(query, || synthetic::pollutants(query, &mut *self.rng.lock()))
            .await;
        outcome.map(|base| {
            let score = traffic_score(base.no2, base.co, base.pm25);
            let reading = center_reading(query.center, score, Parameter::TrafficScore);
            let zones = ZoningStrategy::FixedTopology(&TRAFFIC_TOPOLOGY).zone(
                query.center,
                &[reading],
                Parameter::TrafficScore,
                Scale::TrafficPollution,
            );
            TrafficReport { base, score, zones }
        })
    }

    pub async fn green_spaces(&self, query: &GeoQuery) -> FetchOutcome<GreenSpaceReport> {
        self.green_spaces
            .fetch_or_else(query, || synthetic::green_spaces(query, &mut *self.rng.lock()))
            .await
            .map(GreenSpaceReport::new)
    }

    pub async fn infrastructure(&self, query: &GeoQuery) -> FetchOutcome<InfrastructureReport> {
        self.infrastructure
            .fetch_or_else(query, || synthetic::infrastructure(query, &mut *self.rng.lock()))
            .await
            .map(InfrastructureReport::new)
    }

    /// All five modalities at once, each with its default radius.
    pub async fn scan(&self, center: Coordinate) -> ScanReport {
        let query = |modality: Modality| GeoQuery::new(center, modality.default_radius_meters());
        let (air_quality_query, temperature_query, traffic_query, green_query, infra_query) = (
            query(Modality::AirQuality),
            query(Modality::Temperature),
            query(Modality::TrafficPollution),
            query(Modality::GreenSpaces),
            query(Modality::Infrastructure),
        );
        let (air_quality, temperature, traffic, green_spaces, infrastructure) = tokio::join!(
            self.air_quality(&air_quality_query),
            self.temperature(&temperature_query),
            self.traffic(&traffic_query),
            self.green_spaces(&green_query),
            self.infrastructure(&infra_query),
        );
        ScanReport {
            air_quality,
            temperature,
            traffic,
            green_spaces,
            infrastructure,
        }
    }
}

/// A single reading at the center, the base of a fixed-topology layout.
fn center_reading(center: Coordinate, value: f64, parameter: Parameter) -> Observation {
    Observation {
        lat: center.lat,
        lng: center.lng,
        value,
        parameter,
        name: None,
        timestamp: None,
        aqi: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ecoscan_sources::{
        error::SourceError,
        source::{Provenance, Source},
    };

    struct Fails;

    #[async_trait]
    impl<T: Send + 'static> Source<T> for Fails {
        fn name(&self) -> &'static str {
            "fails"
        }

        async fn fetch(&self, _query: &GeoQuery) -> Result<T> {
            Err(SourceError::Api("unavailable".to_string()))
        }
    }

    struct Fixed(PollutantReading);

    #[async_trait]
    impl Source<PollutantReading> for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, _query: &GeoQuery) -> Result<PollutantReading> {
            Ok(self.0)
        }
    }

    struct FixedStations(Vec<Observation>);

    #[async_trait]
    impl Source<Vec<Observation>> for FixedStations {
        fn name(&self) -> &'static str {
            "fixed-stations"
        }

        async fn fetch(&self, _query: &GeoQuery) -> Result<Vec<Observation>> {
            Ok(self.0.clone())
        }
    }

    fn query() -> GeoQuery {
        GeoQuery::new((37.5407, -77.4360), 25_000.0)
    }

    #[tokio::test]
    async fn test_air_quality_fallback() {
        let mut scanner = Scanner::offline().with_seed(11);
        scanner.air_quality = SourceChain::new().with(Fails).with(Fails);
        let outcome = scanner.air_quality(&query()).await;

        assert_eq!(outcome.provenance, Provenance::Fallback);
        assert_eq!(outcome.data.observations.len(), synthetic::AIR_QUALITY_POINTS);
        let stations = &outcome.data.stations;
        assert!(!stations.is_empty() && stations.len() <= synthetic::AIR_QUALITY_POINTS);
        assert_eq!(
            stations.iter().map(|s| s.cluster_size).sum::<usize>(),
            synthetic::AIR_QUALITY_POINTS
        );
        for station in stations {
            assert!((5.0..=150.0).contains(&station.pm25));
            assert!(station.aqi <= 500);
        }
    }

    #[test]
    fn test_invalid_cluster_threshold_is_ignored() {
        let scanner = Scanner::offline().with_cluster_threshold(0.02);
        assert_eq!(scanner.cluster_threshold(), 0.02);
        let scanner = scanner
            .with_cluster_threshold(-0.01)
            .with_cluster_threshold(f64::NAN)
            .with_cluster_threshold(f64::INFINITY);
        assert_eq!(scanner.cluster_threshold(), 0.02);
    }

    #[tokio::test]
    async fn test_observations_carry_aqi_label() {
        let mut scanner = Scanner::offline();
        scanner.air_quality = SourceChain::new().with(FixedStations(vec![
            Observation::pm25(37.50, -77.40, 12.0, "A"),
            Observation::pm25(37.60, -77.40, 12.1, "B"),
        ]));
        let outcome = scanner.air_quality(&query()).await;
        let labels: Vec<_> = outcome
            .data
            .observations
            .iter()
            .map(|o| o.aqi.as_deref())
            .collect();
        assert_eq!(labels, vec![Some("Good"), Some("Moderate")]);

        let json = serde_json::to_value(&outcome.data).unwrap();
        assert_eq!(json["observations"][1]["aqi"], "Moderate");
        assert_eq!(json["observations"][1]["parameter"], "pm25");
    }

    #[tokio::test]
    async fn test_station_pm25_agrees_with_band() {
        let mut scanner = Scanner::offline();
        scanner.air_quality = SourceChain::new().with(FixedStations(vec![
            Observation::pm25(37.50, -77.40, 12.06, "A"),
            Observation::pm25(37.60, -77.40, 12.1, "B"),
        ]));
        let outcome = scanner.air_quality(&query()).await;
        let stations = &outcome.data.stations;
        assert_eq!(stations.len(), 2);

        assert_eq!(stations[0].pm25, 12.0);
        assert_eq!(stations[0].aqi, 50);
        assert_eq!(stations[0].category.label, "Good");

        assert_eq!(stations[1].pm25, 12.1);
        assert_eq!(stations[1].aqi, 51);
        assert_eq!(stations[1].category.label, "Moderate");

        for station in stations {
            assert_eq!(classify_pm25(station.pm25), &station.category);
        }
    }

    #[tokio::test]
    async fn test_seeded_fallback_is_reproducible() {
        let a = Scanner::offline().with_seed(3).air_quality(&query()).await;
        let b = Scanner::offline().with_seed(3).air_quality(&query()).await;
        assert_eq!(a.data.observations.len(), b.data.observations.len());
        for (x, y) in a.data.observations.iter().zip(&b.data.observations) {
            assert_eq!((x.lat, x.lng, x.value), (y.lat, y.lng, y.value));
        }
    }

    #[tokio::test]
    async fn test_traffic_live_reading() {
        let mut scanner = Scanner::offline();
        scanner.traffic = SourceChain::new().with(Fails).with(Fixed(PollutantReading {
            no2: 40.0,
            co: 400.0,
            pm25: 10.0,
            observed_at: None,
        }));
        let outcome = scanner.traffic(&GeoQuery::new((37.5, -77.4), 5_000.0)).await;
        assert!(outcome.is_live());
        assert_eq!(outcome.source, "fixed");
        assert_eq!(outcome.data.score, 17.0);
        assert_eq!(outcome.data.zones.len(), 5);
        let highway = &outcome.data.zones[0];
        assert_eq!(highway.name, "Main Highway");
        assert!((highway.value - 25.5).abs() < 1e-9);
        assert_eq!(highway.category.key, "moderate");
    }

    #[tokio::test]
    async fn test_traffic_fallback_stays_in_range() {
        let scanner = Scanner::offline().with_seed(5);
        let outcome = scanner.traffic(&GeoQuery::new((37.5, -77.4), 5_000.0)).await;
        assert!(!outcome.is_live());
        assert_eq!(outcome.data.zones.len(), 5);
        for zone in &outcome.data.zones {
            assert!((0.0..=100.0).contains(&zone.value));
        }
    }

    #[tokio::test]
    async fn test_scan_reports_every_modality() {
        let scanner = Scanner::offline().with_seed(1);
        let report = scanner.scan(Coordinate::new(37.5407, -77.4360)).await;
        assert_eq!(report.degraded().len(), 5);
        assert_eq!(report.temperature.data.zones.len(), 5);
        assert_eq!(
            report.green_spaces.data.spaces.len(),
            synthetic::GREEN_SPACE_POINTS
        );
        assert_eq!(
            report.infrastructure.data.tally.values().sum::<usize>(),
            synthetic::INFRASTRUCTURE_POINTS
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["airQuality"]["provenance"], "fallback");
        assert_eq!(json["greenSpaces"]["source"], "synthetic");
    }
}
