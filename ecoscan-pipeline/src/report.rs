use chrono::{DateTime, Utc};
use ecoscan_data::{
    classification::{pm25_to_aqi_index, truncate_concentration, Category},
    zone::Zone,
};
use ecoscan_sources::{
    observation::Observation,
    records::{
        GreenSpace, GreenSpaceKind, InfrastructureKind, InfrastructureSite, PollutantReading,
        TemperatureReading,
    },
    source::FetchOutcome,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// An air quality zone as presented to a map: PM2.5 plus its AQI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirQualityStation {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub aqi: u32,
    pub pm25: f64,
    pub category: Category,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub cluster_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_meters: Option<f64>,
}

impl From<Zone> for AirQualityStation {
    fn from(zone: Zone) -> Self {
        AirQualityStation {
            aqi: pm25_to_aqi_index(zone.value),
            pm25: truncate_concentration(zone.value),
            id: zone.id,
            lat: zone.lat,
            lng: zone.lng,
            category: zone.category,
            name: zone.name,
            timestamp: zone.timestamp,
            cluster_size: zone.cluster_size,
            radius_meters: zone.radius_meters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityReport {
    pub observations: Vec<Observation>,
    pub stations: Vec<AirQualityStation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureReport {
    pub base: TemperatureReading,
    pub zones: Vec<Zone>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficReport {
    pub base: PollutantReading,
    /// Composite score of the base reading before road pattern factors
    pub score: f64,
    pub zones: Vec<Zone>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GreenSpaceReport {
    pub spaces: Vec<GreenSpace>,
    pub tally: BTreeMap<GreenSpaceKind, usize>,
}

impl GreenSpaceReport {
    pub fn new(spaces: Vec<GreenSpace>) -> Self {
        let tally = tally(spaces.iter().map(|s| s.kind));
        GreenSpaceReport { spaces, tally }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfrastructureReport {
    pub sites: Vec<InfrastructureSite>,
    pub tally: BTreeMap<InfrastructureKind, usize>,
}

impl InfrastructureReport {
    pub fn new(sites: Vec<InfrastructureSite>) -> Self {
        let tally = tally(sites.iter().map(|s| s.kind));
        InfrastructureReport { sites, tally }
    }
}

fn tally<K: Ord>(kinds: impl Iterator<Item = K>) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for kind in kinds {
        *counts.entry(kind).or_insert(0) += 1;
    }
    counts
}

/// Every modality for one center, each with its own provenance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub air_quality: FetchOutcome<AirQualityReport>,
    pub temperature: FetchOutcome<TemperatureReport>,
    pub traffic: FetchOutcome<TrafficReport>,
    pub green_spaces: FetchOutcome<GreenSpaceReport>,
    pub infrastructure: FetchOutcome<InfrastructureReport>,
}

impl ScanReport {
    /// Names of the modalities that fell back to synthetic data.
    pub fn degraded(&self) -> Vec<&'static str> {
        let flags = [
            ("air_quality", self.air_quality.is_live()),
            ("temperature", self.temperature.is_live()),
            ("traffic_pollution", self.traffic.is_live()),
            ("green_spaces", self.green_spaces.is_live()),
            ("infrastructure", self.infrastructure.is_live()),
        ];
        flags
            .into_iter()
            .filter(|(_, live)| !live)
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(kind: GreenSpaceKind) -> GreenSpace {
        GreenSpace {
            id: "way/1".to_string(),
            name: kind.label().to_string(),
            kind,
            lat: 37.5,
            lng: -77.4,
        }
    }

    #[test]
    fn test_green_space_tally() {
        let report = GreenSpaceReport::new(vec![
            space(GreenSpaceKind::Park),
            space(GreenSpaceKind::Forest),
            space(GreenSpaceKind::Park),
        ]);
        assert_eq!(report.tally[&GreenSpaceKind::Park], 2);
        assert_eq!(report.tally[&GreenSpaceKind::Forest], 1);
        assert!(!report.tally.contains_key(&GreenSpaceKind::Garden));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["tally"]["park"], 2);
    }
}
