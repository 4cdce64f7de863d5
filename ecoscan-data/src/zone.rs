use crate::{
    classification::{Category, Scale},
    cluster::{self, AIR_QUALITY_CLUSTER_THRESHOLD},
    topology::{Topology, TEMPERATURE_TOPOLOGY, TRAFFIC_TOPOLOGY},
};
use chrono::{DateTime, Utc};
use ecoscan_sources::{
    coordinate::Coordinate,
    modality::Modality,
    observation::{Observation, Parameter},
};
use serde::Serialize;

/// An aggregated spatial unit summarizing one or more observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Mean of the member observations' values, or the modified base
    /// reading for fixed-topology zones
    pub value: f64,
    pub parameter: Parameter,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_meters: Option<f64>,
    pub cluster_size: usize,
    pub timestamp: DateTime<Utc>,
    /// Indices of the contributing observations
    #[serde(skip)]
    pub members: Vec<usize>,
}

impl Zone {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// How raw observations become zones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoningStrategy {
    /// Greedy proximity clustering with a degree threshold
    Proximity { threshold_degrees: f64 },
    /// A fixed layout around the center driven by one base value
    FixedTopology(&'static Topology),
}

impl ZoningStrategy {
    /// Strategy used for a modality, or `None` for modalities that are
    /// passed through as typed records.
    pub fn for_modality(modality: Modality) -> Option<ZoningStrategy> {
        match modality {
            Modality::AirQuality => Some(ZoningStrategy::Proximity {
                threshold_degrees: AIR_QUALITY_CLUSTER_THRESHOLD,
            }),
            Modality::Temperature => Some(ZoningStrategy::FixedTopology(&TEMPERATURE_TOPOLOGY)),
            Modality::TrafficPollution => Some(ZoningStrategy::FixedTopology(&TRAFFIC_TOPOLOGY)),
            Modality::GreenSpaces | Modality::Infrastructure => None,
        }
    }

    /// Turn observations into classified zones.
    ///
    /// For a fixed topology the base reading is the mean of all
    /// observations, and every zone lists all of them as members. An empty
    /// input gives no zones under either strategy.
    pub fn zone(
        &self,
        center: Coordinate,
        observations: &[Observation],
        parameter: Parameter,
        scale: Scale,
    ) -> Vec<Zone> {
        if observations.is_empty() {
            return Vec::new();
        }
        let now = Utc::now();
        match self {
            ZoningStrategy::Proximity { threshold_degrees } => {
                cluster::proximity_clusters(observations, *threshold_degrees)
                    .into_iter()
                    .enumerate()
                    .map(|(i, cluster)| Zone {
                        id: format!("zone-{}", i + 1),
                        name: cluster_name(observations, &cluster.members, i),
                        lat: cluster.centroid.lat,
                        lng: cluster.centroid.lng,
                        value: cluster.mean,
                        parameter,
                        category: *scale.classify(cluster.mean),
                        radius_meters: Some(cluster.radius_meters()),
                        cluster_size: cluster.size(),
                        timestamp: now,
                        members: cluster.members,
                    })
                    .collect()
            }
            ZoningStrategy::FixedTopology(topology) => {
                let base = observations.iter().map(|o| o.value).sum::<f64>()
                    / observations.len() as f64;
                let members: Vec<usize> = (0..observations.len()).collect();
                topology
                    .templates
                    .iter()
                    .enumerate()
                    .map(|(i, template)| {
                        let position = template.position(&center);
                        let value = topology.value(template, base);
                        Zone {
                            id: format!("zone-{}", i + 1),
                            name: template.name.to_string(),
                            lat: position.lat,
                            lng: position.lng,
                            value,
                            parameter,
                            category: *scale.classify(value),
                            radius_meters: Some(template.radius_meters),
                            cluster_size: observations.len(),
                            timestamp: now,
                            members: members.clone(),
                        }
                    })
                    .collect()
            }
        }
    }
}

/// Singletons keep their station name; merged clusters are numbered.
fn cluster_name(observations: &[Observation], members: &[usize], index: usize) -> String {
    match members {
        [only] => observations[*only]
            .name
            .clone()
            .unwrap_or_else(|| format!("Station {}", index + 1)),
        _ => format!("Cluster {} ({} stations)", index + 1, members.len()),
    }
}
