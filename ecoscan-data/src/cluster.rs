use ecoscan_sources::{coordinate::Coordinate, observation::Observation};
use log::debug;

/// Default merge distance for air quality stations, in degrees (~1.5 km).
pub const AIR_QUALITY_CLUSTER_THRESHOLD: f64 = 0.015;

/// Smallest rendering radius given to a cluster, in meters.
pub const MIN_CLUSTER_RADIUS_METERS: f64 = 500.0;

/// A group of observations produced by one clustering pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Indices into the input slice, in input order
    pub members: Vec<usize>,
    pub centroid: Coordinate,
    /// Arithmetic mean of the members' values
    pub mean: f64,
    /// Distance in meters from the centroid to the farthest member
    pub extent_meters: f64,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Rendering radius, never smaller than [`MIN_CLUSTER_RADIUS_METERS`].
    pub fn radius_meters(&self) -> f64 {
        self.extent_meters.max(MIN_CLUSTER_RADIUS_METERS)
    }
}

/// Greedy single-pass proximity clustering.
///
/// Observations are visited in input order. Each one not yet assigned seeds
/// a cluster containing every still-unassigned observation within
/// `threshold` degrees of it (planar distance on raw lat/lng). The seed
/// always belongs to its own cluster, so every input ends up in exactly one
/// cluster even for a zero, negative or NaN threshold. Clusters come out in
/// the order their seeds appear.
pub fn proximity_clusters(observations: &[Observation], threshold: f64) -> Vec<Cluster> {
    let mut processed = vec![false; observations.len()];
    let mut clusters = Vec::new();

    for (i, seed) in observations.iter().enumerate() {
        if processed[i] {
            continue;
        }
        processed[i] = true;
        let seed_position = seed.coordinate();
        let mut members = vec![i];
        for (j, other) in observations.iter().enumerate().skip(i + 1) {
            if !processed[j] && seed_position.degree_distance(&other.coordinate()) <= threshold {
                processed[j] = true;
                members.push(j);
            }
        }
        clusters.push(summarize(observations, members));
    }

    debug!(
        "Clustered {} observations into {} clusters (threshold {}°)",
        observations.len(),
        clusters.len(),
        threshold
    );
    clusters
}

fn summarize(observations: &[Observation], members: Vec<usize>) -> Cluster {
    let n = members.len() as f64;
    let (lat_sum, lng_sum, value_sum) =
        members
            .iter()
            .fold((0.0, 0.0, 0.0), |(lat, lng, value), &j| {
                let obs = &observations[j];
                (lat + obs.lat, lng + obs.lng, value + obs.value)
            });
    let centroid = Coordinate::new(lat_sum / n, lng_sum / n);
    let extent_meters = members
        .iter()
        .map(|&j| centroid.meters_to(&observations[j].coordinate()))
        .fold(0.0, f64::max);
    Cluster {
        members,
        centroid,
        mean: value_sum / n,
        extent_meters,
    }
}
