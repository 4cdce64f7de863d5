//! Typed records for modalities that are richer than a single value per point.

use crate::coordinate::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One current air temperature reading for a query center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReading {
    pub temperature_f: f64,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Current concentrations of the pollutants used for the traffic score.
/// All values in μg/m³.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantReading {
    pub no2: f64,
    pub co: f64,
    pub pm25: f64,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreenSpaceKind {
    Park,
    Garden,
    NatureReserve,
    Playground,
    Forest,
}

impl GreenSpaceKind {
    pub const ALL: [GreenSpaceKind; 5] = [
        GreenSpaceKind::Park,
        GreenSpaceKind::Garden,
        GreenSpaceKind::NatureReserve,
        GreenSpaceKind::Playground,
        GreenSpaceKind::Forest,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            GreenSpaceKind::Park => "Park",
            GreenSpaceKind::Garden => "Garden",
            GreenSpaceKind::NatureReserve => "Nature Reserve",
            GreenSpaceKind::Playground => "Playground",
            GreenSpaceKind::Forest => "Forest",
        }
    }
}

impl fmt::Display for GreenSpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A park, garden or other green area near the query center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreenSpace {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GreenSpaceKind,
    pub lat: f64,
    pub lng: f64,
}

impl GreenSpace {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfrastructureKind {
    EvCharging,
    BikeShare,
    TransitStop,
    Recycling,
    DrinkingWater,
}

impl InfrastructureKind {
    pub const ALL: [InfrastructureKind; 5] = [
        InfrastructureKind::EvCharging,
        InfrastructureKind::BikeShare,
        InfrastructureKind::TransitStop,
        InfrastructureKind::Recycling,
        InfrastructureKind::DrinkingWater,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InfrastructureKind::EvCharging => "EV Charging Station",
            InfrastructureKind::BikeShare => "Bike Share",
            InfrastructureKind::TransitStop => "Transit Stop",
            InfrastructureKind::Recycling => "Recycling Center",
            InfrastructureKind::DrinkingWater => "Drinking Water",
        }
    }
}

impl fmt::Display for InfrastructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A piece of sustainability infrastructure near the query center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureSite {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InfrastructureKind,
    pub lat: f64,
    pub lng: f64,
}

impl InfrastructureSite {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_discriminator() {
        let site = InfrastructureSite {
            id: "node/1".to_string(),
            name: "Main St Charger".to_string(),
            kind: InfrastructureKind::EvCharging,
            lat: 37.54,
            lng: -77.43,
        };
        let json = serde_json::to_value(&site).unwrap();
        assert_eq!(json["type"], "ev_charging");

        let park: GreenSpace = serde_json::from_str(
            r#"{"id":"way/7","name":"Byrd Park","type":"park","lat":37.53,"lng":-77.48}"#,
        )
        .unwrap();
        assert_eq!(park.kind, GreenSpaceKind::Park);
    }
}
