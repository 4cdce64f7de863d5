use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The environmental dimensions ecoscan reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    AirQuality,
    Temperature,
    TrafficPollution,
    GreenSpaces,
    Infrastructure,
}

impl Modality {
    pub const ALL: [Modality; 5] = [
        Modality::AirQuality,
        Modality::Temperature,
        Modality::TrafficPollution,
        Modality::GreenSpaces,
        Modality::Infrastructure,
    ];

    /// Search radius used when the caller does not supply one.
    pub fn default_radius_meters(&self) -> f64 {
        match self {
            Modality::AirQuality => 25_000.0,
            Modality::Temperature => 10_000.0,
            Modality::TrafficPollution => 5_000.0,
            Modality::GreenSpaces => 5_000.0,
            Modality::Infrastructure => 5_000.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::AirQuality => "air_quality",
            Modality::Temperature => "temperature",
            Modality::TrafficPollution => "traffic_pollution",
            Modality::GreenSpaces => "green_spaces",
            Modality::Infrastructure => "infrastructure",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "air_quality" | "air" | "aqi" => Ok(Modality::AirQuality),
            "temperature" | "temp" => Ok(Modality::Temperature),
            "traffic_pollution" | "traffic" => Ok(Modality::TrafficPollution),
            "green_spaces" | "green" => Ok(Modality::GreenSpaces),
            "infrastructure" | "infra" => Ok(Modality::Infrastructure),
            other => Err(format!("unknown modality \"{other}\"")),
        }
    }
}
