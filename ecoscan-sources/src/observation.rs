use crate::coordinate::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The physical quantity an observation carries, and so its unit.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Parameter {
    /// Fine particulate matter in μg/m³
    #[serde(rename = "pm25")]
    Pm25,
    /// Air temperature in °F
    #[serde(rename = "temperature_f")]
    TemperatureF,
    /// Composite traffic pollution score in percent (0-100)
    #[serde(rename = "traffic_score")]
    TrafficScore,
}

impl Parameter {
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Pm25 => "μg/m³",
            Parameter::TemperatureF => "°F",
            Parameter::TrafficScore => "%",
        }
    }
}

/// A single raw point reading, already normalized to its parameter's unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
    pub parameter: Parameter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// AQI category label, set on classified PM2.5 readings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi: Option<String>,
}

impl Observation {
    /// A PM2.5 reading in μg/m³.
    pub fn pm25(lat: f64, lng: f64, value: f64, name: impl Into<String>) -> Self {
        Observation {
            lat,
            lng,
            value,
            parameter: Parameter::Pm25,
            name: Some(name.into()),
            timestamp: None,
            aqi: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    /// Attach the label of the band this reading classifies into.
    pub fn with_aqi_label(mut self, label: impl Into<String>) -> Self {
        self.aqi = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pm25_constructor() {
        let obs = Observation::pm25(37.54, -77.43, 12.5, "Downtown");
        assert_eq!(obs.parameter, Parameter::Pm25);
        assert_eq!(obs.name.as_deref(), Some("Downtown"));
        assert_eq!(obs.coordinate(), Coordinate::new(37.54, -77.43));
    }

    #[test]
    fn test_serializes_parameter_tag() {
        let obs = Observation::pm25(37.54, -77.43, 12.5, "Downtown");
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["parameter"], "pm25");
        assert!(json.get("timestamp").is_none());
        assert!(json.get("aqi").is_none());
    }

    #[test]
    fn test_serializes_aqi_label() {
        let obs = Observation::pm25(37.54, -77.43, 12.5, "Downtown").with_aqi_label("Moderate");
        let json = serde_json::to_value(&obs).unwrap();
        assert_eq!(json["aqi"], "Moderate");
        assert_eq!(json["name"], "Downtown");
        assert_eq!(json["value"], 12.5);
    }
}
