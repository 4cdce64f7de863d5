//! Offline classification of a single value.

use clap::ValueEnum;
use ecoscan_data::classification::{
    pm25_to_aqi_index, Category, AQI_TABLE, TEMPERATURE_TABLE, TRAFFIC_TABLE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassifyScale {
    /// An AQI value (0-500)
    Aqi,
    /// A PM2.5 concentration in μg/m³, converted to AQI first
    Pm25,
    /// Air temperature in °F
    Temperature,
    /// Traffic pollution score in percent
    Traffic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub value: f64,
    pub unit: &'static str,
    /// Set when the input was a PM2.5 concentration
    pub aqi: Option<u32>,
    pub category: &'static Category,
}

pub fn classify(scale: ClassifyScale, value: f64) -> Classification {
    match scale {
        ClassifyScale::Pm25 => {
            let aqi = pm25_to_aqi_index(value);
            Classification {
                value,
                unit: "μg/m³",
                aqi: Some(aqi),
                category: AQI_TABLE.classify(aqi as f64),
            }
        }
        ClassifyScale::Aqi => Classification {
            value,
            unit: AQI_TABLE.unit,
            aqi: None,
            category: AQI_TABLE.classify(value),
        },
        ClassifyScale::Temperature => Classification {
            value,
            unit: TEMPERATURE_TABLE.unit,
            aqi: None,
            category: TEMPERATURE_TABLE.classify(value),
        },
        ClassifyScale::Traffic => Classification {
            value,
            unit: TRAFFIC_TABLE.unit,
            aqi: None,
            category: TRAFFIC_TABLE.classify(value),
        },
    }
}

pub fn run_classify(scale: ClassifyScale, value: f64) -> anyhow::Result<()> {
    let result = classify(scale, value);
    let c = result.category;
    match result.aqi {
        Some(aqi) => println!("{} {} -> AQI {}", value, result.unit, aqi),
        None => println!("{} {}", value, result.unit),
    }
    println!("{} {} ({}, {}..={})", c.icon, c.label, c.color, c.min, c.max);
    println!("{}", c.advice);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pm25_goes_through_aqi() {
        let result = classify(ClassifyScale::Pm25, 35.5);
        assert_eq!(result.aqi, Some(101));
        assert_eq!(result.category.key, "unhealthy_sensitive");

        // beyond the EPA table the index clamps to 500
        let result = classify(ClassifyScale::Pm25, 600.0);
        assert_eq!(result.aqi, Some(500));
        assert_eq!(result.category.key, "hazardous");
    }

    #[test]
    fn test_direct_tables() {
        assert_eq!(classify(ClassifyScale::Aqi, 75.0).category.key, "moderate");
        assert_eq!(classify(ClassifyScale::Temperature, 20.0).category.key, "freezing");
        assert_eq!(classify(ClassifyScale::Traffic, 85.0).category.key, "very_high");
        assert_eq!(classify(ClassifyScale::Traffic, -3.0).category.key, "low");
    }
}
