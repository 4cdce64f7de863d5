//! Breakpoint tables and the lookups over them.
//!
//! A [`BreakpointTable`] is an ordered list of [`Category`] bands covering
//! the valid domain of one physical quantity. Lookups are total: anything
//! outside the domain (or NaN) gets the table's first band.

use serde::Serialize;

/// One band of a classification scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Category {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub min: f64,
    pub max: f64,
    pub advice: &'static str,
}

impl Category {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// An ordered, contiguous set of categories for one quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakpointTable {
    pub name: &'static str,
    pub unit: &'static str,
    pub categories: &'static [Category],
}

impl BreakpointTable {
    /// Band returned for values outside the table's domain.
    pub fn default_category(&self) -> &'static Category {
        &self.categories[0]
    }

    /// Lower and upper edges of the whole table.
    pub fn domain(&self) -> (f64, f64) {
        (
            self.categories[0].min,
            self.categories[self.categories.len() - 1].max,
        )
    }

    /// Find the band for `value`.
    ///
    /// Bands are listed with inclusive integer edges (0-50, 51-100, ...). A
    /// value between two listed edges, such as 50.5, belongs to the upper
    /// band, so the table has no gaps over its domain.
    pub fn classify(&self, value: f64) -> &'static Category {
        let (low, high) = self.domain();
        if value.is_nan() || value < low || value > high {
            return self.default_category();
        }
        self.categories
            .iter()
            .find(|c| value <= c.max)
            .unwrap_or_else(|| self.default_category())
    }

    pub fn get(&self, key: &str) -> Option<&'static Category> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Check that bands are ordered, non-overlapping and at most one unit
    /// apart.
    pub fn validate(&self) -> Result<(), String> {
        if self.categories.is_empty() {
            return Err(format!("{}: empty table", self.name));
        }
        for c in self.categories {
            if c.min > c.max {
                return Err(format!("{}: {} has min > max", self.name, c.key));
            }
        }
        for pair in self.categories.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.min <= lower.max {
                return Err(format!("{}: {} overlaps {}", self.name, lower.key, upper.key));
            }
            if upper.min - lower.max > 1.0 {
                return Err(format!("{}: gap between {} and {}", self.name, lower.key, upper.key));
            }
        }
        Ok(())
    }
}

pub static AQI_CATEGORIES: [Category; 6] = [
    Category {
        key: "good",
        label: "Good",
        color: "#00e400",
        icon: "🟢",
        min: 0.0,
        max: 50.0,
        advice: "Air quality is satisfactory. Enjoy outdoor activities.",
    },
    Category {
        key: "moderate",
        label: "Moderate",
        color: "#ffff00",
        icon: "🟡",
        min: 51.0,
        max: 100.0,
        advice: "Acceptable air quality. Unusually sensitive people should limit prolonged exertion.",
    },
    Category {
        key: "unhealthy_sensitive",
        label: "Unhealthy for Sensitive Groups",
        color: "#ff7e00",
        icon: "🟠",
        min: 101.0,
        max: 150.0,
        advice: "Children, older adults and people with lung disease should reduce outdoor exertion.",
    },
    Category {
        key: "unhealthy",
        label: "Unhealthy",
        color: "#ff0000",
        icon: "🔴",
        min: 151.0,
        max: 200.0,
        advice: "Everyone should reduce prolonged or heavy outdoor exertion.",
    },
    Category {
        key: "very_unhealthy",
        label: "Very Unhealthy",
        color: "#8f3f97",
        icon: "🟣",
        min: 201.0,
        max: 300.0,
        advice: "Health alert. Avoid outdoor activity and keep windows closed.",
    },
    Category {
        key: "hazardous",
        label: "Hazardous",
        color: "#7e0023",
        icon: "🟤",
        min: 301.0,
        max: 500.0,
        advice: "Emergency conditions. Stay indoors and use air filtration.",
    },
];

/// US EPA Air Quality Index bands.
pub static AQI_TABLE: BreakpointTable = BreakpointTable {
    name: "aqi",
    unit: "AQI",
    categories: &AQI_CATEGORIES,
};

pub static TEMPERATURE_CATEGORIES: [Category; 7] = [
    Category {
        key: "freezing",
        label: "Freezing",
        color: "#1e3a8a",
        icon: "🥶",
        min: -100.0,
        max: 32.0,
        advice: "Freezing conditions. Watch for ice and limit skin exposure.",
    },
    Category {
        key: "cold",
        label: "Cold",
        color: "#3b82f6",
        icon: "❄️",
        min: 33.0,
        max: 50.0,
        advice: "Cold. Wear a warm coat.",
    },
    Category {
        key: "cool",
        label: "Cool",
        color: "#06b6d4",
        icon: "🌬️",
        min: 51.0,
        max: 60.0,
        advice: "Cool. A light jacket is enough.",
    },
    Category {
        key: "mild",
        label: "Mild",
        color: "#22c55e",
        icon: "🌤️",
        min: 61.0,
        max: 70.0,
        advice: "Comfortable conditions for any outdoor activity.",
    },
    Category {
        key: "warm",
        label: "Warm",
        color: "#eab308",
        icon: "☀️",
        min: 71.0,
        max: 80.0,
        advice: "Warm. Stay hydrated.",
    },
    Category {
        key: "hot",
        label: "Hot",
        color: "#f97316",
        icon: "🔥",
        min: 81.0,
        max: 95.0,
        advice: "Hot. Seek shade and avoid strenuous midday activity.",
    },
    Category {
        key: "very_hot",
        label: "Very Hot",
        color: "#dc2626",
        icon: "🌡️",
        min: 96.0,
        max: 150.0,
        advice: "Extreme heat. Stay indoors where possible and check on vulnerable neighbors.",
    },
];

/// Air temperature bands in °F.
pub static TEMPERATURE_TABLE: BreakpointTable = BreakpointTable {
    name: "temperature",
    unit: "°F",
    categories: &TEMPERATURE_CATEGORIES,
};

pub static TRAFFIC_CATEGORIES: [Category; 4] = [
    Category {
        key: "low",
        label: "Low",
        color: "#22c55e",
        icon: "🚲",
        min: 0.0,
        max: 20.0,
        advice: "Little traffic pollution. Good for walking and cycling.",
    },
    Category {
        key: "moderate",
        label: "Moderate",
        color: "#eab308",
        icon: "🚗",
        min: 21.0,
        max: 40.0,
        advice: "Some traffic pollution. Prefer side streets for exercise.",
    },
    Category {
        key: "high",
        label: "High",
        color: "#f97316",
        icon: "🚙",
        min: 41.0,
        max: 70.0,
        advice: "Heavy traffic pollution. Avoid busy roads when walking or running.",
    },
    Category {
        key: "very_high",
        label: "Very High",
        color: "#dc2626",
        icon: "🚛",
        min: 71.0,
        max: 100.0,
        advice: "Severe traffic pollution. Keep windows closed and avoid roadside exercise.",
    },
];

/// Traffic pollution composite score bands in percent.
pub static TRAFFIC_TABLE: BreakpointTable = BreakpointTable {
    name: "traffic",
    unit: "%",
    categories: &TRAFFIC_CATEGORIES,
};

/// One segment of the EPA PM2.5 → AQI conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub pm_low: f64,
    pub pm_high: f64,
    pub aqi_low: f64,
    pub aqi_high: f64,
}

pub static PM25_BREAKPOINTS: [Breakpoint; 6] = [
    Breakpoint { pm_low: 0.0, pm_high: 12.0, aqi_low: 0.0, aqi_high: 50.0 },
    Breakpoint { pm_low: 12.1, pm_high: 35.4, aqi_low: 51.0, aqi_high: 100.0 },
    Breakpoint { pm_low: 35.5, pm_high: 55.4, aqi_low: 101.0, aqi_high: 150.0 },
    Breakpoint { pm_low: 55.5, pm_high: 150.4, aqi_low: 151.0, aqi_high: 200.0 },
    Breakpoint { pm_low: 150.5, pm_high: 250.4, aqi_low: 201.0, aqi_high: 300.0 },
    Breakpoint { pm_low: 250.5, pm_high: 500.4, aqi_low: 301.0, aqi_high: 500.0 },
];

/// Largest AQI the scale defines.
pub const MAX_AQI: f64 = 500.0;

/// EPA truncates PM2.5 to one decimal before looking up a segment. Shown
/// concentrations use the same truncation so they agree with their AQI.
pub fn truncate_concentration(pm25: f64) -> f64 {
    ((pm25 * 10.0) + 1e-9).floor() / 10.0
}

/// Convert a PM2.5 concentration (μg/m³) to a continuous AQI value.
///
/// `aqi = (aqi_high - aqi_low) / (pm_high - pm_low) × (pm - pm_low) + aqi_low`
/// over the segment containing the truncated concentration. Negative or NaN
/// input gives 0; anything above the last segment gives 500.
pub fn pm25_to_aqi(pm25: f64) -> f64 {
    if pm25.is_nan() || pm25 <= 0.0 {
        return 0.0;
    }
    let c = truncate_concentration(pm25);
    let last = &PM25_BREAKPOINTS[PM25_BREAKPOINTS.len() - 1];
    if c > last.pm_high {
        return MAX_AQI;
    }
    let segment = PM25_BREAKPOINTS
        .iter()
        .find(|b| c >= b.pm_low && c <= b.pm_high)
        .or_else(|| PM25_BREAKPOINTS.iter().find(|b| c <= b.pm_high))
        .unwrap_or(last);
    (segment.aqi_high - segment.aqi_low) / (segment.pm_high - segment.pm_low)
        * (c - segment.pm_low)
        + segment.aqi_low
}

/// Convert a PM2.5 concentration to the integer AQI that is reported.
pub fn pm25_to_aqi_index(pm25: f64) -> u32 {
    pm25_to_aqi(pm25).round() as u32
}

/// AQI band for a PM2.5 concentration. Concentrations beyond the scale
/// clamp to Hazardous.
pub fn classify_pm25(pm25: f64) -> &'static Category {
    AQI_TABLE.classify(pm25_to_aqi_index(pm25) as f64)
}

/// Composite traffic pollution score in percent.
///
/// `min(100, round(NO2/200×40 + CO/2000×30 + PM2.5/100×30))`, all inputs in
/// μg/m³. Negative inputs count as zero.
pub fn traffic_score(no2: f64, co: f64, pm25: f64) -> f64 {
    let no2 = no2.max(0.0);
    let co = co.max(0.0);
    let pm25 = pm25.max(0.0);
    let raw = no2 / 200.0 * 40.0 + co / 2000.0 * 30.0 + pm25 / 100.0 * 30.0;
    raw.round().min(100.0)
}

/// The scale a modality's values are classified on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    /// Values are PM2.5 in μg/m³, classified through the AQI
    AirQuality,
    /// Values are °F
    Temperature,
    /// Values are composite scores in percent
    TrafficPollution,
}

impl Scale {
    pub fn table(&self) -> &'static BreakpointTable {
        match self {
            Scale::AirQuality => &AQI_TABLE,
            Scale::Temperature => &TEMPERATURE_TABLE,
            Scale::TrafficPollution => &TRAFFIC_TABLE,
        }
    }

    pub fn classify(&self, value: f64) -> &'static Category {
        match self {
            Scale::AirQuality => classify_pm25(value),
            Scale::Temperature | Scale::TrafficPollution => self.table().classify(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_are_contiguous() {
        for table in [&AQI_TABLE, &TEMPERATURE_TABLE, &TRAFFIC_TABLE] {
            assert_eq!(table.validate(), Ok(()), "{}", table.name);
        }
    }

    #[test]
    fn test_classification_is_total() {
        let inputs = [
            f64::NEG_INFINITY,
            -1e9,
            -5.0,
            0.0,
            0.5,
            32.5,
            50.5,
            99.99,
            1e6,
            f64::INFINITY,
            f64::NAN,
        ];
        for table in [&AQI_TABLE, &TEMPERATURE_TABLE, &TRAFFIC_TABLE] {
            for value in inputs {
                let category = table.classify(value);
                assert!(table.categories.iter().any(|c| c == category));
            }
        }
        for value in inputs {
            let category = classify_pm25(value);
            assert!(AQI_CATEGORIES.iter().any(|c| c == category));
        }
    }

    #[test]
    fn test_out_of_range_returns_lowest_band() {
        assert_eq!(TEMPERATURE_TABLE.classify(-200.0).key, "freezing");
        assert_eq!(TEMPERATURE_TABLE.classify(200.0).key, "freezing");
        assert_eq!(TRAFFIC_TABLE.classify(-1.0).key, "low");
        assert_eq!(AQI_TABLE.classify(f64::NAN).key, "good");
    }

    #[test]
    fn test_pm25_breakpoints_classify_exactly() {
        assert_eq!(classify_pm25(12.0).label, "Good");
        assert_eq!(classify_pm25(12.1).label, "Moderate");
        assert_eq!(classify_pm25(35.4).label, "Moderate");
        assert_eq!(classify_pm25(35.5).label, "Unhealthy for Sensitive Groups");
        assert_eq!(classify_pm25(500.4).label, "Hazardous");
        assert_eq!(classify_pm25(600.0).label, "Hazardous");
    }

    #[test]
    fn test_pm25_to_aqi_interpolation() {
        assert_eq!(pm25_to_aqi(0.0), 0.0);
        assert!((pm25_to_aqi(12.0) - 50.0).abs() < 1e-9);
        assert!((pm25_to_aqi(35.4) - 100.0).abs() < 1e-9);
        assert!((pm25_to_aqi(55.4) - 150.0).abs() < 1e-9);
        assert!((pm25_to_aqi(500.4) - 500.0).abs() < 1e-9);
        assert_eq!(pm25_to_aqi(750.0), 500.0);
        assert_eq!(pm25_to_aqi(-3.0), 0.0);
        assert_eq!(pm25_to_aqi_index(12.1), 51);
        assert_eq!(pm25_to_aqi_index(6.0), 25);
        // truncation to one decimal keeps 12.05 in the first segment
        assert_eq!(pm25_to_aqi_index(12.05), 50);
    }

    #[test]
    fn test_truncated_concentration_keeps_band() {
        assert_eq!(truncate_concentration(12.06), 12.0);
        assert_eq!(truncate_concentration(12.1), 12.1);
        assert_eq!(truncate_concentration(35.49), 35.4);
        for pm25 in [12.04, 12.05, 12.06, 12.09, 12.1, 35.45, 55.49] {
            assert_eq!(
                classify_pm25(truncate_concentration(pm25)),
                classify_pm25(pm25),
                "{}",
                pm25
            );
        }
    }

    #[test]
    fn test_temperature_band_edges() {
        let edges = [
            (32.0, "freezing"),
            (33.0, "cold"),
            (50.0, "cold"),
            (51.0, "cool"),
            (60.0, "cool"),
            (61.0, "mild"),
            (70.0, "mild"),
            (71.0, "warm"),
            (80.0, "warm"),
            (81.0, "hot"),
            (95.0, "hot"),
            (96.0, "very_hot"),
        ];
        for (value, key) in edges {
            assert_eq!(TEMPERATURE_TABLE.classify(value).key, key, "{}°F", value);
        }
    }

    #[test]
    fn test_traffic_band_edges() {
        let edges = [
            (0.0, "low"),
            (20.0, "low"),
            (21.0, "moderate"),
            (40.0, "moderate"),
            (41.0, "high"),
            (70.0, "high"),
            (71.0, "very_high"),
            (100.0, "very_high"),
        ];
        for (value, key) in edges {
            assert_eq!(TRAFFIC_TABLE.classify(value).key, key, "{}%", value);
        }
    }

    #[test]
    fn test_temperature_bands() {
        assert_eq!(TEMPERATURE_TABLE.classify(32.0).key, "freezing");
        assert_eq!(TEMPERATURE_TABLE.classify(32.5).key, "cold");
        assert_eq!(TEMPERATURE_TABLE.classify(33.0).key, "cold");
        assert_eq!(TEMPERATURE_TABLE.classify(70.0).key, "mild");
        assert_eq!(TEMPERATURE_TABLE.classify(81.0).key, "hot");
        assert_eq!(TEMPERATURE_TABLE.classify(150.0).key, "very_hot");
    }

    #[test]
    fn test_traffic_score() {
        // 40/200*40 + 400/2000*30 + 10/100*30 = 8 + 6 + 3
        assert_eq!(traffic_score(40.0, 400.0, 10.0), 17.0);
        assert_eq!(traffic_score(1000.0, 10000.0, 500.0), 100.0);
        assert_eq!(traffic_score(-5.0, 0.0, 0.0), 0.0);
        assert_eq!(TRAFFIC_TABLE.classify(traffic_score(200.0, 2000.0, 30.0)).key, "very_high");
    }

    #[test]
    fn test_scale_dispatch() {
        assert_eq!(Scale::AirQuality.classify(40.0).key, "unhealthy_sensitive");
        assert_eq!(Scale::Temperature.classify(40.0).key, "cold");
        assert_eq!(Scale::TrafficPollution.classify(40.0).key, "moderate");
        assert_eq!(AQI_TABLE.get("hazardous").map(|c| c.max), Some(500.0));
    }
}
