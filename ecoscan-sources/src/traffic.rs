//! Traffic-related pollutants at the query center: Open-Meteo air quality,
//! then the WAQI nearest-station feed.

use crate::{
    air_quality::{WaqiEnvelope, AQI_TO_PM25},
    error::{Result, SourceError},
    records::PollutantReading,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

#[cfg(feature = "api")]
use crate::{coordinate::GeoQuery, http::HttpClient, source::Source};
#[cfg(feature = "api")]
use async_trait::async_trait;

pub const OPEN_METEO_AIR_QUALITY_BASE_URL: &str = "https://air-quality-api.open-meteo.com";

/// WAQI publishes sub-index values rather than concentrations. These convert
/// one index point to μg/m³ using the slope of the lowest EPA band.
pub const WAQI_NO2_PER_AQI: f64 = 2.0;
pub const WAQI_CO_PER_AQI: f64 = 100.0;

const OPEN_METEO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Deserialize)]
struct OpenMeteoAirCurrent {
    time: Option<String>,
    nitrogen_dioxide: Option<f64>,
    carbon_monoxide: Option<f64>,
    pm2_5: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenMeteoAirQuality {
    current: Option<OpenMeteoAirCurrent>,
}

fn require(value: Option<f64>, field: &str) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(SourceError::InvalidFormat(format!("{field} = {v}"))),
        None => Err(SourceError::InvalidFormat(format!("missing {field}"))),
    }
}

/// Parse an Open-Meteo air quality body requested with
/// `current=nitrogen_dioxide,carbon_monoxide,pm2_5&timezone=GMT`.
pub fn parse_open_meteo_pollutants(body: &str) -> Result<PollutantReading> {
    let response: OpenMeteoAirQuality = serde_json::from_str(body)?;
    let current = response
        .current
        .ok_or_else(|| SourceError::InvalidFormat("missing \"current\" block".to_string()))?;
    Ok(PollutantReading {
        no2: require(current.nitrogen_dioxide, "nitrogen_dioxide")?,
        co: require(current.carbon_monoxide, "carbon_monoxide")?,
        pm25: require(current.pm2_5, "pm2_5")?,
        observed_at: current
            .time
            .as_deref()
            .and_then(|t| NaiveDateTime::parse_from_str(t, OPEN_METEO_TIME_FORMAT).ok())
            .map(|naive| Utc.from_utc_datetime(&naive)),
    })
}

#[derive(Debug, Clone, Deserialize)]
struct WaqiValue {
    v: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct WaqiIaqi {
    no2: Option<WaqiValue>,
    co: Option<WaqiValue>,
    pm25: Option<WaqiValue>,
}

#[derive(Debug, Clone, Deserialize)]
struct WaqiTime {
    iso: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct WaqiFeed {
    iaqi: WaqiIaqi,
    time: Option<WaqiTime>,
}

/// Parse a WAQI `/feed/geo:lat;lng/` body into approximate concentrations.
pub fn parse_waqi_feed(body: &str) -> Result<PollutantReading> {
    let envelope: WaqiEnvelope = serde_json::from_str(body)?;
    let feed: WaqiFeed = serde_json::from_value(envelope.into_data()?)?;
    let no2 = require(feed.iaqi.no2.map(|x| x.v), "iaqi.no2")?;
    let co = require(feed.iaqi.co.map(|x| x.v), "iaqi.co")?;
    let pm25 = require(feed.iaqi.pm25.map(|x| x.v), "iaqi.pm25")?;
    Ok(PollutantReading {
        no2: no2 * WAQI_NO2_PER_AQI,
        co: co * WAQI_CO_PER_AQI,
        pm25: pm25 * AQI_TO_PM25,
        observed_at: feed.time.and_then(|t| t.iso),
    })
}

#[cfg(feature = "api")]
pub struct OpenMeteoAirQualitySource {
    client: HttpClient,
    base_url: String,
}

#[cfg(feature = "api")]
impl OpenMeteoAirQualitySource {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        OpenMeteoAirQualitySource {
            client,
            base_url: base_url.into(),
        }
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl Source<PollutantReading> for OpenMeteoAirQualitySource {
    fn name(&self) -> &'static str {
        "open-meteo-air-quality"
    }

    async fn fetch(&self, query: &GeoQuery) -> Result<PollutantReading> {
        let url = format!(
            "{}/v1/air-quality?latitude={:.4}&longitude={:.4}&current=nitrogen_dioxide,carbon_monoxide,pm2_5&timezone=GMT",
            self.base_url.trim_end_matches('/'),
            query.center.lat,
            query.center.lng
        );
        let body = self.client.get_text("open-meteo-air-quality", &url).await?;
        parse_open_meteo_pollutants(&body)
    }
}

#[cfg(feature = "api")]
pub struct WaqiFeedSource {
    client: HttpClient,
    base_url: String,
    token: Option<String>,
}

#[cfg(feature = "api")]
impl WaqiFeedSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>, token: Option<String>) -> Self {
        WaqiFeedSource {
            client,
            base_url: base_url.into(),
            token,
        }
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl Source<PollutantReading> for WaqiFeedSource {
    fn name(&self) -> &'static str {
        "waqi-feed"
    }

    async fn fetch(&self, query: &GeoQuery) -> Result<PollutantReading> {
        let token = self
            .token
            .as_deref()
            .ok_or(SourceError::MissingApiKey("waqi"))?;
        let url = format!(
            "{}/feed/geo:{:.4};{:.4}/?token={}",
            self.base_url.trim_end_matches('/'),
            query.center.lat,
            query.center.lng,
            token
        );
        let body = self.client.get_text("waqi-feed", &url).await?;
        parse_waqi_feed(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open_meteo_pollutants() {
        let body = r#"{
  "latitude": 37.54, "longitude": -77.43,
  "current": {"time": "2024-05-01T12:00", "interval": 3600,
              "nitrogen_dioxide": 18.2, "carbon_monoxide": 231.0, "pm2_5": 7.9}
}"#;
        let reading = parse_open_meteo_pollutants(body).unwrap();
        assert_eq!(reading.no2, 18.2);
        assert_eq!(reading.co, 231.0);
        assert_eq!(reading.pm25, 7.9);
        assert!(reading.observed_at.is_some());
    }

    #[test]
    fn test_parse_open_meteo_null_pollutant() {
        let body = r#"{"current": {"time": "2024-05-01T12:00", "nitrogen_dioxide": null,
                        "carbon_monoxide": 231.0, "pm2_5": 7.9}}"#;
        match parse_open_meteo_pollutants(body) {
            Err(SourceError::InvalidFormat(message)) => assert!(message.contains("nitrogen_dioxide")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_waqi_feed() {
        let body = r#"{
  "status": "ok",
  "data": {
    "aqi": 42, "idx": 8531,
    "iaqi": {"no2": {"v": 10.0}, "co": {"v": 3.0}, "pm25": {"v": 40.0}, "t": {"v": 21.0}},
    "time": {"s": "2024-05-01 08:00:00", "tz": "-04:00", "iso": "2024-05-01T08:00:00-04:00"}
  }
}"#;
        let reading = parse_waqi_feed(body).unwrap();
        assert_eq!(reading.no2, 20.0);
        assert_eq!(reading.co, 300.0);
        assert!((reading.pm25 - 14.0).abs() < 1e-9);
        assert_eq!(
            reading.observed_at.unwrap().to_rfc3339(),
            "2024-05-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_parse_waqi_feed_missing_pollutant() {
        let body = r#"{"status": "ok", "data": {"iaqi": {"pm25": {"v": 40.0}}}}"#;
        assert!(parse_waqi_feed(body).is_err());
    }
}
