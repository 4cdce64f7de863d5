//! Current temperature at the query center: Open-Meteo, then wttr.in.

use crate::{
    error::{Result, SourceError},
    records::TemperatureReading,
};
use chrono::{NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

#[cfg(feature = "api")]
use crate::{coordinate::GeoQuery, http::HttpClient, source::Source};
#[cfg(feature = "api")]
use async_trait::async_trait;

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";
pub const WTTR_BASE_URL: &str = "https://wttr.in";

/// Open-Meteo reports local ISO times without seconds or offset.
const OPEN_METEO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Temperatures outside this band (°F) are rejected as bad payloads.
const PLAUSIBLE_TEMPERATURE_F: (f64, f64) = (-80.0, 140.0);

#[derive(Debug, Clone, Deserialize)]
struct OpenMeteoCurrent {
    time: Option<String>,
    temperature_2m: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenMeteoForecast {
    current: Option<OpenMeteoCurrent>,
}

fn check_plausible(temperature_f: f64) -> Result<f64> {
    if !temperature_f.is_finite()
        || temperature_f < PLAUSIBLE_TEMPERATURE_F.0
        || temperature_f > PLAUSIBLE_TEMPERATURE_F.1
    {
        return Err(SourceError::InvalidFormat(format!(
            "implausible temperature {temperature_f}°F"
        )));
    }
    Ok(temperature_f)
}

/// Parse an Open-Meteo forecast body requested with
/// `current=temperature_2m&temperature_unit=fahrenheit&timezone=GMT`.
pub fn parse_open_meteo_temperature(body: &str) -> Result<TemperatureReading> {
    let forecast: OpenMeteoForecast = serde_json::from_str(body)?;
    let current = forecast
        .current
        .ok_or_else(|| SourceError::InvalidFormat("missing \"current\" block".to_string()))?;
    let temperature_f = current
        .temperature_2m
        .ok_or_else(|| SourceError::InvalidFormat("missing temperature_2m".to_string()))?;
    let observed_at = current
        .time
        .as_deref()
        .and_then(|t| NaiveDateTime::parse_from_str(t, OPEN_METEO_TIME_FORMAT).ok())
        .map(|naive| Utc.from_utc_datetime(&naive));
    Ok(TemperatureReading {
        temperature_f: check_plausible(temperature_f)?,
        observed_at,
    })
}

#[derive(Debug, Clone, Deserialize)]
struct WttrCondition {
    #[serde(rename = "temp_F")]
    temp_f: String,
}

#[derive(Debug, Clone, Deserialize)]
struct WttrReport {
    current_condition: Vec<WttrCondition>,
}

/// Parse a wttr.in `?format=j1` body.
pub fn parse_wttr_temperature(body: &str) -> Result<TemperatureReading> {
    let report: WttrReport = serde_json::from_str(body)?;
    let condition = report
        .current_condition
        .first()
        .ok_or_else(|| SourceError::InvalidFormat("empty current_condition".to_string()))?;
    let temperature_f = condition
        .temp_f
        .trim()
        .parse::<f64>()
        .map_err(|e| SourceError::InvalidFormat(format!("temp_F \"{}\": {}", condition.temp_f, e)))?;
    Ok(TemperatureReading {
        temperature_f: check_plausible(temperature_f)?,
        observed_at: Some(Utc::now()),
    })
}

#[cfg(feature = "api")]
pub struct OpenMeteoTemperatureSource {
    client: HttpClient,
    base_url: String,
}

#[cfg(feature = "api")]
impl OpenMeteoTemperatureSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        OpenMeteoTemperatureSource {
            client,
            base_url: base_url.into(),
        }
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl Source<TemperatureReading> for OpenMeteoTemperatureSource {
    fn name(&self) -> &'static str {
        "open-meteo"
    }

    async fn fetch(&self, query: &GeoQuery) -> Result<TemperatureReading> {
        let url = format!(
            "{}/v1/forecast?latitude={:.4}&longitude={:.4}&current=temperature_2m&temperature_unit=fahrenheit&timezone=GMT",
            self.base_url.trim_end_matches('/'),
            query.center.lat,
            query.center.lng
        );
        let body = self.client.get_text("open-meteo", &url).await?;
        parse_open_meteo_temperature(&body)
    }
}

#[cfg(feature = "api")]
pub struct WttrTemperatureSource {
    client: HttpClient,
    base_url: String,
}

#[cfg(feature = "api")]
impl WttrTemperatureSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        WttrTemperatureSource {
            client,
            base_url: base_url.into(),
        }
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl Source<TemperatureReading> for WttrTemperatureSource {
    fn name(&self) -> &'static str {
        "wttr"
    }

    async fn fetch(&self, query: &GeoQuery) -> Result<TemperatureReading> {
        let url = format!(
            "{}/{:.4},{:.4}?format=j1",
            self.base_url.trim_end_matches('/'),
            query.center.lat,
            query.center.lng
        );
        let body = self.client.get_text("wttr", &url).await?;
        parse_wttr_temperature(&body)
    }
}
