//! Air quality sources: OpenAQ PM2.5 sensors first, WAQI stations second.
//!
//! Both are normalized to PM2.5 observations in μg/m³. WAQI only publishes
//! an AQI number per station, which is converted with [`AQI_TO_PM25`].

use crate::{
    coordinate::GeoQuery,
    error::{Result, SourceError},
    observation::Observation,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[cfg(feature = "api")]
use crate::{http::HttpClient, source::Source};
#[cfg(feature = "api")]
use async_trait::async_trait;
#[cfg(feature = "api")]
use log::debug;

/// Rough PM2.5 (μg/m³) per AQI point, used to normalize AQI-only stations.
pub const AQI_TO_PM25: f64 = 0.35;

/// Readings above this are treated as sensor faults.
const MAX_PLAUSIBLE_PM25: f64 = 1000.0;

pub const OPENAQ_BASE_URL: &str = "https://api.openaq.org/v3";
pub const WAQI_BASE_URL: &str = "https://api.waqi.info";

/// OpenAQ parameter id for PM2.5
const OPENAQ_PM25_PARAMETER: u32 = 2;
/// Largest radius the OpenAQ API accepts, in meters
const OPENAQ_MAX_RADIUS: f64 = 25_000.0;

#[derive(Debug, Clone, Deserialize)]
struct OpenAqDatetime {
    utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAqCoordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenAqLatest {
    datetime: Option<OpenAqDatetime>,
    value: f64,
    coordinates: OpenAqCoordinates,
    locations_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAqLatestResponse {
    results: Vec<OpenAqLatest>,
}

fn plausible_pm25(value: f64) -> bool {
    value.is_finite() && (0.0..MAX_PLAUSIBLE_PM25).contains(&value)
}

/// Parse an OpenAQ `/parameters/2/latest` body into PM2.5 observations.
///
/// Results without coordinates, with implausible values, or outside the
/// query radius are dropped.
pub fn parse_openaq_latest(body: &str, query: &GeoQuery) -> Result<Vec<Observation>> {
    let response: OpenAqLatestResponse = serde_json::from_str(body)?;
    let observations: Vec<Observation> = response
        .results
        .into_iter()
        .filter(|r| plausible_pm25(r.value))
        .filter_map(|r| {
            let lat = r.coordinates.latitude?;
            let lng = r.coordinates.longitude?;
            let mut obs = Observation::pm25(
                lat,
                lng,
                r.value,
                format!("OpenAQ Location {}", r.locations_id),
            );
            obs.timestamp = r.datetime.map(|d| d.utc);
            Some(obs)
        })
        .filter(|obs| query.contains(&obs.coordinate()))
        .collect();
    if observations.is_empty() {
        return Err(SourceError::NoData {
            lat: query.center.lat,
            lng: query.center.lng,
        });
    }
    Ok(observations)
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WaqiEnvelope {
    pub status: String,
    pub data: serde_json::Value,
}

impl WaqiEnvelope {
    /// Unwrap the payload, turning `"status": "error"` into an error.
    pub(crate) fn into_data(self) -> Result<serde_json::Value> {
        if self.status != "ok" {
            let message = self
                .data
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| self.data.to_string());
            return Err(SourceError::Api(format!("WAQI: {message}")));
        }
        Ok(self.data)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WaqiStationInfo {
    name: Option<String>,
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
struct WaqiMapStation {
    lat: f64,
    lon: f64,
    uid: i64,
    /// A number as a string, or "-" when the station has no current value
    aqi: String,
    station: Option<WaqiStationInfo>,
}

/// Parse a WAQI `/map/bounds/` body, converting each station's AQI to PM2.5.
pub fn parse_waqi_bounds(body: &str, query: &GeoQuery) -> Result<Vec<Observation>> {
    let envelope: WaqiEnvelope = serde_json::from_str(body)?;
    let stations: Vec<WaqiMapStation> = serde_json::from_value(envelope.into_data()?)?;
    let observations: Vec<Observation> = stations
        .into_iter()
        .filter_map(|s| {
            let aqi = s.aqi.trim().parse::<f64>().ok()?;
            let pm25 = aqi * AQI_TO_PM25;
            if !plausible_pm25(pm25) {
                return None;
            }
            let (name, time) = match s.station {
                Some(info) => (info.name, info.time),
                None => (None, None),
            };
            let mut obs = Observation::pm25(
                s.lat,
                s.lon,
                pm25,
                name.unwrap_or_else(|| format!("WAQI Station {}", s.uid)),
            );
            obs.timestamp = time;
            Some(obs)
        })
        .collect();
    if observations.is_empty() {
        return Err(SourceError::NoData {
            lat: query.center.lat,
            lng: query.center.lng,
        });
    }
    Ok(observations)
}

/// PM2.5 sensors from the OpenAQ v3 API. Requires an API key.
#[cfg(feature = "api")]
pub struct OpenAqSource {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

#[cfg(feature = "api")]
impl OpenAqSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        OpenAqSource {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn url(&self, query: &GeoQuery) -> String {
        let radius = query.radius_meters.clamp(1_000.0, OPENAQ_MAX_RADIUS).round();
        format!(
            "{}/parameters/{}/latest?coordinates={:.5},{:.5}&radius={}&limit=100",
            self.base_url.trim_end_matches('/'),
            OPENAQ_PM25_PARAMETER,
            query.center.lat,
            query.center.lng,
            radius
        )
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl Source<Vec<Observation>> for OpenAqSource {
    fn name(&self) -> &'static str {
        "openaq"
    }

    async fn fetch(&self, query: &GeoQuery) -> Result<Vec<Observation>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingApiKey("openaq"))?;
        let url = self.url(query);
        debug!("OpenAQ: Requesting latest PM2.5: {}", url);
        let body = self
            .client
            .get_text_with_headers("openaq", &url, &[("X-API-Key", api_key)])
            .await?;
        parse_openaq_latest(&body, query)
    }
}

/// AQI stations from the WAQI map bounds API. Requires a token.
#[cfg(feature = "api")]
pub struct WaqiBoundsSource {
    client: HttpClient,
    base_url: String,
    token: Option<String>,
}

#[cfg(feature = "api")]
impl WaqiBoundsSource {
    pub fn new(client: HttpClient, base_url: impl Into<String>, token: Option<String>) -> Self {
        WaqiBoundsSource {
            client,
            base_url: base_url.into(),
            token,
        }
    }
}

#[cfg(feature = "api")]
#[async_trait]
impl Source<Vec<Observation>> for WaqiBoundsSource {
    fn name(&self) -> &'static str {
        "waqi"
    }

    async fn fetch(&self, query: &GeoQuery) -> Result<Vec<Observation>> {
        let token = self
            .token
            .as_deref()
            .ok_or(SourceError::MissingApiKey("waqi"))?;
        let (south, west, north, east) = query.bounding_box();
        let url = format!(
            "{}/map/bounds/?latlng={:.5},{:.5},{:.5},{:.5}&token={}",
            self.base_url.trim_end_matches('/'),
            south,
            west,
            north,
            east,
            token
        );
        debug!("WAQI: Requesting stations in bounds {},{},{},{}", south, west, north, east);
        let body = self.client.get_text("waqi", &url).await?;
        parse_waqi_bounds(&body, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPENAQ_BODY: &str = r#"{
  "meta": {"name": "openaq-api", "website": "/", "page": 1, "limit": 100, "found": 3},
  "results": [
    {"datetime": {"utc": "2024-05-01T12:00:00Z", "local": "2024-05-01T08:00:00-04:00"},
     "value": 8.4, "coordinates": {"latitude": 37.5480, "longitude": -77.4470},
     "sensorsId": 101, "locationsId": 11},
    {"datetime": {"utc": "2024-05-01T12:00:00Z", "local": "2024-05-01T08:00:00-04:00"},
     "value": -999.0, "coordinates": {"latitude": 37.5300, "longitude": -77.4300},
     "sensorsId": 102, "locationsId": 12},
    {"datetime": {"utc": "2024-05-01T12:00:00Z", "local": "2024-05-01T08:00:00-04:00"},
     "value": 14.0, "coordinates": {"latitude": null, "longitude": null},
     "sensorsId": 103, "locationsId": 13},
    {"datetime": {"utc": "2024-05-01T12:00:00Z", "local": "2024-05-01T08:00:00-04:00"},
     "value": 22.0, "coordinates": {"latitude": 40.7128, "longitude": -74.0060},
     "sensorsId": 104, "locationsId": 14}
  ]
}"#;

    const WAQI_BODY: &str = r#"{
  "status": "ok",
  "data": [
    {"lat": 37.5581, "lon": -77.4564, "uid": 8531, "aqi": "57",
     "station": {"name": "Richmond - MathScience Innovation Center", "time": "2024-05-01T12:00:00Z"}},
    {"lat": 37.4490, "lon": -77.5870, "uid": 8532, "aqi": "-",
     "station": {"name": "Chesterfield", "time": "2024-05-01T12:00:00Z"}},
    {"lat": 37.6000, "lon": -77.3000, "uid": 8533, "aqi": "20"}
  ]
}"#;

    fn query() -> GeoQuery {
        GeoQuery::new((37.5407, -77.4360), 25_000.0)
    }

    #[test]
    fn test_parse_openaq_latest() {
        let observations = parse_openaq_latest(OPENAQ_BODY, &query()).unwrap();
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].value, 8.4);
        assert_eq!(observations[0].name.as_deref(), Some("OpenAQ Location 11"));
        assert!(observations[0].timestamp.is_some());
    }

    #[test]
    fn test_parse_openaq_empty_is_no_data() {
        let body = r#"{"meta": {}, "results": []}"#;
        let result = parse_openaq_latest(body, &query());
        assert!(matches!(result, Err(SourceError::NoData { .. })));
    }

    #[test]
    fn test_parse_openaq_malformed() {
        let result = parse_openaq_latest("<html>rate limited</html>", &query());
        assert!(matches!(result, Err(SourceError::JsonParse(_))));
    }

    #[test]
    fn test_parse_waqi_bounds_converts_aqi() {
        let observations = parse_waqi_bounds(WAQI_BODY, &query()).unwrap();
        assert_eq!(observations.len(), 2);
        assert!((observations[0].value - 57.0 * AQI_TO_PM25).abs() < 1e-9);
        assert_eq!(
            observations[0].name.as_deref(),
            Some("Richmond - MathScience Innovation Center")
        );
        assert_eq!(observations[1].name.as_deref(), Some("WAQI Station 8533"));
        assert!(observations[1].timestamp.is_none());
    }

    #[test]
    fn test_parse_waqi_error_status() {
        let body = r#"{"status": "error", "data": "Invalid key"}"#;
        match parse_waqi_bounds(body, &query()) {
            Err(SourceError::Api(message)) => assert!(message.contains("Invalid key")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
