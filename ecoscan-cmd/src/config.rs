//! TOML configuration for the CLI.
//!
//! Every field has a default, so an absent file or section is fine. API
//! keys missing from the file are read from `OPENAQ_API_KEY` and
//! `WAQI_TOKEN`.

use anyhow::Context;
use ecoscan_data::cluster::AIR_QUALITY_CLUSTER_THRESHOLD;
use ecoscan_pipeline::{
    gate::{ChangeGate, CHANGE_THRESHOLD_DEGREES},
    scanner::{ApiKeys, Endpoints, Scanner},
};
use ecoscan_sources::http::HttpSettings;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const OPENAQ_KEY_VAR: &str = "OPENAQ_API_KEY";
pub const WAQI_TOKEN_VAR: &str = "WAQI_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub keys: KeyConfig,
    pub endpoints: EndpointConfig,
    pub thresholds: ThresholdConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_tries: u32,
    pub backoff_millis: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: 20,
            max_tries: 2,
            backoff_millis: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub openaq_api_key: Option<String>,
    pub waqi_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub openaq: String,
    pub waqi: String,
    pub open_meteo: String,
    pub open_meteo_air_quality: String,
    pub wttr: String,
    pub overpass_primary: String,
    pub overpass_mirror: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        let endpoints = Endpoints::default();
        EndpointConfig {
            openaq: endpoints.openaq,
            waqi: endpoints.waqi,
            open_meteo: endpoints.open_meteo,
            open_meteo_air_quality: endpoints.open_meteo_air_quality,
            wttr: endpoints.wttr,
            overpass_primary: endpoints.overpass_primary,
            overpass_mirror: endpoints.overpass_mirror,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Air quality station merge distance in degrees
    pub clustering_degrees: f64,
    /// Minimum center movement in degrees before refetching
    pub change_degrees: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        ThresholdConfig {
            clustering_degrees: AIR_QUALITY_CLUSTER_THRESHOLD,
            change_degrees: CHANGE_THRESHOLD_DEGREES,
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Load from `path` if given, else defaults, then fill keys from the
    /// environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                info!("Loading config from {}", path.display());
                Self::from_file(path)?
            }
            None => Config::default(),
        };
        config.fill_keys(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Reject thresholds that would break clustering or gating.
    pub fn validate(&self) -> anyhow::Result<()> {
        let t = &self.thresholds;
        for (name, value) in [
            ("clustering_degrees", t.clustering_degrees),
            ("change_degrees", t.change_degrees),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!(
                    "thresholds.{} must be a non-negative number of degrees, got {}",
                    name,
                    value
                );
            }
        }
        Ok(())
    }

    /// Fill keys absent from the file using `lookup`. Blank values count
    /// as absent.
    pub fn fill_keys<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        if present(self.keys.openaq_api_key.clone()).is_none() {
            self.keys.openaq_api_key = present(lookup(OPENAQ_KEY_VAR));
        }
        if present(self.keys.waqi_token.clone()).is_none() {
            self.keys.waqi_token = present(lookup(WAQI_TOKEN_VAR));
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.http.timeout_secs),
            max_tries: self.http.max_tries,
            backoff: Duration::from_millis(self.http.backoff_millis),
            ..HttpSettings::default()
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        let e = &self.endpoints;
        Endpoints {
            openaq: e.openaq.clone(),
            waqi: e.waqi.clone(),
            open_meteo: e.open_meteo.clone(),
            open_meteo_air_quality: e.open_meteo_air_quality.clone(),
            wttr: e.wttr.clone(),
            overpass_primary: e.overpass_primary.clone(),
            overpass_mirror: e.overpass_mirror.clone(),
        }
    }

    pub fn api_keys(&self) -> ApiKeys {
        ApiKeys {
            openaq: self.keys.openaq_api_key.clone(),
            waqi: self.keys.waqi_token.clone(),
        }
    }

    pub fn scanner(&self) -> anyhow::Result<Scanner> {
        self.validate()?;
        let scanner = Scanner::from_http(self.http_settings(), &self.endpoints(), &self.api_keys())
            .context("Failed to build HTTP client")?;
        Ok(scanner.with_cluster_threshold(self.thresholds.clustering_degrees))
    }

    pub fn gate(&self) -> ChangeGate {
        ChangeGate::new(self.thresholds.change_degrees)
    }
}
