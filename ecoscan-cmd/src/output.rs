//! JSON and CSV rendering of reports.

use anyhow::{anyhow, Context};
use clap::ValueEnum;
use ecoscan_data::zone::Zone;
use ecoscan_pipeline::report::{
    AirQualityReport, GreenSpaceReport, InfrastructureReport, TemperatureReport, TrafficReport,
};
use ecoscan_sources::source::FetchOutcome;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Csv,
}

/// A report that can be flattened into CSV rows.
pub trait CsvRows {
    fn write_rows(&self, source: &str, writer: &mut csv::Writer<Vec<u8>>) -> anyhow::Result<()>;
}

#[derive(Serialize)]
struct StationRow<'a> {
    id: &'a str,
    name: &'a str,
    lat: f64,
    lng: f64,
    pm25: f64,
    aqi: u32,
    category: &'a str,
    cluster_size: usize,
    source: &'a str,
}

#[derive(Serialize)]
struct ZoneRow<'a> {
    id: &'a str,
    name: &'a str,
    lat: f64,
    lng: f64,
    value: f64,
    unit: &'a str,
    category: &'a str,
    source: &'a str,
}

#[derive(Serialize)]
struct PlaceRow<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    lat: f64,
    lng: f64,
    source: &'a str,
}

impl CsvRows for AirQualityReport {
    fn write_rows(&self, source: &str, writer: &mut csv::Writer<Vec<u8>>) -> anyhow::Result<()> {
        for s in &self.stations {
            writer.serialize(StationRow {
                id: &s.id,
                name: &s.name,
                lat: s.lat,
                lng: s.lng,
                pm25: s.pm25,
                aqi: s.aqi,
                category: s.category.label,
                cluster_size: s.cluster_size,
                source,
            })?;
        }
        Ok(())
    }
}

fn write_zones(zones: &[Zone], source: &str, writer: &mut csv::Writer<Vec<u8>>) -> anyhow::Result<()> {
    for z in zones {
        writer.serialize(ZoneRow {
            id: &z.id,
            name: &z.name,
            lat: z.lat,
            lng: z.lng,
            value: (z.value * 10.0).round() / 10.0,
            unit: z.parameter.unit(),
            category: z.category.label,
            source,
        })?;
    }
    Ok(())
}

impl CsvRows for TemperatureReport {
    fn write_rows(&self, source: &str, writer: &mut csv::Writer<Vec<u8>>) -> anyhow::Result<()> {
        write_zones(&self.zones, source, writer)
    }
}

impl CsvRows for TrafficReport {
    fn write_rows(&self, source: &str, writer: &mut csv::Writer<Vec<u8>>) -> anyhow::Result<()> {
        write_zones(&self.zones, source, writer)
    }
}

impl CsvRows for GreenSpaceReport {
    fn write_rows(&self, source: &str, writer: &mut csv::Writer<Vec<u8>>) -> anyhow::Result<()> {
        for s in &self.spaces {
            writer.serialize(PlaceRow {
                id: &s.id,
                name: &s.name,
                kind: s.kind.label(),
                lat: s.lat,
                lng: s.lng,
                source,
            })?;
        }
        Ok(())
    }
}

impl CsvRows for InfrastructureReport {
    fn write_rows(&self, source: &str, writer: &mut csv::Writer<Vec<u8>>) -> anyhow::Result<()> {
        for s in &self.sites {
            writer.serialize(PlaceRow {
                id: &s.id,
                name: &s.name,
                kind: s.kind.label(),
                lat: s.lat,
                lng: s.lng,
                source,
            })?;
        }
        Ok(())
    }
}

pub fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize report")
}

pub fn to_csv<T: CsvRows>(outcome: &FetchOutcome<T>) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    outcome.data.write_rows(outcome.source, &mut writer)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

pub fn render<T: CsvRows + Serialize>(
    outcome: &FetchOutcome<T>,
    format: Format,
) -> anyhow::Result<String> {
    match format {
        Format::Json => to_json(outcome),
        Format::Csv => to_csv(outcome),
    }
}

/// Write to `output` if given, else stdout.
pub fn emit(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} bytes to {}", text.len(), path.display());
        }
        None => println!("{}", text.trim_end()),
    }
    Ok(())
}
