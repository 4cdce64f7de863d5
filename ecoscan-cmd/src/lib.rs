//! Command implementations for the ecoscan CLI.
//!
//! Provides one subcommand per environmental modality, a combined scan,
//! offline classification and replay of recorded GPS tracks.

use clap::{Args, Subcommand};
use ecoscan_sources::modality::Modality;
use std::path::{Path, PathBuf};

pub mod classify;
pub mod config;
pub mod output;
pub mod query;
pub mod track;

use classify::ClassifyScale;
use config::Config;
use output::Format;

#[derive(Args, Debug, Clone)]
pub struct LocationArgs {
    /// Latitude of the center in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude of the center in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lng: f64,

    /// Search radius in meters (defaults per modality)
    #[arg(short, long)]
    pub radius: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    pub format: Format,

    /// Output path (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// PM2.5 stations clustered into zones with their AQI
    AirQuality {
        #[command(flatten)]
        location: LocationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Current temperature spread over urban heat island zones
    Temperature {
        #[command(flatten)]
        location: LocationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Traffic pollution score spread over road pattern zones
    Traffic {
        #[command(flatten)]
        location: LocationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Parks, gardens, reserves, playgrounds and woods nearby
    GreenSpaces {
        #[command(flatten)]
        location: LocationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// EV chargers, bike share, transit stops, recycling and water nearby
    Infrastructure {
        #[command(flatten)]
        location: LocationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// All modalities at once, as one JSON report
    Scan {
        /// Latitude of the center in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        /// Longitude of the center in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,

        /// Output path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify a value offline against a breakpoint table
    Classify {
        #[arg(value_enum)]
        scale: ClassifyScale,

        #[arg(allow_negative_numbers = true)]
        value: f64,
    },

    /// Replay a CSV of GPS fixes (lat,lng,accuracy_m,timestamp) through the
    /// smoother and change gate, refreshing air quality as the center moves
    Track {
        #[arg(long)]
        fixes: PathBuf,

        /// Process noise of the smoother in meters per second
        #[arg(long, default_value_t = track::DEFAULT_PROCESS_NOISE)]
        process_noise: f64,
    },
}

pub async fn run(command: Command, config_path: Option<&Path>) -> anyhow::Result<()> {
    match command {
        Command::AirQuality { location, output } => {
            let config = Config::load(config_path)?;
            query::run_modality(Modality::AirQuality, &location, &output, &config).await
        }
        Command::Temperature { location, output } => {
            let config = Config::load(config_path)?;
            query::run_modality(Modality::Temperature, &location, &output, &config).await
        }
        Command::Traffic { location, output } => {
            let config = Config::load(config_path)?;
            query::run_modality(Modality::TrafficPollution, &location, &output, &config).await
        }
        Command::GreenSpaces { location, output } => {
            let config = Config::load(config_path)?;
            query::run_modality(Modality::GreenSpaces, &location, &output, &config).await
        }
        Command::Infrastructure { location, output } => {
            let config = Config::load(config_path)?;
            query::run_modality(Modality::Infrastructure, &location, &output, &config).await
        }
        Command::Scan { lat, lng, output } => {
            let config = Config::load(config_path)?;
            query::run_scan(lat, lng, output.as_deref(), &config).await
        }
        Command::Classify { scale, value } => classify::run_classify(scale, value),
        Command::Track {
            fixes,
            process_noise,
        } => {
            let config = Config::load(config_path)?;
            track::run_track(&fixes, process_noise, &config).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    #[test]
    fn test_parse_negative_longitude() {
        let cli = TestCli::try_parse_from([
            "ecoscan",
            "air-quality",
            "--lat",
            "37.5407",
            "--lng",
            "-77.4360",
            "--format",
            "csv",
        ])
        .unwrap();
        match cli.command {
            Command::AirQuality { location, output } => {
                assert_eq!(location.lng, -77.4360);
                assert_eq!(location.radius, None);
                assert_eq!(output.format, Format::Csv);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_parse_classify() {
        let cli = TestCli::try_parse_from(["ecoscan", "classify", "temperature", "-5"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Classify {
                scale: ClassifyScale::Temperature,
                value
            } if value == -5.0
        ));
    }
}
