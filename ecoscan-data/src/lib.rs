//! Data processing for environmental observations.
//!
//! This crate turns raw observations into zones and classifies their
//! values against each modality's breakpoint table:
//!
//! - [`cluster`]: greedy proximity clustering of point observations
//! - [`topology`]: fixed sets of named sub-areas around a center
//! - [`classification`]: breakpoint tables, EPA PM2.5 → AQI interpolation
//!   and the traffic composite score
//! - [`zone`]: the zone record and the strategy selector tying them together

pub mod classification;
pub mod cluster;
pub mod topology;
pub mod zone;
