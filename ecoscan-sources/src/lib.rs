//! Core types and environmental data sources for ecoscan.
//!
//! Every modality is served by a [`source::SourceChain`]: an ordered list of
//! upstream APIs tried one after another, backed by a synthetic generator
//! from [`synthetic`] so that a fetch cycle always yields data. HTTP clients
//! are only compiled with the `api` feature.

pub mod air_quality;
pub mod coordinate;
pub mod error;
#[cfg(feature = "api")]
pub mod http;
pub mod modality;
pub mod observation;
pub mod overpass;
pub mod records;
pub mod source;
pub mod synthetic;
pub mod traffic;
pub mod weather;
