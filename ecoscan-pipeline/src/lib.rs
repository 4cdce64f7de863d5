//! Per-modality pipelines: fetch through a source chain, zone, classify.
//!
//! [`scanner::Scanner`] owns one source chain per modality and turns a
//! [`ecoscan_sources::coordinate::GeoQuery`] into a classified report.
//! [`session::Session`] wraps it with a [`gate::ChangeGate`] per modality so
//! that a moving center only triggers fetches once it leaves the cell of the
//! last completed fetch.

pub mod gate;
pub mod report;
pub mod scanner;
pub mod session;
