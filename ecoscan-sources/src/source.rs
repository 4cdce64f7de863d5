use crate::{coordinate::GeoQuery, error::Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

/// Name reported for data produced by the synthetic generators.
pub const SYNTHETIC_SOURCE: &str = "synthetic";

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Produced by an upstream API
    Live,
    /// Produced by the synthetic generator after every upstream failed
    Fallback,
}

/// The data of one fetch cycle tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchOutcome<T> {
    pub provenance: Provenance,
    pub source: &'static str,
    pub fetched_at: DateTime<Utc>,
    pub data: T,
}

impl<T> FetchOutcome<T> {
    pub fn live(source: &'static str, data: T) -> Self {
        FetchOutcome {
            provenance: Provenance::Live,
            source,
            fetched_at: Utc::now(),
            data,
        }
    }

    pub fn fallback(data: T) -> Self {
        FetchOutcome {
            provenance: Provenance::Fallback,
            source: SYNTHETIC_SOURCE,
            fetched_at: Utc::now(),
            data,
        }
    }

    pub fn is_live(&self) -> bool {
        self.provenance == Provenance::Live
    }

    /// Transform the payload, keeping provenance and timestamp.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        FetchOutcome {
            provenance: self.provenance,
            source: self.source,
            fetched_at: self.fetched_at,
            data: f(self.data),
        }
    }
}

/// An upstream provider of data of type `T` for a query.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` so chains can be shared between
/// concurrently running modality fetches.
#[async_trait]
pub trait Source<T: Send>: Send + Sync {
    /// Short identifier used in logs and in [`FetchOutcome::source`].
    fn name(&self) -> &'static str;

    async fn fetch(&self, query: &GeoQuery) -> Result<T>;
}

/// An ordered list of sources for one modality.
///
/// Sources are attempted strictly one after another; a failure is logged
/// and the next source is tried. When every source fails the caller's
/// fallback produces the data.
pub struct SourceChain<T: Send> {
    sources: Vec<Box<dyn Source<T>>>,
}

impl<T: Send> Default for SourceChain<T> {
    fn default() -> Self {
        SourceChain {
            sources: Vec::new(),
        }
    }
}

impl<T: Send> SourceChain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with the lowest priority so far.
    pub fn with<S: Source<T> + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: Box<dyn Source<T>>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Try each source in priority order and return the first success.
    pub async fn first_success(&self, query: &GeoQuery) -> Option<(&'static str, T)> {
        let attempts = self.sources.len();
        for (i, source) in self.sources.iter().enumerate() {
            match source.fetch(query).await {
                Ok(data) => {
                    info!(
                        "Source {}/{} ({}) answered for {}",
                        i + 1,
                        attempts,
                        source.name(),
                        query.center
                    );
                    return Some((source.name(), data));
                }
                Err(e) => {
                    warn!(
                        "Source {}/{} ({}) failed for {}: {}",
                        i + 1,
                        attempts,
                        source.name(),
                        query.center,
                        e
                    );
                }
            }
        }
        None
    }

    /// Fetch from the chain, generating data with `fallback` if every
    /// source fails. Never fails.
    pub async fn fetch_or_else<F>(&self, query: &GeoQuery, fallback: F) -> FetchOutcome<T>
    where
        F: FnOnce() -> T,
    {
        match self.first_success(query).await {
            Some((source, data)) => FetchOutcome::live(source, data),
            None => {
                warn!(
                    "All {} sources failed for {}, generating synthetic data",
                    self.sources.len(),
                    query.center
                );
                FetchOutcome::fallback(fallback())
            }
        }
    }
}
