//! Debounce-by-distance for upstream fetches.

use ecoscan_sources::coordinate::Coordinate;
use log::{debug, info};

/// Minimum movement of the query center, in degrees, before a new fetch.
pub const CHANGE_THRESHOLD_DEGREES: f64 = 0.01;

/// What the gate remembers between calls for one modality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryContext {
    /// Center of the last fetch that completed and was applied
    pub last_center: Option<Coordinate>,
    /// Set once a fetch completes, whether the data was live or synthetic
    pub fetched: bool,
    /// Generation of the most recently issued ticket
    pub generation: u64,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Proof that a fetch was started, carried to [`ChangeGate::complete`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestTicket {
    pub generation: u64,
    pub center: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Fetch(RequestTicket),
    /// The center has not moved far enough; keep the current data
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeGate {
    threshold_degrees: f64,
    guard_generations: bool,
}

impl Default for ChangeGate {
    fn default() -> Self {
        ChangeGate::new(CHANGE_THRESHOLD_DEGREES)
    }
}

impl ChangeGate {
    pub fn new(threshold_degrees: f64) -> Self {
        ChangeGate {
            threshold_degrees,
            guard_generations: true,
        }
    }

    /// Apply every completed fetch, even one superseded by a newer ticket.
    pub fn without_generation_guard(mut self) -> Self {
        self.guard_generations = false;
        self
    }

    pub fn threshold_degrees(&self) -> f64 {
        self.threshold_degrees
    }

    /// Fetch unless a fetch already completed within the threshold of
    /// `center`. Distance is planar on raw degrees.
    pub fn should_fetch(&self, context: &QueryContext, center: &Coordinate) -> bool {
        match context.last_center {
            None => true,
            Some(last) => !(context.fetched && last.degree_distance(center) < self.threshold_degrees),
        }
    }

    /// Decide whether to fetch for `center`, issuing a ticket if so.
    pub fn begin(&self, context: &mut QueryContext, center: Coordinate) -> GateDecision {
        if !self.should_fetch(context, &center) {
            debug!("Gate closed for {} (within {}°)", center, self.threshold_degrees);
            return GateDecision::Skip;
        }
        context.generation += 1;
        debug!("Gate open for {} (generation {})", center, context.generation);
        GateDecision::Fetch(RequestTicket {
            generation: context.generation,
            center,
        })
    }

    /// Record a finished fetch. Returns false when the ticket has been
    /// superseded, in which case the context is left untouched and the
    /// caller must discard the result.
    pub fn complete(&self, context: &mut QueryContext, ticket: &RequestTicket) -> bool {
        if self.guard_generations && ticket.generation != context.generation {
            info!(
                "Discarding stale result for {} (generation {}, latest {})",
                ticket.center, ticket.generation, context.generation
            );
            return false;
        }
        context.last_center = Some(ticket.center);
        context.fetched = true;
        true
    }
}
