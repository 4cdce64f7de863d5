use crate::{
    gate::{ChangeGate, GateDecision, QueryContext},
    report::{
        AirQualityReport, GreenSpaceReport, InfrastructureReport, TemperatureReport, TrafficReport,
    },
    scanner::Scanner,
};
use ecoscan_sources::{
    coordinate::{Coordinate, GeoQuery},
    modality::Modality,
    source::FetchOutcome,
};
use log::debug;
use parking_lot::Mutex;
use std::future::Future;

/// Result of asking a gated modality to refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh<R> {
    /// No usable center yet; nothing was fetched
    NoCenter,
    /// The center is still inside the last fetch's cell
    Skipped,
    /// A fetch ran and its result is now current
    Applied(FetchOutcome<R>),
    /// A fetch ran but a newer one was issued meanwhile
    Discarded(FetchOutcome<R>),
}

impl<R> Refresh<R> {
    pub fn fetched(&self) -> bool {
        matches!(self, Refresh::Applied(_) | Refresh::Discarded(_))
    }
}

struct ModalityState<R> {
    context: QueryContext,
    latest: Option<FetchOutcome<R>>,
}

/// Gate plus last applied result for one modality.
pub struct GatedFetch<R> {
    gate: ChangeGate,
    state: Mutex<ModalityState<R>>,
}

impl<R: Clone> GatedFetch<R> {
    pub fn new(gate: ChangeGate) -> Self {
        GatedFetch {
            gate,
            state: Mutex::new(ModalityState {
                context: QueryContext::new(),
                latest: None,
            }),
        }
    }

    pub fn latest(&self) -> Option<FetchOutcome<R>> {
        self.state.lock().latest.clone()
    }

    pub fn context(&self) -> QueryContext {
        self.state.lock().context.clone()
    }

    /// Run `fetch` for `center` if the gate opens, applying the result
    /// only if no newer fetch was started while it ran.
    ///
    /// The lock is released while `fetch` runs, so overlapping refreshes
    /// are allowed and resolved by generation.
    pub async fn refresh<F, Fut>(&self, center: Option<Coordinate>, fetch: F) -> Refresh<R>
    where
        F: FnOnce(Coordinate) -> Fut,
        Fut: Future<Output = FetchOutcome<R>>,
    {
        let center = match center.map(|c| Coordinate::try_new(c.lat, c.lng)) {
            Some(Ok(center)) => center,
            Some(Err(e)) => {
                debug!("Ignoring refresh with unusable center: {}", e);
                return Refresh::NoCenter;
            }
            None => return Refresh::NoCenter,
        };

        let decision = {
            let mut state = self.state.lock();
            self.gate.begin(&mut state.context, center)
        };
        let ticket = match decision {
            GateDecision::Fetch(ticket) => ticket,
            GateDecision::Skip => return Refresh::Skipped,
        };

        let outcome = fetch(ticket.center).await;

        let mut state = self.state.lock();
        if self.gate.complete(&mut state.context, &ticket) {
            state.latest = Some(outcome.clone());
            Refresh::Applied(outcome)
        } else {
            Refresh::Discarded(outcome)
        }
    }
}

/// Long-lived per-modality state for a moving center.
pub struct Session {
    scanner: Scanner,
    pub air_quality: GatedFetch<AirQualityReport>,
    pub temperature: GatedFetch<TemperatureReport>,
    pub traffic: GatedFetch<TrafficReport>,
    pub green_spaces: GatedFetch<GreenSpaceReport>,
    pub infrastructure: GatedFetch<InfrastructureReport>,
}

impl Session {
    pub fn new(scanner: Scanner, gate: ChangeGate) -> Self {
        Session {
            scanner,
            air_quality: GatedFetch::new(gate),
            temperature: GatedFetch::new(gate),
            traffic: GatedFetch::new(gate),
            green_spaces: GatedFetch::new(gate),
            infrastructure: GatedFetch::new(gate),
        }
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub async fn refresh_air_quality(&self, center: Option<Coordinate>) -> Refresh<AirQualityReport> {
        self.air_quality
            .refresh(center, |c| async move {
                let query = GeoQuery::new(c, Modality::AirQuality.default_radius_meters());
                self.scanner.air_quality(&query).await
            })
            .await
    }

    pub async fn refresh_temperature(&self, center: Option<Coordinate>) -> Refresh<TemperatureReport> {
        self.temperature
            .refresh(center, |c| async move {
                let query = GeoQuery::new(c, Modality::Temperature.default_radius_meters());
                self.scanner.temperature(&query).await
            })
            .await
    }

    pub async fn refresh_traffic(&self, center: Option<Coordinate>) -> Refresh<TrafficReport> {
        self.traffic
            .refresh(center, |c| async move {
                let query = GeoQuery::new(c, Modality::TrafficPollution.default_radius_meters());
                self.scanner.traffic(&query).await
            })
            .await
    }

    pub async fn refresh_green_spaces(&self, center: Option<Coordinate>) -> Refresh<GreenSpaceReport> {
        self.green_spaces
            .refresh(center, |c| async move {
                let query = GeoQuery::new(c, Modality::GreenSpaces.default_radius_meters());
                self.scanner.green_spaces(&query).await
            })
            .await
    }

    pub async fn refresh_infrastructure(
        &self,
        center: Option<Coordinate>,
    ) -> Refresh<InfrastructureReport> {
        self.infrastructure
            .refresh(center, |c| async move {
                let query = GeoQuery::new(c, Modality::Infrastructure.default_radius_meters());
                self.scanner.infrastructure(&query).await
            })
            .await
    }

    /// Refresh every modality concurrently. Returns the modalities that
    /// actually fetched.
    pub async fn refresh_all(&self, center: Option<Coordinate>) -> Vec<Modality> {
        let (air_quality, temperature, traffic, green_spaces, infrastructure) = tokio::join!(
            self.refresh_air_quality(center),
            self.refresh_temperature(center),
            self.refresh_traffic(center),
            self.refresh_green_spaces(center),
            self.refresh_infrastructure(center),
        );
        [
            (Modality::AirQuality, air_quality.fetched()),
            (Modality::Temperature, temperature.fetched()),
            (Modality::TrafficPollution, traffic.fetched()),
            (Modality::GreenSpaces, green_spaces.fetched()),
            (Modality::Infrastructure, infrastructure.fetched()),
        ]
        .into_iter()
        .filter(|(_, fetched)| *fetched)
        .map(|(modality, _)| modality)
        .collect()
    }
}
