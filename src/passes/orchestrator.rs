use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::elements::FreshnessManager;
use crate::error::{BookingError, BookingResult};
use crate::passes::cache::PassCache;
use crate::predict::{PredictError, PredictionRequest, Predictor};
use crate::registry::{SatelliteRegistry, StationRegistry};
use crate::store::PredictedPass;

/// What one `passes_for` call did to the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct RefreshReport {
    /// The predictor was called.
    pub refreshed: bool,
    pub predicted: usize,
    pub newly_cached: Vec<i64>,
    pub purged: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PassListing {
    pub passes: Vec<PredictedPass>,
    pub report: RefreshReport,
}

/// Per-request control loop behind "show me passes for (satellite, station)".
#[derive(Clone)]
pub struct RefreshOrchestrator {
    satellites: SatelliteRegistry,
    stations: StationRegistry,
    cache: PassCache,
    freshness: FreshnessManager,
    predictor: Arc<dyn Predictor>,
    timeout: std::time::Duration,
}

impl RefreshOrchestrator {
    pub fn new(
        satellites: SatelliteRegistry,
        stations: StationRegistry,
        cache: PassCache,
        freshness: FreshnessManager,
        predictor: Arc<dyn Predictor>,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            satellites,
            stations,
            cache,
            freshness,
            predictor,
            timeout,
        }
    }

    /// Returns the claimable passes for the pair, refreshing the cache first
    /// when its furthest window ends inside the predictor's refresh horizon.
    ///
    /// Upstream failures surface as `Unavailable` and leave the cache as it was.
    /// Expired unreserved windows are purged on every successful call.
    pub async fn passes_for(
        &self,
        norad_id: u32,
        gs_id: i64,
        now: DateTime<Utc>,
    ) -> BookingResult<PassListing> {
        let station = self.stations.get(gs_id).await?;
        let satellite = self.satellites.get(norad_id).await?;
        if !station.is_active() {
            return Err(BookingError::Conflict(format!(
                "Ground station ({}) is inactive",
                gs_id
            )));
        }

        let s_id = satellite.s_id;
        let mut report = RefreshReport::default();

        let latest_end = self.cache.latest_window_end(s_id, gs_id).await?;
        let horizon = now + self.predictor.refresh_horizon();
        let stale = latest_end.map_or(true, |end| end < horizon);

        if stale {
            let satellite = if self.predictor.requires_elements() {
                self.freshness.ensure_fresh(satellite, now).await?
            } else {
                satellite
            };

            let request = PredictionRequest {
                norad_id,
                satellite_name: satellite.s_name.clone(),
                elements: satellite.elements(),
                station: station.location(),
                start: now,
                look_ahead: self.predictor.look_ahead(),
            };

            let windows = tokio::time::timeout(self.timeout, self.predictor.predict(&request))
                .await
                .map_err(|_| PredictError::Timeout)??;

            report.refreshed = true;
            report.predicted = windows.len();
            report.newly_cached = self
                .cache
                .merge(s_id, gs_id, &windows, self.predictor.source())
                .await?;

            log::info!(
                "Predictor returned {} windows for ({}, {}); {} newly cached {:?}",
                report.predicted,
                norad_id,
                gs_id,
                report.newly_cached.len(),
                report.newly_cached
            );
        } else {
            log::debug!("Pass cache for ({}, {}) is fresh", norad_id, gs_id);
        }

        report.purged = self.cache.purge_expired_unreserved(now).await?;
        if report.purged > 0 {
            log::info!("Purged {} expired passes", report.purged);
        }

        let passes = self.cache.claimable_passes(s_id, gs_id, now).await?;
        Ok(PassListing { passes, report })
    }
}
