use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::elements::error::ElementsError;
use crate::elements::tle::TleLines;
use crate::elements::ElementSource;
use crate::error::BookingResult;
use crate::store::{db_time, Satellite, Store};

/// True if either element line or the refresh timestamp is missing, or the
/// elements are older than `staleness`.
pub fn elements_stale(satellite: &Satellite, now: DateTime<Utc>, staleness: Duration) -> bool {
    if satellite.elements().is_none() {
        return true;
    }
    match satellite.tle_updated_at {
        Some(updated) => now - updated > staleness,
        None => true,
    }
}

/// Decides when a satellite's orbital elements must be re-fetched, and does it.
#[derive(Clone)]
pub struct FreshnessManager {
    store: Store,
    source: Arc<dyn ElementSource>,
    staleness: Duration,
    timeout: std::time::Duration,
}

impl FreshnessManager {
    pub fn new(
        store: Store,
        source: Arc<dyn ElementSource>,
        staleness: Duration,
        timeout: std::time::Duration,
    ) -> Self {
        Self {
            store,
            source,
            staleness,
            timeout,
        }
    }

    pub fn is_stale(&self, satellite: &Satellite, now: DateTime<Utc>) -> bool {
        elements_stale(satellite, now, self.staleness)
    }

    /// Fetches new elements and persists them before returning.
    ///
    /// Any failure leaves the stored elements untouched; there is no fallback to
    /// the stale set.
    pub async fn refresh(
        &self,
        satellite: &Satellite,
        now: DateTime<Utc>,
    ) -> BookingResult<TleLines> {
        log::info!("Refreshing orbital elements for satellite ({})", satellite.norad_id);

        let lines = tokio::time::timeout(self.timeout, self.source.fetch_elements(satellite.norad_id))
            .await
            .map_err(|_| ElementsError::Timeout)??;

        // Refuse to persist anything SGP4 cannot use.
        lines.to_sgp4(Some(satellite.s_name.clone()))?;

        sqlx::query(
            r#"
            UPDATE satellites
            SET tle_line1 = ?, tle_line2 = ?, tle_updated_at = ?
            WHERE s_id = ?
            "#,
        )
        .bind(&lines.line1)
        .bind(&lines.line2)
        .bind(db_time(now))
        .bind(satellite.s_id)
        .execute(self.store.pool())
        .await?;

        Ok(lines)
    }

    /// Returns the satellite with fresh elements, refreshing at most once.
    pub async fn ensure_fresh(
        &self,
        satellite: Satellite,
        now: DateTime<Utc>,
    ) -> BookingResult<Satellite> {
        if !self.is_stale(&satellite, now) {
            return Ok(satellite);
        }

        let lines = self.refresh(&satellite, now).await?;
        Ok(Satellite {
            tle_line1: Some(lines.line1),
            tle_line2: Some(lines.line2),
            tle_updated_at: Some(db_time(now)),
            ..satellite
        })
    }
}
