use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{BookingError, BookingResult};
use crate::passes::cache;
use crate::registry::DeletionReport;
use crate::reservations::ledger;
use crate::store::{Satellite, Store};

const SATELLITE_SELECT: &str =
    "SELECT s_id, norad_id, s_name, tle_line1, tle_line2, tle_updated_at FROM satellites";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSatellite {
    pub norad_id: u32,
    pub s_name: String,
}

/// Fields an operator may change on a satellite. Elements are owned by the
/// freshness manager and cannot be set here.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SatelliteUpdate {
    pub s_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SatelliteRegistry {
    store: Store,
}

impl SatelliteRegistry {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn register(&self, norad_id: u32, s_name: &str) -> BookingResult<Satellite> {
        if norad_id == 0 {
            return Err(BookingError::Validation(
                "norad_id must be a positive catalog number".into(),
            ));
        }
        let s_name = s_name.trim();
        if s_name.is_empty() {
            return Err(BookingError::Validation("s_name must not be empty".into()));
        }

        sqlx::query("INSERT INTO satellites (norad_id, s_name) VALUES (?, ?)")
            .bind(norad_id)
            .bind(s_name)
            .execute(self.store.pool())
            .await
            .map_err(|e| {
                BookingError::conflict_on_unique(
                    e,
                    format!("Satellite ({}) is already registered", norad_id),
                )
            })?;

        log::info!("Registered satellite ({}) {}", norad_id, s_name);
        self.get(norad_id).await
    }

    pub async fn list(&self) -> BookingResult<Vec<Satellite>> {
        let query = format!("{SATELLITE_SELECT} ORDER BY norad_id");
        let satellites = sqlx::query_as::<_, Satellite>(&query)
            .fetch_all(self.store.pool())
            .await?;
        Ok(satellites)
    }

    pub async fn find(&self, norad_id: u32) -> BookingResult<Option<Satellite>> {
        let query = format!("{SATELLITE_SELECT} WHERE norad_id = ?");
        let satellite = sqlx::query_as::<_, Satellite>(&query)
            .bind(norad_id)
            .fetch_optional(self.store.pool())
            .await?;
        Ok(satellite)
    }

    pub async fn get(&self, norad_id: u32) -> BookingResult<Satellite> {
        self.find(norad_id).await?.ok_or_else(|| not_found(norad_id))
    }

    pub async fn update(&self, norad_id: u32, update: &SatelliteUpdate) -> BookingResult<Satellite> {
        let Some(s_name) = update.s_name.as_deref() else {
            return Err(BookingError::Validation("No fields provided to update".into()));
        };
        let s_name = s_name.trim();
        if s_name.is_empty() {
            return Err(BookingError::Validation("s_name must not be empty".into()));
        }

        let result = sqlx::query("UPDATE satellites SET s_name = ? WHERE norad_id = ?")
            .bind(s_name)
            .bind(norad_id)
            .execute(self.store.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(norad_id));
        }
        self.get(norad_id).await
    }

    /// Removes the satellite with its passes, reservations and mission links.
    ///
    /// A live reservation blocks the delete unless `force` is set.
    pub async fn delete(&self, norad_id: u32, force: bool) -> BookingResult<DeletionReport> {
        let satellite = self.get(norad_id).await?;

        let mut tx = self.store.begin().await?;
        // Take the write lock before reading the guard.
        sqlx::query("UPDATE satellites SET s_name = s_name WHERE s_id = ?")
            .bind(satellite.s_id)
            .execute(&mut *tx)
            .await?;

        if !force && ledger::has_live_reservation_for_satellite_on(&mut tx, satellite.s_id).await? {
            return Err(BookingError::Conflict(format!(
                "Satellite ({}) has active reservations; use force to delete",
                norad_id
            )));
        }

        let deleted_reservations = ledger::delete_by_satellite_on(&mut tx, satellite.s_id).await?;
        let deleted_passes = cache::delete_by_satellite_on(&mut tx, satellite.s_id).await?;
        sqlx::query("DELETE FROM mission_satellites WHERE s_id = ?")
            .bind(satellite.s_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM satellites WHERE s_id = ?")
            .bind(satellite.s_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::warn!(
            "Deleted satellite ({}) with {} reservations and {} passes",
            norad_id,
            deleted_reservations,
            deleted_passes
        );
        Ok(DeletionReport {
            deleted_reservations,
            deleted_passes,
        })
    }
}

fn not_found(norad_id: u32) -> BookingError {
    BookingError::NotFound(format!("Satellite ({}) not found", norad_id))
}
