use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{BookingError, BookingResult};
use crate::passes::cache;
use crate::registry::DeletionReport;
use crate::reservations::ledger;
use crate::store::{GroundStation, StationStatus, Store};

static STATION_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]{2,49}$").expect("valid station code pattern"));

const STATION_SELECT: &str =
    "SELECT gs_id, gs_code, lon, lat, alt, source, status FROM ground_stations";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewStation {
    pub gs_code: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub alt: f64,
}

/// Fields an operator may change on a ground station.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct StationUpdate {
    pub gs_code: Option<String>,
    pub status: Option<StationStatus>,
}

impl StationUpdate {
    pub fn status(status: StationStatus) -> Self {
        Self {
            gs_code: None,
            status: Some(status),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeactivationReport {
    pub cancelled_reservations: u64,
    pub deleted_passes: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StationUpdateOutcome {
    pub station: GroundStation,
    /// Present only when the update took the station from ACTIVE to INACTIVE.
    pub deactivation: Option<DeactivationReport>,
}

#[derive(Debug, Clone)]
pub struct StationRegistry {
    store: Store,
}

impl StationRegistry {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn register(&self, station: &NewStation) -> BookingResult<GroundStation> {
        validate_code(&station.gs_code)?;
        if !(-90.0..=90.0).contains(&station.lat) || !(-180.0..=180.0).contains(&station.lon) {
            return Err(BookingError::Validation(
                "lat must be within [-90, 90] and lon within [-180, 180]".into(),
            ));
        }

        let gs_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO ground_stations (gs_code, lon, lat, alt, source, status)
            VALUES (?, ?, ?, ?, 'manual', 'ACTIVE')
            RETURNING gs_id
            "#,
        )
        .bind(&station.gs_code)
        .bind(round_coordinate(station.lon))
        .bind(round_coordinate(station.lat))
        .bind(station.alt)
        .fetch_one(self.store.pool())
        .await
        .map_err(|e| {
            BookingError::conflict_on_unique(
                e,
                format!(
                    "Ground station {} or its coordinates are already registered",
                    station.gs_code
                ),
            )
        })?;

        log::info!("Registered ground station {} ({})", station.gs_code, gs_id);
        self.get(gs_id).await
    }

    pub async fn list(&self) -> BookingResult<Vec<GroundStation>> {
        let query = format!("{STATION_SELECT} ORDER BY gs_id");
        let stations = sqlx::query_as::<_, GroundStation>(&query)
            .fetch_all(self.store.pool())
            .await?;
        Ok(stations)
    }

    pub async fn find(&self, gs_id: i64) -> BookingResult<Option<GroundStation>> {
        let query = format!("{STATION_SELECT} WHERE gs_id = ?");
        let station = sqlx::query_as::<_, GroundStation>(&query)
            .bind(gs_id)
            .fetch_optional(self.store.pool())
            .await?;
        Ok(station)
    }

    pub async fn get(&self, gs_id: i64) -> BookingResult<GroundStation> {
        self.find(gs_id).await?.ok_or_else(|| not_found(gs_id))
    }

    /// Applies a partial update.
    ///
    /// Moving an ACTIVE station to INACTIVE also cancels live reservations on
    /// its unfinished passes and deletes its future unreserved passes, all in
    /// the same transaction as the status change. Reactivation cascades nothing.
    pub async fn update(
        &self,
        gs_id: i64,
        update: &StationUpdate,
        now: DateTime<Utc>,
    ) -> BookingResult<StationUpdateOutcome> {
        if update.gs_code.is_none() && update.status.is_none() {
            return Err(BookingError::Validation("No fields provided to update".into()));
        }
        if let Some(code) = &update.gs_code {
            validate_code(code)?;
        }

        let mut tx = self.store.begin().await?;

        let deactivated = match update.status {
            Some(StationStatus::Inactive) => {
                sqlx::query(
                    "UPDATE ground_stations SET status = 'INACTIVE' WHERE gs_id = ? AND status = 'ACTIVE'",
                )
                .bind(gs_id)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                    == 1
            }
            _ => false,
        };

        let touched = sqlx::query(
            r#"
            UPDATE ground_stations
            SET gs_code = COALESCE(?, gs_code), status = COALESCE(?, status)
            WHERE gs_id = ?
            "#,
        )
        .bind(update.gs_code.as_deref())
        .bind(update.status)
        .bind(gs_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| BookingError::conflict_on_unique(e, "Ground station code already in use"))?
        .rows_affected();
        if touched == 0 {
            return Err(not_found(gs_id));
        }

        let deactivation = if deactivated {
            let cancelled_reservations = ledger::cancel_live_for_station_on(&mut tx, gs_id, now).await?;
            let deleted_passes =
                cache::delete_future_unreserved_for_station_on(&mut tx, gs_id, now).await?;
            Some(DeactivationReport {
                cancelled_reservations,
                deleted_passes,
            })
        } else {
            None
        };

        tx.commit().await?;

        if let Some(report) = &deactivation {
            log::warn!(
                "Deactivated ground station ({}): {} reservations cancelled, {} passes deleted",
                gs_id,
                report.cancelled_reservations,
                report.deleted_passes
            );
        }

        Ok(StationUpdateOutcome {
            station: self.get(gs_id).await?,
            deactivation,
        })
    }

    /// ACTIVE to INACTIVE with its cascade. An already inactive station reports nothing.
    pub async fn deactivate(&self, gs_id: i64, now: DateTime<Utc>) -> BookingResult<DeactivationReport> {
        let outcome = self
            .update(gs_id, &StationUpdate::status(StationStatus::Inactive), now)
            .await?;
        Ok(outcome.deactivation.unwrap_or_default())
    }

    /// Removes the station with its passes and reservations.
    ///
    /// A live reservation blocks the delete unless `force` is set.
    pub async fn delete(&self, gs_id: i64, force: bool) -> BookingResult<DeletionReport> {
        let mut tx = self.store.begin().await?;
        // Take the write lock before reading the guard.
        let exists = sqlx::query("UPDATE ground_stations SET gs_code = gs_code WHERE gs_id = ?")
            .bind(gs_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            == 1;
        if !exists {
            return Err(not_found(gs_id));
        }

        if !force && ledger::has_live_reservation_for_station_on(&mut tx, gs_id).await? {
            return Err(BookingError::Conflict(format!(
                "Ground station ({}) has active reservations; use force to delete",
                gs_id
            )));
        }

        let deleted_reservations = ledger::delete_by_station_on(&mut tx, gs_id).await?;
        let deleted_passes = cache::delete_by_station_on(&mut tx, gs_id).await?;
        sqlx::query("DELETE FROM ground_stations WHERE gs_id = ?")
            .bind(gs_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::warn!(
            "Deleted ground station ({}) with {} reservations and {} passes",
            gs_id,
            deleted_reservations,
            deleted_passes
        );
        Ok(DeletionReport {
            deleted_reservations,
            deleted_passes,
        })
    }
}

fn validate_code(code: &str) -> BookingResult<()> {
    if STATION_CODE.is_match(code) {
        Ok(())
    } else {
        Err(BookingError::Validation(format!(
            "Invalid gs_code {:?}: expected 3-50 upper-case letters, digits or underscores, starting with a letter",
            code
        )))
    }
}

fn round_coordinate(value: f64) -> f64 {
    (value * 1e5).round() / 1e5
}

fn not_found(gs_id: i64) -> BookingError {
    BookingError::NotFound(format!("Ground station ({}) not found", gs_id))
}
