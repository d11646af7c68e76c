use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};
use utoipa::ToSchema;

use crate::error::{BookingError, BookingResult};
use crate::passes::cache::purge_expired_unreserved_on;
use crate::reservations::catalog::CommandCatalog;
use crate::reservations::status::{status_of, ReservationStatus};
use crate::store::{db_time, StationStatus, Store};

const RESERVATION_SELECT: &str = r#"
    SELECT r.r_id, r.mission_id, r.pass_id, r.gs_id, s.norad_id,
           p.start_time, p.end_time, r.created_at, r.cancelled_at
    FROM reservations r
    JOIN predicted_passes p ON p.pass_id = r.pass_id
    JOIN satellites s ON s.s_id = r.s_id
"#;

/// Reservation ids bound per command lookup, well under SQLite's variable limit.
const COMMAND_LOOKUP_CHUNK: usize = 500;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewReservation {
    pub pass_id: i64,
    #[serde(default)]
    pub mission_id: Option<i64>,
    #[serde(default)]
    pub commands: Vec<String>,
}

/// A reservation together with its pass timing, commands and derived status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReservationDetails {
    pub r_id: i64,
    pub mission_id: Option<i64>,
    pub pass_id: i64,
    pub gs_id: i64,
    pub norad_id: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub commands: Vec<String>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CleanupReport {
    pub purged_reservations: u64,
    pub purged_passes: u64,
}

#[derive(Debug, FromRow)]
struct ReservationRow {
    r_id: i64,
    mission_id: Option<i64>,
    pass_id: i64,
    gs_id: i64,
    norad_id: u32,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl ReservationRow {
    fn into_details(self, commands: Vec<String>, now: DateTime<Utc>) -> ReservationDetails {
        ReservationDetails {
            status: status_of(self.cancelled_at, self.start_time, self.end_time, now),
            r_id: self.r_id,
            mission_id: self.mission_id,
            pass_id: self.pass_id,
            gs_id: self.gs_id,
            norad_id: self.norad_id,
            start_time: self.start_time,
            end_time: self.end_time,
            commands,
            created_at: self.created_at,
            cancelled_at: self.cancelled_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PassTarget {
    s_id: i64,
    norad_id: u32,
    start_time: DateTime<Utc>,
    status: StationStatus,
}

/// Binds passes to at most one live reservation each.
#[derive(Clone)]
pub struct ReservationLedger {
    store: Store,
    catalog: Arc<dyn CommandCatalog>,
    claim_grace: Duration,
}

impl ReservationLedger {
    pub fn new(store: Store, catalog: Arc<dyn CommandCatalog>, claim_grace: Duration) -> Self {
        Self {
            store,
            catalog,
            claim_grace,
        }
    }

    /// Reserves a pass.
    ///
    /// Every precondition is checked before anything is written; the first
    /// failing one decides the error. The reservation row and its command rows
    /// are then committed together.
    pub async fn create_reservation(
        &self,
        request: &NewReservation,
        now: DateTime<Utc>,
    ) -> BookingResult<ReservationDetails> {
        let pass_id = request.pass_id;

        let target = sqlx::query_as::<_, PassTarget>(
            r#"
            SELECT p.s_id, s.norad_id, p.start_time, g.status
            FROM predicted_passes p
            JOIN satellites s ON s.s_id = p.s_id
            JOIN ground_stations g ON g.gs_id = p.gs_id
            WHERE p.pass_id = ?
            "#,
        )
        .bind(pass_id)
        .fetch_optional(self.store.pool())
        .await?
        .ok_or_else(|| BookingError::NotFound(format!("Pass ({}) not found", pass_id)))?;

        if self.has_live_reservation(pass_id).await? {
            return Err(already_reserved(pass_id));
        }

        if target.start_time + self.claim_grace <= now {
            return Err(BookingError::Validation(format!(
                "Pass ({}) is no longer claimable",
                pass_id
            )));
        }

        if target.status != StationStatus::Active {
            return Err(BookingError::Conflict("Ground station is inactive".into()));
        }

        if let Some(mission_id) = request.mission_id {
            self.check_mission(mission_id, target.s_id, target.norad_id).await?;
        }

        if !request.commands.is_empty() {
            self.check_commands(&request.commands).await?;
        }

        let mut tx = self.store.begin().await?;

        // The insert comes first so the transaction takes the write lock up front.
        let r_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO reservations (mission_id, pass_id, gs_id, s_id, created_at)
            SELECT ?, p.pass_id, p.gs_id, p.s_id, ?
            FROM predicted_passes p
            JOIN ground_stations g ON g.gs_id = p.gs_id
            WHERE p.pass_id = ? AND g.status = 'ACTIVE'
            RETURNING r_id
            "#,
        )
        .bind(request.mission_id)
        .bind(db_time(now))
        .bind(pass_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| BookingError::conflict_on_unique(e, already_reserved(pass_id).to_string()))?
        .ok_or_else(|| BookingError::Conflict("Ground station is inactive".into()))?;

        for command in &request.commands {
            sqlx::query("INSERT INTO reservation_commands (r_id, command_type) VALUES (?, ?)")
                .bind(r_id)
                .bind(command)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        log::info!("Reserved pass ({}) as reservation ({})", pass_id, r_id);

        self.get_reservation(r_id, now).await
    }

    async fn check_mission(&self, mission_id: i64, s_id: i64, norad_id: u32) -> BookingResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM missions WHERE mission_id = ?)",
        )
        .bind(mission_id)
        .fetch_one(self.store.pool())
        .await?;
        if !exists {
            return Err(BookingError::NotFound(format!(
                "Mission ({}) not found",
                mission_id
            )));
        }

        let linked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM mission_satellites WHERE mission_id = ? AND s_id = ?)",
        )
        .bind(mission_id)
        .bind(s_id)
        .fetch_one(self.store.pool())
        .await?;
        if !linked {
            return Err(BookingError::NotFound(format!(
                "Satellite ({}) not found in mission. Add satellite to mission first",
                norad_id
            )));
        }
        Ok(())
    }

    async fn check_commands(&self, commands: &[String]) -> BookingResult<()> {
        let allowed = self.catalog.allowed_command_types().await?;
        let invalid: Vec<&str> = commands
            .iter()
            .filter(|c| !allowed.contains(c.as_str()))
            .map(String::as_str)
            .collect();
        if !invalid.is_empty() {
            return Err(BookingError::Validation(format!(
                "Invalid command(s): {}",
                invalid.join(", ")
            )));
        }

        let unique: HashSet<&String> = commands.iter().collect();
        if unique.len() != commands.len() {
            return Err(BookingError::Validation(
                "Duplicate commands are not allowed".into(),
            ));
        }
        Ok(())
    }

    /// Marks the reservation cancelled. Cancelling twice keeps the first timestamp.
    pub async fn cancel_reservation(&self, r_id: i64, now: DateTime<Utc>) -> BookingResult<()> {
        let result = sqlx::query(
            "UPDATE reservations SET cancelled_at = COALESCE(cancelled_at, ?) WHERE r_id = ?",
        )
        .bind(db_time(now))
        .bind(r_id)
        .execute(self.store.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound(format!(
                "Reservation ({}) not found",
                r_id
            )));
        }
        log::info!("Cancelled reservation ({})", r_id);
        Ok(())
    }

    pub async fn get_reservation(
        &self,
        r_id: i64,
        now: DateTime<Utc>,
    ) -> BookingResult<ReservationDetails> {
        let query = format!("{RESERVATION_SELECT} WHERE r.r_id = ?");
        let row = sqlx::query_as::<_, ReservationRow>(&query)
            .bind(r_id)
            .fetch_optional(self.store.pool())
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Reservation ({}) not found", r_id)))?;

        let commands = sqlx::query_scalar::<_, String>(
            "SELECT command_type FROM reservation_commands WHERE r_id = ? ORDER BY rowid",
        )
        .bind(r_id)
        .fetch_all(self.store.pool())
        .await?;

        Ok(row.into_details(commands, now))
    }

    pub async fn list_reservations(
        &self,
        include_cancelled: bool,
        now: DateTime<Utc>,
    ) -> BookingResult<Vec<ReservationDetails>> {
        let query = format!(
            "{RESERVATION_SELECT} WHERE (? OR r.cancelled_at IS NULL) ORDER BY p.start_time, r.r_id"
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&query)
            .bind(include_cancelled)
            .fetch_all(self.store.pool())
            .await?;
        self.attach_commands(rows, now).await
    }

    pub async fn list_mission_reservations(
        &self,
        mission_id: i64,
        include_cancelled: bool,
        now: DateTime<Utc>,
    ) -> BookingResult<Vec<ReservationDetails>> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM missions WHERE mission_id = ?)",
        )
        .bind(mission_id)
        .fetch_one(self.store.pool())
        .await?;
        if !exists {
            return Err(BookingError::NotFound(format!(
                "Mission ({}) not found",
                mission_id
            )));
        }

        let query = format!(
            r#"{RESERVATION_SELECT}
            WHERE r.mission_id = ? AND (? OR r.cancelled_at IS NULL)
            ORDER BY p.start_time, r.r_id"#
        );
        let rows = sqlx::query_as::<_, ReservationRow>(&query)
            .bind(mission_id)
            .bind(include_cancelled)
            .fetch_all(self.store.pool())
            .await?;
        self.attach_commands(rows, now).await
    }

    async fn attach_commands(
        &self,
        rows: Vec<ReservationRow>,
        now: DateTime<Utc>,
    ) -> BookingResult<Vec<ReservationDetails>> {
        let mut by_reservation: HashMap<i64, Vec<String>> = HashMap::new();
        let ids: Vec<i64> = rows.iter().map(|row| row.r_id).collect();

        for chunk in ids.chunks(COMMAND_LOOKUP_CHUNK) {
            let mut query = QueryBuilder::<Sqlite>::new(
                "SELECT r_id, command_type FROM reservation_commands WHERE r_id IN (",
            );
            let mut bound = query.separated(", ");
            for r_id in chunk {
                bound.push_bind(*r_id);
            }
            bound.push_unseparated(") ORDER BY r_id, rowid");

            let pairs = query
                .build_query_as::<(i64, String)>()
                .fetch_all(self.store.pool())
                .await?;
            for (r_id, command) in pairs {
                by_reservation.entry(r_id).or_default().push(command);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let commands = by_reservation.remove(&row.r_id).unwrap_or_default();
                row.into_details(commands, now)
            })
            .collect())
    }

    pub async fn has_live_reservation(&self, pass_id: i64) -> BookingResult<bool> {
        let live = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM reservations WHERE pass_id = ? AND cancelled_at IS NULL)",
        )
        .bind(pass_id)
        .fetch_one(self.store.pool())
        .await?;
        Ok(live)
    }

    pub async fn has_live_reservation_for_station(&self, gs_id: i64) -> BookingResult<bool> {
        let mut conn = self.store.pool().acquire().await?;
        has_live_reservation_for_station_on(&mut conn, gs_id).await
    }

    pub async fn has_live_reservation_for_satellite(&self, s_id: i64) -> BookingResult<bool> {
        let mut conn = self.store.pool().acquire().await?;
        has_live_reservation_for_satellite_on(&mut conn, s_id).await
    }

    /// Scheduled cleanup.
    ///
    /// Cancelled reservations whose pass has ended go first, then every ended
    /// pass left without a reservation, in one transaction.
    pub async fn purge_cancelled_expired(&self, now: DateTime<Utc>) -> BookingResult<CleanupReport> {
        let mut tx = self.store.begin().await?;

        let purged_reservations = sqlx::query(
            r#"
            DELETE FROM reservations
            WHERE cancelled_at IS NOT NULL
              AND pass_id IN (SELECT pass_id FROM predicted_passes WHERE end_time < ?)
            "#,
        )
        .bind(db_time(now))
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let purged_passes = purge_expired_unreserved_on(&mut tx, now).await?;
        tx.commit().await?;

        log::info!(
            "Purged {} cancelled reservations and {} expired passes",
            purged_reservations,
            purged_passes
        );
        Ok(CleanupReport {
            purged_reservations,
            purged_passes,
        })
    }
}

fn already_reserved(pass_id: i64) -> BookingError {
    BookingError::Conflict(format!("Pass ({}) is already reserved", pass_id))
}

pub(crate) async fn has_live_reservation_for_station_on(
    conn: &mut SqliteConnection,
    gs_id: i64,
) -> BookingResult<bool> {
    let live = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM reservations WHERE gs_id = ? AND cancelled_at IS NULL)",
    )
    .bind(gs_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(live)
}

pub(crate) async fn has_live_reservation_for_satellite_on(
    conn: &mut SqliteConnection,
    s_id: i64,
) -> BookingResult<bool> {
    let live = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM reservations WHERE s_id = ? AND cancelled_at IS NULL)",
    )
    .bind(s_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(live)
}

/// Cancels live reservations on the station's passes that have not ended yet.
pub(crate) async fn cancel_live_for_station_on(
    conn: &mut SqliteConnection,
    gs_id: i64,
    now: DateTime<Utc>,
) -> BookingResult<u64> {
    let now = db_time(now);
    let result = sqlx::query(
        r#"
        UPDATE reservations
        SET cancelled_at = ?
        WHERE cancelled_at IS NULL
          AND pass_id IN (
              SELECT pass_id FROM predicted_passes WHERE gs_id = ? AND end_time > ?
          )
        "#,
    )
    .bind(now)
    .bind(gs_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Deletes every reservation on the station; command rows go with them.
pub(crate) async fn delete_by_station_on(
    conn: &mut SqliteConnection,
    gs_id: i64,
) -> BookingResult<u64> {
    let result = sqlx::query("DELETE FROM reservations WHERE gs_id = ?")
        .bind(gs_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Deletes every reservation on the satellite; command rows go with them.
pub(crate) async fn delete_by_satellite_on(
    conn: &mut SqliteConnection,
    s_id: i64,
) -> BookingResult<u64> {
    let result = sqlx::query("DELETE FROM reservations WHERE s_id = ?")
        .bind(s_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
