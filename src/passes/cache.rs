use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::BookingResult;
use crate::predict::{PassSource, PredictedWindow};
use crate::store::{db_time, PredictedPass, Store};

const PASS_SELECT: &str = r#"
    SELECT p.pass_id, p.s_id, p.gs_id, s.norad_id, p.start_time, p.end_time,
           p.max_elevation, p.duration, p.source
    FROM predicted_passes p
    JOIN satellites s ON s.s_id = p.s_id
"#;

/// Authoritative store of predicted windows.
#[derive(Debug, Clone)]
pub struct PassCache {
    store: Store,
}

impl PassCache {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Inserts the window if its (satellite, station, start, end) tuple is new.
    ///
    /// Returns the new pass id, or `None` when the window was already cached.
    pub async fn upsert_pass(
        &self,
        s_id: i64,
        gs_id: i64,
        window: &PredictedWindow,
        source: PassSource,
    ) -> BookingResult<Option<i64>> {
        let mut conn = self.store.pool().acquire().await?;
        upsert_pass_on(&mut conn, s_id, gs_id, window, source).await
    }

    /// Upserts every window in one transaction and returns the ids of the new rows.
    pub async fn merge(
        &self,
        s_id: i64,
        gs_id: i64,
        windows: &[PredictedWindow],
        source: PassSource,
    ) -> BookingResult<Vec<i64>> {
        let mut tx = self.store.begin().await?;
        let mut inserted = Vec::new();
        for window in windows {
            if let Some(id) = upsert_pass_on(&mut tx, s_id, gs_id, window, source).await? {
                inserted.push(id);
            }
        }
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn get_pass(&self, pass_id: i64) -> BookingResult<Option<PredictedPass>> {
        let query = format!("{PASS_SELECT} WHERE p.pass_id = ?");
        let pass = sqlx::query_as::<_, PredictedPass>(&query)
            .bind(pass_id)
            .fetch_optional(self.store.pool())
            .await?;
        Ok(pass)
    }

    /// End of the furthest-future cached window for the pair.
    pub async fn latest_window_end(
        &self,
        s_id: i64,
        gs_id: i64,
    ) -> BookingResult<Option<DateTime<Utc>>> {
        let end = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT end_time FROM predicted_passes
            WHERE s_id = ? AND gs_id = ?
            ORDER BY end_time DESC
            LIMIT 1
            "#,
        )
        .bind(s_id)
        .bind(gs_id)
        .fetch_optional(self.store.pool())
        .await?;
        Ok(end)
    }

    /// Future windows with no live reservation, earliest first.
    pub async fn claimable_passes(
        &self,
        s_id: i64,
        gs_id: i64,
        now: DateTime<Utc>,
    ) -> BookingResult<Vec<PredictedPass>> {
        let query = format!(
            r#"{PASS_SELECT}
            WHERE p.s_id = ? AND p.gs_id = ? AND p.start_time > ?
              AND NOT EXISTS (
                  SELECT 1 FROM reservations r
                  WHERE r.pass_id = p.pass_id AND r.cancelled_at IS NULL
              )
            ORDER BY p.start_time ASC"#
        );
        let passes = sqlx::query_as::<_, PredictedPass>(&query)
            .bind(s_id)
            .bind(gs_id)
            .bind(db_time(now))
            .fetch_all(self.store.pool())
            .await?;
        Ok(passes)
    }

    /// Deletes ended windows that no reservation (live or cancelled) points at.
    pub async fn purge_expired_unreserved(&self, now: DateTime<Utc>) -> BookingResult<u64> {
        let mut conn = self.store.pool().acquire().await?;
        purge_expired_unreserved_on(&mut conn, now).await
    }

    pub async fn delete_by_station(&self, gs_id: i64) -> BookingResult<u64> {
        let mut conn = self.store.pool().acquire().await?;
        delete_by_station_on(&mut conn, gs_id).await
    }

    pub async fn delete_by_satellite(&self, s_id: i64) -> BookingResult<u64> {
        let mut conn = self.store.pool().acquire().await?;
        delete_by_satellite_on(&mut conn, s_id).await
    }
}

pub(crate) async fn upsert_pass_on(
    conn: &mut SqliteConnection,
    s_id: i64,
    gs_id: i64,
    window: &PredictedWindow,
    source: PassSource,
) -> BookingResult<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO predicted_passes
            (s_id, gs_id, start_time, end_time, max_elevation, duration, source)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (s_id, gs_id, start_time, end_time) DO NOTHING
        RETURNING pass_id
        "#,
    )
    .bind(s_id)
    .bind(gs_id)
    .bind(db_time(window.start))
    .bind(db_time(window.end))
    .bind(window.max_elevation_deg)
    .bind(window.duration_seconds)
    .bind(source)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(id)
}

pub(crate) async fn purge_expired_unreserved_on(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> BookingResult<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM predicted_passes
        WHERE end_time < ?
          AND NOT EXISTS (
              SELECT 1 FROM reservations r WHERE r.pass_id = predicted_passes.pass_id
          )
        "#,
    )
    .bind(db_time(now))
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Future windows of a station that no reservation (live or cancelled) points at.
pub(crate) async fn delete_future_unreserved_for_station_on(
    conn: &mut SqliteConnection,
    gs_id: i64,
    now: DateTime<Utc>,
) -> BookingResult<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM predicted_passes
        WHERE gs_id = ? AND start_time > ?
          AND NOT EXISTS (
              SELECT 1 FROM reservations r WHERE r.pass_id = predicted_passes.pass_id
          )
        "#,
    )
    .bind(gs_id)
    .bind(db_time(now))
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Callers remove the reservations pointing at these passes first.
pub(crate) async fn delete_by_station_on(
    conn: &mut SqliteConnection,
    gs_id: i64,
) -> BookingResult<u64> {
    let result = sqlx::query("DELETE FROM predicted_passes WHERE gs_id = ?")
        .bind(gs_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Callers remove the reservations pointing at these passes first.
pub(crate) async fn delete_by_satellite_on(
    conn: &mut SqliteConnection,
    s_id: i64,
) -> BookingResult<u64> {
    let result = sqlx::query("DELETE FROM predicted_passes WHERE s_id = ?")
        .bind(s_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
