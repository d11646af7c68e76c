mod models;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};

use crate::error::BookingResult;

pub use models::{CommandType, GroundStation, Mission, PredictedPass, Satellite, StationStatus};

/// Schema migrations, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const MAX_CONNECTIONS: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Truncates to whole seconds.
///
/// Timestamps are stored as RFC 3339 text and compared in SQL, so every value
/// written or bound must share one textual shape.
pub fn db_time(t: DateTime<Utc>) -> DateTime<Utc> {
    t.trunc_subsecs(0)
}

/// Handle to the single transactional store every component shares.
///
/// All durable state lives behind this pool. Components never hold their own
/// locks; isolation comes from SQLite transactions and the unique indexes in
/// the schema.
#[derive(Debug, Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Opens (creating if needed) the database file at `db_path` and runs migrations.
    pub async fn open(db_path: impl AsRef<Path>) -> BookingResult<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;
        log::info!("Opened store at {}", db_path.display());

        Ok(Self { pool })
    }

    /// Migrated in-memory database on a single pinned connection.
    pub async fn in_memory() -> BookingResult<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        // The database lives only as long as its connection, so keep exactly one alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn begin(&self) -> BookingResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn migrations_create_all_tables() {
        let store = Store::in_memory().await.unwrap();

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(store.pool())
            .await
            .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get::<String, _>("name")).collect();

        for table in [
            "satellites",
            "ground_stations",
            "predicted_passes",
            "missions",
            "mission_satellites",
            "reservations",
            "command_catalog",
            "reservation_commands",
        ] {
            assert!(names.contains(&table.to_string()), "{} table not found", table);
        }
    }

    #[tokio::test]
    async fn command_catalog_is_seeded() {
        let store = Store::in_memory().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM command_catalog")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert!(count >= 1);
    }

    #[tokio::test]
    async fn open_creates_database_file() {
        let dir = std::env::temp_dir().join(format!("pass-o-mat-store-{}", std::process::id()));
        let path = dir.join("nested").join("passes.db");

        let store = Store::open(&path).await.unwrap();
        assert!(path.exists());

        store.pool().close().await;
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn rolled_back_transaction_leaves_no_rows() {
        let store = Store::in_memory().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        sqlx::query("INSERT INTO satellites (norad_id, s_name) VALUES (25544, 'ISS')")
            .execute(&mut *tx)
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM satellites")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
