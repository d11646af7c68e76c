use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{BookingError, BookingResult};
use crate::registry::SatelliteRegistry;
use crate::store::{db_time, Mission, Satellite, Store};

const MISSION_SELECT: &str =
    "SELECT mission_id, mission_name, owner, priority, created_at FROM missions";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewMission {
    pub mission_name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl NewMission {
    pub fn named(mission_name: &str) -> Self {
        Self {
            mission_name: mission_name.to_string(),
            owner: None,
            priority: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct MissionUpdate {
    pub mission_name: Option<String>,
    pub owner: Option<String>,
    pub priority: Option<String>,
}

/// Missions and the satellites explicitly associated with them.
#[derive(Debug, Clone)]
pub struct MissionRegistry {
    store: Store,
    satellites: SatelliteRegistry,
}

impl MissionRegistry {
    pub fn new(store: Store) -> Self {
        Self {
            satellites: SatelliteRegistry::new(store.clone()),
            store,
        }
    }

    pub async fn create(&self, mission: &NewMission, now: DateTime<Utc>) -> BookingResult<Mission> {
        let name = mission.mission_name.trim();
        if name.is_empty() {
            return Err(BookingError::Validation("mission_name must not be empty".into()));
        }

        let mission_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO missions (mission_name, owner, priority, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING mission_id
            "#,
        )
        .bind(name)
        .bind(mission.owner.as_deref())
        .bind(mission.priority.as_deref())
        .bind(db_time(now))
        .fetch_one(self.store.pool())
        .await?;

        log::info!("Created mission ({}) {}", mission_id, name);
        self.get(mission_id).await
    }

    pub async fn list(&self) -> BookingResult<Vec<Mission>> {
        let query = format!("{MISSION_SELECT} ORDER BY mission_id");
        let missions = sqlx::query_as::<_, Mission>(&query)
            .fetch_all(self.store.pool())
            .await?;
        Ok(missions)
    }

    pub async fn get(&self, mission_id: i64) -> BookingResult<Mission> {
        let query = format!("{MISSION_SELECT} WHERE mission_id = ?");
        sqlx::query_as::<_, Mission>(&query)
            .bind(mission_id)
            .fetch_optional(self.store.pool())
            .await?
            .ok_or_else(|| not_found(mission_id))
    }

    pub async fn update(&self, mission_id: i64, update: &MissionUpdate) -> BookingResult<Mission> {
        if update.mission_name.is_none() && update.owner.is_none() && update.priority.is_none() {
            return Err(BookingError::Validation("No fields provided to update".into()));
        }
        if update.mission_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(BookingError::Validation("mission_name must not be empty".into()));
        }

        let result = sqlx::query(
            r#"
            UPDATE missions
            SET mission_name = COALESCE(?, mission_name),
                owner = COALESCE(?, owner),
                priority = COALESCE(?, priority)
            WHERE mission_id = ?
            "#,
        )
        .bind(update.mission_name.as_deref().map(str::trim))
        .bind(update.owner.as_deref())
        .bind(update.priority.as_deref())
        .bind(mission_id)
        .execute(self.store.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(mission_id));
        }
        self.get(mission_id).await
    }

    /// Deletes the mission. Its reservations survive with the mission cleared.
    pub async fn delete(&self, mission_id: i64) -> BookingResult<()> {
        let result = sqlx::query("DELETE FROM missions WHERE mission_id = ?")
            .bind(mission_id)
            .execute(self.store.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(mission_id));
        }
        log::info!("Deleted mission ({})", mission_id);
        Ok(())
    }

    pub async fn add_satellite(&self, mission_id: i64, norad_id: u32) -> BookingResult<()> {
        self.get(mission_id).await?;
        let satellite = self.satellites.get(norad_id).await?;

        sqlx::query("INSERT INTO mission_satellites (mission_id, s_id) VALUES (?, ?)")
            .bind(mission_id)
            .bind(satellite.s_id)
            .execute(self.store.pool())
            .await
            .map_err(|e| {
                BookingError::conflict_on_unique(
                    e,
                    format!("Satellite ({}) is already in mission ({})", norad_id, mission_id),
                )
            })?;
        Ok(())
    }

    pub async fn satellites(&self, mission_id: i64) -> BookingResult<Vec<Satellite>> {
        self.get(mission_id).await?;
        let satellites = sqlx::query_as::<_, Satellite>(
            r#"
            SELECT s.s_id, s.norad_id, s.s_name, s.tle_line1, s.tle_line2, s.tle_updated_at
            FROM satellites s
            JOIN mission_satellites ms ON ms.s_id = s.s_id
            WHERE ms.mission_id = ?
            ORDER BY s.norad_id
            "#,
        )
        .bind(mission_id)
        .fetch_all(self.store.pool())
        .await?;
        Ok(satellites)
    }

    pub async fn remove_satellite(&self, mission_id: i64, norad_id: u32) -> BookingResult<()> {
        self.get(mission_id).await?;
        let satellite = self.satellites.get(norad_id).await?;

        let result = sqlx::query("DELETE FROM mission_satellites WHERE mission_id = ? AND s_id = ?")
            .bind(mission_id)
            .bind(satellite.s_id)
            .execute(self.store.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(BookingError::NotFound(format!(
                "Satellite ({}) is not in mission ({})",
                norad_id, mission_id
            )));
        }
        Ok(())
    }
}

fn not_found(mission_id: i64) -> BookingError {
    BookingError::NotFound(format!("Mission ({}) not found", mission_id))
}
