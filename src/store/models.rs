use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::elements::TleLines;
use crate::predict::{PassSource, StationLocation};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
    strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StationStatus {
    Active,
    Inactive,
}

/// A registered satellite. Orbital elements are only written by the freshness manager.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Satellite {
    #[serde(skip)]
    pub s_id: i64,
    pub norad_id: u32,
    pub s_name: String,
    pub tle_line1: Option<String>,
    pub tle_line2: Option<String>,
    pub tle_updated_at: Option<DateTime<Utc>>,
}

impl Satellite {
    pub fn elements(&self) -> Option<TleLines> {
        match (&self.tle_line1, &self.tle_line2) {
            (Some(line1), Some(line2)) => Some(TleLines::new(line1.clone(), line2.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct GroundStation {
    pub gs_id: i64,
    pub gs_code: String,
    pub lon: f64,
    pub lat: f64,
    pub alt: f64,
    pub source: String,
    pub status: StationStatus,
}

impl GroundStation {
    pub fn is_active(&self) -> bool {
        self.status == StationStatus::Active
    }

    pub fn location(&self) -> StationLocation {
        StationLocation {
            latitude_deg: self.lat,
            longitude_deg: self.lon,
            altitude_m: self.alt,
        }
    }
}

/// One cached visibility window for a (satellite, station) pair.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
pub struct PredictedPass {
    pub pass_id: i64,
    #[serde(skip)]
    pub s_id: i64,
    pub gs_id: i64,
    pub norad_id: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_elevation: Option<f64>,
    pub duration: Option<i64>,
    pub source: PassSource,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Mission {
    pub mission_id: i64,
    pub mission_name: String,
    pub owner: Option<String>,
    pub priority: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CommandType {
    pub command_type: String,
    pub description: String,
}
