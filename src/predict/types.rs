use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::elements::TleLines;
use crate::predict::StationLocation;

/// Which predictor produced a cached window.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type,
    strum_macros::Display,
)]
pub enum PassSource {
    #[serde(rename = "SGP4")]
    #[sqlx(rename = "SGP4")]
    #[strum(serialize = "SGP4")]
    Sgp4,
    #[serde(rename = "N2YO")]
    #[sqlx(rename = "N2YO")]
    #[strum(serialize = "N2YO")]
    N2yo,
}

/// A predicted visibility window, before it is cached.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub duration_seconds: i64,
}

impl PredictedWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, max_elevation_deg: f64) -> Self {
        Self {
            start,
            end,
            max_elevation_deg,
            duration_seconds: (end - start).num_seconds(),
        }
    }
}

/// Everything a predictor may need for one (satellite, station) pair.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub norad_id: u32,
    pub satellite_name: String,
    pub elements: Option<TleLines>,
    pub station: StationLocation,
    pub start: DateTime<Utc>,
    pub look_ahead: Duration,
}
