use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Display status of a reservation, derived from wall-clock time on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Cancelled,
    Reserved,
    Active,
    Complete,
}

/// Windows are half-open: a pass is `Active` from its start up to, but not
/// including, its end.
pub fn status_of(
    cancelled_at: Option<DateTime<Utc>>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ReservationStatus {
    if cancelled_at.is_some() {
        ReservationStatus::Cancelled
    } else if now < start {
        ReservationStatus::Reserved
    } else if now < end {
        ReservationStatus::Active
    } else {
        ReservationStatus::Complete
    }
}
