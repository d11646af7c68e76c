mod missions;
mod satellites;
mod stations;

use serde::Serialize;
use utoipa::ToSchema;

pub use missions::{MissionRegistry, MissionUpdate, NewMission};
pub use satellites::{NewSatellite, SatelliteRegistry, SatelliteUpdate};
pub use stations::{
    DeactivationReport, NewStation, StationRegistry, StationUpdate, StationUpdateOutcome,
};

/// What a cascading delete removed along with its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeletionReport {
    pub deleted_reservations: u64,
    pub deleted_passes: u64,
}
