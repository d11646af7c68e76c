use utoipa::OpenApi;

use super::api::commands::CommandsResponse;
use super::api::error::ErrorResponse;
use super::api::missions::{MissionSatelliteRequest, MissionsResponse};
use super::api::reservations::ReservationsResponse;
use super::api::satellites::SatellitesResponse;
use super::api::stations::StationsResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::passes::list_passes,
        super::api::reservations::create_reservation,
        super::api::reservations::list_reservations,
        super::api::reservations::get_reservation,
        super::api::reservations::cancel_reservation,
        super::api::reservations::list_mission_reservations,
        super::api::satellites::register_satellite,
        super::api::satellites::list_satellites,
        super::api::satellites::get_satellite,
        super::api::satellites::update_satellite,
        super::api::satellites::delete_satellite,
        super::api::stations::register_station,
        super::api::stations::list_stations,
        super::api::stations::get_station,
        super::api::stations::update_station,
        super::api::stations::delete_station,
        super::api::missions::create_mission,
        super::api::missions::list_missions,
        super::api::missions::get_mission,
        super::api::missions::update_mission,
        super::api::missions::delete_mission,
        super::api::missions::list_mission_satellites,
        super::api::missions::add_mission_satellite,
        super::api::missions::remove_mission_satellite,
        super::api::commands::list_commands,
    ),
    components(
        schemas(
            ErrorResponse,
            CommandsResponse,
            MissionsResponse,
            MissionSatelliteRequest,
            ReservationsResponse,
            SatellitesResponse,
            StationsResponse,
            crate::error::ErrorKind,
            crate::passes::PassListing,
            crate::passes::RefreshReport,
            crate::predict::PassSource,
            crate::registry::DeactivationReport,
            crate::registry::DeletionReport,
            crate::registry::MissionUpdate,
            crate::registry::NewMission,
            crate::registry::NewSatellite,
            crate::registry::NewStation,
            crate::registry::SatelliteUpdate,
            crate::registry::StationUpdate,
            crate::registry::StationUpdateOutcome,
            crate::reservations::NewReservation,
            crate::reservations::ReservationDetails,
            crate::reservations::ReservationStatus,
            crate::store::CommandType,
            crate::store::GroundStation,
            crate::store::Mission,
            crate::store::PredictedPass,
            crate::store::Satellite,
            crate::store::StationStatus,
        )
    ),
    info(
        title = "Pass-O-Mat Booking API",
        description = "API for predicting and reserving ground station passes",
        version = "0.1.0"
    ),
    tags(
        (name = "passes", description = "Claimable pass listings"),
        (name = "reservations", description = "Pass reservations"),
        (name = "satellites", description = "Satellite registry"),
        (name = "groundstations", description = "Ground station registry"),
        (name = "missions", description = "Missions and their satellites"),
        (name = "commands", description = "Command catalog")
    )
)]
pub struct ApiDoc;
