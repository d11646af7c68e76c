use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::registry::{MissionUpdate, NewMission};
use crate::store::{Mission, Satellite};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::api::satellites::SatellitesResponse;
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct MissionsResponse {
    pub missions: Vec<Mission>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MissionSatelliteRequest {
    pub norad_id: u32,
}

#[utoipa::path(
    post,
    path = "/api/missions",
    tag = "missions",
    request_body = NewMission,
    responses(
        (status = 201, description = "Mission created", body = Mission),
        (status = 400, description = "Empty mission name", body = ErrorResponse)
    )
)]
pub async fn create_mission(
    State(state): State<AppState>,
    Json(request): Json<NewMission>,
) -> ApiResult<impl IntoResponse> {
    let mission = state.missions.create(&request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(mission)))
}

#[utoipa::path(
    get,
    path = "/api/missions",
    tag = "missions",
    responses((status = 200, description = "Missions", body = MissionsResponse))
)]
pub async fn list_missions(State(state): State<AppState>) -> ApiResult<Json<MissionsResponse>> {
    let missions = state.missions.list().await?;
    Ok(Json(MissionsResponse { missions }))
}

#[utoipa::path(
    get,
    path = "/api/missions/{mission_id}",
    tag = "missions",
    params(("mission_id" = i64, Path, description = "Mission id")),
    responses(
        (status = 200, description = "Mission", body = Mission),
        (status = 404, description = "Mission not found", body = ErrorResponse)
    )
)]
pub async fn get_mission(
    State(state): State<AppState>,
    Path(mission_id): Path<i64>,
) -> ApiResult<Json<Mission>> {
    Ok(Json(state.missions.get(mission_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/missions/{mission_id}",
    tag = "missions",
    params(("mission_id" = i64, Path, description = "Mission id")),
    request_body = MissionUpdate,
    responses(
        (status = 200, description = "Mission updated", body = Mission),
        (status = 400, description = "Empty update", body = ErrorResponse),
        (status = 404, description = "Mission not found", body = ErrorResponse)
    )
)]
pub async fn update_mission(
    State(state): State<AppState>,
    Path(mission_id): Path<i64>,
    Json(update): Json<MissionUpdate>,
) -> ApiResult<Json<Mission>> {
    Ok(Json(state.missions.update(mission_id, &update).await?))
}

#[utoipa::path(
    delete,
    path = "/api/missions/{mission_id}",
    tag = "missions",
    params(("mission_id" = i64, Path, description = "Mission id")),
    responses(
        (status = 204, description = "Mission deleted; its reservations are kept"),
        (status = 404, description = "Mission not found", body = ErrorResponse)
    )
)]
pub async fn delete_mission(
    State(state): State<AppState>,
    Path(mission_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.missions.delete(mission_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/missions/{mission_id}/satellites",
    tag = "missions",
    params(("mission_id" = i64, Path, description = "Mission id")),
    responses(
        (status = 200, description = "Satellites in the mission", body = SatellitesResponse),
        (status = 404, description = "Mission not found", body = ErrorResponse)
    )
)]
pub async fn list_mission_satellites(
    State(state): State<AppState>,
    Path(mission_id): Path<i64>,
) -> ApiResult<Json<SatellitesResponse>> {
    let satellites: Vec<Satellite> = state.missions.satellites(mission_id).await?;
    Ok(Json(SatellitesResponse { satellites }))
}

#[utoipa::path(
    post,
    path = "/api/missions/{mission_id}/satellites",
    tag = "missions",
    params(("mission_id" = i64, Path, description = "Mission id")),
    request_body = MissionSatelliteRequest,
    responses(
        (status = 201, description = "Satellite added to mission"),
        (status = 404, description = "Mission or satellite not found", body = ErrorResponse),
        (status = 409, description = "Satellite already in mission", body = ErrorResponse)
    )
)]
pub async fn add_mission_satellite(
    State(state): State<AppState>,
    Path(mission_id): Path<i64>,
    Json(request): Json<MissionSatelliteRequest>,
) -> ApiResult<StatusCode> {
    state.missions.add_satellite(mission_id, request.norad_id).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    delete,
    path = "/api/missions/{mission_id}/satellites/{norad_id}",
    tag = "missions",
    params(
        ("mission_id" = i64, Path, description = "Mission id"),
        ("norad_id" = u32, Path, description = "Catalog number")
    ),
    responses(
        (status = 204, description = "Satellite removed from mission"),
        (status = 404, description = "Mission or link not found", body = ErrorResponse)
    )
)]
pub async fn remove_mission_satellite(
    State(state): State<AppState>,
    Path((mission_id, norad_id)): Path<(i64, u32)>,
) -> ApiResult<StatusCode> {
    state.missions.remove_satellite(mission_id, norad_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
