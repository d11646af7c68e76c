use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::registry::{DeletionReport, NewStation, StationUpdate, StationUpdateOutcome};
use crate::store::GroundStation;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::api::satellites::DeleteQuery;
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct StationsResponse {
    pub ground_stations: Vec<GroundStation>,
}

#[utoipa::path(
    post,
    path = "/api/groundstations",
    tag = "groundstations",
    request_body = NewStation,
    responses(
        (status = 201, description = "Ground station registered", body = GroundStation),
        (status = 400, description = "Invalid code or coordinates", body = ErrorResponse),
        (status = 409, description = "Code or coordinates already registered", body = ErrorResponse)
    )
)]
pub async fn register_station(
    State(state): State<AppState>,
    Json(request): Json<NewStation>,
) -> ApiResult<impl IntoResponse> {
    let station = state.stations.register(&request).await?;
    Ok((StatusCode::CREATED, Json(station)))
}

#[utoipa::path(
    get,
    path = "/api/groundstations",
    tag = "groundstations",
    responses((status = 200, description = "Registered ground stations", body = StationsResponse))
)]
pub async fn list_stations(State(state): State<AppState>) -> ApiResult<Json<StationsResponse>> {
    let ground_stations = state.stations.list().await?;
    Ok(Json(StationsResponse { ground_stations }))
}

#[utoipa::path(
    get,
    path = "/api/groundstations/{gs_id}",
    tag = "groundstations",
    params(("gs_id" = i64, Path, description = "Ground station id")),
    responses(
        (status = 200, description = "Ground station", body = GroundStation),
        (status = 404, description = "Ground station not found", body = ErrorResponse)
    )
)]
pub async fn get_station(
    State(state): State<AppState>,
    Path(gs_id): Path<i64>,
) -> ApiResult<Json<GroundStation>> {
    Ok(Json(state.stations.get(gs_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/groundstations/{gs_id}",
    tag = "groundstations",
    params(("gs_id" = i64, Path, description = "Ground station id")),
    request_body = StationUpdate,
    responses(
        (status = 200, description = "Ground station updated; deactivation reports its cascade", body = StationUpdateOutcome),
        (status = 400, description = "Empty update or invalid code", body = ErrorResponse),
        (status = 404, description = "Ground station not found", body = ErrorResponse),
        (status = 409, description = "Code already in use", body = ErrorResponse),
        (status = 422, description = "Field cannot be updated")
    )
)]
pub async fn update_station(
    State(state): State<AppState>,
    Path(gs_id): Path<i64>,
    Json(update): Json<StationUpdate>,
) -> ApiResult<Json<StationUpdateOutcome>> {
    Ok(Json(state.stations.update(gs_id, &update, Utc::now()).await?))
}

#[utoipa::path(
    delete,
    path = "/api/groundstations/{gs_id}",
    tag = "groundstations",
    params(("gs_id" = i64, Path, description = "Ground station id"), DeleteQuery),
    responses(
        (status = 200, description = "Ground station and its passes and reservations deleted", body = DeletionReport),
        (status = 404, description = "Ground station not found", body = ErrorResponse),
        (status = 409, description = "Live reservations exist", body = ErrorResponse)
    )
)]
pub async fn delete_station(
    State(state): State<AppState>,
    Path(gs_id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let report = state.stations.delete(gs_id, query.force).await?;
    let warning = format!(
        "199 - \"Deleted ground station {} with {} reservations and {} passes\"",
        gs_id, report.deleted_reservations, report.deleted_passes
    );
    Ok(([(header::WARNING, warning)], Json(report)))
}
