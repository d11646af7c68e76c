use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::registry::{DeletionReport, NewSatellite, SatelliteUpdate};
use crate::store::Satellite;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SatellitesResponse {
    pub satellites: Vec<Satellite>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// Delete even if live reservations exist
    #[serde(default)]
    pub force: bool,
}

#[utoipa::path(
    post,
    path = "/api/satellites",
    tag = "satellites",
    request_body = NewSatellite,
    responses(
        (status = 201, description = "Satellite registered", body = Satellite),
        (status = 400, description = "Invalid catalog number or name", body = ErrorResponse),
        (status = 409, description = "Catalog number already registered", body = ErrorResponse)
    )
)]
pub async fn register_satellite(
    State(state): State<AppState>,
    Json(request): Json<NewSatellite>,
) -> ApiResult<impl IntoResponse> {
    let satellite = state
        .satellites
        .register(request.norad_id, &request.s_name)
        .await?;
    Ok((StatusCode::CREATED, Json(satellite)))
}

#[utoipa::path(
    get,
    path = "/api/satellites",
    tag = "satellites",
    responses((status = 200, description = "Registered satellites", body = SatellitesResponse))
)]
pub async fn list_satellites(State(state): State<AppState>) -> ApiResult<Json<SatellitesResponse>> {
    let satellites = state.satellites.list().await?;
    Ok(Json(SatellitesResponse { satellites }))
}

#[utoipa::path(
    get,
    path = "/api/satellites/{norad_id}",
    tag = "satellites",
    params(("norad_id" = u32, Path, description = "Catalog number")),
    responses(
        (status = 200, description = "Satellite", body = Satellite),
        (status = 404, description = "Satellite not found", body = ErrorResponse)
    )
)]
pub async fn get_satellite(
    State(state): State<AppState>,
    Path(norad_id): Path<u32>,
) -> ApiResult<Json<Satellite>> {
    Ok(Json(state.satellites.get(norad_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/satellites/{norad_id}",
    tag = "satellites",
    params(("norad_id" = u32, Path, description = "Catalog number")),
    request_body = SatelliteUpdate,
    responses(
        (status = 200, description = "Satellite updated", body = Satellite),
        (status = 400, description = "Empty update", body = ErrorResponse),
        (status = 404, description = "Satellite not found", body = ErrorResponse),
        (status = 422, description = "Field cannot be updated")
    )
)]
pub async fn update_satellite(
    State(state): State<AppState>,
    Path(norad_id): Path<u32>,
    Json(update): Json<SatelliteUpdate>,
) -> ApiResult<Json<Satellite>> {
    Ok(Json(state.satellites.update(norad_id, &update).await?))
}

#[utoipa::path(
    delete,
    path = "/api/satellites/{norad_id}",
    tag = "satellites",
    params(("norad_id" = u32, Path, description = "Catalog number"), DeleteQuery),
    responses(
        (status = 200, description = "Satellite and its passes and reservations deleted", body = DeletionReport),
        (status = 404, description = "Satellite not found", body = ErrorResponse),
        (status = 409, description = "Live reservations exist", body = ErrorResponse)
    )
)]
pub async fn delete_satellite(
    State(state): State<AppState>,
    Path(norad_id): Path<u32>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<impl IntoResponse> {
    let report = state.satellites.delete(norad_id, query.force).await?;
    let warning = format!(
        "199 - \"Deleted satellite {} with {} reservations and {} passes\"",
        norad_id, report.deleted_reservations, report.deleted_passes
    );
    Ok(([(header::WARNING, warning)], Json(report)))
}
