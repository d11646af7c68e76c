use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::passes::PassListing;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PassesQuery {
    /// Satellite catalog number
    pub norad_id: u32,
    /// Ground station id
    pub gs_id: i64,
}

#[utoipa::path(
    get,
    path = "/api/passes",
    tag = "passes",
    params(PassesQuery),
    responses(
        (status = 200, description = "Claimable passes, earliest first", body = PassListing),
        (status = 404, description = "Satellite or ground station not found", body = ErrorResponse),
        (status = 409, description = "Ground station is inactive", body = ErrorResponse),
        (status = 502, description = "Prediction or element source failed", body = ErrorResponse)
    )
)]
pub async fn list_passes(
    State(state): State<AppState>,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<PassListing>> {
    let listing = state
        .orchestrator
        .passes_for(query.norad_id, query.gs_id, Utc::now())
        .await?;
    Ok(Json(listing))
}
