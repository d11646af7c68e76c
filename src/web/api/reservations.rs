use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::reservations::{NewReservation, ReservationDetails};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListReservationsQuery {
    /// Include cancelled reservations
    #[serde(default)]
    pub include_cancelled: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationsResponse {
    pub reservations: Vec<ReservationDetails>,
}

#[utoipa::path(
    post,
    path = "/api/reservations",
    tag = "reservations",
    request_body = NewReservation,
    responses(
        (status = 201, description = "Pass reserved", body = ReservationDetails),
        (status = 400, description = "Pass no longer claimable or invalid commands", body = ErrorResponse),
        (status = 404, description = "Pass or mission not found, or satellite not in mission", body = ErrorResponse),
        (status = 409, description = "Pass already reserved or ground station inactive", body = ErrorResponse)
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<NewReservation>,
) -> ApiResult<impl IntoResponse> {
    let reservation = state.ledger.create_reservation(&request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

#[utoipa::path(
    get,
    path = "/api/reservations",
    tag = "reservations",
    params(ListReservationsQuery),
    responses(
        (status = 200, description = "Reservations ordered by pass start", body = ReservationsResponse)
    )
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    Query(query): Query<ListReservationsQuery>,
) -> ApiResult<Json<ReservationsResponse>> {
    let reservations = state
        .ledger
        .list_reservations(query.include_cancelled, Utc::now())
        .await?;
    Ok(Json(ReservationsResponse { reservations }))
}

#[utoipa::path(
    get,
    path = "/api/reservations/{r_id}",
    tag = "reservations",
    params(("r_id" = i64, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation with derived status", body = ReservationDetails),
        (status = 404, description = "Reservation not found", body = ErrorResponse)
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(r_id): Path<i64>,
) -> ApiResult<Json<ReservationDetails>> {
    Ok(Json(state.ledger.get_reservation(r_id, Utc::now()).await?))
}

#[utoipa::path(
    post,
    path = "/api/reservations/{r_id}/cancel",
    tag = "reservations",
    params(("r_id" = i64, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation cancelled", body = ReservationDetails),
        (status = 404, description = "Reservation not found", body = ErrorResponse)
    )
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(r_id): Path<i64>,
) -> ApiResult<Json<ReservationDetails>> {
    let now = Utc::now();
    state.ledger.cancel_reservation(r_id, now).await?;
    Ok(Json(state.ledger.get_reservation(r_id, now).await?))
}

#[utoipa::path(
    get,
    path = "/api/missions/{mission_id}/reservations",
    tag = "reservations",
    params(
        ("mission_id" = i64, Path, description = "Mission id"),
        ListReservationsQuery
    ),
    responses(
        (status = 200, description = "Reservations of the mission", body = ReservationsResponse),
        (status = 404, description = "Mission not found", body = ErrorResponse)
    )
)]
pub async fn list_mission_reservations(
    State(state): State<AppState>,
    Path(mission_id): Path<i64>,
    Query(query): Query<ListReservationsQuery>,
) -> ApiResult<Json<ReservationsResponse>> {
    let reservations = state
        .ledger
        .list_mission_reservations(mission_id, query.include_cancelled, Utc::now())
        .await?;
    Ok(Json(ReservationsResponse { reservations }))
}
