use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::store::CommandType;
use crate::web::api::error::ApiResult;
use crate::web::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct CommandsResponse {
    pub commands: Vec<CommandType>,
}

#[utoipa::path(
    get,
    path = "/api/commands",
    tag = "commands",
    responses(
        (status = 200, description = "Command types a reservation may carry", body = CommandsResponse)
    )
)]
pub async fn list_commands(State(state): State<AppState>) -> ApiResult<Json<CommandsResponse>> {
    let commands = state.catalog.list_commands().await?;
    Ok(Json(CommandsResponse { commands }))
}
