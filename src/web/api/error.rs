use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{BookingError, ErrorKind};

pub struct ApiError(BookingError);

impl From<BookingError> for ApiError {
    fn from(e: BookingError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Unavailable => StatusCode::BAD_GATEWAY,
            ErrorKind::Internal => {
                log::error!("Request failed: {}", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse::with_message(kind, &self.0.to_string())),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: ErrorKind, message: &str) -> Self {
        ErrorResponse {
            error,
            message: Some(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_status_codes() {
        let cases = [
            (BookingError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (BookingError::Conflict("x".into()), StatusCode::CONFLICT),
            (BookingError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (BookingError::Unavailable("x".into()), StatusCode::BAD_GATEWAY),
            (
                BookingError::Storage(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
