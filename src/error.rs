use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::elements::ElementsError;
use crate::predict::PredictError;

/// Kind of a [`BookingError`], stable enough for clients to decide whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    Unavailable,
    Internal,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type BookingResult<T> = Result<T, BookingError>;

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::NotFound(_) => ErrorKind::NotFound,
            BookingError::Conflict(_) => ErrorKind::Conflict,
            BookingError::Validation(_) => ErrorKind::Validation,
            BookingError::Unavailable(_) => ErrorKind::Unavailable,
            BookingError::Storage(_) | BookingError::Migration(_) => ErrorKind::Internal,
        }
    }

    /// Turns a unique-constraint violation into `Conflict`, leaving other errors as storage errors.
    pub fn conflict_on_unique(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                BookingError::Conflict(message.into())
            }
            _ => BookingError::Storage(err),
        }
    }
}

impl From<PredictError> for BookingError {
    fn from(err: PredictError) -> Self {
        BookingError::Unavailable(err.to_string())
    }
}

impl From<ElementsError> for BookingError {
    fn from(err: ElementsError) -> Self {
        match err {
            ElementsError::NotFound(norad_id) => BookingError::NotFound(format!(
                "No orbital elements published for satellite ({})",
                norad_id
            )),
            other => BookingError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_not_found_stays_not_found() {
        let err: BookingError = ElementsError::NotFound(25544).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("25544"));
    }

    #[test]
    fn upstream_failures_are_unavailable() {
        let err: BookingError = ElementsError::Timeout.into();
        assert_eq!(err.kind(), ErrorKind::Unavailable);

        let err: BookingError = PredictError::Propagation("diverged".into()).into();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn non_unique_database_errors_are_internal() {
        let err = BookingError::conflict_on_unique(sqlx::Error::RowNotFound, "dup");
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
