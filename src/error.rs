use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

/// Unified handler error. Every route returns `ApiResult<T>` so failures
/// come back as the same `{error, message}` JSON shape.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(err) => {
                // Internals are logged, never surfaced to clients
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::from(anyhow::Error::from(err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<sqlx::Error>() {
            Some(sqlx::Error::RowNotFound) => ApiError::NotFound("Resource not found".into()),
            Some(sqlx::Error::Database(db)) if db.constraint().is_some() => {
                let constraint = db.constraint().unwrap_or_default();
                if constraint.contains("email") {
                    ApiError::Conflict("Email already registered".into())
                } else {
                    ApiError::Conflict(format!("Constraint violation: {constraint}"))
                }
            }
            _ => ApiError::Internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_message() {
        let err = ApiError::BadRequest("Invalid email".into());
        assert_eq!(err.to_string(), "Invalid email");
        let err = ApiError::NotFound("Car not found".into());
        assert_eq!(err.to_string(), "Car not found");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: ApiError = anyhow::Error::from(sqlx::Error::RowNotFound).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn plain_anyhow_maps_to_internal() {
        let err: ApiError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
