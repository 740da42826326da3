use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use service::auth::errors::AuthError;
use service::errors::ServiceError;
use service::listing::domain::FieldErrors;

/// Shown to clients instead of internal error details.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again!";

/// HTTP-facing error; every variant renders as JSON.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("multipart: {0}")]
    Multipart(#[from] MultipartError),
    #[error("unauthenticated: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not implemented")]
    NotImplemented,
    #[error("internal: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, json!({"errors": errors})),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"message": msg})),
            ApiError::Multipart(e) => (e.status(), json!({"message": e.body_text()})),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({"message": msg})),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({"message": msg})),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({"message": msg})),
            ApiError::NotImplemented => (StatusCode::NOT_IMPLEMENTED, json!({"message": "Not implemented."})),
            ApiError::Internal(detail) => {
                error!(error = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"message": GENERIC_FAILURE}))
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(errors) => ApiError::Validation(errors),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ApiError::BadRequest(msg),
            AuthError::Conflict => ApiError::Conflict(e.to_string()),
            AuthError::Unauthorized | AuthError::NotFound => ApiError::Unauthorized("Unauthenticated.".into()),
            other => ApiError::Internal(format!("auth[{}]: {}", other.code(), other)),
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("runtime check failed: {0}")]
    Runtime(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_details() {
        let resp = ApiError::Internal("db password wrong".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn service_errors_map_to_status() {
        let validation = ApiError::from(ServiceError::Validation(FieldErrors::single("title", "x")));
        assert_eq!(validation.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
        let missing = ApiError::from(ServiceError::not_found("model"));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
        let storage = ApiError::from(ServiceError::Storage("disk".into()));
        assert_eq!(storage.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_errors_map_to_status() {
        assert_eq!(ApiError::from(AuthError::Conflict).into_response().status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(AuthError::Unauthorized).into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(AuthError::Validation("short".into())).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
