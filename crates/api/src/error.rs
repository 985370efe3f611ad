use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::LocationNotFound
            | DomainError::ScheduleNotFound
            | DomainError::NoRecordToday
            | DomainError::NotFound(_) => ApiError::NotFound(message),
            DomainError::AlreadyCheckedIn
            | DomainError::AlreadyCheckedOut
            | DomainError::Conflict(_) => ApiError::Conflict(message),
            DomainError::NoCheckInToday
            | DomainError::LocationInactive
            | DomainError::OutsideGeofence { .. } => ApiError::BadRequest(message),
            DomainError::Validation(_) => ApiError::Validation(message),
            DomainError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(m) => m.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();

        let message = match messages.len() {
            0 => "Invalid request".to_string(),
            1 => messages.remove(0),
            n => format!("{} validation errors: {}", n, messages.join("; ")),
        };

        ApiError::Validation(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::StoreError;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_api_error_statuses() {
        assert_eq!(
            ApiError::Unauthorized("x".into()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".into()).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_error_mapping() {
        assert_eq!(status_of(DomainError::AlreadyCheckedIn), StatusCode::CONFLICT);
        assert_eq!(status_of(DomainError::AlreadyCheckedOut), StatusCode::CONFLICT);
        assert_eq!(status_of(DomainError::NoCheckInToday), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(DomainError::NoRecordToday), StatusCode::NOT_FOUND);
        assert_eq!(status_of(DomainError::LocationNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(DomainError::LocationInactive), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(DomainError::OutsideGeofence {
                distance: 80.0,
                radius: 50.0
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(DomainError::ScheduleNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(DomainError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::Storage(StoreError::Backend("down".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_body_is_opaque() {
        let err: ApiError =
            DomainError::Storage(StoreError::Backend("password leaked".into())).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "internal_error");
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_outside_geofence_body() {
        let response = ApiError::from(DomainError::OutsideGeofence {
            distance: 80.0,
            radius: 50.0,
        })
        .into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "bad_request");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .starts_with("Outside the allowed radius"));
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::Conflict("Already checked in today".into()).to_string(),
            "Conflict: Already checked in today"
        );
        assert_eq!(
            ApiError::BadRequest("test".into()).to_string(),
            "Bad request: test"
        );
    }
}
