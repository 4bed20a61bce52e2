use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::database::DatabaseError;

/// Failure returned by every domain service.
///
/// Carries an HTTP-style status code and a reason that is safe to show to a
/// client. Store failures never expose the underlying error text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal Server Error")]
    Backend,
    #[error("Internal Server Error")]
    Internal,
}

impl ServiceError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    pub fn code(&self) -> StatusCode {
        match self {
            // Existing accounts are reported as a bad request, not 409.
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(_: DatabaseError) -> Self {
        Self::Backend
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let code = self.code();
        let reason = self.reason();
        if code.is_server_error() {
            tracing::error!(status = code.as_u16(), %reason, "request failed");
        } else {
            tracing::warn!(status = code.as_u16(), %reason, "request rejected");
        }
        let body = json!({ "status": code.as_u16(), "message": reason });
        (code, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ServiceError::validation("bad").code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Conflict("Account already exists".into()).code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::unauthorized("no").code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::not_found("Trip not found").code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ServiceError::Backend.code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ServiceError::Internal.code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn database_errors_do_not_leak() {
        let err: ServiceError = DatabaseError::backend("GetItem", "table Authentication missing").into();
        assert_eq!(err, ServiceError::Backend);
        assert_eq!(err.reason(), "Internal Server Error");
    }

    #[tokio::test]
    async fn response_body_carries_status_and_message() {
        use http_body_util::BodyExt;

        let response = ServiceError::unauthorized("Invalid email or password, please try again")
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 401);
        assert_eq!(
            body["message"],
            "Invalid email or password, please try again"
        );
    }
}
