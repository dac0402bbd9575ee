//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. JSON handlers return `Result<T, AppError>`; the
//! body is always `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use persona_studio_core::{DescriptionStoreError, DraftError};
use thiserror::Error;

use crate::gateway::GatewayError;

/// Application-level error type for the studio.
#[derive(Debug, Error)]
pub enum AppError {
    /// Draft operation rejected or failed.
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// Persona generator call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Description storage failed.
    #[error(transparent)]
    Storage(#[from] DescriptionStoreError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Draft(err) => match err {
                DraftError::ValidationFailed | DraftError::OutOfRange { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                DraftError::NoActiveDraft
                | DraftError::StaleDraft { .. }
                | DraftError::GenerationInFlight
                | DraftError::RegenerationInFlight(_)
                | DraftError::AlreadyRegenerating(_)
                | DraftError::NotPopulated(_) => StatusCode::CONFLICT,
                DraftError::FieldShape { .. } => StatusCode::BAD_REQUEST,
                DraftError::MalformedPayload(_) => StatusCode::BAD_GATEWAY,
                DraftError::UnknownPersona(_) => StatusCode::NOT_FOUND,
                DraftError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Gateway(err) => match err {
                GatewayError::EmptyInput => StatusCode::BAD_REQUEST,
                GatewayError::GenerationFailed { .. } | GatewayError::ImageGenerationFailed(_) => {
                    StatusCode::BAD_GATEWAY
                }
                GatewayError::Client(_) | GatewayError::InvalidBaseUrl(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            StatusCode::BAD_GATEWAY => "Persona generator error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use persona_studio_core::{DraftPhase, ListField, PersonaField};

    use super::*;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("persona abc".to_string());
        assert_eq!(err.to_string(), "Not found: persona abc");

        let err = AppError::from(DraftError::ValidationFailed);
        assert_eq!(err.to_string(), "a persona needs a name before it can be saved");
    }

    #[test]
    fn test_draft_error_status_codes() {
        assert_eq!(
            get_status(DraftError::ValidationFailed),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(DraftError::OutOfRange {
                list: ListField::Goals,
                index: 3,
                len: 1
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(get_status(DraftError::NoActiveDraft), StatusCode::CONFLICT);
        assert_eq!(get_status(DraftError::GenerationInFlight), StatusCode::CONFLICT);
        assert_eq!(
            get_status(DraftError::AlreadyRegenerating(PersonaField::Bio)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(DraftError::RegenerationInFlight(PersonaField::Bio)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(DraftError::NotPopulated(DraftPhase::Empty)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(DraftError::FieldShape {
                field: PersonaField::Name,
                expected: "a string"
            }),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_gateway_error_status_codes() {
        assert_eq!(get_status(GatewayError::EmptyInput), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(GatewayError::GenerationFailed {
                status: Some(500),
                message: "boom".to_string()
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_error_body_hides_upstream_details() {
        let response = AppError::from(GatewayError::GenerationFailed {
            status: Some(500),
            message: "stack trace from upstream".to_string(),
        })
        .into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Persona generator error");
    }

    #[tokio::test]
    async fn test_client_errors_keep_message() {
        let response = AppError::BadRequest("invalid index".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Bad request: invalid index");
    }
}
