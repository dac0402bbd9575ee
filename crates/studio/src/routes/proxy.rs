//! Pass-through endpoints for browser clients that talk to the generator
//! directly.
//!
//! Bodies are relayed as-is. Failures collapse into a fixed
//! `{"error": "..."}` message so upstream details never reach the client.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::instrument;

use crate::gateway::{AvatarRequest, GatewayError, GeneratePersonaRequest, ImageResponse};
use crate::state::AppState;

const PERSONA_FAILED: &str = "Failed to generate persona";
const IMAGE_FAILED: &str = "Failed to generate image";

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// `POST /generate-persona`: full generation or single-field regeneration.
#[instrument(skip(state, request), fields(field = ?request.field))]
pub async fn generate_persona(
    State(state): State<AppState>,
    Json(request): Json<GeneratePersonaRequest>,
) -> Response {
    match state.gateway().forward(&request).await {
        Ok(body) => Json(body).into_response(),
        Err(GatewayError::EmptyInput) => {
            error_response(StatusCode::BAD_REQUEST, &GatewayError::EmptyInput.to_string())
        }
        Err(e) => {
            tracing::error!(error = %e, "Persona generation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, PERSONA_FAILED)
        }
    }
}

/// `POST /generate-image`: avatar for a persona.
#[instrument(skip(state, request), fields(name = %request.name))]
pub async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<AvatarRequest>,
) -> Response {
    match state.gateway().generate_avatar(&request).await {
        Ok(url) => Json(ImageResponse { url }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Image generation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, IMAGE_FAILED)
        }
    }
}
