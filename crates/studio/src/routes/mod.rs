//! HTTP route handlers for the studio.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                           - Liveness check
//! GET  /health/ready                     - Readiness check (description store)
//!
//! # Pages
//! GET  /                                 - Persona cards
//! GET  /personas/{id}                    - Persona detail
//!
//! # Generator pass-through (rate limited)
//! POST /generate-persona                 - Full persona or one field
//! POST /generate-image                   - Avatar URL
//!
//! # Draft API
//! GET    /api/draft                      - Draft, phase, token, regenerating fields
//! POST   /api/draft                      - Start a draft ({seed} or {fromPersona})
//! DELETE /api/draft                      - Discard the draft
//! PUT    /api/draft/fields/{field}       - Replace one field
//! POST   /api/draft/lists/{list}         - Append an item
//! DELETE /api/draft/lists/{list}/{index} - Remove an item
//! PUT    /api/draft/description          - Set and save the description
//! POST   /api/draft/generate             - Generate the whole persona (rate limited)
//! POST   /api/draft/regenerate/{field}   - Regenerate one field (rate limited)
//! POST   /api/draft/commit               - Save the draft as a persona
//!
//! # Persona API
//! GET  /api/personas                     - Committed personas, oldest first
//! GET  /api/personas/{id}                - One persona
//! GET  /api/description                  - Saved product description
//! ```

pub mod api;
pub mod pages;
pub mod proxy;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::generation_rate_limiter;
use crate::state::AppState;

/// Create the generator pass-through routes router.
pub fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/generate-persona", post(proxy::generate_persona))
        .route("/generate-image", post(proxy::generate_image))
        .layer(generation_rate_limiter())
}

/// Create the page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route("/personas/{id}", get(pages::show))
}

/// Create all routes for the studio.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(page_routes())
        .merge(proxy_routes())
        .nest("/api", api::api_routes())
}
