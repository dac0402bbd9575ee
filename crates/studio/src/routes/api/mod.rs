//! JSON API for drafts, committed personas and the saved description.

pub mod draft;
pub mod personas;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::middleware::generation_rate_limiter;
use crate::state::AppState;

/// Create the draft routes router.
pub fn draft_routes() -> Router<AppState> {
    let generation = Router::new()
        .route("/generate", post(draft::generate))
        .route("/regenerate/{field}", post(draft::regenerate))
        .layer(generation_rate_limiter());

    Router::new()
        .route(
            "/",
            get(draft::show).post(draft::start).delete(draft::discard),
        )
        .route("/fields/{field}", put(draft::set_field))
        .route("/lists/{list}", post(draft::append_item))
        .route("/lists/{list}/{index}", delete(draft::remove_item))
        .route("/description", put(draft::save_description))
        .route("/commit", post(draft::commit))
        .merge(generation)
}

/// Create the persona routes router.
pub fn persona_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(personas::index))
        .route("/{id}", get(personas::show))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/draft", draft_routes())
        .nest("/personas", persona_routes())
        .route("/description", get(personas::description))
}
