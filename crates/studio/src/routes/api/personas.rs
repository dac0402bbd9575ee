//! Committed persona and description API handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use persona_studio_core::{DESCRIPTION_KEY, Persona, PersonaId};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// All committed personas in the order they were saved.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<Persona>> {
    let studio = state.studio().await;
    Json(studio.personas().iter().cloned().collect())
}

/// A single persona by id.
///
/// # Errors
///
/// Returns 404 if no persona has that id.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Persona>> {
    let not_found = || AppError::NotFound(format!("persona {id}"));
    let persona_id = PersonaId::parse(&id).map_err(|_| not_found())?;

    let studio = state.studio().await;
    studio
        .personas()
        .find_by_id(&persona_id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

/// The persisted product description.
///
/// # Errors
///
/// Returns 500 if the description store cannot be read.
#[instrument(skip(state))]
pub async fn description(State(state): State<AppState>) -> Result<Json<Value>> {
    let saved = state
        .with_studio_blocking(|studio| studio.description())
        .await??;

    let mut body = Map::new();
    body.insert(
        DESCRIPTION_KEY.to_owned(),
        saved.map_or(Value::Null, Value::String),
    );
    Ok(Json(Value::Object(body)))
}
