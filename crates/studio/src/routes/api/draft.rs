//! Draft API handlers.
//!
//! Generation handlers follow the same shape: validate and snapshot under the
//! studio lock, release it, call the generator, then lock again and merge
//! with the token taken at the start. A draft replaced in the meantime makes
//! the merge fail with 409.
//!
//! The call and the merge run in a spawned task. A client that disconnects
//! drops the handler, not the task, so the draft always leaves `Generating`
//! and regeneration flags are always cleared.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use persona_studio_core::{
    DraftController, DraftError, DraftPhase, DraftToken, ListField, Persona, PersonaDraft,
    PersonaField, PersonaId, Studio, UnknownFieldError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Instrument, Span, instrument};

use crate::error::{AppError, Result};
use crate::gateway::GatewayError;
use crate::state::AppState;

/// Snapshot of the draft controller returned by every draft endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftView {
    pub phase: DraftPhase,
    pub token: DraftToken,
    pub draft: Option<PersonaDraft>,
    pub regenerating: Vec<PersonaField>,
}

impl From<&DraftController> for DraftView {
    fn from(controller: &DraftController) -> Self {
        Self {
            phase: controller.phase(),
            token: controller.token(),
            draft: controller.draft().cloned(),
            regenerating: controller.regenerating().iter().copied().collect(),
        }
    }
}

/// Body of `POST /api/draft`. Both fields are optional; at most one may be set.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDraftRequest {
    #[serde(default)]
    pub seed: Option<PersonaDraft>,
    #[serde(default)]
    pub from_persona: Option<String>,
}

/// Body of `POST /api/draft/lists/{list}`.
#[derive(Debug, Deserialize)]
pub struct AppendItemRequest {
    pub item: String,
}

/// Body of `PUT /api/draft/description`.
#[derive(Debug, Deserialize)]
pub struct DescriptionRequest {
    pub description: String,
}

/// Current draft, phase and regeneration flags.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<DraftView> {
    let studio = state.studio().await;
    Json(DraftView::from(studio.drafts()))
}

/// Start a new draft, replacing any unsaved one.
///
/// # Errors
///
/// Returns 400 for a malformed body and 404 if `fromPersona` names no persona.
#[instrument(skip(state, body))]
pub async fn start(State(state): State<AppState>, body: Bytes) -> Result<(StatusCode, Json<DraftView>)> {
    let request: StartDraftRequest = if body.iter().all(u8::is_ascii_whitespace) {
        StartDraftRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?
    };

    let from_persona = match (&request.seed, request.from_persona) {
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "seed and fromPersona are mutually exclusive".to_string(),
            ));
        }
        (_, Some(id)) => {
            Some(PersonaId::parse(&id).map_err(|e| AppError::BadRequest(e.to_string()))?)
        }
        (_, None) => None,
    };
    let seed = request.seed;

    let view = state
        .with_studio_blocking(move |studio| {
            match &from_persona {
                Some(id) => studio.edit_persona(id)?,
                None => studio.start_draft(seed)?,
            };
            Ok::<_, DraftError>(DraftView::from(studio.drafts()))
        })
        .await??;

    tracing::info!(token = %view.token, "Draft started");
    Ok((StatusCode::CREATED, Json(view)))
}

/// Discard the draft.
#[instrument(skip(state))]
pub async fn discard(State(state): State<AppState>) -> Json<DraftView> {
    let mut studio = state.studio().await;
    if studio.drafts_mut().discard_draft() {
        tracing::info!("Draft discarded");
    }
    Json(DraftView::from(studio.drafts()))
}

/// Replace one field with the JSON request body.
///
/// # Errors
///
/// Returns 400 for an unknown field or a value of the wrong shape and 409
/// without a draft.
#[instrument(skip(state, value))]
pub async fn set_field(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<DraftView>> {
    let field = parse_field(&field)?;

    let mut studio = state.studio().await;
    studio.drafts_mut().set_field(field, value)?;
    Ok(Json(DraftView::from(studio.drafts())))
}

/// Append an item to a list field. Blank items are ignored.
///
/// # Errors
///
/// Returns 400 for an unknown list and 409 without a draft.
#[instrument(skip(state, body))]
pub async fn append_item(
    State(state): State<AppState>,
    Path(list): Path<String>,
    Json(body): Json<AppendItemRequest>,
) -> Result<Json<DraftView>> {
    let list = parse_list(&list)?;

    let mut studio = state.studio().await;
    studio.drafts_mut().append_list_item(list, &body.item)?;
    Ok(Json(DraftView::from(studio.drafts())))
}

/// Remove the item at `index` from a list field.
///
/// # Errors
///
/// Returns 422 if the index is out of range and 409 without a draft.
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path((list, index)): Path<(String, usize)>,
) -> Result<Json<DraftView>> {
    let list = parse_list(&list)?;

    let mut studio = state.studio().await;
    studio.drafts_mut().remove_list_item(list, index)?;
    Ok(Json(DraftView::from(studio.drafts())))
}

/// Set the description and persist it.
///
/// # Errors
///
/// Returns 409 without a draft and 500 if the description cannot be saved.
#[instrument(skip(state, body))]
pub async fn save_description(
    State(state): State<AppState>,
    Json(body): Json<DescriptionRequest>,
) -> Result<Json<DraftView>> {
    let view = state
        .with_studio_blocking(move |studio| {
            studio.save_description(&body.description)?;
            Ok::<_, DraftError>(DraftView::from(studio.drafts()))
        })
        .await??;
    Ok(Json(view))
}

/// Generate a full persona from the draft's description.
///
/// # Errors
///
/// Returns 400 for a blank description (no upstream call), 409 if a
/// generation or field regeneration is running or the draft was replaced
/// meanwhile, and 502 if the generator fails. The draft is unchanged on failure.
#[instrument(skip(state))]
pub async fn generate(State(state): State<AppState>) -> Result<Json<DraftView>> {
    let (token, description) = {
        let mut studio = state.studio().await;
        let description = description_of(studio.drafts())?;
        (studio.drafts_mut().begin_generation()?, description)
    };

    let merge = merge_generation(state, token, description).instrument(Span::current());
    tokio::spawn(merge)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map(Json)
}

async fn merge_generation(
    state: AppState,
    token: DraftToken,
    description: String,
) -> Result<DraftView> {
    let result = state.gateway().generate_full(&description).await;

    let mut studio = state.studio().await;
    let drafts = studio.drafts_mut();
    let generated = match result.map_err(AppError::from).and_then(|persona| {
        PersonaDraft::from_payload(persona).map_err(AppError::from)
    }) {
        Ok(generated) => generated,
        Err(e) => {
            drafts.fail_generation(token);
            return Err(e);
        }
    };

    drafts.finish_generation(token, generated)?;
    tracing::info!(%token, "Persona generated");
    Ok(DraftView::from(&*drafts))
}

/// Regenerate a single field of a populated draft.
///
/// # Errors
///
/// Returns 400 for an unknown field or blank description, 409 if the field
/// is already regenerating, the draft is not populated or was replaced
/// meanwhile, and 502 if the generator fails.
#[instrument(skip(state))]
pub async fn regenerate(
    State(state): State<AppState>,
    Path(field): Path<String>,
) -> Result<Json<DraftView>> {
    let field = parse_field(&field)?;

    let (token, description, snapshot) = {
        let mut studio = state.studio().await;
        let description = description_of(studio.drafts())?;
        let drafts = studio.drafts_mut();
        let token = drafts.begin_regeneration(field)?;
        let snapshot = drafts.draft().cloned().unwrap_or_default();
        (token, description, snapshot)
    };

    let merge = merge_regeneration(state, token, field, description, snapshot)
        .instrument(Span::current());
    tokio::spawn(merge)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map(Json)
}

async fn merge_regeneration(
    state: AppState,
    token: DraftToken,
    field: PersonaField,
    description: String,
    snapshot: PersonaDraft,
) -> Result<DraftView> {
    let result = state
        .gateway()
        .regenerate_field(&description, field, &snapshot)
        .await;

    let mut studio = state.studio().await;
    let drafts = studio.drafts_mut();
    match result {
        Ok(value) => drafts.finish_regeneration(token, field, value)?,
        Err(e) => {
            drafts.fail_regeneration(token, field);
            return Err(e.into());
        }
    }
    Ok(DraftView::from(&*drafts))
}

/// Commit the draft into the collection.
///
/// # Errors
///
/// Returns 422 if the draft has no name, 409 without a draft, and 500 if the
/// description cannot be saved. The draft is kept on every failure.
#[instrument(skip(state))]
pub async fn commit(State(state): State<AppState>) -> Result<(StatusCode, Json<Persona>)> {
    let persona = state.with_studio_blocking(Studio::commit).await??;
    tracing::info!(persona_id = %persona.id, "Persona committed");
    Ok((StatusCode::CREATED, Json(persona)))
}

/// The draft's description, or `EmptyInput` if it is blank.
fn description_of(drafts: &DraftController) -> Result<String> {
    let draft = drafts.draft().ok_or(DraftError::NoActiveDraft)?;
    draft
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| GatewayError::EmptyInput.into())
}

fn parse_field(raw: &str) -> Result<PersonaField> {
    raw.parse()
        .map_err(|e: UnknownFieldError| AppError::BadRequest(e.to_string()))
}

fn parse_list(raw: &str) -> Result<ListField> {
    raw.parse()
        .map_err(|e: UnknownFieldError| AppError::BadRequest(e.to_string()))
}
