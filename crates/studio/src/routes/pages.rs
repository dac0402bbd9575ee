//! Server-rendered persona pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use persona_studio_core::{ListField, Persona, PersonaId};
use tracing::instrument;

use crate::state::AppState;

/// Persona summary for the card grid.
#[derive(Clone)]
pub struct PersonaCard {
    pub id: String,
    pub name: String,
    pub initials: String,
    pub age: u32,
    pub occupation: String,
    pub location: String,
    pub avatar_url: String,
}

impl From<&Persona> for PersonaCard {
    fn from(persona: &Persona) -> Self {
        Self {
            id: persona.id.to_string(),
            name: persona.name.clone(),
            initials: initials(&persona.name),
            age: persona.age,
            occupation: persona.occupation.clone(),
            location: persona.location.clone(),
            avatar_url: persona.profile_picture.clone().unwrap_or_default(),
        }
    }
}

/// One titled list on the detail page.
#[derive(Clone)]
pub struct ListSection {
    pub title: &'static str,
    pub items: Vec<String>,
}

/// Persona index page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub personas: Vec<PersonaCard>,
}

/// Persona detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "personas/show.html")]
pub struct PersonaTemplate {
    pub card: PersonaCard,
    pub gender: String,
    pub bio: String,
    pub background: String,
    /// (label, value) pairs, empty values skipped.
    pub demographics: Vec<(&'static str, String)>,
    pub sections: Vec<ListSection>,
}

impl From<&Persona> for PersonaTemplate {
    fn from(persona: &Persona) -> Self {
        let demographics = persona
            .demographics
            .as_ref()
            .map(|d| {
                [
                    ("Location", &d.location),
                    ("Education", &d.education),
                    ("Income", &d.income),
                    ("Family", &d.family_status),
                ]
                .into_iter()
                .filter(|(_, value)| !value.is_empty())
                .map(|(label, value)| (label, value.clone()))
                .collect()
            })
            .unwrap_or_default();

        Self {
            card: PersonaCard::from(persona),
            gender: persona.gender.clone(),
            bio: persona.bio.clone(),
            background: persona.background.clone(),
            demographics,
            sections: ListField::ALL
                .into_iter()
                .filter(|list| !persona.list(*list).is_empty())
                .map(|list| ListSection {
                    title: list.title(),
                    items: persona.list(list).to_vec(),
                })
                .collect(),
        }
    }
}

/// Display every committed persona as a card.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let studio = state.studio().await;
    IndexTemplate {
        personas: studio.personas().iter().map(PersonaCard::from).collect(),
    }
}

/// Display one persona.
///
/// # Errors
///
/// Returns 404 if the persona doesn't exist.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let id = PersonaId::parse(&id).map_err(|_| StatusCode::NOT_FOUND)?;

    let studio = state.studio().await;
    let persona = studio
        .personas()
        .find_by_id(&id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(PersonaTemplate::from(persona))
}

/// Up to two initials for the avatar placeholder.
fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}
