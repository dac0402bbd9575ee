//! The persona draft controller.
//!
//! A [`DraftController`] holds at most one [`PersonaDraft`] at a time and is
//! the only place drafts are mutated. Generation results are merged through
//! it as well, guarded by the [`DraftToken`] that was current when the
//! request started, so a response that arrives after the draft was discarded
//! or restarted is dropped instead of overwriting newer work.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::description::DescriptionStoreError;
use crate::types::{
    Demographics, DraftPhase, DraftToken, ListField, Persona, PersonaField, PersonaId, coerce_age,
};

/// Errors raised by draft operations.
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// Commit attempted without a name.
    #[error("a persona needs a name before it can be saved")]
    ValidationFailed,

    /// List removal with an index outside the list.
    #[error("index {index} is out of range for {list} (length {len})")]
    OutOfRange {
        list: ListField,
        index: usize,
        len: usize,
    },

    /// No draft has been started, or the last one was committed or discarded.
    #[error("there is no active draft")]
    NoActiveDraft,

    /// A generation result belongs to a draft that is no longer active.
    #[error("draft {token} is no longer active")]
    StaleDraft { token: DraftToken },

    /// A full generation is already running for this draft.
    #[error("a persona generation is already in progress")]
    GenerationInFlight,

    /// A full generation was requested while fields are still regenerating.
    #[error("wait for {0} to finish regenerating")]
    RegenerationInFlight(PersonaField),

    /// The field is already being regenerated.
    #[error("{0} is already being regenerated")]
    AlreadyRegenerating(PersonaField),

    /// Field regeneration needs a populated draft.
    #[error("cannot regenerate fields while the draft is {0}")]
    NotPopulated(DraftPhase),

    /// The value does not have the JSON shape the field stores.
    #[error("{field} expects {expected}")]
    FieldShape {
        field: PersonaField,
        expected: &'static str,
    },

    /// A generated payload could not be read as a persona.
    #[error("generated persona is malformed: {0}")]
    MalformedPayload(String),

    /// Editing was requested for a persona that does not exist.
    #[error("persona {0} not found")]
    UnknownPersona(PersonaId),

    /// The description store failed.
    #[error(transparent)]
    Persistence(#[from] DescriptionStoreError),
}

/// A persona under construction.
///
/// Every field is optional. `description` is the free-text prompt the user
/// typed and never reaches a committed [`Persona`]. `age` keeps whatever JSON
/// value was supplied until commit coerces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub frustrations: Vec<String>,
    #[serde(default)]
    pub behaviors: Vec<String>,
    #[serde(default)]
    pub pain_points: Vec<String>,
    #[serde(default)]
    pub motivations: Vec<String>,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default)]
    pub preferred_channels: Vec<String>,
    #[serde(default, alias = "avatar", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

impl PersonaDraft {
    /// Read a generator payload as a draft.
    ///
    /// Missing fields take their defaults and unknown fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::MalformedPayload`] if a known field has the
    /// wrong type.
    pub fn from_payload(payload: Map<String, Value>) -> Result<Self, DraftError> {
        serde_json::from_value(Value::Object(payload))
            .map_err(|e| DraftError::MalformedPayload(e.to_string()))
    }

    /// Items of one list field.
    #[must_use]
    pub fn list(&self, field: ListField) -> &[String] {
        match field {
            ListField::Goals => &self.goals,
            ListField::Frustrations => &self.frustrations,
            ListField::Behaviors => &self.behaviors,
            ListField::PainPoints => &self.pain_points,
            ListField::Motivations => &self.motivations,
            ListField::PersonalityTraits => &self.personality_traits,
            ListField::PreferredChannels => &self.preferred_channels,
        }
    }

    fn list_mut(&mut self, field: ListField) -> &mut Vec<String> {
        match field {
            ListField::Goals => &mut self.goals,
            ListField::Frustrations => &mut self.frustrations,
            ListField::Behaviors => &mut self.behaviors,
            ListField::PainPoints => &mut self.pain_points,
            ListField::Motivations => &mut self.motivations,
            ListField::PersonalityTraits => &mut self.personality_traits,
            ListField::PreferredChannels => &mut self.preferred_channels,
        }
    }

    /// Whether the user described the persona they want.
    #[must_use]
    pub fn has_description(&self) -> bool {
        self.description.as_deref().is_some_and(|d| !d.trim().is_empty())
    }

    /// Whether any persona field carries content.
    #[must_use]
    pub fn has_content(&self) -> bool {
        let text = [
            &self.name,
            &self.gender,
            &self.occupation,
            &self.location,
            &self.bio,
            &self.background,
            &self.profile_picture,
        ];
        text.iter().any(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
            || self.age.as_ref().is_some_and(|v| !v.is_null())
            || self.demographics.is_some()
            || ListField::ALL.iter().any(|l| !self.list(*l).is_empty())
    }

    /// The draft as the generator sees it, without the description.
    #[must_use]
    pub fn persona_snapshot(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.remove("description");
                Value::Object(map)
            }
            _ => Value::Object(Map::new()),
        }
    }

    /// Replace one field with a JSON value.
    ///
    /// Text fields take strings, list fields take arrays of strings, `age`
    /// takes anything. `null` clears a field.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::FieldShape`] if the value has the wrong shape.
    pub fn set_field(&mut self, field: PersonaField, value: Value) -> Result<(), DraftError> {
        match field {
            PersonaField::Name => self.name = text_value(field, value)?,
            PersonaField::Age => self.age = Some(value).filter(|v| !v.is_null()),
            PersonaField::Gender => self.gender = text_value(field, value)?,
            PersonaField::Occupation => self.occupation = text_value(field, value)?,
            PersonaField::Location => self.location = text_value(field, value)?,
            PersonaField::Bio => self.bio = text_value(field, value)?,
            PersonaField::Background => self.background = text_value(field, value)?,
            PersonaField::ProfilePicture => self.profile_picture = text_value(field, value)?,
            PersonaField::Demographics => {
                self.demographics = if value.is_null() {
                    None
                } else {
                    Some(
                        serde_json::from_value(value).map_err(|_| DraftError::FieldShape {
                            field,
                            expected: "a demographics object",
                        })?,
                    )
                };
            }
            PersonaField::List(list) => *self.list_mut(list) = list_value(field, value)?,
        }
        Ok(())
    }

    /// Build the committed persona.
    fn to_persona(&self, id: PersonaId, created_at: DateTime<Utc>) -> Persona {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        Persona {
            id,
            name: self.name.as_deref().unwrap_or_default().trim().to_owned(),
            age: coerce_age(self.age.as_ref()),
            gender: text(&self.gender),
            occupation: text(&self.occupation),
            location: text(&self.location),
            bio: text(&self.bio),
            background: text(&self.background),
            demographics: self.demographics.clone(),
            goals: self.goals.clone(),
            frustrations: self.frustrations.clone(),
            behaviors: self.behaviors.clone(),
            pain_points: self.pain_points.clone(),
            motivations: self.motivations.clone(),
            personality_traits: self.personality_traits.clone(),
            preferred_channels: self.preferred_channels.clone(),
            profile_picture: self.profile_picture.clone(),
            created_at,
        }
    }
}

impl From<&Persona> for PersonaDraft {
    fn from(persona: &Persona) -> Self {
        let some = |s: &String| Some(s.clone()).filter(|s| !s.is_empty());

        Self {
            description: None,
            name: Some(persona.name.clone()),
            age: Some(Value::from(persona.age)),
            gender: some(&persona.gender),
            occupation: some(&persona.occupation),
            location: some(&persona.location),
            bio: some(&persona.bio),
            background: some(&persona.background),
            demographics: persona.demographics.clone(),
            goals: persona.goals.clone(),
            frustrations: persona.frustrations.clone(),
            behaviors: persona.behaviors.clone(),
            pain_points: persona.pain_points.clone(),
            motivations: persona.motivations.clone(),
            personality_traits: persona.personality_traits.clone(),
            preferred_channels: persona.preferred_channels.clone(),
            profile_picture: persona.profile_picture.clone(),
        }
    }
}

fn text_value(field: PersonaField, value: Value) -> Result<Option<String>, DraftError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(DraftError::FieldShape {
            field,
            expected: "a string",
        }),
    }
}

fn list_value(field: PersonaField, value: Value) -> Result<Vec<String>, DraftError> {
    let shape = || DraftError::FieldShape {
        field,
        expected: "an array of strings",
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(shape()),
            })
            .collect(),
        _ => Err(shape()),
    }
}

/// Owns the active draft and every transition of its lifecycle.
#[derive(Debug, Default)]
pub struct DraftController {
    draft: Option<PersonaDraft>,
    phase: DraftPhase,
    token: DraftToken,
    /// Phase to return to when a full generation fails.
    resume_phase: DraftPhase,
    regenerating: BTreeSet<PersonaField>,
}

impl DraftController {
    /// Create a controller with no draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active draft, if any.
    #[must_use]
    pub const fn draft(&self) -> Option<&PersonaDraft> {
        self.draft.as_ref()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> DraftPhase {
        self.phase
    }

    /// Token of the current (or most recent) draft.
    #[must_use]
    pub const fn token(&self) -> DraftToken {
        self.token
    }

    /// Whether `token` names the live draft.
    #[must_use]
    pub fn is_active(&self, token: DraftToken) -> bool {
        self.draft.is_some() && self.token == token
    }

    /// Fields with a regeneration in flight.
    #[must_use]
    pub const fn regenerating(&self) -> &BTreeSet<PersonaField> {
        &self.regenerating
    }

    /// Start a new draft, replacing any unsaved one.
    ///
    /// With no seed the draft starts empty with empty lists. A seed (the edit
    /// case) is taken as-is.
    pub fn start_draft(&mut self, seed: Option<PersonaDraft>) -> DraftToken {
        let draft = seed.unwrap_or_default();
        self.phase = resting_phase(&draft);
        self.draft = Some(draft);
        self.token = self.token.next();
        self.resume_phase = self.phase;
        self.regenerating.clear();
        self.token
    }

    /// Replace one field of the draft.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::NoActiveDraft`] without a draft and
    /// [`DraftError::FieldShape`] for a value of the wrong shape.
    pub fn set_field(&mut self, field: PersonaField, value: Value) -> Result<(), DraftError> {
        self.draft_mut()?.set_field(field, value)?;
        self.mark_edited();
        Ok(())
    }

    /// Set the free-text description.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::NoActiveDraft`] without a draft.
    pub fn set_description(&mut self, description: impl Into<String>) -> Result<(), DraftError> {
        let draft = self.draft_mut()?;
        draft.description = Some(description.into());
        let described = draft.has_description();
        let has_content = draft.has_content();

        self.phase = match self.phase {
            DraftPhase::Empty | DraftPhase::Describing if has_content => DraftPhase::Populated,
            DraftPhase::Empty | DraftPhase::Describing if described => DraftPhase::Describing,
            DraftPhase::Empty | DraftPhase::Describing => DraftPhase::Empty,
            other => other,
        };
        Ok(())
    }

    /// Append an item to a list field.
    ///
    /// Blank items are ignored. Returns whether the item was added.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::NoActiveDraft`] without a draft.
    pub fn append_list_item(&mut self, list: ListField, item: &str) -> Result<bool, DraftError> {
        let draft = self.draft_mut()?;
        let item = item.trim();
        if item.is_empty() {
            return Ok(false);
        }
        draft.list_mut(list).push(item.to_owned());
        self.mark_edited();
        Ok(true)
    }

    /// Remove the item at `index` from a list field, shifting later items down.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::OutOfRange`] (list unchanged) if `index` is not
    /// below the list length, or [`DraftError::NoActiveDraft`] without a draft.
    pub fn remove_list_item(&mut self, list: ListField, index: usize) -> Result<String, DraftError> {
        let items = self.draft_mut()?.list_mut(list);
        if index >= items.len() {
            return Err(DraftError::OutOfRange {
                list,
                index,
                len: items.len(),
            });
        }
        Ok(items.remove(index))
    }

    /// Enter `Generating` for a full generation request.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::GenerationInFlight`] if one is already running
    /// and [`DraftError::RegenerationInFlight`] while any field regenerates.
    pub fn begin_generation(&mut self) -> Result<DraftToken, DraftError> {
        self.draft_ref()?;
        if self.phase == DraftPhase::Generating {
            return Err(DraftError::GenerationInFlight);
        }
        // A regeneration merged after the new persona would write a value
        // computed from the old one
        if let Some(field) = self.regenerating.first() {
            return Err(DraftError::RegenerationInFlight(*field));
        }
        self.resume_phase = self.phase;
        self.phase = DraftPhase::Generating;
        Ok(self.token)
    }

    /// Merge a full generation result into the draft.
    ///
    /// The generated persona replaces every persona field; the description
    /// is kept.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::StaleDraft`] if `token` no longer names the
    /// active draft. Nothing is merged in that case.
    pub fn finish_generation(
        &mut self,
        token: DraftToken,
        generated: PersonaDraft,
    ) -> Result<(), DraftError> {
        self.ensure_active(token)?;
        let description = self.draft.as_mut().and_then(|d| d.description.take());
        self.draft = Some(PersonaDraft {
            description,
            ..generated
        });
        self.phase = DraftPhase::Populated;
        Ok(())
    }

    /// Leave `Generating` after a failed request, keeping the draft as it was.
    ///
    /// Stale tokens are ignored.
    pub fn fail_generation(&mut self, token: DraftToken) {
        if self.is_active(token) && self.phase == DraftPhase::Generating {
            self.phase = self.resume_phase;
        }
    }

    /// Mark `field` as regenerating.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::NotPopulated`] outside the `Populated` phase and
    /// [`DraftError::AlreadyRegenerating`] if the field is already in flight.
    pub fn begin_regeneration(&mut self, field: PersonaField) -> Result<DraftToken, DraftError> {
        self.draft_ref()?;
        if self.phase != DraftPhase::Populated {
            return Err(DraftError::NotPopulated(self.phase));
        }
        if !self.regenerating.insert(field) {
            return Err(DraftError::AlreadyRegenerating(field));
        }
        Ok(self.token)
    }

    /// Store a regenerated value and clear the field's flag.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::StaleDraft`] for a retired token and
    /// [`DraftError::FieldShape`] if the value does not fit the field. The
    /// flag is cleared either way while the draft is live.
    pub fn finish_regeneration(
        &mut self,
        token: DraftToken,
        field: PersonaField,
        value: Value,
    ) -> Result<(), DraftError> {
        self.ensure_active(token)?;
        self.regenerating.remove(&field);
        self.draft_mut()?.set_field(field, value)
    }

    /// Clear the field's flag after a failed regeneration.
    pub fn fail_regeneration(&mut self, token: DraftToken, field: PersonaField) {
        if self.is_active(token) {
            self.regenerating.remove(&field);
        }
    }

    /// Validate the draft and turn it into a persona.
    ///
    /// The draft ends in `Saved`. The returned persona owns copies of every
    /// list, so nothing done to a later draft can reach it.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::ValidationFailed`] if the trimmed name is empty;
    /// the draft is left untouched.
    pub fn commit(&mut self) -> Result<Persona, DraftError> {
        self.ensure_committable()?;
        let persona = self
            .draft_ref()?
            .to_persona(PersonaId::generate(), Utc::now());
        self.retire(DraftPhase::Saved);
        Ok(persona)
    }

    /// Check that [`Self::commit`] would succeed, without committing.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::NoActiveDraft`] without a draft and
    /// [`DraftError::ValidationFailed`] if the trimmed name is empty.
    pub fn ensure_committable(&self) -> Result<(), DraftError> {
        let draft = self.draft_ref()?;
        if draft.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(DraftError::ValidationFailed);
        }
        Ok(())
    }

    /// Throw the draft away. Returns whether there was one.
    pub fn discard_draft(&mut self) -> bool {
        let had_draft = self.draft.is_some();
        if had_draft {
            self.retire(DraftPhase::Discarded);
        }
        had_draft
    }

    fn retire(&mut self, phase: DraftPhase) {
        self.draft = None;
        self.phase = phase;
        self.resume_phase = phase;
        self.regenerating.clear();
    }

    fn mark_edited(&mut self) {
        if matches!(self.phase, DraftPhase::Empty | DraftPhase::Describing) {
            self.phase = DraftPhase::Populated;
        }
    }

    fn ensure_active(&self, token: DraftToken) -> Result<(), DraftError> {
        if self.is_active(token) {
            Ok(())
        } else {
            Err(DraftError::StaleDraft { token })
        }
    }

    fn draft_ref(&self) -> Result<&PersonaDraft, DraftError> {
        self.draft.as_ref().ok_or(DraftError::NoActiveDraft)
    }

    fn draft_mut(&mut self) -> Result<&mut PersonaDraft, DraftError> {
        self.draft.as_mut().ok_or(DraftError::NoActiveDraft)
    }
}

/// Phase a freshly started draft rests in.
fn resting_phase(draft: &PersonaDraft) -> DraftPhase {
    if draft.has_content() {
        DraftPhase::Populated
    } else if draft.has_description() {
        DraftPhase::Describing
    } else {
        DraftPhase::Empty
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn started() -> DraftController {
        let mut controller = DraftController::new();
        controller.start_draft(None);
        controller
    }

    fn goals(controller: &DraftController) -> Vec<String> {
        controller.draft().unwrap().goals.clone()
    }

    #[test]
    fn test_start_draft_initializes_empty_lists() {
        let controller = started();
        let draft = controller.draft().unwrap();
        assert!(draft.goals.is_empty());
        assert!(draft.frustrations.is_empty());
        assert_eq!(controller.phase(), DraftPhase::Empty);
    }

    #[test]
    fn test_start_draft_replaces_previous_draft() {
        let mut controller = started();
        controller.set_field(PersonaField::Name, json!("Old")).unwrap();
        let first = controller.token();

        let second = controller.start_draft(None);
        assert_ne!(first, second);
        assert_eq!(controller.draft().unwrap().name, None);
    }

    #[test]
    fn test_start_draft_with_seed_is_populated() {
        let mut controller = DraftController::new();
        let seed = PersonaDraft {
            name: Some("Jordan".to_owned()),
            ..PersonaDraft::default()
        };
        controller.start_draft(Some(seed));
        assert_eq!(controller.phase(), DraftPhase::Populated);
    }

    #[test]
    fn test_mutations_require_a_draft() {
        let mut controller = DraftController::new();
        assert!(matches!(
            controller.set_field(PersonaField::Name, json!("x")),
            Err(DraftError::NoActiveDraft)
        ));
        assert!(matches!(
            controller.append_list_item(ListField::Goals, "x"),
            Err(DraftError::NoActiveDraft)
        ));
        assert!(matches!(controller.commit(), Err(DraftError::NoActiveDraft)));
    }

    #[test]
    fn test_set_field_shapes() {
        let mut controller = started();
        controller.set_field(PersonaField::Age, json!("29")).unwrap();
        controller
            .set_field(PersonaField::List(ListField::Goals), json!(["a", "b"]))
            .unwrap();
        assert_eq!(goals(&controller), vec!["a", "b"]);

        let err = controller
            .set_field(PersonaField::Name, json!(42))
            .unwrap_err();
        assert!(matches!(err, DraftError::FieldShape { .. }));

        let err = controller
            .set_field(PersonaField::List(ListField::Goals), json!("a"))
            .unwrap_err();
        assert!(matches!(err, DraftError::FieldShape { .. }));
        assert_eq!(goals(&controller), vec!["a", "b"]);
    }

    #[test]
    fn test_set_field_null_clears() {
        let mut controller = started();
        controller.set_field(PersonaField::Bio, json!("Runs marathons")).unwrap();
        controller.set_field(PersonaField::Bio, Value::Null).unwrap();
        assert_eq!(controller.draft().unwrap().bio, None);
    }

    #[test]
    fn test_set_demographics() {
        let mut controller = started();
        controller
            .set_field(
                PersonaField::Demographics,
                json!({"location": "Austin", "familyStatus": "Single"}),
            )
            .unwrap();
        let demographics = controller.draft().unwrap().demographics.clone().unwrap();
        assert_eq!(demographics.location, "Austin");
        assert_eq!(demographics.family_status, "Single");
        assert_eq!(demographics.income, "");
    }

    #[test]
    fn test_append_ignores_blank_items() {
        let mut controller = started();
        assert!(!controller.append_list_item(ListField::Goals, "").unwrap());
        assert!(!controller.append_list_item(ListField::Goals, "   ").unwrap());
        assert!(goals(&controller).is_empty());
        assert_eq!(controller.phase(), DraftPhase::Empty);
    }

    #[test]
    fn test_append_adds_trimmed_item_last() {
        let mut controller = started();
        controller.append_list_item(ListField::Goals, "Ship faster").unwrap();
        assert!(controller.append_list_item(ListField::Goals, "  Learn Go ").unwrap());
        assert_eq!(goals(&controller), vec!["Ship faster", "Learn Go"]);
        assert_eq!(controller.phase(), DraftPhase::Populated);
    }

    #[test]
    fn test_remove_shifts_items() {
        let mut controller = started();
        for item in ["a", "b", "c", "d"] {
            controller.append_list_item(ListField::Frustrations, item).unwrap();
        }
        let removed = controller.remove_list_item(ListField::Frustrations, 1).unwrap();
        assert_eq!(removed, "b");
        assert_eq!(
            controller.draft().unwrap().frustrations,
            vec!["a", "c", "d"]
        );
    }

    #[test]
    fn test_remove_every_valid_index() {
        let items = ["a", "b", "c"];
        for i in 0..items.len() {
            let mut controller = started();
            for item in items {
                controller.append_list_item(ListField::Goals, item).unwrap();
            }
            controller.remove_list_item(ListField::Goals, i).unwrap();

            let mut expected: Vec<&str> = items.to_vec();
            expected.remove(i);
            assert_eq!(goals(&controller), expected);
        }
    }

    #[test]
    fn test_remove_out_of_range_leaves_list() {
        let mut controller = started();
        controller.append_list_item(ListField::Goals, "only").unwrap();

        let err = controller.remove_list_item(ListField::Goals, 1).unwrap_err();
        assert!(matches!(
            err,
            DraftError::OutOfRange {
                list: ListField::Goals,
                index: 1,
                len: 1
            }
        ));
        let err = controller.remove_list_item(ListField::Goals, usize::MAX).unwrap_err();
        assert!(matches!(err, DraftError::OutOfRange { .. }));
        assert_eq!(goals(&controller), vec!["only"]);
    }

    #[test]
    fn test_remove_from_empty_list() {
        let mut controller = started();
        assert!(matches!(
            controller.remove_list_item(ListField::Behaviors, 0),
            Err(DraftError::OutOfRange { len: 0, .. })
        ));
    }

    #[test]
    fn test_commit_requires_name() {
        let mut controller = started();
        controller.set_field(PersonaField::Name, json!("   ")).unwrap();
        controller.append_list_item(ListField::Goals, "Keep me").unwrap();
        let before = controller.draft().unwrap().clone();

        assert!(matches!(controller.commit(), Err(DraftError::ValidationFailed)));
        assert_eq!(controller.draft().unwrap(), &before);
        assert_eq!(controller.phase(), DraftPhase::Populated);
    }

    #[test]
    fn test_commit_after_fixing_name() {
        let mut controller = started();
        controller.set_field(PersonaField::Name, json!("")).unwrap();
        assert!(matches!(controller.commit(), Err(DraftError::ValidationFailed)));

        controller.set_field(PersonaField::Name, json!("Sarah Chen")).unwrap();
        let persona = controller.commit().unwrap();
        assert!(!persona.id.as_str().is_empty());
        assert_eq!(persona.name, "Sarah Chen");
        assert_eq!(persona.age, 0);
        assert!(persona.goals.is_empty());
        assert_eq!(controller.phase(), DraftPhase::Saved);
        assert!(controller.draft().is_none());
    }

    #[test]
    fn test_commit_coerces_age_and_drops_description() {
        let mut controller = started();
        controller.set_description("A budgeting app").unwrap();
        controller.set_field(PersonaField::Name, json!("Priya")).unwrap();
        controller.set_field(PersonaField::Age, json!("37")).unwrap();
        let persona = controller.commit().unwrap();
        assert_eq!(persona.age, 37);

        let value = serde_json::to_value(&persona).unwrap();
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_committed_lists_do_not_alias_new_draft() {
        let mut controller = started();
        controller.set_field(PersonaField::Name, json!("Ana")).unwrap();
        controller.append_list_item(ListField::Goals, "Save money").unwrap();
        let persona = controller.commit().unwrap();

        controller.start_draft(Some(PersonaDraft::from(&persona)));
        controller.append_list_item(ListField::Goals, "Travel").unwrap();
        controller.remove_list_item(ListField::Goals, 0).unwrap();

        assert_eq!(persona.goals, vec!["Save money"]);
    }

    #[test]
    fn test_discard_is_terminal() {
        let mut controller = started();
        let token = controller.token();
        assert!(controller.discard_draft());
        assert_eq!(controller.phase(), DraftPhase::Discarded);
        assert!(!controller.is_active(token));
        assert!(!controller.discard_draft());
    }

    #[test]
    fn test_description_moves_between_empty_and_describing() {
        let mut controller = started();
        controller.set_description("A fitness app").unwrap();
        assert_eq!(controller.phase(), DraftPhase::Describing);
        controller.set_description("  ").unwrap();
        assert_eq!(controller.phase(), DraftPhase::Empty);
    }

    #[test]
    fn test_generation_success_populates() {
        let mut controller = started();
        controller.set_description("A fitness app for busy professionals").unwrap();
        let token = controller.begin_generation().unwrap();
        assert_eq!(controller.phase(), DraftPhase::Generating);
        assert!(matches!(
            controller.begin_generation(),
            Err(DraftError::GenerationInFlight)
        ));

        let payload = json!({"name": "Alex Kim", "age": 29, "goals": ["Stay fit"]});
        let Value::Object(map) = payload else { unreachable!() };
        let generated = PersonaDraft::from_payload(map).unwrap();
        controller.finish_generation(token, generated).unwrap();

        let draft = controller.draft().unwrap();
        assert_eq!(controller.phase(), DraftPhase::Populated);
        assert_eq!(draft.name.as_deref(), Some("Alex Kim"));
        assert_eq!(draft.age, Some(json!(29)));
        assert_eq!(draft.goals, vec!["Stay fit"]);
        assert!(draft.frustrations.is_empty());
        assert_eq!(draft.profile_picture, None);
        assert_eq!(
            draft.description.as_deref(),
            Some("A fitness app for busy professionals")
        );
    }

    #[test]
    fn test_generation_failure_restores_phase() {
        let mut controller = started();
        controller.set_description("A fitness app").unwrap();
        let before = controller.draft().unwrap().clone();
        let token = controller.begin_generation().unwrap();
        controller.fail_generation(token);
        assert_eq!(controller.phase(), DraftPhase::Describing);
        assert_eq!(controller.draft().unwrap(), &before);
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let mut controller = started();
        let token = controller.begin_generation().unwrap();
        controller.start_draft(None);
        controller.set_field(PersonaField::Name, json!("Newer")).unwrap();

        let generated = PersonaDraft {
            name: Some("Stale".to_owned()),
            ..PersonaDraft::default()
        };
        assert!(matches!(
            controller.finish_generation(token, generated),
            Err(DraftError::StaleDraft { .. })
        ));
        assert_eq!(controller.draft().unwrap().name.as_deref(), Some("Newer"));
    }

    #[test]
    fn test_generation_after_discard_is_dropped() {
        let mut controller = started();
        let token = controller.begin_generation().unwrap();
        controller.discard_draft();
        assert!(matches!(
            controller.finish_generation(token, PersonaDraft::default()),
            Err(DraftError::StaleDraft { .. })
        ));
        assert!(controller.draft().is_none());
        assert_eq!(controller.phase(), DraftPhase::Discarded);
    }

    #[test]
    fn test_regeneration_is_tracked_per_field() {
        let mut controller = started();
        controller.set_field(PersonaField::Name, json!("Alex")).unwrap();

        let token = controller.begin_regeneration(PersonaField::Bio).unwrap();
        controller
            .begin_regeneration(PersonaField::List(ListField::Goals))
            .unwrap();
        assert!(matches!(
            controller.begin_regeneration(PersonaField::Bio),
            Err(DraftError::AlreadyRegenerating(PersonaField::Bio))
        ));

        // Other fields stay editable.
        controller.set_field(PersonaField::Occupation, json!("Nurse")).unwrap();

        controller
            .finish_regeneration(token, PersonaField::Bio, json!("New bio"))
            .unwrap();
        assert_eq!(controller.draft().unwrap().bio.as_deref(), Some("New bio"));
        assert_eq!(controller.regenerating().len(), 1);

        controller.fail_regeneration(token, PersonaField::List(ListField::Goals));
        assert!(controller.regenerating().is_empty());
    }

    #[test]
    fn test_regeneration_needs_populated_draft() {
        let mut controller = started();
        assert!(matches!(
            controller.begin_regeneration(PersonaField::Name),
            Err(DraftError::NotPopulated(DraftPhase::Empty))
        ));
    }

    #[test]
    fn test_stale_regeneration_is_dropped() {
        let mut controller = started();
        controller.set_field(PersonaField::Name, json!("Alex")).unwrap();
        let token = controller.begin_regeneration(PersonaField::Name).unwrap();
        controller.discard_draft();
        controller.start_draft(None);

        assert!(matches!(
            controller.finish_regeneration(token, PersonaField::Name, json!("Stale")),
            Err(DraftError::StaleDraft { .. })
        ));
        assert_eq!(controller.draft().unwrap().name, None);
    }

    #[test]
    fn test_full_generation_waits_for_regenerations() {
        let mut controller = started();
        controller.set_description("A fitness app").unwrap();
        controller.set_field(PersonaField::Name, json!("Alex")).unwrap();
        let token = controller.begin_regeneration(PersonaField::Bio).unwrap();

        assert!(matches!(
            controller.begin_generation(),
            Err(DraftError::RegenerationInFlight(PersonaField::Bio))
        ));
        assert_eq!(controller.phase(), DraftPhase::Populated);

        controller
            .finish_regeneration(token, PersonaField::Bio, json!("Fresh bio"))
            .unwrap();
        let token = controller.begin_generation().unwrap();
        let generated = PersonaDraft {
            name: Some("Brand New".to_owned()),
            bio: Some("New persona bio".to_owned()),
            ..PersonaDraft::default()
        };
        controller.finish_generation(token, generated).unwrap();

        let draft = controller.draft().unwrap();
        assert_eq!(draft.name.as_deref(), Some("Brand New"));
        assert_eq!(draft.bio.as_deref(), Some("New persona bio"));
    }

    #[test]
    fn test_ensure_committable_leaves_draft_alone() {
        let mut controller = started();
        assert!(matches!(
            controller.ensure_committable(),
            Err(DraftError::ValidationFailed)
        ));
        controller.set_field(PersonaField::Name, json!("Lee")).unwrap();
        controller.ensure_committable().unwrap();
        assert_eq!(controller.phase(), DraftPhase::Populated);
        assert!(controller.draft().is_some());

        controller.discard_draft();
        assert!(matches!(
            controller.ensure_committable(),
            Err(DraftError::NoActiveDraft)
        ));
    }

    #[test]
    fn test_persona_snapshot_omits_description() {
        let mut controller = started();
        controller.set_description("secret prompt").unwrap();
        controller.set_field(PersonaField::Name, json!("Alex")).unwrap();
        let snapshot = controller.draft().unwrap().persona_snapshot();
        assert_eq!(snapshot["name"], "Alex");
        assert!(snapshot.get("description").is_none());
        assert_eq!(snapshot["goals"], json!([]));
    }

    #[test]
    fn test_from_payload_rejects_wrong_types() {
        let Value::Object(map) = json!({"name": 7}) else { unreachable!() };
        assert!(matches!(
            PersonaDraft::from_payload(map),
            Err(DraftError::MalformedPayload(_))
        ));
    }
}
