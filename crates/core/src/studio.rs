//! The single-client workspace.

use std::sync::Arc;

use chrono::Utc;

use crate::description::{DescriptionStore, DescriptionStoreError};
use crate::draft::{DraftController, DraftError, PersonaDraft};
use crate::store::PersonaCollection;
use crate::types::{DraftToken, Persona, PersonaId, sample_persona};

/// One draft controller, one persona collection and the description store
/// they share.
pub struct Studio {
    drafts: DraftController,
    personas: PersonaCollection,
    descriptions: Arc<dyn DescriptionStore>,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("drafts", &self.drafts)
            .field("personas", &self.personas.len())
            .finish_non_exhaustive()
    }
}

impl Studio {
    /// Create an empty studio.
    #[must_use]
    pub fn new(descriptions: Arc<dyn DescriptionStore>) -> Self {
        Self {
            drafts: DraftController::new(),
            personas: PersonaCollection::new(),
            descriptions,
        }
    }

    /// Create a studio whose collection starts with the sample persona.
    #[must_use]
    pub fn with_sample_persona(descriptions: Arc<dyn DescriptionStore>) -> Self {
        let mut studio = Self::new(descriptions);
        studio.personas.add(sample_persona(Utc::now()));
        studio
    }

    #[must_use]
    pub const fn drafts(&self) -> &DraftController {
        &self.drafts
    }

    pub const fn drafts_mut(&mut self) -> &mut DraftController {
        &mut self.drafts
    }

    #[must_use]
    pub const fn personas(&self) -> &PersonaCollection {
        &self.personas
    }

    /// Start a draft.
    ///
    /// A seed without a description picks up the saved one.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::Persistence`] if the description cannot be
    /// loaded.
    pub fn start_draft(&mut self, seed: Option<PersonaDraft>) -> Result<DraftToken, DraftError> {
        let mut draft = seed.unwrap_or_default();
        if draft.description.is_none() {
            draft.description = self.descriptions.load()?;
        }
        Ok(self.drafts.start_draft(Some(draft)))
    }

    /// Start a draft seeded from a committed persona.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::UnknownPersona`] if no persona has that id.
    pub fn edit_persona(&mut self, id: &PersonaId) -> Result<DraftToken, DraftError> {
        let seed = self
            .personas
            .find_by_id(id)
            .map(PersonaDraft::from)
            .ok_or_else(|| DraftError::UnknownPersona(id.clone()))?;
        self.start_draft(Some(seed))
    }

    /// Set the draft's description and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::NoActiveDraft`] without a draft, or
    /// [`DraftError::Persistence`] if saving fails.
    pub fn save_description(&mut self, description: &str) -> Result<(), DraftError> {
        self.drafts.draft().ok_or(DraftError::NoActiveDraft)?;
        self.descriptions.save(description)?;
        self.drafts.set_description(description)
    }

    /// The persisted description.
    ///
    /// # Errors
    ///
    /// Returns an error if the description store cannot be read.
    pub fn description(&self) -> Result<Option<String>, DescriptionStoreError> {
        self.descriptions.load()
    }

    /// Commit the active draft into the collection.
    ///
    /// A non-blank description on the draft is persisted as well.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::ValidationFailed`] without a name or
    /// [`DraftError::Persistence`] if the description cannot be saved. Either
    /// way nothing is stored and the draft stays active.
    pub fn commit(&mut self) -> Result<Persona, DraftError> {
        self.drafts.ensure_committable()?;

        let description = self
            .drafts
            .draft()
            .filter(|d| d.has_description())
            .and_then(|d| d.description.clone());
        if let Some(description) = description {
            self.descriptions.save(&description)?;
        }

        let persona = self.drafts.commit()?;
        self.personas.add(persona.clone());
        Ok(persona)
    }
}
