//! In-memory collection of committed personas.

use std::collections::HashMap;

use crate::types::{Persona, PersonaId};

/// Errors raised by persona mutations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("persona {0} not found")]
    NotFound(PersonaId),
}

/// Ordered, append-only list of committed personas.
///
/// Iteration yields personas in insertion order. Lookups by id go through a
/// side index; when two personas share an id the first one inserted wins.
#[derive(Debug, Default, Clone)]
pub struct PersonaCollection {
    personas: Vec<Persona>,
    index: HashMap<PersonaId, usize>,
}

impl PersonaCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a persona at the end of the collection.
    pub fn add(&mut self, persona: Persona) {
        self.index
            .entry(persona.id.clone())
            .or_insert(self.personas.len());
        self.personas.push(persona);
    }

    #[must_use]
    pub fn find_by_id(&self, id: &PersonaId) -> Option<&Persona> {
        self.index.get(id).and_then(|&i| self.personas.get(i))
    }

    /// Personas in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Persona] {
        &self.personas
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.personas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, persona) in self.personas.iter().enumerate() {
            self.index.entry(persona.id.clone()).or_insert(i);
        }
    }
}

impl<'a> IntoIterator for &'a PersonaCollection {
    type Item = &'a Persona;
    type IntoIter = std::slice::Iter<'a, Persona>;

    fn into_iter(self) -> Self::IntoIter {
        self.personas.iter()
    }
}

/// Edits to personas that are already committed.
///
/// The HTTP surface only ever appends; these exist for callers that manage a
/// collection directly.
pub trait PersonaMutations {
    /// Replace the persona with the same id, keeping its position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no persona has that id.
    fn replace(&mut self, persona: Persona) -> Result<Persona, StoreError>;

    /// Remove the persona with `id`, keeping the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no persona has that id.
    fn remove(&mut self, id: &PersonaId) -> Result<Persona, StoreError>;
}

impl PersonaMutations for PersonaCollection {
    fn replace(&mut self, persona: Persona) -> Result<Persona, StoreError> {
        let i = *self
            .index
            .get(&persona.id)
            .ok_or_else(|| StoreError::NotFound(persona.id.clone()))?;
        let slot = self
            .personas
            .get_mut(i)
            .ok_or_else(|| StoreError::NotFound(persona.id.clone()))?;
        Ok(std::mem::replace(slot, persona))
    }

    fn remove(&mut self, id: &PersonaId) -> Result<Persona, StoreError> {
        let i = *self
            .index
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let removed = self.personas.remove(i);
        self.reindex();
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::sample_persona;

    fn persona(id: &str, name: &str) -> Persona {
        Persona {
            id: PersonaId::parse(id).unwrap(),
            name: name.to_owned(),
            ..sample_persona(Utc::now())
        }
    }

    fn names(collection: &PersonaCollection) -> Vec<&str> {
        collection.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut collection = PersonaCollection::new();
        collection.add(persona("a", "A"));
        collection.add(persona("b", "B"));
        collection.add(persona("c", "C"));
        assert_eq!(names(&collection), vec!["A", "B", "C"]);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_find_by_id() {
        let mut collection = PersonaCollection::new();
        collection.add(persona("a", "A"));
        collection.add(persona("b", "B"));
        assert_eq!(
            collection.find_by_id(&PersonaId::parse("b").unwrap()).unwrap().name,
            "B"
        );
        assert!(collection.find_by_id(&PersonaId::parse("z").unwrap()).is_none());
    }

    #[test]
    fn test_duplicate_ids_resolve_to_first() {
        let mut collection = PersonaCollection::new();
        collection.add(persona("same", "First"));
        collection.add(persona("same", "Second"));
        assert_eq!(collection.len(), 2);
        assert_eq!(
            collection.find_by_id(&PersonaId::parse("same").unwrap()).unwrap().name,
            "First"
        );
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut collection = PersonaCollection::new();
        collection.add(persona("a", "A"));
        collection.add(persona("b", "B"));

        let old = collection.replace(persona("a", "A2")).unwrap();
        assert_eq!(old.name, "A");
        assert_eq!(names(&collection), vec!["A2", "B"]);

        assert_eq!(
            collection.replace(persona("x", "X")),
            Err(StoreError::NotFound(PersonaId::parse("x").unwrap()))
        );
    }

    #[test]
    fn test_remove_reindexes() {
        let mut collection = PersonaCollection::new();
        collection.add(persona("a", "A"));
        collection.add(persona("b", "B"));
        collection.add(persona("c", "C"));

        collection.remove(&PersonaId::parse("a").unwrap()).unwrap();
        assert_eq!(names(&collection), vec!["B", "C"]);
        assert_eq!(
            collection.find_by_id(&PersonaId::parse("c").unwrap()).unwrap().name,
            "C"
        );
        assert!(collection.remove(&PersonaId::parse("a").unwrap()).is_err());
    }
}
