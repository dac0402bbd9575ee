//! Core types for Persona Studio.
//!
//! This module provides type-safe wrappers for the persona domain.

pub mod field;
pub mod id;
pub mod persona;
pub mod status;

pub use field::{ListField, PersonaField, UnknownFieldError};
pub use id::{DraftToken, PersonaId, PersonaIdError};
pub use persona::{Demographics, Persona, coerce_age, sample_persona};
pub use status::DraftPhase;
