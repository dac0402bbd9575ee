//! Persona Studio Core - Persona drafting and collection types.
//!
//! This crate provides the domain model shared by the Persona Studio server
//! and its tests:
//! - `studio` - The persona web service (routes, generation gateway, config)
//! - `integration-tests` - End-to-end tests against a stub generator
//!
//! # Architecture
//!
//! The core crate contains only types, state machines and traits - no HTTP
//! clients, no file access. Persistence of the product description is
//! delegated to an injected [`DescriptionStore`].
//!
//! # Modules
//!
//! - [`types`] - Persona records, identifiers, field names and draft phases
//! - [`draft`] - The draft controller (start, patch, list edits, commit)
//! - [`store`] - Insertion-ordered collection of committed personas
//! - [`description`] - Persistence seam for the product description
//! - [`studio`] - Single-client workspace tying the pieces together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod description;
pub mod draft;
pub mod store;
pub mod studio;
pub mod types;

pub use description::{DESCRIPTION_KEY, DescriptionStore, DescriptionStoreError, MemoryDescriptionStore};
pub use draft::{DraftController, DraftError, PersonaDraft};
pub use store::{PersonaCollection, PersonaMutations, StoreError};
pub use studio::Studio;
pub use types::*;
