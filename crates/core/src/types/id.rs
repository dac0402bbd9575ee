//! Identifiers for committed personas and draft instances.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when parsing a [`PersonaId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PersonaIdError {
    /// The input string is empty or whitespace.
    #[error("persona id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("persona id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Opaque identifier of a committed persona.
///
/// Freshly committed personas get a random UUID v4 token. Identifiers coming
/// from clients (route parameters, edit requests) are accepted as any
/// non-empty string so that ids minted elsewhere keep resolving.
///
/// ## Examples
///
/// ```
/// use persona_studio_core::PersonaId;
///
/// let id = PersonaId::generate();
/// assert!(!id.as_str().is_empty());
///
/// assert!(PersonaId::parse("1").is_ok());
/// assert!(PersonaId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonaId(String);

impl PersonaId {
    /// Maximum length of an identifier accepted from clients.
    pub const MAX_LENGTH: usize = 64;

    /// Mint a new random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse a `PersonaId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank or longer than 64 characters.
    pub fn parse(s: &str) -> Result<Self, PersonaIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PersonaIdError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(PersonaIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PersonaId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Build an id from a literal known to be valid.
    pub(crate) fn from_static(id: &'static str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PersonaId {
    type Err = PersonaIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PersonaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifies one draft instance inside a [`DraftController`].
///
/// Every `start_draft` mints a new token. Asynchronous generation results
/// carry the token they were started under and are only merged while that
/// token still names the active draft.
///
/// [`DraftController`]: crate::draft::DraftController
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftToken(u64);

impl DraftToken {
    /// Create a token from a raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the underlying u64 value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The token that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for DraftToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
