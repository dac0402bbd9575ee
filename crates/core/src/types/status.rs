//! Lifecycle phases of a persona draft.
//!
//! ```text
//! Inactive --start--> Empty --description--> Describing --generate--> Generating
//!                                                                        |
//!                     (failure: back to the phase before) <--------------+
//!                                                                        |
//!                                      Populated <-------(success)-------+
//!                                          |
//!                         commit: Saved    |    discard: Discarded
//! ```
//!
//! Field regeneration does not change the phase; it is tracked per field by
//! the draft controller.

use serde::{Deserialize, Serialize};

/// Where a draft is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DraftPhase {
    /// No draft has been started yet.
    #[default]
    Inactive,
    /// A draft exists but has no description and no content.
    Empty,
    /// A description has been entered; nothing generated yet.
    Describing,
    /// A full generation request is in flight.
    Generating,
    /// The draft has persona content (generated or typed in).
    Populated,
    /// The draft was committed. Terminal.
    Saved,
    /// The draft was thrown away. Terminal.
    Discarded,
}

impl DraftPhase {
    /// Whether a draft is live in this phase.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(
            self,
            Self::Empty | Self::Describing | Self::Generating | Self::Populated
        )
    }

    /// Whether the phase ends a draft instance.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Saved | Self::Discarded)
    }
}

impl std::fmt::Display for DraftPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Empty => write!(f, "empty"),
            Self::Describing => write!(f, "describing"),
            Self::Generating => write!(f, "generating"),
            Self::Populated => write!(f, "populated"),
            Self::Saved => write!(f, "saved"),
            Self::Discarded => write!(f, "discarded"),
        }
    }
}
