//! Field names of a persona.
//!
//! Field names travel over the wire in the camelCase form used by the
//! generator (`painPoints`, `profilePicture`). Parsing also accepts the
//! snake_case spelling and the `avatar` alias.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a persona field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown persona field: {0}")]
pub struct UnknownFieldError(pub String);

/// A list-valued persona field.
///
/// Order inside each list is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListField {
    Goals,
    Frustrations,
    Behaviors,
    PainPoints,
    Motivations,
    PersonalityTraits,
    PreferredChannels,
}

impl ListField {
    /// Every list field, in display order.
    pub const ALL: [Self; 7] = [
        Self::Goals,
        Self::Frustrations,
        Self::Behaviors,
        Self::PainPoints,
        Self::Motivations,
        Self::PersonalityTraits,
        Self::PreferredChannels,
    ];

    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Goals => "goals",
            Self::Frustrations => "frustrations",
            Self::Behaviors => "behaviors",
            Self::PainPoints => "painPoints",
            Self::Motivations => "motivations",
            Self::PersonalityTraits => "personalityTraits",
            Self::PreferredChannels => "preferredChannels",
        }
    }

    /// Human-readable section title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Goals => "Goals",
            Self::Frustrations => "Frustrations",
            Self::Behaviors => "Behaviors",
            Self::PainPoints => "Pain Points",
            Self::Motivations => "Motivations",
            Self::PersonalityTraits => "Personality Traits",
            Self::PreferredChannels => "Preferred Channels",
        }
    }
}

impl fmt::Display for ListField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "goals" => Ok(Self::Goals),
            "frustrations" => Ok(Self::Frustrations),
            "behaviors" => Ok(Self::Behaviors),
            "painPoints" | "pain_points" => Ok(Self::PainPoints),
            "motivations" => Ok(Self::Motivations),
            "personalityTraits" | "personality_traits" => Ok(Self::PersonalityTraits),
            "preferredChannels" | "preferred_channels" => Ok(Self::PreferredChannels),
            _ => Err(UnknownFieldError(s.to_owned())),
        }
    }
}

/// Any persona field that can be set or regenerated on a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PersonaField {
    Name,
    Age,
    Gender,
    Occupation,
    Location,
    Bio,
    Background,
    Demographics,
    ProfilePicture,
    List(ListField),
}

impl PersonaField {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Occupation => "occupation",
            Self::Location => "location",
            Self::Bio => "bio",
            Self::Background => "background",
            Self::Demographics => "demographics",
            Self::ProfilePicture => "profilePicture",
            Self::List(list) => list.as_str(),
        }
    }
}

impl fmt::Display for PersonaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PersonaField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "age" => Ok(Self::Age),
            "gender" => Ok(Self::Gender),
            "occupation" => Ok(Self::Occupation),
            "location" => Ok(Self::Location),
            "bio" => Ok(Self::Bio),
            "background" => Ok(Self::Background),
            "demographics" => Ok(Self::Demographics),
            "profilePicture" | "profile_picture" | "avatar" => Ok(Self::ProfilePicture),
            other => other.parse::<ListField>().map(Self::List),
        }
    }
}

impl TryFrom<String> for PersonaField {
    type Error = UnknownFieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PersonaField> for String {
    fn from(field: PersonaField) -> Self {
        field.as_str().to_owned()
    }
}

impl From<ListField> for PersonaField {
    fn from(list: ListField) -> Self {
        Self::List(list)
    }
}
