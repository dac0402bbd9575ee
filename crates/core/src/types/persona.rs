//! Committed persona records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::field::ListField;
use super::id::PersonaId;

/// Demographic details owned by a single persona.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Demographics {
    pub location: String,
    pub education: String,
    pub income: String,
    pub family_status: String,
}

/// A committed persona.
///
/// Personas are created by [`DraftController::commit`] and never change once
/// they are in a [`PersonaCollection`]. Lists are owned copies of the draft's
/// lists at commit time.
///
/// [`DraftController::commit`]: crate::draft::DraftController::commit
/// [`PersonaCollection`]: crate::store::PersonaCollection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: PersonaId,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub background: String,
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
    pub created_at: DateTime<Utc>,
}

impl Persona {
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
}

/// Coerce a loosely typed age into a whole number of years.
///
/// Numbers and numeric strings are truncated toward zero. Anything absent,
/// negative, non-finite or non-numeric becomes 0.
///
/// ```
/// use persona_studio_core::coerce_age;
/// use serde_json::json;
///
/// assert_eq!(coerce_age(Some(&json!(29))), 29);
/// assert_eq!(coerce_age(Some(&json!("41"))), 41);
/// assert_eq!(coerce_age(Some(&json!("forty"))), 0);
/// assert_eq!(coerce_age(None), 0);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to the u32 range first
pub fn coerce_age(value: Option<&Value>) -> u32 {
    let years = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match years {
        Some(y) if y.is_finite() && y >= 0.0 => y.trunc().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

/// The example persona shown on a fresh studio.
#[must_use]
pub fn sample_persona(created_at: DateTime<Utc>) -> Persona {
    let owned = |items: &[&str]| items.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>();

    Persona {
        id: PersonaId::from_static("1"),
        name: "Sarah Chen".to_owned(),
        age: 32,
        gender: String::new(),
        occupation: "Digital Marketing Manager".to_owned(),
        location: "San Francisco Bay Area".to_owned(),
        bio: String::new(),
        background: "Sarah has worked in digital marketing for 8 years, starting as a content \
                     writer before moving into management. She values data-driven decision \
                     making and is always looking for ways to optimize campaigns."
            .to_owned(),
        demographics: Some(Demographics {
            location: "San Francisco Bay Area".to_owned(),
            education: "Master's in Marketing".to_owned(),
            income: "$95,000/year".to_owned(),
            family_status: "Married, no children".to_owned(),
        }),
        goals: owned(&[
            "Streamline marketing workflows",
            "Stay ahead of digital trends",
            "Improve work-life balance",
        ]),
        frustrations: Vec::new(),
        behaviors: owned(&[
            "Early adopter of new technologies",
            "Heavy mobile device user",
            "Prefers video content for learning",
        ]),
        pain_points: owned(&[
            "Difficulty managing multiple marketing platforms",
            "Struggles with data analysis",
            "Limited time for strategic planning",
        ]),
        motivations: owned(&[
            "Career advancement",
            "Professional development",
            "Making meaningful impact",
        ]),
        personality_traits: owned(&["Analytical", "Creative", "Detail-oriented"]),
        preferred_channels: owned(&["Slack", "LinkedIn", "Email", "Virtual meetings"]),
        profile_picture: None,
        created_at,
    }
}
