//! Request and response bodies exchanged with the persona generator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body accepted by `POST /generate-persona` from browser clients.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePersonaRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default, alias = "current_persona")]
    pub current_persona: Option<Value>,
}

/// Body sent upstream to `{base}/generate-persona`.
#[derive(Debug, Serialize)]
pub(super) struct UpstreamPersonaRequest<'a> {
    pub description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_persona: Option<&'a Value>,
}

/// Body of `POST /generate-image`, both from clients and upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvatarRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Value,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl AvatarRequest {
    /// Pick the avatar inputs out of a generated persona.
    ///
    /// Returns `None` unless the persona has a non-empty name.
    #[must_use]
    pub fn from_persona(persona: &Map<String, Value>) -> Option<Self> {
        let text = |key: &str| persona.get(key).and_then(Value::as_str).map(str::to_owned);

        let name = text("name").filter(|n| !n.trim().is_empty())?;
        Some(Self {
            name,
            age: persona.get("age").cloned().unwrap_or(Value::Null),
            gender: text("gender"),
            occupation: text("occupation"),
            bio: text("bio"),
        })
    }
}

/// Response of the image endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    pub url: String,
}
