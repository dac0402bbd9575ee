//! Client for the upstream persona generator.
//!
//! The generator exposes two endpoints:
//! - `POST {base}/generate-persona` - full persona, or one field when `field`
//!   is set
//! - `POST {base}/generate-image` - avatar URL for a persona
//!
//! The client makes exactly one attempt per call and never touches draft
//! state. Callers merge results into the draft controller themselves.

mod types;

pub use types::{AvatarRequest, GeneratePersonaRequest, ImageResponse};

use persona_studio_core::{PersonaDraft, PersonaField};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::GeneratorConfig;
use types::UpstreamPersonaRequest;

/// Errors that can occur when talking to the persona generator.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The description was blank; nothing was sent.
    #[error("Description is required")]
    EmptyInput,

    /// Network failure, non-2xx response or unreadable body.
    #[error("persona generation failed: {message}")]
    GenerationFailed {
        /// Upstream HTTP status, if a response arrived.
        status: Option<u16>,
        message: String,
    },

    /// The image endpoint failed.
    #[error("image generation failed: {0}")]
    ImageGenerationFailed(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// The configured base URL cannot take endpoint paths.
    #[error("invalid generator URL: {0}")]
    InvalidBaseUrl(String),
}

impl GatewayError {
    fn failed(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            status,
            message: message.into(),
        }
    }
}

/// Persona generator client.
#[derive(Clone, Debug)]
pub struct GenerationClient {
    client: reqwest::Client,
    persona_url: Url,
    image_url: Url,
}

impl GenerationClient {
    /// Create a new generator client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the base URL
    /// cannot be extended with endpoint paths.
    pub fn new(config: &GeneratorConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            persona_url: endpoint(&config.base_url, "generate-persona")?,
            image_url: endpoint(&config.base_url, "generate-image")?,
        })
    }

    /// Generate a full persona from a description.
    ///
    /// When the generated persona has a name an avatar is requested as well;
    /// its URL lands in `profilePicture`. Avatar failures are logged and
    /// otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EmptyInput`] for a blank description (no
    /// request is made) and [`GatewayError::GenerationFailed`] if the
    /// generator fails or does not return a JSON object.
    #[instrument(skip(self, description))]
    pub async fn generate_full(&self, description: &str) -> Result<Map<String, Value>, GatewayError> {
        let request = GeneratePersonaRequest {
            description: Some(description.to_owned()),
            ..GeneratePersonaRequest::default()
        };
        match self.forward(&request).await? {
            Value::Object(persona) => Ok(persona),
            _ => Err(GatewayError::failed(None, "generator did not return an object")),
        }
    }

    /// Regenerate one field of a draft.
    ///
    /// The rest of the draft is sent along as context. Only the requested
    /// field is taken from the response.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EmptyInput`] for a blank description and
    /// [`GatewayError::GenerationFailed`] if the call fails or the response
    /// lacks the field.
    #[instrument(skip(self, description, draft), fields(field = %field))]
    pub async fn regenerate_field(
        &self,
        description: &str,
        field: PersonaField,
        draft: &PersonaDraft,
    ) -> Result<Value, GatewayError> {
        let request = GeneratePersonaRequest {
            description: Some(description.to_owned()),
            field: Some(field.as_str().to_owned()),
            current_persona: Some(draft.persona_snapshot()),
        };
        let response = self.forward(&request).await?;

        response
            .get(field.as_str())
            .cloned()
            .ok_or_else(|| GatewayError::failed(None, format!("response has no {field}")))
    }

    /// Pass a client request through to the generator.
    ///
    /// The generator's body is returned unchanged, except that a full
    /// generation (no `field`) gets a `profilePicture` when the avatar call
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::EmptyInput`] for a blank description and
    /// [`GatewayError::GenerationFailed`] if the call fails.
    #[instrument(skip(self, request), fields(field = ?request.field))]
    pub async fn forward(&self, request: &GeneratePersonaRequest) -> Result<Value, GatewayError> {
        let description = request
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or(GatewayError::EmptyInput)?;

        let body = UpstreamPersonaRequest {
            description,
            field: request.field.as_deref(),
            current_persona: request.current_persona.as_ref(),
        };
        let mut generated = self.post_json(&self.persona_url, &body).await?;

        if request.field.is_none() {
            if let Value::Object(persona) = &mut generated {
                self.attach_avatar(persona).await;
            }
        }

        Ok(generated)
    }

    /// Request an avatar image.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ImageGenerationFailed`] if the call fails or
    /// the response has no URL.
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn generate_avatar(&self, request: &AvatarRequest) -> Result<String, GatewayError> {
        let response = self
            .post_json(&self.image_url, request)
            .await
            .map_err(|e| GatewayError::ImageGenerationFailed(e.to_string()))?;

        let image: ImageResponse = serde_json::from_value(response)
            .map_err(|e| GatewayError::ImageGenerationFailed(e.to_string()))?;
        Ok(image.url)
    }

    /// Add `profilePicture` to a generated persona. Best effort.
    async fn attach_avatar(&self, persona: &mut Map<String, Value>) {
        let Some(request) = AvatarRequest::from_persona(persona) else {
            return;
        };

        match self.generate_avatar(&request).await {
            Ok(url) => {
                persona.insert("profilePicture".to_owned(), Value::String(url));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Avatar generation failed, continuing without one");
            }
        }
    }

    async fn post_json<B: Serialize + Sync>(&self, url: &Url, body: &B) -> Result<Value, GatewayError> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::failed(None, e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %url, "Generator returned an error");
            return Err(GatewayError::failed(Some(status.as_u16()), message));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::failed(Some(status.as_u16()), e.to_string()))
    }
}

/// Append an endpoint path to the generator base URL.
fn endpoint(base: &Url, path: &str) -> Result<Url, GatewayError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| GatewayError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .push(path);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use persona_studio_core::ListField;
    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct Calls {
        persona: Arc<AtomicUsize>,
        image: Arc<AtomicUsize>,
        last_body: Arc<std::sync::Mutex<Option<Value>>>,
    }

    /// Serve a fake generator on a random local port.
    async fn spawn_generator(
        persona: (StatusCode, Value),
        image: (StatusCode, Value),
    ) -> (GenerationClient, Calls) {
        let calls = Calls::default();

        let app = Router::new()
            .route(
                "/generate-persona",
                post({
                    let persona = persona.clone();
                    move |State(calls): State<Calls>, Json(body): Json<Value>| {
                        let persona = persona.clone();
                        async move {
                            calls.persona.fetch_add(1, Ordering::SeqCst);
                            *calls.last_body.lock().unwrap() = Some(body);
                            (persona.0, Json(persona.1))
                        }
                    }
                }),
            )
            .route(
                "/generate-image",
                post(move |State(calls): State<Calls>| {
                    let image = image.clone();
                    async move {
                        calls.image.fetch_add(1, Ordering::SeqCst);
                        (image.0, Json(image.1))
                    }
                }),
            )
            .with_state(calls.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = GeneratorConfig {
            base_url: Url::parse(&format!("http://{addr}")).unwrap(),
            request_timeout: Duration::from_secs(5),
        };
        (GenerationClient::new(&config).unwrap(), calls)
    }

    fn ok(value: Value) -> (StatusCode, Value) {
        (StatusCode::OK, value)
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let base = Url::parse("http://localhost:8000").unwrap();
        assert_eq!(
            endpoint(&base, "generate-persona").unwrap().as_str(),
            "http://localhost:8000/generate-persona"
        );

        let base = Url::parse("https://gen.example/api/").unwrap();
        assert_eq!(
            endpoint(&base, "generate-image").unwrap().as_str(),
            "https://gen.example/api/generate-image"
        );
    }

    #[tokio::test]
    async fn test_blank_description_makes_no_calls() {
        let (client, calls) = spawn_generator(ok(json!({})), ok(json!({}))).await;

        assert!(matches!(
            client.generate_full("   ").await,
            Err(GatewayError::EmptyInput)
        ));
        assert!(matches!(
            client
                .regenerate_field("", PersonaField::Bio, &PersonaDraft::default())
                .await,
            Err(GatewayError::EmptyInput)
        ));
        assert_eq!(calls.persona.load(Ordering::SeqCst), 0);
        assert_eq!(calls.image.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generate_full_attaches_avatar() {
        let (client, calls) = spawn_generator(
            ok(json!({"name": "Alex Kim", "age": 29, "goals": ["Stay fit"]})),
            ok(json!({"url": "https://img.example/alex.png"})),
        )
        .await;

        let persona = client
            .generate_full("A fitness app for busy professionals")
            .await
            .unwrap();
        assert_eq!(persona["name"], "Alex Kim");
        assert_eq!(persona["profilePicture"], "https://img.example/alex.png");
        assert_eq!(calls.persona.load(Ordering::SeqCst), 1);
        assert_eq!(calls.image.load(Ordering::SeqCst), 1);

        let sent = calls.last_body.lock().unwrap().clone().unwrap();
        assert_eq!(
            sent,
            json!({"description": "A fitness app for busy professionals"})
        );
    }

    #[tokio::test]
    async fn test_avatar_failure_is_swallowed() {
        let (client, calls) = spawn_generator(
            ok(json!({"name": "Alex Kim", "age": 29})),
            (StatusCode::INTERNAL_SERVER_ERROR, json!({"detail": "no gpu"})),
        )
        .await;

        let persona = client.generate_full("A fitness app").await.unwrap();
        assert_eq!(persona["name"], "Alex Kim");
        assert!(persona.get("profilePicture").is_none());
        assert_eq!(calls.image.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_avatar_without_name() {
        let (client, calls) = spawn_generator(ok(json!({"age": 29})), ok(json!({"url": "x"}))).await;

        let persona = client.generate_full("A fitness app").await.unwrap();
        assert!(persona.get("profilePicture").is_none());
        assert_eq!(calls.image.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upstream_error_reports_status() {
        let (client, _) = spawn_generator(
            (StatusCode::SERVICE_UNAVAILABLE, json!({"detail": "busy"})),
            ok(json!({})),
        )
        .await;

        let err = client.generate_full("A fitness app").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::GenerationFailed {
                status: Some(503),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_generator() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = GeneratorConfig {
            base_url: Url::parse(&format!("http://{addr}")).unwrap(),
            request_timeout: Duration::from_secs(2),
        };
        let client = GenerationClient::new(&config).unwrap();
        assert!(matches!(
            client.generate_full("A fitness app").await,
            Err(GatewayError::GenerationFailed { status: None, .. })
        ));
    }

    #[tokio::test]
    async fn test_regenerate_field_sends_snapshot_and_extracts_field() {
        let (client, calls) = spawn_generator(
            ok(json!({"goals": ["Run a marathon"], "name": "Ignored"})),
            ok(json!({"url": "x"})),
        )
        .await;

        let draft = PersonaDraft {
            description: Some("A fitness app".to_owned()),
            name: Some("Alex".to_owned()),
            ..PersonaDraft::default()
        };
        let value = client
            .regenerate_field(
                "A fitness app",
                PersonaField::List(ListField::Goals),
                &draft,
            )
            .await
            .unwrap();
        assert_eq!(value, json!(["Run a marathon"]));
        assert_eq!(calls.image.load(Ordering::SeqCst), 0);

        let sent = calls.last_body.lock().unwrap().clone().unwrap();
        assert_eq!(sent["field"], "goals");
        assert_eq!(sent["current_persona"]["name"], "Alex");
        assert!(sent["current_persona"].get("description").is_none());
    }

    #[tokio::test]
    async fn test_regenerate_field_missing_from_response() {
        let (client, _) = spawn_generator(ok(json!({"name": "Alex"})), ok(json!({}))).await;

        let err = client
            .regenerate_field("A fitness app", PersonaField::Bio, &PersonaDraft::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::GenerationFailed { status: None, .. }));
    }

    #[tokio::test]
    async fn test_generate_avatar_requires_url() {
        let (client, _) = spawn_generator(ok(json!({})), ok(json!({"image": "nope"}))).await;

        let request = AvatarRequest {
            name: "Alex".to_owned(),
            ..AvatarRequest::default()
        };
        assert!(matches!(
            client.generate_avatar(&request).await,
            Err(GatewayError::ImageGenerationFailed(_))
        ));
    }
}
