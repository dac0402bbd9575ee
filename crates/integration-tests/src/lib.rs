//! Integration tests for Persona Studio.
//!
//! Tests drive the full router in-process with `tower::ServiceExt::oneshot`
//! while a stub persona generator listens on a random local port.
//!
//! # Test Categories
//!
//! - `draft_flow` - Draft lifecycle over the JSON API
//! - `generation` - Full and per-field generation, stale results
//! - `proxy_routes` - Generator pass-through endpoints
//! - `persona_pages` - Server-rendered pages and health checks

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    routing::post,
};
use persona_studio::config::StudioConfig;
use persona_studio::state::AppState;
use persona_studio_core::{DescriptionStore, MemoryDescriptionStore};
use serde_json::Value;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tower::ServiceExt;
use url::Url;

// =============================================================================
// Stub Generator
// =============================================================================

/// Canned reply of one stub endpoint.
#[derive(Debug, Clone)]
pub struct StubReply {
    pub status: StatusCode,
    pub body: Value,
}

impl StubReply {
    /// A 200 response with `body`.
    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// An error response.
    #[must_use]
    pub fn error(status: StatusCode) -> Self {
        Self {
            status,
            body: serde_json::json!({ "detail": "stub failure" }),
        }
    }
}

#[derive(Clone)]
struct StubState {
    persona: StubReply,
    image: StubReply,
    persona_calls: Arc<AtomicUsize>,
    image_calls: Arc<AtomicUsize>,
    persona_requests: Arc<Mutex<Vec<Value>>>,
    gate: Option<Arc<Notify>>,
}

/// A fake persona generator served on `127.0.0.1:0`.
pub struct StubGenerator {
    base_url: Url,
    state: StubState,
}

impl StubGenerator {
    /// Start a stub that answers immediately.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn(persona: StubReply, image: StubReply) -> Self {
        Self::start(persona, image, None).await
    }

    /// Start a stub whose persona endpoint waits for [`Self::release`]
    /// before answering each request.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn_gated(persona: StubReply, image: StubReply) -> Self {
        Self::start(persona, image, Some(Arc::new(Notify::new()))).await
    }

    async fn start(persona: StubReply, image: StubReply, gate: Option<Arc<Notify>>) -> Self {
        let state = StubState {
            persona,
            image,
            persona_calls: Arc::default(),
            image_calls: Arc::default(),
            persona_requests: Arc::default(),
            gate,
        };

        let app = Router::new()
            .route("/generate-persona", post(stub_persona))
            .route("/generate-image", post(stub_image))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("stub generator should bind");
        let addr = listener.local_addr().expect("stub generator has an address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url =
            Url::parse(&format!("http://{addr}")).expect("socket address forms a valid URL");
        Self { base_url, state }
    }

    /// Base URL to configure the studio with.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Number of `/generate-persona` requests received.
    #[must_use]
    pub fn persona_calls(&self) -> usize {
        self.state.persona_calls.load(Ordering::SeqCst)
    }

    /// Number of `/generate-image` requests received.
    #[must_use]
    pub fn image_calls(&self) -> usize {
        self.state.image_calls.load(Ordering::SeqCst)
    }

    /// Bodies received by `/generate-persona`, oldest first.
    #[must_use]
    pub fn persona_requests(&self) -> Vec<Value> {
        self.state
            .persona_requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Let one gated persona request answer.
    pub fn release(&self) {
        if let Some(gate) = &self.state.gate {
            gate.notify_one();
        }
    }

    /// Wait until the stub has received `count` persona requests.
    ///
    /// # Panics
    ///
    /// Panics if that does not happen within five seconds.
    pub async fn wait_for_persona_calls(&self, count: usize) {
        for _ in 0..500 {
            if self.persona_calls() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("stub generator never received {count} persona requests");
    }
}

async fn stub_persona(State(state): State<StubState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.persona_calls.fetch_add(1, Ordering::SeqCst);
    state
        .persona_requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body);

    if let Some(gate) = &state.gate {
        gate.notified().await;
    }
    (state.persona.status, Json(state.persona.body.clone()))
}

async fn stub_image(State(state): State<StubState>) -> (StatusCode, Json<Value>) {
    state.image_calls.fetch_add(1, Ordering::SeqCst);
    (state.image.status, Json(state.image.body.clone()))
}

// =============================================================================
// Test Context
// =============================================================================

/// A studio router wired to a stub generator and an in-memory description
/// store.
pub struct TestContext {
    pub app: Router,
    pub stub: StubGenerator,
    pub descriptions: Arc<MemoryDescriptionStore>,
}

impl TestContext {
    /// Build a studio around `stub`.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[must_use]
    pub fn new(stub: StubGenerator) -> Self {
        Self::with_options(stub, false)
    }

    /// Build a studio whose collection starts with the sample persona.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[must_use]
    pub fn with_sample(stub: StubGenerator) -> Self {
        Self::with_options(stub, true)
    }

    /// Build a studio that persists descriptions in `store`.
    ///
    /// `descriptions` on the returned context stays empty.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[must_use]
    pub fn with_description_store(stub: StubGenerator, store: Arc<dyn DescriptionStore>) -> Self {
        Self::build(stub, false, store, Arc::new(MemoryDescriptionStore::new()))
    }

    fn with_options(stub: StubGenerator, seed_sample: bool) -> Self {
        let descriptions = Arc::new(MemoryDescriptionStore::new());
        let store: Arc<dyn DescriptionStore> = descriptions.clone();
        Self::build(stub, seed_sample, store, descriptions)
    }

    fn build(
        stub: StubGenerator,
        seed_sample: bool,
        store: Arc<dyn DescriptionStore>,
        descriptions: Arc<MemoryDescriptionStore>,
    ) -> Self {
        let mut config = StudioConfig::from_lookup(|_| None)
            .expect("default configuration is valid")
            .with_backend(stub.base_url().clone());
        config.generator.request_timeout = Duration::from_secs(10);
        config.seed_sample = seed_sample;

        let state = AppState::with_description_store(&config, store)
            .expect("application state should build");

        Self {
            app: persona_studio::app(state),
            stub,
            descriptions,
        }
    }

    /// Send a JSON request and decode the JSON response.
    ///
    /// Non-JSON and empty bodies decode to `Value::Null`.
    ///
    /// # Panics
    ///
    /// Panics if the router fails to answer.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.raw(method, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Send a GET request and return the body as text.
    ///
    /// # Panics
    ///
    /// Panics if the router fails to answer.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let (status, bytes) = self.raw(Method::GET, uri, None).await;
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Send a JSON request from a background task.
    ///
    /// Used to keep a gated generation in flight while other requests run.
    #[must_use]
    pub fn spawn_send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> JoinHandle<(StatusCode, Value)> {
        let app = self.app.clone();
        let uri = uri.to_owned();
        tokio::spawn(async move {
            let (status, bytes) = call(app, method, &uri, body).await;
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        })
    }

    /// Poll `GET /api/draft` until `done` accepts the view, and return it.
    ///
    /// # Panics
    ///
    /// Panics if that does not happen within five seconds.
    pub async fn wait_for_draft(&self, done: impl Fn(&Value) -> bool) -> Value {
        for _ in 0..500 {
            let (_, view) = self.send(Method::GET, "/api/draft", None).await;
            if done(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("draft never reached the expected state");
    }

    async fn raw(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        call(self.app.clone(), method, uri, body).await
    }
}

async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, bytes.to_vec())
}
