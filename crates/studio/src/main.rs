//! Persona Studio - persona drafting web service.
//!
//! Serves the studio on port 3000 by default.
//!
//! - Axum router with Askama persona pages and a JSON draft API
//! - Upstream persona generator reached over HTTP (reqwest)
//! - Personas and drafts in memory; the product description in a JSON file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::borrow::Cow;
use std::net::SocketAddr;

use persona_studio::config::StudioConfig;
use persona_studio::state::AppState;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "persona_studio=info,tower_http=debug";

/// Start Sentry when a DSN is configured. The guard flushes events on drop.
fn init_sentry(config: &StudioConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.expose_secret(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.sentry_environment.clone().map(Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));
    Some(guard)
}

/// Warnings and errors become Sentry events, info becomes breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the global subscriber.
///
/// JSON lines on Fly.io, human-readable text everywhere else.
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let config = StudioConfig::from_env().expect("Failed to load configuration");

    // Sentry has to exist before the subscriber that forwards to it
    let sentry_guard = init_sentry(&config);
    init_tracing();
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    tracing::info!(
        generator = %config.generator.base_url,
        data_dir = %config.data_dir.display(),
        seed_sample = config.seed_sample,
        "Configuration loaded"
    );

    let state = AppState::new(&config).expect("Failed to initialize application state");
    let app = persona_studio::app(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("Persona Studio listening on http://{addr}");

    // Peer addresses feed the rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    drop(sentry_guard);
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C"),
        () = terminate => tracing::info!("Received SIGTERM"),
    }

    tracing::info!("Draining in-flight requests before shutdown");
}
