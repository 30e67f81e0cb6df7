//! FK Designers API - REST backend for the clothing store.
//!
//! Serves the catalog, accounts, staff tools and contact forms on port
//! 10000 (see [`fk_designers_api::routes`] for the route map).
//!
//! # Startup
//!
//! 1. Configuration from the environment (`.env` honoured)
//! 2. Sentry, then the tracing subscriber (JSON in production)
//! 3. Lazy connection pool, probed with retries
//! 4. Background tasks: pool maintenance and admin bootstrap
//!
//! Migrations are NOT run here; use `fkd-cli migrate`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::time::Duration;

use fk_designers_api::config::ApiConfig;
use fk_designers_api::db::Database;
use fk_designers_api::services::bootstrap::spawn_admin_bootstrap;
use fk_designers_api::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(5 * 60);
const STARTUP_ATTEMPTS: u32 = 5;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ApiConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fk_designers_api=info,tower_http=info".into());

    // JSON lines in production for log shipping, text locally
    let production = config.environment.is_production();
    let json_layer =
        production.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!production).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        database = ?config.database,
        "Starting FK Designers API"
    );

    let db = Database::connect_lazy(&config.database).expect("Invalid database configuration");
    db.test_connection(STARTUP_ATTEMPTS)
        .await
        .expect("Database unreachable");

    let maintenance = db.spawn_maintenance(MAINTENANCE_INTERVAL);
    let bootstrap = config
        .admin_bootstrap
        .clone()
        .map(|admin| spawn_admin_bootstrap(db.clone(), admin));
    if bootstrap.is_none() {
        tracing::info!("ADMIN_EMAIL/ADMIN_PASSWORD not set, skipping admin bootstrap");
    }

    let addr = config.socket_addr();
    let app = fk_designers_api::app(AppState::new(config, db.clone()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("api listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    maintenance.abort();
    if let Some(handle) = bootstrap {
        handle.abort();
    }
    db.drain(SHUTDOWN_GRACE).await;
    tracing::info!("Shutdown complete");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// Once the signal arrives a watchdog exits the process if draining takes
/// longer than [`SHUTDOWN_GRACE`].
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");

    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        tracing::error!("Graceful shutdown timed out, forcing exit");
        std::process::exit(1);
    });
}
