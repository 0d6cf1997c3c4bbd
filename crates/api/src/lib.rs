//! Analytics Dashboard API Server
//!
//! REST API backing the dashboard: critical alerts, profile CRUD, and the
//! panel builder's merge action.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

use alerting::AlertClassifier;
use storage::Repository;

pub use crate::config::{load_config, load_config_from, AppConfig};
pub use crate::error::ApiError;
pub use crate::rate_limit::RateLimitConfig;

/// Application state shared across handlers
pub struct AppState {
    /// Profile and alert storage
    pub repository: Repository,
    /// Severity mapping for the critical-alerts view
    pub classifier: AlertClassifier,
    /// Prometheus handle, present once the recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<RwLock<AppState>>;

impl AppState {
    /// Create new application state
    pub fn new(repository: Repository, classifier: AlertClassifier) -> Self {
        Self {
            repository,
            classifier,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Build state from configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Repository::with_retention(config.max_alert_records),
            AlertClassifier::new(config.alerts.clone()),
        )
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Repository::new(), AlertClassifier::default())
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub metrics: StoreMetrics,
}

/// Store counters
#[derive(Debug, Serialize)]
pub struct StoreMetrics {
    pub profile_count: usize,
    pub alert_count: usize,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/api/v1/alerts",
            get(routes::alerts::get_alerts).post(routes::alerts::ingest_alerts),
        )
        .route("/api/v1/alerts/critical", get(routes::alerts::get_critical_alerts))
        .route("/api/v1/alerts/deduplicate", post(routes::alerts::deduplicate_alerts))
        .route(
            "/api/v1/profiles",
            get(routes::profiles::list_profiles).post(routes::profiles::create_profile),
        )
        .route(
            "/api/v1/profiles/:id",
            get(routes::profiles::get_profile)
                .put(routes::profiles::update_profile)
                .delete(routes::profiles::delete_profile),
        )
        .route("/api/v1/profiles/:id/panels", post(routes::profiles::add_panel))
        .route(
            "/api/v1/profiles/:id/panels/merge",
            post(routes::profiles::merge_panels),
        )
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        metrics: StoreMetrics {
            profile_count: state.repository.profile_count(),
            alert_count: state.repository.alert_count(),
        },
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

fn parse_level(level: &str) -> Option<Level> {
    level.trim().parse::<Level>().ok()
}

/// Initialize logging
///
/// An unknown level falls back to `info` and is reported once logging is up.
pub fn init_logging(
    level: &str,
    json: bool,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let parsed = parse_level(level);
    let builder = FmtSubscriber::builder()
        .with_max_level(parsed.unwrap_or(Level::INFO))
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    if parsed.is_none() {
        warn!("Unknown log level {:?}, using info", level);
    }
    Ok(())
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder not installed: {}", e);
            None
        }
    }
}

/// Serve the API on an already bound listener
pub async fn serve(
    listener: TcpListener,
    state: SharedState,
    limits: &RateLimitConfig,
) -> std::io::Result<()> {
    let mut app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    match rate_limit::create_governor_config(limits) {
        Some(config) => app = app.layer(GovernorLayer { config }),
        None => warn!("Serving without rate limiting"),
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

/// Run the server
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;

    let mut state = AppState::from_config(&config);
    state.metrics = install_metrics();
    let state = Arc::new(RwLock::new(state));

    info!("Starting API server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state, &config.rate_limit).await?;

    Ok(())
}
