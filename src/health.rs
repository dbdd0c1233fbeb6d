use crate::actors::{SyncStats, SyncSupervisorMessage};
use crate::store::SyncStore;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use ractor::ActorRef;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Health check status
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SyncStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: CheckResult,
    pub supervisor: CheckResult,
    pub workers: CheckResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    fn with(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Application state for health checks
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SyncStore>,
    pub supervisor: ActorRef<SyncSupervisorMessage>,
    pub start_time: std::time::Instant,
}

pub fn health_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check)) // Kubernetes convention
        .route("/livez", get(liveness_check))
        .route("/readyz", get(readiness_check))
        .with_state(app_state)
}

/// Serve the health routes, plus the admin API under `/admin` when given
pub async fn start_http_server(
    app_state: AppState,
    admin: Option<Router>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut app = health_router(app_state);
    if let Some(admin) = admin {
        app = app.nest("/admin", admin);
    }
    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn supervisor_stats(supervisor: &ActorRef<SyncSupervisorMessage>, timeout: Duration) -> Option<SyncStats> {
    match supervisor.call(SyncSupervisorMessage::GetStats, Some(timeout)).await {
        Ok(ractor::rpc::CallResult::Success(stats)) => Some(stats),
        _ => None,
    }
}

fn workers_check(stats: &SyncStats) -> CheckResult {
    if stats.factory_active_workers == 0 && stats.factory_queue_depth > 10 {
        CheckResult::with(
            HealthStatus::Degraded,
            format!("No active workers with {} jobs in queue", stats.factory_queue_depth),
        )
    } else {
        CheckResult::healthy()
    }
}

fn overall(checks: &HealthChecks) -> HealthStatus {
    let all = [&checks.database, &checks.supervisor, &checks.workers];
    if all.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else if all.iter().any(|c| c.status == HealthStatus::Degraded) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.store.ping().await {
        Ok(()) => CheckResult::healthy(),
        Err(e) => CheckResult::with(HealthStatus::Unhealthy, format!("Database check failed: {}", e)),
    };

    let stats = supervisor_stats(&state.supervisor, Duration::from_secs(5)).await;
    let (supervisor, workers) = match stats {
        Some(ref stats) => (CheckResult::healthy(), workers_check(stats)),
        None => (
            CheckResult::with(HealthStatus::Unhealthy, "Supervisor not responding"),
            CheckResult::with(HealthStatus::Unhealthy, "Unable to get worker statistics"),
        ),
    };

    let checks = HealthChecks {
        database,
        supervisor,
        workers,
    };
    let status = overall(&checks);

    let status_code = match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        checks,
        stats,
    };

    (status_code, Json(response))
}

async fn liveness_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "alive" })))
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ready = state.store.ping().await.is_ok();
    let supervisor_ready = supervisor_stats(&state.supervisor, Duration::from_secs(1)).await.is_some();
    let ready = db_ready && supervisor_ready;

    let response = ReadinessResponse {
        ready,
        message: (!ready).then(|| {
            format!(
                "Not ready - DB: {}, Supervisor: {}",
                if db_ready { "OK" } else { "Failed" },
                if supervisor_ready { "OK" } else { "Failed" }
            )
        }),
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
