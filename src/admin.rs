use crate::actors::SyncSupervisorMessage;
use crate::auth::auth_middleware;
use crate::sync::SyncCoordinator;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use ractor::ActorRef;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Admin API state
#[derive(Clone)]
pub struct AdminState {
    pub coordinator: Arc<SyncCoordinator>,
    pub supervisor: ActorRef<SyncSupervisorMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub access_token: String,
    /// Run inline and return the report instead of queueing
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueuedResponse {
    pub queued: bool,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub github_user_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MergeResponse {
    pub user_id: String,
    pub github_user_id: i64,
    pub merged: u64,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

/// Admin routes, every one behind bearer `api_key`
pub fn create_admin_router(state: AdminState, api_key: String) -> Router {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/users/:user_id/sync", post(sync_user))
        .route("/users/:user_id/merge-network-stars", post(merge_network_stars))
        .route_layer(middleware::from_fn_with_state(api_key, auth_middleware))
        .with_state(state)
}

async fn get_stats(State(state): State<AdminState>) -> impl IntoResponse {
    match state
        .supervisor
        .call(SyncSupervisorMessage::GetStats, Some(Duration::from_secs(5)))
        .await
    {
        Ok(ractor::rpc::CallResult::Success(stats)) => (StatusCode::OK, Json(stats)).into_response(),
        _ => error_response(StatusCode::SERVICE_UNAVAILABLE, "Failed to get sync statistics"),
    }
}

async fn sync_user(
    State(state): State<AdminState>,
    Path(user_id): Path<String>,
    Json(request): Json<SyncRequest>,
) -> impl IntoResponse {
    info!(user_id = %user_id, wait = request.wait, "Admin API: sync requested");

    if request.wait {
        return match state
            .coordinator
            .sync_all_with_timeout(&user_id, &request.access_token)
            .await
        {
            Ok(report) => (StatusCode::OK, Json(report)).into_response(),
            Err(e) => {
                error!(user_id = %user_id, "Admin sync failed: {}", e);
                error_response(StatusCode::BAD_GATEWAY, e.to_string())
            }
        };
    }

    match state.supervisor.send_message(SyncSupervisorMessage::SyncUser {
        user_id: user_id.clone(),
        access_token: request.access_token,
    }) {
        Ok(()) => (StatusCode::ACCEPTED, Json(QueuedResponse { queued: true, user_id })).into_response(),
        Err(e) => error_response(StatusCode::SERVICE_UNAVAILABLE, format!("Failed to queue sync: {}", e)),
    }
}

async fn merge_network_stars(
    State(state): State<AdminState>,
    Path(user_id): Path<String>,
    Json(request): Json<MergeRequest>,
) -> impl IntoResponse {
    match state
        .coordinator
        .merge_network_stars(&user_id, request.github_user_id)
        .await
    {
        Ok(merged) => (
            StatusCode::OK,
            Json(MergeResponse {
                user_id,
                github_user_id: request.github_user_id,
                merged,
            }),
        )
            .into_response(),
        Err(e) => {
            error!(user_id = %user_id, "Admin merge failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
