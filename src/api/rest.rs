// REST API endpoints

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
};
use std::sync::Arc;
use tokio::task;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{ErrorResponse, HealthResponse};
use crate::config::SourcePaths;
use crate::error::AppError;
use crate::routes::{Snapshot, get_hostname};
use crate::routes::kernel::SysctlSource;
use crate::routes::snapshot::SnapshotAssembler;

#[derive(Clone)]
pub struct AppState {
    pub paths: SourcePaths,
}

impl AppState {
    pub fn new(paths: SourcePaths) -> Self {
        AppState { paths }
    }
}

pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/routes", get(get_routes))
        .route("/api/arp", get(get_arp))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_routes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Snapshot>, (StatusCode, Json<ErrorResponse>)> {
    take_snapshot(state, SnapshotAssembler::routes).await
}

async fn get_arp(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Snapshot>, (StatusCode, Json<ErrorResponse>)> {
    take_snapshot(state, SnapshotAssembler::arp).await
}

async fn health(State(_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        hostname: get_hostname(),
    })
}

type TableReader = fn(&SnapshotAssembler<SysctlSource>) -> Snapshot;

/// Decode a fresh snapshot off the async runtime; kernel reads block.
async fn take_snapshot(
    state: Arc<AppState>,
    read: TableReader,
) -> Result<Json<Snapshot>, (StatusCode, Json<ErrorResponse>)> {
    let snapshot = task::spawn_blocking(move || read(&SnapshotAssembler::new(&state.paths)))
        .await
        .map_err(|e| {
            let err = AppError::Task(e.to_string());
            tracing::error!("{}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "FailedToTakeSnapshot".to_string(),
                    message: err.user_message(),
                }),
            )
        })?;

    Ok(Json(snapshot))
}
