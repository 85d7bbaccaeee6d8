// rest_api/src/handlers/mod.rs

pub mod auth;
pub mod catalog;
pub mod clinical;
pub mod dashboard;
pub mod emergencies;
pub mod notifications;
pub mod users;

use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{ApiResult, RestApiError};

pub async fn health_check_handler() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}

/// Runs CPU-bound work (bcrypt) off the async workers.
pub(crate) async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| RestApiError::Internal(format!("worker task failed: {}", e)))?
}
