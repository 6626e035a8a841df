//! Health handler.
//!
//! - GET /healthz -> liveness plus the bucket this instance watches

use crate::services::monitor_service::BackupMonitor;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Never touches the object store or the mail service.
pub async fn healthz(State(monitor): State<BackupMonitor>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
            bucket: monitor.config().bucket.clone(),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    bucket: String,
}
