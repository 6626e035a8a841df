//! Defines the routes of the HTTP trigger.
//!
//! - `GET  /healthz`: liveness
//! - `POST /check`: run one backup check with the request body as event

use crate::{
    handlers::{check_handlers::run_check, health_handlers::healthz},
    services::monitor_service::BackupMonitor,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the router. Handlers share the `BackupMonitor` as state.
pub fn routes() -> Router<BackupMonitor> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/check", post(run_check))
}
