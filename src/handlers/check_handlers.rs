//! HTTP trigger for backup checks.
//!
//! A scheduler (cron job, EventBridge rule, CI pipeline) POSTs its event
//! document here; the body is handed to the check unchanged.

use crate::{
    errors::AppError,
    models::{event::InvocationEvent, notification::CheckOutcome},
    services::monitor_service::BackupMonitor,
};
use axum::{Json, body::Bytes, extract::State};

/// `POST /check`
///
/// The body is optional. A JSON object containing `testEmail` forces a
/// report. Responds with the check outcome; `message_id` is `null` when
/// nothing was sent.
pub async fn run_check(
    State(monitor): State<BackupMonitor>,
    body: Bytes,
) -> Result<Json<CheckOutcome>, AppError> {
    let event = InvocationEvent::from_slice(&body)
        .map_err(|err| AppError::bad_request(format!("invalid event document: {}", err)))?;
    let outcome = monitor.run_now(&event).await?;
    Ok(Json(outcome))
}
