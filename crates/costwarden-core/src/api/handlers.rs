//! API handlers for the monitor and relay services

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::models::PushEnvelope;
use crate::monitor::BudgetEvaluator;
use crate::relay::{render_alert_email, EmailSender};

/// State for the cost monitor service
#[derive(Clone)]
pub struct MonitorState {
    /// The budget evaluator, shared across requests
    pub evaluator: Arc<BudgetEvaluator>,
}

/// State for the notification relay service
#[derive(Clone)]
pub struct RelayState {
    /// The configured email provider
    pub mailer: Arc<dyn EmailSender>,
    /// Recipient of alert emails
    pub recipient: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Crate version
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Run one budget evaluation pass (triggered by the scheduler)
///
/// Replies `200 "OK"` when the pass completes; per-budget disable failures do
/// not fail the request, but a publish or persistence fault aborts the pass
/// and surfaces as a 500.
pub async fn run_monitor(
    State(state): State<MonitorState>,
) -> Result<&'static str, (StatusCode, String)> {
    state.evaluator.evaluate_all().await.map_err(|e| {
        error!(error = %e, "Budget evaluation failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok("OK")
}

/// Receive a push-delivered alert message and send the email
///
/// A malformed envelope is a `400 "Invalid request"`. Email delivery is
/// best-effort: a send failure is logged and the push is still acknowledged
/// with `200 "OK"` so the channel does not redeliver forever.
pub async fn receive_alert(
    State(state): State<RelayState>,
    body: Bytes,
) -> Result<&'static str, (StatusCode, &'static str)> {
    let envelope: PushEnvelope = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Rejected malformed push envelope");
        (StatusCode::BAD_REQUEST, "Invalid request")
    })?;

    let alert = envelope.decode_alert().map_err(|e| {
        warn!(error = %e, "Rejected undecodable alert payload");
        (StatusCode::BAD_REQUEST, "Invalid request")
    })?;

    let (subject, html_body) = render_alert_email(&alert);

    if let Err(e) = state
        .mailer
        .send(&subject, &html_body, &state.recipient)
        .await
    {
        error!(error = %e, "Error sending email");
    }

    Ok("OK")
}
