//! Alert and service-state models

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Action taken for a budget breach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetAction {
    /// Service was disabled (cost reached the limit)
    Disabled,
    /// Warning only (cost reached 80% of the limit)
    Warning,
}

impl BudgetAction {
    /// Wire/display name of the action
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetAction::Disabled => "disabled",
            BudgetAction::Warning => "warning",
        }
    }
}

/// The event payload describing a budget breach or warning
///
/// Constructed, serialized, published and discarded per event; nothing is
/// retained. Display fields missing from an incoming payload fall back to
/// `N/A`/0 when decoded by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    /// Service the alert concerns
    #[serde(default = "unknown_service")]
    pub service_name: String,

    /// Cost computed for the billing period
    #[serde(default)]
    pub current_cost: f64,

    /// Configured spending limit
    #[serde(default)]
    pub budget_limit: f64,

    /// Action taken ("disabled" or "warning")
    pub action_taken: BudgetAction,

    /// When the alert was raised
    pub timestamp: DateTime<Utc>,
}

fn unknown_service() -> String {
    "N/A".to_string()
}

impl AlertMessage {
    /// Create an alert stamped with the current time
    pub fn new(service: impl Into<String>, cost: f64, limit: f64, action: BudgetAction) -> Self {
        Self {
            service_name: service.into(),
            current_cost: cost,
            budget_limit: limit,
            action_taken: action,
            timestamp: Utc::now(),
        }
    }
}

/// Per-service disablement state, persisted in the document store
///
/// Created or overwritten whenever a service is disabled; read back before
/// disabling so an already-disabled service is not disabled twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceState {
    /// Whether the service has been disabled
    pub disabled: bool,
    /// When it was disabled
    pub disabled_at: DateTime<Utc>,
}

impl ServiceState {
    /// State for a service disabled right now
    pub fn disabled_now() -> Self {
        Self {
            disabled: true,
            disabled_at: Utc::now(),
        }
    }
}

/// Pub/Sub push delivery envelope
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    /// The wrapped Pub/Sub message
    pub message: PushMessage,
}

/// The message part of a push envelope
#[derive(Debug, Clone, Deserialize)]
pub struct PushMessage {
    /// Base64-encoded, JSON-encoded alert payload
    pub data: String,

    /// Pub/Sub message id
    #[serde(default, rename = "messageId")]
    pub message_id: Option<String>,

    /// When Pub/Sub accepted the message
    #[serde(default, rename = "publishTime")]
    pub publish_time: Option<String>,
}

impl PushEnvelope {
    /// Decode the wrapped alert payload
    pub fn decode_alert(&self) -> Result<AlertMessage> {
        let raw = BASE64
            .decode(&self.message.data)
            .map_err(|e| Error::envelope(format!("data is not valid base64: {e}")))?;

        serde_json::from_slice(&raw)
            .map_err(|e| Error::envelope(format!("data is not a valid alert payload: {e}")))
    }
}
