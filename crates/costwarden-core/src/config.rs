//! Configuration management for costwarden
//!
//! Configuration is loaded from a YAML file (costwarden.yaml by default) with
//! a `COSTWARDEN_`-prefixed environment overlay, then validated and passed
//! into the handlers explicitly. Credentials follow the conventional
//! environment variables (`SMTP_EMAIL`, `SMTP_APP_PASSWORD`,
//! `ALERT_RECEIVER_EMAIL`, `EMAIL_API_KEY`) when not set in the file.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::BudgetRule;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// GCP project and API configuration
    pub gcp: GcpConfig,

    /// Budget rules, one per monitored service
    #[serde(default)]
    pub budgets: Vec<BudgetRule>,

    /// Notification relay configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file with environment overlay.
    ///
    /// `path` defaults to `costwarden.yaml` in the working directory.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or("costwarden.yaml");

        let raw = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("COSTWARDEN").separator("__"))
            .build()
            .map_err(|e| Error::config(e.to_string()))?;

        let mut cfg: Config = raw
            .try_deserialize()
            .map_err(|e| Error::config(e.to_string()))?;

        cfg.apply_env_overrides();
        cfg.validate()?;

        Ok(cfg)
    }

    /// Fill credential fields from their conventional environment variables
    /// when the file leaves them unset.
    fn apply_env_overrides(&mut self) {
        if self.relay.smtp.sender.is_none() {
            self.relay.smtp.sender = std::env::var("SMTP_EMAIL").ok();
        }
        if self.relay.recipient.is_none() {
            self.relay.recipient = std::env::var("ALERT_RECEIVER_EMAIL").ok();
        }
        if self.relay.api.key.is_none() {
            self.relay.api.key = std::env::var("EMAIL_API_KEY").ok();
        }
    }

    /// Validate the loaded configuration
    pub fn validate(&self) -> Result<()> {
        if self.gcp.project_id.is_empty() {
            return Err(Error::validation("gcp.project_id must not be empty"));
        }

        for rule in &self.budgets {
            rule.validate()?;
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// HTTP port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// GCP project and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// GCP project id
    pub project_id: String,

    /// Pub/Sub topic alerts are published to
    #[serde(default = "default_topic")]
    pub alert_topic: String,

    /// Firestore collection holding per-service disablement state
    #[serde(default = "default_state_collection")]
    pub state_collection: String,

    /// API endpoints, overridable for tests
    #[serde(default)]
    pub endpoints: GcpEndpoints,
}

fn default_topic() -> String {
    "cost-alerts".to_string()
}

fn default_state_collection() -> String {
    "service_states".to_string()
}

/// Base URLs for the GCP REST APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpEndpoints {
    /// Service Usage API
    pub service_usage: String,
    /// Pub/Sub API
    pub pubsub: String,
    /// Firestore API
    pub firestore: String,
    /// Secret Manager API
    pub secret_manager: String,
    /// Instance metadata server (token source)
    pub metadata: String,
}

impl Default for GcpEndpoints {
    fn default() -> Self {
        Self {
            service_usage: "https://serviceusage.googleapis.com".to_string(),
            pubsub: "https://pubsub.googleapis.com".to_string(),
            firestore: "https://firestore.googleapis.com".to_string(),
            secret_manager: "https://secretmanager.googleapis.com".to_string(),
            metadata: "http://metadata.google.internal".to_string(),
        }
    }
}

/// Email provider selection for the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Authenticated SMTP over implicit TLS
    #[default]
    Smtp,
    /// Transactional-email HTTP API
    Api,
}

/// Notification relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Recipient of alert emails
    pub recipient: Option<String>,

    /// Which provider delivers the email
    #[serde(default)]
    pub provider: EmailProvider,

    /// SMTP provider settings
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// HTTP email API provider settings
    #[serde(default)]
    pub api: EmailApiConfig,
}

impl RelayConfig {
    /// Recipient address, required once the relay is serving
    pub fn recipient(&self) -> Result<&str> {
        self.recipient
            .as_deref()
            .ok_or_else(|| Error::config("relay.recipient is not set"))
    }
}

/// SMTP provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay host
    pub host: String,
    /// SMTP relay port (implicit TLS)
    pub port: u16,
    /// Sender address, doubles as the SMTP username
    pub sender: Option<String>,
    /// App password; resolved from Secret Manager (with an environment
    /// fallback) when unset
    pub password: Option<String>,
    /// Secret Manager secret holding the app password
    pub secret_name: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 465,
            sender: None,
            password: None,
            secret_name: "SMTP_APP_PASSWORD".to_string(),
        }
    }
}

/// Transactional-email API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailApiConfig {
    /// API base URL
    pub endpoint: String,
    /// API key
    pub key: Option<String>,
    /// Sender address
    pub sender: Option<String>,
}

impl Default for EmailApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.sendgrid.com".to_string(),
            key: None,
            sender: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
