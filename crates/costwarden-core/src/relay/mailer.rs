//! Email delivery providers
//!
//! One `EmailSender` capability with two interchangeable providers: an
//! authenticated SMTP relay and a transactional-email HTTP API. The provider
//! is selected by configuration.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::config::{EmailApiConfig, EmailProvider, RelayConfig, SmtpConfig};
use crate::error::{Error, Result};
use crate::gcp::SecretStore;

/// Sends one alert email
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send `html_body` with `subject` to `recipient`
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()>;
}

/// Build the configured email provider
pub fn build_mailer(
    config: &RelayConfig,
    client: Client,
    secrets: Arc<SecretStore>,
) -> Result<Arc<dyn EmailSender>> {
    match config.provider {
        EmailProvider::Smtp => Ok(Arc::new(SmtpMailer::new(config.smtp.clone(), secrets))),
        EmailProvider::Api => Ok(Arc::new(ApiMailer::new(config.api.clone(), client)?)),
    }
}

/// SMTP provider (implicit TLS, authenticated)
pub struct SmtpMailer {
    config: SmtpConfig,
    secrets: Arc<SecretStore>,
}

impl SmtpMailer {
    /// Create a mailer for the given SMTP relay
    pub fn new(config: SmtpConfig, secrets: Arc<SecretStore>) -> Self {
        Self { config, secrets }
    }

    /// Resolve the app password: configured value first, then Secret
    /// Manager with environment fallback
    async fn password(&self) -> Option<String> {
        if let Some(password) = &self.config.password {
            return Some(password.clone());
        }
        self.secrets.access_or_env(&self.config.secret_name).await
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()> {
        let sender = self
            .config
            .sender
            .as_deref()
            .ok_or_else(|| Error::email("SMTP sender address is not set"))?;

        let password = self
            .password()
            .await
            .ok_or_else(|| Error::email("SMTP credentials not found"))?;

        let message = Message::builder()
            .from(sender
                .parse()
                .map_err(|e| Error::email(format!("invalid sender address: {e}")))?)
            .to(recipient
                .parse()
                .map_err(|e| Error::email(format!("invalid recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| Error::email(e.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
            .map_err(|e| Error::email(e.to_string()))?
            .port(self.config.port)
            .credentials(Credentials::new(sender.to_string(), password))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| Error::email(e.to_string()))?;

        info!(recipient = %recipient, "Email sent successfully");

        Ok(())
    }
}

// Transactional-email API payload (SendGrid mail/send shape)
#[derive(Debug, Serialize)]
struct MailSendPayload {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    subject: String,
    content: Vec<MailContent>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
}

#[derive(Debug, Serialize)]
struct MailContent {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

/// Transactional-email API provider
pub struct ApiMailer {
    client: Client,
    endpoint: String,
    key: String,
    sender: String,
}

impl ApiMailer {
    /// Create a mailer for the configured email API
    pub fn new(config: EmailApiConfig, client: Client) -> Result<Self> {
        let key = config
            .key
            .ok_or_else(|| Error::config("relay.api.key is not set"))?;
        let sender = config
            .sender
            .ok_or_else(|| Error::config("relay.api.sender is not set"))?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
            key,
            sender,
        })
    }
}

#[async_trait]
impl EmailSender for ApiMailer {
    async fn send(&self, subject: &str, html_body: &str, recipient: &str) -> Result<()> {
        let payload = MailSendPayload {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: recipient.to_string(),
                }],
            }],
            from: EmailAddress {
                email: self.sender.clone(),
            },
            subject: subject.to_string(),
            content: vec![MailContent {
                content_type: "text/html".to_string(),
                value: html_body.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.endpoint))
            .bearer_auth(&self.key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::email(format!(
                "email API returned {status}: {body}"
            )));
        }

        info!(recipient = %recipient, "Email sent successfully");

        Ok(())
    }
}
