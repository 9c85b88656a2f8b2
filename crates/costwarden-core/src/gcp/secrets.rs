//! Secret Manager access with environment fallback

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

use super::auth::TokenProvider;

#[derive(Debug, Deserialize)]
struct AccessSecretResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

/// Reads secrets from Secret Manager, falling back to environment variables
pub struct SecretStore {
    client: Client,
    token: Arc<TokenProvider>,
    endpoint: String,
    project_id: String,
}

impl SecretStore {
    /// Create a store for the given project
    pub fn new(
        client: Client,
        token: Arc<TokenProvider>,
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token,
            endpoint: endpoint.into(),
            project_id: project_id.into(),
        }
    }

    /// Access the latest version of `name`
    pub async fn access(&self, name: &str) -> Result<String> {
        let url = format!(
            "{}/v1/projects/{}/secrets/{}/versions/latest:access",
            self.endpoint, self.project_id, name
        );

        let token = self.token.token().await?;

        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::gcp("access_secret", format!("{status}: {body}")));
        }

        let secret: AccessSecretResponse = response.json().await?;
        let raw = BASE64
            .decode(&secret.payload.data)
            .map_err(|e| Error::gcp("access_secret", format!("payload is not base64: {e}")))?;

        String::from_utf8(raw)
            .map_err(|e| Error::gcp("access_secret", format!("payload is not UTF-8: {e}")))
    }

    /// Access `name`, falling back to the environment variable of the same
    /// name when Secret Manager is unavailable
    pub async fn access_or_env(&self, name: &str) -> Option<String> {
        match self.access(name).await {
            Ok(secret) => Some(secret),
            Err(e) => {
                warn!(secret = %name, error = %e, "Could not fetch secret, falling back to environment variable");
                std::env::var(name).ok()
            }
        }
    }
}
