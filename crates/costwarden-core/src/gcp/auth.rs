//! Access token acquisition
//!
//! Tokens come from the instance metadata server when running on GCP, with a
//! `GOOGLE_OAUTH_TOKEN` environment fallback for local runs.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Margin subtracted from a token's lifetime before it is refreshed
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Provides bearer tokens for the GCP REST APIs
pub struct TokenProvider {
    client: Client,
    metadata_endpoint: String,
    cached: RwLock<Option<CachedToken>>,
    static_token: Option<String>,
}

impl TokenProvider {
    /// Create a provider backed by the metadata server at `metadata_endpoint`
    pub fn new(client: Client, metadata_endpoint: impl Into<String>) -> Self {
        Self {
            client,
            metadata_endpoint: metadata_endpoint.into(),
            cached: RwLock::new(None),
            static_token: None,
        }
    }

    /// Create a provider that always returns a fixed token
    pub fn with_static_token(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            metadata_endpoint: String::new(),
            cached: RwLock::new(None),
            static_token: Some(token.into()),
        }
    }

    /// Get a valid access token
    pub async fn token(&self) -> Result<String> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                if entry.expires_at > Instant::now() {
                    return Ok(entry.token.clone());
                }
            }
        }

        match self.fetch_from_metadata().await {
            Ok(response) => {
                let token = response.access_token.clone();
                let lifetime = Duration::from_secs(response.expires_in)
                    .saturating_sub(EXPIRY_MARGIN);

                let mut cached = self.cached.write().await;
                *cached = Some(CachedToken {
                    token: response.access_token,
                    expires_at: Instant::now() + lifetime,
                });

                Ok(token)
            }
            Err(e) => {
                warn!(error = %e, "Could not fetch token from metadata server, falling back to environment");
                std::env::var("GOOGLE_OAUTH_TOKEN").map_err(|_| {
                    Error::gcp(
                        "token",
                        "no metadata server and GOOGLE_OAUTH_TOKEN is not set",
                    )
                })
            }
        }
    }

    async fn fetch_from_metadata(&self) -> Result<MetadataTokenResponse> {
        let url = format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token",
            self.metadata_endpoint
        );

        debug!(url = %url, "Fetching access token");

        let response = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::gcp("token", format!("{status}: {body}")));
        }

        Ok(response.json().await?)
    }
}
