//! Service Usage API client (service disablement)

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

use super::auth::TokenProvider;

/// Administrative control over a project's services
#[async_trait]
pub trait ServiceControl: Send + Sync {
    /// Disable `service` for the project
    async fn disable_service(&self, service: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct DisableOperation {
    #[serde(default)]
    name: String,
}

/// REST client for the Service Usage API
pub struct ServiceUsageClient {
    client: Client,
    token: Arc<TokenProvider>,
    endpoint: String,
    project_id: String,
}

impl ServiceUsageClient {
    /// Create a new client
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
}

#[async_trait]
impl ServiceControl for ServiceUsageClient {
    async fn disable_service(&self, service: &str) -> Result<()> {
        let url = format!(
            "{}/v1/projects/{}/services/{}:disable",
            self.endpoint, self.project_id, service
        );

        let token = self.token.token().await?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::gcp("disable_service", format!("{status}: {body}")));
        }

        let operation: DisableOperation = response.json().await?;
        info!(service = %service, operation = %operation.name, "Service disabling operation started");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_disable_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(
                "/v1/projects/demo-project/services/compute.googleapis.com:disable",
            ))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "operations/disable-1",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ServiceUsageClient::new(
            Client::new(),
            Arc::new(TokenProvider::with_static_token("test-token")),
            server.uri(),
            "demo-project",
        );

        client.disable_service("compute.googleapis.com").await.unwrap();
    }

    #[tokio::test]
    async fn surfaces_api_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let client = ServiceUsageClient::new(
            Client::new(),
            Arc::new(TokenProvider::with_static_token("test-token")),
            server.uri(),
            "demo-project",
        );

        let err = client
            .disable_service("compute.googleapis.com")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disable_service"));
    }
}
