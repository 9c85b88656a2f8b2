//! Pub/Sub publisher for alert messages

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::AlertMessage;

use super::auth::TokenProvider;

/// Publishes alert messages to the alerting channel
#[async_trait]
pub trait AlertPublisher: Send + Sync {
    /// Publish `alert`, returning the channel's message id
    async fn publish(&self, alert: &AlertMessage) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    #[serde(rename = "messageIds")]
    message_ids: Vec<String>,
}

/// REST client publishing to a Pub/Sub topic
pub struct PubSubPublisher {
    client: Client,
    token: Arc<TokenProvider>,
    endpoint: String,
    project_id: String,
    topic: String,
}

impl PubSubPublisher {
    /// Create a publisher for `projects/{project_id}/topics/{topic}`
    pub fn new(
        client: Client,
        token: Arc<TokenProvider>,
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token,
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl AlertPublisher for PubSubPublisher {
    async fn publish(&self, alert: &AlertMessage) -> Result<String> {
        let url = format!(
            "{}/v1/projects/{}/topics/{}:publish",
            self.endpoint, self.project_id, self.topic
        );

        let data = BASE64.encode(serde_json::to_vec(alert)?);
        let token = self.token.token().await?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({
                "messages": [{ "data": data }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::gcp("publish", format!("{status}: {body}")));
        }

        let published: PublishResponse = response.json().await?;
        let message_id = published
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| Error::gcp("publish", "no message id in response"))?;

        info!(message_id = %message_id, service = %alert.service_name, "Published alert message");

        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BudgetAction;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[tokio::test]
    async fn publishes_base64_alert_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/projects/demo-project/topics/cost-alerts:publish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messageIds": ["msg-42"],
            })))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = PubSubPublisher::new(
            Client::new(),
            Arc::new(TokenProvider::with_static_token("test-token")),
            server.uri(),
            "demo-project",
            "cost-alerts",
        );

        let alert = AlertMessage::new("compute.googleapis.com", 105.0, 100.0, BudgetAction::Disabled);
        let message_id = publisher.publish(&alert).await.unwrap();
        assert_eq!(message_id, "msg-42");

        // The published data round-trips back to the alert payload.
        let requests: Vec<Request> = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let data = body["messages"][0]["data"].as_str().unwrap();
        let decoded: serde_json::Value =
            serde_json::from_slice(&BASE64.decode(data).unwrap()).unwrap();

        assert_eq!(decoded["service_name"], "compute.googleapis.com");
        assert_eq!(decoded["current_cost"], 105.0);
        assert_eq!(decoded["budget_limit"], 100.0);
        assert_eq!(decoded["action_taken"], "disabled");
    }

    #[tokio::test]
    async fn publish_failure_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend error"))
            .mount(&server)
            .await;

        let publisher = PubSubPublisher::new(
            Client::new(),
            Arc::new(TokenProvider::with_static_token("test-token")),
            server.uri(),
            "demo-project",
            "cost-alerts",
        );

        let alert = AlertMessage::new("compute.googleapis.com", 85.0, 100.0, BudgetAction::Warning);
        assert!(publisher.publish(&alert).await.is_err());
    }
}
