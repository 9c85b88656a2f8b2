//! Firestore-backed service state store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::ServiceState;

use super::auth::TokenProvider;

/// Persistence for per-service disablement state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the state record for `service`, if one exists
    async fn get(&self, service: &str) -> Result<Option<ServiceState>>;

    /// Create or overwrite the state record for `service`
    async fn mark_disabled(&self, service: &str, state: &ServiceState) -> Result<()>;
}

// Firestore's REST document shape: typed value wrappers per field.
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    fields: StateFields,
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFields {
    disabled: BoolValue,
    disabled_at: TimestampValue,
}

#[derive(Debug, Serialize, Deserialize)]
struct BoolValue {
    #[serde(rename = "booleanValue")]
    boolean_value: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct TimestampValue {
    #[serde(rename = "timestampValue")]
    timestamp_value: DateTime<Utc>,
}

/// REST client storing state documents in a Firestore collection
pub struct FirestoreStateStore {
    client: Client,
    token: Arc<TokenProvider>,
    endpoint: String,
    project_id: String,
    collection: String,
}

impl FirestoreStateStore {
    /// Create a store writing to `collection` in the project's default database
    pub fn new(
        client: Client,
        token: Arc<TokenProvider>,
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token,
            endpoint: endpoint.into(),
            project_id: project_id.into(),
            collection: collection.into(),
        }
    }

    fn document_url(&self, service: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.endpoint, self.project_id, self.collection, service
        )
    }
}

#[async_trait]
impl StateStore for FirestoreStateStore {
    async fn get(&self, service: &str) -> Result<Option<ServiceState>> {
        let token = self.token.token().await?;

        let response = self
            .client
            .get(self.document_url(service))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::gcp("get_state", format!("{status}: {body}")));
        }

        let document: StateDocument = response.json().await?;

        Ok(Some(ServiceState {
            disabled: document.fields.disabled.boolean_value,
            disabled_at: document.fields.disabled_at.timestamp_value,
        }))
    }

    async fn mark_disabled(&self, service: &str, state: &ServiceState) -> Result<()> {
        let document = StateDocument {
            fields: StateFields {
                disabled: BoolValue {
                    boolean_value: state.disabled,
                },
                disabled_at: TimestampValue {
                    timestamp_value: state.disabled_at,
                },
            },
        };

        let token = self.token.token().await?;

        let response = self
            .client
            .patch(self.document_url(service))
            .bearer_auth(token)
            .json(&document)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::gcp("mark_disabled", format!("{status}: {body}")));
        }

        debug!(service = %service, "Service state record written");

        Ok(())
    }
}
