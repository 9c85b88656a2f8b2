//! End-to-end monitor flow against mocked GCP APIs
//!
//! Drives the monitor endpoint with real REST clients pointed at a mock
//! server and checks the full exceeded-budget flow: disable call, published
//! alert payload, persisted state record.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::NaiveDate;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use costwarden::api::{monitor_router, MonitorState};
use costwarden::gcp::{
    CostSource, FirestoreStateStore, PubSubPublisher, ServiceUsageClient, TokenProvider,
};
use costwarden::models::BudgetRule;
use costwarden::monitor::BudgetEvaluator;
use costwarden::Result;

struct FixedCost(f64);

#[async_trait]
impl CostSource for FixedCost {
    async fn cost_for_service(
        &self,
        _service: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<f64> {
        Ok(self.0)
    }
}

fn monitor_app(server: &MockServer, cost: f64) -> axum::Router {
    let client = reqwest::Client::new();
    let token = Arc::new(TokenProvider::with_static_token("test-token"));

    let evaluator = BudgetEvaluator::new(
        vec![BudgetRule {
            service: "compute.googleapis.com".to_string(),
            limit: 100.0,
        }],
        Arc::new(FixedCost(cost)),
        Arc::new(ServiceUsageClient::new(
            client.clone(),
            token.clone(),
            server.uri(),
            "demo-project",
        )),
        Arc::new(PubSubPublisher::new(
            client.clone(),
            token.clone(),
            server.uri(),
            "demo-project",
            "cost-alerts",
        )),
        Arc::new(FirestoreStateStore::new(
            client,
            token,
            server.uri(),
            "demo-project",
            "service_states",
        )),
    );

    monitor_router(MonitorState {
        evaluator: Arc::new(evaluator),
    })
}

const STATE_DOC_PATH: &str =
    "/v1/projects/demo-project/databases/(default)/documents/service_states/compute.googleapis.com";

#[tokio::test]
async fn exceeded_budget_disables_publishes_and_persists() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATE_DOC_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .named("state read")
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(
            "/v1/projects/demo-project/services/compute.googleapis.com:disable",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "operations/disable-1",
        })))
        .expect(1)
        .named("disable")
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/demo-project/topics/cost-alerts:publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messageIds": ["msg-1"],
        })))
        .expect(1)
        .named("publish")
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(STATE_DOC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .named("state write")
        .mount(&server)
        .await;

    let response = monitor_app(&server, 105.0)
        .oneshot(Request::post("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let requests = server.received_requests().await.unwrap();

    // The published message carries the exact alert payload.
    let publish = requests
        .iter()
        .find(|r| r.url.path().ends_with(":publish"))
        .expect("publish request");
    let body: serde_json::Value = serde_json::from_slice(&publish.body).unwrap();
    let data = body["messages"][0]["data"].as_str().unwrap();
    let alert: serde_json::Value = serde_json::from_slice(&BASE64.decode(data).unwrap()).unwrap();

    assert_eq!(alert["service_name"], "compute.googleapis.com");
    assert_eq!(alert["current_cost"], 105.0);
    assert_eq!(alert["budget_limit"], 100.0);
    assert_eq!(alert["action_taken"], "disabled");
    assert!(alert["timestamp"].as_str().unwrap().contains('T'));

    // The state record marks the service disabled with a timestamp.
    let patch = requests
        .iter()
        .find(|r| r.method.to_string() == "PATCH")
        .expect("state write request");
    let state: serde_json::Value = serde_json::from_slice(&patch.body).unwrap();
    assert_eq!(state["fields"]["disabled"]["booleanValue"], true);
    assert!(state["fields"]["disabled_at"]["timestampValue"].is_string());
}

#[tokio::test]
async fn warning_band_only_publishes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/demo-project/topics/cost-alerts:publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messageIds": ["msg-2"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = monitor_app(&server, 85.0)
        .oneshot(Request::post("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // Only the publish request was made: no disable, no state access.
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let data = body["messages"][0]["data"].as_str().unwrap();
    let alert: serde_json::Value = serde_json::from_slice(&BASE64.decode(data).unwrap()).unwrap();
    assert_eq!(alert["action_taken"], "warning");
}

#[tokio::test]
async fn under_budget_touches_nothing() {
    let server = MockServer::start().await;

    let response = monitor_app(&server, 10.0)
        .oneshot(Request::post("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn disable_failure_still_publishes_and_acks() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(STATE_DOC_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(
            "/v1/projects/demo-project/services/compute.googleapis.com:disable",
        ))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/projects/demo-project/topics/cost-alerts:publish"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messageIds": ["msg-3"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(STATE_DOC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let response = monitor_app(&server, 105.0)
        .oneshot(Request::post("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
