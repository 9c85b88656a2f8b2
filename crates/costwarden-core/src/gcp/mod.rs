//! GCP REST interfaces
//!
//! Thin REST clients for the external APIs the monitor and relay depend on:
//! Service Usage (disable), Pub/Sub (alert publish), Firestore (service
//! state), Secret Manager (SMTP credentials) and the billing cost source.
//! Each concern is a trait so handlers can be exercised with test doubles.

mod auth;
mod billing;
mod firestore;
mod pubsub;
mod secrets;
mod service_usage;

pub use auth::TokenProvider;
pub use billing::{BillingCostSource, CostSource};
pub use firestore::{FirestoreStateStore, StateStore};
pub use pubsub::{AlertPublisher, PubSubPublisher};
pub use secrets::SecretStore;
pub use service_usage::{ServiceControl, ServiceUsageClient};
