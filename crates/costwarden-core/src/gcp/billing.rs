//! Billing cost source

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::error::Result;

/// Source of per-service spend for a billing period
#[async_trait]
pub trait CostSource: Send + Sync {
    /// Cost accrued by `service` between `start` and `end` (inclusive), in USD
    async fn cost_for_service(&self, service: &str, start: NaiveDate, end: NaiveDate)
        -> Result<f64>;
}

/// Cost source backed by the project's billing data
///
/// Mapping SKUs in the detailed billing export to service identifiers is not
/// wired up yet; until it is, every query reports zero spend. A real
/// implementation would query the billing export in BigQuery.
pub struct BillingCostSource;

#[async_trait]
impl CostSource for BillingCostSource {
    async fn cost_for_service(
        &self,
        service: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64> {
        info!(service = %service, %start, %end, "Querying service cost");
        Ok(0.0)
    }
}
