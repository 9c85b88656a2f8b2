//! Budget rule evaluation

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, error, info};

use crate::error::Result;
use crate::gcp::{AlertPublisher, CostSource, ServiceControl, StateStore};
use crate::models::{AlertMessage, BudgetAction, BudgetRule, ServiceState};

/// The current billing period: first day of the month through today
pub fn billing_period() -> (NaiveDate, NaiveDate) {
    let today = Utc::now().date_naive();
    let start = today
        .with_day(1)
        .expect("first day of the month is a valid date");
    (start, today)
}

/// Evaluates configured budget rules against current spend
///
/// Rules are evaluated strictly sequentially. A failing publish or state
/// write aborts the remaining rules in the same invocation; only the
/// service-disable call is allowed to fail without stopping the run.
pub struct BudgetEvaluator {
    budgets: Vec<BudgetRule>,
    costs: Arc<dyn CostSource>,
    control: Arc<dyn ServiceControl>,
    publisher: Arc<dyn AlertPublisher>,
    states: Arc<dyn StateStore>,
}

impl BudgetEvaluator {
    /// Create a new evaluator over the configured budget rules
    pub fn new(
        budgets: Vec<BudgetRule>,
        costs: Arc<dyn CostSource>,
        control: Arc<dyn ServiceControl>,
        publisher: Arc<dyn AlertPublisher>,
        states: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            budgets,
            costs,
            control,
            publisher,
            states,
        }
    }

    /// Evaluate every configured budget rule for the current billing period
    pub async fn evaluate_all(&self) -> Result<()> {
        let (start, end) = billing_period();

        debug!(count = self.budgets.len(), %start, %end, "Evaluating budget rules");

        for rule in &self.budgets {
            self.evaluate_rule(rule, start, end).await?;
        }

        Ok(())
    }

    /// Evaluate a single rule
    pub async fn evaluate_rule(
        &self,
        rule: &BudgetRule,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<()> {
        let cost = self
            .costs
            .cost_for_service(&rule.service, start, end)
            .await?;

        match rule.check(cost) {
            Some(BudgetAction::Disabled) => self.handle_exceeded(rule, cost).await,
            Some(BudgetAction::Warning) => self.handle_warning(rule, cost).await,
            None => {
                debug!(service = %rule.service, cost, limit = rule.limit, "Budget within limits");
                Ok(())
            }
        }
    }

    /// Exceeded path: disable the service, publish, persist state
    async fn handle_exceeded(&self, rule: &BudgetRule, cost: f64) -> Result<()> {
        info!(service = %rule.service, cost, limit = rule.limit, "Budget exceeded");

        let already_disabled = matches!(
            self.states.get(&rule.service).await?,
            Some(state) if state.disabled
        );

        if already_disabled {
            info!(service = %rule.service, "Service already disabled, skipping disable call");
        } else if let Err(e) = self.control.disable_service(&rule.service).await {
            // The disable call is fire-and-forget; the rest of the run
            // must not stop on its failure.
            error!(service = %rule.service, error = %e, "Error disabling service");
        }

        let alert = AlertMessage::new(&rule.service, cost, rule.limit, BudgetAction::Disabled);
        self.publisher.publish(&alert).await?;

        if !already_disabled {
            self.states
                .mark_disabled(&rule.service, &ServiceState::disabled_now())
                .await?;
        }

        Ok(())
    }

    /// Warning path: publish only
    async fn handle_warning(&self, rule: &BudgetRule, cost: f64) -> Result<()> {
        info!(service = %rule.service, cost, limit = rule.limit, "Budget warning");

        let alert = AlertMessage::new(&rule.service, cost, rule.limit, BudgetAction::Warning);
        self.publisher.publish(&alert).await?;

        Ok(())
    }
}
