//! Budget rule model

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::BudgetAction;

/// Fraction of the limit at which a warning is raised
pub const WARNING_RATIO: f64 = 0.8;

/// A configured (service, spending limit) pair
///
/// Loaded from static configuration at process start; immutable for the
/// process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRule {
    /// Service identifier, e.g. `compute.googleapis.com`
    pub service: String,

    /// Spending limit for the billing period (USD)
    pub limit: f64,
}

impl BudgetRule {
    /// Validate the rule
    pub fn validate(&self) -> Result<()> {
        if self.service.is_empty() {
            return Err(Error::validation("budget service must not be empty"));
        }
        if !self.limit.is_finite() || self.limit < 0.0 {
            return Err(Error::validation(format!(
                "budget limit for '{}' must be a non-negative number, got {}",
                self.service, self.limit
            )));
        }
        Ok(())
    }

    /// Check a period cost against this rule's thresholds
    pub fn check(&self, cost: f64) -> Option<BudgetAction> {
        if cost >= self.limit {
            Some(BudgetAction::Disabled)
        } else if cost >= self.limit * WARNING_RATIO {
            Some(BudgetAction::Warning)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(limit: f64) -> BudgetRule {
        BudgetRule {
            service: "compute.googleapis.com".to_string(),
            limit,
        }
    }

    #[test]
    fn under_warning_threshold_takes_no_action() {
        assert_eq!(rule(100.0).check(79.99), None);
        assert_eq!(rule(100.0).check(0.0), None);
    }

    #[test]
    fn at_warning_threshold_warns() {
        assert_eq!(rule(100.0).check(80.0), Some(BudgetAction::Warning));
        assert_eq!(rule(100.0).check(99.99), Some(BudgetAction::Warning));
    }

    #[test]
    fn at_or_over_limit_disables() {
        assert_eq!(rule(100.0).check(100.0), Some(BudgetAction::Disabled));
        assert_eq!(rule(100.0).check(105.0), Some(BudgetAction::Disabled));
    }

    #[test]
    fn zero_limit_always_disables() {
        assert_eq!(rule(0.0).check(0.0), Some(BudgetAction::Disabled));
    }

    #[test]
    fn negative_limit_fails_validation() {
        assert!(rule(-1.0).validate().is_err());
        assert!(rule(100.0).validate().is_ok());
    }
}
