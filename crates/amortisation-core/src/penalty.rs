//! Early-repayment penalty levied inside the contractual window.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schedule::MONTHS_PER_YEAR;
use crate::types::{pct_to_fraction, Money, Percent};

/// Contractual early-repayment penalty: `rate` percent of the amount
/// repaid, levied during the first `window_years` of the loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTerms {
    #[serde(default = "default_penalty_rate")]
    pub rate: Percent,
    #[serde(default = "default_window_years")]
    pub window_years: u32,
}

impl Default for PenaltyTerms {
    fn default() -> Self {
        Self {
            rate: default_penalty_rate(),
            window_years: default_window_years(),
        }
    }
}

impl PenaltyTerms {
    pub fn assess(&self, amount: Money, current_month: u32) -> Money {
        early_repayment_penalty(amount, current_month, self.window_years, self.rate)
    }
}

fn default_penalty_rate() -> Percent {
    Decimal::new(5, 1)
}

fn default_window_years() -> u32 {
    10
}

/// Penalty due on an early repayment of `amount` made in 1-based global
/// month `current_month`: `amount * rate / 100` while the month falls
/// inside the penalty window, zero afterwards.
pub fn early_repayment_penalty(
    amount: Money,
    current_month: u32,
    window_years: u32,
    penalty_rate: Percent,
) -> Money {
    let window_months = window_years.saturating_mul(MONTHS_PER_YEAR);
    if current_month <= window_months {
        amount * pct_to_fraction(penalty_rate)
    } else {
        Decimal::ZERO
    }
}
