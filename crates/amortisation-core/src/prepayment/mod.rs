//! Extraordinary (early) repayments: the event model shared by one-off and
//! recurring prepayments, and the outcome reported for each attempt.

pub mod single;

#[cfg(feature = "recurring")]
pub mod recurring;

pub use single::apply_prepayment;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AmortisationError;
use crate::penalty::PenaltyTerms;
use crate::schedule::{global_month, Schedule};
use crate::types::{Money, Percent};
use crate::AmortisationResult;

/// Row ceiling for term-mode re-amortisation.
pub const DEFAULT_MAX_TERM_ROWS: u32 = 1000;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// How the remainder of the loan is re-amortised after a prepayment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReamortisationMode {
    /// Keep the remaining duration, lower the installment.
    #[default]
    Installment,
    /// Keep the installment, shorten the duration.
    Term,
}

/// What happens to an assessed early-repayment penalty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PenaltyTreatment {
    /// Reported in the outcome only; the schedule and summary are untouched.
    #[default]
    Disclosed,
    /// Written to the row's `penalty` column and counted as paid.
    Charged,
}

/// Amount and conditions of a prepayment, independent of when it happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentTerms {
    /// Gross amount handed over, fee included.
    pub amount: Money,
    /// Service fee deducted from the gross amount, in percent.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Percent,
    #[serde(default)]
    pub penalty: PenaltyTerms,
    #[serde(default)]
    pub penalty_treatment: PenaltyTreatment,
    #[serde(default)]
    pub mode: ReamortisationMode,
    #[serde(default = "default_max_term_rows")]
    pub max_term_rows: u32,
}

impl PrepaymentTerms {
    pub fn new(amount: Money) -> Self {
        Self {
            amount,
            fee_rate: default_fee_rate(),
            penalty: PenaltyTerms::default(),
            penalty_treatment: PenaltyTreatment::default(),
            mode: ReamortisationMode::default(),
            max_term_rows: default_max_term_rows(),
        }
    }

    pub fn validate(&self) -> AmortisationResult<()> {
        if self.amount < Decimal::ZERO {
            return Err(AmortisationError::InvalidInput {
                field: "amount".into(),
                reason: "Prepayment amount cannot be negative".into(),
            });
        }
        if self.fee_rate < Decimal::ZERO || self.fee_rate >= Decimal::ONE_HUNDRED {
            return Err(AmortisationError::InvalidInput {
                field: "fee_rate".into(),
                reason: "Fee rate must be in [0, 100)".into(),
            });
        }
        if self.penalty.rate < Decimal::ZERO {
            return Err(AmortisationError::InvalidInput {
                field: "penalty.rate".into(),
                reason: "Penalty rate cannot be negative".into(),
            });
        }
        if self.max_term_rows == 0 {
            return Err(AmortisationError::InvalidInput {
                field: "max_term_rows".into(),
                reason: "Row ceiling must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn default_fee_rate() -> Percent {
    Decimal::new(25, 2)
}

fn default_max_term_rows() -> u32 {
    DEFAULT_MAX_TERM_ROWS
}

/// A one-off prepayment at `(year, month-of-year)` of the loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentEvent {
    pub year: u32,
    pub month: u32,
    #[serde(flatten)]
    pub terms: PrepaymentTerms,
}

impl PrepaymentEvent {
    pub fn new(amount: Money, year: u32, month: u32) -> Self {
        Self {
            year,
            month,
            terms: PrepaymentTerms::new(amount),
        }
    }

    pub fn with_fee_rate(mut self, fee_rate: Percent) -> Self {
        self.terms.fee_rate = fee_rate;
        self
    }

    pub fn with_mode(mut self, mode: ReamortisationMode) -> Self {
        self.terms.mode = mode;
        self
    }

    pub fn with_penalty(mut self, penalty: PenaltyTerms, treatment: PenaltyTreatment) -> Self {
        self.terms.penalty = penalty;
        self.terms.penalty_treatment = treatment;
        self
    }

    pub fn validate(&self) -> AmortisationResult<()> {
        if global_month(self.year, self.month).is_none() {
            return Err(AmortisationError::InvalidInput {
                field: "month".into(),
                reason: format!(
                    "({}, {}) is not a schedule position; month must be 1-12 from year 1",
                    self.year, self.month
                ),
            });
        }
        self.terms.validate()
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Why a prepayment left the schedule unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The schedule no longer reaches the target month.
    OutsideSchedule,
    /// The target is the opening row, which carries no payment.
    OpeningRow,
    /// The loan was already repaid at the target month.
    LoanRepaid,
}

/// Figures of a prepayment that was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedPrepayment {
    pub year: u32,
    pub month: u32,
    pub global_month: u32,
    /// Gross amount actually paid (reduced when it exceeded the payoff).
    pub gross: Money,
    pub fee: Money,
    /// Amount applied to principal.
    pub net: Money,
    /// Early-repayment penalty assessed on the gross amount.
    pub penalty: Money,
    pub penalty_charged: bool,
    pub balance_before: Money,
    pub balance_after: Money,
    /// The prepayment repaid the loan and the schedule ends here.
    pub paid_off: bool,
    pub mode: ReamortisationMode,
    pub rows_regenerated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrepaymentOutcome {
    Applied(AppliedPrepayment),
    Skipped {
        year: u32,
        month: u32,
        reason: SkipReason,
    },
}

impl PrepaymentOutcome {
    pub fn applied(&self) -> Option<&AppliedPrepayment> {
        match self {
            PrepaymentOutcome::Applied(a) => Some(a),
            PrepaymentOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.applied().is_some()
    }
}

/// The schedule after a prepayment attempt together with what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentApplication {
    pub schedule: Schedule,
    pub outcome: PrepaymentOutcome,
}
