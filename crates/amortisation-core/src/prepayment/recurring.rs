//! Recurring prepayments: the same prepayment repeated every
//! `periodicity_months` from `start_month` until the original term ends.
//!
//! Targets are fixed against the originally requested term, but each one
//! is resolved against the schedule as it stands after the previous
//! events, which may already be shorter than planned.

use serde::{Deserialize, Serialize};

use crate::error::AmortisationError;
use crate::schedule::{generate_schedule, month_position, LoanTerms, Schedule, BALANCE_EPSILON};
use crate::AmortisationResult;

use super::{apply_prepayment, PrepaymentEvent, PrepaymentOutcome, PrepaymentTerms, SkipReason};

/// A prepayment repeated at a fixed cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPrepayment {
    pub periodicity_months: u32,
    /// 1-based global month of the first prepayment.
    pub start_month: u32,
    #[serde(flatten)]
    pub terms: PrepaymentTerms,
}

impl RecurringPrepayment {
    pub fn new(terms: PrepaymentTerms, periodicity_months: u32, start_month: u32) -> Self {
        Self {
            periodicity_months,
            start_month,
            terms,
        }
    }

    pub fn validate(&self) -> AmortisationResult<()> {
        if self.periodicity_months == 0 {
            return Err(AmortisationError::InvalidInput {
                field: "periodicity_months".into(),
                reason: "Periodicity must be at least one month".into(),
            });
        }
        if self.start_month == 0 {
            return Err(AmortisationError::InvalidInput {
                field: "start_month".into(),
                reason: "Start month is 1-based".into(),
            });
        }
        self.terms.validate()
    }
}

/// Final schedule of a recurring plan and the outcome of every target
/// that was evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringApplication {
    pub schedule: Schedule,
    pub outcomes: Vec<PrepaymentOutcome>,
    /// Processing stopped because the loan was repaid at a target month.
    pub stopped_early: bool,
}

/// Global months `start, start + p, start + 2p, ...` up to `term_months`.
pub fn target_months(start_month: u32, periodicity_months: u32, term_months: u32) -> Vec<u32> {
    if periodicity_months == 0 || start_month == 0 {
        return Vec::new();
    }
    (start_month..=term_months)
        .step_by(periodicity_months as usize)
        .collect()
}

/// Build the base schedule for `loan` and apply `plan` at every target.
///
/// A target the schedule no longer reaches is skipped and the next one is
/// still tried. A target whose row is already repaid ends processing.
pub fn apply_recurring_prepayments(
    loan: &LoanTerms,
    plan: &RecurringPrepayment,
) -> AmortisationResult<RecurringApplication> {
    plan.validate()?;

    let mut schedule = generate_schedule(loan)?;
    let mut outcomes = Vec::new();
    let mut stopped_early = false;

    for target in target_months(plan.start_month, plan.periodicity_months, loan.term_months) {
        let (year, month) = month_position(target);

        let idx = match schedule.locate(year, month) {
            Some(idx) => idx,
            None => {
                log::debug!("recurring target month {target} is past the end of the schedule");
                outcomes.push(PrepaymentOutcome::Skipped {
                    year,
                    month,
                    reason: SkipReason::OutsideSchedule,
                });
                continue;
            }
        };

        if schedule.rows()[idx].balance <= BALANCE_EPSILON {
            log::debug!("loan repaid by month {target}; remaining recurring targets dropped");
            outcomes.push(PrepaymentOutcome::Skipped {
                year,
                month,
                reason: SkipReason::LoanRepaid,
            });
            stopped_early = true;
            break;
        }

        let event = PrepaymentEvent {
            year,
            month,
            terms: plan.terms.clone(),
        };
        let application = apply_prepayment(&schedule, loan, &event)?;
        schedule = application.schedule;
        outcomes.push(application.outcome);
    }

    Ok(RecurringApplication {
        schedule,
        outcomes,
        stopped_early,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepayment::ReamortisationMode;
    use crate::schedule::AmortisationSystem;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn zero_rate_loan() -> LoanTerms {
        LoanTerms::new(dec!(36000), Decimal::ZERO, 36, AmortisationSystem::French)
    }

    fn plan(amount: Decimal, periodicity: u32, start: u32, mode: ReamortisationMode) -> RecurringPrepayment {
        let mut terms = PrepaymentTerms::new(amount);
        terms.fee_rate = Decimal::ZERO;
        terms.mode = mode;
        RecurringPrepayment::new(terms, periodicity, start)
    }

    #[test]
    fn test_target_months() {
        assert_eq!(target_months(6, 12, 36), vec![6, 18, 30]);
        assert_eq!(target_months(1, 24, 48), vec![1, 25]);
        assert_eq!(target_months(12, 12, 12), vec![12]);
        assert!(target_months(40, 12, 36).is_empty());
        assert!(target_months(1, 0, 36).is_empty());
    }

    #[test]
    fn test_installment_mode_applies_every_target() {
        let loan = zero_rate_loan();
        let result =
            apply_recurring_prepayments(&loan, &plan(dec!(1000), 12, 6, ReamortisationMode::Installment))
                .unwrap();

        assert_eq!(result.outcomes.len(), 3);
        assert!(result.outcomes.iter().all(|o| o.is_applied()));
        assert!(!result.stopped_early);
        assert_eq!(result.schedule.installment_count(), 36);
        assert_eq!(result.schedule.terminal_balance(), Decimal::ZERO);
    }

    #[test]
    fn test_shrinking_schedule_skips_later_targets() {
        let loan = zero_rate_loan();
        let result =
            apply_recurring_prepayments(&loan, &plan(dec!(20000), 6, 4, ReamortisationMode::Term))
                .unwrap();

        // Month 4: 32,000 -> 12,000, term mode runs to month 16.
        // Month 10: 6,000 owed, 20,000 offered -> paid off at month 10.
        assert_eq!(result.schedule.installment_count(), 10);
        assert!(!result.stopped_early);
        assert_eq!(result.outcomes.len(), 6);
        assert!(result.outcomes[1].applied().unwrap().paid_off);
        for outcome in &result.outcomes[2..] {
            assert!(matches!(
                outcome,
                PrepaymentOutcome::Skipped {
                    reason: SkipReason::OutsideSchedule,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_repaid_row_stops_processing() {
        let loan = zero_rate_loan();
        let result =
            apply_recurring_prepayments(&loan, &plan(dec!(20000), 12, 4, ReamortisationMode::Term))
                .unwrap();

        // Month 4: 12,000 left at 1,000 a month -> repaid exactly at month 16,
        // which is the next target; month 28 is never evaluated.
        assert!(result.stopped_early);
        assert_eq!(result.outcomes.len(), 2);
        assert_eq!(
            result.outcomes[1],
            PrepaymentOutcome::Skipped {
                year: 2,
                month: 4,
                reason: SkipReason::LoanRepaid
            }
        );
        assert_eq!(result.schedule.installment_count(), 16);
    }

    #[test]
    fn test_invalid_plan_rejected() {
        let loan = zero_rate_loan();
        assert!(apply_recurring_prepayments(&loan, &plan(dec!(100), 0, 1, ReamortisationMode::Term)).is_err());
        assert!(apply_recurring_prepayments(&loan, &plan(dec!(100), 12, 0, ReamortisationMode::Term)).is_err());
    }
}
