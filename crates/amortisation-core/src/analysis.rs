//! End-to-end loan analysis: baseline schedule, optional one-off or
//! recurring prepayments, summaries of both and the resulting savings,
//! wrapped in the standard computation envelope.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::AmortisationError;
use crate::prepayment::recurring::{apply_recurring_prepayments, RecurringPrepayment};
use crate::prepayment::{apply_prepayment, PrepaymentEvent, PrepaymentOutcome, SkipReason};
use crate::schedule::{generate_schedule, LoanTerms, Schedule, BALANCE_EPSILON};
use crate::summary::{compare_summaries, summarise, Savings, Summary};
use crate::types::{with_metadata, ComputationOutput, Rate};
use crate::AmortisationResult;

// ---------------------------------------------------------------------------
// Ranges accepted by the loan entry form
// ---------------------------------------------------------------------------

const MIN_PRINCIPAL: Decimal = dec!(1000);
const MAX_PRINCIPAL: Decimal = dec!(10000000);
const MAX_ANNUAL_RATE: Decimal = dec!(20);
const MAX_TERM_MONTHS: u32 = 40 * 12 + 11;
const STANDARD_PERIODICITIES: [u32; 6] = [1, 3, 6, 12, 24, 36];

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Which prepayments, if any, to model on top of the baseline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrepaymentPlan {
    #[default]
    None,
    OneOff(PrepaymentEvent),
    Recurring(RecurringPrepayment),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysisInput {
    pub loan: LoanTerms,
    #[serde(default)]
    pub plan: PrepaymentPlan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAnalysisOutput {
    pub monthly_rate: Rate,
    pub baseline_summary: Summary,
    pub summary: Summary,
    /// Absent when no prepayment plan was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<Savings>,
    pub events: Vec<PrepaymentOutcome>,
    pub schedule: Schedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub monthly_rate: Rate,
    pub summary: Summary,
    pub schedule: Schedule,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Amortisation table and summary for a loan without prepayments.
pub fn build_schedule(loan: &LoanTerms) -> AmortisationResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    loan_range_warnings(loan, &mut warnings);

    let schedule = generate_schedule(loan)?;
    let output = ScheduleOutput {
        monthly_rate: loan.monthly_rate()?,
        summary: summarise(&schedule),
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(loan, None),
        loan,
        warnings,
        elapsed,
        output,
    ))
}

/// Run the baseline and the requested prepayment plan and compare them.
pub fn analyse_loan(
    input: &LoanAnalysisInput,
) -> AmortisationResult<ComputationOutput<LoanAnalysisOutput>> {
    let start = Instant::now();
    let mut warnings = Vec::new();
    let loan = &input.loan;
    loan_range_warnings(loan, &mut warnings);

    let baseline = generate_schedule(loan)?;
    let baseline_summary = summarise(&baseline);

    let (schedule, events) = match &input.plan {
        PrepaymentPlan::None => (baseline, Vec::new()),
        PrepaymentPlan::OneOff(event) => {
            let application = apply_prepayment(&baseline, loan, event)?;
            (application.schedule, vec![application.outcome])
        }
        PrepaymentPlan::Recurring(plan) => {
            if !STANDARD_PERIODICITIES.contains(&plan.periodicity_months) {
                warnings.push(format!(
                    "Periodicity of {} months is outside the standard set {:?}",
                    plan.periodicity_months, STANDARD_PERIODICITIES
                ));
            }
            let application = apply_recurring_prepayments(loan, plan)?;
            if application.stopped_early {
                warnings.push(
                    "Loan repaid before the last recurring prepayment; remaining prepayments dropped"
                        .into(),
                );
            }
            (application.schedule, application.outcomes)
        }
    };

    if !schedule.is_settled() {
        return Err(AmortisationError::FinancialImpossibility(format!(
            "Schedule ends with {} outstanding (tolerance {})",
            schedule.terminal_balance(),
            BALANCE_EPSILON
        )));
    }

    event_warnings(&events, &mut warnings);

    let summary = summarise(&schedule);
    let savings = match input.plan {
        PrepaymentPlan::None => None,
        _ => Some(compare_summaries(&baseline_summary, &summary)),
    };

    let output = LoanAnalysisOutput {
        monthly_rate: loan.monthly_rate()?,
        baseline_summary,
        summary,
        savings,
        events,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(loan, Some(&input.plan)),
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn methodology(loan: &LoanTerms, plan: Option<&PrepaymentPlan>) -> &'static str {
    use crate::schedule::AmortisationSystem::{French, German};
    match (loan.system, plan) {
        (French, None | Some(PrepaymentPlan::None)) => "French Amortisation (constant installment)",
        (German, None | Some(PrepaymentPlan::None)) => "German Amortisation (constant principal)",
        (French, Some(PrepaymentPlan::OneOff(_))) => "French Amortisation with Partial Prepayment",
        (German, Some(PrepaymentPlan::OneOff(_))) => "German Amortisation with Partial Prepayment",
        (French, Some(PrepaymentPlan::Recurring(_))) => {
            "French Amortisation with Recurring Prepayments"
        }
        (German, Some(PrepaymentPlan::Recurring(_))) => {
            "German Amortisation with Recurring Prepayments"
        }
    }
}

fn loan_range_warnings(loan: &LoanTerms, warnings: &mut Vec<String>) {
    if loan.principal < MIN_PRINCIPAL || loan.principal > MAX_PRINCIPAL {
        warnings.push(format!(
            "Principal {} is outside the usual range [{MIN_PRINCIPAL}, {MAX_PRINCIPAL}]",
            loan.principal
        ));
    }
    if loan.annual_rate > MAX_ANNUAL_RATE {
        warnings.push(format!(
            "Annual rate of {}% is unusually high",
            loan.annual_rate
        ));
    }
    if loan.term_months > MAX_TERM_MONTHS {
        warnings.push(format!(
            "Term of {} months exceeds the usual maximum of {MAX_TERM_MONTHS}",
            loan.term_months
        ));
    }
}

fn event_warnings(events: &[PrepaymentOutcome], warnings: &mut Vec<String>) {
    for event in events {
        match event {
            PrepaymentOutcome::Skipped {
                year,
                month,
                reason: SkipReason::OutsideSchedule,
            } => warnings.push(format!(
                "Prepayment at year {year}, month {month} skipped: the schedule ends earlier"
            )),
            PrepaymentOutcome::Skipped {
                reason: SkipReason::OpeningRow,
                ..
            } => warnings.push("Prepayment at the opening row skipped".into()),
            PrepaymentOutcome::Skipped {
                reason: SkipReason::LoanRepaid,
                ..
            } => {}
            PrepaymentOutcome::Applied(applied) => {
                if applied.penalty > Decimal::ZERO && !applied.penalty_charged {
                    warnings.push(format!(
                        "Early-repayment penalty of {} at month {} is disclosed only, not charged",
                        applied.penalty, applied.global_month
                    ));
                }
            }
        }
    }
}
