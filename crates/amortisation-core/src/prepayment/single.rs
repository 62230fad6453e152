//! One-off partial prepayment and re-amortisation of the rows after it.

use rust_decimal::Decimal;

use crate::error::AmortisationError;
use crate::rates::accrue_interest;
use crate::schedule::{amortise, LoanTerms, Schedule, ScheduleRow, BALANCE_EPSILON};
use crate::types::{pct_to_fraction, Money, Rate};
use crate::AmortisationResult;

use super::{
    AppliedPrepayment, PenaltyTreatment, PrepaymentApplication, PrepaymentEvent,
    PrepaymentOutcome, ReamortisationMode, SkipReason,
};

/// Apply one prepayment to `schedule` and re-amortise the remainder.
///
/// The target row keeps its scheduled installment; the net prepayment is
/// taken off the balance after it. Every later row is regenerated:
/// over the same number of months in installment mode, or at the
/// pre-event installment until payoff in term mode. A net amount at or
/// above the outstanding balance repays the loan and the schedule ends at
/// the target row.
///
/// A target outside the schedule, or the opening row, leaves the schedule
/// unchanged and reports `PrepaymentOutcome::Skipped`.
pub fn apply_prepayment(
    schedule: &Schedule,
    loan: &LoanTerms,
    event: &PrepaymentEvent,
) -> AmortisationResult<PrepaymentApplication> {
    loan.validate()?;
    event.validate()?;

    let idx = match schedule.locate(event.year, event.month) {
        Some(0) => return Ok(skipped(schedule, event, SkipReason::OpeningRow)),
        Some(idx) => idx,
        None => return Ok(skipped(schedule, event, SkipReason::OutsideSchedule)),
    };

    let terms = &event.terms;
    let rate = loan.monthly_rate()?;
    let global_month = idx as u32;
    let target = &schedule.rows()[idx];
    let balance_before = target.balance;
    let installment_before = target.installment;

    // Fee comes out of the gross amount
    let fee_fraction = pct_to_fraction(terms.fee_rate);
    let mut gross = terms.amount;
    let mut fee = gross * fee_fraction;
    let mut net = gross - fee;

    // Never repay more than is owed; keep fee/gross in the same ratio
    if net > balance_before {
        net = balance_before;
        fee = net / (Decimal::ONE - fee_fraction) * fee_fraction;
        gross = net + fee;
    }

    let balance_after = balance_before - net;
    let paid_off = balance_after <= Decimal::ZERO;
    let penalty = terms.penalty.assess(gross, global_month);
    let penalty_charged = terms.penalty_treatment == PenaltyTreatment::Charged;

    let mut rows: Vec<ScheduleRow> = schedule.rows()[..=idx].to_vec();
    if let Some(row) = rows.last_mut() {
        row.prepayment = net;
        row.fee = fee;
        row.balance = if paid_off { Decimal::ZERO } else { balance_after };
        if penalty_charged {
            row.penalty = penalty;
        }
    }

    let regenerated = if paid_off {
        Vec::new()
    } else {
        let remaining_months = (schedule.rows().len() - idx - 1) as u32;
        match terms.mode {
            ReamortisationMode::Installment => amortise(
                loan.system,
                balance_after,
                rate,
                global_month + 1,
                remaining_months,
            )?,
            ReamortisationMode::Term => amortise_at_installment(
                balance_after,
                rate,
                installment_before,
                global_month + 1,
                terms.max_term_rows,
            )?,
        }
    };

    log::debug!(
        "prepayment at month {global_month}: gross={gross} fee={fee} net={net} penalty={penalty} \
         mode={:?} paid_off={paid_off} regenerated={}",
        terms.mode,
        regenerated.len()
    );

    let outcome = PrepaymentOutcome::Applied(AppliedPrepayment {
        year: event.year,
        month: event.month,
        global_month,
        gross,
        fee,
        net,
        penalty,
        penalty_charged,
        balance_before,
        balance_after: if paid_off { Decimal::ZERO } else { balance_after },
        paid_off,
        mode: terms.mode,
        rows_regenerated: regenerated.len(),
    });

    rows.extend(regenerated);

    Ok(PrepaymentApplication {
        schedule: Schedule::from_rows(rows),
        outcome,
    })
}

fn skipped(schedule: &Schedule, event: &PrepaymentEvent, reason: SkipReason) -> PrepaymentApplication {
    log::debug!(
        "prepayment at ({}, {}) skipped: {:?}",
        event.year,
        event.month,
        reason
    );
    PrepaymentApplication {
        schedule: schedule.clone(),
        outcome: PrepaymentOutcome::Skipped {
            year: event.year,
            month: event.month,
            reason,
        },
    }
}

/// Term-mode re-amortisation: pay `installment` every month until the
/// balance is within `BALANCE_EPSILON` of zero, capping the final row.
fn amortise_at_installment(
    balance: Money,
    rate: Rate,
    installment: Money,
    first_month: u32,
    max_rows: u32,
) -> AmortisationResult<Vec<ScheduleRow>> {
    let mut rows = Vec::new();
    let mut outstanding = balance;

    while outstanding > BALANCE_EPSILON {
        if rows.len() as u32 >= max_rows {
            log::warn!(
                "term re-amortisation from month {first_month} still owes {outstanding} after {max_rows} rows"
            );
            return Err(AmortisationError::ConvergenceFailure {
                function: "Term re-amortisation".into(),
                iterations: max_rows,
                last_delta: outstanding,
            });
        }

        let month = first_month + rows.len() as u32;
        let interest = accrue_interest(outstanding, rate)?;
        let mut amortisation = installment - interest;
        let row_installment = if amortisation >= outstanding {
            amortisation = outstanding;
            outstanding = Decimal::ZERO;
            amortisation + interest
        } else {
            outstanding -= amortisation;
            installment
        };

        rows.push(ScheduleRow::scheduled(
            month,
            row_installment,
            interest,
            amortisation,
            outstanding,
        ));
    }

    Ok(rows)
}
