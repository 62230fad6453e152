//! Headline figures of an amortisation table and the savings obtained by
//! comparing an adjusted schedule against its baseline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schedule::{Schedule, MONTHS_PER_YEAR};
use crate::types::{Money, Percent};

/// Aggregates of a schedule, excluding the opening row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_interest: Money,
    /// Scheduled principal repaid through installments.
    pub total_amortisation: Money,
    pub total_installments: Money,
    /// Installments, prepayments, fees and charged penalties.
    pub total_paid: Money,
    pub installment_count: u32,
    pub initial_installment: Money,
    /// Installment in force after the last prepayment.
    pub final_installment: Money,
    pub mean_installment: Money,
    pub total_prepayment: Money,
    pub total_fees: Money,
    pub total_penalties: Money,
    pub duration_years: Decimal,
}

/// Difference between a baseline schedule and the same loan after
/// prepayments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Savings {
    pub interest_saved: Money,
    pub interest_saved_pct: Percent,
    pub months_saved: i64,
    pub years_saved: Decimal,
    pub installment_reduction: Money,
    pub installment_reduction_pct: Percent,
}

/// Reduce a schedule to its headline figures.
pub fn summarise(schedule: &Schedule) -> Summary {
    let rows = schedule.installments();

    let mut total_interest = Decimal::ZERO;
    let mut total_amortisation = Decimal::ZERO;
    let mut total_installments = Decimal::ZERO;
    let mut total_prepayment = Decimal::ZERO;
    let mut total_fees = Decimal::ZERO;
    let mut total_penalties = Decimal::ZERO;

    for row in rows {
        total_interest += row.interest;
        total_amortisation += row.amortisation;
        total_installments += row.installment;
        total_prepayment += row.prepayment;
        total_fees += row.fee;
        total_penalties += row.penalty;
    }

    let count = rows.len();
    let initial_installment = rows.first().map(|r| r.installment).unwrap_or(Decimal::ZERO);
    let mean_installment = if count > 0 {
        total_installments / Decimal::from(count as u64)
    } else {
        Decimal::ZERO
    };

    // The row after the last prepayment carries the re-amortised
    // installment; a prepayment on the final row leaves its own.
    let final_installment = match rows.iter().rposition(|r| r.prepayment > Decimal::ZERO) {
        Some(pos) => rows.get(pos + 1).unwrap_or(&rows[pos]).installment,
        None => initial_installment,
    };

    Summary {
        total_interest,
        total_amortisation,
        total_installments,
        total_paid: total_installments + total_prepayment + total_fees + total_penalties,
        installment_count: count as u32,
        initial_installment,
        final_installment,
        mean_installment,
        total_prepayment,
        total_fees,
        total_penalties,
        duration_years: Decimal::from(count as u64) / Decimal::from(MONTHS_PER_YEAR),
    }
}

/// Savings of `adjusted` relative to `baseline`.
pub fn compare_summaries(baseline: &Summary, adjusted: &Summary) -> Savings {
    let interest_saved = baseline.total_interest - adjusted.total_interest;
    let installment_reduction = baseline.initial_installment - adjusted.final_installment;
    let months_saved = baseline.installment_count as i64 - adjusted.installment_count as i64;

    Savings {
        interest_saved,
        interest_saved_pct: share_pct(interest_saved, baseline.total_interest),
        months_saved,
        years_saved: Decimal::from(months_saved) / Decimal::from(MONTHS_PER_YEAR),
        installment_reduction,
        installment_reduction_pct: share_pct(installment_reduction, baseline.initial_installment),
    }
}

fn share_pct(part: Decimal, whole: Decimal) -> Percent {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        part / whole * Decimal::ONE_HUNDRED
    }
}
