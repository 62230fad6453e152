//! Loan terms, the amortisation table and the base schedule generator for
//! the French (constant installment) and German (constant amortisation)
//! repayment systems.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AmortisationError;
use crate::rates;
use crate::types::{Money, Percent, Rate};
use crate::AmortisationResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Balance at or below which a loan is treated as fully repaid.
pub const BALANCE_EPSILON: Decimal = dec!(0.01);

pub const MONTHS_PER_YEAR: u32 = 12;

/// Residuals left by decimal division (e.g. `P / n` summed `n` times).
const DRIFT_TOLERANCE: Decimal = dec!(0.000001);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Repayment convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmortisationSystem {
    /// Constant installment; the interest share shrinks over time.
    #[default]
    French,
    /// Constant principal repayment; the installment shrinks over time.
    German,
}

/// Fixed-rate loan terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    /// Annual effective rate (TAE) in percent.
    pub annual_rate: Percent,
    pub term_months: u32,
    #[serde(default)]
    pub system: AmortisationSystem,
}

impl LoanTerms {
    pub fn new(
        principal: Money,
        annual_rate: Percent,
        term_months: u32,
        system: AmortisationSystem,
    ) -> Self {
        Self {
            principal,
            annual_rate,
            term_months,
            system,
        }
    }

    pub fn validate(&self) -> AmortisationResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(AmortisationError::InvalidInput {
                field: "principal".into(),
                reason: "Principal must be positive".into(),
            });
        }
        if self.annual_rate < Decimal::ZERO {
            return Err(AmortisationError::InvalidInput {
                field: "annual_rate".into(),
                reason: "Annual rate cannot be negative".into(),
            });
        }
        if self.term_months == 0 {
            return Err(AmortisationError::InvalidInput {
                field: "term_months".into(),
                reason: "Term must be at least one month".into(),
            });
        }
        Ok(())
    }

    /// Monthly periodic rate equivalent to the annual TAE.
    pub fn monthly_rate(&self) -> AmortisationResult<Rate> {
        rates::monthly_rate(self.annual_rate)
    }
}

// ---------------------------------------------------------------------------
// Schedule types
// ---------------------------------------------------------------------------

/// One month of the amortisation table.
///
/// Row 0 is the opening state (`year == 0`, `month == 0`, zero flows,
/// balance = principal). Every other row is a payment month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub year: u32,
    pub month: u32,
    pub installment: Money,
    pub interest: Money,
    /// Scheduled principal repayment included in the installment.
    pub amortisation: Money,
    /// Outstanding balance after this row, net of any prepayment.
    pub balance: Money,
    /// Extraordinary prepayment applied to principal at this row.
    #[serde(default)]
    pub prepayment: Money,
    #[serde(default)]
    pub fee: Money,
    /// Early-repayment penalty charged at this row. Only populated when
    /// penalties are charged rather than disclosed.
    #[serde(default)]
    pub penalty: Money,
}

impl ScheduleRow {
    pub fn opening(principal: Money) -> Self {
        Self {
            year: 0,
            month: 0,
            installment: Decimal::ZERO,
            interest: Decimal::ZERO,
            amortisation: Decimal::ZERO,
            balance: principal,
            prepayment: Decimal::ZERO,
            fee: Decimal::ZERO,
            penalty: Decimal::ZERO,
        }
    }

    pub(crate) fn scheduled(
        global_month: u32,
        installment: Money,
        interest: Money,
        amortisation: Money,
        balance: Money,
    ) -> Self {
        let (year, month) = month_position(global_month);
        Self {
            year,
            month,
            installment,
            interest,
            amortisation,
            balance,
            prepayment: Decimal::ZERO,
            fee: Decimal::ZERO,
            penalty: Decimal::ZERO,
        }
    }

    /// 1-based month count since origination (0 for the opening row).
    pub fn global_month(&self) -> u32 {
        if self.year == 0 {
            0
        } else {
            (self.year - 1) * MONTHS_PER_YEAR + self.month
        }
    }
}

/// An ordered amortisation table. Row `i` is global month `i`.
///
/// Schedules are values: every transformation in this crate takes a
/// `&Schedule` and returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    rows: Vec<ScheduleRow>,
}

impl Schedule {
    pub fn from_rows(rows: Vec<ScheduleRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ScheduleRow> {
        self.rows
    }

    /// Payment rows, excluding the opening row.
    pub fn installments(&self) -> &[ScheduleRow] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Realised term in months.
    pub fn installment_count(&self) -> u32 {
        self.installments().len() as u32
    }

    /// Index of the row for `(year, month-of-year)`, if the schedule
    /// reaches that far. `(0, 0)` resolves to the opening row.
    pub fn locate(&self, year: u32, month: u32) -> Option<usize> {
        let idx = global_month(year, month)? as usize;
        self.rows
            .get(idx)
            .filter(|row| row.year == year && row.month == month)
            .map(|_| idx)
    }

    pub fn terminal_balance(&self) -> Money {
        self.rows.last().map(|r| r.balance).unwrap_or(Decimal::ZERO)
    }

    /// True when the loan is repaid to within `BALANCE_EPSILON`.
    pub fn is_settled(&self) -> bool {
        self.terminal_balance() <= BALANCE_EPSILON
    }
}

// ---------------------------------------------------------------------------
// Month arithmetic
// ---------------------------------------------------------------------------

/// `(year, month-of-year)` for a 1-based global month.
pub fn month_position(global_month: u32) -> (u32, u32) {
    if global_month == 0 {
        return (0, 0);
    }
    let zero_based = global_month - 1;
    (
        zero_based / MONTHS_PER_YEAR + 1,
        zero_based % MONTHS_PER_YEAR + 1,
    )
}

/// Inverse of [`month_position`]. `None` for positions that cannot occur
/// in a schedule (month 0 of a payment year, month 13, ...).
pub fn global_month(year: u32, month: u32) -> Option<u32> {
    if year == 0 && month == 0 {
        return Some(0);
    }
    if year == 0 || month == 0 || month > MONTHS_PER_YEAR {
        return None;
    }
    (year - 1).checked_mul(MONTHS_PER_YEAR)?.checked_add(month)
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Build the full amortisation table for a loan with no prepayments.
///
/// The result has `term_months + 1` rows, the first being the opening
/// state.
pub fn generate_schedule(terms: &LoanTerms) -> AmortisationResult<Schedule> {
    terms.validate()?;

    let mut rows = Vec::with_capacity(terms.term_months as usize + 1);
    rows.push(ScheduleRow::opening(terms.principal));
    rows.extend(amortise(
        terms.system,
        terms.principal,
        terms.monthly_rate()?,
        1,
        terms.term_months,
    )?);

    Ok(Schedule::from_rows(rows))
}

/// Amortise `balance` over `months` rows starting at `first_month`.
///
/// Shared by the base generator and installment-mode re-amortisation.
pub(crate) fn amortise(
    system: AmortisationSystem,
    balance: Money,
    rate: Rate,
    first_month: u32,
    months: u32,
) -> AmortisationResult<Vec<ScheduleRow>> {
    let mut rows = Vec::with_capacity(months as usize);
    if months == 0 {
        return Ok(rows);
    }

    let mut outstanding = balance;
    match system {
        AmortisationSystem::French => {
            let installment = rates::french_installment(balance, rate, months)?;
            for offset in 0..months {
                let interest = rates::accrue_interest(outstanding, rate)?;
                let amortisation = installment - interest;
                outstanding = settle(outstanding - amortisation);
                rows.push(ScheduleRow::scheduled(
                    first_month + offset,
                    installment,
                    interest,
                    amortisation,
                    outstanding,
                ));
            }
        }
        AmortisationSystem::German => {
            let amortisation = rates::german_amortisation(balance, months)?;
            for offset in 0..months {
                let interest = rates::accrue_interest(outstanding, rate)?;
                outstanding = settle(outstanding - amortisation);
                rows.push(ScheduleRow::scheduled(
                    first_month + offset,
                    amortisation + interest,
                    interest,
                    amortisation,
                    outstanding,
                ));
            }
        }
    }

    Ok(rows)
}

/// Clamp negative balances and decimal-division residuals to zero.
pub(crate) fn settle(balance: Money) -> Money {
    if balance < DRIFT_TOLERANCE {
        Decimal::ZERO
    } else {
        balance
    }
}
