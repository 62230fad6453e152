use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use amortisation_core::analysis::{self, LoanAnalysisInput, PrepaymentPlan};
use amortisation_core::penalty::PenaltyTerms;
use amortisation_core::prepayment::recurring::RecurringPrepayment;
use amortisation_core::prepayment::{
    PenaltyTreatment, PrepaymentEvent, PrepaymentTerms, ReamortisationMode,
};
use amortisation_core::schedule::{AmortisationSystem, LoanTerms, MONTHS_PER_YEAR};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SystemArg {
    French,
    German,
}

impl From<SystemArg> for AmortisationSystem {
    fn from(arg: SystemArg) -> Self {
        match arg {
            SystemArg::French => AmortisationSystem::French,
            SystemArg::German => AmortisationSystem::German,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Keep the remaining term, lower the installment
    Installment,
    /// Keep the installment, shorten the term
    Term,
}

impl From<ModeArg> for ReamortisationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Installment => ReamortisationMode::Installment,
            ModeArg::Term => ReamortisationMode::Term,
        }
    }
}

/// Loan terms given as individual flags
#[derive(Args)]
pub struct LoanFlags {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual effective rate (TAE) in percent, e.g. 3.5
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in whole years
    #[arg(long, default_value_t = 0)]
    pub years: u32,

    /// Months on top of --years (0-11)
    #[arg(long, default_value_t = 0)]
    pub extra_months: u32,

    /// Amortisation system
    #[arg(long, value_enum, default_value = "french")]
    pub system: SystemArg,
}

impl LoanFlags {
    fn to_terms(&self) -> Result<LoanTerms, Box<dyn std::error::Error>> {
        let principal = self
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let rate = self.rate.ok_or("--rate is required (or provide --input)")?;
        if self.extra_months >= MONTHS_PER_YEAR {
            return Err("--extra-months must be between 0 and 11".into());
        }
        let term_months = self
            .years
            .checked_mul(MONTHS_PER_YEAR)
            .and_then(|m| m.checked_add(self.extra_months))
            .ok_or("--years is too large")?;
        if term_months == 0 {
            return Err("--years or --extra-months is required (or provide --input)".into());
        }
        Ok(LoanTerms::new(principal, rate, term_months, self.system.into()))
    }
}

/// Prepayment amount, fee and penalty given as individual flags
#[derive(Args)]
pub struct PrepaymentFlags {
    /// Gross prepayment amount, fee included
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Service fee in percent of the gross amount
    #[arg(long, default_value = "0.25")]
    pub fee_rate: Decimal,

    /// Early-repayment penalty in percent of the amount repaid
    #[arg(long, default_value = "0.5")]
    pub penalty_rate: Decimal,

    /// Years from origination during which the penalty applies
    #[arg(long, default_value_t = 10)]
    pub penalty_years: u32,

    /// Add the penalty to the amounts paid instead of only reporting it
    #[arg(long)]
    pub charge_penalty: bool,

    /// What the prepayment reduces
    #[arg(long, value_enum, default_value = "installment")]
    pub mode: ModeArg,
}

impl PrepaymentFlags {
    fn to_terms(&self) -> Result<PrepaymentTerms, Box<dyn std::error::Error>> {
        let amount = self
            .amount
            .ok_or("--amount is required (or provide --input)")?;
        let mut terms = PrepaymentTerms::new(amount);
        terms.fee_rate = self.fee_rate;
        terms.penalty = PenaltyTerms {
            rate: self.penalty_rate,
            window_years: self.penalty_years,
        };
        terms.penalty_treatment = if self.charge_penalty {
            PenaltyTreatment::Charged
        } else {
            PenaltyTreatment::Disclosed
        };
        terms.mode = self.mode.into();
        Ok(terms)
    }
}

// ---------------------------------------------------------------------------
// schedule
// ---------------------------------------------------------------------------

/// Arguments for a plain amortisation table
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to a JSON/YAML file with the loan terms (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub loan: LoanFlags,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms: LoanTerms = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        args.loan.to_terms()?
    };
    let result = analysis::build_schedule(&terms)?;
    Ok(serde_json::to_value(result)?)
}

// ---------------------------------------------------------------------------
// prepay
// ---------------------------------------------------------------------------

/// Arguments for a one-off prepayment
#[derive(Args)]
pub struct PrepayArgs {
    /// Path to a JSON/YAML analysis request (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub loan: LoanFlags,

    #[command(flatten)]
    pub prepayment: PrepaymentFlags,

    /// Loan year of the prepayment (1-based)
    #[arg(long)]
    pub year: Option<u32>,

    /// Month within that year (1-12)
    #[arg(long)]
    pub month: Option<u32>,
}

pub fn run_prepay(args: PrepayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match read_request(args.input.as_deref())? {
        Some(request) => request,
        None => {
            let year = args.year.ok_or("--year is required (or provide --input)")?;
            let month = args.month.ok_or("--month is required (or provide --input)")?;
            LoanAnalysisInput {
                loan: args.loan.to_terms()?,
                plan: PrepaymentPlan::OneOff(PrepaymentEvent {
                    year,
                    month,
                    terms: args.prepayment.to_terms()?,
                }),
            }
        }
    };
    run_analysis(&request)
}

// ---------------------------------------------------------------------------
// recurring
// ---------------------------------------------------------------------------

/// Arguments for a prepayment repeated at a fixed cadence
#[derive(Args)]
pub struct RecurringArgs {
    /// Path to a JSON/YAML analysis request (overrides flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub loan: LoanFlags,

    #[command(flatten)]
    pub prepayment: PrepaymentFlags,

    /// Months between prepayments (1, 3, 6, 12, 24 or 36 are typical)
    #[arg(long, default_value_t = 12)]
    pub periodicity: u32,

    /// Global month of the first prepayment (1-based)
    #[arg(long, default_value_t = 12)]
    pub start_month: u32,
}

pub fn run_recurring(args: RecurringArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match read_request(args.input.as_deref())? {
        Some(request) => request,
        None => LoanAnalysisInput {
            loan: args.loan.to_terms()?,
            plan: PrepaymentPlan::Recurring(RecurringPrepayment::new(
                args.prepayment.to_terms()?,
                args.periodicity,
                args.start_month,
            )),
        },
    };
    run_analysis(&request)
}

// ---------------------------------------------------------------------------
// analyse
// ---------------------------------------------------------------------------

/// Arguments for a full analysis request
#[derive(Args)]
pub struct AnalyseArgs {
    /// Path to a JSON/YAML analysis request
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_analyse(args: AnalyseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = read_request(args.input.as_deref())?
        .ok_or("--input <file.json|file.yaml> or stdin required for analysis")?;
    run_analysis(&request)
}

// ---------------------------------------------------------------------------
// penalty
// ---------------------------------------------------------------------------

/// Arguments for a standalone penalty quote
#[derive(Args)]
pub struct PenaltyArgs {
    /// Amount repaid early
    #[arg(long)]
    pub amount: Decimal,

    /// Global month of the repayment (1-based)
    #[arg(long)]
    pub month: u32,

    /// Penalty in percent of the amount repaid
    #[arg(long, default_value = "0.5")]
    pub penalty_rate: Decimal,

    /// Years from origination during which the penalty applies
    #[arg(long, default_value_t = 10)]
    pub penalty_years: u32,
}

pub fn run_penalty(args: PenaltyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.amount < Decimal::ZERO {
        return Err("--amount must be non-negative".into());
    }
    let terms = PenaltyTerms {
        rate: args.penalty_rate,
        window_years: args.penalty_years,
    };
    let penalty = terms.assess(args.amount, args.month);
    Ok(json!({
        "result": {
            "penalty": penalty,
            "amount": args.amount,
            "month": args.month,
            "within_window": args.month <= args.penalty_years.saturating_mul(MONTHS_PER_YEAR),
        },
        "assumptions": terms,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_request(
    path: Option<&str>,
) -> Result<Option<LoanAnalysisInput>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        Ok(Some(input::file::read_input(path)?))
    } else if let Some(data) = input::stdin::read_stdin()? {
        Ok(Some(serde_json::from_value(data)?))
    } else {
        Ok(None)
    }
}

fn run_analysis(request: &LoanAnalysisInput) -> Result<Value, Box<dyn std::error::Error>> {
    let result = analysis::analyse_loan(request)?;
    log::info!(
        "{}: {} prepayment event(s), {} warning(s)",
        result.methodology,
        result.result.events.len(),
        result.warnings.len()
    );
    Ok(serde_json::to_value(result)?)
}
