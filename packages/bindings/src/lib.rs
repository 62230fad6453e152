use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use amortisation_core::penalty::PenaltyTerms;
use amortisation_core::prepayment::PrepaymentEvent;
use amortisation_core::schedule::LoanTerms;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Schedules and analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: LoanTerms = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortisation_core::analysis::build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn analyse_loan(input_json: String) -> NapiResult<String> {
    let input: amortisation_core::analysis::LoanAnalysisInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = amortisation_core::analysis::analyse_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Prepayments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PrepaymentRequest {
    loan: LoanTerms,
    event: PrepaymentEvent,
}

/// Applies one prepayment to the baseline schedule of `loan` and returns
/// the adjusted schedule together with the event outcome.
#[napi]
pub fn apply_prepayment(input_json: String) -> NapiResult<String> {
    let input: PrepaymentRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let baseline =
        amortisation_core::schedule::generate_schedule(&input.loan).map_err(to_napi_error)?;
    let output = amortisation_core::prepayment::apply_prepayment(&baseline, &input.loan, &input.event)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct PenaltyRequest {
    amount: Decimal,
    current_month: u32,
    #[serde(flatten)]
    terms: PenaltyTerms,
}

#[napi]
pub fn early_repayment_penalty(input_json: String) -> NapiResult<String> {
    let input: PenaltyRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let penalty = input.terms.assess(input.amount, input.current_month);
    serde_json::to_string(&serde_json::json!({ "penalty": penalty })).map_err(to_napi_error)
}
