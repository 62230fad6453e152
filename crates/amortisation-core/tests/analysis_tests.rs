use amortisation_core::analysis::{analyse_loan, build_schedule, LoanAnalysisInput, PrepaymentPlan};
use amortisation_core::prepayment::recurring::RecurringPrepayment;
use amortisation_core::prepayment::{PrepaymentEvent, PrepaymentTerms, ReamortisationMode};
use amortisation_core::schedule::{AmortisationSystem, LoanTerms};
use amortisation_core::AmortisationError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tol,
        "{}: expected ~{}, got {} (diff = {})",
        msg,
        expected,
        actual,
        diff
    );
}

fn loan(system: AmortisationSystem) -> LoanTerms {
    LoanTerms::new(dec!(200000), dec!(2.5), 300, system)
}

// ===========================================================================
// Workflow
// ===========================================================================

#[test]
fn test_installment_mode_reduces_final_installment() {
    let event = PrepaymentEvent::new(dec!(30000), 5, 1);
    let out = analyse_loan(&LoanAnalysisInput {
        loan: loan(AmortisationSystem::French),
        plan: PrepaymentPlan::OneOff(event),
    })
    .unwrap();

    let r = &out.result;
    let savings = r.savings.as_ref().unwrap();
    assert_eq!(savings.months_saved, 0);
    assert!(savings.installment_reduction > Decimal::ZERO);
    assert!(savings.installment_reduction_pct > Decimal::ZERO);
    assert!(savings.interest_saved > Decimal::ZERO);
    assert_eq!(r.summary.initial_installment, r.baseline_summary.initial_installment);
    assert!(r.summary.final_installment < r.summary.initial_installment);
    assert_eq!(r.events.len(), 1);
}

#[test]
fn test_recurring_term_mode_saves_years() {
    let mut terms = PrepaymentTerms::new(dec!(5000));
    terms.mode = ReamortisationMode::Term;
    let out = analyse_loan(&LoanAnalysisInput {
        loan: loan(AmortisationSystem::German),
        plan: PrepaymentPlan::Recurring(RecurringPrepayment::new(terms, 12, 12)),
    })
    .unwrap();

    let savings = out.result.savings.unwrap();
    assert!(savings.months_saved > 12);
    assert!(savings.years_saved > Decimal::ONE);
    assert!(out.result.schedule.is_settled());
    assert!(out.result.summary.total_prepayment > Decimal::ZERO);
    assert_eq!(
        out.methodology,
        "German Amortisation with Recurring Prepayments"
    );
}

#[test]
fn test_skipped_one_off_is_reported() {
    let event = PrepaymentEvent::new(dec!(1000), 30, 1);
    let out = analyse_loan(&LoanAnalysisInput {
        loan: loan(AmortisationSystem::French),
        plan: PrepaymentPlan::OneOff(event),
    })
    .unwrap();
    assert!(!out.result.events[0].is_applied());
    assert!(out.warnings.iter().any(|w| w.contains("skipped")));
    assert_eq!(out.result.summary, out.result.baseline_summary);
}

#[test]
fn test_invalid_loan_fails_fast() {
    let mut terms = loan(AmortisationSystem::French);
    terms.term_months = 0;
    let err = build_schedule(&terms).unwrap_err();
    assert!(matches!(err, AmortisationError::InvalidInput { .. }));
}

#[test]
fn test_long_high_rate_loan_returns_instead_of_panicking() {
    let input = LoanAnalysisInput {
        loan: LoanTerms::new(dec!(10000000), dec!(20), 4000, AmortisationSystem::French),
        plan: PrepaymentPlan::None,
    };
    match analyse_loan(&input) {
        Ok(out) => {
            assert!(out.result.schedule.is_settled());
            assert!(out.warnings.iter().any(|w| w.contains("Term of 4000 months")));
        }
        Err(err) => assert!(
            matches!(err, AmortisationError::FinancialImpossibility(_)),
            "unexpected error: {err:?}"
        ),
    }
}

// ===========================================================================
// Wire format
// ===========================================================================

#[test]
fn test_one_off_plan_from_json() {
    let json = r#"{
        "loan": {"principal": 100000, "annual_rate": 3.0, "term_months": 120, "system": "french"},
        "plan": {"kind": "one_off", "amount": 10000, "year": 1, "month": 5, "fee_rate": 0.75}
    }"#;
    let input: LoanAnalysisInput = serde_json::from_str(json).unwrap();
    let out = analyse_loan(&input).unwrap();

    let applied = out.result.events[0].applied().unwrap();
    assert_eq!(applied.fee, dec!(75));
    assert_eq!(applied.net, dec!(9925));
    assert_eq!(out.result.summary.total_fees, dec!(75));
}

#[test]
fn test_recurring_plan_defaults_from_json() {
    let json = r#"{
        "loan": {"principal": "150000", "annual_rate": "4", "term_months": 240},
        "plan": {"kind": "recurring", "amount": "3000", "periodicity_months": 6, "start_month": 6}
    }"#;
    let input: LoanAnalysisInput = serde_json::from_str(json).unwrap();
    match &input.plan {
        PrepaymentPlan::Recurring(plan) => {
            assert_eq!(plan.terms.fee_rate, dec!(0.25));
            assert_eq!(plan.terms.mode, ReamortisationMode::Installment);
            assert_eq!(plan.terms.penalty.window_years, 10);
            assert_eq!(plan.terms.max_term_rows, 1000);
        }
        other => panic!("Expected recurring plan, got {:?}", other),
    }
    assert!(analyse_loan(&input).is_ok());
}

#[test]
fn test_missing_plan_defaults_to_none() {
    let json = r#"{"loan": {"principal": "50000", "annual_rate": "0", "term_months": 60}}"#;
    let input: LoanAnalysisInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.plan, PrepaymentPlan::None);
    let out = analyse_loan(&input).unwrap();
    assert_eq!(out.result.summary.total_interest, Decimal::ZERO);
    // 50,000 / 60 does not terminate in decimal
    assert_close(out.result.summary.total_paid, dec!(50000), dec!(0.01), "total paid");
}

#[test]
fn test_output_serialises_schedule_rows() {
    let out = build_schedule(&loan(AmortisationSystem::French)).unwrap();
    let value = serde_json::to_value(&out).unwrap();
    let rows = value["result"]["schedule"].as_array().unwrap();
    assert_eq!(rows.len(), 301);
    assert!(rows[1].get("installment").is_some());
    assert!(rows[1].get("penalty").is_some());
}
