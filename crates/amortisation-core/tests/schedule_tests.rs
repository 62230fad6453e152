use amortisation_core::rates;
use amortisation_core::schedule::{generate_schedule, AmortisationSystem, LoanTerms};
use amortisation_core::summary::summarise;
use amortisation_core::AmortisationError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const TOL: Decimal = dec!(0.01);

fn terms(principal: Decimal, rate: Decimal, months: u32, system: AmortisationSystem) -> LoanTerms {
    LoanTerms::new(principal, rate, months, system)
}

// ===========================================================================
// Principal is fully amortised
// ===========================================================================

#[test]
fn test_french_amortisation_sums_to_principal() {
    for (principal, rate, months) in [
        (dec!(100000), dec!(3), 120),
        (dec!(250000), dec!(4.25), 360),
        (dec!(10000000), dec!(20), 491),
        (dec!(1000), dec!(0.1), 1),
    ] {
        let schedule =
            generate_schedule(&terms(principal, rate, months, AmortisationSystem::French)).unwrap();
        let repaid: Decimal = schedule.installments().iter().map(|r| r.amortisation).sum();
        assert!(
            (repaid - principal).abs() <= TOL,
            "French {principal} @ {rate}% over {months}: repaid {repaid}"
        );
        assert_eq!(schedule.terminal_balance(), Decimal::ZERO);
    }
}

#[test]
fn test_german_amortisation_sums_to_principal() {
    for (principal, rate, months) in [
        (dec!(100000), dec!(3), 120),
        (dec!(333333), dec!(7.5), 241),
        (dec!(5000), dec!(19.9), 7),
    ] {
        let schedule =
            generate_schedule(&terms(principal, rate, months, AmortisationSystem::German)).unwrap();
        let repaid: Decimal = schedule.installments().iter().map(|r| r.amortisation).sum();
        assert!(
            (repaid - principal).abs() <= TOL,
            "German {principal} @ {rate}% over {months}: repaid {repaid}"
        );
        assert_eq!(schedule.terminal_balance(), Decimal::ZERO);
    }
}

// ===========================================================================
// Shape of each system
// ===========================================================================

#[test]
fn test_french_installment_is_constant() {
    let schedule =
        generate_schedule(&terms(dec!(180000), dec!(2.5), 300, AmortisationSystem::French))
            .unwrap();
    let first = schedule.installments()[0].installment;
    assert!(schedule.installments().iter().all(|r| r.installment == first));

    // Interest share shrinks, principal share grows
    let rows = schedule.installments();
    for pair in rows.windows(2) {
        assert!(pair[1].interest < pair[0].interest);
        assert!(pair[1].amortisation > pair[0].amortisation);
    }
}

#[test]
fn test_german_amortisation_constant_and_installment_non_increasing() {
    let schedule =
        generate_schedule(&terms(dec!(180000), dec!(2.5), 300, AmortisationSystem::German))
            .unwrap();
    let expected = dec!(180000) / Decimal::from(300);
    let rows = schedule.installments();
    assert!(rows.iter().all(|r| r.amortisation == expected));
    for pair in rows.windows(2) {
        assert!(pair[1].installment <= pair[0].installment);
    }
}

#[test]
fn test_balance_non_increasing() {
    for system in [AmortisationSystem::French, AmortisationSystem::German] {
        let schedule = generate_schedule(&terms(dec!(75000), dec!(6), 180, system)).unwrap();
        for pair in schedule.rows().windows(2) {
            assert!(pair[1].balance <= pair[0].balance);
            assert!(pair[1].balance >= Decimal::ZERO);
        }
    }
}

#[test]
fn test_year_and_month_labels() {
    let schedule =
        generate_schedule(&terms(dec!(50000), dec!(3), 30, AmortisationSystem::French)).unwrap();
    let labels: Vec<(u32, u32)> = schedule.rows().iter().map(|r| (r.year, r.month)).collect();
    assert_eq!(labels[0], (0, 0));
    assert_eq!(labels[1], (1, 1));
    assert_eq!(labels[12], (1, 12));
    assert_eq!(labels[13], (2, 1));
    assert_eq!(labels[30], (3, 6));
}

// ===========================================================================
// Zero-rate degeneracy
// ===========================================================================

#[test]
fn test_zero_rate_converter() {
    assert_eq!(rates::monthly_rate(Decimal::ZERO).unwrap(), Decimal::ZERO);
}

#[test]
fn test_zero_rate_schedule_is_linear() {
    for system in [AmortisationSystem::French, AmortisationSystem::German] {
        let schedule = generate_schedule(&terms(dec!(60000), Decimal::ZERO, 48, system)).unwrap();
        for row in schedule.installments() {
            assert_eq!(row.interest, Decimal::ZERO);
            assert_eq!(row.amortisation, dec!(1250));
        }
        let summary = summarise(&schedule);
        assert_eq!(summary.total_interest, Decimal::ZERO);
        assert_eq!(summary.total_paid, dec!(60000));
    }
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_negative_principal_rejected() {
    let result = generate_schedule(&terms(dec!(-1), dec!(3), 12, AmortisationSystem::French));
    assert!(matches!(
        result,
        Err(AmortisationError::InvalidInput { ref field, .. }) if field == "principal"
    ));
}

#[test]
fn test_zero_term_rejected() {
    assert!(generate_schedule(&terms(dec!(1000), dec!(3), 0, AmortisationSystem::German)).is_err());
}

#[test]
fn test_unrepresentable_rate_is_reported() {
    let result = generate_schedule(&terms(dec!(100000), dec!(1000000), 12, AmortisationSystem::French));
    assert!(matches!(
        result,
        Err(AmortisationError::FinancialImpossibility(_))
    ));
}

#[test]
fn test_unrepresentable_annuity_factor_is_reported() {
    let result = generate_schedule(&terms(dec!(10000000), dec!(20), 6000, AmortisationSystem::French));
    assert!(matches!(
        result,
        Err(AmortisationError::FinancialImpossibility(_))
    ));
}

#[test]
fn test_terms_deserialise_with_default_system() {
    let json = r#"{"principal": "150000", "annual_rate": "3.5", "term_months": 240}"#;
    let parsed: LoanTerms = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.system, AmortisationSystem::French);
    assert_eq!(parsed.principal, dec!(150000));
}
