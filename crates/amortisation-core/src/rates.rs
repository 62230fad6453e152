//! Rate conversion and the per-period payment formulas shared by the
//! schedule generator and the re-amortisation paths.
//!
//! Everything stays in `rust_decimal::Decimal`: the 12th root used for the
//! TAE conversion is solved with Newton's method and integer powers use
//! repeated multiplication, so no intermediate value passes through `f64`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::AmortisationError;
use crate::types::{pct_to_fraction, Money, Percent, Rate};
use crate::AmortisationResult;

const MONTHS_PER_YEAR: u32 = 12;
const ROOT_ITERATIONS: u32 = 60;
const ROOT_TOLERANCE: Decimal = dec!(0.0000000000000000001);

/// Convert an annual effective rate (TAE, in percent) to the equivalent
/// monthly periodic rate: `(1 + tae/100)^(1/12) - 1`.
///
/// A zero TAE yields exactly zero; callers must branch to linear division
/// rather than the annuity formula in that case.
pub fn monthly_rate(annual_effective: Percent) -> AmortisationResult<Rate> {
    if annual_effective.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let growth = Decimal::ONE + pct_to_fraction(annual_effective);
    Ok(nth_root(growth, MONTHS_PER_YEAR)? - Decimal::ONE)
}

/// Constant installment of a French (annuity) loan.
///
/// `C = P * r * f / (f - 1)` with `f = (1+r)^n`, or `P / n` when `r == 0`.
pub fn french_installment(principal: Money, rate: Rate, months: u32) -> AmortisationResult<Money> {
    if months == 0 {
        return Err(AmortisationError::InvalidInput {
            field: "months".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(months));
    }

    let factor = (Decimal::ONE + rate)
        .checked_powu(months as u64)
        .ok_or_else(|| out_of_range("annuity factor"))?;
    let denominator = factor - Decimal::ONE;

    if denominator.is_zero() {
        return Err(AmortisationError::DivisionByZero {
            context: "French installment annuity factor".into(),
        });
    }

    principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor / denominator))
        .ok_or_else(|| out_of_range("French installment"))
}

/// Fixed principal repayment of a German (constant amortisation) loan.
pub fn german_amortisation(principal: Money, months: u32) -> AmortisationResult<Money> {
    if months == 0 {
        return Err(AmortisationError::InvalidInput {
            field: "months".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }
    Ok(principal / Decimal::from(months))
}

/// One month of interest on `balance`.
pub(crate) fn accrue_interest(balance: Money, rate: Rate) -> AmortisationResult<Money> {
    balance
        .checked_mul(rate)
        .ok_or_else(|| out_of_range("monthly interest"))
}

fn out_of_range(what: &str) -> AmortisationError {
    AmortisationError::FinancialImpossibility(format!(
        "{what} exceeds the representable decimal range; check the rate and term"
    ))
}

/// Compute base^n for a positive integer exponent via iterative
/// multiplication. `None` on overflow.
fn iterative_pow(base: Decimal, n: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result.checked_mul(base)?;
    }
    Some(result)
}

/// Compute the nth root of x using Newton's method, starting from the
/// first-order Taylor guess `1 + (x - 1) / n`.
fn nth_root(x: Decimal, n: u32) -> AmortisationResult<Decimal> {
    if x == Decimal::ONE || x.is_zero() || n == 1 {
        return Ok(x);
    }
    if n == 0 {
        return Ok(Decimal::ONE);
    }

    let n_dec = Decimal::from(n);
    let mut guess = Decimal::ONE + (x - Decimal::ONE) / n_dec;
    let mut delta = Decimal::ZERO;

    for _ in 0..ROOT_ITERATIONS {
        let g_n_minus_1 = iterative_pow(guess, n - 1).ok_or_else(|| out_of_range("root"))?;
        if g_n_minus_1.is_zero() {
            break;
        }
        let g_n = g_n_minus_1
            .checked_mul(guess)
            .ok_or_else(|| out_of_range("root"))?;
        let slope = g_n_minus_1
            .checked_mul(n_dec)
            .ok_or_else(|| out_of_range("root"))?;

        delta = (g_n - x) / slope;
        guess -= delta;

        if delta.abs() < ROOT_TOLERANCE {
            return Ok(guess);
        }
    }

    Err(AmortisationError::ConvergenceFailure {
        function: "Monthly rate root".into(),
        iterations: ROOT_ITERATIONS,
        last_delta: delta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn test_zero_tae_is_zero_monthly() {
        assert_eq!(monthly_rate(Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_three_percent_tae() {
        // 1.03^(1/12) - 1 = 0.0024662698...
        let r = monthly_rate(dec!(3)).unwrap();
        assert_close(r, dec!(0.0024662698), dec!(0.0000000001), "3% TAE");
    }

    #[test]
    fn test_monthly_rate_compounds_back_to_tae() {
        let r = monthly_rate(dec!(4.5)).unwrap();
        let annual = iterative_pow(Decimal::ONE + r, 12).unwrap() - Decimal::ONE;
        assert_close(annual, dec!(0.045), dec!(0.0000000001), "compounded");
    }

    #[test]
    fn test_twenty_percent_tae() {
        let r = monthly_rate(dec!(20)).unwrap();
        assert_close(r, dec!(0.0153094705), dec!(0.0000000001), "20% TAE");
    }

    #[test]
    fn test_french_installment_known_answer() {
        // 100,000 over 120 months at 3% TAE -> ~963.74
        let r = monthly_rate(dec!(3)).unwrap();
        let c = french_installment(dec!(100000), r, 120).unwrap();
        assert_close(c, dec!(963.74), dec!(0.01), "installment");
    }

    #[test]
    fn test_french_installment_zero_rate_is_linear() {
        let c = french_installment(dec!(12000), Decimal::ZERO, 24).unwrap();
        assert_eq!(c, dec!(500));
    }

    #[test]
    fn test_french_installment_zero_months_rejected() {
        assert!(french_installment(dec!(1000), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_german_amortisation() {
        assert_eq!(german_amortisation(dec!(1200), 12).unwrap(), dec!(100));
        assert!(german_amortisation(dec!(1200), 0).is_err());
    }

    #[test]
    fn test_nth_root_inverts_power() {
        let root = nth_root(dec!(1.2), 12).unwrap();
        assert_close(iterative_pow(root, 12).unwrap(), dec!(1.2), dec!(0.0000000001), "root^12");
    }

    #[test]
    fn test_very_high_tae_still_converges() {
        // 1000% TAE: the Taylor start overshoots and Newton walks back down
        let r = monthly_rate(dec!(1000)).unwrap();
        let annual = iterative_pow(Decimal::ONE + r, 12).unwrap();
        assert_close(annual, dec!(11), dec!(0.0000000001), "1000% TAE");
    }

    #[test]
    fn test_absurd_tae_is_an_error_not_a_panic() {
        let err = monthly_rate(dec!(1000000)).unwrap_err();
        assert!(matches!(
            err,
            AmortisationError::FinancialImpossibility(_)
                | AmortisationError::ConvergenceFailure { .. }
        ));
    }

    #[test]
    fn test_annuity_factor_overflow_is_an_error() {
        // 1.0153^6000 is far beyond the decimal range
        let r = monthly_rate(dec!(20)).unwrap();
        let err = french_installment(dec!(10000000), r, 6000).unwrap_err();
        assert!(matches!(err, AmortisationError::FinancialImpossibility(_)));
    }

    #[test]
    fn test_long_high_rate_installment_stays_in_range() {
        // 1.0153^4000 ~ 2.5e26 fits; the installment tends to P * r
        let r = monthly_rate(dec!(20)).unwrap();
        let c = french_installment(dec!(10000000), r, 4000).unwrap();
        assert_close(c, dec!(10000000) * r, dec!(0.01), "perpetuity limit");
    }
}
