//! Network-free interest calculator used when the server is unavailable.

use crate::{InterestCalculation, InterestFrequency};

const DAYS_PER_MONTH: u32 = 30;

/// Rounds to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes simple interest for `principal` at `rate` percent per year over `days`.
///
/// Duration is counted in whole 30-day months, rounded up. `frequency` only
/// selects the per-payment figure and is echoed back unchanged; unrecognized
/// names fall back to monthly.
pub fn calculate_locally(principal: f64, rate: f64, frequency: &str, days: u32) -> InterestCalculation {
    let yearly = principal * (rate / 100.0);
    let monthly = yearly / 12.0;
    let daily = yearly / 365.0;
    let weekly = yearly / 52.0;

    let per_payment = match InterestFrequency::parse_lossy(frequency) {
        InterestFrequency::Daily => daily,
        InterestFrequency::Weekly => weekly,
        InterestFrequency::Biweekly => yearly / 26.0,
        InterestFrequency::Monthly => monthly,
        InterestFrequency::Quarterly => monthly * 3.0,
        InterestFrequency::Yearly => yearly,
    };

    let duration_months = days.div_ceil(DAYS_PER_MONTH);
    let total_interest = round2(monthly * f64::from(duration_months));

    InterestCalculation {
        principal,
        interest_rate: rate,
        frequency: frequency.to_owned(),
        duration_months,
        daily_interest: round2(daily),
        weekly_interest: round2(weekly),
        monthly_interest: round2(monthly),
        yearly_interest: round2(yearly),
        per_payment_interest: round2(per_payment),
        total_interest,
        // total_amount must equal principal + total_interest as reported
        total_amount: round2(principal + total_interest),
    }
}

#[cfg(test)]
mod tests {
    use super::{calculate_locally, round2};

    #[test]
    fn monthly_worked_example() {
        let result = calculate_locally(100_000.0, 12.0, "MONTHLY", 360);

        assert_eq!(result.yearly_interest, 12_000.0);
        assert_eq!(result.monthly_interest, 1_000.0);
        assert_eq!(result.per_payment_interest, 1_000.0);
        assert_eq!(result.duration_months, 12);
        assert_eq!(result.total_interest, 12_000.0);
        assert_eq!(result.total_amount, 112_000.0);
        assert_eq!(result.frequency, "MONTHLY");
    }

    #[test]
    fn per_payment_follows_frequency() {
        let per = |frequency| calculate_locally(36_500.0, 10.0, frequency, 30).per_payment_interest;

        assert_eq!(per("DAILY"), 10.0);
        assert_eq!(per("WEEKLY"), round2(3_650.0 / 52.0));
        assert_eq!(per("BIWEEKLY"), round2(3_650.0 / 26.0));
        assert_eq!(per("QUARTERLY"), round2(3_650.0 / 12.0 * 3.0));
        assert_eq!(per("YEARLY"), 3_650.0);
        assert_eq!(per("SOMETIMES"), per("MONTHLY"));
    }

    #[test]
    fn partial_months_round_up() {
        assert_eq!(calculate_locally(1_000.0, 12.0, "MONTHLY", 31).duration_months, 2);
        assert_eq!(calculate_locally(1_000.0, 12.0, "MONTHLY", 30).duration_months, 1);
        assert_eq!(calculate_locally(1_000.0, 12.0, "MONTHLY", 1).duration_months, 1);
    }

    #[test]
    fn total_amount_is_principal_plus_total_interest() {
        for principal in [1.0, 999.99, 12_345.67, 250_000.0] {
            for rate in [0.5, 7.25, 12.0, 36.0] {
                for days in [1, 29, 45, 365, 1_000] {
                    let result = calculate_locally(principal, rate, "WEEKLY", days);
                    let expected = round2(principal + result.total_interest);
                    assert_eq!(result.total_amount, expected);
                    assert!((result.total_amount - principal - result.total_interest).abs() < 0.005);
                }
            }
        }
    }

    #[test]
    fn round2_is_half_away_from_zero() {
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(0.004), 0.0);
    }
}
