//! Decimal rounding and proportional-split helpers shared by the Lifecycle
//! Builder and Reconciliation stages.

use rust_decimal::{Decimal, RoundingStrategy};

/// Banker's rounding to 2 decimal places.
pub(crate) fn round_half_even_2dp(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Splits `total` across `weights` proportionally (by weight), with the
/// final non-zero-weight share absorbing the rounding residue so the sum
/// equals `total` exactly. `weights` need not be normalized.
pub(crate) fn proportional_split(total: Decimal, weights: &[i64]) -> Vec<Decimal> {
    let sum: i64 = weights.iter().sum();
    if sum == 0 {
        return vec![Decimal::ZERO; weights.len()];
    }

    let mut shares: Vec<Decimal> = weights
        .iter()
        .map(|&w| round_half_even_2dp(total * Decimal::from(w) / Decimal::from(sum)))
        .collect();

    let allocated: Decimal = shares.iter().sum();
    let residue = total - allocated;
    if residue != Decimal::ZERO {
        if let Some(last_idx) = weights.iter().rposition(|&w| w != 0) {
            shares[last_idx] += residue;
        }
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn proportional_split_sums_to_total() {
        // S3: invoice $6,000 over overlap days 17/29/14 (total 60).
        let shares = proportional_split(dec!(6000), &[17, 29, 14]);
        assert_eq!(shares.iter().sum::<Decimal>(), dec!(6000));
        assert_eq!(shares[0], dec!(1700.00));
        assert_eq!(shares[1], dec!(2900.00));
        assert_eq!(shares[2], dec!(1400.00));
    }

    #[test]
    fn round_half_even_ties_to_even() {
        assert_eq!(round_half_even_2dp(dec!(1.005)), dec!(1.00));
        assert_eq!(round_half_even_2dp(dec!(1.015)), dec!(1.02));
    }
}
