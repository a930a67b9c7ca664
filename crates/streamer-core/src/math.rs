//! Integer fixed-point helpers.
//!
//! Products are formed in 256-bit intermediates and every division floors, so
//! a conversion never rounds in favour of the payer. Each helper returns
//! `None` when an intermediate or the result does not fit; callers map that
//! to their own overflow error.

use alloy_primitives::U256;

/// Compute `floor(a * b / denominator)`.
///
/// Returns `None` on a zero denominator or if the result exceeds `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Option<u128> {
    mul_div_many(&[a, b], &[denominator])
}

/// Compute `floor(Π numerators / Π denominators)` with a single division.
///
/// Dividing once keeps the result exact up to the final floor, instead of
/// compounding one truncation per factor.
pub fn mul_div_many(numerators: &[u128], denominators: &[u128]) -> Option<u128> {
    mul_div_pow10(numerators, denominators, 0)
}

/// Compute `floor(Π numerators · 10^exponent / Π denominators)`.
///
/// Decimal scales are passed as one net exponent rather than as separate
/// `10^d` factors on both sides, so they cancel before anything is
/// multiplied. A negative exponent divides. With one numerator and one
/// denominator factor of at most 128 bits, the intermediate overflows only
/// when the quotient itself does not fit a `u128`.
pub fn mul_div_pow10(numerators: &[u128], denominators: &[u128], exponent: i32) -> Option<u128> {
    let mut numerator = product(numerators)?;
    let mut denominator = product(denominators)?;
    let scale = U256::from(10u8).checked_pow(U256::from(exponent.unsigned_abs()))?;
    if exponent >= 0 {
        numerator = numerator.checked_mul(scale)?;
    } else {
        denominator = denominator.checked_mul(scale)?;
    }
    if denominator.is_zero() {
        return None;
    }
    u128::try_from(numerator / denominator).ok()
}

/// Net power of ten `Σ up − Σ down` over a set of decimal precisions.
pub fn net_exponent(up: &[u8], down: &[u8]) -> i32 {
    let sum = |ds: &[u8]| ds.iter().map(|&d| i32::from(d)).sum::<i32>();
    sum(up) - sum(down)
}

fn product(factors: &[u128]) -> Option<U256> {
    factors
        .iter()
        .try_fold(U256::from(1u8), |acc, &f| acc.checked_mul(U256::from(f)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mul_div_floors() {
        assert_eq!(mul_div(10, 10, 3), Some(33));
        assert_eq!(mul_div(7, 1, 2), Some(3));
        assert_eq!(mul_div(0, 5, 2), Some(0));
    }

    #[test]
    fn mul_div_zero_denominator() {
        assert_eq!(mul_div(1, 1, 0), None);
    }

    #[test]
    fn mul_div_wide_intermediate() {
        // 2e24 * 1e36 overflows u128 but the quotient fits.
        let a = 2_000_000 * 10u128.pow(18);
        let b = 10u128.pow(36);
        assert_eq!(mul_div(a, b, 10u128.pow(36)), Some(a));
    }

    #[test]
    fn mul_div_result_overflow() {
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
    }

    #[test]
    fn mul_div_many_single_truncation() {
        // (10 / 3) * 3 done in two steps would give 9.
        assert_eq!(mul_div_many(&[10, 3], &[3]), Some(10));
        assert_eq!(mul_div_many(&[], &[]), Some(1));
    }

    #[test]
    fn mul_div_many_intermediate_overflow() {
        let big = 10u128.pow(36);
        assert_eq!(mul_div_many(&[big, big, big], &[1]), None);
    }

    #[test]
    fn pow10_cancels_before_multiplying() {
        // With separate 10^d factors on each side this needs a 10^90
        // intermediate, past U256.
        let e30 = 10u128.pow(30);
        assert_eq!(mul_div_pow10(&[e30], &[e30], 30), Some(e30));
        assert_eq!(mul_div_pow10(&[e30, e30], &[], -30), Some(e30));
    }

    #[test]
    fn pow10_negative_exponent_floors() {
        assert_eq!(mul_div_pow10(&[1_999], &[], -3), Some(1));
        assert_eq!(mul_div_pow10(&[1], &[3], 4), Some(3_333));
    }

    #[test]
    fn pow10_result_overflow() {
        assert_eq!(mul_div_pow10(&[u128::MAX], &[1], 1), None);
        assert_eq!(mul_div_pow10(&[1], &[1], 80), None);
        assert_eq!(mul_div_pow10(&[1], &[0], 0), None);
    }

    #[test]
    fn net_exponent_sums_each_side() {
        assert_eq!(net_exponent(&[8, 18], &[6]), 20);
        assert_eq!(net_exponent(&[6], &[8, 18]), -20);
        assert_eq!(net_exponent(&[36, 36], &[]), 72);
    }

    proptest! {
        #[test]
        fn mul_div_never_exceeds_exact(
            a in 0u128..u64::MAX as u128,
            b in 0u128..u64::MAX as u128,
            d in 1u128..u64::MAX as u128,
        ) {
            let q = mul_div(a, b, d).unwrap();
            // q * d <= a * b < (q + 1) * d
            let exact = U256::from(a) * U256::from(b);
            prop_assert!(U256::from(q) * U256::from(d) <= exact);
            prop_assert!(U256::from(q + 1) * U256::from(d) > exact);
        }

        #[test]
        fn pow10_matches_exact_quotient(
            a in 0u128..u64::MAX as u128,
            d in 1u128..u64::MAX as u128,
            k in 0u32..20,
        ) {
            let q = mul_div_pow10(&[a], &[d], k as i32).unwrap();
            let exact = U256::from(a) * U256::from(10u8).pow(U256::from(k));
            prop_assert!(U256::from(q) * U256::from(d) <= exact);
            prop_assert!(U256::from(q + 1) * U256::from(d) > exact);
        }
    }
}
