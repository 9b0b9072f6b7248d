//! Exact decimal primitives
//!
//! Every resource amount and every cost is a [`Quantity`]: an unscaled big
//! integer plus a scale. Quotients are always taken at an explicit scale with
//! an explicit rounding mode, so results never depend on binary floating point.

use crate::error::{Result, ScalingError};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;

pub use bigdecimal::RoundingMode;

/// Exact decimal value used for quantities, ratios and costs
pub type Quantity = BigDecimal;

/// Number of fractional digits kept for every ratio in the engine
pub const RATIO_SCALE: i64 = 8;

/// Largest power of ten a rescale may multiply by
pub const MAX_DECIMAL_SHIFT: u32 = 1024;

/// Build `unscaled * 10^-scale`
///
/// `dec(250, 3)` is 0.250, `dec(1, -6)` is 1000000.
pub fn dec(unscaled: i64, scale: i64) -> Quantity {
    BigDecimal::new(BigInt::from(unscaled), scale)
}

fn pow10(exponent: i64) -> Result<BigInt> {
    let exponent = u32::try_from(exponent)
        .ok()
        .filter(|e| *e <= MAX_DECIMAL_SHIFT)
        .ok_or_else(|| {
            ScalingError::invalid_input(format!("decimal scale shift {} out of range", exponent))
        })?;
    Ok(BigInt::from(10u8).pow(exponent))
}

/// Divide `x` by `y`, producing exactly `scale` fractional digits rounded with `mode`
pub fn quo_round(x: &Quantity, y: &Quantity, scale: i64, mode: RoundingMode) -> Result<Quantity> {
    if y.is_zero() {
        return Err(ScalingError::invalid_input("division by zero"));
    }

    let (x_unscaled, x_scale) = x.as_bigint_and_exponent();
    let (y_unscaled, y_scale) = y.as_bigint_and_exponent();

    // x / y * 10^scale == x_unscaled * 10^(scale + y_scale - x_scale) / y_unscaled
    let shift = scale + y_scale - x_scale;
    let (numerator, denominator) = if shift >= 0 {
        (x_unscaled * pow10(shift)?, y_unscaled)
    } else {
        (x_unscaled, y_unscaled * pow10(-shift)?)
    };

    let quotient = &numerator / &denominator;
    let remainder = &numerator - &quotient * &denominator;
    let negative = numerator.is_negative() != denominator.is_negative();
    let rounded = round_quotient(quotient, &remainder, &denominator, negative, mode);

    Ok(BigDecimal::new(rounded, scale))
}

/// Apply `mode` to a truncated quotient given its remainder
fn round_quotient(
    quotient: BigInt,
    remainder: &BigInt,
    denominator: &BigInt,
    negative: bool,
    mode: RoundingMode,
) -> BigInt {
    if remainder.is_zero() {
        return quotient;
    }

    let half = (remainder.abs() * 2u8).cmp(&denominator.abs());
    let away_from_zero = match mode {
        RoundingMode::Down => false,
        RoundingMode::Up => true,
        RoundingMode::Ceiling => !negative,
        RoundingMode::Floor => negative,
        RoundingMode::HalfUp => half != Ordering::Less,
        RoundingMode::HalfDown => half == Ordering::Greater,
        RoundingMode::HalfEven => {
            half == Ordering::Greater
                || (half == Ordering::Equal && !(&quotient % 2u8).is_zero())
        }
    };

    match (away_from_zero, negative) {
        (false, _) => quotient,
        (true, false) => quotient + BigInt::one(),
        (true, true) => quotient - BigInt::one(),
    }
}

/// Round `value` to `scale` fractional digits
pub fn round(value: &Quantity, scale: i64, mode: RoundingMode) -> Quantity {
    if value.as_bigint_and_exponent().1 <= scale {
        return value.clone();
    }
    value.with_scale_round(scale, mode)
}

/// Limit `desired` to the range `[min, max]`
pub fn limit_value(desired: &Quantity, min: &Quantity, max: &Quantity) -> Quantity {
    if desired < min {
        return min.clone();
    }
    if desired > max {
        return max.clone();
    }
    desired.clone()
}

/// Drop the fractional digits of `value` and convert it to `i64`
pub fn truncate_to_i64(value: &Quantity) -> Result<i64> {
    let (unscaled, scale) = round(value, 0, RoundingMode::Down).into_bigint_and_exponent();
    let integer = if scale < 0 {
        unscaled * pow10(-scale)?
    } else {
        unscaled
    };
    integer
        .to_i64()
        .ok_or_else(|| ScalingError::invalid_input(format!("{} does not fit in an integer", value)))
}

/// Truncate `value` to an integer replica count
pub fn to_replicas(value: &Quantity) -> Result<i32> {
    let replicas = truncate_to_i64(value)?;
    i32::try_from(replicas)
        .map_err(|_| ScalingError::invalid_input(format!("replica count {} out of range", replicas)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quo_round_half_up() {
        let got = quo_round(&dec(2, 0), &dec(3, 0), 8, RoundingMode::HalfUp).unwrap();
        assert_eq!(got, dec(66666667, 8));
    }

    #[test]
    fn test_quo_round_modes_on_negative_values() {
        let x = dec(-5, 0);
        let two = dec(2, 0);
        assert_eq!(quo_round(&x, &two, 0, RoundingMode::Up).unwrap(), dec(-3, 0));
        assert_eq!(quo_round(&x, &two, 0, RoundingMode::Down).unwrap(), dec(-2, 0));
        assert_eq!(quo_round(&x, &two, 0, RoundingMode::Ceiling).unwrap(), dec(-2, 0));
        assert_eq!(quo_round(&x, &two, 0, RoundingMode::Floor).unwrap(), dec(-3, 0));
        assert_eq!(quo_round(&x, &two, 0, RoundingMode::HalfUp).unwrap(), dec(-3, 0));
        assert_eq!(quo_round(&x, &two, 0, RoundingMode::HalfEven).unwrap(), dec(-2, 0));
    }

    #[test]
    fn test_quo_round_mixed_scales() {
        // 0.5 / 0.25 with values carrying different scales
        let got = quo_round(&dec(50, 2), &dec(250, 3), 8, RoundingMode::HalfUp).unwrap();
        assert_eq!(got, dec(2, 0));

        // 1e6 / 3 at scale 2
        let got = quo_round(&dec(1, -6), &dec(3, 0), 2, RoundingMode::Down).unwrap();
        assert_eq!(got, dec(33333333, 2));
    }

    #[test]
    fn test_quo_round_by_zero() {
        let err = quo_round(&dec(1, 0), &dec(0, 0), 8, RoundingMode::HalfUp).unwrap_err();
        assert!(matches!(err, ScalingError::InvalidInput(_)));
    }

    #[test]
    fn test_round_ceiling() {
        assert_eq!(round(&dec(299999997, 8), 0, RoundingMode::Ceiling), dec(3, 0));
        assert_eq!(round(&dec(3, 0), 0, RoundingMode::Ceiling), dec(3, 0));
        assert_eq!(round(&dec(-15, 1), 0, RoundingMode::Ceiling), dec(-1, 0));
    }

    #[test]
    fn test_limit_value() {
        let min = dec(1, 0);
        let max = dec(10, 0);
        assert_eq!(limit_value(&dec(5, 0), &min, &max), dec(5, 0));
        assert_eq!(limit_value(&dec(0, 0), &min, &max), min);
        assert_eq!(limit_value(&dec(11, 0), &min, &max), max);
    }

    #[test]
    fn test_truncate_to_i64() {
        assert_eq!(truncate_to_i64(&dec(0, 0)).unwrap(), 0);
        assert_eq!(truncate_to_i64(&dec(12, -2)).unwrap(), 1200);
        assert_eq!(truncate_to_i64(&dec(1999, 3)).unwrap(), 1);
        assert_eq!(truncate_to_i64(&dec(-1999, 3)).unwrap(), -1);
        assert_eq!(truncate_to_i64(&dec(1, 3)).unwrap(), 0);
    }

    #[test]
    fn test_to_replicas_out_of_range() {
        assert!(to_replicas(&dec(1, -12)).is_err());
        assert_eq!(to_replicas(&dec(7, 0)).unwrap(), 7);
    }

    #[test]
    fn test_round_keeps_coarser_values() {
        let value = dec(2115, 4);
        assert_eq!(round(&value, 8, RoundingMode::HalfUp).as_bigint_and_exponent().1, 4);
        assert_eq!(round(&dec(211549, 6), 4, RoundingMode::HalfUp), dec(2115, 4));
    }

    #[test]
    fn test_quo_round_rejects_oversized_shift() {
        let huge = BigDecimal::new(BigInt::from(1), -4_294_967_290);
        let err = quo_round(&huge, &dec(1, 0), 8, RoundingMode::HalfUp).unwrap_err();
        assert!(matches!(err, ScalingError::InvalidInput(_)));

        let tiny = BigDecimal::new(BigInt::from(1), 5000);
        assert!(quo_round(&tiny, &dec(3, 0), 8, RoundingMode::HalfUp).is_err());
        assert!(truncate_to_i64(&BigDecimal::new(BigInt::from(1), -2000)).is_err());
    }
}
