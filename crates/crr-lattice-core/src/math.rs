use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::LatticeError;
use crate::LatticeResult;

const EXP_TAYLOR_TERMS: u32 = 30;
const SQRT_MAX_ITERATIONS: u32 = 100;

/// exp(x) on Decimal.
///
/// Range reduction exp(x) = exp(x/2)^2 while |x| > 2, then a Taylor series.
/// Squaring is checked, so arguments whose result leaves the Decimal range
/// surface as `NumericalOverflow` rather than panicking.
pub fn exp_decimal(x: Decimal) -> LatticeResult<Decimal> {
    let two = dec!(2);

    if x > two || x < -two {
        let half = exp_decimal(x / two)?;
        return half
            .checked_mul(half)
            .ok_or_else(|| LatticeError::overflow(&format!("exp({x})")));
    }

    let mut sum = Decimal::ONE;
    let mut term = Decimal::ONE;
    for n in 1..=EXP_TAYLOR_TERMS {
        term = term * x / Decimal::from(n);
        if term.is_zero() {
            break;
        }
        sum += term;
    }
    Ok(sum)
}

/// Newton's method square root: y_{n+1} = (y_n + x/y_n) / 2.
///
/// Non-positive inputs return zero.
pub fn sqrt_decimal(x: Decimal) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if x == Decimal::ONE {
        return Decimal::ONE;
    }
    let two = dec!(2);
    let mut guess = if x > dec!(100) {
        dec!(10)
    } else if x < dec!(0.01) {
        dec!(0.1)
    } else {
        x / two
    };
    for _ in 0..SQRT_MAX_ITERATIONS {
        let next = (guess + x / guess) / two;
        if next == guess {
            break;
        }
        guess = next;
    }
    guess
}
