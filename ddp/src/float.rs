//! Floats travel as a pair of integers: the decimal digits of the normalized mantissa and the binary exponent.
//!
//! A finite `x > 0` is split into `m * 2^e` with `m` in `[0.5, 1)`. The shortest decimal rendering of `m` which
//! round-trips, minus its leading `0.`, is the first integer; `e` is the second. Since shortest rendering is exact on
//! the way back and scaling by powers of two is exact for normal results, every finite float survives the trip
//! unchanged.

use crate::error::{DecodeError, EncodeError};
use num_bigint::BigUint;

const MANTISSA_BITS: u32 = 52;
const EXPONENT_MASK: u64 = 0x7ff;
/// Biased exponent of a float in `[0.5, 1)`
const HALF_EXPONENT: u64 = 1022;
/// Scaling any non-zero float by more than this in either direction saturates to infinity or zero
const MAX_SCALE: i64 = 2200;

/// Splits `x` into a mantissa in `[0.5, 1)` and an exponent, so that `x == m * 2^e`. Zero, infinities and NaN are
/// returned unchanged with an exponent of zero.
pub fn frexp(x: f64) -> (f64, i32) {
    let bits = x.to_bits();
    let exponent = (bits >> MANTISSA_BITS) & EXPONENT_MASK;
    match exponent {
        0 if x == 0.0 => (x, 0),
        0 => {
            // subnormal: scale into the normal range first
            let (m, e) = frexp(x * pow2(54));
            (m, e - 54)
        },
        EXPONENT_MASK => (x, 0),
        _ => {
            let m = f64::from_bits(bits & !(EXPONENT_MASK << MANTISSA_BITS) | HALF_EXPONENT << MANTISSA_BITS);
            (m, exponent as i32 - HALF_EXPONENT as i32)
        },
    }
}

/// Computes `m * 2^e` without overflowing intermediate powers of two.
pub fn ldexp(m: f64, e: i64) -> f64 {
    if m == 0.0 || !m.is_finite() {
        return m;
    }
    let mut x = m;
    let mut e = e.clamp(-MAX_SCALE, MAX_SCALE);
    while e > 1000 && x.is_finite() {
        x *= pow2(1000);
        e -= 1000;
    }
    while e < -1000 && x != 0.0 {
        x *= pow2(-1000);
        e += 1000;
    }
    if e > 1000 || e < -1000 {
        x
    } else {
        x * pow2(e as i32)
    }
}

/// `2^e` for `e` in the normal range.
#[inline]
fn pow2(e: i32) -> f64 {
    f64::from_bits(((1023 + e) as u64) << MANTISSA_BITS)
}

/// Returns mantissa digits and exponent of a finite, positive `x`.
pub fn pack(x: f64) -> Result<(u64, i32), EncodeError> {
    if !x.is_finite() || x <= 0.0 {
        return Err(EncodeError::Float(x));
    }
    let (m, e) = frexp(x);
    let rendered = m.to_string();
    let digits = rendered.strip_prefix("0.")
        .and_then(|d| d.parse::<u64>().ok())
        .ok_or(EncodeError::Float(x))?;
    Ok((digits, e))
}

/// Reassembles a float from mantissa digits and exponent.
pub fn unpack(digits: &BigUint, e: i64) -> Result<f64, DecodeError> {
    let m: f64 = format!("0.{}", digits).parse().map_err(|_| DecodeError::Float)?;
    let x = ldexp(m, e);
    if x.is_finite() {
        Ok(x)
    } else {
        Err(DecodeError::Float)
    }
}
