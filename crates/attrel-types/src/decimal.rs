//! Arbitrary-precision decimal numbers.
//!
//! A [`Decimal`] is an unscaled `BigInt` mantissa plus a non-negative scale:
//! the value is `mantissa × 10^-scale`. Scale is part of the identity, so
//! `1.0` and `1.00` are different decimals that compare numerically equal.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::number::format_f64;

/// Largest scale any operation will produce.
///
/// Rendering a decimal writes `scale` fractional digits, so results past this
/// fail instead of allocating unbounded strings.
pub const MAX_SCALE: u32 = 1_000_000;

/// Largest exponent accepted by [`Decimal::pow`].
pub const MAX_POW: i64 = 999_999_999;

/// Mantissa bit budget for [`Decimal::pow`] results.
const MAX_POW_BITS: u64 = 8_000_000;

/// How to discard digits when a result needs fewer than it has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundingMode {
    /// Away from zero.
    Up,
    /// Toward zero (truncate).
    Down,
    /// Toward positive infinity.
    Ceiling,
    /// Toward negative infinity.
    Floor,
    /// Nearest neighbor, ties away from zero.
    HalfUp,
    /// Nearest neighbor, ties toward zero.
    HalfDown,
    /// Nearest neighbor, ties to the even neighbor.
    HalfEven,
    /// Exact results only; any discarded digit is an error.
    Unnecessary,
}

impl RoundingMode {
    /// Look up a mode by its name, ignoring case (`"half_up"`, `"UP"`).
    pub fn from_name(name: &str) -> Option<Self> {
        let mode = match name.trim().to_ascii_uppercase().as_str() {
            "UP" => Self::Up,
            "DOWN" => Self::Down,
            "CEILING" => Self::Ceiling,
            "FLOOR" => Self::Floor,
            "HALF_UP" => Self::HalfUp,
            "HALF_DOWN" => Self::HalfDown,
            "HALF_EVEN" => Self::HalfEven,
            "UNNECESSARY" => Self::Unnecessary,
            _ => return None,
        };
        Some(mode)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Ceiling => "CEILING",
            Self::Floor => "FLOOR",
            Self::HalfUp => "HALF_UP",
            Self::HalfDown => "HALF_DOWN",
            Self::HalfEven => "HALF_EVEN",
            Self::Unnecessary => "UNNECESSARY",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decimal arithmetic failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    #[error("not a decimal number: {0:?}")]
    Invalid(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("rounding necessary")]
    RoundingNecessary,
    #[error("not a finite number: {0}")]
    NotFinite(String),
    #[error("{0}")]
    OutOfRange(String),
}

/// An exact decimal number: `mantissa × 10^-scale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: BigInt,
    scale: u32,
}

impl Decimal {
    pub fn new(mantissa: impl Into<BigInt>, scale: u32) -> Self {
        Self {
            mantissa: mantissa.into(),
            scale,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn from_i64(value: i64) -> Self {
        Self::new(value, 0)
    }

    /// Convert a double through its shortest round-trip rendering.
    ///
    /// `2.0` becomes `2.0` (scale 1) and `0.1` becomes `0.1`, not the exact
    /// binary expansion. Digits a double cannot hold are lost here.
    pub fn from_f64(value: f64) -> Result<Self, DecimalError> {
        if !value.is_finite() {
            return Err(DecimalError::NotFinite(format_f64(value)));
        }
        Self::parse(&format_f64(value))
    }

    /// Parse decimal text: optional sign, digits with an optional fraction,
    /// optional `e`/`E` exponent.
    ///
    /// Every digit is kept; the scale is the number of fraction digits minus
    /// the exponent, clamped at zero.
    pub fn parse(text: &str) -> Result<Self, DecimalError> {
        let invalid = || DecimalError::Invalid(text.to_string());

        let (significand, exponent) = match text.find(['e', 'E']) {
            Some(pos) => {
                let exp = &text[pos + 1..];
                let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                let exponent: i64 = exp.parse().map_err(|_| invalid())?;
                (&text[..pos], exponent)
            }
            None => (text, 0),
        };

        let (negative, unsigned) = match significand.as_bytes().first() {
            Some(b'-') => (true, &significand[1..]),
            Some(b'+') => (false, &significand[1..]),
            _ => (false, significand),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = format!("{int_part}{frac_part}");
        let mut mantissa = BigInt::from_str(&digits).map_err(|_| invalid())?;
        if negative {
            mantissa = -mantissa;
        }

        let scale = (frac_part.len() as i64)
            .checked_sub(exponent)
            .ok_or_else(invalid)?;
        Self::from_signed_scale(mantissa, scale)
    }

    /// Build from a possibly negative scale, folding negative scales into
    /// the mantissa.
    fn from_signed_scale(mantissa: BigInt, scale: i64) -> Result<Self, DecimalError> {
        if scale.unsigned_abs() > u64::from(MAX_SCALE) {
            return Err(DecimalError::OutOfRange(format!(
                "scale {scale} exceeds {MAX_SCALE}"
            )));
        }
        if scale >= 0 {
            Ok(Self::new(mantissa, scale as u32))
        } else {
            Ok(Self::new(mantissa * pow10(scale.unsigned_abs() as u32), 0))
        }
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    /// -1, 0 or 1.
    pub fn signum(&self) -> i32 {
        if self.mantissa.is_positive() {
            1
        } else if self.mantissa.is_negative() {
            -1
        } else {
            0
        }
    }

    pub fn add(&self, other: &Decimal) -> Decimal {
        let (a, b, scale) = self.aligned(other);
        Self::new(a + b, scale)
    }

    pub fn sub(&self, other: &Decimal) -> Decimal {
        let (a, b, scale) = self.aligned(other);
        Self::new(a - b, scale)
    }

    pub fn mul(&self, other: &Decimal) -> Result<Decimal, DecimalError> {
        let scale = self.scale + other.scale;
        if scale > MAX_SCALE {
            return Err(DecimalError::OutOfRange(format!(
                "scale {scale} exceeds {MAX_SCALE}"
            )));
        }
        Ok(Self::new(&self.mantissa * &other.mantissa, scale))
    }

    /// Divide, producing exactly `scale` fraction digits.
    pub fn divide(
        &self,
        divisor: &Decimal,
        scale: u32,
        mode: RoundingMode,
    ) -> Result<Decimal, DecimalError> {
        if divisor.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        if scale > MAX_SCALE {
            return Err(DecimalError::OutOfRange(format!(
                "scale {scale} exceeds {MAX_SCALE}"
            )));
        }
        // quotient × 10^scale = a × 10^(scale + sb - sa) / b
        let shift = i64::from(scale) + i64::from(divisor.scale) - i64::from(self.scale);
        let (numerator, denominator) = if shift >= 0 {
            (&self.mantissa * pow10(shift as u32), divisor.mantissa.clone())
        } else {
            (
                self.mantissa.clone(),
                &divisor.mantissa * pow10(shift.unsigned_abs() as u32),
            )
        };
        let quotient = round_div(&numerator, &denominator, mode)?;
        Ok(Self::new(quotient, scale))
    }

    /// Change the scale, rounding away discarded digits with `mode`.
    pub fn with_scale(&self, scale: u32, mode: RoundingMode) -> Result<Decimal, DecimalError> {
        if scale > MAX_SCALE {
            return Err(DecimalError::OutOfRange(format!(
                "scale {scale} exceeds {MAX_SCALE}"
            )));
        }
        match scale.cmp(&self.scale) {
            Ordering::Equal => Ok(self.clone()),
            Ordering::Greater => Ok(Self::new(
                &self.mantissa * pow10(scale - self.scale),
                scale,
            )),
            Ordering::Less => {
                let divisor = pow10(self.scale - scale);
                Ok(Self::new(round_div(&self.mantissa, &divisor, mode)?, scale))
            }
        }
    }

    pub fn negate(&self) -> Decimal {
        Self::new(-&self.mantissa, self.scale)
    }

    pub fn abs(&self) -> Decimal {
        Self::new(self.mantissa.abs(), self.scale)
    }

    /// Raise to a non-negative integer power. The scale multiplies by `n`.
    pub fn pow(&self, n: i64) -> Result<Decimal, DecimalError> {
        if !(0..=MAX_POW).contains(&n) {
            return Err(DecimalError::OutOfRange(format!(
                "invalid exponent {n}, expected 0..={MAX_POW}"
            )));
        }
        let scale = u64::from(self.scale) * n as u64;
        if scale > u64::from(MAX_SCALE) {
            return Err(DecimalError::OutOfRange(format!(
                "scale {scale} exceeds {MAX_SCALE}"
            )));
        }
        // 0, 1 and -1 stay small under any power
        let trivial = self.mantissa.magnitude() <= &BigUint::one();
        if !trivial && self.mantissa.bits().saturating_mul(n as u64) > MAX_POW_BITS {
            return Err(DecimalError::OutOfRange(format!(
                "power {n} is too large"
            )));
        }
        Ok(Self::new(self.mantissa.pow(n as u32), scale as u32))
    }

    /// Shift the decimal point `n` places to the left. Negative `n` shifts right.
    pub fn move_point_left(&self, n: i64) -> Result<Decimal, DecimalError> {
        let scale = i64::from(self.scale)
            .checked_add(n)
            .ok_or_else(|| DecimalError::OutOfRange(format!("cannot move point by {n}")))?;
        Self::from_signed_scale(self.mantissa.clone(), scale)
    }

    /// Shift the decimal point `n` places to the right. The resulting scale
    /// never drops below zero.
    pub fn move_point_right(&self, n: i64) -> Result<Decimal, DecimalError> {
        let scale = i64::from(self.scale)
            .checked_sub(n)
            .ok_or_else(|| DecimalError::OutOfRange(format!("cannot move point by {n}")))?;
        Self::from_signed_scale(self.mantissa.clone(), scale)
    }

    /// Numeric comparison, ignoring scale.
    pub fn cmp_value(&self, other: &Decimal) -> Ordering {
        let (a, b, _) = self.aligned(other);
        a.cmp(&b)
    }

    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    pub fn to_f32(&self) -> f32 {
        self.to_string().parse().unwrap_or(f32::NAN)
    }

    /// Drop the fraction, rounding toward zero.
    pub fn truncate(&self) -> BigInt {
        if self.scale == 0 {
            return self.mantissa.clone();
        }
        // BigInt division truncates toward zero
        &self.mantissa / pow10(self.scale)
    }

    /// Truncate toward zero, keeping the low 64 bits of the integer part.
    pub fn to_i64_wrapping(&self) -> i64 {
        let integer = self.truncate();
        if let Some(v) = integer.to_i64() {
            return v;
        }
        let modulus = BigInt::one() << 64u32;
        integer
            .mod_floor(&modulus)
            .to_u64()
            .map(|bits| bits as i64)
            .unwrap_or_default()
    }

    /// Mantissas of both operands brought to their common (larger) scale.
    fn aligned(&self, other: &Decimal) -> (BigInt, BigInt, u32) {
        match self.scale.cmp(&other.scale) {
            Ordering::Equal => (self.mantissa.clone(), other.mantissa.clone(), self.scale),
            Ordering::Less => (
                &self.mantissa * pow10(other.scale - self.scale),
                other.mantissa.clone(),
                other.scale,
            ),
            Ordering::Greater => (
                self.mantissa.clone(),
                &other.mantissa * pow10(self.scale - other.scale),
                self.scale,
            ),
        }
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

/// Plain notation: never scientific, exactly `scale` fraction digits.
impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.magnitude().to_string();
        if self.mantissa.is_negative() {
            f.write_str("-")?;
        }
        let scale = self.scale as usize;
        if scale == 0 {
            return f.write_str(&digits);
        }
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{int_part}.{frac_part}")
        } else {
            write!(f, "0.{}{digits}", "0".repeat(scale - digits.len()))
        }
    }
}

fn pow10(exp: u32) -> BigInt {
    BigInt::from(10u32).pow(exp)
}

/// Integer division of `n` by `d` rounded with `mode`.
fn round_div(n: &BigInt, d: &BigInt, mode: RoundingMode) -> Result<BigInt, DecimalError> {
    let (quotient, remainder) = n.div_rem(d);
    if remainder.is_zero() {
        return Ok(quotient);
    }

    let positive = n.is_negative() == d.is_negative();
    let away_from_zero = match mode {
        RoundingMode::Unnecessary => return Err(DecimalError::RoundingNecessary),
        RoundingMode::Up => true,
        RoundingMode::Down => false,
        RoundingMode::Ceiling => positive,
        RoundingMode::Floor => !positive,
        RoundingMode::HalfUp | RoundingMode::HalfDown | RoundingMode::HalfEven => {
            let twice: BigInt = remainder.abs() * 2u32;
            match twice.cmp(&d.abs()) {
                Ordering::Greater => true,
                Ordering::Less => false,
                Ordering::Equal => match mode {
                    RoundingMode::HalfUp => true,
                    RoundingMode::HalfDown => false,
                    _ => quotient.is_odd(),
                },
            }
        }
    };

    if !away_from_zero {
        Ok(quotient)
    } else if positive {
        Ok(quotient + 1u32)
    } else {
        Ok(quotient - 1u32)
    }
}
