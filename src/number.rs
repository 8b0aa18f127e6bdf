// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Rc;

use core::cmp::Ordering;
use core::fmt::{self, Debug, Display, Formatter};
use core::hash::{Hash, Hasher};
use core::str::FromStr;

use anyhow::{bail, Result};
use num_bigint::BigInt as NumBigInt;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use serde::ser::Serializer;
use serde::Serialize;

pub type BigInt = NumBigInt;

// 2^53. Every integer with a smaller magnitude is exactly representable as f64.
const F64_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Arbitrary precision number.
///
/// Integers that fit in an `i64` are kept inline. Larger integers spill into a
/// shared [`BigInt`]. Numbers with a fractional part are `f64`.
/// `Big` never holds a value that fits in `Int`.
#[derive(Clone)]
pub enum Number {
    Int(i64),
    Big(Rc<BigInt>),
    Float(f64),
}

impl Number {
    fn from_bigint(value: BigInt) -> Self {
        match value.to_i64() {
            Some(i) => Number::Int(i),
            None => Number::Big(Rc::new(value)),
        }
    }

    // Floats produced by arithmetic fold back into integers when exact.
    fn from_float_result(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < F64_SAFE_INTEGER {
            Number::Int(value as i64)
        } else {
            Number::Float(value)
        }
    }

    // Arithmetic never produces infinities or NaN.
    fn checked_float(value: f64) -> Result<Number> {
        if !value.is_finite() {
            bail!("number overflow");
        }
        Ok(Self::from_float_result(value))
    }

    fn integral_float(f: f64) -> Option<BigInt> {
        if f.is_finite() && f.fract() == 0.0 {
            BigInt::from_f64(f)
        } else {
            None
        }
    }

    /// Exact integer value, if this number is integral.
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Number::Int(i) => Some(BigInt::from(*i)),
            Number::Big(b) => Some((**b).clone()),
            Number::Float(f) => Self::integral_float(*f),
        }
    }

    fn to_f64_lossy(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Big(b) => b.to_f64().unwrap_or(if b.is_negative() {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }),
            Number::Float(f) => *f,
        }
    }

    // Key for comparisons involving a fractional or non-finite float. A
    // fractional float is smaller in magnitude than any big integer, and an
    // infinity is larger, so a big integer only needs to keep its sign.
    fn order_key(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Big(b) if b.is_negative() => f64::MIN,
            Number::Big(_) => f64::MAX,
            Number::Float(f) => *f,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(i) => *i == 0,
            Number::Big(_) => false,
            Number::Float(f) => *f == 0.0,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => true,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Number::Int(i) => *i < 0,
            Number::Big(b) => b.is_negative(),
            Number::Float(f) => *f < 0.0,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Int(i) => Some(*i),
            Number::Big(_) => None,
            Number::Float(f) => Self::integral_float(*f).and_then(|b| b.to_i64()),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::Int(i) => u64::try_from(*i).ok(),
            Number::Big(b) => b.to_u64(),
            Number::Float(f) => Self::integral_float(*f).and_then(|b| b.to_u64()),
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.to_f64_lossy()
    }

    fn float_op(&self, rhs: &Self) -> bool {
        matches!(self, Number::Float(_)) || matches!(rhs, Number::Float(_))
    }

    pub fn add(&self, rhs: &Self) -> Result<Number> {
        if self.float_op(rhs) {
            return Self::checked_float(self.to_f64_lossy() + rhs.to_f64_lossy());
        }
        if let (Number::Int(a), Number::Int(b)) = (self, rhs) {
            if let Some(v) = a.checked_add(*b) {
                return Ok(Number::Int(v));
            }
        }
        let (a, b) = self.bigint_pair(rhs)?;
        Ok(Self::from_bigint(a + b))
    }

    pub fn sub(&self, rhs: &Self) -> Result<Number> {
        if self.float_op(rhs) {
            return Self::checked_float(self.to_f64_lossy() - rhs.to_f64_lossy());
        }
        if let (Number::Int(a), Number::Int(b)) = (self, rhs) {
            if let Some(v) = a.checked_sub(*b) {
                return Ok(Number::Int(v));
            }
        }
        let (a, b) = self.bigint_pair(rhs)?;
        Ok(Self::from_bigint(a - b))
    }

    pub fn mul(&self, rhs: &Self) -> Result<Number> {
        if self.float_op(rhs) {
            return Self::checked_float(self.to_f64_lossy() * rhs.to_f64_lossy());
        }
        if let (Number::Int(a), Number::Int(b)) = (self, rhs) {
            if let Some(v) = a.checked_mul(*b) {
                return Ok(Number::Int(v));
            }
        }
        let (a, b) = self.bigint_pair(rhs)?;
        Ok(Self::from_bigint(a * b))
    }

    pub fn divide(&self, rhs: &Self) -> Result<Number> {
        if rhs.is_zero() {
            bail!("divide by zero");
        }

        if !self.float_op(rhs) {
            let (a, b) = self.bigint_pair(rhs)?;
            if (&a % &b).is_zero() {
                return Ok(Self::from_bigint(a / b));
            }
        }

        Self::checked_float(self.to_f64_lossy() / rhs.to_f64_lossy())
    }

    pub fn modulo(&self, rhs: &Self) -> Result<Number> {
        if rhs.is_zero() {
            bail!("modulo by zero");
        }
        if !self.is_integer() || !rhs.is_integer() {
            bail!("modulo on floating-point number");
        }
        let (a, b) = self.bigint_pair(rhs)?;
        // Sign follows the dividend, as in Go.
        Ok(Self::from_bigint(a % b))
    }

    fn bigint_pair(&self, rhs: &Self) -> Result<(BigInt, BigInt)> {
        match (self.to_bigint(), rhs.to_bigint()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => bail!("expected integers, got {self} and {rhs}"),
        }
    }

    pub fn abs(&self) -> Number {
        match self {
            Number::Int(i) => match i.checked_abs() {
                Some(v) => Number::Int(v),
                None => Self::from_bigint(BigInt::from(*i).abs()),
            },
            Number::Big(b) => Self::from_bigint(b.abs()),
            Number::Float(f) => Number::Float(f.abs()),
        }
    }

    pub fn floor(&self) -> Number {
        match self {
            Number::Float(f) => Self::from_float_result(f.floor()),
            _ => self.clone(),
        }
    }

    pub fn ceil(&self) -> Number {
        match self {
            Number::Float(f) => Self::from_float_result(f.ceil()),
            _ => self.clone(),
        }
    }

    /// Rounds half away from zero.
    pub fn round(&self) -> Number {
        match self {
            Number::Float(f) => Self::from_float_result(f.round()),
            _ => self.clone(),
        }
    }

    /// Truncates toward zero.
    pub fn trunc(&self) -> Number {
        match self {
            Number::Float(f) => Self::from_float_result(f.trunc()),
            _ => self.clone(),
        }
    }

    fn integer(&self) -> Option<BigInt> {
        if self.is_integer() {
            self.to_bigint()
        } else {
            None
        }
    }

    pub fn and(&self, rhs: &Self) -> Option<Number> {
        Some(Self::from_bigint(self.integer()? & rhs.integer()?))
    }

    pub fn or(&self, rhs: &Self) -> Option<Number> {
        Some(Self::from_bigint(self.integer()? | rhs.integer()?))
    }

    pub fn xor(&self, rhs: &Self) -> Option<Number> {
        Some(Self::from_bigint(self.integer()? ^ rhs.integer()?))
    }

    pub fn lsh(&self, rhs: &Self) -> Option<Number> {
        let shift = rhs.as_u64().and_then(|s| u32::try_from(s).ok())?;
        Some(Self::from_bigint(self.integer()? << shift))
    }

    pub fn rsh(&self, rhs: &Self) -> Option<Number> {
        let shift = rhs.as_u64().and_then(|s| u32::try_from(s).ok())?;
        Some(Self::from_bigint(self.integer()? >> shift))
    }

    /// Bitwise complement, `-x - 1` in two's complement.
    pub fn neg(&self) -> Option<Number> {
        Some(Self::from_bigint(!self.integer()?))
    }

    pub fn two_pow(e: i32) -> Result<Number> {
        let magnitude = Self::from_bigint(BigInt::one() << e.unsigned_abs());
        if e >= 0 {
            Ok(magnitude)
        } else {
            Number::Int(1).divide(&magnitude)
        }
    }

    pub fn ten_pow(e: i32) -> Result<Number> {
        let magnitude = Self::from_bigint(num_traits::pow(BigInt::from(10), e.unsigned_abs() as usize));
        if e >= 0 {
            Ok(magnitude)
        } else {
            Number::Int(1).divide(&magnitude)
        }
    }

    /// Formats an integral number in the given radix. Fractions are truncated.
    pub fn format_radix(&self, radix: u32) -> Option<String> {
        self.trunc().to_bigint().map(|b| b.to_str_radix(radix))
    }

    pub fn format_decimal(&self) -> String {
        match self {
            Number::Int(i) => i.to_string(),
            Number::Big(b) => b.to_string(),
            Number::Float(f) if f.is_nan() => "NaN".to_string(),
            Number::Float(f) => f.to_string(),
        }
    }

    /// Formats with exactly `precision` digits after the decimal point.
    pub fn format_fixed(&self, precision: usize) -> String {
        format!("{:.*}", precision, self.to_f64_lossy())
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Number::Int(i) => serializer.serialize_i64(*i),
            _ => {
                // Whole floats are written with their exact integer digits.
                let text = match self.integer() {
                    Some(b) => b.to_string(),
                    None => self.format_decimal(),
                };
                let v = serde_json::Number::from_str(&text).map_err(|_| {
                    serde::ser::Error::custom(format!("could not serialize number {text}"))
                })?;
                v.serialize(serializer)
            }
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(i64::from(value))
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Number::Int(i),
            Err(_) => Number::Big(Rc::new(BigInt::from(value))),
        }
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::from(value as u64)
    }
}

impl From<u128> for Number {
    fn from(value: u128) -> Self {
        Number::from_bigint(BigInt::from(value))
    }
}

impl From<i128> for Number {
    fn from(value: i128) -> Self {
        Number::from_bigint(BigInt::from(value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::from_bigint(value)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseNumberError;

impl Display for ParseNumberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("invalid number literal")
    }
}

impl FromStr for Number {
    type Err = ParseNumberError;

    /// Parses JSON-style number literals. Integer literals, including ones in
    /// scientific notation with a non-negative adjusted exponent, stay exact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        if digits.is_empty() {
            return Err(ParseNumberError);
        }

        let (mantissa, exponent) = match digits.find(['e', 'E']) {
            Some(p) => {
                let e = digits[p + 1..].parse::<i64>().map_err(|_| ParseNumberError)?;
                (&digits[..p], e)
            }
            None => (digits, 0),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        if (int_part.is_empty() && frac_part.is_empty())
            || !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ParseNumberError);
        }

        let frac_trimmed = frac_part.trim_end_matches('0');
        let shift = exponent - frac_trimmed.len() as i64;
        if (0..=1000).contains(&shift) {
            let mut text = String::with_capacity(int_part.len() + frac_trimmed.len() + 1);
            text.push_str(int_part);
            text.push_str(frac_trimmed);
            if text.is_empty() {
                text.push('0');
            }
            if let Some(mut v) = BigInt::parse_bytes(text.as_bytes(), 10) {
                v *= num_traits::pow(BigInt::from(10), shift as usize);
                if negative {
                    v = -v;
                }
                return Ok(Number::from_bigint(v));
            }
        }

        s.parse::<f64>()
            .map(Number::Float)
            .map_err(|_| ParseNumberError)
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(b),
            _ => match (self.integer(), other.integer()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => self.order_key().total_cmp(&other.order_key()),
            },
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Equal numbers hash equally regardless of representation.
        match self {
            Number::Int(i) => i.hash(state),
            Number::Big(b) => b.hash(state),
            Number::Float(f) => match Self::integral_float(*f) {
                Some(b) => match b.to_i64() {
                    Some(i) => i.hash(state),
                    None => b.hash(state),
                },
                None => f.to_bits().hash(state),
            },
        }
    }
}
