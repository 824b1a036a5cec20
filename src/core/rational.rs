//! Purpose: Exact rational numbers used by the `<number>r` literal extension.
//! Exports: `Rational`.
//! Role: Host-side parse-rational / rational-to-text / integer-to-rational primitives.
//! Invariants: Always stored reduced with denominator >= 1.
//! Invariants: Sign is carried separately from magnitude; a negative zero is kept distinct.
use std::fmt;

use crate::core::error::{Error, ErrorKind, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    negative: bool,
    numerator: u64,
    denominator: u64,
}

impl Rational {
    pub fn new(negative: bool, numerator: u64, denominator: u64) -> Result<Self> {
        if denominator == 0 {
            return Err(Error::new(ErrorKind::Syntax).with_message("rational denominator is zero"));
        }
        let divisor = gcd(numerator, denominator);
        Ok(Self {
            negative,
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            negative: value < 0,
            numerator: value.unsigned_abs(),
            denominator: 1,
        }
    }

    pub fn from_unsigned(value: u64) -> Self {
        Self {
            negative: false,
            numerator: value,
            denominator: 1,
        }
    }

    pub fn zero(negative: bool) -> Self {
        Self {
            negative,
            numerator: 0,
            denominator: 1,
        }
    }

    /// Parses `[-]digits`, `[-]digits.digits` or `[-]digits/digits` exactly.
    pub fn parse(text: &str) -> Result<Self> {
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let invalid = || {
            Error::new(ErrorKind::Syntax)
                .with_message(format!("invalid rational literal \"{text}\""))
        };

        if let Some((num, den)) = body.split_once('/') {
            let numerator = parse_digits(num).ok_or_else(invalid)?;
            let denominator = parse_digits(den).ok_or_else(invalid)?;
            return Self::new(negative, numerator, denominator);
        }

        let (whole, frac) = body.split_once('.').unwrap_or((body, ""));
        if body.ends_with('.') {
            return Err(invalid());
        }
        let whole = parse_digits(whole).ok_or_else(invalid)?;
        if frac.is_empty() {
            return Self::new(negative, whole, 1);
        }
        let frac_value = parse_digits(frac).ok_or_else(invalid)?;
        let scale = u32::try_from(frac.len())
            .ok()
            .and_then(|len| 10u64.checked_pow(len))
            .ok_or_else(invalid)?;
        let numerator = whole
            .checked_mul(scale)
            .and_then(|n| n.checked_add(frac_value))
            .ok_or_else(invalid)?;
        Self::new(negative, numerator, scale)
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    pub fn is_integer(&self) -> bool {
        self.denominator == 1
    }

    pub fn to_f64(&self) -> f64 {
        let magnitude = self.numerator as f64 / self.denominator as f64;
        if self.negative { -magnitude } else { magnitude }
    }

    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        if self.negative {
            0i64.checked_sub_unsigned(self.numerator)
        } else {
            i64::try_from(self.numerator).ok()
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        if !self.is_integer() || (self.negative && self.numerator != 0) {
            return None;
        }
        usize::try_from(self.numerator).ok()
    }

    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

fn parse_digits(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    if a == 0 { 1 } else { a }
}
