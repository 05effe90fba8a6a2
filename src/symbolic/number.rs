//! Exact rational and floating point numbers
//!
//! Rationals stay exact until an operation overflows `i64`, at which
//! point the value is promoted to a float.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Normalized: denominator > 0, numerator and denominator coprime
    Rational(i64, i64),
    Float(f64),
}

impl Number {
    pub const ZERO: Number = Number::Rational(0, 1);
    pub const ONE: Number = Number::Rational(1, 1);
    pub const MINUS_ONE: Number = Number::Rational(-1, 1);
    pub const HALF: Number = Number::Rational(1, 2);

    pub fn integer(n: i64) -> Self {
        Number::Rational(n, 1)
    }

    /// Build a normalized rational. Returns `None` for a zero denominator.
    pub fn rational(num: i64, den: i64) -> Option<Self> {
        from_parts(num as i128, den as i128)
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Rational(n, d) => n as f64 / d as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Rational(n, _) => n == 0,
            Number::Float(f) => f == 0.0,
        }
    }

    pub fn is_one(self) -> bool {
        match self {
            Number::Rational(n, d) => n == 1 && d == 1,
            Number::Float(f) => f == 1.0,
        }
    }

    pub fn is_negative(self) -> bool {
        self.to_f64() < 0.0
    }

    pub fn is_float(self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Integer value of an exact rational with denominator 1
    pub fn as_integer(self) -> Option<i64> {
        match self {
            Number::Rational(n, 1) => Some(n),
            _ => None,
        }
    }

    pub fn add(self, other: Number) -> Number {
        if let (Number::Rational(a, b), Number::Rational(c, d)) = (self, other) {
            let num = a as i128 * d as i128 + c as i128 * b as i128;
            if let Some(sum) = from_parts(num, b as i128 * d as i128) {
                return sum;
            }
        }
        Number::Float(self.to_f64() + other.to_f64())
    }

    pub fn mul(self, other: Number) -> Number {
        if let (Number::Rational(a, b), Number::Rational(c, d)) = (self, other) {
            if let Some(product) = from_parts(a as i128 * c as i128, b as i128 * d as i128) {
                return product;
            }
        }
        Number::Float(self.to_f64() * other.to_f64())
    }

    pub fn neg(self) -> Number {
        self.mul(Number::MINUS_ONE)
    }

    pub fn sub(self, other: Number) -> Number {
        self.add(other.neg())
    }

    pub fn abs(self) -> Number {
        if self.is_negative() {
            self.neg()
        } else {
            self
        }
    }

    pub fn recip(self) -> Option<Number> {
        if self.is_zero() {
            return None;
        }
        match self {
            Number::Rational(n, d) => {
                from_parts(d as i128, n as i128).or(Some(Number::Float(d as f64 / n as f64)))
            }
            Number::Float(f) => Some(Number::Float(1.0 / f)),
        }
    }

    pub fn div(self, other: Number) -> Option<Number> {
        other.recip().map(|r| self.mul(r))
    }

    /// Raise to an integer power. `None` for zero to a negative power.
    pub fn pow_int(self, exp: i64) -> Option<Number> {
        if exp < 0 {
            return self.recip()?.pow_int(exp.checked_neg()?);
        }
        let mut result = Number::ONE;
        let mut base = self;
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = result.mul(base);
            }
            base = base.mul(base);
            e >>= 1;
        }
        Some(result)
    }

    /// Exact square root of a non-negative rational whose numerator and
    /// denominator are both perfect squares.
    pub fn sqrt_exact(self) -> Option<Number> {
        match self {
            Number::Rational(n, d) if n >= 0 => {
                let rn = integer_sqrt(n)?;
                let rd = integer_sqrt(d)?;
                Number::rational(rn, rd)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Rational(n, 1) => write!(f, "{}", n),
            Number::Rational(n, d) => write!(f, "{}/{}", n, d),
            Number::Float(v) => write!(f, "{}", format_float(*v)),
        }
    }
}

fn gcd(mut a: i128, mut b: i128) -> i128 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn from_parts(num: i128, den: i128) -> Option<Number> {
    if den == 0 {
        return None;
    }
    let g = gcd(num, den).max(1);
    let (mut n, mut d) = (num / g, den / g);
    if d < 0 {
        n = -n;
        d = -d;
    }
    Some(Number::Rational(
        i64::try_from(n).ok()?,
        i64::try_from(d).ok()?,
    ))
}

fn integer_sqrt(n: i64) -> Option<i64> {
    if n < 0 {
        return None;
    }
    let mut r = (n as f64).sqrt() as i64;
    while r > 0 && r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).map_or(false, |sq| sq <= n) {
        r += 1;
    }
    (r * r == n).then_some(r)
}

/// Split `n` (> 0) into `(outside, inside)` with `n = outside^2 * inside`
/// and `inside` free of square factors up to 100_000^2.
pub fn split_square_factor(n: i64) -> (i64, i64) {
    let mut outside = 1;
    let mut inside = n;
    let mut k = 2;
    while k <= 100_000 && k * k <= inside {
        while inside % (k * k) == 0 {
            inside /= k * k;
            outside *= k;
        }
        k += 1;
    }
    (outside, inside)
}

/// Render a float with 15 significant digits, trailing zeros trimmed,
/// always keeping one fractional digit (`4.0`, `0.333333333333333`).
pub fn format_float(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    if !(-5..15).contains(&magnitude) {
        let formatted = format!("{:.14e}", value);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                format!("{}e{}", trim_fraction(mantissa), exponent)
            }
            None => formatted,
        };
    }
    let decimals = (14 - magnitude).max(1) as usize;
    trim_fraction(&format!("{:.*}", decimals, value))
}

fn trim_fraction(text: &str) -> String {
    if !text.contains('.') {
        return format!("{}.0", text);
    }
    let trimmed = text.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational_normalization() {
        assert_eq!(Number::rational(2, -4), Some(Number::Rational(-1, 2)));
        assert_eq!(Number::rational(0, 7), Some(Number::ZERO));
        assert_eq!(Number::rational(1, 0), None);
    }

    #[test]
    fn test_exact_arithmetic() {
        let third = Number::Rational(1, 3);
        assert_eq!(third.add(third).add(third), Number::ONE);
        assert_eq!(Number::integer(2).pow_int(-2), Some(Number::Rational(1, 4)));
        assert_eq!(Number::ZERO.pow_int(-1), None);
        assert_eq!(Number::Rational(9, 4).sqrt_exact(), Some(Number::Rational(3, 2)));
        assert_eq!(Number::integer(8).sqrt_exact(), None);
    }

    #[test]
    fn test_overflow_promotes_to_float() {
        let big = Number::integer(i64::MAX);
        assert!(big.mul(big).is_float());
    }

    #[test]
    fn test_split_square_factor() {
        assert_eq!(split_square_factor(8), (2, 2));
        assert_eq!(split_square_factor(12), (2, 3));
        assert_eq!(split_square_factor(49), (7, 1));
        assert_eq!(split_square_factor(5), (1, 5));
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(4.0), "4.0");
        assert_eq!(format_float(-2.5), "-2.5");
        assert_eq!(format_float(1.0 / 3.0), "0.333333333333333");
        assert_eq!(format_float(0.0), "0.0");
        assert_eq!(format_float(1e20), "1.0e20");
    }
}
