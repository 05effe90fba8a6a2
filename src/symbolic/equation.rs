//! Single-variable equation solving
//!
//! Polynomials up to degree two are solved exactly (surds and complex
//! roots included). Anything else falls back to a sign-change scan with
//! bisection over a bounded real interval.

use crate::symbolic::eval::evaluate_at;
use crate::symbolic::expr::{Constant, Expr};
use crate::symbolic::number::{split_square_factor, Number};
use crate::symbolic::simplify::simplify;
use crate::symbolic::SolveError;

const MAX_DEGREE: usize = 32;
/// Numeric scan covers [-SCAN_HALF_WIDTH, SCAN_HALF_WIDTH] / SCAN_RESOLUTION
const SCAN_HALF_WIDTH: i32 = 1000;
const SCAN_RESOLUTION: f64 = 100.0;
const BISECTION_ITERATIONS: usize = 100;
const RESIDUAL_TOLERANCE: f64 = 1e-6;
const DUPLICATE_TOLERANCE: f64 = 1e-7;
const MAX_SNAP_DENOMINATOR: i64 = 12;

/// Solve `lhs = rhs` for `var`, returning the solution set.
///
/// An equation that does not involve `var` (an identity or a
/// contradiction) has an empty solution set.
pub fn solve_equation(lhs: &Expr, rhs: &Expr, var: &str) -> Result<Vec<Expr>, SolveError> {
    let f = simplify(&Expr::sub(lhs.clone(), rhs.clone()));
    if !f.depends_on(var) {
        return Ok(Vec::new());
    }

    let polynomial = polynomial_coefficients(&f, var).map(trim_leading_zeros);

    if let Some(coeffs) = &polynomial {
        match coeffs.len() {
            0 | 1 => return Ok(Vec::new()),
            2 => {
                let root = coeffs[0]
                    .neg()
                    .div(coeffs[1])
                    .ok_or(SolveError::DivisionByZero)?;
                return Ok(vec![Expr::Num(root)]);
            }
            3 => return Ok(quadratic_roots(coeffs[2], coeffs[1], coeffs[0])),
            _ => {}
        }
    }

    let roots = scan_real_roots(&f, var)?;
    Ok(roots
        .into_iter()
        .map(|root| {
            let exact = polynomial
                .as_deref()
                .and_then(|coeffs| snap_to_rational(root, coeffs));
            Expr::Num(exact.unwrap_or(Number::Float(round_root(root))))
        })
        .collect())
}

/// Coefficients of `expr` as a polynomial in `var`, lowest degree first.
/// `None` when `expr` is not a polynomial with numeric coefficients.
fn polynomial_coefficients(expr: &Expr, var: &str) -> Option<Vec<Number>> {
    match expr {
        Expr::Num(n) => Some(vec![*n]),
        Expr::Symbol(name) if name == var => Some(vec![Number::ZERO, Number::ONE]),
        Expr::Add(terms) => terms.iter().try_fold(vec![Number::ZERO], |acc, term| {
            Some(poly_add(&acc, &polynomial_coefficients(term, var)?))
        }),
        Expr::Mul(factors) => factors.iter().try_fold(vec![Number::ONE], |acc, factor| {
            poly_mul(&acc, &polynomial_coefficients(factor, var)?)
        }),
        Expr::Pow(base, exp) => {
            let k = exp.as_number()?.as_integer()?;
            if k < 0 || k as usize > MAX_DEGREE {
                return None;
            }
            let base = polynomial_coefficients(base, var)?;
            (0..k).try_fold(vec![Number::ONE], |acc, _| poly_mul(&acc, &base))
        }
        _ => None,
    }
}

fn poly_add(a: &[Number], b: &[Number]) -> Vec<Number> {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(Number::ZERO);
            let y = b.get(i).copied().unwrap_or(Number::ZERO);
            x.add(y)
        })
        .collect()
}

fn poly_mul(a: &[Number], b: &[Number]) -> Option<Vec<Number>> {
    if a.len() + b.len() - 1 > MAX_DEGREE + 1 {
        return None;
    }
    let mut out = vec![Number::ZERO; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] = out[i + j].add(x.mul(*y));
        }
    }
    Some(out)
}

fn trim_leading_zeros(mut coeffs: Vec<Number>) -> Vec<Number> {
    while coeffs.last().is_some_and(|c| c.is_zero()) {
        coeffs.pop();
    }
    coeffs
}

fn poly_eval(coeffs: &[Number], at: Number) -> Number {
    coeffs
        .iter()
        .rev()
        .fold(Number::ZERO, |acc, c| acc.mul(at).add(*c))
}

fn quadratic_roots(a: Number, b: Number, c: Number) -> Vec<Expr> {
    let exact = !(a.is_float() || b.is_float() || c.is_float());
    if exact {
        if let Some(roots) = exact_quadratic_roots(a, b, c) {
            return roots;
        }
    }
    float_quadratic_roots(a.to_f64(), b.to_f64(), c.to_f64())
}

/// Roots as `center ± scale * sqrt(radicand)` (times `i` when the
/// discriminant is negative). `None` if exact arithmetic overflows.
fn exact_quadratic_roots(a: Number, b: Number, c: Number) -> Option<Vec<Expr>> {
    let discriminant = b.mul(b).sub(Number::integer(4).mul(a).mul(c));
    let two_a = Number::integer(2).mul(a);
    let center = b.neg().div(two_a)?;

    if discriminant.is_float() || center.is_float() {
        return None;
    }
    if discriminant.is_zero() {
        return Some(vec![Expr::Num(center)]);
    }

    let Number::Rational(p, q) = discriminant.abs() else {
        return None;
    };
    // sqrt(p/q) = sqrt(p*q) / q
    let radicand = i64::try_from(p as i128 * q as i128).ok()?;
    let (outside, inside) = split_square_factor(radicand);
    let scale = Number::rational(outside, q)?.div(two_a)?.abs();
    if scale.is_float() {
        return None;
    }

    let mut offset = if inside == 1 {
        Expr::Num(scale)
    } else {
        Expr::mul(Expr::Num(scale), Expr::sqrt(Expr::int(inside)))
    };
    if discriminant.is_negative() {
        offset = Expr::mul(offset, Expr::Const(Constant::I));
    }

    let low = simplify(&Expr::sub(Expr::Num(center), offset.clone()));
    let high = simplify(&Expr::add(Expr::Num(center), offset));
    Some(vec![low, high])
}

fn float_quadratic_roots(a: f64, b: f64, c: f64) -> Vec<Expr> {
    let discriminant = b * b - 4.0 * a * c;
    if discriminant == 0.0 {
        return vec![Expr::Num(Number::Float(round_root(-b / (2.0 * a))))];
    }
    if discriminant > 0.0 {
        let root = discriminant.sqrt();
        let mut roots = [(-b - root) / (2.0 * a), (-b + root) / (2.0 * a)];
        roots.sort_by(f64::total_cmp);
        return roots
            .iter()
            .map(|r| Expr::Num(Number::Float(round_root(*r))))
            .collect();
    }

    let re = round_root(-b / (2.0 * a));
    let im = round_root((-discriminant).sqrt() / (2.0 * a.abs()));
    [-im, im]
        .iter()
        .map(|part| {
            simplify(&Expr::add(
                Expr::Num(Number::Float(re)),
                Expr::mul(Expr::Num(Number::Float(*part)), Expr::Const(Constant::I)),
            ))
        })
        .collect()
}

/// Locate real roots of `f(var) = 0` on the scan interval.
fn scan_real_roots(f: &Expr, var: &str) -> Result<Vec<f64>, SolveError> {
    if let Some(other) = f.free_symbols().into_iter().find(|s| s != var) {
        return Err(SolveError::FreeSymbol(other));
    }

    let sample = |x: f64| evaluate_at(f, var, x).ok();

    let mut roots: Vec<f64> = Vec::new();
    let mut any_defined = false;
    let mut previous: Option<(f64, f64)> = None;

    for i in -SCAN_HALF_WIDTH..=SCAN_HALF_WIDTH {
        let x = i as f64 / SCAN_RESOLUTION;
        let y = sample(x);

        if let Some(y) = y {
            any_defined = true;
            if y == 0.0 {
                push_root(x, &mut roots);
            } else if let Some((px, py)) = previous {
                if py != 0.0 && (py < 0.0) != (y < 0.0) {
                    if let Some(root) = bisect(&sample, px, x) {
                        push_root(root, &mut roots);
                    }
                }
            }
        }

        previous = y.map(|y| (x, y));
    }

    if !any_defined {
        return Err(SolveError::Unsupported(format!(
            "equation has no real values to search for `{}`",
            var
        )));
    }

    roots.sort_by(f64::total_cmp);
    Ok(roots)
}

fn push_root(root: f64, roots: &mut Vec<f64>) {
    if !roots.iter().any(|r| (r - root).abs() < DUPLICATE_TOLERANCE) {
        roots.push(root);
    }
}

fn bisect(sample: &impl Fn(f64) -> Option<f64>, mut lo: f64, mut hi: f64) -> Option<f64> {
    let mut f_lo = sample(lo)?;
    for _ in 0..BISECTION_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let f_mid = sample(mid)?;
        if f_mid == 0.0 {
            return Some(mid);
        }
        if (f_mid < 0.0) == (f_lo < 0.0) {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }
    let mid = 0.5 * (lo + hi);
    // A sign change across a pole is not a root
    (sample(mid)?.abs() < RESIDUAL_TOLERANCE).then_some(mid)
}

fn snap_to_rational(value: f64, coeffs: &[Number]) -> Option<Number> {
    (1..=MAX_SNAP_DENOMINATOR).find_map(|den| {
        let num = (value * den as f64).round();
        if (num / den as f64 - value).abs() > RESIDUAL_TOLERANCE {
            return None;
        }
        let candidate = Number::rational(num as i64, den)?;
        poly_eval(coeffs, candidate).is_zero().then_some(candidate)
    })
}

fn round_root(value: f64) -> f64 {
    let rounded = (value * 1e12).round() / 1e12;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
