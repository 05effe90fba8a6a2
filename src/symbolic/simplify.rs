//! Bottom-up algebraic simplification
//!
//! Flattens nested sums and products, folds numbers, collects like terms
//! (`2*x + 3*x`) and like powers (`x * x^2`), and drops the identities
//! `+ 0`, `* 1`, `^ 1` and `^ 0`. Term order follows first appearance,
//! with the numeric constant of a sum placed last.

use crate::symbolic::eval::apply_func;
use crate::symbolic::expr::{Constant, Expr, Func};
use crate::symbolic::number::Number;

pub fn simplify(expr: &Expr) -> Expr {
    match expr {
        Expr::Num(_) | Expr::Const(_) | Expr::Symbol(_) => expr.clone(),
        Expr::Add(terms) => simplify_add(terms.iter().map(simplify).collect()),
        Expr::Mul(factors) => simplify_mul(factors.iter().map(simplify).collect()),
        Expr::Pow(base, exp) => simplify_pow(simplify(base), simplify(exp)),
        Expr::Call(func, arg) => simplify_call(*func, simplify(arg)),
    }
}

fn simplify_add(terms: Vec<Expr>) -> Expr {
    let mut flat = Vec::with_capacity(terms.len());
    for term in terms {
        match term {
            Expr::Add(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut constant = Number::ZERO;
    let mut collected: Vec<(Expr, Number)> = Vec::new();

    for term in flat {
        if let Some(n) = term.as_number() {
            constant = constant.add(n);
            continue;
        }
        let (coef, rest) = split_coefficient(term);
        match collected.iter_mut().find(|(existing, _)| *existing == rest) {
            Some((_, total)) => *total = total.add(coef),
            None => collected.push((rest, coef)),
        }
    }

    let mut out: Vec<Expr> = collected
        .into_iter()
        .filter(|(_, coef)| !coef.is_zero())
        .map(|(rest, coef)| with_coefficient(coef, rest))
        .collect();

    if !constant.is_zero() {
        out.push(Expr::Num(constant));
    }

    match out.len() {
        0 => Expr::Num(Number::ZERO),
        1 => out.remove(0),
        _ => Expr::Add(out),
    }
}

fn simplify_mul(factors: Vec<Expr>) -> Expr {
    let mut flat = Vec::with_capacity(factors.len());
    for factor in factors {
        match factor {
            Expr::Mul(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut coefficient = Number::ONE;
    let mut powers: Vec<(Expr, Expr)> = Vec::new();

    for factor in flat {
        if let Some(n) = factor.as_number() {
            coefficient = coefficient.mul(n);
            continue;
        }
        let (base, exp) = match factor {
            Expr::Pow(base, exp) => (*base, *exp),
            other => (other, Expr::int(1)),
        };
        match powers.iter_mut().find(|(existing, _)| *existing == base) {
            Some((_, total)) => *total = simplify_add(vec![total.clone(), exp]),
            None => powers.push((base, exp)),
        }
    }

    if coefficient.is_zero() {
        return Expr::Num(Number::ZERO);
    }

    let mut rest = Vec::with_capacity(powers.len());
    for (base, exp) in powers {
        match simplify_pow(base, exp) {
            Expr::Num(n) => coefficient = coefficient.mul(n),
            Expr::Mul(inner) => {
                for item in inner {
                    match item.as_number() {
                        Some(n) => coefficient = coefficient.mul(n),
                        None => rest.push(item),
                    }
                }
            }
            other => rest.push(other),
        }
    }

    if coefficient.is_zero() {
        return Expr::Num(Number::ZERO);
    }

    match rest.len() {
        0 => Expr::Num(coefficient),
        1 if coefficient.is_one() => rest.remove(0),
        _ => with_coefficient(coefficient, Expr::Mul(rest)),
    }
}

fn simplify_pow(base: Expr, exp: Expr) -> Expr {
    if exp.is_zero() || base.is_one() {
        return Expr::int(1);
    }
    if exp.is_one() {
        return base;
    }

    if let (Some(b), Some(e)) = (base.as_number(), exp.as_number()) {
        return match fold_numeric_power(b, e) {
            Some(folded) => Expr::Num(folded),
            None => Expr::pow(base, exp),
        };
    }

    let integer_exp = exp.as_number().and_then(Number::as_integer);

    match (base, integer_exp) {
        (Expr::Pow(inner_base, inner_exp), Some(_)) => {
            simplify_pow(*inner_base, simplify_mul(vec![*inner_exp, exp]))
        }
        (Expr::Mul(factors), Some(_)) => simplify_mul(
            factors
                .into_iter()
                .map(|factor| simplify_pow(factor, exp.clone()))
                .collect(),
        ),
        (Expr::Const(Constant::I), Some(k)) => imaginary_power(k),
        (base, _) => Expr::pow(base, exp),
    }
}

fn fold_numeric_power(base: Number, exp: Number) -> Option<Number> {
    if let Some(k) = exp.as_integer() {
        return base.pow_int(k);
    }
    if exp == Number::HALF {
        return base.sqrt_exact();
    }
    if exp == Number::HALF.neg() {
        return base.sqrt_exact()?.recip();
    }
    if base.is_float() || exp.is_float() {
        let value = base.to_f64().powf(exp.to_f64());
        return value.is_finite().then_some(Number::Float(value));
    }
    None
}

fn imaginary_power(k: i64) -> Expr {
    match k.rem_euclid(4) {
        0 => Expr::int(1),
        1 => Expr::Const(Constant::I),
        2 => Expr::int(-1),
        _ => Expr::neg(Expr::Const(Constant::I)),
    }
}

fn simplify_call(func: Func, arg: Expr) -> Expr {
    match (func, &arg) {
        (Func::Sin | Func::Tan | Func::Asin | Func::Atan | Func::Sinh | Func::Tanh, a)
            if a.is_zero() =>
        {
            Expr::int(0)
        }
        (Func::Cos | Func::Cosh | Func::Exp, a) if a.is_zero() => Expr::int(1),
        (Func::Log, a) if a.is_one() => Expr::int(0),
        (Func::Log, Expr::Const(Constant::E)) => Expr::int(1),
        (Func::Exp, Expr::Call(Func::Log, inner)) => inner.as_ref().clone(),
        (Func::Abs, Expr::Num(n)) => Expr::Num(n.abs()),
        (_, Expr::Num(Number::Float(v))) => {
            let value = apply_func(func, *v);
            if value.is_finite() {
                Expr::Num(Number::Float(value))
            } else {
                Expr::call(func, arg)
            }
        }
        _ => Expr::call(func, arg),
    }
}

/// Separate the leading numeric coefficient of a simplified term.
fn split_coefficient(term: Expr) -> (Number, Expr) {
    match term {
        Expr::Mul(mut factors) => match factors.first().and_then(Expr::as_number) {
            Some(coef) => {
                factors.remove(0);
                let rest = if factors.len() == 1 {
                    factors.remove(0)
                } else {
                    Expr::Mul(factors)
                };
                (coef, rest)
            }
            None => (Number::ONE, Expr::Mul(factors)),
        },
        other => (Number::ONE, other),
    }
}

fn with_coefficient(coef: Number, rest: Expr) -> Expr {
    if coef.is_one() {
        return rest;
    }
    match rest {
        Expr::Mul(mut factors) => {
            factors.insert(0, Expr::Num(coef));
            Expr::Mul(factors)
        }
        other => Expr::Mul(vec![Expr::Num(coef), other]),
    }
}
