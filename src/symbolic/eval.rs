//! Numeric (f64) evaluation

use crate::symbolic::expr::{Constant, Expr, Func};
use crate::symbolic::SolveError;

/// Evaluate an expression with no free symbols.
pub fn evaluate(expr: &Expr) -> Result<f64, SolveError> {
    finite(eval_inner(expr, None)?)
}

/// Evaluate an expression with `var` bound to `value`.
pub fn evaluate_at(expr: &Expr, var: &str, value: f64) -> Result<f64, SolveError> {
    finite(eval_inner(expr, Some((var, value)))?)
}

pub(crate) fn apply_func(func: Func, v: f64) -> f64 {
    match func {
        Func::Sin => v.sin(),
        Func::Cos => v.cos(),
        Func::Tan => v.tan(),
        Func::Asin => v.asin(),
        Func::Acos => v.acos(),
        Func::Atan => v.atan(),
        Func::Sinh => v.sinh(),
        Func::Cosh => v.cosh(),
        Func::Tanh => v.tanh(),
        Func::Exp => v.exp(),
        Func::Log => v.ln(),
        Func::Abs => v.abs(),
    }
}

fn finite(value: f64) -> Result<f64, SolveError> {
    if value.is_nan() {
        Err(SolveError::NotReal)
    } else if value.is_infinite() {
        Err(SolveError::NotFinite)
    } else {
        Ok(value)
    }
}

fn eval_inner(expr: &Expr, binding: Option<(&str, f64)>) -> Result<f64, SolveError> {
    match expr {
        Expr::Num(n) => Ok(n.to_f64()),
        Expr::Const(Constant::Pi) => Ok(std::f64::consts::PI),
        Expr::Const(Constant::E) => Ok(std::f64::consts::E),
        Expr::Const(Constant::I) => Err(SolveError::NotReal),
        Expr::Symbol(name) => match binding {
            Some((var, value)) if var == name.as_str() => Ok(value),
            _ => Err(SolveError::FreeSymbol(name.clone())),
        },
        Expr::Add(terms) => terms
            .iter()
            .try_fold(0.0, |acc, t| Ok::<f64, SolveError>(acc + eval_inner(t, binding)?)),
        Expr::Mul(factors) => factors
            .iter()
            .try_fold(1.0, |acc, f| Ok::<f64, SolveError>(acc * eval_inner(f, binding)?)),
        Expr::Pow(base, exp) => {
            let b = eval_inner(base, binding)?;
            let e = eval_inner(exp, binding)?;
            if b == 0.0 && e < 0.0 {
                return Err(SolveError::DivisionByZero);
            }
            if b < 0.0 && e.fract() != 0.0 {
                return Err(SolveError::NotReal);
            }
            if e.fract() == 0.0 && e.abs() <= i32::MAX as f64 {
                Ok(b.powi(e as i32))
            } else {
                Ok(b.powf(e))
            }
        }
        Expr::Call(func, arg) => {
            let v = eval_inner(arg, binding)?;
            match func {
                Func::Log if v == 0.0 => Err(SolveError::DivisionByZero),
                Func::Log if v < 0.0 => Err(SolveError::NotReal),
                _ => finite(apply_func(*func, v)),
            }
        }
    }
}
