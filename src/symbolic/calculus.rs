//! Symbolic differentiation

use crate::symbolic::expr::{Expr, Func};
use crate::symbolic::number::Number;
use crate::symbolic::simplify::simplify;

/// Differentiate `expr` with respect to `var` and simplify the result.
pub fn differentiate(expr: &Expr, var: &str) -> Expr {
    simplify(&derive(&simplify(expr), var))
}

fn derive(expr: &Expr, var: &str) -> Expr {
    match expr {
        Expr::Num(_) | Expr::Const(_) => Expr::int(0),
        Expr::Symbol(name) => Expr::int(if name == var { 1 } else { 0 }),
        Expr::Add(terms) => Expr::Add(terms.iter().map(|t| derive(t, var)).collect()),
        Expr::Mul(factors) => {
            // Product rule: sum over each factor differentiated in turn
            let terms = (0..factors.len())
                .map(|i| {
                    let mut product = factors.clone();
                    product[i] = derive(&factors[i], var);
                    Expr::Mul(product)
                })
                .collect();
            Expr::Add(terms)
        }
        Expr::Pow(base, exp) => derive_pow(base, exp, var),
        Expr::Call(func, arg) => Expr::mul(outer_derivative(*func, arg), derive(arg, var)),
    }
}

fn derive_pow(base: &Expr, exp: &Expr, var: &str) -> Expr {
    let pow = Expr::pow(base.clone(), exp.clone());

    if !exp.depends_on(var) {
        // d(u^n) = n * u^(n-1) * u'
        return Expr::Mul(vec![
            exp.clone(),
            Expr::pow(base.clone(), Expr::add(exp.clone(), Expr::int(-1))),
            derive(base, var),
        ]);
    }

    if !base.depends_on(var) {
        // d(a^v) = a^v * ln(a) * v'
        return Expr::Mul(vec![
            pow,
            Expr::call(Func::Log, base.clone()),
            derive(exp, var),
        ]);
    }

    // d(u^v) = u^v * (v' ln(u) + v u' / u)
    Expr::mul(
        pow,
        Expr::add(
            Expr::mul(derive(exp, var), Expr::call(Func::Log, base.clone())),
            Expr::Mul(vec![
                exp.clone(),
                derive(base, var),
                Expr::pow(base.clone(), Expr::int(-1)),
            ]),
        ),
    )
}

/// f'(u) for each supported function, before the chain-rule factor.
fn outer_derivative(func: Func, u: &Expr) -> Expr {
    let u = u.clone();

    match func {
        Func::Sin => Expr::call(Func::Cos, u),
        Func::Cos => Expr::neg(Expr::call(Func::Sin, u)),
        Func::Tan => Expr::add(
            Expr::pow(Expr::call(Func::Tan, u.clone()), Expr::int(2)),
            Expr::int(1),
        ),
        Func::Asin => inverse_sqrt(one_minus_square(u)),
        Func::Acos => Expr::neg(inverse_sqrt(one_minus_square(u))),
        Func::Atan => Expr::pow(
            Expr::add(Expr::pow(u.clone(), Expr::int(2)), Expr::int(1)),
            Expr::int(-1),
        ),
        Func::Sinh => Expr::call(Func::Cosh, u),
        Func::Cosh => Expr::call(Func::Sinh, u),
        Func::Tanh => Expr::sub(
            Expr::int(1),
            Expr::pow(Expr::call(Func::Tanh, u.clone()), Expr::int(2)),
        ),
        Func::Exp => Expr::call(Func::Exp, u),
        Func::Log => Expr::pow(u, Expr::int(-1)),
        Func::Abs => Expr::div(u.clone(), Expr::call(Func::Abs, u)),
    }
}

fn one_minus_square(u: Expr) -> Expr {
    Expr::sub(Expr::int(1), Expr::pow(u, Expr::int(2)))
}

fn inverse_sqrt(inner: Expr) -> Expr {
    Expr::pow(inner, Expr::Num(Number::HALF.neg()))
}
