//! LaTeX rendering in the style of common computer algebra systems
//! (`\cos{\left(x \right)}`, `\frac{\sqrt{5}}{2}`, `\left[ 1, \  2\right]`).

use crate::symbolic::expr::{Constant, Expr, Func};
use crate::symbolic::number::{format_float, Number};

pub fn to_latex(expr: &Expr) -> String {
    match expr {
        Expr::Num(n) => number_latex(*n),
        Expr::Const(Constant::Pi) => r"\pi".to_string(),
        Expr::Const(Constant::E) => "e".to_string(),
        Expr::Const(Constant::I) => "i".to_string(),
        Expr::Symbol(name) => name.clone(),
        Expr::Add(terms) => {
            let mut out = String::new();
            for (i, term) in terms.iter().enumerate() {
                let (negative, magnitude) = term.split_sign();
                let body = parenthesize_sum(&magnitude);
                match (i, negative) {
                    (0, true) => out.push_str("- "),
                    (0, false) => {}
                    (_, true) => out.push_str(" - "),
                    (_, false) => out.push_str(" + "),
                }
                out.push_str(&body);
            }
            out
        }
        Expr::Mul(_) => product_latex(expr),
        Expr::Pow(base, exp) => power_latex(base, exp),
        Expr::Call(func, arg) => call_latex(*func, arg),
    }
}

/// Render a solution set as a bracketed list.
pub fn list_to_latex(items: &[Expr]) -> String {
    if items.is_empty() {
        return r"\left[ \right]".to_string();
    }
    let rendered: Vec<String> = items.iter().map(to_latex).collect();
    format!(r"\left[ {}\right]", rendered.join(r", \  "))
}

pub fn float_to_latex(value: f64) -> String {
    let text = format_float(value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => format!(r"{} \cdot 10^{{{}}}", mantissa, exponent),
        None => text,
    }
}

fn number_latex(n: Number) -> String {
    match n {
        Number::Rational(p, 1) => p.to_string(),
        Number::Rational(p, q) if p < 0 => format!(r"- \frac{{{}}}{{{}}}", -(p as i128), q),
        Number::Rational(p, q) => format!(r"\frac{{{}}}{{{}}}", p, q),
        Number::Float(v) => float_to_latex(v),
    }
}

fn product_latex(expr: &Expr) -> String {
    let (negative, magnitude) = expr.split_sign();
    let prefix = if negative { "- " } else { "" };

    let (coefficient, denominator_coef, numerator, denominator) = magnitude.fraction_parts();

    let mut top: Vec<String> = Vec::new();
    if !coefficient.is_one() || numerator.is_empty() {
        top.push(number_latex(coefficient));
    }
    top.extend(numerator.iter().map(parenthesize_sum));

    let mut bottom: Vec<String> = Vec::new();
    if denominator_coef != 1 {
        bottom.push(denominator_coef.to_string());
    }
    bottom.extend(denominator.iter().map(parenthesize_sum));

    if bottom.is_empty() {
        format!("{}{}", prefix, top.join(" "))
    } else {
        format!(r"{}\frac{{{}}}{{{}}}", prefix, top.join(" "), bottom.join(" "))
    }
}

fn power_latex(base: &Expr, exp: &Expr) -> String {
    if let Some(e) = exp.as_number() {
        if e == Number::HALF {
            return format!(r"\sqrt{{{}}}", to_latex(base));
        }
        if e.is_negative() {
            let flipped = e.neg();
            let inner = if flipped.is_one() {
                base.clone()
            } else {
                Expr::pow(base.clone(), Expr::Num(flipped))
            };
            return format!(r"\frac{{1}}{{{}}}", to_latex(&inner));
        }
    }

    if let Expr::Const(Constant::E) = base {
        return format!("e^{{{}}}", to_latex(exp));
    }

    if let (Expr::Call(func, arg), Some(k)) = (base, exp.as_number().and_then(Number::as_integer))
    {
        if is_named_operator(*func) && k > 0 {
            return format!(
                r"\{}^{{{}}}{{\left({} \right)}}",
                func.name(),
                k,
                to_latex(arg)
            );
        }
    }

    let needs_parens = match base {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(_, _) | Expr::Call(_, _) => true,
        Expr::Num(n) => n.is_negative() || !matches!(n, Number::Rational(_, 1)),
        _ => false,
    };
    let base_latex = if needs_parens {
        format!(r"\left({}\right)", to_latex(base))
    } else {
        to_latex(base)
    };
    format!("{}^{{{}}}", base_latex, to_latex(exp))
}

fn call_latex(func: Func, arg: &Expr) -> String {
    let inner = to_latex(arg);
    match func {
        Func::Exp => format!("e^{{{}}}", inner),
        Func::Abs => format!(r"\left|{{{}}}\right|", inner),
        Func::Asin | Func::Acos | Func::Atan => {
            format!(r"\operatorname{{{}}}{{\left({} \right)}}", func.name(), inner)
        }
        _ => format!(r"\{}{{\left({} \right)}}", func.name(), inner),
    }
}

/// Functions typeset as built-in LaTeX operators (`\sin`, `\log`, ...)
fn is_named_operator(func: Func) -> bool {
    matches!(
        func,
        Func::Sin | Func::Cos | Func::Tan | Func::Sinh | Func::Cosh | Func::Tanh | Func::Log
    )
}

fn parenthesize_sum(expr: &Expr) -> String {
    if matches!(expr, Expr::Add(_)) {
        format!(r"\left({}\right)", to_latex(expr))
    } else {
        to_latex(expr)
    }
}
