//! Expression tree for the symbolic engine

use crate::symbolic::number::Number;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
    I,
}

impl Constant {
    pub fn symbol(&self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "E",
            Constant::I => "I",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Log,
    Abs,
}

impl Func {
    /// Resolve a function name. `sqrt` is not a function here: the parser
    /// lowers it to a power of one half.
    pub fn from_name(name: &str) -> Option<Func> {
        let func = match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "exp" => Func::Exp,
            "log" | "ln" => Func::Log,
            "abs" | "Abs" => Func::Abs,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Abs => "Abs",
        }
    }
}

/// Symbolic expression.
///
/// Subtraction is `a + (-1)*b`, division is `a * b^-1` and `sqrt(u)` is
/// `u^(1/2)`, so only sums, products and powers need rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(Number),
    Const(Constant),
    Symbol(String),
    Add(Vec<Expr>),
    Mul(Vec<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    pub fn int(n: i64) -> Expr {
        Expr::Num(Number::integer(n))
    }

    pub fn symbol(name: &str) -> Expr {
        Expr::Symbol(name.to_string())
    }

    pub fn add(a: Expr, b: Expr) -> Expr {
        Expr::Add(vec![a, b])
    }

    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::Add(vec![a, Expr::neg(b)])
    }

    pub fn mul(a: Expr, b: Expr) -> Expr {
        Expr::Mul(vec![a, b])
    }

    pub fn div(a: Expr, b: Expr) -> Expr {
        Expr::Mul(vec![a, Expr::pow(b, Expr::int(-1))])
    }

    pub fn neg(a: Expr) -> Expr {
        Expr::Mul(vec![Expr::int(-1), a])
    }

    pub fn pow(base: Expr, exp: Expr) -> Expr {
        Expr::Pow(Box::new(base), Box::new(exp))
    }

    pub fn sqrt(a: Expr) -> Expr {
        Expr::pow(a, Expr::Num(Number::HALF))
    }

    pub fn call(func: Func, arg: Expr) -> Expr {
        Expr::Call(func, Box::new(arg))
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Expr::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_number().is_some_and(Number::is_zero)
    }

    pub fn is_one(&self) -> bool {
        self.as_number().is_some_and(Number::is_one)
    }

    pub fn depends_on(&self, var: &str) -> bool {
        match self {
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Symbol(name) => name == var,
            Expr::Add(items) | Expr::Mul(items) => items.iter().any(|e| e.depends_on(var)),
            Expr::Pow(base, exp) => base.depends_on(var) || exp.depends_on(var),
            Expr::Call(_, arg) => arg.depends_on(var),
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Num(_) | Expr::Const(_) => {}
            Expr::Symbol(name) => {
                out.insert(name.clone());
            }
            Expr::Add(items) | Expr::Mul(items) => {
                items.iter().for_each(|e| e.collect_symbols(out));
            }
            Expr::Pow(base, exp) => {
                base.collect_symbols(out);
                exp.collect_symbols(out);
            }
            Expr::Call(_, arg) => arg.collect_symbols(out),
        }
    }

    /// Split a term into its sign and magnitude, so sums can print
    /// `a - b` instead of `a + -1*b`.
    pub fn split_sign(&self) -> (bool, Expr) {
        match self {
            Expr::Num(n) if n.is_negative() => (true, Expr::Num(n.abs())),
            Expr::Mul(factors) => match factors.first().and_then(Expr::as_number) {
                Some(coef) if coef.is_negative() => {
                    let magnitude = coef.abs();
                    let mut rest: Vec<Expr> = factors[1..].to_vec();
                    if !magnitude.is_one() {
                        rest.insert(0, Expr::Num(magnitude));
                    }
                    let expr = match rest.len() {
                        0 => Expr::Num(Number::ONE),
                        1 => rest.remove(0),
                        _ => Expr::Mul(rest),
                    };
                    (true, expr)
                }
                _ => (false, self.clone()),
            },
            _ => (false, self.clone()),
        }
    }

    /// Decompose a product into numerator and denominator parts:
    /// `(numerator coefficient, denominator coefficient, numerator factors,
    /// denominator factors)`. Factors with a negative numeric exponent move
    /// to the denominator.
    pub fn fraction_parts(&self) -> (Number, i64, Vec<Expr>, Vec<Expr>) {
        let factors: Vec<Expr> = match self {
            Expr::Mul(factors) => factors.clone(),
            other => vec![other.clone()],
        };

        let mut coefficient = Number::ONE;
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();

        for factor in factors {
            match factor {
                Expr::Num(n) => coefficient = coefficient.mul(n),
                Expr::Pow(base, exp) => match exp.as_number() {
                    Some(e) if e.is_negative() => {
                        let flipped = e.neg();
                        if flipped.is_one() {
                            denominator.push(*base);
                        } else {
                            denominator.push(Expr::Pow(base, Box::new(Expr::Num(flipped))));
                        }
                    }
                    _ => numerator.push(Expr::Pow(base, exp)),
                },
                other => numerator.push(other),
            }
        }

        match coefficient {
            Number::Rational(p, q) => (Number::integer(p), q, numerator, denominator),
            float => (float, 1, numerator, denominator),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_plain(self))
    }
}

fn render_plain(expr: &Expr) -> String {
    match expr {
        Expr::Num(n) => n.to_string(),
        Expr::Const(c) => c.symbol().to_string(),
        Expr::Symbol(name) => name.clone(),
        Expr::Add(terms) => {
            let mut out = String::new();
            for (i, term) in terms.iter().enumerate() {
                let (negative, magnitude) = term.split_sign();
                let body = wrap_sum(&magnitude, render_plain(&magnitude));
                match (i, negative) {
                    (0, true) => out.push('-'),
                    (0, false) => {}
                    (_, true) => out.push_str(" - "),
                    (_, false) => out.push_str(" + "),
                }
                out.push_str(&body);
            }
            out
        }
        Expr::Mul(_) => render_plain_product(expr),
        Expr::Pow(base, exp) => {
            if let Some(e) = exp.as_number() {
                if e == Number::HALF {
                    return format!("sqrt({})", render_plain(base));
                }
                if e == Number::MINUS_ONE {
                    return format!("1/{}", plain_operand(base));
                }
            }
            let exponent = match exp.as_ref() {
                Expr::Symbol(name) => name.clone(),
                Expr::Num(Number::Rational(n, 1)) if *n >= 0 => n.to_string(),
                other => format!("({})", render_plain(other)),
            };
            format!("{}**{}", plain_operand(base), exponent)
        }
        Expr::Call(func, arg) => format!("{}({})", func.name(), render_plain(arg)),
    }
}

fn render_plain_product(expr: &Expr) -> String {
    let (negative, magnitude) = expr.split_sign();
    if negative {
        return format!("-{}", wrap_sum(&magnitude, render_plain(&magnitude)));
    }

    let (coefficient, denominator_coef, numerator, denominator) = magnitude.fraction_parts();

    let mut top: Vec<String> = Vec::new();
    if !coefficient.is_one() || numerator.is_empty() {
        top.push(coefficient.to_string());
    }
    top.extend(numerator.iter().map(plain_operand));

    let mut bottom: Vec<String> = Vec::new();
    if denominator_coef != 1 {
        bottom.push(denominator_coef.to_string());
    }
    bottom.extend(denominator.iter().map(plain_operand));

    let top = top.join("*");
    match bottom.len() {
        0 => top,
        1 => format!("{}/{}", top, bottom[0]),
        _ => format!("{}/({})", top, bottom.join("*")),
    }
}

fn plain_operand(expr: &Expr) -> String {
    let rendered = render_plain(expr);
    let needs_parens = match expr {
        Expr::Add(_) | Expr::Mul(_) | Expr::Pow(_, _) => true,
        Expr::Num(n) => n.is_negative() || !matches!(n, Number::Rational(_, 1) | Number::Float(_)),
        _ => false,
    };
    if needs_parens && !rendered.starts_with("sqrt(") {
        format!("({})", rendered)
    } else {
        rendered
    }
}

fn wrap_sum(expr: &Expr, rendered: String) -> String {
    if matches!(expr, Expr::Add(_)) {
        format!("({})", rendered)
    } else {
        rendered
    }
}
