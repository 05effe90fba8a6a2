//! Tokenizer and recursive-descent parser
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr  := term (('+' | '-') term)*
//! term  := unary (('*' | '/') unary)*
//! unary := ('-' | '+') unary | power
//! power := atom (('^' | '**') unary)?
//! atom  := NUMBER | IDENT '(' expr ')' | IDENT | '(' expr ')'
//! ```
//!
//! Implicit multiplication is not supported: `2x` and `find the` are errors.
//! Nesting deeper than [`MAX_NESTING_DEPTH`] is rejected, which also bounds
//! the depth of every tree the simplifier and walkers see.

use crate::symbolic::expr::{Constant, Expr, Func};
use crate::symbolic::number::Number;
use crate::symbolic::SolveError;

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(Number),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    text: String,
    position: usize,
}

impl Token {
    fn unexpected(&self) -> SolveError {
        SolveError::UnexpectedToken {
            token: self.text.clone(),
            position: self.position,
        }
    }
}

/// Deepest chain of brackets, signs, powers and calls accepted
pub const MAX_NESTING_DEPTH: usize = 200;

/// Parse an expression string into an [`Expr`].
pub fn parse(input: &str) -> Result<Expr, SolveError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(SolveError::EmptyExpression);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expr()?;

    match parser.tokens.get(parser.pos) {
        Some(token) => Err(token.unexpected()),
        None => Ok(expr),
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, SolveError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let starts_number = c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()));

        let kind = if starts_number {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            TokenKind::Number(parse_number_literal(&text, start)?)
        } else if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            TokenKind::Ident(chars[start..i].iter().collect())
        } else {
            i += 1;
            match c {
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' if chars.get(i) == Some(&'*') => {
                    i += 1;
                    TokenKind::Caret
                }
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '^' => TokenKind::Caret,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                other => {
                    return Err(SolveError::UnexpectedToken {
                        token: other.to_string(),
                        position: start,
                    })
                }
            }
        };

        tokens.push(Token {
            kind,
            text: chars[start..i].iter().collect(),
            position: start,
        });
    }

    Ok(tokens)
}

fn parse_number_literal(text: &str, position: usize) -> Result<Number, SolveError> {
    let malformed = || SolveError::UnexpectedToken {
        token: text.to_string(),
        position,
    };

    if text.contains('.') {
        return text.parse::<f64>().map(Number::Float).map_err(|_| malformed());
    }

    match text.parse::<i64>() {
        Ok(n) => Ok(Number::integer(n)),
        Err(_) => text.parse::<f64>().map(Number::Float).map_err(|_| malformed()),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_rparen(&mut self) -> Result<(), SolveError> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => Ok(()),
            Some(token) => Err(token.unexpected()),
            None => Err(SolveError::UnexpectedEnd),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, SolveError> {
        let mut terms = vec![self.parse_term()?];
        loop {
            match self.peek() {
                Some(TokenKind::Plus) => {
                    self.pos += 1;
                    terms.push(self.parse_term()?);
                }
                Some(TokenKind::Minus) => {
                    self.pos += 1;
                    terms.push(Expr::neg(self.parse_term()?));
                }
                _ => break,
            }
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Add(terms)
        })
    }

    fn parse_term(&mut self) -> Result<Expr, SolveError> {
        let mut factors = vec![self.parse_unary()?];
        loop {
            match self.peek() {
                Some(TokenKind::Star) => {
                    self.pos += 1;
                    factors.push(self.parse_unary()?);
                }
                Some(TokenKind::Slash) => {
                    self.pos += 1;
                    factors.push(Expr::pow(self.parse_unary()?, Expr::int(-1)));
                }
                _ => break,
            }
        }
        Ok(if factors.len() == 1 {
            factors.remove(0)
        } else {
            Expr::Mul(factors)
        })
    }

    // Every recursive path (brackets, call arguments, exponents, signs)
    // passes through here, so this is the single depth check.
    fn parse_unary(&mut self) -> Result<Expr, SolveError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(SolveError::TooDeeplyNested(MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        let expr = self.parse_signed();
        self.depth -= 1;
        expr
    }

    fn parse_signed(&mut self) -> Result<Expr, SolveError> {
        match self.peek() {
            Some(TokenKind::Minus) => {
                self.pos += 1;
                Ok(Expr::neg(self.parse_unary()?))
            }
            Some(TokenKind::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, SolveError> {
        let base = self.parse_atom()?;
        if self.peek() == Some(&TokenKind::Caret) {
            self.pos += 1;
            let exp = self.parse_unary()?;
            return Ok(Expr::pow(base, exp));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Expr, SolveError> {
        let Token {
            kind,
            text,
            position,
        } = self.advance().ok_or(SolveError::UnexpectedEnd)?;
        match kind {
            TokenKind::Number(n) => Ok(Expr::Num(n)),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect_rparen()?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if self.peek() == Some(&TokenKind::LParen) {
                    self.pos += 1;
                    let arg = self.parse_expr()?;
                    self.expect_rparen()?;
                    if name == "sqrt" {
                        return Ok(Expr::sqrt(arg));
                    }
                    let func =
                        Func::from_name(&name).ok_or(SolveError::UnknownFunction(name))?;
                    return Ok(Expr::call(func, arg));
                }
                Ok(match name.as_str() {
                    "pi" => Expr::Const(Constant::Pi),
                    "E" | "e" => Expr::Const(Constant::E),
                    "I" => Expr::Const(Constant::I),
                    _ => Expr::Symbol(name),
                })
            }
            _ => Err(SolveError::UnexpectedToken {
                token: text,
                position,
            }),
        }
    }
}
