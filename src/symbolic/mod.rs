//! Built-in symbolic math engine
//!
//! Parses problems in a single variable `x`, then differentiates, solves
//! or evaluates them depending on the problem kind. Every successful
//! result carries a LaTeX rendering.

pub mod calculus;
pub mod equation;
pub mod eval;
pub mod expr;
pub mod latex;
pub mod number;
pub mod parser;
pub mod simplify;

use crate::classifier::{ProblemClassifier, ProblemKind};
use crate::models::SolveResult;
use thiserror::Error;

use self::expr::Expr;
use self::latex::{float_to_latex, list_to_latex, to_latex};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("empty expression")]
    EmptyExpression,

    #[error("unexpected token `{token}` at position {position}")]
    UnexpectedToken { token: String, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expression nested deeper than {0} levels")]
    TooDeeplyNested(usize),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("cannot evaluate numerically: free symbol `{0}`")]
    FreeSymbol(String),

    #[error("result is not a real number")]
    NotReal,

    #[error("result is not finite")]
    NotFinite,

    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported problem: {0}")]
    Unsupported(String),
}

/// Symbolic solving capability consumed by the solver agent
pub trait SymbolicSolver: Send + Sync {
    fn solve(&self, problem: &str) -> SolveResult;
}

/// Engine solving for a single variable
pub struct MathEngine {
    variable: String,
}

impl MathEngine {
    pub fn new() -> Self {
        Self {
            variable: "x".to_string(),
        }
    }

    fn differentiate(&self, problem: &str) -> Result<SolveResult, SolveError> {
        let text = ProblemClassifier::strip_derivative_keyword(problem);
        let expr = parser::parse(text.trim())?;
        let derivative = calculus::differentiate(&expr, &self.variable);

        Ok(SolveResult::Derivative {
            expression: derivative.to_string(),
            latex: to_latex(&derivative),
        })
    }

    fn solve_equation(&self, problem: &str) -> Result<SolveResult, SolveError> {
        let (lhs, rhs) = problem
            .split_once('=')
            .ok_or_else(|| SolveError::Unsupported("missing `=`".to_string()))?;
        let lhs = parser::parse(lhs.trim())?;
        let rhs = parser::parse(rhs.trim())?;
        let roots: Vec<Expr> = equation::solve_equation(&lhs, &rhs, &self.variable)?;

        Ok(SolveResult::Equation {
            solution_set: roots.iter().map(Expr::to_string).collect(),
            latex: format!("{} = {}", self.variable, list_to_latex(&roots)),
        })
    }

    fn evaluate(&self, problem: &str) -> Result<SolveResult, SolveError> {
        let expr = parser::parse(problem.trim())?;
        let value = eval::evaluate(&simplify::simplify(&expr))?;

        Ok(SolveResult::Arithmetic {
            value,
            latex: float_to_latex(value),
        })
    }
}

impl Default for MathEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolicSolver for MathEngine {
    fn solve(&self, problem: &str) -> SolveResult {
        let outcome = match ProblemClassifier::classify(problem) {
            ProblemKind::Derivative => self.differentiate(problem),
            ProblemKind::Equation => self.solve_equation(problem),
            ProblemKind::Arithmetic => self.evaluate(problem),
        };

        outcome.unwrap_or_else(|err| SolveResult::Error {
            message: err.to_string(),
        })
    }
}
