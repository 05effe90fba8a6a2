//! Problem Classifier
//!
//! Routes a problem to one of the solving branches, checked in priority order:
//! - Derivative: the text contains "differentiate" (any case)
//! - Equation: the text contains an `=`
//! - Arithmetic: everything else

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    Derivative,
    Equation,
    Arithmetic,
}

pub const DERIVATIVE_KEYWORD: &str = "differentiate";

/// Problem classifier
pub struct ProblemClassifier;

impl ProblemClassifier {
    /// Classify a problem by its literal text
    pub fn classify(problem: &str) -> ProblemKind {
        if problem.to_lowercase().contains(DERIVATIVE_KEYWORD) {
            ProblemKind::Derivative
        } else if problem.contains('=') {
            ProblemKind::Equation
        } else {
            ProblemKind::Arithmetic
        }
    }

    /// Lowercased text with every occurrence of the derivative keyword removed
    pub fn strip_derivative_keyword(problem: &str) -> String {
        problem.to_lowercase().replace(DERIVATIVE_KEYWORD, "")
    }
}
