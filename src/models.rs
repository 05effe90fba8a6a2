//! Core data models for the math tutor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const PROBLEM_PREFIX: &str = "Problem:";
pub const SOLUTION_PREFIX: &str = "Solution (LaTeX):";

//
// ================= Solve Result =================
//

/// Outcome of one solver turn. Exactly one case per result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SolveResult {
    Derivative { expression: String, latex: String },
    Equation { solution_set: Vec<String>, latex: String },
    Arithmetic { value: f64, latex: String },
    Error { message: String },
}

impl SolveResult {
    /// Typeset rendering, or `None` for an error result
    pub fn latex(&self) -> Option<&str> {
        match self {
            SolveResult::Derivative { latex, .. }
            | SolveResult::Equation { latex, .. }
            | SolveResult::Arithmetic { latex, .. } => Some(latex),
            SolveResult::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SolveResult::Error { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SolveResult::Derivative { .. } => "derivative",
            SolveResult::Equation { .. } => "equation",
            SolveResult::Arithmetic { .. } => "arithmetic",
            SolveResult::Error { .. } => "error",
        }
    }
}

//
// ================= Messages =================
//

/// The message handed from the orchestrator to the verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeMessage {
    pub problem: String,
    pub solution_latex: String,
}

impl CompositeMessage {
    pub fn new(problem: impl Into<String>, solution_latex: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            solution_latex: solution_latex.into(),
        }
    }
}

impl fmt::Display for CompositeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}\n{} {}",
            PROBLEM_PREFIX, self.problem, SOLUTION_PREFIX, self.solution_latex
        )
    }
}

/// Fields recovered from free-form composite text.
///
/// A field is `None` only when no line carried its prefix. When several
/// lines carry the same prefix, the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedComposite {
    pub problem: Option<String>,
    pub solution: Option<String>,
}

impl ParsedComposite {
    pub fn parse(text: &str) -> Self {
        let mut parsed = Self::default();
        for line in text.split('\n') {
            if let Some(rest) = line.strip_prefix(PROBLEM_PREFIX) {
                parsed.problem = Some(rest.trim().to_string());
            }
            if let Some(rest) = line.strip_prefix(SOLUTION_PREFIX) {
                parsed.solution = Some(rest.trim().to_string());
            }
        }
        parsed
    }
}

/// Free-text reply of the verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub text: String,
}

impl Judgment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Substring containment is the only signal the protocol reads
    pub fn contains_marker(&self, marker: &str) -> bool {
        self.text.contains(marker)
    }
}

impl fmt::Display for Judgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

//
// ================= Rounds & Outcomes =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub solution_latex: String,
    pub judgment: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Verified,
    Aborted { error: String },
    RoundLimitReached,
}

/// Everything that happened to one problem, as stored in the audit log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemOutcome {
    pub audit_id: Uuid,
    pub problem: String,
    pub problem_hash: String,
    pub status: OutcomeStatus,
    pub rounds: Vec<RoundRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ProblemOutcome {
    /// Number of solve turns taken, including an aborting one
    pub fn rounds_taken(&self) -> u32 {
        match self.status {
            OutcomeStatus::Aborted { .. } => self.rounds.len() as u32 + 1,
            _ => self.rounds.len() as u32,
        }
    }
}

/// Counters returned when an interactive session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub problems: u32,
    pub verified: u32,
    pub aborted: u32,
    pub round_limited: u32,
}

impl SessionSummary {
    pub fn tally(&mut self, status: &OutcomeStatus) {
        self.problems += 1;
        match status {
            OutcomeStatus::Verified => self.verified += 1,
            OutcomeStatus::Aborted { .. } => self.aborted += 1,
            OutcomeStatus::RoundLimitReached => self.round_limited += 1,
        }
    }
}

//
// ================= Display Implementations =================
//

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "accepted"),
            Verdict::Rejected => write!(f, "rejected"),
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Verified => write!(f, "verified"),
            OutcomeStatus::Aborted { error } => write!(f, "aborted: {}", error),
            OutcomeStatus::RoundLimitReached => write!(f, "round limit reached"),
        }
    }
}
