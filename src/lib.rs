//! Smart Math Tutor
//!
//! A two-agent, round-robin tutor:
//! - The solver agent works the problem symbolically (derivative, equation or arithmetic)
//! - The verifier agent asks a reasoning service whether the solution is correct
//! - The orchestrator retries until the verifier's reply carries the termination marker
//!
//! ROUND LOOP:
//! PROBLEM → SOLVE → VERIFY → TERMINATE | RETRY | ABORT

pub mod agent;
pub mod audit;
pub mod classifier;
pub mod config;
pub mod error;
pub mod gemini;
pub mod memory;
pub mod models;
pub mod output;
pub mod reasoning;
pub mod solver;
pub mod symbolic;
pub mod verification;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use classifier::{ProblemClassifier, ProblemKind};
