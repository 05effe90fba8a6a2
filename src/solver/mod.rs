//! Solver agent
//!
//! Wraps the symbolic solving capability and reports every result on the
//! output channel.

use crate::agent::Agent;
use crate::models::{SolveResult, SOLUTION_PREFIX};
use crate::output::OutputSink;
use crate::symbolic::SymbolicSolver;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct SolverAgent {
    solver: Arc<dyn SymbolicSolver>,
    output: Arc<dyn OutputSink>,
}

impl SolverAgent {
    pub fn new(solver: Arc<dyn SymbolicSolver>, output: Arc<dyn OutputSink>) -> Self {
        Self { solver, output }
    }

    /// Solve `problem` and emit the typeset solution or the error
    pub fn solve(&self, problem: &str) -> SolveResult {
        let result = self.solver.solve(problem);

        debug!(kind = result.kind(), "Solver turn complete");

        let line = match &result {
            SolveResult::Error { message } => format!("Solver Error: {}", message),
            other => format!("{} {}", SOLUTION_PREFIX, other.latex().unwrap_or_default()),
        };
        self.output.emit(&line);

        result
    }
}

#[async_trait]
impl Agent for SolverAgent {
    type Input = String;
    type Output = SolveResult;

    fn name(&self) -> &'static str {
        "SolverAgent"
    }

    async fn process(&self, input: String) -> SolveResult {
        self.solve(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;
    use crate::symbolic::MathEngine;

    fn agent() -> (SolverAgent, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (SolverAgent::new(Arc::new(MathEngine::new()), sink.clone()), sink)
    }

    #[tokio::test]
    async fn test_emits_solution_line() {
        let (solver, sink) = agent();
        let result = solver.process("2 + 2".to_string()).await;

        assert!(matches!(result, SolveResult::Arithmetic { value, .. } if value == 4.0));
        assert_eq!(sink.lines(), vec!["Solution (LaTeX): 4.0"]);
    }

    #[tokio::test]
    async fn test_emits_error_line() {
        let (solver, sink) = agent();
        let result = solver.process("Find the derivative of sin(x).".to_string()).await;

        assert!(result.is_error());
        assert_eq!(sink.lines().len(), 1);
        assert!(sink.lines()[0].starts_with("Solver Error: "));
    }

    #[test]
    fn test_result_case_follows_classification() {
        let (solver, _) = agent();

        for problem in ["differentiate x^3", "Differentiate sin(x) + 1"] {
            assert!(matches!(solver.solve(problem), SolveResult::Derivative { .. }), "{}", problem);
        }
        for problem in ["x = 1", "2*x - 6 = 0"] {
            assert!(matches!(solver.solve(problem), SolveResult::Equation { .. }), "{}", problem);
        }
        for problem in ["3 * 4", "sin(pi/2)"] {
            assert!(matches!(solver.solve(problem), SolveResult::Arithmetic { .. }), "{}", problem);
        }
    }
}
