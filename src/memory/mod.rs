//! Session memory
//!
//! Holds the current problem so the verifier can fall back to it when a
//! message arrives without a `Problem:` line. Owned by the orchestrator and
//! passed explicitly into each verification turn.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMemory {
    problem: Option<String>,
    problems_seen: u32,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current problem. Called once per new problem, never mid-retry.
    pub fn remember_problem(&mut self, problem: &str) {
        self.problem = Some(problem.to_string());
        self.problems_seen += 1;
    }

    /// Current problem, or an empty string before the first one
    pub fn current_problem(&self) -> &str {
        self.problem.as_deref().unwrap_or("")
    }

    pub fn problems_seen(&self) -> u32 {
        self.problems_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_problem_replaces_old() {
        let mut memory = SessionMemory::new();
        assert_eq!(memory.current_problem(), "");

        memory.remember_problem("2 + 2");
        memory.remember_problem("x^2 = 4");

        assert_eq!(memory.current_problem(), "x^2 = 4");
        assert_eq!(memory.problems_seen(), 2);
    }
}
