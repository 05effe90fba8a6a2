//! Verifier agent
//!
//! Resolves the problem and proposed solution from a composite message,
//! asks the reasoning service for a judgment, and reports it. A failing
//! service call becomes an error judgment instead of an error value, so
//! the orchestrator treats it like any other rejection.

use crate::agent::Agent;
use crate::memory::SessionMemory;
use crate::models::{Judgment, ParsedComposite};
use crate::output::OutputSink;
use crate::reasoning::ReasoningService;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub const API_ERROR_PREFIX: &str = "Verifier API error:";

/// Input of one verifier turn: the composite text plus the session memory
/// it may fall back on
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub composite: String,
    pub memory: SessionMemory,
}

pub struct VerifierAgent {
    reasoner: Arc<dyn ReasoningService>,
    output: Arc<dyn OutputSink>,
    termination_marker: String,
}

impl VerifierAgent {
    pub fn new(
        reasoner: Arc<dyn ReasoningService>,
        output: Arc<dyn OutputSink>,
        termination_marker: impl Into<String>,
    ) -> Self {
        Self {
            reasoner,
            output,
            termination_marker: termination_marker.into(),
        }
    }

    pub fn termination_marker(&self) -> &str {
        &self.termination_marker
    }

    /// Problem and solution text for a composite message.
    ///
    /// A missing or blank `Problem:` line falls back to memory; a missing
    /// `Solution (LaTeX):` line makes the whole message the solution.
    pub fn resolve(composite: &str, memory: &SessionMemory) -> (String, String) {
        let parsed = ParsedComposite::parse(composite);

        let problem = parsed
            .problem
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| memory.current_problem().to_string());
        let solution = parsed.solution.unwrap_or_else(|| composite.to_string());

        (problem, solution)
    }

    pub fn build_prompt(&self, problem: &str, solution: &str) -> String {
        format!(
            "You are a math verifier AI in a round-robin dialogue.\n\n\
             Given the math problem:\n\n{problem}\n\n\
             The proposed solution (in LaTeX) is:\n\n{solution}\n\n\
             Check if this solution is mathematically correct.\n\
             Reply with \"Yes\" or \"No\" and give reasoning.\n\
             If it's correct, end with \"{marker}\".\n",
            problem = problem,
            solution = solution,
            marker = self.termination_marker,
        )
    }

    pub async fn verify(&self, composite: &str, memory: &SessionMemory) -> Judgment {
        let (problem, solution) = Self::resolve(composite, memory);
        let prompt = self.build_prompt(&problem, &solution);

        debug!(problem = %problem, "Verifier turn started");

        let text = match self.reasoner.generate(&prompt).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Verification call failed");
                format!("{} {}", API_ERROR_PREFIX, e)
            }
        };

        self.output.emit(&text);
        Judgment::new(text)
    }
}

#[async_trait]
impl Agent for VerifierAgent {
    type Input = VerificationRequest;
    type Output = Judgment;

    fn name(&self) -> &'static str {
        "VerifierAgent"
    }

    async fn process(&self, input: VerificationRequest) -> Judgment {
        self.verify(&input.composite, &input.memory).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompositeMessage;
    use crate::output::MemorySink;
    use crate::reasoning::{ScriptedReasoner, ScriptedReply};

    fn memory_with(problem: &str) -> SessionMemory {
        let mut memory = SessionMemory::new();
        memory.remember_problem(problem);
        memory
    }

    #[test]
    fn test_resolve_uses_message_lines() {
        let composite = CompositeMessage::new("x^2 = 4", r"x = \left[ -2, \  2\right]").to_string();
        let (problem, solution) = VerifierAgent::resolve(&composite, &memory_with("ignored"));

        assert_eq!(problem, "x^2 = 4");
        assert_eq!(solution, r"x = \left[ -2, \  2\right]");
    }

    #[test]
    fn test_resolve_falls_back_to_memory_and_whole_message() {
        let memory = memory_with("2 + 2");

        let (problem, solution) = VerifierAgent::resolve("4.0", &memory);
        assert_eq!(problem, "2 + 2");
        assert_eq!(solution, "4.0");

        // Blank problem line also falls back
        let (problem, solution) = VerifierAgent::resolve("Problem:\nSolution (LaTeX): 4.0", &memory);
        assert_eq!(problem, "2 + 2");
        assert_eq!(solution, "4.0");

        // A blank solution line is still a solution line
        let (_, solution) = VerifierAgent::resolve("Problem: 2 + 2\nSolution (LaTeX):", &memory);
        assert_eq!(solution, "");
    }

    #[test]
    fn test_resolve_tracks_latest_memory_write() {
        let mut memory = memory_with("first");
        memory.remember_problem("second");

        let (problem, _) = VerifierAgent::resolve("no lines here", &memory);
        assert_eq!(problem, "second");
    }

    #[test]
    fn test_prompt_names_the_marker() {
        let verifier = VerifierAgent::new(
            Arc::new(ScriptedReasoner::always("")),
            Arc::new(MemorySink::new()),
            "DONE",
        );
        let prompt = verifier.build_prompt("2 + 2", "4.0");

        assert!(prompt.starts_with("You are a math verifier AI in a round-robin dialogue."));
        assert!(prompt.contains("Given the math problem:\n\n2 + 2\n\n"));
        assert!(prompt.contains("The proposed solution (in LaTeX) is:\n\n4.0\n\n"));
        assert!(prompt.contains("If it's correct, end with \"DONE\"."));
    }

    #[tokio::test]
    async fn test_verify_emits_trimmed_judgment() {
        let reasoner = Arc::new(ScriptedReasoner::always("  Yes, correct. TERMINATE \n"));
        let sink = Arc::new(MemorySink::new());
        let verifier = VerifierAgent::new(reasoner.clone(), sink.clone(), "TERMINATE");

        let judgment = verifier
            .process(VerificationRequest {
                composite: CompositeMessage::new("2 + 2", "4.0").to_string(),
                memory: memory_with("2 + 2"),
            })
            .await;

        assert_eq!(judgment.text, "Yes, correct. TERMINATE");
        assert!(judgment.contains_marker(verifier.termination_marker()));
        assert_eq!(sink.lines(), vec!["Yes, correct. TERMINATE"]);
        assert_eq!(reasoner.calls().await, 1);
    }

    #[tokio::test]
    async fn test_service_failure_becomes_error_judgment() {
        let reasoner = Arc::new(ScriptedReasoner::new(
            vec![],
            ScriptedReply::Failure("connection refused".to_string()),
        ));
        let sink = Arc::new(MemorySink::new());
        let verifier = VerifierAgent::new(reasoner, sink.clone(), "TERMINATE");

        let judgment = verifier.verify("Solution (LaTeX): 4.0", &memory_with("2 + 2")).await;

        assert!(judgment.text.starts_with("Verifier API error:"));
        assert!(judgment.text.contains("connection refused"));
        assert!(!judgment.contains_marker("TERMINATE"));
        assert_eq!(sink.lines(), vec![judgment.text.clone()]);
    }
}
