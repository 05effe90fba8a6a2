//! Round-robin orchestrator
//!
//! Drives each problem through solve and verify turns until the verifier's
//! judgment carries the termination marker or the solver fails. Retries
//! resend the unchanged problem; the verifier's critique is not fed back.

use crate::agent::Agent;
use crate::audit::{compute_problem_hash, AuditLog};
use crate::config::TutorConfig;
use crate::error::OrchestrationError;
use crate::memory::SessionMemory;
use crate::models::{
    CompositeMessage, OutcomeStatus, ProblemOutcome, RoundRecord, SessionSummary, SolveResult,
    Verdict,
};
use crate::output::OutputSink;
use crate::reasoning::ReasoningService;
use crate::solver::SolverAgent;
use crate::symbolic::SymbolicSolver;
use crate::verification::{VerificationRequest, VerifierAgent};
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const EXIT_KEYWORDS: &[&str] = &["exit", "quit"];

const WELCOME: &str = "Welcome to the Smart Math Tutor! Type your math problem, or 'exit' to quit.";
const PROMPT: &str = "\nEnter math problem > ";
const GOODBYE: &str = "Goodbye!";

/// Per-problem protocol state. Rounds are numbered from 1.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolState {
    AwaitProblem,
    Solving { round: u32 },
    Verifying { round: u32, solution_latex: String },
    Retrying { round: u32 },
    Terminated { round: u32 },
    Aborted { round: u32, error: String },
    RoundLimitReached { round: u32 },
}

impl ProtocolState {
    /// Final status of the problem, `None` while it is still in progress
    pub fn outcome(&self) -> Option<OutcomeStatus> {
        match self {
            ProtocolState::Terminated { .. } => Some(OutcomeStatus::Verified),
            ProtocolState::Aborted { error, .. } => Some(OutcomeStatus::Aborted {
                error: error.clone(),
            }),
            ProtocolState::RoundLimitReached { .. } => Some(OutcomeStatus::RoundLimitReached),
            _ => None,
        }
    }

    pub fn round(&self) -> Option<u32> {
        match self {
            ProtocolState::AwaitProblem => None,
            ProtocolState::Solving { round }
            | ProtocolState::Verifying { round, .. }
            | ProtocolState::Retrying { round }
            | ProtocolState::Terminated { round }
            | ProtocolState::Aborted { round, .. }
            | ProtocolState::RoundLimitReached { round } => Some(*round),
        }
    }
}

/// `exit` or `quit`, ignoring case and surrounding whitespace
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_KEYWORDS.iter().any(|kw| line.eq_ignore_ascii_case(kw))
}

pub struct Orchestrator {
    solver: SolverAgent,
    verifier: VerifierAgent,
    audit_log: AuditLog,
    output: Arc<dyn OutputSink>,
    max_rounds: Option<u32>,
}

impl Orchestrator {
    pub fn new(
        symbolic: Arc<dyn SymbolicSolver>,
        reasoner: Arc<dyn ReasoningService>,
        output: Arc<dyn OutputSink>,
        config: &TutorConfig,
    ) -> Self {
        Self {
            solver: SolverAgent::new(symbolic, output.clone()),
            verifier: VerifierAgent::new(
                reasoner,
                output.clone(),
                config.termination_marker.as_str(),
            ),
            audit_log: AuditLog::new(),
            output,
            max_rounds: config.max_rounds,
        }
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit_log
    }

    /// Perform one protocol transition for `problem`. Final states map to themselves.
    pub async fn advance(
        &self,
        state: ProtocolState,
        problem: &str,
        memory: &SessionMemory,
        rounds: &mut Vec<RoundRecord>,
    ) -> ProtocolState {
        match state {
            ProtocolState::AwaitProblem => ProtocolState::Solving { round: 1 },

            ProtocolState::Solving { round } => {
                self.output.emit(&format!("\n--- Round {} ---", round));
                debug!(round, agent = self.solver.name(), "Agent turn");

                match self.solver.process(problem.to_string()).await {
                    SolveResult::Error { message } => {
                        warn!(round, error = %message, "Solver failed, aborting problem");
                        ProtocolState::Aborted {
                            round,
                            error: message,
                        }
                    }
                    result => {
                        let solution_latex = result.latex().unwrap_or_default().to_string();
                        self.output
                            .emit(&format!("Solver proposed solution: {}", solution_latex));
                        ProtocolState::Verifying {
                            round,
                            solution_latex,
                        }
                    }
                }
            }

            ProtocolState::Verifying {
                round,
                solution_latex,
            } => {
                let composite = CompositeMessage::new(problem, solution_latex.as_str());
                let judgment = self
                    .verifier
                    .process(VerificationRequest {
                        composite: composite.to_string(),
                        memory: memory.clone(),
                    })
                    .await;
                debug!(round, agent = self.verifier.name(), "Agent turn");
                self.output
                    .emit(&format!("Verifier response: {}", judgment.text));

                let accepted = judgment.contains_marker(self.verifier.termination_marker());
                rounds.push(RoundRecord {
                    round,
                    solution_latex,
                    judgment: judgment.text,
                    verdict: if accepted {
                        Verdict::Accepted
                    } else {
                        Verdict::Rejected
                    },
                });

                if accepted {
                    self.output.emit("✅ Solution verified! Ending session.");
                    ProtocolState::Terminated { round }
                } else {
                    warn!(round, "Verifier did not accept the solution");
                    self.output.emit("⚠ Verifier found issues. Re-solving...");
                    ProtocolState::Retrying { round }
                }
            }

            ProtocolState::Retrying { round } => match self.max_rounds {
                Some(max) if round >= max => {
                    self.output.emit(&format!(
                        "⚠ No verified solution after {} rounds. Moving on.",
                        round
                    ));
                    ProtocolState::RoundLimitReached { round }
                }
                _ => ProtocolState::Solving { round: round + 1 },
            },

            terminal => terminal,
        }
    }

    /// Run one problem to a final state and record it in the audit log
    pub async fn run_problem(
        &self,
        problem: &str,
        memory: &mut SessionMemory,
    ) -> Result<ProblemOutcome> {
        memory.remember_problem(problem);

        let audit_id = Uuid::new_v4();
        let started_at = Utc::now();

        info!(
            audit_id = ?audit_id,
            problem = %problem,
            problem_number = memory.problems_seen(),
            "Orchestrator: new problem"
        );

        let mut rounds = Vec::new();
        let mut state = ProtocolState::AwaitProblem;

        let status = loop {
            state = self.advance(state, problem, memory, &mut rounds).await;
            debug!(audit_id = ?audit_id, round = ?state.round(), "Protocol transition");

            if let Some(status) = state.outcome() {
                break status;
            }
        };

        let outcome = ProblemOutcome {
            audit_id,
            problem: problem.to_string(),
            problem_hash: compute_problem_hash(problem),
            status,
            rounds,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            audit_id = ?audit_id,
            status = %outcome.status,
            rounds = outcome.rounds_taken(),
            "Orchestrator: problem finished"
        );

        self.audit_log.record(outcome.clone()).await?;
        if !self.audit_log.verify_integrity(audit_id).await? {
            warn!(audit_id = ?audit_id, "Audit record failed integrity check");
        }
        Ok(outcome)
    }

    /// Interactive loop: read problems line by line until an exit keyword
    /// or end of input. Lines that are not valid UTF-8 are decoded lossily
    /// and treated as problems like any other.
    pub async fn run_session<R>(&self, mut input: R) -> Result<SessionSummary>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        self.output.emit(WELCOME);

        let mut buf = Vec::new();
        let mut memory = SessionMemory::new();
        let mut summary = SessionSummary::default();

        loop {
            self.output.prompt(PROMPT);

            buf.clear();
            let read = input
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| OrchestrationError::InputError(e.to_string()))?;
            if read == 0 {
                debug!("Input closed");
                self.output.emit(GOODBYE);
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            let problem = line.trim();
            if is_exit_command(problem) {
                self.output.emit(GOODBYE);
                break;
            }

            let outcome = self.run_problem(problem, &mut memory).await?;
            summary.tally(&outcome.status);
        }

        info!(
            problems = summary.problems,
            verified = summary.verified,
            aborted = summary.aborted,
            round_limited = summary.round_limited,
            "Session finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemorySink;
    use crate::reasoning::{ScriptedReasoner, ScriptedReply};
    use crate::symbolic::MathEngine;
    use std::sync::Mutex;

    /// Records every problem it is asked to solve
    #[derive(Default)]
    struct CountingSolver {
        seen: Mutex<Vec<String>>,
    }

    impl CountingSolver {
        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl SymbolicSolver for CountingSolver {
        fn solve(&self, problem: &str) -> SolveResult {
            let mut seen = self.seen.lock().unwrap();
            seen.push(problem.to_string());
            SolveResult::Arithmetic {
                value: 4.0,
                latex: "4.0".to_string(),
            }
        }
    }

    fn orchestrator(
        solver: Arc<dyn SymbolicSolver>,
        reasoner: Arc<ScriptedReasoner>,
        config: TutorConfig,
    ) -> (Orchestrator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let orchestrator = Orchestrator::new(solver, reasoner, sink.clone(), &config);
        (orchestrator, sink)
    }

    fn round_numbers(outcome: &ProblemOutcome) -> Vec<u32> {
        outcome.rounds.iter().map(|r| r.round).collect()
    }

    #[tokio::test]
    async fn test_rejection_retries_unchanged_problem() {
        let reasoner = Arc::new(ScriptedReasoner::sequence([
            "No, the sign is wrong.",
            "Yes, this is correct. TERMINATE",
        ]));
        let (orchestrator, sink) = orchestrator(
            Arc::new(MathEngine::new()),
            reasoner.clone(),
            TutorConfig::default(),
        );

        let mut memory = SessionMemory::new();
        let outcome = orchestrator
            .run_problem("differentiate sin(x)", &mut memory)
            .await
            .unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Verified);
        assert_eq!(round_numbers(&outcome), vec![1, 2]);
        assert_eq!(outcome.rounds[0].verdict, Verdict::Rejected);
        assert_eq!(outcome.rounds[1].verdict, Verdict::Accepted);

        let prompts = reasoner.prompts().await;
        assert_eq!(prompts.len(), 2);
        for prompt in prompts {
            assert!(prompt.contains("differentiate sin(x)"));
            assert!(prompt.contains(r"\cos{\left(x \right)}"));
        }

        assert!(sink.contains("--- Round 1 ---"));
        assert!(sink.contains("--- Round 2 ---"));
        assert!(sink.contains(r"Solver proposed solution: \cos{\left(x \right)}"));
        assert!(sink.contains("Verifier response: No, the sign is wrong."));
        assert!(sink.contains("⚠ Verifier found issues. Re-solving..."));
        assert!(sink.contains("✅ Solution verified! Ending session."));
    }

    #[tokio::test]
    async fn test_solver_reinvoked_once_per_round() {
        let solver = Arc::new(CountingSolver::default());
        let reasoner = Arc::new(ScriptedReasoner::sequence(["No", "No", "TERMINATE"]));
        let (orchestrator, _) =
            orchestrator(solver.clone(), reasoner, TutorConfig::default());

        let mut memory = SessionMemory::new();
        let outcome = orchestrator.run_problem("2 + 2", &mut memory).await.unwrap();

        assert_eq!(round_numbers(&outcome), vec![1, 2, 3]);
        assert_eq!(solver.seen(), vec!["2 + 2"; 3]);
        assert_eq!(memory.current_problem(), "2 + 2");
        assert_eq!(memory.problems_seen(), 1);
    }

    #[tokio::test]
    async fn test_solver_error_aborts_without_verification() {
        let reasoner = Arc::new(ScriptedReasoner::always("TERMINATE"));
        let (orchestrator, sink) = orchestrator(
            Arc::new(MathEngine::new()),
            reasoner.clone(),
            TutorConfig::default(),
        );

        let mut memory = SessionMemory::new();
        let outcome = orchestrator
            .run_problem("Find the derivative of sin(x).", &mut memory)
            .await
            .unwrap();

        assert!(matches!(outcome.status, OutcomeStatus::Aborted { .. }));
        assert!(outcome.rounds.is_empty());
        assert_eq!(outcome.rounds_taken(), 1);
        assert_eq!(reasoner.calls().await, 0);
        assert!(sink.contains("Solver Error: "));
        assert!(!sink.contains("Solver proposed solution"));
    }

    #[tokio::test]
    async fn test_service_failure_triggers_retry() {
        let reasoner = Arc::new(ScriptedReasoner::new(
            vec![ScriptedReply::Failure("service unavailable".to_string())],
            ScriptedReply::Text("Yes. TERMINATE".to_string()),
        ));
        let (orchestrator, _) = orchestrator(
            Arc::new(MathEngine::new()),
            reasoner,
            TutorConfig::default(),
        );

        let mut memory = SessionMemory::new();
        let outcome = orchestrator.run_problem("2 + 2", &mut memory).await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::Verified);
        assert_eq!(round_numbers(&outcome), vec![1, 2]);
        assert!(outcome.rounds[0].judgment.starts_with("Verifier API error:"));
    }

    #[tokio::test]
    async fn test_only_the_configured_marker_terminates() {
        let reasoner = Arc::new(ScriptedReasoner::sequence([
            "Yes. TERMINATE",
            "yes. done",
            "Yes. DONE",
        ]));
        let config = TutorConfig {
            termination_marker: "DONE".to_string(),
            ..TutorConfig::default()
        };
        let (orchestrator, _) = orchestrator(Arc::new(MathEngine::new()), reasoner, config);

        let mut memory = SessionMemory::new();
        let outcome = orchestrator.run_problem("2 + 2", &mut memory).await.unwrap();

        assert_eq!(round_numbers(&outcome), vec![1, 2, 3]);
        assert_eq!(outcome.rounds[2].verdict, Verdict::Accepted);
    }

    #[tokio::test]
    async fn test_round_limit_stops_retrying() {
        let reasoner = Arc::new(ScriptedReasoner::always("No."));
        let config = TutorConfig {
            max_rounds: Some(3),
            ..TutorConfig::default()
        };
        let (orchestrator, sink) =
            orchestrator(Arc::new(MathEngine::new()), reasoner.clone(), config);

        let mut memory = SessionMemory::new();
        let outcome = orchestrator.run_problem("x^2 = 4", &mut memory).await.unwrap();

        assert_eq!(outcome.status, OutcomeStatus::RoundLimitReached);
        assert_eq!(round_numbers(&outcome), vec![1, 2, 3]);
        assert_eq!(reasoner.calls().await, 3);
        assert!(sink.contains("No verified solution after 3 rounds"));
    }

    #[tokio::test]
    async fn test_advance_transitions() {
        let (orchestrator, _) = orchestrator(
            Arc::new(MathEngine::new()),
            Arc::new(ScriptedReasoner::always("TERMINATE")),
            TutorConfig::default(),
        );
        let mut memory = SessionMemory::new();
        memory.remember_problem("2 + 2");
        let mut rounds = Vec::new();
        assert_eq!(orchestrator.solver.name(), "SolverAgent");
        assert_eq!(orchestrator.verifier.name(), "VerifierAgent");

        let state = orchestrator
            .advance(ProtocolState::AwaitProblem, "2 + 2", &memory, &mut rounds)
            .await;
        assert_eq!(state, ProtocolState::Solving { round: 1 });

        let state = orchestrator
            .advance(ProtocolState::Retrying { round: 4 }, "2 + 2", &memory, &mut rounds)
            .await;
        assert_eq!(state, ProtocolState::Solving { round: 5 });

        let state = orchestrator
            .advance(state, "2 + 2", &memory, &mut rounds)
            .await;
        assert_eq!(
            state,
            ProtocolState::Verifying {
                round: 5,
                solution_latex: "4.0".to_string()
            }
        );

        let state = orchestrator
            .advance(state, "2 + 2", &memory, &mut rounds)
            .await;
        assert_eq!(state, ProtocolState::Terminated { round: 5 });
        assert_eq!(state.outcome(), Some(OutcomeStatus::Verified));

        let same = orchestrator
            .advance(state.clone(), "2 + 2", &memory, &mut rounds)
            .await;
        assert_eq!(same, state);
        assert_eq!(rounds.len(), 1);
    }

    #[test]
    fn test_exit_commands() {
        for line in ["exit", "QUIT", "  Exit  ", "quit\n"] {
            assert!(is_exit_command(line), "{:?}", line);
        }
        for line in ["exit now", "q", "", "2 + 2"] {
            assert!(!is_exit_command(line), "{:?}", line);
        }
    }

    #[tokio::test]
    async fn test_session_reads_until_exit() {
        let reasoner = Arc::new(ScriptedReasoner::always("Correct. TERMINATE"));
        let (orchestrator, sink) = orchestrator(
            Arc::new(MathEngine::new()),
            reasoner,
            TutorConfig::default(),
        );

        let input = tokio_test::io::Builder::new()
            .read(b"2 + 2\nx^2 = 4\n  Quit \nnever read\n")
            .build();
        let summary = orchestrator
            .run_session(tokio::io::BufReader::new(input))
            .await
            .unwrap();

        assert_eq!(summary.problems, 2);
        assert_eq!(summary.verified, 2);
        assert_eq!(orchestrator.audit_log().list().await.unwrap().len(), 2);

        let lines = sink.lines();
        assert_eq!(lines.first().map(String::as_str), Some(WELCOME));
        assert_eq!(lines.last().map(String::as_str), Some(GOODBYE));
        assert_eq!(sink.prompts().len(), 3);
        assert!(!sink.contains("never read"));
    }

    #[tokio::test]
    async fn test_session_resets_rounds_per_problem_and_ends_at_eof() {
        let reasoner = Arc::new(ScriptedReasoner::sequence(["No", "TERMINATE"]));
        let (orchestrator, sink) = orchestrator(
            Arc::new(MathEngine::new()),
            reasoner.clone(),
            TutorConfig::default(),
        );

        let summary = orchestrator
            .run_session(&b"x^2 = 4\nbad (\n2 + 2"[..])
            .await
            .unwrap();

        assert_eq!(summary.problems, 3);
        assert_eq!(summary.verified, 2);
        assert_eq!(summary.aborted, 1);

        let outcomes = orchestrator.audit_log().list().await.unwrap();
        assert_eq!(outcomes[0].problem, "x^2 = 4");
        assert_eq!(round_numbers(&outcomes[0]), vec![1, 2]);
        assert_eq!(outcomes[1].rounds_taken(), 1);
        assert_eq!(round_numbers(&outcomes[2]), vec![1]);

        let prompts = reasoner.prompts().await;
        assert_eq!(prompts.len(), 3);
        assert!(prompts[2].contains("2 + 2"));
        assert_eq!(sink.lines().last().map(String::as_str), Some(GOODBYE));
    }

    #[tokio::test]
    async fn test_session_survives_invalid_utf8_line() {
        let reasoner = Arc::new(ScriptedReasoner::always("TERMINATE"));
        let (orchestrator, sink) = orchestrator(
            Arc::new(MathEngine::new()),
            reasoner.clone(),
            TutorConfig::default(),
        );

        let summary = orchestrator
            .run_session(&b"\xff\xfe\n2 + 2\n"[..])
            .await
            .unwrap();

        assert_eq!(summary.problems, 2);
        assert_eq!(summary.aborted, 1);
        assert_eq!(summary.verified, 1);
        assert_eq!(reasoner.calls().await, 1);
        assert!(sink.contains("Solver proposed solution: 4.0"));
        assert_eq!(sink.lines().last().map(String::as_str), Some(GOODBYE));
    }
}
