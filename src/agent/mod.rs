//! Agents and the round-robin orchestrator
//!
//! PROBLEM → SOLVE → VERIFY → TERMINATE | RETRY | ABORT

pub mod orchestrator;

pub use orchestrator::{is_exit_command, Orchestrator, ProtocolState};

use async_trait::async_trait;

/// A participant in the round-robin dialogue. Each turn takes one input
/// and always produces an output; failures are part of the output.
#[async_trait]
pub trait Agent: Send + Sync {
    type Input: Send + 'static;
    type Output: Send;

    fn name(&self) -> &'static str;

    async fn process(&self, input: Self::Input) -> Self::Output;
}
