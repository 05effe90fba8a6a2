//! Reasoning service seam used by the verifier
//!
//! `GeminiClient` is the production implementation. `ScriptedReasoner`
//! replays queued replies for tests and offline runs.

use crate::error::OrchestrationError;
use crate::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// One prompt in, one full-text reply out
#[async_trait]
pub trait ReasoningService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Queued reply: text, or a failure carrying its message
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Failure(String),
}

/// Replays scripted replies in order and records every prompt
pub struct ScriptedReasoner {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
    fallback: ScriptedReply,
}

impl ScriptedReasoner {
    /// Once the queue is empty every call returns `fallback`
    pub fn new(replies: Vec<ScriptedReply>, fallback: ScriptedReply) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            fallback,
        }
    }

    /// Always answers with the same text
    pub fn always(text: impl Into<String>) -> Self {
        Self::new(Vec::new(), ScriptedReply::Text(text.into()))
    }

    /// Replies with `texts` in order, then with the last one forever
    pub fn sequence<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let replies: Vec<ScriptedReply> = texts
            .into_iter()
            .map(|t| ScriptedReply::Text(t.into()))
            .collect();
        let fallback = replies
            .last()
            .cloned()
            .unwrap_or_else(|| ScriptedReply::Text(String::new()));
        Self::new(replies, fallback)
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn calls(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoner {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().await.push(prompt.to_string());

        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            ScriptedReply::Text(text) => Ok(text),
            ScriptedReply::Failure(message) => Err(OrchestrationError::LlmError(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequence_then_repeats_last() {
        let reasoner = ScriptedReasoner::sequence(["No", "Yes. TERMINATE"]);

        assert_eq!(reasoner.generate("a").await.unwrap(), "No");
        assert_eq!(reasoner.generate("b").await.unwrap(), "Yes. TERMINATE");
        assert_eq!(reasoner.generate("c").await.unwrap(), "Yes. TERMINATE");
        assert_eq!(reasoner.prompts().await, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failure_reply() {
        let reasoner = ScriptedReasoner::new(
            vec![ScriptedReply::Failure("quota exceeded".to_string())],
            ScriptedReply::Text("ok".to_string()),
        );

        let err = reasoner.generate("p").await.unwrap_err();
        assert_eq!(err.to_string(), "LLM error: quota exceeded");
        assert_eq!(reasoner.generate("p").await.unwrap(), "ok");
        assert_eq!(reasoner.calls().await, 2);
    }
}
