use async_trait::async_trait;
use thiserror::Error;

use crate::tools::ToolSpec;
use crate::transcript::{ToolCall, Turn};

/// One assistant step returned by the completion capability: either a final
/// natural-language answer, or a batch of requested tool calls (possibly
/// with interim content).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistantStep {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The service was reachable but transiently unavailable; callers
    /// degrade instead of retrying within the same request.
    #[error("completion service unavailable: {0}")]
    Transient(String),
    #[error("completion request rejected: {0}")]
    Rejected(String),
    #[error("completion response malformed: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Submits the transcript plus declared tool specs with automatic tool
    /// choice. The model, not the caller, decides which tools to invoke.
    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<AssistantStep, CompletionError>;
}
