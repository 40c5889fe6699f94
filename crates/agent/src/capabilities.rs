//! Abstract contracts for the external collaborators the engine consumes.
//! Implementations live outside this crate (HTTP clients, in-memory fakes).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use deskd_core::domain::messages::Sentiment;
use deskd_core::errors::CapabilityError;

#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<Sentiment, CapabilityError>;
}

/// A ranked, source-attributed snippet from the document-retrieval index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub source: String,
    pub content: String,
    pub relevance: f64,
}

#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    /// Returns snippets above the relevance floor; an empty vec means
    /// nothing relevant was found (not an error).
    async fn query(&self, text: &str) -> Result<Vec<KnowledgeSnippet>, CapabilityError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkloadProfile {
    pub identifier: String,
    pub display_name: String,
    pub weekly_hours: f64,
    pub open_tasks: u32,
    pub burnout_risk: bool,
    pub overloaded: bool,
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// `CapabilityError::NotFound` when the identifier has no profile;
    /// `Transient` when the directory itself is offline.
    async fn profile(&self, identifier: &str) -> Result<WorkloadProfile, CapabilityError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutomationOutcome {
    /// Job finished and produced output for the user.
    Completed(String),
    /// Job was still running when the polling window closed. A normal
    /// result, not an error.
    TimedOut,
}

#[async_trait]
pub trait AutomationRunner: Send + Sync {
    async fn run(
        &self,
        job: &str,
        arguments: &serde_json::Value,
    ) -> Result<AutomationOutcome, CapabilityError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationNotice {
    pub ticket_id: String,
    pub user_id: String,
    pub summary: String,
    pub priority: String,
}

#[async_trait]
pub trait EscalationNotifier: Send + Sync {
    async fn notify(&self, notice: &EscalationNotice) -> Result<(), CapabilityError>;
}

#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, CapabilityError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, CapabilityError>;
}
