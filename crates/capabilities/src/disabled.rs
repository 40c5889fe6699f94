//! Stand-in for capabilities with no endpoint configured. Every call fails
//! with `NotConfigured`, which the engine already degrades on: the safety
//! gate fails open, tools render an unavailable message, and the voice route
//! answers that it could not hear.

use async_trait::async_trait;

use deskd_agent::capabilities::{
    AutomationOutcome, AutomationRunner, EmployeeDirectory, EscalationNotice, EscalationNotifier,
    KnowledgeIndex, KnowledgeSnippet, SentimentAnalyzer, SpeechSynthesizer, SpeechTranscriber,
    WorkloadProfile,
};
use deskd_agent::safety::{Moderation, ModerationAnalysis};
use deskd_core::domain::messages::Sentiment;
use deskd_core::errors::CapabilityError;

pub struct Disabled {
    capability: &'static str,
}

impl Disabled {
    pub fn new(capability: &'static str) -> Self {
        Self { capability }
    }

    fn error(&self) -> CapabilityError {
        CapabilityError::NotConfigured(self.capability.to_string())
    }
}

#[async_trait]
impl Moderation for Disabled {
    async fn classify(&self, _text: &str) -> Result<ModerationAnalysis, CapabilityError> {
        Err(self.error())
    }
}

#[async_trait]
impl SentimentAnalyzer for Disabled {
    async fn analyze(&self, _text: &str) -> Result<Sentiment, CapabilityError> {
        Err(self.error())
    }
}

#[async_trait]
impl KnowledgeIndex for Disabled {
    async fn query(&self, _text: &str) -> Result<Vec<KnowledgeSnippet>, CapabilityError> {
        Err(self.error())
    }
}

#[async_trait]
impl EmployeeDirectory for Disabled {
    async fn profile(&self, _identifier: &str) -> Result<WorkloadProfile, CapabilityError> {
        Err(self.error())
    }
}

#[async_trait]
impl AutomationRunner for Disabled {
    async fn run(
        &self,
        _job: &str,
        _arguments: &serde_json::Value,
    ) -> Result<AutomationOutcome, CapabilityError> {
        Err(self.error())
    }
}

#[async_trait]
impl EscalationNotifier for Disabled {
    async fn notify(&self, _notice: &EscalationNotice) -> Result<(), CapabilityError> {
        Err(self.error())
    }
}

#[async_trait]
impl SpeechTranscriber for Disabled {
    async fn transcribe(&self, _audio: &[u8]) -> Result<String, CapabilityError> {
        Err(self.error())
    }
}

#[async_trait]
impl SpeechSynthesizer for Disabled {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, CapabilityError> {
        Err(self.error())
    }
}
