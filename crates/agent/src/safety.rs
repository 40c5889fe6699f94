use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use deskd_core::errors::CapabilityError;

/// One category scored by the moderation capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: String,
    pub severity: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModerationAnalysis {
    pub categories: Vec<CategoryScore>,
}

#[async_trait]
pub trait Moderation: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ModerationAnalysis, CapabilityError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SafetyVerdict {
    pub safe: bool,
    pub reason: String,
}

/// Pre-processing gate in front of the whole pipeline.
///
/// A category counts as a violation only when its severity exceeds the
/// configured cutoff, so benign messages with low-severity matches pass.
/// When the capability itself fails the gate fails open: the message is
/// allowed through with a reason saying the analysis could not run.
pub struct SafetyGate {
    moderation: std::sync::Arc<dyn Moderation>,
    severity_cutoff: u8,
}

impl SafetyGate {
    pub fn new(moderation: std::sync::Arc<dyn Moderation>, severity_cutoff: u8) -> Self {
        Self { moderation, severity_cutoff }
    }

    pub async fn check(&self, text: &str) -> SafetyVerdict {
        match self.moderation.classify(text).await {
            Ok(analysis) => {
                let violations: Vec<&CategoryScore> = analysis
                    .categories
                    .iter()
                    .filter(|score| score.severity > self.severity_cutoff)
                    .collect();

                if violations.is_empty() {
                    SafetyVerdict { safe: true, reason: "content analysis passed".to_string() }
                } else {
                    let flagged = violations
                        .iter()
                        .map(|score| score.category.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    tracing::warn!(
                        event_name = "agent.safety.blocked",
                        categories = %flagged,
                        "message blocked by safety gate"
                    );
                    SafetyVerdict { safe: false, reason: format!("content flagged: {flagged}") }
                }
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "agent.safety.fail_open",
                    error = %error,
                    "moderation capability unavailable, failing open"
                );
                SafetyVerdict {
                    safe: true,
                    reason: "content analysis could not run".to_string(),
                }
            }
        }
    }
}
