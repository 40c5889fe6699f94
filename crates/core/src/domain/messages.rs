use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::risk::RiskLevel;

/// Inbound chat message from an employee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl ChatRequest {
    /// Session key used to look up the conversation transcript:
    /// conversation id when present, user id otherwise.
    pub fn session_key(&self) -> &str {
        self.conversation_id.as_deref().unwrap_or(&self.user_id)
    }
}

/// Sentiment label produced by the external sentiment capability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
    Mixed,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
            Self::Mixed => "Mixed",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally visible result of one processed message.
/// Created once per request; owned by the caller after return.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub is_safe: bool,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub actions_taken: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_component: Option<serde_json::Value>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>, is_safe: bool) -> Self {
        Self {
            response: response.into(),
            is_safe,
            sentiment: Sentiment::Neutral,
            risk_level: RiskLevel::Low,
            actions_taken: Vec::new(),
            ui_component: None,
            next_steps: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn with_risk(mut self, level: RiskLevel, actions: Vec<String>) -> Self {
        self.risk_level = level;
        self.actions_taken = actions;
        self
    }
}

/// Companion response shape for the voice endpoint: identical pipeline
/// result plus the transcription and a synthesized audio encoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceResponse {
    pub response: String,
    pub user_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_audio_base64: Option<String>,
    pub is_safe: bool,
    pub sentiment: Sentiment,
    pub risk_level: RiskLevel,
    pub conversation_id: String,
}

#[cfg(test)]
mod tests {
    use super::{ChatRequest, ChatResponse, Sentiment};
    use crate::domain::risk::RiskLevel;

    #[test]
    fn session_key_prefers_conversation_id() {
        let request = ChatRequest {
            user_id: "emp-7".to_string(),
            message: "hello".to_string(),
            conversation_id: Some("conv-42".to_string()),
        };
        assert_eq!(request.session_key(), "conv-42");
    }

    #[test]
    fn session_key_falls_back_to_user_id() {
        let request = ChatRequest {
            user_id: "emp-7".to_string(),
            message: "hello".to_string(),
            conversation_id: None,
        };
        assert_eq!(request.session_key(), "emp-7");
    }

    #[test]
    fn response_round_trips_through_json() {
        let response = ChatResponse::new("done", true)
            .with_sentiment(Sentiment::Negative)
            .with_risk(RiskLevel::High, vec!["Contextual Analysis".to_string()]);

        let json = serde_json::to_string(&response).expect("serialize");
        let parsed: ChatResponse = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, response);
    }

    #[test]
    fn absent_ui_component_is_omitted_from_json() {
        let response = ChatResponse::new("ok", true);
        let json = serde_json::to_string(&response).expect("serialize");
        assert!(!json.contains("ui_component"));
    }
}
