//! HTTP surface: the chat endpoint, its voice companion, and health.
//!
//! The voice route is the same pipeline with speech stages bolted on: audio
//! is transcribed externally, the transcription runs through the
//! orchestrator unchanged, and the reply is markdown-stripped before it is
//! synthesized back to audio.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use deskd_agent::capabilities::{SpeechSynthesizer, SpeechTranscriber};
use deskd_agent::Orchestrator;
use deskd_core::domain::messages::{ChatRequest, ChatResponse, Sentiment, VoiceResponse};
use deskd_core::domain::risk::RiskLevel;
use deskd_db::DbPool;

use crate::health;

pub const COULD_NOT_HEAR_TEXT: &str =
    "I'm sorry, I couldn't hear that clearly. Could you try recording your message again?";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub transcriber: Arc<dyn SpeechTranscriber>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    error: String,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: message.into() }))
}

pub fn router(state: AppState, db_pool: DbPool) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/voice", post(chat_voice))
        .with_state(state)
        .merge(health::router(db_pool))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ApiError>)> {
    if request.user_id.trim().is_empty() {
        return Err(bad_request("user_id must not be empty"));
    }

    Ok(Json(state.orchestrator.handle(&request).await))
}

pub async fn chat_voice(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VoiceResponse>, (StatusCode, Json<ApiError>)> {
    let mut user_id: Option<String> = None;
    let mut conversation_id: Option<String> = None;
    let mut audio: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| bad_request(format!("malformed multipart body: {error}")))?
    {
        match field.name() {
            Some("user_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|error| bad_request(format!("invalid user_id field: {error}")))?;
                user_id = Some(value);
            }
            Some("conversation_id") => {
                let value = field.text().await.map_err(|error| {
                    bad_request(format!("invalid conversation_id field: {error}"))
                })?;
                if !value.trim().is_empty() {
                    conversation_id = Some(value);
                }
            }
            Some("file") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|error| bad_request(format!("invalid file field: {error}")))?;
                audio = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let user_id = user_id
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| bad_request("user_id field is required"))?;
    let audio = audio.ok_or_else(|| bad_request("file field is required"))?;

    // Callers without an existing conversation get a server-generated id so
    // follow-up recordings land in the same transcript.
    let conversation_id = conversation_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let user_text = match state.transcriber.transcribe(&audio).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => return Ok(Json(could_not_hear(conversation_id))),
        Err(transcribe_error) => {
            warn!(
                event_name = "server.voice.transcription_failed",
                user_id = %user_id,
                conversation_id = %conversation_id,
                error = %transcribe_error,
                "transcription unavailable, skipping the pipeline"
            );
            return Ok(Json(could_not_hear(conversation_id)));
        }
    };

    let request = ChatRequest {
        user_id,
        message: user_text.clone(),
        conversation_id: Some(conversation_id.clone()),
    };
    let chat = state.orchestrator.handle(&request).await;

    let spoken = strip_markdown(&chat.response);
    let ai_audio_base64 = match state.synthesizer.synthesize(&spoken).await {
        Ok(bytes) => Some(BASE64.encode(bytes)),
        Err(synth_error) => {
            warn!(
                event_name = "server.voice.synthesis_failed",
                conversation_id = %conversation_id,
                error = %synth_error,
                "synthesis unavailable, returning text only"
            );
            None
        }
    };

    Ok(Json(VoiceResponse {
        response: chat.response,
        user_text,
        ai_audio_base64,
        is_safe: chat.is_safe,
        sentiment: chat.sentiment,
        risk_level: chat.risk_level,
        conversation_id,
    }))
}

fn could_not_hear(conversation_id: String) -> VoiceResponse {
    VoiceResponse {
        response: COULD_NOT_HEAR_TEXT.to_string(),
        user_text: String::new(),
        ai_audio_base64: None,
        is_safe: true,
        sentiment: Sentiment::Neutral,
        risk_level: RiskLevel::Low,
        conversation_id,
    }
}

/// Flattens markdown links `[label](url)` to their label, keeping an
/// unmatched `[` as-is.
fn strip_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        if let Some(separator) = rest[open..].find("](") {
            let label_end = open + separator;
            if let Some(close) = rest[label_end + 2..].find(')') {
                out.push_str(&rest[..open]);
                out.push_str(&rest[open + 1..label_end]);
                rest = &rest[label_end + 2 + close + 1..];
                continue;
            }
        }
        out.push_str(&rest[..=open]);
        rest = &rest[open + 1..];
    }

    out.push_str(rest);
    out
}

/// Reduces markdown to speakable text: links become their labels, heading
/// markers are dropped, and emphasis/code markers are removed.
pub fn strip_markdown(text: &str) -> String {
    let without_links = strip_links(text);
    let mut out = String::with_capacity(without_links.len());

    for (index, line) in without_links.lines().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let trimmed = line.trim_start();
        let line = if trimmed.starts_with('#') {
            trimmed.trim_start_matches('#').trim_start()
        } else {
            line
        };
        out.extend(line.chars().filter(|ch| !matches!(ch, '*' | '`' | '~')));
    }

    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use deskd_agent::llm::{AssistantStep, ChatCompletion, CompletionError};
    use deskd_agent::orchestrator::GREETING_TEXT;
    use deskd_agent::safety::SafetyGate;
    use deskd_agent::session::SessionStore;
    use deskd_agent::tool_loop::ToolLoop;
    use deskd_agent::tools::{StandardTools, ToolSpec};
    use deskd_agent::transcript::Turn;
    use deskd_agent::{IntentDetector, Orchestrator};
    use deskd_capabilities::Disabled;
    use deskd_core::audit::InMemoryAuditSink;
    use deskd_core::config::SessionConfig;
    use deskd_core::domain::messages::ChatRequest;
    use deskd_db::repositories::InMemoryTicketRepository;

    use axum::extract::State;
    use axum::response::Json;

    use super::{chat, could_not_hear, strip_markdown, AppState, COULD_NOT_HEAR_TEXT};

    struct FixedCompletion(&'static str);

    #[async_trait]
    impl ChatCompletion for FixedCompletion {
        async fn complete(
            &self,
            _turns: &[Turn],
            _tools: &[ToolSpec],
        ) -> Result<AssistantStep, CompletionError> {
            Ok(AssistantStep { content: Some(self.0.to_string()), tool_calls: Vec::new() })
        }
    }

    fn state(answer: &'static str) -> AppState {
        let tools = StandardTools {
            directory: Arc::new(Disabled::new("directory")),
            index: Arc::new(Disabled::new("search")),
            runner: Arc::new(Disabled::new("automation")),
            notifier: Arc::new(Disabled::new("escalation webhook")),
            tickets: Arc::new(InMemoryTicketRepository::default()),
        };
        let orchestrator = Orchestrator::new(
            SessionStore::new(&SessionConfig { idle_ttl_secs: 3600, max_sessions: 100 }),
            SafetyGate::new(Arc::new(Disabled::new("moderation")), 2),
            IntentDetector::new().expect("patterns compile"),
            ToolLoop::new(Arc::new(FixedCompletion(answer)), 8),
            Arc::new(tools),
            None,
            Arc::new(InMemoryAuditSink::default()),
        );

        AppState {
            orchestrator: Arc::new(orchestrator),
            transcriber: Arc::new(Disabled::new("speech")),
            synthesizer: Arc::new(Disabled::new("speech")),
        }
    }

    #[tokio::test]
    async fn chat_endpoint_returns_the_pipeline_answer() {
        let request = ChatRequest {
            user_id: "emp-1".to_string(),
            message: "my vpn keeps disconnecting".to_string(),
            conversation_id: Some("conv-1".to_string()),
        };

        let Json(response) =
            chat(State(state("Let's check your vpn settings.")), Json(request))
                .await
                .expect("chat succeeds");

        assert_eq!(response.response, "Let's check your vpn settings.");
        assert!(response.is_safe);
    }

    #[tokio::test]
    async fn chat_endpoint_greets_on_noise_input() {
        let request = ChatRequest {
            user_id: "emp-1".to_string(),
            message: "h".to_string(),
            conversation_id: None,
        };

        let Json(response) =
            chat(State(state("unused")), Json(request)).await.expect("chat succeeds");

        assert_eq!(response.response, GREETING_TEXT);
    }

    #[tokio::test]
    async fn chat_endpoint_rejects_blank_user_id() {
        let request = ChatRequest {
            user_id: "   ".to_string(),
            message: "hello".to_string(),
            conversation_id: None,
        };

        assert!(chat(State(state("unused")), Json(request)).await.is_err());
    }

    #[test]
    fn could_not_hear_is_safe_and_low_risk() {
        let response = could_not_hear("conv-9".to_string());
        assert_eq!(response.response, COULD_NOT_HEAR_TEXT);
        assert!(response.is_safe);
        assert!(response.ai_audio_base64.is_none());
        assert_eq!(response.conversation_id, "conv-9");
    }

    #[test]
    fn strip_markdown_flattens_formatting() {
        assert_eq!(strip_markdown("**bold** and *italic*"), "bold and italic");
        assert_eq!(strip_markdown("`code` stays as words"), "code stays as words");
        assert_eq!(strip_markdown("## Heading\nbody"), "Heading\nbody");
        assert_eq!(
            strip_markdown("see [the guide](https://kb.example.test/vpn) for steps"),
            "see the guide for steps"
        );
    }

    #[test]
    fn strip_markdown_keeps_plain_brackets() {
        assert_eq!(strip_markdown("array[0] is fine"), "array[0] is fine");
    }
}
