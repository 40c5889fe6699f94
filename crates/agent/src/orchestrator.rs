use std::sync::Arc;

use deskd_core::audit::{AuditRecord, AuditSink, SafetyOutcome};
use deskd_core::domain::messages::{ChatRequest, ChatResponse, Sentiment};
use deskd_core::domain::risk::{RiskAssessment, RiskLevel};

use crate::capabilities::SentimentAnalyzer;
use crate::intent::IntentDetector;
use crate::llm::CompletionError;
use crate::payload::extract_ui_payload;
use crate::risk;
use crate::risk::CONTEXTUAL_ANALYSIS_ACTION;
use crate::safety::SafetyGate;
use crate::session::SessionStore;
use crate::tool_loop::ToolLoop;
use crate::tools::ToolProvider;
use crate::transcript::Turn;

pub const GREETING_TEXT: &str =
    "Hello! I'm deskd, your support assistant. How can I help you today?";
pub const REJECTION_TEXT: &str =
    "I'm sorry, but I can't help with that request. If you believe this is a mistake, \
     please contact the support team directly.";
pub const DEGRADED_TEXT: &str =
    "I'm having trouble reaching the assistant service right now. Your message was \
     received; please try again in a moment.";
pub const INTERNAL_ERROR_TEXT: &str =
    "Something went wrong while processing your message. Please try again.";
pub const BLOCKED_ACTION: &str = "Blocked by Safety Gate";
pub const NEXT_STEP_AWAIT_FEEDBACK: &str = "Await user feedback";

/// Composes the whole pipeline for one inbound message. Never returns an
/// error: every failure mode maps to a response shape.
pub struct Orchestrator {
    sessions: SessionStore,
    gate: SafetyGate,
    detector: IntentDetector,
    tool_loop: ToolLoop,
    tools: Arc<dyn ToolProvider>,
    sentiment: Option<Arc<dyn SentimentAnalyzer>>,
    audit: Arc<dyn AuditSink>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: SessionStore,
        gate: SafetyGate,
        detector: IntentDetector,
        tool_loop: ToolLoop,
        tools: Arc<dyn ToolProvider>,
        sentiment: Option<Arc<dyn SentimentAnalyzer>>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { sessions, gate, detector, tool_loop, tools, sentiment, audit }
    }

    pub async fn handle(&self, request: &ChatRequest) -> ChatResponse {
        let message = request.message.trim();
        let session_key = request.session_key().to_string();

        // Noise filter: nothing to triage, answer with the greeting and
        // touch neither the safety gate nor the session. The greeting is
        // still a delivered response, so it gets an audit record.
        if message.chars().count() < 2 {
            tracing::debug!(
                event_name = "agent.orchestrator.noise_filtered",
                user_id = %request.user_id,
                "message below noise threshold"
            );
            let response = ChatResponse::new(GREETING_TEXT, true)
                .with_risk(RiskLevel::Low, vec![CONTEXTUAL_ANALYSIS_ACTION.to_string()]);
            self.emit_audit(request, &session_key, &response, SafetyOutcome::Pass);
            return response;
        }

        let verdict = self.gate.check(message).await;
        if !verdict.safe {
            tracing::warn!(
                event_name = "agent.orchestrator.rejected",
                user_id = %request.user_id,
                session_key = %session_key,
                reason = %verdict.reason,
                "message rejected by safety gate"
            );
            let response = ChatResponse::new(REJECTION_TEXT, false)
                .with_sentiment(Sentiment::Negative)
                .with_risk(RiskLevel::High, vec![BLOCKED_ACTION.to_string()]);
            self.emit_audit(request, &session_key, &response, SafetyOutcome::Blocked);
            return response;
        }

        let intent = self.detector.detect(message);
        tracing::info!(
            event_name = "agent.orchestrator.intent",
            user_id = %request.user_id,
            session_key = %session_key,
            needs_restart = intent.needs_restart,
            needs_upload = intent.needs_upload,
            needs_audit = intent.needs_audit,
            needs_human = intent.needs_human,
            urgency = ?intent.urgency,
            "intent signals computed"
        );

        let handle = self.sessions.get_or_create(&session_key, &request.user_id);
        let mut session = handle.lock().await;
        session.transcript.append(Turn::user(message));

        let registry = self.tools.registry_for(&request.user_id, &session_key);
        let response = match self.tool_loop.run(session.transcript.turns(), &registry).await {
            Ok(outcome) => {
                for turn in &outcome.new_turns {
                    session.transcript.append(turn.clone());
                }
                drop(session);

                let ui_payload = extract_ui_payload(&outcome.tool_turns());
                let assessment = risk::score(&intent, &outcome.final_text, &outcome.tool_calls);
                let sentiment = self.sentiment_for(message).await;

                tracing::info!(
                    event_name = "agent.orchestrator.completed",
                    user_id = %request.user_id,
                    session_key = %session_key,
                    risk_level = %assessment.level,
                    tool_calls = outcome.tool_calls.len(),
                    has_ui_payload = ui_payload.is_some(),
                    "message processed"
                );

                let mut response = ChatResponse::new(outcome.final_text, true)
                    .with_sentiment(sentiment)
                    .with_risk(assessment.level, assessment.actions);
                response.ui_component = ui_payload;
                response.next_steps = vec![NEXT_STEP_AWAIT_FEEDBACK.to_string()];
                response
            }
            Err(CompletionError::Transient(reason)) => {
                drop(session);
                tracing::warn!(
                    event_name = "agent.orchestrator.degraded",
                    user_id = %request.user_id,
                    session_key = %session_key,
                    reason = %reason,
                    "completion service transiently unavailable"
                );
                ChatResponse::new(DEGRADED_TEXT, true).with_risk(RiskLevel::Medium, Vec::new())
            }
            Err(error) => {
                drop(session);
                tracing::error!(
                    event_name = "agent.orchestrator.internal_error",
                    user_id = %request.user_id,
                    session_key = %session_key,
                    error = %error,
                    "unexpected failure in the tool loop"
                );
                ChatResponse::new(INTERNAL_ERROR_TEXT, true)
                    .with_risk(RiskLevel::Unknown, Vec::new())
            }
        };

        self.emit_audit(request, &session_key, &response, SafetyOutcome::Pass);
        response
    }

    async fn sentiment_for(&self, message: &str) -> Sentiment {
        let Some(analyzer) = &self.sentiment else {
            return Sentiment::Neutral;
        };
        match analyzer.analyze(message).await {
            Ok(sentiment) => sentiment,
            Err(error) => {
                tracing::warn!(
                    event_name = "agent.orchestrator.sentiment_unavailable",
                    error = %error,
                    "sentiment capability failed, defaulting to neutral"
                );
                Sentiment::Neutral
            }
        }
    }

    fn emit_audit(
        &self,
        request: &ChatRequest,
        session_key: &str,
        response: &ChatResponse,
        outcome: SafetyOutcome,
    ) {
        let record = AuditRecord::new(
            request.user_id.clone(),
            session_key,
            &request.message,
            &response.response,
            response.risk_level,
            response.actions_taken.clone(),
            outcome,
        );
        self.audit.emit(record);
    }

    #[cfg(test)]
    pub(crate) fn session_store(&self) -> &SessionStore {
        &self.sessions
    }
}
