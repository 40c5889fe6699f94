use std::sync::Arc;

use crate::llm::{ChatCompletion, CompletionError};
use crate::tools::{ToolCallRecord, ToolRegistry};
use crate::transcript::{Role, Turn};

const MAX_ROUNDS_FALLBACK_TEXT: &str =
    "I could not finish the requested actions within the allowed number of steps. \
     Please try again or ask me to escalate to a human agent.";

/// Result of one completed exchange. `new_turns` holds every turn produced
/// after the user turn (assistant tool-call steps, tool results, and the
/// final answer) in order; the caller appends them to the transcript only
/// on success, so a failed attempt leaves no trace past the user turn.
#[derive(Clone, Debug)]
pub struct LoopOutcome {
    pub final_text: String,
    pub new_turns: Vec<Turn>,
    pub tool_calls: Vec<ToolCallRecord>,
}

impl LoopOutcome {
    pub fn tool_turns(&self) -> Vec<&Turn> {
        self.new_turns.iter().filter(|turn| turn.role == Role::Tool).collect()
    }
}

/// Drives one user turn: the completion capability decides which declared
/// tools to invoke, zero or more times, before producing a final answer.
pub struct ToolLoop {
    completion: Arc<dyn ChatCompletion>,
    max_rounds: u32,
}

impl ToolLoop {
    pub fn new(completion: Arc<dyn ChatCompletion>, max_rounds: u32) -> Self {
        Self { completion, max_rounds: max_rounds.max(1) }
    }

    pub async fn run(
        &self,
        transcript_turns: &[Turn],
        registry: &ToolRegistry,
    ) -> Result<LoopOutcome, CompletionError> {
        let specs = registry.specs();
        let mut working: Vec<Turn> = transcript_turns.to_vec();
        let mut new_turns: Vec<Turn> = Vec::new();
        let mut tool_calls: Vec<ToolCallRecord> = Vec::new();

        for round in 0..self.max_rounds {
            let step = self.completion.complete(&working, &specs).await?;

            if step.tool_calls.is_empty() {
                let final_text = step.content.unwrap_or_default();
                new_turns.push(Turn::assistant(final_text.clone()));
                return Ok(LoopOutcome { final_text, new_turns, tool_calls });
            }

            let assistant_turn = Turn::assistant_with_calls(
                step.content.unwrap_or_default(),
                step.tool_calls.clone(),
            );
            working.push(assistant_turn.clone());
            new_turns.push(assistant_turn);

            for call in step.tool_calls {
                let result = match registry.get(&call.name) {
                    Some(tool) => match tool.invoke(&call.arguments).await {
                        Ok(text) => {
                            tool_calls
                                .push(ToolCallRecord { tool_name: call.name.clone(), succeeded: true });
                            text
                        }
                        Err(error) => {
                            tracing::warn!(
                                event_name = "agent.loop.tool_failed",
                                tool = %call.name,
                                round,
                                error = %error,
                                "tool invocation failed"
                            );
                            tool_calls.push(ToolCallRecord {
                                tool_name: call.name.clone(),
                                succeeded: false,
                            });
                            format!("Error: the tool '{}' failed: {error}", call.name)
                        }
                    },
                    None => {
                        tracing::warn!(
                            event_name = "agent.loop.unknown_tool",
                            tool = %call.name,
                            "model requested an undeclared tool"
                        );
                        format!("Error: no tool named '{}' is available.", call.name)
                    }
                };

                let tool_turn = Turn::tool(call.name, call.id, result);
                working.push(tool_turn.clone());
                new_turns.push(tool_turn);
            }
        }

        tracing::warn!(
            event_name = "agent.loop.max_rounds",
            max_rounds = self.max_rounds,
            "tool loop hit the round cap without a final answer"
        );
        new_turns.push(Turn::assistant(MAX_ROUNDS_FALLBACK_TEXT));
        Ok(LoopOutcome {
            final_text: MAX_ROUNDS_FALLBACK_TEXT.to_string(),
            new_turns,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use deskd_core::errors::CapabilityError;

    use crate::llm::{AssistantStep, ChatCompletion, CompletionError};
    use crate::tools::{Tool, ToolRegistry, ToolSpec};
    use crate::transcript::{Role, ToolCall, Turn};

    use super::ToolLoop;

    /// Returns each scripted step in sequence, then repeats the last one.
    struct ScriptedCompletion {
        steps: Vec<AssistantStep>,
        cursor: AtomicUsize,
    }

    impl ScriptedCompletion {
        fn new(steps: Vec<AssistantStep>) -> Self {
            Self { steps, cursor: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl ChatCompletion for ScriptedCompletion {
        async fn complete(
            &self,
            _turns: &[Turn],
            _tools: &[ToolSpec],
        ) -> Result<AssistantStep, CompletionError> {
            let index = self.cursor.fetch_add(1, Ordering::SeqCst).min(self.steps.len() - 1);
            Ok(self.steps[index].clone())
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "echo".to_string(),
                description: "echoes".to_string(),
                parameters: serde_json::json!({ "type": "object", "properties": {} }),
            }
        }

        async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, CapabilityError> {
            Ok(format!("echoed: {arguments}"))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(EchoTool));
        registry
    }

    fn base_turns() -> Vec<Turn> {
        vec![Turn::system("instructions"), Turn::user("please echo hello")]
    }

    #[tokio::test]
    async fn zero_tool_calls_returns_final_text_directly() {
        let completion = Arc::new(ScriptedCompletion::new(vec![AssistantStep {
            content: Some("all good".to_string()),
            tool_calls: Vec::new(),
        }]));
        let tool_loop = ToolLoop::new(completion, 8);

        let outcome = tool_loop.run(&base_turns(), &registry()).await.expect("run");
        assert_eq!(outcome.final_text, "all good");
        assert_eq!(outcome.new_turns.len(), 1);
        assert!(outcome.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn tool_call_round_appends_tool_turn_before_final() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            AssistantStep {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call-1".to_string(),
                    name: "echo".to_string(),
                    arguments: serde_json::json!({ "text": "hello" }),
                }],
            },
            AssistantStep { content: Some("done".to_string()), tool_calls: Vec::new() },
        ]));
        let tool_loop = ToolLoop::new(completion, 8);

        let outcome = tool_loop.run(&base_turns(), &registry()).await.expect("run");
        assert_eq!(outcome.final_text, "done");

        let roles: Vec<Role> = outcome.new_turns.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(outcome.tool_calls.len(), 1);
        assert!(outcome.tool_calls[0].succeeded);
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_text_for_the_model() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            AssistantStep {
                content: None,
                tool_calls: vec![ToolCall {
                    id: "call-1".to_string(),
                    name: "vanish".to_string(),
                    arguments: serde_json::json!({}),
                }],
            },
            AssistantStep { content: Some("sorry".to_string()), tool_calls: Vec::new() },
        ]));
        let tool_loop = ToolLoop::new(completion, 8);

        let outcome = tool_loop.run(&base_turns(), &registry()).await.expect("run");
        let tool_turn = &outcome.new_turns[1];
        assert_eq!(tool_turn.role, Role::Tool);
        assert!(tool_turn.content.contains("no tool named 'vanish'"));
        assert!(outcome.tool_calls.is_empty());
    }

    #[tokio::test]
    async fn round_cap_produces_fallback_answer() {
        let completion = Arc::new(ScriptedCompletion::new(vec![AssistantStep {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call-1".to_string(),
                name: "echo".to_string(),
                arguments: serde_json::json!({}),
            }],
        }]));
        let tool_loop = ToolLoop::new(completion, 2);

        let outcome = tool_loop.run(&base_turns(), &registry()).await.expect("run");
        assert!(outcome.final_text.contains("allowed number of steps"));
        assert_eq!(outcome.tool_calls.len(), 2);
    }

    #[tokio::test]
    async fn transient_error_propagates_without_new_turns() {
        struct FailingCompletion;

        #[async_trait]
        impl ChatCompletion for FailingCompletion {
            async fn complete(
                &self,
                _turns: &[Turn],
                _tools: &[ToolSpec],
            ) -> Result<AssistantStep, CompletionError> {
                Err(CompletionError::Transient("503".to_string()))
            }
        }

        let tool_loop = ToolLoop::new(Arc::new(FailingCompletion), 8);
        let result = tool_loop.run(&base_turns(), &registry()).await;
        assert!(matches!(result, Err(CompletionError::Transient(_))));
    }
}
