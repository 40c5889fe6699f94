//! OpenAI-compatible chat completions client with tool calling.
//!
//! The wire format is the `/chat/completions` shape: tool specs are declared
//! as `function` tools with `tool_choice: auto`, and tool-call arguments
//! travel as JSON-encoded strings that are parsed back into values here.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use deskd_agent::llm::{AssistantStep, ChatCompletion, CompletionError};
use deskd_agent::tools::ToolSpec;
use deskd_agent::transcript::{Role, ToolCall, Turn};
use deskd_core::config::CompletionConfig;
use deskd_core::errors::CapabilityError;

use crate::http::{build_client, join_url};

pub struct OpenAiChatCompletion {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiChatCompletion {
    pub fn new(config: &CompletionConfig) -> Result<Self, CapabilityError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Default, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn encode_turn(turn: &Turn) -> WireMessage {
    let tool_calls = turn
        .tool_calls
        .iter()
        .map(|call| WireToolCall {
            id: call.id.clone(),
            kind: "function".to_string(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            },
        })
        .collect::<Vec<_>>();

    // Assistant tool-call steps may carry no interim content; omit the field
    // rather than sending an empty string.
    let content = if turn.content.is_empty() && !tool_calls.is_empty() {
        None
    } else {
        Some(turn.content.clone())
    };

    WireMessage {
        role: role_name(turn.role),
        content,
        tool_call_id: turn.tool_call_id.clone(),
        tool_calls,
    }
}

fn encode_tools(specs: &[ToolSpec]) -> Vec<WireTool<'_>> {
    specs
        .iter()
        .map(|spec| WireTool {
            kind: "function",
            function: WireFunction {
                name: &spec.name,
                description: &spec.description,
                parameters: &spec.parameters,
            },
        })
        .collect()
}

fn decode_step(message: WireResponseMessage) -> Result<AssistantStep, CompletionError> {
    let mut tool_calls = Vec::with_capacity(message.tool_calls.len());
    for call in message.tool_calls {
        let arguments: serde_json::Value = if call.function.arguments.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&call.function.arguments).map_err(|error| {
                CompletionError::Malformed(format!(
                    "tool call arguments for `{}`: {error}",
                    call.function.name
                ))
            })?
        };
        tool_calls.push(ToolCall { id: call.id, name: call.function.name, arguments });
    }

    Ok(AssistantStep { content: message.content.filter(|text| !text.is_empty()), tool_calls })
}

#[async_trait]
impl ChatCompletion for OpenAiChatCompletion {
    async fn complete(
        &self,
        turns: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<AssistantStep, CompletionError> {
        let request = WireRequest {
            model: &self.model,
            messages: turns.iter().map(encode_turn).collect(),
            tools: encode_tools(tools),
            tool_choice: (!tools.is_empty()).then_some("auto"),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let mut builder = self.client.post(join_url(&self.base_url, "chat/completions"));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.json(&request).send().await.map_err(|error| {
            if error.is_timeout() || error.is_connect() {
                CompletionError::Transient(error.to_string())
            } else {
                CompletionError::Malformed(error.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(CompletionError::Transient(format!("completion endpoint returned {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Rejected(format!(
                "completion endpoint returned {status}: {body}"
            )));
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|error| CompletionError::Malformed(error.to_string()))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Malformed("response carried no choices".to_string()))?;

        decode_step(choice.message)
    }
}

#[cfg(test)]
mod tests {
    use deskd_agent::llm::CompletionError;
    use deskd_agent::transcript::{ToolCall, Turn};

    use super::{decode_step, encode_turn, WireResponseMessage};

    #[test]
    fn tool_turn_encodes_role_and_call_id() {
        let turn = Turn::tool("check_corporate_policy", "call-3", "[source: handbook]\n...");
        let wire = encode_turn(&turn);
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("call-3"));
        assert!(wire.tool_calls.is_empty());
    }

    #[test]
    fn assistant_call_step_serializes_arguments_as_string() {
        let turn = Turn::assistant_with_calls(
            "",
            vec![ToolCall {
                id: "call-1".to_string(),
                name: "analyze_workload_metrics".to_string(),
                arguments: serde_json::json!({ "identifier": "emp-7" }),
            }],
        );
        let wire = encode_turn(&turn);
        assert!(wire.content.is_none());
        assert_eq!(wire.tool_calls[0].function.arguments, r#"{"identifier":"emp-7"}"#);
    }

    #[test]
    fn decode_parses_argument_strings_back_to_values() {
        let message: WireResponseMessage = serde_json::from_str(
            r#"{
                "content": null,
                "tool_calls": [{
                    "id": "call-9",
                    "type": "function",
                    "function": { "name": "self_heal_restart", "arguments": "{\"service\":\"vpn\"}" }
                }]
            }"#,
        )
        .expect("parse wire message");

        let step = decode_step(message).expect("decode");
        assert!(step.content.is_none());
        assert_eq!(step.tool_calls[0].name, "self_heal_restart");
        assert_eq!(step.tool_calls[0].arguments["service"], "vpn");
    }

    #[test]
    fn unparseable_arguments_are_malformed() {
        let message: WireResponseMessage = serde_json::from_str(
            r#"{
                "tool_calls": [{
                    "id": "call-9",
                    "type": "function",
                    "function": { "name": "echo", "arguments": "{broken" }
                }]
            }"#,
        )
        .expect("parse wire message");

        assert!(matches!(decode_step(message), Err(CompletionError::Malformed(_))));
    }

    #[test]
    fn empty_arguments_default_to_empty_object() {
        let message: WireResponseMessage = serde_json::from_str(
            r#"{
                "tool_calls": [{
                    "id": "call-2",
                    "type": "function",
                    "function": { "name": "get_activity_logs", "arguments": "" }
                }]
            }"#,
        )
        .expect("parse wire message");

        let step = decode_step(message).expect("decode");
        assert_eq!(step.tool_calls[0].arguments, serde_json::json!({}));
    }
}
