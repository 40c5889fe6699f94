use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use deskd_core::errors::CapabilityError;

pub mod automation;
pub mod policy;
pub mod workload;

pub use automation::{ActivityLogsTool, EscalateToHumanTool, SelfHealRestartTool, UploadLinkTool};
pub use policy::CorporatePolicyTool;
pub use workload::WorkloadMetricsTool;

/// Declared contract of one callable tool: name, description, and a JSON
/// schema for its arguments. The completion capability sees exactly this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Structured evidence that a tool ran this turn, recorded by the loop and
/// consumed directly by the risk scorer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub succeeded: bool,
}

/// Envelope some tools emit as raw JSON: narrative text for the model plus
/// an optional machine-renderable widget for the caller's UI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolEnvelope {
    pub human_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_data: Option<serde_json::Value>,
}

impl ToolEnvelope {
    pub fn narrative(human_text: impl Into<String>) -> Self {
        Self { human_text: human_text.into(), system_data: None }
    }

    pub fn with_widget(
        human_text: impl Into<String>,
        widget_type: &str,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            human_text: human_text.into(),
            system_data: Some(serde_json::json!({ "type": widget_type, "payload": payload })),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.human_text.clone())
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Returns the tool result as text handed back to the model. Lookup
    /// misses and offline backends are surfaced as explanatory text by the
    /// tool itself; only genuinely unexpected failures return an error.
    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, CapabilityError>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.spec().name;
        if !self.tools.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Specs in registration order, as declared to the completion capability.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order.iter().filter_map(|name| self.tools.get(name)).map(|tool| tool.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builds the declared tool set for one request. Escalation needs the
/// requesting user and conversation baked in, so registries are per-request.
pub trait ToolProvider: Send + Sync {
    fn registry_for(&self, user_id: &str, conversation_id: &str) -> ToolRegistry;
}

/// The production tool set: six tools wired to their backing capabilities.
pub struct StandardTools {
    pub directory: Arc<dyn crate::capabilities::EmployeeDirectory>,
    pub index: Arc<dyn crate::capabilities::KnowledgeIndex>,
    pub runner: Arc<dyn crate::capabilities::AutomationRunner>,
    pub notifier: Arc<dyn crate::capabilities::EscalationNotifier>,
    pub tickets: Arc<dyn deskd_db::repositories::TicketRepository>,
}

impl ToolProvider for StandardTools {
    fn registry_for(&self, user_id: &str, conversation_id: &str) -> ToolRegistry {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(WorkloadMetricsTool::new(Arc::clone(&self.directory))));
        registry.register(Arc::new(UploadLinkTool::new(Arc::clone(&self.runner))));
        registry.register(Arc::new(ActivityLogsTool::new(Arc::clone(&self.runner))));
        registry.register(Arc::new(SelfHealRestartTool::new(Arc::clone(&self.runner))));
        registry.register(Arc::new(EscalateToHumanTool::new(
            Arc::clone(&self.tickets),
            Arc::clone(&self.notifier),
            user_id,
            conversation_id,
        )));
        registry.register(Arc::new(CorporatePolicyTool::new(Arc::clone(&self.index))));
        registry
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use deskd_core::errors::CapabilityError;

    use super::{Tool, ToolEnvelope, ToolRegistry, ToolSpec};

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: self.0.to_string(),
                description: "test tool".to_string(),
                parameters: serde_json::json!({ "type": "object", "properties": {} }),
            }
        }

        async fn invoke(&self, _arguments: &serde_json::Value) -> Result<String, CapabilityError> {
            Ok("done".to_string())
        }
    }

    #[test]
    fn registry_preserves_registration_order() {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(NamedTool("b_tool")));
        registry.register(Arc::new(NamedTool("a_tool")));

        let names: Vec<String> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b_tool".to_string(), "a_tool".to_string()]);
    }

    #[test]
    fn envelope_with_widget_round_trips() {
        let envelope = ToolEnvelope::with_widget(
            "Here is your upload link.",
            "upload_widget",
            serde_json::json!({ "url": "https://example.test/u/abc" }),
        );

        let json = envelope.to_json();
        let parsed: ToolEnvelope = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, envelope);
        let system_data = parsed.system_data.expect("widget present");
        assert_eq!(system_data["type"], "upload_widget");
    }
}
