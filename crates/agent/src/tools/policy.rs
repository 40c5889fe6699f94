use std::sync::Arc;

use async_trait::async_trait;

use deskd_core::errors::CapabilityError;

use crate::capabilities::KnowledgeIndex;

use super::{Tool, ToolSpec};

pub const NO_POLICY_FOUND: &str =
    "No relevant information was found in the corporate policy base for this query.";

/// Corporate policy retrieval backed by the document index.
pub struct CorporatePolicyTool {
    index: Arc<dyn KnowledgeIndex>,
}

impl CorporatePolicyTool {
    pub fn new(index: Arc<dyn KnowledgeIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for CorporatePolicyTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "check_corporate_policy".to_string(),
            description: "Search the corporate policy knowledge base and return the most \
                          relevant policy passages with their sources."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Natural-language policy question"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, CapabilityError> {
        let query = arguments.get("query").and_then(|v| v.as_str()).unwrap_or_default().trim();
        if query.is_empty() {
            return Ok(NO_POLICY_FOUND.to_string());
        }

        let snippets = match self.index.query(query).await {
            Ok(snippets) => snippets,
            Err(error) if error.is_transient() => {
                tracing::warn!(
                    event_name = "agent.tool.policy_index_unavailable",
                    error = %error,
                    "knowledge index unavailable"
                );
                return Ok(
                    "The policy knowledge base is temporarily unavailable; please try again later."
                        .to_string(),
                );
            }
            Err(error) => return Err(error),
        };

        if snippets.is_empty() {
            return Ok(NO_POLICY_FOUND.to_string());
        }

        let rendered = snippets
            .iter()
            .map(|snippet| format!("[source: {}]\n{}", snippet.source, snippet.content.trim()))
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(rendered)
    }
}
