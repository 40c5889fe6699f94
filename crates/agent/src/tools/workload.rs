use std::sync::Arc;

use async_trait::async_trait;

use deskd_core::errors::CapabilityError;

use crate::capabilities::{EmployeeDirectory, WorkloadProfile};

use super::{Tool, ToolSpec};

/// HR workload lookup. Misses and an offline directory become explanatory
/// text for the model, never errors.
pub struct WorkloadMetricsTool {
    directory: Arc<dyn EmployeeDirectory>,
}

impl WorkloadMetricsTool {
    pub fn new(directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { directory }
    }
}

fn render_profile(profile: &WorkloadProfile) -> String {
    let status = if profile.burnout_risk {
        "shows signs of burnout risk and should be treated with care"
    } else if profile.overloaded {
        "is currently overloaded"
    } else {
        "is within a healthy workload range"
    };

    format!(
        "Workload analysis for {} ({}): averaging {:.1} hours per week with {} open tasks. \
         This employee {}.",
        profile.display_name, profile.identifier, profile.weekly_hours, profile.open_tasks, status
    )
}

#[async_trait]
impl Tool for WorkloadMetricsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "analyze_workload_metrics".to_string(),
            description: "Look up an employee's workload profile (hours, open tasks, \
                          burnout indicators) by employee identifier."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "identifier": {
                        "type": "string",
                        "description": "Employee identifier or email"
                    }
                },
                "required": ["identifier"]
            }),
        }
    }

    async fn invoke(&self, arguments: &serde_json::Value) -> Result<String, CapabilityError> {
        let identifier = arguments
            .get("identifier")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .trim()
            .to_string();
        if identifier.is_empty() {
            return Ok("No employee identifier was provided for the workload lookup.".to_string());
        }

        match self.directory.profile(&identifier).await {
            Ok(profile) => Ok(render_profile(&profile)),
            Err(CapabilityError::NotFound(_)) => {
                Ok(format!("NOT FOUND: no workload profile exists for '{identifier}'."))
            }
            Err(error) if error.is_transient() => {
                tracing::warn!(
                    event_name = "agent.tool.hr_offline",
                    identifier = %identifier,
                    error = %error,
                    "employee directory unavailable"
                );
                Ok("The HR database is currently offline; workload data cannot be retrieved right now."
                    .to_string())
            }
            Err(error) => Err(error),
        }
    }
}
