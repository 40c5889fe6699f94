//! HR workload directory client. A 404 is a lookup miss (`NotFound`), which
//! the workload tool renders as explanatory text for the model; connection
//! failures are transient so the tool can report the directory as offline.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::SecretString;

use deskd_agent::capabilities::{EmployeeDirectory, WorkloadProfile};
use deskd_core::config::DirectoryConfig;
use deskd_core::errors::CapabilityError;

use crate::http::{build_client, join_url, require_success, transport_error, with_bearer};

pub struct HttpEmployeeDirectory {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpEmployeeDirectory {
    pub fn new(config: &DirectoryConfig) -> Result<Self, CapabilityError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| CapabilityError::NotConfigured("directory".to_string()))?;
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl EmployeeDirectory for HttpEmployeeDirectory {
    async fn profile(&self, identifier: &str) -> Result<WorkloadProfile, CapabilityError> {
        let url = join_url(&self.base_url, &format!("employees/{identifier}/workload"));
        let response = with_bearer(self.client.get(url), self.api_key.as_ref())
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CapabilityError::NotFound(identifier.to_string()));
        }

        require_success(response)?
            .json()
            .await
            .map_err(|error| CapabilityError::Failed(format!("directory response: {error}")))
    }
}

#[cfg(test)]
mod tests {
    use deskd_agent::capabilities::WorkloadProfile;

    #[test]
    fn workload_profile_parses_from_directory_payload() {
        let profile: WorkloadProfile = serde_json::from_str(
            r#"{
                "identifier": "emp-7",
                "display_name": "Ana Reyes",
                "weekly_hours": 52.5,
                "open_tasks": 14,
                "burnout_risk": true,
                "overloaded": true
            }"#,
        )
        .expect("parse");

        assert_eq!(profile.identifier, "emp-7");
        assert!(profile.burnout_risk);
    }
}
