//! Content-safety moderation client. The endpoint scores the text against a
//! fixed category set on a 0..=7 severity scale; the safety gate applies its
//! own cutoff, this client only transports the analysis.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use deskd_agent::safety::{CategoryScore, Moderation, ModerationAnalysis};
use deskd_core::config::ModerationConfig;
use deskd_core::errors::CapabilityError;

use crate::http::{build_client, join_url, require_success, transport_error, with_bearer};

pub struct HttpModeration {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpModeration {
    /// Fails with `NotConfigured` when no endpoint is set; callers that want
    /// fail-open behavior keep the gate's unconfigured fallback instead.
    pub fn new(config: &ModerationConfig) -> Result<Self, CapabilityError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| CapabilityError::NotConfigured("moderation".to_string()))?;
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url,
            api_key: config.api_key.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(rename = "categoriesAnalysis")]
    categories_analysis: Vec<WireCategory>,
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    category: String,
    severity: u8,
}

#[async_trait]
impl Moderation for HttpModeration {
    async fn classify(&self, text: &str) -> Result<ModerationAnalysis, CapabilityError> {
        let builder = self.client.post(join_url(&self.base_url, "text:analyze"));
        let response = with_bearer(builder, self.api_key.as_ref())
            .json(&AnalyzeRequest { text })
            .send()
            .await
            .map_err(transport_error)?;

        let parsed: AnalyzeResponse = require_success(response)?
            .json()
            .await
            .map_err(|error| CapabilityError::Failed(format!("moderation response: {error}")))?;

        Ok(ModerationAnalysis {
            categories: parsed
                .categories_analysis
                .into_iter()
                .map(|entry| CategoryScore { category: entry.category, severity: entry.severity })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::AnalyzeResponse;

    #[test]
    fn analysis_response_parses_category_scores() {
        let parsed: AnalyzeResponse = serde_json::from_str(
            r#"{
                "categoriesAnalysis": [
                    { "category": "Hate", "severity": 0 },
                    { "category": "Violence", "severity": 4 }
                ]
            }"#,
        )
        .expect("parse");

        assert_eq!(parsed.categories_analysis.len(), 2);
        assert_eq!(parsed.categories_analysis[1].category, "Violence");
        assert_eq!(parsed.categories_analysis[1].severity, 4);
    }
}
