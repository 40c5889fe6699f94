//! Sentiment-analysis client. Used only to label the outgoing response; the
//! orchestrator falls back to Neutral when this capability errors, so the
//! client does not need to be defensive beyond the shared error taxonomy.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use deskd_agent::capabilities::SentimentAnalyzer;
use deskd_core::config::SentimentConfig;
use deskd_core::domain::messages::Sentiment;
use deskd_core::errors::CapabilityError;

use crate::http::{build_client, join_url, require_success, transport_error, with_bearer};

pub struct HttpSentimentAnalyzer {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl HttpSentimentAnalyzer {
    pub fn new(config: &SentimentConfig) -> Result<Self, CapabilityError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| CapabilityError::NotConfigured("sentiment".to_string()))?;
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url,
            api_key: config.api_key.clone(),
        })
    }
}

#[derive(Debug, Serialize)]
struct SentimentRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SentimentResponse {
    sentiment: String,
}

fn parse_label(label: &str) -> Result<Sentiment, CapabilityError> {
    match label.trim().to_ascii_lowercase().as_str() {
        "positive" => Ok(Sentiment::Positive),
        "neutral" => Ok(Sentiment::Neutral),
        "negative" => Ok(Sentiment::Negative),
        "mixed" => Ok(Sentiment::Mixed),
        other => Err(CapabilityError::Failed(format!("unknown sentiment label `{other}`"))),
    }
}

#[async_trait]
impl SentimentAnalyzer for HttpSentimentAnalyzer {
    async fn analyze(&self, text: &str) -> Result<Sentiment, CapabilityError> {
        let builder = self.client.post(join_url(&self.base_url, "sentiment"));
        let response = with_bearer(builder, self.api_key.as_ref())
            .json(&SentimentRequest { text })
            .send()
            .await
            .map_err(transport_error)?;

        let parsed: SentimentResponse = require_success(response)?
            .json()
            .await
            .map_err(|error| CapabilityError::Failed(format!("sentiment response: {error}")))?;

        parse_label(&parsed.sentiment)
    }
}

#[cfg(test)]
mod tests {
    use deskd_core::domain::messages::Sentiment;

    use super::parse_label;

    #[test]
    fn known_labels_parse_case_insensitively() {
        assert_eq!(parse_label("Positive").expect("parse"), Sentiment::Positive);
        assert_eq!(parse_label("MIXED").expect("parse"), Sentiment::Mixed);
    }

    #[test]
    fn unknown_label_is_a_failure() {
        assert!(parse_label("ambivalent").is_err());
    }
}
