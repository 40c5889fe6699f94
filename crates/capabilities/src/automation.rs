//! Automation-platform client. Jobs are submitted and then polled with
//! exponential backoff (factor 1.5 up to a capped ceiling) until they finish
//! or the overall polling window closes. A window close is a normal
//! `TimedOut` outcome, not an error: the job may still complete upstream.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use deskd_agent::capabilities::{AutomationOutcome, AutomationRunner};
use deskd_core::config::AutomationConfig;
use deskd_core::errors::CapabilityError;

use crate::http::{build_client, join_url, require_success, transport_error, with_bearer};

const REQUEST_TIMEOUT_SECS: u64 = 15;
const BACKOFF_FACTOR: f64 = 1.5;

pub struct HttpAutomationRunner {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    poll_initial_delay: Duration,
    poll_max_delay: Duration,
    poll_timeout: Duration,
}

impl HttpAutomationRunner {
    pub fn new(config: &AutomationConfig) -> Result<Self, CapabilityError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| CapabilityError::NotConfigured("automation".to_string()))?;
        Ok(Self {
            client: build_client(REQUEST_TIMEOUT_SECS)?,
            base_url,
            api_key: config.api_key.clone(),
            poll_initial_delay: Duration::from_millis(config.poll_initial_delay_ms),
            poll_max_delay: Duration::from_millis(config.poll_max_delay_ms),
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
        })
    }

    async fn fetch_status(&self, job_id: &str) -> Result<JobStatus, CapabilityError> {
        let url = join_url(&self.base_url, &format!("jobs/{job_id}"));
        let response = with_bearer(self.client.get(url), self.api_key.as_ref())
            .send()
            .await
            .map_err(transport_error)?;

        require_success(response)?
            .json()
            .await
            .map_err(|error| CapabilityError::Failed(format!("job status response: {error}")))
    }
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    job: &'a str,
    arguments: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn next_delay(current: Duration, max: Duration) -> Duration {
    current.mul_f64(BACKOFF_FACTOR).min(max)
}

#[async_trait]
impl AutomationRunner for HttpAutomationRunner {
    async fn run(
        &self,
        job: &str,
        arguments: &serde_json::Value,
    ) -> Result<AutomationOutcome, CapabilityError> {
        let builder = self.client.post(join_url(&self.base_url, "jobs"));
        let response = with_bearer(builder, self.api_key.as_ref())
            .json(&SubmitRequest { job, arguments })
            .send()
            .await
            .map_err(transport_error)?;

        let submitted: SubmitResponse = require_success(response)?
            .json()
            .await
            .map_err(|error| CapabilityError::Failed(format!("job submit response: {error}")))?;

        let deadline = Instant::now() + self.poll_timeout;
        let mut delay = self.poll_initial_delay;

        loop {
            if Instant::now() + delay >= deadline {
                tracing::warn!(
                    event_name = "capability.automation.poll_timeout",
                    job,
                    job_id = %submitted.job_id,
                    "polling window closed before the job finished"
                );
                return Ok(AutomationOutcome::TimedOut);
            }
            tokio::time::sleep(delay).await;

            let status = self.fetch_status(&submitted.job_id).await?;
            match status.status.as_str() {
                "succeeded" => {
                    return Ok(AutomationOutcome::Completed(status.output.unwrap_or_default()))
                }
                "failed" => {
                    return Err(CapabilityError::Failed(
                        status.error.unwrap_or_else(|| "automation job failed".to_string()),
                    ))
                }
                _ => {}
            }

            delay = next_delay(delay, self.poll_max_delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::next_delay;

    #[test]
    fn delay_grows_by_half_until_the_ceiling() {
        let max = Duration::from_millis(6000);
        let mut delay = Duration::from_millis(2000);

        delay = next_delay(delay, max);
        assert_eq!(delay, Duration::from_millis(3000));
        delay = next_delay(delay, max);
        assert_eq!(delay, Duration::from_millis(4500));
        delay = next_delay(delay, max);
        assert_eq!(delay, Duration::from_millis(6000));
        delay = next_delay(delay, max);
        assert_eq!(delay, Duration::from_millis(6000));
    }
}
