//! Shared plumbing for the HTTP clients: timeout-bound client construction,
//! URL joining, bearer auth, and reqwest/status error classification.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};

use deskd_core::errors::CapabilityError;

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, CapabilityError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|error| CapabilityError::Failed(format!("http client construction: {error}")))
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

pub(crate) fn with_bearer(
    builder: RequestBuilder,
    api_key: Option<&SecretString>,
) -> RequestBuilder {
    match api_key {
        Some(key) => builder.bearer_auth(key.expose_secret()),
        None => builder,
    }
}

/// Network-level failures: timeouts and connection refusals are transient,
/// anything else is a hard failure.
pub(crate) fn transport_error(error: reqwest::Error) -> CapabilityError {
    if error.is_timeout() || error.is_connect() {
        CapabilityError::Transient(error.to_string())
    } else {
        CapabilityError::Failed(error.to_string())
    }
}

/// Consumes a non-success status into the error taxonomy: 429 and 5xx are
/// transient, 404 is a lookup miss, the rest are hard failures.
pub(crate) fn require_success(response: Response) -> Result<Response, CapabilityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(CapabilityError::Transient(format!("upstream returned {status}")))
    } else if status == StatusCode::NOT_FOUND {
        Err(CapabilityError::NotFound(format!("upstream returned {status}")))
    } else {
        Err(CapabilityError::Failed(format!("upstream returned {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::join_url;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://a.test/", "/v1/x"), "http://a.test/v1/x");
        assert_eq!(join_url("http://a.test", "v1/x"), "http://a.test/v1/x");
    }
}
