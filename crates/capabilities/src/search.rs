//! Document-retrieval client backing the corporate-policy tool. Results are
//! filtered by the configured relevance floor and capped at `top_k`; an empty
//! result set is a normal outcome, not an error.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use deskd_agent::capabilities::{KnowledgeIndex, KnowledgeSnippet};
use deskd_core::config::SearchConfig;
use deskd_core::errors::CapabilityError;

use crate::http::{build_client, join_url, require_success, transport_error, with_bearer};

const SEARCH_TIMEOUT_SECS: u64 = 15;

pub struct HttpKnowledgeIndex {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    index: String,
    top_k: usize,
    relevance_floor: f64,
}

impl HttpKnowledgeIndex {
    pub fn new(config: &SearchConfig) -> Result<Self, CapabilityError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| CapabilityError::NotConfigured("search".to_string()))?;
        Ok(Self {
            client: build_client(SEARCH_TIMEOUT_SECS)?,
            base_url,
            api_key: config.api_key.clone(),
            index: config.index.clone(),
            top_k: config.top_k,
            relevance_floor: config.relevance_floor,
        })
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    top: usize,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<WireResult>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    source: String,
    content: String,
    score: f64,
}

fn rank_results(results: Vec<WireResult>, floor: f64, top_k: usize) -> Vec<KnowledgeSnippet> {
    let mut snippets: Vec<KnowledgeSnippet> = results
        .into_iter()
        .filter(|result| result.score >= floor)
        .map(|result| KnowledgeSnippet {
            source: result.source,
            content: result.content,
            relevance: result.score,
        })
        .collect();
    snippets.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    snippets.truncate(top_k);
    snippets
}

#[async_trait]
impl KnowledgeIndex for HttpKnowledgeIndex {
    async fn query(&self, text: &str) -> Result<Vec<KnowledgeSnippet>, CapabilityError> {
        let url = join_url(&self.base_url, &format!("indexes/{}/query", self.index));
        let response = with_bearer(self.client.post(url), self.api_key.as_ref())
            .json(&QueryRequest { query: text, top: self.top_k })
            .send()
            .await
            .map_err(transport_error)?;

        let parsed: QueryResponse = require_success(response)?
            .json()
            .await
            .map_err(|error| CapabilityError::Failed(format!("search response: {error}")))?;

        Ok(rank_results(parsed.results, self.relevance_floor, self.top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::{rank_results, WireResult};

    fn result(source: &str, score: f64) -> WireResult {
        WireResult { source: source.to_string(), content: "...".to_string(), score }
    }

    #[test]
    fn results_below_the_floor_are_dropped() {
        let ranked = rank_results(vec![result("a", 0.5), result("b", 0.01)], 0.03, 3);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].source, "a");
    }

    #[test]
    fn results_are_sorted_by_relevance_and_capped() {
        let ranked =
            rank_results(vec![result("low", 0.1), result("high", 0.9), result("mid", 0.5)], 0.03, 2);
        let sources: Vec<&str> = ranked.iter().map(|s| s.source.as_str()).collect();
        assert_eq!(sources, vec!["high", "mid"]);
    }
}
