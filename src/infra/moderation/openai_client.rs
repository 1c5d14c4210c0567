// =============================================================================
// OPENAI MODERATION CLIENT
// =============================================================================
//
// Implements `ModerationClassifier` against OpenAI's moderation endpoint
// (https://platform.openai.com/docs/api-reference/moderations).
//
// Request:  POST {base_url}/moderations  {"model": ..., "input": "..."}
// Response: {"results": [{"flagged": bool, "categories": {"name": bool, ...}}]}
//
// Error mapping:
// - HTTP 429               -> ClassifierError::RateLimited
// - any other non-2xx      -> ClassifierError::Api
// - reqwest timeout        -> ClassifierError::Timeout
// - unparseable body       -> ClassifierError::InvalidResponse
//
// **Environment Variables:**
// - `OPENAI_API_KEY` - enables this client; without it the board runs on the keyword list
// - `OPENAI_BASE_URL` - override for proxies and tests
// - `OPENAI_MODERATION_MODEL` - defaults to `omni-moderation-latest`

use crate::core::moderation::{ClassifierError, ClassifierVerdict, ModerationClassifier};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "omni-moderation-latest";

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    // BTreeMap keeps the reported category order stable
    #[serde(default)]
    categories: BTreeMap<String, bool>,
}

/// Turn a moderation response body into a verdict.
///
/// Only the first result is looked at since every request carries one input.
fn parse_verdict(body: &str) -> Result<ClassifierVerdict, ClassifierError> {
    let response: ModerationResponse = serde_json::from_str(body)
        .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

    let result = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| ClassifierError::InvalidResponse("empty results array".to_string()))?;

    if !result.flagged {
        return Ok(ClassifierVerdict::clean());
    }

    let categories = result
        .categories
        .into_iter()
        .filter(|(_, hit)| *hit)
        .map(|(name, _)| name)
        .collect();

    Ok(ClassifierVerdict::flagged(categories))
}

pub struct OpenAiModerationClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiModerationClient {
    pub fn new(
        api_key: String,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }
}

#[async_trait]
impl ModerationClassifier for OpenAiModerationClient {
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError> {
        let url = format!("{}/moderations", self.base_url);

        let payload = json!({
            "model": self.model,
            "input": text,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout(self.timeout)
                } else {
                    ClassifierError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ClassifierError::RateLimited);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_verdict(&body)
    }
}
