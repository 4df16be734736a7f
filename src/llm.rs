// =============================================================================
// llm.rs: THE ORACLE
// =============================================================================
//
// The narrative generator doesn't care who writes its prose, only that
// something implements LanguageModel. In production that something is
// Gemini over plain REST:
//
//   POST {base}/models/{model}:generateContent?key={key}
//   {"contents": [{"parts": [{"text": "<prompt>"}]}]}
//
// and the answer is the concatenated text of the first candidate's parts.
//
// Every failure on this path (no key, transport, non-2xx, empty candidate
// list, garbage JSON) collapses into MaritimeError::Service. Callers treat
// that as "the oracle is silent" and fall back to their own text.
// =============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::{MaritimeError, Result};

/// Anything that turns a prompt into text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate_content(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini `generateContent` over REST.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: Url,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http,
            base_url: config.genai_base_url.clone(),
            model: config.genai_model.clone(),
            api_key: config.genai_api_key.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate_content(&self, prompt: &str) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MaritimeError::Service("no API key configured for the language model".to_string()))?;

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!(model = self.model.as_str(), prompt_chars = prompt.len(), "Calling language model");

        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| MaritimeError::Service(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(model = self.model.as_str(), status = %status, "Language model returned non-success status");
            return Err(MaritimeError::Service(format!("HTTP {}", status.as_u16())));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| MaritimeError::Service(format!("unreadable response: {e}")))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(MaritimeError::Service("empty candidate list".to_string()));
        }

        Ok(text)
    }
}
