//! HTTP client for the Gemini `generateContent` endpoint.

use crate::{IntentError, LanguageModel, ModelConfig, Prompt, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Build a client. An empty `api_key` is accepted; the service will
    /// reject the call and the caller's fallback handles it.
    pub fn new(config: &ModelConfig, api_key: String) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        let endpoint = format!(
            "{}/v1/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        Ok(Self {
            endpoint,
            model: config.model.clone(),
            api_key,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

impl<'a> GenerateRequest<'a> {
    fn from_prompt(prompt: &'a Prompt) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part {
                        text: &prompt.system,
                    },
                    Part {
                        text: &prompt.context,
                    },
                ],
            }],
        }
    }
}

// Expected response: { candidates: [{ content: { parts: [{ text }] } }] }
#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(IntentError::MissingCandidate)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let body = GenerateRequest::from_prompt(prompt);
        let start = std::time::Instant::now();
        let resp = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(IntentError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp.json().await?;
        tracing::debug!(
            "gemini: {} answered in {}ms",
            self.model,
            start.elapsed().as_millis()
        );
        parsed.into_text()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
