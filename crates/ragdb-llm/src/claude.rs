use std::fmt;

use serde::{Deserialize, Serialize};

use ragdb_core::config::LlmSettings;

use crate::error::{LlmError, Result};
use crate::ChatModel;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API client, one user turn per request.
#[derive(Clone)]
pub struct ClaudeClient {
    client: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl fmt::Debug for ClaudeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ClaudeClient {
    /// A missing or blank key is accepted here; requests then fail with
    /// [`LlmError::MissingApiKey`].
    #[must_use]
    pub fn new(api_key: Option<String>, settings: &LlmSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_url: settings.api_url.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub(crate) fn request_body<'a>(&'a self, prompt: &'a str) -> RequestBody<'a> {
        RequestBody {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![ApiMessage { role: "user", content: prompt }],
        }
    }
}

#[async_trait::async_trait]
impl ChatModel for ClaudeClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::error!("Claude API error {status}: {text}");
            return Err(LlmError::Api { status: status.as_u16(), message: api_error_message(&text) });
        }
        parse_response(&text)
    }
}

#[derive(Serialize, Debug)]
pub(crate) struct RequestBody<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize, Debug)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    message: String,
}

/// Concatenated text blocks of a Messages API response.
pub(crate) fn parse_response(body: &str) -> Result<String> {
    let resp: ApiResponse = serde_json::from_str(body)?;
    let text: String = resp
        .content
        .iter()
        .filter(|b| b.block_type == "text")
        .map(|b| b.text.as_str())
        .collect();
    if text.is_empty() {
        return Err(LlmError::EmptyResponse { provider: "claude" });
    }
    Ok(text)
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}
