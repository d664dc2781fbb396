//! OpenRouter LLM provider implementation.
//!
//! OpenRouter exposes an OpenAI-compatible chat completion API:
//! https://openrouter.ai/docs

use crate::client::{ChatCompletion, ChatMessage, ChatRequest, ChatUsage, LlmClient};
use lorebase_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Title reported to OpenRouter for request attribution.
const APP_TITLE: &str = "lorebase";

/// OpenRouter API request format.
#[derive(Debug, Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// OpenRouter API response format.
#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    model: String,
    choices: Vec<OpenRouterChoice>,
    #[serde(default)]
    usage: Option<OpenRouterUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterMessage,
}

#[derive(Debug, Deserialize)]
struct OpenRouterMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenRouterUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

/// OpenRouter chat completion client.
pub struct OpenRouterClient {
    /// API base URL
    base_url: String,

    /// Bearer API key
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenRouterClient {
    /// Create a new client against the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Create a new client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Convert a ChatRequest to the OpenRouter wire format.
    fn to_wire<'a>(&self, request: &'a ChatRequest) -> OpenRouterRequest<'a> {
        OpenRouterRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenRouterClient {
    fn provider_name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatCompletion> {
        tracing::info!("Sending completion request to OpenRouter");
        tracing::debug!("Model: {}, {} messages", request.model, request.messages.len());

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Title", APP_TITLE)
            .json(&self.to_wire(request))
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to OpenRouter: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "OpenRouter API error ({}): {}",
                status, error_text
            )));
        }

        let wire: OpenRouterResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenRouter response: {}", e)))?;

        let choice = wire
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("OpenRouter returned no choices".to_string()))?;

        let usage = wire
            .usage
            .map(|u| ChatUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        tracing::info!("Received completion from OpenRouter");

        Ok(ChatCompletion {
            content: choice.message.content,
            model: wire.model,
            usage,
        })
    }
}
