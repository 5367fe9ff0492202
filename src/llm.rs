//! Language-model providers.
//!
//! Concrete implementations of the core [`LanguageModel`] capability:
//! - **[`OpenAiModel`]**: `POST /v1/chat/completions` (OpenAI or any
//!   compatible server). The prompt is sent as a single user message.
//! - **[`OllamaModel`]**: `POST /api/generate` with `stream: false`.
//! - **[`DisabledModel`]**: always fails; handy for exercising retrieval
//!   without a model.
//!
//! Use [`create_model`] to build the provider named in the configuration.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use repo_chat_core::error::LlmError;
use repo_chat_core::llm::LanguageModel;

use crate::config::LlmConfig;
use crate::http::JsonEndpoint;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Model that refuses every request.
pub struct DisabledModel;

#[async_trait]
impl LanguageModel for DisabledModel {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String, LlmError> {
        Err(LlmError::Disabled)
    }
}

// ============ OpenAI ============

/// Chat-completions model. Requires `OPENAI_API_KEY`.
pub struct OpenAiModel {
    endpoint: JsonEndpoint,
    model: String,
    max_tokens: Option<u32>,
}

impl OpenAiModel {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::with_api_key(config, api_key)
    }

    fn with_api_key(config: &LlmConfig, api_key: String) -> Result<Self> {
        let base = config.url.as_deref().unwrap_or(OPENAI_BASE_URL);
        let endpoint = JsonEndpoint::new(
            "openai",
            format!("{}/v1/chat/completions", base.trim_end_matches('/')),
            config.timeout_secs,
            config.max_retries,
        )?
        .with_bearer(api_key);
        Ok(Self {
            endpoint,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn request_body<'a>(&'a self, prompt: &'a str, temperature: f32) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn parse_chat_response(json: serde_json::Value) -> Result<String, LlmError> {
    let response: ChatCompletionResponse =
        serde_json::from_value(json).map_err(|e| LlmError::Malformed(e.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::EmptyResponse {
            provider: "openai".to_string(),
        })
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let json = self.endpoint.post(&self.request_body(prompt, temperature)).await?;
        parse_chat_response(json)
    }
}

// ============ Ollama ============

/// Completion model served by a local Ollama instance.
pub struct OllamaModel {
    endpoint: JsonEndpoint,
    model: String,
    max_tokens: Option<u32>,
}

impl OllamaModel {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base = config.url.as_deref().unwrap_or(OLLAMA_BASE_URL);
        let endpoint = JsonEndpoint::new(
            "ollama",
            format!("{}/api/generate", base.trim_end_matches('/')),
            config.timeout_secs,
            config.max_retries,
        )?;
        Ok(Self {
            endpoint,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn request_body(&self, prompt: &str, temperature: f32) -> serde_json::Value {
        let mut options = serde_json::json!({ "temperature": temperature });
        if let Some(max_tokens) = self.max_tokens {
            options["num_predict"] = serde_json::json!(max_tokens);
        }
        serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": options,
        })
    }
}

fn parse_generate_response(json: &serde_json::Value) -> Result<String, LlmError> {
    if let Some(error) = json.get("error").and_then(|e| e.as_str()) {
        return Err(LlmError::Request(error.to_string()));
    }
    json.get("response")
        .and_then(|r| r.as_str())
        .map(str::to_string)
        .ok_or_else(|| LlmError::Malformed("missing response field".to_string()))
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        let json = self.endpoint.post(&self.request_body(prompt, temperature)).await?;
        parse_generate_response(&json)
    }
}

/// Create the [`LanguageModel`] named by `config.provider`.
///
/// # Errors
///
/// Returns an error for unknown providers or a missing API key.
pub fn create_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    let model: Arc<dyn LanguageModel> = match config.provider.as_str() {
        "disabled" => Arc::new(DisabledModel),
        "openai" => Arc::new(OpenAiModel::new(config)?),
        "ollama" => Arc::new(OllamaModel::new(config)?),
        other => bail!("Unknown llm provider: {}", other),
    };
    tracing::debug!(provider = model.name(), model = %config.model, "language model ready");
    Ok(model)
}
