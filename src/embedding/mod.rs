//! Embedding providers.
//!
//! Concrete implementations of the core [`Embedder`] capability:
//! - **[`OpenAiEmbedder`]**: `POST /v1/embeddings` on the OpenAI API (or any
//!   OpenAI-compatible server), with batching, retry, and backoff.
//! - **[`OllamaEmbedder`]**: `POST /api/embed` on a local Ollama instance.
//! - **`LocalEmbedder`**: in-process inference through fastembed (feature
//!   `local-embeddings-fastembed`); no network calls after model download.
//! - **[`HashEmbedder`]**: deterministic offline feature hashing from the
//!   core crate. Useful for tests and air-gapped smoke runs.
//! - **[`DisabledEmbedder`]**: always fails.
//!
//! # Provider Selection
//!
//! Use [`create_embedder`] to instantiate the provider named in the
//! configuration:
//!
//! ```rust
//! # use repo_chat::config::EmbeddingConfig;
//! # use repo_chat::embedding::create_embedder;
//! let config = EmbeddingConfig {
//!     provider: "hash".to_string(),
//!     ..EmbeddingConfig::default()
//! };
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.model_name(), "feature-hash");
//! assert_eq!(embedder.dims(), 256);
//! ```

#[cfg(feature = "local-embeddings-fastembed")]
mod local;

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;

use repo_chat_core::embedding::{Embedder, HashEmbedder};
use repo_chat_core::error::EmbedError;

use crate::config::EmbeddingConfig;
use crate::http::JsonEndpoint;

#[cfg(feature = "local-embeddings-fastembed")]
pub use local::LocalEmbedder;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";

// ============ Disabled ============

/// Embedder that refuses every request.
///
/// Used when `embedding.provider = "disabled"`; session creation then fails
/// with a descriptive error.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dims(&self) -> usize {
        0
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Err(EmbedError::Disabled)
    }
}

// ============ OpenAI ============

/// Embedder backed by the OpenAI embeddings API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiEmbedder {
    endpoint: JsonEndpoint,
    model: String,
    dims: usize,
}

impl OpenAiEmbedder {
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not set or the dimension is
    /// unknown for a custom model.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::with_api_key(config, api_key)
    }

    fn with_api_key(config: &EmbeddingConfig, api_key: String) -> Result<Self> {
        let dims = config
            .dimensions()
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for OpenAI provider"))?;
        let base = config.url.as_deref().unwrap_or(OPENAI_BASE_URL);
        let endpoint = JsonEndpoint::new(
            "openai",
            format!("{}/v1/embeddings", base.trim_end_matches('/')),
            config.timeout_secs,
            config.max_retries,
        )?
        .with_bearer(api_key);

        Ok(Self {
            endpoint,
            model: config.model_name(),
            dims,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = self.endpoint.post(&body).await?;
        let vectors = parse_openai_response(&json)?;
        check_batch(texts.len(), self.dims, vectors)
    }
}

/// Parse `data[].embedding` arrays, ordered by each item's `index`.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| EmbedError::Malformed("missing data array".to_string()))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, item) in data.iter().enumerate() {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| EmbedError::Malformed("missing embedding".to_string()))?;
        let index = item
            .get("index")
            .and_then(|i| i.as_u64())
            .map(|i| i as usize)
            .unwrap_or(position);
        indexed.push((index, to_f32_vec(embedding)?));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, v)| v).collect())
}

// ============ Ollama ============

/// Embedder backed by a local Ollama instance.
///
/// Requires Ollama to be running with the model pulled
/// (e.g. `ollama pull nomic-embed-text`).
pub struct OllamaEmbedder {
    endpoint: JsonEndpoint,
    model: String,
    dims: usize,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let dims = config
            .dimensions()
            .ok_or_else(|| anyhow::anyhow!("embedding.dims required for Ollama provider"))?;
        let base = config.url.as_deref().unwrap_or(OLLAMA_BASE_URL);
        let endpoint = JsonEndpoint::new(
            "ollama",
            format!("{}/api/embed", base.trim_end_matches('/')),
            config.timeout_secs,
            config.max_retries,
        )?;

        Ok(Self {
            endpoint,
            model: config.model_name(),
            dims,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });
        let json = self.endpoint.post(&body).await?;
        let vectors = parse_ollama_response(&json)?;
        check_batch(texts.len(), self.dims, vectors)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    let embeddings = json
        .get("embeddings")
        .and_then(|e| e.as_array())
        .ok_or_else(|| EmbedError::Malformed("missing embeddings array".to_string()))?;

    embeddings
        .iter()
        .map(|embedding| {
            let values = embedding
                .as_array()
                .ok_or_else(|| EmbedError::Malformed("embedding is not an array".to_string()))?;
            to_f32_vec(values)
        })
        .collect()
}

// ============ Shared ============

fn to_f32_vec(values: &[serde_json::Value]) -> Result<Vec<f32>, EmbedError> {
    values
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| EmbedError::Malformed(format!("non-numeric component: {v}")))
        })
        .collect()
}

/// Validate a provider answer: one vector per input, all of `dims` length.
fn check_batch(
    expected: usize,
    dims: usize,
    vectors: Vec<Vec<f32>>,
) -> Result<Vec<Vec<f32>>, EmbedError> {
    if vectors.len() != expected {
        return Err(EmbedError::CountMismatch {
            expected,
            actual: vectors.len(),
        });
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
        return Err(EmbedError::DimensionMismatch {
            expected: dims,
            actual: bad.len(),
        });
    }
    Ok(vectors)
}

/// Create the [`Embedder`] named by `config.provider`.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledEmbedder`] |
/// | `"openai"` | [`OpenAiEmbedder`] |
/// | `"ollama"` | [`OllamaEmbedder`] |
/// | `"local"` | `LocalEmbedder` (feature `local-embeddings-fastembed`) |
/// | `"hash"` | [`HashEmbedder`] |
///
/// # Errors
///
/// Returns an error for unknown provider names or if the provider cannot
/// be initialized (missing API key or feature flag).
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider.as_str() {
        "disabled" => Arc::new(DisabledEmbedder),
        "openai" => Arc::new(OpenAiEmbedder::new(config)?),
        "ollama" => Arc::new(OllamaEmbedder::new(config)?),
        #[cfg(feature = "local-embeddings-fastembed")]
        "local" => Arc::new(LocalEmbedder::new(config)?),
        #[cfg(not(feature = "local-embeddings-fastembed"))]
        "local" => bail!("Local embedding provider requires --features local-embeddings-fastembed"),
        "hash" => Arc::new(HashEmbedder::new(config.dimensions().unwrap_or(256))),
        other => bail!("Unknown embedding provider: {}", other),
    };
    tracing::debug!(
        provider = %config.provider,
        model = embedder.model_name(),
        dims = embedder.dims(),
        "embedding provider ready"
    );
    Ok(embedder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openai_orders_by_index() {
        let json = serde_json::json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        });
        let vectors = parse_openai_response(&json).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_parse_openai_missing_data() {
        let err = parse_openai_response(&serde_json::json!({"error": "nope"})).unwrap_err();
        assert!(matches!(err, EmbedError::Malformed(_)));
    }

    #[test]
    fn test_parse_ollama_response() {
        let json = serde_json::json!({"embeddings": [[0.5, 0.25], [1.0, 2.0]]});
        let vectors = parse_ollama_response(&json).unwrap();
        assert_eq!(vectors, vec![vec![0.5, 0.25], vec![1.0, 2.0]]);
    }

    #[test]
    fn test_parse_ollama_rejects_non_numeric() {
        let json = serde_json::json!({"embeddings": [[0.5, "x"]]});
        assert!(matches!(
            parse_ollama_response(&json),
            Err(EmbedError::Malformed(_))
        ));
    }

    #[test]
    fn test_check_batch_count_and_dims() {
        assert!(matches!(
            check_batch(2, 2, vec![vec![1.0, 0.0]]),
            Err(EmbedError::CountMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            check_batch(1, 3, vec![vec![1.0, 0.0]]),
            Err(EmbedError::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(check_batch(1, 2, vec![vec![1.0, 0.0]]).is_ok());
    }

    #[tokio::test]
    async fn test_disabled_embedder_errors() {
        let err = DisabledEmbedder.embed(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, EmbedError::Disabled));
    }

    #[test]
    fn test_create_hash_embedder_uses_configured_dims() {
        let config = EmbeddingConfig {
            provider: "hash".to_string(),
            dims: Some(32),
            ..EmbeddingConfig::default()
        };
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.dims(), 32);
    }

    #[test]
    fn test_create_unknown_provider_fails() {
        let config = EmbeddingConfig {
            provider: "word2vec".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(create_embedder(&config).is_err());
    }

    #[test]
    fn test_openai_custom_base_url() {
        let config = EmbeddingConfig {
            url: Some("http://127.0.0.1:9/".to_string()),
            ..EmbeddingConfig::default()
        };
        let embedder = OpenAiEmbedder::with_api_key(&config, "sk-test".to_string()).unwrap();
        assert_eq!(embedder.endpoint.url(), "http://127.0.0.1:9/v1/embeddings");
        assert_eq!(embedder.model_name(), "text-embedding-3-small");
        assert_eq!(embedder.dims(), 1536);
    }
}
