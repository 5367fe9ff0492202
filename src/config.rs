//! Configuration parsing and validation.
//!
//! repo-chat reads an optional TOML file. Every section and key has a
//! default, so an empty file (or no file at all) is a valid configuration.
//!
//! # Example
//!
//! ```toml
//! [embedding]
//! provider = "openai"
//! model = "text-embedding-3-small"
//! dims = 1536
//!
//! [llm]
//! provider = "openai"
//! model = "gpt-4o-mini"
//! temperature = 0.2
//!
//! [retrieval]
//! top_k = 4
//!
//! [history]
//! max_turns = 20
//!
//! [corpus]
//! exclude_globs = ["docs/generated/**"]
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use repo_chat_core::context::ContextOptions;
use repo_chat_core::index::IndexOptions;
use repo_chat_core::session::SessionOptions;

/// Known embedding provider names.
pub const EMBEDDING_PROVIDERS: &[&str] = &["disabled", "openai", "ollama", "local", "hash"];

/// Known language-model provider names.
pub const LLM_PROVIDERS: &[&str] = &["disabled", "openai", "ollama"];

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub git: GitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Defaults per provider; see [`EmbeddingConfig::model_name`].
    #[serde(default)]
    pub model: Option<String>,
    /// Defaults per provider; see [`EmbeddingConfig::dimensions`].
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override (OpenAI-compatible server or Ollama host).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            max_input_chars: default_max_input_chars(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    /// Configured model, or the provider's default model.
    pub fn model_name(&self) -> String {
        if let Some(model) = &self.model {
            return model.clone();
        }
        match self.provider.as_str() {
            "openai" => "text-embedding-3-small",
            "ollama" => "nomic-embed-text",
            "local" => "all-minilm-l6-v2",
            "hash" => "feature-hash",
            _ => "disabled",
        }
        .to_string()
    }

    /// Configured dimensionality, or the default for the provider's
    /// default model. `None` for providers that report their own.
    pub fn dimensions(&self) -> Option<usize> {
        self.dims.or(match self.provider.as_str() {
            "openai" if self.model.is_none() => Some(1536),
            "ollama" if self.model.is_none() => Some(768),
            "hash" => Some(256),
            _ => None,
        })
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            max_input_chars: self.max_input_chars,
        }
    }
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_concurrency() -> usize {
    4
}
fn default_max_input_chars() -> usize {
    24_000
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            url: None,
            temperature: default_temperature(),
            max_tokens: None,
            max_retries: default_max_retries(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_provider() -> String {
    "openai".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    repo_chat_core::llm::DEFAULT_TEMPERATURE
}
fn default_llm_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_document_chars: default_max_document_chars(),
        }
    }
}

fn default_top_k() -> usize {
    4
}
fn default_max_document_chars() -> usize {
    8_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// `0` keeps every turn.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_turns() -> usize {
    repo_chat_core::history::DEFAULT_MAX_TURNS
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_max_file_bytes() -> u64 {
    repo_chat_core::classify::DEFAULT_MAX_FILE_BYTES
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitConfig {
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default = "default_shallow")]
    pub shallow: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            branch: None,
            shallow: default_shallow(),
        }
    }
}

fn default_shallow() -> bool {
    true
}

impl Config {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            context: ContextOptions {
                top_k: self.retrieval.top_k,
                max_document_chars: self.retrieval.max_document_chars,
            },
            temperature: self.llm.temperature,
            max_history_turns: self.history.max_turns,
        }
    }

    /// Check value ranges and provider names.
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k < 1 {
            bail!("retrieval.top_k must be >= 1");
        }
        if self.retrieval.max_document_chars == 0 {
            bail!("retrieval.max_document_chars must be > 0");
        }

        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }
        if self.embedding.concurrency == 0 {
            bail!("embedding.concurrency must be > 0");
        }
        if self.embedding.max_input_chars == 0 {
            bail!("embedding.max_input_chars must be > 0");
        }
        if !EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            bail!(
                "Unknown embedding provider: '{}'. Must be one of: {}.",
                self.embedding.provider,
                EMBEDDING_PROVIDERS.join(", ")
            );
        }
        if self.embedding.dims == Some(0) {
            bail!("embedding.dims must be > 0");
        }
        if matches!(self.embedding.provider.as_str(), "openai" | "ollama")
            && self.embedding.dimensions().is_none()
        {
            bail!(
                "embedding.dims must be specified when provider is '{}' and embedding.model is set",
                self.embedding.provider
            );
        }

        if !LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            bail!(
                "Unknown llm provider: '{}'. Must be one of: {}.",
                self.llm.provider,
                LLM_PROVIDERS.join(", ")
            );
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be in [0.0, 2.0]");
        }

        if self.corpus.max_file_bytes == 0 {
            bail!("corpus.max_file_bytes must be > 0");
        }

        Ok(())
    }
}

/// Parse and validate a TOML configuration string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load the configuration at `path`, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.embedding.provider, "openai");
        assert_eq!(config.embedding.model_name(), "text-embedding-3-small");
        assert_eq!(config.embedding.dimensions(), Some(1536));
        assert_eq!(config.llm.provider, "openai");
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.history.max_turns, 20);
        assert_eq!(config.corpus.max_file_bytes, 1024 * 1024);
        assert!(config.git.shallow);
    }

    #[test]
    fn test_partial_sections() {
        let config = parse_config(
            r#"
[embedding]
provider = "hash"
dims = 128

[llm]
provider = "disabled"

[retrieval]
top_k = 2

[corpus]
exclude_globs = ["**/fixtures/**"]
"#,
        )
        .unwrap();
        assert_eq!(config.embedding.provider, "hash");
        assert_eq!(config.embedding.dims, Some(128));
        assert_eq!(config.embedding.batch_size, 64);
        assert_eq!(config.llm.provider, "disabled");
        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.retrieval.max_document_chars, 8_000);
        assert_eq!(config.corpus.exclude_globs, vec!["**/fixtures/**"]);

        let options = config.session_options();
        assert_eq!(options.context.top_k, 2);
        assert_eq!(options.max_history_turns, 20);
    }

    #[test]
    fn test_rejects_unknown_embedding_provider() {
        let err = parse_config("[embedding]\nprovider = \"word2vec\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_rejects_unknown_llm_provider() {
        let err = parse_config("[llm]\nprovider = \"markov\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown llm provider"));
    }

    #[test]
    fn test_rejects_zero_top_k() {
        let err = parse_config("[retrieval]\ntop_k = 0\n").unwrap_err();
        assert!(err.to_string().contains("retrieval.top_k"));
    }

    #[test]
    fn test_rejects_zero_dims_for_hash() {
        let err = parse_config("[embedding]\nprovider = \"hash\"\ndims = 0\n").unwrap_err();
        assert!(err.to_string().contains("embedding.dims"));
    }

    #[test]
    fn test_custom_openai_model_requires_dims() {
        let err = parse_config("[embedding]\nmodel = \"text-embedding-3-large\"\n").unwrap_err();
        assert!(err.to_string().contains("embedding.dims must be specified"));

        let config =
            parse_config("[embedding]\nmodel = \"text-embedding-3-large\"\ndims = 3072\n").unwrap();
        assert_eq!(config.embedding.dimensions(), Some(3072));
    }

    #[test]
    fn test_provider_default_models() {
        let config = parse_config("[embedding]\nprovider = \"ollama\"\n").unwrap();
        assert_eq!(config.embedding.model_name(), "nomic-embed-text");
        assert_eq!(config.embedding.dimensions(), Some(768));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let err = parse_config("[llm]\ntemperature = 3.5\n").unwrap_err();
        assert!(err.to_string().contains("llm.temperature"));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = load_config(Some(Path::new("/nonexistent/repochat.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_without_path_is_default() {
        let config = load_config(None).unwrap();
        assert_eq!(config.retrieval.top_k, 4);
    }
}
