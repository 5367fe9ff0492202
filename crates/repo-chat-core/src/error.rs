//! Error types for the question-answering pipeline.
//!
//! Setup failures ([`SessionError`]) abort session creation. Turn failures
//! ([`AskError`]) are reported to the caller and leave the session usable.

use std::path::PathBuf;

/// Failures of the embedding capability.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("embedding provider is disabled")]
    Disabled,

    #[error("embedding request failed: {0}")]
    Request(String),

    #[error("embedding provider rate limited the request")]
    RateLimited,

    #[error("malformed embedding response: {0}")]
    Malformed(String),

    #[error("embedding provider returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("nothing to embed")]
    EmptyInput,
}

/// Failures of the language-model capability.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("language model provider is disabled")]
    Disabled,

    #[error("completion request failed: {0}")]
    Request(String),

    #[error("language model provider rate limited the request")]
    RateLimited,

    #[error("malformed completion response: {0}")]
    Malformed(String),

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },
}

/// Errors that prevent a session from being created.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The repository contains no indexable text files.
    #[error("no indexable files found under {}", root.display())]
    EmptyCorpus { root: PathBuf },

    /// The repository root could not be read.
    #[error("failed to read repository at {}: {source}", root.display())]
    Io {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Embedding the corpus failed.
    #[error("index build failed: {0}")]
    IndexBuild(#[source] EmbedError),
}

/// Errors of a single question. The session survives all of them except
/// [`AskError::Closed`].
#[derive(Debug, thiserror::Error)]
pub enum AskError {
    #[error("question is empty")]
    EmptyQuestion,

    /// Embedding the question failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] EmbedError),

    #[error("language model error: {0}")]
    LanguageModel(#[from] LlmError),

    #[error("session is closed")]
    Closed,
}
