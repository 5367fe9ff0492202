//! Test doubles for the embedding and language-model capabilities.
//!
//! Compiled for this crate's own tests and, through the `mock` feature,
//! for dependent crates' tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::embedding::{Embedder, HashEmbedder};
use crate::error::{EmbedError, LlmError};
use crate::llm::LanguageModel;

/// Scripted language model that records every prompt it receives.
#[derive(Debug, Clone)]
pub struct MockModel {
    responses: Arc<Mutex<Vec<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<(String, f32)>>>,
    pub default_response: String,
    pub fail: bool,
}

impl Default for MockModel {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock answer".into(),
            fail: false,
        }
    }
}

impl MockModel {
    /// Answer with `responses` in order, then with `default_response`.
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            ..Self::default()
        }
    }

    /// Play back a script of successes and failures (`Err` carries the
    /// request error message).
    #[must_use]
    pub fn with_script(script: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(script)),
            ..Self::default()
        }
    }

    /// Fail every call.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Prompts received so far, with their temperatures.
    pub fn prompts(&self) -> Vec<(String, f32)> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().map(|(p, _)| p.clone())
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), temperature));
        if self.fail {
            return Err(LlmError::Request("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            responses.remove(0).map_err(LlmError::Request)
        }
    }
}

/// Embedder that misbehaves on purpose.
#[derive(Debug, Clone)]
pub struct FixedEmbedder {
    dims: usize,
    returned_dims: usize,
    fail: bool,
    short_by_one: bool,
}

impl FixedEmbedder {
    /// Every call fails with [`EmbedError::Request`].
    pub fn failing() -> Self {
        Self {
            dims: 4,
            returned_dims: 4,
            fail: true,
            short_by_one: false,
        }
    }

    /// Every call returns one vector fewer than requested.
    pub fn short_by_one(dims: usize) -> Self {
        Self {
            dims,
            returned_dims: dims,
            fail: false,
            short_by_one: true,
        }
    }

    /// Reports `reported` dimensions but returns vectors of `actual`.
    pub fn misreporting(reported: usize, actual: usize) -> Self {
        Self {
            dims: reported,
            returned_dims: actual,
            fail: false,
            short_by_one: false,
        }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if self.fail {
            return Err(EmbedError::Request("mock embedding error".into()));
        }
        let n = if self.short_by_one {
            texts.len().saturating_sub(1)
        } else {
            texts.len()
        };
        Ok(vec![vec![1.0; self.returned_dims]; n])
    }
}

/// [`HashEmbedder`] wrapper that counts calls and embedded texts, and can
/// be switched to fail for query-time tests.
#[derive(Debug)]
pub struct CountingEmbedder {
    inner: HashEmbedder,
    calls: AtomicUsize,
    texts: AtomicUsize,
    fail_after: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            inner: HashEmbedder::new(dims),
            calls: AtomicUsize::new(0),
            texts: AtomicUsize::new(0),
            fail_after: AtomicUsize::new(usize::MAX),
        }
    }

    /// Fail every call once `calls` calls have succeeded.
    pub fn fail_after(&self, calls: usize) {
        self.fail_after.store(calls, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    fn model_name(&self) -> &str {
        "counting"
    }

    fn dims(&self) -> usize {
        self.inner.dims()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if self.calls.load(Ordering::SeqCst) >= self.fail_after.load(Ordering::SeqCst) {
            return Err(EmbedError::Request("embedding service unavailable".into()));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed(texts).await
    }
}
