//! Context assembly: the numbered document block placed in the prompt.

use crate::error::EmbedError;
use crate::index::Index;
use crate::search::ScoredDocument;
use crate::text::truncate_to_boundary;

/// Placed in the prompt when retrieval found nothing.
pub const NO_CONTEXT_MARKER: &str = "(no relevant documents found)";

/// Joins rendered documents.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Retrieval settings for one question.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Documents to retrieve per question.
    pub top_k: usize,
    /// Per-document body limit in bytes.
    pub max_document_chars: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            top_k: 4,
            max_document_chars: 8_000,
        }
    }
}

/// The rendered context and the documents it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub text: String,
    /// `(path, score)` of each included document, in rendered order.
    pub sources: Vec<(String, f32)>,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Retrieve the documents most relevant to `question` and render them.
///
/// # Errors
///
/// Returns an error if the question cannot be embedded.
pub async fn assemble(
    index: &Index,
    question: &str,
    options: &ContextOptions,
) -> Result<AssembledContext, EmbedError> {
    let hits = index.query(question, options.top_k).await?;
    Ok(AssembledContext {
        text: render_numbered(&hits, options.max_document_chars),
        sources: hits
            .iter()
            .map(|h| (h.document.path().to_string(), h.score))
            .collect(),
    })
}

/// Render hits as `1. <path>\n<content>` entries in the given order.
///
/// Returns [`NO_CONTEXT_MARKER`] when `hits` is empty.
pub fn render_numbered(hits: &[ScoredDocument<'_>], max_document_chars: usize) -> String {
    if hits.is_empty() {
        return NO_CONTEXT_MARKER.to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            let content = hit.document.content();
            let body = truncate_to_boundary(content, max_document_chars);
            let mut entry = format!("{}. {}\n{}", i + 1, hit.document.path(), body);
            if body.len() < content.len() {
                entry.push_str(TRUNCATION_MARKER);
            }
            entry
        })
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}
