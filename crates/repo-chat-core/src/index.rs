//! Index construction and querying.
//!
//! [`Index::build`] embeds every document exactly once and stores the
//! vectors in a [`VectorArena`]. Batches are sent to the embedder
//! concurrently through an ordered buffered stream, so vectors come back
//! in load order no matter which request finishes first. The build is
//! all-or-nothing: any failed batch fails the whole build.
//!
//! [`Index::query`] embeds the question with the same embedder and runs
//! [`search::top_k`](crate::search::top_k) over the arena.

use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::embedding::Embedder;
use crate::error::EmbedError;
use crate::models::Document;
use crate::search::{top_k, ScoredDocument};
use crate::store::VectorArena;
use crate::text::truncate_to_boundary;

/// Tuning for [`Index::build`].
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Embedding requests in flight at once.
    pub concurrency: usize,
    /// Embedding input is cut to this many bytes (on a char boundary).
    pub max_input_chars: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            batch_size: 64,
            concurrency: 4,
            max_input_chars: 24_000,
        }
    }
}

/// Receives progress while an index is being built.
pub trait IndexProgress: Send + Sync {
    /// Called after each batch completes, in batch order.
    fn embedded(&self, done: usize, total: usize);
}

/// Progress sink that ignores all events.
pub struct NoProgress;

impl IndexProgress for NoProgress {
    fn embedded(&self, _done: usize, _total: usize) {}
}

/// Similarity index over a fixed set of documents.
pub struct Index {
    arena: VectorArena,
    embedder: Arc<dyn Embedder>,
    max_input_chars: usize,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("documents", &self.arena.len())
            .field("dims", &self.arena.dims())
            .field("model", &self.embedder.model_name())
            .finish()
    }
}

impl Index {
    /// Embed `documents` and build the index.
    ///
    /// # Errors
    ///
    /// Returns [`EmbedError::EmptyInput`] for an empty document set, or the
    /// first error raised by the embedder. Vector counts are validated per
    /// batch; dimensions are validated against [`Embedder::dims`] when the
    /// embedder reports one.
    pub async fn build(
        documents: Vec<Document>,
        embedder: Arc<dyn Embedder>,
        options: &IndexOptions,
        progress: &dyn IndexProgress,
    ) -> Result<Self, EmbedError> {
        if documents.is_empty() {
            return Err(EmbedError::EmptyInput);
        }

        let total = documents.len();
        let batch_size = options.batch_size.max(1);
        let max_chars = options.max_input_chars;
        let texts: Vec<String> = documents
            .iter()
            .map(|d| truncate_to_boundary(d.content(), max_chars).to_string())
            .collect();

        tracing::debug!(
            documents = total,
            batch_size,
            concurrency = options.concurrency,
            model = embedder.model_name(),
            "embedding corpus"
        );

        let mut batches = stream::iter(texts.chunks(batch_size).map(|batch| {
            let embedder = Arc::clone(&embedder);
            async move {
                let vectors = embedder.embed(batch).await?;
                if vectors.len() != batch.len() {
                    return Err(EmbedError::CountMismatch {
                        expected: batch.len(),
                        actual: vectors.len(),
                    });
                }
                Ok(vectors)
            }
        }))
        .buffered(options.concurrency.max(1));

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);
        while let Some(batch) = batches.next().await {
            vectors.extend(batch?);
            progress.embedded(vectors.len(), total);
        }
        drop(batches);

        let dims = vectors.first().map(Vec::len).unwrap_or(0);
        if dims == 0 {
            return Err(EmbedError::Malformed(
                "provider returned empty vectors".to_string(),
            ));
        }
        let reported = embedder.dims();
        if reported != 0 && dims != reported {
            return Err(EmbedError::DimensionMismatch {
                expected: reported,
                actual: dims,
            });
        }

        let mut arena = VectorArena::with_capacity(dims, total);
        for (document, vector) in documents.into_iter().zip(vectors) {
            arena.push(document, vector)?;
        }

        tracing::info!(
            documents = arena.len(),
            dims,
            model = embedder.model_name(),
            "index built"
        );

        Ok(Self {
            arena,
            embedder,
            max_input_chars: max_chars,
        })
    }

    /// Return the `k` documents most similar to `question`, best first.
    ///
    /// `k` is clamped to the number of indexed documents.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the question fails or the question
    /// vector has the wrong dimension.
    pub async fn query(&self, question: &str, k: usize) -> Result<Vec<ScoredDocument<'_>>, EmbedError> {
        let text = truncate_to_boundary(question, self.max_input_chars);
        let query_vec = self.embedder.embed_query(text).await?;
        if query_vec.len() != self.arena.dims() {
            return Err(EmbedError::DimensionMismatch {
                expected: self.arena.dims(),
                actual: query_vec.len(),
            });
        }
        Ok(top_k(&self.arena, &query_vec, k))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Always `false` for a built index.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.arena.dims()
    }

    pub fn arena(&self) -> &VectorArena {
        &self.arena
    }

    pub fn documents(&self) -> &[Document] {
        self.arena.documents()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::mock::{CountingEmbedder, FixedEmbedder};
    use std::sync::Mutex;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("README.md", "A command line tool for parsing logs."),
            Document::new("src/parser.rs", "fn parse_line(line: &str) -> Entry { todo!() }"),
            Document::new("src/render.rs", "fn render_table(rows: &[Row]) -> String"),
            Document::new("Makefile", "build:\n\tcargo build --release"),
        ]
    }

    fn hash() -> Arc<dyn Embedder> {
        Arc::new(HashEmbedder::new(256))
    }

    #[tokio::test]
    async fn test_build_embeds_every_document_once() {
        let embedder = Arc::new(CountingEmbedder::new(8));
        let options = IndexOptions {
            batch_size: 3,
            concurrency: 2,
            ..IndexOptions::default()
        };
        let index = Index::build(docs(), embedder.clone(), &options, &NoProgress)
            .await
            .unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(embedder.texts_embedded(), 4);
        assert_eq!(embedder.calls(), 2);
    }

    #[tokio::test]
    async fn test_build_preserves_load_order() {
        let options = IndexOptions {
            batch_size: 1,
            concurrency: 4,
            ..IndexOptions::default()
        };
        let index = Index::build(docs(), hash(), &options, &NoProgress)
            .await
            .unwrap();
        let paths: Vec<&str> = index.documents().iter().map(|d| d.path()).collect();
        assert_eq!(
            paths,
            vec!["README.md", "src/parser.rs", "src/render.rs", "Makefile"]
        );
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let err = Index::build(Vec::new(), hash(), &IndexOptions::default(), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::EmptyInput));
    }

    #[tokio::test]
    async fn test_embedder_failure_fails_build() {
        let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder::failing());
        let err = Index::build(docs(), embedder, &IndexOptions::default(), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::Request(_)));
    }

    #[tokio::test]
    async fn test_count_mismatch_detected() {
        let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder::short_by_one(4));
        let err = Index::build(docs(), embedder, &IndexOptions::default(), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::CountMismatch { .. }));
    }

    #[tokio::test]
    async fn test_vectors_must_match_reported_dims() {
        let embedder: Arc<dyn Embedder> = Arc::new(FixedEmbedder::misreporting(8, 4));
        let err = Index::build(docs(), embedder, &IndexOptions::default(), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EmbedError::DimensionMismatch {
                expected: 8,
                actual: 4
            }
        ));
    }

    #[tokio::test]
    async fn test_punctuation_only_document_found_by_its_content() {
        let documents = vec![
            Document::new("README.md", "A tool for X."),
            Document::new("empty.json", "{}"),
            Document::new("rule.txt", "---"),
        ];
        let index = Index::build(documents, hash(), &IndexOptions::default(), &NoProgress)
            .await
            .unwrap();
        let hits = index.query("{}", 3).await.unwrap();
        assert_eq!(hits[0].document.path(), "empty.json");
        let hits = index.query("---", 3).await.unwrap();
        assert_eq!(hits[0].document.path(), "rule.txt");
    }

    #[tokio::test]
    async fn test_self_similarity_is_top_result() {
        let index = Index::build(docs(), hash(), &IndexOptions::default(), &NoProgress)
            .await
            .unwrap();
        for doc in docs() {
            let hits = index.query(doc.content(), 4).await.unwrap();
            assert_eq!(hits[0].document.path(), doc.path());
        }
    }

    #[tokio::test]
    async fn test_query_clamps_and_sorts() {
        let index = Index::build(docs(), hash(), &IndexOptions::default(), &NoProgress)
            .await
            .unwrap();
        let hits = index.query("parse a log line", 10).await.unwrap();
        assert_eq!(hits.len(), 4);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(index.query("parse", 0).await.unwrap().is_empty());
    }

    struct RecordingProgress(Mutex<Vec<(usize, usize)>>);

    impl IndexProgress for RecordingProgress {
        fn embedded(&self, done: usize, total: usize) {
            self.0.lock().unwrap().push((done, total));
        }
    }

    #[tokio::test]
    async fn test_progress_reported_per_batch() {
        let progress = RecordingProgress(Mutex::new(Vec::new()));
        let options = IndexOptions {
            batch_size: 3,
            ..IndexOptions::default()
        };
        Index::build(docs(), hash(), &options, &progress)
            .await
            .unwrap();
        assert_eq!(*progress.0.lock().unwrap(), vec![(3, 4), (4, 4)]);
    }

    #[tokio::test]
    async fn test_long_content_truncated_consistently() {
        let long = "token ".repeat(10_000);
        let documents = vec![
            Document::new("long.txt", long.clone()),
            Document::new("short.txt", "other words entirely"),
        ];
        let options = IndexOptions {
            max_input_chars: 100,
            ..IndexOptions::default()
        };
        let index = Index::build(documents, hash(), &options, &NoProgress)
            .await
            .unwrap();
        let hits = index.query(&long, 1).await.unwrap();
        assert_eq!(hits[0].document.path(), "long.txt");
        // The stored document keeps its full content.
        assert_eq!(hits[0].document.content().len(), long.len());
    }
}
