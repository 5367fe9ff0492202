//! Core data models for a loaded repository snapshot.
//!
//! A [`Corpus`] is what the loader hands to the index: the documents, a
//! per-extension count, and the ordered list of retained paths. The three
//! are kept in lock-step by [`CorpusBuilder`], so every document is counted
//! once and listed once.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::error::SessionError;

/// One loaded text file. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: String,
    content: String,
}

impl Document {
    /// Create a document. `path` is stored as given; callers join
    /// components with `/`.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Path relative to the repository root, `/`-separated.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Lowercase extension without the dot, or `""` when there is none.
    pub fn extension(&self) -> String {
        extension_of(&self.path)
    }
}

/// Lowercase extension of `path` without the dot; `""` for extensionless
/// files and dotfiles such as `.gitignore`.
pub fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Number of documents per file extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileTypeCounts(BTreeMap<String, usize>);

impl FileTypeCounts {
    pub fn record(&mut self, extension: &str) {
        *self.0.entry(extension.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, extension: &str) -> usize {
        self.0.get(extension).copied().unwrap_or(0)
    }

    /// Sum of all counts; equals the number of documents.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Accumulates documents during a directory walk.
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    documents: Vec<Document>,
    file_type_counts: FileTypeCounts,
    filenames: Vec<String>,
    seen: HashSet<String>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. Returns `false` (and drops the document) if a
    /// document with the same path was already added.
    pub fn push(&mut self, document: Document) -> bool {
        if !self.seen.insert(document.path().to_string()) {
            return false;
        }
        self.file_type_counts.record(&document.extension());
        self.filenames.push(document.path().to_string());
        self.documents.push(document);
        true
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Finish the walk rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyCorpus`] if no document was added.
    pub fn finish(self, root: &Path) -> Result<Corpus, SessionError> {
        if self.documents.is_empty() {
            return Err(SessionError::EmptyCorpus {
                root: root.to_path_buf(),
            });
        }
        Ok(Corpus {
            documents: self.documents,
            file_type_counts: self.file_type_counts,
            filenames: self.filenames,
        })
    }
}

/// A non-empty set of loaded documents with their summary statistics.
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
    file_type_counts: FileTypeCounts,
    filenames: Vec<String>,
}

impl Corpus {
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn file_type_counts(&self) -> &FileTypeCounts {
        &self.file_type_counts
    }

    /// Retained paths in traversal order.
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Split into documents, counts, and filenames.
    pub fn into_parts(self) -> (Vec<Document>, FileTypeCounts, Vec<String>) {
        (self.documents, self.file_type_counts, self.filenames)
    }
}

/// Name and source URL of the repository being discussed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoIdentity {
    pub name: String,
    pub url: String,
}

impl RepoIdentity {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_normalization() {
        assert_eq!(extension_of("src/Main.RS"), "rs");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".gitignore"), "");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
    }

    #[test]
    fn test_document_path_kept_verbatim() {
        let doc = Document::new("src\\lib.rs", "fn main() {}");
        assert_eq!(doc.path(), "src\\lib.rs");
        assert_eq!(doc.extension(), "rs");
    }

    #[test]
    fn test_builder_keeps_counts_and_names_in_step() {
        let mut builder = CorpusBuilder::new();
        assert!(builder.push(Document::new("README.md", "A tool.")));
        assert!(builder.push(Document::new("src/main.rs", "fn main() {}")));
        assert!(builder.push(Document::new("src/lib.rs", "pub mod x;")));
        assert!(builder.push(Document::new("LICENSE", "MIT")));

        let corpus = builder.finish(Path::new("/repo")).unwrap();
        assert_eq!(corpus.len(), 4);
        assert_eq!(corpus.file_type_counts().total(), corpus.len());
        assert_eq!(corpus.file_type_counts().get("rs"), 2);
        assert_eq!(corpus.file_type_counts().get(""), 1);
        assert_eq!(
            corpus.filenames(),
            &["README.md", "src/main.rs", "src/lib.rs", "LICENSE"]
        );
    }

    #[test]
    fn test_builder_rejects_duplicate_paths() {
        let mut builder = CorpusBuilder::new();
        assert!(builder.push(Document::new("a.txt", "one")));
        assert!(!builder.push(Document::new("a.txt", "two")));
        let corpus = builder.finish(Path::new(".")).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.filenames().len(), 1);
        assert_eq!(corpus.documents()[0].content(), "one");
    }

    #[test]
    fn test_empty_builder_is_empty_corpus() {
        let err = CorpusBuilder::new().finish(Path::new("/empty")).unwrap_err();
        assert!(matches!(err, SessionError::EmptyCorpus { .. }));
    }

    #[test]
    fn test_file_type_counts_serialize_sorted() {
        let mut counts = FileTypeCounts::default();
        counts.record("rs");
        counts.record("md");
        counts.record("rs");
        assert_eq!(
            serde_json::to_string(&counts).unwrap(),
            r#"{"md":1,"rs":2}"#
        );
    }
}
