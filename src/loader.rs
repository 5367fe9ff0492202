//! Corpus loader: walks a checked-out repository into a [`Corpus`].
//!
//! The walk is sorted by file name so a given snapshot always loads in the
//! same order. Directories the classifier rejects are pruned before they
//! are entered. Files that cannot be read or are not valid UTF-8 are
//! skipped and counted in the [`LoadReport`].

use std::io;
use std::path::Path;

use walkdir::WalkDir;

use repo_chat_core::classify::{Classification, FileClassifier};
use repo_chat_core::error::SessionError;
use repo_chat_core::models::{Corpus, CorpusBuilder, Document};

use crate::config::CorpusConfig;

/// What happened to the files seen during one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Regular files visited.
    pub scanned: usize,
    /// Files loaded as documents.
    pub indexed: usize,
    /// Files rejected by the classifier.
    pub skipped: usize,
    /// Files that were not valid UTF-8.
    pub undecodable: usize,
    /// Entries that could not be read.
    pub unreadable: usize,
    /// Files whose relative path was already loaded.
    pub duplicates: usize,
}

/// Load every indexable text file under `root`.
///
/// # Errors
///
/// Returns [`SessionError::Io`] if `root` is missing or not a directory or
/// an exclude glob is invalid, and [`SessionError::EmptyCorpus`] if nothing
/// indexable was found.
pub fn load_corpus(root: &Path, options: &CorpusConfig) -> Result<(Corpus, LoadReport), SessionError> {
    let io_error = |source: io::Error| SessionError::Io {
        root: root.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(root).map_err(io_error)?;
    if !metadata.is_dir() {
        return Err(io_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }

    let classifier = FileClassifier::new(&options.exclude_globs, options.max_file_bytes)
        .map_err(|e| io_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

    let mut builder = CorpusBuilder::new();
    let mut report = LoadReport::default();

    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || classifier.should_descend(&relative_path(root, entry.path()))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry");
                report.unreadable += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        report.scanned += 1;

        let path = entry.path();
        let rel = relative_path(root, path);
        let size = entry.metadata().ok().map(|m| m.len());

        if let Classification::Skip(reason) = classifier.classify(&rel, size) {
            tracing::trace!(path = %rel, ?reason, "skipped");
            report.skipped += 1;
            continue;
        }

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(path = %rel, error = %err, "skipping unreadable file");
                report.unreadable += 1;
                continue;
            }
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                tracing::debug!(path = %rel, "skipping file that is not valid UTF-8");
                report.undecodable += 1;
                continue;
            }
        };

        if builder.push(Document::new(rel.clone(), content)) {
            report.indexed += 1;
        } else {
            tracing::warn!(path = %rel, "skipping duplicate path");
            report.duplicates += 1;
        }
    }

    tracing::info!(
        root = %root.display(),
        scanned = report.scanned,
        indexed = report.indexed,
        skipped = report.skipped,
        undecodable = report.undecodable,
        unreadable = report.unreadable,
        duplicates = report.duplicates,
        "corpus loaded"
    );

    let corpus = builder.finish(root)?;
    Ok((corpus, report))
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
