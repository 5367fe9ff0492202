//! Session setup: load a checkout, index it, open a [`SessionContext`].

use std::path::Path;
use std::sync::Arc;

use repo_chat_core::embedding::Embedder;
use repo_chat_core::error::SessionError;
use repo_chat_core::models::RepoIdentity;
use repo_chat_core::session::SessionContext;

use crate::config::Config;
use crate::loader::{load_corpus, LoadReport};
use crate::progress::{EmbeddingProgress, ProgressReporter, SetupPhase};

/// Load and index the repository checked out at `local_repo_path`.
///
/// # Errors
///
/// Fails when the checkout cannot be read, contains no indexable files, or
/// cannot be embedded.
pub async fn create_session(
    local_repo_path: &Path,
    repo_name: &str,
    repo_url: &str,
    config: &Config,
    embedder: Arc<dyn Embedder>,
    progress: &dyn ProgressReporter,
) -> Result<SessionContext, SessionError> {
    create_session_with_report(local_repo_path, repo_name, repo_url, config, embedder, progress)
        .await
        .map(|(session, _)| session)
}

/// Like [`create_session`], also returning what the loader skipped.
pub async fn create_session_with_report(
    local_repo_path: &Path,
    repo_name: &str,
    repo_url: &str,
    config: &Config,
    embedder: Arc<dyn Embedder>,
    progress: &dyn ProgressReporter,
) -> Result<(SessionContext, LoadReport), SessionError> {
    progress.report(SetupPhase::Loading);

    let root = local_repo_path.to_path_buf();
    let corpus_config = config.corpus.clone();
    let (corpus, report) = tokio::task::spawn_blocking(move || load_corpus(&root, &corpus_config))
        .await
        .map_err(|e| SessionError::Io {
            root: local_repo_path.to_path_buf(),
            source: std::io::Error::other(e),
        })??;

    let session = SessionContext::create(
        corpus,
        RepoIdentity::new(repo_name, repo_url),
        embedder,
        config.session_options(),
        &config.embedding.index_options(),
        &EmbeddingProgress(progress),
    )
    .await?;

    Ok((session, report))
}
