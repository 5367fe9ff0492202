//! Session state and the answering engine.
//!
//! A [`SessionContext`] owns everything one conversation needs: the index,
//! corpus metadata, repository identity and history. It is created once per
//! repository and passed by `&mut` into [`SessionContext::ask`] for each
//! question.
//!
//! ```text
//! Uninitialized ──create──▶ Indexed ──▶ AwaitingQuestion ⇄ Answering
//!                                              │
//!                                            close ──▶ Closed
//! ```

use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::context::{assemble, ContextOptions};
use crate::embedding::Embedder;
use crate::error::{AskError, LlmError, SessionError};
use crate::history::{ConversationHistory, DEFAULT_MAX_TURNS};
use crate::index::{Index, IndexOptions, IndexProgress};
use crate::llm::{LanguageModel, DEFAULT_TEMPERATURE};
use crate::models::{Corpus, FileTypeCounts, RepoIdentity};
use crate::prompt::{render_prompt, PromptVars};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Indexed,
    AwaitingQuestion,
    Answering,
    Closed,
}

/// Per-session answering settings.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub context: ContextOptions,
    pub temperature: f32,
    /// Turns kept in the prompt; `0` keeps every turn.
    pub max_history_turns: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            context: ContextOptions::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_history_turns: DEFAULT_MAX_TURNS,
        }
    }
}

/// A successful answer and the documents that informed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Paths of the retrieved documents, best match first.
    pub sources: Vec<String>,
}

/// All state of one question-answering session.
#[derive(Debug)]
pub struct SessionContext {
    id: Uuid,
    repo: RepoIdentity,
    index: Index,
    file_type_counts: FileTypeCounts,
    filenames: Vec<String>,
    history: ConversationHistory,
    state: SessionState,
    options: SessionOptions,
}

impl SessionContext {
    /// Index `corpus` and open a session over it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IndexBuild`] if embedding the corpus fails.
    pub async fn create(
        corpus: Corpus,
        repo: RepoIdentity,
        embedder: Arc<dyn Embedder>,
        options: SessionOptions,
        index_options: &IndexOptions,
        progress: &dyn IndexProgress,
    ) -> Result<Self, SessionError> {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("session", id = %id, repo = %repo.name);

        async move {
            let (documents, file_type_counts, filenames) = corpus.into_parts();
            tracing::debug!(documents = documents.len(), "building index");

            let index = Index::build(documents, embedder, index_options, progress)
                .await
                .map_err(SessionError::IndexBuild)?;
            tracing::debug!(state = ?SessionState::Indexed, "index ready");

            let history = ConversationHistory::with_max_turns(options.max_history_turns);
            Ok(Self {
                id,
                repo,
                index,
                file_type_counts,
                filenames,
                history,
                state: SessionState::AwaitingQuestion,
                options,
            })
        }
        .instrument(span)
        .await
    }

    /// Answer one question.
    ///
    /// On success the turn is appended to the history. On failure, or when
    /// the returned future is dropped before completing, the history is
    /// left untouched and the session stays usable.
    ///
    /// # Errors
    ///
    /// See [`AskError`].
    pub async fn ask(
        &mut self,
        model: &dyn LanguageModel,
        question: &str,
    ) -> Result<Answer, AskError> {
        if self.state == SessionState::Closed {
            return Err(AskError::Closed);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(AskError::EmptyQuestion);
        }

        let span = tracing::info_span!("session", id = %self.id, repo = %self.repo.name);
        self.state = SessionState::Answering;
        let result = self.answer(model, question).instrument(span).await;
        self.state = SessionState::AwaitingQuestion;

        let answer = result?;
        self.history.append(question, answer.text.clone());
        tracing::info!(
            turns = self.history.total_turns(),
            sources = answer.sources.len(),
            "question answered"
        );
        Ok(answer)
    }

    async fn answer(&self, model: &dyn LanguageModel, question: &str) -> Result<Answer, AskError> {
        let context = assemble(&self.index, question, &self.options.context)
            .await
            .map_err(AskError::Retrieval)?;
        tracing::debug!(hits = context.sources.len(), "context assembled");

        let conversation = self.history.render();
        let prompt = render_prompt(&PromptVars {
            repo_name: &self.repo.name,
            github_url: &self.repo.url,
            conversation_history: &conversation,
            numbered_documents: &context.text,
            question,
            file_type_counts: &self.file_type_counts,
            filenames: &self.filenames,
        });

        let text = model.complete(&prompt, self.options.temperature).await?;
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: model.name().to_string(),
            }
            .into());
        }

        Ok(Answer {
            text,
            sources: context.sources.into_iter().map(|(path, _)| path).collect(),
        })
    }

    /// End the session. Further questions fail with [`AskError::Closed`].
    pub fn close(&mut self) {
        if self.state != SessionState::Closed {
            tracing::debug!(id = %self.id, turns = self.history.total_turns(), "session closed");
        }
        self.state = SessionState::Closed;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn repo(&self) -> &RepoIdentity {
        &self.repo
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn file_type_counts(&self) -> &FileTypeCounts {
        &self.file_type_counts
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}
