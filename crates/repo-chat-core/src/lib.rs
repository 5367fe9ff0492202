//! # repo-chat core
//!
//! Retrieval-augmented question answering over a single repository snapshot:
//! data model, file classification, vector index, context assembly,
//! conversation history, prompt rendering, and the session state machine.
//!
//! This crate performs no filesystem or network I/O. Embedding and
//! completion are reached through the [`embedding::Embedder`] and
//! [`llm::LanguageModel`] capability traits, which the application crate
//! implements for concrete providers.
//!
//! ```text
//! Corpus ──▶ Index::build ──▶ SessionContext
//!                                  │
//!            question ──▶ assemble ─┼─▶ prompt ──▶ LanguageModel
//!                                  │
//!                         ConversationHistory ◀── answer
//! ```

pub mod classify;
pub mod context;
pub mod embedding;
pub mod error;
pub mod history;
pub mod index;
pub mod llm;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod prompt;
pub mod search;
pub mod session;
pub mod store;
pub mod text;
