//! # repo-chat
//!
//! Ask questions about a Git repository. The repository is cloned, its text
//! files are embedded into an in-memory vector index, and each question is
//! answered by a language model from the most similar files plus the
//! conversation so far.
//!
//! The pipeline itself (classification, indexing, context assembly, history,
//! session state) lives in [`repo_chat_core`]. This crate supplies the I/O
//! around it: configuration, the filesystem walk, cloning, and the HTTP
//! providers.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────┐
//! │ git clone│──▶│  Loader  │──▶│  Indexer   │──▶│ Session  │◀── prompt loop
//! └──────────┘   │ classify │   │ embed+store│   │ ask()    │
//!                └──────────┘   └────────────┘   └────┬─────┘
//!                                                     ▼
//!                                              ┌─────────────┐
//!                                              │ LLM provider│
//!                                              └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`loader`] | Walk a checkout into a corpus |
//! | [`git`] | Clone repositories |
//! | [`http`] | JSON-over-HTTP with retry |
//! | [`embedding`] | Embedding providers |
//! | [`llm`] | Language-model providers |
//! | [`session`] | Load, index, and open a session |
//! | [`progress`] | Setup progress reporting |
//! | [`stats`] | `/stats` summary |
//! | [`shell`] | Prompt commands |

pub mod config;
pub mod embedding;
pub mod git;
pub mod http;
pub mod llm;
pub mod loader;
pub mod progress;
pub mod session;
pub mod shell;
pub mod stats;
