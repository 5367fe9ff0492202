//! Index build progress reporting.
//!
//! Progress goes to **stderr** so stdout carries only answers. The core
//! indexer calls [`IndexProgress::embedded`] once per completed batch,
//! which [`EmbeddingProgress`] forwards as [`SetupPhase::Embedding`].

use std::io::{IsTerminal, Write};

use repo_chat_core::index::IndexProgress;

/// A phase of session setup, reported by the operator shell.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SetupPhase {
    /// Cloning the repository.
    Cloning { url: String },
    /// Walking the checkout; total unknown.
    Loading,
    /// Embedding documents: `n` of `total` done.
    Embedding { n: u64, total: u64 },
}

/// Reports setup progress. Implementations write to stderr (human or JSON).
pub trait ProgressReporter: Send + Sync {
    fn report(&self, phase: SetupPhase);
}

/// Feeds index build progress into a [`ProgressReporter`].
pub struct EmbeddingProgress<'a>(pub &'a dyn ProgressReporter);

impl IndexProgress for EmbeddingProgress<'_> {
    fn embedded(&self, done: usize, total: usize) {
        self.0.report(SetupPhase::Embedding {
            n: done as u64,
            total: total as u64,
        });
    }
}

/// Human-friendly progress on stderr: "embedding  1,234 / 5,000 documents".
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, phase: SetupPhase) {
        let line = match &phase {
            SetupPhase::Cloning { url } => format!("cloning {}...\n", url),
            SetupPhase::Loading => "loading files...\n".to_string(),
            SetupPhase::Embedding { n, total } => format!(
                "embedding  {} / {} documents\n",
                format_number(*n),
                format_number(*total)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ProgressReporter for JsonProgress {
    fn report(&self, phase: SetupPhase) {
        let obj = match &phase {
            SetupPhase::Cloning { url } => serde_json::json!({
                "event": "progress",
                "phase": "cloning",
                "url": url
            }),
            SetupPhase::Loading => serde_json::json!({
                "event": "progress",
                "phase": "loading"
            }),
            SetupPhase::Embedding { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "embedding",
                "n": n,
                "total": total
            }),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", obj);
        let _ = stderr.flush();
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _phase: SetupPhase) {}
}

pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if std::io::stderr().is_terminal() {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
