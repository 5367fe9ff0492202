//! Session statistics for the `/stats` shell command.
//!
//! A quick summary of what was indexed: document and byte counts, the
//! per-extension breakdown, the embedding model, and how many turns the
//! conversation has had.

use repo_chat_core::session::SessionContext;

use crate::loader::LoadReport;
use crate::progress::format_number;

/// Render the summary as a block of text. `revision` is the checked-out
/// commit, when the checkout is a Git work tree.
pub fn render_stats(
    session: &SessionContext,
    report: Option<&LoadReport>,
    revision: Option<&str>,
) -> String {
    let index = session.index();
    let total_bytes: u64 = index
        .documents()
        .iter()
        .map(|d| d.content().len() as u64)
        .sum();

    let mut out = String::new();
    out.push_str(&format!("{} ({})\n", session.repo().name, session.repo().url));
    out.push_str(&format!("{}\n\n", "=".repeat(32)));
    if let Some(revision) = revision {
        let short = revision.get(..12).unwrap_or(revision);
        out.push_str(&format!("  Revision:    {}\n", short));
    }
    out.push_str(&format!(
        "  Documents:   {}\n",
        format_number(index.len() as u64)
    ));
    out.push_str(&format!("  Size:        {}\n", format_bytes(total_bytes)));
    out.push_str(&format!(
        "  Embeddings:  {} ({} dims)\n",
        index.model_name(),
        index.dims()
    ));
    out.push_str(&format!(
        "  Turns:       {} ({} in context)\n",
        session.history().total_turns(),
        session.history().len()
    ));

    if let Some(report) = report {
        out.push_str(&format!(
            "  Skipped:     {} excluded, {} not UTF-8, {} unreadable\n",
            report.skipped, report.undecodable, report.unreadable
        ));
    }

    let mut by_count: Vec<(&str, usize)> = session.file_type_counts().iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    if !by_count.is_empty() {
        out.push_str("\n  By extension:\n");
        out.push_str(&format!("  {:<16} {:>8}\n", "EXTENSION", "FILES"));
        out.push_str(&format!("  {}\n", "-".repeat(25)));
        for (ext, count) in by_count {
            let label = if ext.is_empty() { "(none)" } else { ext };
            out.push_str(&format!("  {:<16} {:>8}\n", label, count));
        }
    }

    out
}

/// Format a byte count as a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
