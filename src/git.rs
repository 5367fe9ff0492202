//! Repository acquisition through the `git` command line.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

use crate::config::GitConfig;

/// Clone `url` into `dest` (shallow and single-branch unless configured
/// otherwise). `dest` must not exist or be empty.
pub fn clone_repository(url: &str, dest: &Path, options: &GitConfig) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create clone directory: {}", dest.display()))?;

    let mut cmd = Command::new("git");
    cmd.arg("clone");
    if let Some(branch) = &options.branch {
        cmd.args(["--branch", branch, "--single-branch"]);
    }
    if options.shallow {
        cmd.args(["--depth", "1"]);
    }
    cmd.arg("--").arg(url).arg(dest);

    tracing::debug!(url, dest = %dest.display(), shallow = options.shallow, "git clone");
    let output = cmd
        .output()
        .with_context(|| "Failed to execute 'git clone'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git clone failed: {}", stderr.trim());
    }

    Ok(())
}

/// SHA of the checked-out commit.
pub fn head_sha(repo_dir: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(repo_dir)
        .output()
        .with_context(|| "Failed to get HEAD SHA")?;

    if !output.status.success() {
        bail!("git rev-parse HEAD failed");
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Repository name: the last path segment of `url`, without a trailing
/// `/` or `.git`. Works for https, ssh (`git@host:org/repo.git`) and local
/// paths.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':', '\\'])
        .next()
        .unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        trimmed.to_string()
    } else {
        name.to_string()
    }
}
