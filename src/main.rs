//! # repochat
//!
//! Clone a repository, index its text files, and answer questions about it
//! in an interactive prompt.
//!
//! ## Usage
//!
//! ```bash
//! repochat https://github.com/owner/project.git
//! repochat --path ./checkout --name project
//! repochat --config ./repochat.toml --top-k 6 <url>
//! ```
//!
//! ## Prompt commands
//!
//! | Input | Effect |
//! |-------|--------|
//! | `exit()` | Quit (any case) |
//! | `/history` | Show the conversation so far |
//! | `/stats` | Show what was indexed |
//! | `/help` | List commands |
//! | anything else | Ask it as a question |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `repo_chat=warn,repo_chat_core=warn`).

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use repo_chat::config::load_config;
use repo_chat::embedding::create_embedder;
use repo_chat::git::{clone_repository, head_sha, repo_name_from_url};
use repo_chat::llm::create_model;
use repo_chat::progress::{ProgressMode, SetupPhase};
use repo_chat::session::create_session_with_report;
use repo_chat::shell::{parse_command, render_history, ShellCommand, HELP, PROMPT};
use repo_chat::stats::render_stats;
use repo_chat_core::error::SessionError;

/// Ask questions about a Git repository.
#[derive(Parser)]
#[command(name = "repochat", version, about)]
struct Cli {
    /// Git URL of the repository. Prompted for when neither this nor
    /// `--path` is given.
    url: Option<String>,

    /// Use an existing checkout instead of cloning.
    #[arg(long)]
    path: Option<PathBuf>,

    /// Repository name shown in the prompt. Defaults to the last URL or
    /// path segment.
    #[arg(long)]
    name: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Documents retrieved per question.
    #[arg(long)]
    top_k: Option<usize>,

    /// Setup progress output. Defaults to `human` on a terminal.
    #[arg(long, value_enum)]
    progress: Option<ProgressMode>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("repo_chat=warn,repo_chat_core=warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("{e:#}").red());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(top_k) = cli.top_k {
        config.retrieval.top_k = top_k;
        config.validate()?;
    }

    let url = match (&cli.url, &cli.path) {
        (Some(url), _) => url.trim().to_string(),
        (None, Some(path)) => path.display().to_string(),
        (None, None) => read_url()?,
    };
    if url.is_empty() {
        bail!("No repository URL given. Exiting.");
    }
    let name = cli.name.clone().unwrap_or_else(|| repo_name_from_url(&url));

    let progress = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();
    let embedder = create_embedder(&config.embedding)?;
    let model = create_model(&config.llm)?;

    // `_checkout` removes the clone when `run` returns.
    let (root, _checkout) = match &cli.path {
        Some(path) => (path.clone(), None),
        None => {
            let dir = tempfile::TempDir::new().context("failed to create temp directory")?;
            progress.report(SetupPhase::Cloning { url: url.clone() });
            let dest = dir.path().to_path_buf();
            let clone_url = url.clone();
            let git = config.git.clone();
            let cloned = tokio::select! {
                res = tokio::task::spawn_blocking(move || clone_repository(&clone_url, &dest, &git)) => res?,
                _ = tokio::signal::ctrl_c() => bail!("Interrupted."),
            };
            if let Err(e) = cloned {
                tracing::error!(error = %e, "clone failed");
                bail!("Failed to clone the repository. Exiting.");
            }
            (dir.path().to_path_buf(), Some(dir))
        }
    };

    let setup = tokio::select! {
        res = create_session_with_report(&root, &name, &url, &config, embedder, progress.as_ref()) => res,
        _ = tokio::signal::ctrl_c() => bail!("Interrupted."),
    };
    let (mut session, report) = match setup {
        Ok(ok) => ok,
        Err(SessionError::EmptyCorpus { .. }) => {
            bail!("No documents were found to index. Exiting.")
        }
        Err(e) => return Err(e.into()),
    };

    let revision = head_sha(&root).ok();

    println!(
        "Indexed {} files from {}.",
        session.filenames().len(),
        session.repo().name
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n{PROMPT}");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            ShellCommand::Exit => break,
            ShellCommand::Empty => continue,
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::History => println!("{}", render_history(session.history())),
            ShellCommand::Stats => println!(
                "{}",
                render_stats(&session, Some(&report), revision.as_deref())
            ),
            ShellCommand::Question(question) => {
                let outcome = tokio::select! {
                    res = session.ask(model.as_ref(), &question) => Some(res),
                    _ = tokio::signal::ctrl_c() => None,
                };
                match outcome {
                    Some(Ok(answer)) => {
                        println!("{}", format!("\nANSWER\n{}\n", answer.text).green());
                    }
                    Some(Err(e)) => {
                        eprintln!(
                            "{}",
                            format!("An error occurred while processing the question: {e}").red()
                        );
                    }
                    None => {
                        eprintln!("Interrupted.");
                        break;
                    }
                }
            }
        }
    }

    session.close();
    tracing::info!(session = %session.id(), turns = session.history().total_turns(), "session closed");
    Ok(())
}

fn read_url() -> Result<String> {
    print!("Enter the GitHub URL of the repository: ");
    std::io::stdout().flush()?;
    let mut url = String::new();
    std::io::stdin().read_line(&mut url)?;
    Ok(url.trim().to_string())
}
