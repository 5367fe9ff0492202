//! Line commands understood by the interactive prompt.

/// Prompt shown before each question.
pub const PROMPT: &str = "Ask a question about the repository (type 'exit()' to quit): ";

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// `exit()`, any case.
    Exit,
    /// `/history`: print the retained turns.
    History,
    /// `/stats`: print the corpus summary.
    Stats,
    /// `/help`
    Help,
    /// Blank line.
    Empty,
    /// Anything else, trimmed.
    Question(String),
}

pub const HELP: &str = "\
Commands:
  exit()     quit
  /history   show the conversation so far
  /stats     show what was indexed
  /help      show this message
Anything else is asked as a question about the repository.";

pub fn parse_command(line: &str) -> ShellCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ShellCommand::Empty;
    }
    if trimmed.eq_ignore_ascii_case("exit()") {
        return ShellCommand::Exit;
    }
    match trimmed {
        "/history" => ShellCommand::History,
        "/stats" => ShellCommand::Stats,
        "/help" => ShellCommand::Help,
        _ => ShellCommand::Question(trimmed.to_string()),
    }
}

/// Render retained turns for `/history`.
pub fn render_history(history: &repo_chat_core::history::ConversationHistory) -> String {
    if history.is_empty() {
        return "(no questions yet)".to_string();
    }
    let skipped = history.total_turns() - history.len();
    let mut out = String::new();
    if skipped > 0 {
        out.push_str(&format!("({skipped} earlier turns no longer in context)\n"));
    }
    for (i, turn) in history.turns().enumerate() {
        out.push_str(&format!(
            "[{}] {}\nQ: {}\nA: {}\n",
            skipped + i + 1,
            turn.asked_at.format("%H:%M:%S"),
            turn.question,
            turn.answer
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_chat_core::history::ConversationHistory;

    #[test]
    fn test_parse_exit_any_case() {
        assert_eq!(parse_command("exit()"), ShellCommand::Exit);
        assert_eq!(parse_command("  EXIT()\n"), ShellCommand::Exit);
        assert_eq!(
            parse_command("exit"),
            ShellCommand::Question("exit".to_string())
        );
    }

    #[test]
    fn test_parse_slash_commands() {
        assert_eq!(parse_command("/history"), ShellCommand::History);
        assert_eq!(parse_command("/stats\n"), ShellCommand::Stats);
        assert_eq!(parse_command("/help"), ShellCommand::Help);
        assert_eq!(parse_command("   "), ShellCommand::Empty);
    }

    #[test]
    fn test_parse_question_trimmed() {
        assert_eq!(
            parse_command("  what is this?  \n"),
            ShellCommand::Question("what is this?".to_string())
        );
    }

    #[test]
    fn test_render_history_numbers_turns() {
        let mut history = ConversationHistory::with_max_turns(1);
        history.append("q1", "a1");
        history.append("q2", "a2");
        let text = render_history(&history);
        assert!(text.starts_with("(1 earlier turns no longer in context)\n[2] "));
        assert!(text.contains("Q: q2\nA: a2\n"));
        assert!(!text.contains("q1"));
    }

    #[test]
    fn test_render_empty_history() {
        assert_eq!(
            render_history(&ConversationHistory::default()),
            "(no questions yet)"
        );
    }
}
