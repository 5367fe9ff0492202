//! The fixed answering prompt.
//!
//! Placeholders in [`TEMPLATE`] are filled in a single left-to-right pass:
//! substituted values are copied verbatim and never scanned again, so a
//! question or document containing `{question}` stays literal.

use serde::Serialize;

use crate::models::FileTypeCounts;

/// Prompt sent to the language model for every question.
pub const TEMPLATE: &str = "
    Repo: {repo_name} ({github_url}) | Conv: {conversation_history} | Docs: {numbered_documents} | Q: {question} | FileCount: {file_type_counts} | FileNames: {filenames}

    Instr:
    1. Answer based on context/docs.
    2. Focus on repo/code.
    3. Consider:
        a. Purpose/features - describe.
        b. Functions/code - provide details/samples.
        c. Setup/usage - give instructions.
    4. Unsure? Say \"I am not sure\".

    Answer:
    ";

/// Values substituted into [`TEMPLATE`].
#[derive(Debug, Clone, Copy)]
pub struct PromptVars<'a> {
    pub repo_name: &'a str,
    pub github_url: &'a str,
    pub conversation_history: &'a str,
    pub numbered_documents: &'a str,
    pub question: &'a str,
    pub file_type_counts: &'a FileTypeCounts,
    pub filenames: &'a [String],
}

/// Fill [`TEMPLATE`] with `vars`.
pub fn render_prompt(vars: &PromptVars<'_>) -> String {
    let counts = to_json(vars.file_type_counts);
    let filenames = to_json(&vars.filenames);

    let values = [
        ("repo_name", vars.repo_name),
        ("github_url", vars.github_url),
        ("conversation_history", vars.conversation_history),
        ("numbered_documents", vars.numbered_documents),
        ("question", vars.question),
        ("file_type_counts", counts.as_str()),
        ("filenames", filenames.as_str()),
    ];

    substitute(TEMPLATE, &values)
}

/// Replace each `{name}` in `template` that has an entry in `values`.
/// Unknown names and unmatched braces are copied through unchanged.
fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let lookup = |name: &str| values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v);
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => match lookup(&after[..close]) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    // Maps with string keys and string lists always serialize.
    serde_json::to_string(value).unwrap_or_default()
}
