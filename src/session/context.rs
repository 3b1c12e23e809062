//! Prompt assembly from search context, history, and the current query.

use super::types::Message;

/// Build the bounded generation prompt for one user turn.
///
/// Pure and deterministic: the same inputs always produce the identical
/// string. Section order is fixed: web results first (when present and
/// non-empty), then a `History:` transcript of `role: content` lines in
/// chronological order, then the current query. Empty history omits the
/// transcript section entirely rather than rendering an empty header.
/// Sections are separated by one blank line.
#[must_use]
pub fn assemble_prompt(external: Option<&str>, history: &[Message], query: &str) -> String {
    let mut sections: Vec<String> = Vec::new();

    if let Some(results) = external {
        if !results.is_empty() {
            sections.push(format!("Web Results:\n{results}"));
        }
    }

    if !history.is_empty() {
        let transcript = history
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("History:\n{transcript}"));
    }

    sections.push(format!("User Query: {query}"));

    sections.join("\n\n")
}
