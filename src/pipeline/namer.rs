//! Background session titling from the opening turns.

use std::sync::Arc;

use tracing::debug;

use crate::services::GenerationService;
use crate::session::types::Message;

/// Messages from the start of the session embedded in the naming prompt.
const NAMING_WINDOW: usize = 3;
/// Maximum display length of a proposed title.
const MAX_NAME_LEN: usize = 50;

/// Derives a short display title for a session from its first turns.
///
/// Strictly best-effort: it runs on its own task, never blocks the
/// request pipeline, and every failure collapses to `None`, which
/// callers treat as "leave the name as-is".
pub struct NamingAgent {
    generation: Arc<dyn GenerationService>,
    max_tokens: usize,
}

impl NamingAgent {
    /// Create a naming agent over the given generation collaborator.
    pub fn new(generation: Arc<dyn GenerationService>, max_tokens: usize) -> Self {
        Self {
            generation,
            max_tokens,
        }
    }

    /// Propose a title from the opening messages.
    ///
    /// Returns `None` when fewer than two messages exist, when
    /// generation fails, or when the completion cleans down to nothing.
    /// The prompt is deterministic for the same first-three-messages
    /// window.
    pub async fn propose_name(&self, messages: &[Message]) -> Option<String> {
        if messages.len() < 2 {
            return None;
        }

        let conversation = messages
            .iter()
            .take(NAMING_WINDOW)
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Analyze the following conversation start and generate a very short, \
             descriptive title (max 4-5 words). Do not use quotes. Just the title.\n\n\
             Conversation:\n{conversation}\n\nTitle:"
        );

        match self.generation.generate(&prompt, self.max_tokens).await {
            Ok(completion) => clean_title(&completion),
            Err(e) => {
                debug!("session naming failed: {e}");
                None
            }
        }
    }
}

/// Trim whitespace and surrounding quote characters, then cap the
/// length at [`MAX_NAME_LEN`] with an ellipsis marker.
fn clean_title(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(['"', '\'']).trim();
    if trimmed.is_empty() {
        return None;
    }
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() > MAX_NAME_LEN {
        let mut truncated: String = chars[..MAX_NAME_LEN - 3].iter().collect();
        truncated.push_str("...");
        Some(truncated)
    } else {
        Some(trimmed.to_owned())
    }
}
