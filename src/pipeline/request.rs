//! One-turn request orchestration.
//!
//! A turn moves through assembling (optional web search + recent
//! history), generating, persisting, and done. Every failure along the
//! way degrades: search failure becomes a placeholder context block,
//! generation failure becomes a sentinel response that is still
//! persisted and delivered, so the session stays a faithful transcript
//! and the interactive surface never sees an unhandled fault.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, warn};

use super::messages::TurnOutcome;
use super::namer::NamingAgent;
use crate::config::SirisConfig;
use crate::error::Result;
use crate::services::{GenerationService, SearchService};
use crate::session::context::assemble_prompt;
use crate::session::store::SessionStore;
use crate::session::types::Role;

/// Sessions with at most this many messages are candidates for
/// background naming.
const EARLY_TURN_THRESHOLD: usize = 4;

/// Context block substituted when the search collaborator fails.
const SEARCH_UNAVAILABLE: &str = "No internet connection or search failed.";

/// Orchestrates user turns against the session store and the
/// generation/search collaborators.
///
/// One pipeline instance serves one originator; turns from the same
/// instance are serialized by an internal lock, so at most one request
/// is in flight at a time. Use [`submit`](Self::submit) to run a turn
/// off the interactive thread and receive the outcome over a channel.
pub struct RequestPipeline {
    store: Arc<SessionStore>,
    generation: Arc<dyn GenerationService>,
    search: Arc<dyn SearchService>,
    context_limit: usize,
    max_tokens: usize,
    naming_max_tokens: usize,
    turn_lock: Mutex<()>,
}

impl RequestPipeline {
    /// Create a pipeline over the given store and collaborators.
    pub fn new(
        store: Arc<SessionStore>,
        generation: Arc<dyn GenerationService>,
        search: Arc<dyn SearchService>,
        config: &SirisConfig,
    ) -> Self {
        Self {
            store,
            generation,
            search,
            context_limit: config.session.context_limit,
            max_tokens: config.generation.max_tokens,
            naming_max_tokens: config.generation.naming_max_tokens,
            turn_lock: Mutex::new(()),
        }
    }

    /// Run one user turn to completion and return the outcome.
    ///
    /// Search and generation failures degrade (placeholder context,
    /// sentinel response); the sentinel is persisted as the assistant
    /// message and delivered like a normal response, not retried.
    ///
    /// # Errors
    ///
    /// Returns an error only when the session store cannot persist the
    /// turn.
    pub async fn process(&self, query: &str, use_search: bool) -> Result<TurnOutcome> {
        let _turn = self.turn_lock.lock().await;

        // Assembling
        let external = if use_search {
            match self.search.search(query).await {
                Ok(blob) => Some(blob),
                Err(e) => {
                    warn!("search failed, continuing without results: {e}");
                    Some(SEARCH_UNAVAILABLE.to_owned())
                }
            }
        } else {
            None
        };
        let history = self.store.recent_context(self.context_limit).await;
        let prompt = assemble_prompt(external.as_deref(), &history, query);

        // Generating
        let (response, degraded) = match self.generation.generate(&prompt, self.max_tokens).await {
            Ok(text) => (text, false),
            Err(e) => {
                warn!("generation failed, answering with sentinel: {e}");
                (format!("Generation error: {e}"), true)
            }
        };

        // Persisting
        self.store.append_message(Role::User, query, None).await?;
        self.store
            .append_message(Role::Assistant, &response, None)
            .await?;

        // Done
        self.maybe_schedule_naming().await;

        Ok(TurnOutcome { response, degraded })
    }

    /// Run a turn on the runtime and deliver the outcome over `tx`.
    ///
    /// The caller returns immediately; a failed turn is logged and
    /// produces no outcome on the channel.
    pub fn submit(
        self: &Arc<Self>,
        query: String,
        use_search: bool,
        tx: mpsc::UnboundedSender<TurnOutcome>,
    ) {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            match pipeline.process(&query, use_search).await {
                Ok(outcome) => {
                    let _ = tx.send(outcome);
                }
                Err(e) => error!("turn failed: {e}"),
            }
        });
    }

    /// Spawn a fire-and-forget naming task when the session is still
    /// young and carries its default name. Failures are silent; the
    /// name is only ever overwritten while it still looks default, so a
    /// user rename or an earlier proposal wins.
    async fn maybe_schedule_naming(&self) {
        let Some(session) = self.store.current().await else {
            return;
        };
        if session.messages.len() > EARLY_TURN_THRESHOLD || !session.has_default_name() {
            return;
        }

        let store = Arc::clone(&self.store);
        let namer = NamingAgent::new(Arc::clone(&self.generation), self.naming_max_tokens);
        let messages = session.messages;
        tokio::spawn(async move {
            let Some(name) = namer.propose_name(&messages).await else {
                return;
            };
            let still_default = store
                .current()
                .await
                .is_some_and(|s| s.has_default_name());
            if !still_default {
                return;
            }
            if let Err(e) = store.rename(&name).await {
                debug!("failed to persist proposed session name: {e}");
            }
        });
    }
}
