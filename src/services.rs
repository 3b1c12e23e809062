//! Collaborator contracts consumed by the pipeline.
//!
//! The generation, search, synthesis, and playback engines live outside
//! this crate; the pipeline talks to them through these narrow traits.
//! Generation and search suspend (network or long inference) and are
//! async; synthesis and playback are blocking by contract and are run
//! on blocking tasks by their callers.

use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::messages::SynthesizedAudio;

/// Text generation collaborator (the LLM).
///
/// Implementations may report failure either as `Err` or as sentinel
/// text in `Ok`; callers tolerate both.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate a completion for `prompt`, bounded by `max_tokens`.
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String>;
}

/// Web search collaborator.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Search the web and return a text blob of results.
    async fn search(&self, query: &str) -> Result<String>;
}

/// Speech synthesis collaborator. The full utterance is synthesized
/// before playback starts; audio is not streamed.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in the given voice.
    fn synthesize(&self, text: &str, voice: &str) -> Result<SynthesizedAudio>;
}

/// Audio playback collaborator. Blocks the calling thread until all
/// samples have been played.
pub trait AudioPlayback: Send + Sync {
    /// Play the samples to completion.
    fn play(&self, samples: &[f32], sample_rate: u32) -> Result<()>;
}

/// Sentinel response used when no generation backend is available.
pub const OFFLINE_RESPONSE: &str = "Error: brain offline.";

/// Generation collaborator for when no model could be loaded.
///
/// Always answers with [`OFFLINE_RESPONSE`] so the conversation surface
/// keeps working and the transcript stays faithful while the model is
/// unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGeneration;

#[async_trait]
impl GenerationService for OfflineGeneration {
    async fn generate(&self, _prompt: &str, _max_tokens: usize) -> Result<String> {
        tracing::debug!("generation requested while offline");
        Ok(OFFLINE_RESPONSE.to_owned())
    }
}

/// Search collaborator for builds without a search backend. Always
/// fails; the pipeline degrades to its placeholder text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSearch;

#[async_trait]
impl SearchService for NoopSearch {
    async fn search(&self, _query: &str) -> Result<String> {
        Err(crate::error::SirisError::Search(
            "no search backend configured".into(),
        ))
    }
}
