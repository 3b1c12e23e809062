//! Word-synchronized speech playback.
//!
//! The utterance is fully synthesized first, then playback starts on a
//! blocking task while the coordinator paces ordered per-word progress
//! events on the caller's task. Per-word timing is derived from total
//! audio duration: `duration / word_count`, evenly spaced.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, SirisError};
use crate::pipeline::messages::SpeechEvent;
use crate::services::{AudioPlayback, SpeechSynthesizer};

/// Utterances longer than this are truncated before synthesis.
const MAX_UTTERANCE_CHARS: usize = 200;

/// Speaks a response and feeds word-progress events to the UI.
///
/// [`speak`](Self::speak) does not return until both playback and the
/// full progress sequence have completed, so a caller observing the
/// return (or the `Done` event) knows the utterance is truly over.
pub struct SpeechTimingCoordinator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    playback: Arc<dyn AudioPlayback>,
    voice: String,
}

impl SpeechTimingCoordinator {
    /// Create a coordinator speaking with the given voice.
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        playback: Arc<dyn AudioPlayback>,
        voice: impl Into<String>,
    ) -> Self {
        Self {
            synthesizer,
            playback,
            voice: voice.into(),
        }
    }

    /// Synthesize `text`, play it, and emit one ordered
    /// [`SpeechEvent::Word`] per word at evenly spaced offsets, followed
    /// by [`SpeechEvent::Done`] once playback has also finished.
    ///
    /// Text past the utterance limit is truncated with an ellipsis
    /// marker before synthesis. A dropped event receiver is tolerated;
    /// playback still runs to completion.
    ///
    /// # Errors
    ///
    /// Synthesis failure aborts before any event is emitted. Playback
    /// failure returns an error and suppresses the `Done` event.
    pub async fn speak(
        &self,
        text: &str,
        events: mpsc::UnboundedSender<SpeechEvent>,
    ) -> Result<()> {
        let text = truncate_utterance(text);

        let synthesizer = Arc::clone(&self.synthesizer);
        let voice = self.voice.clone();
        let synth_text = text.clone();
        let audio = tokio::task::spawn_blocking(move || synthesizer.synthesize(&synth_text, &voice))
            .await
            .map_err(|e| SirisError::Tts(format!("synthesis task failed: {e}")))??;

        let words: Vec<&str> = text.split_whitespace().collect();
        let total = words.len();
        let duration_secs = if audio.sample_rate == 0 {
            0.0
        } else {
            audio.samples.len() as f64 / f64::from(audio.sample_rate)
        };
        let interval = if total == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(duration_secs / total as f64)
        };
        debug!(
            words = total,
            duration_secs,
            "starting playback with word sync"
        );

        // Playback runs concurrently; the word schedule paces alongside it.
        let playback = Arc::clone(&self.playback);
        let sample_rate = audio.sample_rate;
        let samples = audio.samples;
        let playback_task =
            tokio::task::spawn_blocking(move || playback.play(&samples, sample_rate));

        for (index, word) in words.iter().enumerate() {
            tokio::time::sleep(interval).await;
            if events
                .send(SpeechEvent::Word {
                    index,
                    word: (*word).to_owned(),
                    total,
                })
                .is_err()
            {
                // Receiver went away; keep playing, stop narrating.
                warn!("speech progress receiver dropped");
                break;
            }
        }

        playback_task
            .await
            .map_err(|e| SirisError::Audio(format!("playback task failed: {e}")))??;

        let _ = events.send(SpeechEvent::Done);
        Ok(())
    }
}

/// Cap the utterance length before synthesis, marking the cut with an
/// ellipsis.
fn truncate_utterance(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() > MAX_UTTERANCE_CHARS {
        let mut truncated: String = chars[..MAX_UTTERANCE_CHARS - 3].iter().collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_owned()
    }
}
