//! Message types passed between pipeline stages.

/// Synthesized audio from TTS, ready for playback.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    /// f32 audio samples, mono.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Ordered progress events delivered to the UI while speech plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// A specific word is currently being spoken.
    Word {
        /// Zero-based position of the word in the utterance.
        index: usize,
        /// The word text.
        word: String,
        /// Total number of words in the utterance.
        total: usize,
    },
    /// Playback and the full progress sequence have completed.
    Done,
}

/// The result of one user turn through the request pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The assistant's response text (possibly a failure sentinel).
    pub response: String,
    /// Whether generation failed and `response` is the sentinel.
    pub degraded: bool,
}
