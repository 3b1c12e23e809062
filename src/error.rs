//! Error types for the siris conversation pipeline.

/// Top-level error type for the assistant core.
#[derive(Debug, thiserror::Error)]
pub enum SirisError {
    /// Session persistence error (create, load, append, rename).
    #[error("session error: {0}")]
    Session(String),

    /// Language model generation error.
    #[error("generation error: {0}")]
    Generation(String),

    /// Web search error.
    #[error("search error: {0}")]
    Search(String),

    /// Text-to-speech synthesis error.
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio device or playback error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SirisError>;
