//! Speech output: playback and word-synchronized progress.

pub mod playback;
pub mod timing;

pub use playback::CpalPlayback;
pub use timing::SpeechTimingCoordinator;
