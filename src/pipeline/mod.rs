//! Request orchestration: one user turn from query to persisted reply.

pub mod messages;
pub mod namer;
pub mod request;

pub use messages::{SpeechEvent, SynthesizedAudio, TurnOutcome};
pub use namer::NamingAgent;
pub use request::RequestPipeline;
