//! Siris: conversation session pipeline for a voice assistant.
//!
//! This crate is the conversational core behind a voice assistant
//! surface: Microphone → STT → LLM → TTS → Speaker, where the STT, LLM,
//! search, and TTS engines are external collaborators behind narrow
//! traits ([`services`]).
//!
//! # Architecture
//!
//! - **Sessions** ([`session`]): append-only conversation logs persisted
//!   one JSON file per session, with a token-budget rotation policy.
//! - **Request pipeline** ([`pipeline`]): one user turn orchestrated off
//!   the interactive thread (context assembly → generation →
//!   persistence → background naming), reporting over a channel.
//! - **Speech output** ([`speech`]): word-synchronized playback that
//!   derives per-word timing from utterance duration and emits ordered
//!   progress events while audio plays on its own execution context.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod services;
pub mod session;
pub mod speech;

pub use config::SirisConfig;
pub use error::{Result, SirisError};
pub use pipeline::{NamingAgent, RequestPipeline, SpeechEvent, SynthesizedAudio, TurnOutcome};
pub use services::{AudioPlayback, GenerationService, SearchService, SpeechSynthesizer};
pub use session::{Message, Role, Session, SessionStore, assemble_prompt};
pub use speech::{CpalPlayback, SpeechTimingCoordinator};
