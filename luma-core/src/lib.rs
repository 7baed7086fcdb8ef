//! # luma-core
//!
//! Voice & ingestion session controller SDK.
//!
//! ## Architecture
//!
//! ```text
//! upload bytes → Extractor ──────────────► Ingested slot
//!                                               │ summarize
//!                                               ▼
//!                SummaryClient (HTTP) ────► Summary slot ──► SpeechOutput
//!
//! recognizer signals → SpeechInput ──────► Dictation slot
//! ```
//!
//! The `SessionController` owns the three text slots and serializes the
//! conflicting operations by policy: one extraction job, one pending
//! summarization request, one speaking session, one listening session.
//! Document decoding, speech synthesis, and speech recognition are trait
//! seams so hosts plug in platform engines; in-memory stubs ship with the
//! crate.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod extract;
pub mod ipc;
pub mod session;
pub mod slot;
pub mod speech;
pub mod summarize;

// Convenience re-exports for downstream crates
pub use config::{SessionConfig, TextStyle};
pub use error::LumaError;
pub use extract::{DocumentDecoder, Extractor, SourceKind};
pub use ipc::events::{
    DictationEvent, DictationStatus, PlaybackEvent, PlaybackStatus, SlotEvent,
};
pub use session::SessionController;
pub use slot::{SlotBoard, SlotName, SlotSnapshot};
pub use speech::{
    RecognitionEvent, RecognizedSegment, RecognizerSignal, SynthesizerSignal, VoiceRecognizer,
    VoiceSynthesizer,
};
pub use summarize::{SummaryClient, Summarizer};
