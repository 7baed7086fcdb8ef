//! Speech capability seams and shared recognition/synthesis types.
//!
//! Both engines deliver their asynchronous callbacks over
//! `tokio::sync::broadcast` channels; the controllers consume one signal
//! at a time, so each delivery is handled atomically before the next is
//! drawn.

pub mod input;
pub mod output;
pub mod stub;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Result;

// ---------------------------------------------------------------------------
// Recognition types
// ---------------------------------------------------------------------------

/// One recognized segment of the current utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedSegment {
    /// Position of this segment within the utterance.
    pub index: usize,
    pub text: String,
    /// Whether the engine considers this segment stable. Earlier segments
    /// may still be revised by a later event carrying the same index.
    pub is_final: bool,
}

/// One recognition delivery: the engine's current best guess for the whole
/// utterance, reconstructed from every segment observed so far — not just
/// the newest one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionEvent {
    pub segments: Vec<RecognizedSegment>,
}

impl RecognitionEvent {
    /// A single-segment interim delivery carrying the whole utterance.
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            segments: vec![RecognizedSegment {
                index: 0,
                text: text.into(),
                is_final: false,
            }],
        }
    }

    /// Whole-utterance transcript: all segments in index order.
    pub fn transcript(&self) -> String {
        let mut segments: Vec<&RecognizedSegment> = self.segments.iter().collect();
        segments.sort_by_key(|s| s.index);
        segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Signals delivered by a `VoiceRecognizer` while a session is open.
#[derive(Debug, Clone)]
pub enum RecognizerSignal {
    Result(RecognitionEvent),
    /// Engine-reported fatal error; the session is force-ended.
    Error(String),
    /// The engine ended the session unilaterally (e.g. silence timeout).
    Ended,
}

/// Contract for speech recognition engines.
pub trait VoiceRecognizer: Send + Sync {
    /// Whether recognition is available on this platform at all.
    fn is_available(&self) -> bool;

    /// Open a recognition session.
    fn start(&self, language_tag: &str) -> Result<()>;

    /// Close the session. The engine may still emit a trailing `Ended`.
    fn stop(&self);

    /// Subscribe to this engine's signal stream.
    fn subscribe(&self) -> broadcast::Receiver<RecognizerSignal>;
}

// ---------------------------------------------------------------------------
// Synthesis types
// ---------------------------------------------------------------------------

/// Signals delivered by a `VoiceSynthesizer`.
#[derive(Debug, Clone, Copy)]
pub enum SynthesizerSignal {
    /// The utterance with this id finished speaking naturally.
    Finished { utterance_id: u64 },
}

/// Contract for speech synthesis engines.
pub trait VoiceSynthesizer: Send + Sync {
    /// Begin speaking `text`. The id comes back in the `Finished` signal.
    fn speak(&self, utterance_id: u64, text: &str) -> Result<()>;

    /// Cancel whatever is being spoken. Harmless when nothing is.
    fn cancel_active(&self);

    /// Subscribe to this engine's signal stream.
    fn subscribe(&self) -> broadcast::Receiver<SynthesizerSignal>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_concatenates_segments_in_index_order() {
        let event = RecognitionEvent {
            segments: vec![
                RecognizedSegment {
                    index: 1,
                    text: " world".into(),
                    is_final: false,
                },
                RecognizedSegment {
                    index: 0,
                    text: "hello".into(),
                    is_final: true,
                },
            ],
        };
        assert_eq!(event.transcript(), "hello world");
    }

    #[test]
    fn interim_event_carries_one_non_final_segment() {
        let event = RecognitionEvent::interim("hel");
        assert_eq!(event.segments.len(), 1);
        assert!(!event.segments[0].is_final);
        assert_eq!(event.transcript(), "hel");
    }

    #[test]
    fn recognition_event_serializes_with_camel_case() {
        let event = RecognitionEvent::interim("hej");
        let json = serde_json::to_value(&event).expect("serialize recognition event");
        assert_eq!(json["segments"][0]["index"], 0);
        assert_eq!(json["segments"][0]["text"], "hej");
        assert_eq!(json["segments"][0]["isFinal"], false);
    }
}
