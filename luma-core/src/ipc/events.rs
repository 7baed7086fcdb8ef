//! Events emitted to the rendering surface.
//!
//! ## Channels
//!
//! | Event | Emitted by | When |
//! |-------|------------|------|
//! | `SlotEvent` | session controller | a slot write is committed |
//! | `PlaybackEvent` | speech output controller | a speech session starts or ends |
//! | `DictationEvent` | speech input controller | the dictation state changes |
//!
//! A `SlotEvent` is the surface's cue to refresh the region's content and
//! reapply the configured text style to it.

use serde::{Deserialize, Serialize};

use crate::slot::SlotName;

// ---------------------------------------------------------------------------
// Slot events
// ---------------------------------------------------------------------------

/// Emitted when the session controller commits a slot write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Which region changed.
    pub slot: SlotName,
    /// The full new value of the region.
    pub text: String,
}

// ---------------------------------------------------------------------------
// Playback events
// ---------------------------------------------------------------------------

/// Emitted when a speech output session starts, is cancelled, or completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    pub status: PlaybackStatus,
    /// The utterance this transition belongs to.
    pub utterance_id: u64,
}

/// Current state of the speech output controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// No active output session.
    Idle,
    /// An utterance is being spoken.
    Speaking,
}

// ---------------------------------------------------------------------------
// Dictation events
// ---------------------------------------------------------------------------

/// Emitted when the dictation session starts or ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictationEvent {
    pub status: DictationStatus,
    /// Optional human-readable detail (e.g. the engine's error reason).
    pub detail: Option<String>,
}

/// Current state of the speech input controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DictationStatus {
    /// No dictation session open.
    Idle,
    /// Actively receiving recognition events.
    Listening,
}
