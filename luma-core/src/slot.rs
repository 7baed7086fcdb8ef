//! Named text slots.
//!
//! A slot holds the current value of one editable text region. Writes
//! replace the whole string under the lock, so a reader always observes a
//! complete prior write, never a torn one. The session controller is the
//! only component that writes slots.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// The three editable text regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotName {
    /// Text extracted from the uploaded document.
    Ingested,
    /// The condensed rendition returned by the summarization endpoint.
    Summary,
    /// The running dictation transcript.
    Dictation,
}

impl SlotName {
    pub const ALL: [SlotName; 3] = [SlotName::Ingested, SlotName::Summary, SlotName::Dictation];
}

#[derive(Debug, Default)]
struct Slots {
    ingested: String,
    summary: String,
    dictation: String,
}

/// Holder of the three slot strings.
#[derive(Debug, Default)]
pub struct SlotBoard {
    inner: RwLock<Slots>,
}

impl SlotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `name` (a complete committed write).
    pub fn get(&self, name: SlotName) -> String {
        let slots = self.inner.read();
        match name {
            SlotName::Ingested => slots.ingested.clone(),
            SlotName::Summary => slots.summary.clone(),
            SlotName::Dictation => slots.dictation.clone(),
        }
    }

    /// Replace the value of `name` atomically.
    pub fn set(&self, name: SlotName, value: String) {
        let mut slots = self.inner.write();
        match name {
            SlotName::Ingested => slots.ingested = value,
            SlotName::Summary => slots.summary = value,
            SlotName::Dictation => slots.dictation = value,
        }
    }

    pub fn clear(&self, name: SlotName) {
        self.set(name, String::new());
    }

    /// Consistent snapshot of all three slots.
    pub fn snapshot(&self) -> SlotSnapshot {
        let slots = self.inner.read();
        SlotSnapshot {
            ingested: slots.ingested.clone(),
            summary: slots.summary.clone(),
            dictation: slots.dictation.clone(),
        }
    }
}

/// One consistent view of all three regions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSnapshot {
    pub ingested: String,
    pub summary: String,
    pub dictation: String,
}
