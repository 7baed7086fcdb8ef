//! In-memory speech capability stubs.
//!
//! Recording backends that exercise the controllers end-to-end without a
//! platform engine: the synthesizer records every `speak`/`cancel_active`
//! call and fires completions on demand; the recognizer has scripted
//! availability and lets the caller push signals through its stream.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::{LumaError, Result};
use crate::speech::{
    RecognitionEvent, RecognizerSignal, SynthesizerSignal, VoiceRecognizer, VoiceSynthesizer,
};

const SIGNAL_CAP: usize = 64;

/// Recording synthesizer stub.
pub struct StubSynthesizer {
    spoken: Mutex<Vec<(u64, String)>>,
    cancels: AtomicUsize,
    fail_speak: bool,
    signal_tx: broadcast::Sender<SynthesizerSignal>,
}

impl StubSynthesizer {
    pub fn new() -> Self {
        let (signal_tx, _) = broadcast::channel(SIGNAL_CAP);
        Self {
            spoken: Mutex::new(Vec::new()),
            cancels: AtomicUsize::new(0),
            fail_speak: false,
            signal_tx,
        }
    }

    /// A synthesizer whose `speak` always fails.
    pub fn failing() -> Self {
        Self {
            fail_speak: true,
            ..Self::new()
        }
    }

    /// Every `(utterance_id, text)` pair spoken so far.
    pub fn spoken(&self) -> Vec<(u64, String)> {
        self.spoken.lock().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::Relaxed)
    }

    /// Report natural completion of `utterance_id`.
    pub fn finish(&self, utterance_id: u64) {
        let _ = self.signal_tx.send(SynthesizerSignal::Finished { utterance_id });
    }
}

impl Default for StubSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceSynthesizer for StubSynthesizer {
    fn speak(&self, utterance_id: u64, text: &str) -> Result<()> {
        if self.fail_speak {
            return Err(LumaError::Synthesis("stub speak failure".into()));
        }
        self.spoken.lock().push((utterance_id, text.to_string()));
        Ok(())
    }

    fn cancel_active(&self) {
        self.cancels.fetch_add(1, Ordering::Relaxed);
    }

    fn subscribe(&self) -> broadcast::Receiver<SynthesizerSignal> {
        self.signal_tx.subscribe()
    }
}

/// Scripted recognizer stub.
pub struct StubRecognizer {
    available: bool,
    started: Mutex<Vec<String>>,
    stops: AtomicUsize,
    signal_tx: broadcast::Sender<RecognizerSignal>,
}

impl StubRecognizer {
    pub fn new() -> Self {
        let (signal_tx, _) = broadcast::channel(SIGNAL_CAP);
        Self {
            available: true,
            started: Mutex::new(Vec::new()),
            stops: AtomicUsize::new(0),
            signal_tx,
        }
    }

    /// A recognizer that reports the capability as missing.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Push one signal through the stream.
    pub fn emit(&self, signal: RecognizerSignal) {
        let _ = self.signal_tx.send(signal);
    }

    /// Push a whole-utterance interim delivery.
    pub fn emit_transcript(&self, text: &str) {
        self.emit(RecognizerSignal::Result(RecognitionEvent::interim(text)));
    }

    /// Language tags passed to `start`, in call order.
    pub fn started_languages(&self) -> Vec<String> {
        self.started.lock().clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::Relaxed)
    }
}

impl Default for StubRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceRecognizer for StubRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn start(&self, language_tag: &str) -> Result<()> {
        self.started.lock().push(language_tag.to_string());
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::Relaxed);
    }

    fn subscribe(&self) -> broadcast::Receiver<RecognizerSignal> {
        self.signal_tx.subscribe()
    }
}
