//! Session controller — the state machine over the whole session.
//!
//! ## Single-flight rules
//!
//! ```text
//! upload     → rejected while an extraction job is outstanding
//! summarize  → rejected while a request is pending; empty input clears
//! play       → always preempts the active speech session
//! dictate    → one listening session; stop/clear delegate downward
//! ```
//!
//! The controller exclusively owns the three text slots; the speech
//! controllers and the extractor hand their values outward through its
//! write path, and every asynchronous failure terminates in a slot update
//! or a disabled affordance, never an unhandled error.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{LumaError, Result};
use crate::extract::{DocumentDecoder, ExtractionCounters, Extractor, SourceKind};
use crate::ipc::events::{DictationEvent, DictationStatus, PlaybackEvent, PlaybackStatus, SlotEvent};
use crate::slot::{SlotBoard, SlotName, SlotSnapshot};
use crate::speech::input::{SignalOutcome, SpeechInputController};
use crate::speech::output::{resolve_text_source, SpeechOutputController};
use crate::speech::{RecognizerSignal, VoiceRecognizer, VoiceSynthesizer};
use crate::summarize::Summarizer;

/// Shown in the Summary region when the service answers with a non-success
/// status.
pub const SUMMARY_SERVICE_ERROR_TEXT: &str = "Error: Summarization failed.";
/// Shown in the Summary region when no response arrives at all.
pub const SUMMARY_TRANSPORT_ERROR_TEXT: &str = "Error generating summary.";
/// Shown in the Dictation region when recognition is unavailable.
pub const DICTATION_UNSUPPORTED_TEXT: &str =
    "Speech recognition is not supported on this platform.";
/// Shown in the Ingested region when the uploaded bytes cannot be decoded.
pub const INGEST_DECODE_ERROR_TEXT: &str = "Error: the selected document could not be read.";

const SLOT_EVENT_CAP: usize = 256;

/// Progress of the outstanding extraction job.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionProgress {
    pub pages_total: usize,
    pub pages_done: usize,
}

struct Inner {
    config: SessionConfig,
    slots: SlotBoard,
    extractor: Extractor,
    summarizer: Arc<dyn Summarizer>,
    output: SpeechOutputController,
    input: SpeechInputController,
    extracting: AtomicBool,
    extraction: Mutex<Option<Arc<ExtractionCounters>>>,
    summarizing: AtomicBool,
    focus: Mutex<Option<SlotName>>,
    dictation_pump: Mutex<Option<tokio::task::JoinHandle<()>>>,
    slot_tx: broadcast::Sender<SlotEvent>,
    slot_seq: AtomicU64,
}

/// The session controller handle.
///
/// Cheap to clone — all clones share one session. Event pump tasks hold
/// clones of this handle.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        decoder: Arc<dyn DocumentDecoder>,
        summarizer: Arc<dyn Summarizer>,
        synthesizer: Arc<dyn VoiceSynthesizer>,
        recognizer: Arc<dyn VoiceRecognizer>,
    ) -> Self {
        let mut config = config;
        config.normalize();

        let (slot_tx, _) = broadcast::channel(SLOT_EVENT_CAP);
        let input = SpeechInputController::new(recognizer, config.language_tag.clone());

        Self {
            inner: Arc::new(Inner {
                config,
                slots: SlotBoard::new(),
                extractor: Extractor::new(decoder),
                summarizer,
                output: SpeechOutputController::new(synthesizer),
                input,
                extracting: AtomicBool::new(false),
                extraction: Mutex::new(None),
                summarizing: AtomicBool::new(false),
                focus: Mutex::new(None),
                dictation_pump: Mutex::new(None),
                slot_tx,
                slot_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Forward synthesizer completions into the output controller.
    ///
    /// Call once from within a Tokio runtime, after construction.
    pub fn spawn_event_forwarders(&self) {
        let session = self.clone();
        let mut rx = self.inner.output.synthesizer_signals();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(signal) => session.inner.output.handle_signal(signal),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(missed, "dropped synthesizer signals");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    // ── Upload ───────────────────────────────────────────────────────────

    /// Extract `bytes` and commit the result to the Ingested region.
    ///
    /// Rejected while another job is outstanding — the conflicting request
    /// is dropped, never queued. A decode failure leaves an inline message
    /// in the Ingested region and may be retried with a fresh upload.
    pub async fn upload(&self, bytes: &[u8], kind: SourceKind) -> Result<()> {
        if self
            .inner
            .extracting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("upload rejected: extraction already outstanding");
            return Err(LumaError::ExtractionBusy);
        }

        let counters = Arc::new(ExtractionCounters::default());
        *self.inner.extraction.lock() = Some(Arc::clone(&counters));
        info!(bytes = bytes.len(), ?kind, "extraction job started");

        let result = self.inner.extractor.extract(bytes, kind, &counters).await;

        *self.inner.extraction.lock() = None;
        self.inner.extracting.store(false, Ordering::SeqCst);

        match result {
            Ok(text) => {
                info!(chars = text.len(), "extraction job finished");
                self.write_slot(SlotName::Ingested, text);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "extraction job failed");
                self.write_slot(SlotName::Ingested, INGEST_DECODE_ERROR_TEXT.to_string());
                Err(e)
            }
        }
    }

    pub fn is_extracting(&self) -> bool {
        self.inner.extracting.load(Ordering::SeqCst)
    }

    /// Progress of the outstanding job, if one exists.
    pub fn extraction_progress(&self) -> Option<ExtractionProgress> {
        let extraction = self.inner.extraction.lock();
        extraction.as_ref().map(|counters| {
            let (pages_total, pages_done) = counters.snapshot();
            ExtractionProgress {
                pages_total,
                pages_done,
            }
        })
    }

    // ── Summarize ────────────────────────────────────────────────────────

    /// Summarize the Ingested region into the Summary region.
    ///
    /// Empty (post-trim) input clears the Summary region without a network
    /// call. A pending request rejects the newcomer. Success writes the
    /// summary and immediately reads it aloud; failure writes a fixed
    /// inline message — distinct for service and transport failures — and
    /// does not start playback.
    pub async fn summarize(&self) -> Result<()> {
        let source = self.inner.slots.get(SlotName::Ingested);
        let trimmed = source.trim();
        if trimmed.is_empty() {
            debug!("summarize on empty ingested text: clearing summary");
            self.write_slot(SlotName::Summary, String::new());
            return Ok(());
        }

        if self
            .inner
            .summarizing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("summarize rejected: request already pending");
            return Err(LumaError::SummarizationBusy);
        }

        info!(chars = trimmed.len(), "summarization request started");
        let result = self.inner.summarizer.summarize(trimmed).await;
        self.inner.summarizing.store(false, Ordering::SeqCst);

        match result {
            Ok(summary) => {
                self.write_slot(SlotName::Summary, summary.clone());
                if let Err(e) = self.inner.output.play(&summary) {
                    warn!(error = %e, "could not start summary playback");
                }
                Ok(())
            }
            Err(e) => {
                let inline = match &e {
                    LumaError::SummarizationService { status, .. } => {
                        warn!(status = *status, "summarization service error");
                        SUMMARY_SERVICE_ERROR_TEXT
                    }
                    _ => {
                        warn!(error = %e, "summarization transport error");
                        SUMMARY_TRANSPORT_ERROR_TEXT
                    }
                };
                self.write_slot(SlotName::Summary, inline.to_string());
                Err(e)
            }
        }
    }

    pub fn is_summarizing(&self) -> bool {
        self.inner.summarizing.load(Ordering::SeqCst)
    }

    // ── Playback ─────────────────────────────────────────────────────────

    /// Read a named region aloud, preempting any in-progress playback.
    pub fn play_section(&self, slot: SlotName) -> Result<()> {
        let text = self.inner.slots.get(slot);
        self.inner.output.play(&text).map(|_| ())
    }

    /// Read aloud with the fallback rule: explicit text if given, else the
    /// focused region's content, else the welcome string. Resolving to
    /// nothing is a no-op.
    pub fn play(&self, explicit: Option<&str>) -> Result<()> {
        let focused = {
            let focus = self.inner.focus.lock();
            focus.map(|slot| self.inner.slots.get(slot))
        };
        match resolve_text_source(explicit, focused.as_deref(), &self.inner.config.welcome_text) {
            Some(text) => self.inner.output.play(&text).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Cancel active playback. Idempotent when idle.
    pub fn stop_playback(&self) {
        self.inner.output.stop();
    }

    pub fn playback_status(&self) -> PlaybackStatus {
        self.inner.output.status()
    }

    /// Record which region currently holds input focus.
    pub fn set_focus(&self, slot: Option<SlotName>) {
        *self.inner.focus.lock() = slot;
    }

    // ── Dictation ────────────────────────────────────────────────────────

    /// Whether the dictation affordance should be offered at all.
    pub fn dictation_supported(&self) -> bool {
        self.inner.input.is_available()
    }

    /// Open a dictation session and start pumping recognition events into
    /// the Dictation region.
    ///
    /// An unavailable engine writes the unavailability notice into the
    /// Dictation region so the surface can disable the affordance.
    pub fn dictate_start(&self) -> Result<()> {
        let rx = match self.inner.input.start() {
            Ok(rx) => rx,
            Err(LumaError::UnsupportedCapability) => {
                self.write_slot(SlotName::Dictation, DICTATION_UNSUPPORTED_TEXT.to_string());
                return Err(LumaError::UnsupportedCapability);
            }
            Err(e) => return Err(e),
        };

        let session = self.clone();
        let pump = tokio::spawn(async move { session.pump_recognizer_signals(rx).await });
        if let Some(prev) = self.inner.dictation_pump.lock().replace(pump) {
            prev.abort();
        }
        Ok(())
    }

    /// Close the dictation session; the transcript stays durable.
    pub fn dictate_stop(&self) {
        self.inner.input.stop();
    }

    /// Reset the accumulated transcript and zero the Dictation region.
    pub fn dictate_clear(&self) {
        self.inner.input.clear();
        self.write_slot(SlotName::Dictation, String::new());
    }

    pub fn dictation_status(&self) -> DictationStatus {
        self.inner.input.status()
    }

    async fn pump_recognizer_signals(&self, mut rx: broadcast::Receiver<RecognizerSignal>) {
        loop {
            match rx.recv().await {
                Ok(signal) => {
                    if !self.on_recognizer_signal(signal) {
                        break;
                    }
                }
                // Each delivery carries the whole transcript, so a lagged
                // stream self-heals on the next one.
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "dropped recognizer signals");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Returns false when the dictation session is over.
    fn on_recognizer_signal(&self, signal: RecognizerSignal) -> bool {
        match self.inner.input.apply_signal(signal) {
            SignalOutcome::Transcript(display) => {
                self.write_slot(SlotName::Dictation, display);
                true
            }
            SignalOutcome::Ended => false,
            SignalOutcome::Failed(reason) => {
                warn!(error = %LumaError::Recognition(reason), "dictation ended by engine error");
                false
            }
            SignalOutcome::Ignored => false,
        }
    }

    // ── Slots and events ─────────────────────────────────────────────────

    pub fn slot(&self, name: SlotName) -> String {
        self.inner.slots.get(name)
    }

    pub fn slots_snapshot(&self) -> SlotSnapshot {
        self.inner.slots.snapshot()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Subscribe to committed slot writes.
    pub fn subscribe_slots(&self) -> broadcast::Receiver<SlotEvent> {
        self.inner.slot_tx.subscribe()
    }

    /// Subscribe to playback transitions.
    pub fn subscribe_playback(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.inner.output.subscribe()
    }

    /// Subscribe to dictation transitions.
    pub fn subscribe_dictation(&self) -> broadcast::Receiver<DictationEvent> {
        self.inner.input.subscribe()
    }

    fn write_slot(&self, slot: SlotName, text: String) {
        self.inner.slots.set(slot, text.clone());
        let seq = self.inner.slot_seq.fetch_add(1, Ordering::Relaxed);
        let _ = self.inner.slot_tx.send(SlotEvent { seq, slot, text });
    }
}
