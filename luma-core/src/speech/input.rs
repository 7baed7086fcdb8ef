//! Speech input controller.
//!
//! ## State machine
//!
//! ```text
//! Idle ──start()──► Listening ──stop() / engine error / engine end──► Idle
//! ```
//!
//! While listening, every recognition delivery carries the engine's whole-
//! utterance reconstruction, so the observable transcript at any instant is
//! `finalized + current + " "` — the trailing space keeps a subsequent
//! utterance from visually merging with the prior one. Every path out of
//! Listening keeps the last delivered transcript durable.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{LumaError, Result};
use crate::ipc::events::{DictationEvent, DictationStatus};
use crate::speech::{RecognizerSignal, VoiceRecognizer};

const EVENT_CAP: usize = 64;

struct InputState {
    status: DictationStatus,
    finalized: String,
    last_display: String,
}

/// What the session controller should do with a recognizer signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Commit this display transcript; the session is still listening.
    Transcript(String),
    /// The session ended (stop or engine end); the transcript is durable.
    Ended,
    /// Engine-reported fatal error; the partial transcript is preserved.
    Failed(String),
    /// The signal arrived for a session that is no longer listening.
    Ignored,
}

pub struct SpeechInputController {
    recognizer: Arc<dyn VoiceRecognizer>,
    language_tag: String,
    state: Mutex<InputState>,
    event_tx: broadcast::Sender<DictationEvent>,
}

impl SpeechInputController {
    pub fn new(recognizer: Arc<dyn VoiceRecognizer>, language_tag: impl Into<String>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAP);
        Self {
            recognizer,
            language_tag: language_tag.into(),
            state: Mutex::new(InputState {
                status: DictationStatus::Idle,
                finalized: String::new(),
                last_display: String::new(),
            }),
            event_tx,
        }
    }

    /// Whether the recognition capability exists at all on this platform.
    pub fn is_available(&self) -> bool {
        self.recognizer.is_available()
    }

    /// Open a dictation session and return the engine's signal stream.
    ///
    /// The accumulated `finalized` text resets on start; the previously
    /// displayed transcript stays durable until the first new delivery.
    ///
    /// # Errors
    /// - `LumaError::UnsupportedCapability` when the engine is unavailable
    ///   (the controller stays Idle).
    /// - `LumaError::AlreadyListening` when a session is already open.
    pub fn start(&self) -> Result<broadcast::Receiver<RecognizerSignal>> {
        if !self.recognizer.is_available() {
            return Err(LumaError::UnsupportedCapability);
        }

        let mut state = self.state.lock();
        if state.status == DictationStatus::Listening {
            return Err(LumaError::AlreadyListening);
        }

        // Subscribe before starting so the first delivery cannot be lost.
        let rx = self.recognizer.subscribe();
        self.recognizer.start(&self.language_tag)?;
        state.status = DictationStatus::Listening;
        state.finalized.clear();
        drop(state);

        self.emit(DictationStatus::Listening, None);
        info!(language = %self.language_tag, "dictation session started");
        Ok(rx)
    }

    /// Close the session. The last delivered transcript stays durable and
    /// no further mutation happens until a new `start()`. Idempotent when
    /// already idle, and effective immediately even while the engine's own
    /// teardown is still in flight.
    pub fn stop(&self) {
        {
            // Stop the engine under the lock so a racing start() cannot be
            // torn down by this session's teardown.
            let mut state = self.state.lock();
            if state.status == DictationStatus::Idle {
                return;
            }
            state.status = DictationStatus::Idle;
            self.recognizer.stop();
        }
        self.emit(DictationStatus::Idle, None);
        info!("dictation session stopped");
    }

    /// Reset the accumulated transcript.
    ///
    /// Permitted during Listening, but the next delivery repopulates the
    /// display from the engine's own internal accumulation — the engine,
    /// not this controller, is the source of truth for finalized segments
    /// while a session is open.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.finalized.clear();
        state.last_display.clear();
    }

    /// Apply one recognizer signal.
    pub fn apply_signal(&self, signal: RecognizerSignal) -> SignalOutcome {
        let mut state = self.state.lock();
        if state.status != DictationStatus::Listening {
            return SignalOutcome::Ignored;
        }

        match signal {
            RecognizerSignal::Result(event) => {
                let display = format!("{}{} ", state.finalized, event.transcript());
                state.last_display = display.clone();
                SignalOutcome::Transcript(display)
            }
            RecognizerSignal::Error(reason) => {
                state.status = DictationStatus::Idle;
                drop(state);
                warn!(%reason, "recognition engine reported an error");
                self.emit(DictationStatus::Idle, Some(reason.clone()));
                SignalOutcome::Failed(reason)
            }
            RecognizerSignal::Ended => {
                state.status = DictationStatus::Idle;
                drop(state);
                debug!("recognition engine ended the session");
                self.emit(DictationStatus::Idle, None);
                SignalOutcome::Ended
            }
        }
    }

    pub fn status(&self) -> DictationStatus {
        self.state.lock().status
    }

    /// The last display transcript this controller produced.
    pub fn transcript(&self) -> String {
        self.state.lock().last_display.clone()
    }

    /// Subscribe to dictation state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<DictationEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, status: DictationStatus, detail: Option<String>) {
        let _ = self.event_tx.send(DictationEvent { status, detail });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::stub::StubRecognizer;
    use crate::speech::RecognitionEvent;

    fn controller() -> (Arc<StubRecognizer>, SpeechInputController) {
        let recognizer = Arc::new(StubRecognizer::new());
        let controller = SpeechInputController::new(
            Arc::clone(&recognizer),
            "en-US",
        );
        (recognizer, controller)
    }

    fn result(text: &str) -> RecognizerSignal {
        RecognizerSignal::Result(RecognitionEvent::interim(text))
    }

    #[test]
    fn whole_utterance_deliveries_accumulate_with_trailing_space() {
        let (_recognizer, controller) = controller();
        controller.start().expect("start");

        for text in ["hel", "hello", "hello world"] {
            let outcome = controller.apply_signal(result(text));
            assert_eq!(
                outcome,
                SignalOutcome::Transcript(format!("{text} ")),
                "each delivery replaces the current utterance"
            );
        }

        controller.stop();
        assert_eq!(controller.transcript(), "hello world ");

        controller.clear();
        assert_eq!(controller.transcript(), "");
    }

    #[test]
    fn start_fails_and_stays_idle_when_engine_unavailable() {
        let recognizer = Arc::new(StubRecognizer::unavailable());
        let controller = SpeechInputController::new(
            Arc::clone(&recognizer),
            "en-US",
        );
        let err = controller.start().expect_err("unavailable engine");
        assert!(matches!(err, LumaError::UnsupportedCapability));
        assert_eq!(controller.status(), DictationStatus::Idle);
        assert!(recognizer.started_languages().is_empty());
    }

    #[test]
    fn second_start_is_rejected_while_listening() {
        let (_recognizer, controller) = controller();
        controller.start().expect("start");
        let err = controller.start().expect_err("double start");
        assert!(matches!(err, LumaError::AlreadyListening));
    }

    #[test]
    fn engine_error_force_ends_but_preserves_the_transcript() {
        let (_recognizer, controller) = controller();
        controller.start().expect("start");
        controller.apply_signal(result("partial notes"));

        let outcome = controller.apply_signal(RecognizerSignal::Error("audio-capture".into()));
        assert_eq!(outcome, SignalOutcome::Failed("audio-capture".into()));
        assert_eq!(controller.status(), DictationStatus::Idle);
        assert_eq!(controller.transcript(), "partial notes ");
    }

    #[test]
    fn unilateral_engine_end_returns_to_idle() {
        let (_recognizer, controller) = controller();
        controller.start().expect("start");
        controller.apply_signal(result("words"));

        let outcome = controller.apply_signal(RecognizerSignal::Ended);
        assert_eq!(outcome, SignalOutcome::Ended);
        assert_eq!(controller.status(), DictationStatus::Idle);
        assert_eq!(controller.transcript(), "words ");
    }

    #[test]
    fn signals_after_stop_are_ignored() {
        let (_recognizer, controller) = controller();
        controller.start().expect("start");
        controller.stop();

        let outcome = controller.apply_signal(result("late"));
        assert_eq!(outcome, SignalOutcome::Ignored);
        assert_eq!(controller.transcript(), "");
    }

    #[test]
    fn clear_during_listening_resets_accumulation_only() {
        let (_recognizer, controller) = controller();
        controller.start().expect("start");
        controller.apply_signal(result("before"));
        controller.clear();
        assert_eq!(controller.transcript(), "");

        // The engine's own accumulation repopulates the display.
        let outcome = controller.apply_signal(result("before and after"));
        assert_eq!(
            outcome,
            SignalOutcome::Transcript("before and after ".into())
        );
    }

    #[test]
    fn restart_resets_finalized_accumulation() {
        let (recognizer, controller) = controller();
        controller.start().expect("start");
        controller.apply_signal(result("first session"));
        controller.stop();

        controller.start().expect("restart");
        let outcome = controller.apply_signal(result("second"));
        assert_eq!(outcome, SignalOutcome::Transcript("second ".into()));
        assert_eq!(recognizer.started_languages(), vec!["en-US", "en-US"]);
    }
}
