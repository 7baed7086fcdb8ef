//! Speech output controller.
//!
//! At most one speaking session exists system-wide. A new `play` preempts
//! the active session unconditionally; there is no utterance queue. Each
//! session gets a fresh utterance id, and a completion signal carrying a
//! stale id is ignored, so a preempted session can never flip a newer one
//! back to idle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::Result;
use crate::ipc::events::{PlaybackEvent, PlaybackStatus};
use crate::speech::{SynthesizerSignal, VoiceSynthesizer};

const EVENT_CAP: usize = 64;

struct OutputState {
    status: PlaybackStatus,
    utterance_id: u64,
}

pub struct SpeechOutputController {
    synthesizer: Arc<dyn VoiceSynthesizer>,
    state: Mutex<OutputState>,
    next_utterance_id: AtomicU64,
    event_tx: broadcast::Sender<PlaybackEvent>,
    seq: AtomicU64,
}

impl SpeechOutputController {
    pub fn new(synthesizer: Arc<dyn VoiceSynthesizer>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CAP);
        Self {
            synthesizer,
            state: Mutex::new(OutputState {
                status: PlaybackStatus::Idle,
                utterance_id: 0,
            }),
            next_utterance_id: AtomicU64::new(0),
            event_tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Start speaking `text`, preempting any in-progress session.
    ///
    /// Empty (post-trim) text is a no-op. Returns the new utterance id
    /// when a session starts.
    pub fn play(&self, text: &str) -> Result<Option<u64>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        // Cancel and restart under the lock so a concurrent play cannot
        // interleave between the two engine calls.
        let mut state = self.state.lock();
        if state.status == PlaybackStatus::Speaking {
            debug!(
                preempted = state.utterance_id,
                "preempting active speech session"
            );
            self.synthesizer.cancel_active();
        }
        let id = self.next_utterance_id.fetch_add(1, Ordering::Relaxed) + 1;
        match self.synthesizer.speak(id, trimmed) {
            Ok(()) => {
                state.status = PlaybackStatus::Speaking;
                state.utterance_id = id;
                drop(state);
                self.emit(PlaybackStatus::Speaking, id);
                Ok(Some(id))
            }
            Err(e) => {
                warn!(utterance_id = id, error = %e, "synthesizer rejected utterance");
                state.status = PlaybackStatus::Idle;
                state.utterance_id = id;
                drop(state);
                self.emit(PlaybackStatus::Idle, id);
                Err(e)
            }
        }
    }

    /// Cancel the active session, if any. Idempotent when already idle.
    ///
    /// The transition is effective immediately: a `status()` read after
    /// this call returns `Idle` even while the engine is still tearing its
    /// own playback down.
    pub fn stop(&self) {
        let id = {
            let mut state = self.state.lock();
            if state.status == PlaybackStatus::Idle {
                return;
            }
            state.status = PlaybackStatus::Idle;
            self.synthesizer.cancel_active();
            state.utterance_id
        };
        self.emit(PlaybackStatus::Idle, id);
    }

    /// Apply a completion signal from the synthesizer.
    ///
    /// A natural completion transitions the session to idle; signals for a
    /// superseded utterance are ignored.
    pub fn handle_signal(&self, signal: SynthesizerSignal) {
        let SynthesizerSignal::Finished { utterance_id } = signal;
        let finished = {
            let mut state = self.state.lock();
            if state.status == PlaybackStatus::Speaking && state.utterance_id == utterance_id {
                state.status = PlaybackStatus::Idle;
                true
            } else {
                false
            }
        };
        if finished {
            self.emit(PlaybackStatus::Idle, utterance_id);
        } else {
            debug!(utterance_id, "ignoring completion for superseded utterance");
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.lock().status
    }

    /// The utterance id of the active session, if speaking.
    pub fn current_utterance_id(&self) -> Option<u64> {
        let state = self.state.lock();
        (state.status == PlaybackStatus::Speaking).then_some(state.utterance_id)
    }

    /// Subscribe to playback transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.event_tx.subscribe()
    }

    /// Receiver for the raw synthesizer signal stream (for the host's
    /// forwarding task).
    pub fn synthesizer_signals(&self) -> broadcast::Receiver<SynthesizerSignal> {
        self.synthesizer.subscribe()
    }

    fn emit(&self, status: PlaybackStatus, utterance_id: u64) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let _ = self.event_tx.send(PlaybackEvent {
            seq,
            status,
            utterance_id,
        });
    }
}

/// Resolve which text a bare read-aloud request should speak: the explicit
/// argument if given, else the focused region's content, else the welcome
/// string. Candidates are judged non-empty after trimming; when every
/// candidate is empty there is nothing to speak.
pub fn resolve_text_source(
    explicit: Option<&str>,
    focused: Option<&str>,
    welcome: &str,
) -> Option<String> {
    for candidate in [explicit, focused, Some(welcome)].into_iter().flatten() {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::stub::StubSynthesizer;

    fn controller() -> (Arc<StubSynthesizer>, SpeechOutputController) {
        let synth = Arc::new(StubSynthesizer::new());
        let controller = SpeechOutputController::new(Arc::clone(&synth));
        (synth, controller)
    }

    #[test]
    fn play_starts_a_speaking_session() {
        let (synth, controller) = controller();
        let id = controller.play("read me").expect("play").expect("session id");
        assert_eq!(controller.status(), PlaybackStatus::Speaking);
        assert_eq!(controller.current_utterance_id(), Some(id));
        assert_eq!(synth.spoken(), vec![(id, "read me".to_string())]);
    }

    #[test]
    fn play_preempts_the_prior_session() {
        let (synth, controller) = controller();
        let first = controller.play("first").expect("play").expect("id");
        let second = controller.play("second").expect("play").expect("id");

        assert_ne!(first, second);
        assert_eq!(synth.cancel_count(), 1);
        assert_eq!(controller.current_utterance_id(), Some(second));

        // The preempted session's late completion must not end the new one.
        controller.handle_signal(SynthesizerSignal::Finished {
            utterance_id: first,
        });
        assert_eq!(controller.status(), PlaybackStatus::Speaking);

        controller.handle_signal(SynthesizerSignal::Finished {
            utterance_id: second,
        });
        assert_eq!(controller.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn empty_text_is_a_no_op() {
        let (synth, controller) = controller();
        assert_eq!(controller.play("   ").expect("play"), None);
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert!(synth.spoken().is_empty());
    }

    #[test]
    fn stop_is_idempotent() {
        let (synth, controller) = controller();
        controller.stop();
        assert_eq!(synth.cancel_count(), 0);

        controller.play("speak").expect("play");
        controller.stop();
        controller.stop();
        assert_eq!(controller.status(), PlaybackStatus::Idle);
        assert_eq!(synth.cancel_count(), 1);
    }

    #[test]
    fn speak_failure_returns_the_session_to_idle() {
        let synth = Arc::new(StubSynthesizer::failing());
        let controller = SpeechOutputController::new(Arc::clone(&synth));
        let err = controller.play("anything").expect_err("speak must fail");
        assert!(matches!(err, crate::error::LumaError::Synthesis(_)));
        assert_eq!(controller.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn resolve_prefers_explicit_then_focus_then_welcome() {
        assert_eq!(
            resolve_text_source(Some("explicit"), Some("focused"), "welcome").as_deref(),
            Some("explicit")
        );
        assert_eq!(
            resolve_text_source(None, Some("focused"), "welcome").as_deref(),
            Some("focused")
        );
        assert_eq!(
            resolve_text_source(None, None, "welcome").as_deref(),
            Some("welcome")
        );
        assert_eq!(
            resolve_text_source(Some("  "), Some(""), "welcome").as_deref(),
            Some("welcome")
        );
        assert_eq!(resolve_text_source(None, None, "  "), None);
    }
}
