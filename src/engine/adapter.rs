use tokio::sync::mpsc;

use super::{
    EventReceiver, EventSender, PlaybackEvent, PlaybackEventKind, SpeechEngine, SpeechRequest,
    UtteranceEvents, Voice,
};
use crate::error::{ReaderError, ReaderResult};

/// Owns the speech engine and keeps at most one utterance in flight.
///
/// Every `speak` gets a fresh sequence number. Events from any other sequence
/// number, and everything arriving after `cancel`, are stale.
pub struct SpeechEngineAdapter<E> {
    engine: E,
    tx: EventSender,
    last_seq: u64,
    live: Option<LiveUtterance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LiveUtterance {
    seq: u64,
    speaking: bool,
    paused: bool,
}

impl<E: SpeechEngine> SpeechEngineAdapter<E> {
    pub fn new(engine: E) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let adapter = Self { engine, tx, last_seq: 0, live: None };
        (adapter, rx)
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.engine.voices()
    }

    /// Sequence number whose callbacks are currently honored
    pub fn current_seq(&self) -> Option<u64> {
        self.live.map(|u| u.seq)
    }

    /// Cancel whatever is in flight and submit `request`, whose first word is `start_index`
    pub fn speak(&mut self, request: SpeechRequest, start_index: usize) -> ReaderResult<u64> {
        self.cancel();

        self.last_seq += 1;
        let seq = self.last_seq;
        let events = UtteranceEvents::new(seq, start_index, self.tx.clone());

        tracing::debug!(
            "utterance {} from word {}: {} chars at rate {}",
            seq,
            start_index,
            request.text.len(),
            request.rate
        );
        match self.engine.speak(request, events) {
            Ok(()) => {
                self.live = Some(LiveUtterance { seq, speaking: true, paused: false });
                Ok(seq)
            }
            Err(e) => {
                tracing::warn!("Speech engine rejected utterance {}: {}", seq, e);
                Err(ReaderError::EngineFailure(e.to_string()))
            }
        }
    }

    /// No-op unless an utterance is speaking and not already paused
    pub fn pause(&mut self) -> bool {
        match self.live.as_mut() {
            Some(u) if u.speaking && !u.paused => {
                self.engine.pause();
                u.paused = true;
                true
            }
            _ => false,
        }
    }

    /// No-op unless an utterance is paused
    pub fn resume(&mut self) -> bool {
        match self.live.as_mut() {
            Some(u) if u.speaking && u.paused => {
                self.engine.resume();
                u.paused = false;
                true
            }
            _ => false,
        }
    }

    /// Stop all speech. Always safe, idempotent, and retires the current sequence number.
    pub fn cancel(&mut self) {
        self.engine.cancel();
        if let Some(u) = self.live.take() {
            tracing::debug!("utterance {} cancelled", u.seq);
        }
    }

    /// Filter an incoming event and track the end of the utterance it reports.
    ///
    /// Pause and resume confirmations change nothing here: `pause`/`resume`
    /// already recorded the command, and a late confirmation must not undo a
    /// newer one.
    pub fn accept(&mut self, event: &PlaybackEvent) -> ReaderResult<()> {
        let current = self.current_seq();
        let Some(live) = self.live.as_mut().filter(|u| u.seq == event.seq) else {
            return Err(ReaderError::StaleCallback { seq: event.seq, current });
        };

        if let PlaybackEventKind::Finished | PlaybackEventKind::Failed { .. } = event.kind {
            live.speaking = false;
            live.paused = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{EngineCall, ScriptedEngine};

    fn request(text: &str) -> SpeechRequest {
        SpeechRequest {
            text: text.to_string(),
            rate: 1.0,
            voice_id: None,
            language: "de-DE".to_string(),
        }
    }

    #[test]
    fn speak_cancels_previous_and_bumps_sequence() {
        let engine = ScriptedEngine::default();
        let (mut adapter, _rx) = SpeechEngineAdapter::new(engine.clone());

        let first = adapter.speak(request("eins zwei"), 0).unwrap();
        let second = adapter.speak(request("zwei"), 1).unwrap();

        assert!(second > first);
        assert_eq!(adapter.current_seq(), Some(second));
        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::Cancel,
                EngineCall::Speak("eins zwei".into()),
                EngineCall::Cancel,
                EngineCall::Speak("zwei".into()),
            ]
        );
    }

    #[test]
    fn superseded_events_are_stale() {
        let engine = ScriptedEngine::default();
        let (mut adapter, mut rx) = SpeechEngineAdapter::new(engine.clone());

        adapter.speak(request("a b c"), 0).unwrap();
        let mut old = engine.take_events().unwrap();
        adapter.speak(request("b c"), 1).unwrap();

        old.boundary("a", 0);
        let event = rx.try_recv().unwrap();
        assert!(matches!(adapter.accept(&event), Err(ReaderError::StaleCallback { .. })));
    }

    #[test]
    fn pause_and_resume_are_noops_without_speech() {
        let engine = ScriptedEngine::default();
        let (mut adapter, _rx) = SpeechEngineAdapter::new(engine.clone());

        assert!(!adapter.pause());
        assert!(!adapter.resume());

        adapter.speak(request("hallo"), 0).unwrap();
        assert!(!adapter.resume());
        assert!(adapter.pause());
        assert!(!adapter.pause());
        assert!(adapter.resume());

        let calls = engine.calls();
        assert_eq!(calls.iter().filter(|c| **c == EngineCall::Pause).count(), 1);
        assert_eq!(calls.iter().filter(|c| **c == EngineCall::Resume).count(), 1);
    }

    #[test]
    fn cancel_is_idempotent_and_retires_sequence() {
        let engine = ScriptedEngine::default();
        let (mut adapter, mut rx) = SpeechEngineAdapter::new(engine.clone());

        adapter.speak(request("hallo welt"), 0).unwrap();
        let events = engine.take_events().unwrap();
        adapter.cancel();
        adapter.cancel();
        assert_eq!(adapter.current_seq(), None);
        assert!(!adapter.pause());

        events.failed("interrupted");
        let event = rx.try_recv().unwrap();
        assert!(adapter.accept(&event).is_err());
    }

    #[test]
    fn late_confirmations_do_not_override_commands() {
        let engine = ScriptedEngine::default();
        let (mut adapter, mut rx) = SpeechEngineAdapter::new(engine.clone());

        adapter.speak(request("eins zwei drei"), 0).unwrap();
        let events = engine.take_events().unwrap();
        assert!(adapter.pause());
        events.paused();
        assert!(adapter.resume());

        // the pause confirmation lands after the resume was issued
        adapter.accept(&rx.try_recv().unwrap()).unwrap();
        assert!(adapter.pause());

        events.resumed();
        adapter.accept(&rx.try_recv().unwrap()).unwrap();
        assert!(adapter.resume());

        let calls = engine.calls();
        assert_eq!(calls.iter().filter(|c| **c == EngineCall::Pause).count(), 2);
        assert_eq!(calls.iter().filter(|c| **c == EngineCall::Resume).count(), 2);
    }

    #[test]
    fn finished_settles_the_live_utterance() {
        let engine = ScriptedEngine::default();
        let (mut adapter, mut rx) = SpeechEngineAdapter::new(engine.clone());

        adapter.speak(request("hallo"), 0).unwrap();
        engine.take_events().unwrap().finished();
        adapter.accept(&rx.try_recv().unwrap()).unwrap();

        assert_eq!(adapter.current_seq(), Some(1));
        assert!(!adapter.pause());
    }

    #[test]
    fn engine_rejection_is_an_engine_failure() {
        let engine = ScriptedEngine::default();
        engine.fail_next_speak("no audio device");
        let (mut adapter, _rx) = SpeechEngineAdapter::new(engine.clone());

        let err = adapter.speak(request("hallo"), 0).unwrap_err();
        assert!(matches!(err, ReaderError::EngineFailure(ref r) if r.contains("no audio device")));
        assert_eq!(adapter.current_seq(), None);
    }
}
