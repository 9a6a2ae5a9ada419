pub mod adapter;
pub mod timed;
pub mod voice;

#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use tokio::sync::mpsc;

pub use adapter::SpeechEngineAdapter;
pub use voice::{LocaleVoiceSelector, Voice, VoiceGender, VoicePreference, VoiceSelector};

/// One utterance submitted to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub rate: f32,
    /// Opaque voice handle; `None` leaves the choice to the engine
    pub voice_id: Option<String>,
    pub language: String,
}

/// Engine notification after normalization, with absolute word indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEventKind {
    WordBoundary { index: usize },
    Finished,
    Paused,
    Resumed,
    Failed { reason: String },
}

/// A notification tagged with the sequence number of the utterance it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub seq: u64,
    pub kind: PlaybackEventKind,
}

pub type EventSender = mpsc::UnboundedSender<PlaybackEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<PlaybackEvent>;

/// Callback handle the engine receives with each `speak` call.
///
/// The engine speaks a joined span of words, so boundary callbacks carry no
/// word index of their own. The handle counts them from the first word of the
/// span and reports absolute indices.
#[derive(Debug)]
pub struct UtteranceEvents {
    seq: u64,
    next_index: usize,
    tx: EventSender,
}

impl UtteranceEvents {
    pub(crate) fn new(seq: u64, start_index: usize, tx: EventSender) -> Self {
        Self { seq, next_index: start_index, tx }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The engine reached the start of the next spoken word
    pub fn boundary(&mut self, word: &str, char_offset: usize) {
        let index = self.next_index;
        self.next_index += 1;
        tracing::trace!(
            "utterance {} boundary '{}' at char {} -> word {}",
            self.seq,
            word,
            char_offset,
            index
        );
        self.send(PlaybackEventKind::WordBoundary { index });
    }

    pub fn finished(&self) {
        self.send(PlaybackEventKind::Finished);
    }

    pub fn paused(&self) {
        self.send(PlaybackEventKind::Paused);
    }

    pub fn resumed(&self) {
        self.send(PlaybackEventKind::Resumed);
    }

    pub fn failed(&self, reason: impl Into<String>) {
        self.send(PlaybackEventKind::Failed { reason: reason.into() });
    }

    fn send(&self, kind: PlaybackEventKind) {
        // The receiver only goes away on shutdown
        let _ = self.tx.send(PlaybackEvent { seq: self.seq, kind });
    }
}

/// The platform speech capability: one active utterance at a time, events delivered asynchronously
pub trait SpeechEngine: Send {
    fn speak(&mut self, request: SpeechRequest, events: UtteranceEvents) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);

    /// Voices the engine offers; empty when it cannot enumerate them
    fn voices(&self) -> Vec<Voice> {
        Vec::new()
    }
}

impl<E: SpeechEngine + ?Sized> SpeechEngine for Box<E> {
    fn speak(&mut self, request: SpeechRequest, events: UtteranceEvents) -> Result<()> {
        (**self).speak(request, events)
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn resume(&mut self) {
        (**self).resume()
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }

    fn voices(&self) -> Vec<Voice> {
        (**self).voices()
    }
}
