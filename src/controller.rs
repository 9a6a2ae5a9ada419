//! Playback state machine.
//!
//! The controller is the only writer of the reading position. User commands
//! arrive as method calls and issue at most one engine operation each; engine
//! callbacks arrive later as [`PlaybackEvent`]s through the receiver returned by
//! [`PlaybackController::new`] and are fed back in via
//! [`PlaybackController::handle_event`].
//!
//! Bulk reading speaks one utterance from the cursor to the end of the text and
//! follows its word boundaries. Navigation always cancels first and speaks the
//! target word alone, leaving the controller `Idle`.

use serde::Serialize;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

use crate::cursor::ReadingCursor;
use crate::engine::{
    EventReceiver, LocaleVoiceSelector, PlaybackEvent, PlaybackEventKind, SpeechEngine,
    SpeechEngineAdapter, SpeechRequest, Voice, VoiceGender, VoicePreference, VoiceSelector,
};
use crate::error::{ReaderError, ReaderResult};
use crate::session::{self, ReadingSession};
use crate::state::{PlaybackState, Settings, MAX_SPEECH_RATE, MIN_SPEECH_RATE};
use crate::text;

/// User-authored source text and its label
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Paused,
    Resumed,
    /// Arrived inside the debounce window of the previous toggle and was dropped
    Debounced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Cursor moved to this word
    Advanced(usize),
    /// Reading reached the end; cursor is back at the start
    Done,
    /// Utterance ended before the last word; cursor kept for resuming
    Ended,
    /// Engine confirmed a pause or resume
    Confirmed,
    /// Stale, duplicate, or not applicable in the current state
    Ignored,
}

/// Which controls are usable, derived only from preparation and playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Controls {
    pub prepare: bool,
    pub start: bool,
    pub toggle: bool,
    pub stop: bool,
    pub navigate: bool,
    pub export: bool,
}

/// Snapshot for whatever renders the reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReaderView {
    pub status: PlaybackState,
    pub prepared: bool,
    /// 1-based position of the highlighted word, 0 when nothing is highlighted
    pub position: usize,
    pub total: usize,
    pub highlight: Option<usize>,
    /// Byte range of the highlighted word in the document text
    pub highlight_range: Option<Range<usize>>,
    pub controls: Controls,
}

pub struct PlaybackController<E> {
    adapter: SpeechEngineAdapter<E>,
    selector: Box<dyn VoiceSelector>,
    settings: Settings,
    document: Document,
    cursor: ReadingCursor,
    prepared: bool,
    /// False after an import whose words were not produced from its text
    words_match_text: bool,
    state: PlaybackState,
    highlight: Option<usize>,
    last_boundary: Option<usize>,
    last_toggle: Option<Instant>,
}

impl<E: SpeechEngine> PlaybackController<E> {
    pub fn new(engine: E, settings: Settings) -> (Self, EventReceiver) {
        let (adapter, events) = SpeechEngineAdapter::new(engine);
        let controller = Self {
            adapter,
            selector: Box::new(LocaleVoiceSelector),
            settings,
            document: Document::default(),
            cursor: ReadingCursor::default(),
            prepared: false,
            words_match_text: false,
            state: PlaybackState::Idle,
            highlight: None,
            last_boundary: None,
            last_toggle: None,
        };
        (controller, events)
    }

    pub fn with_voice_selector(mut self, selector: impl VoiceSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn cursor(&self) -> &ReadingCursor {
        &self.cursor
    }

    pub fn words(&self) -> &[String] {
        self.cursor.words()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.adapter.voices()
    }

    // ---- document ----

    /// The source text was edited. Any prepared reading session is invalidated at once.
    pub fn text_changed(&mut self, text: impl Into<String>) {
        self.document.text = text.into();
        self.words_match_text = false;
        if self.prepared {
            self.prepared = false;
            self.halt();
            self.highlight = None;
            tracing::info!("Text changed, reading session invalidated");
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.document.name = name.into();
    }

    /// Tokenize the current text and make it readable from the first word
    pub fn prepare(&mut self) -> ReaderResult<usize> {
        let words = text::tokenize(&self.document.text);
        if words.is_empty() {
            return Err(ReaderError::EmptyInput);
        }

        self.halt();
        let count = words.len();
        self.cursor.replace_words(words);
        self.prepared = true;
        self.words_match_text = true;
        tracing::info!("Prepared {} words", count);
        Ok(count)
    }

    /// Replace the document with an imported session, all or nothing
    pub fn apply_session(&mut self, session: ReadingSession) -> ReaderResult<()> {
        if session.words.is_empty() {
            return Err(ReaderError::ImportMalformed("session has no words".into()));
        }

        self.halt();
        self.words_match_text = text::tokenize(&session.text) == session.words;
        if !self.words_match_text {
            tracing::debug!("Imported words differ from tokenized text, highlight ranges disabled");
        }
        self.document = Document { name: session.name, text: session.text };
        self.cursor.replace_words(session.words);
        self.prepared = true;
        Ok(())
    }

    pub fn import_file(&mut self, path: &Path) -> ReaderResult<()> {
        let session = session::import_session(path)?;
        self.apply_session(session)
    }

    pub fn session(&self) -> ReaderResult<ReadingSession> {
        if !self.prepared {
            return Err(ReaderError::NotPrepared);
        }
        Ok(ReadingSession::new(
            self.document.name.clone(),
            self.document.text.clone(),
            self.cursor.words().to_vec(),
        ))
    }

    pub fn export_session(&self, dir: &Path) -> ReaderResult<PathBuf> {
        session::export_session(&self.session()?, dir)
    }

    pub fn export_text(&self, dir: &Path) -> ReaderResult<PathBuf> {
        if self.document.text.trim().is_empty() {
            return Err(ReaderError::EmptyInput);
        }
        session::export_text(&self.document.name, &self.document.text, dir)
    }

    // ---- configuration ----

    /// Takes effect with the next utterance
    pub fn set_rate(&mut self, rate: f32) -> ReaderResult<f32> {
        if !rate.is_finite() {
            return Err(ReaderError::out_of_range(rate, MIN_SPEECH_RATE, MAX_SPEECH_RATE));
        }
        let rate = rate.clamp(MIN_SPEECH_RATE, MAX_SPEECH_RATE);
        self.settings.speech.rate = rate;
        Ok(rate)
    }

    pub fn set_voice(&mut self, voice_id: Option<String>) {
        self.settings.speech.voice_id = voice_id;
    }

    pub fn set_voice_gender(&mut self, gender: Option<VoiceGender>) {
        self.settings.speech.voice_gender = gender;
    }

    // ---- reading ----

    pub fn start_reading(&mut self) -> ReaderResult<()> {
        self.require_prepared()?;
        self.cursor.reset();
        self.speak_span(0)
    }

    pub fn toggle_play_pause(&mut self) -> ReaderResult<ToggleOutcome> {
        self.toggle_play_pause_at(Instant::now())
    }

    /// Toggle with an explicit timestamp for the debounce window
    pub fn toggle_play_pause_at(&mut self, now: Instant) -> ReaderResult<ToggleOutcome> {
        let window = Duration::from_millis(self.settings.playback.toggle_debounce_ms);
        if let Some(last) = self.last_toggle {
            if now.saturating_duration_since(last) < window {
                tracing::debug!("Toggle dropped inside debounce window");
                return Ok(ToggleOutcome::Debounced);
            }
        }

        let outcome = match self.state {
            PlaybackState::Idle => {
                self.require_prepared()?;
                if self.cursor.is_finished() {
                    self.cursor.reset();
                }
                self.speak_span(self.cursor.index())?;
                ToggleOutcome::Started
            }
            PlaybackState::Playing => {
                self.adapter.pause();
                self.set_state(PlaybackState::Paused);
                ToggleOutcome::Paused
            }
            PlaybackState::Paused => {
                if !self.adapter.resume() {
                    // The utterance is gone; pick up again from the last confirmed word
                    self.speak_span(self.clamped_index())?;
                }
                self.set_state(PlaybackState::Playing);
                ToggleOutcome::Resumed
            }
        };
        self.last_toggle = Some(now);
        Ok(outcome)
    }

    /// Cancel speech and return to the first word
    pub fn stop(&mut self) {
        self.halt();
        self.cursor.reset();
        self.highlight = None;
        tracing::info!("Stopped");
    }

    pub fn reset_to_start(&mut self) {
        self.halt();
        self.cursor.reset();
        self.highlight = None;
        tracing::info!("Reset to start");
    }

    // ---- navigation ----

    /// Returns the word spoken, or `None` at the first word
    pub fn previous_word(&mut self) -> ReaderResult<Option<usize>> {
        self.require_prepared()?;
        let index = self.clamped_index();
        if index == 0 {
            return Ok(None);
        }
        self.speak_single(index - 1).map(Some)
    }

    /// Returns the word spoken, or `None` at the last word
    pub fn next_word(&mut self) -> ReaderResult<Option<usize>> {
        self.require_prepared()?;
        let index = self.clamped_index();
        if index + 1 >= self.cursor.len() {
            return Ok(None);
        }
        self.speak_single(index + 1).map(Some)
    }

    pub fn jump_to_sentence_start(&mut self) -> ReaderResult<usize> {
        self.require_prepared()?;
        let bounds = self.cursor.sentence_bounds().ok_or(ReaderError::NotPrepared)?;
        self.speak_single(bounds.start)
    }

    pub fn jump_to_sentence_end(&mut self) -> ReaderResult<usize> {
        self.require_prepared()?;
        let bounds = self.cursor.sentence_bounds().ok_or(ReaderError::NotPrepared)?;
        self.speak_single(bounds.end)
    }

    /// Jump to a 1-based word position
    pub fn jump_to_position(&mut self, position: usize) -> ReaderResult<usize> {
        self.require_prepared()?;
        let total = self.cursor.len();
        if position < 1 || position > total {
            return Err(ReaderError::out_of_range(position, 1, total));
        }
        self.speak_single(position - 1)
    }

    pub fn repeat_word(&mut self) -> ReaderResult<usize> {
        self.require_prepared()?;
        self.speak_single(self.clamped_index())
    }

    // ---- engine events ----

    pub fn handle_event(&mut self, event: PlaybackEvent) -> ReaderResult<EventOutcome> {
        if let Err(err) = self.adapter.accept(&event) {
            tracing::debug!("Dropping {:?}: {}", event.kind, err);
            return Ok(EventOutcome::Ignored);
        }

        match event.kind {
            PlaybackEventKind::WordBoundary { index } => Ok(self.on_word_boundary(index)),
            PlaybackEventKind::Finished => Ok(self.on_finished()),
            PlaybackEventKind::Paused | PlaybackEventKind::Resumed => {
                tracing::debug!("Engine confirmed {:?} for utterance {}", event.kind, event.seq);
                Ok(EventOutcome::Confirmed)
            }
            PlaybackEventKind::Failed { reason } => {
                tracing::warn!("Speech failed at word {}: {}", self.cursor.index(), reason);
                self.set_state(PlaybackState::Idle);
                Err(ReaderError::EngineFailure(reason))
            }
        }
    }

    fn on_word_boundary(&mut self, index: usize) -> EventOutcome {
        if self.state != PlaybackState::Playing {
            return EventOutcome::Ignored;
        }
        if index >= self.cursor.len() {
            tracing::debug!("Boundary {} beyond last word, ignored", index);
            return EventOutcome::Ignored;
        }
        if self.last_boundary.is_some_and(|last| index <= last) {
            tracing::debug!(
                "Boundary {} does not advance past {:?}, ignored",
                index,
                self.last_boundary
            );
            return EventOutcome::Ignored;
        }

        self.last_boundary = Some(index);
        if self.cursor.set_index(index).is_err() {
            return EventOutcome::Ignored;
        }
        self.highlight = Some(index);
        EventOutcome::Advanced(index)
    }

    /// Also settles a pause: the utterance is over either way, so the next
    /// toggle starts fresh from the cursor.
    fn on_finished(&mut self) -> EventOutcome {
        if self.state == PlaybackState::Idle {
            return EventOutcome::Ignored;
        }
        self.set_state(PlaybackState::Idle);

        if self.cursor.index() + 1 >= self.cursor.len() {
            self.cursor.reset();
            self.highlight = None;
            tracing::info!("Finished reading");
            EventOutcome::Done
        } else {
            tracing::debug!("Utterance ended early at word {}", self.cursor.index());
            EventOutcome::Ended
        }
    }

    // ---- view ----

    pub fn view(&self) -> ReaderView {
        let highlight_range = match self.highlight {
            Some(index) if self.words_match_text => {
                text::locate_word(&self.document.text, self.cursor.words(), index)
            }
            _ => None,
        };
        ReaderView {
            status: self.state,
            prepared: self.prepared,
            position: self.highlight.map(|i| i + 1).unwrap_or(0),
            total: if self.prepared { self.cursor.len() } else { 0 },
            highlight: self.highlight,
            highlight_range,
            controls: self.controls(),
        }
    }

    pub fn controls(&self) -> Controls {
        let idle = self.state == PlaybackState::Idle;
        Controls {
            prepare: idle,
            start: self.prepared,
            toggle: self.prepared,
            stop: !idle,
            navigate: self.prepared,
            export: self.prepared,
        }
    }

    // ---- internals ----

    fn require_prepared(&self) -> ReaderResult<()> {
        if self.prepared {
            Ok(())
        } else {
            Err(ReaderError::NotPrepared)
        }
    }

    fn clamped_index(&self) -> usize {
        self.cursor.index().min(self.cursor.len().saturating_sub(1))
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::debug!("{:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Cancel any speech and fall back to `Idle`, leaving the cursor alone
    fn halt(&mut self) {
        self.adapter.cancel();
        self.last_boundary = None;
        self.set_state(PlaybackState::Idle);
    }

    fn request(&self, text: String) -> SpeechRequest {
        let speech = &self.settings.speech;
        let preference = VoicePreference {
            voice_id: speech.voice_id.clone(),
            language: speech.language.clone(),
            gender: speech.voice_gender,
        };
        let voice = self.selector.select(&self.adapter.voices(), &preference);
        SpeechRequest {
            text,
            rate: speech.effective_rate(),
            voice_id: voice.map(|v| v.id),
            language: speech.language.clone(),
        }
    }

    /// Speak from `from` to the end of the text as one utterance
    fn speak_span(&mut self, from: usize) -> ReaderResult<()> {
        let request = self.request(text::join_from(self.cursor.words(), from));
        self.last_boundary = None;
        if let Err(err) = self.adapter.speak(request, from) {
            self.set_state(PlaybackState::Idle);
            return Err(err);
        }
        self.cursor.set_index(from)?;
        self.highlight = Some(from);
        self.set_state(PlaybackState::Playing);
        tracing::info!("Reading from word {}", from + 1);
        Ok(())
    }

    /// Cancel, move to `index`, and speak that word alone
    fn speak_single(&mut self, index: usize) -> ReaderResult<usize> {
        self.halt();
        self.cursor.set_index(index)?;
        self.highlight = Some(index);

        let word = self.cursor.current_word().unwrap_or_default().to_string();
        let request = self.request(word);
        self.adapter.speak(request, index)?;
        tracing::debug!("Speaking word {} alone", index + 1);
        Ok(index)
    }
}
