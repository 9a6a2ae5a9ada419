use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{SpeechEngine, SpeechRequest, UtteranceEvents, Voice};
use crate::text;

const MIN_WORD_MS: f32 = 40.0;
const SENTENCE_PAUSE_FACTOR: f32 = 2.0;

/// Engine that "speaks" by pacing through the words of a request on the tokio runtime.
///
/// Emits one boundary per word, `end` after the last one, and confirms
/// pause/resume from the speaking task. Cancel aborts silently.
pub struct TimedSpeechEngine {
    words_per_minute: u32,
    voices: Vec<Voice>,
    task: Option<JoinHandle<()>>,
    pause_tx: Option<watch::Sender<bool>>,
}

impl TimedSpeechEngine {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute: words_per_minute.max(1),
            voices: Vec::new(),
            task: None,
            pause_tx: None,
        }
    }

    pub fn with_voices(mut self, voices: Vec<Voice>) -> Self {
        self.voices = voices;
        self
    }

    fn word_duration(&self, rate: f32) -> Duration {
        let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
        let ms = 60_000.0 / (self.words_per_minute as f32 * rate);
        Duration::from_millis(ms.max(MIN_WORD_MS) as u64)
    }
}

impl SpeechEngine for TimedSpeechEngine {
    fn speak(&mut self, request: SpeechRequest, events: UtteranceEvents) -> Result<()> {
        self.cancel();

        let runtime = tokio::runtime::Handle::try_current()
            .context("Timed speech engine needs a running tokio runtime")?;
        let per_word = self.word_duration(request.rate);
        let (pause_tx, pause_rx) = watch::channel(false);

        tracing::debug!(
            "Speaking utterance {} ({:?}/word, voice {:?}, {})",
            events.seq(),
            per_word,
            request.voice_id,
            request.language
        );

        self.task = Some(runtime.spawn(speak_words(request.text, per_word, events, pause_rx)));
        self.pause_tx = Some(pause_tx);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(tx) = &self.pause_tx {
            tx.send_replace(true);
        }
    }

    fn resume(&mut self) {
        if let Some(tx) = &self.pause_tx {
            tx.send_replace(false);
        }
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.pause_tx = None;
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }
}

impl Drop for TimedSpeechEngine {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn speak_words(
    text: String,
    per_word: Duration,
    mut events: UtteranceEvents,
    mut pause_rx: watch::Receiver<bool>,
) {
    for span in text::token_spans(&text) {
        let word = &text[span.clone()];
        events.boundary(word, span.start);

        let dwell = if text::ends_sentence(word) {
            per_word.mul_f32(SENTENCE_PAUSE_FACTOR)
        } else {
            per_word
        };
        if !pausable_sleep(dwell, &mut pause_rx, &events).await {
            return;
        }
    }
    events.finished();
}

/// Sleep for `duration` of unpaused time.
/// Returns false once the engine has let go of the utterance.
async fn pausable_sleep(
    duration: Duration,
    pause_rx: &mut watch::Receiver<bool>,
    events: &UtteranceEvents,
) -> bool {
    let mut remaining = duration;
    loop {
        if *pause_rx.borrow_and_update() {
            events.paused();
            loop {
                if pause_rx.changed().await.is_err() {
                    return false;
                }
                if !*pause_rx.borrow_and_update() {
                    break;
                }
            }
            events.resumed();
        }

        let started = Instant::now();
        tokio::select! {
            _ = tokio::time::sleep(remaining) => return true,
            changed = pause_rx.changed() => {
                if changed.is_err() {
                    return false;
                }
                remaining = remaining.saturating_sub(started.elapsed());
            }
        }
    }
}
