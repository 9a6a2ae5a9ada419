use anyhow::Result;
use std::sync::{Arc, Mutex};

use super::{SpeechEngine, SpeechRequest, UtteranceEvents, Voice};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Speak(String),
    Pause,
    Resume,
    Cancel,
}

#[derive(Default)]
struct Inner {
    calls: Vec<EngineCall>,
    requests: Vec<SpeechRequest>,
    events: Option<UtteranceEvents>,
    fail_next: Option<String>,
    voices: Vec<Voice>,
}

/// Engine double that records calls and hands the callback handle to the test
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedEngine {
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        let engine = Self::default();
        engine.inner.lock().unwrap().voices = voices;
        engine
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Speak(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn last_request(&self) -> Option<SpeechRequest> {
        self.inner.lock().unwrap().requests.last().cloned()
    }

    /// Callback handle of the most recent `speak`
    pub fn take_events(&self) -> Option<UtteranceEvents> {
        self.inner.lock().unwrap().events.take()
    }

    pub fn fail_next_speak(&self, reason: &str) {
        self.inner.lock().unwrap().fail_next = Some(reason.to_string());
    }
}

impl SpeechEngine for ScriptedEngine {
    fn speak(&mut self, request: SpeechRequest, events: UtteranceEvents) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(reason) = inner.fail_next.take() {
            anyhow::bail!("{}", reason);
        }
        inner.calls.push(EngineCall::Speak(request.text.clone()));
        inner.requests.push(request);
        inner.events = Some(events);
        Ok(())
    }

    fn pause(&mut self) {
        self.inner.lock().unwrap().calls.push(EngineCall::Pause);
    }

    fn resume(&mut self) {
        self.inner.lock().unwrap().calls.push(EngineCall::Resume);
    }

    fn cancel(&mut self) {
        self.inner.lock().unwrap().calls.push(EngineCall::Cancel);
    }

    fn voices(&self) -> Vec<Voice> {
        self.inner.lock().unwrap().voices.clone()
    }
}
