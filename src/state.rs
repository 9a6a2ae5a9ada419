use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::VoiceGender;

pub const MIN_SPEECH_RATE: f32 = 0.5;
pub const MAX_SPEECH_RATE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub speech: SpeechSettings,
    #[serde(default)]
    pub playback: PlaybackSettings,
    #[serde(default)]
    pub general: GeneralSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speech: SpeechSettings::default(),
            playback: PlaybackSettings::default(),
            general: GeneralSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    pub rate: f32,
    pub voice_id: Option<String>,
    #[serde(default)]
    pub voice_gender: Option<VoiceGender>,
    pub language: String,
}

impl SpeechSettings {
    /// Rate as sent to the engine
    pub fn effective_rate(&self) -> f32 {
        if self.rate.is_finite() {
            self.rate.clamp(MIN_SPEECH_RATE, MAX_SPEECH_RATE)
        } else {
            SpeechSettings::default().rate
        }
    }
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            rate: 0.9,
            voice_id: None,
            voice_gender: None,
            language: "de-DE".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub toggle_debounce_ms: u64,
    /// Pace of the timed engine at rate 1.0
    pub words_per_minute: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            toggle_debounce_ms: 300,
            words_per_minute: 170,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSettings {
    pub export_dir: Option<PathBuf>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self { export_dir: None }
    }
}
