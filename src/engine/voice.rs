use serde::{Deserialize, Serialize};

/// A voice offered by the speech engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    /// BCP 47 tag, e.g. "de-DE"
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceGender {
    Female,
    Male,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePreference {
    pub voice_id: Option<String>,
    pub language: String,
    pub gender: Option<VoiceGender>,
}

/// Strategy from "available voices + preference" to a voice, or `None` for the engine default
pub trait VoiceSelector: Send + Sync {
    fn select(&self, voices: &[Voice], preference: &VoicePreference) -> Option<Voice>;
}

impl<F> VoiceSelector for F
where
    F: Fn(&[Voice], &VoicePreference) -> Option<Voice> + Send + Sync,
{
    fn select(&self, voices: &[Voice], preference: &VoicePreference) -> Option<Voice> {
        self(voices, preference)
    }
}

// Name fragments platform voices commonly carry. Best effort only.
const FEMALE_HINTS: &[&str] = &[
    "female", "frau", "anna", "helena", "katja", "marlene", "vicki", "petra", "hedda", "katharina",
];
const MALE_HINTS: &[&str] = &[
    "male", "mann", "hans", "markus", "stefan", "yannick", "conrad", "daniel", "klaus",
];

/// Exact id first, then the locale filtered by gender name hints, then any voice of the locale
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleVoiceSelector;

impl LocaleVoiceSelector {
    fn matches_locale(voice: &Voice, language: &str) -> bool {
        let normalized = voice.language.replace('_', "-");
        if normalized.eq_ignore_ascii_case(language) {
            return true;
        }
        // "de" matches "de-AT" and vice versa
        let primary = |tag: &str| tag.split('-').next().unwrap_or("").to_ascii_lowercase();
        primary(&normalized) == primary(language)
    }

    fn matches_gender(voice: &Voice, gender: VoiceGender) -> bool {
        let name = voice.name.to_lowercase();
        let (wanted, other) = match gender {
            VoiceGender::Female => (FEMALE_HINTS, MALE_HINTS),
            VoiceGender::Male => (MALE_HINTS, FEMALE_HINTS),
        };
        let hit = |hints: &[&str]| {
            name.split(|c: char| !c.is_alphanumeric())
                .any(|part| hints.contains(&part))
        };
        hit(wanted) && !hit(other)
    }
}

impl VoiceSelector for LocaleVoiceSelector {
    fn select(&self, voices: &[Voice], preference: &VoicePreference) -> Option<Voice> {
        if let Some(id) = &preference.voice_id {
            if let Some(voice) = voices.iter().find(|v| &v.id == id) {
                return Some(voice.clone());
            }
            tracing::debug!("Preferred voice '{}' not available", id);
        }

        let local: Vec<&Voice> = voices
            .iter()
            .filter(|v| Self::matches_locale(v, &preference.language))
            .collect();

        if let Some(gender) = preference.gender {
            if let Some(voice) = local.iter().find(|v| Self::matches_gender(v, gender)) {
                return Some((*voice).clone());
            }
        }

        local.first().map(|v| (*v).clone())
    }
}
