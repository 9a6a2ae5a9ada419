use super::{Reader, Reply};
use crate::engine::{SpeechEngine, VoiceGender};
use crate::persistence;

fn persist<E: SpeechEngine>(reader: &Reader<E>) {
    if let Some(path) = &reader.settings_path {
        if let Err(e) = persistence::save_settings(path, reader.controller.settings()) {
            tracing::error!("Failed to save settings: {}", e);
        }
    }
}

pub fn set_rate<E: SpeechEngine>(reader: &mut Reader<E>, rate: f32) -> Result<Reply, String> {
    let applied = reader.controller.set_rate(rate).map_err(|e| e.to_string())?;
    persist(reader);
    Ok(Reply::Message(format!("Rate {:.2} (from the next word spoken).", applied)))
}

pub fn set_voice<E: SpeechEngine>(
    reader: &mut Reader<E>,
    voice_id: Option<String>,
) -> Result<Reply, String> {
    if let Some(id) = &voice_id {
        if !reader.controller.voices().iter().any(|v| &v.id == id) {
            return Err(format!("Unknown voice '{}', see 'voices'", id));
        }
    }
    let message = match &voice_id {
        Some(id) => format!("Voice {}.", id),
        None => "Engine default voice.".to_string(),
    };
    reader.controller.set_voice(voice_id);
    persist(reader);
    Ok(Reply::Message(message))
}

pub fn set_gender<E: SpeechEngine>(
    reader: &mut Reader<E>,
    gender: Option<VoiceGender>,
) -> Result<Reply, String> {
    reader.controller.set_voice_gender(gender);
    persist(reader);
    let message = match gender {
        Some(VoiceGender::Female) => "Preferring female voices.",
        Some(VoiceGender::Male) => "Preferring male voices.",
        None => "No voice gender preference.",
    };
    Ok(Reply::Message(message.to_string()))
}

pub fn list_voices<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let voices = reader.controller.voices();
    if voices.is_empty() {
        return Ok(Reply::Message("The engine offers no selectable voices.".to_string()));
    }
    let current = reader.controller.settings().speech.voice_id.as_deref();
    let lines: Vec<String> = voices
        .iter()
        .map(|v| {
            let marker = if Some(v.id.as_str()) == current { "*" } else { " " };
            format!("{} {:<14} {:<20} {}", marker, v.id, v.name, v.language)
        })
        .collect();
    Ok(Reply::Message(lines.join("\n")))
}
