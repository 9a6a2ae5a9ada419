use super::{Reader, Reply};
use crate::controller::{PlaybackController, ToggleOutcome};
use crate::engine::SpeechEngine;

pub fn word_line<E: SpeechEngine>(controller: &PlaybackController<E>, index: usize) -> String {
    let word = controller.words().get(index).map(String::as_str).unwrap_or("");
    format!("[{}/{}] {}", index + 1, controller.words().len(), word)
}

fn spoken<E: SpeechEngine>(reader: &Reader<E>, index: Option<usize>) -> Reply {
    match index {
        Some(index) => Reply::Message(word_line(&reader.controller, index)),
        None => Reply::Silent,
    }
}

pub fn set_text<E: SpeechEngine>(reader: &mut Reader<E>, text: String) -> Result<Reply, String> {
    reader.controller.text_changed(text);
    Ok(Reply::Message("Text updated.".to_string()))
}

pub fn prepare<E: SpeechEngine>(
    reader: &mut Reader<E>,
    text: Option<String>,
) -> Result<Reply, String> {
    if let Some(text) = text {
        reader.controller.text_changed(text);
    }
    let count = reader.controller.prepare().map_err(|e| e.to_string())?;
    Ok(Reply::Message(format!("Prepared {} words.", count)))
}

pub fn start<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    reader.controller.start_reading().map_err(|e| e.to_string())?;
    Ok(Reply::Silent)
}

pub fn toggle<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let outcome = reader.controller.toggle_play_pause().map_err(|e| e.to_string())?;
    Ok(match outcome {
        ToggleOutcome::Paused => Reply::Message("Paused.".to_string()),
        ToggleOutcome::Resumed => Reply::Message("Resumed.".to_string()),
        ToggleOutcome::Started | ToggleOutcome::Debounced => Reply::Silent,
    })
}

pub fn stop<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    reader.controller.stop();
    Ok(Reply::Message("Stopped.".to_string()))
}

pub fn reset<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    reader.controller.reset_to_start();
    Ok(Reply::Message("Back at the start.".to_string()))
}

pub fn previous<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let index = reader.controller.previous_word().map_err(|e| e.to_string())?;
    Ok(spoken(reader, index))
}

pub fn next<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let index = reader.controller.next_word().map_err(|e| e.to_string())?;
    Ok(spoken(reader, index))
}

pub fn sentence_start<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let index = reader.controller.jump_to_sentence_start().map_err(|e| e.to_string())?;
    Ok(spoken(reader, Some(index)))
}

pub fn sentence_end<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let index = reader.controller.jump_to_sentence_end().map_err(|e| e.to_string())?;
    Ok(spoken(reader, Some(index)))
}

pub fn jump<E: SpeechEngine>(reader: &mut Reader<E>, position: usize) -> Result<Reply, String> {
    let index = reader.controller.jump_to_position(position).map_err(|e| e.to_string())?;
    Ok(spoken(reader, Some(index)))
}

pub fn repeat<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let index = reader.controller.repeat_word().map_err(|e| e.to_string())?;
    Ok(spoken(reader, Some(index)))
}

pub fn status<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let view = reader.controller.view();
    let name = &reader.controller.document().name;
    Ok(Reply::Message(format!(
        "{} | {:?} | word {}/{} | rate {:.2}{}",
        if name.is_empty() { "(unnamed)" } else { name.as_str() },
        view.status,
        view.position,
        view.total,
        reader.controller.settings().speech.effective_rate(),
        if view.prepared { "" } else { " | not prepared" },
    )))
}
