use std::path::{Path, PathBuf};

use super::{Reader, Reply};
use crate::engine::SpeechEngine;

fn export_dir<E: SpeechEngine>(reader: &Reader<E>) -> PathBuf {
    reader
        .controller
        .settings()
        .general
        .export_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn set_name<E: SpeechEngine>(reader: &mut Reader<E>, name: String) -> Result<Reply, String> {
    reader.controller.set_name(name);
    Ok(Reply::Message("Name updated.".to_string()))
}

pub fn export<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let path = reader
        .controller
        .export_session(&export_dir(reader))
        .map_err(|e| e.to_string())?;
    Ok(Reply::Message(format!("Saved {}", path.display())))
}

pub fn export_text<E: SpeechEngine>(reader: &mut Reader<E>) -> Result<Reply, String> {
    let path = reader
        .controller
        .export_text(&export_dir(reader))
        .map_err(|e| e.to_string())?;
    Ok(Reply::Message(format!("Saved {}", path.display())))
}

pub fn import<E: SpeechEngine>(reader: &mut Reader<E>, path: &Path) -> Result<Reply, String> {
    reader.controller.import_file(path).map_err(|e| e.to_string())?;
    Ok(Reply::Message(format!(
        "Loaded '{}' ({} words).",
        reader.controller.document().name,
        reader.controller.words().len()
    )))
}
