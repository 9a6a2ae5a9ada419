//! Reading sessions on disk: the `<name>_quasselo.json` document and plain-text export.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReaderError, ReaderResult};

pub const SESSION_VERSION: &str = "1.0";
const SESSION_SUFFIX: &str = "_quasselo.json";
const PLACEHOLDER_NAME: &str = "quasselo";

/// Persisted form of a prepared document. `words` is trusted as-is on import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingSession {
    pub name: String,
    pub text: String,
    pub words: Vec<String>,
    pub version: String,
}

impl ReadingSession {
    pub fn new(name: impl Into<String>, text: impl Into<String>, words: Vec<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            words,
            version: SESSION_VERSION.to_string(),
        }
    }

    pub fn to_json(&self) -> ReaderResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReaderError::Io(e.into()))
    }

    /// Parse and validate in one step; nothing is returned unless the whole document is usable
    pub fn from_json(data: &str) -> ReaderResult<Self> {
        let session: ReadingSession = serde_json::from_str(data)
            .map_err(|e| ReaderError::ImportMalformed(e.to_string()))?;
        if session.words.is_empty() {
            return Err(ReaderError::ImportMalformed("session has no words".into()));
        }
        if session.version != SESSION_VERSION {
            tracing::debug!(
                "Importing session version {} (expected {})",
                session.version,
                SESSION_VERSION
            );
        }
        Ok(session)
    }

    pub fn file_name(&self) -> String {
        session_file_name(&self.name)
    }
}

fn file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        PLACEHOLDER_NAME.to_string()
    } else {
        cleaned
    }
}

pub fn session_file_name(name: &str) -> String {
    format!("{}{}", file_stem(name), SESSION_SUFFIX)
}

pub fn text_file_name(name: &str) -> String {
    format!("{}.txt", file_stem(name))
}

pub fn export_session(session: &ReadingSession, dir: &Path) -> ReaderResult<PathBuf> {
    let path = dir.join(session.file_name());
    std::fs::write(&path, session.to_json()?)?;
    tracing::info!("Session exported to {}", path.display());
    Ok(path)
}

pub fn export_text(name: &str, text: &str, dir: &Path) -> ReaderResult<PathBuf> {
    let path = dir.join(text_file_name(name));
    std::fs::write(&path, text)?;
    tracing::info!("Text exported to {}", path.display());
    Ok(path)
}

pub fn import_session(path: &Path) -> ReaderResult<ReadingSession> {
    let data = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => ReaderError::ImportMalformed(e.to_string()),
        _ => ReaderError::Io(e),
    })?;
    let session = ReadingSession::from_json(&data)?;
    tracing::info!(
        "Session '{}' imported from {} ({} words)",
        session.name,
        path.display(),
        session.words.len()
    );
    Ok(session)
}
