use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::state::Settings;

const SETTINGS_FILE: &str = "settings.json";
const APP_DIR: &str = "Quasselo";

/// Default location of the settings file
pub fn settings_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot find a configuration directory"))?;
    Ok(config_dir.join(APP_DIR).join(SETTINGS_FILE))
}

/// Load settings, falling back to defaults on any problem
pub fn load_settings(path: &Path) -> Settings {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No stored settings found. Using defaults.");
            return Settings::default();
        }
        Err(e) => {
            tracing::warn!(
                "Failed to read settings from {}: {}. Using defaults.",
                path.display(),
                e
            );
            return Settings::default();
        }
    };

    match serde_json::from_str::<Settings>(&data) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Failed to deserialize stored settings: {}. Using defaults.", e);
            Settings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .context("Failed to create settings directory")?;
    }
    let data = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, data)
        .with_context(|| format!("Failed to write settings to {}", path.display()))?;
    tracing::debug!("Settings saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(load_settings(&path), Settings::default());

        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.speech.rate = 1.25;
        settings.speech.voice_id = Some("de-2".into());
        settings.playback.toggle_debounce_ms = 500;
        save_settings(&path, &settings).unwrap();

        assert_eq!(load_settings(&path), settings);
    }
}
