use log::warn;
use serde::Deserialize;
use std::path::PathBuf;

/// Receiver settings. Defaults mirror the original link: `/dev/ttyS0` at
/// 9600 baud, ISO-8859-1 text, no timestamps.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: String,
    pub baud_rate: u32,
    pub encoding: String,
    pub show_timestamp: bool,
    pub show_hex: bool,
    pub max_entries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: "/dev/ttyS0".to_string(),
            baud_rate: 9_600,
            encoding: "ISO-8859-1".to_string(),
            show_timestamp: false,
            show_hex: false,
            max_entries: 10_000,
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sertail").join("settings.json"))
}

/// Load settings from the user config dir. A missing file means defaults;
/// a malformed one is ignored with a warning.
pub fn load() -> Settings {
    let Some(path) = settings_path() else {
        return Settings::default();
    };
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(_) => return Settings::default(),
    };
    match serde_json::from_str(&text) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("ignoring malformed settings file {}: {e}", path.display());
            Settings::default()
        }
    }
}
