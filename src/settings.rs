use crate::shortcut::{parse_shortcut, Shortcut};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted extension settings. The engine holds a read-mostly snapshot of
/// this struct and replaces it wholesale on every update from the messaging
/// bridge; it never mutates fields in place.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub global_mode: bool,
    #[serde(default)]
    pub tts_enabled: bool,
    #[serde(default)]
    pub contrast_fix: bool,
    /// Provider name -> credential string.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    #[serde(default)]
    pub has_seen_welcome: bool,
    /// Which credential profile is active, if any.
    #[serde(default)]
    pub active_profile: Option<String>,
    /// Global-mode toggle chord. Invalid strings fall back to the default.
    #[serde(default = "default_global_mode_shortcut")]
    pub global_mode_shortcut: String,
    #[serde(default = "default_tts_shortcut")]
    pub tts_shortcut: String,
    #[serde(default = "default_stop_speech_shortcut")]
    pub stop_speech_shortcut: String,
    /// When enabled the logger initialises at debug level.
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_global_mode_shortcut() -> String {
    "Alt+A".into()
}

fn default_tts_shortcut() -> String {
    "Alt+R".into()
}

fn default_stop_speech_shortcut() -> String {
    "Alt+S".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            global_mode: false,
            tts_enabled: false,
            contrast_fix: false,
            api_keys: HashMap::new(),
            has_seen_welcome: false,
            active_profile: None,
            global_mode_shortcut: default_global_mode_shortcut(),
            tts_shortcut: default_tts_shortcut(),
            stop_speech_shortcut: default_stop_speech_shortcut(),
            debug_logging: false,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Credential for the active profile. With no profile set, a sole
    /// configured key is treated as the implicit profile.
    pub fn active_credential(&self) -> Option<&str> {
        match &self.active_profile {
            Some(profile) => self.api_keys.get(profile).map(String::as_str),
            None if self.api_keys.len() == 1 => {
                self.api_keys.values().next().map(String::as_str)
            }
            None => None,
        }
    }

    fn chord(&self, raw: &str, what: &str) -> Option<Shortcut> {
        match parse_shortcut(raw) {
            Some(s) => Some(s),
            None => {
                tracing::warn!("provided {what} shortcut '{raw}' is invalid; falling back to the default");
                None
            }
        }
    }

    pub fn global_mode_chord(&self) -> Option<Shortcut> {
        self.chord(&self.global_mode_shortcut, "global mode")
            .or_else(|| parse_shortcut(&default_global_mode_shortcut()))
    }

    pub fn tts_chord(&self) -> Option<Shortcut> {
        self.chord(&self.tts_shortcut, "tts")
            .or_else(|| parse_shortcut(&default_tts_shortcut()))
    }

    pub fn stop_speech_chord(&self) -> Option<Shortcut> {
        self.chord(&self.stop_speech_shortcut, "stop speech")
            .or_else(|| parse_shortcut(&default_stop_speech_shortcut()))
    }
}
