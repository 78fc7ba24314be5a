use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Commands arriving from the popup/background over the extension message
/// channel. The JSON shape is `{"type": "...", "payload": ...}` with the
/// payload omitted for plain toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineMessage {
    ToggleGlobalMode,
    ToggleTts,
    ToggleStt,
    ToggleContrast,
    SetApiKeys(HashMap<String, String>),
    SetActiveProfile(Option<String>),
    /// UI navigation only; the engine ignores it.
    OpenOptions,
}

/// Reads the engine issues towards the background's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineQuery {
    GetApiKeys,
    GetActiveProfile,
}

/// Replies to [`EngineQuery`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineReply {
    ApiKeys(HashMap<String, String>),
    ActiveProfile(Option<String>),
}

impl EngineMessage {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
