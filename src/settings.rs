//! Persisted navigator settings.

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::protocol::Status;

/// Every key the navigator keeps in extension storage.
pub const STORAGE_KEYS: [&str; 4] = [
    "voiceNavigatorEnabled",
    "voiceNavigatorDictation",
    "voiceNavigatorTranscript",
    "voiceNavigatorStatus",
];

/// Settings as read back from extension storage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(rename = "voiceNavigatorEnabled", default)]
    pub enabled: bool,
    /// `None` until the extension is first installed.
    #[serde(rename = "voiceNavigatorDictation", default)]
    pub dictation: Option<bool>,
    #[serde(rename = "voiceNavigatorTranscript", default)]
    pub transcript: Option<String>,
    #[serde(rename = "voiceNavigatorStatus", default)]
    pub status: Option<Status>,
}

impl Settings {
    pub fn dictation_on(&self) -> bool {
        self.dictation.unwrap_or(false)
    }
}

/// A partial update; only the fields that are set get written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsPatch {
    #[serde(rename = "voiceNavigatorEnabled", skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "voiceNavigatorDictation", skip_serializing_if = "Option::is_none")]
    pub dictation: Option<bool>,
    #[serde(rename = "voiceNavigatorTranscript", skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(rename = "voiceNavigatorStatus", skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl SettingsPatch {
    /// Applies the patch to an in-memory copy.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(dictation) = self.dictation {
            settings.dictation = Some(dictation);
        }
        if let Some(transcript) = &self.transcript {
            settings.transcript = Some(transcript.clone());
        }
        if let Some(status) = &self.status {
            settings.status = Some(status.clone());
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    async fn load(&self) -> Result<Settings, HostError>;
    async fn store(&self, patch: SettingsPatch) -> Result<(), HostError>;
}
