use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

use crate::session::SurfaceKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid navigator config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown log level '{0}'")]
    LogLevel(String),
}

/// Navigator settings supplied by the extension when it constructs the
/// navigator. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Where speech capture runs: a pinned tab or a minimized popup window.
    pub surface: SurfaceKind,
    /// Extension page hosting the recognizer.
    pub listener_url: String,
    /// Whether the dictation capability is offered at all.
    pub dictation: bool,
    /// Prefix for web searches; the percent-encoded query is appended.
    pub search_url: String,
    pub new_tab_url: String,
    pub log_level: String,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        NavigatorConfig {
            surface: SurfaceKind::Tab,
            listener_url: "listener.html".to_string(),
            dictation: true,
            search_url: "https://www.google.com/search?q=".to_string(),
            new_tab_url: "chrome://newtab".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl NavigatorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: NavigatorConfig = serde_json::from_str(json)?;
        config.level_filter()?;
        Ok(config)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
