//! Runtime messages exchanged with the capture surface, the popup and the
//! content scripts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::{Direction, Edge, ScrollAmount};

/// Listening status as shown to the user. Travels as its text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Listening,
    Stopped,
    Unsupported,
    Error(String),
    Unknown(String),
    Dictation(bool),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Listening => write!(f, "listening"),
            Status::Stopped => write!(f, "stopped"),
            Status::Unsupported => write!(f, "unsupported"),
            Status::Error(reason) => write!(f, "error:{}", reason),
            Status::Unknown(text) => write!(f, "unknown:{}", text),
            Status::Dictation(true) => write!(f, "Dictation on"),
            Status::Dictation(false) => write!(f, "Dictation off"),
        }
    }
}

impl From<&str> for Status {
    /// Anything unrecognized reads as `stopped`, matching how the display
    /// surface treats it.
    fn from(text: &str) -> Self {
        if let Some(reason) = text.strip_prefix("error:") {
            return Status::Error(reason.to_string());
        }
        if let Some(unknown) = text.strip_prefix("unknown:") {
            return Status::Unknown(unknown.to_string());
        }
        match text {
            "listening" => Status::Listening,
            "unsupported" => Status::Unsupported,
            "Dictation on" => Status::Dictation(true),
            "Dictation off" => Status::Dictation(false),
            _ => Status::Stopped,
        }
    }
}

impl From<String> for Status {
    fn from(text: String) -> Self {
        Status::from(text.as_str())
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.to_string()
    }
}

/// Messages the navigator accepts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Inbound {
    ToggleVoice {
        #[serde(default)]
        enabled: bool,
    },
    ToggleDictation {
        #[serde(default)]
        enabled: bool,
    },
    RequestStatus,
    VoiceTranscript {
        #[serde(default)]
        transcript: String,
    },
    VoiceStatus {
        #[serde(default)]
        status: Option<Status>,
    },
    VoiceCommand {
        #[serde(default)]
        command: String,
    },
}

/// Messages the navigator broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Outbound {
    VoiceStart,
    VoiceStop,
    UiStatus { status: Status },
    UiTranscript { transcript: String },
}

/// Fire-and-forget delivery of outbound messages to whoever listens.
pub trait Broadcaster {
    fn broadcast(&self, message: &Outbound);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub enabled: bool,
    pub dictation: bool,
    pub transcript: String,
    pub status: Status,
}

/// Response to an inbound message that expects one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Ack { ok: bool },
    Status(StatusSnapshot),
}

/// An operation executed inside a page by the content script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PageOp {
    ScrollToEdge { edge: Edge },
    ScrollBy {
        direction: Direction,
        amount: Option<ScrollAmount>,
    },
    ShowLinkHints,
    HideLinkHints,
    ClickLink { index: u32 },
    InsertText { text: String },
}
