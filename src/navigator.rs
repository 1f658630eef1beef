//! Background-side orchestration: runtime messages, the dictation gate and
//! the listening session.

use log::{debug, info, warn};

use crate::command::{interpret, normalize, Action};
use crate::config::NavigatorConfig;
use crate::dispatch::{BrowserHost, DispatchError, Dispatcher};
use crate::protocol::{Broadcaster, Inbound, Outbound, PageOp, Reply, Status, StatusSnapshot};
use crate::session::{SessionManager, SurfaceHandle, SurfaceHost};
use crate::settings::{Settings, SettingsPatch, SettingsStore};

/// Everything the navigator needs from the browser.
pub trait Host: BrowserHost + SurfaceHost + SettingsStore + Broadcaster {}

impl<T: BrowserHost + SurfaceHost + SettingsStore + Broadcaster> Host for T {}

/// What became of one transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceOutcome {
    /// Blank after normalization.
    Ignored,
    /// Typed into the focused field.
    Dictated,
    Executed(Action),
    /// Interpreted but not carried out; never fatal.
    Skipped { action: Action, reason: DispatchError },
}

pub struct Navigator<H> {
    host: H,
    config: NavigatorConfig,
    session: SessionManager,
}

impl<H: Host> Navigator<H> {
    pub fn new(host: H, config: NavigatorConfig) -> Self {
        let session = SessionManager::new(config.surface, config.listener_url.clone());
        Navigator { host, config, session }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub async fn handle_message(&self, message: Inbound) -> Option<Reply> {
        match message {
            Inbound::ToggleVoice { enabled } => {
                self.set_enabled(enabled).await;
                Some(Reply::Ack { ok: true })
            }
            Inbound::ToggleDictation { enabled } => {
                self.set_dictation(enabled).await;
                Some(Reply::Ack { ok: true })
            }
            Inbound::RequestStatus => Some(Reply::Status(self.status_snapshot().await)),
            Inbound::VoiceTranscript { transcript } => {
                self.save(SettingsPatch {
                    transcript: Some(transcript.clone()),
                    ..Default::default()
                })
                .await;
                self.host.broadcast(&Outbound::UiTranscript { transcript });
                None
            }
            Inbound::VoiceStatus { status } => {
                let status = status.unwrap_or(Status::Stopped);
                if let Status::Error(reason) = &status {
                    warn!("Speech capture reported an error: {}", reason);
                }
                self.save(SettingsPatch {
                    status: Some(status.clone()),
                    ..Default::default()
                })
                .await;
                self.host.broadcast(&Outbound::UiStatus { status });
                None
            }
            Inbound::VoiceCommand { command } => {
                self.handle_voice_input(&command).await;
                None
            }
        }
    }

    /// Routes one finalized transcript: dictation first when it is on,
    /// command interpretation otherwise or when nothing took the text.
    pub async fn handle_voice_input(&self, raw: &str) -> VoiceOutcome {
        if normalize(raw).is_empty() {
            return VoiceOutcome::Ignored;
        }
        if self.dictation_active().await && self.try_dictation(raw).await {
            debug!("Dictated {:?}", raw);
            return VoiceOutcome::Dictated;
        }

        let action = interpret(raw);
        if let Action::SetDictation(enabled) = action {
            if self.config.dictation {
                self.set_dictation(enabled).await;
                self.host.broadcast(&Outbound::UiStatus {
                    status: Status::Dictation(enabled),
                });
                return VoiceOutcome::Executed(action);
            }
            return self.unrecognized(raw, action);
        }

        let dispatcher = Dispatcher::new(&self.host, &self.config);
        match dispatcher.dispatch(&action).await {
            Ok(()) => {
                info!("Executed {:?}", action);
                VoiceOutcome::Executed(action)
            }
            Err(DispatchError::Unrecognized(_)) => self.unrecognized(raw, action),
            Err(reason) => {
                debug!("Skipped {:?}: {}", action, reason);
                VoiceOutcome::Skipped { action, reason }
            }
        }
    }

    pub async fn set_enabled(&self, enabled: bool) {
        let status = if enabled { Status::Listening } else { Status::Stopped };
        self.save(SettingsPatch {
            enabled: Some(enabled),
            status: Some(status),
            ..Default::default()
        })
        .await;

        if enabled {
            self.start_listening().await;
        } else {
            self.host.broadcast(&Outbound::VoiceStop);
            self.session.teardown(&self.host).await;
        }
    }

    pub async fn set_dictation(&self, enabled: bool) {
        if !self.config.dictation {
            debug!("Dictation is not offered; ignoring toggle");
            return;
        }
        self.save(SettingsPatch {
            dictation: Some(enabled),
            ..Default::default()
        })
        .await;
    }

    pub async fn status_snapshot(&self) -> StatusSnapshot {
        let settings = self.settings().await;
        StatusSnapshot {
            enabled: settings.enabled,
            dictation: self.config.dictation && settings.dictation_on(),
            transcript: settings.transcript.unwrap_or_default(),
            status: settings.status.unwrap_or(Status::Stopped),
        }
    }

    /// First install or update: resume listening if it was on and seed the
    /// dictation flag.
    pub async fn on_installed(&self) {
        let settings = self.settings().await;
        if settings.enabled {
            self.start_listening().await;
        }
        if settings.dictation.is_none() {
            self.save(SettingsPatch {
                dictation: Some(false),
                ..Default::default()
            })
            .await;
        }
    }

    pub async fn on_startup(&self) {
        if self.settings().await.enabled {
            self.start_listening().await;
        }
    }

    /// Reconciles the session after a tab or window closed. Losing the
    /// capture surface while enabled brings up a new one.
    pub async fn on_surface_removed(&self, removed: SurfaceHandle) {
        if !self.session.on_removed(removed) {
            return;
        }
        info!("Capture surface {:?} was closed", removed);
        if self.settings().await.enabled {
            self.start_listening().await;
        }
    }

    async fn start_listening(&self) {
        match self.session.ensure(&self.host).await {
            Ok(_) => self.host.broadcast(&Outbound::VoiceStart),
            Err(e) => warn!("Could not open capture surface: {}", e),
        }
    }

    async fn dictation_active(&self) -> bool {
        self.config.dictation && self.settings().await.dictation_on()
    }

    async fn try_dictation(&self, raw: &str) -> bool {
        let dispatcher = Dispatcher::new(&self.host, &self.config);
        let op = PageOp::InsertText { text: raw.to_string() };
        match dispatcher.run_in_active_tab(&op).await {
            Ok(inserted) => inserted,
            Err(e) => {
                debug!("Dictation unavailable: {}", e);
                false
            }
        }
    }

    fn unrecognized(&self, raw: &str, action: Action) -> VoiceOutcome {
        info!("Unrecognized command: {:?}", raw);
        self.host.broadcast(&Outbound::UiStatus {
            status: Status::Unknown(raw.to_string()),
        });
        VoiceOutcome::Skipped {
            action,
            reason: DispatchError::Unrecognized(raw.to_string()),
        }
    }

    async fn settings(&self) -> Settings {
        self.host.load().await.unwrap_or_else(|e| {
            warn!("Failed to load settings: {}", e);
            Settings::default()
        })
    }

    async fn save(&self, patch: SettingsPatch) {
        if let Err(e) = self.host.store(patch).await {
            warn!("Failed to store settings: {}", e);
        }
    }
}
