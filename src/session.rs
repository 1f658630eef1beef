//! Capture surface ownership.
//!
//! Speech recognition runs in a hidden extension page: a pinned background
//! tab or a minimized popup window, chosen by config. The session holds at
//! most one such surface and forgets it whenever the browser reports it
//! closed.

use std::cell::Cell;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::HostError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    Tab,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceHandle {
    pub kind: SurfaceKind,
    pub id: i32,
}

/// Browser operations needed to manage a capture surface.
#[allow(async_fn_in_trait)]
pub trait SurfaceHost {
    /// An already open surface of `kind` showing `url`, if any.
    async fn find_surface(&self, kind: SurfaceKind, url: &str) -> Result<Option<SurfaceHandle>, HostError>;
    async fn open_surface(&self, kind: SurfaceKind, url: &str) -> Result<SurfaceHandle, HostError>;
    async fn close_surface(&self, handle: SurfaceHandle) -> Result<(), HostError>;
}

pub struct SessionManager {
    kind: SurfaceKind,
    url: String,
    surface: Cell<Option<SurfaceHandle>>,
}

impl SessionManager {
    pub fn new(kind: SurfaceKind, url: impl Into<String>) -> Self {
        SessionManager {
            kind,
            url: url.into(),
            surface: Cell::new(None),
        }
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface.get()
    }

    /// Makes sure a capture surface exists: keeps the one held, adopts an
    /// open one at the listener URL, or opens a new one.
    pub async fn ensure<H: SurfaceHost>(&self, host: &H) -> Result<SurfaceHandle, HostError> {
        if let Some(handle) = self.surface.get() {
            return Ok(handle);
        }

        if let Some(existing) = host.find_surface(self.kind, &self.url).await? {
            debug!("Adopting capture surface {:?}", existing);
            return Ok(self.attach(existing));
        }

        let opened = host.open_surface(self.kind, &self.url).await?;
        // Another caller may have attached a surface while we were waiting.
        if let Some(held) = self.surface.get() {
            if held != opened {
                warn!("Closing duplicate capture surface {:?}", opened);
                if let Err(e) = host.close_surface(opened).await {
                    warn!("Failed to close duplicate capture surface: {}", e);
                }
            }
            return Ok(held);
        }
        info!("Opened capture surface {:?}", opened);
        Ok(self.attach(opened))
    }

    /// Closes the session's surface (or a stray one at the listener URL).
    /// Closing a surface that is already gone is not an error.
    pub async fn teardown<H: SurfaceHost>(&self, host: &H) {
        let target = match self.surface.take() {
            Some(handle) => Some(handle),
            None => host.find_surface(self.kind, &self.url).await.unwrap_or_else(|e| {
                warn!("Capture surface lookup failed: {}", e);
                None
            }),
        };
        if let Some(handle) = target {
            if let Err(e) = host.close_surface(handle).await {
                debug!("Capture surface {:?} already closed: {}", handle, e);
            }
        }
        self.surface.set(None);
    }

    /// Called for every tab/window removal. Returns true when the removed
    /// surface was the session's own, which is then forgotten.
    pub fn on_removed(&self, removed: SurfaceHandle) -> bool {
        if self.surface.get() == Some(removed) {
            self.surface.set(None);
            return true;
        }
        false
    }

    fn attach(&self, handle: SurfaceHandle) -> SurfaceHandle {
        self.surface.set(Some(handle));
        handle
    }
}
