//! Executes interpreted actions against the browser.
//!
//! Page-scoped actions are shipped to the active tab as [`PageOp`]s; tab
//! management and navigation go straight to the [`BrowserHost`].

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::command::Action;
use crate::config::NavigatorConfig;
use crate::error::HostError;
use crate::protocol::PageOp;

pub type TabId = i32;

static DOMAIN_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.[a-z]{2,}").expect("valid domain pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub url: Option<String>,
}

/// Tab-level browser operations, scoped to the current window.
#[allow(async_fn_in_trait)]
pub trait BrowserHost {
    /// Tabs of the current window in strip order.
    async fn current_window_tabs(&self) -> Result<Vec<TabInfo>, HostError>;

    async fn active_tab(&self) -> Result<Option<TabInfo>, HostError> {
        Ok(self.current_window_tabs().await?.into_iter().find(|tab| tab.active))
    }

    async fn activate_tab(&self, id: TabId) -> Result<(), HostError>;
    async fn close_tab(&self, id: TabId) -> Result<(), HostError>;
    async fn reload_tab(&self, id: TabId) -> Result<(), HostError>;
    async fn open_tab(&self, url: &str) -> Result<TabId, HostError>;
    async fn navigate_tab(&self, id: TabId, url: &str) -> Result<(), HostError>;

    /// Runs `op` in the page shown by tab `id`. `Ok(false)` means the page
    /// found nothing to act on.
    async fn run_in_tab(&self, id: TabId, op: &PageOp) -> Result<bool, HostError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("no active tab")]
    NoActiveTab,
    #[error("page had no target for {0:?}")]
    NoTarget(PageOp),
    #[error("tab index {index} out of range for {count} tabs")]
    TabOutOfRange { index: i64, count: usize },
    #[error("unrecognized command: {0}")]
    Unrecognized(String),
    #[error("empty navigation query")]
    EmptyQuery,
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Where a spoken "open ..." leads: a domain-looking query becomes an https
/// URL, anything else a web search for the literal text.
pub fn resolve_destination(query: &str, search_url: &str) -> Option<String> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    let without_scheme = query
        .strip_prefix("https://")
        .or_else(|| query.strip_prefix("http://"))
        .unwrap_or(query);
    if DOMAIN_SUFFIX_RE.is_match(without_scheme) {
        Some(format!("https://{}", without_scheme))
    } else {
        Some(format!("{}{}", search_url, encode_query(query)))
    }
}

/// Percent-encodes like `encodeURIComponent`, which leaves `!*'()` alone.
fn encode_query(query: &str) -> String {
    urlencoding::encode(query)
        .replace("%21", "!")
        .replace("%2A", "*")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}

/// Maps page-scoped actions onto the operation the content script runs.
pub fn page_op_for(action: &Action) -> Option<PageOp> {
    let op = match action {
        Action::ScrollToEdge(edge) => PageOp::ScrollToEdge { edge: *edge },
        Action::ScrollBy { direction, amount } => PageOp::ScrollBy {
            direction: *direction,
            amount: *amount,
        },
        Action::ShowLinkHints => PageOp::ShowLinkHints,
        Action::HideLinkHints => PageOp::HideLinkHints,
        Action::ActivateLink(index) => PageOp::ClickLink { index: *index },
        _ => return None,
    };
    Some(op)
}

pub struct Dispatcher<'a, H> {
    host: &'a H,
    config: &'a NavigatorConfig,
}

impl<'a, H: BrowserHost> Dispatcher<'a, H> {
    pub fn new(host: &'a H, config: &'a NavigatorConfig) -> Self {
        Dispatcher { host, config }
    }

    pub async fn dispatch(&self, action: &Action) -> Result<(), DispatchError> {
        debug!("Dispatching {:?}", action);
        if let Some(op) = page_op_for(action) {
            return match self.run_in_active_tab(&op).await? {
                true => Ok(()),
                false => Err(DispatchError::NoTarget(op)),
            };
        }

        match action {
            Action::SwitchTabRelative(offset) => self.switch_tab_relative(*offset).await,
            Action::SwitchTabAbsolute(index) => self.switch_tab_absolute(*index).await,
            Action::CloseActiveTab => {
                let tab = self.require_active_tab().await?;
                Ok(self.host.close_tab(tab.id).await?)
            }
            Action::ReloadActiveTab => {
                let tab = self.require_active_tab().await?;
                Ok(self.host.reload_tab(tab.id).await?)
            }
            Action::OpenNewTab => {
                self.host.open_tab(&self.config.new_tab_url).await?;
                Ok(())
            }
            Action::Navigate(query) => self.navigate(query).await,
            Action::Unrecognized(raw) => Err(DispatchError::Unrecognized(raw.clone())),
            // Settings live with the navigator; nothing to do in the browser.
            Action::SetDictation(_) => Ok(()),
            // Shipped to the page above.
            Action::ScrollToEdge(_)
            | Action::ScrollBy { .. }
            | Action::ShowLinkHints
            | Action::HideLinkHints
            | Action::ActivateLink(_) => Ok(()),
        }
    }

    /// Runs `op` in the active tab's page.
    pub async fn run_in_active_tab(&self, op: &PageOp) -> Result<bool, DispatchError> {
        let tab = self.require_active_tab().await?;
        Ok(self.host.run_in_tab(tab.id, op).await?)
    }

    async fn require_active_tab(&self) -> Result<TabInfo, DispatchError> {
        self.host.active_tab().await?.ok_or(DispatchError::NoActiveTab)
    }

    async fn switch_tab_relative(&self, offset: i32) -> Result<(), DispatchError> {
        let tabs = self.host.current_window_tabs().await?;
        let current = tabs
            .iter()
            .position(|tab| tab.active)
            .ok_or(DispatchError::NoActiveTab)?;
        let count = tabs.len() as i64;
        let next = (current as i64 + i64::from(offset)).rem_euclid(count) as usize;
        Ok(self.host.activate_tab(tabs[next].id).await?)
    }

    async fn switch_tab_absolute(&self, index: i64) -> Result<(), DispatchError> {
        let tabs = self.host.current_window_tabs().await?;
        let tab = usize::try_from(index)
            .ok()
            .and_then(|position| tabs.get(position))
            .ok_or(DispatchError::TabOutOfRange {
                index,
                count: tabs.len(),
            })?;
        Ok(self.host.activate_tab(tab.id).await?)
    }

    async fn navigate(&self, query: &str) -> Result<(), DispatchError> {
        let url = resolve_destination(query, &self.config.search_url).ok_or(DispatchError::EmptyQuery)?;
        match self.host.active_tab().await? {
            Some(tab) => {
                info!("Navigating tab {} to {}", tab.id, url);
                self.host.navigate_tab(tab.id, &url).await?;
            }
            None => {
                info!("No active tab; opening {}", url);
                self.host.open_tab(&url).await?;
            }
        }
        Ok(())
    }
}
