//! `chrome.*` extension APIs behind the host traits.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::dispatch::{BrowserHost, TabId, TabInfo};
use crate::error::{js_message, HostError};
use crate::protocol::{Broadcaster, Outbound, PageOp};
use crate::session::{SurfaceHandle, SurfaceHost, SurfaceKind};
use crate::settings::{Settings, SettingsPatch, SettingsStore, STORAGE_KEYS};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    async fn tabs_query(query_info: JsValue) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = update)]
    async fn tabs_update(tab_id: i32, properties: JsValue) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = create)]
    async fn tabs_create(properties: JsValue) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = remove)]
    async fn tabs_remove(tab_id: i32) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = reload)]
    async fn tabs_reload(tab_id: i32) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    async fn tabs_send_message(tab_id: i32, message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "windows"], js_name = create)]
    async fn windows_create(properties: JsValue) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "windows"], js_name = remove)]
    async fn windows_remove(window_id: i32) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "windows"], js_name = getAll)]
    async fn windows_get_all(query_options: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = sendMessage)]
    async fn runtime_send_message(message: JsValue) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = getURL)]
    fn runtime_get_url(path: &str) -> String;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    async fn storage_get(keys: JsValue) -> Result<JsValue, JsValue>;
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    async fn storage_set(items: JsValue) -> Result<JsValue, JsValue>;
}

#[derive(Debug, Deserialize)]
struct WindowInfo {
    id: i32,
    #[serde(default)]
    tabs: Vec<TabInfo>,
}

/// Request shape the content script answers with `runPageOp`.
#[derive(Serialize)]
struct PageRequest {
    #[serde(rename = "type")]
    kind: &'static str,
    op: String,
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, HostError> {
    let text = serde_json::to_string(value)?;
    Ok(js_sys::JSON::parse(&text)?)
}

pub(crate) fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T, HostError> {
    let text = js_sys::JSON::stringify(value)?
        .as_string()
        .unwrap_or_else(|| "null".to_string());
    Ok(serde_json::from_str(&text)?)
}

fn api_error(call: &'static str) -> impl FnOnce(JsValue) -> HostError {
    move |value| HostError::Api {
        call,
        message: js_message(&value),
    }
}

/// The live browser. Stateless; every call goes to the extension APIs.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeHost;

impl ChromeHost {
    pub fn new() -> Self {
        ChromeHost
    }

    async fn query_tabs(&self, query_info: serde_json::Value) -> Result<Vec<TabInfo>, HostError> {
        let tabs = tabs_query(to_js(&query_info)?).await.map_err(api_error("tabs.query"))?;
        from_js(&tabs)
    }
}

impl BrowserHost for ChromeHost {
    async fn current_window_tabs(&self) -> Result<Vec<TabInfo>, HostError> {
        self.query_tabs(json!({ "currentWindow": true })).await
    }

    async fn active_tab(&self) -> Result<Option<TabInfo>, HostError> {
        let tabs = self.query_tabs(json!({ "active": true, "currentWindow": true })).await?;
        Ok(tabs.into_iter().next())
    }

    async fn activate_tab(&self, id: TabId) -> Result<(), HostError> {
        tabs_update(id, to_js(&json!({ "active": true }))?)
            .await
            .map_err(api_error("tabs.update"))?;
        Ok(())
    }

    async fn close_tab(&self, id: TabId) -> Result<(), HostError> {
        tabs_remove(id).await.map_err(api_error("tabs.remove"))?;
        Ok(())
    }

    async fn reload_tab(&self, id: TabId) -> Result<(), HostError> {
        tabs_reload(id).await.map_err(api_error("tabs.reload"))?;
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> Result<TabId, HostError> {
        let tab = tabs_create(to_js(&json!({ "url": url }))?)
            .await
            .map_err(api_error("tabs.create"))?;
        Ok(from_js::<TabInfo>(&tab)?.id)
    }

    async fn navigate_tab(&self, id: TabId, url: &str) -> Result<(), HostError> {
        tabs_update(id, to_js(&json!({ "url": url }))?)
            .await
            .map_err(api_error("tabs.update"))?;
        Ok(())
    }

    async fn run_in_tab(&self, id: TabId, op: &PageOp) -> Result<bool, HostError> {
        let request = PageRequest {
            kind: "page-op",
            op: serde_json::to_string(op)?,
        };
        let response = tabs_send_message(id, to_js(&request)?)
            .await
            .map_err(|e| HostError::PageUnreachable {
                tab_id: id,
                message: js_message(&e),
            })?;
        Ok(response.as_bool().unwrap_or(false))
    }
}

impl SurfaceHost for ChromeHost {
    async fn find_surface(&self, kind: SurfaceKind, url: &str) -> Result<Option<SurfaceHandle>, HostError> {
        let url = runtime_get_url(url);
        let id = match kind {
            SurfaceKind::Tab => self
                .query_tabs(json!({ "url": url }))
                .await?
                .into_iter()
                .next()
                .map(|tab| tab.id),
            SurfaceKind::Window => {
                let windows = windows_get_all(to_js(&json!({ "populate": true }))?)
                    .await
                    .map_err(api_error("windows.getAll"))?;
                from_js::<Vec<WindowInfo>>(&windows)?
                    .into_iter()
                    .find(|window| window.tabs.iter().any(|tab| tab.url.as_deref() == Some(url.as_str())))
                    .map(|window| window.id)
            }
        };
        Ok(id.map(|id| SurfaceHandle { kind, id }))
    }

    async fn open_surface(&self, kind: SurfaceKind, url: &str) -> Result<SurfaceHandle, HostError> {
        let url = runtime_get_url(url);
        let id = match kind {
            SurfaceKind::Tab => {
                let properties = json!({ "url": url, "pinned": true, "active": false });
                let tab = tabs_create(to_js(&properties)?).await.map_err(api_error("tabs.create"))?;
                from_js::<TabInfo>(&tab)?.id
            }
            SurfaceKind::Window => {
                let properties = json!({ "url": url, "type": "popup", "state": "minimized" });
                let window = windows_create(to_js(&properties)?)
                    .await
                    .map_err(api_error("windows.create"))?;
                from_js::<WindowInfo>(&window)?.id
            }
        };
        Ok(SurfaceHandle { kind, id })
    }

    async fn close_surface(&self, handle: SurfaceHandle) -> Result<(), HostError> {
        match handle.kind {
            SurfaceKind::Tab => tabs_remove(handle.id).await.map_err(api_error("tabs.remove"))?,
            SurfaceKind::Window => windows_remove(handle.id).await.map_err(api_error("windows.remove"))?,
        };
        Ok(())
    }
}

impl SettingsStore for ChromeHost {
    async fn load(&self) -> Result<Settings, HostError> {
        let items = storage_get(to_js(&STORAGE_KEYS)?)
            .await
            .map_err(api_error("storage.local.get"))?;
        from_js(&items)
    }

    async fn store(&self, patch: SettingsPatch) -> Result<(), HostError> {
        storage_set(to_js(&patch)?).await.map_err(api_error("storage.local.set"))?;
        Ok(())
    }
}

impl Broadcaster for ChromeHost {
    fn broadcast(&self, message: &Outbound) {
        let message = match to_js(message) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("Failed to encode {:?}: {}", message, e);
                return;
            }
        };
        spawn_local(async move {
            // Rejects when no extension page is listening.
            if let Err(e) = runtime_send_message(message).await {
                log::debug!("Broadcast not delivered: {}", js_message(&e));
            }
        });
    }
}
