use std::rc::Rc;

use js_sys::Promise;
use log::{debug, info, LevelFilter};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::chrome::ChromeHost;
use crate::config::NavigatorConfig;
use crate::protocol::Inbound;
use crate::session::{SurfaceHandle, SurfaceKind};

pub mod chrome;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod hints;
pub mod insert;
mod logging;
pub mod navigator;
pub mod page;
pub mod protocol;
pub mod session;
pub mod settings;

pub use navigator::Navigator;

// Expose the background navigator to JavaScript
#[wasm_bindgen]
pub struct VoiceNavigator {
    inner: Rc<Navigator<ChromeHost>>,
}

#[wasm_bindgen]
impl VoiceNavigator {
    /// `config` is an optional JSON object; missing fields take defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<VoiceNavigator, JsValue> {
        let config = match config {
            Some(json) => NavigatorConfig::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => NavigatorConfig::default(),
        };
        logging::init(config.level_filter().unwrap_or(LevelFilter::Info));
        info!("Voice navigator ready ({:?} surface)", config.surface);
        Ok(VoiceNavigator {
            inner: Rc::new(Navigator::new(ChromeHost::new(), config)),
        })
    }

    /// Resolves to the reply object, or `undefined` for messages that take
    /// none (including ones the navigator does not handle).
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let message: Inbound = match chrome::from_js(&message) {
                Ok(message) => message,
                Err(e) => {
                    debug!("Ignoring message: {}", e);
                    return Ok(JsValue::UNDEFINED);
                }
            };
            match inner.handle_message(message).await {
                Some(reply) => chrome::to_js(&reply).map_err(|e| JsValue::from_str(&e.to_string())),
                None => Ok(JsValue::UNDEFINED),
            }
        })
    }

    #[wasm_bindgen(js_name = onInstalled)]
    pub fn on_installed(&self) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            inner.on_installed().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = onStartup)]
    pub fn on_startup(&self) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            inner.on_startup().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = onTabRemoved)]
    pub fn on_tab_removed(&self, tab_id: i32) -> Promise {
        self.surface_removed(SurfaceHandle { kind: SurfaceKind::Tab, id: tab_id })
    }

    #[wasm_bindgen(js_name = onWindowRemoved)]
    pub fn on_window_removed(&self, window_id: i32) -> Promise {
        self.surface_removed(SurfaceHandle { kind: SurfaceKind::Window, id: window_id })
    }
}

impl VoiceNavigator {
    fn surface_removed(&self, handle: SurfaceHandle) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            inner.on_surface_removed(handle).await;
            Ok(JsValue::UNDEFINED)
        })
    }
}

/// Content-script entry: runs one JSON-encoded page operation and reports
/// whether the page had something to act on.
#[wasm_bindgen(js_name = runPageOp)]
pub fn run_page_op(op_json: &str) -> Result<bool, JsValue> {
    Ok(page::run_json(op_json)?)
}

// Initialize WASM module and install the console logger
#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    #[cfg(debug_assertions)]
    console_error_panic_hook::set_once(); // Better panic messages in browser
    logging::init(LevelFilter::Info);
    debug!("voice-navigator module loaded");
    Ok(())
}
