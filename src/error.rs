use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures raised by the browser host: extension APIs, message delivery and
/// payload decoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("ApiError: {call} failed: {message}")]
    Api { call: &'static str, message: String },
    #[error("PageUnreachable: tab {tab_id} did not answer: {message}")]
    PageUnreachable { tab_id: i32, message: String },
    #[error("DecodeError: {0}")]
    Decode(String),
    #[error("JsError: {0}")]
    Js(String),
}

impl From<JsValue> for HostError {
    fn from(value: JsValue) -> Self {
        HostError::Js(js_message(&value))
    }
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::Decode(err.to_string())
    }
}

/// Failures inside the page context while running a page operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PageError {
    #[error("JsError: {message}")]
    JsError { message: String },
    #[error("ElementTypeError: element is not of expected type '{expected_type}'")]
    ElementTypeError { expected_type: String },
    #[error("InvalidRequest: {0}")]
    InvalidRequest(String),
}

impl From<JsValue> for PageError {
    fn from(value: JsValue) -> Self {
        PageError::JsError {
            message: js_message(&value),
        }
    }
}

impl From<PageError> for JsValue {
    fn from(err: PageError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Best-effort text of a thrown JS value: plain strings as-is, `Error`
/// objects through their `message`.
pub(crate) fn js_message(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| "Unknown JsValue error".to_string())
}
