use wasm_bindgen::JsCast;
use log::warn;
use web_sys::{Document, Element, HtmlElement, NodeList, Window};

use crate::error::PageError;
use crate::hints::{Rect, Viewport};

/// Every hyperlink on the page, in document order.
pub(crate) const LINK_SELECTOR: &str = "a[href]";

// Helper function to get window and document
pub(crate) fn get_window_document() -> Result<(Window, Document), PageError> {
    let window = web_sys::window().ok_or_else(|| PageError::JsError { message: "Failed to get window object".to_string() })?;
    let document = window.document().ok_or_else(|| PageError::JsError { message: "Failed to get document object".to_string() })?;
    Ok((window, document))
}

pub(crate) fn get_all_elements(document: &Document, css_selector: &str) -> Result<Vec<Element>, PageError> {
    let node_list: NodeList = document.query_selector_all(css_selector).map_err(|e| PageError::InvalidRequest(format!(
        "Invalid selector '{}': {}",
        css_selector,
        e.as_string().unwrap_or_else(|| "Unknown querySelectorAll error".to_string())
    )))?;

    let mut elements = Vec::new();
    for i in 0..node_list.length() {
        if let Some(node) = node_list.item(i) {
            if let Some(element) = node.dyn_ref::<Element>() {
                elements.push(element.clone());
            }
        }
    }
    Ok(elements)
}

pub(crate) fn all_links(document: &Document) -> Vec<Element> {
    get_all_elements(document, LINK_SELECTOR).unwrap_or_else(|e| {
        warn!("Link enumeration failed: {}", e);
        Vec::new()
    })
}

pub(crate) fn bounding_rect(element: &Element) -> Rect {
    let rect = element.get_bounding_client_rect();
    Rect {
        top: rect.top(),
        left: rect.left(),
        width: rect.width(),
        height: rect.height(),
    }
}

pub(crate) fn viewport(window: &Window) -> Result<Viewport, PageError> {
    let width = window.inner_width()?.as_f64().unwrap_or(0.0);
    let height = window.inner_height()?.as_f64().unwrap_or(0.0);
    Ok(Viewport { width, height })
}

/// Focuses then clicks, the way a user activating the link would.
pub(crate) fn focus_and_click(element: &Element) -> Result<(), PageError> {
    let html_element = element
        .dyn_ref::<HtmlElement>()
        .ok_or_else(|| PageError::ElementTypeError { expected_type: "HtmlElement".to_string() })?;
    html_element.focus()?;
    html_element.click();
    Ok(())
}
