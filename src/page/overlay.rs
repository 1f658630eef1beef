//! Renders link hints into the page and keeps the per-page index.

use std::cell::RefCell;

use log::debug;
use web_sys::{Document, Element};

use super::dom;
use crate::error::PageError;
use crate::hints::{Marker, OverlayState};

const OVERLAY_ID: &str = "voice-nav-overlay";
const OVERLAY_STYLE: &str = "position: fixed; top: 0; left: 0; width: 100%; height: 100%; \
     pointer-events: none; z-index: 2147483647;";
const MARKER_STYLE: &str = "position: absolute; padding: 2px 6px; background: #f97316; \
     color: #140b02; border-radius: 999px; font-size: 12px; font-weight: 700; \
     box-shadow: 0 2px 6px rgba(0,0,0,0.35);";

#[derive(Default)]
struct PageOverlay {
    state: OverlayState<Element>,
    container: Option<Element>,
}

impl PageOverlay {
    fn remove_markers(&mut self) {
        if let Some(container) = self.container.take() {
            container.remove();
        }
    }

    fn reset(&mut self) {
        self.remove_markers();
        self.state.clear();
    }
}

thread_local! {
    static OVERLAY: RefCell<PageOverlay> = RefCell::new(PageOverlay::default());
}

/// Numbers the visible links and draws a marker next to each. Any previous
/// overlay is replaced. Returns the number of hinted links.
pub fn show_link_hints() -> Result<usize, PageError> {
    let (window, document) = dom::get_window_document()?;
    let viewport = dom::viewport(&window)?;
    let links = dom::all_links(&document)
        .into_iter()
        .map(|link| {
            let rect = dom::bounding_rect(&link);
            (link, rect)
        });

    OVERLAY.with(|overlay| {
        let mut overlay = overlay.borrow_mut();
        overlay.reset();
        let markers = overlay.state.rebuild(links, &viewport);
        match render(&document, &markers) {
            Ok(container) => overlay.container = Some(container),
            Err(e) => {
                overlay.state.clear();
                return Err(e);
            }
        }
        debug!("Showing {} link hints", markers.len());
        Ok(markers.len())
    })
}

/// Removes the markers and forgets the index. Safe to call repeatedly.
pub fn hide_link_hints() {
    OVERLAY.with(|overlay| overlay.borrow_mut().reset());
}

/// Activates the link numbered `index`, falling back to the n-th link in the
/// document when no hint carries that number. Hints are dismissed after a
/// successful activation.
pub fn click_link(index: u32) -> Result<bool, PageError> {
    let (_window, document) = dom::get_window_document()?;
    let target = OVERLAY.with(|overlay| overlay.borrow().state.resolve(index, || dom::all_links(&document)));
    let Some(target) = target else {
        debug!("No link for hint {}", index);
        return Ok(false);
    };

    dom::focus_and_click(&target)?;
    hide_link_hints();
    Ok(true)
}

pub fn is_visible() -> bool {
    OVERLAY.with(|overlay| overlay.borrow().state.is_visible())
}

pub fn hint_count() -> usize {
    OVERLAY.with(|overlay| overlay.borrow().state.entries().len())
}

fn render(document: &Document, markers: &[Marker]) -> Result<Element, PageError> {
    let container = document.create_element("div")?;
    container.set_id(OVERLAY_ID);
    container.set_attribute("style", OVERLAY_STYLE)?;

    for marker in markers {
        let badge = document.create_element("div")?;
        badge.set_text_content(Some(&marker.index.to_string()));
        badge.set_attribute(
            "style",
            &format!("{} top: {}px; left: {}px;", MARKER_STYLE, marker.top, marker.left),
        )?;
        container.append_child(&badge)?;
    }

    let body = document.body().ok_or_else(|| PageError::JsError { message: "Document has no body".to_string() })?;
    body.append_child(&container)?;
    Ok(container)
}
