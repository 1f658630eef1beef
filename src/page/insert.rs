//! Dictation into the focused editable element.
//!
//! Two kinds of target are supported and told apart by what they can do:
//! value controls that expose a selection range, and rich editable regions
//! driven through the document selection.

use log::debug;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, EventInit, EventTarget, HtmlDocument, HtmlElement, HtmlInputElement, HtmlTextAreaElement, SelectionMode, Window};

use super::dom;
use crate::error::PageError;
use crate::insert::{dictation_text, splice_selection};

const FOCUSED_EDITABLE_SELECTOR: &str =
    "input:focus, textarea:focus, [contenteditable=\"true\"]:focus, [contenteditable=\"\"]:focus";

enum ValueControl {
    Input(HtmlInputElement),
    TextArea(HtmlTextAreaElement),
}

impl ValueControl {
    /// Only controls that report a selection range qualify; inputs such as
    /// checkboxes or number fields have none.
    fn from_element(element: &Element) -> Option<Self> {
        let control = if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            ValueControl::Input(input.clone())
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            ValueControl::TextArea(area.clone())
        } else {
            return None;
        };
        control.selection().map(|_| control)
    }

    fn selection(&self) -> Option<(u32, u32)> {
        let (start, end) = match self {
            ValueControl::Input(input) => (input.selection_start(), input.selection_end()),
            ValueControl::TextArea(area) => (area.selection_start(), area.selection_end()),
        };
        let start = start.ok()??;
        let end = end.ok()?.unwrap_or(start);
        Some((start, end))
    }

    fn value(&self) -> String {
        match self {
            ValueControl::Input(input) => input.value(),
            ValueControl::TextArea(area) => area.value(),
        }
    }

    fn set_value(&self, value: &str) {
        match self {
            ValueControl::Input(input) => input.set_value(value),
            ValueControl::TextArea(area) => area.set_value(value),
        }
    }

    fn set_caret(&self, caret: u32) -> Result<(), JsValue> {
        match self {
            ValueControl::Input(input) => input.set_selection_range(caret, caret),
            ValueControl::TextArea(area) => area.set_selection_range(caret, caret),
        }
    }

    fn set_range_text(&self, text: &str, start: u32, end: u32) -> Result<(), JsValue> {
        match self {
            ValueControl::Input(input) => {
                input.set_range_text_with_start_and_end_and_selection_mode(text, start, end, SelectionMode::End)
            }
            ValueControl::TextArea(area) => {
                area.set_range_text_with_start_and_end_and_mode(text, start, end, "end")
            }
        }
    }

    fn event_target(&self) -> &EventTarget {
        match self {
            ValueControl::Input(input) => input.as_ref(),
            ValueControl::TextArea(area) => area.as_ref(),
        }
    }
}

/// Inserts dictated `text` (plus a trailing space) at the caret of the
/// focused editable element. `Ok(false)` when there is nothing to type into.
pub fn insert_text_at_cursor(text: &str) -> Result<bool, PageError> {
    let Some(text) = dictation_text(text) else {
        return Ok(false);
    };
    let (window, document) = dom::get_window_document()?;
    let Some(target) = focused_editable(&document)? else {
        debug!("No focused editable element");
        return Ok(false);
    };

    if let Some(control) = ValueControl::from_element(&target) {
        insert_into_control(&control, &text)?;
        return Ok(true);
    }
    match target.dyn_ref::<HtmlElement>() {
        Some(region) if region.is_content_editable() => insert_into_region(&window, &document, &text),
        _ => Ok(false),
    }
}

fn focused_editable(document: &Document) -> Result<Option<Element>, PageError> {
    let active = document.active_element();
    let on_body = match (&active, document.body()) {
        (Some(active), Some(body)) => body.is_same_node(Some(active.as_ref())),
        (None, _) => true,
        _ => false,
    };
    if !on_body {
        return Ok(active);
    }
    Ok(document.query_selector(FOCUSED_EDITABLE_SELECTOR)?)
}

fn insert_into_control(control: &ValueControl, text: &str) -> Result<(), PageError> {
    let (start, end) = control
        .selection()
        .ok_or_else(|| PageError::ElementTypeError { expected_type: "selectable text control".to_string() })?;

    if control.set_range_text(text, start, end).is_err() {
        let (value, caret) = splice_selection(&control.value(), start, end, text);
        control.set_value(&value);
        control.set_caret(caret)?;
    }

    let init = EventInit::new();
    init.set_bubbles(true);
    let event = Event::new_with_event_init_dict("input", &init)?;
    control.event_target().dispatch_event(&event)?;
    Ok(())
}

fn insert_into_region(window: &Window, document: &Document, text: &str) -> Result<bool, PageError> {
    let inserted = document
        .dyn_ref::<HtmlDocument>()
        .map(|html| html.exec_command_with_show_ui_and_value("insertText", false, text))
        .and_then(Result::ok)
        .unwrap_or(false);
    if inserted {
        return Ok(true);
    }

    let Some(selection) = window.get_selection()? else {
        return Ok(false);
    };
    if selection.range_count() == 0 {
        return Ok(false);
    }
    selection.delete_from_document()?;
    let range = selection.get_range_at(0)?;
    range.insert_node(&document.create_text_node(text))?;
    selection.collapse_to_end()?;
    Ok(true)
}
