//! Content-script side: executes [`PageOp`]s against the live DOM.

mod dom;
pub mod insert;
pub mod overlay;
pub mod scroll;

use log::debug;

use crate::error::PageError;
use crate::protocol::PageOp;

/// Runs one page operation. The boolean reports whether the page had
/// something to act on (a link to click, a field to type into).
pub fn run(op: &PageOp) -> Result<bool, PageError> {
    debug!("Running page op {:?}", op);
    match op {
        PageOp::ScrollToEdge { edge } => scroll::scroll_to_edge(*edge).map(|()| true),
        PageOp::ScrollBy { direction, amount } => scroll::scroll_by(*direction, *amount).map(|()| true),
        PageOp::ShowLinkHints => overlay::show_link_hints().map(|_| true),
        PageOp::HideLinkHints => {
            overlay::hide_link_hints();
            Ok(true)
        }
        PageOp::ClickLink { index } => overlay::click_link(*index),
        PageOp::InsertText { text } => insert::insert_text_at_cursor(text),
    }
}

/// Entry point for JSON-encoded requests arriving from the background.
pub fn run_json(op_json: &str) -> Result<bool, PageError> {
    let op: PageOp = serde_json::from_str(op_json)
        .map_err(|e| PageError::InvalidRequest(format!("Failed to parse page op: {}", e)))?;
    run(&op)
}
