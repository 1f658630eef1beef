use web_sys::{ScrollBehavior, ScrollToOptions};

use super::dom;
use crate::command::{Direction, Edge, ScrollAmount, DEFAULT_SCROLL_FRACTION};
use crate::error::PageError;

/// Signed pixel delta for a scroll step. A missing amount scrolls the
/// default fraction of the viewport.
pub fn scroll_delta(direction: Direction, amount: Option<ScrollAmount>, viewport_height: f64) -> f64 {
    let magnitude = match amount {
        Some(ScrollAmount::Pixels(pixels)) => f64::from(pixels),
        Some(ScrollAmount::ViewportFraction(fraction)) => (viewport_height * fraction).round(),
        None => (viewport_height * DEFAULT_SCROLL_FRACTION).round(),
    };
    direction.sign() * magnitude
}

pub fn scroll_by(direction: Direction, amount: Option<ScrollAmount>) -> Result<(), PageError> {
    let (window, _document) = dom::get_window_document()?;
    let viewport = dom::viewport(&window)?;
    let options = smooth_options(scroll_delta(direction, amount, viewport.height));
    options.set_left(0.0);
    window.scroll_by_with_scroll_to_options(&options);
    Ok(())
}

pub fn scroll_to_edge(edge: Edge) -> Result<(), PageError> {
    let (window, document) = dom::get_window_document()?;
    let top = match edge {
        Edge::Top => 0.0,
        Edge::Bottom => document.body().map(|body| f64::from(body.scroll_height())).unwrap_or(0.0),
    };
    window.scroll_to_with_scroll_to_options(&smooth_options(top));
    Ok(())
}

fn smooth_options(top: f64) -> ScrollToOptions {
    let options = ScrollToOptions::new();
    options.set_top(top);
    options.set_behavior(ScrollBehavior::Smooth);
    options
}
