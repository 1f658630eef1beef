//! Voice command interpreter.
//!
//! Turns one finalized transcript into exactly one [`Action`]. Rules are
//! checked in a fixed order and the first match wins; several phrases are
//! substrings of the input space of later patterns ("scroll to top" vs.
//! `scroll (down|up)`, "next tab" vs. `tab N`), so the order is part of the
//! contract.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Fraction of the viewport scrolled by "page down" / "page up".
pub const PAGE_SCROLL_FRACTION: f64 = 0.9;
/// Fraction of the viewport scrolled by a bare "scroll down" / "scroll up".
pub const DEFAULT_SCROLL_FRACTION: f64 = 0.7;

static SCROLL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"scroll\s+(down|up)(?:\s+([0-9]+))?").expect("valid scroll pattern"));
static CLICK_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(click|open) link\s+([0-9]+)").expect("valid link pattern"));
static TAB_INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(switch tab|tab)\s+([0-9]+)").expect("valid tab pattern"));
static OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"open\s+(.+)").expect("valid open pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Down => 1.0,
            Direction::Up => -1.0,
        }
    }
}

/// How far a `ScrollBy` moves. `None` in the action means "default step",
/// resolved against the live viewport by the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ScrollAmount {
    Pixels(u32),
    ViewportFraction(f64),
}

/// The discrete outcome of interpreting one transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ScrollToEdge(Edge),
    ScrollBy {
        direction: Direction,
        amount: Option<ScrollAmount>,
    },
    ShowLinkHints,
    HideLinkHints,
    /// 1-based hint number as spoken.
    ActivateLink(u32),
    SwitchTabRelative(i32),
    /// Zero-based; "tab 0" yields -1, which no tab matches.
    SwitchTabAbsolute(i64),
    CloseActiveTab,
    OpenNewTab,
    ReloadActiveTab,
    Navigate(String),
    SetDictation(bool),
    Unrecognized(String),
}

impl Action {
    /// Whether the action runs inside the active page rather than against
    /// the tab collection.
    pub fn is_page_scoped(&self) -> bool {
        matches!(
            self,
            Action::ScrollToEdge(_)
                | Action::ScrollBy { .. }
                | Action::ShowLinkHints
                | Action::HideLinkHints
                | Action::ActivateLink(_)
        )
    }
}

/// Lower-cases and trims a raw transcript.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

/// Interprets a raw transcript. Matching runs on the normalized text;
/// `Unrecognized` carries the raw text so it can be shown back to the user.
pub fn interpret(raw: &str) -> Action {
    let text = normalize(raw);

    if text.contains("scroll to top") {
        return Action::ScrollToEdge(Edge::Top);
    }
    if text.contains("scroll to bottom") {
        return Action::ScrollToEdge(Edge::Bottom);
    }
    if let Some(action) = parse_scroll(&text) {
        return action;
    }
    if text.contains("page down") {
        return Action::ScrollBy {
            direction: Direction::Down,
            amount: Some(ScrollAmount::ViewportFraction(PAGE_SCROLL_FRACTION)),
        };
    }
    if text.contains("page up") {
        return Action::ScrollBy {
            direction: Direction::Up,
            amount: Some(ScrollAmount::ViewportFraction(PAGE_SCROLL_FRACTION)),
        };
    }
    if text.contains("show links") {
        return Action::ShowLinkHints;
    }
    if text.contains("hide links") {
        return Action::HideLinkHints;
    }
    if let Some(index) = capture_number(&CLICK_LINK_RE, &text) {
        return Action::ActivateLink(index);
    }
    if text.contains("next tab") {
        return Action::SwitchTabRelative(1);
    }
    if text.contains("previous tab") || text.contains("prev tab") {
        return Action::SwitchTabRelative(-1);
    }
    if let Some(number) = capture_number(&TAB_INDEX_RE, &text) {
        return Action::SwitchTabAbsolute(i64::from(number) - 1);
    }
    if text.contains("close tab") {
        return Action::CloseActiveTab;
    }
    if text.contains("open new tab") || text.contains("new tab") {
        return Action::OpenNewTab;
    }
    if text.contains("reload tab") || text == "reload" {
        return Action::ReloadActiveTab;
    }
    if let Some(captures) = OPEN_RE.captures(&text) {
        return Action::Navigate(captures[1].trim().to_string());
    }
    match text.as_str() {
        "dictation on" | "start dictation" => Action::SetDictation(true),
        "dictation off" | "stop dictation" => Action::SetDictation(false),
        _ => Action::Unrecognized(raw.to_string()),
    }
}

fn parse_scroll(text: &str) -> Option<Action> {
    let captures = SCROLL_RE.captures(text)?;
    let direction = match &captures[1] {
        "down" => Direction::Down,
        _ => Direction::Up,
    };
    let amount = match captures.get(2) {
        Some(digits) => Some(ScrollAmount::Pixels(digits.as_str().parse().ok()?)),
        None => None,
    };
    Some(Action::ScrollBy { direction, amount })
}

// Second capture group as u32; overflow counts as no match.
fn capture_number(pattern: &Regex, text: &str) -> Option<u32> {
    pattern.captures(text)?.get(2)?.as_str().parse().ok()
}
