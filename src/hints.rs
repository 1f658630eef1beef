//! Link hint index.
//!
//! The page renderer feeds every `a[href]` with its bounding box into
//! [`OverlayState::rebuild`] and draws the returned markers. Element handles
//! are generic so the numbering rules can be exercised without a DOM.

/// Links smaller than this in either dimension are not hinted.
pub const MIN_HINT_SIZE: f64 = 8.0;
/// Markers sit this far above and left of the link's top-left corner.
pub const MARKER_OFFSET: f64 = 6.0;

/// A rendered bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// True when the box is large enough and not entirely outside the viewport.
pub fn is_hintable(rect: &Rect, viewport: &Viewport) -> bool {
    if rect.width < MIN_HINT_SIZE || rect.height < MIN_HINT_SIZE {
        return false;
    }
    !(rect.bottom() < 0.0
        || rect.top > viewport.height
        || rect.right() < 0.0
        || rect.left > viewport.width)
}

/// A numbered marker to draw, positioned in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub index: u32,
    pub top: f64,
    pub left: f64,
}

impl Marker {
    fn for_rect(index: u32, rect: &Rect) -> Self {
        Marker {
            index,
            top: (rect.top - MARKER_OFFSET).max(0.0),
            left: (rect.left - MARKER_OFFSET).max(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkEntry<E> {
    pub index: u32,
    pub element: E,
}

/// Per-page hint state. Showing always rebuilds from scratch, so numbering
/// reflects the page as it is at the time of the call.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState<E> {
    visible: bool,
    entries: Vec<LinkEntry<E>>,
}

impl<E> Default for OverlayState<E> {
    fn default() -> Self {
        OverlayState {
            visible: false,
            entries: Vec::new(),
        }
    }
}

impl<E> OverlayState<E> {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn entries(&self) -> &[LinkEntry<E>] {
        &self.entries
    }

    /// Replaces the index with the hintable links among `links` (document
    /// order), numbered from 1, and returns the markers to render.
    pub fn rebuild<I>(&mut self, links: I, viewport: &Viewport) -> Vec<Marker>
    where
        I: IntoIterator<Item = (E, Rect)>,
    {
        self.entries.clear();
        let mut markers = Vec::new();
        for (element, rect) in links {
            if !is_hintable(&rect, viewport) {
                continue;
            }
            let index = self.entries.len() as u32 + 1;
            markers.push(Marker::for_rect(index, &rect));
            self.entries.push(LinkEntry { index, element });
        }
        self.visible = true;
        markers
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.visible = false;
    }

    pub fn lookup(&self, index: u32) -> Option<&E> {
        self.entries
            .iter()
            .find(|entry| entry.index == index)
            .map(|entry| &entry.element)
    }
}

impl<E: Clone> OverlayState<E> {
    /// Resolves a spoken hint number. Tracked entries win; otherwise the
    /// number is a 1-based position in the unfiltered document-order list
    /// produced by `all_links`, which is only evaluated on a miss.
    pub fn resolve<F>(&self, index: u32, all_links: F) -> Option<E>
    where
        F: FnOnce() -> Vec<E>,
    {
        if let Some(element) = self.lookup(index) {
            return Some(element.clone());
        }
        let position = usize::try_from(index).ok()?.checked_sub(1)?;
        all_links().into_iter().nth(position)
    }
}
