//! Text preparation for dictation. DOM caret positions are UTF-16 code unit
//! offsets, so splicing works on UTF-16 rather than bytes.

/// Dictated text as inserted: trimmed, followed by one space so consecutive
/// utterances do not run together. `None` for blank input.
pub fn dictation_text(raw: &str) -> Option<String> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(format!("{} ", cleaned))
}

/// Replaces `value[start..end]` (UTF-16 offsets) with `text`. Returns the new
/// value and the caret offset just after the inserted text. Offsets past the
/// end are clamped and a reversed range is treated as a caret at `start`.
pub fn splice_selection(value: &str, start: u32, end: u32, text: &str) -> (String, u32) {
    let units: Vec<u16> = value.encode_utf16().collect();
    let len = units.len();
    let start = (start as usize).min(len);
    let end = (end as usize).clamp(start, len);
    let inserted: Vec<u16> = text.encode_utf16().collect();

    let mut spliced = Vec::with_capacity(len - (end - start) + inserted.len());
    spliced.extend_from_slice(&units[..start]);
    spliced.extend_from_slice(&inserted);
    spliced.extend_from_slice(&units[end..]);

    let caret = (start + inserted.len()) as u32;
    (String::from_utf16_lossy(&spliced), caret)
}
