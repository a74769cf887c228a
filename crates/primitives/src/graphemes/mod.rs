//! Grapheme cluster boundaries over rope text.
//!
//! Horizontal motions step by cluster so that a caret never rests between a
//! base character and its combining marks.

use ropey::RopeSlice;
use unicode_segmentation::GraphemeCursor;

use crate::range::CharIdx;

/// Characters of context examined on either side of a candidate boundary.
const WINDOW: usize = 16;

/// Returns whether `char_idx` is at a grapheme cluster boundary.
pub fn is_grapheme_boundary(text: RopeSlice, char_idx: CharIdx) -> bool {
	let len = text.len_chars();
	if char_idx == 0 || char_idx >= len {
		return true;
	}

	let start = char_idx.saturating_sub(WINDOW);
	let end = (char_idx + WINDOW).min(len);
	let window: String = text.slice(start..end).into();
	let offset: usize = window.chars().take(char_idx - start).map(char::len_utf8).sum();

	// The window may cut a cluster at its left edge; a pre-context of the whole
	// window start is good enough for editing text.
	let mut cursor = GraphemeCursor::new(offset, window.len(), true);
	cursor.is_boundary(&window, 0).unwrap_or(true)
}

/// Returns the char index of the next grapheme boundary after `char_idx`.
///
/// At or past the end, returns `text.len_chars()`.
pub fn next_grapheme_boundary(text: RopeSlice, char_idx: CharIdx) -> CharIdx {
	let len = text.len_chars();
	let mut idx = char_idx.saturating_add(1).min(len);
	while idx < len && !is_grapheme_boundary(text, idx) {
		idx += 1;
	}
	idx
}

/// Returns the char index of the previous grapheme boundary before `char_idx`.
pub fn prev_grapheme_boundary(text: RopeSlice, char_idx: CharIdx) -> CharIdx {
	let mut idx = char_idx.saturating_sub(1);
	while idx > 0 && !is_grapheme_boundary(text, idx) {
		idx -= 1;
	}
	idx
}

/// Snaps `char_idx` forward to a boundary if it is inside a cluster.
pub fn ensure_grapheme_boundary_next(text: RopeSlice, char_idx: CharIdx) -> CharIdx {
	if is_grapheme_boundary(text, char_idx) { char_idx } else { next_grapheme_boundary(text, char_idx) }
}

/// Snaps `char_idx` backward to a boundary if it is inside a cluster.
pub fn ensure_grapheme_boundary_prev(text: RopeSlice, char_idx: CharIdx) -> CharIdx {
	if is_grapheme_boundary(text, char_idx) { char_idx } else { prev_grapheme_boundary(text, char_idx) }
}

#[cfg(test)]
mod tests;
