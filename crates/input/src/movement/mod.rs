//! Caret movement over rope text.
//!
//! Every function takes a char offset and returns the new offset, or `None`
//! when the motion cannot move at all (which makes Vim beep and abort the
//! command). Functions never look at modes; callers pass `past_end` where
//! insert, visual or operator-pending mode allows the caret on a line end.

mod find;
mod objects;
mod pair;
mod paragraph;
mod search;
mod word;

pub use find::find_char_in_line;
pub use objects::{bracket_object, paragraph_object, quote_object, word_object};
pub use pair::match_pair;
pub use paragraph::{paragraph_backward, paragraph_forward};
use ropey::RopeSlice;
pub use search::{SearchMatch, search_backward, search_forward, word_under_cursor};
use viper_primitives::graphemes::{next_grapheme_boundary, prev_grapheme_boundary};
use viper_primitives::range::CharIdx;
use viper_primitives::rope::{clamp_line, last_char_offset, line_count, line_end, line_of, line_start, offset_at_column};
pub use word::{next_word_end, next_word_start, prev_word_end, prev_word_start};

use crate::types::WordType;

/// Vim character classes: blank (including line breaks), punctuation, keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
	Blank,
	Punctuation,
	Keyword,
}

pub(crate) fn char_class(c: char, word_type: WordType) -> CharClass {
	if c.is_whitespace() {
		CharClass::Blank
	} else if word_type == WordType::BigWord || is_keyword_char(c) {
		CharClass::Keyword
	} else {
		CharClass::Punctuation
	}
}

/// Keyword characters as in Vim's default `iskeyword`.
pub fn is_keyword_char(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || (!c.is_ascii() && !c.is_whitespace())
}

/// Moves left within the line by `count` graphemes.
pub fn move_left(text: RopeSlice, pos: CharIdx, count: usize) -> Option<CharIdx> {
	let start = line_start(text, line_of(text, pos));
	if pos <= start {
		return None;
	}
	let mut p = pos;
	for _ in 0..count {
		if p <= start {
			break;
		}
		p = prev_grapheme_boundary(text, p).max(start);
	}
	Some(p)
}

/// Moves right within the line by `count` graphemes, stopping on the last
/// character or, with `past_end`, on the line end.
pub fn move_right(text: RopeSlice, pos: CharIdx, count: usize, past_end: bool) -> Option<CharIdx> {
	let line = line_of(text, pos);
	let limit = if past_end { line_end(text, line) } else { last_char_offset(text, line) };
	if pos >= limit {
		return None;
	}
	let mut p = pos;
	for _ in 0..count {
		if p >= limit {
			break;
		}
		p = next_grapheme_boundary(text, p).min(limit);
	}
	Some(p)
}

/// `<BS>`: moves left, continuing onto the previous line when `wrap` is set.
pub fn move_backspace(text: RopeSlice, pos: CharIdx, count: usize, wrap: bool, past_end: bool) -> Option<CharIdx> {
	let mut p = pos;
	for _ in 0..count {
		let line = line_of(text, p);
		if p > line_start(text, line) {
			p = prev_grapheme_boundary(text, p);
		} else if wrap && line > 0 {
			p = if past_end { line_end(text, line - 1) } else { last_char_offset(text, line - 1) };
		} else {
			break;
		}
	}
	(p != pos).then_some(p)
}

/// `<Space>`: moves right, continuing onto the next line when `wrap` is set.
pub fn move_space(text: RopeSlice, pos: CharIdx, count: usize, wrap: bool, past_end: bool) -> Option<CharIdx> {
	let last_line = line_count(text) - 1;
	let mut p = pos;
	for _ in 0..count {
		let line = line_of(text, p);
		let limit = if past_end { line_end(text, line) } else { last_char_offset(text, line) };
		if p < limit {
			p = next_grapheme_boundary(text, p).min(limit);
		} else if wrap && line < last_line {
			p = line_start(text, line + 1);
		} else {
			break;
		}
	}
	(p != pos).then_some(p)
}

/// Moves `count` lines up or down, keeping `column` where the target line
/// is long enough. `usize::MAX` as the column sticks to the line end.
///
/// Fails only when already on the first or last line.
pub fn move_vertically(text: RopeSlice, pos: CharIdx, count: usize, down: bool, column: usize, past_end: bool) -> Option<CharIdx> {
	let line = line_of(text, pos);
	let last = line_count(text) - 1;
	let target = if down {
		if line >= last {
			return None;
		}
		(line + count).min(last)
	} else {
		if line == 0 {
			return None;
		}
		line.saturating_sub(count)
	};
	Some(offset_at_column(text, target, column, past_end))
}

/// Offset of line `line` (0-based), clamped to the buffer.
pub fn goto_line(text: RopeSlice, line: usize) -> CharIdx {
	line_start(text, clamp_line(text, line))
}
