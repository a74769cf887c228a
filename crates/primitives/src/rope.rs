//! Rope utilities and line helpers.
//!
//! Vim counts lines differently from ropey: a trailing newline terminates
//! the last line instead of starting an empty one. Everything here uses
//! Vim's view unless stated otherwise.

use ropey::RopeSlice;

use crate::range::CharIdx;

/// Returns the number of lines, including the empty line after a trailing newline.
#[inline]
pub fn visible_line_count(text: RopeSlice) -> usize {
	text.len_lines()
}

/// Returns the maximum valid offset, which is the character count.
#[inline]
pub fn max_cursor_pos(text: RopeSlice) -> CharIdx {
	text.len_chars()
}

/// Returns the number of lines as Vim counts them (at least one).
pub fn line_count(text: RopeSlice) -> usize {
	let lines = text.len_lines();
	if lines > 1 && ends_with_newline(text) { lines - 1 } else { lines }
}

/// Returns true if the text ends with a line feed.
pub fn ends_with_newline(text: RopeSlice) -> bool {
	let len = text.len_chars();
	len > 0 && text.char(len - 1) == '\n'
}

/// Clamps a line index to the last Vim line.
pub fn clamp_line(text: RopeSlice, line: usize) -> usize {
	line.min(line_count(text) - 1)
}

/// Returns the line containing `offset` (clamped to the last Vim line).
pub fn line_of(text: RopeSlice, offset: CharIdx) -> usize {
	clamp_line(text, text.char_to_line(offset.min(text.len_chars())))
}

/// Returns the offset of the first character of `line`.
pub fn line_start(text: RopeSlice, line: usize) -> CharIdx {
	text.line_to_char(clamp_line(text, line))
}

/// Returns the offset just past the line's content, i.e. of its line feed
/// (or the end of the text for an unterminated last line).
pub fn line_end(text: RopeSlice, line: usize) -> CharIdx {
	let line = clamp_line(text, line);
	let slice = text.line(line);
	let mut len = slice.len_chars();
	if len > 0 && slice.char(len - 1) == '\n' {
		len -= 1;
		if len > 0 && slice.char(len - 1) == '\r' {
			len -= 1;
		}
	}
	text.line_to_char(line) + len
}

/// Returns the offset just past the line including its line feed.
pub fn line_end_with_newline(text: RopeSlice, line: usize) -> CharIdx {
	let line = clamp_line(text, line);
	if line + 1 < text.len_lines() { text.line_to_char(line + 1) } else { text.len_chars() }
}

/// Returns the number of content characters on `line`.
pub fn line_len(text: RopeSlice, line: usize) -> usize {
	line_end(text, line) - line_start(text, line)
}

/// Returns the content of `line` without its line terminator.
pub fn line_text(text: RopeSlice, line: usize) -> String {
	text.slice(line_start(text, line)..line_end(text, line)).to_string()
}

/// Returns the column (character offset from line start) of `offset`.
pub fn column_of(text: RopeSlice, offset: CharIdx) -> usize {
	let offset = offset.min(text.len_chars());
	offset - line_start(text, line_of(text, offset))
}

/// Returns the offset of the first non-blank character of `line`, or the
/// line end if the line is blank.
pub fn first_non_blank(text: RopeSlice, line: usize) -> CharIdx {
	let start = line_start(text, line);
	let end = line_end(text, line);
	(start..end).find(|&i| !matches!(text.char(i), ' ' | '\t')).unwrap_or(end)
}

/// Returns the offset of the last character of `line`, which is where a
/// normal-mode caret rests at most. Empty lines return their start.
pub fn last_char_offset(text: RopeSlice, line: usize) -> CharIdx {
	let start = line_start(text, line);
	let end = line_end(text, line);
	if end > start { end - 1 } else { start }
}

/// Returns the offset at `column` on `line`, clamped to the line content.
///
/// With `allow_end` the line end itself is a valid result (insert mode,
/// visual mode); otherwise the last character is the limit.
pub fn offset_at_column(text: RopeSlice, line: usize, column: usize, allow_end: bool) -> CharIdx {
	let start = line_start(text, line);
	let limit = if allow_end { line_end(text, line) } else { last_char_offset(text, line) };
	start + column.min(limit - start)
}

/// Returns true if `line` contains only blanks.
pub fn is_blank_line(text: RopeSlice, line: usize) -> bool {
	first_non_blank(text, line) == line_end(text, line)
}

/// Returns true if `line` has no characters at all.
pub fn is_empty_line(text: RopeSlice, line: usize) -> bool {
	line_len(text, line) == 0
}

/// Returns the leading whitespace of `line`.
pub fn indent_of(text: RopeSlice, line: usize) -> String {
	text.slice(line_start(text, line)..first_non_blank(text, line)).to_string()
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use ropey::Rope;

	use super::*;

	proptest! {
		#[test]
		fn offset_lies_within_its_line(text in "[a-c \n]{0,40}", offset in 0usize..48) {
			let rope = Rope::from(text.as_str());
			let slice = rope.slice(..);
			let offset = offset.min(slice.len_chars());
			let line = line_of(slice, offset);
			prop_assert!(line_start(slice, line) <= offset);
			prop_assert!(offset <= line_end_with_newline(slice, line));
			prop_assert_eq!(column_of(slice, offset), offset - line_start(slice, line));
		}
	}

	#[test]
	fn line_count_ignores_trailing_newline() {
		assert_eq!(line_count(Rope::from("hello\nworld").slice(..)), 2);
		assert_eq!(line_count(Rope::from("hello\nworld\n").slice(..)), 2);
		assert_eq!(line_count(Rope::from("").slice(..)), 1);
		assert_eq!(line_count(Rope::from("\n").slice(..)), 1);
		assert_eq!(line_count(Rope::from("\n\n").slice(..)), 2);
	}

	#[test]
	fn visible_line_count_matches_ropey() {
		assert_eq!(visible_line_count(Rope::from("hello\n").slice(..)), 2);
	}

	#[test]
	fn line_bounds() {
		let text = Rope::from("ab\ncde\n");
		let slice = text.slice(..);
		assert_eq!(line_start(slice, 1), 3);
		assert_eq!(line_end(slice, 1), 6);
		assert_eq!(line_end_with_newline(slice, 1), 7);
		assert_eq!(line_end_with_newline(slice, 5), 7);
		assert_eq!(line_text(slice, 0), "ab");
	}

	#[test]
	fn line_of_offset_at_end_is_last_line() {
		let text = Rope::from("ab\ncd\n");
		assert_eq!(line_of(text.slice(..), 6), 1);
	}

	#[test]
	fn crlf_is_not_line_content() {
		let text = Rope::from("ab\r\ncd");
		assert_eq!(line_end(text.slice(..), 0), 2);
	}

	#[test]
	fn first_non_blank_and_indent() {
		let text = Rope::from("  \tfoo\n   \n");
		let slice = text.slice(..);
		assert_eq!(first_non_blank(slice, 0), 3);
		assert_eq!(indent_of(slice, 0), "  \t");
		assert!(is_blank_line(slice, 1));
		assert!(!is_empty_line(slice, 1));
	}

	#[test]
	fn column_clamping() {
		let text = Rope::from("abc\n\nxy");
		let slice = text.slice(..);
		assert_eq!(offset_at_column(slice, 0, 10, false), 2);
		assert_eq!(offset_at_column(slice, 0, 10, true), 3);
		assert_eq!(offset_at_column(slice, 1, 3, false), 4);
		assert_eq!(offset_at_column(slice, 2, usize::MAX, false), 6);
		assert_eq!(offset_at_column(slice, 0, usize::MAX, true), 3);
		assert_eq!(column_of(slice, 6), 1);
		assert_eq!(last_char_offset(slice, 1), 4);
	}
}
