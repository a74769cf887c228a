//! Text objects: `iw`/`aw`, `ip`/`ap`, bracket blocks and quoted strings.
//!
//! Every object returns a half-open [`TextRange`]; paragraph objects are
//! line-wise, everything else character-wise.

use ropey::RopeSlice;
use viper_primitives::range::CharIdx;
use viper_primitives::rope::{is_blank_line, line_count, line_end, line_end_with_newline, line_of, line_start};
use viper_primitives::{SelectionType, TextRange};

use super::{CharClass, char_class};
use crate::types::WordType;

/// End (exclusive) of the run of characters sharing the class at `pos`.
fn run_end(text: RopeSlice, pos: CharIdx, limit: CharIdx, word_type: WordType) -> CharIdx {
	let class = char_class(text.char(pos), word_type);
	let mut end = pos;
	while end < limit && char_class(text.char(end), word_type) == class {
		end += 1;
	}
	end
}

fn is_blank(c: char) -> bool {
	c == ' ' || c == '\t'
}

/// `iw`, `aw`, `iW`, `aW`.
///
/// Inner counts words and blank runs alike. Around takes a word with its
/// trailing blanks, or its leading blanks when nothing trails it; on blanks
/// it takes the blanks and the word after them.
pub fn word_object(text: RopeSlice, pos: CharIdx, count: usize, word_type: WordType, inner: bool) -> Option<TextRange> {
	let line = line_of(text, pos);
	let (ls, le) = (line_start(text, line), line_end(text, line));
	if ls == le || pos >= le {
		return None;
	}

	let class = char_class(text.char(pos), word_type);
	let mut start = pos;
	while start > ls && char_class(text.char(start - 1), word_type) == class {
		start -= 1;
	}

	let mut end = pos;
	if inner {
		for _ in 0..count.max(1) {
			if end >= le {
				break;
			}
			end = run_end(text, end, le, word_type);
		}
		return Some(TextRange::characterwise(start, end));
	}

	let on_blank = class == CharClass::Blank;
	let mut trailing = false;
	for _ in 0..count.max(1) {
		if end >= le {
			break;
		}
		end = run_end(text, end, le, word_type);
		if end < le && (on_blank || is_blank(text.char(end))) {
			end = run_end(text, end, le, word_type);
			trailing = !on_blank;
		} else {
			trailing = false;
		}
	}
	if !on_blank && !trailing {
		while start > ls && is_blank(text.char(start - 1)) {
			start -= 1;
		}
	}
	Some(TextRange::characterwise(start, end))
}

/// `i(`, `a(`, `i{`, `a{` and the other bracket pairs.
///
/// The caret may sit on either bracket or anywhere inside. An inner block
/// spanning lines leaves the brackets on their own lines.
pub fn bracket_object(text: RopeSlice, pos: CharIdx, open: char, close: char, inner: bool) -> Option<TextRange> {
	let len = text.len_chars();
	if len == 0 {
		return None;
	}
	let pos = pos.min(len - 1);

	let open_pos = if text.char(pos) == open {
		pos
	} else {
		let mut depth = 0usize;
		let mut found = None;
		for i in (0..pos).rev() {
			let c = text.char(i);
			if c == close {
				depth += 1;
			} else if c == open {
				if depth == 0 {
					found = Some(i);
					break;
				}
				depth -= 1;
			}
		}
		found?
	};

	let mut depth = 0usize;
	let mut close_pos = None;
	for i in open_pos + 1..len {
		let c = text.char(i);
		if c == open {
			depth += 1;
		} else if c == close {
			if depth == 0 {
				close_pos = Some(i);
				break;
			}
			depth -= 1;
		}
	}
	let close_pos = close_pos?;

	if !inner {
		return Some(TextRange::characterwise(open_pos, close_pos + 1));
	}

	let mut start = open_pos + 1;
	let mut end = close_pos;
	let close_line = line_of(text, close_pos);
	if close_line > line_of(text, open_pos) {
		if start < end && text.char(start) == '\n' {
			start += 1;
		}
		let close_line_start = line_start(text, close_line);
		if (close_line_start..close_pos).all(|i| is_blank(text.char(i))) {
			end = close_line_start.max(start);
		}
	}
	Some(TextRange::characterwise(start, end))
}

/// `i"`, `a"` and the other quote objects, limited to the caret's line.
pub fn quote_object(text: RopeSlice, pos: CharIdx, quote: char, inner: bool) -> Option<TextRange> {
	let line = line_of(text, pos);
	let (ls, le) = (line_start(text, line), line_end(text, line));
	let quotes: Vec<CharIdx> = (ls..le)
		.filter(|&i| text.char(i) == quote && (i == ls || text.char(i - 1) != '\\'))
		.collect();

	let (open, close) = if let Some(k) = quotes.iter().position(|&q| q == pos) {
		if k % 2 == 0 {
			(quotes[k], *quotes.get(k + 1)?)
		} else {
			(quotes[k - 1], quotes[k])
		}
	} else {
		let before = quotes.iter().rev().find(|&&q| q < pos).copied();
		let after = quotes.iter().find(|&&q| q > pos).copied();
		match (before, after) {
			(Some(b), Some(a)) => (b, a),
			(None, Some(a)) => {
				let next = quotes.iter().find(|&&q| q > a).copied()?;
				(a, next)
			}
			_ => return None,
		}
	};

	if inner {
		return Some(TextRange::characterwise(open + 1, close));
	}
	let mut start = open;
	let mut end = close + 1;
	if end < le && is_blank(text.char(end)) {
		while end < le && is_blank(text.char(end)) {
			end += 1;
		}
	} else {
		while start > ls && is_blank(text.char(start - 1)) {
			start -= 1;
		}
	}
	Some(TextRange::characterwise(start, end))
}

/// `ip` and `ap`: runs of blank or non-blank lines.
pub fn paragraph_object(text: RopeSlice, pos: CharIdx, count: usize, inner: bool) -> Option<TextRange> {
	let last = line_count(text) - 1;
	let line = line_of(text, pos);
	let blank = is_blank_line(text, line);

	let mut start = line;
	while start > 0 && is_blank_line(text, start - 1) == blank {
		start -= 1;
	}

	let run_end = |from: usize| {
		let kind = is_blank_line(text, from);
		let mut end = from;
		while end < last && is_blank_line(text, end + 1) == kind {
			end += 1;
		}
		end
	};

	let mut end = run_end(line);
	let runs = if inner { count.max(1) } else { count.max(1) * 2 };
	let mut taken = 1;
	while taken < runs && end < last {
		end = run_end(end + 1);
		taken += 1;
	}

	if !inner && taken < runs && !blank {
		// No blank lines after the last paragraph: take the ones before it.
		if start > 0 && is_blank_line(text, start - 1) {
			start -= 1;
			while start > 0 && is_blank_line(text, start - 1) {
				start -= 1;
			}
		}
	}

	Some(TextRange::new(
		line_start(text, start),
		line_end_with_newline(text, end),
		SelectionType::LineWise,
	))
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	fn span(range: Option<TextRange>) -> Option<(usize, usize)> {
		range.map(|r| (r.start(), r.end()))
	}

	#[test]
	fn inner_word() {
		let text = Rope::from("hello world");
		let s = text.slice(..);
		assert_eq!(span(word_object(s, 7, 1, WordType::Word, true)), Some((6, 11)));
		assert_eq!(span(word_object(s, 5, 1, WordType::Word, true)), Some((5, 6)));
		assert_eq!(span(word_object(s, 0, 3, WordType::Word, true)), Some((0, 11)));
	}

	#[test]
	fn around_word_prefers_trailing_blanks() {
		let text = Rope::from("one two three");
		let s = text.slice(..);
		assert_eq!(span(word_object(s, 5, 1, WordType::Word, false)), Some((4, 8)));
		assert_eq!(span(word_object(s, 10, 1, WordType::Word, false)), Some((7, 13)));
		assert_eq!(span(word_object(s, 3, 1, WordType::Word, false)), Some((3, 7)));
	}

	#[test]
	fn word_object_on_empty_line_fails() {
		let text = Rope::from("a\n\nb");
		assert_eq!(word_object(text.slice(..), 2, 1, WordType::Word, true), None);
	}

	#[test]
	fn brackets_nested_and_on_delimiters() {
		let text = Rope::from("f(a, (b), c)");
		let s = text.slice(..);
		assert_eq!(span(bracket_object(s, 2, '(', ')', true)), Some((2, 11)));
		assert_eq!(span(bracket_object(s, 6, '(', ')', false)), Some((5, 8)));
		assert_eq!(span(bracket_object(s, 11, '(', ')', false)), Some((1, 12)));
		assert_eq!(bracket_object(s, 0, '[', ']', true), None);
	}

	#[test]
	fn inner_block_across_lines_keeps_brackets_on_their_lines() {
		let text = Rope::from("{\n    foo\n}");
		assert_eq!(span(bracket_object(text.slice(..), 5, '{', '}', true)), Some((2, 10)));
	}

	#[test]
	fn quotes_pair_from_line_start() {
		let text = Rope::from(r#"say "hi there" now"#);
		let s = text.slice(..);
		assert_eq!(span(quote_object(s, 7, '"', true)), Some((5, 13)));
		assert_eq!(span(quote_object(s, 4, '"', false)), Some((4, 15)));
		assert_eq!(span(quote_object(s, 0, '"', true)), Some((5, 13)));
	}

	#[test]
	fn escaped_quotes_are_skipped() {
		let text = Rope::from(r#""a\"b""#);
		assert_eq!(span(quote_object(text.slice(..), 1, '"', true)), Some((1, 5)));
	}

	#[test]
	fn paragraph_objects_are_linewise() {
		let text = Rope::from("a\nb\n\nc\n");
		let s = text.slice(..);
		let ip = paragraph_object(s, 0, 1, true).unwrap();
		assert_eq!((ip.start(), ip.end(), ip.kind()), (0, 4, SelectionType::LineWise));
		assert_eq!(span(paragraph_object(s, 0, 1, false)), Some((0, 5)));
		assert_eq!(span(paragraph_object(s, 5, 1, false)), Some((4, 7)));
	}
}
