//! Regex search over rope text for `/`, `?`, `n`, `N`, `*` and `#`.

use regex::Regex;
use ropey::RopeSlice;
use viper_primitives::range::CharIdx;
use viper_primitives::rope::{line_end, line_of};

use super::is_keyword_char;

/// A search hit, as half-open char offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
	pub start: CharIdx,
	pub end: CharIdx,
	/// The search passed the end (or start) of the buffer to find it.
	pub wrapped: bool,
}

/// Collects match starts and ends as char offsets.
fn char_matches(text: RopeSlice, re: &Regex) -> Vec<(CharIdx, CharIdx)> {
	let haystack: String = text.chars().collect();
	let mut byte_to_char = Vec::with_capacity(haystack.len() + 1);
	for (ci, ch) in haystack.chars().enumerate() {
		byte_to_char.extend(std::iter::repeat_n(ci, ch.len_utf8()));
	}
	byte_to_char.push(text.len_chars());
	re.find_iter(&haystack).map(|m| (byte_to_char[m.start()], byte_to_char[m.end()])).collect()
}

/// Finds the `count`th match starting after `pos`, wrapping around the end
/// of the buffer when `wrap` is set.
pub fn search_forward(text: RopeSlice, re: &Regex, pos: CharIdx, count: usize, wrap: bool) -> Option<SearchMatch> {
	let matches = char_matches(text, re);
	if matches.is_empty() {
		return None;
	}
	let mut cursor = pos;
	let mut wrapped = false;
	let mut hit = None;
	for _ in 0..count.max(1) {
		let next = match matches.iter().find(|(start, _)| *start > cursor) {
			Some(m) => *m,
			None if wrap => {
				wrapped = true;
				matches[0]
			}
			None => return None,
		};
		cursor = next.0;
		hit = Some(next);
	}
	hit.map(|(start, end)| SearchMatch { start, end, wrapped })
}

/// Finds the `count`th match starting before `pos`, wrapping around the
/// start of the buffer when `wrap` is set.
pub fn search_backward(text: RopeSlice, re: &Regex, pos: CharIdx, count: usize, wrap: bool) -> Option<SearchMatch> {
	let matches = char_matches(text, re);
	let last = *matches.last()?;
	let mut cursor = pos;
	let mut wrapped = false;
	let mut hit = None;
	for _ in 0..count.max(1) {
		let prev = match matches.iter().rev().find(|(start, _)| *start < cursor) {
			Some(m) => *m,
			None if wrap => {
				wrapped = true;
				last
			}
			None => return None,
		};
		cursor = prev.0;
		hit = Some(prev);
	}
	hit.map(|(start, end)| SearchMatch { start, end, wrapped })
}

/// The keyword under or after the caret on its line, for `*` and `#`.
pub fn word_under_cursor(text: RopeSlice, pos: CharIdx) -> Option<(CharIdx, CharIdx)> {
	let end_of_line = line_end(text, line_of(text, pos));
	let mut start = (pos..end_of_line).find(|&i| is_keyword_char(text.char(i)))?;
	let mut end = start;
	while end < end_of_line && is_keyword_char(text.char(end)) {
		end += 1;
	}
	if start == pos {
		while start > 0 && is_keyword_char(text.char(start - 1)) {
			start -= 1;
		}
	}
	Some((start, end))
}

#[cfg(test)]
mod tests {
	use ropey::Rope;
	use viper_primitives::compile_pattern;

	use super::*;

	#[test]
	fn forward_search_skips_the_caret_and_wraps() {
		let text = Rope::from("foo bar foo baz");
		let s = text.slice(..);
		let re = compile_pattern("foo", false, false).unwrap();
		let hit = search_forward(s, &re, 0, 1, true).unwrap();
		assert_eq!((hit.start, hit.end, hit.wrapped), (8, 11, false));
		let hit = search_forward(s, &re, 8, 1, true).unwrap();
		assert_eq!((hit.start, hit.wrapped), (0, true));
		assert!(search_forward(s, &re, 8, 1, false).is_none());
	}

	#[test]
	fn backward_search_with_count() {
		let text = Rope::from("ab ab ab");
		let s = text.slice(..);
		let re = compile_pattern("ab", false, false).unwrap();
		assert_eq!(search_backward(s, &re, 6, 2, false).map(|m| m.start), Some(0));
		assert_eq!(search_backward(s, &re, 0, 1, true).map(|m| m.start), Some(6));
	}

	#[test]
	fn multibyte_text_uses_char_offsets() {
		let text = Rope::from("héllo wörld wörld");
		let re = compile_pattern("wörld", false, false).unwrap();
		assert_eq!(search_forward(text.slice(..), &re, 6, 1, false).map(|m| m.start), Some(12));
	}

	#[test]
	fn word_under_or_after_cursor() {
		let text = Rope::from("  foo_bar(x)");
		let s = text.slice(..);
		assert_eq!(word_under_cursor(s, 0), Some((2, 9)));
		assert_eq!(word_under_cursor(s, 5), Some((2, 9)));
		assert_eq!(word_under_cursor(s, 9), Some((10, 11)));
	}
}
