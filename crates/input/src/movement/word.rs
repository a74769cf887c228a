//! Word motions: `w`, `b`, `e`, `ge` and their WORD forms.
//!
//! An empty line counts as a word for `w`, `b` and `ge`; `e` skips it.

use ropey::RopeSlice;
use viper_primitives::range::CharIdx;

use super::{CharClass, char_class};
use crate::types::WordType;

/// Returns true if `pos` is the line feed of an empty line.
fn is_empty_line_at(text: RopeSlice, pos: CharIdx) -> bool {
	text.char(pos) == '\n' && (pos == 0 || text.char(pos - 1) == '\n')
}

/// `w`: start of the `count`th next word. May return the text length when
/// the last word runs to the end of the buffer.
pub fn next_word_start(text: RopeSlice, pos: CharIdx, count: usize, word_type: WordType) -> Option<CharIdx> {
	let len = text.len_chars();
	let mut p = pos;
	for _ in 0..count {
		if p >= len {
			break;
		}
		let class = char_class(text.char(p), word_type);
		if class != CharClass::Blank {
			while p < len && char_class(text.char(p), word_type) == class {
				p += 1;
			}
		}
		while p < len {
			let c = text.char(p);
			if c == '\n' {
				p += 1;
				if p < len && text.char(p) == '\n' {
					break;
				}
				continue;
			}
			if !c.is_whitespace() {
				break;
			}
			p += 1;
		}
	}
	(p != pos).then_some(p)
}

/// `b`: start of the `count`th previous word.
pub fn prev_word_start(text: RopeSlice, pos: CharIdx, count: usize, word_type: WordType) -> Option<CharIdx> {
	let mut p = pos.min(text.len_chars());
	for _ in 0..count {
		if p == 0 {
			break;
		}
		p -= 1;
		while p > 0 && text.char(p).is_whitespace() && !is_empty_line_at(text, p) {
			p -= 1;
		}
		let class = char_class(text.char(p), word_type);
		if class == CharClass::Blank {
			continue;
		}
		while p > 0 && char_class(text.char(p - 1), word_type) == class {
			p -= 1;
		}
	}
	(p != pos).then_some(p)
}

/// `e`: end of the `count`th next word.
pub fn next_word_end(text: RopeSlice, pos: CharIdx, count: usize, word_type: WordType) -> Option<CharIdx> {
	let len = text.len_chars();
	let mut p = pos;
	for _ in 0..count {
		if p + 1 >= len {
			break;
		}
		p += 1;
		while p + 1 < len && text.char(p).is_whitespace() {
			p += 1;
		}
		let class = char_class(text.char(p), word_type);
		while p + 1 < len && char_class(text.char(p + 1), word_type) == class {
			p += 1;
		}
	}
	(p != pos).then_some(p)
}

/// `ge`: end of the `count`th previous word.
pub fn prev_word_end(text: RopeSlice, pos: CharIdx, count: usize, word_type: WordType) -> Option<CharIdx> {
	let mut p = pos.min(text.len_chars().saturating_sub(1));
	for _ in 0..count {
		if p == 0 {
			break;
		}
		let class = char_class(text.char(p), word_type);
		if class != CharClass::Blank {
			while p > 0 && char_class(text.char(p), word_type) == class {
				p -= 1;
			}
		} else {
			p -= 1;
		}
		while p > 0 && text.char(p).is_whitespace() && !is_empty_line_at(text, p) {
			p -= 1;
		}
	}
	(p != pos).then_some(p)
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	const W: WordType = WordType::Word;
	const BIG: WordType = WordType::BigWord;

	#[test]
	fn w_moves_over_keyword_and_punctuation_runs() {
		let text = Rope::from("foo.bar baz");
		let s = text.slice(..);
		assert_eq!(next_word_start(s, 0, 1, W), Some(3));
		assert_eq!(next_word_start(s, 3, 1, W), Some(4));
		assert_eq!(next_word_start(s, 0, 1, BIG), Some(8));
		assert_eq!(next_word_start(s, 0, 3, W), Some(8));
	}

	#[test]
	fn w_stops_on_empty_lines() {
		let text = Rope::from("foo\n\nbar");
		let s = text.slice(..);
		assert_eq!(next_word_start(s, 0, 1, W), Some(4));
		assert_eq!(next_word_start(s, 4, 1, W), Some(5));
	}

	#[test]
	fn w_on_last_word_reaches_the_end() {
		let text = Rope::from("foo bar");
		let s = text.slice(..);
		assert_eq!(next_word_start(s, 4, 1, W), Some(7));
		assert_eq!(next_word_start(s, 7, 1, W), None);
	}

	#[test]
	fn b_moves_back_to_word_starts() {
		let text = Rope::from("one two  three");
		let s = text.slice(..);
		assert_eq!(prev_word_start(s, 9, 1, W), Some(4));
		assert_eq!(prev_word_start(s, 6, 1, W), Some(4));
		assert_eq!(prev_word_start(s, 9, 2, W), Some(0));
		assert_eq!(prev_word_start(s, 0, 1, W), None);
	}

	#[test]
	fn b_stops_on_empty_lines() {
		let text = Rope::from("foo\n\nbar");
		assert_eq!(prev_word_start(text.slice(..), 5, 1, W), Some(4));
	}

	#[test]
	fn e_moves_to_word_ends() {
		let text = Rope::from("foo  bar\n\nbaz");
		let s = text.slice(..);
		assert_eq!(next_word_end(s, 0, 1, W), Some(2));
		assert_eq!(next_word_end(s, 2, 1, W), Some(7));
		assert_eq!(next_word_end(s, 7, 1, W), Some(12));
		assert_eq!(next_word_end(s, 12, 1, W), None);
	}

	#[test]
	fn ge_moves_to_previous_word_end() {
		let text = Rope::from("foo bar-baz");
		let s = text.slice(..);
		assert_eq!(prev_word_end(s, 8, 1, W), Some(7));
		assert_eq!(prev_word_end(s, 8, 1, BIG), Some(2));
		assert_eq!(prev_word_end(s, 4, 1, W), Some(2));
	}
}
