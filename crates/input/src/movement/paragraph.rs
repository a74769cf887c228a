//! Paragraph motions `}` and `{`.
//!
//! Paragraphs are separated by empty lines. Moving past the last paragraph
//! lands on the end of the buffer; moving before the first lands on offset 0.

use ropey::RopeSlice;
use viper_primitives::range::CharIdx;
use viper_primitives::rope::{is_empty_line, line_count, line_end, line_of, line_start};

/// `}`: start of the `count`th empty line after the current paragraph, or
/// the end of the last line. The end of the last line is one past its last
/// character, which an exclusive operator then includes.
pub fn paragraph_forward(text: RopeSlice, pos: CharIdx, count: usize) -> Option<CharIdx> {
	let last = line_count(text) - 1;
	let mut line = line_of(text, pos);
	let mut target = pos;
	for _ in 0..count.max(1) {
		while line < last && is_empty_line(text, line) {
			line += 1;
		}
		while line <= last && !is_empty_line(text, line) {
			line += 1;
		}
		if line > last {
			target = line_end(text, last);
			break;
		}
		target = line_start(text, line);
	}
	if target == pos || (target == line_end(text, last) && target == pos + 1 && !is_empty_line(text, last)) {
		return None;
	}
	Some(target)
}

/// `{`: start of the `count`th empty line before the current paragraph, or
/// offset 0.
pub fn paragraph_backward(text: RopeSlice, pos: CharIdx, count: usize) -> Option<CharIdx> {
	let mut line = line_of(text, pos);
	let mut target = pos;
	for _ in 0..count.max(1) {
		while line > 0 && is_empty_line(text, line) {
			line -= 1;
		}
		while line > 0 && !is_empty_line(text, line) {
			line -= 1;
		}
		target = line_start(text, line);
		if line == 0 {
			break;
		}
	}
	(target != pos).then_some(target)
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	const TEXT: &str = "one\ntwo\n\nthree\nfour\n\n\nfive";

	#[test]
	fn forward_lands_on_empty_lines() {
		let text = Rope::from(TEXT);
		let s = text.slice(..);
		assert_eq!(paragraph_forward(s, 0, 1), Some(8));
		assert_eq!(paragraph_forward(s, 8, 1), Some(20));
		assert_eq!(paragraph_forward(s, 0, 2), Some(20));
	}

	#[test]
	fn forward_past_last_paragraph_reaches_buffer_end() {
		let text = Rope::from(TEXT);
		let s = text.slice(..);
		assert_eq!(paragraph_forward(s, 22, 1), Some(26));
		assert_eq!(paragraph_forward(s, 25, 1), None);
	}

	#[test]
	fn backward_lands_on_empty_lines() {
		let text = Rope::from(TEXT);
		let s = text.slice(..);
		assert_eq!(paragraph_backward(s, 22, 1), Some(21));
		assert_eq!(paragraph_backward(s, 15, 1), Some(8));
		assert_eq!(paragraph_backward(s, 5, 1), Some(0));
		assert_eq!(paragraph_backward(s, 0, 1), None);
	}
}
