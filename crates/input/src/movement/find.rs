use ropey::RopeSlice;
use viper_primitives::range::CharIdx;
use viper_primitives::rope::{line_end, line_of, line_start};

/// `f`, `F`, `t` and `T`: the `count`th occurrence of `target` on the
/// current line.
///
/// Till motions stop one short of the match. With `skip_adjacent` (used
/// when `;`/`,` repeat a till) a match right next to the caret is skipped
/// so repeating makes progress.
pub fn find_char_in_line(
	text: RopeSlice,
	pos: CharIdx,
	target: char,
	count: usize,
	forward: bool,
	till: bool,
	skip_adjacent: bool,
) -> Option<CharIdx> {
	let line = line_of(text, pos);
	let skip = if till && skip_adjacent { 2 } else { 1 };
	let mut remaining = count.max(1);

	if forward {
		let end = line_end(text, line);
		let mut idx = pos + skip;
		while idx < end {
			if text.char(idx) == target {
				remaining -= 1;
				if remaining == 0 {
					return Some(if till { idx - 1 } else { idx });
				}
			}
			idx += 1;
		}
	} else {
		let start = line_start(text, line);
		let mut idx = pos.checked_sub(skip)?;
		while idx >= start {
			if text.char(idx) == target {
				remaining -= 1;
				if remaining == 0 {
					return Some(if till { idx + 1 } else { idx });
				}
			}
			if idx == 0 {
				break;
			}
			idx -= 1;
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	#[test]
	fn find_forward_and_till() {
		let text = Rope::from("hello world");
		let s = text.slice(..);
		assert_eq!(find_char_in_line(s, 0, 'o', 1, true, false, false), Some(4));
		assert_eq!(find_char_in_line(s, 0, 'o', 1, true, true, false), Some(3));
		assert_eq!(find_char_in_line(s, 0, 'o', 2, true, false, false), Some(7));
		assert_eq!(find_char_in_line(s, 0, 'o', 3, true, false, false), None);
	}

	#[test]
	fn find_backward_and_till() {
		let text = Rope::from("hello world");
		let s = text.slice(..);
		assert_eq!(find_char_in_line(s, 10, 'o', 1, false, false, false), Some(7));
		assert_eq!(find_char_in_line(s, 10, 'o', 1, false, true, false), Some(8));
		assert_eq!(find_char_in_line(s, 0, 'h', 1, false, false, false), None);
	}

	#[test]
	fn find_stays_on_the_line() {
		let text = Rope::from("abc\nxyz");
		let s = text.slice(..);
		assert_eq!(find_char_in_line(s, 0, 'x', 1, true, false, false), None);
		assert_eq!(find_char_in_line(s, 5, 'a', 1, false, false, false), None);
	}

	#[test]
	fn repeated_till_skips_adjacent_match() {
		let text = Rope::from("a,b,c");
		let s = text.slice(..);
		assert_eq!(find_char_in_line(s, 0, ',', 1, true, true, false), Some(0));
		assert_eq!(find_char_in_line(s, 0, ',', 1, true, true, true), Some(2));
	}
}
