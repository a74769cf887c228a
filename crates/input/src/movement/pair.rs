use ropey::RopeSlice;
use viper_primitives::range::CharIdx;
use viper_primitives::rope::{line_end, line_of};

const PAIRS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];

/// `%`: jumps from the first bracket at or after the caret on the current
/// line to its partner, honouring nesting.
pub fn match_pair(text: RopeSlice, pos: CharIdx) -> Option<CharIdx> {
	let end = line_end(text, line_of(text, pos));
	let (at, c) = (pos..end).map(|i| (i, text.char(i))).find(|&(_, c)| PAIRS.iter().any(|&(o, cl)| c == o || c == cl))?;

	for &(open, close) in &PAIRS {
		if c == open {
			let mut depth = 0usize;
			for i in at + 1..text.len_chars() {
				match text.char(i) {
					ch if ch == open => depth += 1,
					ch if ch == close => {
						if depth == 0 {
							return Some(i);
						}
						depth -= 1;
					}
					_ => {}
				}
			}
			return None;
		}
		if c == close {
			let mut depth = 0usize;
			for i in (0..at).rev() {
				match text.char(i) {
					ch if ch == close => depth += 1,
					ch if ch == open => {
						if depth == 0 {
							return Some(i);
						}
						depth -= 1;
					}
					_ => {}
				}
			}
			return None;
		}
	}
	None
}
