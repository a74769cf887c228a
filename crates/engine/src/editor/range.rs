//! Turns an operator's target into the ranges it acts on.
//!
//! Motions are classified exclusive, inclusive or linewise, then adjusted
//! the way Vim adjusts them for operators: `cw` acts like `ce`, `dw` stops
//! at the end of its line, and an exclusive motion that ends in column 0
//! backs up to the previous line (becoming linewise when it started at or
//! before the first non-blank).

use smallvec::SmallVec;
use viper_input::movement::{bracket_object, is_keyword_char, next_word_end, paragraph_object, quote_object, word_object};
use viper_input::{Motion, MotionKind, ObjectKind, OperatorTarget, TextObject, WordType};
use viper_primitives::rope::{column_of, first_non_blank, line_count, line_end, line_end_with_newline, line_of, line_start};
use viper_primitives::{Operator, TextRange};

use super::Editor;
use super::motion::{MotionEnv, remember_find, target};
use crate::caret::Caret;
use crate::error::{EditorError, EditorResult};
use crate::host::EditorHost;
use crate::session::Session;

/// Ranges per caret, as `(caret index, range)`.
pub(super) type CaretRanges = SmallVec<[(usize, TextRange); 1]>;

/// `3d2w` deletes six words; no count at all stays `None`.
pub(super) fn combined_count(count: Option<usize>, motion_count: Option<usize>) -> Option<usize> {
	match (count, motion_count) {
		(None, None) => None,
		(count, motion_count) => Some(count.unwrap_or(1).max(1) * motion_count.unwrap_or(1).max(1)),
	}
}

impl<H: EditorHost> Editor<H> {
	/// Resolves `target` for every caret. Fails without side effects on the
	/// buffer if any caret has no range.
	pub(super) fn operator_ranges(
		&self,
		session: &mut Session,
		operator: Operator,
		target: &OperatorTarget,
		count: Option<usize>,
	) -> EditorResult<CaretRanges> {
		let text = self.host.text();
		let mut ranges = CaretRanges::new();
		match target {
			OperatorTarget::Lines => {
				let lines = count.unwrap_or(1).max(1);
				let last = line_count(text) - 1;
				for (index, caret) in self.carets.iter().enumerate() {
					let first = line_of(text, caret.offset());
					let end = (first + lines - 1).min(last);
					ranges.push((index, TextRange::linewise(line_start(text, first), line_end_with_newline(text, end))));
				}
			}
			OperatorTarget::Object(object) => {
				for (index, caret) in self.carets.iter().enumerate() {
					let range = object_range(text, caret.offset(), *object, count).ok_or(EditorError::MotionUnresolved)?;
					ranges.push((index, range));
				}
			}
			OperatorTarget::Motion(motion) => {
				let plan = self.prepare_search(session, motion)?;
				remember_find(session, motion);
				let env = MotionEnv {
					text,
					options: session.options(),
					last_find: session.last_find,
					search: plan.as_ref(),
					past_end: true,
					operator: true,
				};
				for (index, caret) in self.carets.iter().enumerate() {
					let Some(range) = motion_range(&env, caret, operator, motion, count) else {
						return Err(plan.map_or(EditorError::MotionUnresolved, |plan| plan.not_found()));
					};
					ranges.push((index, range));
				}
			}
		}
		Ok(ranges)
	}
}

/// The range of a text object around `pos`.
pub(super) fn object_range(text: ropey::RopeSlice, pos: usize, object: TextObject, count: Option<usize>) -> Option<TextRange> {
	let n = count.unwrap_or(1).max(1);
	match object.kind {
		ObjectKind::Word(word) => word_object(text, pos, n, word, object.inner),
		ObjectKind::Paragraph => paragraph_object(text, pos, n, object.inner),
		ObjectKind::Bracket { open, close } => bracket_object(text, pos, open, close, object.inner),
		ObjectKind::Quote(quote) => quote_object(text, pos, quote, object.inner),
	}
}

#[derive(PartialEq, Eq)]
enum WordClass {
	Blank,
	Punctuation,
	Keyword,
}

fn word_class(c: char, word: WordType) -> WordClass {
	if c.is_whitespace() {
		WordClass::Blank
	} else if word == WordType::BigWord || is_keyword_char(c) {
		WordClass::Keyword
	} else {
		WordClass::Punctuation
	}
}

/// The range an operator covers when `motion` moves `caret`.
fn motion_range(env: &MotionEnv, caret: &Caret, operator: Operator, motion: &Motion, count: Option<usize>) -> Option<TextRange> {
	let text = env.text;
	let len = text.len_chars();
	let pos = caret.offset();

	if let Motion::WordForward(word) = motion
		&& operator == Operator::Change
		&& pos < len
		&& !text.char(pos).is_whitespace()
	{
		return Some(change_word(text, pos, count.unwrap_or(1).max(1), *word));
	}

	let to = target(env, caret, motion, count)?;
	let kind = match motion {
		Motion::RepeatFind { reverse } => match env.last_find {
			Some(find) if find.forward != *reverse => MotionKind::Inclusive,
			_ => MotionKind::Exclusive,
		},
		Motion::MatchPair if count.is_some() => MotionKind::Linewise,
		_ => motion.kind(),
	};
	let (lo, hi) = (pos.min(to), pos.max(to));

	Some(match kind {
		MotionKind::Linewise => TextRange::linewise(line_start(text, line_of(text, lo)), line_end_with_newline(text, line_of(text, hi))),
		MotionKind::Inclusive => {
			let end = if hi >= line_end(text, line_of(text, hi)) { hi } else { hi + 1 };
			TextRange::characterwise(lo, end.min(len))
		}
		MotionKind::Exclusive => exclusive_range(text, lo, hi, matches!(motion, Motion::WordForward(_))),
	})
}

/// `cw` on a word changes to its end, like `ce`, keeping the blanks after.
fn change_word(text: ropey::RopeSlice, pos: usize, count: usize, word: WordType) -> TextRange {
	let line_end = line_end(text, line_of(text, pos));
	let class = word_class(text.char(pos), word);
	let at_end = pos + 1 >= line_end || word_class(text.char(pos + 1), word) != class;
	let remaining = if at_end { count - 1 } else { count };
	let end = if remaining == 0 {
		pos
	} else {
		next_word_end(text, pos, remaining, word).unwrap_or(line_end.saturating_sub(1).max(pos))
	};
	TextRange::characterwise(pos, (end + 1).min(text.len_chars()))
}

fn exclusive_range(text: ropey::RopeSlice, lo: usize, mut hi: usize, word_motion: bool) -> TextRange {
	let lo_line = line_of(text, lo);
	// Raw rope line: an offset at the very end of a newline-terminated text
	// sits in column 0 of the line after the last one.
	let hi_line = text.char_to_line(hi.min(text.len_chars()));
	if hi_line <= lo_line || hi != text.line_to_char(hi_line) {
		return TextRange::characterwise(lo, hi);
	}
	let previous_end = line_end(text, hi_line - 1);
	if word_motion {
		if previous_end > lo {
			hi = previous_end;
		}
		return TextRange::characterwise(lo, hi);
	}
	if lo <= first_non_blank(text, lo_line) {
		return TextRange::linewise(line_start(text, lo_line), line_end_with_newline(text, hi_line - 1));
	}
	TextRange::characterwise(lo, previous_end.max(lo))
}

#[cfg(test)]
mod tests {
	use ropey::Rope;
	use viper_primitives::SelectionType;

	use super::*;
	use crate::options::Options;

	fn range_of(text: &str, pos: usize, operator: Operator, motion: Motion, count: Option<usize>) -> Option<(usize, usize, SelectionType)> {
		let rope = Rope::from(text);
		let options = Options::default();
		let env = MotionEnv {
			text: rope.slice(..),
			options: &options,
			last_find: None,
			search: None,
			past_end: true,
			operator: true,
		};
		let caret = Caret::new(pos);
		motion_range(&env, &caret, operator, &motion, count).map(|range| (range.start(), range.end(), range.kind()))
	}

	#[test]
	fn counts_multiply() {
		assert_eq!(combined_count(None, None), None);
		assert_eq!(combined_count(Some(3), Some(2)), Some(6));
		assert_eq!(combined_count(None, Some(4)), Some(4));
	}

	#[test]
	fn delete_word_stops_at_line_end() {
		let word = Motion::WordForward(WordType::Word);
		assert_eq!(range_of("The quick\nbrown fox\n", 0, Operator::Delete, word.clone(), None), Some((0, 4, SelectionType::CharacterWise)));
		assert_eq!(range_of("The quick\nbrown fox\n", 4, Operator::Delete, word.clone(), None), Some((4, 9, SelectionType::CharacterWise)));
		assert_eq!(range_of("ab fox\n", 3, Operator::Delete, word, None), Some((3, 6, SelectionType::CharacterWise)));
	}

	#[test]
	fn change_word_keeps_trailing_blanks() {
		let word = Motion::WordForward(WordType::Word);
		assert_eq!(range_of("foo bar baz", 0, Operator::Change, word.clone(), None), Some((0, 3, SelectionType::CharacterWise)));
		assert_eq!(range_of("foo bar baz", 2, Operator::Change, word.clone(), None), Some((2, 3, SelectionType::CharacterWise)));
		assert_eq!(range_of("foo bar baz", 0, Operator::Change, word, Some(2)), Some((0, 7, SelectionType::CharacterWise)));
	}

	#[test]
	fn left_motion_excludes_the_caret() {
		assert_eq!(range_of("abc", 2, Operator::Delete, Motion::Left, None), Some((1, 2, SelectionType::CharacterWise)));
		assert_eq!(range_of("abc", 0, Operator::Delete, Motion::Left, None), None);
		assert_eq!(range_of("abc", 2, Operator::Delete, Motion::Right, None), Some((2, 3, SelectionType::CharacterWise)));
	}

	#[test]
	fn inclusive_motions_take_the_last_char() {
		assert_eq!(range_of("abc def", 0, Operator::Delete, Motion::LineEnd, None), Some((0, 7, SelectionType::CharacterWise)));
		let find = Motion::FindChar {
			target: 'd',
			forward: true,
			till: false,
		};
		assert_eq!(range_of("abc def", 0, Operator::Delete, find, None), Some((0, 5, SelectionType::CharacterWise)));
		assert_eq!(range_of("\nx", 0, Operator::Delete, Motion::LineEnd, None), Some((0, 0, SelectionType::CharacterWise)));
	}

	#[test]
	fn exclusive_motion_to_column_zero_becomes_linewise() {
		let text = "one\ntwo\n\nthree\n";
		assert_eq!(range_of(text, 0, Operator::Delete, Motion::ParagraphForward, None), Some((0, 8, SelectionType::LineWise)));
		assert_eq!(range_of(text, 1, Operator::Delete, Motion::ParagraphForward, None), Some((1, 7, SelectionType::CharacterWise)));
	}

	#[test]
	fn vertical_motions_are_linewise() {
		assert_eq!(range_of("a\nb\nc\n", 0, Operator::Delete, Motion::Down, None), Some((0, 4, SelectionType::LineWise)));
		assert_eq!(range_of("a\nb\nc\n", 4, Operator::Delete, Motion::Down, None), None);
	}
}
