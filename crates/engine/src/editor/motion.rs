//! Motion targets and caret movement.

use regex::Regex;
use ropey::RopeSlice;
use tracing::debug;
use viper_input::Motion;
use viper_input::movement::{
	find_char_in_line, match_pair, move_backspace, move_left, move_right, move_space, move_vertically, next_word_end, next_word_start,
	paragraph_backward, paragraph_forward, prev_word_end, prev_word_start, search_backward, search_forward, word_under_cursor,
};
use viper_primitives::rope::{clamp_line, first_non_blank, last_char_offset, line_count, line_end, line_of, line_start, offset_at_column};
use viper_primitives::{CharIdx, Mode, PatternError, VisualKind, compile_pattern};

use super::Editor;
use crate::caret::{Caret, LINE_END_COLUMN};
use crate::error::{EditorError, EditorResult};
use crate::host::EditorHost;
use crate::options::Options;
use crate::session::{LastFind, Session};

/// A compiled search for `/`, `?`, `n`, `N`, `*` or `#`.
#[derive(Debug)]
pub(super) struct SearchPlan {
	regex: Regex,
	forward: bool,
	pattern: String,
}

impl SearchPlan {
	pub(super) fn not_found(&self) -> EditorError {
		EditorError::PatternNotFound(self.pattern.clone())
	}
}

/// Everything a motion looks at besides the caret.
pub(super) struct MotionEnv<'a> {
	pub(super) text: RopeSlice<'a>,
	pub(super) options: &'a Options,
	pub(super) last_find: Option<LastFind>,
	pub(super) search: Option<&'a SearchPlan>,
	/// The caret may rest on a line end.
	pub(super) past_end: bool,
	/// The motion is an operator target.
	pub(super) operator: bool,
}

/// Where `motion` takes `caret`, or `None` when it cannot move.
pub(super) fn target(env: &MotionEnv, caret: &Caret, motion: &Motion, count: Option<usize>) -> Option<CharIdx> {
	let text = env.text;
	let pos = caret.offset();
	let n = count.unwrap_or(1).max(1);
	let line = line_of(text, pos);
	let last_line = line_count(text) - 1;
	match motion {
		Motion::Left => move_left(text, pos, n),
		Motion::Right => move_right(text, pos, n, env.past_end),
		Motion::Backspace => move_backspace(text, pos, n, env.options.wraps("b"), env.past_end),
		Motion::Space => move_space(text, pos, n, env.options.wraps("s"), env.past_end),
		Motion::Up | Motion::Down => move_vertically(text, pos, n, *motion == Motion::Down, caret.last_column(), env.past_end),
		Motion::NextLineStart => (line < last_line).then(|| first_non_blank(text, (line + n).min(last_line))),
		Motion::PrevLineStart => (line > 0).then(|| first_non_blank(text, line.saturating_sub(n))),
		Motion::CurrentLineStart => Some(first_non_blank(text, (line + n - 1).min(last_line))),
		Motion::WordForward(word) => next_word_start(text, pos, n, *word),
		Motion::WordBackward(word) => prev_word_start(text, pos, n, *word),
		Motion::WordEnd(word) => next_word_end(text, pos, n, *word),
		Motion::WordEndBackward(word) => prev_word_end(text, pos, n, *word),
		Motion::LineStart => Some(line_start(text, line)),
		Motion::FirstNonBlank => Some(first_non_blank(text, line)),
		Motion::LineEnd => {
			let target = line + n - 1;
			if target > last_line {
				return None;
			}
			Some(if env.past_end && !env.operator { line_end(text, target) } else { last_char_offset(text, target) })
		}
		Motion::Column => Some(offset_at_column(text, line, n - 1, env.past_end)),
		Motion::FirstLine | Motion::LastLine => {
			let target = match count {
				Some(number) => clamp_line(text, number.max(1) - 1),
				None if *motion == Motion::FirstLine => 0,
				None => last_line,
			};
			Some(if env.options.startofline {
				first_non_blank(text, target)
			} else {
				offset_at_column(text, target, caret.last_column(), env.past_end)
			})
		}
		Motion::FindChar { target, forward, till } => find_char_in_line(text, pos, *target, n, *forward, *till, false),
		Motion::RepeatFind { reverse } => {
			let find = env.last_find?;
			find_char_in_line(text, pos, find.target, n, find.forward != *reverse, find.till, true)
		}
		Motion::ParagraphForward => paragraph_forward(text, pos, n),
		Motion::ParagraphBackward => paragraph_backward(text, pos, n),
		Motion::MatchPair => match count {
			Some(percent) if percent > 100 => None,
			Some(percent) => {
				let lines = last_line + 1;
				Some(first_non_blank(text, ((percent * lines).div_ceil(100)).max(1) - 1))
			}
			None => match_pair(text, pos),
		},
		Motion::Mark { name, linewise } => {
			let mark = caret.marks().get(*name).ok()?;
			let mark_line = clamp_line(text, mark.line);
			Some(if *linewise {
				first_non_blank(text, mark_line)
			} else {
				offset_at_column(text, mark_line, mark.col, true)
			})
		}
		Motion::Search { .. } | Motion::SearchNext { .. } | Motion::SearchWord { .. } => {
			let plan = env.search?;
			let from = match motion {
				Motion::SearchWord { .. } => word_under_cursor(text, pos).map_or(pos, |(start, _)| start),
				_ => pos,
			};
			let found = if plan.forward {
				search_forward(text, &plan.regex, from, n, env.options.wrapscan)
			} else {
				search_backward(text, &plan.regex, from, n, env.options.wrapscan)
			}?;
			if found.wrapped {
				debug!(pattern = %plan.pattern, "search wrapped");
			}
			Some(found.start)
		}
	}
}

/// Records `f`, `F`, `t` and `T` for `;` and `,`.
pub(super) fn remember_find(session: &mut Session, motion: &Motion) {
	if let Motion::FindChar { target, forward, till } = motion {
		session.last_find = Some(LastFind {
			target: *target,
			forward: *forward,
			till: *till,
		});
	}
}

/// Whether the caret may stop on a line end while `motion` runs in `mode`.
pub(super) fn past_end(mode: Mode, motion: &Motion) -> bool {
	match mode {
		Mode::Insert | Mode::Replace | Mode::OperatorPending(_) => true,
		Mode::Visual(_) | Mode::Select(_) => *motion == Motion::LineEnd,
		Mode::Normal | Mode::CommandLine(_) => false,
	}
}

impl<H: EditorHost> Editor<H> {
	/// Compiles the pattern a search motion needs and records it as the
	/// last search. Other motions need none.
	pub(super) fn prepare_search(&self, session: &mut Session, motion: &Motion) -> EditorResult<Option<SearchPlan>> {
		let (pattern, forward, smart_case, remember) = match motion {
			Motion::Search { pattern, forward } => {
				let pattern = if pattern.is_empty() {
					session.last_search().map(|last| last.pattern.clone()).ok_or(PatternError::Empty)?
				} else {
					pattern.clone()
				};
				(pattern, *forward, true, true)
			}
			Motion::SearchNext { reverse } => {
				let last = session.last_search().ok_or(PatternError::Empty)?;
				(last.pattern.clone(), last.forward != *reverse, true, false)
			}
			Motion::SearchWord { forward } => {
				let text = self.host.text();
				let (start, end) = word_under_cursor(text, self.carets.primary().offset()).ok_or(EditorError::MotionUnresolved)?;
				(format!("\\<{}\\>", text.slice(start..end)), *forward, false, true)
			}
			_ => return Ok(None),
		};
		let options = session.options();
		let regex = compile_pattern(&pattern, options.ignorecase, smart_case && options.smartcase)?;
		if remember {
			session.set_last_search(&pattern, forward);
		}
		Ok(Some(SearchPlan { regex, forward, pattern }))
	}

	/// Moves every caret by `motion`; nothing moves if any caret cannot.
	pub(super) fn move_carets(&mut self, session: &mut Session, motion: &Motion, count: Option<usize>) -> EditorResult<()> {
		if self.mode().is_select() {
			self.exit_visual();
		}
		let mode = self.mode();
		let plan = self.prepare_search(session, motion)?;
		remember_find(session, motion);

		let text = self.host.text();
		let env = MotionEnv {
			text,
			options: session.options(),
			last_find: session.last_find,
			search: plan.as_ref(),
			past_end: past_end(mode, motion),
			operator: false,
		};
		let jump_from = self.carets.offsets();
		let preferred: Vec<usize> = self.carets.iter().map(Caret::last_column).collect();
		if !self.carets.apply_motion(text, mode, |_, caret| target(&env, caret, motion, count)) {
			debug!(?motion, "motion failed");
			return Err(plan.map_or(EditorError::MotionUnresolved, |plan| plan.not_found()));
		}

		if motion.is_jump() {
			for (index, offset) in jump_from.into_iter().enumerate() {
				self.set_mark_at(index, '\'', offset);
			}
		}
		self.update_last_column(motion, &preferred);
		self.host.scroll_to_offset(self.carets.primary().offset());
		Ok(())
	}

	/// Keeps the preferred column across `j` and `k`, and makes `$` stick.
	fn update_last_column(&mut self, motion: &Motion, preferred: &[usize]) {
		let text = self.host.text();
		if motion.keeps_column() {
			for (index, column) in preferred.iter().enumerate() {
				if let Some(caret) = self.carets.get_mut(index) {
					caret.set_last_column(*column);
				}
			}
		} else if *motion == Motion::LineEnd {
			for index in 0..self.carets.len() {
				if let Some(caret) = self.carets.get_mut(index) {
					caret.set_last_column(LINE_END_COLUMN);
				}
			}
			if self.mode() == Mode::Visual(VisualKind::Block) {
				self.carets.set_block_to_line_end(text, true);
			}
		} else if self.carets.block().is_some_and(|block| block.to_line_end) && !matches!(motion, Motion::Up | Motion::Down) {
			self.carets.set_block_to_line_end(text, false);
		}
	}
}

#[cfg(test)]
mod tests {
	use ropey::Rope;
	use viper_input::WordType;

	use super::*;

	fn env<'a>(text: RopeSlice<'a>, options: &'a Options) -> MotionEnv<'a> {
		MotionEnv {
			text,
			options,
			last_find: None,
			search: None,
			past_end: false,
			operator: false,
		}
	}

	#[test]
	fn line_end_depends_on_mode() {
		let rope = Rope::from("abc\ndef\n");
		let options = Options::default();
		let mut env = env(rope.slice(..), &options);
		let caret = Caret::new(0);
		assert_eq!(target(&env, &caret, &Motion::LineEnd, None), Some(2));
		assert_eq!(target(&env, &caret, &Motion::LineEnd, Some(2)), Some(6));
		env.past_end = true;
		assert_eq!(target(&env, &caret, &Motion::LineEnd, None), Some(3));
		assert_eq!(target(&env, &caret, &Motion::LineEnd, Some(3)), None);
	}

	#[test]
	fn goto_line_honours_startofline() {
		let rope = Rope::from("a\n    b\nc\n");
		let mut options = Options::default();
		let caret = Caret::new(0);
		assert_eq!(target(&env(rope.slice(..), &options), &caret, &Motion::FirstLine, Some(2)), Some(6));
		assert_eq!(target(&env(rope.slice(..), &options), &caret, &Motion::LastLine, None), Some(8));
		options.startofline = false;
		assert_eq!(target(&env(rope.slice(..), &options), &caret, &Motion::FirstLine, Some(2)), Some(2));
	}

	#[test]
	fn percent_with_count_goes_to_a_line() {
		let rope = Rope::from("1\n2\n3\n4\n");
		let options = Options::default();
		let caret = Caret::new(0);
		let env = env(rope.slice(..), &options);
		assert_eq!(target(&env, &caret, &Motion::MatchPair, Some(50)), Some(2));
		assert_eq!(target(&env, &caret, &Motion::MatchPair, Some(100)), Some(6));
		assert_eq!(target(&env, &caret, &Motion::MatchPair, Some(101)), None);
	}

	#[test]
	fn repeat_find_flips_direction() {
		let rope = Rope::from("a,b,c,d");
		let options = Options::default();
		let mut env = env(rope.slice(..), &options);
		env.last_find = Some(LastFind {
			target: ',',
			forward: true,
			till: false,
		});
		let caret = Caret::new(3);
		assert_eq!(target(&env, &caret, &Motion::RepeatFind { reverse: false }, None), Some(5));
		assert_eq!(target(&env, &caret, &Motion::RepeatFind { reverse: true }, None), Some(1));
	}

	#[test]
	fn words_take_counts() {
		let rope = Rope::from("one two three");
		let options = Options::default();
		let env = env(rope.slice(..), &options);
		let caret = Caret::new(0);
		assert_eq!(target(&env, &caret, &Motion::WordForward(WordType::Word), Some(2)), Some(8));
	}
}
