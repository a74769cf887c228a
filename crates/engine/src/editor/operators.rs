//! Operators and their dispatch table.
//!
//! Every [`Operator`] maps to one handler through [`handler`]; adding an
//! operator means adding a variant and a match arm. Handlers get the ranges
//! already resolved per caret and apply them bottom-up, so an edit never
//! moves a range that is still waiting.

use ropey::RopeSlice;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::debug;
use viper_input::OperatorTarget;
use viper_primitives::rope::{column_of, first_non_blank, indent_of, is_empty_line, line_end, line_of, line_start, offset_at_column};
use viper_primitives::{CharIdx, Mode, Operator, SelectionType, TextRange};

use super::range::{CaretRanges, combined_count};
use super::{Editor, check_register};
use crate::caret::Caret;
use crate::error::EditorResult;
use crate::host::EditorHost;
use crate::session::Session;
use crate::text::{build_indent, build_whitespace, case_conversion, indent_width, shifted_width};

/// An operator with everything it acts on.
#[derive(Debug)]
pub(super) struct OperatorArgs {
	pub(super) operator: Operator,
	pub(super) ranges: CaretRanges,
	pub(super) register: Option<char>,
	/// How many times `>` and `<` shift.
	pub(super) amount: usize,
	/// The ranges came from a visual selection.
	pub(super) visual: bool,
}

type OperatorFn<H> = fn(&mut Editor<H>, &mut Session, &OperatorArgs) -> EditorResult<()>;

fn handler<H: EditorHost>(operator: Operator) -> OperatorFn<H> {
	match operator {
		Operator::Delete => Editor::op_delete,
		Operator::Change => Editor::op_change,
		Operator::Yank => Editor::op_yank,
		Operator::ShiftRight | Operator::ShiftLeft => Editor::op_shift,
		Operator::ToggleCase | Operator::Lowercase | Operator::Uppercase => Editor::op_case,
	}
}

/// Ranges ordered bottom-up.
fn bottom_up(ranges: &CaretRanges) -> SmallVec<[&(usize, TextRange); 1]> {
	let mut ordered: SmallVec<[&(usize, TextRange); 1]> = ranges.iter().collect();
	ordered.sort_by_key(|(_, range)| std::cmp::Reverse(range.start()));
	ordered
}

/// Register text of a range: block lines joined by newlines, whole lines
/// always newline-terminated.
pub(super) fn range_text(text: RopeSlice, range: &TextRange) -> String {
	let len = text.len_chars();
	let slice = |start: usize, end: usize| text.slice(start.min(len)..end.min(len)).to_string();
	match range.kind() {
		SelectionType::BlockWise => range.spans().iter().map(|span| slice(span.start, span.end)).collect::<Vec<_>>().join("\n"),
		SelectionType::LineWise => {
			let mut lines = slice(range.start(), range.end());
			if !lines.ends_with('\n') {
				lines.push('\n');
			}
			lines
		}
		SelectionType::CharacterWise => slice(range.start(), range.end()),
	}
}

pub(super) fn plural(count: usize, word: &str) -> String {
	if count == 1 { format!("1 {word}") } else { format!("{count} {word}s") }
}

impl<H: EditorHost> Editor<H> {
	/// Runs `operator` on `target` at every caret.
	pub(super) fn operate(
		&mut self,
		session: &mut Session,
		operator: Operator,
		target: &OperatorTarget,
		count: Option<usize>,
		motion_count: Option<usize>,
		register: Option<char>,
	) -> EditorResult<()> {
		if operator.writes_register() {
			check_register(session, register)?;
		}
		let ranges = self.operator_ranges(session, operator, target, combined_count(count, motion_count))?;
		self.apply_operator(
			session,
			OperatorArgs {
				operator,
				ranges,
				register,
				amount: 1,
				visual: false,
			},
		)
	}

	pub(super) fn apply_operator(&mut self, session: &mut Session, args: OperatorArgs) -> EditorResult<()> {
		debug!(operator = ?args.operator, ranges = args.ranges.len(), visual = args.visual, "apply operator");
		handler::<H>(args.operator)(self, session, &args)
	}

	/// Removes a range from the buffer and returns where it was.
	///
	/// Deleting the last lines of a text without a final newline also takes
	/// the newline before them.
	fn remove_range(&mut self, range: &TextRange) -> CharIdx {
		match range.kind() {
			SelectionType::BlockWise => {
				for span in range.spans().iter().rev() {
					self.edit(span.start, span.end, "");
				}
				range.start()
			}
			SelectionType::LineWise => {
				let text = self.host.text();
				let len = text.len_chars();
				let (mut start, end) = (range.start(), range.end().min(len));
				let unterminated = end == len && (start == end || text.char(end - 1) != '\n');
				if unterminated && start > 0 {
					start -= 1;
				}
				self.edit(start, end, "");
				start
			}
			SelectionType::CharacterWise => {
				self.edit(range.start(), range.end(), "");
				range.start()
			}
		}
	}

	fn op_delete(&mut self, session: &mut Session, args: &OperatorArgs) -> EditorResult<()> {
		let mut removed_lines = 0;
		let mut floor = usize::MAX;
		for (index, range) in bottom_up(&args.ranges) {
			if range.end() > floor || (range.kind() == SelectionType::CharacterWise && range.is_empty()) {
				continue;
			}
			floor = range.start();
			let text = range_text(self.host.text(), range);
			if range.kind() == SelectionType::LineWise {
				removed_lines += text.matches('\n').count();
			}
			self.store_register(session, *index, args.register, &text, range.kind(), true);
			let at = self.remove_range(range);
			let doc = self.host.text();
			let caret = match range.kind() {
				SelectionType::LineWise => first_non_blank(doc, line_of(doc, at)),
				_ => at,
			};
			self.place_caret(*index, caret);
			self.mark_change(*index, at, at);
		}
		if removed_lines > 2 {
			self.message(format!("{removed_lines} fewer lines"));
		}
		Ok(())
	}

	fn op_change(&mut self, session: &mut Session, args: &OperatorArgs) -> EditorResult<()> {
		let mut block_lines: Option<(SmallVec<[usize; 4]>, usize)> = None;
		let mut floor = usize::MAX;
		for (index, range) in bottom_up(&args.ranges) {
			if range.end() > floor {
				continue;
			}
			floor = range.start();
			let doc = self.host.text();
			let text = range_text(doc, range);
			if !range.is_empty() {
				self.store_register(session, *index, args.register, &text, range.kind(), true);
			}
			let at = match range.kind() {
				SelectionType::LineWise => {
					let doc = self.host.text();
					let end = range.end().min(doc.len_chars());
					let keep_newline = end > range.start() && doc.char(end - 1) == '\n';
					self.edit(range.start(), if keep_newline { end - 1 } else { end }, "");
					range.start()
				}
				SelectionType::BlockWise => {
					block_lines = Some(block_rows(self.host.text(), range));
					self.remove_range(range)
				}
				SelectionType::CharacterWise => self.remove_range(range),
			};
			self.place_caret(*index, at);
			self.mark_change(*index, at, at);
		}

		let block = block_lines.is_some();
		if let Some((lines, left)) = block_lines {
			let doc = self.host.text();
			let offsets: SmallVec<[CharIdx; 4]> = lines.iter().map(|&line| offset_at_column(doc, line, left, true)).collect();
			self.set_carets(&offsets);
		}
		self.start_insert(Mode::Insert, 1, None, block);
		Ok(())
	}

	fn op_yank(&mut self, session: &mut Session, args: &OperatorArgs) -> EditorResult<()> {
		let mut yanked_lines = 0;
		let mut block = false;
		for (index, range) in &args.ranges {
			let text = range_text(self.host.text(), range);
			if range.kind() == SelectionType::CharacterWise && text.is_empty() {
				continue;
			}
			match range.kind() {
				SelectionType::LineWise => yanked_lines += text.matches('\n').count(),
				SelectionType::BlockWise => {
					block = true;
					yanked_lines += range.spans().len();
				}
				SelectionType::CharacterWise => {}
			}
			self.store_register(session, *index, args.register, &text, range.kind(), false);

			let doc = self.host.text();
			let caret = self.carets.get(*index).map_or(0, Caret::offset);
			let target = match range.kind() {
				SelectionType::LineWise => {
					let line = line_of(doc, range.start());
					if line < line_of(doc, caret) { offset_at_column(doc, line, column_of(doc, caret), false) } else { caret }
				}
				_ => range.start(),
			};
			self.place_caret(*index, target);
			self.set_mark_at(*index, '[', range.start());
			self.set_mark_at(*index, ']', range.end().saturating_sub(1).max(range.start()));
		}
		if yanked_lines > 2 {
			let prefix = if block { "block of " } else { "" };
			self.message(format!("{prefix}{yanked_lines} lines yanked"));
		}
		Ok(())
	}

	fn op_shift(&mut self, session: &mut Session, args: &OperatorArgs) -> EditorResult<()> {
		let right = args.operator == Operator::ShiftRight;
		let options = session.options();
		let (shiftwidth, tabstop, expandtab, round) = (options.shift_width(), options.tabstop, options.expandtab, options.shiftround);
		let amount = args.amount.max(1);

		let mut lines: FxHashSet<usize> = FxHashSet::default();
		let mut block_cells: Vec<CharIdx> = Vec::new();
		let mut tops: SmallVec<[(usize, usize, usize); 1]> = SmallVec::new();
		for (index, range) in &args.ranges {
			let doc = self.host.text();
			let top = line_of(doc, range.start());
			let bottom = line_of(doc, range.end().saturating_sub(1).max(range.start()));
			tops.push((*index, top, bottom));
			if range.kind() == SelectionType::BlockWise {
				block_cells.extend(range.spans().iter().filter(|span| !span.is_empty()).map(|span| span.start));
			} else {
				lines.extend(top..=bottom);
			}
		}

		let shifted = lines.len() + block_cells.len();
		block_cells.sort_unstable_by(|a, b| b.cmp(a));
		let step = shiftwidth * amount;
		for cell in block_cells {
			let doc = self.host.text();
			let blank_run = (cell..line_end(doc, line_of(doc, cell))).take_while(|&i| matches!(doc.char(i), ' ' | '\t'));
			if right {
				// The blanks already at the cell are rebuilt together with the new ones.
				let run = blank_run.count();
				let begin = line_start(doc, line_of(doc, cell));
				let from = indent_width(&doc.slice(begin..cell).to_string(), tabstop);
				let to = indent_width(&doc.slice(begin..cell + run).to_string(), tabstop) + step;
				self.edit(cell, cell + run, &build_whitespace(from, to, expandtab, tabstop));
			} else {
				let blanks = blank_run.take(step).count();
				self.edit(cell, cell + blanks, "");
			}
		}

		let mut ordered: Vec<usize> = lines.into_iter().collect();
		ordered.sort_unstable_by(|a, b| b.cmp(a));
		for line in ordered {
			let doc = self.host.text();
			if is_empty_line(doc, line) {
				continue;
			}
			let indent = indent_of(doc, line);
			let width = shifted_width(indent_width(&indent, tabstop), shiftwidth, amount, right, round);
			let start = line_start(doc, line);
			self.edit(start, start + indent.chars().count(), &build_indent(width, expandtab, tabstop));
		}

		for (index, top, bottom) in tops {
			let doc = self.host.text();
			let (first, last) = (line_start(doc, top), line_start(doc, bottom));
			self.place_caret(index, first_non_blank(doc, top));
			self.mark_change(index, first, last);
		}
		if shifted > 2 {
			let sign = if right { '>' } else { '<' };
			self.message(format!("{} {sign}ed {}", plural(shifted, "line"), plural(amount, "time")));
		}
		Ok(())
	}

	fn op_case(&mut self, _session: &mut Session, args: &OperatorArgs) -> EditorResult<()> {
		let convert = case_conversion(args.operator);
		for (index, range) in bottom_up(&args.ranges) {
			for span in range.spans().iter().rev() {
				let original = self.host.text().slice(span.start..span.end).to_string();
				let converted = convert(&original);
				if converted != original {
					self.edit(span.start, span.end, &converted);
				}
			}
			if range.kind() != SelectionType::LineWise || args.visual {
				self.place_caret(*index, range.start());
			}
			self.mark_change(*index, range.start(), range.end().saturating_sub(1).max(range.start()));
		}
		Ok(())
	}
}

/// Lines of a block that reach its left column, and that column.
fn block_rows(text: RopeSlice, range: &TextRange) -> (SmallVec<[usize; 4]>, usize) {
	let left = range.spans().iter().map(|span| column_of(text, span.start)).max().unwrap_or(0);
	let mut lines: SmallVec<[usize; 4]> = range
		.spans()
		.iter()
		.filter(|span| !span.is_empty())
		.map(|span| line_of(text, span.start))
		.collect();
	if lines.is_empty() {
		lines.push(line_of(text, range.start()));
	}
	(lines, left)
}
