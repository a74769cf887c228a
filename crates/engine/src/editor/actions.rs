//! Direct actions: put, replace, case toggle, join, increment, marks, undo
//! and horizontal scrolling.

use smallvec::SmallVec;
use tracing::debug;
use viper_primitives::rope::{
	column_of, ends_with_newline, first_non_blank, line_count, line_end, line_end_with_newline, line_len, line_of, line_start, line_text,
};
use viper_primitives::{CharIdx, Mode, Operator, SelectionType, VisualKind};
use viper_registers::Register;

use super::Editor;
use super::operators::OperatorArgs;
use crate::caret::Caret;
use crate::error::{EditorError, EditorResult};
use crate::host::EditorHost;
use crate::session::Session;
use crate::text::{NumberEdit, increment_number, join_separator, toggle_case};

impl<H: EditorHost> Editor<H> {
	fn caret_offset(&self, index: usize) -> CharIdx {
		self.carets.get(index).map_or(0, Caret::offset)
	}

	/// `p`, `P`, `gp` and `gP`. Each caret puts its own copy of the register.
	pub(super) fn put(&mut self, session: &mut Session, register: Option<char>, count: usize, before: bool, cursor_after: bool) -> EditorResult<()> {
		let name = register.unwrap_or('"');
		let contents = (0..self.carets.len())
			.map(|index| self.read_register(session, index, name).ok_or(EditorError::EmptyRegister(name)))
			.collect::<EditorResult<SmallVec<[Register; 4]>>>()?;
		if let Some(kind) = self.mode().visual_kind() {
			return self.put_over_selection(session, kind, &contents, count, before);
		}
		for index in self.carets.bottom_up() {
			if let Some(contents) = contents.get(index) {
				self.put_register(index, contents, count, before, cursor_after);
			}
		}
		Ok(())
	}

	/// Visual `p` and `P`: the selection is replaced by the register. `p`
	/// keeps the replaced text in the unnamed register, `P` drops it.
	fn put_over_selection(&mut self, session: &mut Session, kind: VisualKind, contents: &[Register], count: usize, keep_register: bool) -> EditorResult<()> {
		let ranges = self.visual_ranges(kind, false);
		let len = self.host.len_chars();
		let shapes: SmallVec<[(usize, SelectionType, bool); 4]> = ranges
			.iter()
			.map(|(index, range)| (*index, range.kind(), range.end() >= len))
			.collect();
		self.leave_visual();
		self.input.set_mode(Mode::Normal);
		self.apply_operator(
			session,
			OperatorArgs {
				operator: Operator::Delete,
				ranges,
				register: keep_register.then_some('_'),
				amount: 1,
				visual: true,
			},
		)?;

		let mut order = shapes;
		order.sort_by_key(|(index, _, _)| std::cmp::Reverse(self.caret_offset(*index)));
		for (index, selection, at_end) in order {
			let Some(register) = contents.get(index) else {
				continue;
			};
			match (selection, register.kind) {
				(SelectionType::LineWise, SelectionType::LineWise) => {
					let before = !at_end || self.host.len_chars() == 0;
					self.put_register(index, register, count, before, false);
				}
				(SelectionType::LineWise, _) => {
					let mut lines = Register::new(register.name, register.text.clone(), SelectionType::LineWise);
					lines.text.push('\n');
					let before = !at_end || self.host.len_chars() == 0;
					self.put_register(index, &lines, count, before, false);
				}
				(_, SelectionType::LineWise) => {
					let at = self.caret_offset(index);
					let text = format!("\n{}", register.text.repeat(count));
					self.edit(at, at, &text);
					let doc = self.host.text();
					self.place_caret(index, first_non_blank(doc, line_of(doc, at + 1)));
					self.mark_change(index, at + 1, at + text.chars().count() - 1);
				}
				_ => self.put_register(index, register, count, true, false),
			}
		}
		Ok(())
	}

	/// Puts `register` once per `count` at caret `index`.
	pub(super) fn put_register(&mut self, index: usize, register: &Register, count: usize, before: bool, cursor_after: bool) {
		let doc = self.host.text();
		let pos = self.caret_offset(index);
		let line = line_of(doc, pos);
		match register.kind {
			SelectionType::CharacterWise => {
				let text = register.text.repeat(count);
				let at = if before { pos } else { (pos + 1).min(line_end(doc, line)) };
				let inserted = text.chars().count();
				if inserted == 0 {
					return;
				}
				self.edit(at, at, &text);
				let caret = if cursor_after {
					at + inserted
				} else if text.contains('\n') {
					at
				} else {
					at + inserted - 1
				};
				self.place_caret(index, caret);
				self.mark_change(index, at, at + inserted - 1);
			}
			SelectionType::LineWise => {
				let mut text = register.text.repeat(count);
				let at = if before { line_start(doc, line) } else { line_end_with_newline(doc, line) };
				let first = if at == doc.len_chars() && !ends_with_newline(doc) && !before {
					text.pop();
					text.insert(0, '\n');
					at + 1
				} else {
					at
				};
				self.edit(at, at, &text);
				let doc = self.host.text();
				let first_line = line_of(doc, first);
				let last_line = first_line + register.text.matches('\n').count().max(1) * count - 1;
				let caret = if cursor_after {
					line_end_with_newline(doc, last_line)
				} else {
					first_non_blank(doc, first_line)
				};
				let last_start = line_start(doc, last_line);
				self.place_caret(index, caret);
				self.mark_change(index, first, last_start);
			}
			SelectionType::BlockWise => self.put_block(index, register, count, before, cursor_after),
		}
	}

	/// A block register goes in column-aligned, one piece per line, adding
	/// lines at the end of the text when needed.
	fn put_block(&mut self, index: usize, register: &Register, count: usize, before: bool, cursor_after: bool) {
		let doc = self.host.text();
		let pos = self.caret_offset(index);
		let line = line_of(doc, pos);
		let column = column_of(doc, pos) + usize::from(!before && line_len(doc, line) > 0);
		let pieces: Vec<&str> = register.text.split('\n').collect();
		let width = pieces.iter().map(|piece| piece.chars().count()).max().unwrap_or(0);

		let missing = (line + pieces.len()).saturating_sub(line_count(doc));
		if missing > 0 {
			let end = doc.len_chars();
			// Without a final newline the first break only terminates the
			// last line.
			let breaks = if ends_with_newline(doc) { missing } else { missing + 1 };
			self.edit(end, end, &"\n".repeat(breaks));
		}

		let bottom = line + pieces.len() - 1;
		let mut bottom_end = 0;
		for (i, piece) in pieces.iter().enumerate().rev() {
			let doc = self.host.text();
			let target = line + i;
			let length = line_len(doc, target);
			let trailing = length > column;
			let padded = format!("{piece}{}", " ".repeat(width - piece.chars().count()));
			let mut text = " ".repeat(column.saturating_sub(length));
			text.push_str(&padded.repeat(count - 1));
			text.push_str(if trailing { &padded } else { piece });
			let at = line_start(doc, target) + column.min(length);
			self.edit(at, at, &text);
			if target == bottom {
				bottom_end = column.min(length) + text.chars().count();
			}
		}
		let doc = self.host.text();
		let last_end = line_start(doc, bottom) + bottom_end;
		let start = line_start(doc, line) + column.min(line_len(doc, line));
		self.place_caret(index, if cursor_after { last_end } else { start });
		self.mark_change(index, start, last_end.saturating_sub(1).max(start));
	}

	/// `r{char}`: replaces `count` characters, or every selected one.
	/// `r<CR>` replaces them with a single line break.
	pub(super) fn replace_char(&mut self, c: char, count: usize) -> EditorResult<()> {
		if let Some(kind) = self.mode().visual_kind() {
			let ranges = self.visual_ranges(kind, false);
			self.leave_visual();
			self.input.set_mode(Mode::Normal);
			let mut ordered = ranges;
			ordered.sort_by_key(|(_, range)| std::cmp::Reverse(range.start()));
			for (index, range) in ordered {
				for span in range.spans().iter().rev() {
					let original = self.host.text().slice(span.start..span.end).to_string();
					let replaced: String = original.chars().map(|ch| if ch == '\n' || c == '\n' { ch } else { c }).collect();
					self.edit(span.start, span.end, &replaced);
				}
				self.place_caret(index, range.start());
				self.mark_change(index, range.start(), range.end().saturating_sub(1).max(range.start()));
			}
			return Ok(());
		}

		let doc = self.host.text();
		if self.carets.iter().any(|caret| caret.offset() + count > line_end(doc, line_of(doc, caret.offset()))) {
			return Err(EditorError::MotionUnresolved);
		}
		for index in self.carets.bottom_up() {
			let pos = self.caret_offset(index);
			if c == '\n' {
				self.edit(pos, pos + count, "\n");
				self.place_caret(index, pos + 1);
				self.mark_change(index, pos, pos + 1);
			} else {
				self.edit(pos, pos + count, &c.to_string().repeat(count));
				self.place_caret(index, pos + count - 1);
				self.mark_change(index, pos, pos + count - 1);
			}
		}
		Ok(())
	}

	/// `~` in normal mode: toggles `count` characters and moves past them.
	pub(super) fn toggle_case_char(&mut self, count: usize) -> EditorResult<()> {
		for index in self.carets.bottom_up() {
			let doc = self.host.text();
			let pos = self.caret_offset(index);
			let end = (pos + count).min(line_end(doc, line_of(doc, pos)));
			if end <= pos {
				continue;
			}
			let original = doc.slice(pos..end).to_string();
			self.edit(pos, end, &toggle_case(&original));
			self.place_caret(index, end);
			self.mark_change(index, pos, end - 1);
		}
		Ok(())
	}

	/// Reverses each caret's line once, leaving the carets where they were.
	pub(super) fn reverse_line(&mut self) -> EditorResult<()> {
		let doc = self.host.text();
		let rows: SmallVec<[(usize, usize, CharIdx); 4]> = self
			.carets
			.bottom_up()
			.into_iter()
			.map(|index| {
				let pos = self.caret_offset(index);
				(index, line_of(doc, pos), pos)
			})
			.collect();
		let mut done = None;
		for (index, line, pos) in rows {
			if done != Some(line) {
				let doc = self.host.text();
				let (start, end) = (line_start(doc, line), line_end(doc, line));
				let reversed: String = doc.slice(start..end).chars().collect::<Vec<char>>().into_iter().rev().collect();
				self.edit(start, end, &reversed);
				self.mark_change(index, start, end.saturating_sub(1).max(start));
				done = Some(line);
			}
			self.place_caret(index, pos);
		}
		Ok(())
	}

	/// `J` and `gJ`: joins `count` lines (at least two), or the selected
	/// lines. `J` drops the next line's indent and puts a space between.
	pub(super) fn join(&mut self, spaces: bool, count: Option<usize>) -> EditorResult<()> {
		let doc = self.host.text();
		let last = line_count(doc) - 1;
		let mut jobs: SmallVec<[(usize, usize, usize); 4]> = SmallVec::new();
		if let Some(kind) = self.mode().visual_kind() {
			for (index, range) in self.visual_ranges(kind, true) {
				let top = line_of(doc, range.start());
				let bottom = line_of(doc, range.end().saturating_sub(1).max(range.start()));
				jobs.push((index, top, (bottom - top).max(1)));
			}
			self.leave_visual();
			self.input.set_mode(Mode::Normal);
		} else {
			let joins = count.unwrap_or(2).max(2) - 1;
			for (index, caret) in self.carets.iter().enumerate() {
				jobs.push((index, line_of(doc, caret.offset()), joins));
			}
		}
		if jobs.iter().any(|&(_, top, _)| top >= last) {
			return Err(EditorError::MotionUnresolved);
		}

		jobs.sort_by_key(|&(_, top, _)| std::cmp::Reverse(top));
		let mut floor = usize::MAX;
		for (index, top, joins) in jobs {
			if top == floor {
				continue;
			}
			floor = top;
			let joins = joins.min(last - top);
			let mut point = line_end(self.host.text(), top);
			for _ in 0..joins {
				let doc = self.host.text();
				let end = line_end(doc, top);
				let next = line_text(doc, top + 1);
				let indent = if spaces { next.chars().take_while(|c| matches!(c, ' ' | '\t')).count() } else { 0 };
				let rest: String = next.chars().skip(indent).collect();
				let left = line_text(doc, top);
				let separator = join_separator(&left, &rest, spaces);
				self.edit(end, end + 1 + indent, separator);
				point = end;
			}
			debug!(top, joins, spaces, "joined lines");
			self.place_caret(index, point);
			self.mark_change(index, line_start(self.host.text(), top), point);
		}
		Ok(())
	}

	/// `<C-A>` and `<C-X>`: adds `count` to the number at or after the caret.
	pub(super) fn increment(&mut self, count: usize, negate: bool) -> EditorResult<()> {
		let delta = i64::try_from(count).unwrap_or(i64::MAX);
		let delta = if negate { -delta } else { delta };
		let doc = self.host.text();
		let mut edits: SmallVec<[(usize, CharIdx, NumberEdit); 4]> = SmallVec::new();
		for (index, caret) in self.carets.iter().enumerate() {
			let line = line_of(doc, caret.offset());
			let number = increment_number(&line_text(doc, line), column_of(doc, caret.offset()), delta).ok_or(EditorError::MotionUnresolved)?;
			edits.push((index, line_start(doc, line), number));
		}
		edits.sort_by_key(|(_, start, number)| std::cmp::Reverse(start + number.start));
		for (index, start, number) in edits {
			let from = start + number.start;
			self.edit(from, start + number.end, &number.replacement);
			let last = from + number.replacement.chars().count() - 1;
			self.place_caret(index, last);
			self.mark_change(index, from, last);
		}
		Ok(())
	}

	/// `m{a-z}` and friends, at every caret.
	pub(super) fn set_mark(&mut self, name: char) -> EditorResult<()> {
		if !(name.is_ascii_lowercase() || matches!(name, '<' | '>' | '[' | ']' | '\'' | '`')) {
			return Err(EditorError::MotionUnresolved);
		}
		let name = if name == '`' { '\'' } else { name };
		for index in 0..self.carets.len() {
			self.set_mark_at(index, name, self.caret_offset(index));
		}
		Ok(())
	}

	pub(super) fn undo(&mut self, count: usize) -> EditorResult<()> {
		if !self.host.undo(count) {
			self.message("Already at oldest change");
			self.host.beep();
		}
		self.after_history();
		Ok(())
	}

	pub(super) fn redo(&mut self, count: usize) -> EditorResult<()> {
		if !self.host.redo(count) {
			self.message("Already at newest change");
			self.host.beep();
		}
		self.after_history();
		Ok(())
	}

	/// The host swapped the text under the carets; keep them inside it.
	fn after_history(&mut self) {
		if self.mode().visual_kind().is_some() {
			self.input.set_mode(Mode::Normal);
		}
		self.carets.clamp(self.host.text());
	}

	/// `zh` and `zl`.
	pub(super) fn scroll_columns(&mut self, right: bool, count: usize) -> EditorResult<()> {
		let columns = isize::try_from(count).unwrap_or(isize::MAX);
		if !self.host.scroll_columns(if right { columns } else { -columns }) {
			self.host.beep();
		}
		Ok(())
	}
}
