//! Insert and replace mode.
//!
//! An insert session lives from the command that opens insert mode until
//! `<Esc>`. Everything typed in between lands in the open host transaction,
//! so the whole insert is one undo step, and the typed text is kept for `.`
//! and the `.` register.

use smallvec::SmallVec;
use tracing::{debug, trace};
use viper_input::movement::prev_word_start;
use viper_input::{InsertEntry, Motion, WordType};
use viper_primitives::rope::{first_non_blank, indent_of, line_end, line_len, line_of, line_start, offset_at_column};
use viper_primitives::{CharIdx, Mode, Operator, VisualKind};

use super::Editor;
use super::operators::OperatorArgs;
use super::repeat::RepeatRecord;
use crate::caret::Caret;
use crate::error::{EditorError, EditorResult};
use crate::host::EditorHost;
use crate::session::Session;
use crate::text::{build_indent, indent_width, shifted_width};

/// State of the insert in progress.
#[derive(Debug)]
pub(super) struct InsertSession {
	/// How many times the typed text goes in (`3ix<Esc>`).
	count: usize,
	entry: Option<InsertEntry>,
	/// Text typed since the insert started or the caret last moved.
	typed: String,
	/// Characters replace mode overwrote, per caret, for `<BS>`.
	/// `None` marks a character that was appended rather than overwritten.
	replaced: Vec<Vec<Option<char>>>,
	/// Started on a block; `<Esc>` collapses to one caret.
	block: bool,
	/// The command that opened the insert, finished with the typed text on
	/// `<Esc>`.
	pub(super) repeat: Option<RepeatRecord>,
}

impl<H: EditorHost> Editor<H> {
	/// Enters insert or replace mode at the current carets.
	pub(super) fn start_insert(&mut self, mode: Mode, count: usize, entry: Option<InsertEntry>, block: bool) {
		self.input.set_mode(mode);
		for index in 0..self.carets.len() {
			if let Some(caret) = self.carets.get_mut(index) {
				let offset = caret.offset();
				caret.set_insert_start(Some(offset));
			}
		}
		debug!(mode = mode.as_str(), count, ?entry, block, "insert started");
		self.insert = Some(InsertSession {
			count,
			entry,
			typed: String::new(),
			replaced: vec![Vec::new(); self.carets.len()],
			block,
			repeat: None,
		});
	}

	/// Replaces the caret set with one caret per offset, the first primary.
	pub(super) fn set_carets(&mut self, offsets: &[CharIdx]) {
		self.carets.collapse();
		if let Some((first, rest)) = offsets.split_first() {
			self.place_caret(0, *first);
			for offset in rest {
				self.carets.add(self.host.text(), *offset);
			}
		}
	}

	/// `i`, `a`, `I`, `gI`, `A`, `o` and `O`.
	pub(super) fn begin_insert(&mut self, entry: InsertEntry, count: usize) -> EditorResult<()> {
		match entry {
			InsertEntry::OpenBelow | InsertEntry::OpenAbove => {
				for index in self.carets.bottom_up() {
					let doc = self.host.text();
					let line = line_of(doc, self.carets.get(index).map_or(0, Caret::offset));
					if entry == InsertEntry::OpenBelow {
						let at = line_end(doc, line);
						self.edit(at, at, "\n");
						self.place_caret(index, at + 1);
					} else {
						let at = line_start(doc, line);
						self.edit(at, at, "\n");
						self.place_caret(index, at);
					}
				}
			}
			_ => {
				let text = self.host.text();
				self.carets.apply_motion(text, Mode::Insert, |_, caret| {
					let pos = caret.offset();
					let line = line_of(text, pos);
					Some(match entry {
						InsertEntry::After => (pos + 1).min(line_end(text, line)),
						InsertEntry::LineStart => first_non_blank(text, line),
						InsertEntry::LineColumnZero => line_start(text, line),
						InsertEntry::LineEnd => line_end(text, line),
						_ => pos,
					})
				});
			}
		}
		self.start_insert(Mode::Insert, count, Some(entry), false);
		Ok(())
	}

	/// `I` and `A` on a selection. On a block every line gets a caret; `A`
	/// pads short lines out to the block's right edge.
	pub(super) fn block_insert(&mut self, append: bool) -> EditorResult<()> {
		let kind = self.mode().visual_kind().ok_or(EditorError::MotionUnresolved)?;
		let Some(block) = self.carets.block() else {
			let ranges = self.visual_ranges(kind, false);
			let (_, range) = ranges.first().cloned().ok_or(EditorError::MotionUnresolved)?;
			let text = self.host.text();
			let at = match (append, kind) {
				(true, VisualKind::Line) => line_end(text, line_of(text, range.end().saturating_sub(1))),
				(true, _) => range.end(),
				(false, _) => range.start(),
			};
			self.exit_visual();
			self.set_carets(&[at]);
			self.start_insert(Mode::Insert, 1, None, false);
			return Ok(());
		};

		let text = self.host.text();
		let (spans, left, right) = block.spans(text);
		let top = line_of(text, block.anchor.min(block.head));
		// (line, column to insert at, or `None` for the line end)
		let mut rows: SmallVec<[(usize, Option<usize>); 4]> = SmallVec::new();
		for line in top..top + spans.len() {
			match (append, right) {
				(true, None) => rows.push((line, None)),
				(true, Some(right)) => rows.push((line, Some(right))),
				(false, _) if line_len(text, line) >= left => rows.push((line, Some(left))),
				(false, _) => {}
			}
		}
		if rows.is_empty() {
			return Err(EditorError::MotionUnresolved);
		}
		self.exit_visual();

		for &(line, column) in rows.iter().rev() {
			let doc = self.host.text();
			let len = line_len(doc, line);
			if let Some(column) = column
				&& len < column
			{
				let end = line_end(doc, line);
				self.edit(end, end, &" ".repeat(column - len));
			}
		}
		let doc = self.host.text();
		let offsets: SmallVec<[CharIdx; 4]> = rows
			.iter()
			.map(|&(line, column)| column.map_or_else(|| line_end(doc, line), |column| offset_at_column(doc, line, column, true)))
			.collect();
		trace!(carets = offsets.len(), append, "block insert");
		self.set_carets(&offsets);
		self.start_insert(Mode::Insert, 1, None, true);
		Ok(())
	}

	/// Types `typed` at every caret. Replace mode overwrites up to the line
	/// end; line breaks are always inserted.
	pub(super) fn insert_text(&mut self, typed: &str) -> EditorResult<()> {
		if typed.is_empty() {
			return Ok(());
		}
		let replace = self.mode() == Mode::Replace;
		let inserted = typed.chars().count();
		for index in self.carets.bottom_up() {
			let pos = self.carets.get(index).map_or(0, Caret::offset);
			let mut end = pos;
			if replace {
				let doc = self.host.text();
				let limit = line_end(doc, line_of(doc, pos));
				let mut overwritten = Vec::with_capacity(inserted);
				let mut same_line = true;
				for c in typed.chars() {
					same_line &= c != '\n';
					if same_line && end < limit {
						overwritten.push(Some(doc.char(end)));
						end += 1;
					} else {
						overwritten.push(None);
					}
				}
				if let Some(insert) = self.insert.as_mut()
					&& let Some(slot) = insert.replaced.get_mut(index)
				{
					slot.extend(overwritten);
				}
			}
			self.edit(pos, end, typed);
			self.place_caret(index, pos + inserted);
		}
		if let Some(insert) = self.insert.as_mut() {
			insert.typed.push_str(typed);
		}
		Ok(())
	}

	/// `<Tab>`: a tab, or spaces to the next tab stop with `expandtab`.
	pub(super) fn insert_tab(&mut self, session: &Session) -> EditorResult<()> {
		let options = session.options();
		if !options.expandtab {
			return self.insert_text("\t");
		}
		let doc = self.host.text();
		let pos = self.caret();
		let before = doc.slice(line_start(doc, line_of(doc, pos))..pos).to_string();
		let tabstop = options.tabstop.max(1);
		let spaces = tabstop - indent_width(&before, tabstop) % tabstop;
		self.insert_text(&" ".repeat(spaces))
	}

	/// `<BS>`. In replace mode the overwritten character comes back.
	pub(super) fn insert_backspace(&mut self) -> EditorResult<()> {
		let replace = self.mode() == Mode::Replace;
		for index in self.carets.bottom_up() {
			let pos = self.carets.get(index).map_or(0, Caret::offset);
			if pos == 0 {
				continue;
			}
			if !replace {
				self.edit(pos - 1, pos, "");
				continue;
			}
			let restored = self.insert.as_mut().and_then(|insert| insert.replaced.get_mut(index)).and_then(Vec::pop);
			match restored {
				Some(Some(original)) => self.edit(pos - 1, pos, &original.to_string()),
				Some(None) => self.edit(pos - 1, pos, ""),
				None => {}
			}
			self.place_caret(index, pos - 1);
		}
		self.forget_typed(1);
		Ok(())
	}

	/// `<Del>`: removes the character under every caret, joining lines at
	/// the line end.
	pub(super) fn insert_delete(&mut self) -> EditorResult<()> {
		for index in self.carets.bottom_up() {
			let pos = self.carets.get(index).map_or(0, Caret::offset);
			if pos < self.host.len_chars() {
				self.edit(pos, pos + 1, "");
			}
		}
		Ok(())
	}

	/// `<C-W>`: deletes the word before each caret, stopping first where the
	/// insert started.
	pub(super) fn delete_word_before(&mut self) -> EditorResult<()> {
		let mut removed = 0;
		for index in self.carets.bottom_up() {
			let Some(caret) = self.carets.get(index) else {
				continue;
			};
			let (pos, insert_start) = (caret.offset(), caret.insert_start());
			if pos == 0 {
				continue;
			}
			let doc = self.host.text();
			let line_begin = line_start(doc, line_of(doc, pos));
			let mut from = if pos == line_begin {
				pos - 1
			} else {
				prev_word_start(doc, pos, 1, WordType::Word).unwrap_or(line_begin).max(line_begin)
			};
			if let Some(start) = insert_start
				&& start < pos
				&& from < start
			{
				from = start;
			}
			removed = removed.max(pos - from);
			self.edit(from, pos, "");
		}
		self.forget_typed(removed);
		Ok(())
	}

	/// `<C-U>`: deletes what was typed on this line, or back to the line
	/// start when nothing was.
	pub(super) fn delete_line_before(&mut self) -> EditorResult<()> {
		let mut removed = 0;
		for index in self.carets.bottom_up() {
			let Some(caret) = self.carets.get(index) else {
				continue;
			};
			let (pos, insert_start) = (caret.offset(), caret.insert_start());
			let doc = self.host.text();
			let line_begin = line_start(doc, line_of(doc, pos));
			let from = match insert_start {
				Some(start) if start < pos && start >= line_begin => start,
				_ => line_begin,
			};
			removed = removed.max(pos - from);
			self.edit(from, pos, "");
		}
		self.forget_typed(removed);
		Ok(())
	}

	/// `<C-T>` and `<C-D>`: shifts the caret's line by one `shiftwidth`,
	/// keeping the caret on its character.
	pub(super) fn shift_current_line(&mut self, session: &Session, right: bool) -> EditorResult<()> {
		let options = session.options();
		let (shiftwidth, tabstop, expandtab) = (options.shift_width(), options.tabstop, options.expandtab);
		let mut seen: SmallVec<[usize; 4]> = SmallVec::new();
		for index in self.carets.bottom_up() {
			let doc = self.host.text();
			let pos = self.carets.get(index).map_or(0, Caret::offset);
			let line = line_of(doc, pos);
			if seen.contains(&line) {
				continue;
			}
			seen.push(line);
			let indent = indent_of(doc, line);
			let old_len = indent.chars().count();
			let width = shifted_width(indent_width(&indent, tabstop), shiftwidth, 1, right, true);
			let new_indent = build_indent(width, expandtab, tabstop);
			let start = line_start(doc, line);
			self.edit(start, start + old_len, &new_indent);
			if pos < start + old_len {
				self.place_caret(index, start + new_indent.chars().count());
			}
		}
		Ok(())
	}

	/// `<C-R>{reg}` in insert mode and on the command line.
	pub(super) fn insert_register(&mut self, session: &mut Session, name: char) -> EditorResult<()> {
		if let Mode::CommandLine(_) = self.mode() {
			let text = self.read_register(session, 0, name).map(|register| register.text).unwrap_or_default();
			self.input.insert_cmdline_text(text.trim_end_matches('\n'));
			return self.cmdline_changed(session);
		}
		let register = self.read_register(session, 0, name).ok_or(EditorError::MotionUnresolved)?;
		self.insert_text(&register.text)
	}

	/// Arrow keys while inserting: the caret moves and typing starts over.
	pub(super) fn insert_move(&mut self, session: &mut Session, motion: &Motion) -> EditorResult<()> {
		self.move_carets(session, motion, None)?;
		for index in 0..self.carets.len() {
			if let Some(caret) = self.carets.get_mut(index) {
				let offset = caret.offset();
				caret.set_insert_start(Some(offset));
			}
		}
		if let Some(insert) = self.insert.as_mut() {
			insert.typed.clear();
			insert.replaced.iter_mut().for_each(Vec::clear);
		}
		Ok(())
	}

	/// `<Esc>` out of insert or replace mode.
	pub(super) fn exit_insert(&mut self, session: &mut Session) -> EditorResult<()> {
		let Some(insert) = self.insert.take() else {
			self.input.set_mode(Mode::Normal);
			return Ok(());
		};
		if insert.count > 1 && !insert.typed.is_empty() {
			let piece = match insert.entry {
				Some(InsertEntry::OpenBelow | InsertEntry::OpenAbove) => format!("\n{}", insert.typed),
				_ => insert.typed.clone(),
			};
			self.insert_text(&piece.repeat(insert.count - 1))?;
		}
		session.registers.set_last_inserted(&insert.typed);

		for index in 0..self.carets.len() {
			let Some(caret) = self.carets.get(index) else {
				continue;
			};
			let (pos, start) = (caret.offset(), caret.insert_start().unwrap_or(caret.offset()));
			self.set_mark_at(index, '^', pos);
			self.set_mark_at(index, '[', start.min(pos));
			self.set_mark_at(index, ']', pos.saturating_sub(1).max(start.min(pos)));
			self.set_mark_at(index, '.', pos.saturating_sub(1).max(start.min(pos)));
		}

		self.input.set_mode(Mode::Normal);
		for index in 0..self.carets.len() {
			let Some(caret) = self.carets.get_mut(index) else {
				continue;
			};
			caret.set_insert_start(None);
			let pos = caret.offset();
			let doc = self.host.text();
			if pos > line_start(doc, line_of(doc, pos)) {
				self.place_caret(index, pos - 1);
			}
		}
		if insert.block {
			self.carets.collapse();
		}
		self.host.commit_transaction();

		if let Some(mut record) = insert.repeat {
			record.inserted = Some(insert.typed);
			self.repeat = Some(record);
		}
		debug!("insert finished");
		Ok(())
	}

	/// Typing over a select-mode selection replaces it.
	pub(super) fn select_replace(&mut self, session: &mut Session, c: char) -> EditorResult<()> {
		self.change_selection(session, Operator::Change)?;
		self.insert_text(&c.to_string())
	}

	/// `<BS>` on a select-mode selection deletes it.
	pub(super) fn select_delete(&mut self, session: &mut Session) -> EditorResult<()> {
		self.change_selection(session, Operator::Delete)?;
		self.input.set_mode(Mode::Normal);
		Ok(())
	}

	fn change_selection(&mut self, session: &mut Session, operator: Operator) -> EditorResult<()> {
		let kind = self.mode().visual_kind().ok_or(EditorError::MotionUnresolved)?;
		let ranges = self.visual_ranges(kind, false);
		self.leave_visual();
		self.input.set_mode(Mode::Normal);
		self.apply_operator(
			session,
			OperatorArgs {
				operator,
				ranges,
				register: None,
				amount: 1,
				visual: true,
			},
		)
	}

	/// Drops the last `count` typed characters after a deletion.
	fn forget_typed(&mut self, count: usize) {
		if let Some(insert) = self.insert.as_mut() {
			for _ in 0..count {
				if insert.typed.pop().is_none() {
					break;
				}
			}
		}
	}
}
