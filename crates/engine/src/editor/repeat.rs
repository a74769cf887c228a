//! Dot-repeat, macros and `:normal`.
//!
//! `.` replays a [`RepeatRecord`]: the last buffer-changing command, the
//! text typed if it opened insert mode, and the size of the selection if it
//! was a visual operator. Macros and `:normal` replay keys through the same
//! path typed keys take, bounded by [`MAX_REPLAY_DEPTH`].

use tracing::debug;
use viper_input::{Action, Command};
use viper_primitives::rope::{column_of, last_char_offset, line_count, line_of, line_start, offset_at_column};
use viper_primitives::{Key, Mode, VisualKind, parse_keys};

use super::{Editor, MAX_REPLAY_DEPTH};
use crate::error::{EditorError, EditorResult};
use crate::host::EditorHost;
use crate::session::Session;

/// Size of the selection a visual command acted on, replayed from the
/// caret by `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct VisualExtent {
	kind: VisualKind,
	/// Lines below the first.
	lines: usize,
	/// Width of a one-line or block selection, else the last line's column
	/// plus one.
	columns: usize,
	to_line_end: bool,
}

/// What `.` repeats.
#[derive(Debug, Clone)]
pub(crate) struct RepeatRecord {
	command: Command,
	/// Text typed after the command opened insert mode.
	pub(super) inserted: Option<String>,
	visual: Option<VisualExtent>,
}

impl<H: EditorHost> Editor<H> {
	/// The selection size a visual command is about to consume.
	pub(super) fn visual_extent_for(&self, action: &Action) -> Option<VisualExtent> {
		let kind = self.mode().visual_kind()?;
		if !action.is_repeatable() {
			return None;
		}
		let text = self.host.text();
		if let Some(block) = self.carets.block() {
			let (spans, left, right) = block.spans(text);
			return Some(VisualExtent {
				kind,
				lines: spans.len() - 1,
				columns: right.map_or(0, |right| right - left),
				to_line_end: block.to_line_end,
			});
		}
		let caret = self.carets.primary();
		let (start, end) = (caret.anchor().min(caret.offset()), caret.anchor().max(caret.offset()));
		let lines = line_of(text, end) - line_of(text, start);
		Some(VisualExtent {
			kind,
			lines,
			columns: if lines == 0 { end - start + 1 } else { column_of(text, end) + 1 },
			to_line_end: false,
		})
	}

	/// Keeps `command` for `.` if it changed the buffer. A command that
	/// opened insert mode is kept on the insert session until `<Esc>`.
	pub(super) fn remember_change(&mut self, command: Command, visual: Option<VisualExtent>, opened_insert: bool) {
		if self.repeating || !command.action.is_repeatable() {
			return;
		}
		let record = RepeatRecord {
			command,
			inserted: None,
			visual,
		};
		match self.insert.as_mut() {
			Some(insert) if opened_insert => insert.repeat = Some(record),
			_ => self.repeat = Some(record),
		}
	}

	/// `.`: a new count replaces the recorded one, and `"1p` steps through
	/// the numbered registers.
	pub(super) fn repeat_last(&mut self, session: &mut Session, count: Option<usize>) -> EditorResult<()> {
		let mut record = self.repeat.clone().ok_or(EditorError::MotionUnresolved)?;
		if let Some(count) = count {
			record.command.count = Some(count);
			if let Action::Operate { motion_count, .. } = &mut record.command.action {
				*motion_count = None;
			}
		}
		if let Action::Put { .. } = record.command.action
			&& let Some(register) = record.command.register
			&& ('1'..'9').contains(&register)
		{
			record.command.register = char::from_digit(register.to_digit(10).unwrap_or(0) + 1, 10);
		}
		self.repeat = Some(record.clone());
		debug!(action = ?record.command.action, count = ?record.command.count, "repeat");

		if let Some(extent) = record.visual {
			self.select_extent(extent);
		}
		let was_repeating = std::mem::replace(&mut self.repeating, true);
		let result = self.replay_record(session, &record);
		self.repeating = was_repeating;
		result
	}

	fn replay_record(&mut self, session: &mut Session, record: &RepeatRecord) -> EditorResult<()> {
		self.execute(session, record.command.clone())?;
		if self.insert.is_some() {
			if let Some(text) = &record.inserted {
				self.insert_text(text)?;
			}
			self.exit_insert(session)?;
		}
		Ok(())
	}

	/// Selects a selection of the recorded size starting at the primary caret.
	fn select_extent(&mut self, extent: VisualExtent) {
		let text = self.host.text();
		let pos = self.caret();
		let line = line_of(text, pos);
		let last = (line + extent.lines).min(line_count(text) - 1);
		let head = match extent.kind {
			VisualKind::Line => line_start(text, last),
			VisualKind::Char if extent.lines == 0 => (pos + extent.columns.saturating_sub(1)).min(last_char_offset(text, line)),
			VisualKind::Char => offset_at_column(text, last, extent.columns.saturating_sub(1), false),
			VisualKind::Block => offset_at_column(text, last, column_of(text, pos) + extent.columns.saturating_sub(1), false),
		};
		self.carets.restore_selection(text, extent.kind, pos, head);
		if extent.to_line_end {
			self.carets.set_block_to_line_end(text, true);
		}
		self.input.set_mode(Mode::Visual(extent.kind));
	}

	/// `@{reg}`, `count` times. The whole replay is one undo step.
	pub(super) fn play_macro(&mut self, session: &mut Session, name: char, count: usize) -> EditorResult<()> {
		if self.replay_depth >= MAX_REPLAY_DEPTH {
			return Err(EditorError::TooRecursive);
		}
		let keys = session.registers.macro_keys(name)?;
		debug!(register = %name, keys = keys.len(), count, "play macro");
		for _ in 0..count {
			self.replay_keys(session, &keys)?;
		}
		Ok(())
	}

	/// Feeds keys as if typed, stopping at the first failing command.
	fn replay_keys(&mut self, session: &mut Session, keys: &[Key]) -> EditorResult<()> {
		self.replay_depth += 1;
		let result = keys.iter().try_for_each(|&key| self.handle_key(session, key).map(drop));
		self.replay_depth -= 1;
		result
	}

	/// `:normal {keys}`, once at the caret or once per line of `lines`
	/// from its first column. Whatever mode the keys leave open is closed
	/// with `<Esc>`.
	pub(super) fn run_normal(&mut self, session: &mut Session, keys: &str, lines: Option<(usize, usize)>) -> EditorResult<()> {
		if self.replay_depth >= MAX_REPLAY_DEPTH {
			return Err(EditorError::TooRecursive);
		}
		let keys = parse_keys(keys);
		let Some((first, last)) = lines else {
			return self.normal_once(session, &keys);
		};
		let mut result = Ok(());
		for line in first..=last {
			let text = self.host.text();
			if line >= line_count(text) {
				break;
			}
			self.carets.collapse();
			self.place_caret(0, line_start(text, line));
			if let Err(err) = self.normal_once(session, &keys) {
				debug!(line, %err, "normal failed on line");
				result = Err(err);
			}
		}
		debug!(first, last, "normal over lines");
		result
	}

	fn normal_once(&mut self, session: &mut Session, keys: &[Key]) -> EditorResult<()> {
		let result = self.replay_keys(session, keys);
		for _ in 0..2 {
			if self.mode() == Mode::Normal {
				break;
			}
			self.replay_keys(session, &[Key::ESC])?;
		}
		result
	}
}
