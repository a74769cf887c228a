//! The text editor the engine runs inside.

use ropey::{Rope, RopeSlice};
use tracing::trace;
use viper_primitives::CharIdx;
use viper_primitives::rope::{column_of, line_count, line_end, line_of, line_start, line_text};
use viper_script::HostCommand;

use crate::error::{EditorError, EditorResult};

/// What the engine needs from its host: text access, undo grouping, view
/// scrolling and the window/file commands it cannot run itself.
///
/// Offsets are char indices into [`text`](Self::text). Lines are 0-based
/// and counted the Vim way (a trailing newline ends the last line).
pub trait EditorHost {
	fn text(&self) -> RopeSlice<'_>;

	/// Replaces `start..end` with `text`.
	fn replace(&mut self, start: CharIdx, end: CharIdx, text: &str);

	/// Starts grouping edits into one undo step. Calls nest.
	fn begin_transaction(&mut self);

	fn commit_transaction(&mut self);

	/// Undoes `count` steps. Returns false when there was nothing to undo.
	fn undo(&mut self, count: usize) -> bool;

	fn redo(&mut self, count: usize) -> bool;

	/// Keeps `offset` visible.
	fn scroll_to_offset(&mut self, _offset: CharIdx) {}

	/// Scrolls the view sideways; negative is left. Returns false when the
	/// view cannot scroll.
	fn scroll_columns(&mut self, _columns: isize) -> bool {
		false
	}

	/// Runs `:quit`, `:write`, `:split` and friends.
	fn execute_host_command(&mut self, command: &HostCommand) -> EditorResult<()> {
		Err(EditorError::Unsupported(format!("{command:?}")))
	}

	fn file_name(&self) -> Option<&str> {
		None
	}

	fn beep(&mut self) {}

	fn len_chars(&self) -> usize {
		self.text().len_chars()
	}

	fn line_count(&self) -> usize {
		line_count(self.text())
	}

	fn line_of(&self, offset: CharIdx) -> usize {
		line_of(self.text(), offset)
	}

	fn line_start(&self, line: usize) -> CharIdx {
		line_start(self.text(), line)
	}

	fn line_end(&self, line: usize) -> CharIdx {
		line_end(self.text(), line)
	}

	fn line_text(&self, line: usize) -> String {
		line_text(self.text(), line)
	}

	/// `(line, column)` of an offset.
	fn position(&self, offset: CharIdx) -> (usize, usize) {
		let text = self.text();
		(line_of(text, offset), column_of(text, offset))
	}

	/// Offset of `column` on `line`, clamped to the line end.
	fn offset_of(&self, line: usize, column: usize) -> CharIdx {
		let text = self.text();
		line_start(text, line).saturating_add(column).min(line_end(text, line))
	}
}

/// Largest number of undo steps [`MemoryBuffer`] keeps.
pub const MAX_UNDO: usize = 100;

/// An in-memory host: a rope with snapshot undo.
///
/// Records what a real editor would act on (bells, host commands, scroll
/// requests) so callers can inspect it.
#[derive(Debug, Default)]
pub struct MemoryBuffer {
	text: Rope,
	undo: Vec<Rope>,
	redo: Vec<Rope>,
	depth: usize,
	/// A snapshot was taken for the open transaction.
	snapshotted: bool,
	file_name: Option<String>,
	pub beeps: usize,
	pub host_commands: Vec<HostCommand>,
	pub scrolled_to: Option<CharIdx>,
	pub horizontal_scroll: usize,
}

impl MemoryBuffer {
	pub fn new(text: &str) -> Self {
		Self {
			text: Rope::from(text),
			..Self::default()
		}
	}

	pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
		self.file_name = Some(name.into());
		self
	}

	pub fn contents(&self) -> String {
		self.text.to_string()
	}

	fn snapshot(&mut self) {
		if self.depth > 0 && self.snapshotted {
			return;
		}
		self.undo.push(self.text.clone());
		if self.undo.len() > MAX_UNDO {
			self.undo.remove(0);
		}
		self.redo.clear();
		self.snapshotted = self.depth > 0;
	}
}

impl From<&str> for MemoryBuffer {
	fn from(text: &str) -> Self {
		Self::new(text)
	}
}

impl EditorHost for MemoryBuffer {
	fn text(&self) -> RopeSlice<'_> {
		self.text.slice(..)
	}

	fn replace(&mut self, start: CharIdx, end: CharIdx, text: &str) {
		let len = self.text.len_chars();
		let (start, end) = (start.min(len), end.min(len));
		if start == end && text.is_empty() {
			return;
		}
		self.snapshot();
		self.text.remove(start..end);
		self.text.insert(start, text);
		trace!(start, end, inserted = text.len(), "buffer replace");
	}

	fn begin_transaction(&mut self) {
		if self.depth == 0 {
			self.snapshotted = false;
		}
		self.depth += 1;
	}

	fn commit_transaction(&mut self) {
		self.depth = self.depth.saturating_sub(1);
		if self.depth == 0 {
			self.snapshotted = false;
		}
	}

	fn undo(&mut self, count: usize) -> bool {
		let mut done = false;
		for _ in 0..count.max(1) {
			let Some(previous) = self.undo.pop() else {
				break;
			};
			self.redo.push(std::mem::replace(&mut self.text, previous));
			done = true;
		}
		done
	}

	fn redo(&mut self, count: usize) -> bool {
		let mut done = false;
		for _ in 0..count.max(1) {
			let Some(next) = self.redo.pop() else {
				break;
			};
			self.undo.push(std::mem::replace(&mut self.text, next));
			done = true;
		}
		done
	}

	fn scroll_to_offset(&mut self, offset: CharIdx) {
		self.scrolled_to = Some(offset);
	}

	fn scroll_columns(&mut self, columns: isize) -> bool {
		let next = self.horizontal_scroll as isize + columns;
		if next < 0 {
			return false;
		}
		self.horizontal_scroll = next as usize;
		true
	}

	fn execute_host_command(&mut self, command: &HostCommand) -> EditorResult<()> {
		self.host_commands.push(command.clone());
		Ok(())
	}

	fn file_name(&self) -> Option<&str> {
		self.file_name.as_deref()
	}

	fn beep(&mut self) {
		self.beeps += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn transaction_is_one_undo_step() {
		let mut buffer = MemoryBuffer::new("abc");
		buffer.begin_transaction();
		buffer.replace(0, 1, "x");
		buffer.replace(1, 2, "y");
		buffer.commit_transaction();
		buffer.replace(2, 3, "z");
		assert_eq!(buffer.contents(), "xyz");
		assert!(buffer.undo(1));
		assert_eq!(buffer.contents(), "xyc");
		assert!(buffer.undo(1));
		assert_eq!(buffer.contents(), "abc");
		assert!(!buffer.undo(1));
		assert!(buffer.redo(2));
		assert_eq!(buffer.contents(), "xyz");
	}

	#[test]
	fn new_edit_clears_redo() {
		let mut buffer = MemoryBuffer::new("a");
		buffer.replace(1, 1, "b");
		buffer.undo(1);
		buffer.replace(0, 0, "c");
		assert!(!buffer.redo(1));
		assert_eq!(buffer.contents(), "ca");
	}

	#[test]
	fn provided_line_helpers() {
		let buffer = MemoryBuffer::new("ab\ncde\n");
		assert_eq!(buffer.line_count(), 2);
		assert_eq!(buffer.position(5), (1, 2));
		assert_eq!(buffer.offset_of(1, 10), 6);
		assert_eq!(buffer.line_text(1), "cde");
	}

	#[test]
	fn host_commands_are_recorded() {
		let mut buffer = MemoryBuffer::new("");
		let quit = HostCommand::Quit { all: false, force: true };
		assert_eq!(buffer.execute_host_command(&quit), Ok(()));
		assert_eq!(buffer.host_commands, vec![quit]);
	}
}
