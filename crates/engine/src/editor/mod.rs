//! The editor: one caret set and one mode over one host buffer.
//!
//! Keys go through [`InputHandler`], which turns them into [`Command`]s.
//! [`Editor::execute`] runs each command inside one host transaction, so a
//! command is one undo step. Implementation is split by concern:
//!
//! - [`motion`] - motion targets and caret movement
//! - [`range`] - operator target resolution
//! - [`operators`] - the operator dispatch table
//! - [`actions`] - put, replace, join and the other direct actions
//! - [`insert`] - insert and replace mode
//! - [`visual`] - visual and select mode
//! - [`repeat`] - dot-repeat and macros
//! - [`cmdline`] - the command line and the script bridge
//! - [`ex`] - ex commands that act on the buffer

/// Put, replace, join, undo and friends.
mod actions;
/// Command-line prompts and the script host bridge.
mod cmdline;
/// Ex command execution.
mod ex;
/// Insert and replace mode.
mod insert;
/// Motion targets.
mod motion;
/// Operator dispatch.
mod operators;
/// Operator target ranges.
mod range;
/// Dot-repeat and macro replay.
mod repeat;
/// Visual and select mode.
mod visual;

use ropey::RopeSlice;
use tracing::{debug, trace, warn};
use viper_input::{Action, Command, CommandLine, InputHandler, KeyResult};
use viper_primitives::rope::line_of;
use viper_primitives::{CharIdx, Key, Mode, SelectionType, keys_to_string, parse_keys};
use viper_registers::{Mark, Register};
use viper_script::{MessageKind, ScriptError, Value};

use self::cmdline::CmdLineOrigin;
use self::insert::InsertSession;
use self::repeat::RepeatRecord;
use self::visual::LastVisual;
use crate::caret::CaretSet;
use crate::error::{EditorError, EditorResult};
use crate::host::EditorHost;
use crate::session::Session;

/// Deepest nesting of macro, `.` and `:normal` replays.
pub const MAX_REPLAY_DEPTH: usize = 100;

/// A Vim editing engine over one host buffer.
///
/// The editor owns the mode, the carets and the repeat state of one
/// buffer. Registers, options and script variables live in the
/// [`Session`] passed to every call, so several editors can share them.
pub struct Editor<H: EditorHost> {
	host: H,
	input: InputHandler,
	carets: CaretSet,
	last_visual: Option<LastVisual>,
	repeat: Option<RepeatRecord>,
	insert: Option<InsertSession>,
	replay_depth: usize,
	/// `.` is replaying the repeat record, which must not replace itself.
	repeating: bool,
	cmdline_origin: Option<CmdLineOrigin>,
	/// The error an ex command raised under the script interpreter, handed
	/// back to the caller unchanged.
	ex_failure: Option<EditorError>,
	messages: Vec<(MessageKind, String)>,
}

impl<H: EditorHost> Editor<H> {
	pub fn new(host: H) -> Self {
		Self {
			host,
			input: InputHandler::new(),
			carets: CaretSet::new(0),
			last_visual: None,
			repeat: None,
			insert: None,
			replay_depth: 0,
			repeating: false,
			cmdline_origin: None,
			ex_failure: None,
			messages: Vec::new(),
		}
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	pub fn into_host(self) -> H {
		self.host
	}

	pub fn text(&self) -> RopeSlice<'_> {
		self.host.text()
	}

	pub fn mode(&self) -> Mode {
		self.input.mode()
	}

	/// Count typed so far for the pending command, for the status line.
	pub fn pending_count(&self) -> Option<usize> {
		let count = self.input.count();
		(count > 0).then_some(count)
	}

	/// Register selected with `"x` for the pending command.
	pub fn pending_register(&self) -> Option<char> {
		self.input.register()
	}

	/// Keys of an unfinished multi-key command, in Vim notation.
	pub fn pending_keys(&self) -> String {
		keys_to_string(self.input.pending_keys())
	}

	pub fn cmdline(&self) -> Option<&CommandLine> {
		self.input.cmdline()
	}

	pub fn carets(&self) -> &CaretSet {
		&self.carets
	}

	/// Offset of the primary caret.
	pub fn caret(&self) -> CharIdx {
		self.carets.primary().offset()
	}

	/// Moves the primary caret. Returns false for offsets outside the text.
	pub fn move_caret(&mut self, offset: CharIdx) -> bool {
		let mode = self.mode();
		let moved = self.carets.move_to_offset(self.host.text(), mode, 0, offset);
		if moved {
			self.host.scroll_to_offset(offset);
		}
		moved
	}

	/// Adds a secondary caret. Returns false if one is already there.
	pub fn add_caret(&mut self, offset: CharIdx) -> bool {
		self.carets.add(self.host.text(), offset)
	}

	pub fn remove_secondary_carets(&mut self) {
		self.carets.collapse();
	}

	/// Messages for the host's message area, oldest first.
	pub fn messages(&self) -> &[(MessageKind, String)] {
		&self.messages
	}

	pub fn take_messages(&mut self) -> Vec<(MessageKind, String)> {
		std::mem::take(&mut self.messages)
	}

	/// Handles one key. Returns false if the key means nothing in the
	/// current mode.
	///
	/// Failed commands never surface as errors here: silent failures beep,
	/// the rest become error messages.
	pub fn process_keystroke(&mut self, session: &mut Session, key: Key) -> bool {
		match self.handle_key(session, key) {
			Ok(handled) => handled,
			Err(err) => {
				self.report(&err);
				true
			}
		}
	}

	/// Feeds keys in Vim notation, e.g. `"d2w<Esc>"`. Returns false if any
	/// key was unhandled.
	pub fn feed(&mut self, session: &mut Session, keys: &str) -> bool {
		parse_keys(keys)
			.into_iter()
			.fold(true, |handled, key| self.process_keystroke(session, key) && handled)
	}

	/// Runs a command line as if typed after `:`.
	pub fn execute_command_line(&mut self, session: &mut Session, line: &str) -> EditorResult<()> {
		self.input.push_history(viper_primitives::CmdLineKind::Ex, line);
		session.registers.set_last_command(line);
		self.host.begin_transaction();
		let result = self.run_ex(session, line);
		self.host.commit_transaction();
		self.normalize_carets();
		result
	}

	/// Evaluates a script expression with this editor as its host.
	pub fn evaluate(&mut self, session: &mut Session, expression: &str) -> Result<Value, ScriptError> {
		self.with_script(session, |script, host| script.evaluate(expression, host))
	}

	/// Feeds one key and runs the command it completes.
	pub(crate) fn handle_key(&mut self, session: &mut Session, key: Key) -> EditorResult<bool> {
		let recording = self.replay_depth == 0 && session.registers.recording().is_some();
		let result = self.input.handle_key(key);
		let stops = matches!(
			&result,
			KeyResult::Command(Command {
				action: Action::StopRecording,
				..
			})
		);
		if recording && !stops {
			session.registers.record_key(key);
		}
		match result {
			KeyResult::Pending => Ok(true),
			KeyResult::Cancelled => {
				trace!(key = %key, "pending command cancelled");
				Ok(true)
			}
			KeyResult::Unhandled => {
				if !self.mode().is_insert_like() {
					self.host.beep();
				}
				Ok(false)
			}
			KeyResult::Command(command) => {
				self.execute(session, command)?;
				Ok(true)
			}
		}
	}

	/// Runs one command as one undo step and remembers it for `.`.
	///
	/// A command that opens insert mode keeps its transaction open until
	/// the insert ends.
	pub(crate) fn execute(&mut self, session: &mut Session, command: Command) -> EditorResult<()> {
		debug!(action = ?command.action, count = ?command.count, register = ?command.register, mode = self.mode().as_str(), "execute");
		if self.cmdline_origin.is_some() && !matches!(self.mode(), Mode::CommandLine(_)) {
			self.restore_cmdline_origin();
		}
		let extent = self.visual_extent_for(&command.action);
		let was_inserting = self.insert.is_some();

		self.host.begin_transaction();
		let result = self.dispatch(session, &command);
		let opened_insert = !was_inserting && self.insert.is_some();
		if !opened_insert {
			self.host.commit_transaction();
		}

		match &result {
			Ok(()) => self.remember_change(command, extent, opened_insert),
			Err(err) => debug!(%err, "command failed"),
		}
		self.normalize_carets();
		result
	}

	fn dispatch(&mut self, session: &mut Session, command: &Command) -> EditorResult<()> {
		let count = command.count;
		let count1 = command.count1();
		let register = command.register;
		match &command.action {
			Action::Move(motion) => self.move_carets(session, motion, count),
			Action::Operate {
				operator,
				target,
				motion_count,
			} => self.operate(session, *operator, target, count, *motion_count, register),
			Action::VisualOperate { operator, linewise } => self.visual_operate(session, *operator, *linewise, count, register),
			Action::SelectObject(object) => self.select_object(*object, count1),
			Action::Put { before, cursor_after } => self.put(session, register, count1, *before, *cursor_after),
			Action::ReplaceChar(c) => self.replace_char(*c, count1),
			Action::ToggleCaseChar => self.toggle_case_char(count1),
			Action::ReverseLine => self.reverse_line(),
			Action::Join { spaces } => self.join(*spaces, count),
			Action::Insert(entry) => self.begin_insert(*entry, count1),
			Action::BlockInsert { append } => self.block_insert(*append),
			Action::EnterReplace => {
				self.start_insert(Mode::Replace, count1, None, false);
				Ok(())
			}
			Action::Visual(kind) => self.toggle_visual(*kind),
			Action::Select(kind) => self.enter_select(*kind),
			Action::Reselect => self.reselect(),
			Action::SwapEnds { block_corner } => self.swap_ends(*block_corner),
			Action::ToggleSelect => self.toggle_select(),
			Action::ExitVisual => {
				self.exit_visual();
				Ok(())
			}
			Action::SetMark(name) => self.set_mark(*name),
			Action::Undo => self.undo(count1),
			Action::Redo => self.redo(count1),
			Action::Repeat => self.repeat_last(session, count),
			Action::ScrollColumns { right } => self.scroll_columns(*right, count1),
			Action::Increment { negate } => self.increment(count1, *negate),
			Action::StartRecording(name) => {
				if let Err(err) = session.registers.start_recording(*name) {
					self.input.stop_recording();
					return Err(err.into());
				}
				Ok(())
			}
			Action::StopRecording => {
				session.registers.finish_recording();
				Ok(())
			}
			Action::PlayMacro(name) => self.play_macro(session, *name, count1),
			Action::InsertChar(c) => self.insert_text(&c.to_string()),
			Action::InsertNewline => self.insert_text("\n"),
			Action::InsertTab => self.insert_tab(session),
			Action::InsertBackspace => self.insert_backspace(),
			Action::InsertDelete => self.insert_delete(),
			Action::DeleteWordBefore => self.delete_word_before(),
			Action::DeleteLineBefore => self.delete_line_before(),
			Action::ShiftLine { right } => self.shift_current_line(session, *right),
			Action::InsertRegister(name) => self.insert_register(session, *name),
			Action::InsertMove(motion) => self.insert_move(session, motion),
			Action::ExitInsert => self.exit_insert(session),
			Action::SelectReplace(c) => self.select_replace(session, *c),
			Action::SelectDelete => self.select_delete(session),
			Action::CmdLineChanged => self.cmdline_changed(session),
			Action::ExecuteEx(line) => {
				session.registers.set_last_command(line);
				self.run_ex(session, line)
			}
			Action::CmdLineCancelled => Ok(()),
		}
	}

	/// Shows an error the way Vim does: a bell or a message.
	fn report(&mut self, err: &EditorError) {
		if err.is_silent() {
			debug!(%err, "beep");
			self.host.beep();
		} else {
			warn!(%err, "command error");
			self.messages.push((MessageKind::Error, err.to_string()));
		}
	}

	pub(crate) fn message(&mut self, text: impl Into<String>) {
		self.messages.push((MessageKind::Msg, text.into()));
	}

	/// Snaps carets onto text in normal mode.
	fn normalize_carets(&mut self) {
		if self.mode() == Mode::Normal {
			self.carets.snap_to_content(self.host.text());
		}
	}

	/// Replaces `start..end` with `text`, keeping carets and marks on their
	/// text.
	pub(crate) fn edit(&mut self, start: CharIdx, end: CharIdx, text: &str) {
		let doc = self.host.text();
		let len = doc.len_chars();
		let start = start.min(len);
		let end = end.clamp(start, len);
		if start == end && text.is_empty() {
			return;
		}
		let line = line_of(doc, start);
		let removed = doc.slice(start..end).chars().filter(|&c| c == '\n').count();
		let added = text.matches('\n').count();
		trace!(start, end, inserted = text.len(), "edit");
		self.host.replace(start, end, text);
		self.carets.adjust_for_edit(start, end, text.chars().count());
		self.carets.adjust_marks(line, removed, added);
	}

	/// Moves caret `index` in the current mode.
	pub(crate) fn place_caret(&mut self, index: usize, offset: CharIdx) {
		let mode = self.mode();
		let text = self.host.text();
		let offset = offset.min(text.len_chars());
		self.carets.move_to_offset(text, mode, index, offset);
		if index == 0 {
			self.host.scroll_to_offset(offset);
		}
	}

	/// Sets mark `name` of caret `index` at `offset`.
	pub(crate) fn set_mark_at(&mut self, index: usize, name: char, offset: CharIdx) {
		let (line, col) = self.host.position(offset.min(self.host.len_chars()));
		if let Some(caret) = self.carets.get_mut(index)
			&& let Err(err) = caret.marks_mut().set(name, Mark::new(line, col))
		{
			debug!(%err, "mark not set");
		}
	}

	/// Sets `[`, `]` and `.` after a change of `start..end`.
	pub(crate) fn mark_change(&mut self, index: usize, start: CharIdx, end: CharIdx) {
		self.set_mark_at(index, '[', start);
		self.set_mark_at(index, ']', end);
		self.set_mark_at(index, '.', start);
	}

	/// Writes yanked or deleted text for caret `index`.
	pub(crate) fn store_register(
		&mut self,
		session: &mut Session,
		index: usize,
		register: Option<char>,
		text: &str,
		kind: SelectionType,
		is_delete: bool,
	) {
		let Some(caret) = self.carets.get_mut(index) else {
			return;
		};
		if !caret
			.registers_mut()
			.store_text(&mut session.registers, index == 0, register, text, kind, is_delete)
		{
			debug!(?register, "register write failed");
		}
	}

	/// Reads register `name` as caret `index` sees it.
	pub(crate) fn read_register(&self, session: &Session, index: usize, name: char) -> Option<Register> {
		self.carets
			.get(index)
			.and_then(|caret| caret.registers().get_register(&session.registers, index == 0, name))
	}
}

/// Fails for a register prefix that yank, delete or change cannot write.
pub(crate) fn check_register(session: &Session, register: Option<char>) -> EditorResult<()> {
	if let Some(name) = register {
		session.registers.check_writable(name)?;
	}
	Ok(())
}

#[cfg(test)]
mod tests;
