//! Modal key interpreter.

use tracing::{debug, trace};
use viper_primitives::{CmdLineKind, Key, Mode, keys_to_string};

use crate::cmdline::{CmdLineHistory, CommandLine};
use crate::keymap::{KeyTable, LookupOutcome, NORMAL, OPERATOR_PENDING, VISUAL};
use crate::types::{Action, Binding, CharArg, Command, KeyResult, Motion, OperatorTarget};

/// Largest count accepted before further digits are ignored.
pub const MAX_COUNT: usize = 99_999;

/// Turns keystrokes into [`Command`]s.
///
/// Tracks the mode, the count and register prefixes, a partially typed
/// multi-key sequence, a key waiting for a character argument and the
/// command line being edited. Knows nothing about buffers: the engine
/// executes the returned commands and reports mode changes back through
/// [`InputHandler::set_mode`].
#[derive(Debug, Clone, Default)]
pub struct InputHandler {
	pub(crate) mode: Mode,
	pub(crate) count: usize,
	pub(crate) motion_count: usize,
	pub(crate) register: Option<char>,
	pub(crate) key_sequence: Vec<Key>,
	pub(crate) awaiting: Option<CharArg>,
	pub(crate) recording: Option<char>,
	pub(crate) cmdline: Option<CommandLine>,
	pub(crate) history: CmdLineHistory,
}

impl InputHandler {
	/// Creates a handler in normal mode.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	/// Switches mode, discarding any partially typed command.
	pub fn set_mode(&mut self, mode: Mode) {
		if mode != self.mode {
			trace!(from = self.mode.as_str(), to = mode.as_str(), "mode change");
		}
		self.reset_params();
		if !matches!(mode, Mode::CommandLine(_)) {
			self.cmdline = None;
		}
		self.mode = mode;
	}

	/// Returns the count typed so far (0 when none).
	pub fn count(&self) -> usize {
		self.count
	}

	/// Returns the register selected with `"x` so far.
	pub fn register(&self) -> Option<char> {
		self.register
	}

	/// Returns the keys of an unfinished multi-key sequence.
	pub fn pending_keys(&self) -> &[Key] {
		&self.key_sequence
	}

	/// Returns true while a command is partially typed.
	pub fn has_pending_input(&self) -> bool {
		self.count > 0
			|| self.motion_count > 0
			|| self.register.is_some()
			|| self.awaiting.is_some()
			|| !self.key_sequence.is_empty()
			|| matches!(self.mode, Mode::OperatorPending(_))
	}

	/// Returns the register being recorded into with `q`.
	pub fn recording(&self) -> Option<char> {
		self.recording
	}

	/// Ends macro recording without a `q` key, e.g. when the register is invalid.
	pub fn stop_recording(&mut self) {
		self.recording = None;
	}

	/// Returns the command line being edited.
	pub fn cmdline(&self) -> Option<&CommandLine> {
		self.cmdline.as_ref()
	}

	/// Returns past command lines of the given kind, oldest first.
	pub fn history(&self, kind: CmdLineKind) -> &[String] {
		self.history.entries(kind)
	}

	/// Adds an entry to the command-line history without executing it.
	pub fn push_history(&mut self, kind: CmdLineKind, line: &str) {
		self.history.push(kind, line);
	}

	/// Feeds one key and reports what it completed.
	pub fn handle_key(&mut self, key: Key) -> KeyResult {
		if let Some(arg) = self.awaiting.take() {
			return self.handle_char_argument(key, arg);
		}
		match self.mode {
			Mode::Normal => self.handle_command_key(key, &NORMAL),
			Mode::Visual(_) => self.handle_command_key(key, &VISUAL),
			Mode::OperatorPending(_) => self.handle_command_key(key, &OPERATOR_PENDING),
			Mode::Insert | Mode::Replace => self.handle_insert_key(key),
			Mode::Select(_) => self.handle_select_key(key),
			Mode::CommandLine(kind) => self.handle_cmdline_key(key, kind),
		}
	}

	/// Resolves a key in normal, visual or operator-pending mode.
	fn handle_command_key(&mut self, key: Key, table: &KeyTable) -> KeyResult {
		let operator = match self.mode {
			Mode::OperatorPending(op) => Some(op),
			_ => None,
		};

		if self.key_sequence.is_empty()
			&& let Some(digit) = key.as_digit()
		{
			let current = if operator.is_some() { self.motion_count } else { self.count };
			if digit != 0 || current > 0 {
				let next = current.saturating_mul(10).saturating_add(digit as usize).min(MAX_COUNT);
				if operator.is_some() {
					self.motion_count = next;
				} else {
					self.count = next;
				}
				return KeyResult::Pending;
			}
		}

		if key.is_escape() {
			return self.escape();
		}

		self.key_sequence.push(key);

		if let Some(op) = operator {
			let doubled = self.key_sequence.len() == 1 && key.is_char(op.line_key());
			if doubled || keys_to_string(&self.key_sequence) == op.keys() {
				return self.complete_operator(OperatorTarget::Lines);
			}
		}

		match table.lookup(&self.key_sequence) {
			LookupOutcome::Match(binding) => {
				let binding = binding.clone();
				self.key_sequence.clear();
				self.apply_binding(binding)
			}
			LookupOutcome::Pending => KeyResult::Pending,
			LookupOutcome::None => {
				debug!(keys = %keys_to_string(&self.key_sequence), mode = self.mode.as_str(), "unbound key sequence");
				self.abandon()
			}
		}
	}

	fn apply_binding(&mut self, binding: Binding) -> KeyResult {
		match binding {
			Binding::Motion(motion) => self.complete_motion(motion),
			Binding::Operator(op) => match self.mode {
				Mode::Normal => {
					self.mode = Mode::OperatorPending(op);
					KeyResult::Pending
				}
				_ => self.abandon(),
			},
			Binding::Action(action) => self.finish(action),
			Binding::Alias(operator, target) => self.finish(Action::Operate {
				operator,
				target,
				motion_count: None,
			}),
			Binding::Char(CharArg::Record) if self.recording.is_some() => {
				self.recording = None;
				self.finish(Action::StopRecording)
			}
			Binding::Char(arg) => {
				self.awaiting = Some(arg);
				KeyResult::Pending
			}
			Binding::CmdLine(kind) => self.open_cmdline(kind),
		}
	}

	/// Completes a motion: a move on its own, an operator target after one.
	pub(crate) fn complete_motion(&mut self, motion: Motion) -> KeyResult {
		match self.mode {
			Mode::OperatorPending(_) => self.complete_operator(OperatorTarget::Motion(motion)),
			_ => self.finish(Action::Move(motion)),
		}
	}

	pub(crate) fn complete_operator(&mut self, target: OperatorTarget) -> KeyResult {
		let Mode::OperatorPending(operator) = self.mode else {
			return self.abandon();
		};
		let motion_count = (self.motion_count > 0).then_some(self.motion_count);
		self.finish(Action::Operate {
			operator,
			target,
			motion_count,
		})
	}

	/// Wraps `action` with the prefix count and register and resets the prefix.
	pub(crate) fn finish(&mut self, action: Action) -> KeyResult {
		let command = Command {
			count: (self.count > 0).then_some(self.count),
			register: self.register,
			action,
		};
		self.reset_params();
		if matches!(self.mode, Mode::OperatorPending(_)) {
			self.mode = Mode::Normal;
		}
		trace!(?command, "command complete");
		KeyResult::Command(command)
	}

	fn escape(&mut self) -> KeyResult {
		match self.mode {
			Mode::OperatorPending(_) => {
				self.reset_params();
				self.mode = Mode::Normal;
				KeyResult::Cancelled
			}
			Mode::Visual(_) => {
				self.reset_params();
				self.finish(Action::ExitVisual)
			}
			_ if self.has_pending_input() => {
				self.reset_params();
				KeyResult::Cancelled
			}
			_ => KeyResult::Unhandled,
		}
	}

	/// Drops a partially typed command after an invalid key.
	pub(crate) fn abandon(&mut self) -> KeyResult {
		self.reset_params();
		if matches!(self.mode, Mode::OperatorPending(_)) {
			self.mode = Mode::Normal;
		}
		KeyResult::Unhandled
	}

	pub(crate) fn reset_params(&mut self) {
		self.count = 0;
		self.motion_count = 0;
		self.register = None;
		self.awaiting = None;
		self.key_sequence.clear();
	}
}
