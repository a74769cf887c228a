use viper_primitives::{Key, KeyCode, Mode};

use crate::InputHandler;
use crate::types::{Action, CharArg, Command, KeyResult, Motion, ObjectKind, OperatorTarget, TextObject};

impl InputHandler {
	/// Handles the key after `f`, `r`, `m`, `"`, `q`, `@`, `i`/`a` and friends.
	pub(crate) fn handle_char_argument(&mut self, key: Key, arg: CharArg) -> KeyResult {
		if key.is_escape() {
			if arg == CharArg::InsertRegister {
				return KeyResult::Cancelled;
			}
			self.reset_params();
			if matches!(self.mode, Mode::OperatorPending(_)) {
				self.mode = Mode::Normal;
			}
			return KeyResult::Cancelled;
		}

		let Some(c) = argument_char(key) else {
			return self.abandon();
		};

		match arg {
			CharArg::Find { forward, till } => self.complete_motion(Motion::FindChar {
				target: c,
				forward,
				till,
			}),
			CharArg::Replace => self.finish(Action::ReplaceChar(c)),
			CharArg::SetMark => self.finish(Action::SetMark(c)),
			CharArg::GotoMark { linewise } => self.complete_motion(Motion::Mark { name: c, linewise }),
			CharArg::Register => {
				self.register = Some(c);
				KeyResult::Pending
			}
			CharArg::Record => {
				self.recording = Some(c);
				self.finish(Action::StartRecording(c))
			}
			CharArg::Play => self.finish(Action::PlayMacro(c)),
			CharArg::Object { inner } => {
				let Some(kind) = ObjectKind::from_char(c) else {
					return self.abandon();
				};
				let object = TextObject { kind, inner };
				match self.mode {
					Mode::OperatorPending(_) => self.complete_operator(OperatorTarget::Object(object)),
					_ => self.finish(Action::SelectObject(object)),
				}
			}
			CharArg::InsertRegister => KeyResult::Command(Command::new(Action::InsertRegister(c))),
		}
	}
}

/// The character a key stands for when it is an argument: `r<CR>` replaces
/// with a line break and `f<Tab>` finds a tab.
fn argument_char(key: Key) -> Option<char> {
	if key.is_enter() {
		return Some('\n');
	}
	match key.code {
		KeyCode::Tab if key.modifiers.is_empty() => Some('\t'),
		_ => key.printable(),
	}
}

#[cfg(test)]
mod tests {
	use viper_primitives::{Operator, parse_keys};

	use super::*;
	use crate::types::WordType;

	fn feed(handler: &mut InputHandler, keys: &str) -> KeyResult {
		let mut last = KeyResult::Pending;
		for key in parse_keys(keys) {
			last = handler.handle_key(key);
		}
		last
	}

	#[test]
	fn find_takes_its_target() {
		let mut handler = InputHandler::new();
		let KeyResult::Command(cmd) = feed(&mut handler, "2tx") else {
			panic!("expected a command");
		};
		assert_eq!(cmd.count, Some(2));
		assert_eq!(
			cmd.action,
			Action::Move(Motion::FindChar {
				target: 'x',
				forward: true,
				till: true
			})
		);
	}

	#[test]
	fn replace_with_enter_is_a_line_break() {
		let mut handler = InputHandler::new();
		assert_eq!(feed(&mut handler, "r<CR>"), KeyResult::Command(Command::new(Action::ReplaceChar('\n'))));
	}

	#[test]
	fn escape_cancels_the_argument() {
		let mut handler = InputHandler::new();
		assert_eq!(feed(&mut handler, "d2f<Esc>"), KeyResult::Cancelled);
		assert_eq!(handler.mode(), Mode::Normal);
		assert!(!handler.has_pending_input());
	}

	#[test]
	fn object_after_operator() {
		let mut handler = InputHandler::new();
		let KeyResult::Command(cmd) = feed(&mut handler, "ciw") else {
			panic!("expected a command");
		};
		assert_eq!(
			cmd.action,
			Action::Operate {
				operator: Operator::Change,
				target: OperatorTarget::Object(TextObject {
					kind: ObjectKind::Word(WordType::Word),
					inner: true
				}),
				motion_count: None,
			}
		);
	}

	#[test]
	fn unknown_object_is_unhandled() {
		let mut handler = InputHandler::new();
		assert_eq!(feed(&mut handler, "diz"), KeyResult::Unhandled);
		assert_eq!(handler.mode(), Mode::Normal);
	}
}
