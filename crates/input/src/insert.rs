use viper_primitives::{Key, KeyCode, Modifiers};

use crate::InputHandler;
use crate::types::{Action, CharArg, Command, KeyResult, Motion, WordType};

impl InputHandler {
	/// Handles a key in insert or replace mode.
	pub(crate) fn handle_insert_key(&mut self, key: Key) -> KeyResult {
		let action = if key.is_escape() {
			Action::ExitInsert
		} else if key.is_enter() {
			Action::InsertNewline
		} else if key.is_backspace() {
			Action::InsertBackspace
		} else if key.is_ctrl('t') {
			Action::ShiftLine { right: true }
		} else if key.is_ctrl('d') {
			Action::ShiftLine { right: false }
		} else if key.is_ctrl('w') {
			Action::DeleteWordBefore
		} else if key.is_ctrl('u') {
			Action::DeleteLineBefore
		} else if key.is_ctrl('r') {
			self.awaiting = Some(CharArg::InsertRegister);
			return KeyResult::Pending;
		} else if let Some(motion) = insert_motion(key) {
			Action::InsertMove(motion)
		} else {
			match key.code {
				KeyCode::Delete => Action::InsertDelete,
				KeyCode::Tab if key.modifiers.is_empty() => Action::InsertTab,
				KeyCode::Char(c) if key.modifiers.is_empty() => Action::InsertChar(c),
				_ => return KeyResult::Unhandled,
			}
		};
		KeyResult::Command(Command::new(action))
	}

	/// Handles a key in select mode, where typing replaces the selection.
	pub(crate) fn handle_select_key(&mut self, key: Key) -> KeyResult {
		let action = if key.is_escape() {
			Action::ExitVisual
		} else if key.is_ctrl('g') {
			Action::ToggleSelect
		} else if key.is_enter() {
			Action::SelectReplace('\n')
		} else if key.is_backspace() || key.code == KeyCode::Delete {
			Action::SelectDelete
		} else if let Some(motion) = insert_motion(key) {
			Action::Move(motion)
		} else {
			match key.code {
				KeyCode::Tab if key.modifiers.is_empty() => Action::SelectReplace('\t'),
				KeyCode::Char(c) if key.modifiers.is_empty() => Action::SelectReplace(c),
				_ => return KeyResult::Unhandled,
			}
		};
		KeyResult::Command(Command::new(action))
	}
}

/// Cursor keys that move without leaving insert or select mode.
fn insert_motion(key: Key) -> Option<Motion> {
	let shifted = key.modifiers == Modifiers::SHIFT || key.modifiers == Modifiers::CTRL;
	if !key.modifiers.is_empty() && !shifted {
		return None;
	}
	Some(match key.code {
		KeyCode::Left if shifted => Motion::WordBackward(WordType::Word),
		KeyCode::Right if shifted => Motion::WordForward(WordType::Word),
		KeyCode::Left => Motion::Left,
		KeyCode::Right => Motion::Right,
		KeyCode::Up if !shifted => Motion::Up,
		KeyCode::Down if !shifted => Motion::Down,
		KeyCode::Home if !shifted => Motion::LineStart,
		KeyCode::End if !shifted => Motion::LineEnd,
		_ => return None,
	})
}

#[cfg(test)]
mod tests {
	use viper_primitives::{Mode, VisualKind, parse_keys};

	use super::*;

	fn actions(mode: Mode, keys: &str) -> Vec<Action> {
		let mut handler = InputHandler::new();
		handler.set_mode(mode);
		parse_keys(keys)
			.into_iter()
			.filter_map(|key| match handler.handle_key(key) {
				KeyResult::Command(cmd) => Some(cmd.action),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn typing_and_leaving_insert_mode() {
		assert_eq!(
			actions(Mode::Insert, "hi<CR><BS><Esc>"),
			vec![
				Action::InsertChar('h'),
				Action::InsertChar('i'),
				Action::InsertNewline,
				Action::InsertBackspace,
				Action::ExitInsert,
			]
		);
	}

	#[test]
	fn ctrl_t_shifts_the_line() {
		assert_eq!(actions(Mode::Insert, "<C-T><C-D>"), vec![
			Action::ShiftLine { right: true },
			Action::ShiftLine { right: false },
		]);
	}

	#[test]
	fn ctrl_r_inserts_a_register() {
		assert_eq!(actions(Mode::Insert, "<C-R>a"), vec![Action::InsertRegister('a')]);
	}

	#[test]
	fn shifted_arrows_move_by_word() {
		assert_eq!(actions(Mode::Replace, "<S-Left><Right>"), vec![
			Action::InsertMove(Motion::WordBackward(WordType::Word)),
			Action::InsertMove(Motion::Right),
		]);
	}

	#[test]
	fn select_mode_typing_replaces() {
		assert_eq!(actions(Mode::Select(VisualKind::Char), "x<BS><C-G>"), vec![
			Action::SelectReplace('x'),
			Action::SelectDelete,
			Action::ToggleSelect,
		]);
	}
}
