//! The `:`, `/` and `?` command line.

use viper_primitives::{CmdLineKind, Key, KeyCode, Mode};

use crate::InputHandler;
use crate::types::{Action, CharArg, Command, KeyResult, Motion, OperatorTarget};

/// Entries kept per history list.
const HISTORY_LIMIT: usize = 50;

/// A command line being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
	kind: CmdLineKind,
	text: String,
	/// Cursor as a char index into `text`.
	cursor: usize,
	/// Mode to return to when the line is finished.
	return_mode: Mode,
	count: usize,
	motion_count: usize,
	register: Option<char>,
	history_index: Option<usize>,
}

impl CommandLine {
	pub fn kind(&self) -> CmdLineKind {
		self.kind
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn cursor(&self) -> usize {
		self.cursor
	}

	/// The mode the command line was opened from.
	pub fn return_mode(&self) -> Mode {
		self.return_mode
	}

	/// Returns the line as displayed, prompt included.
	pub fn display(&self) -> String {
		format!("{}{}", self.kind.prompt(), self.text)
	}

	fn byte_at(&self, char_idx: usize) -> usize {
		self.text.char_indices().nth(char_idx).map_or(self.text.len(), |(i, _)| i)
	}

	fn insert_str(&mut self, s: &str) {
		let at = self.byte_at(self.cursor);
		self.text.insert_str(at, s);
		self.cursor += s.chars().count();
	}

	fn delete_back(&mut self, n: usize) {
		let n = n.min(self.cursor);
		let from = self.byte_at(self.cursor - n);
		let to = self.byte_at(self.cursor);
		self.text.replace_range(from..to, "");
		self.cursor -= n;
	}

	fn word_start_before_cursor(&self) -> usize {
		let chars: Vec<char> = self.text.chars().take(self.cursor).collect();
		let mut i = chars.len();
		while i > 0 && chars[i - 1].is_whitespace() {
			i -= 1;
		}
		let keyword = |c: char| c.is_alphanumeric() || c == '_';
		if i > 0 && keyword(chars[i - 1]) {
			while i > 0 && keyword(chars[i - 1]) {
				i -= 1;
			}
		} else if i > 0 {
			i -= 1;
		}
		i
	}

	fn set_text(&mut self, text: &str) {
		self.text = text.to_string();
		self.cursor = self.text.chars().count();
	}
}

/// Past ex commands and search patterns.
#[derive(Debug, Clone, Default)]
pub(crate) struct CmdLineHistory {
	ex: Vec<String>,
	search: Vec<String>,
}

impl CmdLineHistory {
	pub(crate) fn entries(&self, kind: CmdLineKind) -> &[String] {
		match kind {
			CmdLineKind::Ex => &self.ex,
			CmdLineKind::SearchForward | CmdLineKind::SearchBackward => &self.search,
		}
	}

	pub(crate) fn push(&mut self, kind: CmdLineKind, line: &str) {
		if line.is_empty() {
			return;
		}
		let list = match kind {
			CmdLineKind::Ex => &mut self.ex,
			CmdLineKind::SearchForward | CmdLineKind::SearchBackward => &mut self.search,
		};
		list.retain(|entry| entry != line);
		list.push(line.to_string());
		if list.len() > HISTORY_LIMIT {
			list.remove(0);
		}
	}
}

impl InputHandler {
	/// Opens the command line, stashing the pending count, register and
	/// operator until the line is submitted.
	pub(crate) fn open_cmdline(&mut self, kind: CmdLineKind) -> KeyResult {
		let return_mode = self.mode;
		let mut line = CommandLine {
			kind,
			text: String::new(),
			cursor: 0,
			return_mode,
			count: self.count,
			motion_count: self.motion_count,
			register: self.register,
			history_index: None,
		};
		if kind == CmdLineKind::Ex {
			if return_mode.is_visual() {
				line.set_text("'<,'>");
			} else if self.count > 1 {
				line.set_text(&format!(".,.+{}", self.count - 1));
			} else if self.count == 1 {
				line.set_text(".");
			}
			line.count = 0;
		}
		self.reset_params();
		self.cmdline = Some(line);
		self.mode = Mode::CommandLine(kind);
		KeyResult::Command(Command::new(Action::CmdLineChanged))
	}

	/// Inserts text at the command-line cursor (`<C-R>` and pasting).
	pub fn insert_cmdline_text(&mut self, text: &str) {
		if let Some(line) = self.cmdline.as_mut() {
			line.insert_str(text);
		}
	}

	pub(crate) fn handle_cmdline_key(&mut self, key: Key, kind: CmdLineKind) -> KeyResult {
		let Some(mut line) = self.cmdline.take() else {
			self.mode = Mode::Normal;
			return KeyResult::Unhandled;
		};

		if key.is_escape() || key.is_ctrl('c') || (key.is_backspace() && line.text.is_empty()) {
			return self.leave_cmdline(&line, Action::CmdLineCancelled);
		}
		if key.is_enter() {
			return self.submit_cmdline(line);
		}

		let changed = if key.is_backspace() {
			line.delete_back(1);
			true
		} else if key.is_ctrl('u') {
			let n = line.cursor;
			line.delete_back(n);
			true
		} else if key.is_ctrl('w') {
			let n = line.cursor - line.word_start_before_cursor();
			line.delete_back(n);
			true
		} else if key.is_ctrl('r') {
			self.cmdline = Some(line);
			self.awaiting = Some(CharArg::InsertRegister);
			return KeyResult::Pending;
		} else {
			match (key.code, key.modifiers.is_empty()) {
				(KeyCode::Left, _) => {
					line.cursor = line.cursor.saturating_sub(1);
					false
				}
				(KeyCode::Right, _) => {
					line.cursor = (line.cursor + 1).min(line.text.chars().count());
					false
				}
				(KeyCode::Home, _) => {
					line.cursor = 0;
					false
				}
				(KeyCode::End, _) => {
					line.cursor = line.text.chars().count();
					false
				}
				(KeyCode::Up, _) | (KeyCode::Down, _) => {
					self.recall_history(&mut line, kind, key.code == KeyCode::Up);
					true
				}
				(KeyCode::Delete, _) => {
					if line.cursor < line.text.chars().count() {
						line.cursor += 1;
						line.delete_back(1);
					}
					true
				}
				(KeyCode::Tab, true) => {
					line.insert_str("\t");
					true
				}
				(KeyCode::Char(c), true) => {
					let mut buf = [0u8; 4];
					line.insert_str(c.encode_utf8(&mut buf));
					true
				}
				_ => {
					self.cmdline = Some(line);
					return KeyResult::Unhandled;
				}
			}
		};

		self.cmdline = Some(line);
		if changed { KeyResult::Command(Command::new(Action::CmdLineChanged)) } else { KeyResult::Pending }
	}

	fn recall_history(&self, line: &mut CommandLine, kind: CmdLineKind, older: bool) {
		let entries = self.history.entries(kind);
		if entries.is_empty() {
			return;
		}
		let index = match (line.history_index, older) {
			(None, true) => Some(entries.len() - 1),
			(None, false) => None,
			(Some(0), true) => Some(0),
			(Some(i), true) => Some(i - 1),
			(Some(i), false) if i + 1 < entries.len() => Some(i + 1),
			(Some(_), false) => None,
		};
		line.history_index = index;
		match index {
			Some(i) => line.set_text(&entries[i]),
			None => line.set_text(""),
		}
	}

	fn submit_cmdline(&mut self, line: CommandLine) -> KeyResult {
		self.history.push(line.kind, &line.text);
		let action = match line.kind {
			CmdLineKind::Ex => Action::ExecuteEx(line.text.clone()),
			CmdLineKind::SearchForward | CmdLineKind::SearchBackward => {
				let motion = Motion::Search {
					pattern: line.text.clone(),
					forward: line.kind == CmdLineKind::SearchForward,
				};
				match line.return_mode {
					Mode::OperatorPending(operator) => Action::Operate {
						operator,
						target: OperatorTarget::Motion(motion),
						motion_count: (line.motion_count > 0).then_some(line.motion_count),
					},
					_ => Action::Move(motion),
				}
			}
		};
		self.leave_cmdline(&line, action)
	}

	fn leave_cmdline(&mut self, line: &CommandLine, action: Action) -> KeyResult {
		self.reset_params();
		self.cmdline = None;
		self.mode = match line.return_mode {
			Mode::Visual(kind) if line.kind != CmdLineKind::Ex => Mode::Visual(kind),
			_ => Mode::Normal,
		};
		KeyResult::Command(Command {
			count: (line.count > 0).then_some(line.count),
			register: line.register,
			action,
		})
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use viper_primitives::{Operator, VisualKind, parse_keys};

	use super::*;

	fn feed(handler: &mut InputHandler, keys: &str) -> Vec<KeyResult> {
		parse_keys(keys).into_iter().map(|key| handler.handle_key(key)).collect()
	}

	fn last_action(handler: &mut InputHandler, keys: &str) -> Option<Command> {
		match feed(handler, keys).pop() {
			Some(KeyResult::Command(cmd)) => Some(cmd),
			_ => None,
		}
	}

	#[test]
	fn ex_line_submits_text() {
		let mut handler = InputHandler::new();
		let cmd = last_action(&mut handler, ":set sw=2<CR>").unwrap();
		assert_eq!(cmd.action, Action::ExecuteEx("set sw=2".into()));
		assert_eq!(handler.mode(), Mode::Normal);
		assert_eq!(handler.history(CmdLineKind::Ex), ["set sw=2".to_string()]);
	}

	#[test]
	fn count_prefills_a_range() {
		let mut handler = InputHandler::new();
		feed(&mut handler, "3:");
		assert_eq!(handler.cmdline().map(CommandLine::text), Some(".,.+2"));
	}

	#[test]
	fn visual_prefills_marks_and_returns_to_normal() {
		let mut handler = InputHandler::new();
		handler.set_mode(Mode::Visual(VisualKind::Line));
		let cmd = last_action(&mut handler, ":><CR>").unwrap();
		assert_eq!(cmd.action, Action::ExecuteEx("'<,'>>".into()));
		assert_eq!(handler.mode(), Mode::Normal);
	}

	#[test]
	fn backspace_on_empty_line_cancels() {
		let mut handler = InputHandler::new();
		let cmd = last_action(&mut handler, "/a<BS><BS>").unwrap();
		assert_eq!(cmd.action, Action::CmdLineCancelled);
		assert_eq!(handler.mode(), Mode::Normal);
	}

	#[test]
	fn search_after_operator_becomes_its_target() {
		let mut handler = InputHandler::new();
		let cmd = last_action(&mut handler, "\"ad2/foo<CR>").unwrap();
		assert_eq!(cmd.register, Some('a'));
		assert_eq!(
			cmd.action,
			Action::Operate {
				operator: Operator::Delete,
				target: OperatorTarget::Motion(Motion::Search {
					pattern: "foo".into(),
					forward: true
				}),
				motion_count: Some(2),
			}
		);
	}

	#[test]
	fn search_in_visual_mode_keeps_the_selection() {
		let mut handler = InputHandler::new();
		handler.set_mode(Mode::Visual(VisualKind::Char));
		feed(&mut handler, "?x<CR>");
		assert_eq!(handler.mode(), Mode::Visual(VisualKind::Char));
	}

	#[test]
	fn editing_keys() {
		let mut handler = InputHandler::new();
		feed(&mut handler, ":abc def<C-W>x<Left><Left>y");
		assert_eq!(handler.cmdline().map(CommandLine::text), Some("abcy x"));
		feed(&mut handler, "<C-U>");
		assert_eq!(handler.cmdline().map(CommandLine::text), Some(" x"));
	}

	#[test]
	fn history_recall() {
		let mut handler = InputHandler::new();
		feed(&mut handler, ":one<CR>:two<CR>:");
		feed(&mut handler, "<Up><Up>");
		assert_eq!(handler.cmdline().map(CommandLine::text), Some("one"));
		feed(&mut handler, "<Down>");
		assert_eq!(handler.cmdline().map(CommandLine::text), Some("two"));
	}
}
