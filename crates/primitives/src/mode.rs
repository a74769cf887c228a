//! Editor modes.

use crate::operator::Operator;
use crate::text_range::SelectionType;

/// Visual and select sub-kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
	/// `v` / `gh`
	Char,
	/// `V` / `gH`
	Line,
	/// `<C-V>` / `g<C-H>`
	Block,
}

impl VisualKind {
	/// The selection type produced by a selection of this kind.
	pub fn selection_type(self) -> SelectionType {
		match self {
			VisualKind::Char => SelectionType::CharacterWise,
			VisualKind::Line => SelectionType::LineWise,
			VisualKind::Block => SelectionType::BlockWise,
		}
	}
}

impl From<SelectionType> for VisualKind {
	fn from(kind: SelectionType) -> Self {
		match kind {
			SelectionType::CharacterWise => VisualKind::Char,
			SelectionType::LineWise => VisualKind::Line,
			SelectionType::BlockWise => VisualKind::Block,
		}
	}
}

/// Which prompt the command line was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmdLineKind {
	/// `:` ex command.
	Ex,
	/// `/` forward search.
	SearchForward,
	/// `?` backward search.
	SearchBackward,
}

impl CmdLineKind {
	/// The prompt character shown before the command line.
	pub fn prompt(self) -> char {
		match self {
			CmdLineKind::Ex => ':',
			CmdLineKind::SearchForward => '/',
			CmdLineKind::SearchBackward => '?',
		}
	}
}

/// The mode of one editor instance.
///
/// There is exactly one mode per editor; all carets share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
	#[default]
	Normal,
	Insert,
	Replace,
	Visual(VisualKind),
	Select(VisualKind),
	/// An operator was typed and waits for its motion or text object.
	OperatorPending(Operator),
	CommandLine(CmdLineKind),
}

impl Mode {
	/// Returns the status-line label for this mode.
	pub fn as_str(&self) -> &'static str {
		match self {
			Mode::Normal => "NORMAL",
			Mode::Insert => "INSERT",
			Mode::Replace => "REPLACE",
			Mode::Visual(VisualKind::Char) => "VISUAL",
			Mode::Visual(VisualKind::Line) => "VISUAL LINE",
			Mode::Visual(VisualKind::Block) => "VISUAL BLOCK",
			Mode::Select(VisualKind::Char) => "SELECT",
			Mode::Select(VisualKind::Line) => "SELECT LINE",
			Mode::Select(VisualKind::Block) => "SELECT BLOCK",
			Mode::OperatorPending(_) => "OP PENDING",
			Mode::CommandLine(_) => "COMMAND",
		}
	}

	/// Returns the short code reported by the scripting `mode()` function.
	pub fn code(&self) -> &'static str {
		match self {
			Mode::Normal => "n",
			Mode::Insert => "i",
			Mode::Replace => "R",
			Mode::Visual(VisualKind::Char) => "v",
			Mode::Visual(VisualKind::Line) => "V",
			Mode::Visual(VisualKind::Block) => "\u{16}",
			Mode::Select(VisualKind::Char) => "s",
			Mode::Select(VisualKind::Line) => "S",
			Mode::Select(VisualKind::Block) => "\u{13}",
			Mode::OperatorPending(_) => "no",
			Mode::CommandLine(_) => "c",
		}
	}

	/// Returns true in visual mode of any kind.
	pub fn is_visual(&self) -> bool {
		matches!(self, Mode::Visual(_))
	}

	/// Returns true in select mode of any kind.
	pub fn is_select(&self) -> bool {
		matches!(self, Mode::Select(_))
	}

	/// Returns the visual/select sub-kind, if any.
	pub fn visual_kind(&self) -> Option<VisualKind> {
		match self {
			Mode::Visual(kind) | Mode::Select(kind) => Some(*kind),
			_ => None,
		}
	}

	/// Returns true when a block selection is active.
	pub fn in_block_selection(&self) -> bool {
		self.visual_kind() == Some(VisualKind::Block)
	}

	/// Returns true in insert or replace mode.
	pub fn is_insert_like(&self) -> bool {
		matches!(self, Mode::Insert | Mode::Replace)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mode_labels() {
		assert_eq!(Mode::Normal.as_str(), "NORMAL");
		assert_eq!(Mode::Visual(VisualKind::Block).as_str(), "VISUAL BLOCK");
		assert_eq!(Mode::OperatorPending(Operator::Delete).as_str(), "OP PENDING");
		assert_eq!(Mode::CommandLine(CmdLineKind::Ex).as_str(), "COMMAND");
	}

	#[test]
	fn mode_codes() {
		assert_eq!(Mode::Visual(VisualKind::Line).code(), "V");
		assert_eq!(Mode::Select(VisualKind::Char).code(), "s");
		assert_eq!(Mode::OperatorPending(Operator::Yank).code(), "no");
	}

	#[test]
	fn block_selection_covers_select_mode() {
		assert!(Mode::Select(VisualKind::Block).in_block_selection());
		assert!(!Mode::Visual(VisualKind::Line).in_block_selection());
	}
}
