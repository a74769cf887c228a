//! Static key tables for normal, visual and operator-pending mode.
//!
//! Each table maps a key sequence in Vim notation to a [`Binding`]. Lookup
//! of a partial sequence reports [`LookupOutcome::Pending`] while some
//! binding still starts with it.

use std::sync::LazyLock;

use viper_primitives::{CmdLineKind, Key, Operator, VisualKind, parse_keys};

use crate::types::{Action, Binding, CharArg, InsertEntry, Motion, OperatorTarget, WordType};

/// Outcome of looking up a key sequence.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LookupOutcome<'a> {
	Match(&'a Binding),
	Pending,
	None,
}

/// A compiled key table.
pub(crate) struct KeyTable {
	entries: Vec<(Vec<Key>, Binding)>,
}

impl KeyTable {
	fn build(groups: &[Vec<(&str, Binding)>]) -> Self {
		let entries = groups
			.iter()
			.flatten()
			.map(|(notation, binding)| (parse_keys(notation), binding.clone()))
			.collect();
		Self { entries }
	}

	pub(crate) fn lookup(&self, keys: &[Key]) -> LookupOutcome<'_> {
		let mut pending = false;
		for (seq, binding) in &self.entries {
			if seq.as_slice() == keys {
				return LookupOutcome::Match(binding);
			}
			pending |= seq.len() > keys.len() && seq.starts_with(keys);
		}
		if pending { LookupOutcome::Pending } else { LookupOutcome::None }
	}
}

pub(crate) static NORMAL: LazyLock<KeyTable> = LazyLock::new(|| KeyTable::build(&[motions(), normal_only()]));
pub(crate) static VISUAL: LazyLock<KeyTable> = LazyLock::new(|| KeyTable::build(&[motions(), visual_only()]));
pub(crate) static OPERATOR_PENDING: LazyLock<KeyTable> = LazyLock::new(|| {
	KeyTable::build(&[
		motions(),
		vec![
			("i", Binding::Char(CharArg::Object { inner: true })),
			("a", Binding::Char(CharArg::Object { inner: false })),
		],
	])
});

fn motions() -> Vec<(&'static str, Binding)> {
	use Binding::Motion as M;
	use Motion::*;
	vec![
		("h", M(Left)),
		("<Left>", M(Left)),
		("<BS>", M(Backspace)),
		("<C-H>", M(Backspace)),
		("l", M(Right)),
		("<Right>", M(Right)),
		("<Space>", M(Space)),
		("j", M(Down)),
		("<Down>", M(Down)),
		("<C-N>", M(Down)),
		("k", M(Up)),
		("<Up>", M(Up)),
		("<C-P>", M(Up)),
		("+", M(NextLineStart)),
		("<CR>", M(NextLineStart)),
		("-", M(PrevLineStart)),
		("_", M(CurrentLineStart)),
		("w", M(WordForward(WordType::Word))),
		("W", M(WordForward(WordType::BigWord))),
		("<S-Right>", M(WordForward(WordType::Word))),
		("b", M(WordBackward(WordType::Word))),
		("B", M(WordBackward(WordType::BigWord))),
		("<S-Left>", M(WordBackward(WordType::Word))),
		("e", M(WordEnd(WordType::Word))),
		("E", M(WordEnd(WordType::BigWord))),
		("ge", M(WordEndBackward(WordType::Word))),
		("gE", M(WordEndBackward(WordType::BigWord))),
		("0", M(LineStart)),
		("<Home>", M(LineStart)),
		("^", M(FirstNonBlank)),
		("$", M(LineEnd)),
		("<End>", M(LineEnd)),
		("|", M(Column)),
		("gg", M(FirstLine)),
		("G", M(LastLine)),
		("f", Binding::Char(CharArg::Find { forward: true, till: false })),
		("F", Binding::Char(CharArg::Find { forward: false, till: false })),
		("t", Binding::Char(CharArg::Find { forward: true, till: true })),
		("T", Binding::Char(CharArg::Find { forward: false, till: true })),
		(";", M(RepeatFind { reverse: false })),
		(",", M(RepeatFind { reverse: true })),
		("}", M(ParagraphForward)),
		("{", M(ParagraphBackward)),
		("%", M(MatchPair)),
		("'", Binding::Char(CharArg::GotoMark { linewise: true })),
		("`", Binding::Char(CharArg::GotoMark { linewise: false })),
		("n", M(SearchNext { reverse: false })),
		("N", M(SearchNext { reverse: true })),
		("*", M(SearchWord { forward: true })),
		("#", M(SearchWord { forward: false })),
		("/", Binding::CmdLine(CmdLineKind::SearchForward)),
		("?", Binding::CmdLine(CmdLineKind::SearchBackward)),
	]
}

fn normal_only() -> Vec<(&'static str, Binding)> {
	use Binding::{Action as A, Alias};
	use Operator::*;
	let mut table: Vec<(&'static str, Binding)> = Operator::ALL.iter().map(|op| (op.keys(), Binding::Operator(*op))).collect();
	table.extend([
		("x", Alias(Delete, OperatorTarget::Motion(Motion::Right))),
		("<Del>", Alias(Delete, OperatorTarget::Motion(Motion::Right))),
		("X", Alias(Delete, OperatorTarget::Motion(Motion::Left))),
		("D", Alias(Delete, OperatorTarget::Motion(Motion::LineEnd))),
		("C", Alias(Change, OperatorTarget::Motion(Motion::LineEnd))),
		("s", Alias(Change, OperatorTarget::Motion(Motion::Right))),
		("S", Alias(Change, OperatorTarget::Lines)),
		("Y", Alias(Yank, OperatorTarget::Lines)),
		("p", A(Action::Put { before: false, cursor_after: false })),
		("P", A(Action::Put { before: true, cursor_after: false })),
		("gp", A(Action::Put { before: false, cursor_after: true })),
		("gP", A(Action::Put { before: true, cursor_after: true })),
		("r", Binding::Char(CharArg::Replace)),
		("~", A(Action::ToggleCaseChar)),
		("\\r", A(Action::ReverseLine)),
		("J", A(Action::Join { spaces: true })),
		("gJ", A(Action::Join { spaces: false })),
		("i", A(Action::Insert(InsertEntry::Before))),
		("<Insert>", A(Action::Insert(InsertEntry::Before))),
		("a", A(Action::Insert(InsertEntry::After))),
		("I", A(Action::Insert(InsertEntry::LineStart))),
		("gI", A(Action::Insert(InsertEntry::LineColumnZero))),
		("A", A(Action::Insert(InsertEntry::LineEnd))),
		("o", A(Action::Insert(InsertEntry::OpenBelow))),
		("O", A(Action::Insert(InsertEntry::OpenAbove))),
		("R", A(Action::EnterReplace)),
		("v", A(Action::Visual(VisualKind::Char))),
		("V", A(Action::Visual(VisualKind::Line))),
		("<C-V>", A(Action::Visual(VisualKind::Block))),
		("gv", A(Action::Reselect)),
		("gh", A(Action::Select(VisualKind::Char))),
		("gH", A(Action::Select(VisualKind::Line))),
		("g<C-H>", A(Action::Select(VisualKind::Block))),
		("m", Binding::Char(CharArg::SetMark)),
		("u", A(Action::Undo)),
		("<C-R>", A(Action::Redo)),
		(".", A(Action::Repeat)),
		("zh", A(Action::ScrollColumns { right: false })),
		("z<Left>", A(Action::ScrollColumns { right: false })),
		("zl", A(Action::ScrollColumns { right: true })),
		("z<Right>", A(Action::ScrollColumns { right: true })),
		("<C-A>", A(Action::Increment { negate: false })),
		("<C-X>", A(Action::Increment { negate: true })),
		("q", Binding::Char(CharArg::Record)),
		("@", Binding::Char(CharArg::Play)),
		("\"", Binding::Char(CharArg::Register)),
		(":", Binding::CmdLine(CmdLineKind::Ex)),
	]);
	table
}

fn visual_only() -> Vec<(&'static str, Binding)> {
	use Binding::Action as A;
	use Operator::*;
	let operate = |operator, linewise| A(Action::VisualOperate { operator, linewise });
	vec![
		("d", operate(Delete, false)),
		("x", operate(Delete, false)),
		("<Del>", operate(Delete, false)),
		("X", operate(Delete, true)),
		("D", operate(Delete, true)),
		("c", operate(Change, false)),
		("s", operate(Change, false)),
		("C", operate(Change, true)),
		("S", operate(Change, true)),
		("R", operate(Change, true)),
		("y", operate(Yank, false)),
		("Y", operate(Yank, true)),
		(">", operate(ShiftRight, false)),
		("<lt>", operate(ShiftLeft, false)),
		("~", operate(ToggleCase, false)),
		("g~", operate(ToggleCase, false)),
		("u", operate(Lowercase, false)),
		("gu", operate(Lowercase, false)),
		("U", operate(Uppercase, false)),
		("gU", operate(Uppercase, false)),
		("J", A(Action::Join { spaces: true })),
		("gJ", A(Action::Join { spaces: false })),
		("r", Binding::Char(CharArg::Replace)),
		("p", A(Action::Put { before: false, cursor_after: false })),
		("P", A(Action::Put { before: true, cursor_after: false })),
		("I", A(Action::BlockInsert { append: false })),
		("A", A(Action::BlockInsert { append: true })),
		("o", A(Action::SwapEnds { block_corner: false })),
		("O", A(Action::SwapEnds { block_corner: true })),
		("v", A(Action::Visual(VisualKind::Char))),
		("V", A(Action::Visual(VisualKind::Line))),
		("<C-V>", A(Action::Visual(VisualKind::Block))),
		("gv", A(Action::Reselect)),
		("<C-G>", A(Action::ToggleSelect)),
		("i", Binding::Char(CharArg::Object { inner: true })),
		("a", Binding::Char(CharArg::Object { inner: false })),
		("\"", Binding::Char(CharArg::Register)),
		(":", Binding::CmdLine(CmdLineKind::Ex)),
	]
}
