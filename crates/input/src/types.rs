use viper_primitives::{CmdLineKind, Operator, VisualKind};

/// Word flavour for word motions and objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordType {
	/// Keyword characters and punctuation runs are separate words (`w`).
	Word,
	/// Any run of non-blank characters is one word (`W`).
	BigWord,
}

/// How a motion's range is interpreted by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
	/// The character at the far end is not included.
	Exclusive,
	/// The character at the far end is included.
	Inclusive,
	/// Whole lines from start to end are included.
	Linewise,
}

/// A caret motion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Motion {
	Left,
	Right,
	/// `<BS>`: left, wrapping to the previous line per `whichwrap`.
	Backspace,
	/// `<Space>`: right, wrapping to the next line per `whichwrap`.
	Space,
	Up,
	Down,
	/// `+` / `<CR>`.
	NextLineStart,
	/// `-`.
	PrevLineStart,
	/// `_`: first non-blank of the line `count - 1` lines down.
	CurrentLineStart,
	WordForward(WordType),
	WordBackward(WordType),
	WordEnd(WordType),
	WordEndBackward(WordType),
	/// `0`.
	LineStart,
	/// `^`.
	FirstNonBlank,
	/// `$`.
	LineEnd,
	/// `|`: column `count`.
	Column,
	/// `gg`: line `count`, default first.
	FirstLine,
	/// `G`: line `count`, default last.
	LastLine,
	FindChar {
		target: char,
		forward: bool,
		till: bool,
	},
	/// `;` and `,`.
	RepeatFind {
		reverse: bool,
	},
	ParagraphForward,
	ParagraphBackward,
	/// `%`.
	MatchPair,
	/// `'x` (linewise) and `` `x `` (exact).
	Mark {
		name: char,
		linewise: bool,
	},
	/// `/pattern` and `?pattern` after `<CR>`.
	Search {
		pattern: String,
		forward: bool,
	},
	/// `n` and `N`.
	SearchNext {
		reverse: bool,
	},
	/// `*` and `#`.
	SearchWord {
		forward: bool,
	},
}

impl Motion {
	/// Returns the static kind of this motion.
	///
	/// `;` and `,` report [`MotionKind::Exclusive`] here; their real kind
	/// depends on the find they repeat and is decided by the resolver.
	pub fn kind(&self) -> MotionKind {
		use Motion::*;
		match self {
			Up | Down | NextLineStart | PrevLineStart | CurrentLineStart | FirstLine | LastLine => MotionKind::Linewise,
			Mark { linewise: true, .. } => MotionKind::Linewise,
			WordEnd(_) | WordEndBackward(_) | LineEnd | MatchPair => MotionKind::Inclusive,
			FindChar { forward: true, .. } => MotionKind::Inclusive,
			_ => MotionKind::Exclusive,
		}
	}

	/// Returns true for motions that set the `'` mark before jumping.
	pub fn is_jump(&self) -> bool {
		matches!(
			self,
			Motion::FirstLine
				| Motion::LastLine
				| Motion::ParagraphForward
				| Motion::ParagraphBackward
				| Motion::MatchPair
				| Motion::Mark { .. }
				| Motion::Search { .. }
				| Motion::SearchNext { .. }
				| Motion::SearchWord { .. }
		)
	}

	/// Returns true if the motion keeps the remembered column (`j`, `k`).
	pub fn keeps_column(&self) -> bool {
		matches!(self, Motion::Up | Motion::Down)
	}
}

/// Text object flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
	Word(WordType),
	Paragraph,
	Bracket { open: char, close: char },
	Quote(char),
}

impl ObjectKind {
	/// Maps the key after `i`/`a` to an object.
	pub fn from_char(c: char) -> Option<Self> {
		Some(match c {
			'w' => Self::Word(WordType::Word),
			'W' => Self::Word(WordType::BigWord),
			'p' => Self::Paragraph,
			'(' | ')' | 'b' => Self::Bracket { open: '(', close: ')' },
			'{' | '}' | 'B' => Self::Bracket { open: '{', close: '}' },
			'[' | ']' => Self::Bracket { open: '[', close: ']' },
			'<' | '>' => Self::Bracket { open: '<', close: '>' },
			'"' | '\'' | '`' => Self::Quote(c),
			_ => return None,
		})
	}
}

/// A text object such as `iw` or `a(`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextObject {
	pub kind: ObjectKind,
	pub inner: bool,
}

/// What an operator acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorTarget {
	Motion(Motion),
	Object(TextObject),
	/// The doubled operator (`dd`, `>>`, `guu`): `count` whole lines.
	Lines,
}

/// Where insert mode starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertEntry {
	/// `i`.
	Before,
	/// `a`.
	After,
	/// `I`.
	LineStart,
	/// `gI`: column 0.
	LineColumnZero,
	/// `A`.
	LineEnd,
	/// `o`.
	OpenBelow,
	/// `O`.
	OpenAbove,
}

/// A complete editing request produced by the key interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
	Move(Motion),
	Operate {
		operator: Operator,
		target: OperatorTarget,
		/// Count typed after the operator; multiplied with the command count.
		motion_count: Option<usize>,
	},
	/// `d`, `>` and friends in visual mode. `linewise` forces whole lines
	/// (`D`, `X`, `Y`, `R`, `S`, `C`).
	VisualOperate {
		operator: Operator,
		linewise: bool,
	},
	/// Extend the visual selection over a text object.
	SelectObject(TextObject),
	/// `p`, `P`, `gp`, `gP`; in visual mode replaces the selection.
	Put {
		before: bool,
		cursor_after: bool,
	},
	/// `r{char}`.
	ReplaceChar(char),
	/// `~` in normal mode.
	ToggleCaseChar,
	/// `\r`: the current line, back to front.
	ReverseLine,
	/// `J` and `gJ`.
	Join {
		spaces: bool,
	},
	Insert(InsertEntry),
	/// `I` and `A` on a block selection.
	BlockInsert {
		append: bool,
	},
	EnterReplace,
	/// `v`, `V`, `<C-V>` from normal or visual mode.
	Visual(VisualKind),
	/// `gh`, `gH`, `g<C-H>`.
	Select(VisualKind),
	/// `gv`.
	Reselect,
	/// `o` in visual mode; `block_corner` for `O` on a block.
	SwapEnds {
		block_corner: bool,
	},
	/// `<C-G>` in visual or select mode.
	ToggleSelect,
	/// `<Esc>` out of visual or select mode.
	ExitVisual,
	SetMark(char),
	Undo,
	Redo,
	/// `.`.
	Repeat,
	/// `zh`/`zl` scroll by `count` columns.
	ScrollColumns {
		right: bool,
	},
	/// `<C-A>` and `<C-X>`.
	Increment {
		negate: bool,
	},
	StartRecording(char),
	StopRecording,
	/// `@{reg}`; `@@` replays the last played register, `@:` the last ex line.
	PlayMacro(char),

	/// Typed text in insert mode.
	InsertChar(char),
	InsertNewline,
	InsertTab,
	InsertBackspace,
	InsertDelete,
	/// `<C-W>`.
	DeleteWordBefore,
	/// `<C-U>`.
	DeleteLineBefore,
	/// `<C-T>` / `<C-D>`.
	ShiftLine {
		right: bool,
	},
	/// `<C-R>{reg}`.
	InsertRegister(char),
	/// Arrow keys and friends while inserting.
	InsertMove(Motion),
	/// `<Esc>` out of insert or replace mode.
	ExitInsert,
	/// Printable text typed over a select-mode selection.
	SelectReplace(char),
	/// `<BS>` or `<Del>` on a select-mode selection.
	SelectDelete,

	/// The command line opened or its text changed.
	CmdLineChanged,
	/// `<CR>` on an ex command line.
	ExecuteEx(String),
	/// The command line was abandoned.
	CmdLineCancelled,
}

impl Action {
	/// Returns true if `.` should repeat this action.
	pub fn is_repeatable(&self) -> bool {
		match self {
			Action::Operate { operator, .. } | Action::VisualOperate { operator, .. } => operator.modifies_buffer(),
			Action::Put { .. }
			| Action::ReplaceChar(_)
			| Action::ToggleCaseChar
			| Action::ReverseLine
			| Action::Join { .. }
			| Action::Insert(_)
			| Action::BlockInsert { .. }
			| Action::EnterReplace
			| Action::Increment { .. } => true,
			_ => false,
		}
	}
}

/// An action with its count and register prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
	/// Count typed before the command; `None` when absent.
	pub count: Option<usize>,
	pub register: Option<char>,
	pub action: Action,
}

impl Command {
	pub fn new(action: Action) -> Self {
		Self {
			count: None,
			register: None,
			action,
		}
	}

	/// Returns the count, defaulting to one.
	pub fn count1(&self) -> usize {
		self.count.unwrap_or(1).max(1)
	}
}

/// Result of feeding one key to the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult {
	/// The key was consumed and more keys are needed.
	Pending,
	/// A command is complete.
	Command(Command),
	/// `<Esc>` discarded a partially typed command.
	Cancelled,
	/// The key has no meaning here; partial state was discarded.
	Unhandled,
}

/// The argument kind a pending key is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharArg {
	Find { forward: bool, till: bool },
	Replace,
	SetMark,
	GotoMark { linewise: bool },
	Register,
	Record,
	Play,
	Object { inner: bool },
	InsertRegister,
}

/// What a key sequence is bound to in a key table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Binding {
	Motion(Motion),
	Operator(Operator),
	/// A fixed action.
	Action(Action),
	/// An operator alias such as `x` (`dl`) or `D` (`d$`).
	Alias(Operator, OperatorTarget),
	/// Waits for one more character.
	Char(CharArg),
	/// Opens the command line.
	CmdLine(CmdLineKind),
}
