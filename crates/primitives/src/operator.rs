//! Operators: commands that need a target range before they run.

/// A pending operator.
///
/// This is a closed set; the engine maps every variant to a handler through a
/// dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
	/// `d`
	Delete,
	/// `c`
	Change,
	/// `y`
	Yank,
	/// `>`
	ShiftRight,
	/// `<`
	ShiftLeft,
	/// `g~`
	ToggleCase,
	/// `gu`
	Lowercase,
	/// `gU`
	Uppercase,
}

impl Operator {
	/// All operators, in key-table order.
	pub const ALL: [Operator; 8] = [
		Operator::Delete,
		Operator::Change,
		Operator::Yank,
		Operator::ShiftRight,
		Operator::ShiftLeft,
		Operator::ToggleCase,
		Operator::Lowercase,
		Operator::Uppercase,
	];

	/// Key sequence that triggers this operator in normal mode.
	pub fn keys(self) -> &'static str {
		match self {
			Operator::Delete => "d",
			Operator::Change => "c",
			Operator::Yank => "y",
			Operator::ShiftRight => ">",
			Operator::ShiftLeft => "<",
			Operator::ToggleCase => "g~",
			Operator::Lowercase => "gu",
			Operator::Uppercase => "gU",
		}
	}

	/// The character that, typed in operator-pending mode, makes the operator
	/// act on whole lines (`dd`, `g~~`, `gUU`).
	pub fn line_key(self) -> char {
		match self {
			Operator::Delete => 'd',
			Operator::Change => 'c',
			Operator::Yank => 'y',
			Operator::ShiftRight => '>',
			Operator::ShiftLeft => '<',
			Operator::ToggleCase => '~',
			Operator::Lowercase => 'u',
			Operator::Uppercase => 'U',
		}
	}

	/// Returns true if the operator modifies the buffer.
	pub fn modifies_buffer(self) -> bool {
		self != Operator::Yank
	}

	/// Returns true if the operator writes the operated text to a register.
	pub fn writes_register(self) -> bool {
		matches!(self, Operator::Delete | Operator::Change | Operator::Yank)
	}
}
