//! Key representation for Vim-style input.
//!
//! Keys are delivered one at a time by the host. [`parse_keys`] turns Vim key
//! notation (`"d2w"`, `"<C-V>jj>"`, `"i<CR><Esc>"`) into a key sequence, and
//! [`Key`]'s `Display` writes the same notation back.

use std::fmt;

mod notation;
#[cfg(test)]
mod tests;

pub use notation::{KeyParseError, keys_to_string, parse_keys};

/// Key codes understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
	/// A printable character (space included).
	Char(char),
	Esc,
	Enter,
	Backspace,
	Delete,
	Tab,
	Insert,
	Home,
	End,
	PageUp,
	PageDown,
	Up,
	Down,
	Left,
	Right,
	/// Function key `F1`..`F12`.
	F(u8),
}

/// Key modifiers.
///
/// Shift is only meaningful for non-character keys: for characters it is
/// folded into the codepoint (`<S-a>` is `A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
	pub ctrl: bool,
	pub alt: bool,
	pub shift: bool,
}

impl Modifiers {
	pub const NONE: Self = Self {
		ctrl: false,
		alt: false,
		shift: false,
	};

	pub const CTRL: Self = Self { ctrl: true, ..Self::NONE };

	pub const ALT: Self = Self { alt: true, ..Self::NONE };

	pub const SHIFT: Self = Self { shift: true, ..Self::NONE };

	/// Returns true if no modifiers are set.
	pub const fn is_empty(self) -> bool {
		!self.ctrl && !self.alt && !self.shift
	}
}

/// A key with optional modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
	pub code: KeyCode,
	pub modifiers: Modifiers,
}

impl Key {
	pub const ESC: Self = Self::new(KeyCode::Esc);
	pub const ENTER: Self = Self::new(KeyCode::Enter);
	pub const BACKSPACE: Self = Self::new(KeyCode::Backspace);

	/// Creates a key from a character with no modifiers.
	pub const fn char(c: char) -> Self {
		Self::new(KeyCode::Char(c))
	}

	/// Creates a key from a key code with no modifiers.
	pub const fn new(code: KeyCode) -> Self {
		Self {
			code,
			modifiers: Modifiers::NONE,
		}
	}

	/// Creates a Ctrl chord. Letters are stored lowercase so `<C-v>` and
	/// `<C-V>` compare equal.
	pub const fn ctrl(c: char) -> Self {
		Self {
			code: KeyCode::Char(c.to_ascii_lowercase()),
			modifiers: Modifiers::CTRL,
		}
	}

	/// Returns the digit value for an unmodified digit key.
	pub fn as_digit(&self) -> Option<u32> {
		if self.modifiers.is_empty()
			&& let KeyCode::Char(c) = self.code
		{
			return c.to_digit(10);
		}
		None
	}

	/// Returns the character for an unmodified character key.
	pub fn printable(&self) -> Option<char> {
		match self.code {
			KeyCode::Char(c) if self.modifiers.is_empty() => Some(c),
			_ => None,
		}
	}

	/// Returns true for an unmodified character key equal to `c`.
	pub fn is_char(&self, c: char) -> bool {
		self.printable() == Some(c)
	}

	/// Returns true if this is `<C-c>` for the given letter.
	pub fn is_ctrl(&self, c: char) -> bool {
		self.modifiers == Modifiers::CTRL && self.code == KeyCode::Char(c.to_ascii_lowercase())
	}

	/// Returns true for `<Esc>` and its Ctrl-`[` alias.
	pub fn is_escape(&self) -> bool {
		(self.code == KeyCode::Esc && self.modifiers.is_empty()) || self.is_ctrl('[')
	}

	/// Returns true for `<CR>` and its `<C-M>`/`<C-J>` aliases.
	pub fn is_enter(&self) -> bool {
		(self.code == KeyCode::Enter && self.modifiers.is_empty()) || self.is_ctrl('m') || self.is_ctrl('j')
	}

	/// Returns true for `<BS>` and its `<C-H>` alias.
	pub fn is_backspace(&self) -> bool {
		(self.code == KeyCode::Backspace && self.modifiers.is_empty()) || self.is_ctrl('h')
	}

	/// Returns the raw character a register stores for this key, as Vim
	/// does when recording: `<Esc>` is `\x1b`, `<C-A>` is `\x01`. Keys with
	/// no single-character form (arrows, function keys) return `None`.
	pub fn to_raw_char(&self) -> Option<char> {
		match (self.code, self.modifiers) {
			(KeyCode::Char(c), m) if m.is_empty() => Some(c),
			(KeyCode::Char('['), Modifiers::CTRL) => Some('\x1b'),
			(KeyCode::Char(c), Modifiers::CTRL) if c.is_ascii_lowercase() => Some(char::from(c as u8 - b'a' + 1)),
			(KeyCode::Esc, m) if m.is_empty() => Some('\x1b'),
			(KeyCode::Enter, m) if m.is_empty() => Some('\r'),
			(KeyCode::Tab, m) if m.is_empty() => Some('\t'),
			(KeyCode::Backspace, m) if m.is_empty() => Some('\x08'),
			(KeyCode::Delete, m) if m.is_empty() => Some('\x7f'),
			_ => None,
		}
	}

	/// Inverse of [`Key::to_raw_char`], used to replay register text.
	pub fn from_raw_char(c: char) -> Self {
		match c {
			'\x1b' => Self::ESC,
			'\r' | '\n' => Self::ENTER,
			'\t' => Self::new(KeyCode::Tab),
			'\x08' => Self::BACKSPACE,
			'\x7f' => Self::new(KeyCode::Delete),
			'\x01'..='\x1a' => Self::ctrl(char::from(c as u8 - 1 + b'a')),
			c => Self::char(c),
		}
	}
}

impl From<char> for Key {
	fn from(c: char) -> Self {
		Self::char(c)
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self.code {
			KeyCode::Char(c) if self.modifiers.is_empty() => {
				return match c {
					'<' => f.write_str("<lt>"),
					' ' => f.write_str(" "),
					c => write!(f, "{c}"),
				};
			}
			KeyCode::Char(' ') => "Space".to_string(),
			KeyCode::Char('<') => "lt".to_string(),
			KeyCode::Char(c) if self.modifiers.ctrl => c.to_ascii_uppercase().to_string(),
			KeyCode::Char(c) => c.to_string(),
			KeyCode::Esc => "Esc".to_string(),
			KeyCode::Enter => "CR".to_string(),
			KeyCode::Backspace => "BS".to_string(),
			KeyCode::Delete => "Del".to_string(),
			KeyCode::Tab => "Tab".to_string(),
			KeyCode::Insert => "Insert".to_string(),
			KeyCode::Home => "Home".to_string(),
			KeyCode::End => "End".to_string(),
			KeyCode::PageUp => "PageUp".to_string(),
			KeyCode::PageDown => "PageDown".to_string(),
			KeyCode::Up => "Up".to_string(),
			KeyCode::Down => "Down".to_string(),
			KeyCode::Left => "Left".to_string(),
			KeyCode::Right => "Right".to_string(),
			KeyCode::F(n) => format!("F{n}"),
		};
		f.write_str("<")?;
		if self.modifiers.ctrl {
			f.write_str("C-")?;
		}
		if self.modifiers.alt {
			f.write_str("A-")?;
		}
		if self.modifiers.shift {
			f.write_str("S-")?;
		}
		write!(f, "{name}>")
	}
}
