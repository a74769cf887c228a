//! Vim key notation.
//!
//! ```text
//! sequence = (special | char)*
//! special  = "<" modifier* name ">"
//! modifier = ("C" | "A" | "M" | "S") "-"
//! name     = "Esc" | "CR" | "BS" | "Del" | "Tab" | "Space" | "lt" | ... | char
//! ```
//!
//! A `<` that does not start a well-formed special key is taken literally,
//! matching Vim's behaviour for `:normal` and mappings.

use std::str::FromStr;

use thiserror::Error;

use super::{Key, KeyCode, Modifiers};

/// Errors from parsing a single key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
	#[error("empty key notation")]
	Empty,
	#[error("expected a single key, found {count} in {notation:?}")]
	Multiple { notation: String, count: usize },
}

/// Parses Vim key notation into a key sequence.
pub fn parse_keys(notation: &str) -> Vec<Key> {
	let mut parser = Parser::new(notation);
	let mut keys = Vec::new();
	while let Some(key) = parser.next_key() {
		keys.push(key);
	}
	keys
}

/// Writes a key sequence back as Vim key notation.
pub fn keys_to_string(keys: &[Key]) -> String {
	keys.iter().map(ToString::to_string).collect()
}

impl FromStr for Key {
	type Err = KeyParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let keys = parse_keys(s);
		match keys.as_slice() {
			[] => Err(KeyParseError::Empty),
			[key] => Ok(*key),
			_ => Err(KeyParseError::Multiple {
				notation: s.to_string(),
				count: keys.len(),
			}),
		}
	}
}

struct Parser<'a> {
	input: &'a str,
}

impl<'a> Parser<'a> {
	fn new(input: &'a str) -> Self {
		Self { input }
	}

	fn next_key(&mut self) -> Option<Key> {
		let ch = self.input.chars().next()?;
		if ch == '<'
			&& let Some((key, consumed)) = parse_special(self.input)
		{
			self.input = &self.input[consumed..];
			return Some(key);
		}
		self.input = &self.input[ch.len_utf8()..];
		Some(Key::char(ch))
	}
}

/// Parses `<...>` at the start of `input`, returning the key and the byte
/// length consumed.
fn parse_special(input: &str) -> Option<(Key, usize)> {
	let close = input[1..].find('>')? + 1;
	let body = &input[1..close];
	if body.is_empty() {
		return None;
	}

	let mut modifiers = Modifiers::NONE;
	let mut rest = body;
	while rest.len() > 2 && rest.as_bytes()[1] == b'-' {
		match rest.as_bytes()[0].to_ascii_uppercase() {
			b'C' => modifiers.ctrl = true,
			b'A' | b'M' => modifiers.alt = true,
			b'S' => modifiers.shift = true,
			_ => return None,
		}
		rest = &rest[2..];
	}

	let code = named_code(rest).or_else(|| {
		let mut chars = rest.chars();
		let c = chars.next()?;
		chars.next().is_none().then_some(KeyCode::Char(c))
	})?;

	let key = match code {
		KeyCode::Char(c) if modifiers.shift && !modifiers.ctrl => Key {
			code: KeyCode::Char(c.to_uppercase().next().unwrap_or(c)),
			modifiers: Modifiers { shift: false, ..modifiers },
		},
		KeyCode::Char(c) if modifiers.ctrl => Key {
			code: KeyCode::Char(c.to_ascii_lowercase()),
			modifiers: Modifiers { shift: false, ..modifiers },
		},
		code => Key { code, modifiers },
	};
	Some((key, close + 1))
}

fn named_code(name: &str) -> Option<KeyCode> {
	let lower = name.to_ascii_lowercase();
	let code = match lower.as_str() {
		"esc" => KeyCode::Esc,
		"cr" | "enter" | "return" | "nl" => KeyCode::Enter,
		"bs" | "backspace" => KeyCode::Backspace,
		"del" | "delete" => KeyCode::Delete,
		"tab" => KeyCode::Tab,
		"space" => KeyCode::Char(' '),
		"lt" => KeyCode::Char('<'),
		"bar" => KeyCode::Char('|'),
		"bslash" => KeyCode::Char('\\'),
		"insert" => KeyCode::Insert,
		"home" => KeyCode::Home,
		"end" => KeyCode::End,
		"pageup" => KeyCode::PageUp,
		"pagedown" => KeyCode::PageDown,
		"up" => KeyCode::Up,
		"down" => KeyCode::Down,
		"left" => KeyCode::Left,
		"right" => KeyCode::Right,
		_ => {
			let n = lower.strip_prefix('f')?.parse::<u8>().ok()?;
			if !(1..=12).contains(&n) {
				return None;
			}
			KeyCode::F(n)
		}
	};
	Some(code)
}
