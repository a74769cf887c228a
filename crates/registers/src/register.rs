use viper_primitives::{Key, SelectionType, keys_to_string};

/// Register name helpers.
///
/// Names follow Vim: `"` unnamed, `0`-`9` numbered, `a`-`z` named (`A`-`Z`
/// append), `-` small delete, `_` black hole, `+`/`*` clipboard and the
/// read-only `.`, `:` and `/`.
pub struct RegisterName;

impl RegisterName {
	pub const UNNAMED: char = '"';
	pub const SMALL_DELETE: char = '-';
	pub const BLACK_HOLE: char = '_';
	pub const LAST_INSERTED: char = '.';
	pub const LAST_COMMAND: char = ':';
	pub const LAST_SEARCH: char = '/';
	pub const CLIPBOARD: char = '+';
	pub const PRIMARY: char = '*';

	/// Every readable name, in the order `:registers` lists them.
	pub const ORDER: &'static str = "\"0123456789abcdefghijklmnopqrstuvwxyz-.:/+*";

	pub fn is_valid(name: char) -> bool {
		name.is_ascii_alphanumeric() || "\"-_.:/+*".contains(name)
	}

	/// Names a caret can keep locally: unnamed, numbered, named and small delete.
	pub fn is_recordable(name: char) -> bool {
		name.is_ascii_alphanumeric() || name == Self::UNNAMED || name == Self::SMALL_DELETE
	}

	pub fn is_read_only(name: char) -> bool {
		matches!(name, '.' | ':' | '/')
	}

	pub fn is_clipboard(name: char) -> bool {
		name == Self::CLIPBOARD || name == Self::PRIMARY
	}

	/// Uppercase names write to their lowercase register, appending.
	pub fn is_append(name: char) -> bool {
		name.is_ascii_uppercase()
	}

	/// The slot a name reads and writes.
	pub fn canonical(name: char) -> char {
		name.to_ascii_lowercase()
	}
}

/// Contents of one register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
	pub name: char,
	pub text: String,
	/// Keys recorded with `q`, kept so keys without a raw character survive.
	pub keys: Option<Vec<Key>>,
	pub kind: SelectionType,
	pub is_clipboard: bool,
}

impl Register {
	pub fn new(name: char, text: impl Into<String>, kind: SelectionType) -> Self {
		Self {
			name,
			text: text.into(),
			keys: None,
			kind,
			is_clipboard: RegisterName::is_clipboard(name),
		}
	}

	/// A register holding a recorded key sequence.
	pub fn from_keys(name: char, keys: Vec<Key>) -> Self {
		let text = keys_text(&keys);
		Self {
			keys: Some(keys),
			..Self::new(name, text, SelectionType::CharacterWise)
		}
	}

	/// The register content as keys, for `@`.
	pub fn keys(&self) -> Vec<Key> {
		match &self.keys {
			Some(keys) => keys.clone(),
			None => self.text.chars().map(Key::from_raw_char).collect(),
		}
	}

	pub fn is_linewise(&self) -> bool {
		self.kind == SelectionType::LineWise
	}

	/// Adds `text` of `kind` to the end, as `"Ay` does.
	pub(crate) fn append(&mut self, text: &str, kind: SelectionType) {
		match (self.kind, kind) {
			(SelectionType::LineWise, SelectionType::LineWise) => self.text.push_str(text),
			(SelectionType::LineWise, _) => {
				self.text.push_str(text);
				if !text.ends_with('\n') {
					self.text.push('\n');
				}
			}
			(_, SelectionType::LineWise) => {
				self.text.push('\n');
				self.text.push_str(text);
				self.kind = SelectionType::LineWise;
			}
			_ => self.text.push_str(text),
		}
		if let Some(keys) = &mut self.keys {
			keys.extend(text.chars().map(Key::from_raw_char));
		}
	}

	/// Text shown by `:registers`, with control characters in `^X` form.
	pub fn display_text(&self) -> String {
		if let Some(keys) = &self.keys
			&& keys.iter().any(|k| k.to_raw_char().is_none())
		{
			return keys_to_string(keys);
		}
		let mut out = String::with_capacity(self.text.len());
		for c in self.text.chars() {
			match c {
				'\n' => out.push_str("^J"),
				c if (c as u32) < 0x20 => {
					out.push('^');
					out.push(char::from(b'@' + c as u8));
				}
				'\u{7f}' => out.push_str("^?"),
				c => out.push(c),
			}
		}
		out
	}
}

fn keys_text(keys: &[Key]) -> String {
	keys.iter()
		.map(|k| match k.to_raw_char() {
			Some(c) => c.to_string(),
			None => keys_to_string(std::slice::from_ref(k)),
		})
		.collect()
}
