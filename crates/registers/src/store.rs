use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use viper_primitives::{Key, SelectionType};

use crate::clipboard::{Clipboard, ClipboardSelection, MemoryClipboard};
use crate::error::RegisterError;
use crate::register::{Register, RegisterName};

/// How the unnamed register relates to the system clipboard (`'clipboard'`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipboardMode {
	#[default]
	Off,
	/// `unnamed`: unnamed writes also go to `*`.
	Unnamed,
	/// `unnamedplus`: unnamed writes also go to `+`.
	UnnamedPlus,
}

impl ClipboardMode {
	fn selection(self) -> Option<ClipboardSelection> {
		match self {
			Self::Off => None,
			Self::Unnamed => Some(ClipboardSelection::Primary),
			Self::UnnamedPlus => Some(ClipboardSelection::Clipboard),
		}
	}
}

/// Register slots with Vim's yank/delete bookkeeping, shared by the session
/// store and the caret-local stores.
#[derive(Debug, Clone, Default)]
pub(crate) struct Slots {
	map: FxHashMap<char, Register>,
}

impl Slots {
	pub(crate) fn get(&self, name: char) -> Option<&Register> {
		self.map.get(&name)
	}

	pub(crate) fn put(&mut self, register: Register) {
		self.map.insert(register.name, register);
	}

	/// Writes `name`, appending for uppercase names. Returns the resulting
	/// register.
	pub(crate) fn write(&mut self, name: char, text: &str, kind: SelectionType) -> Register {
		let slot = RegisterName::canonical(name);
		if RegisterName::is_append(name)
			&& let Some(existing) = self.map.get_mut(&slot)
		{
			existing.append(text, kind);
			return existing.clone();
		}
		let register = Register::new(slot, text, kind);
		self.map.insert(slot, register.clone());
		register
	}

	/// Stores yanked or deleted text for the recordable names. `None` (or `"`)
	/// is the default target: yanks fill `0`, deletes of a line or more shift
	/// the `1`-`9` ring and smaller deletes fill `-`.
	pub(crate) fn store(&mut self, name: Option<char>, text: &str, kind: SelectionType, is_delete: bool) -> Register {
		let register = match name.filter(|&n| n != RegisterName::UNNAMED) {
			Some(name) => self.write(name, text, kind),
			None if !is_delete => self.write('0', text, kind),
			None if kind == SelectionType::LineWise || text.contains('\n') => {
				self.shift_ring();
				self.write('1', text, kind)
			}
			None => self.write(RegisterName::SMALL_DELETE, text, kind),
		};
		self.set_unnamed(&register);
		register
	}

	/// Points the unnamed register at a copy of `register`.
	pub(crate) fn set_unnamed(&mut self, register: &Register) {
		self.map.insert(
			RegisterName::UNNAMED,
			Register {
				name: RegisterName::UNNAMED,
				is_clipboard: false,
				..register.clone()
			},
		);
	}

	/// `"8` moves to `"9`, ..., `"1` to `"2`; the old `"9` is dropped.
	fn shift_ring(&mut self) {
		for n in (1..9u8).rev() {
			let from = char::from(b'0' + n);
			let to = char::from(b'0' + n + 1);
			match self.map.remove(&from) {
				Some(mut register) => {
					register.name = to;
					self.map.insert(to, register);
				}
				None => {
					self.map.remove(&to);
				}
			}
		}
	}
}

/// Session-wide register storage.
///
/// One store outlives every editor in a session and is passed explicitly to
/// whatever reads or writes registers. It also tracks macro recording and
/// the last played macro for `@@`.
#[derive(Debug)]
pub struct RegisterStore {
	slots: Slots,
	clipboard: Box<dyn Clipboard>,
	clipboard_mode: ClipboardMode,
	last_played: Option<char>,
	recording: Option<(char, Vec<Key>)>,
}

impl Default for RegisterStore {
	fn default() -> Self {
		Self::new()
	}
}

impl RegisterStore {
	pub fn new() -> Self {
		Self::with_clipboard(Box::new(MemoryClipboard::default()))
	}

	pub fn with_clipboard(clipboard: Box<dyn Clipboard>) -> Self {
		Self {
			slots: Slots::default(),
			clipboard,
			clipboard_mode: ClipboardMode::Off,
			last_played: None,
			recording: None,
		}
	}

	pub fn clipboard_mode(&self) -> ClipboardMode {
		self.clipboard_mode
	}

	pub fn set_clipboard_mode(&mut self, mode: ClipboardMode) {
		self.clipboard_mode = mode;
	}

	/// Fails for names that cannot be written by yank, delete or `q`.
	pub fn check_writable(&self, name: char) -> Result<(), RegisterError> {
		if !RegisterName::is_valid(name) {
			return Err(RegisterError::InvalidName(name));
		}
		if RegisterName::is_read_only(name) {
			return Err(RegisterError::ReadOnly(name));
		}
		Ok(())
	}

	/// Stores yanked or deleted text.
	///
	/// `register` is the `"x` prefix, if any. The unnamed register always
	/// follows the write except for the black hole register. Returns false
	/// (and changes nothing) for invalid or read-only names.
	pub fn store_text(&mut self, register: Option<char>, text: &str, kind: SelectionType, is_delete: bool) -> bool {
		let name = register.unwrap_or(RegisterName::UNNAMED);
		if name == RegisterName::BLACK_HOLE {
			return true;
		}
		if self.check_writable(name).is_err() {
			debug!(register = %name, "register write rejected");
			return false;
		}

		if let Some(selection) = ClipboardSelection::from_register(name) {
			self.clipboard.set(selection, text, kind);
			let register = Register::new(name, text, kind);
			self.slots.set_unnamed(&register);
			self.slots.put(register);
		} else {
			self.slots.store(register, text, kind, is_delete);
			if name == RegisterName::UNNAMED
				&& let Some(selection) = self.clipboard_mode.selection()
			{
				self.clipboard.set(selection, text, kind);
			}
		}
		debug!(register = %name, ?kind, is_delete, len = text.len(), "stored text");
		true
	}

	/// Reads a register. Uppercase names read their lowercase register; `+`
	/// and `*` read the clipboard.
	pub fn get_register(&self, name: char) -> Option<Register> {
		let slot = RegisterName::canonical(name);
		if let Some(selection) = ClipboardSelection::from_register(slot) {
			return self
				.clipboard
				.get(selection)
				.map(|(text, kind)| Register::new(slot, text, kind));
		}
		if slot == RegisterName::UNNAMED
			&& let Some(selection) = self.clipboard_mode.selection()
			&& let Some((text, kind)) = self.clipboard.get(selection)
		{
			return Some(Register::new(slot, text, kind));
		}
		self.slots.get(slot).cloned()
	}

	/// Stores a key sequence, as a finished `q` recording does.
	pub fn set_keys(&mut self, name: char, keys: &[Key]) -> bool {
		if name == RegisterName::BLACK_HOLE {
			return true;
		}
		if self.check_writable(name).is_err() || RegisterName::is_clipboard(name) {
			return false;
		}
		let slot = RegisterName::canonical(name);
		let mut all = match self.slots.get(slot) {
			Some(existing) if RegisterName::is_append(name) => existing.keys(),
			_ => Vec::new(),
		};
		all.extend_from_slice(keys);
		self.slots.put(Register::from_keys(slot, all));
		trace!(register = %slot, keys = keys.len(), "stored keys");
		true
	}

	pub fn get_keys(&self, name: char) -> Option<Vec<Key>> {
		self.get_register(name).map(|r| r.keys())
	}

	/// Overwrites a register verbatim, as `:let @a = ...` and `setreg()` do.
	///
	/// Unlike [`store_text`](Self::store_text) this may set `/`.
	pub fn save_register(&mut self, name: char, register: Register) -> Result<(), RegisterError> {
		if !RegisterName::is_valid(name) {
			return Err(RegisterError::InvalidName(name));
		}
		match name {
			RegisterName::BLACK_HOLE => Ok(()),
			'.' | ':' => Err(RegisterError::ReadOnly(name)),
			_ => {
				if let Some(selection) = ClipboardSelection::from_register(name) {
					self.clipboard.set(selection, &register.text, register.kind);
				}
				if RegisterName::is_append(name) && self.slots.get(RegisterName::canonical(name)).is_some() {
					self.slots.write(name, &register.text, register.kind);
				} else {
					let slot = RegisterName::canonical(name);
					self.slots.put(Register {
						name: slot,
						is_clipboard: RegisterName::is_clipboard(slot),
						..register
					});
				}
				Ok(())
			}
		}
	}

	/// Text typed during the last insert, for `".`.
	pub fn set_last_inserted(&mut self, text: &str) {
		self.slots.put(Register::new(RegisterName::LAST_INSERTED, text, SelectionType::CharacterWise));
	}

	/// The last executed command line, for `":` and `@:`.
	pub fn set_last_command(&mut self, text: &str) {
		self.slots.put(Register::new(RegisterName::LAST_COMMAND, text, SelectionType::CharacterWise));
	}

	/// The last search pattern, for `"/`.
	pub fn set_last_search(&mut self, pattern: &str) {
		self.slots.put(Register::new(RegisterName::LAST_SEARCH, pattern, SelectionType::CharacterWise));
	}

	/// Keys to replay for `@{name}`. `@` repeats the last played register and
	/// `:` replays the last command line.
	pub fn macro_keys(&mut self, name: char) -> Result<Vec<Key>, RegisterError> {
		let name = if name == '@' {
			self.last_played.ok_or(RegisterError::Empty('@'))?
		} else {
			name
		};
		if !RegisterName::is_valid(name) || name == RegisterName::BLACK_HOLE {
			return Err(RegisterError::InvalidName(name));
		}
		let register = self.get_register(name).ok_or(RegisterError::Empty(name))?;
		self.last_played = Some(name);
		if name == RegisterName::LAST_COMMAND {
			let mut keys = vec![Key::char(':')];
			keys.extend(register.text.chars().map(Key::char));
			keys.push(Key::ENTER);
			return Ok(keys);
		}
		Ok(register.keys())
	}

	pub fn last_played(&self) -> Option<char> {
		self.last_played
	}

	/// Starts `q{name}`.
	pub fn start_recording(&mut self, name: char) -> Result<(), RegisterError> {
		if !(name.is_ascii_alphanumeric() || name == RegisterName::UNNAMED) {
			return Err(RegisterError::InvalidName(name));
		}
		debug!(register = %name, "recording started");
		self.recording = Some((name, Vec::new()));
		Ok(())
	}

	pub fn recording(&self) -> Option<char> {
		self.recording.as_ref().map(|(name, _)| *name)
	}

	pub fn record_key(&mut self, key: Key) {
		if let Some((_, keys)) = &mut self.recording {
			keys.push(key);
		}
	}

	/// Ends the recording and stores its keys. Returns the register name.
	pub fn finish_recording(&mut self) -> Option<char> {
		let (name, keys) = self.recording.take()?;
		self.set_keys(name, &keys);
		debug!(register = %name, keys = keys.len(), "recording finished");
		Some(name)
	}

	/// Non-empty registers in `:registers` order.
	pub fn list(&self) -> Vec<Register> {
		RegisterName::ORDER.chars().filter_map(|name| self.get_register(name)).filter(|r| !r.text.is_empty()).collect()
	}
}
