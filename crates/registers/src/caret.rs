use viper_primitives::{Key, SelectionType};

use crate::error::RegisterError;
use crate::register::{Register, RegisterName};
use crate::store::{RegisterStore, Slots};

/// Recordable registers owned by one caret.
///
/// With several carets each secondary caret yanks into and puts from its
/// own unnamed, numbered, named and small-delete registers. The primary
/// caret, and every other register name, go straight to the session store.
#[derive(Debug, Clone, Default)]
pub struct CaretRegisters {
	slots: Slots,
}

impl CaretRegisters {
	pub fn new() -> Self {
		Self::default()
	}

	fn is_local(is_primary: bool, name: char) -> bool {
		!is_primary && RegisterName::is_recordable(name)
	}

	pub fn store_text(
		&mut self,
		store: &mut RegisterStore,
		is_primary: bool,
		register: Option<char>,
		text: &str,
		kind: SelectionType,
		is_delete: bool,
	) -> bool {
		let name = register.unwrap_or(RegisterName::UNNAMED);
		if !Self::is_local(is_primary, name) {
			return store.store_text(register, text, kind, is_delete);
		}
		self.slots.store(register, text, kind, is_delete);
		true
	}

	/// Reads `name` for this caret. A secondary caret that never wrote a
	/// recordable register sees the session value.
	pub fn get_register(&self, store: &RegisterStore, is_primary: bool, name: char) -> Option<Register> {
		let slot = RegisterName::canonical(name);
		if Self::is_local(is_primary, name)
			&& let Some(register) = self.slots.get(slot)
		{
			return Some(register.clone());
		}
		store.get_register(name)
	}

	pub fn set_keys(&mut self, store: &mut RegisterStore, is_primary: bool, name: char, keys: &[Key]) -> bool {
		if !Self::is_local(is_primary, name) {
			return store.set_keys(name, keys);
		}
		let slot = RegisterName::canonical(name);
		let mut all = match self.slots.get(slot) {
			Some(existing) if RegisterName::is_append(name) => existing.keys(),
			_ => Vec::new(),
		};
		all.extend_from_slice(keys);
		self.slots.put(Register::from_keys(slot, all));
		true
	}

	pub fn save_register(
		&mut self,
		store: &mut RegisterStore,
		is_primary: bool,
		name: char,
		register: Register,
	) -> Result<(), RegisterError> {
		if !Self::is_local(is_primary, name) {
			return store.save_register(name, register);
		}
		self.slots.write(name, &register.text, register.kind);
		Ok(())
	}
}
