//! State shared by every editor of one application session.

use tracing::debug;
use viper_registers::{Clipboard, RegisterStore};
use viper_script::Interpreter;

use crate::options::{OptionValue, Options, OptionsError};

/// The last `/` or `?` search, for `n` and `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastSearch {
	pub pattern: String,
	pub forward: bool,
}

/// The last `f`, `F`, `t` or `T`, for `;` and `,`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastFind {
	pub target: char,
	pub forward: bool,
	pub till: bool,
}

/// Registers, options, script variables and search state.
///
/// One session outlives any editor; every editing call takes it explicitly
/// so editors opened side by side share registers and `:let` variables.
#[derive(Debug)]
pub struct Session {
	pub registers: RegisterStore,
	options: Options,
	pub(crate) script: Interpreter,
	pub(crate) last_search: Option<LastSearch>,
	pub(crate) last_find: Option<LastFind>,
	/// Replacement of the last `:s`, for `~` in the next one.
	pub(crate) last_replacement: Option<String>,
}

impl Default for Session {
	fn default() -> Self {
		Self::new(Options::default())
	}
}

impl Session {
	pub fn new(options: Options) -> Self {
		Self::with_registers(options, RegisterStore::new())
	}

	/// A session whose `+` and `*` registers go to `clipboard`.
	pub fn with_clipboard(options: Options, clipboard: Box<dyn Clipboard>) -> Self {
		Self::with_registers(options, RegisterStore::with_clipboard(clipboard))
	}

	fn with_registers(options: Options, registers: RegisterStore) -> Self {
		let mut session = Self {
			registers,
			options,
			script: Interpreter::new(),
			last_search: None,
			last_find: None,
			last_replacement: None,
		};
		session.apply_options();
		session
	}

	pub fn options(&self) -> &Options {
		&self.options
	}

	/// Replaces all options at once, e.g. after reloading the options file.
	pub fn set_options(&mut self, options: Options) {
		self.options = options;
		self.apply_options();
	}

	/// Sets one option by full or abbreviated name.
	pub fn set_option(&mut self, name: &str, value: OptionValue) -> Result<(), OptionsError> {
		self.options.set(name, value)?;
		self.apply_options();
		Ok(())
	}

	pub fn reset_option(&mut self, name: &str) -> Result<(), OptionsError> {
		self.options.reset(name)?;
		self.apply_options();
		Ok(())
	}

	pub fn last_search(&self) -> Option<&LastSearch> {
		self.last_search.as_ref()
	}

	pub(crate) fn set_last_search(&mut self, pattern: &str, forward: bool) {
		self.registers.set_last_search(pattern);
		self.last_search = Some(LastSearch {
			pattern: pattern.to_string(),
			forward,
		});
	}

	/// Pushes option values into the parts of the session that cache them.
	fn apply_options(&mut self) {
		self.registers.set_clipboard_mode(self.options.clipboard_mode());
		self.script.set_max_depth(self.options.maxfuncdepth);
		debug!(clipboard = ?self.options.clipboard_mode(), "session options applied");
	}
}

#[cfg(test)]
mod tests {
	use viper_primitives::SelectionType;
	use viper_registers::ClipboardMode;

	use super::*;

	#[test]
	fn clipboard_option_reaches_the_store() {
		let mut session = Session::default();
		assert_eq!(session.registers.clipboard_mode(), ClipboardMode::Off);
		session.set_option("clipboard", OptionValue::String("unnamedplus".into())).unwrap();
		assert_eq!(session.registers.clipboard_mode(), ClipboardMode::UnnamedPlus);
		session.registers.store_text(None, "x", SelectionType::CharacterWise, false);
		assert_eq!(session.registers.get_register('+').map(|r| r.text), Some("x".to_string()));
	}

	#[test]
	fn search_updates_the_register() {
		let mut session = Session::default();
		session.set_last_search("fo+", false);
		assert_eq!(session.registers.get_register('/').map(|r| r.text), Some("fo+".to_string()));
		assert!(!session.last_search().unwrap().forward);
	}
}
