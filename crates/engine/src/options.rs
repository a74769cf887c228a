//! Editor options: loaded from TOML and changed with `:set`.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use viper_registers::ClipboardMode;

/// Errors from loading or setting options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
	#[error("invalid options file: {0}")]
	Parse(String),
	#[error("cannot read {path}: {message}")]
	Io { path: String, message: String },
	#[error("E518: Unknown option: {0}")]
	Unknown(String),
	#[error("E474: Invalid argument: {name}={value}")]
	InvalidValue { name: String, value: String },
	#[error("E521: Number required after =: {name}={value}")]
	NumberRequired { name: String, value: String },
	#[error("E487: Argument must be positive: {0}")]
	NotPositive(String),
}

impl From<toml::de::Error> for OptionsError {
	fn from(err: toml::de::Error) -> Self {
		Self::Parse(err.to_string())
	}
}

/// The value of one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
	Bool(bool),
	Number(usize),
	String(String),
}

impl OptionValue {
	/// Formats the value the way `:set opt?` shows it.
	pub fn display(&self, name: &str) -> String {
		match self {
			Self::Bool(true) => format!("  {name}"),
			Self::Bool(false) => format!("no{name}"),
			Self::Number(n) => format!("  {name}={n}"),
			Self::String(s) => format!("  {name}={s}"),
		}
	}
}

/// Option values.
///
/// Every field can be given in an options file:
///
/// ```toml
/// shiftwidth = 2
/// expandtab = false
/// clipboard = "unnamedplus"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
	pub shiftwidth: usize,
	pub tabstop: usize,
	pub expandtab: bool,
	pub shiftround: bool,
	/// Keys that wrap to the previous or next line: `b` (`<BS>`), `s` (`<Space>`).
	pub whichwrap: String,
	pub startofline: bool,
	pub ignorecase: bool,
	pub smartcase: bool,
	pub wrapscan: bool,
	/// Move the caret to the match while typing a search.
	pub incsearch: bool,
	/// `unnamed` and/or `unnamedplus`.
	pub clipboard: String,
	pub maxfuncdepth: usize,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			shiftwidth: 4,
			tabstop: 8,
			expandtab: true,
			shiftround: false,
			whichwrap: "b,s".to_string(),
			startofline: true,
			ignorecase: false,
			smartcase: false,
			wrapscan: true,
			incsearch: true,
			clipboard: String::new(),
			maxfuncdepth: viper_script::MAX_CALL_DEPTH,
		}
	}
}

/// Full option names with their abbreviations.
const NAMES: &[(&str, &str)] = &[
	("shiftwidth", "sw"),
	("tabstop", "ts"),
	("expandtab", "et"),
	("shiftround", "sr"),
	("whichwrap", "ww"),
	("startofline", "sol"),
	("ignorecase", "ic"),
	("smartcase", "scs"),
	("wrapscan", "ws"),
	("incsearch", "is"),
	("clipboard", "cb"),
	("maxfuncdepth", "mfd"),
];

impl Options {
	/// Parses an options file.
	pub fn from_toml(source: &str) -> Result<Self, OptionsError> {
		let options: Self = toml::from_str(source)?;
		options.validate()?;
		Ok(options)
	}

	/// Reads and parses an options file.
	pub fn load(path: &Path) -> Result<Self, OptionsError> {
		let source = std::fs::read_to_string(path).map_err(|err| OptionsError::Io {
			path: path.display().to_string(),
			message: err.to_string(),
		})?;
		let options = Self::from_toml(&source)?;
		debug!(path = %path.display(), "loaded options");
		Ok(options)
	}

	fn validate(&self) -> Result<(), OptionsError> {
		if self.tabstop == 0 {
			return Err(OptionsError::NotPositive("tabstop".into()));
		}
		if let Some(bad) = self.whichwrap.split(',').find(|item| !item.is_empty() && !is_whichwrap_item(item)) {
			return Err(OptionsError::InvalidValue {
				name: "whichwrap".into(),
				value: bad.into(),
			});
		}
		clipboard_mode(&self.clipboard)?;
		Ok(())
	}

	/// Full names of every option, in `:set` listing order.
	pub fn names() -> impl Iterator<Item = &'static str> {
		NAMES.iter().map(|(full, _)| *full)
	}

	/// Resolves an abbreviation to the full option name.
	pub fn canonical_name(name: &str) -> Option<&'static str> {
		NAMES.iter().find(|(full, short)| *full == name || *short == name).map(|(full, _)| *full)
	}

	/// Reads an option by full or abbreviated name.
	pub fn get(&self, name: &str) -> Result<OptionValue, OptionsError> {
		let name = Self::canonical_name(name).ok_or_else(|| OptionsError::Unknown(name.to_string()))?;
		Ok(match name {
			"shiftwidth" => OptionValue::Number(self.shiftwidth),
			"tabstop" => OptionValue::Number(self.tabstop),
			"expandtab" => OptionValue::Bool(self.expandtab),
			"shiftround" => OptionValue::Bool(self.shiftround),
			"whichwrap" => OptionValue::String(self.whichwrap.clone()),
			"startofline" => OptionValue::Bool(self.startofline),
			"ignorecase" => OptionValue::Bool(self.ignorecase),
			"smartcase" => OptionValue::Bool(self.smartcase),
			"wrapscan" => OptionValue::Bool(self.wrapscan),
			"incsearch" => OptionValue::Bool(self.incsearch),
			"clipboard" => OptionValue::String(self.clipboard.clone()),
			_ => OptionValue::Number(self.maxfuncdepth),
		})
	}

	/// Sets an option, checking the value's type and range.
	pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), OptionsError> {
		let full = Self::canonical_name(name).ok_or_else(|| OptionsError::Unknown(name.to_string()))?;
		let mut next = self.clone();
		match (full, value) {
			("shiftwidth", OptionValue::Number(n)) => next.shiftwidth = n,
			("tabstop", OptionValue::Number(n)) => next.tabstop = n,
			("maxfuncdepth", OptionValue::Number(n)) => next.maxfuncdepth = n,
			("expandtab", OptionValue::Bool(b)) => next.expandtab = b,
			("shiftround", OptionValue::Bool(b)) => next.shiftround = b,
			("startofline", OptionValue::Bool(b)) => next.startofline = b,
			("ignorecase", OptionValue::Bool(b)) => next.ignorecase = b,
			("smartcase", OptionValue::Bool(b)) => next.smartcase = b,
			("wrapscan", OptionValue::Bool(b)) => next.wrapscan = b,
			("incsearch", OptionValue::Bool(b)) => next.incsearch = b,
			("whichwrap", OptionValue::String(s)) => next.whichwrap = s,
			("clipboard", OptionValue::String(s)) => next.clipboard = s,
			(full, value) => {
				return Err(OptionsError::InvalidValue {
					name: full.to_string(),
					value: format!("{value:?}"),
				});
			}
		}
		next.validate()?;
		debug!(option = full, "option set");
		*self = next;
		Ok(())
	}

	/// Restores an option to its default (`:set opt&`).
	pub fn reset(&mut self, name: &str) -> Result<(), OptionsError> {
		let default = Self::default().get(name)?;
		self.set(name, default)
	}

	/// The effective shift width: `shiftwidth`, or `tabstop` when it is zero.
	pub fn shift_width(&self) -> usize {
		if self.shiftwidth == 0 { self.tabstop } else { self.shiftwidth }
	}

	/// Returns true if `key` (`b` or `s`) wraps across lines.
	pub fn wraps(&self, key: &str) -> bool {
		self.whichwrap.split(',').any(|item| item == key)
	}

	pub fn clipboard_mode(&self) -> ClipboardMode {
		clipboard_mode(&self.clipboard).unwrap_or_default()
	}
}

fn is_whichwrap_item(item: &str) -> bool {
	matches!(item, "b" | "s" | "h" | "l" | "<" | ">" | "~" | "[" | "]")
}

fn clipboard_mode(value: &str) -> Result<ClipboardMode, OptionsError> {
	let mut mode = ClipboardMode::Off;
	for item in value.split(',').filter(|item| !item.is_empty()) {
		mode = match item {
			"unnamed" if mode == ClipboardMode::Off => ClipboardMode::Unnamed,
			"unnamed" => mode,
			"unnamedplus" => ClipboardMode::UnnamedPlus,
			other => {
				return Err(OptionsError::InvalidValue {
					name: "clipboard".into(),
					value: other.into(),
				});
			}
		};
	}
	Ok(mode)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn unknown_keys_fail_and_defaults_fill_the_rest() {
		let options = Options::from_toml("shiftwidth = 2\nexpand-tab = false").unwrap_err();
		assert!(matches!(options, OptionsError::Parse(_)));

		let options = Options::from_toml("shiftwidth = 2\nexpandtab = false").unwrap();
		assert_eq!(options.shiftwidth, 2);
		assert!(!options.expandtab);
		assert_eq!(options.tabstop, 8);
	}

	#[test]
	fn invalid_values_are_rejected() {
		assert_eq!(Options::from_toml("tabstop = 0"), Err(OptionsError::NotPositive("tabstop".into())));
		assert!(Options::from_toml("clipboard = \"system\"").is_err());
		assert!(Options::from_toml("whichwrap = \"b,q\"").is_err());
	}

	#[test]
	fn abbreviations_resolve() {
		let mut options = Options::default();
		options.set("sw", OptionValue::Number(8)).unwrap();
		assert_eq!(options.get("shiftwidth"), Ok(OptionValue::Number(8)));
		assert_eq!(options.get("nope"), Err(OptionsError::Unknown("nope".into())));
	}

	#[test]
	fn wrong_type_leaves_option_alone() {
		let mut options = Options::default();
		assert!(options.set("expandtab", OptionValue::Number(1)).is_err());
		assert!(options.expandtab);
	}

	#[test]
	fn zero_shiftwidth_follows_tabstop() {
		let options = Options {
			shiftwidth: 0,
			..Options::default()
		};
		assert_eq!(options.shift_width(), 8);
	}

	#[test]
	fn clipboard_modes() {
		let mut options = Options::default();
		assert_eq!(options.clipboard_mode(), ClipboardMode::Off);
		options.set("cb", OptionValue::String("unnamed,unnamedplus".into())).unwrap();
		assert_eq!(options.clipboard_mode(), ClipboardMode::UnnamedPlus);
		options.reset("clipboard").unwrap();
		assert_eq!(options.clipboard, "");
	}
}
