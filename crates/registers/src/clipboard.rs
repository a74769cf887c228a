use std::fmt;

use viper_primitives::SelectionType;

/// The two system selections Vim exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipboardSelection {
	/// `*`: the primary selection.
	Primary,
	/// `+`: the clipboard.
	Clipboard,
}

impl ClipboardSelection {
	pub fn from_register(name: char) -> Option<Self> {
		match name {
			'*' => Some(Self::Primary),
			'+' => Some(Self::Clipboard),
			_ => None,
		}
	}
}

/// Host clipboard access behind the `+` and `*` registers.
pub trait Clipboard: fmt::Debug {
	fn get(&self, selection: ClipboardSelection) -> Option<(String, SelectionType)>;
	fn set(&mut self, selection: ClipboardSelection, text: &str, kind: SelectionType);
}

/// Process-local clipboard, used when the host provides none.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
	primary: Option<(String, SelectionType)>,
	clipboard: Option<(String, SelectionType)>,
}

impl MemoryClipboard {
	fn slot(&mut self, selection: ClipboardSelection) -> &mut Option<(String, SelectionType)> {
		match selection {
			ClipboardSelection::Primary => &mut self.primary,
			ClipboardSelection::Clipboard => &mut self.clipboard,
		}
	}
}

impl Clipboard for MemoryClipboard {
	fn get(&self, selection: ClipboardSelection) -> Option<(String, SelectionType)> {
		match selection {
			ClipboardSelection::Primary => self.primary.clone(),
			ClipboardSelection::Clipboard => self.clipboard.clone(),
		}
	}

	fn set(&mut self, selection: ClipboardSelection, text: &str, kind: SelectionType) {
		*self.slot(selection) = Some((text.to_string(), kind));
	}
}
