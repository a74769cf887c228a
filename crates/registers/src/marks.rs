//! Per-caret marks.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::RegisterError;

/// A marked position as line and column, both 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mark {
	pub line: usize,
	pub col: usize,
}

impl Mark {
	pub const fn new(line: usize, col: usize) -> Self {
		Self { line, col }
	}
}

/// Marks kept for one caret: `a`-`z` plus the special marks Vim sets on its
/// own (`<` `>` last visual selection, `[` `]` last changed text, `.` last
/// change, `^` last insert exit, `'` before the latest jump).
#[derive(Debug, Clone, Default)]
pub struct MarkStore {
	marks: FxHashMap<char, Mark>,
}

const SPECIAL: &str = "<>[].^'";

impl MarkStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// `` ` `` is another name for `'`.
	fn canonical(name: char) -> Result<char, RegisterError> {
		match name {
			'`' => Ok('\''),
			'a'..='z' => Ok(name),
			c if SPECIAL.contains(c) => Ok(c),
			_ => Err(RegisterError::InvalidMark(name)),
		}
	}

	pub fn set(&mut self, name: char, mark: Mark) -> Result<(), RegisterError> {
		let name = Self::canonical(name)?;
		trace!(mark = %name, line = mark.line, col = mark.col, "set mark");
		self.marks.insert(name, mark);
		Ok(())
	}

	pub fn get(&self, name: char) -> Result<Mark, RegisterError> {
		let name = Self::canonical(name)?;
		self.marks.get(&name).copied().ok_or(RegisterError::MarkNotSet(name))
	}

	pub fn remove(&mut self, name: char) {
		if let Ok(name) = Self::canonical(name) {
			self.marks.remove(&name);
		}
	}

	/// All marks for `:marks`: the jump mark first, then `a`-`z`, then the
	/// rest.
	pub fn list(&self) -> Vec<(char, Mark)> {
		"'abcdefghijklmnopqrstuvwxyz<>[].^"
			.chars()
			.filter_map(|c| self.marks.get(&c).map(|m| (c, *m)))
			.collect()
	}

	/// Keeps marks on their text after `count` lines from `start` were
	/// deleted. Letter marks on deleted lines go away; special marks move to
	/// `start`.
	pub fn lines_deleted(&mut self, start: usize, count: usize) {
		if count == 0 {
			return;
		}
		let end = start + count;
		self.marks.retain(|name, mark| {
			if mark.line >= end {
				mark.line -= count;
			} else if mark.line >= start {
				if name.is_ascii_lowercase() {
					return false;
				}
				mark.line = start;
				mark.col = 0;
			}
			true
		});
	}

	/// Shifts marks at or below `at` down by `count` inserted lines.
	pub fn lines_inserted(&mut self, at: usize, count: usize) {
		for mark in self.marks.values_mut() {
			if mark.line >= at {
				mark.line += count;
			}
		}
	}
}
