use ropey::RopeSlice;

use crate::graphemes::{ensure_grapheme_boundary_next, ensure_grapheme_boundary_prev};

/// Selection direction (anchor to head).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	/// Head is at or after anchor.
	Forward,
	/// Head is before anchor.
	Backward,
}

/// A position in the text, measured in characters (not bytes).
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
pub type CharLen = usize;

/// A caret selection defined by anchor and head positions.
///
/// The anchor is Vim's `vimSelectionStart`; the head is the caret offset.
/// Visual selections are inclusive on both ends: the character under the
/// head and the character under the anchor are both selected, whatever the
/// direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
	/// The fixed end of the range.
	pub anchor: CharIdx,
	/// The moving end of the range (caret position).
	pub head: CharIdx,
}

impl Range {
	/// Creates a new range from anchor to head.
	pub fn new(anchor: CharIdx, head: CharIdx) -> Self {
		Self { anchor, head }
	}

	/// Creates a zero-width range (caret) at the given position.
	pub fn point(pos: CharIdx) -> Self {
		Self::new(pos, pos)
	}

	/// Returns the smaller of anchor and head.
	#[inline]
	pub fn min(&self) -> CharIdx {
		std::cmp::min(self.anchor, self.head)
	}

	/// Returns the larger of anchor and head.
	#[inline]
	pub fn max(&self) -> CharIdx {
		std::cmp::max(self.anchor, self.head)
	}

	/// Returns the start of the selected extent (inclusive).
	#[inline]
	pub fn from(&self) -> CharIdx {
		self.min()
	}

	/// Returns the end of the selected extent (exclusive), which is one past
	/// the larger end, clamped to `len`.
	#[inline]
	pub fn to(&self, len: CharLen) -> CharIdx {
		(self.max() + 1).min(len)
	}

	/// Returns true if anchor equals head.
	#[inline]
	pub fn is_point(&self) -> bool {
		self.anchor == self.head
	}

	/// Returns the direction of this range.
	#[inline]
	pub fn direction(&self) -> Direction {
		if self.head < self.anchor { Direction::Backward } else { Direction::Forward }
	}

	/// Returns a new range with anchor and head swapped (visual `o`).
	pub fn flip(&self) -> Self {
		Self {
			anchor: self.head,
			head: self.anchor,
		}
	}

	/// Keeps the anchor and moves the head.
	pub fn extend_to(self, head: CharIdx) -> Self {
		Self { anchor: self.anchor, head }
	}

	/// Applies a function to both anchor and head.
	pub fn map(self, mut f: impl FnMut(CharIdx) -> CharIdx) -> Self {
		Self {
			anchor: f(self.anchor),
			head: f(self.head),
		}
	}

	/// Returns a range with positions aligned to grapheme boundaries.
	///
	/// The lower end snaps backward and the upper end forward so the aligned
	/// range never selects half a cluster.
	pub fn grapheme_aligned(self, text: RopeSlice) -> Self {
		let align_low = |pos: CharIdx| ensure_grapheme_boundary_prev(text, pos);
		let align_high = |pos: CharIdx| ensure_grapheme_boundary_next(text, pos);
		match self.direction() {
			Direction::Forward => Self {
				anchor: align_low(self.anchor),
				head: align_high(self.head),
			},
			Direction::Backward => Self {
				anchor: align_high(self.anchor),
				head: align_low(self.head),
			},
		}
	}

	/// Returns true if `pos` lies inside the inclusive extent.
	pub fn contains(&self, pos: CharIdx) -> bool {
		pos >= self.min() && pos <= self.max()
	}

	/// Merges two ranges, preserving the direction of `self`.
	pub fn merge(&self, other: &Range) -> Self {
		let from = std::cmp::min(self.min(), other.min());
		let to = std::cmp::max(self.max(), other.max());

		if self.direction() == Direction::Forward { Self::new(from, to) } else { Self::new(to, from) }
	}

	/// Clamps anchor and head to `[0, max_char]`.
	pub fn clamp(&self, max_char: CharIdx) -> Self {
		self.map(|pos| pos.min(max_char))
	}
}

impl Default for Range {
	fn default() -> Self {
		Self::point(0)
	}
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	#[test]
	fn range_basics() {
		let r = Range::new(5, 10);
		assert_eq!(r.min(), 5);
		assert_eq!(r.max(), 10);
		assert!(!r.is_point());
		assert_eq!(r.direction(), Direction::Forward);
	}

	#[test]
	fn extent_is_inclusive_in_both_directions() {
		assert_eq!((Range::new(5, 10).from(), Range::new(5, 10).to(100)), (5, 11));
		assert_eq!((Range::new(10, 5).from(), Range::new(10, 5).to(100)), (5, 11));
	}

	#[test]
	fn extent_is_clamped_to_length() {
		assert_eq!(Range::new(3, 7).to(7), 7);
	}

	#[test]
	fn flip_swaps_ends() {
		let flipped = Range::new(5, 10).flip();
		assert_eq!((flipped.anchor, flipped.head), (10, 5));
	}

	#[test]
	fn contains_is_inclusive() {
		let r = Range::new(5, 10);
		assert!(!r.contains(4));
		assert!(r.contains(5));
		assert!(r.contains(10));
		assert!(!r.contains(11));
	}

	#[test]
	fn merge_keeps_direction() {
		let merged = Range::new(10, 5).merge(&Range::new(8, 15));
		assert_eq!((merged.anchor, merged.head), (15, 5));
	}

	#[test]
	fn grapheme_aligned_on_ascii_is_identity() {
		let text = Rope::from("hello");
		let aligned = Range::new(1, 3).grapheme_aligned(text.slice(..));
		assert_eq!(aligned, Range::new(1, 3));
	}

	#[test]
	fn grapheme_aligned_snaps_out_of_clusters() {
		// "e" + combining acute accent forms one cluster at chars 1..3.
		let text = Rope::from("ae\u{301}b");
		let aligned = Range::new(2, 2).grapheme_aligned(text.slice(..));
		assert_eq!(aligned, Range::new(1, 3));
	}
}
