//! Ranges an operator acts on.

use smallvec::{SmallVec, smallvec};

use crate::range::CharIdx;

/// How an operator treats a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SelectionType {
	#[default]
	CharacterWise,
	LineWise,
	BlockWise,
}

/// A half-open `[start, end)` span of character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
	pub start: CharIdx,
	pub end: CharIdx,
}

impl Span {
	/// Creates a span, ordering the ends.
	pub fn new(a: CharIdx, b: CharIdx) -> Self {
		Self {
			start: a.min(b),
			end: a.max(b),
		}
	}

	pub fn len(&self) -> usize {
		self.end - self.start
	}

	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}
}

/// A range produced by a motion, text object or visual selection.
///
/// Character- and line-wise ranges hold one span. A block-wise range holds
/// one span per line, top to bottom, each bounded by the block's columns.
/// `start() <= end()` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRange {
	spans: SmallVec<[Span; 1]>,
	kind: SelectionType,
}

impl TextRange {
	/// Creates a single-span range.
	pub fn new(start: CharIdx, end: CharIdx, kind: SelectionType) -> Self {
		Self {
			spans: smallvec![Span::new(start, end)],
			kind,
		}
	}

	pub fn characterwise(start: CharIdx, end: CharIdx) -> Self {
		Self::new(start, end, SelectionType::CharacterWise)
	}

	pub fn linewise(start: CharIdx, end: CharIdx) -> Self {
		Self::new(start, end, SelectionType::LineWise)
	}

	/// Creates a block-wise range from per-line spans.
	///
	/// Spans are sorted by start offset. An empty input yields an empty
	/// block at offset 0.
	pub fn block(spans: impl IntoIterator<Item = Span>) -> Self {
		let mut spans: SmallVec<[Span; 1]> = spans.into_iter().collect();
		spans.sort_by_key(|span| span.start);
		if spans.is_empty() {
			spans.push(Span::new(0, 0));
		}
		Self {
			spans,
			kind: SelectionType::BlockWise,
		}
	}

	/// Offset of the first character in the range.
	pub fn start(&self) -> CharIdx {
		self.spans.iter().map(|span| span.start).min().unwrap_or(0)
	}

	/// Offset one past the last character in the range.
	pub fn end(&self) -> CharIdx {
		self.spans.iter().map(|span| span.end).max().unwrap_or(0)
	}

	pub fn kind(&self) -> SelectionType {
		self.kind
	}

	pub fn spans(&self) -> &[Span] {
		&self.spans
	}

	/// Returns true when the range holds more than one span.
	pub fn is_multiple(&self) -> bool {
		self.spans.len() > 1
	}

	/// Returns true when no span covers any character.
	pub fn is_empty(&self) -> bool {
		self.spans.iter().all(Span::is_empty)
	}

	/// Returns a copy with a different selection type.
	pub fn with_kind(mut self, kind: SelectionType) -> Self {
		self.kind = kind;
		self
	}

	/// Returns a copy with every offset shifted back by `delta`, saturating.
	pub fn shifted_back(&self, delta: usize) -> Self {
		Self {
			spans: self
				.spans
				.iter()
				.map(|span| Span::new(span.start.saturating_sub(delta), span.end.saturating_sub(delta)))
				.collect(),
			kind: self.kind,
		}
	}
}
