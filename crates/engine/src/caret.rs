//! Carets and the caret set.
//!
//! The engine never writes caret fields from operator code. Every move goes
//! through [`CaretSet::move_to_offset`] or [`CaretSet::apply_motion`], which
//! keep offsets inside the text and recompute selections for the current
//! mode. In block selection the set is rebuilt from the primary caret: one
//! caret per line, all on the primary caret's column.

use ropey::RopeSlice;
use smallvec::{SmallVec, smallvec};
use tracing::trace;
use viper_primitives::rope::{column_of, last_char_offset, line_end, line_end_with_newline, line_of, line_start};
use viper_primitives::{CharIdx, Mode, Range, SelectionType, Span, VisualKind};
use viper_registers::{CaretRegisters, MarkStore};

/// Preferred column meaning "end of line", set by `$`.
pub const LINE_END_COLUMN: usize = usize::MAX;

/// One caret with its selection, preferred column, marks and registers.
#[derive(Debug, Clone, Default)]
pub struct Caret {
	offset: CharIdx,
	/// Fixed end of a visual selection (`vimSelectionStart`).
	anchor: CharIdx,
	selection: Option<Span>,
	last_column: usize,
	insert_start: Option<CharIdx>,
	marks: MarkStore,
	registers: CaretRegisters,
}

impl Caret {
	pub fn new(offset: CharIdx) -> Self {
		Self {
			offset,
			anchor: offset,
			..Self::default()
		}
	}

	pub fn offset(&self) -> CharIdx {
		self.offset
	}

	/// The visual anchor.
	pub fn anchor(&self) -> CharIdx {
		self.anchor
	}

	/// Selected text as a half-open span, when a selection is active.
	pub fn selection(&self) -> Option<Span> {
		self.selection
	}

	pub fn last_column(&self) -> usize {
		self.last_column
	}

	/// Where the current insert started, if inserting.
	pub fn insert_start(&self) -> Option<CharIdx> {
		self.insert_start
	}

	pub fn marks(&self) -> &MarkStore {
		&self.marks
	}

	pub(crate) fn marks_mut(&mut self) -> &mut MarkStore {
		&mut self.marks
	}

	pub fn registers(&self) -> &CaretRegisters {
		&self.registers
	}

	pub(crate) fn registers_mut(&mut self) -> &mut CaretRegisters {
		&mut self.registers
	}

	pub(crate) fn set_last_column(&mut self, column: usize) {
		self.last_column = column;
	}

	pub(crate) fn set_insert_start(&mut self, start: Option<CharIdx>) {
		self.insert_start = start;
	}

	/// Anchor and head as a range.
	pub fn range(&self) -> Range {
		Range::new(self.anchor, self.offset)
	}

	fn place(&mut self, text: RopeSlice, offset: CharIdx) {
		self.offset = offset;
		self.last_column = column_of(text, offset);
	}

	fn select(&mut self, text: RopeSlice, kind: VisualKind) {
		self.selection = Some(visual_span(text, self.range(), kind));
	}
}

/// The selected span of a char- or line-wise visual range.
///
/// Both ends are inclusive, so the span runs one past the larger end; a
/// block range yields its bounding span.
pub fn visual_span(text: RopeSlice, range: Range, kind: VisualKind) -> Span {
	let len = text.len_chars();
	match kind {
		VisualKind::Line => Span::new(
			line_start(text, line_of(text, range.min())),
			line_end_with_newline(text, line_of(text, range.max())),
		),
		VisualKind::Char | VisualKind::Block => Span::new(range.from().min(len), range.to(len)),
	}
}

/// A rectangular selection, described by its two corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
	pub anchor: CharIdx,
	pub head: CharIdx,
	/// `$` was used: every line is selected to its end.
	pub to_line_end: bool,
}

impl Block {
	/// Per-line spans, top to bottom, and the left and right columns
	/// (right exclusive, `None` for `$`).
	pub fn spans(&self, text: RopeSlice) -> (SmallVec<[Span; 4]>, usize, Option<usize>) {
		let (top, bottom) = {
			let (a, h) = (line_of(text, self.anchor), line_of(text, self.head));
			(a.min(h), a.max(h))
		};
		let (a_col, h_col) = (column_of(text, self.anchor), column_of(text, self.head));
		let left = a_col.min(h_col);
		let right = (!self.to_line_end).then_some(a_col.max(h_col) + 1);
		let spans = (top..=bottom)
			.map(|line| {
				let start = line_start(text, line);
				let end = line_end(text, line);
				let from = (start + left).min(end);
				let to = right.map_or(end, |right| (start + right).min(end));
				Span::new(from, to)
			})
			.collect();
		(spans, left, right)
	}
}

/// All carets of one editor. Never empty; the first caret is the primary.
#[derive(Debug, Clone)]
pub struct CaretSet {
	carets: SmallVec<[Caret; 1]>,
	block: Option<Block>,
}

impl Default for CaretSet {
	fn default() -> Self {
		Self::new(0)
	}
}

impl CaretSet {
	pub fn new(offset: CharIdx) -> Self {
		Self {
			carets: smallvec![Caret::new(offset)],
			block: None,
		}
	}

	pub fn primary(&self) -> &Caret {
		&self.carets[0]
	}

	pub(crate) fn primary_mut(&mut self) -> &mut Caret {
		&mut self.carets[0]
	}

	pub fn get(&self, index: usize) -> Option<&Caret> {
		self.carets.get(index)
	}

	pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Caret> {
		self.carets.get_mut(index)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Caret> {
		self.carets.iter()
	}

	pub fn len(&self) -> usize {
		self.carets.len()
	}

	pub fn is_empty(&self) -> bool {
		false
	}

	/// Caret offsets, primary first.
	pub fn offsets(&self) -> Vec<CharIdx> {
		self.carets.iter().map(Caret::offset).collect()
	}

	pub fn block(&self) -> Option<Block> {
		self.block
	}

	/// Adds a secondary caret. Returns false if one is already there.
	pub fn add(&mut self, text: RopeSlice, offset: CharIdx) -> bool {
		if offset > text.len_chars() || self.carets.iter().any(|c| c.offset == offset) {
			return false;
		}
		let mut caret = Caret::new(offset);
		caret.place(text, offset);
		self.carets.push(caret);
		true
	}

	/// Caret indices from the highest offset down, the order edits at
	/// several carets are applied in.
	pub(crate) fn bottom_up(&self) -> SmallVec<[usize; 4]> {
		let mut order: SmallVec<[usize; 4]> = (0..self.carets.len()).collect();
		order.sort_by_key(|&index| std::cmp::Reverse(self.carets[index].offset));
		order
	}

	/// Drops every caret but the primary.
	pub fn collapse(&mut self) {
		self.carets.truncate(1);
		self.block = None;
	}

	/// Removes secondary carets that landed on the same offset as an
	/// earlier one.
	pub(crate) fn dedup(&mut self) {
		let mut seen: SmallVec<[CharIdx; 4]> = SmallVec::new();
		self.carets.retain(|caret| {
			let fresh = !seen.contains(&caret.offset);
			seen.push(caret.offset);
			fresh
		});
	}

	/// Moves caret `index` to `offset`.
	///
	/// Out-of-range offsets leave everything unchanged and return false. In
	/// block selection the block is rebuilt around the new primary position;
	/// in visual and select mode the selection is extended from the anchor;
	/// on a search command line with an active selection it is extended the
	/// same way, incsearch style.
	pub fn move_to_offset(&mut self, text: RopeSlice, mode: Mode, index: usize, offset: CharIdx) -> bool {
		if offset > text.len_chars() || index >= self.carets.len() {
			return false;
		}
		if let Some(block) = self.block.as_mut()
			&& mode.in_block_selection()
		{
			if index != 0 {
				return false;
			}
			block.head = offset;
			self.rebuild_block(text);
			return true;
		}
		let caret = &mut self.carets[index];
		caret.place(text, offset);
		match mode {
			Mode::Visual(kind) | Mode::Select(kind) => caret.select(text, kind),
			Mode::CommandLine(_) if caret.selection.is_some() => caret.select(text, VisualKind::Char),
			_ => {}
		}
		true
	}

	/// Moves every caret to the offset `target` computes for it.
	///
	/// Targets are computed before anything moves; if any caret has none,
	/// no caret moves and false is returned. In block selection only the
	/// primary caret's target is used and the block follows it.
	pub fn apply_motion(&mut self, text: RopeSlice, mode: Mode, mut target: impl FnMut(usize, &Caret) -> Option<CharIdx>) -> bool {
		if self.block.is_some() && mode.in_block_selection() {
			let Some(offset) = target(0, &self.carets[0]) else {
				return false;
			};
			return self.move_to_offset(text, mode, 0, offset);
		}
		let mut targets: SmallVec<[CharIdx; 4]> = SmallVec::with_capacity(self.carets.len());
		for (index, caret) in self.carets.iter().enumerate() {
			match target(index, caret) {
				Some(offset) if offset <= text.len_chars() => targets.push(offset),
				_ => return false,
			}
		}
		for (index, offset) in targets.into_iter().enumerate() {
			self.move_to_offset(text, mode, index, offset);
		}
		self.dedup();
		true
	}

	/// Starts a visual or select selection at every caret.
	pub(crate) fn start_selection(&mut self, text: RopeSlice, kind: VisualKind) {
		if kind == VisualKind::Block {
			let offset = self.carets[0].offset;
			self.collapse();
			self.block = Some(Block {
				anchor: offset,
				head: offset,
				to_line_end: false,
			});
			self.rebuild_block(text);
			return;
		}
		for caret in &mut self.carets {
			caret.anchor = caret.offset;
			caret.select(text, kind);
		}
	}

	/// Restores a selection with the given anchor and head on the primary.
	pub(crate) fn restore_selection(&mut self, text: RopeSlice, kind: VisualKind, anchor: CharIdx, head: CharIdx) {
		let len = text.len_chars();
		let (anchor, head) = (anchor.min(len), head.min(len));
		self.collapse();
		if kind == VisualKind::Block {
			self.carets[0].place(text, head);
			self.block = Some(Block {
				anchor,
				head,
				to_line_end: false,
			});
			self.rebuild_block(text);
			return;
		}
		let caret = &mut self.carets[0];
		caret.anchor = anchor;
		caret.place(text, head);
		caret.select(text, kind);
	}

	/// Selects `anchor..=head` with caret `index`, as text objects do.
	pub(crate) fn select_range(&mut self, text: RopeSlice, index: usize, kind: VisualKind, anchor: CharIdx, head: CharIdx) {
		let len = text.len_chars();
		if let Some(caret) = self.carets.get_mut(index) {
			caret.anchor = anchor.min(len);
			caret.place(text, head.min(len));
			caret.select(text, kind);
		}
	}

	/// Switches the selection kind in place (`v` to `V` and so on).
	pub(crate) fn change_selection_kind(&mut self, text: RopeSlice, from: VisualKind, to: VisualKind) {
		if from == to {
			return;
		}
		if from == VisualKind::Block {
			let block = self.block.take();
			self.carets.truncate(1);
			if let Some(block) = block {
				let caret = &mut self.carets[0];
				caret.anchor = block.anchor;
				caret.place(text, block.head);
			}
		}
		if to == VisualKind::Block {
			let caret = &self.carets[0];
			let (anchor, head) = (caret.anchor, caret.offset);
			self.restore_selection(text, to, anchor, head);
			return;
		}
		for caret in &mut self.carets {
			caret.select(text, to);
		}
	}

	/// `o` in visual mode: the anchor becomes the head.
	pub(crate) fn swap_ends(&mut self, text: RopeSlice, kind: VisualKind) {
		if let Some(block) = self.block.as_mut() {
			std::mem::swap(&mut block.anchor, &mut block.head);
			self.rebuild_block(text);
			return;
		}
		for caret in &mut self.carets {
			let anchor = caret.anchor;
			caret.anchor = caret.offset;
			caret.place(text, anchor);
			caret.select(text, kind);
		}
	}

	/// `O` in block mode: swaps the columns of the two corners, keeping
	/// their lines.
	pub(crate) fn swap_block_corner(&mut self, text: RopeSlice) -> bool {
		let Some(block) = self.block.as_mut() else {
			return false;
		};
		let (a_line, h_line) = (line_of(text, block.anchor), line_of(text, block.head));
		let (a_col, h_col) = (column_of(text, block.anchor), column_of(text, block.head));
		block.anchor = (line_start(text, a_line) + h_col).min(line_end(text, a_line));
		block.head = (line_start(text, h_line) + a_col).min(line_end(text, h_line));
		self.rebuild_block(text);
		true
	}

	/// Extends every line of the block to its end (`$`).
	pub(crate) fn set_block_to_line_end(&mut self, text: RopeSlice, to_line_end: bool) {
		if let Some(block) = self.block.as_mut() {
			block.to_line_end = to_line_end;
			self.rebuild_block(text);
		}
	}

	/// Drops selections and the block, keeping the primary caret on the
	/// block's head line.
	pub(crate) fn clear_selection(&mut self) {
		if self.block.take().is_some() {
			self.carets.truncate(1);
		}
		for caret in &mut self.carets {
			caret.selection = None;
			caret.anchor = caret.offset;
		}
	}

	/// Starts an incsearch selection anchored at the primary caret.
	pub(crate) fn begin_incsearch(&mut self) {
		let caret = &mut self.carets[0];
		caret.anchor = caret.offset;
		caret.selection = Some(Span::new(caret.offset, caret.offset));
	}

	/// Regenerates one caret per block line, all on the head's column.
	fn rebuild_block(&mut self, text: RopeSlice) {
		let Some(block) = self.block else {
			return;
		};
		let (spans, _, _) = block.spans(text);
		let head_line = line_of(text, block.head);
		let head_col = if block.to_line_end { None } else { Some(column_of(text, block.head)) };
		let top = line_of(text, block.anchor).min(head_line);

		let mut primary = std::mem::take(&mut self.carets[0]);
		primary.anchor = block.anchor;
		primary.place(text, block.head);
		if block.to_line_end {
			primary.last_column = LINE_END_COLUMN;
		}
		primary.selection = Some(spans[head_line - top]);

		let mut carets: SmallVec<[Caret; 1]> = smallvec![primary];
		for (i, span) in spans.iter().enumerate() {
			let line = top + i;
			if line == head_line {
				continue;
			}
			let end = line_end(text, line);
			let offset = head_col.map_or(end, |col| line_start(text, line).saturating_add(col).min(end));
			let mut caret = Caret::new(offset);
			caret.place(text, offset);
			caret.anchor = span.start;
			caret.selection = Some(*span);
			carets.push(caret);
		}
		trace!(carets = carets.len(), "block rebuilt");
		self.carets = carets;
	}

	/// Keeps carets on their text after `start..end` was replaced by
	/// `inserted` chars.
	pub(crate) fn adjust_for_edit(&mut self, start: CharIdx, end: CharIdx, inserted: usize) {
		let shift = |pos: CharIdx| -> CharIdx {
			if pos >= end {
				pos - (end - start) + inserted
			} else if pos > start {
				start + inserted.min(pos - start)
			} else {
				pos
			}
		};
		for caret in &mut self.carets {
			caret.offset = shift(caret.offset);
			caret.anchor = shift(caret.anchor);
			caret.insert_start = caret.insert_start.map(shift);
			caret.selection = caret.selection.map(|span| Span::new(shift(span.start), shift(span.end)));
		}
		if let Some(block) = self.block.as_mut() {
			block.anchor = shift(block.anchor);
			block.head = shift(block.head);
		}
	}

	/// Keeps marks on their lines after an edit starting on `line` replaced
	/// `removed` line breaks with `added` ones.
	pub(crate) fn adjust_marks(&mut self, line: usize, removed: usize, added: usize) {
		for caret in &mut self.carets {
			if added > removed {
				caret.marks.lines_inserted(line + 1, added - removed);
			} else if removed > added {
				caret.marks.lines_deleted(line + 1, removed - added);
			}
		}
	}

	/// Clamps every caret into `[0, len]` after the host changed the text
	/// behind the engine's back (undo, redo).
	pub(crate) fn clamp(&mut self, text: RopeSlice) {
		let len = text.len_chars();
		for caret in &mut self.carets {
			caret.offset = caret.offset.min(len);
			caret.anchor = caret.anchor.min(len);
			caret.selection = None;
		}
		self.block = None;
	}

	/// Moves normal-mode carets off line ends onto the last character.
	pub(crate) fn snap_to_content(&mut self, text: RopeSlice) {
		for caret in &mut self.carets {
			let limit = last_char_offset(text, line_of(text, caret.offset));
			if caret.offset > limit {
				caret.offset = limit;
			}
			caret.anchor = caret.offset;
			caret.selection = None;
		}
		self.dedup();
	}

	/// Selection kind for operators on the current selection.
	pub(crate) fn selection_type(&self, kind: VisualKind) -> SelectionType {
		if self.block.is_some() { SelectionType::BlockWise } else { kind.selection_type() }
	}
}
