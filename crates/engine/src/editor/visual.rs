//! Visual and select mode.

use smallvec::SmallVec;
use tracing::trace;
use viper_input::{ObjectKind, TextObject};
use viper_primitives::rope::{line_end_with_newline, line_of, line_start};
use viper_primitives::{CharIdx, Mode, Operator, SelectionType, TextRange, VisualKind};
use viper_registers::Mark;

use super::operators::OperatorArgs;
use super::range::{CaretRanges, object_range};
use super::{Editor, check_register};
use crate::caret::visual_span;
use crate::error::{EditorError, EditorResult};
use crate::host::EditorHost;
use crate::session::Session;

/// The selection `gv` brings back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct LastVisual {
	pub(super) kind: VisualKind,
	pub(super) anchor: Mark,
	pub(super) head: Mark,
	pub(super) to_line_end: bool,
}

impl<H: EditorHost> Editor<H> {
	/// `v`, `V` and `<C-V>`: enter visual mode, switch its kind, or leave it.
	pub(super) fn toggle_visual(&mut self, kind: VisualKind) -> EditorResult<()> {
		let text = self.host.text();
		match self.mode() {
			Mode::Visual(current) if current == kind => {
				self.exit_visual();
				return Ok(());
			}
			Mode::Visual(current) | Mode::Select(current) => self.carets.change_selection_kind(text, current, kind),
			_ => self.carets.start_selection(text, kind),
		}
		self.input.set_mode(Mode::Visual(kind));
		Ok(())
	}

	/// `gh`, `gH` and `g<C-H>`.
	pub(super) fn enter_select(&mut self, kind: VisualKind) -> EditorResult<()> {
		let text = self.host.text();
		match self.mode().visual_kind() {
			Some(current) => self.carets.change_selection_kind(text, current, kind),
			None => self.carets.start_selection(text, kind),
		}
		self.input.set_mode(Mode::Select(kind));
		Ok(())
	}

	/// `gv`: restores the previous selection, trading places with the
	/// current one in visual mode.
	pub(super) fn reselect(&mut self) -> EditorResult<()> {
		let last = self.last_visual.take().ok_or(EditorError::MotionUnresolved)?;
		if self.mode().visual_kind().is_some() {
			self.leave_visual();
		}
		let anchor = self.host.offset_of(last.anchor.line, last.anchor.col);
		let head = self.host.offset_of(last.head.line, last.head.col);
		let text = self.host.text();
		self.carets.restore_selection(text, last.kind, anchor, head);
		if last.to_line_end {
			self.carets.set_block_to_line_end(text, true);
		}
		self.input.set_mode(Mode::Visual(last.kind));
		Ok(())
	}

	/// `o`, and `O` in block mode.
	pub(super) fn swap_ends(&mut self, block_corner: bool) -> EditorResult<()> {
		let kind = self.mode().visual_kind().ok_or(EditorError::MotionUnresolved)?;
		let text = self.host.text();
		if !(block_corner && self.carets.swap_block_corner(text)) {
			self.carets.swap_ends(text, kind);
		}
		Ok(())
	}

	/// `<C-G>`: visual to select and back, keeping the selection.
	pub(super) fn toggle_select(&mut self) -> EditorResult<()> {
		let next = match self.mode() {
			Mode::Visual(kind) => Mode::Select(kind),
			Mode::Select(kind) => Mode::Visual(kind),
			_ => return Err(EditorError::MotionUnresolved),
		};
		self.input.set_mode(next);
		Ok(())
	}

	pub(super) fn exit_visual(&mut self) {
		self.leave_visual();
		self.input.set_mode(Mode::Normal);
	}

	/// Drops the selection, setting `<` and `>` and remembering it for `gv`.
	/// The mode is left to the caller.
	pub(super) fn leave_visual(&mut self) {
		if let Some(kind) = self.mode().visual_kind() {
			self.drop_selection(kind);
		}
	}

	/// Drops a `kind` selection whatever the current mode, as opening the
	/// command line from visual mode does.
	pub(super) fn drop_selection(&mut self, kind: VisualKind) {
		let block = self.carets.block();
		let bounds: SmallVec<[(usize, CharIdx, CharIdx); 4]> = match block {
			Some(block) => smallvec::smallvec![(0, block.anchor.min(block.head), block.anchor.max(block.head))],
			None => self
				.carets
				.iter()
				.enumerate()
				.map(|(index, caret)| (index, caret.anchor().min(caret.offset()), caret.anchor().max(caret.offset())))
				.collect(),
		};
		let primary = self.carets.primary();
		let (anchor, head) = block.map_or((primary.anchor(), primary.offset()), |block| (block.anchor, block.head));
		let (anchor, head) = (self.host.position(anchor), self.host.position(head));
		self.last_visual = Some(LastVisual {
			kind,
			anchor: Mark::new(anchor.0, anchor.1),
			head: Mark::new(head.0, head.1),
			to_line_end: block.is_some_and(|block| block.to_line_end),
		});
		for (index, start, end) in bounds {
			self.set_mark_at(index, '<', start);
			self.set_mark_at(index, '>', end);
		}
		trace!(kind = ?kind, "visual selection dropped");
		self.carets.clear_selection();
	}

	/// The selection as operator ranges. `linewise` widens it to whole lines.
	pub(super) fn visual_ranges(&self, kind: VisualKind, linewise: bool) -> CaretRanges {
		let text = self.host.text();
		let whole_lines = |start: CharIdx, end: CharIdx| {
			TextRange::linewise(line_start(text, line_of(text, start)), line_end_with_newline(text, line_of(text, end.max(start + 1) - 1)))
		};
		let mut ranges = CaretRanges::new();
		if let Some(block) = self.carets.block() {
			let (spans, _, _) = block.spans(text);
			let range = if linewise {
				let top = line_start(text, line_of(text, block.anchor.min(block.head)));
				whole_lines(top, block.anchor.max(block.head) + 1)
			} else {
				TextRange::block(spans)
			};
			ranges.push((0, range));
			return ranges;
		}
		for (index, caret) in self.carets.iter().enumerate() {
			let span = caret.selection().unwrap_or_else(|| visual_span(text, caret.range(), kind));
			let range = if linewise || kind == VisualKind::Line {
				whole_lines(span.start, span.end)
			} else {
				TextRange::characterwise(span.start, span.end)
			};
			ranges.push((index, range));
		}
		ranges
	}

	/// An operator on the selection, which ends visual mode.
	pub(super) fn visual_operate(
		&mut self,
		session: &mut Session,
		operator: Operator,
		linewise: bool,
		count: Option<usize>,
		register: Option<char>,
	) -> EditorResult<()> {
		let kind = self.mode().visual_kind().ok_or(EditorError::MotionUnresolved)?;
		if operator.writes_register() {
			check_register(session, register)?;
		}
		let ranges = self.visual_ranges(kind, linewise);
		self.leave_visual();
		self.input.set_mode(Mode::Normal);
		self.apply_operator(
			session,
			OperatorArgs {
				operator,
				ranges,
				register,
				amount: count.unwrap_or(1).max(1),
				visual: true,
			},
		)
	}

	/// `iw`, `a(` and friends in visual mode: select the object, or grow
	/// the selection by one more when something is already selected.
	pub(super) fn select_object(&mut self, object: TextObject, count: usize) -> EditorResult<()> {
		let kind = self.mode().visual_kind().ok_or(EditorError::MotionUnresolved)?;
		let text = self.host.text();
		let len = text.len_chars();
		let mut picks: SmallVec<[(usize, CharIdx, CharIdx, bool); 4]> = SmallVec::new();
		for (index, caret) in self.carets.iter().enumerate() {
			let (anchor, head) = (caret.anchor(), caret.offset());
			let (start, end) = (anchor.min(head), anchor.max(head));
			let range = if anchor == head {
				object_range(text, head, object, Some(count))
			} else {
				match object.kind {
					ObjectKind::Word(_) | ObjectKind::Paragraph if head >= anchor => {
						(head + 1 < len).then(|| object_range(text, head + 1, object, Some(count))).flatten().map(|next| {
							TextRange::new(start, next.end(), next.kind())
						})
					}
					ObjectKind::Word(_) | ObjectKind::Paragraph => {
						(head > 0).then(|| object_range(text, head - 1, object, Some(count))).flatten().map(|previous| {
							TextRange::new(previous.start(), end + 1, previous.kind())
						})
					}
					ObjectKind::Bracket { .. } | ObjectKind::Quote(_) => grow_outward(text, start, end, object),
				}
			}
			.ok_or(EditorError::MotionUnresolved)?;
			if range.is_empty() {
				return Err(EditorError::MotionUnresolved);
			}
			let (from, to) = (range.start(), range.end() - 1);
			let backward = head < anchor;
			picks.push((index, if backward { to } else { from }, if backward { from } else { to }, range.kind() == SelectionType::LineWise));
		}

		let linewise = picks.iter().any(|pick| pick.3);
		let next = if linewise { VisualKind::Line } else { VisualKind::Char };
		if next != kind {
			self.carets.change_selection_kind(text, kind, next);
			self.input.set_mode(Mode::Visual(next));
		}
		for (index, anchor, head, _) in picks {
			self.carets.select_range(text, index, next, anchor, head);
		}
		Ok(())
	}
}

/// The next enclosing bracket or quote pair around `start..=end`.
fn grow_outward(text: ropey::RopeSlice, start: CharIdx, end: CharIdx, object: TextObject) -> Option<TextRange> {
	let covers = |range: &TextRange| range.start() <= start && range.end() > end && (range.start() < start || range.end() > end + 1);
	let mut probe = start.checked_sub(1)?;
	for _ in 0..2 {
		let candidate = object_range(text, probe, object, None)?;
		if covers(&candidate) {
			return Some(candidate);
		}
		probe = candidate.start().min(probe).checked_sub(1)?;
	}
	None
}
