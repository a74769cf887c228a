//! Ex commands that act on the buffer, registers and options.
//!
//! Line numbers in [`ExCommand`] ranges are 1-based; everything here works
//! on 0-based lines once the range is resolved. `:0put` is the one command
//! that may address the line before the first.

use tracing::{debug, trace};
use viper_primitives::rope::{first_non_blank, line_count, line_end_with_newline, line_start, line_text};
use viper_primitives::{Operator, PatternError, SelectionType, TextRange, compile_pattern, expand_replacement};
use viper_registers::Register;
use viper_script::{Address, AddressBase, ExCommand, ExKind, LineRange, SetArg, SetOp, SubstituteFlags};

use super::operators::{OperatorArgs, plural};
use super::range::CaretRanges;
use super::{Editor, check_register};
use crate::error::{EditorError, EditorResult};
use crate::host::EditorHost;
use crate::options::{OptionValue, Options, OptionsError};
use crate::session::Session;

/// Options whose string value is a comma-separated list, for `+=` and `-=`.
const LIST_OPTIONS: &[&str] = &["whichwrap", "clipboard"];

impl<H: EditorHost> Editor<H> {
	/// Runs one parsed ex command.
	pub(crate) fn run_ex_command(&mut self, session: &mut Session, command: &ExCommand) -> EditorResult<()> {
		debug!(kind = ?command.kind, range = ?command.range, "ex command");
		if self.mode().visual_kind().is_some() {
			self.exit_visual();
		}
		let range = command.range.as_ref();
		match &command.kind {
			ExKind::Goto => self.ex_goto(range),
			ExKind::Delete { register, count } => {
				check_register(session, *register)?;
				let lines = self.counted_lines(range, *count)?;
				self.ex_operate(session, Operator::Delete, lines, *register, 1)
			}
			ExKind::Yank { register, count } => {
				check_register(session, *register)?;
				let lines = self.counted_lines(range, *count)?;
				let caret = self.caret();
				self.ex_operate(session, Operator::Yank, lines, *register, 1)?;
				self.place_caret(0, caret);
				Ok(())
			}
			ExKind::Put { register, above } => self.ex_put(session, range, *register, *above),
			ExKind::Shift { right, amount, count } => {
				let lines = self.counted_lines(range, *count)?;
				let operator = if *right { Operator::ShiftRight } else { Operator::ShiftLeft };
				self.ex_operate(session, operator, lines, None, *amount)?;
				let doc = self.host.text();
				self.place_caret(0, first_non_blank(doc, lines.1));
				Ok(())
			}
			ExKind::Join { spaces, count } => self.ex_join(range, *spaces, *count),
			ExKind::Normal { keys, .. } => {
				let lines = range.map(|range| self.lines(Some(range))).transpose()?;
				self.run_normal(session, keys, lines)
			}
			ExKind::Substitute {
				pattern,
				replacement,
				flags,
				count,
			} => {
				let lines = self.counted_lines(range, *count)?;
				self.substitute(session, pattern, replacement, *flags, lines)
			}
			ExKind::Set(args) => self.ex_set(session, args),
			ExKind::Registers(names) => {
				self.list_registers(session, names.as_deref());
				Ok(())
			}
			ExKind::Marks(names) => {
				self.list_marks(names.as_deref());
				Ok(())
			}
			ExKind::NoHlsearch => {
				trace!("no search highlighting to clear");
				Ok(())
			}
			ExKind::Undo => self.undo(1),
			ExKind::Redo => self.redo(1),
			ExKind::Host(host_command) => self.host.execute_host_command(host_command),
		}
	}

	/// A 0-based line, which may be out of the buffer.
	fn address_line(&self, address: Address) -> EditorResult<i64> {
		let line = match address.base {
			AddressBase::Current => self.host.position(self.caret()).0 as i64,
			AddressBase::Last => self.host.line_count() as i64 - 1,
			AddressBase::Line(n) => n as i64 - 1,
			AddressBase::Mark(name) => self.carets.primary().marks().get(name)?.line as i64,
		};
		Ok(line + address.offset)
	}

	/// First and last line of `range`, swapped if given backwards. Without a
	/// range, the caret line.
	fn lines(&self, range: Option<&LineRange>) -> EditorResult<(usize, usize)> {
		let Some(range) = range else {
			let line = self.host.position(self.caret()).0;
			return Ok((line, line));
		};
		let start = self.address_line(range.start)?;
		let end = range.end.map_or(Ok(start), |end| self.address_line(end))?;
		let count = self.host.line_count() as i64;
		if !(0..count).contains(&start) || !(0..count).contains(&end) {
			return Err(EditorError::InvalidRange);
		}
		Ok((start.min(end) as usize, start.max(end) as usize))
	}

	/// `:d x 3` and friends: a count takes that many lines from the last
	/// line of the range.
	fn counted_lines(&self, range: Option<&LineRange>, count: Option<usize>) -> EditorResult<(usize, usize)> {
		let (first, last) = self.lines(range)?;
		Ok(match count {
			Some(count) => {
				let bottom = self.host.line_count() - 1;
				(last, (last + count.max(1) - 1).min(bottom))
			}
			None => (first, last),
		})
	}

	fn ex_goto(&mut self, range: Option<&LineRange>) -> EditorResult<()> {
		let Some(range) = range else {
			return Ok(());
		};
		let target = self.address_line(range.end.unwrap_or(range.start))?;
		let last = self.host.line_count() as i64 - 1;
		let line = target.clamp(0, last) as usize;
		self.set_mark_at(0, '\'', self.caret());
		self.carets.collapse();
		let doc = self.host.text();
		self.place_caret(0, first_non_blank(doc, line));
		Ok(())
	}

	fn ex_operate(&mut self, session: &mut Session, operator: Operator, lines: (usize, usize), register: Option<char>, amount: usize) -> EditorResult<()> {
		let doc = self.host.text();
		let mut ranges = CaretRanges::new();
		ranges.push((0, TextRange::linewise(line_start(doc, lines.0), line_end_with_newline(doc, lines.1))));
		self.carets.collapse();
		self.apply_operator(
			session,
			OperatorArgs {
				operator,
				ranges,
				register,
				amount,
				visual: false,
			},
		)
	}

	/// `:[line]put[!] [x]`: always puts whole lines, below `line` or above
	/// it with `!`. `:0put` puts above the first line.
	fn ex_put(&mut self, session: &mut Session, range: Option<&LineRange>, register: Option<char>, above: bool) -> EditorResult<()> {
		let line = match range {
			Some(range) => self.address_line(range.end.unwrap_or(range.start))?,
			None => self.host.position(self.caret()).0 as i64,
		};
		let count = self.host.line_count() as i64;
		if !(-1..count).contains(&line) {
			return Err(EditorError::InvalidRange);
		}
		let (line, above) = if line < 0 { (0, true) } else { (line as usize, above) };

		let name = register.unwrap_or('"');
		let contents = self.read_register(session, 0, name).ok_or(EditorError::EmptyRegister(name))?;
		let mut text = contents.text;
		if !text.ends_with('\n') {
			text.push('\n');
		}
		let added = text.matches('\n').count();
		self.carets.collapse();
		let doc = self.host.text();
		self.place_caret(0, line_start(doc, line));
		self.put_register(0, &Register::new(name, text, SelectionType::LineWise), 1, above, false);

		let last = if above { line + added - 1 } else { line + added };
		let doc = self.host.text();
		self.place_caret(0, first_non_blank(doc, last.min(line_count(doc) - 1)));
		Ok(())
	}

	/// `:j`: a single line joins with the next; `a,b` joins the range.
	fn ex_join(&mut self, range: Option<&LineRange>, spaces: bool, count: Option<usize>) -> EditorResult<()> {
		let (first, last) = self.lines(range)?;
		let (top, lines) = match count {
			Some(count) => (last, count.max(2)),
			None => (first, (last - first + 1).max(2)),
		};
		self.carets.collapse();
		let doc = self.host.text();
		self.place_caret(0, line_start(doc, top));
		self.join(spaces, Some(lines))
	}

	/// `:s/pattern/replacement/flags` over `lines`.
	///
	/// Matches never cross lines. An empty pattern reuses the last search,
	/// and `~` in the replacement stands for the previous replacement.
	fn substitute(
		&mut self,
		session: &mut Session,
		pattern: &str,
		replacement: &str,
		flags: SubstituteFlags,
		lines: (usize, usize),
	) -> EditorResult<()> {
		let pattern = if pattern.is_empty() {
			session.last_search().map(|last| last.pattern.clone()).ok_or(PatternError::Empty)?
		} else {
			pattern.to_string()
		};
		let options = session.options();
		let regex = match flags.ignore_case {
			Some(ignore) => compile_pattern(&pattern, ignore, false)?,
			None => compile_pattern(&pattern, options.ignorecase, options.smartcase)?,
		};
		let replacement = with_previous_replacement(replacement, session.last_replacement.as_deref());
		let forward = session.last_search().is_none_or(|last| last.forward);
		session.set_last_search(&pattern, forward);
		session.last_replacement = Some(replacement.clone());
		let expanded = expand_replacement(&replacement);

		let (mut substitutions, mut changed_lines) = (0, 0);
		let mut last_changed = None;
		for line in (lines.0..=lines.1).rev() {
			let doc = self.host.text();
			let original = line_text(doc, line);
			let found = if flags.global { regex.find_iter(&original).count() } else { usize::from(regex.is_match(&original)) };
			if found == 0 {
				continue;
			}
			let replaced = if flags.global {
				regex.replace_all(&original, expanded.as_str())
			} else {
				regex.replace(&original, expanded.as_str())
			};
			let start = line_start(doc, line);
			let end = start + original.chars().count();
			self.edit(start, end, &replaced);
			substitutions += found;
			changed_lines += 1;
			last_changed.get_or_insert(line);
		}

		let Some(line) = last_changed else {
			if flags.quiet {
				return Ok(());
			}
			return Err(EditorError::PatternNotFound(pattern));
		};
		debug!(substitutions, changed_lines, "substituted");
		self.carets.collapse();
		let doc = self.host.text();
		let (top, last) = (line_start(doc, lines.0), line_start(doc, line));
		self.mark_change(0, top, last);
		self.place_caret(0, last);
		if changed_lines > 2 {
			self.message(format!("{} on {}", plural(substitutions, "substitution"), plural(changed_lines, "line")));
		}
		Ok(())
	}

	/// `:set`, one argument at a time. The first failing argument stops the
	/// rest.
	fn ex_set(&mut self, session: &mut Session, args: &[SetArg]) -> EditorResult<()> {
		if args.is_empty() {
			let defaults = Options::default();
			for name in Options::names() {
				let value = session.options().get(name)?;
				if defaults.get(name)? != value {
					self.message(value.display(name));
				}
			}
			return Ok(());
		}
		for arg in args {
			trace!(?arg, "set");
			match arg {
				SetArg::Bare(name) => match session.options().get(name)? {
					OptionValue::Bool(_) => session.set_option(name, OptionValue::Bool(true))?,
					value => self.message(value.display(canonical(name))),
				},
				SetArg::Query(name) => {
					let value = session.options().get(name)?;
					self.message(value.display(canonical(name)));
				}
				SetArg::Disable(name) => session.set_option(name, OptionValue::Bool(false))?,
				SetArg::Toggle(name) => {
					let OptionValue::Bool(on) = session.options().get(name)? else {
						return Err(invalid(name, "!").into());
					};
					session.set_option(name, OptionValue::Bool(!on))?;
				}
				SetArg::Reset(name) => session.reset_option(name)?,
				SetArg::Assign { name, op, value } => {
					let current = session.options().get(name)?;
					let next = assigned(name, current, *op, value)?;
					session.set_option(name, next)?;
				}
			}
		}
		Ok(())
	}

	/// `:registers`, optionally only the named ones.
	fn list_registers(&mut self, session: &Session, names: Option<&str>) {
		self.message("Type Name Content");
		let registers = session.registers.list();
		for register in registers {
			if names.is_some_and(|names| !names.contains(register.name)) {
				continue;
			}
			let kind = match register.kind {
				SelectionType::CharacterWise => 'c',
				SelectionType::LineWise => 'l',
				SelectionType::BlockWise => 'b',
			};
			self.message(format!("  {kind}  \"{}   {}", register.name, register.display_text()));
		}
	}

	/// `:marks`, optionally only the named ones.
	fn list_marks(&mut self, names: Option<&str>) {
		let marks = self.carets.primary().marks().list();
		self.message("mark line  col file/text");
		for (name, mark) in marks {
			if names.is_some_and(|names| !names.contains(name)) {
				continue;
			}
			let text = self.host.line_text(mark.line.min(self.host.line_count() - 1));
			self.message(format!(" {name} {:>6} {:>4} {}", mark.line + 1, mark.col, text.trim()));
		}
	}
}

fn canonical(name: &str) -> &str {
	Options::canonical_name(name).unwrap_or(name)
}

fn invalid(name: &str, value: &str) -> OptionsError {
	OptionsError::InvalidValue {
		name: canonical(name).to_string(),
		value: value.to_string(),
	}
}

/// The value `name op= value` gives. Numbers add, subtract and multiply
/// (`^=`); list options add and remove items; other strings append and
/// prepend.
fn assigned(name: &str, current: OptionValue, op: SetOp, value: &str) -> Result<OptionValue, OptionsError> {
	match current {
		OptionValue::Bool(_) => Err(invalid(name, value)),
		OptionValue::Number(n) => {
			let v: usize = value.trim().parse().map_err(|_| OptionsError::NumberRequired {
				name: canonical(name).to_string(),
				value: value.to_string(),
			})?;
			Ok(OptionValue::Number(match op {
				SetOp::Assign => v,
				SetOp::Add => n.saturating_add(v),
				SetOp::Subtract => n.saturating_sub(v),
				SetOp::Prepend => n.saturating_mul(v),
			}))
		}
		OptionValue::String(s) => {
			let list = LIST_OPTIONS.contains(&canonical(name));
			Ok(OptionValue::String(match op {
				SetOp::Assign => value.to_string(),
				SetOp::Add if list && s.split(',').any(|item| item == value) => s,
				SetOp::Add if list && !s.is_empty() => format!("{s},{value}"),
				SetOp::Add => format!("{s}{value}"),
				SetOp::Subtract if list => s.split(',').filter(|item| *item != value).collect::<Vec<_>>().join(","),
				SetOp::Subtract => s.replacen(value, "", 1),
				SetOp::Prepend if list && !s.is_empty() => format!("{value},{s}"),
				SetOp::Prepend => format!("{value}{s}"),
			}))
		}
	}
}

/// Replaces each unescaped `~` with the previous replacement.
fn with_previous_replacement(replacement: &str, previous: Option<&str>) -> String {
	let mut out = String::with_capacity(replacement.len());
	let mut chars = replacement.chars();
	while let Some(c) = chars.next() {
		match c {
			'~' => out.push_str(previous.unwrap_or("")),
			'\\' => {
				out.push('\\');
				if let Some(next) = chars.next() {
					out.push(next);
				}
			}
			c => out.push(c),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(4, SetOp::Assign, "2", 2)]
	#[case(4, SetOp::Add, "2", 6)]
	#[case(4, SetOp::Subtract, "8", 0)]
	#[case(4, SetOp::Prepend, "3", 12)]
	fn number_assignments(#[case] current: usize, #[case] op: SetOp, #[case] value: &str, #[case] expected: usize) {
		assert_eq!(assigned("sw", OptionValue::Number(current), op, value), Ok(OptionValue::Number(expected)));
	}

	#[test]
	fn list_options_add_and_remove_items() {
		let ww = || OptionValue::String("b,s".into());
		assert_eq!(assigned("ww", ww(), SetOp::Add, "s"), Ok(ww()));
		assert_eq!(assigned("ww", ww(), SetOp::Subtract, "b"), Ok(OptionValue::String("s".into())));
		assert_eq!(assigned("cb", OptionValue::String(String::new()), SetOp::Add, "unnamed"), Ok(OptionValue::String("unnamed".into())));
	}

	#[test]
	fn number_options_need_numbers() {
		assert!(matches!(assigned("ts", OptionValue::Number(8), SetOp::Assign, "x"), Err(OptionsError::NumberRequired { .. })));
		assert!(matches!(assigned("et", OptionValue::Bool(true), SetOp::Assign, "1"), Err(OptionsError::InvalidValue { .. })));
	}

	#[test]
	fn tilde_is_the_previous_replacement() {
		assert_eq!(with_previous_replacement("<~>", Some("x")), "<x>");
		assert_eq!(with_previous_replacement("\\~~", Some("x")), "\\~x");
		assert_eq!(with_previous_replacement("~", None), "");
	}
}

