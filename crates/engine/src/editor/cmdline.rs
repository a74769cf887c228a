//! The `:`, `/` and `?` prompts, and the bridge scripts see the editor
//! through.

use tracing::{debug, trace};
use viper_input::movement::{search_backward, search_forward};
use viper_primitives::{CmdLineKind, SelectionType, compile_pattern};
use viper_registers::Register;
use viper_script::{EvalErrorKind, EvalResult, ExCommand, Interpreter, MessageKind, ScriptError, ScriptHost, Value, parse_command};

use super::Editor;
use crate::caret::CaretSet;
use crate::error::{EditorError, EditorResult};
use crate::host::EditorHost;
use crate::options::OptionValue;
use crate::session::Session;

/// Carets as they were when the prompt opened. Incsearch previews move the
/// carets; leaving the prompt puts them back before the submitted command
/// runs.
#[derive(Debug, Clone)]
pub(super) struct CmdLineOrigin {
	carets: CaretSet,
	/// Previews select from the origin to the match.
	select: bool,
}

impl<H: EditorHost> Editor<H> {
	/// The prompt opened or its text changed.
	pub(super) fn cmdline_changed(&mut self, session: &mut Session) -> EditorResult<()> {
		let Some(line) = self.input.cmdline() else {
			return Ok(());
		};
		let (kind, pattern, return_mode) = (line.kind(), line.text().to_string(), line.return_mode());
		let incsearch = kind != CmdLineKind::Ex && session.options().incsearch;

		if self.cmdline_origin.is_none() {
			if kind == CmdLineKind::Ex
				&& let Some(visual) = return_mode.visual_kind()
			{
				self.drop_selection(visual);
			}
			self.cmdline_origin = Some(CmdLineOrigin {
				carets: self.carets.clone(),
				select: return_mode.visual_kind().is_none(),
			});
			trace!(?kind, "command line opened");
		}
		if incsearch {
			self.preview_search(session, &pattern, kind == CmdLineKind::SearchForward);
		}
		Ok(())
	}

	/// Moves the primary caret to the first match of the pattern typed so
	/// far, or back to where the prompt opened.
	fn preview_search(&mut self, session: &Session, pattern: &str, forward: bool) {
		let Some(origin) = &self.cmdline_origin else {
			return;
		};
		self.carets = origin.carets.clone();
		if origin.select {
			self.carets.begin_incsearch();
		}
		if pattern.is_empty() {
			return;
		}
		let options = session.options();
		let Ok(regex) = compile_pattern(pattern, options.ignorecase, options.smartcase) else {
			return;
		};
		let text = self.host.text();
		let from = self.carets.primary().offset();
		let found = if forward {
			search_forward(text, &regex, from, 1, options.wrapscan)
		} else {
			search_backward(text, &regex, from, 1, options.wrapscan)
		};
		match found {
			Some(found) => self.place_caret(0, found.start),
			None => trace!(pattern, "no incsearch match"),
		}
	}

	/// Puts the carets back where they were when the prompt opened.
	pub(super) fn restore_cmdline_origin(&mut self) {
		if let Some(origin) = self.cmdline_origin.take() {
			self.carets = origin.carets;
		}
	}

	/// Runs `f` with the session's interpreter and this editor as its host.
	///
	/// Scripts started while one is running get an interpreter of their own.
	pub(super) fn with_script<T>(&mut self, session: &mut Session, f: impl FnOnce(&mut Interpreter, &mut dyn ScriptHost) -> T) -> T {
		let mut script = std::mem::take(&mut session.script);
		session.script.set_max_depth(session.options().maxfuncdepth);
		let result = f(&mut script, &mut Bridge { editor: self, session });
		session.script = script;
		result
	}

	/// Parses and runs one command line.
	pub(super) fn run_ex(&mut self, session: &mut Session, line: &str) -> EditorResult<()> {
		let line = line.trim_start_matches([':', ' ', '\t']);
		if line.is_empty() {
			return Ok(());
		}
		debug!(line, "ex");
		let stmts = parse_command(line).map_err(ScriptError::from)?;
		self.ex_failure = None;
		self.with_script(session, |script, host| script.run(&stmts, host))
			.map_err(|err| self.ex_failure.take().unwrap_or_else(|| EditorError::Script(err.into())))
	}
}

/// The editor and session as a [`ScriptHost`].
struct Bridge<'a, H: EditorHost> {
	editor: &'a mut Editor<H>,
	session: &'a mut Session,
}

impl<H: EditorHost> Bridge<'_, H> {
	/// 0-based `(line, column)` named by `line()` and `col()` arguments.
	fn position(&self, expr: &str) -> Option<(usize, usize)> {
		let editor = &*self.editor;
		let caret = editor.carets.primary();
		match expr {
			"." => Some(editor.host.position(caret.offset())),
			"v" => Some(editor.host.position(caret.anchor())),
			"$" => {
				let last = editor.host.line_count().saturating_sub(1);
				Some((last, editor.host.line_end(last) - editor.host.line_start(last)))
			}
			_ => {
				let name = expr.strip_prefix('\'')?.chars().next()?;
				caret.marks().get(name).ok().map(|mark| (mark.line, mark.col))
			}
		}
	}
}

impl<H: EditorHost> ScriptHost for Bridge<'_, H> {
	fn option(&self, name: &str) -> Option<Value> {
		Some(match self.session.options().get(name).ok()? {
			OptionValue::Bool(b) => Value::bool(b),
			OptionValue::Number(n) => Value::Number(i64::try_from(n).unwrap_or(i64::MAX)),
			OptionValue::String(s) => Value::string(s),
		})
	}

	fn set_option(&mut self, name: &str, value: &Value) -> EvalResult<()> {
		let current = self
			.session
			.options()
			.get(name)
			.map_err(|_| EvalErrorKind::UnknownOption(name.to_string()))?;
		let value = match current {
			OptionValue::Bool(_) => OptionValue::Bool(value.to_number()? != 0),
			OptionValue::Number(_) => {
				let n = value.to_number()?;
				OptionValue::Number(usize::try_from(n).map_err(|_| EvalErrorKind::InvalidArgument(format!("{name}={n}")))?)
			}
			OptionValue::String(_) => OptionValue::String(value.to_str()?),
		};
		self.session
			.set_option(name, value)
			.map_err(|err| EvalErrorKind::Message(err.to_string()).into())
	}

	fn register(&self, name: char) -> Option<(String, SelectionType)> {
		self.editor.read_register(&*self.session, 0, name).map(|register| (register.text, register.kind))
	}

	fn set_register(&mut self, name: char, text: &str, kind: SelectionType) -> EvalResult<()> {
		self.session
			.registers
			.save_register(name, Register::new(name, text, kind))
			.map_err(|err| EvalErrorKind::Message(err.to_string()))?;
		if name == '/' {
			let forward = self.session.last_search().is_none_or(|last| last.forward);
			self.session.set_last_search(text, forward);
		}
		Ok(())
	}

	fn line(&self, expr: &str) -> i64 {
		self.position(expr).map_or(0, |(line, _)| line as i64 + 1)
	}

	fn col(&self, expr: &str) -> i64 {
		let Some((line, col)) = self.position(expr) else {
			return 0;
		};
		let bytes: usize = self.editor.host.line_text(line).chars().take(col).map(char::len_utf8).sum();
		bytes as i64 + 1
	}

	fn getline(&self, lnum: usize) -> Option<String> {
		(1..=self.editor.host.line_count())
			.contains(&lnum)
			.then(|| self.editor.host.line_text(lnum - 1))
	}

	fn mode(&self) -> String {
		self.editor.mode().code().to_string()
	}

	fn execute_ex(&mut self, command: &ExCommand) -> EvalResult<()> {
		match self.editor.run_ex_command(self.session, command) {
			Ok(()) => Ok(()),
			Err(err) if err.is_silent() => {
				self.editor.host.beep();
				Ok(())
			}
			Err(err) => {
				let message = err.to_string();
				self.editor.ex_failure = Some(err);
				Err(EvalErrorKind::Message(message).into())
			}
		}
	}

	fn message(&mut self, text: &str, kind: MessageKind) {
		self.editor.messages.push((kind, text.to_string()));
	}
}
