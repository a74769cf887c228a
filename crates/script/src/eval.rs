//! Statement execution and expression evaluation.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};
use viper_primitives::SelectionType;

use crate::ast::{BinaryOp, CaseMode, EchoKind, Expr, ForTarget, FunctionDef, LambdaDef, LetOp, LetTarget, Stmt, UnaryOp};
use crate::builtins;
use crate::command::parse_script;
use crate::error::{EvalError, EvalErrorKind, EvalResult, ScriptError};
use crate::ex::ExCommand;
use crate::parser::parse_expression;
use crate::scope::{Frame, new_dict};
use crate::value::{DictRef, FuncTarget, Funcref, Special, Value, type_code};

/// Default for `'maxfuncdepth'`.
pub const MAX_CALL_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
	Echo,
	Msg,
	Error,
}

/// The editor as seen from a script: options, registers, buffer queries and
/// ex commands.
///
/// Every method has a default so a host only implements what it can back.
pub trait ScriptHost {
	fn option(&self, _name: &str) -> Option<Value> {
		None
	}

	fn set_option(&mut self, name: &str, _value: &Value) -> EvalResult<()> {
		Err(EvalErrorKind::UnknownOption(name.to_string()).into())
	}

	fn register(&self, _name: char) -> Option<(String, SelectionType)> {
		None
	}

	fn set_register(&mut self, name: char, _text: &str, _kind: SelectionType) -> EvalResult<()> {
		Err(EvalErrorKind::InvalidArgument(format!("@{name}")).into())
	}

	/// `line()`: `"."`, `"$"`, `"'x"` and friends. 0 when unknown.
	fn line(&self, _expr: &str) -> i64 {
		0
	}

	/// `col()`, 1-based byte column.
	fn col(&self, _expr: &str) -> i64 {
		0
	}

	fn getline(&self, _lnum: usize) -> Option<String> {
		None
	}

	/// `mode()` short name.
	fn mode(&self) -> String {
		"n".to_string()
	}

	fn execute_ex(&mut self, _command: &ExCommand) -> EvalResult<()> {
		Err(EvalErrorKind::Message("E492: Not an editor command".to_string()).into())
	}

	fn message(&mut self, _text: &str, _kind: MessageKind) {}
}

/// A host with no editor behind it: options and registers live in maps and
/// messages are collected.
#[derive(Debug, Default)]
pub struct MemoryHost {
	pub options: FxHashMap<String, Value>,
	pub registers: FxHashMap<char, (String, SelectionType)>,
	pub messages: Vec<(MessageKind, String)>,
}

impl ScriptHost for MemoryHost {
	fn option(&self, name: &str) -> Option<Value> {
		self.options.get(name).cloned()
	}

	fn set_option(&mut self, name: &str, value: &Value) -> EvalResult<()> {
		self.options.insert(name.to_string(), value.clone());
		Ok(())
	}

	fn register(&self, name: char) -> Option<(String, SelectionType)> {
		self.registers.get(&name.to_ascii_lowercase()).cloned()
	}

	fn set_register(&mut self, name: char, text: &str, kind: SelectionType) -> EvalResult<()> {
		self.registers.insert(name.to_ascii_lowercase(), (text.to_string(), kind));
		Ok(())
	}

	fn message(&mut self, text: &str, kind: MessageKind) {
		self.messages.push((kind, text.to_string()));
	}
}

/// A `:function` definition with the frame it closes over.
#[derive(Debug)]
pub(crate) struct UserFunction {
	pub(crate) name: String,
	pub(crate) def: Rc<FunctionDef>,
	pub(crate) closure: Option<Rc<Frame>>,
}

/// Evaluation context of the statement being run.
pub(crate) struct Cx<'a> {
	pub(crate) host: &'a mut dyn ScriptHost,
	pub(crate) frame: Option<Rc<Frame>>,
	/// Inside a function without `abort`, a failing statement is reported
	/// and execution moves on to the next one.
	resilient: bool,
}

impl<'a> Cx<'a> {
	fn top(host: &'a mut dyn ScriptHost) -> Self {
		Self { host, frame: None, resilient: false }
	}

	fn frame(&self) -> Option<&Rc<Frame>> {
		self.frame.as_ref()
	}
}

#[derive(Debug)]
enum Flow {
	Next,
	Break,
	Continue,
	Return(Value),
}

enum Callee {
	Name(String),
	Ref(Rc<Funcref>),
}

/// Script state: global variables, defined functions and `v:` variables.
///
/// Values hold `Rc` references, so an interpreter stays on one thread.
pub struct Interpreter {
	globals: DictRef,
	script_vars: DictRef,
	buffer_vars: DictRef,
	window_vars: DictRef,
	tab_vars: DictRef,
	vim_vars: DictRef,
	env: FxHashMap<String, String>,
	functions: FxHashMap<String, Rc<UserFunction>>,
	anonymous: usize,
	lambdas: usize,
	depth: usize,
	max_depth: usize,
}

impl std::fmt::Debug for Interpreter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Interpreter")
			.field("functions", &self.functions.len())
			.field("max_depth", &self.max_depth)
			.finish_non_exhaustive()
	}
}

impl Default for Interpreter {
	fn default() -> Self {
		Self::new()
	}
}

impl Interpreter {
	pub fn new() -> Self {
		let vim_vars = new_dict();
		{
			let mut v = vim_vars.borrow_mut();
			v.insert("version".into(), Value::Number(900));
			v.insert("true".into(), Value::Special(Special::True));
			v.insert("false".into(), Value::Special(Special::False));
			v.insert("null".into(), Value::Special(Special::Null));
			v.insert("none".into(), Value::Special(Special::None));
			v.insert("count".into(), Value::Number(0));
			v.insert("count1".into(), Value::Number(1));
			v.insert("register".into(), Value::string("\""));
			v.insert("errmsg".into(), Value::string(""));
			for (name, code) in [
				("t_number", type_code::NUMBER),
				("t_string", type_code::STRING),
				("t_func", type_code::FUNCREF),
				("t_list", type_code::LIST),
				("t_dict", type_code::DICT),
				("t_float", type_code::FLOAT),
				("t_bool", type_code::BOOL),
				("t_none", type_code::NONE),
			] {
				v.insert(name.into(), Value::Number(code));
			}
		}
		Self {
			globals: new_dict(),
			script_vars: new_dict(),
			buffer_vars: new_dict(),
			window_vars: new_dict(),
			tab_vars: new_dict(),
			vim_vars,
			env: FxHashMap::default(),
			functions: FxHashMap::default(),
			anonymous: 0,
			lambdas: 0,
			depth: 0,
			max_depth: MAX_CALL_DEPTH,
		}
	}

	pub fn set_max_depth(&mut self, depth: usize) {
		self.max_depth = depth;
	}

	/// Evaluates one expression.
	pub fn evaluate(&mut self, source: &str, host: &mut dyn ScriptHost) -> Result<Value, ScriptError> {
		let expr = parse_expression(source)?;
		let mut cx = Cx::top(host);
		Ok(self.eval(&expr, &mut cx)?)
	}

	/// Parses and runs script lines.
	pub fn execute(&mut self, source: &str, host: &mut dyn ScriptHost) -> Result<(), ScriptError> {
		let stmts = parse_script(source)?;
		Ok(self.run(&stmts, host)?)
	}

	/// Runs parsed statements at the top level.
	pub fn run(&mut self, stmts: &[Stmt], host: &mut dyn ScriptHost) -> EvalResult<()> {
		let mut cx = Cx::top(host);
		match self.exec_block(stmts, &mut cx) {
			Ok(_) => Ok(()),
			Err(err) => {
				self.vim_vars.borrow_mut().insert("errmsg".into(), Value::string(err.to_string()));
				Err(err)
			}
		}
	}

	/// Calls a builtin or user function by name.
	pub fn call(&mut self, name: &str, args: Vec<Value>, host: &mut dyn ScriptHost) -> EvalResult<Value> {
		let mut cx = Cx::top(host);
		self.call_named(name, args, None, &mut cx)
	}

	pub fn global(&self, name: &str) -> Option<Value> {
		self.globals.borrow().get(name).cloned()
	}

	pub fn set_global(&mut self, name: &str, value: Value) {
		self.globals.borrow_mut().insert(name.to_string(), value);
	}

	/// Sets a `v:` variable from the editor side, e.g. `v:count`.
	pub fn set_vim_var(&mut self, name: &str, value: Value) {
		self.vim_vars.borrow_mut().insert(name.to_string(), value);
	}

	pub fn has_function(&self, name: &str) -> bool {
		self.functions.contains_key(function_key(name))
	}

	pub(crate) fn function(&self, name: &str) -> Option<Rc<UserFunction>> {
		self.functions.get(function_key(name)).cloned()
	}

	pub(crate) fn has_variable(&self, name: &str, frame: Option<&Rc<Frame>>) -> bool {
		self.get_var(name, frame).is_ok()
	}

	pub(crate) fn env_var(&self, name: &str) -> String {
		match self.env.get(name) {
			Some(v) => v.clone(),
			None => std::env::var(name).unwrap_or_default(),
		}
	}

	fn scope_dict(&self, scope: char) -> &DictRef {
		match scope {
			's' => &self.script_vars,
			'b' => &self.buffer_vars,
			'w' => &self.window_vars,
			't' => &self.tab_vars,
			'v' => &self.vim_vars,
			_ => &self.globals,
		}
	}

	fn get_var(&self, name: &str, frame: Option<&Rc<Frame>>) -> EvalResult<Value> {
		let found = match split_scope(name) {
			Some(('a', key)) => frame.and_then(|f| f.lookup_arg(key)),
			Some(('l', key)) => match frame {
				Some(f) => f.locals.borrow().get(key).cloned(),
				None => self.globals.borrow().get(key).cloned(),
			},
			Some((scope, key)) => self.scope_dict(scope).borrow().get(key).cloned(),
			None => match frame {
				Some(f) => f
					.lookup(name)
					.or_else(|| if f.sees_globals() { self.globals.borrow().get(name).cloned() } else { None }),
				None => self.globals.borrow().get(name).cloned(),
			},
		};
		found.ok_or_else(|| EvalErrorKind::UndefinedVariable(name.to_string()).into())
	}

	fn set_var(&mut self, name: &str, value: Value, frame: Option<&Rc<Frame>>) -> EvalResult<()> {
		let (dict, key) = match split_scope(name) {
			Some(('a', _)) => return Err(EvalErrorKind::ReadOnlyVariable(name.to_string()).into()),
			Some(('v', key)) if is_read_only_vim_var(key) => {
				return Err(EvalErrorKind::ReadOnlyVariable(name.to_string()).into());
			}
			Some(('l', key)) => (frame.map_or_else(|| self.globals.clone(), |f| f.locals.clone()), key),
			Some((scope, key)) => (self.scope_dict(scope).clone(), key),
			None => match frame {
				Some(f) => (f.owner_of(name).unwrap_or_else(|| f.locals.clone()), name),
				None => (self.globals.clone(), name),
			},
		};
		if key.is_empty() {
			return Err(EvalErrorKind::InvalidArgument(name.to_string()).into());
		}
		trace!(variable = name, "let");
		dict.borrow_mut().insert(key.to_string(), value);
		Ok(())
	}

	fn remove_var(&mut self, name: &str, frame: Option<&Rc<Frame>>) -> EvalResult<bool> {
		let dict = match split_scope(name) {
			Some(('a' | 'v', _)) => return Err(EvalErrorKind::ReadOnlyVariable(name.to_string()).into()),
			Some(('l', _)) => frame.map(|f| f.locals.clone()),
			Some((scope, _)) => Some(self.scope_dict(scope).clone()),
			None => match frame {
				Some(f) => f.owner_of(name).or_else(|| f.sees_globals().then(|| self.globals.clone())),
				None => Some(self.globals.clone()),
			},
		};
		let key = split_scope(name).map_or(name, |(_, key)| key);
		Ok(dict.is_some_and(|d| d.borrow_mut().shift_remove(key).is_some()))
	}

	pub(crate) fn eval(&mut self, expr: &Expr, cx: &mut Cx<'_>) -> EvalResult<Value> {
		match expr {
			Expr::Number(n) => Ok(Value::Number(*n)),
			Expr::Float(f) => Ok(Value::Float(*f)),
			Expr::String(s) => Ok(Value::string(s.as_str())),
			Expr::List(items) => Ok(Value::list(self.eval_all(items, cx)?)),
			Expr::Dict(entries) => {
				let dict = new_dict();
				for (key, value) in entries {
					let key = self.eval(key, cx)?.to_str()?;
					let value = self.eval(value, cx)?;
					dict.borrow_mut().insert(key, value);
				}
				Ok(Value::Dict(dict))
			}
			Expr::Lambda(def) => Ok(self.make_lambda(def, cx)),
			Expr::Var(name) => self.get_var(name, cx.frame()),
			Expr::Option(name) => cx
				.host
				.option(name)
				.ok_or_else(|| EvalErrorKind::UnknownOption(name.clone()).into()),
			Expr::Register(name) => Ok(Value::String(register_text(&*cx.host, *name))),
			Expr::Env(name) => Ok(Value::String(self.env_var(name))),
			Expr::Unary(op, operand) => {
				let v = self.eval(operand, cx)?;
				match (op, v) {
					(UnaryOp::Not, v) => Ok(Value::bool(!v.is_truthy()?)),
					(UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
					(UnaryOp::Neg, v) => Ok(Value::Number(v.to_number()?.wrapping_neg())),
					(UnaryOp::Plus, Value::Float(f)) => Ok(Value::Float(f)),
					(UnaryOp::Plus, v) => Ok(Value::Number(v.to_number()?)),
				}
			}
			Expr::Binary(op, lhs, rhs) => {
				let lhs = self.eval(lhs, cx)?;
				let rhs = self.eval(rhs, cx)?;
				lhs.binary(*op, &rhs)
			}
			Expr::Compare { op, case, lhs, rhs } => {
				let lhs = self.eval(lhs, cx)?;
				let rhs = self.eval(rhs, cx)?;
				let ignore_case = match case {
					CaseMode::Ignore => true,
					CaseMode::Match => false,
					CaseMode::Option => cx.host.option("ignorecase").is_some_and(|v| !v.is_empty_value()),
				};
				Ok(Value::bool(lhs.compare(*op, &rhs, ignore_case)?))
			}
			Expr::And(lhs, rhs) => {
				let result = self.eval(lhs, cx)?.is_truthy()? && self.eval(rhs, cx)?.is_truthy()?;
				Ok(Value::bool(result))
			}
			Expr::Or(lhs, rhs) => {
				let result = self.eval(lhs, cx)?.is_truthy()? || self.eval(rhs, cx)?.is_truthy()?;
				Ok(Value::bool(result))
			}
			Expr::Ternary(cond, then, otherwise) => {
				if self.eval(cond, cx)?.is_truthy()? {
					self.eval(then, cx)
				} else {
					self.eval(otherwise, cx)
				}
			}
			Expr::Falsy(value, fallback) => {
				let value = self.eval(value, cx)?;
				if value.is_empty_value() { self.eval(fallback, cx) } else { Ok(value) }
			}
			Expr::Index(base, idx) => {
				let base = self.eval(base, cx)?;
				let idx = self.eval(idx, cx)?;
				base.index(&idx)
			}
			Expr::Slice { base, from, to } => {
				let base = self.eval(base, cx)?;
				if matches!(base, Value::Dict(_)) {
					return Err(EvalErrorKind::CannotSliceDictionary.into());
				}
				let from = from.as_deref().map(|e| self.eval(e, cx)).transpose()?;
				let to = to.as_deref().map(|e| self.eval(e, cx)).transpose()?;
				base.slice(from.as_ref(), to.as_ref())
			}
			Expr::Member(base, key) => {
				let base = self.eval(base, cx)?;
				match &base {
					Value::Dict(dict) => {
						let found = dict.borrow().get(key).cloned();
						found.ok_or_else(|| EvalErrorKind::KeyNotPresent(key.clone()).into())
					}
					// Not a dictionary: `a.b` was a concatenation.
					_ => base.concat(&self.get_var(key, cx.frame())?),
				}
			}
			Expr::Call { callee, args } => self.eval_call(callee, args, cx),
			Expr::Method { base, name, args } => {
				let mut values = vec![self.eval(base, cx)?];
				values.extend(self.eval_all(args, cx)?);
				match self.get_var(name, cx.frame()) {
					Ok(Value::Funcref(f)) => self.call_funcref(&f, values, None, cx),
					_ => self.call_named(name, values, None, cx),
				}
			}
		}
	}

	fn eval_all(&mut self, exprs: &[Expr], cx: &mut Cx<'_>) -> EvalResult<Vec<Value>> {
		exprs.iter().map(|e| self.eval(e, cx)).collect()
	}

	fn make_lambda(&mut self, def: &Rc<LambdaDef>, cx: &Cx<'_>) -> Value {
		self.lambdas += 1;
		Value::funcref(Funcref {
			name: format!("<lambda>{}", self.lambdas),
			target: FuncTarget::Lambda {
				def: def.clone(),
				closure: cx.frame.clone(),
			},
			bound_args: Vec::new(),
			dict: None,
		})
	}

	fn eval_call(&mut self, callee: &Expr, args: &[Expr], cx: &mut Cx<'_>) -> EvalResult<Value> {
		let (target, self_dict) = match callee {
			Expr::Var(name) => match self.get_var(name, cx.frame()) {
				Ok(Value::Funcref(f)) => (Callee::Ref(f), None),
				_ => (Callee::Name(name.clone()), None),
			},
			Expr::Member(base, key) => {
				let dict = match self.eval(base, cx)? {
					Value::Dict(dict) => dict,
					other => {
						let called = self.eval_call(&Expr::Var(key.clone()), args, cx)?;
						return other.concat(&called);
					}
				};
				let found = dict.borrow().get(key).cloned();
				let value = found.ok_or_else(|| EvalError::from(EvalErrorKind::KeyNotPresent(key.clone())))?;
				(callable(value)?, Some(dict))
			}
			Expr::Index(base, idx) => {
				let base = self.eval(base, cx)?;
				let idx = self.eval(idx, cx)?;
				let value = base.index(&idx)?;
				let self_dict = if let Value::Dict(d) = base { Some(d) } else { None };
				(callable(value)?, self_dict)
			}
			other => (callable(self.eval(other, cx)?)?, None),
		};
		let args = self.eval_all(args, cx)?;
		match target {
			Callee::Name(name) => self.call_named(&name, args, self_dict, cx),
			Callee::Ref(f) => self.call_funcref(&f, args, self_dict, cx),
		}
	}

	pub(crate) fn call_funcref(
		&mut self,
		f: &Funcref,
		args: Vec<Value>,
		self_dict: Option<DictRef>,
		cx: &mut Cx<'_>,
	) -> EvalResult<Value> {
		let mut all = f.bound_args.clone();
		all.extend(args);
		let self_dict = f.dict.clone().or(self_dict);
		match &f.target {
			FuncTarget::Named => self.call_named(&f.name, all, self_dict, cx),
			FuncTarget::Lambda { def, closure } => self.call_lambda(&f.name, def, closure.clone(), all, self_dict, cx),
		}
	}

	pub(crate) fn call_named(
		&mut self,
		name: &str,
		args: Vec<Value>,
		self_dict: Option<DictRef>,
		cx: &mut Cx<'_>,
	) -> EvalResult<Value> {
		if let Some(func) = self.function(name) {
			return self.call_user(&func, args, self_dict, cx);
		}
		if let Some(builtin) = builtins::lookup(name) {
			return builtin.call(self, args, cx);
		}
		Err(EvalErrorKind::UnknownFunction(name.to_string()).into())
	}

	fn enter(&mut self) -> EvalResult<()> {
		if self.depth >= self.max_depth {
			warn!(depth = self.depth, "function call depth exceeded");
			return Err(EvalErrorKind::CallDepth.into());
		}
		self.depth += 1;
		Ok(())
	}

	fn call_user(
		&mut self,
		func: &UserFunction,
		args: Vec<Value>,
		self_dict: Option<DictRef>,
		cx: &mut Cx<'_>,
	) -> EvalResult<Value> {
		let def = &func.def;
		check_arity(&func.name, def.params.len(), def.varargs, args.len())?;
		let mut frame = bind_frame(func.closure.clone(), false, &def.params, args);
		frame.self_dict = self_dict;
		let line = cx.host.line(".");
		frame.args.borrow_mut().insert("firstline".into(), Value::Number(line));
		frame.args.borrow_mut().insert("lastline".into(), Value::Number(line));

		self.enter()?;
		debug!(function = %func.name, depth = self.depth, "call");
		let result = {
			let mut inner = Cx {
				host: &mut *cx.host,
				frame: Some(Rc::new(frame)),
				resilient: !def.flags.abort,
			};
			self.exec_block(&def.body, &mut inner)
		};
		self.depth -= 1;
		match result? {
			Flow::Return(value) => Ok(value),
			_ => Ok(Value::Number(0)),
		}
	}

	fn call_lambda(
		&mut self,
		name: &str,
		def: &LambdaDef,
		closure: Option<Rc<Frame>>,
		args: Vec<Value>,
		self_dict: Option<DictRef>,
		cx: &mut Cx<'_>,
	) -> EvalResult<Value> {
		check_arity(name, def.params.len(), def.varargs, args.len())?;
		let mut frame = bind_frame(closure, true, &def.params, args);
		frame.self_dict = self_dict;
		self.enter()?;
		let result = {
			let mut inner = Cx {
				host: &mut *cx.host,
				frame: Some(Rc::new(frame)),
				resilient: false,
			};
			self.eval(&def.body, &mut inner)
		};
		self.depth -= 1;
		result
	}

	fn exec_block(&mut self, stmts: &[Stmt], cx: &mut Cx<'_>) -> EvalResult<Flow> {
		for stmt in stmts {
			match self.exec(stmt, cx) {
				Ok(Flow::Next) => {}
				Ok(flow) => return Ok(flow),
				Err(err) if cx.resilient => {
					debug!(error = %err, "statement failed, continuing");
					self.vim_vars.borrow_mut().insert("errmsg".into(), Value::string(err.to_string()));
					cx.host.message(&err.to_string(), MessageKind::Error);
				}
				Err(err) => return Err(err),
			}
		}
		Ok(Flow::Next)
	}

	fn exec(&mut self, stmt: &Stmt, cx: &mut Cx<'_>) -> EvalResult<Flow> {
		match stmt {
			Stmt::Let { target, op, value } => {
				let value = self.eval(value, cx)?;
				self.assign(target, *op, value, cx)?;
			}
			Stmt::LetUnpack { targets, rest, op, value } => {
				let items = match self.eval(value, cx)? {
					Value::List(list) => list.borrow().clone(),
					_ => return Err(EvalErrorKind::ListRequired.into()),
				};
				if items.len() < targets.len() {
					return Err(EvalErrorKind::TooManyTargets.into());
				}
				if rest.is_none() && items.len() > targets.len() {
					return Err(EvalErrorKind::TooFewTargets.into());
				}
				let mut items = items.into_iter();
				for target in targets {
					let item = items.next().unwrap_or(Value::Number(0));
					self.assign(target, *op, item, cx)?;
				}
				if let Some(rest) = rest {
					self.assign(rest, *op, Value::list(items.collect()), cx)?;
				}
			}
			Stmt::Unlet { targets, force } => {
				for target in targets {
					self.unlet(target, *force, cx)?;
				}
			}
			Stmt::Echo { kind, args } => {
				let values = self.eval_all(args, cx)?;
				let text = values.iter().map(Value::echo_string).collect::<Vec<_>>().join(" ");
				match kind {
					EchoKind::Echo => cx.host.message(&text, MessageKind::Echo),
					EchoKind::Msg => cx.host.message(&text, MessageKind::Msg),
					EchoKind::Err => return Err(EvalErrorKind::Message(text).into()),
				}
			}
			Stmt::If { branches, otherwise } => {
				for (cond, body) in branches {
					if self.eval(cond, cx)?.is_truthy()? {
						return self.exec_block(body, cx);
					}
				}
				return self.exec_block(otherwise, cx);
			}
			Stmt::While { cond, body } => {
				while self.eval(cond, cx)?.is_truthy()? {
					match self.exec_block(body, cx)? {
						Flow::Break => break,
						Flow::Return(v) => return Ok(Flow::Return(v)),
						Flow::Next | Flow::Continue => {}
					}
				}
			}
			Stmt::For { target, iterable, body } => {
				let list = match self.eval(iterable, cx)? {
					Value::List(list) => list,
					Value::String(s) => Rc::new(RefCell::new(s.chars().map(|c| Value::String(c.to_string())).collect())),
					_ => return Err(EvalErrorKind::ListRequired.into()),
				};
				let mut i = 0;
				loop {
					let Some(item) = list.borrow().get(i).cloned() else {
						break;
					};
					i += 1;
					self.bind_for(target, item, cx)?;
					match self.exec_block(body, cx)? {
						Flow::Break => break,
						Flow::Return(v) => return Ok(Flow::Return(v)),
						Flow::Next | Flow::Continue => {}
					}
				}
			}
			Stmt::Break => return Ok(Flow::Break),
			Stmt::Continue => return Ok(Flow::Continue),
			Stmt::Function(def) => self.define(def, cx)?,
			Stmt::Return(value) => {
				let value = match value {
					Some(expr) => self.eval(expr, cx)?,
					None => Value::Number(0),
				};
				return Ok(Flow::Return(value));
			}
			Stmt::Call(expr) => {
				self.eval(expr, cx)?;
			}
			Stmt::Execute(exprs) => {
				let mut parts = Vec::with_capacity(exprs.len());
				for value in self.eval_all(exprs, cx)? {
					parts.push(value.concat(&Value::string(""))?.to_str()?);
				}
				let source = parts.join(" ");
				debug!(%source, "execute");
				let stmts = parse_script(&source).map_err(|e| EvalErrorKind::Message(e.to_string()))?;
				return self.exec_block(&stmts, cx);
			}
			Stmt::Ex(command) => cx.host.execute_ex(command)?,
		}
		Ok(Flow::Next)
	}

	fn bind_for(&mut self, target: &ForTarget, item: Value, cx: &mut Cx<'_>) -> EvalResult<()> {
		match target {
			ForTarget::Name(name) => self.set_var(name, item, cx.frame()),
			ForTarget::Unpack(names) => {
				let Value::List(list) = item else {
					return Err(EvalErrorKind::ListRequired.into());
				};
				let items = list.borrow().clone();
				if items.len() < names.len() {
					return Err(EvalErrorKind::TooManyTargets.into());
				}
				if items.len() > names.len() {
					return Err(EvalErrorKind::TooFewTargets.into());
				}
				for (name, item) in names.iter().zip(items) {
					self.set_var(name, item, cx.frame())?;
				}
				Ok(())
			}
		}
	}

	fn define(&mut self, def: &Rc<FunctionDef>, cx: &mut Cx<'_>) -> EvalResult<()> {
		let closure = if def.flags.closure { cx.frame.clone() } else { None };
		if let Some((base, key)) = def.name.split_once('.') {
			let Value::Dict(dict) = self.get_var(base, cx.frame())? else {
				return Err(EvalErrorKind::InvalidArgument(def.name.clone()).into());
			};
			if dict.borrow().contains_key(key) && !def.replace {
				return Err(EvalErrorKind::FunctionExists(def.name.clone()).into());
			}
			self.anonymous += 1;
			let name = self.anonymous.to_string();
			debug!(function = %def.name, %name, "define dictionary function");
			self.functions.insert(name.clone(), Rc::new(UserFunction { name: name.clone(), def: def.clone(), closure }));
			dict.borrow_mut().insert(key.to_string(), Value::funcref(Funcref::named(name)));
			return Ok(());
		}

		let key = function_key(&def.name);
		if self.functions.contains_key(key) && !def.replace {
			return Err(EvalErrorKind::FunctionExists(def.name.clone()).into());
		}
		debug!(function = key, "define");
		self.functions.insert(
			key.to_string(),
			Rc::new(UserFunction {
				name: key.to_string(),
				def: def.clone(),
				closure,
			}),
		);
		Ok(())
	}

	fn assign(&mut self, target: &LetTarget, op: LetOp, value: Value, cx: &mut Cx<'_>) -> EvalResult<()> {
		match target {
			LetTarget::Var(name) => {
				let value = match op.binary() {
					None => value,
					Some(bin) => {
						let current = self.get_var(name, cx.frame())?;
						// `+=` on a List extends it in place.
						if bin == BinaryOp::Add
							&& let (Value::List(list), Value::List(extra)) = (&current, &value)
						{
							let extra = extra.borrow().clone();
							list.borrow_mut().extend(extra);
							return Ok(());
						}
						current.binary(bin, &value)?
					}
				};
				self.set_var(name, value, cx.frame())
			}
			LetTarget::Option(name) => {
				let value = combine(op, value, || {
					cx.host
						.option(name)
						.ok_or_else(|| EvalErrorKind::UnknownOption(name.clone()).into())
				})?;
				debug!(option = %name, value = %value.echo_string(), "set option");
				cx.host.set_option(name, &value)
			}
			LetTarget::Register(name) => {
				let name = if *name == '@' { '"' } else { *name };
				let (text, kind) = match &value {
					Value::List(lines) => {
						let lines = lines.borrow().iter().map(Value::to_str).collect::<EvalResult<Vec<_>>>()?;
						(lines.join("\n") + "\n", SelectionType::LineWise)
					}
					other => {
						let text = combine(op, other.clone(), || Ok(Value::String(register_text(&*cx.host, name))))?.to_str()?;
						let kind = if text.ends_with('\n') { SelectionType::LineWise } else { SelectionType::CharacterWise };
						(text, kind)
					}
				};
				cx.host.set_register(name, &text, kind)
			}
			LetTarget::Env(name) => {
				let text = combine(op, value, || Ok(Value::String(self.env_var(name))))?.to_str()?;
				self.env.insert(name.clone(), text);
				Ok(())
			}
			LetTarget::Index(base, idx) => {
				let container = self.eval(base, cx)?;
				let idx = self.eval(idx, cx)?;
				match container {
					Value::List(list) => {
						let i = idx.to_number()?;
						let len = list.borrow().len();
						let j = crate::ops::resolve_index(i, len).ok_or(EvalErrorKind::IndexOutOfRange(i))?;
						let current = list.borrow()[j].clone();
						let value = combine(op, value, || Ok(current))?;
						list.borrow_mut()[j] = value;
						Ok(())
					}
					Value::Dict(dict) => set_entry(&dict, idx.to_str()?, op, value),
					other => Err(EvalErrorKind::CannotIndex(other.type_name()).into()),
				}
			}
			LetTarget::Member(base, key) => match self.eval(base, cx)? {
				Value::Dict(dict) => set_entry(&dict, key.clone(), op, value),
				other => Err(EvalErrorKind::CannotIndex(other.type_name()).into()),
			},
		}
	}

	fn unlet(&mut self, target: &LetTarget, force: bool, cx: &mut Cx<'_>) -> EvalResult<()> {
		match target {
			LetTarget::Var(name) => {
				if !self.remove_var(name, cx.frame())? && !force {
					return Err(EvalErrorKind::NoSuchVariable(name.clone()).into());
				}
				Ok(())
			}
			LetTarget::Env(name) => {
				self.env.insert(name.clone(), String::new());
				Ok(())
			}
			LetTarget::Index(base, idx) => {
				let container = self.eval(base, cx)?;
				let idx = self.eval(idx, cx)?;
				match container {
					Value::List(list) => {
						let i = idx.to_number()?;
						let len = list.borrow().len();
						let j = crate::ops::resolve_index(i, len).ok_or(EvalErrorKind::IndexOutOfRange(i))?;
						list.borrow_mut().remove(j);
						Ok(())
					}
					Value::Dict(dict) => remove_entry(&dict, idx.to_str()?, force),
					other => Err(EvalErrorKind::CannotIndex(other.type_name()).into()),
				}
			}
			LetTarget::Member(base, key) => match self.eval(base, cx)? {
				Value::Dict(dict) => remove_entry(&dict, key.clone(), force),
				other => Err(EvalErrorKind::CannotIndex(other.type_name()).into()),
			},
			LetTarget::Option(name) => Err(EvalErrorKind::InvalidArgument(format!("&{name}")).into()),
			LetTarget::Register(name) => Err(EvalErrorKind::InvalidArgument(format!("@{name}")).into()),
		}
	}
}

fn callable(value: Value) -> EvalResult<Callee> {
	match value {
		Value::Funcref(f) => Ok(Callee::Ref(f)),
		other => Err(EvalErrorKind::NotCallable(other.repr()).into()),
	}
}

fn combine(op: LetOp, value: Value, current: impl FnOnce() -> EvalResult<Value>) -> EvalResult<Value> {
	match op.binary() {
		None => Ok(value),
		Some(bin) => current()?.binary(bin, &value),
	}
}

fn set_entry(dict: &DictRef, key: String, op: LetOp, value: Value) -> EvalResult<()> {
	let current = dict.borrow().get(&key).cloned();
	let value = combine(op, value, || current.ok_or_else(|| EvalErrorKind::KeyNotPresent(key.clone()).into()))?;
	dict.borrow_mut().insert(key, value);
	Ok(())
}

fn remove_entry(dict: &DictRef, key: String, force: bool) -> EvalResult<()> {
	if dict.borrow_mut().shift_remove(&key).is_none() && !force {
		return Err(EvalErrorKind::KeyNotPresent(key).into());
	}
	Ok(())
}

fn register_text(host: &dyn ScriptHost, name: char) -> String {
	let name = if name == '@' { '"' } else { name };
	host.register(name).map(|(text, _)| text).unwrap_or_default()
}

fn check_arity(name: &str, params: usize, varargs: bool, given: usize) -> EvalResult<()> {
	if given < params {
		return Err(EvalErrorKind::NotEnoughArguments(name.to_string()).into());
	}
	if given > params && !varargs {
		return Err(EvalErrorKind::TooManyArguments(name.to_string()).into());
	}
	Ok(())
}

/// Builds a call frame: named parameters, then `a:0`, `a:000` and `a:1`...
/// for the extra arguments.
fn bind_frame(parent: Option<Rc<Frame>>, is_lambda: bool, params: &[String], args: Vec<Value>) -> Frame {
	let frame = Frame::new(parent, is_lambda);
	{
		let mut bound = frame.args.borrow_mut();
		let mut args = args.into_iter();
		for (param, value) in params.iter().zip(args.by_ref()) {
			bound.insert(param.clone(), value);
		}
		let extra: Vec<Value> = args.collect();
		bound.insert("0".into(), Value::Number(extra.len() as i64));
		for (i, value) in extra.iter().enumerate() {
			bound.insert((i + 1).to_string(), value.clone());
		}
		bound.insert("000".into(), Value::list(extra));
	}
	frame
}

/// Splits `g:name` into its scope letter and the bare name.
fn split_scope(name: &str) -> Option<(char, &str)> {
	let bytes = name.as_bytes();
	(bytes.len() >= 2 && bytes[1] == b':' && b"gblswtav".contains(&bytes[0])).then(|| (bytes[0] as char, &name[2..]))
}

fn is_read_only_vim_var(key: &str) -> bool {
	matches!(key, "true" | "false" | "null" | "none" | "version") || key.starts_with("t_")
}

/// User functions are stored without a `g:` prefix.
fn function_key(name: &str) -> &str {
	name.strip_prefix("g:").unwrap_or(name)
}
