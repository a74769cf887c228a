//! Builtin functions.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use viper_primitives::{SelectionType, compile_pattern, expand_replacement};

use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::eval::{Cx, Interpreter};
use crate::ops::{resolve_index, str_cmp};
use crate::parser::parse_expression;
use crate::value::{DictRef, Funcref, ListRef, Value, format_float, parse_number, str2nr};

enum Body {
	/// Needs only its arguments.
	Pure(fn(Vec<Value>) -> EvalResult<Value>),
	/// Calls back into the interpreter or the host.
	Host(fn(&mut Interpreter, Vec<Value>, &mut Cx<'_>) -> EvalResult<Value>),
}

pub(crate) struct Builtin {
	name: &'static str,
	min: usize,
	max: usize,
	body: Body,
}

impl Builtin {
	const fn pure(name: &'static str, min: usize, max: usize, f: fn(Vec<Value>) -> EvalResult<Value>) -> Self {
		Self { name, min, max, body: Body::Pure(f) }
	}

	const fn host(
		name: &'static str,
		min: usize,
		max: usize,
		f: fn(&mut Interpreter, Vec<Value>, &mut Cx<'_>) -> EvalResult<Value>,
	) -> Self {
		Self { name, min, max, body: Body::Host(f) }
	}

	pub(crate) fn call(&self, interp: &mut Interpreter, args: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
		if args.len() < self.min {
			return Err(EvalErrorKind::NotEnoughArguments(self.name.to_string()).into());
		}
		if args.len() > self.max {
			return Err(EvalErrorKind::TooManyArguments(self.name.to_string()).into());
		}
		match self.body {
			Body::Pure(f) => f(args),
			Body::Host(f) => f(interp, args, cx),
		}
	}
}

static BUILTINS: &[Builtin] = &[
	Builtin::pure("abs", 1, 1, abs),
	Builtin::pure("add", 2, 2, add),
	Builtin::host("call", 2, 3, call),
	Builtin::host("col", 1, 1, col),
	Builtin::pure("copy", 1, 1, |a| Ok(a[0].shallow_copy())),
	Builtin::pure("count", 2, 3, count),
	Builtin::pure("deepcopy", 1, 2, |a| Ok(a[0].deep_copy())),
	Builtin::pure("empty", 1, 1, |a| Ok(Value::bool(a[0].is_empty_value()))),
	Builtin::pure("escape", 2, 2, escape),
	Builtin::host("eval", 1, 1, eval),
	Builtin::host("exists", 1, 1, exists),
	Builtin::pure("extend", 2, 3, extend),
	Builtin::host("filter", 2, 2, filter),
	Builtin::pure("float2nr", 1, 1, float2nr),
	Builtin::host("funcref", 1, 3, function),
	Builtin::host("function", 1, 3, function),
	Builtin::pure("get", 2, 3, get),
	Builtin::host("getline", 1, 2, getline),
	Builtin::host("getreg", 0, 1, getreg),
	Builtin::host("getregtype", 0, 1, getregtype),
	Builtin::pure("has", 1, 1, has),
	Builtin::pure("has_key", 2, 2, has_key),
	Builtin::pure("index", 2, 4, index),
	Builtin::pure("insert", 2, 3, insert),
	Builtin::pure("items", 1, 1, items),
	Builtin::pure("join", 1, 2, join),
	Builtin::pure("keys", 1, 1, keys),
	Builtin::pure("len", 1, 1, len),
	Builtin::host("line", 1, 1, line),
	Builtin::host("map", 2, 2, map),
	Builtin::host("match", 2, 3, |i, a, cx| find(i, a, cx, Found::Start)),
	Builtin::host("matchend", 2, 3, |i, a, cx| find(i, a, cx, Found::End)),
	Builtin::host("matchstr", 2, 3, |i, a, cx| find(i, a, cx, Found::Text)),
	Builtin::pure("max", 1, 1, |a| extreme(&a[0], Ordering::Greater)),
	Builtin::pure("min", 1, 1, |a| extreme(&a[0], Ordering::Less)),
	Builtin::host("mode", 0, 1, |_, _, cx| Ok(Value::String(cx.host.mode()))),
	Builtin::pure("printf", 1, 20, printf),
	Builtin::pure("range", 1, 3, range),
	Builtin::host("reduce", 2, 3, reduce),
	Builtin::pure("remove", 2, 3, remove),
	Builtin::pure("repeat", 2, 2, repeat),
	Builtin::pure("reverse", 1, 1, reverse),
	Builtin::host("setreg", 2, 3, setreg),
	Builtin::host("sort", 1, 2, sort),
	Builtin::pure("split", 1, 3, split),
	Builtin::pure("str2float", 1, 1, str2float),
	Builtin::pure("str2nr", 1, 2, str2nr_builtin),
	Builtin::pure("strchars", 1, 1, |a| Ok(Value::Number(a[0].to_str()?.chars().count() as i64))),
	Builtin::pure("stridx", 2, 3, stridx),
	Builtin::pure("string", 1, 1, |a| Ok(Value::String(a[0].repr()))),
	Builtin::pure("strlen", 1, 1, |a| Ok(Value::Number(a[0].to_str()?.chars().count() as i64))),
	Builtin::pure("strpart", 2, 3, strpart),
	Builtin::host("substitute", 4, 4, substitute),
	Builtin::pure("tolower", 1, 1, |a| Ok(Value::String(a[0].to_str()?.to_lowercase()))),
	Builtin::pure("toupper", 1, 1, |a| Ok(Value::String(a[0].to_str()?.to_uppercase()))),
	Builtin::pure("trim", 1, 3, trim),
	Builtin::pure("type", 1, 1, |a| Ok(Value::Number(a[0].type_code()))),
	Builtin::pure("uniq", 1, 1, uniq),
	Builtin::pure("values", 1, 1, values),
];

pub(crate) fn lookup(name: &str) -> Option<&'static Builtin> {
	BUILTINS.iter().find(|b| b.name == name)
}

fn list_arg(v: &Value) -> EvalResult<ListRef> {
	match v {
		Value::List(l) => Ok(l.clone()),
		_ => Err(EvalErrorKind::ListRequired.into()),
	}
}

fn dict_arg(v: &Value) -> EvalResult<DictRef> {
	match v {
		Value::Dict(d) => Ok(d.clone()),
		_ => Err(EvalErrorKind::DictRequired.into()),
	}
}

fn flag(args: &[Value], i: usize) -> EvalResult<bool> {
	args.get(i).map_or(Ok(false), Value::is_truthy)
}

/// First character of a register-name argument, `"` when absent or empty.
fn register_arg(v: Option<&Value>) -> EvalResult<char> {
	Ok(match v {
		Some(v) => v.to_str()?.chars().next().unwrap_or('"'),
		None => '"',
	})
}

/// Calls a Funcref or a function named by a String.
fn invoke(interp: &mut Interpreter, func: &Value, args: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	match func {
		Value::Funcref(f) => interp.call_funcref(f, args, None, cx),
		Value::String(name) => interp.call_named(name, args, None, cx),
		other => Err(EvalErrorKind::NotCallable(other.repr()).into()),
	}
}

/// Applies the second argument of `map()` and `filter()`: a Funcref gets
/// `(key, val)`, a String is evaluated with `v:key` and `v:val` set.
fn apply(interp: &mut Interpreter, func: &Value, key: Value, val: Value, cx: &mut Cx<'_>) -> EvalResult<Value> {
	match func {
		Value::String(source) => {
			interp.set_vim_var("key", key);
			interp.set_vim_var("val", val);
			let expr = parse_expression(source).map_err(|e| EvalErrorKind::Message(e.to_string()))?;
			interp.eval(&expr, cx)
		}
		other => invoke(interp, other, vec![key, val], cx),
	}
}

fn abs(a: Vec<Value>) -> EvalResult<Value> {
	match &a[0] {
		Value::Float(f) => Ok(Value::Float(f.abs())),
		other => Ok(Value::Number(other.to_number()?.wrapping_abs())),
	}
}

fn add(a: Vec<Value>) -> EvalResult<Value> {
	let list = list_arg(&a[0])?;
	list.borrow_mut().push(a[1].clone());
	Ok(Value::List(list))
}

fn call(interp: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let args = list_arg(&a[1])?.borrow().clone();
	let self_dict = a.get(2).map(dict_arg).transpose()?;
	match &a[0] {
		Value::Funcref(f) => interp.call_funcref(f, args, self_dict, cx),
		other => interp.call_named(&other.to_str()?, args, self_dict, cx),
	}
}

fn col(_: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	Ok(Value::Number(cx.host.col(&a[0].to_str()?)))
}

fn line(_: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	Ok(Value::Number(cx.host.line(&a[0].to_str()?)))
}

fn count(a: Vec<Value>) -> EvalResult<Value> {
	let ic = flag(&a, 2)?;
	let n = match &a[0] {
		Value::List(l) => l.borrow().iter().filter(|v| v.same(&a[1], ic)).count(),
		Value::Dict(d) => d.borrow().values().filter(|v| v.same(&a[1], ic)).count(),
		other => {
			let (text, needle) = (other.to_str()?, a[1].to_str()?);
			if needle.is_empty() {
				0
			} else if ic {
				text.to_lowercase().matches(&needle.to_lowercase()).count()
			} else {
				text.matches(&needle).count()
			}
		}
	};
	Ok(Value::Number(n as i64))
}

fn escape(a: Vec<Value>) -> EvalResult<Value> {
	let chars = a[1].to_str()?;
	let mut out = String::new();
	for c in a[0].to_str()?.chars() {
		if chars.contains(c) {
			out.push('\\');
		}
		out.push(c);
	}
	Ok(Value::String(out))
}

fn eval(interp: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let expr = parse_expression(&a[0].to_str()?).map_err(|e| EvalErrorKind::Message(e.to_string()))?;
	interp.eval(&expr, cx)
}

fn exists(interp: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let name = a[0].to_str()?;
	let found = if let Some(option) = name.strip_prefix('&') {
		cx.host.option(option).is_some()
	} else if let Some(func) = name.strip_prefix('*') {
		interp.has_function(func) || lookup(func).is_some()
	} else if let Some(var) = name.strip_prefix('$') {
		!interp.env_var(var).is_empty()
	} else {
		interp.has_variable(&name, cx.frame.as_ref())
	};
	Ok(Value::bool(found))
}

fn extend(a: Vec<Value>) -> EvalResult<Value> {
	match (&a[0], &a[1]) {
		(Value::List(target), Value::List(source)) => {
			let items = source.borrow().clone();
			let len = target.borrow().len();
			let at = match a.get(2) {
				Some(v) => {
					let i = v.to_number()?;
					let at = if i < 0 { i + len as i64 } else { i };
					usize::try_from(at)
						.ok()
						.filter(|at| *at <= len)
						.ok_or(EvalErrorKind::IndexOutOfRange(i))?
				}
				None => len,
			};
			let mut target = target.borrow_mut();
			let tail = target.split_off(at);
			target.extend(items);
			target.extend(tail);
			drop(target);
			Ok(a[0].clone())
		}
		(Value::Dict(target), Value::Dict(source)) => {
			let mode = match a.get(2) {
				Some(v) => v.to_str()?,
				None => "force".to_string(),
			};
			let entries: Vec<_> = source.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
			let mut target = target.borrow_mut();
			for (key, value) in entries {
				match mode.as_str() {
					"force" => {
						target.insert(key, value);
					}
					"keep" => {
						target.entry(key).or_insert(value);
					}
					"error" if target.contains_key(&key) => return Err(EvalErrorKind::KeyExists(key).into()),
					"error" => {
						target.insert(key, value);
					}
					other => return Err(EvalErrorKind::InvalidArgument(other.to_string()).into()),
				}
			}
			drop(target);
			Ok(a[0].clone())
		}
		_ => Err(EvalErrorKind::ListOrDictRequired("extend()".into()).into()),
	}
}

fn filter(interp: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	match &a[0] {
		Value::List(list) => {
			let items = list.borrow().clone();
			let mut kept = Vec::with_capacity(items.len());
			for (i, item) in items.into_iter().enumerate() {
				if apply(interp, &a[1], Value::Number(i as i64), item.clone(), cx)?.is_truthy()? {
					kept.push(item);
				}
			}
			*list.borrow_mut() = kept;
		}
		Value::Dict(dict) => {
			let entries: Vec<_> = dict.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
			for (key, value) in entries {
				if !apply(interp, &a[1], Value::string(key.as_str()), value, cx)?.is_truthy()? {
					dict.borrow_mut().shift_remove(&key);
				}
			}
		}
		_ => return Err(EvalErrorKind::ListOrDictRequired("filter()".into()).into()),
	}
	Ok(a[0].clone())
}

fn map(interp: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	match &a[0] {
		Value::List(list) => {
			let items = list.borrow().clone();
			let mut mapped = Vec::with_capacity(items.len());
			for (i, item) in items.into_iter().enumerate() {
				mapped.push(apply(interp, &a[1], Value::Number(i as i64), item, cx)?);
			}
			*list.borrow_mut() = mapped;
		}
		Value::Dict(dict) => {
			let entries: Vec<_> = dict.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
			for (key, value) in entries {
				let mapped = apply(interp, &a[1], Value::string(key.as_str()), value, cx)?;
				dict.borrow_mut().insert(key, mapped);
			}
		}
		_ => return Err(EvalErrorKind::ListOrDictRequired("map()".into()).into()),
	}
	Ok(a[0].clone())
}

fn reduce(interp: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let mut items = list_arg(&a[0])?.borrow().clone().into_iter();
	let mut acc = match a.get(2) {
		Some(initial) => initial.clone(),
		None => items
			.next()
			.ok_or_else(|| EvalError::from(EvalErrorKind::InvalidArgument("reduce() of an empty List".into())))?,
	};
	for item in items {
		acc = invoke(interp, &a[1], vec![acc, item], cx)?;
	}
	Ok(acc)
}

fn float2nr(a: Vec<Value>) -> EvalResult<Value> {
	match &a[0] {
		Value::Float(f) => Ok(Value::Number(*f as i64)),
		Value::Number(n) => Ok(Value::Number(*n)),
		_ => Err(EvalErrorKind::InvalidType("float2nr()").into()),
	}
}

/// `function()` and `funcref()`: a reference, optionally binding arguments
/// and a `self` dictionary.
fn function(interp: &mut Interpreter, a: Vec<Value>, _: &mut Cx<'_>) -> EvalResult<Value> {
	let mut funcref = match &a[0] {
		Value::Funcref(f) => (**f).clone(),
		other => {
			let name = other.to_str()?;
			if !interp.has_function(&name) && lookup(&name).is_none() {
				return Err(EvalErrorKind::UnknownFunction(name).into());
			}
			Funcref::named(name)
		}
	};
	for extra in &a[1..] {
		match extra {
			Value::List(args) => funcref.bound_args.extend(args.borrow().iter().cloned()),
			Value::Dict(dict) => funcref.dict = Some(dict.clone()),
			_ => return Err(EvalErrorKind::ListRequired.into()),
		}
	}
	Ok(Value::funcref(funcref))
}

fn get(a: Vec<Value>) -> EvalResult<Value> {
	let default = a.get(2).cloned().unwrap_or(Value::Number(0));
	let found = match &a[0] {
		Value::List(list) => {
			let list = list.borrow();
			resolve_index(a[1].to_number()?, list.len()).and_then(|i| list.get(i).cloned())
		}
		Value::Dict(dict) => dict.borrow().get(&a[1].to_str()?).cloned(),
		Value::Funcref(f) => match a[1].to_str()?.as_str() {
			"name" => Some(Value::string(f.name.as_str())),
			"args" => Some(Value::list(f.bound_args.clone())),
			"dict" => f.dict.clone().map(Value::Dict),
			_ => None,
		},
		_ => return Err(EvalErrorKind::ListOrDictRequired("get()".into()).into()),
	};
	Ok(found.unwrap_or(default))
}

fn line_number(v: &Value, cx: &Cx<'_>) -> EvalResult<i64> {
	match v {
		Value::String(s) if parse_number(s) == 0 => Ok(cx.host.line(s)),
		other => other.to_number(),
	}
}

fn getline(_: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let start = line_number(&a[0], cx)?;
	let text = |n: i64| usize::try_from(n).ok().and_then(|n| cx.host.getline(n));
	match a.get(1) {
		None => Ok(Value::String(text(start).unwrap_or_default())),
		Some(end) => {
			let end = line_number(end, cx)?;
			let lines = (start..=end).map_while(text).map(Value::String).collect();
			Ok(Value::list(lines))
		}
	}
}

fn getreg(_: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let name = register_arg(a.first())?;
	Ok(Value::String(cx.host.register(name).map(|(text, _)| text).unwrap_or_default()))
}

fn getregtype(_: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let name = register_arg(a.first())?;
	let kind = match cx.host.register(name) {
		Some((_, SelectionType::CharacterWise)) => "v",
		Some((_, SelectionType::LineWise)) => "V",
		Some((_, SelectionType::BlockWise)) => "\u{16}",
		None => "",
	};
	Ok(Value::string(kind))
}

fn setreg(_: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let mut name = register_arg(Some(&a[0]))?;
	let options = match a.get(2) {
		Some(v) => v.to_str()?,
		None => String::new(),
	};
	let (mut text, mut kind) = match &a[1] {
		Value::List(lines) => {
			let lines = lines.borrow().iter().map(Value::to_str).collect::<EvalResult<Vec<_>>>()?;
			(lines.join("\n") + "\n", SelectionType::LineWise)
		}
		other => {
			let text = other.to_str()?;
			let kind = if text.ends_with('\n') { SelectionType::LineWise } else { SelectionType::CharacterWise };
			(text, kind)
		}
	};
	for opt in options.chars() {
		match opt {
			'a' => name = name.to_ascii_uppercase(),
			'c' | 'v' => {
				kind = SelectionType::CharacterWise;
				if text.ends_with('\n') {
					text.pop();
				}
			}
			'l' | 'V' => {
				kind = SelectionType::LineWise;
				if !text.ends_with('\n') {
					text.push('\n');
				}
			}
			'b' | '\u{16}' => kind = SelectionType::BlockWise,
			_ => {}
		}
	}
	let ok = cx.host.set_register(name, &text, kind).is_ok();
	Ok(Value::Number(if ok { 0 } else { 1 }))
}

fn has(a: Vec<Value>) -> EvalResult<Value> {
	let feature = a[0].to_str()?;
	Ok(Value::bool(matches!(feature.as_str(), "eval" | "float" | "lambda" | "ide")))
}

fn has_key(a: Vec<Value>) -> EvalResult<Value> {
	let dict = dict_arg(&a[0])?;
	let key = a[1].to_str()?;
	Ok(Value::bool(dict.borrow().contains_key(&key)))
}

fn index(a: Vec<Value>) -> EvalResult<Value> {
	let list = list_arg(&a[0])?;
	let list = list.borrow();
	let start = match a.get(2) {
		Some(v) => resolve_index(v.to_number()?, list.len()).unwrap_or(list.len()),
		None => 0,
	};
	let ic = flag(&a, 3)?;
	let found = list.iter().skip(start).position(|item| item.same(&a[1], ic));
	Ok(Value::Number(found.map_or(-1, |i| (i + start) as i64)))
}

fn insert(a: Vec<Value>) -> EvalResult<Value> {
	let list = list_arg(&a[0])?;
	let len = list.borrow().len();
	let i = match a.get(2) {
		Some(v) => v.to_number()?,
		None => 0,
	};
	let at = if i < 0 { i + len as i64 } else { i };
	let at = usize::try_from(at)
		.ok()
		.filter(|at| *at <= len)
		.ok_or(EvalErrorKind::IndexOutOfRange(i))?;
	list.borrow_mut().insert(at, a[1].clone());
	Ok(Value::List(list))
}

fn items(a: Vec<Value>) -> EvalResult<Value> {
	let dict = dict_arg(&a[0])?;
	let pairs = dict
		.borrow()
		.iter()
		.map(|(k, v)| Value::list(vec![Value::string(k.as_str()), v.clone()]))
		.collect();
	Ok(Value::list(pairs))
}

fn keys(a: Vec<Value>) -> EvalResult<Value> {
	let dict = dict_arg(&a[0])?;
	let keys = dict.borrow().keys().map(|k| Value::string(k.as_str())).collect();
	Ok(Value::list(keys))
}

fn values(a: Vec<Value>) -> EvalResult<Value> {
	let dict = dict_arg(&a[0])?;
	let values = dict.borrow().values().cloned().collect();
	Ok(Value::list(values))
}

fn join(a: Vec<Value>) -> EvalResult<Value> {
	let list = list_arg(&a[0])?;
	let sep = match a.get(1) {
		Some(v) => v.to_str()?,
		None => " ".to_string(),
	};
	let parts: Vec<String> = list.borrow().iter().map(Value::echo_string).collect();
	Ok(Value::String(parts.join(&sep)))
}

/// Lengths count characters, not bytes.
fn len(a: Vec<Value>) -> EvalResult<Value> {
	let n = match &a[0] {
		Value::List(l) => l.borrow().len(),
		Value::Dict(d) => d.borrow().len(),
		Value::String(s) => s.chars().count(),
		Value::Number(n) => n.to_string().len(),
		_ => return Err(EvalErrorKind::InvalidType("len()").into()),
	};
	Ok(Value::Number(n as i64))
}

#[derive(Clone, Copy)]
enum Found {
	Start,
	End,
	Text,
}

/// `match()`, `matchend()` and `matchstr()`. Positions are character
/// indexes; `'ignorecase'` applies.
fn find(_: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>, found: Found) -> EvalResult<Value> {
	let text = a[0].to_str()?;
	let pattern = a[1].to_str()?;
	let skip = match a.get(2) {
		Some(v) => usize::try_from(v.to_number()?).unwrap_or(0),
		None => 0,
	};
	let ignore_case = cx.host.option("ignorecase").is_some_and(|v| !v.is_empty_value());
	let re = compile_pattern(&pattern, ignore_case, false)?;
	let from = text.char_indices().nth(skip).map_or(text.len(), |(i, _)| i);
	let hit = re.find_at(&text, from);
	let chars = |byte: usize| text[..byte].chars().count() as i64;
	Ok(match (found, hit) {
		(Found::Text, Some(m)) => Value::string(m.as_str()),
		(Found::Text, None) => Value::string(""),
		(Found::Start, Some(m)) => Value::Number(chars(m.start())),
		(Found::End, Some(m)) => Value::Number(chars(m.end())),
		(_, None) => Value::Number(-1),
	})
}

fn extreme(v: &Value, want: Ordering) -> EvalResult<Value> {
	let numbers = match v {
		Value::List(l) => l.borrow().iter().map(Value::to_number).collect::<EvalResult<Vec<_>>>()?,
		Value::Dict(d) => d.borrow().values().map(Value::to_number).collect::<EvalResult<Vec<_>>>()?,
		_ => return Err(EvalErrorKind::ListOrDictRequired(if want == Ordering::Greater { "max()" } else { "min()" }.into()).into()),
	};
	let best = numbers.into_iter().reduce(|a, b| if b.cmp(&a) == want { b } else { a });
	Ok(Value::Number(best.unwrap_or(0)))
}

fn range(a: Vec<Value>) -> EvalResult<Value> {
	let nums = a.iter().map(Value::to_number).collect::<EvalResult<Vec<_>>>()?;
	let (start, end, stride) = match nums[..] {
		[n] => (0, n - 1, 1),
		[start, end] => (start, end, 1),
		[start, end, stride, ..] => (start, end, stride),
		[] => unreachable!("arity is checked"),
	};
	if stride == 0 {
		return Err(EvalErrorKind::StrideZero.into());
	}
	if (stride > 0 && end < start.saturating_sub(1)) || (stride < 0 && end > start.saturating_add(1)) {
		return Err(EvalErrorKind::StartPastEnd.into());
	}
	let mut items = Vec::new();
	let mut i = start;
	while (stride > 0 && i <= end) || (stride < 0 && i >= end) {
		items.push(Value::Number(i));
		let Some(next) = i.checked_add(stride) else { break };
		i = next;
	}
	Ok(Value::list(items))
}

fn remove(a: Vec<Value>) -> EvalResult<Value> {
	match &a[0] {
		Value::List(list) => {
			let len = list.borrow().len();
			let i = a[1].to_number()?;
			let start = resolve_index(i, len).ok_or(EvalErrorKind::IndexOutOfRange(i))?;
			let Some(end) = a.get(2) else {
				return Ok(list.borrow_mut().remove(start));
			};
			let j = end.to_number()?;
			let end = resolve_index(j, len).ok_or(EvalErrorKind::IndexOutOfRange(j))?;
			if end < start {
				return Err(EvalErrorKind::InvalidArgument(format!("{j}")).into());
			}
			let removed: Vec<Value> = list.borrow_mut().drain(start..=end).collect();
			Ok(Value::list(removed))
		}
		Value::Dict(dict) => {
			let key = a[1].to_str()?;
			let removed = dict.borrow_mut().shift_remove(&key);
			removed.ok_or_else(|| EvalErrorKind::KeyNotPresent(key).into())
		}
		_ => Err(EvalErrorKind::ListOrDictRequired("remove()".into()).into()),
	}
}

fn repeat(a: Vec<Value>) -> EvalResult<Value> {
	let times = usize::try_from(a[1].to_number()?).unwrap_or(0);
	match &a[0] {
		Value::List(list) => {
			let items = list.borrow();
			Ok(Value::list(items.iter().cloned().cycle().take(items.len() * times).collect()))
		}
		other => Ok(Value::String(other.to_str()?.repeat(times))),
	}
}

fn reverse(a: Vec<Value>) -> EvalResult<Value> {
	let list = list_arg(&a[0])?;
	list.borrow_mut().reverse();
	Ok(Value::List(list))
}

/// `sort()`: by string form by default, `'i'` or 1 folds case, `'n'`
/// compares Numbers, `'N'` and `'f'` convert first, anything else is a
/// comparison function.
fn sort(interp: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let list = list_arg(&a[0])?;
	let mut items = list.borrow().clone();
	let how = a.get(1).cloned().unwrap_or(Value::string(""));
	let mode = match &how {
		Value::Number(1) => Some("i".to_string()),
		Value::Number(0) => Some(String::new()),
		Value::String(s) if s.is_empty() || matches!(s.as_str(), "i" | "n" | "N" | "f") => Some(s.clone()),
		_ => None,
	};
	let mut error = None;
	match mode.as_deref() {
		Some("n") => items.sort_by_key(|v| if let Value::Number(n) = v { *n } else { 0 }),
		Some("N") => items.sort_by_key(|v| v.to_number().unwrap_or(0)),
		Some("f") => items.sort_by(|x, y| {
			let (x, y) = (x.to_float().unwrap_or(0.0), y.to_float().unwrap_or(0.0));
			x.partial_cmp(&y).unwrap_or(Ordering::Equal)
		}),
		Some(mode) => {
			let ic = mode == "i";
			items.sort_by(|x, y| str_cmp(&x.echo_string(), &y.echo_string(), ic));
		}
		None => items.sort_by(|x, y| {
			if error.is_some() {
				return Ordering::Equal;
			}
			match invoke(interp, &how, vec![x.clone(), y.clone()], cx).and_then(|r| r.to_number()) {
				Ok(n) => n.cmp(&0),
				Err(err) => {
					error = Some(err);
					Ordering::Equal
				}
			}
		}),
	}
	if let Some(err) = error {
		return Err(err);
	}
	*list.borrow_mut() = items;
	Ok(Value::List(list))
}

fn uniq(a: Vec<Value>) -> EvalResult<Value> {
	let list = list_arg(&a[0])?;
	let mut items = list.borrow().clone();
	items.dedup_by(|x, y| x.echo_string() == y.echo_string());
	*list.borrow_mut() = items;
	Ok(Value::List(list))
}

/// `split()`: a leading or trailing empty item is dropped unless
/// `keepempty` is set; the default separator is a run of white space.
fn split(a: Vec<Value>) -> EvalResult<Value> {
	let text = a[0].to_str()?;
	let pattern = match a.get(1) {
		Some(v) => v.to_str()?,
		None => String::new(),
	};
	let keep_empty = flag(&a, 2)?;
	let mut parts: Vec<String> = if pattern.is_empty() && a.get(1).is_some() {
		text.chars().map(String::from).collect()
	} else {
		let pattern = if pattern.is_empty() { "\\s\\+" } else { pattern.as_str() };
		let re = compile_pattern(pattern, false, false)?;
		re.split(&text).map(str::to_string).collect()
	};
	if !keep_empty {
		if parts.last().is_some_and(String::is_empty) {
			parts.pop();
		}
		if parts.first().is_some_and(String::is_empty) {
			parts.remove(0);
		}
	}
	Ok(Value::list(parts.into_iter().map(Value::String).collect()))
}

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*[+-]?(?:(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?|inf|nan)").expect("static regex")
});

fn str2float(a: Vec<Value>) -> EvalResult<Value> {
	let text = a[0].to_str()?;
	let f = FLOAT_PREFIX
		.find(&text)
		.and_then(|m| m.as_str().trim_start().parse::<f64>().ok())
		.unwrap_or(0.0);
	Ok(Value::Float(f))
}

fn str2nr_builtin(a: Vec<Value>) -> EvalResult<Value> {
	let text = a[0].to_str()?;
	let base = match a.get(1) {
		Some(v) => v.to_number()?,
		None => 10,
	};
	match base {
		2 | 8 | 10 | 16 => Ok(Value::Number(str2nr(&text, base as u32))),
		_ => Err(EvalErrorKind::InvalidArgument(base.to_string()).into()),
	}
}

fn stridx(a: Vec<Value>) -> EvalResult<Value> {
	let hay = a[0].to_str()?;
	let needle = a[1].to_str()?;
	let skip = match a.get(2) {
		Some(v) => usize::try_from(v.to_number()?).unwrap_or(0),
		None => 0,
	};
	let Some((from, _)) = hay.char_indices().nth(skip).or((skip == hay.chars().count()).then_some((hay.len(), ' '))) else {
		return Ok(Value::Number(-1));
	};
	let found = hay[from..].find(&needle).map(|i| hay[..from + i].chars().count() as i64);
	Ok(Value::Number(found.unwrap_or(-1)))
}

fn strpart(a: Vec<Value>) -> EvalResult<Value> {
	let chars: Vec<char> = a[0].to_str()?.chars().collect();
	let start = a[1].to_number()?;
	let len = match a.get(2) {
		Some(v) => v.to_number()?,
		None => chars.len() as i64,
	};
	let end = start.saturating_add(len).clamp(0, chars.len() as i64) as usize;
	let start = start.clamp(0, chars.len() as i64) as usize;
	Ok(Value::String(chars[start..end.max(start)].iter().collect()))
}

fn substitute(_: &mut Interpreter, a: Vec<Value>, cx: &mut Cx<'_>) -> EvalResult<Value> {
	let text = a[0].to_str()?;
	let pattern = a[1].to_str()?;
	let replacement = expand_replacement(&a[2].to_str()?);
	let global = a[3].to_str()?.contains('g');
	let ignore_case = cx.host.option("ignorecase").is_some_and(|v| !v.is_empty_value());
	let re = compile_pattern(&pattern, ignore_case, false)?;
	let result = if global {
		re.replace_all(&text, replacement.as_str())
	} else {
		re.replacen(&text, 1, replacement.as_str())
	};
	Ok(Value::String(result.into_owned()))
}

fn trim(a: Vec<Value>) -> EvalResult<Value> {
	let text = a[0].to_str()?;
	let mask = match a.get(1) {
		Some(v) => Some(v.to_str()?).filter(|m| !m.is_empty()),
		None => None,
	};
	let dir = match a.get(2) {
		Some(v) => v.to_number()?,
		None => 0,
	};
	let strip = |c: char| match &mask {
		Some(mask) => mask.contains(c),
		None => c.is_whitespace(),
	};
	let out = match dir {
		1 => text.trim_start_matches(strip),
		2 => text.trim_end_matches(strip),
		_ => text.trim_matches(strip),
	};
	Ok(Value::string(out))
}

/// `printf()` with `%s %d %i %x %X %o %b %c %f %e %g %%`, flags `-+0` and
/// width/precision.
fn printf(a: Vec<Value>) -> EvalResult<Value> {
	let fmt = a[0].to_str()?;
	let mut args = a[1..].iter();
	let mut next = || args.next().ok_or(EvalError::from(EvalErrorKind::PrintfArguments));
	let mut out = String::new();
	let mut chars = fmt.chars().peekable();
	while let Some(c) = chars.next() {
		if c != '%' {
			out.push(c);
			continue;
		}
		let mut flags = String::new();
		while let Some(&f) = chars.peek()
			&& "-+0 #".contains(f)
		{
			flags.push(f);
			chars.next();
		}
		let mut width = 0usize;
		while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
			width = width * 10 + d as usize;
			chars.next();
		}
		let mut precision = None;
		if chars.peek() == Some(&'.') {
			chars.next();
			let mut p = 0usize;
			while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
				p = p * 10 + d as usize;
				chars.next();
			}
			precision = Some(p);
		}
		let Some(conv) = chars.next() else {
			out.push('%');
			break;
		};
		let numeric = !matches!(conv, 's' | 'S' | 'c' | '%');
		let body = match conv {
			'%' => "%".to_string(),
			's' | 'S' => {
				let s = next()?.echo_string();
				match precision {
					Some(p) => s.chars().take(p).collect(),
					None => s,
				}
			}
			'd' | 'i' => {
				let n = next()?.to_number()?;
				if flags.contains('+') && n >= 0 { format!("+{n}") } else { n.to_string() }
			}
			'x' => format!("{:x}", next()?.to_number()?),
			'X' => format!("{:X}", next()?.to_number()?),
			'o' => format!("{:o}", next()?.to_number()?),
			'b' | 'B' => format!("{:b}", next()?.to_number()?),
			'c' => u32::try_from(next()?.to_number()?)
				.ok()
				.and_then(char::from_u32)
				.map(String::from)
				.unwrap_or_default(),
			'f' | 'F' => format!("{:.*}", precision.unwrap_or(6), next()?.to_float()?),
			'e' | 'E' => {
				let s = exponent(next()?.to_float()?, precision.unwrap_or(6));
				if conv == 'E' { s.to_uppercase() } else { s }
			}
			'g' | 'G' => {
				let s = format_float(next()?.to_float()?);
				let s = s.strip_suffix(".0").map(str::to_string).unwrap_or(s);
				if conv == 'G' { s.to_uppercase() } else { s }
			}
			other => return Err(EvalErrorKind::InvalidArgument(format!("printf(): %{other}")).into()),
		};
		let pad = width.saturating_sub(body.chars().count());
		if pad == 0 {
			out.push_str(&body);
		} else if flags.contains('-') {
			out.push_str(&body);
			out.extend(std::iter::repeat_n(' ', pad));
		} else if flags.contains('0') && numeric {
			let (sign, digits) = match body.strip_prefix(['-', '+']) {
				Some(rest) => body.split_at(body.len() - rest.len()),
				None => ("", body.as_str()),
			};
			out.push_str(sign);
			out.extend(std::iter::repeat_n('0', pad));
			out.push_str(digits);
		} else {
			out.extend(std::iter::repeat_n(' ', pad));
			out.push_str(&body);
		}
	}
	Ok(Value::String(out))
}

/// C-style `%e`: `1.500000e+00`.
fn exponent(f: f64, precision: usize) -> String {
	let s = format!("{f:.precision$e}");
	match s.split_once('e') {
		Some((mantissa, exp)) => {
			let (sign, digits) = match exp.strip_prefix('-') {
				Some(d) => ('-', d),
				None => ('+', exp),
			};
			format!("{mantissa}e{sign}{digits:0>2}")
		}
		None => s,
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;

	fn s(v: &str) -> Value {
		Value::string(v)
	}

	#[rstest]
	#[case("%d|%5d|%-5d|%05d", vec![Value::Number(7); 4], "7|    7|7    |00007")]
	#[case("%s-%s", vec![s("a"), Value::Number(1)], "a-1")]
	#[case("%x %X %o", vec![Value::Number(255); 3], "ff FF 377")]
	#[case("%.2f", vec![Value::Float(3.14159)], "3.14")]
	#[case("%e", vec![Value::Float(1.5)], "1.500000e+00")]
	#[case("%g", vec![Value::Float(2.0)], "2")]
	#[case("100%%", vec![], "100%")]
	#[case("%+d %05d", vec![Value::Number(3), Value::Number(-42)], "+3 -0042")]
	fn printf_formats(#[case] fmt: &str, #[case] args: Vec<Value>, #[case] expected: &str) {
		let mut all = vec![s(fmt)];
		all.extend(args);
		assert_eq!(printf(all).unwrap(), s(expected));
	}

	#[test]
	fn printf_needs_enough_arguments() {
		assert_eq!(printf(vec![s("%d %d"), Value::Number(1)]).unwrap_err().kind, EvalErrorKind::PrintfArguments);
	}

	#[test]
	fn range_variants() {
		let nums = |v: Value| match v {
			Value::List(l) => l.borrow().iter().map(|v| v.to_number().unwrap()).collect::<Vec<_>>(),
			_ => panic!("not a list"),
		};
		assert_eq!(nums(range(vec![Value::Number(3)]).unwrap()), vec![0, 1, 2]);
		assert_eq!(nums(range(vec![Value::Number(2), Value::Number(4)]).unwrap()), vec![2, 3, 4]);
		assert_eq!(nums(range(vec![Value::Number(5), Value::Number(0), Value::Number(-2)]).unwrap()), vec![5, 3, 1]);
		assert_eq!(nums(range(vec![Value::Number(2), Value::Number(1)]).unwrap()), Vec::<i64>::new());
		assert_eq!(
			range(vec![Value::Number(2), Value::Number(0)]).unwrap_err().kind,
			EvalErrorKind::StartPastEnd
		);
		assert_eq!(
			range(vec![Value::Number(1), Value::Number(2), Value::Number(0)]).unwrap_err().kind,
			EvalErrorKind::StrideZero
		);
	}

	#[test]
	fn split_drops_outer_empty_items() {
		let parts = |v: Value| v.repr();
		assert_eq!(parts(split(vec![s("  a b  c ")]).unwrap()), "['a', 'b', 'c']");
		assert_eq!(parts(split(vec![s("a,,b"), s(",")]).unwrap()), "['a', '', 'b']");
		assert_eq!(parts(split(vec![s(",a,"), s(","), Value::Number(1)]).unwrap()), "['', 'a', '']");
		assert_eq!(parts(split(vec![s("abc"), s("")]).unwrap()), "['a', 'b', 'c']");
	}

	#[test]
	fn string_helpers() {
		assert_eq!(strpart(vec![s("abcdef"), Value::Number(2), Value::Number(3)]).unwrap(), s("cde"));
		assert_eq!(strpart(vec![s("abc"), Value::Number(-1), Value::Number(2)]).unwrap(), s("a"));
		assert_eq!(stridx(vec![s("an apple"), s("a"), Value::Number(1)]).unwrap(), Value::Number(3));
		assert_eq!(stridx(vec![s("abc"), s("z")]).unwrap(), Value::Number(-1));
		assert_eq!(escape(vec![s("a.b"), s(".")]).unwrap(), s("a\\.b"));
		assert_eq!(trim(vec![s("  x  ")]).unwrap(), s("x"));
		assert_eq!(trim(vec![s("xxaxx"), s("x"), Value::Number(1)]).unwrap(), s("axx"));
		assert_eq!(str2float(vec![s("1.5e2abc")]).unwrap(), Value::Float(150.0));
		assert_eq!(str2nr_builtin(vec![s("0x1f"), Value::Number(16)]).unwrap(), Value::Number(31));
		assert_eq!(len(vec![s("héllo")]).unwrap(), Value::Number(5));
	}

	#[test]
	fn list_helpers() {
		let l = Value::list(vec![Value::Number(3), Value::Number(1), Value::Number(2)]);
		assert_eq!(index(vec![l.clone(), Value::Number(1)]).unwrap(), Value::Number(1));
		assert_eq!(index(vec![l.clone(), s("1")]).unwrap(), Value::Number(-1));
		assert_eq!(extreme(&l, Ordering::Greater).unwrap(), Value::Number(3));
		assert_eq!(extreme(&l, Ordering::Less).unwrap(), Value::Number(1));
		insert(vec![l.clone(), Value::Number(9), Value::Number(-1)]).unwrap();
		assert_eq!(l.repr(), "[3, 1, 9, 2]");
		assert_eq!(remove(vec![l.clone(), Value::Number(0)]).unwrap(), Value::Number(3));
		assert_eq!(remove(vec![l.clone(), Value::Number(0), Value::Number(1)]).unwrap().repr(), "[1, 9]");
		assert_eq!(l.repr(), "[2]");
		assert_eq!(repeat(vec![s("ab"), Value::Number(3)]).unwrap(), s("ababab"));
	}
}
