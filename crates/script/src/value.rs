//! Script values.
//!
//! Lists and dictionaries are shared by reference like Vim's: assigning a
//! list to a second variable and mutating it through either name changes
//! both. Numbers are 64-bit and wrap on overflow.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::LambdaDef;
use crate::error::{EvalErrorKind, EvalResult};
use crate::scope::Frame;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type DictRef = Rc<RefCell<IndexMap<String, Value>>>;

/// `v:true`, `v:false`, `v:null` and `v:none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
	False,
	True,
	Null,
	None,
}

impl Special {
	pub fn name(self) -> &'static str {
		match self {
			Self::False => "v:false",
			Self::True => "v:true",
			Self::Null => "v:null",
			Self::None => "v:none",
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Number(i64),
	Float(f64),
	String(String),
	List(ListRef),
	Dict(DictRef),
	Funcref(Rc<Funcref>),
	Special(Special),
}

/// What a funcref calls.
#[derive(Clone)]
pub enum FuncTarget {
	/// A builtin or user function, looked up by name at call time.
	Named,
	Lambda {
		def: Rc<LambdaDef>,
		closure: Option<Rc<Frame>>,
	},
}

/// A function reference, possibly with bound arguments (a partial) and a
/// bound `self` dictionary.
#[derive(Clone)]
pub struct Funcref {
	pub name: String,
	pub target: FuncTarget,
	pub bound_args: Vec<Value>,
	pub dict: Option<DictRef>,
}

impl Funcref {
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			target: FuncTarget::Named,
			bound_args: Vec::new(),
			dict: None,
		}
	}
}

impl fmt::Debug for Funcref {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Funcref")
			.field("name", &self.name)
			.field("bound_args", &self.bound_args)
			.finish_non_exhaustive()
	}
}

impl PartialEq for Funcref {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name && self.bound_args == other.bound_args
	}
}

/// Type numbers returned by `type()`.
pub mod type_code {
	pub const NUMBER: i64 = 0;
	pub const STRING: i64 = 1;
	pub const FUNCREF: i64 = 2;
	pub const LIST: i64 = 3;
	pub const DICT: i64 = 4;
	pub const FLOAT: i64 = 5;
	pub const BOOL: i64 = 6;
	pub const NONE: i64 = 7;
}

impl Value {
	pub const TRUE: Self = Self::Number(1);
	pub const FALSE: Self = Self::Number(0);

	pub fn string(s: impl Into<String>) -> Self {
		Self::String(s.into())
	}

	pub fn list(items: Vec<Value>) -> Self {
		Self::List(Rc::new(RefCell::new(items)))
	}

	pub fn dict(entries: IndexMap<String, Value>) -> Self {
		Self::Dict(Rc::new(RefCell::new(entries)))
	}

	pub fn bool(b: bool) -> Self {
		if b { Self::TRUE } else { Self::FALSE }
	}

	pub fn funcref(f: Funcref) -> Self {
		Self::Funcref(Rc::new(f))
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Number(_) => "Number",
			Self::Float(_) => "Float",
			Self::String(_) => "String",
			Self::List(_) => "List",
			Self::Dict(_) => "Dictionary",
			Self::Funcref(_) => "Funcref",
			Self::Special(Special::True | Special::False) => "Boolean",
			Self::Special(_) => "Special",
		}
	}

	pub fn type_code(&self) -> i64 {
		match self {
			Self::Number(_) => type_code::NUMBER,
			Self::String(_) => type_code::STRING,
			Self::Funcref(_) => type_code::FUNCREF,
			Self::List(_) => type_code::LIST,
			Self::Dict(_) => type_code::DICT,
			Self::Float(_) => type_code::FLOAT,
			Self::Special(Special::True | Special::False) => type_code::BOOL,
			Self::Special(_) => type_code::NONE,
		}
	}

	/// Number coercion: strings are read like `str2nr()` with automatic
	/// base detection, non-numeric text is 0.
	pub fn to_number(&self) -> EvalResult<i64> {
		match self {
			Self::Number(n) => Ok(*n),
			Self::String(s) => Ok(parse_number(s)),
			Self::Special(Special::True) => Ok(1),
			Self::Special(_) => Ok(0),
			Self::Float(_) => Err(EvalErrorKind::FloatAsNumber.into()),
			Self::List(_) => Err(EvalErrorKind::ListAsNumber.into()),
			Self::Dict(_) => Err(EvalErrorKind::DictAsNumber.into()),
			Self::Funcref(_) => Err(EvalErrorKind::FuncrefAsNumber.into()),
		}
	}

	pub fn to_float(&self) -> EvalResult<f64> {
		match self {
			Self::Float(f) => Ok(*f),
			other => other.to_number().map(|n| n as f64),
		}
	}

	/// String coercion, as `.` and most builtins apply it.
	pub fn to_str(&self) -> EvalResult<String> {
		match self {
			Self::String(s) => Ok(s.clone()),
			Self::Number(n) => Ok(n.to_string()),
			Self::Special(s) => Ok(s.name().to_string()),
			Self::Float(_) => Err(EvalErrorKind::FloatAsString.into()),
			Self::List(_) => Err(EvalErrorKind::ListAsString.into()),
			Self::Dict(_) => Err(EvalErrorKind::DictAsString.into()),
			Self::Funcref(_) => Err(EvalErrorKind::FuncrefAsString.into()),
		}
	}

	/// Condition value for `if`, `while`, `&&`, `||`, `!` and `?:`.
	///
	/// Strings go through number coercion, so `"abc"` is false and `"1x"`
	/// true. Lists and dictionaries are true when non-empty.
	pub fn is_truthy(&self) -> EvalResult<bool> {
		match self {
			Self::Float(f) => Ok(*f != 0.0),
			Self::List(l) => Ok(!l.borrow().is_empty()),
			Self::Dict(d) => Ok(!d.borrow().is_empty()),
			Self::Funcref(_) => Ok(true),
			other => other.to_number().map(|n| n != 0),
		}
	}

	/// Falsy in the sense of `??` and `empty()`.
	pub fn is_empty_value(&self) -> bool {
		match self {
			Self::Number(n) => *n == 0,
			Self::Float(f) => *f == 0.0,
			Self::String(s) => s.is_empty(),
			Self::List(l) => l.borrow().is_empty(),
			Self::Dict(d) => d.borrow().is_empty(),
			Self::Funcref(_) => false,
			Self::Special(s) => *s != Special::True,
		}
	}

	/// How `:echo` shows the value: strings unquoted at the top level.
	pub fn echo_string(&self) -> String {
		match self {
			Self::String(s) => s.clone(),
			other => other.repr(),
		}
	}

	/// `string()` form: strings single-quoted, containers recursive.
	pub fn repr(&self) -> String {
		let mut out = String::new();
		self.write_repr(&mut out, 0);
		out
	}

	fn write_repr(&self, out: &mut String, depth: usize) {
		match self {
			Self::Number(n) => out.push_str(&n.to_string()),
			Self::Float(f) => out.push_str(&format_float(*f)),
			Self::String(s) => {
				out.push('\'');
				out.push_str(&s.replace('\'', "''"));
				out.push('\'');
			}
			Self::Special(s) => out.push_str(s.name()),
			Self::Funcref(f) => {
				out.push_str("function('");
				out.push_str(&f.name);
				out.push_str("')");
			}
			Self::List(_) | Self::Dict(_) if depth > 100 => out.push_str("[...]"),
			Self::List(list) => {
				out.push('[');
				for (i, item) in list.borrow().iter().enumerate() {
					if i > 0 {
						out.push_str(", ");
					}
					item.write_repr(out, depth + 1);
				}
				out.push(']');
			}
			Self::Dict(dict) => {
				out.push('{');
				for (i, (key, item)) in dict.borrow().iter().enumerate() {
					if i > 0 {
						out.push_str(", ");
					}
					out.push('\'');
					out.push_str(&key.replace('\'', "''"));
					out.push_str("': ");
					item.write_repr(out, depth + 1);
				}
				out.push('}');
			}
		}
	}

	/// `copy()`: a new top-level container sharing its items.
	pub fn shallow_copy(&self) -> Self {
		match self {
			Self::List(l) => Self::list(l.borrow().clone()),
			Self::Dict(d) => Self::dict(d.borrow().clone()),
			other => other.clone(),
		}
	}

	/// `deepcopy()`.
	pub fn deep_copy(&self) -> Self {
		match self {
			Self::List(l) => Self::list(l.borrow().iter().map(Value::deep_copy).collect()),
			Self::Dict(d) => Self::dict(d.borrow().iter().map(|(k, v)| (k.clone(), v.deep_copy())).collect()),
			other => other.clone(),
		}
	}
}

impl From<i64> for Value {
	fn from(n: i64) -> Self {
		Self::Number(n)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::String(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::String(s)
	}
}

impl From<f64> for Value {
	fn from(f: f64) -> Self {
		Self::Float(f)
	}
}

/// Reads a number the way Vim converts a String: optional sign, `0x`, `0b`
/// and `0o`/leading-zero octal prefixes, stopping at the first character
/// that does not belong. Out-of-range values saturate.
pub fn parse_number(text: &str) -> i64 {
	let s = text.trim_start();
	let (negative, s) = match s.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, s.strip_prefix('+').unwrap_or(s)),
	};
	let bytes = s.as_bytes();
	let (radix, digits) = if bytes.len() > 2 && bytes[0] == b'0' && matches!(bytes[1], b'x' | b'X') && bytes[2].is_ascii_hexdigit() {
		(16, &s[2..])
	} else if bytes.len() > 2 && bytes[0] == b'0' && matches!(bytes[1], b'b' | b'B') && matches!(bytes[2], b'0' | b'1') {
		(2, &s[2..])
	} else if bytes.len() > 2 && bytes[0] == b'0' && matches!(bytes[1], b'o' | b'O') && (b'0'..=b'7').contains(&bytes[2]) {
		(8, &s[2..])
	} else if bytes.len() > 1 && bytes[0] == b'0' && bytes.iter().take_while(|b| b.is_ascii_digit()).all(|b| *b < b'8') {
		(8, s)
	} else {
		(10, s)
	};
	let magnitude = digits_value(digits, radix);
	if negative { magnitude.saturating_neg() } else { magnitude }
}

/// `str2nr()` with an explicit base; prefixes matching the base are skipped.
pub fn str2nr(text: &str, radix: u32) -> i64 {
	let s = text.trim_start();
	let (negative, s) = match s.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, s.strip_prefix('+').unwrap_or(s)),
	};
	let lower = s.to_ascii_lowercase();
	let digits = match radix {
		16 if lower.starts_with("0x") => &s[2..],
		2 if lower.starts_with("0b") => &s[2..],
		8 if lower.starts_with("0o") => &s[2..],
		_ => s,
	};
	let magnitude = digits_value(digits, radix);
	if negative { magnitude.saturating_neg() } else { magnitude }
}

fn digits_value(digits: &str, radix: u32) -> i64 {
	let mut value: i64 = 0;
	for c in digits.chars() {
		let Some(d) = c.to_digit(radix) else { break };
		value = value.saturating_mul(i64::from(radix)).saturating_add(i64::from(d));
	}
	value
}

/// Formats a Float like Vim's `%g` with six significant digits, always
/// keeping a fractional part: `1.0`, `0.333333`, `1.0e20`.
pub fn format_float(f: f64) -> String {
	if f.is_nan() {
		return "nan".to_string();
	}
	if f.is_infinite() {
		return if f > 0.0 { "inf" } else { "-inf" }.to_string();
	}
	if f == 0.0 {
		return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
	}
	let exp = f.abs().log10().floor() as i32;
	if !(-4..6).contains(&exp) {
		let mantissa = f / 10f64.powi(exp);
		let mut m = trim_fraction(format!("{mantissa:.5}"));
		let mut exp = exp;
		if m.trim_start_matches('-').starts_with("10") {
			m = trim_fraction(format!("{:.5}", mantissa / 10.0));
			exp += 1;
		}
		return format!("{m}e{exp}");
	}
	let decimals = (5 - exp).max(0) as usize;
	trim_fraction(format!("{f:.decimals$}"))
}

fn trim_fraction(s: String) -> String {
	if !s.contains('.') {
		return s + ".0";
	}
	let trimmed = s.trim_end_matches('0');
	if trimmed.ends_with('.') {
		format!("{trimmed}0")
	} else {
		trimmed.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn string_to_number_follows_prefixes() {
		assert_eq!(parse_number("42abc"), 42);
		assert_eq!(parse_number("0x1F"), 31);
		assert_eq!(parse_number("017"), 15);
		assert_eq!(parse_number("019"), 19);
		assert_eq!(parse_number("0b101"), 5);
		assert_eq!(parse_number("-12"), -12);
		assert_eq!(parse_number("abc"), 0);
		assert_eq!(parse_number("99999999999999999999"), i64::MAX);
	}

	#[test]
	fn truthiness() {
		assert!(!Value::string("abc").is_truthy().unwrap());
		assert!(Value::string("1x").is_truthy().unwrap());
		assert!(Value::list(vec![Value::FALSE]).is_truthy().unwrap());
		assert!(!Value::list(Vec::new()).is_truthy().unwrap());
		assert!(!Value::Special(Special::Null).is_truthy().unwrap());
	}

	#[test]
	fn float_formatting() {
		assert_eq!(format_float(1.0), "1.0");
		assert_eq!(format_float(1.5), "1.5");
		assert_eq!(format_float(1.0 / 3.0), "0.333333");
		assert_eq!(format_float(1e20), "1.0e20");
		assert_eq!(format_float(-2.5e-7), "-2.5e-7");
		assert_eq!(format_float(123456.0), "123456.0");
	}

	#[test]
	fn repr_quotes_nested_strings() {
		let v = Value::list(vec![Value::string("it's"), Value::Number(2), Value::list(Vec::new())]);
		assert_eq!(v.repr(), "['it''s', 2, []]");
		assert_eq!(Value::string("top").echo_string(), "top");
	}

	#[test]
	fn coercion_errors_name_the_type() {
		assert_eq!(Value::list(Vec::new()).to_number().unwrap_err().kind, EvalErrorKind::ListAsNumber);
		assert_eq!(Value::Float(1.0).to_str().unwrap_err().kind, EvalErrorKind::FloatAsString);
	}
}
