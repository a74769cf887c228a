//! Operators on values.

use std::cmp::Ordering;
use std::rc::Rc;

use viper_primitives::compile_pattern;

use crate::ast::{BinaryOp, CompareOp};
use crate::error::{EvalError, EvalErrorKind, EvalResult};
use crate::value::{Value, format_float};

/// Vim's results for Number division by zero.
fn divide_by_zero(lhs: i64) -> i64 {
	match lhs.cmp(&0) {
		Ordering::Greater => i64::MAX,
		Ordering::Less => -i64::MAX,
		Ordering::Equal => i64::MIN,
	}
}

fn either_float(lhs: &Value, rhs: &Value) -> bool {
	matches!(lhs, Value::Float(_)) || matches!(rhs, Value::Float(_))
}

impl Value {
	pub fn binary(&self, op: BinaryOp, rhs: &Value) -> EvalResult<Value> {
		match op {
			BinaryOp::Add => self.add(rhs),
			BinaryOp::Sub => self.arith(rhs, i64::wrapping_sub, |a, b| a - b),
			BinaryOp::Mul => self.arith(rhs, i64::wrapping_mul, |a, b| a * b),
			BinaryOp::Div => self.div(rhs),
			BinaryOp::Rem => self.rem(rhs),
			BinaryOp::Concat => self.concat(rhs),
		}
	}

	/// `+`: numeric addition, or a new List joining two Lists.
	pub fn add(&self, rhs: &Value) -> EvalResult<Value> {
		if let (Value::List(a), Value::List(b)) = (self, rhs) {
			let mut items = a.borrow().clone();
			items.extend(b.borrow().iter().cloned());
			return Ok(Value::list(items));
		}
		self.arith(rhs, i64::wrapping_add, |a, b| a + b)
	}

	fn arith(&self, rhs: &Value, int: fn(i64, i64) -> i64, float: fn(f64, f64) -> f64) -> EvalResult<Value> {
		if either_float(self, rhs) {
			return Ok(Value::Float(float(self.to_float()?, rhs.to_float()?)));
		}
		Ok(Value::Number(int(self.to_number()?, rhs.to_number()?)))
	}

	pub fn div(&self, rhs: &Value) -> EvalResult<Value> {
		if either_float(self, rhs) {
			return Ok(Value::Float(self.to_float()? / rhs.to_float()?));
		}
		let (a, b) = (self.to_number()?, rhs.to_number()?);
		Ok(Value::Number(if b == 0 { divide_by_zero(a) } else { a.wrapping_div(b) }))
	}

	pub fn rem(&self, rhs: &Value) -> EvalResult<Value> {
		if either_float(self, rhs) {
			return Err(EvalErrorKind::FloatModulo.into());
		}
		let (a, b) = (self.to_number()?, rhs.to_number()?);
		Ok(Value::Number(if b == 0 { 0 } else { a.wrapping_rem(b) }))
	}

	/// `.` and `..`.
	pub fn concat(&self, rhs: &Value) -> EvalResult<Value> {
		let text = |v: &Value| match v {
			Value::Float(f) => Ok(format_float(*f)),
			other => other.to_str(),
		};
		Ok(Value::String(text(self)? + &text(rhs)?))
	}

	/// Applies a comparison. `ignore_case` is already resolved from the
	/// operator suffix and `'ignorecase'`.
	pub fn compare(&self, op: CompareOp, rhs: &Value, ignore_case: bool) -> EvalResult<bool> {
		match op {
			CompareOp::Equal => self.loose_eq(rhs, ignore_case),
			CompareOp::NotEqual => self.loose_eq(rhs, ignore_case).map(|eq| !eq),
			CompareOp::Is => Ok(self.same(rhs, ignore_case)),
			CompareOp::IsNot => Ok(!self.same(rhs, ignore_case)),
			CompareOp::Match | CompareOp::NoMatch => {
				let pattern = rhs.to_str()?;
				let text = self.to_str()?;
				let found = pattern.is_empty() || compile_pattern(&pattern, ignore_case, false)?.is_match(&text);
				Ok(found == (op == CompareOp::Match))
			}
			CompareOp::Greater => Ok(self.order(rhs, ignore_case)? == Ordering::Greater),
			CompareOp::GreaterEqual => Ok(self.order(rhs, ignore_case)? != Ordering::Less),
			CompareOp::Less => Ok(self.order(rhs, ignore_case)? == Ordering::Less),
			CompareOp::LessEqual => Ok(self.order(rhs, ignore_case)? != Ordering::Greater),
		}
	}

	/// `==`. Lists and Dictionaries are equal only when they are the same
	/// container; a String compared with a Number is read as a Number.
	pub fn loose_eq(&self, rhs: &Value, ignore_case: bool) -> EvalResult<bool> {
		match (self, rhs) {
			(Value::List(a), Value::List(b)) => Ok(Rc::ptr_eq(a, b)),
			(Value::Dict(a), Value::Dict(b)) => Ok(Rc::ptr_eq(a, b)),
			(Value::List(_), _) | (_, Value::List(_)) => Err(EvalErrorKind::CompareList.into()),
			(Value::Dict(_), _) | (_, Value::Dict(_)) => Err(EvalErrorKind::CompareDict.into()),
			(Value::Funcref(a), Value::Funcref(b)) => Ok(Rc::ptr_eq(a, b) || a == b),
			(Value::Funcref(_), _) | (_, Value::Funcref(_)) => Ok(false),
			(Value::String(a), Value::String(b)) => Ok(str_cmp(a, b, ignore_case) == Ordering::Equal),
			(Value::Special(a), Value::Special(b)) => Ok(a == b),
			_ if either_float(self, rhs) => Ok(self.to_float()? == rhs.to_float()?),
			_ => Ok(self.to_number()? == rhs.to_number()?),
		}
	}

	/// `is`: identity for containers and funcrefs, same type and value
	/// otherwise.
	pub fn same(&self, rhs: &Value, ignore_case: bool) -> bool {
		match (self, rhs) {
			(Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
			(Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
			(Value::Funcref(a), Value::Funcref(b)) => Rc::ptr_eq(a, b) || a == b,
			(Value::String(a), Value::String(b)) => str_cmp(a, b, ignore_case) == Ordering::Equal,
			(a, b) => a.type_code() == b.type_code() && a == b,
		}
	}

	fn order(&self, rhs: &Value, ignore_case: bool) -> EvalResult<Ordering> {
		match (self, rhs) {
			(Value::List(_), _) | (_, Value::List(_)) => Err(EvalErrorKind::InvalidListOperation.into()),
			(Value::Dict(_), _) | (_, Value::Dict(_)) => Err(EvalErrorKind::InvalidDictOperation.into()),
			(Value::Funcref(_), _) | (_, Value::Funcref(_)) => Err(EvalErrorKind::InvalidFuncrefOperation.into()),
			(Value::String(a), Value::String(b)) => Ok(str_cmp(a, b, ignore_case)),
			_ if either_float(self, rhs) => {
				let (a, b) = (self.to_float()?, rhs.to_float()?);
				Ok(a.partial_cmp(&b).unwrap_or(Ordering::Less))
			}
			_ => Ok(self.to_number()?.cmp(&rhs.to_number()?)),
		}
	}
}

impl Value {
	/// `expr[idx]`. Strings index by character; a negative or out-of-range
	/// String index gives `""`.
	pub fn index(&self, idx: &Value) -> EvalResult<Value> {
		match self {
			Value::List(list) => {
				let i = idx.to_number()?;
				let list = list.borrow();
				resolve_index(i, list.len())
					.and_then(|j| list.get(j).cloned())
					.ok_or_else(|| EvalError::from(EvalErrorKind::IndexOutOfRange(i)))
			}
			Value::Dict(dict) => {
				let key = idx.to_str()?;
				let found = dict.borrow().get(&key).cloned();
				found.ok_or_else(|| EvalErrorKind::KeyNotPresent(key).into())
			}
			Value::Float(_) | Value::Funcref(_) | Value::Special(_) => Err(EvalErrorKind::CannotIndex(self.type_name()).into()),
			Value::Number(_) | Value::String(_) => {
				let i = idx.to_number()?;
				let text = self.to_str()?;
				let c = usize::try_from(i).ok().and_then(|i| text.chars().nth(i));
				Ok(Value::String(c.map(String::from).unwrap_or_default()))
			}
		}
	}

	/// `expr[from : to]`, both ends inclusive. Negative bounds count from the
	/// end. On a List, equal bounds select the single item itself rather than
	/// a one-item List.
	pub fn slice(&self, from: Option<&Value>, to: Option<&Value>) -> EvalResult<Value> {
		let len = match self {
			Value::Dict(_) => return Err(EvalErrorKind::CannotSliceDictionary.into()),
			Value::List(list) => list.borrow().len(),
			other => other.to_str()?.chars().count(),
		} as i64;
		let bound = |v: Option<&Value>, default: i64| -> EvalResult<i64> {
			let n = match v {
				Some(v) => slice_bound(v)?,
				None => default,
			};
			Ok(if n < 0 { n + len } else { n })
		};
		let from = bound(from, 0)?;
		let to = bound(to, len - 1)?;
		let span = |from: i64, to: i64| from.max(0) as usize..(to + 1).clamp(0, len) as usize;

		if let Value::List(list) = self {
			let list = list.borrow();
			return if from > len || from > to {
				Ok(Value::list(Vec::new()))
			} else if from == to {
				usize::try_from(from)
					.ok()
					.and_then(|i| list.get(i).cloned())
					.ok_or_else(|| EvalErrorKind::IndexOutOfRange(from).into())
			} else {
				let range = span(from, to);
				Ok(Value::list(list.get(range).map(<[Value]>::to_vec).unwrap_or_default()))
			};
		}
		if from > len || from > to {
			return Ok(Value::string(""));
		}
		let range = span(from, to);
		let text: String = self.to_str()?.chars().skip(range.start).take(range.len()).collect();
		Ok(Value::String(text))
	}
}

/// A slice bound is read from its String form and must be a plain integer.
fn slice_bound(v: &Value) -> EvalResult<i64> {
	let text = v.to_str()?;
	text.parse().map_err(|_| EvalErrorKind::InvalidSliceBound(text).into())
}

/// Maps a possibly negative index onto `0..len`.
pub(crate) fn resolve_index(i: i64, len: usize) -> Option<usize> {
	let j = if i < 0 { i + len as i64 } else { i };
	usize::try_from(j).ok().filter(|j| *j < len)
}

pub(crate) fn str_cmp(a: &str, b: &str, ignore_case: bool) -> Ordering {
	if ignore_case {
		a.to_lowercase().cmp(&b.to_lowercase())
	} else {
		a.cmp(b)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn division_by_zero_sentinels() {
		let zero = Value::Number(0);
		assert_eq!(Value::Number(5).div(&zero).unwrap(), Value::Number(0x7fff_ffff_ffff_ffff));
		assert_eq!(Value::Number(-5).div(&zero).unwrap(), Value::Number(-0x7fff_ffff_ffff_ffff));
		assert_eq!(zero.div(&zero).unwrap(), Value::Number(i64::MIN));
		assert_eq!(Value::Number(7).rem(&zero).unwrap(), Value::Number(0));
		assert_eq!(Value::Float(1.0).div(&Value::Float(0.0)).unwrap(), Value::Float(f64::INFINITY));
	}

	#[test]
	fn mixed_arithmetic() {
		assert_eq!(Value::string("3").add(&Value::Number(4)).unwrap(), Value::Number(7));
		assert_eq!(Value::Number(1).add(&Value::Float(0.5)).unwrap(), Value::Float(1.5));
		assert_eq!(Value::Number(7).div(&Value::Number(2)).unwrap(), Value::Number(3));
		assert_eq!(Value::Float(1.0).rem(&Value::Number(2)).unwrap_err().kind, EvalErrorKind::FloatModulo);
		assert_eq!(Value::list(vec![]).add(&Value::Number(1)).unwrap_err().kind, EvalErrorKind::ListAsNumber);
	}

	#[test]
	fn list_plus_makes_a_new_list() {
		let a = Value::list(vec![Value::Number(1)]);
		let b = Value::list(vec![Value::Number(2)]);
		let c = a.add(&b).unwrap();
		assert_eq!(c, Value::list(vec![Value::Number(1), Value::Number(2)]));
		assert!(!c.same(&a, false));
	}

	#[test]
	fn equality_rules() {
		assert!(Value::string("10").loose_eq(&Value::Number(10), false).unwrap());
		assert!(Value::string("ABC").loose_eq(&Value::string("abc"), true).unwrap());
		assert!(!Value::string("ABC").loose_eq(&Value::string("abc"), false).unwrap());
		let l = Value::list(vec![]);
		assert!(l.loose_eq(&l.clone(), false).unwrap());
		assert!(!l.loose_eq(&Value::list(vec![]), false).unwrap());
		assert_eq!(l.loose_eq(&Value::Number(0), false).unwrap_err().kind, EvalErrorKind::CompareList);
		assert!(!Value::string("1").same(&Value::Number(1), false));
	}

	#[test]
	fn pattern_match() {
		assert!(Value::string("foobar").compare(CompareOp::Match, &Value::string("o\\+b"), false).unwrap());
		assert!(Value::string("FOO").compare(CompareOp::NoMatch, &Value::string("foo"), false).unwrap());
	}

	fn nums(ns: &[i64]) -> Value {
		Value::list(ns.iter().copied().map(Value::Number).collect())
	}

	#[test]
	fn list_slices() {
		let l = nums(&[1, 2, 3, 4]);
		assert_eq!(l.slice(Some(&Value::Number(1)), Some(&Value::Number(2))).unwrap(), nums(&[2, 3]));
		assert_eq!(l.slice(Some(&Value::Number(-2)), None).unwrap(), nums(&[3, 4]));
		assert_eq!(l.slice(Some(&Value::Number(1)), Some(&Value::Number(1))).unwrap(), Value::Number(2));
		assert_eq!(l.slice(Some(&Value::Number(3)), Some(&Value::Number(1))).unwrap(), nums(&[]));
		assert_eq!(l.slice(Some(&Value::Number(9)), None).unwrap(), nums(&[]));
		assert_eq!(l.slice(Some(&Value::Number(2)), Some(&Value::Number(99))).unwrap(), nums(&[3, 4]));
	}

	#[test]
	fn string_slices_and_indexes() {
		let s = Value::string("hello");
		assert_eq!(s.slice(Some(&Value::Number(1)), Some(&Value::Number(3))).unwrap(), Value::string("ell"));
		assert_eq!(s.slice(Some(&Value::Number(2)), Some(&Value::Number(2))).unwrap(), Value::string("l"));
		assert_eq!(s.slice(None, Some(&Value::Number(40))).unwrap(), Value::string("hello"));
		assert_eq!(s.slice(Some(&Value::Number(6)), None).unwrap(), Value::string(""));
		assert_eq!(s.index(&Value::Number(1)).unwrap(), Value::string("e"));
		assert_eq!(s.index(&Value::Number(-1)).unwrap(), Value::string(""));
		assert_eq!(Value::Number(123).index(&Value::Number(0)).unwrap(), Value::string("1"));
	}

	#[test]
	fn slicing_errors() {
		let d = Value::dict(Default::default());
		assert_eq!(d.slice(None, None).unwrap_err().kind, EvalErrorKind::CannotSliceDictionary);
		let l = nums(&[1]);
		assert_eq!(
			l.slice(Some(&Value::string("x")), None).unwrap_err().kind,
			EvalErrorKind::InvalidSliceBound("x".into())
		);
		assert_eq!(l.index(&Value::Number(3)).unwrap_err().kind, EvalErrorKind::IndexOutOfRange(3));
		assert_eq!(l.index(&Value::Number(-1)).unwrap(), Value::Number(1));
	}

	#[test]
	fn ordering_of_containers_fails() {
		let l = Value::list(vec![]);
		assert_eq!(
			l.compare(CompareOp::Less, &l, false).unwrap_err().kind,
			EvalErrorKind::InvalidListOperation
		);
	}
}
