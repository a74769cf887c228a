//! Variable scopes of a running function or lambda.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::{DictRef, Value};

pub(crate) fn new_dict() -> DictRef {
	Rc::new(RefCell::new(IndexMap::new()))
}

/// One call's `l:` and `a:` scopes.
///
/// Lambdas keep the frame they were created in as `parent`, so their bodies
/// see the enclosing function's variables.
#[derive(Debug)]
pub struct Frame {
	pub(crate) locals: DictRef,
	pub(crate) args: DictRef,
	pub(crate) parent: Option<Rc<Frame>>,
	pub(crate) self_dict: Option<DictRef>,
	/// Lambda frames expose their parameters without the `a:` prefix and fall
	/// back to globals for unscoped names.
	pub(crate) is_lambda: bool,
}

impl Frame {
	pub(crate) fn new(parent: Option<Rc<Frame>>, is_lambda: bool) -> Self {
		Self {
			locals: new_dict(),
			args: new_dict(),
			parent,
			self_dict: None,
			is_lambda,
		}
	}

	/// Looks an unscoped name up in this frame and its parents.
	pub(crate) fn lookup(&self, name: &str) -> Option<Value> {
		if let Some(v) = self.locals.borrow().get(name) {
			return Some(v.clone());
		}
		if self.is_lambda
			&& let Some(v) = self.args.borrow().get(name)
		{
			return Some(v.clone());
		}
		if name == "self"
			&& let Some(d) = &self.self_dict
		{
			return Some(Value::Dict(d.clone()));
		}
		self.parent.as_ref().and_then(|p| p.lookup(name))
	}

	pub(crate) fn lookup_arg(&self, name: &str) -> Option<Value> {
		if let Some(v) = self.args.borrow().get(name) {
			return Some(v.clone());
		}
		self.parent.as_ref().and_then(|p| p.lookup_arg(name))
	}

	/// The dictionary holding an existing unscoped variable, for assignment.
	pub(crate) fn owner_of(&self, name: &str) -> Option<DictRef> {
		if self.locals.borrow().contains_key(name) {
			return Some(self.locals.clone());
		}
		self.parent.as_ref().and_then(|p| p.owner_of(name))
	}

	/// Whether unscoped names fall back to `g:`.
	pub(crate) fn sees_globals(&self) -> bool {
		self.is_lambda && self.parent.as_ref().is_none_or(|p| p.sees_globals())
	}
}
