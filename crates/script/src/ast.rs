//! Syntax trees for expressions and statements.

use std::rc::Rc;

use crate::ex::ExCommand;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	Number(i64),
	Float(f64),
	String(String),
	List(Vec<Expr>),
	/// Dictionary literal; keys are evaluated to strings.
	Dict(Vec<(Expr, Expr)>),
	Lambda(Rc<LambdaDef>),
	/// A variable or function name, scope prefix included (`g:x`, `a:0`).
	Var(String),
	/// `&name`, `&l:name`.
	Option(String),
	/// `@r`.
	Register(char),
	/// `$NAME`.
	Env(String),
	Unary(UnaryOp, Box<Expr>),
	Binary(BinaryOp, Box<Expr>, Box<Expr>),
	Compare {
		op: CompareOp,
		case: CaseMode,
		lhs: Box<Expr>,
		rhs: Box<Expr>,
	},
	And(Box<Expr>, Box<Expr>),
	Or(Box<Expr>, Box<Expr>),
	Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
	/// `a ?? b`.
	Falsy(Box<Expr>, Box<Expr>),
	Index(Box<Expr>, Box<Expr>),
	Slice {
		base: Box<Expr>,
		from: Option<Box<Expr>>,
		to: Option<Box<Expr>>,
	},
	/// `dict.key`, written without blanks around the dot.
	Member(Box<Expr>, String),
	Call {
		callee: Box<Expr>,
		args: Vec<Expr>,
	},
	/// `base->name(args)`.
	Method {
		base: Box<Expr>,
		name: String,
		args: Vec<Expr>,
	},
}

/// `{a, b -> expr}`.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaDef {
	pub params: Vec<String>,
	pub varargs: bool,
	pub body: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Not,
	Neg,
	Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	/// `.` and `..`.
	Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
	Equal,
	NotEqual,
	Greater,
	GreaterEqual,
	Less,
	LessEqual,
	Match,
	NoMatch,
	Is,
	IsNot,
}

/// The `#` / `?` suffix of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
	/// No suffix: follow `'ignorecase'`.
	#[default]
	Option,
	/// `#`.
	Match,
	/// `?`.
	Ignore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
	Let {
		target: LetTarget,
		op: LetOp,
		value: Expr,
	},
	/// `let [a, b; rest] = list`.
	LetUnpack {
		targets: Vec<LetTarget>,
		rest: Option<LetTarget>,
		op: LetOp,
		value: Expr,
	},
	Unlet {
		targets: Vec<LetTarget>,
		force: bool,
	},
	Echo {
		kind: EchoKind,
		args: Vec<Expr>,
	},
	If {
		branches: Vec<(Expr, Vec<Stmt>)>,
		otherwise: Vec<Stmt>,
	},
	While {
		cond: Expr,
		body: Vec<Stmt>,
	},
	For {
		target: ForTarget,
		iterable: Expr,
		body: Vec<Stmt>,
	},
	Break,
	Continue,
	Function(Rc<FunctionDef>),
	Return(Option<Expr>),
	Call(Expr),
	Execute(Vec<Expr>),
	/// An editor command for the host.
	Ex(ExCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LetTarget {
	Var(String),
	Option(String),
	Register(char),
	Env(String),
	Index(Expr, Expr),
	Member(Expr, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetOp {
	Assign,
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Concat,
}

impl LetOp {
	pub(crate) fn binary(self) -> Option<BinaryOp> {
		match self {
			Self::Assign => None,
			Self::Add => Some(BinaryOp::Add),
			Self::Sub => Some(BinaryOp::Sub),
			Self::Mul => Some(BinaryOp::Mul),
			Self::Div => Some(BinaryOp::Div),
			Self::Rem => Some(BinaryOp::Rem),
			Self::Concat => Some(BinaryOp::Concat),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForTarget {
	Name(String),
	Unpack(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoKind {
	Echo,
	Msg,
	Err,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionFlags {
	pub abort: bool,
	pub range: bool,
	pub dict: bool,
	pub closure: bool,
}

/// `function[!] Name(params) flags` ... `endfunction`.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
	pub name: String,
	pub params: Vec<String>,
	pub varargs: bool,
	pub flags: FunctionFlags,
	pub replace: bool,
	pub body: Vec<Stmt>,
}
