//! Vim script: values, expressions, statements and ex-command parsing.
//!
//! [`parse_command`] turns a command line into statements; editor commands
//! come out as [`Stmt::Ex`] for a [`ScriptHost`] to run. An [`Interpreter`]
//! holds variables and functions between runs.

/// Syntax trees.
pub mod ast;
mod builtins;
mod command;
mod error;
mod eval;
/// Editor command parsing: ranges, names and arguments.
pub mod ex;
mod lexer;
mod ops;
mod parser;
mod scope;
/// Values and conversions.
pub mod value;

pub use ast::{Expr, Stmt};
pub use command::{parse_command, parse_script};
pub use error::{EvalError, EvalErrorKind, EvalResult, ParseError, ScriptError};
pub use eval::{Interpreter, MAX_CALL_DEPTH, MemoryHost, MessageKind, ScriptHost};
pub use ex::{
	Address, AddressBase, ExCommand, ExKind, HostCommand, LineRange, SetArg, SetOp, SubstituteFlags, parse_range,
};
pub use parser::parse_expression;
pub use value::{DictRef, Funcref, ListRef, Special, Value};

/// Evaluates an expression with a fresh interpreter and no editor.
pub fn evaluate(source: &str) -> Result<Value, ScriptError> {
	Interpreter::new().evaluate(source, &mut MemoryHost::default())
}
