use thiserror::Error;
use viper_primitives::PatternError;
use viper_registers::RegisterError;
use viper_script::ScriptError;

use crate::options::OptionsError;

/// Failures of editing commands.
///
/// None of them leave a command half applied: the buffer, registers and
/// carets are untouched when an error is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
	/// The motion or text object has no target; the pending command is dropped.
	#[error("motion has no target")]
	MotionUnresolved,
	#[error("E354: Invalid register name: '{0}'")]
	InvalidRegister(char),
	#[error("E354: Register '{0}' is read-only")]
	ReadOnlyRegister(char),
	#[error("E353: Nothing in register {0}")]
	EmptyRegister(char),
	#[error(transparent)]
	Register(RegisterError),
	#[error(transparent)]
	Script(#[from] ScriptError),
	#[error(transparent)]
	Options(#[from] OptionsError),
	#[error(transparent)]
	Pattern(#[from] PatternError),
	#[error("E486: Pattern not found: {0}")]
	PatternNotFound(String),
	#[error("E16: Invalid range")]
	InvalidRange,
	/// The host does not provide the requested feature.
	#[error("E319: Sorry, the command is not available in this version: {0}")]
	Unsupported(String),
	/// A nested `@` or `:normal` went deeper than the recursion limit.
	#[error("E169: Command too recursive")]
	TooRecursive,
}

impl From<RegisterError> for EditorError {
	fn from(err: RegisterError) -> Self {
		match err {
			RegisterError::InvalidName(name) => Self::InvalidRegister(name),
			RegisterError::ReadOnly(name) => Self::ReadOnlyRegister(name),
			other => Self::Register(other),
		}
	}
}

impl EditorError {
	/// Returns true for errors Vim reports with a bell rather than a message.
	pub fn is_silent(&self) -> bool {
		matches!(self, Self::MotionUnresolved | Self::InvalidRegister(_) | Self::ReadOnlyRegister(_))
	}
}

pub type EditorResult<T> = Result<T, EditorError>;
