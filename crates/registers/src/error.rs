use thiserror::Error;

/// Errors from register and mark access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
	#[error("E354: Invalid register name: '{0}'")]
	InvalidName(char),
	#[error("E354: Register '{0}' is read-only")]
	ReadOnly(char),
	#[error("E353: Nothing in register {0}")]
	Empty(char),
	#[error("E191: Argument must be a letter or forward/backward quote: {0}")]
	InvalidMark(char),
	#[error("E20: Mark not set: {0}")]
	MarkNotSet(char),
}
