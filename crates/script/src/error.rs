use thiserror::Error;

/// Malformed script or command-line syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
	#[error("E15: Invalid expression: \"{0}\"")]
	InvalidExpression(String),
	#[error("E114: Missing double quote: {0}")]
	MissingQuote(String),
	#[error("E115: Missing single quote: {0}")]
	MissingSingleQuote(String),
	#[error("E110: Missing ')'")]
	MissingParen,
	#[error("E697: Missing end of List ']': {0}")]
	MissingListEnd(String),
	#[error("E723: Missing end of Dictionary '}}': {0}")]
	MissingDictEnd(String),
	#[error("E720: Missing colon in Dictionary: {0}")]
	MissingColon(String),
	#[error("E116: Invalid arguments for function {0}")]
	InvalidArguments(String),
	#[error("E488: Trailing characters: {0}")]
	TrailingCharacters(String),
	#[error("E492: Not an editor command: {0}")]
	NotACommand(String),
	#[error("E16: Invalid range")]
	InvalidRange,
	#[error("E475: Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("E471: Argument required")]
	ArgumentRequired,
	#[error("E171: Missing :endif")]
	MissingEndif,
	#[error("E170: Missing :endwhile")]
	MissingEndwhile,
	#[error("E170: Missing :endfor")]
	MissingEndfor,
	#[error("E126: Missing :endfunction")]
	MissingEndfunction,
	#[error("E580: :endif without :if")]
	EndifWithoutIf,
	#[error("E581: :else without :if")]
	ElseWithoutIf,
	#[error("E588: :endwhile without :while")]
	EndwhileWithoutWhile,
	#[error("E588: :endfor without :for")]
	EndforWithoutFor,
	#[error("E193: :endfunction not inside a function")]
	EndfunctionWithoutFunction,
	#[error("E587: :break without :while or :for")]
	BreakOutsideLoop,
	#[error("E586: :continue without :while or :for")]
	ContinueOutsideLoop,
	#[error("E133: :return not inside a function")]
	ReturnOutsideFunction,
	#[error("E128: Function name must start with a capital or \"s:\": {0}")]
	InvalidFunctionName(String),
}

/// What went wrong while evaluating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalErrorKind {
	#[error("E719: Cannot slice a Dictionary")]
	CannotSliceDictionary,
	#[error("E1030: Using a String as a Number: \"{0}\"")]
	InvalidSliceBound(String),
	#[error("E121: Undefined variable: {0}")]
	UndefinedVariable(String),
	#[error("E108: No such variable: \"{0}\"")]
	NoSuchVariable(String),
	#[error("E117: Unknown function: {0}")]
	UnknownFunction(String),
	#[error("E118: Too many arguments for function: {0}")]
	TooManyArguments(String),
	#[error("E119: Not enough arguments for function: {0}")]
	NotEnoughArguments(String),
	#[error("E1085: Not a callable type: {0}")]
	NotCallable(String),
	#[error("E745: Using a List as a Number")]
	ListAsNumber,
	#[error("E728: Using a Dictionary as a Number")]
	DictAsNumber,
	#[error("E703: Using a Funcref as a Number")]
	FuncrefAsNumber,
	#[error("E805: Using a Float as a Number")]
	FloatAsNumber,
	#[error("E730: Using List as a String")]
	ListAsString,
	#[error("E731: Using Dictionary as a String")]
	DictAsString,
	#[error("E729: Using Funcref as a String")]
	FuncrefAsString,
	#[error("E806: Using Float as a String")]
	FloatAsString,
	#[error("E684: List index out of range: {0}")]
	IndexOutOfRange(i64),
	#[error("E716: Key not present in Dictionary: \"{0}\"")]
	KeyNotPresent(String),
	#[error("E689: Index not allowed after a {0}")]
	CannotIndex(&'static str),
	#[error("E691: Can only compare List with List")]
	CompareList,
	#[error("E735: Can only compare Dictionary with Dictionary")]
	CompareDict,
	#[error("E692: Invalid operation for List")]
	InvalidListOperation,
	#[error("E736: Invalid operation for Dictionary")]
	InvalidDictOperation,
	#[error("E694: Invalid operation for Funcrefs")]
	InvalidFuncrefOperation,
	#[error("E804: Cannot use '%' with Float")]
	FloatModulo,
	#[error("E113: Unknown option: {0}")]
	UnknownOption(String),
	#[error("E46: Cannot change read-only variable \"{0}\"")]
	ReadOnlyVariable(String),
	#[error("E475: Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("E714: List required")]
	ListRequired,
	#[error("E715: Dictionary required")]
	DictRequired,
	#[error("E701: Invalid type for {0}")]
	InvalidType(&'static str),
	#[error("E737: Key already exists: {0}")]
	KeyExists(String),
	#[error("E766: Insufficient arguments for printf()")]
	PrintfArguments,
	#[error("E712: Argument of {0} must be a List or Dictionary")]
	ListOrDictRequired(String),
	#[error("E726: Stride is zero")]
	StrideZero,
	#[error("E727: Start past end")]
	StartPastEnd,
	#[error("E687: Less targets than List items")]
	TooFewTargets,
	#[error("E688: More targets than List items")]
	TooManyTargets,
	#[error("E122: Function {0} already exists, add ! to replace it")]
	FunctionExists(String),
	#[error("E132: Function call depth is higher than 'maxfuncdepth'")]
	CallDepth,
	#[error("{0}")]
	Pattern(String),
	/// `:echoerr` text, or an editor command failure reported by the host.
	#[error("{0}")]
	Message(String),
}

/// A runtime scripting fault. Aborts the current statement.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct EvalError {
	pub kind: EvalErrorKind,
}

impl EvalError {
	pub fn new(kind: EvalErrorKind) -> Self {
		Self { kind }
	}
}

impl From<EvalErrorKind> for EvalError {
	fn from(kind: EvalErrorKind) -> Self {
		Self::new(kind)
	}
}

impl From<viper_primitives::PatternError> for EvalError {
	fn from(err: viper_primitives::PatternError) -> Self {
		Self::new(EvalErrorKind::Pattern(err.to_string()))
	}
}

/// Either half of running script text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
	#[error(transparent)]
	Parse(#[from] ParseError),
	#[error(transparent)]
	Eval(#[from] EvalError),
}

impl From<EvalErrorKind> for ScriptError {
	fn from(kind: EvalErrorKind) -> Self {
		Self::Eval(EvalError::new(kind))
	}
}

pub type EvalResult<T> = Result<T, EvalError>;
