//! Editor ex-commands: ranges and the commands that act on the buffer.
//!
//! These parse here and run in the engine; the script evaluator hands them
//! to its host untouched.

use crate::error::ParseError;

/// Line address base. Line numbers are 1-based as typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressBase {
	Current,
	Last,
	Line(usize),
	Mark(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
	pub base: AddressBase,
	pub offset: i64,
}

impl Address {
	pub const fn new(base: AddressBase, offset: i64) -> Self {
		Self { base, offset }
	}

	pub const CURRENT: Self = Self::new(AddressBase::Current, 0);
}

/// `a,b`, a single address, or `%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
	pub start: Address,
	pub end: Option<Address>,
}

impl LineRange {
	pub const fn whole_buffer() -> Self {
		Self {
			start: Address::new(AddressBase::Line(1), 0),
			end: Some(Address::new(AddressBase::Last, 0)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExCommand {
	pub range: Option<LineRange>,
	pub kind: ExKind,
}

/// Operations `:set` performs on one option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetArg {
	/// `opt`: switch a boolean on, or show any other option.
	Bare(String),
	/// `opt?`.
	Query(String),
	/// `noopt`.
	Disable(String),
	/// `opt!`, `invopt`.
	Toggle(String),
	/// `opt&`.
	Reset(String),
	/// `opt=val`, `opt+=val`, `opt-=val`, `opt^=val`.
	Assign { name: String, op: SetOp, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
	Assign,
	Add,
	Subtract,
	Prepend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubstituteFlags {
	pub global: bool,
	/// `i` forces ignoring case, `I` forces matching; unset follows options.
	pub ignore_case: Option<bool>,
	/// `e`: no error when the pattern is not found.
	pub quiet: bool,
}

/// Commands the host editor implements (windows, files, exit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
	Quit { all: bool, force: bool },
	Write { file: Option<String>, force: bool },
	WriteQuit { force: bool },
	Exit { force: bool },
	Split { vertical: bool, file: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExKind {
	/// A bare range: jump to its last line.
	Goto,
	Delete {
		register: Option<char>,
		count: Option<usize>,
	},
	Yank {
		register: Option<char>,
		count: Option<usize>,
	},
	Put {
		register: Option<char>,
		above: bool,
	},
	/// `>`/`<`, repeated for larger shifts.
	Shift {
		right: bool,
		amount: usize,
		count: Option<usize>,
	},
	Join {
		spaces: bool,
		count: Option<usize>,
	},
	Normal {
		keys: String,
		noremap: bool,
	},
	/// An empty pattern reuses the last search pattern.
	Substitute {
		pattern: String,
		replacement: String,
		flags: SubstituteFlags,
		count: Option<usize>,
	},
	Set(Vec<SetArg>),
	Registers(Option<String>),
	Marks(Option<String>),
	NoHlsearch,
	Undo,
	Redo,
	Host(HostCommand),
}

/// Parses an optional leading range. Returns it with the rest of the text.
pub fn parse_range(text: &str) -> Result<(Option<LineRange>, &str), ParseError> {
	let text = text.trim_start();
	if let Some(rest) = text.strip_prefix('%') {
		return Ok((Some(LineRange::whole_buffer()), rest));
	}
	let (start, rest) = parse_address(text)?;
	let Some(start) = start else {
		return Ok((None, text));
	};
	let rest = rest.trim_start();
	if let Some(after) = rest.strip_prefix([',', ';']) {
		let (end, rest) = parse_address(after.trim_start())?;
		return Ok((
			Some(LineRange {
				start,
				end: Some(end.unwrap_or(Address::CURRENT)),
			}),
			rest,
		));
	}
	Ok((Some(LineRange { start, end: None }), rest))
}

fn parse_address(text: &str) -> Result<(Option<Address>, &str), ParseError> {
	let mut chars = text.char_indices().peekable();
	let (base, mut rest) = match chars.peek().map(|&(_, c)| c) {
		Some('.') => (Some(AddressBase::Current), &text[1..]),
		Some('$') => (Some(AddressBase::Last), &text[1..]),
		Some('\'') => {
			let mark = text[1..].chars().next().ok_or(ParseError::InvalidRange)?;
			(Some(AddressBase::Mark(mark)), &text[1 + mark.len_utf8()..])
		}
		Some(c) if c.is_ascii_digit() => {
			let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
			let n = text[..end].parse::<usize>().map_err(|_| ParseError::InvalidRange)?;
			(Some(AddressBase::Line(n)), &text[end..])
		}
		_ => (None, text),
	};

	let mut offset = 0i64;
	let mut has_offset = false;
	loop {
		let trimmed = rest.trim_start();
		let sign = match trimmed.chars().next() {
			Some('+') => 1,
			Some('-') => -1,
			_ => break,
		};
		let after = &trimmed[1..];
		let end = after.find(|c: char| !c.is_ascii_digit()).unwrap_or(after.len());
		let n = if end == 0 { 1 } else { after[..end].parse::<i64>().map_err(|_| ParseError::InvalidRange)? };
		offset += sign * n;
		has_offset = true;
		rest = &after[end..];
	}

	match base {
		Some(base) => Ok((Some(Address::new(base, offset)), rest)),
		None if has_offset => Ok((Some(Address::new(AddressBase::Current, offset)), rest)),
		None => Ok((None, text)),
	}
}

/// Splits `[x] [count]` arguments of `:d` and `:y`.
fn register_and_count(args: &str) -> Result<(Option<char>, Option<usize>), ParseError> {
	let args = args.trim();
	let mut chars = args.chars();
	let (register, rest) = match chars.next() {
		Some(c) if !c.is_ascii_digit() => (Some(c), chars.as_str().trim()),
		_ => (None, args),
	};
	Ok((register, parse_count(rest)?))
}

fn parse_count(text: &str) -> Result<Option<usize>, ParseError> {
	let text = text.trim();
	if text.is_empty() {
		return Ok(None);
	}
	match text.parse::<usize>() {
		Ok(0) => Err(ParseError::InvalidArgument(text.to_string())),
		Ok(n) => Ok(Some(n)),
		Err(_) => Err(ParseError::TrailingCharacters(text.to_string())),
	}
}

fn optional(text: &str) -> Option<String> {
	let text = text.trim();
	(!text.is_empty()).then(|| text.to_string())
}

/// Editor command names and the shortest accepted abbreviation.
pub(crate) const EX_COMMANDS: &[(&str, usize)] = &[
	("delete", 1),
	("display", 2),
	("exit", 3),
	("join", 1),
	("marks", 5),
	("nohlsearch", 3),
	("normal", 4),
	("put", 2),
	("qall", 2),
	("quit", 1),
	("quitall", 5),
	("redo", 3),
	("registers", 3),
	("set", 2),
	("split", 2),
	("substitute", 1),
	("undo", 1),
	("vsplit", 2),
	("wq", 2),
	("write", 1),
	("xit", 1),
	("yank", 1),
];

/// Builds an editor command from its full name and arguments.
pub(crate) fn parse_ex(range: Option<LineRange>, name: &str, bang: bool, args: &str) -> Result<ExCommand, ParseError> {
	let kind = match name {
		">" | "<" => {
			let right = name == ">";
			let extra = args.chars().take_while(|&c| c == if right { '>' } else { '<' }).count();
			ExKind::Shift {
				right,
				amount: 1 + extra,
				count: parse_count(&args[extra..])?,
			}
		}
		"delete" => {
			let (register, count) = register_and_count(args)?;
			ExKind::Delete { register, count }
		}
		"yank" => {
			let (register, count) = register_and_count(args)?;
			ExKind::Yank { register, count }
		}
		"put" => ExKind::Put {
			register: args.trim().chars().next(),
			above: bang,
		},
		"join" => ExKind::Join {
			spaces: !bang,
			count: parse_count(args)?,
		},
		"normal" => {
			if args.trim().is_empty() {
				return Err(ParseError::ArgumentRequired);
			}
			ExKind::Normal {
				keys: args.strip_prefix(' ').unwrap_or(args).to_string(),
				noremap: bang,
			}
		}
		"substitute" => parse_substitute(args)?,
		"set" => ExKind::Set(args.split_whitespace().map(parse_set_arg).collect()),
		"registers" | "display" => ExKind::Registers(optional(args)),
		"marks" => ExKind::Marks(optional(args)),
		"nohlsearch" => ExKind::NoHlsearch,
		"undo" => ExKind::Undo,
		"redo" => ExKind::Redo,
		"quit" => ExKind::Host(HostCommand::Quit { all: false, force: bang }),
		"qall" | "quitall" => ExKind::Host(HostCommand::Quit { all: true, force: bang }),
		"write" => ExKind::Host(HostCommand::Write {
			file: optional(args),
			force: bang,
		}),
		"wq" => ExKind::Host(HostCommand::WriteQuit { force: bang }),
		"xit" | "exit" => ExKind::Host(HostCommand::Exit { force: bang }),
		"split" => ExKind::Host(HostCommand::Split {
			vertical: false,
			file: optional(args),
		}),
		"vsplit" => ExKind::Host(HostCommand::Split {
			vertical: true,
			file: optional(args),
		}),
		_ => return Err(ParseError::NotACommand(name.to_string())),
	};
	Ok(ExCommand { range, kind })
}

/// `/pat/rep/flags count` with any non-alphanumeric delimiter.
fn parse_substitute(args: &str) -> Result<ExKind, ParseError> {
	let mut chars = args.chars();
	let Some(delim) = chars.next().filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !"\"|\\".contains(*c)) else {
		if args.trim().is_empty() {
			return Ok(ExKind::Substitute {
				pattern: String::new(),
				replacement: "~".to_string(),
				flags: SubstituteFlags::default(),
				count: None,
			});
		}
		return Err(ParseError::InvalidArgument(args.to_string()));
	};
	let rest = chars.as_str();
	let (pattern, rest) = split_delimited(rest, delim);
	let (replacement, rest) = match rest {
		Some(rest) => split_delimited(rest, delim),
		None => (String::new(), None),
	};
	let rest = rest.unwrap_or("");
	let flag_end = rest.find(|c: char| !"gciIen&".contains(c)).unwrap_or(rest.len());
	let mut flags = SubstituteFlags::default();
	for c in rest[..flag_end].chars() {
		match c {
			'g' => flags.global = !flags.global,
			'i' => flags.ignore_case = Some(true),
			'I' => flags.ignore_case = Some(false),
			'e' => flags.quiet = true,
			_ => {}
		}
	}
	Ok(ExKind::Substitute {
		pattern,
		replacement,
		flags,
		count: parse_count(&rest[flag_end..])?,
	})
}

/// Text up to an unescaped `delim`, and what follows it. `\delim` loses its
/// backslash; other escapes are kept for the pattern compiler.
fn split_delimited(text: &str, delim: char) -> (String, Option<&str>) {
	let mut out = String::new();
	let mut chars = text.char_indices();
	while let Some((i, c)) = chars.next() {
		if c == '\\' {
			match chars.next() {
				Some((_, d)) if d == delim => out.push(d),
				Some((_, d)) => {
					out.push('\\');
					out.push(d);
				}
				None => out.push('\\'),
			}
		} else if c == delim {
			return (out, Some(&text[i + c.len_utf8()..]));
		} else {
			out.push(c);
		}
	}
	(out, None)
}

fn parse_set_arg(arg: &str) -> SetArg {
	for (op_text, op) in [("+=", SetOp::Add), ("-=", SetOp::Subtract), ("^=", SetOp::Prepend)] {
		if let Some((name, value)) = arg.split_once(op_text) {
			return SetArg::Assign {
				name: name.to_string(),
				op,
				value: value.to_string(),
			};
		}
	}
	if let Some(at) = arg.find(['=', ':']) {
		return SetArg::Assign {
			name: arg[..at].to_string(),
			op: SetOp::Assign,
			value: arg[at + 1..].to_string(),
		};
	}
	if let Some(name) = arg.strip_suffix('?') {
		return SetArg::Query(name.to_string());
	}
	if let Some(name) = arg.strip_suffix('!') {
		return SetArg::Toggle(name.to_string());
	}
	if let Some(name) = arg.strip_suffix('&') {
		return SetArg::Reset(name.to_string());
	}
	if let Some(name) = arg.strip_prefix("inv") {
		return SetArg::Toggle(name.to_string());
	}
	if let Some(name) = arg.strip_prefix("no") {
		return SetArg::Disable(name.to_string());
	}
	SetArg::Bare(arg.to_string())
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn ranges() {
		let (range, rest) = parse_range("%s/a/b/").unwrap();
		assert_eq!(range, Some(LineRange::whole_buffer()));
		assert_eq!(rest, "s/a/b/");

		let (range, rest) = parse_range(".,.+2d").unwrap();
		assert_eq!(
			range,
			Some(LineRange {
				start: Address::CURRENT,
				end: Some(Address::new(AddressBase::Current, 2)),
			})
		);
		assert_eq!(rest, "d");

		let (range, rest) = parse_range("'a,$-1y").unwrap();
		assert_eq!(
			range.map(|r| (r.start.base, r.end)),
			Some((AddressBase::Mark('a'), Some(Address::new(AddressBase::Last, -1))))
		);
		assert_eq!(rest, "y");

		assert_eq!(parse_range("echo 1").unwrap(), (None, "echo 1"));
		assert_eq!(parse_range("+3").unwrap().0.map(|r| r.start), Some(Address::new(AddressBase::Current, 3)));
	}

	#[test]
	fn delete_with_register_and_count() {
		let cmd = parse_ex(None, "delete", false, " a 3").unwrap();
		assert_eq!(cmd.kind, ExKind::Delete {
			register: Some('a'),
			count: Some(3)
		});
		let cmd = parse_ex(None, "yank", false, " 2").unwrap();
		assert_eq!(cmd.kind, ExKind::Yank { register: None, count: Some(2) });
	}

	#[test]
	fn repeated_shift() {
		let cmd = parse_ex(None, ">", false, ">> 2").unwrap();
		assert_eq!(cmd.kind, ExKind::Shift {
			right: true,
			amount: 3,
			count: Some(2)
		});
	}

	#[test]
	fn substitute_parts() {
		let cmd = parse_ex(None, "substitute", false, r"#a\#b#x/y#gi 2").unwrap();
		assert_eq!(cmd.kind, ExKind::Substitute {
			pattern: "a#b".into(),
			replacement: "x/y".into(),
			flags: SubstituteFlags {
				global: true,
				ignore_case: Some(true),
				quiet: false
			},
			count: Some(2),
		});
		let cmd = parse_ex(None, "substitute", false, r"/\(a\)/\1").unwrap();
		assert!(matches!(cmd.kind, ExKind::Substitute { ref pattern, ref replacement, .. } if pattern == r"\(a\)" && replacement == r"\1"));
	}

	#[test]
	fn set_arguments() {
		let cmd = parse_ex(None, "set", false, " sw=2 noet list! ic? ts& path+=x").unwrap();
		assert_eq!(cmd.kind, ExKind::Set(vec![
			SetArg::Assign {
				name: "sw".into(),
				op: SetOp::Assign,
				value: "2".into()
			},
			SetArg::Disable("et".into()),
			SetArg::Toggle("list".into()),
			SetArg::Query("ic".into()),
			SetArg::Reset("ts".into()),
			SetArg::Assign {
				name: "path".into(),
				op: SetOp::Add,
				value: "x".into()
			},
		]));
	}

	#[test]
	fn host_commands() {
		assert_eq!(
			parse_ex(None, "quit", true, "").unwrap().kind,
			ExKind::Host(HostCommand::Quit { all: false, force: true })
		);
		assert_eq!(
			parse_ex(None, "vsplit", false, " other.txt").unwrap().kind,
			ExKind::Host(HostCommand::Split {
				vertical: true,
				file: Some("other.txt".into())
			})
		);
	}
}
