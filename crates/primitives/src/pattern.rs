//! Vim "magic" search patterns.
//!
//! Patterns are rewritten into `regex` syntax: `\(`, `\)`, `\|`, `\+`, `\=`,
//! `\{n,m}` and `\<`/`\>` become groups, alternation, quantifiers and word
//! boundaries, while a bare `(`, `|` or `+` is a literal. `\c` and `\C` force
//! case folding on or off anywhere in the pattern.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Errors from [`compile_pattern`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
	/// The translated pattern was rejected by the regex engine.
	#[error("E486: Invalid pattern: {pattern}")]
	Invalid {
		pattern: String,
		#[source]
		source: regex::Error,
	},
	/// An empty pattern with no previous pattern to fall back to.
	#[error("E35: No previous regular expression")]
	Empty,
}

/// Compiles a Vim pattern.
///
/// `ignore_case` and `smart_case` mirror the options of the same name: with
/// both set, a pattern containing an uppercase letter matches case.
pub fn compile_pattern(pattern: &str, ignore_case: bool, smart_case: bool) -> Result<Regex, PatternError> {
	if pattern.is_empty() {
		return Err(PatternError::Empty);
	}
	let translated = translate(pattern);
	let fold = match translated.case {
		Some(forced) => forced,
		None => ignore_case && !(smart_case && translated.has_upper),
	};
	RegexBuilder::new(&translated.source)
		.case_insensitive(fold)
		.multi_line(true)
		.build()
		.map_err(|source| PatternError::Invalid {
			pattern: pattern.to_string(),
			source,
		})
}

struct Translated {
	source: String,
	case: Option<bool>,
	has_upper: bool,
}

fn translate(pattern: &str) -> Translated {
	let mut out = String::with_capacity(pattern.len() + 8);
	let mut case = None;
	let mut has_upper = false;
	let mut chars = pattern.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				let Some(next) = chars.next() else {
					out.push_str("\\\\");
					break;
				};
				match next {
					'<' | '>' => out.push_str("\\b"),
					'(' => out.push('('),
					')' => out.push(')'),
					'|' => out.push('|'),
					'+' => out.push('+'),
					'=' | '?' => out.push('?'),
					'{' => {
						let mut body = String::new();
						while let Some(b) = chars.next() {
							if b == '}' {
								break;
							}
							if b == '\\' && chars.peek() == Some(&'}') {
								continue;
							}
							body.push(b);
						}
						match body.as_str() {
							"" => out.push('*'),
							"-" => out.push_str("*?"),
							_ if body.starts_with('-') => {
								out.push('{');
								out.push_str(&body[1..]);
								out.push_str("}?");
							}
							_ => {
								out.push('{');
								out.push_str(&body);
								out.push('}');
							}
						}
					}
					's' | 'S' | 'd' | 'D' | 'w' | 'W' | 'n' | 't' => {
						out.push('\\');
						out.push(next);
					}
					'a' => out.push_str("[A-Za-z]"),
					'l' => out.push_str("[a-z]"),
					'u' => out.push_str("[A-Z]"),
					'c' => case = Some(true),
					'C' => case = Some(false),
					other => push_literal(&mut out, other),
				}
			}
			'[' => {
				out.push('[');
				if chars.peek() == Some(&'^') {
					chars.next();
					out.push('^');
				}
				if chars.peek() == Some(&']') {
					chars.next();
					out.push_str("\\]");
				}
				for b in chars.by_ref() {
					if b == ']' {
						break;
					}
					if b == '[' {
						out.push('\\');
					}
					has_upper |= b.is_uppercase();
					out.push(b);
				}
				out.push(']');
			}
			'.' | '*' | '^' | '$' => out.push(c),
			other => {
				has_upper |= other.is_uppercase();
				push_literal(&mut out, other);
			}
		}
	}

	Translated {
		source: out,
		case,
		has_upper,
	}
}

/// Rewrites a `:s` / `substitute()` replacement into `regex` replacement
/// syntax: `&` and `\0` are the whole match, `\1`-`\9` groups, `\n` a line
/// break, `\r` a carriage return and `\&` a literal `&`.
pub fn expand_replacement(replacement: &str) -> String {
	let mut out = String::with_capacity(replacement.len() + 4);
	let mut chars = replacement.chars();
	while let Some(c) = chars.next() {
		match c {
			'&' => out.push_str("${0}"),
			'$' => out.push_str("$$"),
			'\\' => match chars.next() {
				Some(d @ '0'..='9') => {
					out.push_str("${");
					out.push(d);
					out.push('}');
				}
				Some('n') => out.push('\n'),
				Some('r') => out.push('\r'),
				Some('t') => out.push('\t'),
				Some('$') => out.push_str("$$"),
				Some(other) => out.push(other),
				None => out.push('\\'),
			},
			c => out.push(c),
		}
	}
	out
}

fn push_literal(out: &mut String, c: char) {
	let mut buf = [0u8; 4];
	out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

#[cfg(test)]
mod tests {
	use super::*;

	fn matches(pattern: &str, text: &str) -> bool {
		compile_pattern(pattern, false, false).map(|re| re.is_match(text)).unwrap_or(false)
	}

	#[test]
	fn magic_groups_and_alternation() {
		assert!(matches(r"\(foo\|bar\)baz", "barbaz"));
		assert!(matches("(x)", "(x)"));
		assert!(!matches("(x)", "x"));
		assert!(matches("a|b", "a|b"));
	}

	#[test]
	fn quantifiers() {
		assert!(matches(r"ab\+c", "abbbc"));
		assert!(matches(r"ab\=c", "ac"));
		assert!(matches(r"a\{2}", "aa"));
		assert!(!matches(r"^a\{3}$", "aa"));
		assert!(matches("a+", "a+"));
	}

	#[test]
	fn word_boundaries() {
		let re = compile_pattern(r"\<is\>", false, false).unwrap();
		assert!(re.is_match("this is"));
		assert_eq!(re.find("this is").map(|m| m.start()), Some(5));
	}

	#[test]
	fn smartcase_and_flags() {
		assert!(compile_pattern("foo", true, true).unwrap().is_match("FOO"));
		assert!(!compile_pattern("Foo", true, true).unwrap().is_match("FOO"));
		assert!(compile_pattern(r"foo\c", false, false).unwrap().is_match("FOO"));
		assert!(!compile_pattern(r"foo\C", true, false).unwrap().is_match("FOO"));
	}

	#[test]
	fn bracket_expressions_pass_through() {
		assert!(matches("[a-c]x", "bx"));
		assert!(matches("[^0-9]", "a"));
		assert!(matches("[]]", "]"));
	}

	#[test]
	fn replacement_groups_and_ampersand() {
		let re = compile_pattern(r"\(\w\+\) \(\w\+\)", false, false).unwrap();
		assert_eq!(re.replace("hello world", expand_replacement(r"\2 \1").as_str()), "world hello");
		let re = compile_pattern("o", false, false).unwrap();
		assert_eq!(re.replace_all("foo", expand_replacement("<&>").as_str()), "f<o><o>");
		assert_eq!(re.replace("foo", expand_replacement(r"\&$").as_str()), "f&$o");
	}

	#[test]
	fn empty_pattern_is_an_error() {
		assert!(matches!(compile_pattern("", false, false), Err(PatternError::Empty)));
	}
}
