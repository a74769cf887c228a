//! Expression tokens.

use viper_primitives::parse_keys;

use crate::ast::{CaseMode, CompareOp};
use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
	Number(i64),
	Float(f64),
	Str(String),
	Ident(String),
	Option(String),
	Register(char),
	Env(String),
	Compare(CompareOp, CaseMode),
	LParen,
	RParen,
	LBracket,
	RBracket,
	LBrace,
	/// `#{`.
	HashBrace,
	RBrace,
	Comma,
	Colon,
	Semicolon,
	Question,
	/// `??`.
	Falsy,
	Hash,
	Arrow,
	Dot,
	DotDot,
	Ellipsis,
	Plus,
	Minus,
	Star,
	Slash,
	Percent,
	Bang,
	OrOr,
	AndAnd,
	Assign,
	/// `+=`, `-=`, `*=`, `/=`, `%=`, `.=`, `..=`.
	OpAssign(char),
}

/// A token and whether blanks preceded it. `a.b` (member access) and
/// `a . b` (concatenation) differ only in spacing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
	pub tok: Tok,
	pub spaced: bool,
	/// Byte offset in the source.
	pub offset: usize,
}

pub(crate) fn is_ident_start(c: char) -> bool {
	c.is_ascii_alphabetic() || c == '_'
}

pub(crate) fn is_ident_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

struct Lexer<'a> {
	src: &'a str,
	pos: usize,
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
	let mut lexer = Lexer { src, pos: 0 };
	let mut tokens = Vec::new();
	loop {
		let spaced = lexer.skip_blanks();
		if lexer.pos >= src.len() {
			break;
		}
		let offset = lexer.pos;
		let tok = lexer.next_token()?;
		tokens.push(Token { tok, spaced, offset });
	}
	Ok(tokens)
}

impl Lexer<'_> {
	fn rest(&self) -> &str {
		&self.src[self.pos..]
	}

	fn peek(&self) -> Option<char> {
		self.rest().chars().next()
	}

	fn peek_at(&self, n: usize) -> Option<char> {
		self.rest().chars().nth(n)
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.pos += c.len_utf8();
		Some(c)
	}

	fn eat(&mut self, s: &str) -> bool {
		if self.rest().starts_with(s) {
			self.pos += s.len();
			true
		} else {
			false
		}
	}

	fn skip_blanks(&mut self) -> bool {
		let start = self.pos;
		while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r')) {
			self.pos += 1;
		}
		self.pos > start
	}

	fn case_suffix(&mut self) -> CaseMode {
		if self.eat("#") {
			CaseMode::Match
		} else if self.eat("?") {
			CaseMode::Ignore
		} else {
			CaseMode::Option
		}
	}

	fn next_token(&mut self) -> Result<Tok, ParseError> {
		let c = self.peek().unwrap_or('\0');
		if c.is_ascii_digit() {
			return self.number();
		}
		if is_ident_start(c) {
			return Ok(self.ident());
		}
		let tok = match c {
			'"' => return self.double_quoted(),
			'\'' => return self.single_quoted(),
			'&' if self.eat("&&") => Tok::AndAnd,
			'&' => {
				self.bump();
				let mut name = String::new();
				if matches!(self.peek(), Some('l' | 'g')) && self.peek_at(1) == Some(':') {
					self.pos += 2;
				}
				while let Some(c) = self.peek().filter(|c| is_ident_char(*c)) {
					name.push(c);
					self.bump();
				}
				if name.is_empty() {
					return Err(ParseError::InvalidExpression(self.src.to_string()));
				}
				Tok::Option(name)
			}
			'@' => {
				self.bump();
				let name = self.bump().ok_or_else(|| ParseError::InvalidExpression(self.src.to_string()))?;
				Tok::Register(name)
			}
			'$' => {
				self.bump();
				let mut name = String::new();
				while let Some(c) = self.peek().filter(|c| is_ident_char(*c)) {
					name.push(c);
					self.bump();
				}
				Tok::Env(name)
			}
			_ => return self.punct(),
		};
		Ok(tok)
	}

	fn punct(&mut self) -> Result<Tok, ParseError> {
		const COMPARE: [(&str, CompareOp); 8] = [
			("==", CompareOp::Equal),
			("!=", CompareOp::NotEqual),
			(">=", CompareOp::GreaterEqual),
			("<=", CompareOp::LessEqual),
			("=~", CompareOp::Match),
			("!~", CompareOp::NoMatch),
			(">", CompareOp::Greater),
			("<", CompareOp::Less),
		];
		for (text, op) in COMPARE {
			if self.eat(text) {
				return Ok(Tok::Compare(op, self.case_suffix()));
			}
		}
		for (text, op) in [("..=", '.'), ("+=", '+'), ("-=", '-'), ("*=", '*'), ("/=", '/'), ("%=", '%'), (".=", '.')] {
			if self.eat(text) {
				return Ok(Tok::OpAssign(op));
			}
		}
		for (text, tok) in [
			("...", Tok::Ellipsis),
			("..", Tok::DotDot),
			("->", Tok::Arrow),
			("??", Tok::Falsy),
			("||", Tok::OrOr),
			("#{", Tok::HashBrace),
		] {
			if self.eat(text) {
				return Ok(tok);
			}
		}
		let c = self.bump().unwrap_or('\0');
		Ok(match c {
			'(' => Tok::LParen,
			')' => Tok::RParen,
			'[' => Tok::LBracket,
			']' => Tok::RBracket,
			'{' => Tok::LBrace,
			'}' => Tok::RBrace,
			',' => Tok::Comma,
			':' => Tok::Colon,
			';' => Tok::Semicolon,
			'?' => Tok::Question,
			'#' => Tok::Hash,
			'.' => Tok::Dot,
			'+' => Tok::Plus,
			'-' => Tok::Minus,
			'*' => Tok::Star,
			'/' => Tok::Slash,
			'%' => Tok::Percent,
			'!' => Tok::Bang,
			'=' => Tok::Assign,
			_ => return Err(ParseError::InvalidExpression(self.src[self.pos - c.len_utf8()..].to_string())),
		})
	}

	/// Names, with an optional one-letter scope prefix (`g:`, `a:0`).
	fn ident(&mut self) -> Tok {
		let start = self.pos;
		let first = self.bump().unwrap_or('_');
		if "gblswtav".contains(first)
			&& self.peek() == Some(':')
			&& self.peek_at(1).is_some_and(|c| is_ident_char(c))
		{
			self.bump();
		}
		while self.peek().is_some_and(is_ident_char) {
			self.bump();
		}
		// Autoload names: `foo#bar#Baz`.
		while self.peek() == Some('#') && self.peek_at(1).is_some_and(is_ident_start) {
			self.bump();
			while self.peek().is_some_and(is_ident_char) {
				self.bump();
			}
		}
		Tok::Ident(self.src[start..self.pos].to_string())
	}

	/// Decimal, `0x`, `0b`, `0o`/leading-zero octal, and floats. `1e3` is a
	/// Number followed by a name, as in Vim.
	fn number(&mut self) -> Result<Tok, ParseError> {
		let start = self.pos;
		let rest = self.rest();
		let lower = rest.get(..2).map(str::to_ascii_lowercase);
		let radix = match lower.as_deref() {
			Some("0x") if rest[2..].starts_with(|c: char| c.is_ascii_hexdigit()) => 16,
			Some("0b") if rest[2..].starts_with(['0', '1']) => 2,
			Some("0o") if rest[2..].starts_with(|c: char| ('0'..='7').contains(&c)) => 8,
			_ => 10,
		};
		if radix != 10 {
			self.pos += 2;
			let digits_start = self.pos;
			while self.peek().is_some_and(|c| c.is_digit(radix)) {
				self.bump();
			}
			return Ok(Tok::Number(radix_value(&self.src[digits_start..self.pos], radix)));
		}

		while self.peek().is_some_and(|c| c.is_ascii_digit()) {
			self.bump();
		}
		if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
			self.bump();
			while self.peek().is_some_and(|c| c.is_ascii_digit()) {
				self.bump();
			}
			if matches!(self.peek(), Some('e' | 'E')) {
				let save = self.pos;
				self.bump();
				if matches!(self.peek(), Some('+' | '-')) {
					self.bump();
				}
				if self.peek().is_some_and(|c| c.is_ascii_digit()) {
					while self.peek().is_some_and(|c| c.is_ascii_digit()) {
						self.bump();
					}
				} else {
					self.pos = save;
				}
			}
			let text = &self.src[start..self.pos];
			return text
				.parse::<f64>()
				.map(Tok::Float)
				.map_err(|_| ParseError::InvalidExpression(text.to_string()));
		}

		let text = &self.src[start..self.pos];
		let octal = text.len() > 1 && text.starts_with('0') && text.bytes().all(|b| b < b'8');
		Ok(Tok::Number(if octal { radix_value(&text[1..], 8) } else { radix_value(text, 10) }))
	}

	fn single_quoted(&mut self) -> Result<Tok, ParseError> {
		let start = self.pos;
		self.bump();
		let mut out = String::new();
		loop {
			match self.bump() {
				None => return Err(ParseError::MissingSingleQuote(self.src[start..].to_string())),
				Some('\'') if self.peek() == Some('\'') => {
					self.bump();
					out.push('\'');
				}
				Some('\'') => return Ok(Tok::Str(out)),
				Some(c) => out.push(c),
			}
		}
	}

	fn double_quoted(&mut self) -> Result<Tok, ParseError> {
		let start = self.pos;
		self.bump();
		let mut out = String::new();
		loop {
			let Some(c) = self.bump() else {
				return Err(ParseError::MissingQuote(self.src[start..].to_string()));
			};
			match c {
				'"' => return Ok(Tok::Str(out)),
				'\\' => self.escape(&mut out),
				c => out.push(c),
			}
		}
	}

	fn escape(&mut self, out: &mut String) {
		let Some(c) = self.bump() else {
			out.push('\\');
			return;
		};
		match c {
			'n' => out.push('\n'),
			't' => out.push('\t'),
			'r' => out.push('\r'),
			'e' => out.push('\x1b'),
			'b' => out.push('\x08'),
			'f' => out.push('\x0c'),
			'x' | 'X' => self.hex_escape(out, 2, c),
			'u' => self.hex_escape(out, 4, c),
			'U' => self.hex_escape(out, 8, c),
			'0'..='7' => {
				let mut value = c.to_digit(8).unwrap_or(0);
				for _ in 0..2 {
					match self.peek().and_then(|d| d.to_digit(8)) {
						Some(d) => {
							value = value * 8 + d;
							self.bump();
						}
						None => break,
					}
				}
				out.extend(char::from_u32(value));
			}
			'<' => {
				// `\<Esc>`, `\<C-W>`: a key in Vim notation.
				if let Some(end) = self.rest().find('>') {
					let notation = format!("<{}", &self.rest()[..=end]);
					let keys = parse_keys(&notation);
					if let [key] = keys.as_slice()
						&& let Some(raw) = key.to_raw_char()
						&& notation.len() > 3
					{
						self.pos += end + 1;
						out.push(raw);
						return;
					}
				}
				out.push('<');
			}
			other => out.push(other),
		}
	}

	fn hex_escape(&mut self, out: &mut String, max: usize, letter: char) {
		let mut value = 0u32;
		let mut count = 0;
		while count < max {
			match self.peek().and_then(|d| d.to_digit(16)) {
				Some(d) => {
					value = value * 16 + d;
					self.bump();
					count += 1;
				}
				None => break,
			}
		}
		if count == 0 {
			out.push(letter);
		} else {
			out.extend(char::from_u32(value));
		}
	}
}

fn radix_value(digits: &str, radix: u32) -> i64 {
	let mut value: i64 = 0;
	for c in digits.chars() {
		let Some(d) = c.to_digit(radix) else { break };
		value = value.saturating_mul(i64::from(radix)).saturating_add(i64::from(d));
	}
	value
}

#[cfg(test)]
mod tests {
	use super::*;

	fn toks(src: &str) -> Vec<Tok> {
		tokenize(src).unwrap().into_iter().map(|t| t.tok).collect()
	}

	#[test]
	fn numbers_in_every_base() {
		assert_eq!(toks("0x1f 0b11 0o17 017 089 12"), vec![
			Tok::Number(31),
			Tok::Number(3),
			Tok::Number(15),
			Tok::Number(15),
			Tok::Number(89),
			Tok::Number(12),
		]);
	}

	#[test]
	fn exponent_needs_a_fraction() {
		assert_eq!(toks("1.5e3"), vec![Tok::Float(1500.0)]);
		assert_eq!(toks("1e3"), vec![Tok::Number(1), Tok::Ident("e3".into())]);
	}

	#[test]
	fn scoped_names_and_comparisons() {
		assert_eq!(toks("g:x ==# a:0"), vec![
			Tok::Ident("g:x".into()),
			Tok::Compare(CompareOp::Equal, CaseMode::Match),
			Tok::Ident("a:0".into()),
		]);
		assert_eq!(toks("x ? 1 : 2"), vec![
			Tok::Ident("x".into()),
			Tok::Question,
			Tok::Number(1),
			Tok::Colon,
			Tok::Number(2),
		]);
	}

	#[test]
	fn double_quoted_escapes() {
		assert_eq!(toks(r#""a\tb\x41é\<Esc>\q""#), vec![Tok::Str("a\tbAé\x1bq".into())]);
	}

	#[test]
	fn unterminated_strings_fail() {
		assert!(matches!(tokenize("'abc"), Err(ParseError::MissingSingleQuote(_))));
		assert!(matches!(tokenize("\"abc"), Err(ParseError::MissingQuote(_))));
	}

	#[test]
	fn spacing_is_recorded() {
		let tokens = tokenize("d.key . 'x'").unwrap();
		let spaced: Vec<bool> = tokens.iter().map(|t| t.spaced).collect();
		assert_eq!(spaced, vec![false, false, false, true, true]);
	}
}
