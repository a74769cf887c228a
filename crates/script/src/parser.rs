//! Expression parser.
//!
//! Precedence, loosest first: `?:` and `??`, `||`, `&&`, comparisons,
//! `+ - . ..`, `* / %`, unary `! - +`, then postfix indexing, slicing,
//! member access, calls and `->` methods.

use std::rc::Rc;

use crate::ast::{BinaryOp, CaseMode, CompareOp, Expr, LambdaDef, UnaryOp};
use crate::error::ParseError;
use crate::lexer::{Tok, Token, tokenize};

pub(crate) struct Parser<'a> {
	src: &'a str,
	tokens: Vec<Token>,
	pos: usize,
}

/// Parses a complete expression.
pub fn parse_expression(src: &str) -> Result<Expr, ParseError> {
	let mut parser = Parser::new(src)?;
	let expr = parser.expr()?;
	parser.expect_end()?;
	Ok(expr)
}

impl<'a> Parser<'a> {
	pub(crate) fn new(src: &'a str) -> Result<Self, ParseError> {
		Ok(Self {
			src,
			tokens: tokenize(src)?,
			pos: 0,
		})
	}

	pub(crate) fn peek(&self) -> Option<&Tok> {
		self.tokens.get(self.pos).map(|t| &t.tok)
	}

	fn peek_token(&self) -> Option<&Token> {
		self.tokens.get(self.pos)
	}

	fn peek_nth(&self, n: usize) -> Option<&Tok> {
		self.tokens.get(self.pos + n).map(|t| &t.tok)
	}

	pub(crate) fn at_end(&self) -> bool {
		self.pos >= self.tokens.len()
	}

	pub(crate) fn bump(&mut self) -> Option<Tok> {
		let tok = self.tokens.get(self.pos)?.tok.clone();
		self.pos += 1;
		Some(tok)
	}

	pub(crate) fn eat(&mut self, tok: &Tok) -> bool {
		if self.peek() == Some(tok) {
			self.pos += 1;
			true
		} else {
			false
		}
	}

	/// Source text from the current token on.
	pub(crate) fn remaining(&self) -> &'a str {
		match self.peek_token() {
			Some(t) => &self.src[t.offset..],
			None => "",
		}
	}

	pub(crate) fn expect_end(&self) -> Result<(), ParseError> {
		if self.at_end() {
			Ok(())
		} else {
			Err(ParseError::TrailingCharacters(self.remaining().to_string()))
		}
	}

	fn invalid(&self) -> ParseError {
		ParseError::InvalidExpression(self.src.trim().to_string())
	}

	pub(crate) fn expr(&mut self) -> Result<Expr, ParseError> {
		let cond = self.or_expr()?;
		if self.eat(&Tok::Falsy) {
			let rhs = self.expr()?;
			return Ok(Expr::Falsy(Box::new(cond), Box::new(rhs)));
		}
		if self.eat(&Tok::Question) {
			let then = self.expr()?;
			if !self.eat(&Tok::Colon) {
				return Err(self.invalid());
			}
			let otherwise = self.expr()?;
			return Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise)));
		}
		Ok(cond)
	}

	fn or_expr(&mut self) -> Result<Expr, ParseError> {
		let mut lhs = self.and_expr()?;
		while self.eat(&Tok::OrOr) {
			let rhs = self.and_expr()?;
			lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
		}
		Ok(lhs)
	}

	fn and_expr(&mut self) -> Result<Expr, ParseError> {
		let mut lhs = self.compare_expr()?;
		while self.eat(&Tok::AndAnd) {
			let rhs = self.compare_expr()?;
			lhs = Expr::And(Box::new(lhs), Box::new(rhs));
		}
		Ok(lhs)
	}

	fn compare_op(&mut self) -> Option<(CompareOp, CaseMode)> {
		match self.peek()? {
			Tok::Compare(op, case) => {
				let found = (*op, *case);
				self.pos += 1;
				Some(found)
			}
			Tok::Ident(word) if word == "is" || word == "isnot" => {
				let op = if word == "is" { CompareOp::Is } else { CompareOp::IsNot };
				self.pos += 1;
				let case = match self.peek_token() {
					Some(Token { tok: Tok::Hash, spaced: false, .. }) => CaseMode::Match,
					Some(Token {
						tok: Tok::Question,
						spaced: false,
						..
					}) => CaseMode::Ignore,
					_ => return Some((op, CaseMode::Option)),
				};
				self.pos += 1;
				Some((op, case))
			}
			_ => None,
		}
	}

	fn compare_expr(&mut self) -> Result<Expr, ParseError> {
		let lhs = self.additive()?;
		match self.compare_op() {
			Some((op, case)) => {
				let rhs = self.additive()?;
				Ok(Expr::Compare {
					op,
					case,
					lhs: Box::new(lhs),
					rhs: Box::new(rhs),
				})
			}
			None => Ok(lhs),
		}
	}

	fn additive(&mut self) -> Result<Expr, ParseError> {
		let mut lhs = self.multiplicative()?;
		loop {
			let op = match self.peek() {
				Some(Tok::Plus) => BinaryOp::Add,
				Some(Tok::Minus) => BinaryOp::Sub,
				Some(Tok::Dot | Tok::DotDot) => BinaryOp::Concat,
				_ => break,
			};
			self.pos += 1;
			let rhs = self.multiplicative()?;
			lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
		}
		Ok(lhs)
	}

	fn multiplicative(&mut self) -> Result<Expr, ParseError> {
		let mut lhs = self.unary()?;
		loop {
			let op = match self.peek() {
				Some(Tok::Star) => BinaryOp::Mul,
				Some(Tok::Slash) => BinaryOp::Div,
				Some(Tok::Percent) => BinaryOp::Rem,
				_ => break,
			};
			self.pos += 1;
			let rhs = self.unary()?;
			lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
		}
		Ok(lhs)
	}

	fn unary(&mut self) -> Result<Expr, ParseError> {
		let op = match self.peek() {
			Some(Tok::Bang) => UnaryOp::Not,
			Some(Tok::Minus) => UnaryOp::Neg,
			Some(Tok::Plus) => UnaryOp::Plus,
			_ => return self.postfix(),
		};
		self.pos += 1;
		let operand = self.unary()?;
		Ok(Expr::Unary(op, Box::new(operand)))
	}

	/// True when the current token touches the previous one.
	fn tight(&self) -> bool {
		self.peek_token().is_some_and(|t| !t.spaced)
	}

	pub(crate) fn postfix(&mut self) -> Result<Expr, ParseError> {
		let mut expr = self.primary()?;
		loop {
			match self.peek() {
				Some(Tok::LBracket) if self.tight() => {
					self.pos += 1;
					expr = self.subscript(expr)?;
				}
				Some(Tok::LParen) if self.tight() => {
					self.pos += 1;
					let args = self.arguments(&expr)?;
					expr = Expr::Call {
						callee: Box::new(expr),
						args,
					};
				}
				Some(Tok::Dot)
					if self.tight()
						&& matches!(self.tokens.get(self.pos + 1), Some(Token { tok: Tok::Ident(_), spaced: false, .. })) =>
				{
					self.pos += 1;
					let Some(Tok::Ident(key)) = self.bump() else {
						return Err(self.invalid());
					};
					expr = Expr::Member(Box::new(expr), key);
				}
				Some(Tok::Arrow) => {
					self.pos += 1;
					let Some(Tok::Ident(name)) = self.bump() else {
						return Err(self.invalid());
					};
					if !self.eat(&Tok::LParen) {
						return Err(ParseError::MissingParen);
					}
					let args = self.arguments(&Expr::Var(name.clone()))?;
					expr = Expr::Method {
						base: Box::new(expr),
						name,
						args,
					};
				}
				_ => return Ok(expr),
			}
		}
	}

	/// After `[`: an index or a `[from:to]` slice.
	fn subscript(&mut self, base: Expr) -> Result<Expr, ParseError> {
		let from = if self.peek() == Some(&Tok::Colon) { None } else { Some(Box::new(self.expr()?)) };
		if self.eat(&Tok::Colon) {
			let to = if self.peek() == Some(&Tok::RBracket) { None } else { Some(Box::new(self.expr()?)) };
			if !self.eat(&Tok::RBracket) {
				return Err(ParseError::MissingListEnd(self.remaining().to_string()));
			}
			return Ok(Expr::Slice {
				base: Box::new(base),
				from,
				to,
			});
		}
		if !self.eat(&Tok::RBracket) {
			return Err(ParseError::MissingListEnd(self.remaining().to_string()));
		}
		match from {
			Some(index) => Ok(Expr::Index(Box::new(base), index)),
			None => Err(self.invalid()),
		}
	}

	/// After `(`: comma separated arguments up to `)`.
	fn arguments(&mut self, callee: &Expr) -> Result<Vec<Expr>, ParseError> {
		let mut args = Vec::new();
		if self.eat(&Tok::RParen) {
			return Ok(args);
		}
		loop {
			args.push(self.expr()?);
			if self.eat(&Tok::RParen) {
				return Ok(args);
			}
			if !self.eat(&Tok::Comma) {
				let name = match callee {
					Expr::Var(name) => name.clone(),
					_ => String::from("<lambda>"),
				};
				return Err(ParseError::InvalidArguments(name));
			}
		}
	}

	fn primary(&mut self) -> Result<Expr, ParseError> {
		let Some(tok) = self.bump() else {
			return Err(self.invalid());
		};
		Ok(match tok {
			Tok::Number(n) => Expr::Number(n),
			Tok::Float(f) => Expr::Float(f),
			Tok::Str(s) => Expr::String(s),
			Tok::Ident(name) => Expr::Var(name),
			Tok::Option(name) => Expr::Option(name),
			Tok::Register(r) => Expr::Register(r),
			Tok::Env(name) => Expr::Env(name),
			Tok::LParen => {
				let inner = self.expr()?;
				if !self.eat(&Tok::RParen) {
					return Err(ParseError::MissingParen);
				}
				inner
			}
			Tok::LBracket => self.list()?,
			Tok::HashBrace => self.dict(true)?,
			Tok::LBrace if self.lambda_ahead() => self.lambda()?,
			Tok::LBrace => self.dict(false)?,
			_ => return Err(self.invalid()),
		})
	}

	fn list(&mut self) -> Result<Expr, ParseError> {
		let mut items = Vec::new();
		loop {
			if self.eat(&Tok::RBracket) {
				return Ok(Expr::List(items));
			}
			items.push(self.expr()?);
			if self.eat(&Tok::RBracket) {
				return Ok(Expr::List(items));
			}
			if !self.eat(&Tok::Comma) {
				return Err(ParseError::MissingListEnd(self.src.trim().to_string()));
			}
		}
	}

	/// `{'k': v}`, or `#{k: v}` with literal keys.
	fn dict(&mut self, literal_keys: bool) -> Result<Expr, ParseError> {
		let mut entries = Vec::new();
		loop {
			if self.eat(&Tok::RBrace) {
				return Ok(Expr::Dict(entries));
			}
			let key = if literal_keys {
				match self.bump() {
					Some(Tok::Ident(k)) => Expr::String(k),
					Some(Tok::Number(n)) => Expr::String(n.to_string()),
					Some(Tok::Str(s)) => Expr::String(s),
					_ => return Err(self.invalid()),
				}
			} else {
				self.expr()?
			};
			if !self.eat(&Tok::Colon) {
				return Err(ParseError::MissingColon(self.src.trim().to_string()));
			}
			entries.push((key, self.expr()?));
			if self.eat(&Tok::RBrace) {
				return Ok(Expr::Dict(entries));
			}
			if !self.eat(&Tok::Comma) {
				return Err(ParseError::MissingDictEnd(self.src.trim().to_string()));
			}
		}
	}

	/// After `{`: parameter names then `->`.
	fn lambda_ahead(&self) -> bool {
		let mut n = 0;
		loop {
			match self.peek_nth(n) {
				Some(Tok::Arrow) => return true,
				Some(Tok::Ident(name)) if !name.contains(':') => {}
				Some(Tok::Ellipsis) => return self.peek_nth(n + 1) == Some(&Tok::Arrow),
				_ => return false,
			}
			n += 1;
			match self.peek_nth(n) {
				Some(Tok::Comma) => n += 1,
				Some(Tok::Arrow) => return true,
				_ => return false,
			}
		}
	}

	fn lambda(&mut self) -> Result<Expr, ParseError> {
		let mut params = Vec::new();
		let mut varargs = false;
		loop {
			match self.bump() {
				Some(Tok::Arrow) => break,
				Some(Tok::Ident(name)) => params.push(name),
				Some(Tok::Ellipsis) => varargs = true,
				_ => return Err(self.invalid()),
			}
			if self.eat(&Tok::Arrow) {
				break;
			}
			self.eat(&Tok::Comma);
		}
		let body = self.expr()?;
		if !self.eat(&Tok::RBrace) {
			return Err(self.invalid());
		}
		Ok(Expr::Lambda(Rc::new(LambdaDef { params, varargs, body })))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn num(n: i64) -> Box<Expr> {
		Box::new(Expr::Number(n))
	}

	#[test]
	fn precedence() {
		assert_eq!(
			parse_expression("1 + 2 * 3").unwrap(),
			Expr::Binary(BinaryOp::Add, num(1), Box::new(Expr::Binary(BinaryOp::Mul, num(2), num(3))))
		);
		assert_eq!(
			parse_expression("-1 == 2 || 0").unwrap(),
			Expr::Or(
				Box::new(Expr::Compare {
					op: CompareOp::Equal,
					case: CaseMode::Option,
					lhs: Box::new(Expr::Unary(UnaryOp::Neg, num(1))),
					rhs: num(2),
				}),
				num(0)
			)
		);
	}

	#[test]
	fn member_access_versus_concatenation() {
		assert_eq!(
			parse_expression("d.key").unwrap(),
			Expr::Member(Box::new(Expr::Var("d".into())), "key".into())
		);
		assert_eq!(
			parse_expression("d . key").unwrap(),
			Expr::Binary(BinaryOp::Concat, Box::new(Expr::Var("d".into())), Box::new(Expr::Var("key".into())))
		);
	}

	#[test]
	fn slices_with_missing_bounds() {
		assert_eq!(
			parse_expression("l[:2]").unwrap(),
			Expr::Slice {
				base: Box::new(Expr::Var("l".into())),
				from: None,
				to: Some(num(2)),
			}
		);
		assert!(matches!(parse_expression("l[1:]").unwrap(), Expr::Slice { to: None, .. }));
	}

	#[test]
	fn lambdas_and_dicts_share_braces() {
		assert!(matches!(parse_expression("{a, b -> a + b}").unwrap(), Expr::Lambda(l) if l.params == ["a", "b"]));
		assert!(matches!(parse_expression("{-> 1}").unwrap(), Expr::Lambda(l) if l.params.is_empty()));
		assert!(matches!(parse_expression("{...-> a:000}").unwrap(), Expr::Lambda(l) if l.varargs));
		assert!(matches!(parse_expression("{'a': 1}").unwrap(), Expr::Dict(e) if e.len() == 1));
		assert!(matches!(parse_expression("#{a: 1, b: 2,}").unwrap(), Expr::Dict(e) if e.len() == 2));
	}

	#[test]
	fn method_calls_and_immediate_lambda_calls() {
		assert!(matches!(parse_expression("[1]->len()").unwrap(), Expr::Method { name, .. } if name == "len"));
		assert!(matches!(parse_expression("{x -> x}(1)").unwrap(), Expr::Call { callee, .. } if matches!(*callee, Expr::Lambda(_))));
	}

	#[test]
	fn malformed_input() {
		assert_eq!(parse_expression("[1, 2"), Err(ParseError::MissingListEnd("[1, 2".into())));
		assert_eq!(parse_expression("(1"), Err(ParseError::MissingParen));
		assert_eq!(parse_expression("1 2"), Err(ParseError::TrailingCharacters("2".into())));
		assert!(parse_expression("1 +").is_err());
	}
}
