//! Command-line and script parsing.
//!
//! A source is split into lines (joining `\` continuation lines), each line
//! into `|`-separated commands, and block commands (`if`, `while`, `for`,
//! `function`) are then folded into statement trees.

use std::iter::Peekable;
use std::rc::Rc;
use std::vec::IntoIter;

use crate::ast::{EchoKind, Expr, ForTarget, FunctionDef, FunctionFlags, LetOp, LetTarget, Stmt};
use crate::error::ParseError;
use crate::ex::{EX_COMMANDS, ExCommand, ExKind, parse_ex, parse_range};
use crate::lexer::{Tok, is_ident_char};
use crate::parser::Parser;

/// Parses one command line, which may hold several `|`-separated commands
/// and whole one-line blocks (`if x | echo 1 | endif`).
pub fn parse_command(source: &str) -> Result<Vec<Stmt>, ParseError> {
	parse_script(source)
}

/// Parses a script of any number of lines.
pub fn parse_script(source: &str) -> Result<Vec<Stmt>, ParseError> {
	let mut items = Vec::new();
	for line in join_continuations(source) {
		for segment in split_bar(&line) {
			items.push(parse_single(segment)?);
		}
	}
	let mut iter = items.into_iter().peekable();
	let (body, end) = block(&mut iter, Nesting::default())?;
	match end {
		None => Ok(body),
		Some(end) => Err(unexpected(&end)),
	}
}

/// Script scripting keywords and their shortest abbreviation.
const SCRIPT_COMMANDS: &[(&str, usize)] = &[
	("break", 4),
	("call", 3),
	("continue", 3),
	("echo", 2),
	("echoerr", 5),
	("echomsg", 5),
	("else", 2),
	("elseif", 5),
	("endfor", 5),
	("endfunction", 4),
	("endif", 2),
	("endwhile", 4),
	("execute", 3),
	("for", 3),
	("function", 2),
	("if", 2),
	("let", 3),
	("return", 3),
	("unlet", 3),
	("while", 2),
];

fn full_name(word: &str) -> Option<&'static str> {
	SCRIPT_COMMANDS
		.iter()
		.chain(EX_COMMANDS)
		.find(|(full, min)| word.len() >= *min && full.starts_with(word))
		.map(|(full, _)| *full)
}

fn join_continuations(source: &str) -> Vec<String> {
	let mut lines: Vec<String> = Vec::new();
	for raw in source.lines() {
		let trimmed = raw.trim_start();
		if let Some(rest) = trimmed.strip_prefix('\\')
			&& let Some(last) = lines.last_mut()
		{
			last.push_str(rest);
			continue;
		}
		lines.push(raw.to_string());
	}
	lines
}

/// Splits on `|` outside strings, skipping `||` and `\|`. `normal` takes the
/// rest of the line.
fn split_bar(line: &str) -> Vec<&str> {
	let mut segments = Vec::new();
	let mut start = 0;
	let bytes = line.as_bytes();
	let mut quote: Option<u8> = None;
	let mut i = 0;
	while i < bytes.len() {
		let b = bytes[i];
		match quote {
			Some(q) => {
				if b == b'\\' && q == b'"' {
					i += 1;
				} else if b == q {
					quote = None;
				}
			}
			None => match b {
				b'\\' => i += 1,
				b'\'' => quote = Some(b'\''),
				b'"' if !line[start..i].trim_start_matches([' ', '\t', ':']).is_empty() => quote = Some(b'"'),
				b'"' => {
					segments.push(&line[start..i]);
					return segments;
				}
				b'|' if bytes.get(i + 1) == Some(&b'|') => i += 1,
				b'|' => {
					if takes_rest_of_line(&line[start..i]) {
						break;
					}
					segments.push(&line[start..i]);
					start = i + 1;
				}
				_ => {}
			},
		}
		i += 1;
	}
	segments.push(&line[start..]);
	segments
}

fn takes_rest_of_line(segment: &str) -> bool {
	let Ok((_, rest)) = parse_range(segment.trim_start().trim_start_matches(':')) else {
		return false;
	};
	let word: String = rest.chars().take_while(char::is_ascii_alphabetic).collect();
	full_name(&word) == Some("normal")
}

/// One parsed command before blocks are folded.
#[derive(Debug)]
enum Item {
	Empty,
	Stmt(Stmt),
	If(Expr),
	ElseIf(Expr),
	Else,
	EndIf,
	While(Expr),
	EndWhile,
	For(ForTarget, Expr),
	EndFor,
	Function(FunctionDef),
	EndFunction,
}

fn unexpected(item: &Item) -> ParseError {
	match item {
		Item::ElseIf(_) | Item::Else => ParseError::ElseWithoutIf,
		Item::EndWhile => ParseError::EndwhileWithoutWhile,
		Item::EndFor => ParseError::EndforWithoutFor,
		Item::EndFunction => ParseError::EndfunctionWithoutFunction,
		_ => ParseError::EndifWithoutIf,
	}
}

#[derive(Debug, Clone, Copy, Default)]
struct Nesting {
	loops: usize,
	in_function: bool,
}

/// Collects statements until a block terminator, which is returned.
fn block(items: &mut Peekable<IntoIter<Item>>, nesting: Nesting) -> Result<(Vec<Stmt>, Option<Item>), ParseError> {
	let mut body = Vec::new();
	while let Some(item) = items.next() {
		match item {
			Item::Empty => {}
			Item::Stmt(Stmt::Break) if nesting.loops == 0 => return Err(ParseError::BreakOutsideLoop),
			Item::Stmt(Stmt::Continue) if nesting.loops == 0 => return Err(ParseError::ContinueOutsideLoop),
			Item::Stmt(Stmt::Return(_)) if !nesting.in_function => return Err(ParseError::ReturnOutsideFunction),
			Item::Stmt(stmt) => body.push(stmt),
			Item::If(cond) => body.push(if_block(cond, items, nesting)?),
			Item::While(cond) => {
				let inner = Nesting {
					loops: nesting.loops + 1,
					..nesting
				};
				match block(items, inner)? {
					(inner_body, Some(Item::EndWhile)) => body.push(Stmt::While { cond, body: inner_body }),
					(_, None) => return Err(ParseError::MissingEndwhile),
					(_, Some(other)) => return Err(unexpected(&other)),
				}
			}
			Item::For(target, iterable) => {
				let inner = Nesting {
					loops: nesting.loops + 1,
					..nesting
				};
				match block(items, inner)? {
					(inner_body, Some(Item::EndFor)) => body.push(Stmt::For {
						target,
						iterable,
						body: inner_body,
					}),
					(_, None) => return Err(ParseError::MissingEndfor),
					(_, Some(other)) => return Err(unexpected(&other)),
				}
			}
			Item::Function(mut def) => {
				let inner = Nesting {
					loops: 0,
					in_function: true,
				};
				match block(items, inner)? {
					(inner_body, Some(Item::EndFunction)) => {
						def.body = inner_body;
						body.push(Stmt::Function(Rc::new(def)));
					}
					(_, None) => return Err(ParseError::MissingEndfunction),
					(_, Some(other)) => return Err(unexpected(&other)),
				}
			}
			end => return Ok((body, Some(end))),
		}
	}
	Ok((body, None))
}

fn if_block(first: Expr, items: &mut Peekable<IntoIter<Item>>, nesting: Nesting) -> Result<Stmt, ParseError> {
	let mut branches = Vec::new();
	let mut cond = first;
	loop {
		let (body, end) = block(items, nesting)?;
		branches.push((cond, body));
		match end {
			Some(Item::ElseIf(next)) => cond = next,
			Some(Item::Else) => {
				return match block(items, nesting)? {
					(otherwise, Some(Item::EndIf)) => Ok(Stmt::If { branches, otherwise }),
					(_, None) => Err(ParseError::MissingEndif),
					(_, Some(other)) => Err(unexpected(&other)),
				};
			}
			Some(Item::EndIf) => {
				return Ok(Stmt::If {
					branches,
					otherwise: Vec::new(),
				});
			}
			None => return Err(ParseError::MissingEndif),
			Some(other) => return Err(unexpected(&other)),
		}
	}
}

fn parse_single(segment: &str) -> Result<Item, ParseError> {
	let text = segment.trim().trim_start_matches(':').trim_start();
	if text.is_empty() || text.starts_with('"') {
		return Ok(Item::Empty);
	}
	let (range, rest) = parse_range(text)?;
	let rest = rest.trim_start();
	if rest.is_empty() {
		return match range {
			Some(range) => Ok(Item::Stmt(Stmt::Ex(ExCommand {
				range: Some(range),
				kind: ExKind::Goto,
			}))),
			None => Ok(Item::Empty),
		};
	}

	let name_len = if rest.starts_with(['>', '<']) {
		1
	} else {
		rest.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(rest.len())
	};
	if name_len == 0 {
		return Err(ParseError::NotACommand(text.to_string()));
	}
	let word = &rest[..name_len];
	let after = &rest[name_len..];
	let (bang, args) = match after.strip_prefix('!') {
		Some(args) => (true, args),
		None => (false, after),
	};

	let name = if word == ">" || word == "<" {
		word
	} else {
		full_name(word).ok_or_else(|| ParseError::NotACommand(text.to_string()))?
	};

	if range.is_some() && SCRIPT_COMMANDS.iter().any(|(full, _)| *full == name) && name != "call" {
		return Err(ParseError::InvalidRange);
	}

	let item = match name {
		"let" => Item::Stmt(parse_let(args)?),
		"unlet" => Item::Stmt(parse_unlet(args, bang)?),
		"echo" => Item::Stmt(Stmt::Echo {
			kind: EchoKind::Echo,
			args: expressions(args)?,
		}),
		"echomsg" => Item::Stmt(Stmt::Echo {
			kind: EchoKind::Msg,
			args: expressions(args)?,
		}),
		"echoerr" => Item::Stmt(Stmt::Echo {
			kind: EchoKind::Err,
			args: expressions(args)?,
		}),
		"execute" => Item::Stmt(Stmt::Execute(expressions(args)?)),
		"call" => {
			let expr = single_expression(args)?;
			if !matches!(expr, Expr::Call { .. } | Expr::Method { .. }) {
				return Err(ParseError::InvalidArgument(args.trim().to_string()));
			}
			Item::Stmt(Stmt::Call(expr))
		}
		"return" => Item::Stmt(Stmt::Return(if args.trim().is_empty() { None } else { Some(single_expression(args)?) })),
		"break" => Item::Stmt(Stmt::Break),
		"continue" => Item::Stmt(Stmt::Continue),
		"if" => Item::If(single_expression(args)?),
		"elseif" => Item::ElseIf(single_expression(args)?),
		"else" => Item::Else,
		"endif" => Item::EndIf,
		"while" => Item::While(single_expression(args)?),
		"endwhile" => Item::EndWhile,
		"for" => {
			let (target, iterable) = parse_for(args)?;
			Item::For(target, iterable)
		}
		"endfor" => Item::EndFor,
		"function" => Item::Function(parse_function_header(args, bang)?),
		"endfunction" => Item::EndFunction,
		_ => Item::Stmt(Stmt::Ex(parse_ex(range, name, bang, args)?)),
	};
	Ok(item)
}

fn single_expression(args: &str) -> Result<Expr, ParseError> {
	if args.trim().is_empty() {
		return Err(ParseError::ArgumentRequired);
	}
	let mut parser = Parser::new(args)?;
	let expr = parser.expr()?;
	parser.expect_end()?;
	Ok(expr)
}

/// Blank-separated expressions, as `:echo` and `:execute` take.
fn expressions(args: &str) -> Result<Vec<Expr>, ParseError> {
	let mut parser = Parser::new(args)?;
	let mut exprs = Vec::new();
	while !parser.at_end() {
		exprs.push(parser.expr()?);
	}
	Ok(exprs)
}

fn let_target(expr: Expr) -> Result<LetTarget, ParseError> {
	Ok(match expr {
		Expr::Var(name) => LetTarget::Var(name),
		Expr::Option(name) => LetTarget::Option(name),
		Expr::Register(r) => LetTarget::Register(r),
		Expr::Env(name) => LetTarget::Env(name),
		Expr::Index(base, index) => LetTarget::Index(*base, *index),
		Expr::Member(base, key) => LetTarget::Member(*base, key),
		other => return Err(ParseError::InvalidArgument(format!("{other:?}"))),
	})
}

fn let_op(tok: Option<Tok>) -> Option<LetOp> {
	Some(match tok? {
		Tok::Assign => LetOp::Assign,
		Tok::OpAssign('+') => LetOp::Add,
		Tok::OpAssign('-') => LetOp::Sub,
		Tok::OpAssign('*') => LetOp::Mul,
		Tok::OpAssign('/') => LetOp::Div,
		Tok::OpAssign('%') => LetOp::Rem,
		Tok::OpAssign('.') => LetOp::Concat,
		_ => return None,
	})
}

fn parse_let(args: &str) -> Result<Stmt, ParseError> {
	let mut parser = Parser::new(args)?;
	if parser.at_end() {
		return Err(ParseError::ArgumentRequired);
	}
	if parser.eat(&Tok::LBracket) {
		let mut targets = Vec::new();
		let mut rest = None;
		loop {
			if parser.eat(&Tok::RBracket) {
				break;
			}
			let target = let_target(parser.postfix()?)?;
			if parser.eat(&Tok::Semicolon) {
				rest = Some(let_target(parser.postfix()?)?);
				if !parser.eat(&Tok::RBracket) {
					return Err(ParseError::MissingListEnd(args.trim().to_string()));
				}
				targets.push(target);
				break;
			}
			targets.push(target);
			if !parser.eat(&Tok::Comma) && parser.peek() != Some(&Tok::RBracket) {
				return Err(ParseError::MissingListEnd(args.trim().to_string()));
			}
		}
		let op = let_op(parser.bump()).ok_or_else(|| ParseError::InvalidArgument(args.trim().to_string()))?;
		let value = parser.expr()?;
		parser.expect_end()?;
		return Ok(Stmt::LetUnpack { targets, rest, op, value });
	}

	let target = let_target(parser.postfix()?)?;
	let op = let_op(parser.bump()).ok_or_else(|| ParseError::InvalidArgument(args.trim().to_string()))?;
	let value = parser.expr()?;
	parser.expect_end()?;
	Ok(Stmt::Let { target, op, value })
}

fn parse_unlet(args: &str, force: bool) -> Result<Stmt, ParseError> {
	let mut parser = Parser::new(args)?;
	let mut targets = Vec::new();
	while !parser.at_end() {
		targets.push(let_target(parser.postfix()?)?);
	}
	if targets.is_empty() {
		return Err(ParseError::ArgumentRequired);
	}
	Ok(Stmt::Unlet { targets, force })
}

fn parse_for(args: &str) -> Result<(ForTarget, Expr), ParseError> {
	let mut parser = Parser::new(args)?;
	let target = if parser.eat(&Tok::LBracket) {
		let mut names = Vec::new();
		loop {
			match parser.bump() {
				Some(Tok::RBracket) => break,
				Some(Tok::Ident(name)) => names.push(name),
				Some(Tok::Comma) => {}
				_ => return Err(ParseError::InvalidArgument(args.trim().to_string())),
			}
		}
		ForTarget::Unpack(names)
	} else {
		match parser.bump() {
			Some(Tok::Ident(name)) => ForTarget::Name(name),
			_ => return Err(ParseError::InvalidArgument(args.trim().to_string())),
		}
	};
	match parser.bump() {
		Some(Tok::Ident(word)) if word == "in" => {}
		_ => return Err(ParseError::InvalidArgument(args.trim().to_string())),
	}
	let iterable = parser.expr()?;
	parser.expect_end()?;
	Ok((target, iterable))
}

fn parse_function_header(args: &str, replace: bool) -> Result<FunctionDef, ParseError> {
	let args = args.trim();
	let open = args.find('(').ok_or(ParseError::MissingParen)?;
	let name = args[..open].trim().to_string();
	let valid = name.starts_with(|c: char| c.is_ascii_uppercase())
		|| name.strip_prefix("s:").or_else(|| name.strip_prefix("g:")).is_some_and(|n| !n.is_empty())
		|| name.contains(['.', '#']);
	if !valid || !name.chars().all(|c| is_ident_char(c) || ":.#".contains(c)) {
		return Err(ParseError::InvalidFunctionName(name));
	}
	let close = args[open..].find(')').map(|i| open + i).ok_or(ParseError::MissingParen)?;

	let mut params = Vec::new();
	let mut varargs = false;
	for param in args[open + 1..close].split(',').map(str::trim).filter(|p| !p.is_empty()) {
		if param == "..." {
			varargs = true;
		} else if param.chars().all(is_ident_char) && !param.starts_with(|c: char| c.is_ascii_digit()) {
			params.push(param.to_string());
		} else {
			return Err(ParseError::InvalidArgument(param.to_string()));
		}
	}

	let mut flags = FunctionFlags::default();
	for flag in args[close + 1..].split_whitespace() {
		match flag {
			"abort" => flags.abort = true,
			"range" => flags.range = true,
			"dict" => flags.dict = true,
			"closure" => flags.closure = true,
			other => return Err(ParseError::TrailingCharacters(other.to_string())),
		}
	}

	Ok(FunctionDef {
		name,
		params,
		varargs,
		flags,
		replace,
		body: Vec::new(),
	})
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::ast::BinaryOp;
	use crate::ex::{AddressBase, LineRange};

	#[test]
	fn abbreviations_resolve() {
		assert_eq!(full_name("ec"), Some("echo"));
		assert_eq!(full_name("endf"), Some("endfunction"));
		assert_eq!(full_name("endfo"), Some("endfor"));
		assert_eq!(full_name("s"), Some("substitute"));
		assert_eq!(full_name("se"), Some("set"));
		assert_eq!(full_name("un"), Some("undo"));
		assert_eq!(full_name("unl"), Some("unlet"));
		assert_eq!(full_name("fo"), None);
	}

	#[test]
	fn bars_split_commands_but_not_strings_or_or() {
		assert_eq!(split_bar("echo 'a|b' | echo 1 || 0"), vec!["echo 'a|b' ", " echo 1 || 0"]);
		assert_eq!(split_bar(r"s/a\|b/c/ | echo 1"), vec![r"s/a\|b/c/ ", " echo 1"]);
		assert_eq!(split_bar("normal! ix|y"), vec!["normal! ix|y"]);
		assert_eq!(split_bar("\" a comment | still"), vec![""]);
	}

	#[test]
	fn one_line_if_block() {
		let stmts = parse_command("if 1 | echo 'yes' | else | echo 'no' | endif").unwrap();
		assert!(matches!(&stmts[..], [Stmt::If { branches, otherwise }] if branches.len() == 1 && otherwise.len() == 1));
	}

	#[test]
	fn let_forms() {
		assert_eq!(parse_command("let x .= 'a'").unwrap(), vec![Stmt::Let {
			target: LetTarget::Var("x".into()),
			op: LetOp::Concat,
			value: Expr::String("a".into()),
		}]);
		assert!(matches!(
			&parse_command("let [a, b; rest] = [1, 2, 3]").unwrap()[..],
			[Stmt::LetUnpack { targets, rest: Some(_), .. }] if targets.len() == 2
		));
		assert!(matches!(
			&parse_command("let d.key = 1").unwrap()[..],
			[Stmt::Let { target: LetTarget::Member(_, key), .. }] if key == "key"
		));
		assert!(matches!(
			&parse_command("let @a = 'x'").unwrap()[..],
			[Stmt::Let { target: LetTarget::Register('a'), .. }]
		));
	}

	#[test]
	fn functions_span_lines() {
		let src = "function! Add(a, b) abort\n  return a:a + a:b\nendfunction";
		let stmts = parse_script(src).unwrap();
		let [Stmt::Function(def)] = &stmts[..] else {
			panic!("expected a function, got {stmts:?}");
		};
		assert_eq!(def.name, "Add");
		assert_eq!(def.params, ["a", "b"]);
		assert!(def.flags.abort && def.replace);
		assert!(matches!(&def.body[..], [Stmt::Return(Some(Expr::Binary(BinaryOp::Add, _, _)))]));
	}

	#[test]
	fn continuation_lines_join() {
		let stmts = parse_script("let x = [1,\n      \\ 2]").unwrap();
		assert!(matches!(&stmts[..], [Stmt::Let { value: Expr::List(items), .. }] if items.len() == 2));
	}

	#[test]
	fn block_errors() {
		assert_eq!(parse_script("if 1"), Err(ParseError::MissingEndif));
		assert_eq!(parse_script("endif"), Err(ParseError::EndifWithoutIf));
		assert_eq!(parse_script("while 1\nendfor"), Err(ParseError::EndforWithoutFor));
		assert_eq!(parse_script("break"), Err(ParseError::BreakOutsideLoop));
		assert_eq!(parse_script("return 1"), Err(ParseError::ReturnOutsideFunction));
		assert_eq!(parse_script("function foo()\nendfunction"), Err(ParseError::InvalidFunctionName("foo".into())));
	}

	#[test]
	fn editor_commands_with_ranges() {
		let stmts = parse_command("%d").unwrap();
		assert_eq!(stmts, vec![Stmt::Ex(ExCommand {
			range: Some(LineRange::whole_buffer()),
			kind: ExKind::Delete { register: None, count: None },
		})]);
		let stmts = parse_command(":5").unwrap();
		assert!(matches!(&stmts[..], [Stmt::Ex(ExCommand { range: Some(r), kind: ExKind::Goto })] if r.start.base == AddressBase::Line(5)));
		assert_eq!(parse_command("frobnicate"), Err(ParseError::NotACommand("frobnicate".into())));
	}
}
