//! Command lines: ranges, editing commands, `:set` and script statements.

use pretty_assertions::assert_eq;
use rstest::rstest;
use viper_engine::EditorError;
use viper_primitives::SelectionType;
use viper_script::{HostCommand, MessageKind, Value};

use crate::common::{Fixture, after};

#[rstest]
#[case::delete_range("1\n2\n3\n4", "2,3d", "1\n4")]
#[case::delete_with_count("1\n2\n3\n4", "2d 2", "1\n4")]
#[case::first_match_only("aa\naa", "%s/a/b/", "ba\nba")]
#[case::whole_match("ab", "s/b/&&/", "abb")]
#[case::groups("foo bar", "s/\\(\\w\\+\\) \\(\\w\\+\\)/\\2 \\1/", "bar foo")]
#[case::shift_range("a\nb\nc", "1,2>", "    a\n    b\nc")]
#[case::join_range("a\nb\nc", "1,2j", "a b\nc")]
#[case::normal_over_lines("a\nb", "%normal Ax", "ax\nbx")]
#[case::execute_builds_commands("a", "execute 'normal! A' . 'z'", "az")]
fn commands(#[case] text: &str, #[case] line: &str, #[case] expected: &str) {
	let mut f = Fixture::new(text);
	f.ex(line);
	assert_eq!(f.text(), expected, ":{line}");
}

#[test]
fn tilde_reuses_the_previous_replacement() {
	let mut f = Fixture::new("ab");
	f.ex("s/a/X/").ex("s/b/~Y/");
	assert_eq!(f.text(), "XXY");
}

#[test]
fn line_number_jumps() {
	let mut f = Fixture::new("a\nb\n  c");
	f.ex("3");
	assert_eq!(f.caret(), 6);
	f.ex("1");
	assert_eq!(f.caret(), 0);
	f.ex("$");
	assert_eq!(f.caret(), 6);
}

#[test]
fn yank_then_put_linewise() {
	let mut f = Fixture::new("a\nb");
	f.ex("2y").ex("0put");
	assert_eq!(f.text(), "b\na\nb");
	assert_eq!(f.register('0'), Some(("b\n".to_string(), SelectionType::LineWise)));
}

#[test]
fn put_makes_charwise_text_a_line() {
	let mut f = Fixture::new("foo");
	f.keys("yiw").ex("put");
	assert_eq!(f.text(), "foo\nfoo");
	assert_eq!(f.caret(), 4);
}

#[test]
fn visual_range_is_prefilled() {
	assert_eq!(after("a\na\na", "Vj:s/a/b/<CR>"), "b\nb\na");
	assert_eq!(after("a\nb\nc", "Vj:d<CR>"), "c");
}

#[test]
fn set_forms() {
	let mut f = Fixture::new("");
	f.ex("set sw+=2");
	assert_eq!(f.session.options().shiftwidth, 6);
	f.ex("set noet");
	assert!(!f.session.options().expandtab);
	f.ex("set et!");
	assert!(f.session.options().expandtab);
	f.ex("set ww-=b");
	assert_eq!(f.session.options().whichwrap, "s");
	f.ex("set sw&");
	assert_eq!(f.session.options().shiftwidth, 4);
	f.ex("set et?");
	assert_eq!(f.editor.messages().last().map(|(_, text)| text.trim()), Some("expandtab"));
}

#[test]
fn set_rejects_unknown_options_and_bad_numbers() {
	let mut f = Fixture::new("");
	let err = f.editor.execute_command_line(&mut f.session, "set bogus").unwrap_err();
	assert!(err.to_string().contains("bogus"), "{err}");
	assert!(f.editor.execute_command_line(&mut f.session, "set sw=x").is_err());
	assert_eq!(f.session.options().shiftwidth, 4);
}

#[test]
fn script_variables_persist_between_lines() {
	let mut f = Fixture::new("");
	f.ex("let g:x = 21").ex("echo g:x * 2");
	assert_eq!(f.editor.messages().last(), Some(&(MessageKind::Echo, "42".to_string())));
}

#[test]
fn expressions_read_registers_and_positions() {
	let mut f = Fixture::new("one\ntwo");
	f.keys("\"ayyj");
	let session = &mut f.session;
	assert_eq!(f.editor.evaluate(session, "getreg('a')"), Ok(Value::string("one\n")));
	assert_eq!(f.editor.evaluate(session, "line('.')"), Ok(Value::Number(2)));
	assert_eq!(f.editor.evaluate(session, "col('$')"), Ok(Value::Number(4)));
	assert_eq!(f.editor.evaluate(session, "mode()"), Ok(Value::string("n")));
}

#[test]
fn option_assignment_from_script() {
	let mut f = Fixture::new("x");
	f.ex("let &shiftwidth = 2");
	f.keys(">>");
	assert_eq!(f.text(), "  x");
}

#[test]
fn listings_become_messages() {
	let mut f = Fixture::new("x");
	f.keys("\"ayyma");
	f.ex("registers a");
	assert!(f.editor.messages().iter().any(|(_, text)| text.contains("\"a")));
	f.ex("marks a");
	assert!(f.editor.messages().iter().any(|(_, text)| text.starts_with(" a ")));
}

#[test]
fn undo_and_redo_commands() {
	let mut f = Fixture::new("abc");
	f.keys("x").ex("undo");
	assert_eq!(f.text(), "abc");
	f.ex("redo");
	assert_eq!(f.text(), "bc");
}

#[test]
fn host_commands_are_delegated() {
	let mut f = Fixture::new("abc");
	f.ex("q!");
	assert_eq!(
		f.editor.host().host_commands,
		vec![HostCommand::Quit {
			all: false,
			force: true
		}]
	);
}

#[test]
fn errors_surface() {
	let mut f = Fixture::new("abc");
	let err = f.editor.execute_command_line(&mut f.session, "frobnicate").unwrap_err();
	assert!(err.to_string().starts_with("E492"), "{err}");
	let err = f.editor.execute_command_line(&mut f.session, "5d").unwrap_err();
	assert_eq!(err, EditorError::InvalidRange);
	let err = f.editor.execute_command_line(&mut f.session, "s/zzz/y/").unwrap_err();
	assert_eq!(err, EditorError::PatternNotFound("zzz".to_string()));
}
