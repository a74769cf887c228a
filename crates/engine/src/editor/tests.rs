//! Key sequences against an in-memory buffer.

use pretty_assertions::assert_eq;
use rstest::rstest;
use viper_primitives::{Mode, SelectionType};
use viper_script::{MessageKind, Value};

use super::Editor;
use crate::host::{EditorHost, MemoryBuffer};
use crate::session::Session;

fn editor(text: &str) -> (Editor<MemoryBuffer>, Session) {
	(Editor::new(MemoryBuffer::new(text)), Session::default())
}

fn run(text: &str, keys: &str) -> (Editor<MemoryBuffer>, Session) {
	let (mut ed, mut session) = editor(text);
	ed.feed(&mut session, keys);
	(ed, session)
}

fn register(session: &Session, name: char) -> Option<(String, SelectionType)> {
	session.registers.get_register(name).map(|r| (r.text, r.kind))
}

#[test]
fn delete_word_fills_the_unnamed_register() {
	let (ed, session) = run("The quick\nbrown fox\n", "dw");
	assert_eq!(ed.host().contents(), "quick\nbrown fox\n");
	assert_eq!(register(&session, '"'), Some(("The ".to_string(), SelectionType::CharacterWise)));
	assert_eq!(ed.mode(), Mode::Normal);
}

#[test]
fn yank_line_and_put_below() {
	let (ed, session) = run("Hello\nworld", "yyp");
	assert_eq!(ed.host().contents(), "Hello\nHello\nworld");
	assert_eq!(ed.caret(), 6);
	assert_eq!(register(&session, '0'), Some(("Hello\n".to_string(), SelectionType::LineWise)));
}

#[rstest]
#[case("abcdef", "3x", "def")]
#[case("abcdef", "3xu", "abcdef")]
#[case("abc", "ihello<Esc>u", "abc")]
#[case("one two three", "dw.", "three")]
#[case("a\nb", "Ax<Esc>j.", "ax\nbx")]
#[case("a\nb\nc", "qaA!<Esc>jq@a", "a!\nb!\nc")]
#[case("abcd", "vld", "cd")]
#[case("a\nb\nc", "Vj:d<CR>", "c")]
fn edits(#[case] text: &str, #[case] keys: &str, #[case] expected: &str) {
	let (ed, _) = run(text, keys);
	assert_eq!(ed.host().contents(), expected, "{keys}");
}

#[test]
fn insert_records_the_typed_text() {
	let (ed, session) = run("world", "ihello <Esc>");
	assert_eq!(ed.host().contents(), "hello world");
	assert_eq!(ed.caret(), 5);
	assert_eq!(ed.mode(), Mode::Normal);
	assert_eq!(register(&session, '.').map(|(text, _)| text), Some("hello ".to_string()));
}

#[test]
fn failed_motion_beeps_and_changes_nothing() {
	let (ed, session) = run("abc", "dfz");
	assert_eq!(ed.host().contents(), "abc");
	assert_eq!(ed.host().beeps, 1);
	assert!(ed.messages().is_empty());
	assert_eq!(register(&session, '"'), None);
	assert_eq!(ed.mode(), Mode::Normal);
}

#[test]
fn incsearch_previews_and_escape_restores() {
	let (mut ed, mut session) = editor("the quick fox");
	ed.feed(&mut session, "/fox");
	assert!(matches!(ed.mode(), Mode::CommandLine(_)));
	assert_eq!(ed.caret(), 10);
	ed.feed(&mut session, "<Esc>");
	assert_eq!(ed.mode(), Mode::Normal);
	assert_eq!(ed.caret(), 0);
	ed.feed(&mut session, "/fox<CR>");
	assert_eq!(ed.caret(), 10);
	assert_eq!(session.last_search().map(|last| last.pattern.as_str()), Some("fox"));
}

#[test]
fn substitute_over_the_whole_buffer() {
	let (mut ed, mut session) = editor("foo\nboo");
	ed.execute_command_line(&mut session, "%s/o/0/g").unwrap();
	assert_eq!(ed.host().contents(), "f00\nb00");
	assert_eq!(register(&session, ':').map(|(text, _)| text), Some("%s/o/0/g".to_string()));
	assert_eq!(register(&session, '/').map(|(text, _)| text), Some("o".to_string()));
}

#[test]
fn substitute_leaves_the_caret_on_the_last_changed_line() {
	let (mut ed, mut session) = editor("foo\nboo\nx");
	ed.execute_command_line(&mut session, "%s/o/0/g").unwrap();
	assert_eq!(ed.caret(), 4);
	ed.feed(&mut session, "'[");
	assert_eq!(ed.caret(), 0);
}

#[test]
fn substitute_without_a_match_fails_unless_quiet() {
	let (mut ed, mut session) = editor("abc");
	assert!(ed.execute_command_line(&mut session, "s/x/y/").is_err());
	ed.execute_command_line(&mut session, "s/x/y/e").unwrap();
	assert_eq!(ed.host().contents(), "abc");
}

#[test]
fn ex_delete_fills_the_register_linewise() {
	let (mut ed, mut session) = editor("1\n2\n3\n4");
	ed.execute_command_line(&mut session, ":2,3d").unwrap();
	assert_eq!(ed.host().contents(), "1\n4");
	assert_eq!(register(&session, '"'), Some(("2\n3\n".to_string(), SelectionType::LineWise)));
}

#[test]
fn set_changes_the_shift_width() {
	let (mut ed, mut session) = editor("x");
	ed.execute_command_line(&mut session, "set sw=2").unwrap();
	ed.feed(&mut session, ">>");
	assert_eq!(ed.host().contents(), "  x");
	assert_eq!(session.options().shiftwidth, 2);
}

#[test]
fn normal_runs_on_every_line_of_the_range() {
	let (mut ed, mut session) = editor("a\nb");
	ed.execute_command_line(&mut session, "%normal Ax").unwrap();
	assert_eq!(ed.host().contents(), "ax\nbx");
	assert_eq!(ed.mode(), Mode::Normal);
}

#[test]
fn let_register_then_put() {
	let (mut ed, mut session) = editor("x");
	ed.execute_command_line(&mut session, "let @a = 'hi'").unwrap();
	ed.feed(&mut session, "\"ap");
	assert_eq!(ed.host().contents(), "xhi");
}

#[test]
fn expressions_see_the_buffer_and_options() {
	let (mut ed, mut session) = editor("one\ntwo\nthree");
	ed.feed(&mut session, "j");
	assert_eq!(ed.evaluate(&mut session, "line('$')"), Ok(Value::Number(3)));
	assert_eq!(ed.evaluate(&mut session, "line('.')"), Ok(Value::Number(2)));
	assert_eq!(ed.evaluate(&mut session, "&shiftwidth"), Ok(Value::Number(4)));
	assert_eq!(ed.evaluate(&mut session, "getline(3)"), Ok(Value::string("three")));
}

#[test]
fn unknown_command_is_reported() {
	let (ed, _) = run("abc", ":frobnicate<CR>");
	let (kind, text) = ed.messages().last().cloned().unwrap();
	assert_eq!(kind, MessageKind::Error);
	assert!(text.starts_with("E492"), "{text}");
	assert_eq!(ed.host().contents(), "abc");
}

#[test]
fn host_commands_reach_the_host() {
	let (mut ed, mut session) = editor("abc");
	ed.execute_command_line(&mut session, "w").unwrap();
	assert_eq!(ed.host().host_commands.len(), 1);
	assert_eq!(ed.host().len_chars(), 3);
}
