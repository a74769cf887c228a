//! Register behaviour through normal-mode commands.

use pretty_assertions::assert_eq;
use viper_engine::Options;
use viper_primitives::SelectionType;

use crate::common::Fixture;

#[test]
fn line_deletes_shift_the_numbered_registers() {
	let mut f = Fixture::new("1\n2\n3");
	f.keys("dddd");
	assert_eq!(f.register('1'), Some(("2\n".to_string(), SelectionType::LineWise)));
	assert_eq!(f.register('2'), Some(("1\n".to_string(), SelectionType::LineWise)));
	assert_eq!(f.text(), "3");
}

#[test]
fn small_deletes_go_to_the_minus_register() {
	let mut f = Fixture::new("abc");
	f.keys("x");
	assert_eq!(f.register_text('-'), Some("a".to_string()));
	assert_eq!(f.register('1'), None);
	assert_eq!(f.register_text('"'), Some("a".to_string()));
}

#[test]
fn uppercase_appends() {
	let mut f = Fixture::new("foo bar");
	f.keys("\"ayww\"Ayw");
	assert_eq!(f.register_text('a'), Some("foo bar".to_string()));
}

#[test]
fn black_hole_keeps_the_unnamed_register() {
	let mut f = Fixture::new("a\nb");
	f.keys("\"_dd");
	assert_eq!(f.text(), "b");
	assert_eq!(f.register('"'), None);
}

#[test]
fn repeating_a_numbered_put_steps_back_in_history() {
	let mut f = Fixture::new("a\nb\nc\nd");
	f.keys("dddddd");
	assert_eq!(f.text(), "d");
	f.keys("\"1p..");
	assert_eq!(f.text(), "d\nc\nb\na");
}

#[test]
fn read_only_register_refuses_yank() {
	let mut f = Fixture::new("abc");
	f.keys("\".yy");
	assert_eq!(f.editor.host().beeps, 1);
	assert_eq!(f.register('"'), None);
}

#[test]
fn clipboard_option_mirrors_the_unnamed_register() {
	let options = Options {
		clipboard: "unnamedplus".to_string(),
		..Options::default()
	};
	let mut f = Fixture::with_options("x", options);
	f.keys("yy");
	assert_eq!(f.register('+'), Some(("x\n".to_string(), SelectionType::LineWise)));
}

#[test]
fn recorded_macro_replays() {
	let mut f = Fixture::new("abcd");
	f.keys("qaxq");
	assert_eq!(f.register_text('a'), Some("x".to_string()));
	f.keys("2@a");
	assert_eq!(f.text(), "d");
	f.keys("u");
	assert_eq!(f.text(), "bcd");
}

#[test]
fn put_from_an_empty_register_fails() {
	let mut f = Fixture::new("abc");
	f.keys("\"zp");
	assert_eq!(f.text(), "abc");
	let (_, message) = f.editor.messages().last().cloned().unwrap();
	assert!(message.starts_with("E353"), "{message}");
}
