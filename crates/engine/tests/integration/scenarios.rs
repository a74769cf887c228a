//! Normal-mode commands end to end.

use pretty_assertions::assert_eq;
use rstest::rstest;
use viper_primitives::{Mode, SelectionType};

use crate::common::{Fixture, after};

#[test]
fn delete_word_at_buffer_start() {
	let mut f = Fixture::new("The quick\nbrown fox\n");
	f.keys("dw");
	assert_eq!(f.text(), "quick\nbrown fox\n");
	assert_eq!(f.register('"'), Some(("The ".to_string(), SelectionType::CharacterWise)));
	assert_eq!(f.caret(), 0);
}

#[test]
fn yank_line_and_put_it_below() {
	let mut f = Fixture::new("Hello\nworld");
	f.keys("yyp");
	assert_eq!(f.text(), "Hello\nHello\nworld");
	assert_eq!(f.caret(), 6);
}

#[rstest]
#[case::change_word("hello world", "cwbye<Esc>", "bye world")]
#[case::change_in_parens("f(abc)", "3lci(x<Esc>", "f(x)")]
#[case::delete_last_line("a\nb", "jdd", "a")]
#[case::counts_multiply("a b c d e f g", "2d3w", "g")]
#[case::join("a\n  b", "J", "a b")]
#[case::join_without_spaces("a\n  b", "gJ", "a  b")]
#[case::toggle_case("abc", "~", "Abc")]
#[case::increment("x 7", "<C-A>", "x 8")]
#[case::decrement_by_count("x 7", "5<C-X>", "x 2")]
#[case::replace_char("abc", "rx", "xbc")]
#[case::replace_with_count("abc", "3rx", "xxx")]
#[case::delete_to_first_line("one\ntwo\nthree", "Gdgg", "")]
#[case::delete_to_mark("a\nb\nc", "majd'a", "c")]
#[case::undo_then_redo("abc", "xxu<C-R>", "c")]
#[case::repeat_find("a-b-c-d", "f-;;x", "a-b-cd")]
#[case::uppercase_word("foo bar", "gUiw", "FOO bar")]
#[case::shift_right_twice("x", ">>.", "        x")]
#[case::reverse_line("abc\nx", "\\r", "cba\nx")]
#[case::reverse_line_repeated("abc\nx", "\\r.", "abc\nx")]
#[case::reverse_line_then_undo("ab cd\n", "\\ru", "ab cd\n")]
fn edits(#[case] text: &str, #[case] keys: &str, #[case] expected: &str) {
	assert_eq!(after(text, keys), expected);
}

#[test]
fn toggle_case_moves_right() {
	let mut f = Fixture::new("abc");
	f.keys("~");
	assert_eq!(f.caret(), 1);
}

#[test]
fn reverse_line_keeps_the_caret() {
	let mut f = Fixture::new("one\ntwo");
	f.keys("jl\\r");
	assert_eq!(f.text(), "one\nowt");
	assert_eq!(f.caret(), 5);
}

#[test]
fn line_end_column_sticks_across_vertical_moves() {
	let mut f = Fixture::new("abc\ndefgh\nxy");
	f.keys("$j");
	assert_eq!(f.caret(), 8);
	f.keys("k");
	assert_eq!(f.caret(), 2);

	let mut f = Fixture::new("abc\nd\nefgh");
	f.keys("$jj");
	assert_eq!(f.caret(), 9);
}

#[test]
fn search_wraps_around() {
	let mut f = Fixture::new("foo bar foo");
	f.keys("/foo<CR>");
	assert_eq!(f.caret(), 8);
	f.keys("n");
	assert_eq!(f.caret(), 0);
	f.keys("N");
	assert_eq!(f.caret(), 8);
}

#[test]
fn matching_bracket() {
	let mut f = Fixture::new("(a)");
	f.keys("%");
	assert_eq!(f.caret(), 2);
}

#[test]
fn each_caret_edits_its_own_text() {
	let mut f = Fixture::new("abc def");
	assert!(f.editor.add_caret(4));
	f.keys("x");
	assert_eq!(f.text(), "bc ef");
	assert_eq!(f.editor.carets().len(), 2);
}

#[test]
fn escape_abandons_a_pending_operator() {
	let mut f = Fixture::new("abc");
	f.keys("2d<Esc>x");
	assert_eq!(f.text(), "bc");
	assert_eq!(f.editor.mode(), Mode::Normal);
	assert_eq!(f.editor.pending_count(), None);
}

#[test]
fn pending_state_is_visible() {
	let mut f = Fixture::new("abc");
	f.keys("\"a3d");
	assert_eq!(f.editor.pending_register(), Some('a'));
	assert_eq!(f.editor.pending_count(), Some(3));
	assert!(matches!(f.editor.mode(), Mode::OperatorPending(_)));
}

#[test]
fn undo_past_the_oldest_change_says_so() {
	let mut f = Fixture::new("abc");
	f.keys("u");
	assert_eq!(f.editor.host().beeps, 1);
	assert!(f.editor.messages().iter().any(|(_, text)| text.contains("oldest")));
}
