//! Insert and replace mode.

use pretty_assertions::assert_eq;
use rstest::rstest;
use viper_primitives::Mode;

use crate::common::{Fixture, after};

#[test]
fn escape_steps_back_and_records_the_text() {
	let mut f = Fixture::new("world");
	f.keys("ihello <Esc>");
	assert_eq!(f.text(), "hello world");
	assert_eq!(f.caret(), 5);
	assert_eq!(f.editor.mode(), Mode::Normal);
	assert_eq!(f.register_text('.'), Some("hello ".to_string()));
}

#[rstest]
#[case::counted_insert("", "3ia<Esc>", "aaa")]
#[case::open_below("a\nb", "ofoo<Esc>", "a\nfoo\nb")]
#[case::open_above("a", "Ofoo<Esc>", "foo\na")]
#[case::counted_open("a", "2ox<Esc>", "a\nx\nx")]
#[case::backspace("", "iab<BS>c<Esc>", "ac")]
#[case::delete_word_before("", "Afoo bar<C-W><Esc>", "foo ")]
#[case::shift_line_right("x", "i<C-T><Esc>", "    x")]
#[case::shift_line_left("        x", "A<C-D><Esc>", "    x")]
#[case::overwrite("abc", "Rxy<Esc>", "xyc")]
#[case::overwrite_backspace_restores("abc", "Rxy<BS><BS><Esc>", "abc")]
#[case::overwrite_past_the_end("ab", "Rxyz w<Esc>", "xyz w")]
#[case::insert_register("foo", "\"ayiwA <C-R>a<Esc>", "foo foo")]
#[case::append_at_line_end("a\nb", "Ax<Esc>j.", "ax\nbx")]
fn edits(#[case] text: &str, #[case] keys: &str, #[case] expected: &str) {
	assert_eq!(after(text, keys), expected);
}

#[test]
fn escape_stays_at_line_start() {
	let mut f = Fixture::new("a\nb");
	f.keys("ji<Esc>");
	assert_eq!(f.caret(), 2);
}

#[test]
fn tab_expands_to_spaces() {
	let text = after("", "i<Tab>x<Esc>");
	assert!(!text.contains('\t'), "{text:?}");
	assert_eq!(text.trim(), "x");
}

#[test]
fn every_caret_inserts() {
	let mut f = Fixture::new("ab\ncd");
	assert!(f.editor.add_caret(3));
	f.keys("iX<Esc>");
	assert_eq!(f.text(), "Xab\nXcd");
}

#[test]
fn insert_is_one_undo_step() {
	assert_eq!(after("abc", "ione<CR>two<Esc>u"), "abc");
}
