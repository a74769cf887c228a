//! Visual, block and select mode.

use pretty_assertions::assert_eq;
use rstest::rstest;
use viper_engine::Options;
use viper_primitives::{Mode, SelectionType};
use viper_registers::Mark;

use crate::common::{Fixture, after};

#[test]
fn block_shift_indents_every_line() {
	let mut f = Fixture::new("a\nb\nc");
	f.keys("<C-V>jj>");
	assert_eq!(f.text(), "    a\n    b\n    c");
	assert_eq!(f.caret(), 4);
	assert_eq!(f.editor.mode(), Mode::Normal);
}

#[test]
fn block_shift_uses_tabs_without_expandtab() {
	let options = Options {
		shiftwidth: 8,
		expandtab: false,
		..Options::default()
	};
	let mut f = Fixture::with_options("a\nb", options.clone());
	f.keys("<C-V>j>");
	assert_eq!(f.text(), "\ta\n\tb");

	let mut f = Fixture::with_options("x  y\nz  w", options);
	f.keys("l<C-V>j>");
	assert_eq!(f.text(), "x\t   y\nz\t   w");
}

#[rstest]
#[case::charwise_delete("abc\ndef", "vjd", "ef")]
#[case::uppercase_word("hello world", "viwU", "HELLO world")]
#[case::reselect("hello world", "vly<Esc>gvd", "llo world")]
#[case::block_insert("ab\ncd", "<C-V>jIX<Esc>", "Xab\nXcd")]
#[case::block_append_to_line_end("ab\ncde", "<C-V>j$A!<Esc>", "ab!\ncde!")]
#[case::replace_selection("abc", "vlrx", "xxc")]
#[case::join_lines("a\nb\nc", "VjJ", "a b\nc")]
#[case::select_mode_typing("abc", "ghX<Esc>", "Xbc")]
#[case::put_over_selection("foo bar", "yiwwviwp", "foo foo")]
fn edits(#[case] text: &str, #[case] keys: &str, #[case] expected: &str) {
	assert_eq!(after(text, keys), expected);
}

#[test]
fn linewise_yank_returns_to_the_top() {
	let mut f = Fixture::new("abc\ndef");
	f.keys("jVky");
	assert_eq!(f.register('"'), Some(("abc\ndef\n".to_string(), SelectionType::LineWise)));
	assert_eq!(f.caret(), 0);
}

#[test]
fn leaving_visual_sets_angle_marks() {
	let mut f = Fixture::new("hello");
	f.keys("lvl<Esc>");
	let marks = f.editor.carets().primary().marks();
	assert_eq!(marks.get('<').ok(), Some(Mark::new(0, 1)));
	assert_eq!(marks.get('>').ok(), Some(Mark::new(0, 2)));
}

#[test]
fn visual_kinds_switch_and_toggle_off() {
	let mut f = Fixture::new("abc");
	f.keys("v");
	assert!(f.editor.mode().is_visual());
	f.keys("V");
	assert_eq!(f.editor.mode(), Mode::Visual(viper_primitives::VisualKind::Line));
	f.keys("V");
	assert_eq!(f.editor.mode(), Mode::Normal);
}

#[test]
fn dot_repeats_a_visual_delete_by_size() {
	let mut f = Fixture::new("abcdef");
	f.keys("vld.");
	assert_eq!(f.text(), "ef");
}
