use pretty_assertions::assert_eq;
use proptest::prelude::*;
use viper_primitives::{Key, SelectionType, parse_keys};

use crate::{CaretRegisters, ClipboardMode, Mark, MarkStore, Register, RegisterError, RegisterStore};

const CHAR: SelectionType = SelectionType::CharacterWise;
const LINE: SelectionType = SelectionType::LineWise;

fn text(store: &RegisterStore, name: char) -> Option<String> {
	store.get_register(name).map(|r| r.text)
}

#[test]
fn yank_fills_zero_and_unnamed() {
	let mut store = RegisterStore::new();
	assert!(store.store_text(None, "The ", CHAR, false));
	assert_eq!(text(&store, '"').as_deref(), Some("The "));
	assert_eq!(text(&store, '0').as_deref(), Some("The "));
	assert_eq!(text(&store, '1'), None);
	assert_eq!(text(&store, '-'), None);
}

#[test]
fn small_delete_goes_to_minus() {
	let mut store = RegisterStore::new();
	store.store_text(None, "word", CHAR, true);
	assert_eq!(text(&store, '-').as_deref(), Some("word"));
	assert_eq!(text(&store, '"').as_deref(), Some("word"));
	assert_eq!(text(&store, '1'), None);
}

#[test]
fn line_deletes_shift_the_ring() {
	let mut store = RegisterStore::new();
	store.store_text(None, "one\n", LINE, true);
	store.store_text(None, "two\nthree", CHAR, true);
	assert_eq!(text(&store, '1').as_deref(), Some("two\nthree"));
	assert_eq!(text(&store, '2').as_deref(), Some("one\n"));
	assert_eq!(store.get_register('2').map(|r| r.kind), Some(LINE));
}

#[test]
fn named_register_skips_the_ring() {
	let mut store = RegisterStore::new();
	store.store_text(None, "old\n", LINE, true);
	store.store_text(Some('a'), "new\n", LINE, true);
	assert_eq!(text(&store, 'a').as_deref(), Some("new\n"));
	assert_eq!(text(&store, '"').as_deref(), Some("new\n"));
	assert_eq!(text(&store, '1').as_deref(), Some("old\n"));
	assert_eq!(text(&store, '2'), None);
}

#[test]
fn uppercase_appends() {
	let mut store = RegisterStore::new();
	store.store_text(Some('a'), "foo", CHAR, false);
	store.store_text(Some('A'), "bar", CHAR, false);
	assert_eq!(text(&store, 'a').as_deref(), Some("foobar"));
	store.store_text(Some('A'), "line\n", LINE, false);
	let reg = store.get_register('a').unwrap();
	assert_eq!((reg.text.as_str(), reg.kind), ("foobar\nline\n", LINE));
}

#[test]
fn black_hole_leaves_everything_alone() {
	let mut store = RegisterStore::new();
	store.store_text(None, "keep", CHAR, false);
	assert!(store.store_text(Some('_'), "gone", CHAR, true));
	assert_eq!(text(&store, '"').as_deref(), Some("keep"));
	assert_eq!(text(&store, '_'), None);
}

#[test]
fn invalid_and_read_only_names_fail() {
	let mut store = RegisterStore::new();
	assert!(!store.store_text(Some('!'), "x", CHAR, false));
	assert!(!store.store_text(Some('.'), "x", CHAR, false));
	assert!(!store.store_text(Some(':'), "x", CHAR, false));
	assert_eq!(text(&store, '"'), None);
	assert_eq!(store.check_writable('/'), Err(RegisterError::ReadOnly('/')));
}

#[test]
fn save_register_may_set_search_but_not_insert() {
	let mut store = RegisterStore::new();
	store.save_register('/', Register::new('/', "foo", CHAR)).unwrap();
	assert_eq!(text(&store, '/').as_deref(), Some("foo"));
	assert_eq!(
		store.save_register('.', Register::new('.', "x", CHAR)),
		Err(RegisterError::ReadOnly('.'))
	);
	store.set_last_inserted("typed");
	assert_eq!(text(&store, '.').as_deref(), Some("typed"));
}

#[test]
fn clipboard_registers_and_unnamed_mode() {
	let mut store = RegisterStore::new();
	store.store_text(Some('+'), "clip", CHAR, false);
	let reg = store.get_register('+').unwrap();
	assert!(reg.is_clipboard);
	assert_eq!(reg.text, "clip");
	assert_eq!(text(&store, '0'), None);

	store.set_clipboard_mode(ClipboardMode::Unnamed);
	store.store_text(None, "both", CHAR, false);
	assert_eq!(text(&store, '*').as_deref(), Some("both"));
	assert_eq!(text(&store, '"').as_deref(), Some("both"));
}

#[test]
fn recorded_keys_replay() {
	let mut store = RegisterStore::new();
	store.start_recording('q').unwrap();
	for key in parse_keys("ihi<Esc>") {
		store.record_key(key);
	}
	assert_eq!(store.finish_recording(), Some('q'));
	assert_eq!(text(&store, 'q').as_deref(), Some("ihi\u{1b}"));
	assert_eq!(store.macro_keys('q').unwrap(), parse_keys("ihi<Esc>"));
	assert_eq!(store.macro_keys('@').unwrap(), parse_keys("ihi<Esc>"));
}

#[test]
fn special_keys_survive_recording() {
	let mut store = RegisterStore::new();
	let keys = parse_keys("<Left>x");
	assert!(store.set_keys('w', &keys));
	assert_eq!(store.get_keys('w'), Some(keys));
	assert_eq!(store.get_register('w').unwrap().display_text(), "<Left>x");
}

#[test]
fn text_registers_play_as_keys() {
	let mut store = RegisterStore::new();
	store.store_text(Some('a'), "dd", CHAR, false);
	assert_eq!(store.macro_keys('a').unwrap(), vec![Key::char('d'), Key::char('d')]);
	store.set_last_command("s/a/b/");
	assert_eq!(store.macro_keys(':').unwrap(), parse_keys(":s/a/b/<CR>"));
	assert_eq!(store.macro_keys('z'), Err(RegisterError::Empty('z')));
}

#[test]
fn play_without_history_fails() {
	let mut store = RegisterStore::new();
	assert_eq!(store.macro_keys('@'), Err(RegisterError::Empty('@')));
}

#[test]
fn list_follows_vim_order() {
	let mut store = RegisterStore::new();
	store.store_text(Some('b'), "b", CHAR, false);
	store.store_text(None, "y", CHAR, false);
	store.set_last_search("pat");
	let names: String = store.list().iter().map(|r| r.name).collect();
	assert_eq!(names, "\"0b/");
}

#[test]
fn secondary_carets_keep_their_own_text() {
	let mut store = RegisterStore::new();
	let mut secondary = CaretRegisters::new();
	let mut primary = CaretRegisters::new();
	primary.store_text(&mut store, true, None, "main", CHAR, false);
	assert_eq!(secondary.get_register(&store, false, '"').map(|r| r.text).as_deref(), Some("main"));

	secondary.store_text(&mut store, false, None, "other", CHAR, false);
	assert_eq!(secondary.get_register(&store, false, '"').map(|r| r.text).as_deref(), Some("other"));
	assert_eq!(secondary.get_register(&store, false, '0').map(|r| r.text).as_deref(), Some("other"));
	assert_eq!(text(&store, '"').as_deref(), Some("main"));

	secondary.store_text(&mut store, false, Some('+'), "clip", CHAR, false);
	assert_eq!(text(&store, '+').as_deref(), Some("clip"));
}

#[test]
fn marks_follow_line_edits() {
	let mut marks = MarkStore::new();
	marks.set('a', Mark::new(2, 3)).unwrap();
	marks.set('b', Mark::new(5, 0)).unwrap();
	marks.set('[', Mark::new(3, 1)).unwrap();
	marks.lines_deleted(2, 2);
	assert_eq!(marks.get('a'), Err(RegisterError::MarkNotSet('a')));
	assert_eq!(marks.get('b'), Ok(Mark::new(3, 0)));
	assert_eq!(marks.get('['), Ok(Mark::new(2, 0)));
	marks.lines_inserted(0, 1);
	assert_eq!(marks.get('b'), Ok(Mark::new(4, 0)));
}

#[test]
fn backtick_is_the_jump_mark() {
	let mut marks = MarkStore::new();
	marks.set('`', Mark::new(1, 1)).unwrap();
	assert_eq!(marks.get('\''), Ok(Mark::new(1, 1)));
	assert_eq!(marks.set('1', Mark::new(0, 0)), Err(RegisterError::InvalidMark('1')));
	assert_eq!(marks.list(), vec![('\'', Mark::new(1, 1))]);
}

proptest! {
	#[test]
	fn ring_keeps_the_last_nine_deletes(texts in prop::collection::vec("[a-z]{1,5}", 1..15)) {
		let mut store = RegisterStore::new();
		for t in &texts {
			store.store_text(None, &format!("{t}\n"), LINE, true);
		}
		for (n, t) in texts.iter().rev().take(9).enumerate() {
			let name = char::from(b'1' + n as u8);
			prop_assert_eq!(text(&store, name), Some(format!("{t}\n")));
		}
		if texts.len() < 9 {
			let name = char::from(b'1' + texts.len() as u8);
			prop_assert_eq!(text(&store, name), None);
		}
	}
}
