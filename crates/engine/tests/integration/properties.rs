//! Properties that hold for any buffer.

use proptest::prelude::*;
use viper_engine::EditorHost;
use viper_primitives::Mode;

use crate::common::Fixture;

/// Commands whose `.` must do exactly what typing them again does.
const REPEATABLE: &[&str] = &["x", "dw", "dd", "~", "J", ">>", "<<", "ciwZ<Esc>", "Ax<Esc>", "Ox<Esc>", "rq", "guu", "3x", "\\r"];

fn buffer() -> impl Strategy<Value = String> {
	"[a-z ]{0,8}(\n[ a-z]{0,8}){0,3}"
}

proptest! {
	#[test]
	fn dot_repeats_like_typing_again(text in buffer(), command in proptest::sample::select(REPEATABLE), line in 0usize..4) {
		let down = "j".repeat(line);
		let mut typed = Fixture::new(&text);
		typed.keys(&format!("{down}{command}{command}"));
		let mut repeated = Fixture::new(&text);
		repeated.keys(&format!("{down}{command}."));
		prop_assert_eq!(repeated.text(), typed.text());
		prop_assert_eq!(repeated.caret(), typed.caret());
	}

	#[test]
	fn move_caret_accepts_exactly_the_buffer(text in buffer(), offset in 0usize..48) {
		let mut f = Fixture::new(&text);
		let len = f.editor.host().len_chars();
		prop_assert_eq!(f.editor.move_caret(offset), offset <= len);
		if offset <= len {
			prop_assert_eq!(f.caret(), offset);
		}
	}

	#[test]
	fn escape_leaves_no_residue(text in buffer(), prefix in proptest::sample::select(&["d", "2c", "\"a", "g", "f", "v", "vi", "<C-V>j", "i", "R", ":", "/", "gh", "ci"][..])) {
		let mut f = Fixture::new(&text);
		f.keys(&format!("{prefix}<Esc><Esc><Esc>"));
		prop_assert_eq!(f.editor.mode(), Mode::Normal);
		prop_assert_eq!(f.editor.pending_count(), None);
		prop_assert_eq!(f.editor.pending_register(), None);
		prop_assert_eq!(f.text(), text);
	}
}
