use ropey::Rope;

use super::*;

#[test]
fn ascii_boundaries_are_every_char() {
	let text = Rope::from("abc");
	let slice = text.slice(..);
	assert!((0..=3).all(|i| is_grapheme_boundary(slice, i)));
	assert_eq!(next_grapheme_boundary(slice, 0), 1);
	assert_eq!(prev_grapheme_boundary(slice, 3), 2);
}

#[test]
fn combining_mark_stays_with_base() {
	let text = Rope::from("ae\u{301}b");
	let slice = text.slice(..);
	assert!(!is_grapheme_boundary(slice, 2));
	assert_eq!(next_grapheme_boundary(slice, 1), 3);
	assert_eq!(prev_grapheme_boundary(slice, 3), 1);
}

#[test]
fn crlf_is_one_cluster() {
	let text = Rope::from("a\r\nb");
	let slice = text.slice(..);
	assert!(!is_grapheme_boundary(slice, 2));
	assert_eq!(next_grapheme_boundary(slice, 1), 3);
}

#[test]
fn boundaries_clamp_at_ends() {
	let text = Rope::from("ab");
	let slice = text.slice(..);
	assert_eq!(next_grapheme_boundary(slice, 2), 2);
	assert_eq!(next_grapheme_boundary(slice, 10), 2);
	assert_eq!(prev_grapheme_boundary(slice, 0), 0);
}

#[test]
fn snapping_helpers() {
	let text = Rope::from("ae\u{301}b");
	let slice = text.slice(..);
	assert_eq!(ensure_grapheme_boundary_next(slice, 2), 3);
	assert_eq!(ensure_grapheme_boundary_prev(slice, 2), 1);
	assert_eq!(ensure_grapheme_boundary_prev(slice, 3), 3);
}
