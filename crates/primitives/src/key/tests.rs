use super::*;

#[test]
fn plain_characters() {
	assert_eq!(parse_keys("d2w"), vec![Key::char('d'), Key::char('2'), Key::char('w')]);
}

#[test]
fn special_keys_are_case_insensitive() {
	assert_eq!(parse_keys("<esc><CR><Bs>"), vec![Key::ESC, Key::ENTER, Key::BACKSPACE]);
}

#[test]
fn ctrl_chord_is_normalized_to_lowercase() {
	assert_eq!(parse_keys("<C-V>"), vec![Key::ctrl('v')]);
	assert_eq!(parse_keys("<c-v>"), vec![Key::ctrl('v')]);
	assert!(Key::ctrl('V').is_ctrl('v'));
}

#[test]
fn shift_folds_into_characters() {
	assert_eq!(parse_keys("<S-a>"), vec![Key::char('A')]);
	let shifted_left = parse_keys("<S-Left>");
	assert_eq!(shifted_left[0].code, KeyCode::Left);
	assert!(shifted_left[0].modifiers.shift);
}

#[test]
fn unterminated_angle_is_literal() {
	assert_eq!(parse_keys("<I<>"), vec![Key::char('<'), Key::char('I'), Key::char('<'), Key::char('>')]);
	assert_eq!(parse_keys("a<b"), vec![Key::char('a'), Key::char('<'), Key::char('b')]);
}

#[test]
fn lt_and_space_names() {
	assert_eq!(parse_keys("<lt><Space>"), vec![Key::char('<'), Key::char(' ')]);
}

#[test]
fn display_round_trips_notation() {
	let keys = parse_keys("i<C-T>x<Esc><lt>");
	assert_eq!(keys_to_string(&keys), "i<C-T>x<Esc><lt>");
}

#[test]
fn single_key_from_str() {
	assert_eq!("<Esc>".parse::<Key>(), Ok(Key::ESC));
	assert_eq!("".parse::<Key>(), Err(KeyParseError::Empty));
	assert!(matches!("ab".parse::<Key>(), Err(KeyParseError::Multiple { count: 2, .. })));
}

#[test]
fn escape_aliases() {
	assert!(Key::ctrl('[').is_escape());
	assert!(Key::ctrl('m').is_enter());
	assert!(Key::ctrl('h').is_backspace());
}

#[test]
fn function_keys() {
	assert_eq!(parse_keys("<F5>")[0].code, KeyCode::F(5));
	assert_eq!(parse_keys("<F13>").len(), 5);
}

#[test]
fn raw_chars_for_recorded_keys() {
	let keys = parse_keys("ix<C-W><Esc><CR>");
	let raw: String = keys.iter().filter_map(Key::to_raw_char).collect();
	assert_eq!(raw, "ix\x17\x1b\r");
	let back: Vec<Key> = raw.chars().map(Key::from_raw_char).collect();
	assert_eq!(back, keys);
	assert_eq!(Key::new(KeyCode::Left).to_raw_char(), None);
}
