//! Key sequence to command resolution.

use pretty_assertions::assert_eq;
use rstest::rstest;
use viper_primitives::{Key, Mode, Operator, VisualKind, parse_keys};

use super::InputHandler;
use crate::types::{Action, Command, InsertEntry, KeyResult, Motion, OperatorTarget, WordType};

fn feed(handler: &mut InputHandler, keys: &str) -> KeyResult {
	let mut last = KeyResult::Pending;
	for key in parse_keys(keys) {
		last = handler.handle_key(key);
	}
	last
}

fn command(keys: &str) -> Command {
	let mut handler = InputHandler::new();
	match feed(&mut handler, keys) {
		KeyResult::Command(cmd) => cmd,
		other => panic!("{keys}: expected a command, got {other:?}"),
	}
}

fn operate(operator: Operator, target: OperatorTarget, motion_count: Option<usize>) -> Action {
	Action::Operate {
		operator,
		target,
		motion_count,
	}
}

#[test]
fn digit_count_accumulates() {
	let mut h = InputHandler::new();
	h.handle_key(Key::char('2'));
	h.handle_key(Key::char('3'));
	assert_eq!(h.count(), 23);
}

#[test]
fn count_resets_on_mode_change() {
	let mut h = InputHandler::new();
	h.handle_key(Key::char('5'));
	h.set_mode(Mode::Normal);
	assert_eq!(h.count(), 0);
	assert!(!h.has_pending_input());
}

#[test]
fn zero_is_a_motion_without_count() {
	assert_eq!(command("0").action, Action::Move(Motion::LineStart));
	assert_eq!(command("10l").count, Some(10));
}

#[test]
fn huge_counts_saturate() {
	let cmd = command("99999999999j");
	assert_eq!(cmd.count, Some(crate::MAX_COUNT));
}

#[rstest]
#[case("dw", Operator::Delete, OperatorTarget::Motion(Motion::WordForward(WordType::Word)))]
#[case("dd", Operator::Delete, OperatorTarget::Lines)]
#[case("cc", Operator::Change, OperatorTarget::Lines)]
#[case(">>", Operator::ShiftRight, OperatorTarget::Lines)]
#[case("<lt><lt>", Operator::ShiftLeft, OperatorTarget::Lines)]
#[case("g~~", Operator::ToggleCase, OperatorTarget::Lines)]
#[case("g~g~", Operator::ToggleCase, OperatorTarget::Lines)]
#[case("gUU", Operator::Uppercase, OperatorTarget::Lines)]
#[case("guu", Operator::Lowercase, OperatorTarget::Lines)]
#[case("yG", Operator::Yank, OperatorTarget::Motion(Motion::LastLine))]
#[case(">W", Operator::ShiftRight, OperatorTarget::Motion(Motion::WordForward(WordType::BigWord)))]
#[case("dgg", Operator::Delete, OperatorTarget::Motion(Motion::FirstLine))]
fn operator_targets(#[case] keys: &str, #[case] operator: Operator, #[case] target: OperatorTarget) {
	assert_eq!(command(keys).action, operate(operator, target, None));
}

#[rstest]
#[case("x", Operator::Delete, OperatorTarget::Motion(Motion::Right))]
#[case("X", Operator::Delete, OperatorTarget::Motion(Motion::Left))]
#[case("<Del>", Operator::Delete, OperatorTarget::Motion(Motion::Right))]
#[case("D", Operator::Delete, OperatorTarget::Motion(Motion::LineEnd))]
#[case("C", Operator::Change, OperatorTarget::Motion(Motion::LineEnd))]
#[case("s", Operator::Change, OperatorTarget::Motion(Motion::Right))]
#[case("S", Operator::Change, OperatorTarget::Lines)]
#[case("Y", Operator::Yank, OperatorTarget::Lines)]
fn operator_aliases(#[case] keys: &str, #[case] operator: Operator, #[case] target: OperatorTarget) {
	assert_eq!(command(keys).action, operate(operator, target, None));
}

#[test]
fn counts_on_both_sides_of_an_operator() {
	let cmd = command("2d3w");
	assert_eq!(cmd.count, Some(2));
	assert_eq!(
		cmd.action,
		operate(Operator::Delete, OperatorTarget::Motion(Motion::WordForward(WordType::Word)), Some(3))
	);
}

#[test]
fn register_prefix_in_either_order() {
	let a = command("\"a3yy");
	let b = command("3\"ayy");
	assert_eq!(a, b);
	assert_eq!(a.register, Some('a'));
	assert_eq!(a.count, Some(3));
}

#[test]
fn operator_pending_mode_is_entered_and_left() {
	let mut h = InputHandler::new();
	assert_eq!(feed(&mut h, "d"), KeyResult::Pending);
	assert_eq!(h.mode(), Mode::OperatorPending(Operator::Delete));
	feed(&mut h, "w");
	assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn escape_in_operator_pending_cancels() {
	let mut h = InputHandler::new();
	assert_eq!(feed(&mut h, "3d<Esc>"), KeyResult::Cancelled);
	assert_eq!(h.mode(), Mode::Normal);
	assert_eq!(h.count(), 0);
}

#[test]
fn mismatched_operator_is_unhandled() {
	let mut h = InputHandler::new();
	assert_eq!(feed(&mut h, "dc"), KeyResult::Unhandled);
	assert_eq!(h.mode(), Mode::Normal);
}

#[test]
fn escape_with_nothing_pending_is_unhandled() {
	let mut h = InputHandler::new();
	assert_eq!(feed(&mut h, "<Esc>"), KeyResult::Unhandled);
	assert_eq!(feed(&mut h, "g<Esc>"), KeyResult::Cancelled);
}

#[test]
fn multi_key_sequences_wait() {
	let mut h = InputHandler::new();
	assert_eq!(feed(&mut h, "g"), KeyResult::Pending);
	assert_eq!(h.pending_keys(), &[Key::char('g')]);
	assert_eq!(feed(&mut h, "J"), KeyResult::Command(Command::new(Action::Join { spaces: false })));
	assert!(h.pending_keys().is_empty());
}

#[test]
fn insert_entries() {
	assert_eq!(command("A").action, Action::Insert(InsertEntry::LineEnd));
	assert_eq!(command("3o").count, Some(3));
	assert_eq!(command("gI").action, Action::Insert(InsertEntry::LineColumnZero));
}

#[test]
fn visual_mode_operators_apply_at_once() {
	let mut h = InputHandler::new();
	h.set_mode(Mode::Visual(VisualKind::Char));
	assert_eq!(
		feed(&mut h, ">"),
		KeyResult::Command(Command::new(Action::VisualOperate {
			operator: Operator::ShiftRight,
			linewise: false
		}))
	);
	assert_eq!(
		feed(&mut h, "Y"),
		KeyResult::Command(Command::new(Action::VisualOperate {
			operator: Operator::Yank,
			linewise: true
		}))
	);
}

#[test]
fn visual_escape_exits() {
	let mut h = InputHandler::new();
	h.set_mode(Mode::Visual(VisualKind::Block));
	assert_eq!(feed(&mut h, "<Esc>"), KeyResult::Command(Command::new(Action::ExitVisual)));
}

#[test]
fn macro_recording_toggles() {
	let mut h = InputHandler::new();
	assert_eq!(feed(&mut h, "qa"), KeyResult::Command(Command::new(Action::StartRecording('a'))));
	assert_eq!(h.recording(), Some('a'));
	assert_eq!(feed(&mut h, "q"), KeyResult::Command(Command::new(Action::StopRecording)));
	assert_eq!(h.recording(), None);
	assert_eq!(command("2@q").action, Action::PlayMacro('q'));
}

#[test]
fn marks_and_jumps() {
	assert_eq!(command("mx").action, Action::SetMark('x'));
	assert_eq!(command("'x").action, Action::Move(Motion::Mark { name: 'x', linewise: true }));
	assert_eq!(
		command("d`x").action,
		operate(Operator::Delete, OperatorTarget::Motion(Motion::Mark { name: 'x', linewise: false }), None)
	);
}

#[test]
fn scroll_and_increment() {
	assert_eq!(command("3zh").action, Action::ScrollColumns { right: false });
	assert_eq!(command("z<Right>").action, Action::ScrollColumns { right: true });
	assert_eq!(command("5<C-A>").count, Some(5));
}
