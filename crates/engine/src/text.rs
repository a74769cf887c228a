//! String helpers behind the operators: indentation, case and numbers.

use viper_primitives::Operator;

/// Display width of leading whitespace, with tabs to the next tab stop.
pub(crate) fn indent_width(indent: &str, tabstop: usize) -> usize {
	let tabstop = tabstop.max(1);
	indent.chars().fold(0, |width, c| if c == '\t' { width + tabstop - width % tabstop } else { width + 1 })
}

/// Whitespace of `width` columns: spaces with `expandtab`, else tabs then
/// spaces.
pub(crate) fn build_indent(width: usize, expandtab: bool, tabstop: usize) -> String {
	build_whitespace(0, width, expandtab, tabstop)
}

/// Whitespace filling display columns `from..to`. Without `expandtab`,
/// tabs reach the last tab stop that fits.
pub(crate) fn build_whitespace(from: usize, to: usize, expandtab: bool, tabstop: usize) -> String {
	let tabstop = tabstop.max(1);
	let mut out = String::new();
	let mut column = from;
	while !expandtab && (column / tabstop + 1) * tabstop <= to {
		out.push('\t');
		column = (column / tabstop + 1) * tabstop;
	}
	out.push_str(&" ".repeat(to.saturating_sub(column)));
	out
}

/// New indent width after shifting `amount` times by `shiftwidth`.
///
/// With `round`, the result lands on a multiple of `shiftwidth`.
pub(crate) fn shifted_width(width: usize, shiftwidth: usize, amount: usize, right: bool, round: bool) -> usize {
	if round && shiftwidth > 0 {
		let steps = if right { width / shiftwidth + amount } else { width.div_ceil(shiftwidth).saturating_sub(amount) };
		return steps * shiftwidth;
	}
	let step = shiftwidth * amount;
	if right { width + step } else { width.saturating_sub(step) }
}

/// `~` and `g~`.
pub(crate) fn toggle_case(text: &str) -> String {
	text.chars()
		.flat_map(|c| -> Box<dyn Iterator<Item = char>> {
			if c.is_lowercase() {
				Box::new(c.to_uppercase())
			} else if c.is_uppercase() {
				Box::new(c.to_lowercase())
			} else {
				Box::new(std::iter::once(c))
			}
		})
		.collect()
}

/// The case conversion a case operator applies.
pub(crate) fn case_conversion(operator: Operator) -> fn(&str) -> String {
	match operator {
		Operator::Lowercase => str::to_lowercase,
		Operator::Uppercase => str::to_uppercase,
		_ => toggle_case,
	}
}

/// What goes between two joined lines.
///
/// `left` is the first line, `right` the second with its indent removed.
pub(crate) fn join_separator(left: &str, right: &str, spaces: bool) -> &'static str {
	let no_space = !spaces || left.is_empty() || right.is_empty() || left.ends_with([' ', '\t']) || right.starts_with(')');
	if no_space { "" } else { " " }
}

/// A number found for `<C-A>` and `<C-X>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumberEdit {
	/// Char columns of the number, end exclusive.
	pub(crate) start: usize,
	pub(crate) end: usize,
	pub(crate) replacement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
	Decimal,
	Hex,
	Binary,
}

/// Adds `delta` to the first number that ends after column `col`.
///
/// Decimal numbers may carry a `-` sign; `0x` and `0b` numbers are
/// unsigned, keep their width and, for hex, the case of their letters.
pub(crate) fn increment_number(line: &str, col: usize, delta: i64) -> Option<NumberEdit> {
	let chars: Vec<char> = line.chars().collect();
	let (start, end, radix) = find_number(&chars, col)?;
	let token: String = chars[start..end].iter().collect();

	let replacement = match radix {
		Radix::Decimal => {
			let (negative, digits) = match token.strip_prefix('-') {
				Some(digits) => (true, digits),
				None => (false, token.as_str()),
			};
			let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
			let value = if negative { -magnitude } else { magnitude };
			let next = value.saturating_add(delta);
			if digits.starts_with('0') && digits.len() > 1 {
				let width = digits.len();
				let sign = if next < 0 { "-" } else { "" };
				format!("{sign}{:0width$}", next.unsigned_abs())
			} else {
				next.to_string()
			}
		}
		Radix::Hex | Radix::Binary => {
			let (prefix, digits) = token.split_at(2);
			let base = if radix == Radix::Hex { 16 } else { 2 };
			let value = u64::from_str_radix(digits, base).unwrap_or(u64::MAX);
			let next = value.wrapping_add_signed(delta);
			let width = digits.len();
			match radix {
				Radix::Hex if digits.chars().any(|c| c.is_ascii_uppercase()) => format!("{prefix}{next:0width$X}"),
				Radix::Hex => format!("{prefix}{next:0width$x}"),
				_ => format!("{prefix}{next:0width$b}"),
			}
		}
	};
	Some(NumberEdit { start, end, replacement })
}

fn find_number(chars: &[char], col: usize) -> Option<(usize, usize, Radix)> {
	let run = |from: usize, pred: fn(&char) -> bool| from + chars[from..].iter().take_while(|c| pred(*c)).count();
	let mut i = 0;
	while i < chars.len() {
		let next = chars.get(i + 1).copied();
		let after = chars.get(i + 2);
		let token = if chars[i] == '0' && matches!(next, Some('x' | 'X')) && after.is_some_and(char::is_ascii_hexdigit) {
			Some((i, run(i + 2, char::is_ascii_hexdigit), Radix::Hex))
		} else if chars[i] == '0' && matches!(next, Some('b' | 'B')) && after.is_some_and(|c| matches!(*c, '0' | '1')) {
			Some((i, run(i + 2, |c: &char| matches!(*c, '0' | '1')), Radix::Binary))
		} else if chars[i].is_ascii_digit() {
			let start = if i > 0 && chars[i - 1] == '-' { i - 1 } else { i };
			Some((start, run(i, char::is_ascii_digit), Radix::Decimal))
		} else {
			None
		};
		match token {
			Some((start, end, radix)) if end > col => return Some((start, end, radix)),
			Some((_, end, _)) => i = end,
			None => i += 1,
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case("x 41 y", 0, 1, "42")]
	#[case("-1", 1, 1, "0")]
	#[case("5", 0, -7, "-2")]
	#[case("0x0f", 3, 1, "0x10")]
	#[case("0xFE", 0, 1, "0xFF")]
	#[case("0b011", 0, 1, "0b100")]
	#[case("007", 0, 1, "008")]
	fn numbers_increment(#[case] line: &str, #[case] col: usize, #[case] delta: i64, #[case] expected: &str) {
		assert_eq!(increment_number(line, col, delta).map(|edit| edit.replacement), Some(expected.to_string()));
	}

	#[test]
	fn number_before_the_caret_is_skipped() {
		assert_eq!(increment_number("1 abc", 2, 1), None);
		let edit = increment_number("1 abc 9", 2, 1).unwrap();
		assert_eq!((edit.start, edit.end), (6, 7));
	}

	#[rstest]
	#[case(0, true, false, 4)]
	#[case(6, true, true, 8)]
	#[case(6, false, true, 4)]
	#[case(2, false, false, 0)]
	fn shifting(#[case] width: usize, #[case] right: bool, #[case] round: bool, #[case] expected: usize) {
		assert_eq!(shifted_width(width, 4, 1, right, round), expected);
	}

	#[test]
	fn indents() {
		assert_eq!(indent_width("\t  ", 8), 10);
		assert_eq!(build_indent(10, false, 8), "\t  ");
		assert_eq!(build_indent(3, true, 8), "   ");
		assert_eq!(build_indent(16, false, 8), "\t\t");
	}

	#[rstest]
	#[case(1, 9, false, "\t ")]
	#[case(3, 7, false, "    ")]
	#[case(1, 9, true, "        ")]
	#[case(8, 16, false, "\t")]
	fn whitespace_between_columns(#[case] from: usize, #[case] to: usize, #[case] expandtab: bool, #[case] expected: &str) {
		assert_eq!(build_whitespace(from, to, expandtab, 8), expected);
	}

	#[test]
	fn join_spacing() {
		assert_eq!(join_separator("foo", "bar", true), " ");
		assert_eq!(join_separator("foo ", "bar", true), "");
		assert_eq!(join_separator("foo", ")", true), "");
		assert_eq!(join_separator("foo", "bar", false), "");
	}

	#[test]
	fn case_operators() {
		assert_eq!(toggle_case("aB1"), "Ab1");
		assert_eq!(case_conversion(Operator::Uppercase)("ab"), "AB");
	}
}
