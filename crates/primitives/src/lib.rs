//! Core types for Vim emulation: keys, modes, operators and text ranges.

/// Grapheme cluster boundary detection.
pub mod graphemes;
/// Key events and Vim key notation.
pub mod key;
/// Editor mode definitions.
pub mod mode;
/// Operator definitions.
pub mod operator;
/// Vim search patterns compiled to regular expressions.
pub mod pattern;
/// Caret selection ranges.
pub mod range;
/// Rope utilities and line helpers.
pub mod rope;
/// Operator target ranges with a selection type.
pub mod text_range;

pub use key::{Key, KeyCode, KeyParseError, Modifiers, keys_to_string, parse_keys};
pub use mode::{CmdLineKind, Mode, VisualKind};
pub use operator::Operator;
pub use pattern::{PatternError, compile_pattern, expand_replacement};
pub use range::{CharIdx, CharLen, Direction, Range};
pub use ropey::{Rope, RopeSlice};
pub use text_range::{SelectionType, Span, TextRange};
