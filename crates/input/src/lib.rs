//! Key interpretation for the viper Vim engine.
//!
//! [`InputHandler`] consumes keys one at a time and produces [`Command`]s;
//! [`movement`] holds the pure text functions motions and text objects are
//! computed with.

mod cmdline;
mod handler;
mod insert;
mod keymap;
pub mod movement;
mod pending;
#[cfg(test)]
mod tests;
pub mod types;

pub use cmdline::CommandLine;
pub use handler::{InputHandler, MAX_COUNT};
pub use types::{Action, Command, InsertEntry, KeyResult, Motion, MotionKind, ObjectKind, OperatorTarget, TextObject, WordType};
