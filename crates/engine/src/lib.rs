#![cfg_attr(test, allow(unused_crate_dependencies))]
//! The viper Vim engine.
//!
//! Feeds keys to an [`Editor`] running over any [`EditorHost`], the text
//! editor it is embedded in. Registers, options and script state live in a
//! [`Session`] shared by every editor of one application.
//!
//! # Main Types
//!
//! - [`Editor`] - mode, carets and repeat state over one host buffer
//! - [`Session`] - registers, options, search state and script variables
//! - [`EditorHost`] - what the engine needs from the host editor
//! - [`MemoryBuffer`] - a rope-backed host for tests and the command line tool
//!
//! # Flow
//!
//! ```text
//! key ─> InputHandler ─> Command ─> Editor::execute ─> EditorHost::replace
//!                                         │
//!                                         └─> Session (registers, options)
//! ```
//!
//! Every command runs inside one host transaction, so it undoes as one step.

/// Carets, selections and per-caret marks.
pub mod caret;
mod editor;
mod error;
/// The host editor interface.
pub mod host;
/// Option values and the options file.
pub mod options;
mod session;
mod text;

pub use caret::{Block, Caret, CaretSet, LINE_END_COLUMN};
pub use editor::{Editor, MAX_REPLAY_DEPTH};
pub use error::{EditorError, EditorResult};
pub use host::{EditorHost, MAX_UNDO, MemoryBuffer};
pub use options::{OptionValue, Options, OptionsError};
pub use session::{LastFind, LastSearch, Session};
