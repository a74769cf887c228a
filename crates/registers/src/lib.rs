//! Register and mark storage.
//!
//! [`RegisterStore`] is the session-wide store every editor shares;
//! [`CaretRegisters`] keeps the recordable registers of a secondary caret so
//! multi-caret yank and put work per caret. [`MarkStore`] holds the marks of
//! one caret.

mod caret;
mod clipboard;
mod error;
mod marks;
mod register;
mod store;
#[cfg(test)]
mod tests;

pub use caret::CaretRegisters;
pub use clipboard::{Clipboard, ClipboardSelection, MemoryClipboard};
pub use error::RegisterError;
pub use marks::{Mark, MarkStore};
pub use register::{Register, RegisterName};
pub use store::{ClipboardMode, RegisterStore};
