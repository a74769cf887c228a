//! Shared fixtures: one editor over a memory buffer with its own session.

use viper_engine::{Editor, MemoryBuffer, Options, Session};
use viper_primitives::SelectionType;

pub struct Fixture {
	pub editor: Editor<MemoryBuffer>,
	pub session: Session,
}

impl Fixture {
	pub fn new(text: &str) -> Self {
		Self::with_options(text, Options::default())
	}

	pub fn with_options(text: &str, options: Options) -> Self {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();
		Self {
			editor: Editor::new(MemoryBuffer::new(text)),
			session: Session::new(options),
		}
	}

	/// Feeds keys in Vim notation.
	pub fn keys(&mut self, keys: &str) -> &mut Self {
		self.editor.feed(&mut self.session, keys);
		self
	}

	pub fn ex(&mut self, line: &str) -> &mut Self {
		if let Err(err) = self.editor.execute_command_line(&mut self.session, line) {
			panic!(":{line} failed: {err}");
		}
		self
	}

	pub fn text(&self) -> String {
		self.editor.host().contents()
	}

	pub fn caret(&self) -> usize {
		self.editor.caret()
	}

	pub fn register(&self, name: char) -> Option<(String, SelectionType)> {
		self.session.registers.get_register(name).map(|r| (r.text, r.kind))
	}

	pub fn register_text(&self, name: char) -> Option<String> {
		self.register(name).map(|(text, _)| text)
	}
}

/// Text after feeding `keys` to a fresh editor over `text`.
pub fn after(text: &str, keys: &str) -> String {
	Fixture::new(text).keys(keys).text()
}
