//! One headless editing session over a buffer's text.

use anyhow::{Context, Result};
use tracing::{debug, warn};
use viper_engine::{Editor, EditorHost, MemoryBuffer, Options, Session};
use viper_script::{HostCommand, MessageKind};

/// What to do with the buffer.
#[derive(Debug, Default)]
pub struct Script<'a> {
	pub ex: &'a [String],
	pub keys: Option<&'a str>,
	pub eval: Option<&'a str>,
}

/// The end state of a run.
#[derive(Debug)]
pub struct Outcome {
	pub text: String,
	/// Echo form of the evaluated expression, when one was given.
	pub value: Option<String>,
	pub messages: Vec<(MessageKind, String)>,
	/// Files `:w`, `:wq` and `:x` asked for. `None` is the edited file.
	pub writes: Vec<Option<String>>,
}

pub fn run(text: &str, file_name: Option<&str>, options: Options, script: &Script<'_>) -> Result<Outcome> {
	let mut buffer = MemoryBuffer::new(text);
	if let Some(name) = file_name {
		buffer = buffer.with_file_name(name);
	}
	let mut editor = Editor::new(buffer);
	let mut session = Session::new(options);

	for line in script.ex {
		editor
			.execute_command_line(&mut session, line)
			.with_context(|| format!("running :{line}"))?;
	}
	if let Some(keys) = script.keys
		&& !editor.feed(&mut session, keys)
	{
		warn!(keys, "some keys were not handled");
	}
	let value = match script.eval {
		Some(expr) => {
			let value = editor
				.evaluate(&mut session, expr)
				.with_context(|| format!("evaluating {expr}"))?;
			Some(value.echo_string())
		}
		None => None,
	};

	let messages = editor.take_messages();
	let host = editor.into_host();
	debug!(beeps = host.beeps, commands = host.host_commands.len(), "run finished");
	let writes = host
		.host_commands
		.iter()
		.filter_map(|command| match command {
			HostCommand::Write { file, .. } => Some(file.clone()),
			HostCommand::WriteQuit { .. } | HostCommand::Exit { .. } => Some(None),
			HostCommand::Quit { .. } | HostCommand::Split { .. } => None,
		})
		.collect();
	Ok(Outcome {
		text: host.contents(),
		value,
		messages,
		writes,
	})
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn outcome(text: &str, script: Script<'_>) -> Outcome {
		run(text, Some("notes.txt"), Options::default(), &script).unwrap()
	}

	#[test]
	fn keys_then_text() {
		let out = outcome("one two\nthree", Script {
			keys: Some("dwjA!<Esc>"),
			..Script::default()
		});
		assert_eq!(out.text, "two\nthree!");
		assert_eq!(out.value, None);
	}

	#[test]
	fn ex_lines_run_before_keys() {
		let ex = ["set sw=2".to_string(), "%s/a/b/g".to_string()];
		let out = outcome("aa\na", Script {
			ex: &ex,
			keys: Some("gg>>"),
			..Script::default()
		});
		assert_eq!(out.text, "  bb\nb");
	}

	#[test]
	fn eval_sees_the_edited_buffer() {
		let out = outcome("a\nb\nc", Script {
			keys: Some("dd"),
			eval: Some("line('$') . ':' . getline(1)"),
			..Script::default()
		});
		assert_eq!(out.value.as_deref(), Some("2:b"));
	}

	#[test]
	fn write_commands_are_collected() {
		let ex = ["w other.txt".to_string(), "wq".to_string()];
		let out = outcome("x", Script {
			ex: &ex,
			..Script::default()
		});
		assert_eq!(out.writes, vec![Some("other.txt".to_string()), None]);
	}

	#[test]
	fn failing_ex_line_is_an_error() {
		let ex = ["5d".to_string()];
		let err = run("x", None, Options::default(), &Script {
			ex: &ex,
			..Script::default()
		})
		.unwrap_err();
		assert!(err.to_string().contains(":5d"), "{err}");
	}

	#[test]
	fn messages_are_returned() {
		let ex = ["echo 'hi'".to_string()];
		let out = outcome("x", Script {
			ex: &ex,
			..Script::default()
		});
		assert_eq!(out.messages, vec![(MessageKind::Echo, "hi".to_string())]);
	}
}
