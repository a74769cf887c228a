//! `viper`: replays Vim keys over a file without a screen.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use viper_engine::Options;
use viper_script::MessageKind;

mod cli;
mod run;

use cli::Cli;
use run::Script;

fn main() -> Result<()> {
	setup_tracing();
	let cli = Cli::parse();

	let options = match &cli.config {
		Some(path) => Options::load(path)?,
		None => Options::default(),
	};
	let text = match &cli.file {
		Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
		None => {
			let mut text = String::new();
			std::io::stdin().read_to_string(&mut text).context("reading stdin")?;
			text
		}
	};
	let file_name = cli.file.as_deref().map(|path| path.display().to_string());
	debug!(file = ?file_name, chars = text.chars().count(), "buffer loaded");

	let outcome = run::run(
		&text,
		file_name.as_deref(),
		options,
		&Script {
			ex: &cli.ex,
			keys: cli.keys.as_deref(),
			eval: cli.eval.as_deref(),
		},
	)?;

	let mut stderr = std::io::stderr().lock();
	for (kind, message) in &outcome.messages {
		match kind {
			MessageKind::Error => writeln!(stderr, "error: {message}")?,
			MessageKind::Echo | MessageKind::Msg => writeln!(stderr, "{message}")?,
		}
	}
	for target in &outcome.writes {
		let path = match (target, &cli.file) {
			(Some(name), _) => Path::new(name),
			(None, Some(path)) => path.as_path(),
			(None, None) => anyhow::bail!("E32: No file name"),
		};
		std::fs::write(path, &outcome.text).with_context(|| format!("writing {}", path.display()))?;
		info!(path = %path.display(), "written");
	}

	let mut stdout = std::io::stdout().lock();
	match &outcome.value {
		Some(value) => writeln!(stdout, "{value}")?,
		None => write!(stdout, "{}", outcome.text)?,
	}
	Ok(())
}

/// Logs to stderr, filtered by `VIPER_LOG` (default `warn`).
fn setup_tracing() {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env("VIPER_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();
}
