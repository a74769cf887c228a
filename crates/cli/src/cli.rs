use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "viper")]
#[command(about = "Replays Vim keys over a file and prints the result")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// File to edit (reads stdin if omitted)
	pub file: Option<PathBuf>,

	/// Options file (TOML)
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Keys to replay, in Vim notation (e.g. `dwjA!<Esc>`)
	#[arg(long, short = 'k')]
	pub keys: Option<String>,

	/// Command line to run before the keys, as typed after `:`
	#[arg(long = "ex", short = 'e', value_name = "CMD")]
	pub ex: Vec<String>,

	/// Expression to evaluate last; its value is printed instead of the text
	#[arg(long, value_name = "EXPR")]
	pub eval: Option<String>,
}
