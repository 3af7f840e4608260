//! `buildalias` binary.
//!
//! Drives the alias setter against a directory of TOML project files, so a
//! CI job can attach aliases at each lifecycle point and look them up later.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;

/// Environment variable holding the tracing filter.
const LOG_ENV: &str = "BUILDALIAS_LOG";

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);

	let stdout = std::io::stdout();
	commands::run(&cli, &mut stdout.lock())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_env(LOG_ENV)
		.unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose)
		.init();
}
