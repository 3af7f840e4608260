use std::path::PathBuf;

use buildalias_setter::{BuildNumber, BuildOutcome, Trigger};
use clap::{Parser, Subcommand, ValueEnum};

/// Environment variable naming the store root when `--root` is absent.
pub const HOME_ENV: &str = "BUILDALIAS_HOME";

/// Store root used when neither `--root` nor [`HOME_ENV`] is set.
pub const DEFAULT_ROOT: &str = ".buildalias";

#[derive(Parser, Debug)]
#[command(name = "buildalias")]
#[command(about = "Attach custom permalinks to builds")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Directory holding one folder per project
	#[arg(long, global = true, value_name = "PATH")]
	pub root: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

impl Cli {
	/// `--root`, else `$BUILDALIAS_HOME`, else `.buildalias`.
	pub fn store_root(&self) -> PathBuf {
		self.root
			.clone()
			.or_else(|| std::env::var_os(HOME_ENV).map(PathBuf::from))
			.unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT))
	}
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Create a project
	Init {
		project: String,
		/// Alias template, repeatable; sources run in the given order
		#[arg(long = "template", short = 't', value_name = "TEMPLATE")]
		templates: Vec<String>,
		/// Extra names that may never be used as aliases
		#[arg(long, value_delimiter = ',')]
		reserved: Vec<String>,
		/// Overwrite an existing project, discarding its aliases
		#[arg(long)]
		force: bool,
	},
	/// Show or replace a project's alias sources
	Sources {
		project: String,
		/// New template list; prints the current list when omitted
		#[arg(long = "template", short = 't', value_name = "TEMPLATE")]
		templates: Vec<String>,
		/// Remove every source
		#[arg(long, conflicts_with = "templates")]
		clear: bool,
	},
	/// Run one lifecycle trigger for a build
	Trigger {
		project: String,
		build: BuildNumber,
		#[arg(long, value_enum, default_value_t = Phase::AfterRun)]
		phase: Phase,
		/// Build variable as KEY=VALUE, repeatable
		#[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
		vars: Vec<(String, String)>,
		/// Build outcome, for triggers that fire after the build finished
		#[arg(long)]
		result: Option<BuildOutcome>,
	},
	/// Tell the project a build was deleted
	Deleted { project: String, build: BuildNumber },
	/// List every alias with the build that owns it
	List { project: String },
	/// Print the build an alias points at
	Resolve { project: String, name: String },
	/// Validate alias candidates without touching any project
	Check {
		#[arg(required = true)]
		candidates: Vec<String>,
		/// Project whose extra reserved names apply
		#[arg(long)]
		project: Option<String>,
	},
	/// Copy a project's configuration under a new name
	Copy { from: String, to: String },
}

/// Lifecycle point to fire.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	BeforeRun,
	AfterRun,
	AggregationStart,
	AggregationEnd,
}

impl From<Phase> for Trigger {
	fn from(phase: Phase) -> Self {
		match phase {
			Phase::BeforeRun => Trigger::BeforeRun,
			Phase::AfterRun => Trigger::AfterRun,
			Phase::AggregationStart => Trigger::AggregationStart,
			Phase::AggregationEnd => Trigger::AggregationEnd,
		}
	}
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
	match raw.split_once('=') {
		Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
		_ => Err(format!("expected KEY=VALUE, got {raw:?}")),
	}
}
