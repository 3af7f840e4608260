use std::fmt;
use std::str::FromStr;

use buildalias_primitives::BuildNumber;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// Final result of a build, known only once it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildOutcome {
	Success,
	Unstable,
	Failure,
	NotBuilt,
	Aborted,
}

impl BuildOutcome {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Success => "SUCCESS",
			Self::Unstable => "UNSTABLE",
			Self::Failure => "FAILURE",
			Self::NotBuilt => "NOT_BUILT",
			Self::Aborted => "ABORTED",
		}
	}
}

impl fmt::Display for BuildOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for BuildOutcome {
	type Err = ParseOutcomeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().replace('-', "_").as_str() {
			"SUCCESS" => Ok(Self::Success),
			"UNSTABLE" => Ok(Self::Unstable),
			"FAILURE" => Ok(Self::Failure),
			"NOT_BUILT" => Ok(Self::NotBuilt),
			"ABORTED" => Ok(Self::Aborted),
			_ => Err(ParseOutcomeError(s.to_string())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown build outcome {0:?}")]
pub struct ParseOutcomeError(String);

/// What alias sources get to see about a build.
#[derive(Debug, Clone)]
pub struct BuildContext {
	/// Owning project name.
	pub project: String,
	pub number: BuildNumber,
	pub started_at: DateTime<Utc>,
	/// `None` while the build is still running.
	pub outcome: Option<BuildOutcome>,
	/// Build parameters and environment, in declaration order.
	pub variables: IndexMap<String, String>,
}

impl BuildContext {
	pub fn new(project: impl Into<String>, number: BuildNumber) -> Self {
		Self {
			project: project.into(),
			number,
			started_at: Utc::now(),
			outcome: None,
			variables: IndexMap::new(),
		}
	}

	pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
		self.started_at = started_at;
		self
	}

	pub fn with_outcome(mut self, outcome: BuildOutcome) -> Self {
		self.outcome = Some(outcome);
		self
	}

	pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.variables.insert(key.into(), value.into());
		self
	}

	pub fn variable(&self, key: &str) -> Option<&str> {
		self.variables.get(key).map(String::as_str)
	}

	/// Host-style build id derived from the start time.
	pub fn build_id(&self) -> String {
		self.started_at.format("%Y-%m-%d_%H-%M-%S").to_string()
	}
}
