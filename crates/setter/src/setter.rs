//! Lifecycle orchestration.
//!
//! Each trigger point runs one independent pass: collect from the sources
//! configured *at that moment*, then attach and save. Plain builds fire
//! [`Trigger::BeforeRun`] and [`Trigger::AfterRun`]; aggregated builds fire
//! [`Trigger::AggregationStart`] and [`Trigger::AggregationEnd`].

use std::fmt;

use buildalias_primitives::BuildNumber;
use buildalias_registry::AliasBucket;

use crate::build::BuildContext;
use crate::log::{BuildLog, tagged};
use crate::project::Project;
use crate::store::PersistError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
	BeforeRun,
	AfterRun,
	AggregationStart,
	AggregationEnd,
}

impl Trigger {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::BeforeRun => "before-run",
			Self::AfterRun => "after-run",
			Self::AggregationStart => "aggregation-start",
			Self::AggregationEnd => "aggregation-end",
		}
	}
}

impl fmt::Display for Trigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// What one trigger pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
	/// Collection came back empty; the registry was not touched.
	NothingSet,
	/// `aliases` were attached and the project saved. `added` counts the
	/// names the build did not carry before.
	Attached { aliases: AliasBucket, added: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum SetterError {
	/// The registry was updated in memory but the project could not be saved.
	#[error("failed to save project '{project}' after attaching aliases to #{build}: {source}")]
	Persist {
		project: String,
		build: BuildNumber,
		#[source]
		source: PersistError,
	},
}

/// Attaches collected aliases to builds of one project.
#[derive(Debug, Clone, Copy)]
pub struct AliasSetter<'p> {
	project: &'p Project,
}

impl<'p> AliasSetter<'p> {
	pub fn new(project: &'p Project) -> Self {
		Self { project }
	}

	pub fn project(&self) -> &'p Project {
		self.project
	}

	/// Runs one collect-and-attach pass for `build`.
	pub fn trigger(
		&self,
		trigger: Trigger,
		build: &BuildContext,
		log: &mut dyn BuildLog,
	) -> Result<TriggerOutcome, SetterError> {
		let sources = self.project.sources();
		let collection = self.project.collector().collect(build, &sources, log);

		if collection.aliases.is_empty() {
			tracing::debug!(project = self.project.name(), build = %build.number, %trigger, "no aliases collected");
			tagged(log, format_args!("no build aliases set"));
			return Ok(TriggerOutcome::NothingSet);
		}

		let aliases = collection.aliases;
		tagged(log, format_args!("setting build aliases {aliases}"));
		tracing::debug!(project = self.project.name(), build = %build.number, %trigger, %aliases, "attaching aliases");

		match self.project.record_aliases(build.number, aliases.clone()) {
			Ok(added) => Ok(TriggerOutcome::Attached { aliases, added }),
			Err(source) => {
				tracing::error!(project = self.project.name(), build = %build.number, %trigger, error = %source, "failed to save project");
				tagged(log, format_args!("failed to save build aliases: {source}"));
				Err(SetterError::Persist {
					project: self.project.name().to_string(),
					build: build.number,
					source,
				})
			}
		}
	}

	/// Fires [`Trigger::BeforeRun`] and returns the scope whose
	/// [`tear_down`](RunScope::tear_down) fires [`Trigger::AfterRun`].
	///
	/// The scope is returned even if the first pass failed, together with
	/// that pass's result.
	pub fn set_up(
		&self,
		build: &BuildContext,
		log: &mut dyn BuildLog,
	) -> (RunScope<'p>, Result<TriggerOutcome, SetterError>) {
		let result = self.trigger(Trigger::BeforeRun, build, log);
		(RunScope { setter: *self }, result)
	}

	pub fn aggregator(&self) -> Aggregator<'p> {
		Aggregator { setter: *self }
	}
}

/// Open plain-build scope.
#[must_use = "the after-run pass only happens in `tear_down`"]
#[derive(Debug)]
pub struct RunScope<'p> {
	setter: AliasSetter<'p>,
}

impl RunScope<'_> {
	/// Fires [`Trigger::AfterRun`]. `build` should carry the outcome by now.
	pub fn tear_down(self, build: &BuildContext, log: &mut dyn BuildLog) -> Result<TriggerOutcome, SetterError> {
		self.setter.trigger(Trigger::AfterRun, build, log)
	}
}

/// Aggregated-build hooks.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'p> {
	setter: AliasSetter<'p>,
}

impl Aggregator<'_> {
	pub fn start_build(&self, build: &BuildContext, log: &mut dyn BuildLog) -> Result<TriggerOutcome, SetterError> {
		self.setter.trigger(Trigger::AggregationStart, build, log)
	}

	pub fn end_build(&self, build: &BuildContext, log: &mut dyn BuildLog) -> Result<TriggerOutcome, SetterError> {
		self.setter.trigger(Trigger::AggregationEnd, build, log)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;
	use crate::source::template::TemplateSource;
	use crate::source::SourceSet;
	use crate::store::MemoryProjectStore;

	fn build(number: u32) -> BuildContext {
		BuildContext::new("core", BuildNumber::new(number).unwrap()).with_variable("VERSION", "1.480.3")
	}

	#[rstest]
	#[case(Trigger::BeforeRun, "before-run")]
	#[case(Trigger::AfterRun, "after-run")]
	#[case(Trigger::AggregationStart, "aggregation-start")]
	#[case(Trigger::AggregationEnd, "aggregation-end")]
	fn trigger_names(#[case] trigger: Trigger, #[case] expected: &str) {
		assert_eq!(trigger.to_string(), expected);
	}

	#[test]
	fn empty_collection_touches_nothing() {
		let store = Arc::new(MemoryProjectStore::new());
		let project = Project::new("core", store.clone());
		let mut log: Vec<String> = Vec::new();

		let outcome = AliasSetter::new(&project).trigger(Trigger::BeforeRun, &build(1), &mut log).unwrap();

		assert_eq!(outcome, TriggerOutcome::NothingSet);
		assert_eq!(log, vec!["alias-setter: no build aliases set".to_string()]);
		assert!(!project.has_aliases());
		assert_eq!(store.saves(), 0);
	}

	#[test]
	fn attach_logs_the_set_and_saves() {
		let store = Arc::new(MemoryProjectStore::new());
		let project = Project::new("core", store.clone())
			.with_sources(SourceSet::new().with(TemplateSource::new("v$VERSION")).with(TemplateSource::new("stable")));
		let mut log: Vec<String> = Vec::new();

		let outcome = AliasSetter::new(&project).trigger(Trigger::AfterRun, &build(2), &mut log).unwrap();

		let TriggerOutcome::Attached { aliases, added } = &outcome else {
			panic!("expected aliases to be attached, got {outcome:?}");
		};
		assert_eq!(aliases.to_string(), "[v1.480.3, stable]");
		assert_eq!(*added, 2);
		assert_eq!(log, vec!["alias-setter: setting build aliases [v1.480.3, stable]".to_string()]);
		assert_eq!(store.saves(), 1);
	}

	#[test]
	fn repeated_trigger_adds_nothing_new() {
		let project = Project::new("core", Arc::new(MemoryProjectStore::new()))
			.with_sources(SourceSet::new().with(TemplateSource::new("stable")));
		let setter = AliasSetter::new(&project);

		setter.trigger(Trigger::BeforeRun, &build(3), &mut Vec::<String>::new()).unwrap();
		let outcome = setter.trigger(Trigger::AfterRun, &build(3), &mut Vec::<String>::new()).unwrap();

		assert!(matches!(outcome, TriggerOutcome::Attached { added: 0, .. }));
	}
}
