//! Candidate collection.
//!
//! Sources are queried in configured order. Their candidates are
//! concatenated, empty strings dropped, duplicates collapsed onto the first
//! occurrence, and the survivors validated. Nothing in here aborts: a failing
//! source or a rejected candidate is reported on the build log and skipped.

use buildalias_primitives::{AliasValidator, Rejection};
use buildalias_registry::AliasBucket;
use indexmap::IndexSet;

use crate::build::BuildContext;
use crate::log::{BuildLog, tagged};
use crate::source::SourceSet;

/// Result of one collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
	/// Accepted aliases in first-seen order.
	pub aliases: AliasBucket,
	/// Rejected candidates in the order they were seen.
	pub rejected: Vec<Rejection>,
	/// Labels of sources that failed.
	pub failed_sources: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AliasCollector {
	validator: AliasValidator,
}

impl AliasCollector {
	pub fn new(validator: AliasValidator) -> Self {
		Self { validator }
	}

	pub fn validator(&self) -> &AliasValidator {
		&self.validator
	}

	pub fn collect(&self, build: &BuildContext, sources: &SourceSet, log: &mut dyn BuildLog) -> Collection {
		let mut collection = Collection::default();
		let mut candidates: IndexSet<String> = IndexSet::new();

		for source in sources.iter() {
			match source.names(build, log) {
				Ok(names) => candidates.extend(names.into_iter().filter(|name| !name.is_empty())),
				Err(error) => {
					let label = source.label();
					tracing::warn!(source = %label, build = %build.number, %error, "alias source failed");
					tagged(log, format_args!("alias source {label} failed: {error}"));
					collection.failed_sources.push(label.into_owned());
				}
			}
		}

		for candidate in candidates {
			match self.validator.check(&candidate) {
				Ok(name) => {
					collection.aliases.insert(name);
				}
				Err(rejection) => {
					tagged(log, format_args!("{rejection}"));
					collection.rejected.push(rejection);
				}
			}
		}

		collection
	}
}
