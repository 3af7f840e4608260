use buildalias_primitives::BuildNumber;

use crate::project::Project;

/// Outcome of reaping one deleted build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapOutcome {
	/// The project never had aliases; nothing was touched or saved.
	NoRegistry,
	/// The bucket was dropped and the project saved. `removed` is zero if the
	/// build carried no aliases.
	Reaped { removed: usize },
	/// The bucket was dropped in memory but the save failed.
	PersistFailed { removed: usize },
}

/// Drops aliases of deleted builds so they stop resolving.
///
/// Runs outside any build, so failures go to operational logging only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DanglingAliasReaper;

impl DanglingAliasReaper {
	pub fn new() -> Self {
		Self
	}

	pub fn on_deleted(&self, project: &Project, build: BuildNumber) -> ReapOutcome {
		let Some((bucket, saved)) = project.forget_build(build) else {
			return ReapOutcome::NoRegistry;
		};
		let removed = bucket.map_or(0, |bucket| bucket.len());

		match saved {
			Ok(()) => {
				tracing::debug!(project = project.name(), %build, removed, "reaped aliases of deleted build");
				ReapOutcome::Reaped { removed }
			}
			Err(error) => {
				tracing::error!(project = project.name(), %build, %error, "failed to save project after reaping aliases");
				ReapOutcome::PersistFailed { removed }
			}
		}
	}
}
