//! Project aggregate.
//!
//! # Role
//!
//! A [`Project`] owns the configured alias sources, the validator settings and
//! the alias registry of one host project, and knows how to persist itself.
//!
//! # Invariants
//!
//! * The registry starts absent and is created by the first non-empty attach.
//!   Nothing replaces it afterwards.
//! * Every registry mutation and the save that follows it happen under the
//!   same lock, so concurrent builds of one project persist in a consistent
//!   order and readers never see a half-applied attach.
//! * Mutations are re-applied to the registry the store holds at save time,
//!   inside [`ProjectStore::update`]. Another handle on the same project (or
//!   another process) that saved in between is merged, not overwritten.
//! * A project opened as `name` always saves as `name`, whatever name its
//!   stored document carries.
//! * [`Project::duplicate`] copies configuration but never the registry.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use buildalias_primitives::{AliasValidator, BuildNumber};
use buildalias_registry::{AliasBucket, AliasRegistry, BuildLookup, ResolvedAlias};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::collect::AliasCollector;
use crate::source::{SourceConfig, SourceSet};
use crate::store::{PersistError, ProjectStore};

/// Persisted form of a [`Project`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
	pub name: String,
	/// Extra reserved names on top of the built-in permalinks.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub reserved: Vec<String>,
	#[serde(default)]
	pub sources: Vec<SourceConfig>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub aliases: Option<AliasRegistry>,
}

impl ProjectRecord {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			reserved: Vec::new(),
			sources: Vec::new(),
			aliases: None,
		}
	}
}

pub struct Project {
	name: String,
	sources: ArcSwap<SourceSet>,
	collector: AliasCollector,
	aliases: Mutex<Option<AliasRegistry>>,
	store: Arc<dyn ProjectStore>,
}

impl Project {
	pub fn new(name: impl Into<String>, store: Arc<dyn ProjectStore>) -> Self {
		Self {
			name: name.into(),
			sources: ArcSwap::from_pointee(SourceSet::new()),
			collector: AliasCollector::default(),
			aliases: Mutex::new(None),
			store,
		}
	}

	pub fn with_sources(self, sources: SourceSet) -> Self {
		self.set_sources(sources);
		self
	}

	/// Adds names the validator rejects on top of the built-in permalinks.
	pub fn with_reserved<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.collector = AliasCollector::new(AliasValidator::new().with_reserved(names));
		self
	}

	/// Loads `name` from `store`. `Ok(None)` if it was never saved.
	pub fn open(name: &str, store: Arc<dyn ProjectStore>) -> Result<Option<Self>, PersistError> {
		let Some(mut record) = store.load(name)? else {
			return Ok(None);
		};
		// Documents copied between project directories keep their old name.
		record.name = name.to_string();
		Ok(Some(Self::from_record(record, store)))
	}

	pub fn from_record(record: ProjectRecord, store: Arc<dyn ProjectStore>) -> Self {
		let sources = SourceSet::from_configs(&record.sources);
		Self {
			name: record.name,
			sources: ArcSwap::from_pointee(sources),
			collector: AliasCollector::new(AliasValidator::new().with_reserved(record.reserved)),
			aliases: Mutex::new(record.aliases),
			store,
		}
	}

	pub fn to_record(&self) -> ProjectRecord {
		self.record_with(self.aliases.lock().clone())
	}

	fn record_with(&self, aliases: Option<AliasRegistry>) -> ProjectRecord {
		ProjectRecord {
			name: self.name.clone(),
			reserved: self.collector.validator().extra_reserved().map(str::to_owned).collect(),
			sources: self.sources.load().configs(),
			aliases,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Snapshot of the configured sources.
	pub fn sources(&self) -> Arc<SourceSet> {
		self.sources.load_full()
	}

	/// Replaces the source list. Triggers already running keep the snapshot
	/// they started with.
	pub fn set_sources(&self, sources: SourceSet) {
		self.sources.store(Arc::new(sources));
	}

	pub fn collector(&self) -> &AliasCollector {
		&self.collector
	}

	pub fn validator(&self) -> &AliasValidator {
		self.collector.validator()
	}

	pub fn has_aliases(&self) -> bool {
		self.aliases.lock().is_some()
	}

	/// Clone of the registry, `None` if nothing was ever attached.
	pub fn registry(&self) -> Option<AliasRegistry> {
		self.aliases.lock().clone()
	}

	pub fn resolve_all(&self) -> Vec<ResolvedAlias> {
		self.aliases.lock().as_ref().map(AliasRegistry::resolve_all).unwrap_or_default()
	}

	pub fn resolve(&self, name: &str) -> Option<BuildNumber> {
		self.aliases.lock().as_ref()?.resolve(name)
	}

	pub fn aliases_for(&self, build: BuildNumber) -> Option<AliasBucket> {
		self.aliases.lock().as_ref()?.aliases_for(build).cloned()
	}

	/// Resolves `name` to the host's build handle.
	///
	/// The host is consulted after the lock is released.
	pub fn resolve_permalink<L: BuildLookup + ?Sized>(&self, name: &str, host: &L) -> Option<L::Build> {
		let build = self.resolve(name)?;
		host.build_by_number(build)
	}

	/// Same configuration under a new name, with no alias registry.
	pub fn duplicate(&self, name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			sources: ArcSwap::new(self.sources.load_full()),
			collector: self.collector.clone(),
			aliases: Mutex::new(None),
			store: Arc::clone(&self.store),
		}
	}

	/// Writes the whole project, replacing whatever the store holds.
	pub fn save(&self) -> Result<(), PersistError> {
		let aliases = self.aliases.lock();
		self.store.save(&self.record_with(aliases.clone()))
	}

	/// Writes sources and reserved names, keeping the stored registry.
	pub fn save_settings(&self) -> Result<(), PersistError> {
		let mut guard = self.aliases.lock();
		let merged = self.save_merged(&guard, |_| {})?;
		*guard = merged;
		Ok(())
	}

	/// Attaches `aliases` to `build` and saves, holding the lock throughout.
	///
	/// The in-memory attach stands even if the save fails.
	pub(crate) fn record_aliases(&self, build: BuildNumber, aliases: AliasBucket) -> Result<usize, PersistError> {
		let mut guard = self.aliases.lock();
		let added = guard.get_or_insert_with(AliasRegistry::new).add(build, aliases.clone());
		let merged = self.save_merged(&guard, |registry| {
			registry.get_or_insert_with(AliasRegistry::new).add(build, aliases.clone());
		})?;
		*guard = merged;
		Ok(added)
	}

	/// Drops the bucket of `build` and saves. `None` if the project has no
	/// registry, in which case nothing is saved.
	pub(crate) fn forget_build(&self, build: BuildNumber) -> Option<(Option<AliasBucket>, Result<(), PersistError>)> {
		let mut guard = self.aliases.lock();
		let removed = guard.as_mut()?.delete(build);
		let saved = self
			.save_merged(&guard, |registry| {
				if let Some(registry) = registry {
					registry.delete(build);
				}
			})
			.map(|merged| *guard = merged);
		Some((removed, saved))
	}

	/// Applies `apply` to the registry the store currently holds (or to
	/// `current` if it holds none) and saves the result with this project's
	/// settings. Returns the registry that was saved.
	///
	/// `apply` must be idempotent: it may run on `current`, which already
	/// carries the change.
	fn save_merged(
		&self,
		current: &Option<AliasRegistry>,
		apply: impl Fn(&mut Option<AliasRegistry>),
	) -> Result<Option<AliasRegistry>, PersistError> {
		let mut saved = None;
		self.store.update(&self.name, &mut |stored| {
			let mut aliases = stored.and_then(|record| record.aliases).or_else(|| current.clone());
			apply(&mut aliases);
			saved.clone_from(&aliases);
			self.record_with(aliases)
		})?;
		Ok(saved)
	}
}

impl fmt::Debug for Project {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Project")
			.field("name", &self.name)
			.field("sources", &self.sources.load().len())
			.field("aliases", &*self.aliases.lock())
			.finish_non_exhaustive()
	}
}
