use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use buildalias_primitives::{AliasName, BuildNumber};
use serde::{Deserialize, Serialize};

use crate::bucket::AliasBucket;
use crate::resolved::ResolvedAlias;


/// Mapping from build number to the aliases attached to that build.
///
/// Created empty, mutated only through [`add`](Self::add) and
/// [`delete`](Self::delete). Serializes as a list of `{ build, aliases }`
/// records ordered by build number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<BucketRecord>", into = "Vec<BucketRecord>")]
pub struct AliasRegistry {
	buckets: BTreeMap<BuildNumber, AliasBucket>,
}

/// Serialized form of one bucket.
#[doc(hidden)]
#[derive(Serialize, Deserialize)]
pub struct BucketRecord {
	build: BuildNumber,
	aliases: AliasBucket,
}

impl AliasRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Unions `names` into the bucket for `build`.
	///
	/// Returns how many names were newly attached. An empty `names` leaves the
	/// registry untouched and creates no bucket.
	pub fn add<I>(&mut self, build: BuildNumber, names: I) -> usize
	where
		I: IntoIterator<Item = AliasName>,
	{
		let mut names = names.into_iter().peekable();
		if names.peek().is_none() {
			return 0;
		}

		let bucket = self.buckets.entry(build).or_default();
		names.map(|name| bucket.insert(name)).filter(|&inserted| inserted).count()
	}

	/// Drops every alias attached to `build`. Returns the removed bucket.
	pub fn delete(&mut self, build: BuildNumber) -> Option<AliasBucket> {
		self.buckets.remove(&build)
	}

	/// Current owner of every alias name, sorted by name.
	///
	/// A name carried by several builds resolves to the largest build number.
	pub fn resolve_all(&self) -> Vec<ResolvedAlias> {
		let mut winners: BTreeMap<&AliasName, BuildNumber> = BTreeMap::new();
		for (&build, bucket) in &self.buckets {
			for name in bucket {
				match winners.entry(name) {
					Entry::Vacant(slot) => {
						slot.insert(build);
					}
					Entry::Occupied(mut slot) => {
						if build > *slot.get() {
							slot.insert(build);
						}
					}
				}
			}
		}

		winners
			.into_iter()
			.map(|(name, build)| ResolvedAlias::new(name.clone(), build))
			.collect()
	}

	/// Build currently owning `name`, consistent with [`resolve_all`](Self::resolve_all).
	pub fn resolve(&self, name: &str) -> Option<BuildNumber> {
		self.buckets
			.iter()
			.rev()
			.find(|(_, bucket)| bucket.contains(name))
			.map(|(&build, _)| build)
	}

	/// Every build carrying `name`, oldest first.
	pub fn owners(&self, name: &str) -> Vec<BuildNumber> {
		self.buckets
			.iter()
			.filter(|(_, bucket)| bucket.contains(name))
			.map(|(&build, _)| build)
			.collect()
	}

	pub fn aliases_for(&self, build: BuildNumber) -> Option<&AliasBucket> {
		self.buckets.get(&build)
	}

	/// Buckets ordered by build number.
	pub fn iter(&self) -> impl Iterator<Item = (BuildNumber, &AliasBucket)> {
		self.buckets.iter().map(|(&build, bucket)| (build, bucket))
	}

	/// Number of builds with at least one alias.
	pub fn len(&self) -> usize {
		self.buckets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buckets.is_empty()
	}
}

impl From<Vec<BucketRecord>> for AliasRegistry {
	fn from(records: Vec<BucketRecord>) -> Self {
		let mut registry = Self::new();
		for record in records {
			registry.add(record.build, record.aliases.iter().cloned());
		}
		registry
	}
}

impl From<AliasRegistry> for Vec<BucketRecord> {
	fn from(registry: AliasRegistry) -> Self {
		registry
			.buckets
			.into_iter()
			.map(|(build, aliases)| BucketRecord { build, aliases })
			.collect()
	}
}
