use std::fmt;

use buildalias_primitives::AliasName;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free set of alias names attached to one build.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasBucket(IndexSet<AliasName>);

impl AliasBucket {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns `true` if `name` was not present yet.
	pub fn insert(&mut self, name: AliasName) -> bool {
		self.0.insert(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.contains(name)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Names in insertion order.
	pub fn iter(&self) -> impl ExactSizeIterator<Item = &AliasName> {
		self.0.iter()
	}
}

impl<'a> IntoIterator for &'a AliasBucket {
	type Item = &'a AliasName;
	type IntoIter = indexmap::set::Iter<'a, AliasName>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

impl IntoIterator for AliasBucket {
	type Item = AliasName;
	type IntoIter = indexmap::set::IntoIter<AliasName>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl Extend<AliasName> for AliasBucket {
	fn extend<I: IntoIterator<Item = AliasName>>(&mut self, iter: I) {
		self.0.extend(iter);
	}
}

impl FromIterator<AliasName> for AliasBucket {
	fn from_iter<I: IntoIterator<Item = AliasName>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// Renders as `[a, b, c]`.
impl fmt::Display for AliasBucket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[")?;
		for (i, name) in self.0.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			f.write_str(name)?;
		}
		f.write_str("]")
	}
}
