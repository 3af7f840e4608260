use std::fmt;

use buildalias_primitives::{AliasName, BuildNumber};

use crate::registry::AliasRegistry;

/// One alias together with the build that currently owns it.
///
/// Derived from [`AliasRegistry`] state on every read, never stored.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolvedAlias {
	pub name: AliasName,
	pub build: BuildNumber,
}

impl ResolvedAlias {
	pub fn new(name: AliasName, build: BuildNumber) -> Self {
		Self { name, build }
	}

	/// Looks the owning build up in the host.
	pub fn resolve<L: BuildLookup + ?Sized>(&self, host: &L) -> Option<L::Build> {
		host.build_by_number(self.build)
	}
}

impl fmt::Display for ResolvedAlias {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Build alias '{}' for #{}", self.name, self.build)
	}
}

/// Host-side build index used to turn a build number back into a build.
pub trait BuildLookup {
	type Build;

	/// `None` if the host no longer has this build.
	fn build_by_number(&self, number: BuildNumber) -> Option<Self::Build>;
}

impl<F, B> BuildLookup for F
where
	F: Fn(BuildNumber) -> Option<B>,
{
	type Build = B;

	fn build_by_number(&self, number: BuildNumber) -> Option<B> {
		self(number)
	}
}

/// Resolves `name` to the host's build handle.
///
/// Returns `None` if no build carries the alias or the owning build is gone
/// from the host.
pub fn resolve_permalink<L: BuildLookup + ?Sized>(
	registry: &AliasRegistry,
	name: &str,
	host: &L,
) -> Option<L::Build> {
	host.build_by_number(registry.resolve(name)?)
}
