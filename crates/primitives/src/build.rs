use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Positive number identifying one build of a project.
///
/// Build numbers are assigned by the host, grow monotonically and are never
/// reused, so a larger number always denotes a newer build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildNumber(NonZeroU32);

impl BuildNumber {
	/// Returns `None` for zero.
	pub const fn new(number: u32) -> Option<Self> {
		match NonZeroU32::new(number) {
			Some(n) => Some(Self(n)),
			None => None,
		}
	}

	#[inline]
	pub const fn get(self) -> u32 {
		self.0.get()
	}
}

impl fmt::Display for BuildNumber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<NonZeroU32> for BuildNumber {
	fn from(n: NonZeroU32) -> Self {
		Self(n)
	}
}

impl TryFrom<u32> for BuildNumber {
	type Error = BuildNumberError;

	fn try_from(n: u32) -> Result<Self, Self::Error> {
		Self::new(n).ok_or(BuildNumberError::Zero)
	}
}

impl FromStr for BuildNumber {
	type Err = BuildNumberError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let n: u32 = s.trim_start_matches('#').parse().map_err(|_| BuildNumberError::Invalid(s.to_string()))?;
		Self::try_from(n)
	}
}

/// Failure to interpret a value as a [`BuildNumber`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildNumberError {
	#[error("build numbers start at 1")]
	Zero,
	#[error("invalid build number: {0:?}")]
	Invalid(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_is_not_a_build_number() {
		assert_eq!(BuildNumber::new(0), None);
		assert_eq!(BuildNumber::try_from(0), Err(BuildNumberError::Zero));
		assert_eq!("0".parse::<BuildNumber>(), Err(BuildNumberError::Zero));
	}

	#[test]
	fn parses_plain_and_hash_prefixed() {
		assert_eq!("42".parse::<BuildNumber>().map(BuildNumber::get), Ok(42));
		assert_eq!("#7".parse::<BuildNumber>().map(BuildNumber::get), Ok(7));
		assert!(matches!("x1".parse::<BuildNumber>(), Err(BuildNumberError::Invalid(_))));
	}

	#[test]
	fn newer_builds_order_after_older_ones() {
		let older = BuildNumber::new(5).unwrap();
		let newer = BuildNumber::new(9).unwrap();
		assert!(older < newer);
		assert_eq!(older.max(newer), newer);
	}
}
