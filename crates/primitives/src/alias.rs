use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::validate::{AliasValidator, Rejection};

/// A validated alias name.
///
/// Holding an `AliasName` proves the string passed the built-in naming rules:
/// it is non-empty, is not an integer and does not shadow a built-in
/// permalink. Comparison and ordering are case-sensitive and lexicographic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AliasName(Box<str>);

impl AliasName {
	/// Validates `candidate` against the built-in rules.
	pub fn new(candidate: impl Into<String>) -> Result<Self, Rejection> {
		let candidate = candidate.into();
		AliasValidator::default().validate(&candidate)?;
		Ok(Self(candidate.into_boxed_str()))
	}

	/// Wraps a string the caller has already run through a validator.
	pub(crate) fn from_validated(candidate: String) -> Self {
		debug_assert!(!candidate.is_empty(), "validated alias must not be empty");
		Self(candidate.into_boxed_str())
	}

	#[inline]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Deref for AliasName {
	type Target = str;

	fn deref(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for AliasName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl Borrow<str> for AliasName {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for AliasName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl TryFrom<String> for AliasName {
	type Error = Rejection;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		Self::new(s)
	}
}

impl TryFrom<&str> for AliasName {
	type Error = Rejection;

	fn try_from(s: &str) -> Result<Self, Self::Error> {
		Self::new(s)
	}
}

impl From<AliasName> for String {
	fn from(name: AliasName) -> Self {
		name.0.into_string()
	}
}

#[cfg(test)]
mod tests {
	use serde::Deserialize;

	use super::*;

	#[derive(Debug, Deserialize)]
	struct Doc {
		alias: AliasName,
	}

	#[test]
	fn new_rejects_invalid_names() {
		assert_eq!(AliasName::new(""), Err(Rejection::Empty));
		assert!(matches!(AliasName::new("17"), Err(Rejection::Numeric { .. })));
		assert!(matches!(AliasName::new("LASTBUILD"), Err(Rejection::Permalink { .. })));
	}

	#[test]
	fn storage_is_case_sensitive() {
		let lower = AliasName::new("release").unwrap();
		let upper = AliasName::new("Release").unwrap();
		assert_ne!(lower, upper);
		assert!(upper < lower);
	}

	#[test]
	fn deserialize_validates() {
		let doc: Doc = toml::from_str(r#"alias = "1.480.3-SNAPSHOT""#).unwrap();
		assert_eq!(doc.alias.as_str(), "1.480.3-SNAPSHOT");

		let err = toml::from_str::<Doc>(r#"alias = "lastBuild""#).unwrap_err();
		assert!(err.to_string().contains("lastBuild"), "{err}");
	}
}
