//! Alias naming rules.
//!
//! # Role
//!
//! Aliases share one symbolic namespace with build numbers and the host's
//! built-in permalinks. The validator rejects every candidate that could be
//! mistaken for either, so resolving a name is never ambiguous.
//!
//! # Rules
//!
//! Applied in order, first failure wins:
//!
//! 1. Empty string: [`Rejection::Empty`].
//! 2. Optional sign followed only by decimal digits of any script
//!    (`42`, `-7`, `٤٢`): [`Rejection::Numeric`].
//! 3. Case-insensitive match of a built-in permalink
//!    ([`Rejection::Permalink`]) or of an extra reserved name
//!    ([`Rejection::Reserved`]).
//!
//! Validation is pure and total over every `&str`.

use std::sync::LazyLock;

use regex::Regex;

use crate::AliasName;


/// Permalink names the host resolves on its own.
pub const BUILTIN_PERMALINKS: &[&str] = &[
	"lastBuild",
	"lastStableBuild",
	"lastSuccessfulBuild",
	"lastFailedBuild",
	"lastUnstableBuild",
	"lastUnsuccessfulBuild",
	"lastCompletedBuild",
];

/// Why a candidate cannot be used as an alias.
static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?\p{Nd}+$").expect("integer pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
	#[error("custom build alias is empty")]
	Empty,
	#[error("custom build alias '{candidate}' collides with build-number addressing")]
	Numeric { candidate: String },
	#[error("custom build alias '{candidate}' collides with built-in permalink '{permalink}'")]
	Permalink { candidate: String, permalink: String },
	#[error("custom build alias '{candidate}' collides with reserved name '{reserved}'")]
	Reserved { candidate: String, reserved: String },
}

/// Validates alias candidates against the built-in permalinks plus any
/// host-specific reserved names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasValidator {
	extra_reserved: Vec<Box<str>>,
}

impl AliasValidator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds reserved names on top of [`BUILTIN_PERMALINKS`].
	pub fn with_reserved<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		for name in names {
			let name = name.as_ref();
			if !name.is_empty() && !self.reserved().any(|r| r == name) {
				self.extra_reserved.push(name.into());
			}
		}
		self
	}

	/// All reserved names, built-ins first.
	pub fn reserved(&self) -> impl Iterator<Item = &str> {
		BUILTIN_PERMALINKS
			.iter()
			.copied()
			.chain(self.extra_reserved.iter().map(AsRef::as_ref))
	}

	/// Host-specific reserved names only.
	pub fn extra_reserved(&self) -> impl Iterator<Item = &str> {
		self.extra_reserved.iter().map(AsRef::as_ref)
	}

	pub fn validate(&self, candidate: &str) -> Result<(), Rejection> {
		if candidate.is_empty() {
			return Err(Rejection::Empty);
		}

		if is_integer(candidate) {
			return Err(Rejection::Numeric {
				candidate: candidate.to_string(),
			});
		}

		if let Some(permalink) = BUILTIN_PERMALINKS.iter().find(|r| eq_ignore_case(candidate, r)) {
			return Err(Rejection::Permalink {
				candidate: candidate.to_string(),
				permalink: permalink.to_string(),
			});
		}

		if let Some(reserved) = self.extra_reserved().find(|r| eq_ignore_case(candidate, r)) {
			return Err(Rejection::Reserved {
				candidate: candidate.to_string(),
				reserved: reserved.to_string(),
			});
		}

		Ok(())
	}

	/// Validates and converts in one step.
	pub fn check(&self, candidate: &str) -> Result<AliasName, Rejection> {
		self.validate(candidate)?;
		Ok(AliasName::from_validated(candidate.to_string()))
	}
}

/// Validates `candidate` against the built-in rules only.
pub fn validate(candidate: &str) -> Result<(), Rejection> {
	AliasValidator::default().validate(candidate)
}

/// Any digit string counts, regardless of magnitude: an alias of
/// `99999999999` would still read as a build reference. Digits from other
/// scripts count too, since hosts parse them as the same number.
fn is_integer(candidate: &str) -> bool {
	INTEGER.is_match(candidate)
}

/// Per-char comparison under both upper- and lower-case mappings, so
/// non-ASCII folds (e.g. KELVIN SIGN vs `k`) match too.
fn eq_ignore_case(a: &str, b: &str) -> bool {
	let mut a = a.chars();
	let mut b = b.chars();
	loop {
		match (a.next(), b.next()) {
			(None, None) => return true,
			(Some(x), Some(y)) if chars_match(x, y) => {}
			_ => return false,
		}
	}
}

fn chars_match(a: char, b: char) -> bool {
	a == b || a.to_uppercase().eq(b.to_uppercase()) || a.to_lowercase().eq(b.to_lowercase())
}
