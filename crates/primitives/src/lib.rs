//! Core value types for build aliases: build numbers, alias names and the
//! naming rules every alias has to satisfy.

/// Alias name newtype.
pub mod alias;
/// Build number newtype.
pub mod build;
/// Alias validation rules.
pub mod validate;

pub use alias::AliasName;
pub use build::{BuildNumber, BuildNumberError};
pub use validate::{AliasValidator, BUILTIN_PERMALINKS, Rejection, validate};
