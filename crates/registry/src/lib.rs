//! Per-project alias registry.
//!
//! # Role
//!
//! Stores which alias names are attached to which build numbers and answers
//! "which build does this name point at right now".
//!
//! # Mental model
//!
//! * The registry is a map `BuildNumber -> AliasBucket`. A bucket is an
//!   insertion-ordered set of names.
//! * Writers only ever union names into one bucket or drop one whole bucket.
//! * Readers derive [`ResolvedAlias`] values on demand. When several builds
//!   carry the same name, the newest build (largest number) owns it. Write
//!   order never matters.
//!
//! # Invariants
//!
//! * No bucket contains the same name twice.
//! * Every stored name passed validation (enforced by [`AliasName`]).
//! * No bucket is stored empty.
//! * [`AliasRegistry::resolve_all`] yields at most one entry per name, sorted
//!   by name.
//! * Deleting a bucket leaves every other bucket untouched.
//!
//! # Concurrency
//!
//! The registry is plain data with `&mut self` writers. The owning project is
//! responsible for serializing writers and persistence.
//!
//! [`AliasName`]: buildalias_primitives::AliasName

mod bucket;
mod registry;
mod resolved;

pub use bucket::AliasBucket;
pub use buildalias_primitives::{AliasName, BuildNumber};
pub use registry::AliasRegistry;
pub use resolved::{BuildLookup, ResolvedAlias, resolve_permalink};
