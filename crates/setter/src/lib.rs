//! Attaches aliases to builds as they run and drops them when builds are
//! deleted.
//!
//! # Role
//!
//! This crate connects the host's build lifecycle to a project's
//! [`AliasRegistry`]. It owns the collection protocol, the project aggregate
//! that serializes registry writes with persistence, and the built-in alias
//! sources.
//!
//! # Data flow
//!
//! 1. Trigger: the host calls [`AliasSetter`] at one of four [`Trigger`]
//!    points (`before-run`/`after-run` for plain builds,
//!    `aggregation-start`/`aggregation-end` for aggregated ones).
//! 2. Collect: [`AliasCollector`] queries every configured [`AliasSource`] in
//!    order, drops empty candidates, deduplicates and validates.
//! 3. Record: the surviving names are unioned into the registry bucket of the
//!    build and the [`Project`] is saved through its [`ProjectStore`].
//! 4. Reap: on build deletion [`DanglingAliasReaper`] drops the bucket and
//!    saves again.
//!
//! # Failure modes
//!
//! * A failing source contributes nothing; the rest of the collection runs.
//! * A rejected candidate is reported on the build log and dropped.
//! * A failed save fails the trigger but keeps the in-memory registry update.
//!
//! [`AliasRegistry`]: buildalias_registry::AliasRegistry

mod build;
mod collect;
mod log;
mod project;
mod reaper;
mod setter;
mod source;
mod store;

pub use build::{BuildContext, BuildOutcome, ParseOutcomeError};
pub use buildalias_primitives::{AliasName, AliasValidator, BuildNumber, Rejection};
pub use buildalias_registry::{AliasBucket, AliasRegistry, BuildLookup, ResolvedAlias};
pub use collect::{AliasCollector, Collection};
pub use log::{BuildLog, LOG_TAG, WriterLog};
pub use project::{Project, ProjectRecord};
pub use reaper::{DanglingAliasReaper, ReapOutcome};
pub use setter::{AliasSetter, Aggregator, RunScope, SetterError, Trigger, TriggerOutcome};
pub use source::template::{TemplateError, TemplateSource};
pub use source::{AliasSource, SourceConfig, SourceError, SourceSet};
pub use store::{MemoryProjectStore, PersistError, ProjectStore, TomlProjectStore};
