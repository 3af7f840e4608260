//! Alias sources.
//!
//! A source turns a build into zero or more alias candidates. Sources are
//! trait objects so hosts can plug their own in; the persistable ones are
//! listed in [`SourceConfig`].

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::build::BuildContext;
use crate::log::BuildLog;

pub mod template;

use template::{TemplateError, TemplateSource};

/// Producer of alias candidates for a build.
///
/// Candidates are raw strings; validation happens later in the collector.
/// Sources may write diagnostics to `log` but must not assume their output is
/// accepted.
pub trait AliasSource: Send + Sync + fmt::Debug {
	/// Short human-readable label used in diagnostics.
	fn label(&self) -> Cow<'_, str>;

	fn names(&self, build: &BuildContext, log: &mut dyn BuildLog) -> Result<Vec<String>, SourceError>;

	/// Persistable description of this source, `None` for sources that only
	/// exist in code.
	fn config(&self) -> Option<SourceConfig> {
		None
	}
}

/// Failure of one source while producing candidates.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
	#[error(transparent)]
	Template(#[from] TemplateError),
	#[error("{0}")]
	Failed(String),
}

/// Serializable description of a built-in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SourceConfig {
	/// Expands `template` against build metadata.
	Template { template: String },
}

impl SourceConfig {
	pub fn template(template: impl Into<String>) -> Self {
		Self::Template {
			template: template.into(),
		}
	}

	pub fn build(&self) -> Arc<dyn AliasSource> {
		match self {
			Self::Template { template } => Arc::new(TemplateSource::new(template.clone())),
		}
	}
}

/// Ordered list of configured sources.
#[derive(Clone, Debug, Default)]
pub struct SourceSet {
	sources: Vec<Arc<dyn AliasSource>>,
}

impl SourceSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_configs<'a>(configs: impl IntoIterator<Item = &'a SourceConfig>) -> Self {
		configs.into_iter().map(SourceConfig::build).collect()
	}

	pub fn with(mut self, source: impl AliasSource + 'static) -> Self {
		self.push(Arc::new(source));
		self
	}

	pub fn push(&mut self, source: Arc<dyn AliasSource>) {
		self.sources.push(source);
	}

	pub fn iter(&self) -> impl ExactSizeIterator<Item = &Arc<dyn AliasSource>> {
		self.sources.iter()
	}

	pub fn len(&self) -> usize {
		self.sources.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sources.is_empty()
	}

	/// Configs of the persistable sources, in order.
	pub fn configs(&self) -> Vec<SourceConfig> {
		self.sources.iter().filter_map(|s| s.config()).collect()
	}
}

impl FromIterator<Arc<dyn AliasSource>> for SourceSet {
	fn from_iter<I: IntoIterator<Item = Arc<dyn AliasSource>>>(iter: I) -> Self {
		Self {
			sources: iter.into_iter().collect(),
		}
	}
}
