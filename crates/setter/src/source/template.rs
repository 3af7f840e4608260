//! Template alias source.
//!
//! Expands macros in a configured template against build metadata:
//!
//! | Token | Expands to |
//! |---|---|
//! | `${BUILD_NUMBER}` | build number |
//! | `${BUILD_ID}` | start time, `YYYY-MM-DD_hh-mm-ss` (UTC) |
//! | `${JOB_NAME}` | project name |
//! | `${BUILD_RESULT}` | outcome, only once the build has finished |
//! | `${NAME}` | build variable `NAME` |
//!
//! `$NAME` is shorthand for `${NAME}` and `$$` is a literal `$`. A `$` that
//! starts no token is copied as-is.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{AliasSource, SourceConfig, SourceError};
use crate::build::BuildContext;
use crate::log::BuildLog;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\$(?:(\$)|\{([^}]*)(\})?|([A-Za-z_][A-Za-z0-9_]*))").expect("template token pattern")
});

static MACRO_NAME: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("macro name pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
	#[error("unknown macro '{0}'")]
	UnknownMacro(String),
	#[error("invalid macro '${{{0}}}'")]
	InvalidMacro(String),
	#[error("unterminated macro at offset {0}")]
	Unterminated(usize),
	#[error("macro 'BUILD_RESULT' is not available before the build completes")]
	ResultUnavailable,
}

/// Produces one alias by expanding a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
	template: String,
}

impl TemplateSource {
	pub fn new(template: impl Into<String>) -> Self {
		Self {
			template: template.into(),
		}
	}

	pub fn template(&self) -> &str {
		&self.template
	}

	/// `true` if the template contains no macros, so its expansion is the
	/// template itself and can be validated up front.
	pub fn is_static(&self) -> bool {
		TOKEN.captures_iter(&self.template).all(|caps| caps.get(1).is_some())
	}

	pub fn expand(&self, build: &BuildContext) -> Result<String, TemplateError> {
		expand(&self.template, build)
	}
}

impl AliasSource for TemplateSource {
	fn label(&self) -> Cow<'_, str> {
		format!("template '{}'", self.template).into()
	}

	fn names(&self, build: &BuildContext, _log: &mut dyn BuildLog) -> Result<Vec<String>, SourceError> {
		Ok(vec![self.expand(build)?])
	}

	fn config(&self) -> Option<SourceConfig> {
		Some(SourceConfig::template(self.template.clone()))
	}
}

/// Expands every macro in `template`.
pub fn expand(template: &str, build: &BuildContext) -> Result<String, TemplateError> {
	let mut out = String::with_capacity(template.len());
	let mut last = 0;

	for caps in TOKEN.captures_iter(template) {
		let Some(whole) = caps.get(0) else { continue };
		out.push_str(&template[last..whole.start()]);
		last = whole.end();
		out.push_str(&expand_token(&caps, whole.start(), build)?);
	}

	out.push_str(&template[last..]);
	Ok(out)
}

fn expand_token<'b>(caps: &Captures<'_>, offset: usize, build: &'b BuildContext) -> Result<Cow<'b, str>, TemplateError> {
	if caps.get(1).is_some() {
		return Ok(Cow::Borrowed("$"));
	}

	let name = match (caps.get(2), caps.get(3), caps.get(4)) {
		(Some(_), None, _) => return Err(TemplateError::Unterminated(offset)),
		(Some(inner), Some(_), _) => {
			let inner = inner.as_str().trim();
			if !MACRO_NAME.is_match(inner) {
				return Err(TemplateError::InvalidMacro(inner.to_string()));
			}
			inner
		}
		(None, _, Some(bare)) => bare.as_str(),
		(None, _, None) => unreachable!("token pattern has no other alternative"),
	};

	lookup(name, build)
}

fn lookup<'b>(name: &str, build: &'b BuildContext) -> Result<Cow<'b, str>, TemplateError> {
	match name {
		"BUILD_NUMBER" => Ok(Cow::Owned(build.number.to_string())),
		"BUILD_ID" => Ok(Cow::Owned(build.build_id())),
		"JOB_NAME" => Ok(Cow::Borrowed(build.project.as_str())),
		"BUILD_RESULT" => build
			.outcome
			.map(|outcome| Cow::Borrowed(outcome.as_str()))
			.ok_or(TemplateError::ResultUnavailable),
		_ => build
			.variable(name)
			.map(Cow::Borrowed)
			.ok_or_else(|| TemplateError::UnknownMacro(name.to_string())),
	}
}
