//! Subcommand handlers.
//!
//! Every handler writes its operator-facing output to `out` and returns an
//! error for anything that should fail the process.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, bail};
use buildalias_setter::{
	AliasSetter, AliasValidator, BuildContext, BuildNumber, BuildOutcome, DanglingAliasReaper, Project,
	ProjectStore, ReapOutcome, SourceConfig, SourceSet, TemplateSource, TomlProjectStore, TriggerOutcome,
	WriterLog,
};

use crate::cli::{Cli, Command, Phase};

pub fn run(cli: &Cli, out: &mut dyn Write) -> anyhow::Result<()> {
	let store = Arc::new(TomlProjectStore::new(cli.store_root()));
	tracing::debug!(root = %store.root().display(), command = ?cli.command, "running command");

	match &cli.command {
		Command::Init {
			project,
			templates,
			reserved,
			force,
		} => init(&store, project, templates, reserved, *force, out),
		Command::Sources {
			project,
			templates,
			clear,
		} => sources(&store, project, templates, *clear, out),
		Command::Trigger {
			project,
			build,
			phase,
			vars,
			result,
		} => trigger(&store, project, *build, *phase, vars, *result, out),
		Command::Deleted { project, build } => deleted(&store, project, *build, out),
		Command::List { project } => list(&store, project, out),
		Command::Resolve { project, name } => resolve(&store, project, name, out),
		Command::Check { candidates, project } => check(&store, project.as_deref(), candidates, out),
		Command::Copy { from, to } => copy(&store, from, to, out),
	}
}

fn open(store: &Arc<TomlProjectStore>, name: &str) -> anyhow::Result<Project> {
	let store: Arc<dyn ProjectStore> = store.clone();
	Project::open(name, store)
		.with_context(|| format!("failed to load project '{name}'"))?
		.with_context(|| format!("unknown project '{name}'"))
}

fn exists(store: &TomlProjectStore, name: &str) -> anyhow::Result<bool> {
	Ok(store.load(name)?.is_some())
}

fn template_sources(templates: &[String]) -> SourceSet {
	let configs: Vec<SourceConfig> = templates.iter().map(SourceConfig::template).collect();
	SourceSet::from_configs(&configs)
}

/// Static templates expand to themselves, so a rejection now means a
/// rejection on every build.
fn warn_static_rejects(validator: &AliasValidator, templates: &[String], out: &mut dyn Write) -> anyhow::Result<()> {
	for template in templates {
		if !TemplateSource::new(template.as_str()).is_static() {
			continue;
		}
		if let Err(rejection) = validator.validate(template) {
			writeln!(out, "warning: template '{template}' will never produce an alias: {rejection}")?;
		}
	}
	Ok(())
}

fn init(
	store: &Arc<TomlProjectStore>,
	name: &str,
	templates: &[String],
	reserved: &[String],
	force: bool,
	out: &mut dyn Write,
) -> anyhow::Result<()> {
	if !force && exists(store, name)? {
		bail!("project '{name}' already exists, pass --force to replace it");
	}

	let project = Project::new(name, store.clone())
		.with_reserved(reserved)
		.with_sources(template_sources(templates));
	warn_static_rejects(project.validator(), templates, out)?;
	project.save()?;

	tracing::info!(project = name, sources = templates.len(), "project created");
	writeln!(out, "created project '{name}' with {} source(s)", templates.len())?;
	Ok(())
}

fn sources(
	store: &Arc<TomlProjectStore>,
	name: &str,
	templates: &[String],
	clear: bool,
	out: &mut dyn Write,
) -> anyhow::Result<()> {
	let project = open(store, name)?;

	if templates.is_empty() && !clear {
		for config in project.sources().configs() {
			match config {
				SourceConfig::Template { template } => writeln!(out, "template: {template}")?,
			}
		}
		return Ok(());
	}

	warn_static_rejects(project.validator(), templates, out)?;
	project.set_sources(template_sources(templates));
	project.save_settings()?;
	writeln!(out, "project '{name}' now has {} source(s)", templates.len())?;
	Ok(())
}

fn trigger(
	store: &Arc<TomlProjectStore>,
	name: &str,
	build: BuildNumber,
	phase: Phase,
	vars: &[(String, String)],
	result: Option<BuildOutcome>,
	out: &mut dyn Write,
) -> anyhow::Result<()> {
	let project = open(store, name)?;

	let mut context = BuildContext::new(name, build);
	for (key, value) in vars {
		context = context.with_variable(key.as_str(), value.as_str());
	}
	if let Some(outcome) = result {
		context = context.with_outcome(outcome);
	}

	let mut log = WriterLog::new(&mut *out);
	let outcome = AliasSetter::new(&project).trigger(phase.into(), &context, &mut log)?;
	if let TriggerOutcome::Attached { added, .. } = outcome {
		tracing::info!(project = name, %build, added, "aliases attached");
	}
	Ok(())
}

fn deleted(store: &Arc<TomlProjectStore>, name: &str, build: BuildNumber, out: &mut dyn Write) -> anyhow::Result<()> {
	let project = open(store, name)?;

	match DanglingAliasReaper::new().on_deleted(&project, build) {
		ReapOutcome::NoRegistry => writeln!(out, "project '{name}' has no aliases")?,
		ReapOutcome::Reaped { removed } => writeln!(out, "removed {removed} alias(es) of #{build}")?,
		ReapOutcome::PersistFailed { .. } => bail!("failed to save project '{name}' after removing aliases of #{build}"),
	}
	Ok(())
}

fn list(store: &Arc<TomlProjectStore>, name: &str, out: &mut dyn Write) -> anyhow::Result<()> {
	for alias in open(store, name)?.resolve_all() {
		writeln!(out, "{alias}")?;
	}
	Ok(())
}

fn resolve(store: &Arc<TomlProjectStore>, name: &str, alias: &str, out: &mut dyn Write) -> anyhow::Result<()> {
	let Some(build) = open(store, name)?.resolve(alias) else {
		bail!("no build of '{name}' carries alias '{alias}'");
	};
	writeln!(out, "{build}")?;
	Ok(())
}

fn check(
	store: &Arc<TomlProjectStore>,
	project: Option<&str>,
	candidates: &[String],
	out: &mut dyn Write,
) -> anyhow::Result<()> {
	let validator = match project {
		Some(name) => open(store, name)?.validator().clone(),
		None => AliasValidator::new(),
	};

	let mut rejected = 0usize;
	for candidate in candidates {
		match validator.validate(candidate) {
			Ok(()) => writeln!(out, "ok: {candidate}")?,
			Err(rejection) => {
				rejected += 1;
				writeln!(out, "rejected: {rejection}")?;
			}
		}
	}

	if rejected > 0 {
		bail!("{rejected} of {} candidate(s) rejected", candidates.len());
	}
	Ok(())
}

fn copy(store: &Arc<TomlProjectStore>, from: &str, to: &str, out: &mut dyn Write) -> anyhow::Result<()> {
	if exists(store, to)? {
		bail!("project '{to}' already exists");
	}
	let copy = open(store, from)?.duplicate(to);
	copy.save()?;
	writeln!(out, "copied '{from}' to '{to}' without aliases")?;
	Ok(())
}
