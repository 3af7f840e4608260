use std::borrow::Cow;
use std::sync::Arc;

use buildalias_setter::{
	AliasSetter, AliasSource, BuildContext, BuildLog, BuildNumber, BuildOutcome, DanglingAliasReaper, MemoryProjectStore,
	PersistError, Project, ProjectRecord, ProjectStore, ReapOutcome, SetterError, SourceConfig, SourceError, SourceSet,
	TemplateSource, TomlProjectStore, TriggerOutcome,
};
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Fixed(&'static [&'static str]);

impl AliasSource for Fixed {
	fn label(&self) -> Cow<'_, str> {
		"fixed".into()
	}

	fn names(&self, _: &BuildContext, _: &mut dyn BuildLog) -> Result<Vec<String>, SourceError> {
		Ok(self.0.iter().map(|s| s.to_string()).collect())
	}
}

/// Store whose saves always fail.
#[derive(Debug, Default)]
struct ReadOnlyStore;

impl ProjectStore for ReadOnlyStore {
	fn save(&self, _: &ProjectRecord) -> Result<(), PersistError> {
		Err(PersistError::Backend("store is read-only".into()))
	}

	fn load(&self, _: &str) -> Result<Option<ProjectRecord>, PersistError> {
		Ok(None)
	}
}

fn n(value: u32) -> BuildNumber {
	BuildNumber::new(value).unwrap()
}

fn build(number: u32) -> BuildContext {
	BuildContext::new("core", n(number))
}

fn resolved(project: &Project) -> Vec<(String, u32)> {
	project
		.resolve_all()
		.into_iter()
		.map(|alias| (alias.name.to_string(), alias.build.get()))
		.collect()
}

fn bucket_of(project: &Project, number: u32) -> Vec<String> {
	project
		.aliases_for(n(number))
		.map(|bucket| bucket.iter().map(|name| name.to_string()).collect())
		.unwrap_or_default()
}

#[test]
fn mixed_candidates_keep_only_valid_aliases() {
	let store = Arc::new(MemoryProjectStore::new());
	let project = Project::new("core", store.clone()).with_sources(SourceSet::new().with(Fixed(&[
		"",
		"valid-alias",
		"42",
		"lastUnsuccessfulBuild",
		"",
		"1.480.3-SNAPSHOT",
	])));
	let mut log: Vec<String> = Vec::new();

	let (scope, first) = AliasSetter::new(&project).set_up(&build(42), &mut log);
	first.unwrap();
	drop(scope);

	assert_eq!(bucket_of(&project, 42), vec!["valid-alias", "1.480.3-SNAPSHOT"]);
	assert_eq!(
		log,
		vec![
			"alias-setter: custom build alias '42' collides with build-number addressing".to_string(),
			"alias-setter: custom build alias 'lastUnsuccessfulBuild' collides with built-in permalink 'lastUnsuccessfulBuild'"
				.to_string(),
			"alias-setter: setting build aliases [valid-alias, 1.480.3-SNAPSHOT]".to_string(),
		]
	);
	assert_eq!(store.saves(), 1);
}

#[test]
fn sources_changed_mid_build_are_seen_by_the_second_pass() {
	let project = Project::new("core", Arc::new(MemoryProjectStore::new()))
		.with_sources(SourceSet::new().with(Fixed(&["valid-alias"])));
	let mut log: Vec<String> = Vec::new();

	let (scope, first) = AliasSetter::new(&project).set_up(&build(7), &mut log);
	first.unwrap();
	project.set_sources(SourceSet::new().with(Fixed(&["1.480.3"])));
	scope
		.tear_down(&build(7).with_outcome(BuildOutcome::Success), &mut log)
		.unwrap();

	assert_eq!(bucket_of(&project, 7), vec!["valid-alias", "1.480.3"]);
	assert_eq!(project.registry().unwrap().len(), 1);
}

#[test]
fn aggregated_builds_attach_at_start_and_end() {
	let project = Project::new("core", Arc::new(MemoryProjectStore::new())).with_sources(
		SourceSet::new()
			.with(TemplateSource::new("agg-$BUILD_NUMBER"))
			.with(TemplateSource::new("${BUILD_RESULT}-latest")),
	);
	let setter = AliasSetter::new(&project);
	let aggregator = setter.aggregator();
	let mut log: Vec<String> = Vec::new();

	let started = aggregator.start_build(&build(9), &mut log).unwrap();
	let ended = aggregator
		.end_build(&build(9).with_outcome(BuildOutcome::Failure), &mut log)
		.unwrap();

	assert!(matches!(started, TriggerOutcome::Attached { added: 1, .. }));
	assert!(matches!(ended, TriggerOutcome::Attached { added: 1, .. }));
	assert_eq!(bucket_of(&project, 9), vec!["agg-9", "FAILURE-latest"]);
	assert!(log[0].contains("BUILD_RESULT"));
}

#[test]
fn empty_collection_saves_nothing() {
	let store = Arc::new(MemoryProjectStore::new());
	let project = Project::new("core", store.clone()).with_sources(SourceSet::new().with(Fixed(&["", "lastBuild"])));
	let mut log: Vec<String> = Vec::new();

	let outcome = AliasSetter::new(&project).aggregator().start_build(&build(1), &mut log).unwrap();

	assert_eq!(outcome, TriggerOutcome::NothingSet);
	assert_eq!(log.last().map(String::as_str), Some("alias-setter: no build aliases set"));
	assert!(!project.has_aliases());
	assert_eq!(store.saves(), 0);
}

#[test]
fn failed_save_keeps_the_in_memory_update() {
	let project = Project::new("core", Arc::new(ReadOnlyStore)).with_sources(SourceSet::new().with(Fixed(&["rc"])));
	let mut log: Vec<String> = Vec::new();

	let (scope, first) = AliasSetter::new(&project).set_up(&build(4), &mut log);
	let Err(SetterError::Persist { build: failed, .. }) = first else {
		panic!("expected a persistence failure, got {first:?}");
	};
	assert_eq!(failed, n(4));
	assert_eq!(project.resolve("rc"), Some(n(4)));
	assert!(log.last().unwrap().starts_with("alias-setter: failed to save build aliases"));

	assert!(scope.tear_down(&build(4), &mut log).is_err());
}

#[test]
fn newest_build_wins_and_falls_back_after_deletion() {
	let store = Arc::new(MemoryProjectStore::new());
	let project = Project::new("core", store.clone()).with_sources(SourceSet::new().with(Fixed(&["stable"])));
	let setter = AliasSetter::new(&project);
	let mut log: Vec<String> = Vec::new();

	for number in [5, 3, 8] {
		setter.aggregator().start_build(&build(number), &mut log).unwrap();
	}
	assert_eq!(resolved(&project), vec![("stable".to_string(), 8)]);

	let reaper = DanglingAliasReaper::new();
	assert_eq!(reaper.on_deleted(&project, n(8)), ReapOutcome::Reaped { removed: 1 });
	assert_eq!(resolved(&project), vec![("stable".to_string(), 5)]);
	assert_eq!(reaper.on_deleted(&project, n(100)), ReapOutcome::Reaped { removed: 0 });
	assert_eq!(store.saves(), 5);
}

#[test]
fn reaper_ignores_projects_without_aliases() {
	let store = Arc::new(MemoryProjectStore::new());
	let project = Project::new("core", store.clone());

	assert_eq!(DanglingAliasReaper::new().on_deleted(&project, n(1)), ReapOutcome::NoRegistry);
	assert!(!project.has_aliases());
	assert_eq!(store.saves(), 0);
}

#[test]
fn reaper_save_failure_does_not_resurrect_the_bucket() {
	let project = Project::new("core", Arc::new(ReadOnlyStore)).with_sources(SourceSet::new().with(Fixed(&["rc"])));
	let _ = AliasSetter::new(&project).aggregator().start_build(&build(2), &mut Vec::<String>::new());

	assert_eq!(
		DanglingAliasReaper::new().on_deleted(&project, n(2)),
		ReapOutcome::PersistFailed { removed: 1 }
	);
	assert_eq!(project.resolve("rc"), None);
}

#[test]
fn duplicated_project_starts_without_aliases() {
	let project = Project::new("core", Arc::new(MemoryProjectStore::new()))
		.with_sources(SourceSet::from_configs(&[SourceConfig::template("nightly")]));
	AliasSetter::new(&project)
		.aggregator()
		.start_build(&build(1), &mut Vec::<String>::new())
		.unwrap();

	let copy = project.duplicate("core-copy");

	assert!(!copy.has_aliases());
	assert!(copy.resolve_all().is_empty());
	assert_eq!(copy.to_record().sources, vec![SourceConfig::template("nightly")]);
}

#[test]
fn file_store_survives_reopen() {
	let dir = tempfile::tempdir().expect("create tempdir");
	let store: Arc<dyn ProjectStore> = Arc::new(TomlProjectStore::new(dir.path()));
	let project = Project::new("core", Arc::clone(&store))
		.with_reserved(["latest"])
		.with_sources(SourceSet::from_configs(&[SourceConfig::template("v$VERSION")]));
	let mut log: Vec<String> = Vec::new();

	AliasSetter::new(&project)
		.aggregator()
		.start_build(&build(12).with_variable("VERSION", "2.0"), &mut log)
		.unwrap();

	let reopened = Project::open("core", store).unwrap().expect("project saved");
	assert_eq!(resolved(&reopened), vec![("v2.0".to_string(), 12)]);
	assert_eq!(reopened.to_record(), project.to_record());
	assert!(reopened.validator().validate("LATEST").is_err());
}

#[test]
fn concurrent_builds_are_all_retained() {
	let dir = tempfile::tempdir().expect("create tempdir");
	let store: Arc<dyn ProjectStore> = Arc::new(TomlProjectStore::new(dir.path()));
	let project = Project::new("core", Arc::clone(&store))
		.with_sources(SourceSet::from_configs(&[SourceConfig::template("b$BUILD_NUMBER"), SourceConfig::template("shared")]));

	std::thread::scope(|scope| {
		for number in 1..=16 {
			let project = &project;
			scope.spawn(move || {
				AliasSetter::new(project)
					.aggregator()
					.start_build(&build(number), &mut Vec::<String>::new())
					.unwrap();
			});
		}
	});

	let reopened = Project::open("core", store).unwrap().expect("project saved");
	let registry = reopened.registry().unwrap();
	assert_eq!(registry.len(), 16);
	assert_eq!(reopened.resolve("shared"), Some(n(16)));
	for number in 1..=16 {
		assert_eq!(reopened.resolve(&format!("b{number}")), Some(n(number)));
	}
}

#[test]
fn separate_handles_on_one_project_merge_their_builds() {
	let dir = tempfile::tempdir().expect("create tempdir");
	let store: Arc<dyn ProjectStore> = Arc::new(TomlProjectStore::new(dir.path()));
	Project::new("core", Arc::clone(&store))
		.with_sources(SourceSet::from_configs(&[SourceConfig::template("b$BUILD_NUMBER")]))
		.save()
		.unwrap();

	let first = Project::open("core", Arc::clone(&store)).unwrap().unwrap();
	let second = Project::open("core", Arc::clone(&store)).unwrap().unwrap();
	let mut log: Vec<String> = Vec::new();

	AliasSetter::new(&first).aggregator().start_build(&build(5), &mut log).unwrap();
	AliasSetter::new(&second).aggregator().start_build(&build(6), &mut log).unwrap();
	assert_eq!(resolved(&second), vec![("b5".to_string(), 5), ("b6".to_string(), 6)]);

	assert_eq!(DanglingAliasReaper::new().on_deleted(&first, n(5)), ReapOutcome::Reaped { removed: 1 });

	let reopened = Project::open("core", store).unwrap().unwrap();
	assert_eq!(resolved(&reopened), vec![("b6".to_string(), 6)]);
}

#[test]
fn builds_from_independent_stores_are_all_retained() {
	let dir = tempfile::tempdir().expect("create tempdir");
	let sources = [SourceConfig::template("b$BUILD_NUMBER")];
	Project::new("core", Arc::new(TomlProjectStore::new(dir.path())))
		.with_sources(SourceSet::from_configs(&sources))
		.save()
		.unwrap();

	std::thread::scope(|scope| {
		for number in 1..=8 {
			let root = dir.path().to_path_buf();
			scope.spawn(move || {
				let project = Project::open("core", Arc::new(TomlProjectStore::new(root)))
					.unwrap()
					.unwrap();
				AliasSetter::new(&project)
					.aggregator()
					.start_build(&build(number), &mut Vec::<String>::new())
					.unwrap();
			});
		}
	});

	let reopened = Project::open("core", Arc::new(TomlProjectStore::new(dir.path()))).unwrap().unwrap();
	assert_eq!(reopened.registry().unwrap().len(), 8);
}

#[test]
fn copied_project_directory_saves_under_its_own_name() {
	let dir = tempfile::tempdir().expect("create tempdir");
	let store: Arc<dyn ProjectStore> = Arc::new(TomlProjectStore::new(dir.path()));
	let core = Project::new("core", Arc::clone(&store))
		.with_sources(SourceSet::from_configs(&[SourceConfig::template("b$BUILD_NUMBER")]));
	AliasSetter::new(&core).aggregator().start_build(&build(1), &mut Vec::<String>::new()).unwrap();

	std::fs::create_dir_all(dir.path().join("fork")).unwrap();
	std::fs::copy(
		dir.path().join("core").join("aliases.toml"),
		dir.path().join("fork").join("aliases.toml"),
	)
	.unwrap();

	let fork = Project::open("fork", Arc::clone(&store)).unwrap().unwrap();
	assert_eq!(fork.name(), "fork");
	AliasSetter::new(&fork).aggregator().start_build(&build(2), &mut Vec::<String>::new()).unwrap();

	let core = Project::open("core", Arc::clone(&store)).unwrap().unwrap();
	assert_eq!(resolved(&core), vec![("b1".to_string(), 1)]);
	let fork = Project::open("fork", store).unwrap().unwrap();
	assert_eq!(fork.to_record().name, "fork");
	assert_eq!(resolved(&fork), vec![("b1".to_string(), 1), ("b2".to_string(), 2)]);
}
