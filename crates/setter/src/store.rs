//! Project persistence.
//!
//! [`TomlProjectStore`] keeps one TOML document per project under
//! `<root>/<project>/aliases.toml`.
//!
//! # Invariants
//!
//! * Writes go to a synced temp file in the project directory that is then
//!   renamed over the document, so a crash mid-write leaves the previous
//!   document intact and readers never see a partial one.
//! * Saves and [`ProjectStore::update`] hold an exclusive `flock` on
//!   `<root>/<project>/aliases.lock`, so separate processes working on the
//!   same project serialize their read-modify-write cycles.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::project::ProjectRecord;

/// File name of a project document inside its directory.
const DOCUMENT: &str = "aliases.toml";

/// Lock file guarding the document, next to it.
const LOCK: &str = "aliases.lock";

/// Durable storage for project documents.
pub trait ProjectStore: Send + Sync {
	fn save(&self, record: &ProjectRecord) -> Result<(), PersistError>;

	/// `Ok(None)` if the project was never saved.
	fn load(&self, name: &str) -> Result<Option<ProjectRecord>, PersistError>;

	/// Loads `name`, lets `edit` derive the next document from it and saves
	/// that.
	///
	/// Stores shared between processes override this to hold an exclusive
	/// lock across the whole cycle. The default does not lock.
	fn update(
		&self,
		name: &str,
		edit: &mut dyn FnMut(Option<ProjectRecord>) -> ProjectRecord,
	) -> Result<(), PersistError> {
		let record = edit(self.load(name)?);
		self.save(&record)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
	#[error("invalid project name {0:?}")]
	InvalidName(String),
	#[error("failed to read {}: {source}", path.display())]
	Read { path: PathBuf, source: io::Error },
	#[error("failed to write {}: {source}", path.display())]
	Write { path: PathBuf, source: io::Error },
	#[error("failed to lock {}: {source}", path.display())]
	Lock { path: PathBuf, source: io::Error },
	#[error("failed to encode project '{project}': {source}")]
	Encode { project: String, source: toml::ser::Error },
	#[error("failed to parse {}: {source}", path.display())]
	Decode { path: PathBuf, source: toml::de::Error },
	#[error("{0}")]
	Backend(String),
}

#[derive(Debug, Clone)]
pub struct TomlProjectStore {
	root: PathBuf,
}

impl TomlProjectStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Location of the document for `name`.
	///
	/// Names must be a single path component.
	pub fn path_for(&self, name: &str) -> Result<PathBuf, PersistError> {
		let invalid = name.is_empty()
			|| name == "."
			|| name == ".."
			|| name.starts_with('.')
			|| name.contains(['/', '\\', '\0']);
		if invalid {
			return Err(PersistError::InvalidName(name.to_string()));
		}
		Ok(self.root.join(name).join(DOCUMENT))
	}

	/// Names of every stored project, sorted.
	pub fn list(&self) -> Result<Vec<String>, PersistError> {
		let entries = match std::fs::read_dir(&self.root) {
			Ok(entries) => entries,
			Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(source) => {
				return Err(PersistError::Read {
					path: self.root.clone(),
					source,
				});
			}
		};

		let mut names: Vec<String> = entries
			.filter_map(Result::ok)
			.filter(|entry| entry.path().join(DOCUMENT).is_file())
			.filter_map(|entry| entry.file_name().into_string().ok())
			.collect();
		names.sort();
		Ok(names)
	}

	/// Blocks until this process holds the project's lock file.
	fn lock(&self, name: &str) -> Result<ProjectLock, PersistError> {
		let document = self.path_for(name)?;
		let path = document.with_file_name(LOCK);
		ProjectLock::acquire(&path).map_err(|source| PersistError::Lock { path, source })
	}

	fn write(&self, path: &Path, record: &ProjectRecord) -> Result<(), PersistError> {
		let text = toml::to_string(record).map_err(|source| PersistError::Encode {
			project: record.name.clone(),
			source,
		})?;
		write_atomic(path, &text).map_err(|source| PersistError::Write {
			path: path.to_path_buf(),
			source,
		})?;
		tracing::debug!(project = %record.name, path = %path.display(), "project saved");
		Ok(())
	}
}

impl ProjectStore for TomlProjectStore {
	fn save(&self, record: &ProjectRecord) -> Result<(), PersistError> {
		let path = self.path_for(&record.name)?;
		let _lock = self.lock(&record.name)?;
		self.write(&path, record)
	}

	fn update(
		&self,
		name: &str,
		edit: &mut dyn FnMut(Option<ProjectRecord>) -> ProjectRecord,
	) -> Result<(), PersistError> {
		let _lock = self.lock(name)?;
		let record = edit(self.load(name)?);
		self.write(&self.path_for(&record.name)?, &record)
	}

	fn load(&self, name: &str) -> Result<Option<ProjectRecord>, PersistError> {
		let path = self.path_for(name)?;
		let text = match std::fs::read_to_string(&path) {
			Ok(text) => text,
			Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(source) => return Err(PersistError::Read { path, source }),
		};
		let record: ProjectRecord = toml::from_str(&text).map_err(|source| PersistError::Decode {
			path: path.clone(),
			source,
		})?;
		if record.name != name {
			tracing::warn!(expected = name, found = %record.name, path = %path.display(), "project document name mismatch");
		}
		Ok(Some(record))
	}
}

/// Exclusive hold on one project's lock file, released on drop.
struct ProjectLock {
	#[cfg(unix)]
	_file: nix::fcntl::Flock<File>,
	#[cfg(not(unix))]
	_file: File,
}

impl ProjectLock {
	fn acquire(path: &Path) -> io::Result<Self> {
		if let Some(dir) = path.parent() {
			std::fs::create_dir_all(dir)?;
		}
		let file = OpenOptions::new().create(true).truncate(false).write(true).open(path)?;

		#[cfg(unix)]
		let file = nix::fcntl::Flock::lock(file, nix::fcntl::FlockArg::LockExclusive)
			.map_err(|(_, errno)| io::Error::from(errno))?;

		Ok(Self { _file: file })
	}
}

fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
	let dir = path.parent().unwrap_or_else(|| Path::new("."));
	std::fs::create_dir_all(dir)?;

	let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
	tmp.write_all(text.as_bytes())?;
	tmp.as_file().sync_all()?;
	tmp.persist(path).map_err(io::Error::from)?;
	Ok(())
}

/// In-process store, for hosts that persist elsewhere and for tests.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
	records: Mutex<HashMap<String, ProjectRecord>>,
	saves: Mutex<usize>,
}

impl MemoryProjectStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of successful saves so far.
	pub fn saves(&self) -> usize {
		*self.saves.lock()
	}

	pub fn get(&self, name: &str) -> Option<ProjectRecord> {
		self.records.lock().get(name).cloned()
	}
}

impl ProjectStore for MemoryProjectStore {
	fn save(&self, record: &ProjectRecord) -> Result<(), PersistError> {
		self.records.lock().insert(record.name.clone(), record.clone());
		*self.saves.lock() += 1;
		Ok(())
	}

	fn load(&self, name: &str) -> Result<Option<ProjectRecord>, PersistError> {
		Ok(self.get(name))
	}

	fn update(
		&self,
		name: &str,
		edit: &mut dyn FnMut(Option<ProjectRecord>) -> ProjectRecord,
	) -> Result<(), PersistError> {
		let mut records = self.records.lock();
		let record = edit(records.get(name).cloned());
		records.insert(record.name.clone(), record);
		*self.saves.lock() += 1;
		Ok(())
	}
}
