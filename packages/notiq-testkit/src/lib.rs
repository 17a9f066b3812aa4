mod error;

pub use error::{Error, Result};

use std::{
	collections::{BTreeMap, HashMap},
	path::{Path, PathBuf},
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use tempfile::TempDir;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use notiq_domain::{Property, SelectOption};
use notiq_storage::{BoxFuture, FetchError, RemoteDatabase, SchemaFetcher, SchemaStore};

/// A pinned instant for tests, parsed from RFC 3339.
pub fn instant(raw: &str) -> Result<OffsetDateTime> {
	Ok(OffsetDateTime::parse(raw, &Rfc3339)?)
}

pub fn property(name: &str, kind: &str) -> Property {
	Property {
		id: format!("{kind}-{}", name.to_lowercase().replace(' ', "-")),
		kind: kind.to_string(),
		name: name.to_string(),
		options: None,
	}
}

/// An enumerated property; `kind` is `select`, `status` or `multi_select`.
pub fn enumerated_property(name: &str, kind: &str, options: &[(&str, &str)]) -> Property {
	Property {
		options: Some(
			options
				.iter()
				.enumerate()
				.map(|(index, (option, color))| SelectOption {
					id: format!("opt-{index}"),
					name: option.to_string(),
					color: color.to_string(),
				})
				.collect(),
		),
		..property(name, kind)
	}
}

pub fn remote_database(id: &str, properties: Vec<Property>) -> RemoteDatabase {
	RemoteDatabase {
		id: id.to_string(),
		properties: properties.into_iter().map(|property| (property.name.clone(), property)).collect(),
	}
}

/// A snapshot file inside a temporary directory that is removed on drop.
pub struct TempSnapshot {
	_dir: TempDir,
	path: PathBuf,
}
impl TempSnapshot {
	pub fn new() -> Result<Self> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("cache").join("schemas.json");

		Ok(Self { _dir: dir, path })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn store(&self) -> SchemaStore {
		SchemaStore::new(&self.path)
	}
}

/// Answers fetches from a fixed table; ids missing from the table fail.
#[derive(Default)]
pub struct ScriptedFetcher {
	responses: HashMap<String, std::result::Result<RemoteDatabase, String>>,
	delays: HashMap<String, Duration>,
	calls: AtomicUsize,
	seen: Mutex<Vec<String>>,
}
impl ScriptedFetcher {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_database(mut self, database: RemoteDatabase) -> Self {
		self.responses.insert(database.id.clone(), Ok(database));

		self
	}

	pub fn with_failure(mut self, database_id: &str, message: &str) -> Self {
		self.responses.insert(database_id.to_string(), Err(message.to_string()));

		self
	}

	/// Holds the response for `database_id` back by `delay`, to shuffle completion order.
	pub fn with_delay(mut self, database_id: &str, delay: Duration) -> Self {
		self.delays.insert(database_id.to_string(), delay);

		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn seen(&self) -> Vec<String> {
		let mut seen = self.seen.lock().unwrap_or_else(|err| err.into_inner()).clone();

		seen.sort();

		seen
	}
}
impl SchemaFetcher for ScriptedFetcher {
	fn fetch<'a>(
		&'a self,
		database_id: &'a str,
	) -> BoxFuture<'a, std::result::Result<RemoteDatabase, FetchError>> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.seen.lock().unwrap_or_else(|err| err.into_inner()).push(database_id.to_string());

			if let Some(delay) = self.delays.get(database_id) {
				tokio::time::sleep(*delay).await;
			}

			match self.responses.get(database_id) {
				Some(Ok(database)) => Ok(database.clone()),
				Some(Err(message)) => Err(FetchError::new(message.clone())),
				None => Err(FetchError::new(format!("Database {database_id} does not exist."))),
			}
		})
	}
}

pub fn ids(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
	pairs.iter().map(|(name, id)| (name.to_string(), id.to_string())).collect()
}
