mod error;

pub use error::{Error, FetchError, Result};

use std::{
	collections::{BTreeMap, HashMap},
	fs,
	future::Future,
	io::{self, Write},
	path::{Path, PathBuf},
	pin::Pin,
	sync::{Arc, RwLock},
};

use time::OffsetDateTime;
use tokio::{sync::Mutex, task::JoinSet};

use notiq_domain::{DatabaseDirectory, DatabaseSchema, Property, Snapshot};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Source of live schemas, normally the document database's HTTP API.
pub trait SchemaFetcher
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		database_id: &'a str,
	) -> BoxFuture<'a, Result<RemoteDatabase, FetchError>>;
}

/// What the external system reports for one database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteDatabase {
	pub id: String,
	pub properties: BTreeMap<String, Property>,
}

#[derive(Debug)]
pub struct RefreshFailure {
	pub database: String,
	pub database_id: String,
	pub error: FetchError,
}

#[derive(Debug, Default)]
pub struct RefreshOutcome {
	/// Everything that was fetched; this is exactly what was persisted.
	pub schemas: Snapshot,
	/// Sorted by database name.
	pub failures: Vec<RefreshFailure>,
}
impl RefreshOutcome {
	pub fn is_partial(&self) -> bool {
		!self.failures.is_empty()
	}
}

/// Locally persisted schema snapshot.
///
/// The file is only ever replaced whole: every write goes to its own staging file next to it,
/// which is synced and then renamed over the target. Readers see either the old or the new
/// snapshot, and concurrent writers, even from separate stores, end with the last rename.
pub struct SchemaStore {
	path: PathBuf,
	current: RwLock<Option<Snapshot>>,
	persist_lock: Mutex<()>,
}
impl SchemaStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), current: RwLock::new(None), persist_lock: Mutex::new(()) }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads the persisted snapshot, or `None` when nothing has been persisted yet.
	pub fn load(&self) -> Result<Option<Snapshot>> {
		let snapshot = match fs::read(&self.path) {
			Ok(raw) => Some(
				serde_json::from_slice::<Snapshot>(&raw)
					.map_err(|err| Error::ParseSnapshot { path: self.path.clone(), source: err })?,
			),
			Err(err) if err.kind() == io::ErrorKind::NotFound => {
				tracing::info!(path = %self.path.display(), "No cached schema snapshot found.");

				None
			},
			Err(err) => return Err(Error::ReadSnapshot { path: self.path.clone(), source: err }),
		};

		self.replace_current(snapshot.clone());

		Ok(snapshot)
	}

	/// Looks `name` up in the most recently loaded or refreshed snapshot.
	pub fn get(&self, name: &str) -> Result<DatabaseSchema> {
		let current = self.current.read().unwrap_or_else(|err| err.into_inner());

		current
			.as_ref()
			.and_then(|snapshot| lookup(snapshot, name))
			.cloned()
			.ok_or_else(|| Error::NotFound { database: name.to_string() })
	}

	pub fn snapshot(&self) -> Option<Snapshot> {
		self.current.read().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// Fetches every database in `ids` concurrently and persists the result as the new snapshot.
	///
	/// A failed fetch is logged and reported in [`RefreshOutcome::failures`]; it never aborts
	/// the batch. The snapshot is fully replaced, so a database whose fetch failed is absent
	/// afterwards even if an earlier snapshot had it. Only a failed write is an error.
	pub async fn refresh_all(
		&self,
		fetcher: Arc<dyn SchemaFetcher>,
		ids: &BTreeMap<String, String>,
		now: OffsetDateTime,
	) -> Result<RefreshOutcome> {
		let mut tasks = JoinSet::new();
		let mut pending = HashMap::new();

		for (name, id) in ids {
			let fetcher = Arc::clone(&fetcher);
			let database_id = id.clone();
			let handle = tasks.spawn(async move { fetcher.fetch(&database_id).await });

			pending.insert(handle.id(), (name.clone(), id.clone()));
		}

		let mut outcome = RefreshOutcome::default();

		while let Some(joined) = tasks.join_next_with_id().await {
			let (task_id, fetched) = match joined {
				Ok((task_id, fetched)) => (task_id, fetched),
				Err(err) => (err.id(), Err(FetchError::new(format!("Fetch task failed: {err}.")))),
			};
			let Some((database, database_id)) = pending.remove(&task_id) else {
				continue;
			};

			match fetched {
				Ok(remote) => {
					tracing::info!(
						database = %database,
						properties = remote.properties.len(),
						"Fetched database schema."
					);

					outcome.schemas.insert(
						database.clone(),
						DatabaseSchema {
							id: remote.id,
							title: database,
							properties: remote.properties,
							last_updated: now,
						},
					);
				},
				Err(error) => {
					tracing::warn!(
						database = %database,
						database_id = %database_id,
						error = %error,
						"Failed to fetch database schema."
					);

					outcome.failures.push(RefreshFailure { database, database_id, error });
				},
			}
		}

		outcome.failures.sort_by(|a, b| a.database.cmp(&b.database));

		self.persist(&outcome.schemas).await?;

		tracing::info!(
			path = %self.path.display(),
			cached = outcome.schemas.len(),
			failed = outcome.failures.len(),
			"Schema snapshot replaced."
		);

		Ok(outcome)
	}

	async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
		let payload = serde_json::to_vec_pretty(snapshot).map_err(Error::Serialize)?;
		let _guard = self.persist_lock.lock().await;
		let path = self.path.clone();

		tokio::task::spawn_blocking(move || write_atomically(&path, &payload))
			.await
			.map_err(io::Error::other)
			.and_then(|written| written)
			.map_err(|source| Error::Persist { path: self.path.clone(), source })?;

		// Still under the persist lock, so memory and disk agree on the last writer.
		self.replace_current(Some(snapshot.clone()));

		Ok(())
	}

	fn replace_current(&self, snapshot: Option<Snapshot>) {
		*self.current.write().unwrap_or_else(|err| err.into_inner()) = snapshot;
	}
}
impl DatabaseDirectory for SchemaStore {
	fn database_id(&self, name: &str) -> Option<String> {
		self.get(name).ok().map(|schema| schema.id)
	}
}

// The staging file is unique per write and removed on drop if the rename never happens.
fn write_atomically(path: &Path, payload: &[u8]) -> io::Result<()> {
	let parent = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	fs::create_dir_all(parent)?;

	let prefix = format!(
		".{}.",
		path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default()
	);
	let mut staging =
		tempfile::Builder::new().prefix(&prefix).suffix(".tmp").tempfile_in(parent)?;

	staging.write_all(payload)?;
	staging.as_file().sync_all()?;
	staging.persist(path).map_err(|err| err.error)?;

	fs::File::open(parent)?.sync_all()
}

fn lookup<'a>(snapshot: &'a Snapshot, name: &str) -> Option<&'a DatabaseSchema> {
	snapshot.get(name).or_else(|| {
		snapshot.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, schema)| schema)
	})
}
