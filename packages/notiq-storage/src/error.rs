use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("No cached schema for database {database:?}.")]
	NotFound { database: String },
	#[error("Failed to read schema snapshot at {path:?}.")]
	ReadSnapshot { path: PathBuf, source: std::io::Error },
	#[error("Failed to parse schema snapshot at {path:?}.")]
	ParseSnapshot { path: PathBuf, source: serde_json::Error },
	#[error("Failed to serialize schema snapshot.")]
	Serialize(#[source] serde_json::Error),
	/// The previous snapshot on disk is left untouched.
	#[error("Failed to persist schema snapshot to {path:?}.")]
	Persist { path: PathBuf, source: std::io::Error },
}

/// A single database that could not be fetched during a refresh.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
	pub message: String,
}
impl FetchError {
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}
