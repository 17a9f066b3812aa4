pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Database {database:?} is not registered.")]
	NotFound { database: String },
	#[error("Invalid filter on {property:?}: {message}")]
	InvalidFilter { property: String, message: String },
}
