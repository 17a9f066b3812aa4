pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<notiq_domain::Error> for Error {
	fn from(err: notiq_domain::Error) -> Self {
		match err {
			notiq_domain::Error::NotFound { .. } => Self::NotFound { message: err.to_string() },
			notiq_domain::Error::InvalidFilter { .. } =>
				Self::InvalidRequest { message: err.to_string() },
		}
	}
}

impl From<notiq_storage::Error> for Error {
	fn from(err: notiq_storage::Error) -> Self {
		match err {
			notiq_storage::Error::NotFound { .. } => Self::NotFound { message: err.to_string() },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<notiq_providers::Error> for Error {
	fn from(err: notiq_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
