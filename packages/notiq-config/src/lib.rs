mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Cache, Config, Database, NotionConfig, Query, Service};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (key, value) in [
		("service.log_level", &cfg.service.log_level),
		("notion.api_base", &cfg.notion.api_base),
		("notion.api_key", &cfg.notion.api_key),
		("notion.notion_version", &cfg.notion.notion_version),
		("cache.path", &cfg.cache.path),
	] {
		if value.trim().is_empty() {
			return Err(Error::invalid(key, "must be non-empty."));
		}
	}

	if cfg.notion.timeout_ms == 0 {
		return Err(Error::invalid("notion.timeout_ms", "must be greater than zero."));
	}

	if let Some(page_size) = cfg.notion.page_size
		&& !(1..=100).contains(&page_size)
	{
		return Err(Error::invalid("notion.page_size", "must be in the range 1-100."));
	}

	for (key, value) in &cfg.notion.default_headers {
		if !value.is_string() {
			return Err(Error::invalid(
				format!("notion.default_headers.{key}"),
				"must be a string.",
			));
		}
	}

	if cfg.databases.is_empty() {
		return Err(Error::invalid("databases", "must declare at least one database."));
	}

	let mut seen = HashSet::new();

	for (name, db) in &cfg.databases {
		if db.id.trim().is_empty() {
			return Err(Error::invalid(format!("databases.{name}.id"), "must be non-empty."));
		}
		if !seen.insert(name.to_lowercase()) {
			return Err(Error::invalid(
				format!("databases.{name}"),
				"must be unique ignoring case.",
			));
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.notion.api_base = cfg.notion.api_base.trim_end_matches('/').to_string();

	for db in cfg.databases.values_mut() {
		db.id = db.id.trim().to_string();

		if db.description.as_deref().map(|text| text.trim().is_empty()).unwrap_or(false) {
			db.description = None;
		}
	}
}
