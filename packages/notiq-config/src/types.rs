use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub notion: NotionConfig,
	pub cache: Cache,
	#[serde(default)]
	pub query: Query,
	/// Keyed by the name callers use when asking for a database, e.g. "tracker".
	pub databases: BTreeMap<String, Database>,
}
impl Config {
	/// Name to external id pairs, in the shape the schema refresh consumes.
	pub fn database_ids(&self) -> BTreeMap<String, String> {
		self.databases.iter().map(|(name, db)| (name.clone(), db.id.clone())).collect()
	}
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NotionConfig {
	pub api_base: String,
	pub api_key: String,
	pub notion_version: String,
	pub timeout_ms: u64,
	/// Optional. Notion caps this at 100.
	pub page_size: Option<u32>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Cache {
	/// Location of the persisted schema snapshot.
	pub path: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Query {
	/// Reject filters that reference unknown properties or mismatched types before execution.
	#[serde(default)]
	pub validate_filters: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Database {
	pub id: String,
	pub description: Option<String>,
}
