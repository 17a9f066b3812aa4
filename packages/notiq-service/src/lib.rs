pub mod format;
pub mod prompt;
pub mod request;

mod error;

pub use error::{Error, Result};
pub use request::{InterpreterRequest, QueryParams, QueryRequest, SearchRequest};

use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;

use notiq_config::Config;
use notiq_domain::{
	CompiledQuery, DatabaseRegistry, DatabaseSchema, QueryCompiler, Snapshot, validate,
};
use notiq_providers::NotionClient;
use notiq_storage::{BoxFuture, RefreshOutcome, SchemaFetcher, SchemaStore};

/// Runs compiled queries and page searches against the document database.
pub trait QueryExecutor
where
	Self: Send + Sync,
{
	fn execute<'a>(
		&'a self,
		query: &'a CompiledQuery,
	) -> BoxFuture<'a, notiq_providers::Result<Vec<Value>>>;

	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, notiq_providers::Result<Vec<Value>>>;
}
impl QueryExecutor for NotionClient {
	fn execute<'a>(
		&'a self,
		query: &'a CompiledQuery,
	) -> BoxFuture<'a, notiq_providers::Result<Vec<Value>>> {
		Box::pin(self.query_database(query))
	}

	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, notiq_providers::Result<Vec<Value>>> {
		Box::pin(self.search_pages(query))
	}
}

#[derive(Debug)]
pub struct QueryResponse {
	pub query: CompiledQuery,
	/// One bullet line per page.
	pub formatted: String,
	pub raw: Vec<Value>,
}

#[derive(Debug)]
pub struct SearchResponse {
	pub formatted: String,
	pub raw: Vec<Value>,
}

#[derive(Debug)]
pub enum Answer {
	Query(QueryResponse),
	Search(SearchResponse),
}

pub struct NotiqService {
	pub cfg: Config,
	pub registry: DatabaseRegistry,
	pub store: SchemaStore,
	fetcher: Arc<dyn SchemaFetcher>,
	executor: Arc<dyn QueryExecutor>,
}
impl NotiqService {
	pub fn new(
		cfg: Config,
		fetcher: Arc<dyn SchemaFetcher>,
		executor: Arc<dyn QueryExecutor>,
	) -> Self {
		let registry = DatabaseRegistry::new(cfg.database_ids());
		let store = SchemaStore::new(&cfg.cache.path);

		Self { cfg, registry, store, fetcher, executor }
	}

	/// Wires both schema fetches and query execution to the Notion API.
	pub fn with_notion(cfg: Config) -> Result<Self> {
		let client = Arc::new(NotionClient::new(&cfg.notion)?);

		Ok(Self::new(cfg, client.clone(), client))
	}

	/// Loads the persisted snapshot into memory; `None` when no refresh has run yet.
	pub fn load_cache(&self) -> Result<Option<Snapshot>> {
		Ok(self.store.load()?)
	}

	pub async fn refresh(&self, now: OffsetDateTime) -> Result<RefreshOutcome> {
		let outcome =
			self.store.refresh_all(self.fetcher.clone(), self.registry.ids(), now).await?;

		for failure in &outcome.failures {
			tracing::warn!(
				database = %failure.database,
				error = %failure.error,
				"Database left out of the schema snapshot."
			);
		}

		Ok(outcome)
	}

	pub fn schema(&self, database: &str) -> Result<DatabaseSchema> {
		Ok(self.store.get(database)?)
	}

	/// Compiles without touching the network. Filters are checked against the cached schema
	/// only when `query.validate_filters` is on and a schema is cached.
	pub fn compile(&self, request: &QueryRequest, now: OffsetDateTime) -> Result<CompiledQuery> {
		let query = QueryCompiler::new(&self.registry).compile(
			&request.database,
			&request.params.filters,
			request.params.sort.as_ref(),
			now,
		)?;

		if self.cfg.query.validate_filters {
			match self.store.get(&request.database) {
				Ok(schema) => validate::validate_filters(
					&schema,
					&request.params.filters,
					request.params.sort.as_ref(),
				)?,
				Err(_) => tracing::debug!(
					database = %request.database,
					"No cached schema, skipping filter validation."
				),
			}
		}

		Ok(query)
	}

	/// Compiles `request`, runs it and renders the pages. Requires a cached schema.
	pub async fn query(&self, request: &QueryRequest, now: OffsetDateTime) -> Result<QueryResponse> {
		let schema = self.store.get(&request.database)?;
		let query = self.compile(request, now)?;
		let raw = self.executor.execute(&query).await?;
		let formatted = format::format_results(&schema, &raw);

		tracing::info!(database = %request.database, pages = raw.len(), "Query executed.");

		Ok(QueryResponse { query, formatted, raw })
	}

	pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
		if request.query.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "Search query must be non-empty.".to_string(),
			});
		}

		let raw = self.executor.search(&request.query).await?;
		let formatted = format::format_pages(&raw);

		tracing::info!(pages = raw.len(), "Page search executed.");

		Ok(SearchResponse { formatted, raw })
	}

	/// Parses an interpreter reply and runs whatever it asks for; `None` when no lookup is
	/// needed.
	pub async fn answer(&self, reply: &str, now: OffsetDateTime) -> Result<Option<Answer>> {
		let request = request::parse_request(reply).map_err(|err| Error::InvalidRequest {
			message: format!("Interpreter reply is not a valid request: {err}."),
		})?;

		match request {
			Some(InterpreterRequest::Query(query)) =>
				Ok(Some(Answer::Query(self.query(&query, now).await?))),
			Some(InterpreterRequest::Search(search)) =>
				Ok(Some(Answer::Search(self.search(&search).await?))),
			None => Ok(None),
		}
	}

	pub fn system_prompt(&self) -> Result<String> {
		let snapshot = self.store.snapshot().ok_or_else(|| Error::NotFound {
			message: "No schema snapshot is loaded; run a refresh first.".to_string(),
		})?;

		Ok(prompt::system_prompt(&snapshot, &self.cfg.databases))
	}
}
