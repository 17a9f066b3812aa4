use std::{
	collections::BTreeMap,
	sync::{Arc, Mutex},
};

use serde_json::{Map, Value, json};
use time::OffsetDateTime;

use notiq_config::{Cache, Config, Database, NotionConfig, Query, Service};
use notiq_domain::{CompiledQuery, FilterSpec, SortDirection, SortSpec};
use notiq_service::{
	Answer, Error, NotiqService, QueryExecutor, QueryParams, QueryRequest, SearchRequest,
};
use notiq_storage::BoxFuture;
use notiq_testkit::{
	ScriptedFetcher, TempSnapshot, enumerated_property, instant, property, remote_database,
};

#[derive(Default)]
struct RecordingExecutor {
	pages: Vec<Value>,
	seen: Mutex<Vec<CompiledQuery>>,
	searches: Mutex<Vec<String>>,
}
impl RecordingExecutor {
	fn with_pages(pages: Vec<Value>) -> Self {
		Self { pages, ..Default::default() }
	}

	fn seen(&self) -> Vec<CompiledQuery> {
		self.seen.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn searches(&self) -> Vec<String> {
		self.searches.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl QueryExecutor for RecordingExecutor {
	fn execute<'a>(
		&'a self,
		query: &'a CompiledQuery,
	) -> BoxFuture<'a, notiq_providers::Result<Vec<Value>>> {
		Box::pin(async move {
			self.seen.lock().unwrap_or_else(|err| err.into_inner()).push(query.clone());

			Ok(self.pages.clone())
		})
	}

	fn search<'a>(&'a self, query: &'a str) -> BoxFuture<'a, notiq_providers::Result<Vec<Value>>> {
		Box::pin(async move {
			self.searches.lock().unwrap_or_else(|err| err.into_inner()).push(query.to_string());

			Ok(self.pages.clone())
		})
	}
}

fn now() -> OffsetDateTime {
	instant("2024-06-05T09:00:00Z").expect("Failed to parse instant.")
}

fn config(temp: &TempSnapshot, validate_filters: bool) -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		notion: NotionConfig {
			api_base: "http://127.0.0.1:9/v1".to_string(),
			api_key: "secret".to_string(),
			notion_version: "2022-06-28".to_string(),
			timeout_ms: 1_000,
			page_size: None,
			default_headers: Map::new(),
		},
		cache: Cache { path: temp.path().to_string_lossy().into_owned() },
		query: Query { validate_filters },
		databases: BTreeMap::from([
			("tracker".to_string(), Database { id: "id-tracker".to_string(), description: None }),
			(
				"calendar".to_string(),
				Database { id: "id-calendar".to_string(), description: Some("Events".to_string()) },
			),
		]),
	}
}

fn fetcher() -> ScriptedFetcher {
	ScriptedFetcher::new().with_database(remote_database(
		"id-tracker",
		vec![
			property("Name", "title"),
			enumerated_property("Status", "select", &[("Todo", "gray"), ("Done", "green")]),
			property("Last edited time", "last_edited_time"),
		],
	))
}

fn request(database: &str, filters: Vec<FilterSpec>, sort: Option<SortSpec>) -> QueryRequest {
	QueryRequest { database: database.to_string(), params: QueryParams { filters, sort } }
}

#[tokio::test]
async fn refresh_reports_partial_failures() {
	let temp = TempSnapshot::new().expect("Failed to create temp snapshot.");
	let service = NotiqService::new(
		config(&temp, false),
		Arc::new(fetcher().with_failure("id-calendar", "Request timed out.")),
		Arc::new(RecordingExecutor::default()),
	);
	let outcome = service.refresh(now()).await.expect("Failed to refresh.");

	assert_eq!(outcome.schemas.keys().collect::<Vec<_>>(), vec!["tracker"]);
	assert_eq!(outcome.failures.len(), 1);
	assert_eq!(service.schema("tracker").expect("Missing schema.").id, "id-tracker");
	assert!(matches!(service.schema("calendar"), Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn query_compiles_executes_and_formats() {
	let temp = TempSnapshot::new().expect("Failed to create temp snapshot.");
	let executor = Arc::new(RecordingExecutor::with_pages(vec![json!({ "properties": {
		"Name": { "title": [{ "plain_text": "Ship v2" }] },
		"Status": { "select": { "name": "Done" } }
	} })]));
	let service =
		NotiqService::new(config(&temp, false), Arc::new(fetcher()), executor.clone());

	service.refresh(now()).await.expect("Failed to refresh.");

	let sort =
		SortSpec { property: "Last edited time".to_string(), direction: SortDirection::Descending };
	let response = service
		.query(
			&request(
				"tracker",
				vec![FilterSpec::new("Status", "select", "equals", json!("Done"))],
				Some(sort),
			),
			now(),
		)
		.await
		.expect("Failed to run query.");

	assert_eq!(response.formatted, "• Ship v2 (Done)");
	assert_eq!(response.raw.len(), 1);
	assert_eq!(executor.seen(), vec![response.query.clone()]);
	assert_eq!(
		response.query.request_body(),
		json!({
			"filter": { "and": [{ "property": "Status", "select": { "equals": "Done" } }] },
			"sorts": [{ "property": "Last edited time", "direction": "descending" }],
		})
	);
}

#[tokio::test]
async fn query_without_cached_schema_is_not_found() {
	let temp = TempSnapshot::new().expect("Failed to create temp snapshot.");
	let executor = Arc::new(RecordingExecutor::default());
	let service = NotiqService::new(config(&temp, false), Arc::new(fetcher()), executor.clone());
	let err = service
		.query(&request("tracker", Vec::new(), None), now())
		.await
		.expect_err("Expected a missing schema error.");

	assert!(matches!(err, Error::NotFound { .. }));
	assert!(executor.seen().is_empty());
}

#[test]
fn compile_rejects_unregistered_databases() {
	let temp = TempSnapshot::new().expect("Failed to create temp snapshot.");
	let service = NotiqService::new(
		config(&temp, false),
		Arc::new(fetcher()),
		Arc::new(RecordingExecutor::default()),
	);
	let err = service
		.compile(&request("inbox", Vec::new(), None), now())
		.expect_err("Expected an unknown database error.");

	assert!(matches!(err, Error::NotFound { ref message } if message.contains("inbox")));
}

#[tokio::test]
async fn validation_is_opt_in() {
	let temp = TempSnapshot::new().expect("Failed to create temp snapshot.");
	let bad = request("tracker", vec![FilterSpec::new("Owner", "select", "equals", json!("Ana"))], None);
	let lenient = NotiqService::new(
		config(&temp, false),
		Arc::new(fetcher()),
		Arc::new(RecordingExecutor::default()),
	);

	lenient.refresh(now()).await.expect("Failed to refresh.");
	lenient.compile(&bad, now()).expect("Unvalidated filters must pass through.");

	let strict = NotiqService::new(
		config(&temp, true),
		Arc::new(fetcher()),
		Arc::new(RecordingExecutor::default()),
	);

	// Validation without a loaded schema is skipped.
	strict.compile(&bad, now()).expect("Validation needs a cached schema.");
	strict.load_cache().expect("Failed to load cache.").expect("Snapshot must exist.");

	let err = strict.compile(&bad, now()).expect_err("Expected an invalid filter.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[tokio::test]
async fn system_prompt_needs_a_snapshot() {
	let temp = TempSnapshot::new().expect("Failed to create temp snapshot.");
	let service = NotiqService::new(
		config(&temp, false),
		Arc::new(fetcher()),
		Arc::new(RecordingExecutor::default()),
	);

	assert!(matches!(service.system_prompt(), Err(Error::NotFound { .. })));

	service.refresh(now()).await.expect("Failed to refresh.");

	let prompt = service.system_prompt().expect("Failed to render prompt.");

	assert!(prompt.contains("   - Status (select: Todo, Done)"));
}

#[tokio::test]
async fn page_search_skips_the_compiler() {
	let temp = TempSnapshot::new().expect("Failed to create temp snapshot.");
	let executor = Arc::new(RecordingExecutor::with_pages(vec![json!({ "object": "page", "properties": {
		"Event": { "type": "title", "title": [{ "plain_text": "Offsite" }] }
	} })]));
	let service = NotiqService::new(config(&temp, false), Arc::new(fetcher()), executor.clone());
	let response = service
		.search(&SearchRequest { query: "offsite".to_string() })
		.await
		.expect("Failed to search pages.");

	assert_eq!(response.formatted, "• Offsite");
	assert_eq!(executor.searches(), vec!["offsite".to_string()]);
	assert!(executor.seen().is_empty());

	let err = service
		.search(&SearchRequest { query: "  ".to_string() })
		.await
		.expect_err("Expected an empty search to be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[tokio::test]
async fn answer_dispatches_on_the_interpreter_reply() {
	let temp = TempSnapshot::new().expect("Failed to create temp snapshot.");
	let executor = Arc::new(RecordingExecutor::default());
	let service = NotiqService::new(config(&temp, false), Arc::new(fetcher()), executor.clone());

	service.refresh(now()).await.expect("Failed to refresh.");

	let query = service
		.answer(r#"{"database": "Tracker", "filters": []}"#, now())
		.await
		.expect("Failed to answer.");

	assert!(matches!(
		query,
		Some(Answer::Query(ref response)) if response.query.database_id == "id-tracker"
	));

	let search = service
		.answer("```json\n{\"search\": {\"query\": \"roadmap\"}}\n```", now())
		.await
		.expect("Failed to answer.");

	assert!(matches!(search, Some(Answer::Search(_))));
	assert_eq!(executor.searches(), vec!["roadmap".to_string()]);
	assert!(service.answer("NO_QUERY_NEEDED", now()).await.expect("Failed to answer.").is_none());
	assert!(matches!(
		service.answer("{\"database\": ", now()).await,
		Err(Error::InvalidRequest { .. })
	));
}
