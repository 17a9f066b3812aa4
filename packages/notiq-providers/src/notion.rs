use std::{collections::BTreeMap, time::Duration};

use reqwest::{Client, Response};
use serde_json::{Map, Value, json};

use notiq_config::NotionConfig;
use notiq_domain::{CompiledQuery, Property, SelectOption, schema::PropertyType};
use notiq_storage::{BoxFuture, FetchError, RemoteDatabase, SchemaFetcher};

use crate::{Error, Result};

/// HTTP client for the Notion REST API. Every call is bounded by `timeout_ms`; nothing retries.
#[derive(Clone, Debug)]
pub struct NotionClient {
	http: Client,
	api_base: String,
	page_size: Option<u32>,
}
impl NotionClient {
	pub fn new(cfg: &NotionConfig) -> Result<Self> {
		if cfg.api_key.trim().is_empty() {
			return Err(Error::InvalidConfig { message: "Notion api_key must be non-empty.".to_string() });
		}

		let http = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::auth_headers(
				&cfg.api_key,
				&cfg.notion_version,
				&cfg.default_headers,
			)?)
			.build()?;

		Ok(Self {
			http,
			api_base: cfg.api_base.trim_end_matches('/').to_string(),
			page_size: cfg.page_size,
		})
	}

	pub async fn retrieve_database(&self, database_id: &str) -> Result<RemoteDatabase> {
		let url = format!("{}/databases/{database_id}", self.api_base);
		let res = self.http.get(url).send().await?;
		let json = read_json(res).await?;

		parse_database(json)
	}

	/// Runs `query` and collects every page, following pagination cursors.
	pub async fn query_database(&self, query: &CompiledQuery) -> Result<Vec<Value>> {
		let url = format!("{}/databases/{}/query", self.api_base, query.database_id);
		let pages = self.collect_pages(&url, query.request_body()).await?;

		tracing::debug!(database_id = %query.database_id, pages = pages.len(), "Database query returned.");

		Ok(pages)
	}

	/// Full-text search over pages shared with the integration; databases are filtered out.
	pub async fn search_pages(&self, query: &str) -> Result<Vec<Value>> {
		let url = format!("{}/search", self.api_base);
		let pages = self.collect_pages(&url, search_body(query)).await?;

		tracing::debug!(query, pages = pages.len(), "Page search returned.");

		Ok(pages)
	}

	async fn collect_pages(&self, url: &str, body: Value) -> Result<Vec<Value>> {
		let mut pages = Vec::new();
		let mut cursor: Option<String> = None;

		loop {
			let body = paged_body(body.clone(), self.page_size, cursor.as_deref());
			let res = self.http.post(url).json(&body).send().await?;
			let json = read_json(res).await?;
			let (mut batch, next) = parse_results_page(json)?;

			pages.append(&mut batch);

			match next {
				Some(next) => cursor = Some(next),
				None => break,
			}
		}

		Ok(pages)
	}
}
impl SchemaFetcher for NotionClient {
	fn fetch<'a>(
		&'a self,
		database_id: &'a str,
	) -> BoxFuture<'a, std::result::Result<RemoteDatabase, FetchError>> {
		Box::pin(async move {
			self.retrieve_database(database_id).await.map_err(|err| FetchError::new(err.to_string()))
		})
	}
}

async fn read_json(res: Response) -> Result<Value> {
	let status = res.status();
	let json: Value = res.json().await?;

	if status.is_success() {
		return Ok(json);
	}

	let field = |key: &str| json.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

	Err(Error::Api { status: status.as_u16(), code: field("code"), message: field("message") })
}

fn search_body(query: &str) -> Value {
	json!({ "query": query, "filter": { "property": "object", "value": "page" } })
}

fn paged_body(mut body: Value, page_size: Option<u32>, cursor: Option<&str>) -> Value {
	if let Some(object) = body.as_object_mut() {
		if let Some(page_size) = page_size {
			object.insert("page_size".to_string(), Value::from(page_size));
		}
		if let Some(cursor) = cursor {
			object.insert("start_cursor".to_string(), Value::from(cursor));
		}
	}

	body
}

fn parse_database(json: Value) -> Result<RemoteDatabase> {
	let id = json
		.get("id")
		.and_then(Value::as_str)
		.ok_or_else(|| Error::InvalidResponse { message: "Database response is missing id.".to_string() })?
		.to_string();
	let raw_properties = json.get("properties").and_then(Value::as_object).ok_or_else(|| {
		Error::InvalidResponse { message: "Database response is missing properties.".to_string() }
	})?;
	let mut properties = BTreeMap::new();

	for (name, raw) in raw_properties {
		properties.insert(name.clone(), parse_property(name, raw)?);
	}

	Ok(RemoteDatabase { id, properties })
}

fn parse_property(name: &str, raw: &Value) -> Result<Property> {
	let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
	let kind = text("type").ok_or_else(|| Error::InvalidResponse {
		message: format!("Property {name} is missing its type."),
	})?;
	let options = if PropertyType::is_enumerated(&kind) {
		Some(parse_options(raw.get(&kind).and_then(Value::as_object)))
	} else {
		None
	};

	Ok(Property {
		id: text("id").unwrap_or_default(),
		name: text("name").unwrap_or_else(|| name.to_string()),
		kind,
		options,
	})
}

// Select, multi-select and status all keep their choices under `<type>.options`.
fn parse_options(config: Option<&Map<String, Value>>) -> Vec<SelectOption> {
	let Some(options) = config.and_then(|config| config.get("options")).and_then(Value::as_array)
	else {
		return Vec::new();
	};

	options
		.iter()
		.filter_map(|option| {
			let text = |key: &str| option.get(key).and_then(Value::as_str).map(str::to_string);

			Some(SelectOption {
				id: text("id").unwrap_or_default(),
				name: text("name")?,
				color: text("color").unwrap_or_else(|| "default".to_string()),
			})
		})
		.collect()
}

fn parse_results_page(json: Value) -> Result<(Vec<Value>, Option<String>)> {
	let Value::Object(mut object) = json else {
		return Err(Error::InvalidResponse { message: "List response must be an object.".to_string() });
	};
	let results = match object.remove("results") {
		Some(Value::Array(results)) => results,
		_ =>
			return Err(Error::InvalidResponse {
				message: "Query response is missing results array.".to_string(),
			}),
	};
	let has_more = object.get("has_more").and_then(Value::as_bool).unwrap_or(false);
	let next = object.get("next_cursor").and_then(Value::as_str).map(str::to_string);

	Ok((results, if has_more { next } else { None }))
}
