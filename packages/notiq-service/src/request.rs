//! Query requests as the upstream interpreter emits them.

use serde::{Deserialize, Serialize};

use notiq_domain::{FilterSpec, SortSpec};

/// Sentinel the interpreter answers with when a question needs no database lookup.
pub const NO_QUERY_NEEDED: &str = "NO_QUERY_NEEDED";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
	#[serde(default)]
	pub filters: Vec<FilterSpec>,
	#[serde(default)]
	pub sort: Option<SortSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
	pub database: String,
	#[serde(flatten)]
	pub params: QueryParams,
}

/// `{ "search": { "query": ... } }`: full-text search over pages instead of a database query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InterpreterRequest {
	Query(QueryRequest),
	Search(SearchRequest),
}

/// Extracts a request from interpreter output.
///
/// Accepts a bare JSON object, a fenced ```json block, or an object embedded in prose.
/// A `database` key wins over `search`. Returns `Ok(None)` for [`NO_QUERY_NEEDED`] and for
/// JSON carrying neither.
pub fn parse_request(text: &str) -> serde_json::Result<Option<InterpreterRequest>> {
	let trimmed = text.trim();

	if trimmed.contains(NO_QUERY_NEEDED) {
		return Ok(None);
	}

	let candidate = fenced_block(trimmed).or_else(|| outer_object(trimmed)).unwrap_or(trimmed);
	let mut value: serde_json::Value = serde_json::from_str(candidate)?;

	if value.get("database").is_some() {
		return serde_json::from_value(value).map(|query| Some(InterpreterRequest::Query(query)));
	}

	match value.get_mut("search").map(serde_json::Value::take) {
		Some(search) =>
			serde_json::from_value(search).map(|search| Some(InterpreterRequest::Search(search))),
		None => Ok(None),
	}
}

fn fenced_block(text: &str) -> Option<&str> {
	let start = text.find("```")?;
	let rest = &text[start + 3..];
	let rest = rest.strip_prefix("json").unwrap_or(rest);
	let end = rest.find("```")?;

	Some(rest[..end].trim())
}

fn outer_object(text: &str) -> Option<&str> {
	let start = text.find('{')?;
	let end = text.rfind('}')?;

	(start < end).then(|| &text[start..=end])
}
