use serde_json::Value;

use notiq_domain::DatabaseSchema;

const UNTITLED: &str = "Untitled";
const STATUS_PROPERTY: &str = "Status";

/// Renders pages as `• <title>` lines, with ` (<status>)` when the page has a `Status` choice.
pub fn format_results(schema: &DatabaseSchema, pages: &[Value]) -> String {
	let title_property = schema.title_property();

	pages
		.iter()
		.map(|page| {
			let Some(properties) = page.get("properties") else {
				return format!("• {UNTITLED}");
			};
			let title = title_property
				.and_then(|name| properties.get(name))
				.and_then(page_title)
				.unwrap_or(UNTITLED);

			bullet(title, properties)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// Like [`format_results`] for search hits, which may come from any database; the title is
/// whichever property has type `title`.
pub fn format_pages(pages: &[Value]) -> String {
	pages
		.iter()
		.map(|page| {
			let Some(properties) = page.get("properties") else {
				return format!("• {UNTITLED}");
			};
			let title = properties
				.as_object()
				.and_then(|map| {
					map.values().find(|property| {
						property.get("type").and_then(Value::as_str) == Some("title")
					})
				})
				.and_then(page_title)
				.unwrap_or(UNTITLED);

			bullet(title, properties)
		})
		.collect::<Vec<_>>()
		.join("\n")
}

fn bullet(title: &str, properties: &Value) -> String {
	match properties.get(STATUS_PROPERTY).and_then(choice_name) {
		Some(status) => format!("• {title} ({status})"),
		None => format!("• {title}"),
	}
}

fn page_title(property: &Value) -> Option<&str> {
	property
		.get("title")?
		.as_array()?
		.first()?
		.get("plain_text")?
		.as_str()
		.filter(|text| !text.is_empty())
}

fn choice_name(property: &Value) -> Option<&str> {
	["select", "status"]
		.iter()
		.find_map(|key| property.get(*key).filter(|choice| !choice.is_null()))?
		.get("name")?
		.as_str()
}
