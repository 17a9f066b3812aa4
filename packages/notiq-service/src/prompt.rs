//! System prompt for the upstream interpreter, describing every cached database.

use std::collections::BTreeMap;

use notiq_config::Database;
use notiq_domain::{Property, Snapshot, schema::PropertyType};

const CONTEXT_ONLY_DATABASE: &str = "conversations";

pub fn system_prompt(snapshot: &Snapshot, databases: &BTreeMap<String, Database>) -> String {
	let descriptions = snapshot
		.iter()
		.map(|(name, schema)| {
			let heading = match databases.get(name).and_then(|db| db.description.as_deref()) {
				Some(description) => format!("{name} - {description}. Properties:"),
				None => format!("{name} - Contains {name} information with properties:"),
			};
			let properties = schema
				.properties
				.iter()
				.map(|(property_name, property)| {
					format!("   - {property_name} ({})", describe_type(property))
				})
				.collect::<Vec<_>>()
				.join("\n");
			let note = if name.eq_ignore_ascii_case(CONTEXT_ONLY_DATABASE) {
				"\n   Note: This database is for context only. Only query it when asked about conversations or chat history."
			} else {
				""
			};

			format!("{heading}\n{properties}{note}")
		})
		.collect::<Vec<_>>()
		.join("\n\n");

	format!(
		"You help users explore their Notion databases. The following databases are available:\n\n\
		{descriptions}\n\n\
		To query a database, answer with a JSON object of this shape:\n\
		{{\n  \"database\": \"database_name\",\n  \"filters\": [\n    {{ \"property\": \"property_name\", \"filterType\": \"property_type\", \"operator\": \"operator\", \"value\": \"value\" }}\n  ],\n  \"sort\": {{ \"property\": \"property_name\", \"direction\": \"ascending\" }}\n}}\n\n\
		Date filters accept phrases such as \"15th of March\" or \"week of 10th June\"; use the operator \"next_week\" for the coming Monday to Sunday.\n\
		To search page contents instead, answer with:\n\
		{{\n  \"search\": {{ \"query\": \"search terms\" }}\n}}\n\n\
		Use the exact property names listed above. If no lookup is needed, answer with NO_QUERY_NEEDED."
	)
}

fn describe_type(property: &Property) -> String {
	match property.kind.as_str() {
		PropertyType::SELECT | PropertyType::STATUS if property.options.is_some() =>
			format!("{}: {}", property.kind, property.option_names().collect::<Vec<_>>().join(", ")),
		_ => property.kind.clone(),
	}
}
