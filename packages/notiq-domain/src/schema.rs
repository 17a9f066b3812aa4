use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Database name to schema, persisted and replaced as one unit.
pub type Snapshot = BTreeMap<String, DatabaseSchema>;

/// Column definitions of one external database as of `last_updated`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSchema {
	pub id: String,
	pub title: String,
	pub properties: BTreeMap<String, Property>,
	#[serde(with = "crate::time_serde")]
	pub last_updated: OffsetDateTime,
}
impl DatabaseSchema {
	pub fn property(&self, name: &str) -> Option<&Property> {
		self.properties.get(name)
	}

	/// Name of the property holding each page's title, if the schema has one.
	pub fn title_property(&self) -> Option<&str> {
		self.properties
			.iter()
			.find(|(_, property)| property.kind == PropertyType::TITLE)
			.map(|(name, _)| name.as_str())
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
	pub id: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub name: String,
	/// Allowed values; only set for enumerated types.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub options: Option<Vec<SelectOption>>,
}
impl Property {
	pub fn is_enumerated(&self) -> bool {
		PropertyType::is_enumerated(&self.kind)
	}

	pub fn option_names(&self) -> impl Iterator<Item = &str> {
		self.options.iter().flatten().map(|option| option.name.as_str())
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
	pub id: String,
	pub name: String,
	pub color: String,
}

/// Property type tags as the external system spells them.
pub struct PropertyType;
impl PropertyType {
	pub const CHECKBOX: &'static str = "checkbox";
	pub const CREATED_TIME: &'static str = "created_time";
	pub const DATE: &'static str = "date";
	pub const EMAIL: &'static str = "email";
	pub const LAST_EDITED_TIME: &'static str = "last_edited_time";
	pub const MULTI_SELECT: &'static str = "multi_select";
	pub const NUMBER: &'static str = "number";
	pub const PHONE_NUMBER: &'static str = "phone_number";
	pub const RICH_TEXT: &'static str = "rich_text";
	pub const SELECT: &'static str = "select";
	pub const STATUS: &'static str = "status";
	pub const TITLE: &'static str = "title";
	pub const URL: &'static str = "url";

	pub fn is_enumerated(kind: &str) -> bool {
		matches!(kind, Self::SELECT | Self::STATUS | Self::MULTI_SELECT)
	}
}
