//! Filter inputs and the compiled query shapes handed to the execution boundary.

use serde::{
	Deserialize, Serialize, Serializer,
	ser::{SerializeMap, SerializeStruct},
};
use serde_json::Value;
use time::Date;

use crate::dates::{self, WeekRange};

/// One caller-supplied condition. Nothing guarantees the property or operator exist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
	pub property: String,
	pub filter_type: String,
	pub operator: String,
	#[serde(default)]
	pub value: Value,
}
impl FilterSpec {
	pub fn new(
		property: impl Into<String>,
		filter_type: impl Into<String>,
		operator: impl Into<String>,
		value: Value,
	) -> Self {
		Self {
			property: property.into(),
			filter_type: filter_type.into(),
			operator: operator.into(),
			value,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
	Ascending,
	Descending,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
	pub property: String,
	pub direction: SortDirection,
}

/// `{ [operator]: value }` against one property.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
	pub property: String,
	pub operator: String,
	pub value: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DateOperand {
	Date(Date),
	/// Passed through untouched, e.g. `true` for `is_empty` or `{}` for `past_week`.
	Raw(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub enum LeafFilter {
	Select(Condition),
	Status(Condition),
	MultiSelect(Condition),
	Text(Condition),
	Number(Condition),
	DatePoint { property: String, operator: String, operand: DateOperand },
	DateRange { property: String, range: WeekRange },
	/// Any other filter type, emitted in the generic `{ property, [type]: { [op]: value } }` form.
	Other { filter_type: String, condition: Condition },
}
impl LeafFilter {
	pub fn property(&self) -> &str {
		match self {
			Self::Select(condition)
			| Self::Status(condition)
			| Self::MultiSelect(condition)
			| Self::Text(condition)
			| Self::Number(condition)
			| Self::Other { condition, .. } => &condition.property,
			Self::DatePoint { property, .. } | Self::DateRange { property, .. } => property,
		}
	}

	/// The key the external system expects next to `property`.
	pub fn type_key(&self) -> &str {
		match self {
			Self::Select(_) => "select",
			Self::Status(_) => "status",
			Self::MultiSelect(_) => "multi_select",
			Self::Text(_) => "text",
			Self::Number(_) => "number",
			Self::DatePoint { .. } | Self::DateRange { .. } => "date",
			Self::Other { filter_type, .. } => filter_type,
		}
	}
}
impl Serialize for LeafFilter {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(2))?;

		map.serialize_entry("property", self.property())?;

		match self {
			Self::Select(condition)
			| Self::Status(condition)
			| Self::MultiSelect(condition)
			| Self::Text(condition)
			| Self::Number(condition)
			| Self::Other { condition, .. } => map.serialize_entry(
				self.type_key(),
				&OperatorBody { operator: &condition.operator, value: &condition.value },
			)?,
			Self::DatePoint { operator, operand, .. } => {
				let value = match operand {
					DateOperand::Date(date) => Value::String(dates::format_date(*date)),
					DateOperand::Raw(value) => value.clone(),
				};

				map.serialize_entry("date", &OperatorBody { operator, value: &value })?
			},
			Self::DateRange { range, .. } => map.serialize_entry("date", &RangeBody(range))?,
		}

		map.end()
	}
}

struct OperatorBody<'a> {
	operator: &'a str,
	value: &'a Value,
}
impl Serialize for OperatorBody<'_> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(1))?;

		map.serialize_entry(self.operator, self.value)?;

		map.end()
	}
}

struct RangeBody<'a>(&'a WeekRange);
impl Serialize for RangeBody<'_> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut body = serializer.serialize_struct("DateRange", 2)?;

		body.serialize_field("on_or_after", &dates::format_date(self.0.start))?;
		body.serialize_field("before", &dates::format_date(self.0.end))?;

		body.end()
	}
}

/// Flat conjunction; nested groups and `or` are not produced.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FilterTree {
	pub and: Vec<LeafFilter>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledQuery {
	pub database_id: String,
	pub filter: FilterTree,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub sorts: Vec<SortSpec>,
}
impl CompiledQuery {
	/// Body of a database query request; the id travels in the request path.
	pub fn request_body(&self) -> Value {
		let mut body = serde_json::Map::new();

		body.insert("filter".to_string(), serde_json::json!(self.filter));

		if !self.sorts.is_empty() {
			body.insert("sorts".to_string(), serde_json::json!(self.sorts));
		}

		Value::Object(body)
	}
}
