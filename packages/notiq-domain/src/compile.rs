use std::collections::BTreeMap;

use serde_json::Value;
use time::OffsetDateTime;

use crate::{
	Error, Result,
	dates::{self, WeekAnchor},
	filter::{CompiledQuery, Condition, DateOperand, FilterSpec, FilterTree, LeafFilter, SortSpec},
};

const NEXT_WEEK: &str = "next_week";
const WEEK_OF: &str = "week of";

/// Resolves the names callers use to the external database ids.
pub trait DatabaseDirectory {
	fn database_id(&self, name: &str) -> Option<String>;
}

/// Static name to id table, usually built from configuration. Lookups ignore case.
#[derive(Clone, Debug, Default)]
pub struct DatabaseRegistry {
	ids: BTreeMap<String, String>,
}
impl DatabaseRegistry {
	pub fn new(ids: BTreeMap<String, String>) -> Self {
		Self { ids }
	}

	pub fn ids(&self) -> &BTreeMap<String, String> {
		&self.ids
	}
}
impl DatabaseDirectory for DatabaseRegistry {
	fn database_id(&self, name: &str) -> Option<String> {
		self.ids.get(name).or_else(|| {
			self.ids.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, id)| id)
		})
		.cloned()
	}
}

pub struct QueryCompiler<'a> {
	directory: &'a dyn DatabaseDirectory,
}
impl<'a> QueryCompiler<'a> {
	pub fn new(directory: &'a dyn DatabaseDirectory) -> Self {
		Self { directory }
	}

	/// Builds the query for `database_name`. Filters keep their input order under one `and`.
	///
	/// Property names and operators are not checked here; see [`crate::validate`].
	pub fn compile(
		&self,
		database_name: &str,
		filters: &[FilterSpec],
		sort: Option<&SortSpec>,
		now: OffsetDateTime,
	) -> Result<CompiledQuery> {
		let database_id = self
			.directory
			.database_id(database_name)
			.ok_or_else(|| Error::NotFound { database: database_name.to_string() })?;
		let and = filters.iter().map(|spec| compile_filter(spec, now)).collect::<Vec<_>>();
		let query = CompiledQuery {
			database_id,
			filter: FilterTree { and },
			sorts: sort.cloned().into_iter().collect(),
		};

		tracing::debug!(
			database = database_name,
			filters = query.filter.and.len(),
			sorted = !query.sorts.is_empty(),
			"Compiled query."
		);

		Ok(query)
	}
}

pub fn compile_filter(spec: &FilterSpec, now: OffsetDateTime) -> LeafFilter {
	if spec.filter_type == "date" {
		return compile_date_filter(spec, now);
	}

	let condition = Condition {
		property: spec.property.clone(),
		operator: spec.operator.clone(),
		value: spec.value.clone(),
	};

	match spec.filter_type.as_str() {
		"select" => LeafFilter::Select(condition),
		"status" => LeafFilter::Status(condition),
		"multi_select" => LeafFilter::MultiSelect(condition),
		"text" => LeafFilter::Text(condition),
		"number" => LeafFilter::Number(condition),
		other => LeafFilter::Other { filter_type: other.to_string(), condition },
	}
}

fn compile_date_filter(spec: &FilterSpec, now: OffsetDateTime) -> LeafFilter {
	let property = spec.property.clone();

	if spec.operator == NEXT_WEEK {
		return LeafFilter::DateRange {
			property,
			range: dates::resolve_week(WeekAnchor::Upcoming, now),
		};
	}

	let operand = match &spec.value {
		Value::String(text) if text.contains(WEEK_OF) => {
			return LeafFilter::DateRange {
				property,
				range: dates::resolve_week(WeekAnchor::Text(text), now),
			};
		},
		Value::String(text) if !text.is_empty() => DateOperand::Date(dates::resolve_date(text, now)),
		other => DateOperand::Raw(other.clone()),
	};

	LeafFilter::DatePoint { property, operator: spec.operator.clone(), operand }
}
