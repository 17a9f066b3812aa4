//! Optional pre-flight check of filters against a cached schema.
//!
//! Compilation itself accepts anything; this catches unknown properties and type mismatches
//! before the external system rejects the query.

use crate::{
	Error, Result,
	filter::{FilterSpec, SortSpec},
	schema::{DatabaseSchema, PropertyType},
};

pub fn validate_filters(
	schema: &DatabaseSchema,
	filters: &[FilterSpec],
	sort: Option<&SortSpec>,
) -> Result<()> {
	for spec in filters {
		let Some(property) = schema.property(&spec.property) else {
			return Err(Error::InvalidFilter {
				property: spec.property.clone(),
				message: format!("database {:?} has no such property.", schema.title),
			});
		};

		if let Some(accepted) = accepted_property_types(&spec.filter_type)
			&& !accepted.contains(&property.kind.as_str())
		{
			return Err(Error::InvalidFilter {
				property: spec.property.clone(),
				message: format!(
					"filter type {:?} does not apply to a {:?} property.",
					spec.filter_type, property.kind
				),
			});
		}
		if spec.operator.trim().is_empty() {
			return Err(Error::InvalidFilter {
				property: spec.property.clone(),
				message: "operator must be non-empty.".to_string(),
			});
		}
	}

	if let Some(sort) = sort
		&& schema.property(&sort.property).is_none()
	{
		return Err(Error::InvalidFilter {
			property: sort.property.clone(),
			message: format!("database {:?} cannot be sorted by an unknown property.", schema.title),
		});
	}

	Ok(())
}

/// Property types a filter type can target. `None` leaves unfamiliar filter types unchecked.
fn accepted_property_types(filter_type: &str) -> Option<&'static [&'static str]> {
	let accepted: &'static [&'static str] = match filter_type {
		"select" => &[PropertyType::SELECT],
		"status" => &[PropertyType::STATUS],
		"multi_select" => &[PropertyType::MULTI_SELECT],
		"text" | "rich_text" => &[
			PropertyType::RICH_TEXT,
			PropertyType::TITLE,
			PropertyType::URL,
			PropertyType::EMAIL,
			PropertyType::PHONE_NUMBER,
		],
		"title" => &[PropertyType::TITLE],
		"number" => &[PropertyType::NUMBER],
		"date" => &[PropertyType::DATE, PropertyType::CREATED_TIME, PropertyType::LAST_EDITED_TIME],
		"checkbox" => &[PropertyType::CHECKBOX],
		_ => return None,
	};

	Some(accepted)
}
