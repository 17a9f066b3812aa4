use std::fs;

use clap::Parser;
use serde_json::json;

use notiq::{Args, Command};
use notiq_domain::{FilterSpec, SortDirection};

#[test]
fn parses_query_arguments_with_pinned_now() {
	let args = Args::try_parse_from([
		"notiq",
		"-c",
		"notiq.toml",
		"compile",
		"tracker",
		"--sort-property",
		"Last edited time",
		"--direction",
		"ascending",
		"--now",
		"2024-06-05T09:00:00Z",
	])
	.expect("Failed to parse arguments.");

	assert_eq!(args.now.map(|now| now.date().to_string()), Some("2024-06-05".to_string()));

	let Command::Compile(query) = args.command else {
		panic!("Expected the compile command.");
	};
	let request = notiq::query_request(query).expect("Failed to build request.");
	let sort = request.params.sort.expect("Expected a sort.");

	assert_eq!(request.database, "tracker");
	assert!(request.params.filters.is_empty());
	assert_eq!(sort.property, "Last edited time");
	assert_eq!(sort.direction, SortDirection::Ascending);
}

#[test]
fn rejects_malformed_now() {
	assert!(
		Args::try_parse_from(["notiq", "-c", "notiq.toml", "refresh", "--now", "next tuesday"])
			.is_err()
	);
}

#[test]
fn reads_filters_from_a_json_file() {
	let dir = std::env::temp_dir().join(format!("notiq_cli_test_{}", std::process::id()));

	fs::create_dir_all(&dir).expect("Failed to create temp dir.");

	let path = dir.join("filters.json");

	fs::write(
		&path,
		json!([
			{ "property": "Date", "filterType": "date", "operator": "next_week", "value": null }
		])
		.to_string(),
	)
	.expect("Failed to write filters.");

	let args = Args::try_parse_from([
		"notiq",
		"-c",
		"notiq.toml",
		"query",
		"calendar",
		"--filters",
		path.to_str().expect("Temp path must be UTF-8."),
	])
	.expect("Failed to parse arguments.");
	let Command::Query(query) = args.command else {
		panic!("Expected the query command.");
	};
	let request = notiq::query_request(query).expect("Failed to build request.");

	fs::remove_dir_all(&dir).expect("Failed to remove temp dir.");

	assert_eq!(
		request.params.filters,
		vec![FilterSpec::new("Date", "date", "next_week", serde_json::Value::Null)]
	);
	assert_eq!(request.params.sort, None);
}

#[test]
fn parses_search_and_answer_commands() {
	let search = Args::try_parse_from(["notiq", "-c", "notiq.toml", "search", "quarterly roadmap"])
		.expect("Failed to parse arguments.");

	assert!(matches!(search.command, Command::Search { ref query } if query == "quarterly roadmap"));

	let answer = Args::try_parse_from(["notiq", "-c", "notiq.toml", "answer", "reply.txt"])
		.expect("Failed to parse arguments.");

	assert!(
		matches!(answer.command, Command::Answer { ref reply } if reply.as_os_str() == "reply.txt")
	);
}
