use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::{Table, Value};

use notiq_config::{Config, Error};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_table() -> Table {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.")
}

fn section<'a>(root: &'a mut Table, name: &str) -> &'a mut Table {
	root.get_mut(name)
		.and_then(Value::as_table_mut)
		.unwrap_or_else(|| panic!("Template config must include [{name}]."))
}

fn write_temp_config(table: &Table) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let payload = toml::to_string(table).expect("Failed to render template config.");
	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("notiq_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_table(table: &Table) -> notiq_config::Result<Config> {
	let path = write_temp_config(table);
	let result = notiq_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result
}

fn expect_validation(table: &Table, expected_key: &str) -> String {
	let err = load_table(table).expect_err("Expected a validation error.");

	match &err {
		Error::Validation { key, .. } => assert_eq!(key, expected_key, "Unexpected key in {err}"),
		other => panic!("Expected a validation error, got {other:?}."),
	}

	err.to_string()
}

#[test]
fn sample_config_loads() {
	let cfg = load_table(&sample_table()).expect("Failed to load sample config.");

	assert_eq!(cfg.service.log_level, "info");
	assert_eq!(cfg.notion.page_size, Some(100));
	assert!(!cfg.query.validate_filters);
	assert_eq!(cfg.databases.len(), 2);
	assert_eq!(
		cfg.database_ids().get("tracker").map(String::as_str),
		Some("0d5e1b6e-tracker")
	);
	assert!(cfg.databases["calendar"].description.is_none());
}

#[test]
fn query_section_is_optional() {
	let mut table = sample_table();

	table.remove("query");

	let cfg = load_table(&table).expect("Failed to load config without [query].");

	assert!(!cfg.query.validate_filters);
}

#[test]
fn api_key_must_be_non_empty() {
	let mut table = sample_table();

	section(&mut table, "notion").insert("api_key".to_string(), Value::String("  ".to_string()));

	let message = expect_validation(&table, "notion.api_key");

	assert_eq!(message, "notion.api_key must be non-empty.");
}

#[test]
fn timeout_must_be_positive() {
	let mut table = sample_table();

	section(&mut table, "notion").insert("timeout_ms".to_string(), Value::Integer(0));

	expect_validation(&table, "notion.timeout_ms");
}

#[test]
fn page_size_is_capped() {
	let mut table = sample_table();

	section(&mut table, "notion").insert("page_size".to_string(), Value::Integer(101));

	expect_validation(&table, "notion.page_size");
}

#[test]
fn default_header_values_must_be_strings() {
	let mut table = sample_table();
	let mut headers = Table::new();

	headers.insert("x-trace".to_string(), Value::Integer(1));
	section(&mut table, "notion").insert("default_headers".to_string(), Value::Table(headers));

	expect_validation(&table, "notion.default_headers.x-trace");
}

#[test]
fn database_ids_must_be_non_empty() {
	let mut table = sample_table();
	let databases = section(&mut table, "databases");
	let calendar = databases
		.get_mut("calendar")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [databases.calendar].");

	calendar.insert("id".to_string(), Value::String(String::new()));

	expect_validation(&table, "databases.calendar.id");
}

#[test]
fn database_names_are_unique_ignoring_case() {
	let mut table = sample_table();
	let mut duplicate = Table::new();

	duplicate.insert("id".to_string(), Value::String("another".to_string()));
	section(&mut table, "databases").insert("Tracker".to_string(), Value::Table(duplicate));

	let message = expect_validation(&table, "databases.tracker");

	assert!(message.contains("unique"), "Unexpected error message: {message}");
}

#[test]
fn at_least_one_database_is_required() {
	let mut table = sample_table();

	table.insert("databases".to_string(), Value::Table(Table::new()));

	expect_validation(&table, "databases");
}

#[test]
fn normalizes_api_base_and_blank_descriptions() {
	let mut table = sample_table();

	section(&mut table, "notion")
		.insert("api_base".to_string(), Value::String("https://api.notion.com/v1/".to_string()));

	let tracker = section(&mut table, "databases")
		.get_mut("tracker")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [databases.tracker].");

	tracker.insert("description".to_string(), Value::String("   ".to_string()));

	let cfg = load_table(&table).expect("Failed to load config.");

	assert_eq!(cfg.notion.api_base, "https://api.notion.com/v1");
	assert!(cfg.databases["tracker"].description.is_none());
}

#[test]
fn missing_file_reports_read_error() {
	let err = notiq_config::load(&env::temp_dir().join("notiq_config_missing.toml"))
		.expect_err("Expected a read error.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
