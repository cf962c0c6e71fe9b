use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use recs_config::{Config, RankingType, RecsModel};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("recs_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

fn assert_validation_error(cfg: &Config, expected: &str) {
	let err = recs_config::validate(cfg).expect_err("Expected validation error.");

	assert!(err.to_string().contains(expected), "Unexpected error: {err}");
}

#[test]
fn sample_config_loads_with_defaults() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML.to_string());
	let result = recs_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must load.");
	let domain = cfg.domain("/vendor").expect("Vendor domain must exist.");

	assert_eq!(domain.event_names, vec!["leads".to_string(), "view".to_string()]);
	assert_eq!(domain.default_bias.get("item_bias"), Some(&2.0));
	assert_eq!(domain.default_bias.get("status_filter"), Some(&-1.0));
	assert!(domain.bias.is_empty());
	assert_eq!(domain.fields.len(), 5);
	assert_eq!(domain.recs_model, RecsModel::All);
	assert!(domain.rankings.is_empty());
	assert!(domain.blacklist_events.is_empty());
	assert_eq!(cfg.recommend.no_item_sentinel, "-1");
	assert_eq!(cfg.pagination.max_limit, 100);
}

#[test]
fn domain_paths_are_normalized_on_load() {
	let payload = SAMPLE_CONFIG_TEMPLATE_TOML.replace("path          = \"/vendor\"", "path = \" /vendor/ \"");
	let path = write_temp_config(payload);
	let result = recs_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Config must load.");

	assert!(cfg.domain("/vendor").is_some());
}

#[test]
fn unknown_ranking_labels_fall_back_to_unknown() {
	let payload = format!(
		"{SAMPLE_CONFIG_TEMPLATE_TOML}\n[[domains.rankings]]\ntype = \"trending\"\n\n[[domains.rankings]]\ntype = \"seasonal\"\nname = \"seasonRank\"\n"
	);
	let cfg: Config = toml::from_str(&payload).expect("Failed to parse config.");
	let rankings = &cfg.domains[0].rankings;

	assert_eq!(rankings[0].ranking_type, RankingType::Trending);
	assert_eq!(rankings[1].ranking_type, RankingType::Unknown);
	assert_eq!(rankings[1].name.as_deref(), Some("seasonRank"));
}

#[test]
fn recs_model_labels_parse() {
	let payload = SAMPLE_CONFIG_TEMPLATE_TOML.replace(
		"event_names   = [\"leads\", \"view\"]",
		"event_names   = [\"leads\", \"view\"]\nrecs_model = \"collabFiltering\"",
	);
	let cfg: Config = toml::from_str(&payload).expect("Failed to parse config.");

	assert_eq!(cfg.domains[0].recs_model, RecsModel::CollabFiltering);
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("recs_config_test_missing.toml");
	let err = recs_config::load(&path).expect_err("Expected read error.");

	assert!(err.to_string().contains("recs_config_test_missing.toml"), "Unexpected error: {err}");
}

#[test]
fn default_limit_must_not_exceed_max_limit() {
	let mut cfg = base_config();

	cfg.pagination.default_limit = 500;

	assert_validation_error(&cfg, "pagination.default_limit must not exceed pagination.max_limit.");
}

#[test]
fn max_query_events_must_leave_room_for_one_id() {
	let mut cfg = base_config();

	cfg.recommend.max_query_events = 1;

	assert_validation_error(&cfg, "recommend.max_query_events must be at least 2.");
}

#[test]
fn domains_require_event_names() {
	let mut cfg = base_config();

	cfg.domains[0].event_names.clear();

	assert_validation_error(&cfg, "event_names must be non-empty strings.");
}

#[test]
fn domain_paths_must_be_unique() {
	let mut cfg = base_config();
	let duplicate = cfg.domains[0].clone();

	cfg.domains.push(duplicate);

	assert_validation_error(&cfg, "declared more than once");
}

#[test]
fn bias_values_must_be_finite() {
	let mut cfg = base_config();

	cfg.domains[0].bias.insert("city_bias".to_string(), f64::NAN);

	assert_validation_error(&cfg, "bias.city_bias must be a finite number.");
}

#[test]
fn storage_urls_must_be_present() {
	let mut cfg = base_config();

	cfg.storage.search.url = "  ".to_string();

	assert_validation_error(&cfg, "storage.search.url must be non-empty.");
}

#[test]
fn domain_paths_cannot_shadow_health_or_capture() {
	let mut cfg = base_config();

	cfg.domains[0].path = "/health".to_string();

	assert_validation_error(&cfg, "is reserved or not a literal route.");

	cfg.domains[0].path = "/vendor/{id}".to_string();

	assert_validation_error(&cfg, "is reserved or not a literal route.");
}
