use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const ITEM_BIAS_KEY: &str = "item_bias";
pub const USER_BIAS_KEY: &str = "user_bias";
/// Liveness route served next to the domain routes.
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub pagination: Pagination,
	#[serde(default)]
	pub recommend: Recommend,
	pub domains: Vec<DomainTypeConfig>,
}
impl Config {
	pub fn domain(&self, path: &str) -> Option<&DomainTypeConfig> {
		self.domains.iter().find(|domain| domain.path == path)
	}
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
	#[serde(default = "default_cache_max_age_secs")]
	pub cache_max_age_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub search: SearchIndex,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchIndex {
	pub url: String,
	#[serde(default = "default_doc_type")]
	pub doc_type: String,
	#[serde(default = "default_search_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
	pub default_limit: u32,
	pub max_limit: u32,
	pub default_page: u32,
}
impl Default for Pagination {
	fn default() -> Self {
		Self { default_limit: 10, max_limit: 100, default_page: 1 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recommend {
	/// Upper bound on distinct target ids kept per event from a user's history.
	#[serde(default = "default_max_items_per_user")]
	pub max_items_per_user: u32,
	/// Upper bound on ids per similar-items list and on boosted history signals.
	#[serde(default = "default_max_query_events")]
	pub max_query_events: u32,
	#[serde(default = "default_true")]
	pub with_ranks: bool,
	/// Item id callers send to mean "no target item".
	#[serde(default = "default_no_item_sentinel")]
	pub no_item_sentinel: String,
}
impl Default for Recommend {
	fn default() -> Self {
		Self {
			max_items_per_user: default_max_items_per_user(),
			max_query_events: default_max_query_events(),
			with_ranks: true,
			no_item_sentinel: default_no_item_sentinel(),
		}
	}
}

/// One served entity type: where its items live, which events correlate them, and how item
/// metadata biases the query.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainTypeConfig {
	pub path: String,
	pub relation_name: String,
	pub index_name: String,
	pub event_names: Vec<String>,
	#[serde(default)]
	pub default_bias: HashMap<String, f64>,
	/// Replaces `default_bias` entirely whenever it holds at least one key.
	#[serde(default)]
	pub bias: HashMap<String, f64>,
	#[serde(default)]
	pub fields: Vec<BiasField>,
	#[serde(default)]
	pub recs_model: RecsModel,
	#[serde(default)]
	pub rankings: Vec<RankingParams>,
	#[serde(default)]
	pub blacklist_events: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BiasField {
	pub config_bias_name: String,
	pub field_name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecsModel {
	#[default]
	#[serde(rename = "all")]
	All,
	#[serde(rename = "collabFiltering")]
	CollabFiltering,
	#[serde(rename = "backfill")]
	Backfill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingParams {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(rename = "type")]
	pub ranking_type: RankingType,
	#[serde(default)]
	pub event_names: Vec<String>,
	#[serde(default)]
	pub offset_date: Option<String>,
	#[serde(default)]
	pub end_date: Option<String>,
	#[serde(default)]
	pub duration: Option<String>,
}

/// Labels outside the declared set deserialize into `Unknown` instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RankingType {
	Popular,
	Trending,
	Hot,
	UserDefined,
	Random,
	Unknown,
}
impl RankingType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Popular => "popular",
			Self::Trending => "trending",
			Self::Hot => "hot",
			Self::UserDefined => "userDefined",
			Self::Random => "random",
			Self::Unknown => "unknown",
		}
	}
}
impl From<String> for RankingType {
	fn from(label: String) -> Self {
		match label.as_str() {
			"popular" => Self::Popular,
			"trending" => Self::Trending,
			"hot" => Self::Hot,
			"userDefined" => Self::UserDefined,
			"random" => Self::Random,
			_ => Self::Unknown,
		}
	}
}
impl From<RankingType> for String {
	fn from(ranking_type: RankingType) -> Self {
		ranking_type.as_str().to_string()
	}
}

fn default_request_timeout_ms() -> u64 {
	3_000
}

fn default_cache_max_age_secs() -> u64 {
	18_000
}

fn default_doc_type() -> String {
	"_doc".to_string()
}

fn default_search_timeout_ms() -> u64 {
	3_000
}

fn default_max_items_per_user() -> u32 {
	2_000
}

fn default_max_query_events() -> u32 {
	100
}

fn default_no_item_sentinel() -> String {
	"-1".to_string()
}

fn default_true() -> bool {
	true
}
